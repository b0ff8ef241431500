use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::error::EvalError;
use crate::functions;
use crate::value::Value;

/// A callable available to expressions.
pub type Function = Rc<dyn Fn(&[Value]) -> Result<Value, EvalError>>;

/// A binding environment. Lookups walk from this scope out through its
/// parents; a name bound here hides the same name in any ancestor.
///
/// A child borrows its parent, so it can never outlive the frame that
/// created it. Function tables are shared by reference between a scope and
/// all of its descendants.
pub struct Scope<'p> {
    variables: HashMap<String, Value>,
    functions: Rc<HashMap<String, Function>>,
    parent: Option<&'p Scope<'p>>,
}

impl Scope<'static> {
    /// A root scope holding `variables` and the built-in functions.
    pub fn root(variables: HashMap<String, Value>) -> Self {
        Scope {
            variables,
            functions: Rc::new(functions::builtins()),
            parent: None,
        }
    }

    /// Register a host function. Only roots carry their own functions;
    /// children always share their parent's table.
    pub fn with_function<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, EvalError> + 'static,
    {
        Rc::make_mut(&mut self.functions).insert(name.into(), Rc::new(function));
        self
    }
}

impl<'p> Scope<'p> {
    /// Create a child scope whose own bindings are exactly `variables`.
    /// Everything else is reached through the parent chain.
    pub fn child(&self, variables: HashMap<String, Value>) -> Scope<'_> {
        Scope {
            variables,
            functions: Rc::clone(&self.functions),
            parent: Some(self),
        }
    }

    /// Look up a variable, searching from this scope outward.
    pub fn lookup_variable(&self, name: &str) -> Option<&Value> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(value) = current.variables.get(name) {
                return Some(value);
            }
            scope = current.parent;
        }
        None
    }

    pub fn lookup_function(&self, name: &str) -> Option<&Function> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(function) = current.functions.get(name) {
                return Some(function);
            }
            scope = current.parent;
        }
        None
    }

    /// Names bound directly in this scope (not inherited), sorted.
    pub fn local_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.variables.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn parent(&self) -> Option<&Scope<'p>> {
        self.parent
    }
}

impl fmt::Debug for Scope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut functions: Vec<&str> = self.functions.keys().map(|k| k.as_str()).collect();
        functions.sort_unstable();
        f.debug_struct("Scope")
            .field("variables", &self.variables)
            .field("functions", &functions)
            .field("parent", &self.parent)
            .finish()
    }
}
