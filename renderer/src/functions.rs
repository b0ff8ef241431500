use std::collections::HashMap;
use std::rc::Rc;

use crate::error::EvalError;
use crate::scope::Function;
use crate::value::Value;

/// Functions registered on every root scope.
pub fn builtins() -> HashMap<String, Function> {
    let mut functions: HashMap<String, Function> = HashMap::new();
    functions.insert("length".to_string(), Rc::new(length));
    functions
}

/// `length(list)`: the number of elements in a list.
fn length(args: &[Value]) -> Result<Value, EvalError> {
    let [arg] = args else {
        return Err(EvalError::Arity {
            function: "length".to_string(),
            expected: 1,
            got: args.len(),
        });
    };
    match arg {
        Value::List(items) => Ok(Value::Number(items.len() as f64)),
        other => Err(EvalError::type_error("list", other.type_name())),
    }
}
