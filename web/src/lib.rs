//! Browser host: renders hdoc documents into the live DOM.

use js_sys::{Array, JSON, Object, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Node};

use renderer::bridge::{HostValue, render_host_values};
use renderer::{Property, TargetTree, TreeError};

#[wasm_bindgen(start)]
pub fn start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Replace the children of `mount` with the rendering of `source`.
///
/// `variables` must be a plain object (or null/undefined). Returns an object
/// whose `error` property is set when the call failed as a whole.
#[wasm_bindgen]
pub fn parse_hcl(source: &str, variables: JsValue, mount: &Node) -> JsValue {
    let result = Object::new();
    let error = match run(source, &variables, mount) {
        Ok(None) => None,
        Ok(Some(message)) | Err(message) => Some(message),
    };
    if let Some(message) = error {
        let _ = Reflect::set(&result, &"error".into(), &JsValue::from_str(&message));
    }
    result.into()
}

fn run(source: &str, variables: &JsValue, mount: &Node) -> Result<Option<String>, String> {
    let variables = decode_variables(variables)?;
    let document = mount
        .owner_document()
        .ok_or_else(|| "mount point is not attached to a document".to_string())?;

    let mut tree = DomTree { document };
    let result = render_host_values(source, variables, &mut tree, mount);
    for diagnostic in &result.diagnostics {
        web_sys::console::warn_1(&JsValue::from_str(&diagnostic.to_string()));
    }
    Ok(result.error)
}

/// Split the variables object into named host values.
fn decode_variables(variables: &JsValue) -> Result<Vec<(String, HostValue)>, String> {
    if variables.is_null() || variables.is_undefined() {
        return Ok(Vec::new());
    }
    if !variables.is_object() || Array::is_array(variables) {
        let kind = if Array::is_array(variables) {
            "array".to_string()
        } else {
            variables.js_typeof().as_string().unwrap_or_default()
        };
        return Err(format!("variables must be an object, got {}", kind));
    }

    let entries = Object::entries(variables.unchecked_ref::<Object>());
    Ok(entries
        .iter()
        .filter_map(|entry| {
            let pair: Array = entry.dyn_into().ok()?;
            let name = pair.get(0).as_string()?;
            Some((name, decode_value(&pair.get(1))))
        })
        .collect())
}

fn decode_value(value: &JsValue) -> HostValue {
    if let Some(s) = value.as_string() {
        HostValue::String(s)
    } else if let Some(n) = value.as_f64() {
        HostValue::Number(n)
    } else if Array::is_array(value) {
        let items = Array::from(value);
        HostValue::Array(items.iter().map(|item| element_string(&item)).collect())
    } else if value.as_bool().is_some() {
        HostValue::Unsupported("boolean")
    } else if value.is_null() {
        HostValue::Unsupported("null")
    } else if value.is_undefined() {
        HostValue::Unsupported("undefined")
    } else {
        HostValue::Unsupported("object")
    }
}

/// The string form of one array element: strings verbatim, everything else
/// as JSON text.
fn element_string(value: &JsValue) -> String {
    if let Some(s) = value.as_string() {
        return s;
    }
    if value.is_undefined() {
        return "undefined".to_string();
    }
    JSON::stringify(value)
        .ok()
        .and_then(|s| s.as_string())
        .unwrap_or_default()
}

/// The live DOM as a render target.
struct DomTree {
    document: Document,
}

fn tree_error(value: JsValue) -> TreeError {
    let message = value
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{:?}", value));
    TreeError::new(message)
}

impl TargetTree for DomTree {
    type Node = Node;

    fn create_element(&mut self, tag: &str) -> Result<Node, TreeError> {
        self.document
            .create_element(tag)
            .map(Node::from)
            .map_err(tree_error)
    }

    fn set_property(&mut self, node: &Node, name: &str, value: Property) -> Result<(), TreeError> {
        let value = match value {
            Property::String(s) => JsValue::from_str(&s),
            Property::Number(n) => JsValue::from_f64(n),
        };
        Reflect::set(node, &JsValue::from_str(name), &value)
            .map(|_| ())
            .map_err(tree_error)
    }

    fn append_child(&mut self, parent: &Node, child: &Node) -> Result<(), TreeError> {
        parent.append_child(child).map(|_| ()).map_err(tree_error)
    }

    fn first_child(&self, node: &Node) -> Result<Option<Node>, TreeError> {
        Ok(node.first_child())
    }

    fn remove_child(&mut self, parent: &Node, child: &Node) -> Result<(), TreeError> {
        parent.remove_child(child).map(|_| ()).map_err(tree_error)
    }
}
