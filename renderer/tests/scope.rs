use std::collections::HashMap;

use renderer::{Scope, Value};

fn bindings(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

#[test]
fn lookup_walks_to_the_parent() {
    let root = Scope::root(bindings(&[("name", Value::from("Ada"))]));
    let child = root.child(bindings(&[("for_each", Value::from("x"))]));

    assert_eq!(child.lookup_variable("for_each"), Some(&Value::from("x")));
    assert_eq!(child.lookup_variable("name"), Some(&Value::from("Ada")));
    assert_eq!(child.lookup_variable("missing"), None);
    assert_eq!(root.lookup_variable("for_each"), None);
}

#[test]
fn child_binding_shadows_parent() {
    let root = Scope::root(bindings(&[("for_each", Value::from("outer"))]));
    let child = root.child(bindings(&[("for_each", Value::from("inner"))]));
    let grandchild = child.child(HashMap::new());

    assert_eq!(child.lookup_variable("for_each"), Some(&Value::from("inner")));
    assert_eq!(
        grandchild.lookup_variable("for_each"),
        Some(&Value::from("inner"))
    );
    assert_eq!(root.lookup_variable("for_each"), Some(&Value::from("outer")));
}

#[test]
fn child_holds_exactly_its_own_bindings() {
    let root = Scope::root(bindings(&[("a", Value::from(1.0)), ("b", Value::from(2.0))]));
    let child = root.child(bindings(&[("for_each", Value::from(3.0))]));

    assert_eq!(child.local_names(), ["for_each"]);
    assert_eq!(root.local_names(), ["a", "b"]);
    assert!(child.parent().is_some());
    assert!(root.parent().is_none());
}

#[test]
fn functions_are_inherited() {
    let root = Scope::root(HashMap::new());
    let child = root.child(HashMap::new());
    let grandchild = child.child(HashMap::new());

    assert!(root.lookup_function("length").is_some());
    assert!(grandchild.lookup_function("length").is_some());
    assert!(grandchild.lookup_function("missing").is_none());
}
