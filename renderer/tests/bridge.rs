use renderer::bridge::{HostValue, decode_variables};
use renderer::{DiagnosticKind, MemoryTree, Property, RenderError, render, render_host_values};
use serde_json::json;

#[test]
fn decodes_each_host_shape() {
    assert_eq!(
        HostValue::from_json(&json!("Ada")),
        HostValue::String("Ada".to_string())
    );
    assert_eq!(HostValue::from_json(&json!(2.5)), HostValue::Number(2.5));
    assert_eq!(HostValue::from_json(&json!(3)), HostValue::Number(3.0));
    assert_eq!(
        HostValue::from_json(&json!(true)),
        HostValue::Unsupported("boolean")
    );
    assert_eq!(HostValue::from_json(&json!(null)), HostValue::Unsupported("null"));
    assert_eq!(
        HostValue::from_json(&json!({ "a": 1 })),
        HostValue::Unsupported("object")
    );
}

#[test]
fn array_elements_are_read_as_strings() {
    assert_eq!(
        HostValue::from_json(&json!(["a", 1, 1.5, true, null, [2], { "k": "v" }])),
        HostValue::Array(vec![
            "a".to_string(),
            "1".to_string(),
            "1.5".to_string(),
            "true".to_string(),
            "null".to_string(),
            "[2]".to_string(),
            r#"{"k":"v"}"#.to_string(),
        ])
    );
}

#[test]
fn variables_must_be_an_object_or_null() {
    assert!(decode_variables(&json!(null)).unwrap().is_empty());
    assert_eq!(decode_variables(&json!({ "a": "x" })).unwrap().len(), 1);
    assert!(matches!(
        decode_variables(&json!(["a"])),
        Err(RenderError::Argument(_))
    ));
}

#[test]
fn argument_error_leaves_the_tree_untouched() {
    let mut tree = MemoryTree::new();
    let mount = tree.root();
    render("p { }", &json!({}), &mut tree, &mount);

    let result = render("div { }", &json!("not an object"), &mut tree, &mount);
    assert!(result.error.unwrap().contains("must be an object"));
    assert_eq!(tree.to_html(mount), "<p></p>");
}

#[test]
fn unsupported_variables_are_skipped_with_a_diagnostic() {
    let mut tree = MemoryTree::new();
    let mount = tree.root();
    let result = render(
        "p {\n  title = name\n  hidden = flag\n}",
        &json!({ "name": "Ada", "flag": true }),
        &mut tree,
        &mount,
    );
    assert!(result.is_ok());

    let kinds: Vec<DiagnosticKind> = result.diagnostics.iter().map(|d| d.kind).collect();
    assert_eq!(
        kinds,
        [
            DiagnosticKind::UnsupportedValueShape,
            DiagnosticKind::AttributeEvalError
        ]
    );
    assert!(result.diagnostics[0].message.contains("flag"));
    assert_eq!(tree.to_html(mount), r#"<p title="Ada"></p>"#);
}

#[test]
fn pre_decoded_host_values() {
    let mut tree = MemoryTree::new();
    let mount = tree.root();
    let variables = vec![
        ("count".to_string(), HostValue::Number(2.0)),
        (
            "items".to_string(),
            HostValue::Array(vec!["x".to_string(), "y".to_string()]),
        ),
    ];
    let result = render_host_values(
        "dynamic \"li\" {\n  for_each = items\n  value = count\n}",
        variables,
        &mut tree,
        &mount,
    );
    assert!(result.is_ok());

    let items = tree.elements_by_tag(mount, "li");
    assert_eq!(items.len(), 2);
    assert_eq!(tree.property(items[1], "value"), Some(&Property::Number(2.0)));
}

#[test]
fn all_parse_errors_are_joined() {
    let mut tree = MemoryTree::new();
    let mount = tree.root();
    let result = render("div {\n  a = 1\n  a = 2\n}\n}", &json!({}), &mut tree, &mount);
    let error = result.error.expect("expected a parse error");
    assert_eq!(error.matches("inline.hcl:").count(), 2, "{}", error);
    assert!(error.contains("; "));
}
