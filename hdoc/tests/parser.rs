use hdoc::Document;
use hdoc::expression::{BinaryOperator, Expression, TemplatePart};
use hdoc::parser::{ParseError, Parser, summarize_all};

fn parse(source: &str) -> Document {
    Parser::new(source.to_string(), 0)
        .parse()
        .expect("parse failed")
}

fn parse_err(source: &str) -> Vec<ParseError> {
    match Parser::new(source.to_string(), 0).parse() {
        Ok(doc) => panic!("expected parse error, got {:#?}", doc),
        Err(errors) => errors,
    }
}

#[test]
fn empty_document() {
    let doc = parse("");
    assert!(doc.body.is_empty());
}

#[test]
fn single_empty_block() {
    let doc = parse("h1 { }");
    assert_eq!(doc.body.blocks.len(), 1);
    let block = &doc.body.blocks[0];
    assert_eq!(block.kind, "h1");
    assert!(block.labels.is_empty());
    assert!(block.body.is_empty());
}

#[test]
fn one_line_block_with_attribute() {
    let doc = parse("span { title = name }");
    let block = &doc.body.blocks[0];
    assert_eq!(block.body.attributes.len(), 1);
    let attr = &block.body.attributes[0];
    assert_eq!(attr.name, "title");
    assert!(matches!(&attr.expr, Expression::VariableReference(n, _) if n == "name"));
}

#[test]
fn nested_blocks_keep_document_order() {
    let src = r#"
div {
  h1 {
    innerText = "Title"
  }
  p {
    innerText = "Body"
  }
  ul {
    li { }
    li { }
  }
}
"#;
    let doc = parse(src);
    let div = &doc.body.blocks[0];
    let kinds: Vec<&str> = div.body.blocks.iter().map(|b| b.kind.as_str()).collect();
    assert_eq!(kinds, ["h1", "p", "ul"]);
    assert_eq!(div.body.blocks[2].body.blocks.len(), 2);
}

#[test]
fn dynamic_block_label() {
    let doc = parse("dynamic \"li\" {\n  for_each = items\n}");
    let block = &doc.body.blocks[0];
    assert_eq!(block.kind, "dynamic");
    assert_eq!(block.labels, vec!["li".to_string()]);
    assert!(block.body.attribute("for_each").is_some());
}

#[test]
fn bare_identifier_labels() {
    let doc = parse("dynamic li { for_each = items }");
    assert_eq!(doc.body.blocks[0].labels, vec!["li".to_string()]);
}

#[test]
fn comments_are_ignored() {
    let src = "# heading comment\n// another\n/* block\ncomment */ p { id = \"x\" } # trailing";
    let doc = parse(src);
    assert_eq!(doc.body.blocks.len(), 1);
    assert_eq!(doc.body.blocks[0].body.attributes[0].name, "id");
}

#[test]
fn operator_precedence() {
    let doc = parse("x = 1 + 2 * 3");
    match &doc.body.attributes[0].expr {
        Expression::BinaryOperation {
            operator: BinaryOperator::Addition,
            right,
            ..
        } => assert!(matches!(
            right.as_ref(),
            Expression::BinaryOperation {
                operator: BinaryOperator::Multiplication,
                ..
            }
        )),
        other => panic!("unexpected expression {:?}", other),
    }
}

#[test]
fn template_interpolation() {
    let doc = parse(r#"x = "Hello, ${name}!""#);
    match &doc.body.attributes[0].expr {
        Expression::Template(parts) => {
            assert_eq!(parts.len(), 3);
            assert!(matches!(&parts[0], TemplatePart::Literal(s) if s == "Hello, "));
            assert!(matches!(
                &parts[1],
                TemplatePart::Interpolation(Expression::VariableReference(n, _)) if n == "name"
            ));
            assert!(matches!(&parts[2], TemplatePart::Literal(s) if s == "!"));
        }
        other => panic!("unexpected expression {:?}", other),
    }
}

#[test]
fn interpolation_spans_point_into_source() {
    let src = r#"x = "a ${who}""#;
    let doc = parse(src);
    let Expression::Template(parts) = &doc.body.attributes[0].expr else {
        panic!("expected template");
    };
    let TemplatePart::Interpolation(Expression::VariableReference(_, span)) = &parts[1] else {
        panic!("expected variable interpolation");
    };
    assert_eq!(&src[span.clone()], "who");
}

#[test]
fn escaped_interpolation_is_literal() {
    let doc = parse(r#"x = "cost: $${price}""#);
    assert!(matches!(
        &doc.body.attributes[0].expr,
        Expression::StringLiteral(s) if s == "cost: ${price}"
    ));
}

#[test]
fn function_calls_tuples_and_index() {
    let doc = parse("n = length([\"a\", \"b\",])\nfirst = items[0]\nc = n > 1 ? \"many\" : \"one\"");
    assert!(matches!(
        &doc.body.attributes[0].expr,
        Expression::FunctionCall { name, args, .. } if name == "length" && args.len() == 1
    ));
    assert!(matches!(&doc.body.attributes[1].expr, Expression::Index { .. }));
    assert!(matches!(&doc.body.attributes[2].expr, Expression::Conditional { .. }));
}

#[test]
fn multi_line_tuple() {
    let doc = parse("items = [\n  \"a\",\n  \"b\",\n]\np { }");
    assert!(matches!(&doc.body.attributes[0].expr, Expression::Tuple(items) if items.len() == 2));
    assert_eq!(doc.body.blocks.len(), 1);
}

#[test]
fn unterminated_block_is_an_error() {
    let errors = parse_err("div {\n  h1 { }\n");
    assert!(errors.iter().any(|e| e.message.contains("unclosed block `div`")));
}

#[test]
fn unterminated_string_is_an_error() {
    let errors = parse_err("p { title = \"oops }");
    assert!(errors.iter().any(|e| e.message.contains("unterminated string")));
}

#[test]
fn stray_closing_brace_is_an_error() {
    let errors = parse_err("p { }\n}");
    assert!(errors[0].message.contains("unexpected `}`"));
}

#[test]
fn duplicate_attribute_is_an_error() {
    let errors = parse_err("p {\n  id = \"a\"\n  id = \"b\"\n}");
    assert!(errors[0].message.contains("duplicate attribute `id`"));
}

#[test]
fn missing_attribute_value_is_an_error() {
    let errors = parse_err("p {\n  id =\n}");
    assert!(errors[0].message.contains("missing value"));
}

#[test]
fn errors_collected_across_document() {
    let errors = parse_err("p { a = }\nh1 { b = + }\n");
    assert_eq!(errors.len(), 2);
    assert!(errors[0].span.start < errors[1].span.start);

    // A bad character does not hide structural errors later in the file
    let errors = parse_err("h1 {\n title = @\n}\ndiv {\n");
    let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
    assert!(messages.contains(&"unexpected character `@`"), "{:?}", messages);
    assert!(
        messages.iter().any(|m| m.contains("unclosed block `div`")),
        "{:?}",
        messages
    );
    assert!(errors.windows(2).all(|w| w[0].span.start <= w[1].span.start));
}

#[test]
fn lexing_recovers_inside_strings_and_comments() {
    let errors = parse_err("p { title = \"a\\qb\" }\n/* never closed");
    let messages: Vec<_> = errors.iter().map(|e| e.message.as_str()).collect();
    assert!(messages.contains(&"invalid escape `\\q`"), "{:?}", messages);
    assert!(messages.contains(&"unterminated comment"), "{:?}", messages);
}

#[test]
fn numbers_with_exponents() {
    let doc = parse("p { width = 1.5e2 }");
    assert!(matches!(
        doc.body.blocks[0].body.attributes[0].expr,
        Expression::NumberLiteral(n) if n == 150.0
    ));
}

#[test]
fn summary_includes_line_and_column() {
    let src = "div {\n  p {\n";
    let errors = parse_err(src);
    let summary = summarize_all(&errors, "inline.hcl", src);
    assert!(summary.starts_with("inline.hcl:"), "got: {}", summary);
    assert!(summary.contains("unclosed block"), "got: {}", summary);
}
