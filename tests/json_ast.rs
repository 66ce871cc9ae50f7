//! Programs in the front end's JSON tree format, and error reporting

mod common;

use circ::diagnostic::{DiagnosticRenderer, Span};
use circ::{run_json, run_json_with_diagnostics, InterpreterError, Value};
use common::{from_json, num, run, run_err};
use serde_json::json;

fn ident(name: &str, line: u32, col: u32) -> serde_json::Value {
    json!({"type": "identifier", "name": name, "lineNumber": line, "charIndex": col})
}

fn number(value: f64, line: u32, col: u32) -> serde_json::Value {
    json!({"type": "numberLiteral", "value": value, "lineNumber": line, "charIndex": col})
}

// =============================================================================
// RUNNING TREES
// =============================================================================

#[test]
fn test_declarations_and_calls() {
    // var double = fun (x) { x * 2 }; double(21)
    let tree = json!({
        "type": "prog", "lineNumber": 1, "charIndex": 0,
        "exprList": [
            {"type": "varDeclarationList", "lineNumber": 1, "charIndex": 0, "exprList": [
                {"type": "varDeclaration", "lineNumber": 1, "charIndex": 4,
                 "left": ident("double", 1, 4),
                 "right": {"type": "funDeclaration", "lineNumber": 1, "charIndex": 13, "name": null,
                           "formalParamList": [ident("x", 1, 18)],
                           "body": {"type": "block", "lineNumber": 1, "charIndex": 21, "exprList": [
                               {"type": "binary", "op": "*", "lineNumber": 1, "charIndex": 23,
                                "left": ident("x", 1, 23), "right": number(2.0, 1, 27)}
                           ]}}}
            ]},
            {"type": "funCall", "lineNumber": 2, "charIndex": 0,
             "prodFunExpr": ident("double", 2, 0), "paramList": [number(21.0, 2, 7)]}
        ]
    });
    assert_eq!(run(from_json(tree)), num(42.0));
}

#[test]
fn test_objects_members_and_loops() {
    // var o = {"a": 1, ("b" + "c"): 2}; for (k, v in o) { k + v }
    let tree = json!({
        "type": "prog", "lineNumber": 1, "charIndex": 0,
        "exprList": [
            {"type": "varDeclaration", "lineNumber": 1, "charIndex": 4,
             "left": ident("o", 1, 4),
             "right": {"type": "objectLiteral", "lineNumber": 1, "charIndex": 8, "properties": [
                 {"type": "objectProperty", "lineNumber": 1, "charIndex": 9,
                  "left": {"type": "stringLiteral", "value": "a", "lineNumber": 1, "charIndex": 9},
                  "right": number(1.0, 1, 14)},
                 {"type": "objectProperty", "lineNumber": 1, "charIndex": 17,
                  "left": {"type": "binary", "op": "+", "lineNumber": 1, "charIndex": 18,
                           "left": {"type": "stringLiteral", "value": "b", "lineNumber": 1, "charIndex": 18},
                           "right": {"type": "stringLiteral", "value": "c", "lineNumber": 1, "charIndex": 24}},
                  "right": number(2.0, 1, 30)}
             ]}},
            {"type": "for", "lineNumber": 2, "charIndex": 0,
             "keyVal": [ident("k", 2, 5), ident("v", 2, 8)],
             "stuff": ident("o", 2, 13),
             "body": {"type": "binary", "op": "+", "lineNumber": 2, "charIndex": 18,
                      "left": ident("k", 2, 18), "right": ident("v", 2, 22)}}
        ]
    });
    assert_eq!(run(from_json(tree)), Value::array(vec![Value::string("a1"), Value::string("bc2")]));
}

#[test]
fn test_condition_with_null_else_and_member_dot() {
    let tree = json!({
        "type": "exprSequence", "lineNumber": 1, "charIndex": 0,
        "exprList": [
            {"type": "condition", "lineNumber": 1, "charIndex": 0,
             "expr": {"type": "booleanLiteral", "value": false, "lineNumber": 1, "charIndex": 3},
             "then": number(1.0, 1, 10), "else": null},
            {"type": "memberDot", "lineNumber": 2, "charIndex": 0,
             "left": {"type": "arrayLiteral", "lineNumber": 2, "charIndex": 0, "items": [number(1.0, 2, 1)]},
             "right": ident("length", 2, 4)}
        ]
    });
    assert_eq!(run(from_json(tree)), num(1.0));
}

#[test]
fn test_run_json_entry_point() {
    let source = r#"{"type": "binary", "op": "+", "left": {"type": "stringLiteral", "value": "a"},
                     "right": {"type": "numberLiteral", "value": 1}}"#;
    assert_eq!(run_json(source), Ok(Some(Value::string("a1"))));
}

// =============================================================================
// ERRORS
// =============================================================================

#[test]
fn test_error_carries_source_position() {
    let tree = json!({
        "type": "prog", "lineNumber": 1, "charIndex": 0,
        "exprList": [number(1.0, 1, 0), ident("missing", 3, 9)]
    });
    let err = run_err(from_json(tree));
    assert_eq!(err, InterpreterError::UndefinedVariable { name: "missing".to_string(), span: Span::new(3, 9) });
}

#[test]
fn test_unknown_node_type_is_rejected() {
    let result = run_json(r#"{"type": "yield", "lineNumber": 1, "charIndex": 0}"#);
    assert!(result.unwrap_err().contains("malformed syntax tree"));

    let diagnostics = run_json_with_diagnostics("not json").unwrap_err();
    assert_eq!(diagnostics[0].code.as_deref(), Some("E0001"));
}

#[test]
fn test_runtime_error_message() {
    let source = r#"{"type": "binary", "op": "/", "lineNumber": 1, "charIndex": 0,
                     "left": {"type": "numberLiteral", "value": 1}, "right": {"type": "numberLiteral", "value": 0}}"#;
    assert_eq!(run_json(source), Err("Runtime error: Divide by zero".to_string()));
}

#[test]
fn test_diagnostic_rendering_points_at_the_node() {
    let source = "var a = 1;\nprintln(a / 0);";
    let program = json!({
        "type": "prog", "lineNumber": 1, "charIndex": 0,
        "exprList": [
            {"type": "varDeclaration", "lineNumber": 1, "charIndex": 4,
             "left": ident("a", 1, 4), "right": number(1.0, 1, 8)},
            {"type": "binary", "op": "/", "lineNumber": 2, "charIndex": 8,
             "left": ident("a", 2, 8), "right": number(0.0, 2, 12)}
        ]
    })
    .to_string();

    let diagnostics = run_json_with_diagnostics(&program).unwrap_err();
    assert_eq!(diagnostics[0].code.as_deref(), Some("E0204"));
    let rendered = DiagnosticRenderer::new(source, "main.circ", false).render(&diagnostics[0]);
    assert!(rendered.starts_with("error[E0204]: division by zero\n"), "{}", rendered);
    assert!(rendered.contains("--> main.circ:2:9"), "{}", rendered);
    assert!(rendered.contains("println(a / 0);"), "{}", rendered);
}
