use std::fmt;
use std::rc::Rc;

use serde::Deserialize;

use crate::diagnostic::Span;

/// Shared handle to an immutable node. Continuations capture these, so the
/// tree is reference counted rather than borrowed.
pub type NodeRef = Rc<Node>;

/// Ordered child list of a sequence-like node.
pub type NodeList = Rc<[NodeRef]>;

/// One node of the syntax tree produced by the external parser.
///
/// The JSON shape is `{"type": "...", "lineNumber": n, "charIndex": n, ...}`
/// with kind-specific fields; see [`NodeKind`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Node {
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(rename = "lineNumber", default = "unknown_position")]
    pub line: i64,
    #[serde(rename = "charIndex", default = "unknown_position")]
    pub column: i64,
}

fn unknown_position() -> i64 {
    -1
}

impl Node {
    pub fn new(kind: NodeKind) -> NodeRef {
        Rc::new(Node { kind, line: -1, column: -1 })
    }

    pub fn at(kind: NodeKind, line: usize, column: usize) -> NodeRef {
        Rc::new(Node { kind, line: line as i64, column: column as i64 })
    }

    pub fn span(&self) -> Span {
        if self.line < 1 {
            Span::dummy()
        } else {
            Span::new(self.line as usize, self.column.max(0) as usize)
        }
    }

    /// Deserialize a program from the parser's JSON output.
    pub fn from_json(text: &str) -> Result<NodeRef, AstError> {
        serde_json::from_str::<NodeRef>(text).map_err(AstError)
    }

    pub fn from_json_value(value: serde_json::Value) -> Result<NodeRef, AstError> {
        serde_json::from_value::<NodeRef>(value).map_err(AstError)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeKind {
    NullLiteral,
    UndefinedLiteral,
    BooleanLiteral {
        value: bool,
    },
    StringLiteral {
        value: Rc<str>,
    },
    NumberLiteral {
        value: f64,
    },
    Identifier {
        name: Rc<str>,
    },
    Binary {
        op: BinaryOp,
        left: NodeRef,
        right: NodeRef,
    },
    And {
        left: NodeRef,
        right: NodeRef,
    },
    Or {
        left: NodeRef,
        right: NodeRef,
    },
    Assign {
        left: NodeRef,
        right: NodeRef,
    },
    Condition {
        expr: NodeRef,
        #[serde(default)]
        then: Option<NodeRef>,
        #[serde(rename = "else", default)]
        otherwise: Option<NodeRef>,
    },
    Block {
        #[serde(rename = "exprList")]
        items: NodeList,
    },
    Prog {
        #[serde(rename = "exprList")]
        items: NodeList,
    },
    ExprSequence {
        #[serde(rename = "exprList")]
        items: NodeList,
    },
    VarDeclarationList {
        #[serde(rename = "exprList")]
        items: NodeList,
    },
    VarDeclaration {
        #[serde(rename = "left")]
        name: Ident,
        #[serde(rename = "right")]
        init: NodeRef,
    },
    FunDeclaration {
        #[serde(default)]
        name: Option<Ident>,
        #[serde(rename = "formalParamList")]
        params: Rc<[Ident]>,
        body: NodeRef,
    },
    FunCall {
        #[serde(rename = "prodFunExpr")]
        callee: NodeRef,
        #[serde(rename = "paramList")]
        args: NodeList,
    },
    ArrayLiteral {
        items: NodeList,
    },
    ObjectLiteral {
        properties: Rc<[Property]>,
    },
    MemberIndex {
        #[serde(rename = "left")]
        target: NodeRef,
        #[serde(rename = "right")]
        key: NodeRef,
    },
    MemberDot {
        #[serde(rename = "left")]
        target: NodeRef,
        #[serde(rename = "right")]
        name: Ident,
    },
    #[serde(rename = "this")]
    This,
    For {
        #[serde(rename = "keyVal")]
        bindings: Rc<[Ident]>,
        #[serde(rename = "stuff")]
        source: NodeRef,
        body: NodeRef,
    },
    Break,
    Discard,
}

/// A bare name in binding position (declaration, parameter, loop variable,
/// dot-member). Accepts an `identifier` node; position fields are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Ident {
    pub name: Rc<str>,
}

impl Ident {
    pub fn new(name: &str) -> Self {
        Self { name: Rc::from(name) }
    }
}

/// `key: value` entry of an object literal. The key is an expression;
/// static keys arrive as string literals.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Property {
    #[serde(rename = "left")]
    pub key: NodeRef,
    #[serde(rename = "right")]
    pub value: NodeRef,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "String")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Less,
    Greater,
    LessEq,
    GreaterEq,
    Eq,
    NotEq,
    /// Operator text the evaluator has no rule for; fails at evaluation time.
    Unsupported(Rc<str>),
}

impl From<&str> for BinaryOp {
    fn from(op: &str) -> Self {
        match op {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Mod,
            "<" => BinaryOp::Less,
            ">" => BinaryOp::Greater,
            "<=" => BinaryOp::LessEq,
            ">=" => BinaryOp::GreaterEq,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::NotEq,
            other => BinaryOp::Unsupported(Rc::from(other)),
        }
    }
}

impl From<String> for BinaryOp {
    fn from(op: String) -> Self {
        BinaryOp::from(op.as_str())
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEq => "<=",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Unsupported(op) => &**op,
        };
        f.write_str(text)
    }
}

/// Malformed input tree.
#[derive(Debug)]
pub struct AstError(serde_json::Error);

impl fmt::Display for AstError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed syntax tree: {}", self.0)
    }
}

impl std::error::Error for AstError {}

/// Constructors for building trees in Rust, mostly for hosts and tests.
/// Nodes built here carry no source position.
pub mod build {
    use super::*;

    fn list(items: Vec<NodeRef>) -> NodeList {
        Rc::from(items)
    }

    fn idents(names: &[&str]) -> Rc<[Ident]> {
        names.iter().map(|name| Ident::new(name)).collect()
    }

    pub fn null() -> NodeRef {
        Node::new(NodeKind::NullLiteral)
    }

    pub fn undefined() -> NodeRef {
        Node::new(NodeKind::UndefinedLiteral)
    }

    pub fn boolean(value: bool) -> NodeRef {
        Node::new(NodeKind::BooleanLiteral { value })
    }

    pub fn number(value: f64) -> NodeRef {
        Node::new(NodeKind::NumberLiteral { value })
    }

    pub fn string(value: &str) -> NodeRef {
        Node::new(NodeKind::StringLiteral { value: Rc::from(value) })
    }

    pub fn ident(name: &str) -> NodeRef {
        Node::new(NodeKind::Identifier { name: Rc::from(name) })
    }

    pub fn binary(op: &str, left: NodeRef, right: NodeRef) -> NodeRef {
        Node::new(NodeKind::Binary { op: BinaryOp::from(op), left, right })
    }

    pub fn and(left: NodeRef, right: NodeRef) -> NodeRef {
        Node::new(NodeKind::And { left, right })
    }

    pub fn or(left: NodeRef, right: NodeRef) -> NodeRef {
        Node::new(NodeKind::Or { left, right })
    }

    pub fn assign(left: NodeRef, right: NodeRef) -> NodeRef {
        Node::new(NodeKind::Assign { left, right })
    }

    pub fn cond(expr: NodeRef, then: Option<NodeRef>, otherwise: Option<NodeRef>) -> NodeRef {
        Node::new(NodeKind::Condition { expr, then, otherwise })
    }

    pub fn if_else(expr: NodeRef, then: NodeRef, otherwise: NodeRef) -> NodeRef {
        cond(expr, Some(then), Some(otherwise))
    }

    pub fn prog(items: Vec<NodeRef>) -> NodeRef {
        Node::new(NodeKind::Prog { items: list(items) })
    }

    pub fn block(items: Vec<NodeRef>) -> NodeRef {
        Node::new(NodeKind::Block { items: list(items) })
    }

    pub fn seq(items: Vec<NodeRef>) -> NodeRef {
        Node::new(NodeKind::ExprSequence { items: list(items) })
    }

    pub fn let_(name: &str, init: NodeRef) -> NodeRef {
        Node::new(NodeKind::VarDeclaration { name: Ident::new(name), init })
    }

    pub fn lets(items: Vec<NodeRef>) -> NodeRef {
        Node::new(NodeKind::VarDeclarationList { items: list(items) })
    }

    /// Anonymous function `(params) -> body`.
    pub fn lambda(params: &[&str], body: NodeRef) -> NodeRef {
        Node::new(NodeKind::FunDeclaration { name: None, params: idents(params), body })
    }

    /// Named function `fun name(params) { body }`.
    pub fn fun(name: &str, params: &[&str], body: NodeRef) -> NodeRef {
        Node::new(NodeKind::FunDeclaration {
            name: Some(Ident::new(name)),
            params: idents(params),
            body,
        })
    }

    pub fn call(callee: NodeRef, args: Vec<NodeRef>) -> NodeRef {
        Node::new(NodeKind::FunCall { callee, args: list(args) })
    }

    /// Call of a function bound to `name`.
    pub fn call_named(name: &str, args: Vec<NodeRef>) -> NodeRef {
        call(ident(name), args)
    }

    pub fn array(items: Vec<NodeRef>) -> NodeRef {
        Node::new(NodeKind::ArrayLiteral { items: list(items) })
    }

    pub fn object(properties: Vec<(NodeRef, NodeRef)>) -> NodeRef {
        let properties = properties
            .into_iter()
            .map(|(key, value)| Property { key, value })
            .collect();
        Node::new(NodeKind::ObjectLiteral { properties })
    }

    pub fn index(target: NodeRef, key: NodeRef) -> NodeRef {
        Node::new(NodeKind::MemberIndex { target, key })
    }

    pub fn dot(target: NodeRef, name: &str) -> NodeRef {
        Node::new(NodeKind::MemberDot { target, name: Ident::new(name) })
    }

    pub fn this() -> NodeRef {
        Node::new(NodeKind::This)
    }

    pub fn for_(bindings: &[&str], source: NodeRef, body: NodeRef) -> NodeRef {
        Node::new(NodeKind::For { bindings: idents(bindings), source, body })
    }

    pub fn break_() -> NodeRef {
        Node::new(NodeKind::Break)
    }

    pub fn discard() -> NodeRef {
        Node::new(NodeKind::Discard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_parser_output() {
        let program = Node::from_json(r#"{
            "type": "prog", "lineNumber": 1, "charIndex": 0,
            "exprList": [
                {"type": "varDeclarationList", "lineNumber": 1, "charIndex": 0, "exprList": [
                    {"type": "varDeclaration", "lineNumber": 1, "charIndex": 4,
                     "left": {"type": "identifier", "name": "a", "lineNumber": 1, "charIndex": 4},
                     "right": {"type": "numberLiteral", "value": 1, "lineNumber": 1, "charIndex": 8}}
                ]},
                {"type": "binary", "op": "+", "lineNumber": 2, "charIndex": 0,
                 "left": {"type": "identifier", "name": "a", "lineNumber": 2, "charIndex": 0},
                 "right": {"type": "numberLiteral", "value": 2.5, "lineNumber": 2, "charIndex": 4}}
            ]
        }"#).unwrap();

        let NodeKind::Prog { items } = &program.kind else {
            panic!("expected prog, got {:?}", program.kind);
        };
        assert_eq!(items.len(), 2);
        let NodeKind::Binary { op, right, .. } = &items[1].kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert_eq!(right.kind, NodeKind::NumberLiteral { value: 2.5 });
        assert_eq!(items[1].span(), Span::new(2, 0));
    }

    #[test]
    fn test_deserialize_optional_and_renamed_fields() {
        let node = Node::from_json(r#"{
            "type": "condition",
            "expr": {"type": "booleanLiteral", "value": true},
            "then": {"type": "this"},
            "else": null
        }"#).unwrap();
        let NodeKind::Condition { then, otherwise, .. } = &node.kind else {
            panic!("expected condition");
        };
        assert_eq!(then.as_ref().map(|n| n.kind.clone()), Some(NodeKind::This));
        assert!(otherwise.is_none());
        assert!(node.span().is_dummy());
    }

    #[test]
    fn test_deserialize_function_and_for() {
        let node = Node::from_json(r#"{
            "type": "for",
            "keyVal": [{"type": "identifier", "name": "k"}, {"type": "identifier", "name": "v"}],
            "stuff": {"type": "objectLiteral", "properties": [
                {"type": "objectProperty",
                 "left": {"type": "stringLiteral", "value": "x"},
                 "right": {"type": "funDeclaration", "name": null,
                           "formalParamList": [{"type": "identifier", "name": "n"}],
                           "body": {"type": "block", "exprList": [{"type": "discard"}]}}}
            ]},
            "body": {"type": "break"}
        }"#).unwrap();
        let NodeKind::For { bindings, source, body } = &node.kind else {
            panic!("expected for");
        };
        assert_eq!(bindings.iter().map(|b| &*b.name).collect::<Vec<_>>(), vec!["k", "v"]);
        assert!(matches!(source.kind, NodeKind::ObjectLiteral { .. }));
        assert_eq!(body.kind, NodeKind::Break);
    }

    #[test]
    fn test_unknown_operator_survives_parsing() {
        let node = Node::from_json(r#"{"type": "binary", "op": "**",
            "left": {"type": "nullLiteral", "value": null},
            "right": {"type": "undefinedLiteral"}}"#).unwrap();
        let NodeKind::Binary { op, .. } = &node.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Unsupported(Rc::from("**")));
        assert_eq!(op.to_string(), "**");
    }

    #[test]
    fn test_unknown_node_type_is_rejected() {
        let err = Node::from_json(r#"{"type": "whileLoop"}"#).unwrap_err();
        assert!(err.to_string().starts_with("malformed syntax tree"));
    }
}
