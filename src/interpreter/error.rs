use crate::diagnostic::{Diagnostic, Label, Span};

#[derive(Debug, Clone, PartialEq)]
pub enum InterpreterError {
    UndefinedVariable { name: String, span: Span },
    DuplicateDefinition { name: String, span: Span },
    ImmutableBinding { name: String, span: Span },
    DivisionByZero { span: Span },
    UnsupportedOperator { op: String, span: Span },
    UnmatchedException { code: String, message: Option<String>, span: Span },
    TypeError { message: String, span: Span },
    IndexOutOfBounds { index: usize, length: usize, span: Span },
    InvalidOperation { message: String, span: Span },
}

impl InterpreterError {
    // Constructors without a position; the evaluator attaches one with `at`
    pub fn undefined_variable(name: impl Into<String>) -> Self {
        Self::UndefinedVariable { name: name.into(), span: Span::dummy() }
    }

    pub fn duplicate_definition(name: impl Into<String>) -> Self {
        Self::DuplicateDefinition { name: name.into(), span: Span::dummy() }
    }

    pub fn immutable_binding(name: impl Into<String>) -> Self {
        Self::ImmutableBinding { name: name.into(), span: Span::dummy() }
    }

    pub fn division_by_zero() -> Self {
        Self::DivisionByZero { span: Span::dummy() }
    }

    pub fn unsupported_operator(op: impl Into<String>) -> Self {
        Self::UnsupportedOperator { op: op.into(), span: Span::dummy() }
    }

    pub fn unmatched_exception(code: impl Into<String>, message: Option<String>) -> Self {
        Self::UnmatchedException { code: code.into(), message, span: Span::dummy() }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::TypeError { message: message.into(), span: Span::dummy() }
    }

    pub fn index_out_of_bounds(index: usize, length: usize) -> Self {
        Self::IndexOutOfBounds { index, length, span: Span::dummy() }
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation { message: message.into(), span: Span::dummy() }
    }

    /// Attach a source position unless the error already carries one.
    pub fn at(mut self, at: Span) -> Self {
        let span = match &mut self {
            Self::UndefinedVariable { span, .. } => span,
            Self::DuplicateDefinition { span, .. } => span,
            Self::ImmutableBinding { span, .. } => span,
            Self::DivisionByZero { span } => span,
            Self::UnsupportedOperator { span, .. } => span,
            Self::UnmatchedException { span, .. } => span,
            Self::TypeError { span, .. } => span,
            Self::IndexOutOfBounds { span, .. } => span,
            Self::InvalidOperation { span, .. } => span,
        };
        if span.is_dummy() {
            *span = at;
        }
        self
    }

    /// Get the span associated with this error
    pub fn span(&self) -> Span {
        match self {
            Self::UndefinedVariable { span, .. } => *span,
            Self::DuplicateDefinition { span, .. } => *span,
            Self::ImmutableBinding { span, .. } => *span,
            Self::DivisionByZero { span } => *span,
            Self::UnsupportedOperator { span, .. } => *span,
            Self::UnmatchedException { span, .. } => *span,
            Self::TypeError { span, .. } => *span,
            Self::IndexOutOfBounds { span, .. } => *span,
            Self::InvalidOperation { span, .. } => *span,
        }
    }

    /// Convert to a diagnostic for pretty printing
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::UndefinedVariable { name, span } => {
                Diagnostic::error(format!("undefined variable `{}`", name))
                    .with_code("E0201")
                    .with_label(Label::primary(*span, "not found in this scope"))
            }
            Self::DuplicateDefinition { name, span } => {
                Diagnostic::error(format!("`{}` is already defined in this scope", name))
                    .with_code("E0202")
                    .with_label(Label::primary(*span, "redeclared here"))
                    .with_help("assign to the existing binding or declare it in an inner scope")
            }
            Self::ImmutableBinding { name, span } => {
                Diagnostic::error(format!("cannot assign to builtin `{}`", name))
                    .with_code("E0203")
                    .with_label(Label::primary(*span, "builtins are immutable"))
            }
            Self::DivisionByZero { span } => {
                Diagnostic::error("division by zero")
                    .with_code("E0204")
                    .with_label(Label::primary(*span, "division by zero here"))
            }
            Self::UnsupportedOperator { op, span } => {
                Diagnostic::error(format!("unsupported operator `{}`", op))
                    .with_code("E0205")
                    .with_label(Label::primary(*span, ""))
            }
            Self::UnmatchedException { code, message, span } => {
                let diagnostic = Diagnostic::error(format!("uncaught exception `{}`", code))
                    .with_code("E0206")
                    .with_label(Label::primary(*span, "thrown here"));
                match message {
                    Some(message) => diagnostic.with_note(message.clone()),
                    None => diagnostic,
                }
            }
            Self::TypeError { message, span } => {
                Diagnostic::error(format!("type error: {}", message))
                    .with_code("E0207")
                    .with_label(Label::primary(*span, ""))
            }
            Self::IndexOutOfBounds { index, length, span } => {
                Diagnostic::error(format!("index out of bounds: index is {} but length is {}", index, length))
                    .with_code("E0208")
                    .with_label(Label::primary(*span, format!("index {} is out of bounds", index)))
            }
            Self::InvalidOperation { message, span } => {
                Diagnostic::error(format!("invalid operation: {}", message))
                    .with_code("E0209")
                    .with_label(Label::primary(*span, ""))
            }
        }
    }
}

impl std::fmt::Display for InterpreterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterpreterError::UndefinedVariable { name, .. } => {
                write!(f, "Undefined variable: {}", name)
            }
            InterpreterError::DuplicateDefinition { name, .. } => {
                write!(f, "Duplicate definition: {}", name)
            }
            InterpreterError::ImmutableBinding { name, .. } => {
                write!(f, "Cannot assign to immutable binding: {}", name)
            }
            InterpreterError::DivisionByZero { .. } => write!(f, "Divide by zero"),
            InterpreterError::UnsupportedOperator { op, .. } => {
                write!(f, "Unsupported operator {}", op)
            }
            InterpreterError::UnmatchedException { code, message, .. } => match message {
                Some(message) => write!(f, "Uncaught exception {}: {}", code, message),
                None => write!(f, "Uncaught exception {}", code),
            },
            InterpreterError::TypeError { message, .. } => write!(f, "Type error: {}", message),
            InterpreterError::IndexOutOfBounds { index, length, .. } => {
                write!(f, "Index out of bounds: {} (length: {})", index, length)
            }
            InterpreterError::InvalidOperation { message, .. } => write!(f, "Invalid operation: {}", message),
        }
    }
}

impl std::error::Error for InterpreterError {}
