use std::fmt;

/// A position in the source program, as reported by the parser.
///
/// Lines are 1-based, columns are 0-based character offsets into the line.
/// Nodes built by hand carry a dummy span (line 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    pub fn dummy() -> Self {
        Self { line: 0, column: 0 }
    }

    pub fn is_dummy(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column + 1)
    }
}

/// A label pointing to a specific position in the source
#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

impl Label {
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

/// A complete diagnostic message for a fatal runtime error
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Option<String>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.notes.push(format!("help: {}", help.into()));
        self
    }
}

const RED: &str = "31";
const RED_BOLD: &str = "1;31";
const BLUE: &str = "34";
const BOLD: &str = "1";

/// Renders diagnostics against the program's source text, rustc style.
pub struct DiagnosticRenderer<'a> {
    source: &'a str,
    file_name: &'a str,
    use_color: bool,
}

impl<'a> DiagnosticRenderer<'a> {
    pub fn new(source: &'a str, file_name: &'a str, use_color: bool) -> Self {
        Self {
            source,
            file_name,
            use_color,
        }
    }

    /// Header, then the source line under each positioned label, then notes.
    /// Labels without a position contribute nothing.
    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let severity = match &diagnostic.code {
            Some(code) => format!("error[{}]", code),
            None => "error".to_string(),
        };
        let mut output = format!("{}: {}\n", self.paint(RED_BOLD, &severity), self.paint(BOLD, &diagnostic.message));

        let positioned: Vec<&Label> = diagnostic.labels.iter().filter(|label| !label.span.is_dummy()).collect();
        if let Some(first) = positioned.first() {
            let width = positioned.iter().map(|label| label.span.line).max().unwrap_or(1).to_string().len();
            output += &format!("  {} {}:{}\n", self.paint(BLUE, "-->"), self.file_name, first.span);
            output += &self.gutter(width, "");
            for label in &positioned {
                self.render_label(&mut output, label, width);
            }
            output += &self.gutter(width, "");
        }

        for note in &diagnostic.notes {
            output += &format!("  {} {}\n", self.paint(BLUE, "="), note);
        }
        output
    }

    /// One line after the `|` margin; `width` is the widest line number.
    fn gutter(&self, width: usize, text: &str) -> String {
        let line = format!("{:width$} {} {}", "", self.paint(BLUE, "|"), text, width = width + 1);
        format!("{}\n", line.trim_end())
    }

    fn render_label(&self, output: &mut String, label: &Label, width: usize) {
        let Some(line) = label.span.line.checked_sub(1).and_then(|index| self.source.lines().nth(index)) else {
            return;
        };
        let number = format!("{:>width$}", label.span.line, width = width + 1);
        *output += &format!("{} {} {}\n", self.paint(BLUE, &number), self.paint(BLUE, "|"), line);

        let caret = match label.message.as_str() {
            "" => "^".to_string(),
            message => format!("^ {}", message),
        };
        *output += &self.gutter(width, &format!("{}{}", " ".repeat(label.span.column), self.paint(RED, &caret)));
    }

    fn paint(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("\x1b[{}m{}\x1b[0m", style, text)
        } else {
            text.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_display_is_one_based_column() {
        assert_eq!(Span::new(3, 0).to_string(), "3:1");
        assert!(Span::dummy().is_dummy());
    }

    #[test]
    fn test_diagnostic_rendering() {
        let source = "let a = 1\nprintln(b)\n";
        let diagnostic = Diagnostic::error("undefined variable `b`")
            .with_code("E0201")
            .with_label(Label::primary(Span::new(2, 8), "not found in this scope"))
            .with_help("declare it with `let` first");

        let renderer = DiagnosticRenderer::new(source, "main.circ", false);
        let output = renderer.render(&diagnostic);

        assert!(output.contains("error[E0201]"));
        assert!(output.contains("main.circ:2:9"));
        assert!(output.contains("println(b)"));
        assert!(output.contains("        ^ not found in this scope"));
        assert!(output.contains("help: declare it with `let` first"));
    }

    #[test]
    fn test_dummy_span_renders_header_only() {
        let diagnostic = Diagnostic::error("division by zero").with_code("E0205")
            .with_label(Label::primary(Span::dummy(), "here"));
        let output = DiagnosticRenderer::new("", "main.circ", false).render(&diagnostic);
        assert_eq!(output, "error[E0205]: division by zero\n");
    }
}
