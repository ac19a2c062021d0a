use crate::span::Span;
use thiserror::Error;

pub type CompileResult<T> = Result<T, CompileError>;

/// Which pipeline stage rejected the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Type,
    Internal,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompileError {
    /// Structural grammar violation found while building the AST.
    #[error("SyntaxError: {message}")]
    Syntax {
        message: String,
        span: Option<Span>,
    },
    /// Static typing or control-flow rule violation.
    #[error("TypeError: {message}")]
    Type {
        message: String,
        span: Option<Span>,
    },
    /// The code generator met a tree the checker should have rejected.
    #[error("internal compiler error: {message}")]
    Internal { message: String },
}

impl CompileError {
    pub fn syntax_at(message: impl Into<String>, span: Span) -> Self {
        CompileError::Syntax {
            message: message.into(),
            span: Some(span),
        }
    }

    pub fn type_at(message: impl Into<String>, span: Span) -> Self {
        CompileError::Type {
            message: message.into(),
            span: Some(span),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        CompileError::Internal {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CompileError::Syntax { .. } => ErrorKind::Syntax,
            CompileError::Type { .. } => ErrorKind::Type,
            CompileError::Internal { .. } => ErrorKind::Internal,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            CompileError::Syntax { message, .. }
            | CompileError::Type { message, .. }
            | CompileError::Internal { message } => message,
        }
    }

    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::Syntax { span, .. } | CompileError::Type { span, .. } => *span,
            CompileError::Internal { .. } => None,
        }
    }

    /// Render the error with a caret line pointing into `src`.
    pub fn display(&self, src: &str) -> String {
        let mut result = format!("Error: {}", self);
        if let Some(span) = self.span() {
            let start = span.start.min(src.len());
            let mut line_start = 0;
            let mut line_num = 1;
            for (i, c) in src.char_indices() {
                if i >= start {
                    break;
                }
                if c == '\n' {
                    line_start = i + 1;
                    line_num += 1;
                }
            }
            let line_end = src[line_start..]
                .find('\n')
                .map(|i| line_start + i)
                .unwrap_or(src.len());
            let line = &src[line_start..line_end];
            let col_num = src[line_start..start].chars().count() + 1;
            let width = span.end.min(line_end).saturating_sub(start).max(1);

            result.push_str(&format!("\n --> line {}, col {}", line_num, col_num));
            result.push_str("\n   |\n");
            result.push_str(&format!("{:>2} | {}\n", line_num, line));
            result.push_str(&format!(
                "   | {}{}",
                " ".repeat(col_num - 1),
                "^".repeat(width)
            ));
        }
        result
    }
}
