use crate::error::{CompileError, CompileResult};
use crate::span::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Number,
    Identifier,

    // Keywords
    Def,
    If,
    Elif,
    Else,
    While,
    Pass,
    Return,
    True,
    False,
    NoneKeyword,
    Not,
    Is,
    And,
    Or,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    Assign,
    EqualTo,
    NotEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Arrow,

    // Punctuation
    LParen,
    RParen,
    Colon,
    Comma,

    // Layout
    Newline,
    Indent,
    Dedent,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn text<'a>(&self, src: &'a str) -> &'a str {
        self.span.text(src)
    }
}

fn keyword(ident: &str) -> Option<TokenKind> {
    let kind = match ident {
        "def" => TokenKind::Def,
        "if" => TokenKind::If,
        "elif" => TokenKind::Elif,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "pass" => TokenKind::Pass,
        "return" => TokenKind::Return,
        "True" => TokenKind::True,
        "False" => TokenKind::False,
        "None" => TokenKind::NoneKeyword,
        "not" => TokenKind::Not,
        "is" => TokenKind::Is,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        _ => return None,
    };
    Some(kind)
}

/// Split `input` into tokens, turning leading whitespace into
/// `Indent`/`Dedent` tokens. The stream always ends with `Eof`.
pub fn lex(input: &str) -> CompileResult<Vec<Token>> {
    let mut tokens: Vec<Token> = Vec::new();
    let bytes = input.as_bytes();
    let mut indents: Vec<usize> = vec![0];
    let mut paren_depth = 0usize;
    let mut at_line_start = true;
    let mut i = 0;

    while i < bytes.len() {
        if at_line_start && paren_depth == 0 {
            let line_start = i;
            let mut width = 0;
            while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
                if bytes[i] == b'\t' {
                    return Err(CompileError::syntax_at(
                        "Tabs are not allowed in indentation",
                        Span::new(i, i + 1),
                    ));
                }
                width += 1;
                i += 1;
            }
            // Blank and comment-only lines do not affect indentation.
            if i >= bytes.len() || matches!(bytes[i], b'\n' | b'\r' | b'#') {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                i += 1;
                continue;
            }
            at_line_start = false;

            let current = indents.last().copied().unwrap_or(0);
            if width > current {
                indents.push(width);
                tokens.push(Token {
                    kind: TokenKind::Indent,
                    span: Span::new(line_start, i),
                });
            } else if width < current {
                while indents.last().is_some_and(|&top| top > width) {
                    indents.pop();
                    tokens.push(Token {
                        kind: TokenKind::Dedent,
                        span: Span::new(i, i),
                    });
                }
                if indents.last().copied() != Some(width) {
                    return Err(CompileError::syntax_at(
                        "Unindent does not match any outer indentation level",
                        Span::new(line_start, i),
                    ));
                }
            }
            continue;
        }

        let start = i;
        let c = bytes[i] as char;

        if c == '\n' {
            if paren_depth == 0 {
                push_newline(&mut tokens, start);
                at_line_start = true;
            }
            i += 1;
            continue;
        }

        if c == ' ' || c == '\t' || c == '\r' {
            i += 1;
            continue;
        }

        if c == '#' {
            while i < bytes.len() && bytes[i] != b'\n' {
                i += 1;
            }
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            let kind = keyword(&input[start..i]).unwrap_or(TokenKind::Identifier);
            tokens.push(Token {
                kind,
                span: Span::new(start, i),
            });
            continue;
        }

        if c.is_ascii_digit() {
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i < bytes.len() && (bytes[i].is_ascii_alphabetic() || bytes[i] == b'_') {
                return Err(CompileError::syntax_at(
                    "Invalid number literal",
                    Span::new(start, i + 1),
                ));
            }
            tokens.push(Token {
                kind: TokenKind::Number,
                span: Span::new(start, i),
            });
            continue;
        }

        let next = bytes.get(i + 1).map(|&b| b as char);
        let (kind, len) = match (c, next) {
            ('/', Some('/')) => (TokenKind::DoubleSlash, 2),
            ('=', Some('=')) => (TokenKind::EqualTo, 2),
            ('!', Some('=')) => (TokenKind::NotEqual, 2),
            ('<', Some('=')) => (TokenKind::LessThanEqual, 2),
            ('>', Some('=')) => (TokenKind::GreaterThanEqual, 2),
            ('-', Some('>')) => (TokenKind::Arrow, 2),
            ('+', _) => (TokenKind::Plus, 1),
            ('-', _) => (TokenKind::Minus, 1),
            ('*', _) => (TokenKind::Star, 1),
            ('/', _) => (TokenKind::Slash, 1),
            ('%', _) => (TokenKind::Percent, 1),
            ('=', _) => (TokenKind::Assign, 1),
            ('<', _) => (TokenKind::LessThan, 1),
            ('>', _) => (TokenKind::GreaterThan, 1),
            (':', _) => (TokenKind::Colon, 1),
            (',', _) => (TokenKind::Comma, 1),
            ('(', _) => {
                paren_depth += 1;
                (TokenKind::LParen, 1)
            }
            (')', _) => {
                paren_depth = paren_depth.saturating_sub(1);
                (TokenKind::RParen, 1)
            }
            _ => {
                let ch = input[i..].chars().next().unwrap_or(c);
                return Err(CompileError::syntax_at(
                    format!("Unexpected character: '{}'", ch),
                    Span::new(start, start + ch.len_utf8()),
                ));
            }
        };

        i += len;
        tokens.push(Token {
            kind,
            span: Span::new(start, i),
        });
    }

    let end = input.len();
    push_newline(&mut tokens, end);
    while indents.len() > 1 {
        indents.pop();
        tokens.push(Token {
            kind: TokenKind::Dedent,
            span: Span::new(end, end),
        });
    }
    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(end, end),
    });

    log::trace!("lexed {} tokens", tokens.len());
    Ok(tokens)
}

/// Logical lines end once; empty lines never produce a `Newline`.
fn push_newline(tokens: &mut Vec<Token>, at: usize) {
    if matches!(
        tokens.last().map(|t| t.kind),
        None | Some(TokenKind::Newline) | Some(TokenKind::Indent) | Some(TokenKind::Dedent)
    ) {
        return;
    }
    tokens.push(Token {
        kind: TokenKind::Newline,
        span: Span::new(at, at + 1),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use TokenKind::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn simple_declaration() {
        assert_eq!(
            kinds("x: int = 5"),
            vec![Identifier, Colon, Identifier, Assign, Number, Newline, Eof]
        );
    }

    #[test]
    fn indentation_blocks() {
        let src = "while x:\n  pass\n  if y:\n    pass\nx = 1\n";
        assert_eq!(
            kinds(src),
            vec![
                While, Identifier, Colon, Newline, Indent, Pass, Newline, If, Identifier, Colon,
                Newline, Indent, Pass, Newline, Dedent, Dedent, Identifier, Assign, Number,
                Newline, Eof
            ]
        );
    }

    #[test]
    fn dedents_are_closed_at_end_of_input() {
        assert_eq!(
            kinds("def f():\n  pass"),
            vec![
                Def, Identifier, LParen, RParen, Colon, Newline, Indent, Pass, Newline, Dedent,
                Eof
            ]
        );
    }

    #[test]
    fn blank_lines_and_comments_are_skipped() {
        let src = "# header\n\nx = 1  # trailing\n\n   \n# done\n";
        assert_eq!(kinds(src), vec![Identifier, Assign, Number, Newline, Eof]);
    }

    #[test]
    fn newlines_inside_parens_are_ignored() {
        assert_eq!(
            kinds("f(1,\n  2)\n"),
            vec![Identifier, LParen, Number, Comma, Number, RParen, Newline, Eof]
        );
    }

    #[test]
    fn multi_char_operators() {
        assert_eq!(
            kinds("a // b != c -> d <= e >= f == g / h"),
            vec![
                Identifier, DoubleSlash, Identifier, NotEqual, Identifier, Arrow, Identifier,
                LessThanEqual, Identifier, GreaterThanEqual, Identifier, EqualTo, Identifier,
                Slash, Identifier, Newline, Eof
            ]
        );
    }

    #[test]
    fn keywords() {
        assert_eq!(
            kinds("not x is None and True or False"),
            vec![Not, Identifier, Is, NoneKeyword, And, True, Or, False, Newline, Eof]
        );
    }

    #[test]
    fn inconsistent_dedent_is_rejected() {
        let err = lex("if x:\n    pass\n  pass\n").unwrap_err();
        assert!(err.message().contains("Unindent"));
    }

    #[test]
    fn tabs_are_rejected() {
        assert!(lex("if x:\n\tpass\n").is_err());
    }

    #[test]
    fn unexpected_character() {
        let err = lex("x = $").unwrap_err();
        assert_eq!(err.span(), Some(Span::new(4, 5)));
    }
}
