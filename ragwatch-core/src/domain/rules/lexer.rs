// ragwatch-core/src/domain/rules/lexer.rs

use crate::domain::rules::error::CompileError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Int(i64),
    Str(String),
    LParen,
    RParen,
    Dot,
    Comma,
    Arrow,
    Bang,
    Plus,
    Minus,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, CompileError> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let (pos, c) = chars[i];
        let next = chars.get(i + 1).map(|(_, c)| *c);

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let (kind, width) = match (c, next) {
            ('(', _) => (TokenKind::LParen, 1),
            (')', _) => (TokenKind::RParen, 1),
            ('.', _) => (TokenKind::Dot, 1),
            (',', _) => (TokenKind::Comma, 1),
            ('+', _) => (TokenKind::Plus, 1),
            ('-', _) => (TokenKind::Minus, 1),
            ('=', Some('>')) => (TokenKind::Arrow, 2),
            ('=', Some('=')) => (TokenKind::EqEq, 2),
            ('!', Some('=')) => (TokenKind::NotEq, 2),
            ('!', _) => (TokenKind::Bang, 1),
            ('<', Some('=')) => (TokenKind::Le, 2),
            ('<', _) => (TokenKind::Lt, 1),
            ('>', Some('=')) => (TokenKind::Ge, 2),
            ('>', _) => (TokenKind::Gt, 1),
            ('&', Some('&')) => (TokenKind::AndAnd, 2),
            ('|', Some('|')) => (TokenKind::OrOr, 2),
            ('"', _) | ('\'', _) => {
                let (text, consumed) = read_string(&chars, i)?;
                tokens.push(Token {
                    kind: TokenKind::Str(text),
                    position: pos,
                });
                i += consumed;
                continue;
            }
            (c, _) if c.is_ascii_digit() => {
                let start = i;
                while i < chars.len() && chars[i].1.is_ascii_digit() {
                    i += 1;
                }
                let digits: String = chars[start..i].iter().map(|(_, c)| *c).collect();
                let value = digits.parse::<i64>().map_err(|_| CompileError::Syntax {
                    position: pos,
                    message: format!("integer literal '{}' is out of range", digits),
                })?;
                tokens.push(Token {
                    kind: TokenKind::Int(value),
                    position: pos,
                });
                continue;
            }
            (c, _) if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].1.is_alphanumeric() || chars[i].1 == '_') {
                    i += 1;
                }
                let ident: String = chars[start..i].iter().map(|(_, c)| *c).collect();
                tokens.push(Token {
                    kind: TokenKind::Ident(ident),
                    position: pos,
                });
                continue;
            }
            (c, _) => {
                return Err(CompileError::Syntax {
                    position: pos,
                    message: format!("unexpected character '{}'", c),
                });
            }
        };

        tokens.push(Token {
            kind,
            position: pos,
        });
        i += width;
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        position: source.len(),
    });
    Ok(tokens)
}

/// Reads a quoted literal starting at `start`; returns the text and the
/// number of chars consumed (quotes included).
fn read_string(chars: &[(usize, char)], start: usize) -> Result<(String, usize), CompileError> {
    let (pos, quote) = chars[start];
    let mut text = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        let c = chars[i].1;
        if c == quote {
            return Ok((text, i - start + 1));
        }
        if c == '\\' {
            let escaped = chars.get(i + 1).map(|(_, c)| *c).ok_or(CompileError::Syntax {
                position: chars[i].0,
                message: "dangling escape".to_string(),
            })?;
            text.push(match escaped {
                'n' => '\n',
                't' => '\t',
                other => other,
            });
            i += 2;
            continue;
        }
        text.push(c);
        i += 1;
    }

    Err(CompileError::Syntax {
        position: pos,
        message: "unterminated string literal".to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_operators_and_lambda() {
        assert_eq!(
            kinds("!runs.any(r => r.loaded >= 10)"),
            vec![
                TokenKind::Bang,
                TokenKind::Ident("runs".into()),
                TokenKind::Dot,
                TokenKind::Ident("any".into()),
                TokenKind::LParen,
                TokenKind::Ident("r".into()),
                TokenKind::Arrow,
                TokenKind::Ident("r".into()),
                TokenKind::Dot,
                TokenKind::Ident("loaded".into()),
                TokenKind::Ge,
                TokenKind::Int(10),
                TokenKind::RParen,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#""fa\"il""#),
            vec![TokenKind::Str("fa\"il".into()), TokenKind::Eof]
        );
    }

    #[test]
    fn test_rejects_single_ampersand() {
        let err = tokenize("a & b").unwrap_err();
        assert!(matches!(err, CompileError::Syntax { position: 2, .. }));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(
            tokenize("\"fail"),
            Err(CompileError::Syntax { position: 0, .. })
        ));
    }
}
