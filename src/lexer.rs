// Clue tokenizer: one lowercased, trimmed line in, a flat token list out.

use thiserror::Error;

/// Polarity marker: `~ab = 1` counts criminals among A and B instead of innocents
pub const POLARITY_MARKER: char = '~';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Polarity {
    Innocent,
    Criminal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// A run of ASCII letters, possibly prefixed by the polarity marker
    Letters { text: String, polarity: Polarity },
    Number(u32),
    /// Operators and punctuation
    Symbol(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// 1-based column of the first character
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unexpected character '{ch}' at column {column}")]
    UnexpectedChar { ch: char, column: usize },

    #[error("the '~' marker at column {column} must be followed by letters")]
    DanglingMarker { column: usize },

    #[error("number '{text}' at column {column} is too large")]
    NumberTooLarge { text: String, column: usize },
}

fn is_symbol_char(c: char) -> bool {
    !c.is_whitespace() && !c.is_alphanumeric() && c != POLARITY_MARKER
}

pub fn tokenize(line: &str) -> Result<Vec<Token>, LexError> {
    let chars: Vec<char> = line.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let column = i + 1;

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c == POLARITY_MARKER || c.is_ascii_alphabetic() {
            let polarity = if c == POLARITY_MARKER {
                i += 1;
                Polarity::Criminal
            } else {
                Polarity::Innocent
            };

            let start = i;
            while i < chars.len() && chars[i].is_ascii_alphabetic() {
                i += 1;
            }
            if start == i {
                return Err(LexError::DanglingMarker { column });
            }

            tokens.push(Token {
                kind: TokenKind::Letters {
                    text: chars[start..i].iter().collect(),
                    polarity,
                },
                column,
            });
        } else if c.is_ascii_digit() {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            let text: String = chars[start..i].iter().collect();
            let value = text
                .parse::<u32>()
                .map_err(|_| LexError::NumberTooLarge { text: text.clone(), column })?;

            tokens.push(Token {
                kind: TokenKind::Number(value),
                column,
            });
        } else if is_symbol_char(c) {
            let start = i;
            while i < chars.len() && is_symbol_char(chars[i]) {
                i += 1;
            }
            tokens.push(Token {
                kind: TokenKind::Symbol(chars[start..i].iter().collect()),
                column,
            });
        } else {
            // Non-ASCII letters and digits
            return Err(LexError::UnexpectedChar { ch: c, column });
        }
    }

    Ok(tokens)
}
