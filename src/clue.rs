// Clue compiler: token sequence -> typed clue expression.
//
// Two clue shapes are recognized:
//   <letters> <op> <letters|number>          comparison of innocent counts
//   <letters> is connected|odd|even          structural predicate
//
// Either letter group may carry the `~` marker to count criminals instead.

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use crate::lexer::{self, LexError, Polarity, Token, TokenKind};

const PREDICATE_KEYWORDS: [&str; 3] = ["connected", "odd", "even"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    fn from_symbol(s: &str) -> Option<CompareOp> {
        match s {
            "=" | "==" => Some(CompareOp::Eq),
            "!=" | "<>" => Some(CompareOp::Ne),
            ">" => Some(CompareOp::Gt),
            ">=" => Some(CompareOp::Ge),
            "<" => Some(CompareOp::Lt),
            "<=" => Some(CompareOp::Le),
            _ => None,
        }
    }

    const fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        }
    }

    /// Integer semantics, used by the brute-force checks in tests
    #[cfg(test)]
    pub fn holds(&self, left: i64, right: i64) -> bool {
        match self {
            CompareOp::Eq => left == right,
            CompareOp::Ne => left != right,
            CompareOp::Gt => left > right,
            CompareOp::Ge => left >= right,
            CompareOp::Lt => left < right,
            CompareOp::Le => left <= right,
        }
    }
}

/// Ordered list of people, each counted when their status matches `polarity`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub people: Vec<char>,
    pub polarity: Polarity,
}

impl Group {
    /// Number of people in `assignment` (true = innocent) matching the polarity
    #[cfg(test)]
    pub fn count(&self, assignment: &std::collections::HashMap<char, bool>) -> i64 {
        self.people
            .iter()
            .filter(|p| assignment[*p] == (self.polarity == Polarity::Innocent))
            .count() as i64
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.polarity == Polarity::Criminal {
            write!(f, "{}", lexer::POLARITY_MARKER)?;
        }
        for p in &self.people {
            write!(f, "{}", p.to_ascii_uppercase())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Count(u32),
    Group(Group),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clue {
    Compare {
        left: Group,
        op: CompareOp,
        right: Operand,
    },
    Connected {
        group: Group,
    },
    Parity {
        group: Group,
        odd: bool,
    },
}

impl Clue {
    /// Every person the clue mentions as an operand (keywords excluded)
    pub fn people(&self) -> BTreeSet<char> {
        let mut people = BTreeSet::new();
        match self {
            Clue::Compare { left, right, .. } => {
                people.extend(left.people.iter().copied());
                if let Operand::Group(group) = right {
                    people.extend(group.people.iter().copied());
                }
            }
            Clue::Connected { group } | Clue::Parity { group, .. } => {
                people.extend(group.people.iter().copied());
            }
        }
        people
    }

    /// Evaluate against a total assignment (true = innocent)
    #[cfg(test)]
    pub fn holds(&self, assignment: &std::collections::HashMap<char, bool>) -> bool {
        match self {
            Clue::Compare { left, op, right } => {
                let rhs = match right {
                    Operand::Count(n) => i64::from(*n),
                    Operand::Group(group) => group.count(assignment),
                };
                op.holds(left.count(assignment), rhs)
            }
            Clue::Connected { group } => {
                let want = group.polarity == Polarity::Innocent;
                let hits: Vec<usize> = group
                    .people
                    .iter()
                    .enumerate()
                    .filter(|(_, p)| assignment[*p] == want)
                    .map(|(i, _)| i)
                    .collect();
                match (hits.first(), hits.last()) {
                    (Some(&first), Some(&last)) => hits.len() == last - first + 1,
                    _ => true,
                }
            }
            Clue::Parity { group, odd } => (group.count(assignment) % 2 == 1) == *odd,
        }
    }
}

impl fmt::Display for Clue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Clue::Compare { left, op, right } => {
                write!(f, "{} {} ", left, op.symbol())?;
                match right {
                    Operand::Count(n) => write!(f, "{}", n),
                    Operand::Group(group) => write!(f, "{}", group),
                }
            }
            Clue::Connected { group } => write!(f, "{} is connected", group),
            Clue::Parity { group, odd } => {
                write!(f, "{} is {}", group, if *odd { "odd" } else { "even" })
            }
        }
    }
}

/// Which half of the grammar rejected a clue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClueForm {
    Comparison,
    Predicate,
}

impl fmt::Display for ClueForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClueForm::Comparison => write!(f, "comparison clue"),
            ClueForm::Predicate => write!(f, "predicate clue"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{form}: {message}")]
pub struct SyntaxError {
    pub form: ClueForm,
    pub message: String,
}

impl SyntaxError {
    fn comparison(message: impl Into<String>) -> Self {
        SyntaxError {
            form: ClueForm::Comparison,
            message: message.into(),
        }
    }

    fn predicate(message: impl Into<String>) -> Self {
        SyntaxError {
            form: ClueForm::Predicate,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClueError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

/// Tokenize and compile one clue line
pub fn parse_clue(line: &str) -> Result<Clue, ClueError> {
    let tokens = lexer::tokenize(line)?;
    Ok(compile(&tokens)?)
}

pub fn compile(tokens: &[Token]) -> Result<Clue, SyntaxError> {
    // `<letters> is <word>`; anything else is treated as a comparison attempt
    match tokens {
        [Token {
            kind: TokenKind::Letters { text, polarity },
            ..
        }, Token {
            kind:
                TokenKind::Letters {
                    text: is,
                    polarity: Polarity::Innocent,
                },
            ..
        }, rest @ ..]
            if is == "is" =>
        {
            compile_predicate(letters_to_group(text, *polarity), rest)
        }
        _ => compile_comparison(tokens),
    }
}

fn letters_to_group(text: &str, polarity: Polarity) -> Group {
    Group {
        people: text.chars().map(|c| c.to_ascii_lowercase()).collect(),
        polarity,
    }
}

fn compile_comparison(tokens: &[Token]) -> Result<Clue, SyntaxError> {
    if tokens.is_empty() {
        return Err(SyntaxError::comparison("the clue is empty"));
    }

    let operators = tokens
        .iter()
        .filter(|t| matches!(t.kind, TokenKind::Symbol(_)))
        .count();
    if operators > 1 {
        return Err(SyntaxError::comparison(
            "only one comparison at a time is allowed",
        ));
    }

    if tokens.len() != 3 {
        return Err(SyntaxError::comparison(format!(
            "expected <letters> <operator> <letters or number>, got {} token{}",
            tokens.len(),
            if tokens.len() == 1 { "" } else { "s" }
        )));
    }

    let left = match &tokens[0].kind {
        TokenKind::Letters { text, polarity } => letters_to_group(text, *polarity),
        _ => {
            return Err(SyntaxError::comparison(
                "the left side must be a group of letters",
            ))
        }
    };

    let op = match &tokens[1].kind {
        TokenKind::Symbol(s) => CompareOp::from_symbol(s).ok_or_else(|| {
            SyntaxError::comparison(format!(
                "unsupported operator '{}' (use =, !=, >, >=, <, <=)",
                s
            ))
        })?,
        _ => {
            return Err(SyntaxError::comparison(format!(
                "expected an operator at column {}",
                tokens[1].column
            )))
        }
    };

    let right = match &tokens[2].kind {
        TokenKind::Number(n) => Operand::Count(*n),
        TokenKind::Letters { text, polarity } => {
            Operand::Group(letters_to_group(text, *polarity))
        }
        TokenKind::Symbol(_) => {
            return Err(SyntaxError::comparison(
                "the right side must be a number or a group of letters",
            ))
        }
    };

    Ok(Clue::Compare { left, op, right })
}

fn compile_predicate(group: Group, rest: &[Token]) -> Result<Clue, SyntaxError> {
    let keyword = match rest {
        [Token {
            kind:
                TokenKind::Letters {
                    text,
                    polarity: Polarity::Innocent,
                },
            ..
        }] => text.as_str(),
        [_] => {
            return Err(SyntaxError::predicate(
                "expected connected, odd or even after 'is'",
            ))
        }
        _ => {
            return Err(SyntaxError::predicate(format!(
                "expected <letters> is connected|odd|even, got {} tokens",
                rest.len() + 2
            )))
        }
    };

    match keyword {
        "connected" => Ok(Clue::Connected { group }),
        "odd" => Ok(Clue::Parity { group, odd: true }),
        "even" => Ok(Clue::Parity { group, odd: false }),
        other => Err(SyntaxError::predicate(unknown_keyword_message(other))),
    }
}

fn unknown_keyword_message(word: &str) -> String {
    let closest = PREDICATE_KEYWORDS
        .iter()
        .map(|k| (*k, strsim::jaro_winkler(word, k)))
        .filter(|(_, sim)| *sim >= 0.8)
        .max_by(|(_, a), (_, b)| a.total_cmp(b));

    match closest {
        Some((keyword, _)) => format!(
            "unknown keyword '{}'\n  Did you mean: {}?",
            word, keyword
        ),
        None => format!(
            "unknown keyword '{}' (expected connected, odd or even)",
            word
        ),
    }
}
