use std::fmt;

use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `:`
    Colon,
    /// `,`
    Comma,
    /// Raw text between the quotes, escapes left as written
    String(String),
    /// Number lexeme exactly as it appeared in the input
    Number(String),
    /// `true` or `false`
    Boolean(bool),
    /// `null`
    Null,
    /// End of input, always the last token
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LeftBrace => write!(f, "'{{'"),
            Token::RightBrace => write!(f, "'}}'"),
            Token::LeftBracket => write!(f, "'['"),
            Token::RightBracket => write!(f, "']'"),
            Token::Colon => write!(f, "':'"),
            Token::Comma => write!(f, "','"),
            Token::String(s) => write!(f, "string \"{s}\""),
            Token::Number(n) => write!(f, "number {n}"),
            Token::Boolean(b) => write!(f, "{b}"),
            Token::Null => write!(f, "null"),
            Token::Eof => write!(f, "end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    /// Nothing matches at `offset` (a byte index into the input). An
    /// unterminated string reports its opening quote.
    #[error("Unexpected character: {character} (at byte {offset})")]
    UnexpectedCharacter { character: char, offset: usize },
}

impl LexError {
    /// The input left unconsumed when lexing stopped.
    pub fn remaining<'a>(&self, input: &'a str) -> &'a str {
        match self {
            LexError::UnexpectedCharacter { offset, .. } => input.get(*offset..).unwrap_or(""),
        }
    }
}

/// Tries to match one token at the very start of the input, returning it
/// together with the number of bytes it spans.
type Rule = fn(&str) -> Option<(Token, usize)>;

/// Tried in order; the first rule that matches wins.
const RULES: [Rule; 5] = [
    tokenize_punctuation,
    tokenize_string,
    tokenize_number,
    tokenize_boolean,
    tokenize_null,
];

pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let mut index = 0;
    let mut tokens = Vec::new();

    loop {
        let rest = &input[index..];
        index += rest.len() - rest.trim_start().len();

        let rest = &input[index..];
        let Some(ch) = rest.chars().next() else {
            break;
        };

        let (token, len) = RULES
            .iter()
            .find_map(|rule| rule(rest))
            .ok_or(LexError::UnexpectedCharacter {
                character: ch,
                offset: index,
            })?;

        trace!(%token, offset = index, "token");
        tokens.push(token);
        index += len;
    }

    tokens.push(Token::Eof);
    debug!(tokens = tokens.len(), bytes = input.len(), "tokenized input");

    Ok(tokens)
}

fn tokenize_punctuation(rest: &str) -> Option<(Token, usize)> {
    let token = match rest.as_bytes().first()? {
        b'{' => Token::LeftBrace,
        b'}' => Token::RightBrace,
        b'[' => Token::LeftBracket,
        b']' => Token::RightBracket,
        b':' => Token::Colon,
        b',' => Token::Comma,
        _ => return None,
    };
    Some((token, 1))
}

fn tokenize_string(rest: &str) -> Option<(Token, usize)> {
    let body = rest.strip_prefix('"')?;
    let mut chars = body.char_indices();

    while let Some((i, ch)) = chars.next() {
        match ch {
            // both quotes count towards the length
            '"' => return Some((Token::String(body[..i].to_string()), i + 2)),
            '\\' => {
                chars.next()?;
            }
            _ => {}
        }
    }

    None
}

/// `-?digits(.digits)?([eE][+-]?digits)?`; an incomplete fraction or
/// exponent is left for the next token.
fn tokenize_number(rest: &str) -> Option<(Token, usize)> {
    let bytes = rest.as_bytes();
    let mut end = usize::from(bytes.first() == Some(&b'-'));

    let integer = count_digits(&bytes[end..]);
    if integer == 0 {
        return None;
    }
    end += integer;

    if bytes.get(end) == Some(&b'.') {
        let fraction = count_digits(&bytes[end + 1..]);
        if fraction > 0 {
            end += 1 + fraction;
        }
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent = end + 1;
        if matches!(bytes.get(exponent), Some(b'+' | b'-')) {
            exponent += 1;
        }
        let digits = count_digits(&bytes[exponent..]);
        if digits > 0 {
            end = exponent + digits;
        }
    }

    Some((Token::Number(rest[..end].to_string()), end))
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

fn tokenize_boolean(rest: &str) -> Option<(Token, usize)> {
    if rest.starts_with("true") {
        Some((Token::Boolean(true), 4))
    } else if rest.starts_with("false") {
        Some((Token::Boolean(false), 5))
    } else {
        None
    }
}

fn tokenize_null(rest: &str) -> Option<(Token, usize)> {
    rest.starts_with("null").then_some((Token::Null, 4))
}
