use tracing::{debug, trace};

use crate::options::ParseOptions;
use crate::tokenize::{tokenize, LexError, Token};
use crate::unescape::{unescape, EscapeError};
use crate::{Map, Number, Value};

/// Parses a JSON document whose root is an object.
pub fn parse(input: &str) -> Result<Value, Error> {
    parse_with(input, &ParseOptions::default())
}

pub fn parse_with(input: &str, options: &ParseOptions) -> Result<Value, Error> {
    let tokens = match tokenize(input) {
        Ok(tokens) => tokens,
        Err(err) => return Err(classify_lex_error(input, err, options)),
    };
    let value = parse_tokens(&tokens, options)?;
    Ok(value)
}

/// A lex failure that comes after a complete document is trailing data, not
/// a lexical error inside the document.
fn classify_lex_error(input: &str, err: LexError, options: &ParseOptions) -> Error {
    let LexError::UnexpectedCharacter { character, offset } = &err;

    let root_complete = tokenize(&input[..*offset])
        .is_ok_and(|prefix| parse_tokens(&prefix, options).is_ok());
    if !root_complete {
        return Error::Lex(err);
    }

    debug!(offset = *offset, "unlexable text after the document");
    Error::Parse(ParseError::UnexpectedTrailingDataAfterRoot {
        found: format!("'{character}'"),
    })
}

/// Parses an already tokenized document.
pub fn parse_tokens(tokens: &[Token], options: &ParseOptions) -> Result<Value, ParseError> {
    Parser::new(tokens, options).parse_document()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// No tokens at all, or nothing but the end of input
    #[error("Empty input")]
    EmptyInput,
    #[error("Expected '{{', found {found}")]
    ExpectedOpeningBrace { found: String },
    #[error("Expected a string key, found {found}")]
    ExpectedStringKey { found: String },
    #[error("Expected ':' after key, found {found}")]
    ExpectedColon { found: String },
    #[error("Expected ',' or '}}' after a key-value pair, found {found}")]
    ExpectedCommaOrClosingBrace { found: String },
    #[error("Unexpected '}}' after ','")]
    TrailingCommaBeforeClosingBrace,
    #[error("Expected ',' or ']' after an array element, found {found}")]
    ExpectedClosingBracket { found: String },
    #[error("Unexpected ']' after ','")]
    TrailingCommaBeforeClosingBracket,
    #[error("Unsupported value: {found}")]
    UnsupportedValueToken { found: String },
    #[error("Expected end of input after the document, found {found}")]
    UnexpectedTrailingDataAfterRoot { found: String },
    #[error("Nesting is deeper than the limit of {limit}")]
    DepthLimitExceeded { limit: usize },
    /// A number token whose text is not a number; only hand-built token
    /// sequences can contain one
    #[error("Invalid number: {lexeme}")]
    InvalidNumber { lexeme: String },
    #[error("Invalid escape in string: {0}")]
    InvalidEscape(#[from] EscapeError),
}

type ParseResult = Result<Value, ParseError>;

/// Stands in for every position past the end of a token buffer, so a
/// sequence missing its final [`Token::Eof`] still reads as terminated.
static END: Token = Token::Eof;

/// Recursive-descent parser over a borrowed token buffer. Reads left to
/// right with one token of lookahead and never backtracks.
pub struct Parser<'a> {
    tokens: &'a [Token],
    index: usize,
    depth: usize,
    options: &'a ParseOptions,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token], options: &'a ParseOptions) -> Self {
        Self {
            tokens,
            index: 0,
            depth: 0,
            options,
        }
    }

    /// Parses the root value and checks that nothing follows it.
    pub fn parse_document(&mut self) -> ParseResult {
        if matches!(self.tokens, [] | [Token::Eof]) {
            return Err(ParseError::EmptyInput);
        }

        let root = if self.options.any_root {
            self.parse_value()?
        } else {
            self.parse_object()?
        };

        match self.peek() {
            Token::Eof => {
                debug!(root = root.kind(), tokens = self.index + 1, "parsed document");
                Ok(root)
            }
            token => Err(ParseError::UnexpectedTrailingDataAfterRoot {
                found: token.to_string(),
            }),
        }
    }

    fn peek(&self) -> &'a Token {
        self.tokens.get(self.index).unwrap_or(&END)
    }

    fn advance(&mut self) -> &'a Token {
        let token = self.peek();
        self.index += 1;
        token
    }

    fn parse_value(&mut self) -> ParseResult {
        match self.peek() {
            Token::LeftBrace => return self.parse_object(),
            Token::LeftBracket => return self.parse_array(),
            _ => {}
        }

        match self.advance() {
            Token::Null => Ok(Value::Null),
            Token::Boolean(b) => Ok(Value::Bool(*b)),
            Token::Number(lexeme) => lexeme
                .parse::<Number>()
                .map(Value::Number)
                .map_err(|_| ParseError::InvalidNumber {
                    lexeme: lexeme.clone(),
                }),
            Token::String(raw) => Ok(Value::String(self.string(raw)?)),
            token => Err(ParseError::UnsupportedValueToken {
                found: token.to_string(),
            }),
        }
    }

    fn string(&self, raw: &str) -> Result<String, ParseError> {
        if self.options.decode_escapes {
            Ok(unescape(raw)?)
        } else {
            Ok(raw.to_string())
        }
    }

    fn parse_object(&mut self) -> ParseResult {
        match self.advance() {
            Token::LeftBrace => {}
            token => {
                return Err(ParseError::ExpectedOpeningBrace {
                    found: token.to_string(),
                })
            }
        }
        self.enter()?;

        let mut map = Map::new();
        while *self.peek() != Token::RightBrace {
            let key = match self.advance() {
                Token::String(raw) => self.string(raw)?,
                token => {
                    return Err(ParseError::ExpectedStringKey {
                        found: token.to_string(),
                    })
                }
            };

            match self.advance() {
                Token::Colon => {}
                token => {
                    return Err(ParseError::ExpectedColon {
                        found: token.to_string(),
                    })
                }
            }

            let value = self.parse_value()?;
            trace!(key = %key, kind = value.kind(), "object member");
            map.insert(key, value);

            match self.peek() {
                Token::Comma => {
                    self.index += 1;
                    if *self.peek() == Token::RightBrace {
                        return Err(ParseError::TrailingCommaBeforeClosingBrace);
                    }
                }
                Token::RightBrace => {}
                token => {
                    return Err(ParseError::ExpectedCommaOrClosingBrace {
                        found: token.to_string(),
                    })
                }
            }
        }
        // Consume the RightBrace token
        self.index += 1;
        self.depth -= 1;

        Ok(Value::Object(map))
    }

    fn parse_array(&mut self) -> ParseResult {
        // Consume the LeftBracket token
        self.index += 1;
        self.enter()?;

        let mut array = Vec::new();
        while *self.peek() != Token::RightBracket {
            let value = self.parse_value()?;
            trace!(index = array.len(), kind = value.kind(), "array element");
            array.push(value);

            match self.peek() {
                Token::Comma => {
                    self.index += 1;
                    if *self.peek() == Token::RightBracket {
                        return Err(ParseError::TrailingCommaBeforeClosingBracket);
                    }
                }
                Token::RightBracket => {}
                token => {
                    return Err(ParseError::ExpectedClosingBracket {
                        found: token.to_string(),
                    })
                }
            }
        }
        // Consume the RightBracket token
        self.index += 1;
        self.depth -= 1;

        Ok(Value::Array(array))
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        match self.options.max_depth {
            Some(limit) if self.depth > limit => Err(ParseError::DepthLimitExceeded { limit }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string(s: &str) -> Token {
        Token::String(s.into())
    }

    fn number(lexeme: &str) -> Token {
        Token::Number(lexeme.into())
    }

    fn int(n: i64) -> Value {
        Value::Number(Number::Integer(n))
    }

    fn object(pairs: Vec<(&str, Value)>) -> Value {
        Value::Object(pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }

    fn check_value(input: Vec<Token>, expected: Value) {
        let options = ParseOptions::default();
        let mut parser = Parser::new(&input, &options);
        assert_eq!(parser.parse_value().unwrap(), expected);
    }

    fn check_document(mut input: Vec<Token>, expected: Result<Value, ParseError>) {
        input.push(Token::Eof);
        assert_eq!(parse_tokens(&input, &ParseOptions::default()), expected);
    }

    #[test]
    fn test_parse_null() {
        check_value(vec![Token::Null], Value::Null);
    }

    #[test]
    fn parses_numbers_by_kind() {
        check_value(vec![number("16")], int(16));
        check_value(vec![number("1.5e2")], Value::Number(Number::Float(150.0)));
    }

    #[test]
    fn parses_string_no_escapes() {
        check_value(
            vec![string("hello world")],
            Value::String("hello world".into()),
        );
    }

    #[test]
    fn keeps_escapes_by_default() {
        check_value(
            vec![string(r#"hello\\world"#)],
            Value::String(r#"hello\\world"#.into()),
        );
    }

    #[test]
    fn decodes_escapes_when_asked() {
        let options = ParseOptions::default().with_decode_escapes(true);
        let tokens = vec![
            Token::LeftBrace,
            string(r"k\n"),
            Token::Colon,
            string(r#"hello\\world"#),
            Token::RightBrace,
            Token::Eof,
        ];
        assert_eq!(
            parse_tokens(&tokens, &options),
            Ok(object(vec![("k\n", Value::String(r"hello\world".into()))]))
        );
    }

    #[test]
    fn malformed_escape_fails_when_decoding() {
        let options = ParseOptions::default().with_decode_escapes(true);
        let tokens = vec![
            Token::LeftBrace,
            string("k"),
            Token::Colon,
            string(r"\uZZZZ"),
            Token::RightBrace,
            Token::Eof,
        ];
        assert_eq!(
            parse_tokens(&tokens, &options),
            Err(ParseError::InvalidEscape(EscapeError::InvalidHexValue('Z')))
        );
    }

    #[test]
    fn parses_array_two_elements() {
        // [null, 16]
        check_value(
            vec![
                Token::LeftBracket,
                Token::Null,
                Token::Comma,
                number("16"),
                Token::RightBracket,
            ],
            Value::Array(vec![Value::Null, int(16)]),
        );
    }

    #[test]
    fn parses_empty_array() {
        check_value(
            vec![Token::LeftBracket, Token::RightBracket],
            Value::Array(vec![]),
        );
    }

    #[test]
    fn parses_nested_array() {
        // [null, [null]]
        check_value(
            vec![
                Token::LeftBracket,
                Token::Null,
                Token::Comma,
                Token::LeftBracket,
                Token::Null,
                Token::RightBracket,
                Token::RightBracket,
            ],
            Value::Array(vec![Value::Null, Value::Array(vec![Value::Null])]),
        );
    }

    #[test]
    fn empty_token_sequences() {
        let options = ParseOptions::default();
        assert_eq!(parse_tokens(&[], &options), Err(ParseError::EmptyInput));
        assert_eq!(
            parse_tokens(&[Token::Eof], &options),
            Err(ParseError::EmptyInput)
        );
    }

    #[test]
    fn parses_empty_object() {
        check_document(
            vec![Token::LeftBrace, Token::RightBrace],
            Ok(object(vec![])),
        );
    }

    #[test]
    fn missing_eof_reads_as_terminated() {
        let tokens = [Token::LeftBrace, Token::RightBrace];
        assert_eq!(
            parse_tokens(&tokens, &ParseOptions::default()),
            Ok(object(vec![]))
        );
    }

    #[test]
    fn root_must_be_object() {
        check_document(
            vec![Token::LeftBracket, Token::RightBracket],
            Err(ParseError::ExpectedOpeningBrace {
                found: "'['".into(),
            }),
        );
        check_document(
            vec![number("1")],
            Err(ParseError::ExpectedOpeningBrace {
                found: "number 1".into(),
            }),
        );
    }

    #[test]
    fn any_root_accepts_scalars_and_arrays() {
        let options = ParseOptions::default().with_any_root(true);
        assert_eq!(
            parse_tokens(&[Token::Boolean(true), Token::Eof], &options),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            parse_tokens(
                &[Token::LeftBracket, number("1"), Token::RightBracket, Token::Eof],
                &options
            ),
            Ok(Value::Array(vec![int(1)]))
        );
        assert_eq!(
            parse_tokens(&[Token::Colon, Token::Eof], &options),
            Err(ParseError::UnsupportedValueToken {
                found: "':'".into()
            })
        );
    }

    #[test]
    fn object_errors() {
        check_document(
            vec![Token::LeftBrace, number("1")],
            Err(ParseError::ExpectedStringKey {
                found: "number 1".into(),
            }),
        );
        check_document(
            vec![Token::LeftBrace, string("a"), number("1")],
            Err(ParseError::ExpectedColon {
                found: "number 1".into(),
            }),
        );
        check_document(
            vec![Token::LeftBrace, string("a"), Token::Colon, Token::Null, Token::Null],
            Err(ParseError::ExpectedCommaOrClosingBrace {
                found: "null".into(),
            }),
        );
        check_document(
            vec![
                Token::LeftBrace,
                string("a"),
                Token::Colon,
                Token::Null,
                Token::Comma,
                Token::RightBrace,
            ],
            Err(ParseError::TrailingCommaBeforeClosingBrace),
        );
        check_document(
            vec![Token::LeftBrace, string("a"), Token::Colon, Token::RightBrace],
            Err(ParseError::UnsupportedValueToken {
                found: "'}'".into(),
            }),
        );
    }

    #[test]
    fn unclosed_object_reports_end_of_input() {
        check_document(
            vec![Token::LeftBrace],
            Err(ParseError::ExpectedStringKey {
                found: "end of input".into(),
            }),
        );
        check_document(
            vec![Token::LeftBrace, string("a"), Token::Colon, Token::Null],
            Err(ParseError::ExpectedCommaOrClosingBrace {
                found: "end of input".into(),
            }),
        );
    }

    #[test]
    fn array_errors() {
        let array_in_object = |inner: Vec<Token>| {
            let mut tokens = vec![Token::LeftBrace, string("a"), Token::Colon];
            tokens.extend(inner);
            tokens.push(Token::RightBrace);
            tokens
        };

        check_document(
            array_in_object(vec![Token::LeftBracket, Token::Null, Token::Comma, Token::RightBracket]),
            Err(ParseError::TrailingCommaBeforeClosingBracket),
        );
        check_document(
            array_in_object(vec![Token::LeftBracket, Token::Null, Token::Null]),
            Err(ParseError::ExpectedClosingBracket {
                found: "null".into(),
            }),
        );
        check_document(
            array_in_object(vec![Token::LeftBracket, Token::Comma]),
            Err(ParseError::UnsupportedValueToken {
                found: "','".into(),
            }),
        );
    }

    #[test]
    fn trailing_tokens_after_root() {
        check_document(
            vec![Token::LeftBrace, Token::RightBrace, Token::LeftBrace],
            Err(ParseError::UnexpectedTrailingDataAfterRoot {
                found: "'{'".into(),
            }),
        );
    }

    #[test]
    fn duplicate_keys_last_write_wins() {
        check_document(
            vec![
                Token::LeftBrace,
                string("a"),
                Token::Colon,
                number("1"),
                Token::Comma,
                string("b"),
                Token::Colon,
                number("2"),
                Token::Comma,
                string("a"),
                Token::Colon,
                number("3"),
                Token::RightBrace,
            ],
            Ok(object(vec![("a", int(3)), ("b", int(2))])),
        );
    }

    #[test]
    fn invalid_number_lexeme() {
        check_document(
            vec![Token::LeftBrace, string("n"), Token::Colon, number("1x"), Token::RightBrace],
            Err(ParseError::InvalidNumber {
                lexeme: "1x".into(),
            }),
        );
    }

    #[test]
    fn depth_limit() {
        let nested = |depth: usize| {
            let mut tokens = vec![Token::LeftBrace, string("a"), Token::Colon];
            tokens.extend(std::iter::repeat(Token::LeftBracket).take(depth - 1));
            tokens.extend(std::iter::repeat(Token::RightBracket).take(depth - 1));
            tokens.push(Token::RightBrace);
            tokens.push(Token::Eof);
            tokens
        };

        let options = ParseOptions::default().with_max_depth(Some(4));
        assert!(parse_tokens(&nested(4), &options).is_ok());
        assert_eq!(
            parse_tokens(&nested(5), &options),
            Err(ParseError::DepthLimitExceeded { limit: 4 })
        );

        let unlimited = ParseOptions::default().with_max_depth(None);
        assert!(parse_tokens(&nested(500), &unlimited).is_ok());
    }

    #[test]
    fn test_parse() {
        let expected = object(vec![("key", Value::String("value".to_string()))]);
        assert_eq!(parse(r#"{"key": "value"}"#).unwrap(), expected);
    }

    #[test]
    fn lex_errors_surface_through_parse() {
        assert_eq!(
            parse("{\"a\": ?}"),
            Err(Error::Lex(LexError::UnexpectedCharacter {
                character: '?',
                offset: 6
            }))
        );
    }

    #[test]
    fn unlexable_text_after_root_is_trailing_data() {
        assert_eq!(
            parse(r#"{"a":1} extra"#),
            Err(Error::Parse(ParseError::UnexpectedTrailingDataAfterRoot {
                found: "'e'".into()
            }))
        );
        assert_eq!(
            parse("{} \"unterminated"),
            Err(Error::Parse(ParseError::UnexpectedTrailingDataAfterRoot {
                found: "'\"'".into()
            }))
        );
    }

    #[test]
    fn unlexable_text_inside_root_stays_lex_error() {
        assert_eq!(
            parse(r#"{"a": @}"#),
            Err(Error::Lex(LexError::UnexpectedCharacter {
                character: '@',
                offset: 6
            }))
        );
        // the prefix `{"a":1} {"b": ` is not a single document
        assert_eq!(
            parse(r#"{"a":1} {"b": @}"#),
            Err(Error::Lex(LexError::UnexpectedCharacter {
                character: '@',
                offset: 14
            }))
        );
    }
}
