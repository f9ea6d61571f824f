use std::str::Chars;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EscapeError {
    /// A backslash or `\u` ran out of input before the sequence was complete
    #[error("escape sequence ends before it is complete")]
    UnfinishedEscape,
    /// A character in a `\u` escape was not valid hexadecimal
    #[error("'{0}' is not a hexadecimal digit")]
    InvalidHexValue(char),
    /// A lone surrogate or otherwise invalid unicode value
    #[error("U+{0:04X} is not a valid unicode scalar value")]
    InvalidCodePoint(u32),
}

/// Decodes the JSON escape sequences in the raw text of a string token.
pub fn unescape(input: &str) -> Result<String, EscapeError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars();

    while let Some(next_char) = chars.next() {
        if next_char != '\\' {
            output.push(next_char);
            continue;
        }

        match chars.next().ok_or(EscapeError::UnfinishedEscape)? {
            '"' => output.push('"'),
            '\\' => output.push('\\'),
            '/' => output.push('/'),
            'b' => output.push('\u{8}'),
            'f' => output.push('\u{c}'),
            'n' => output.push('\n'),
            'r' => output.push('\r'),
            't' => output.push('\t'),
            'u' => output.push(unescape_unicode(&mut chars)?),
            // unknown escapes keep the escaped character
            other => output.push(other),
        }
    }

    Ok(output)
}

/// Reads the digits after `\u`, pairing a high surrogate with the `\uXXXX`
/// low surrogate that must follow it.
fn unescape_unicode(chars: &mut Chars<'_>) -> Result<char, EscapeError> {
    let code = read_hex4(chars)?;

    if !(0xD800..=0xDBFF).contains(&code) {
        return char::from_u32(code).ok_or(EscapeError::InvalidCodePoint(code));
    }

    let Some(tail) = chars.as_str().strip_prefix("\\u") else {
        return Err(EscapeError::InvalidCodePoint(code));
    };
    *chars = tail.chars();

    let low = read_hex4(chars)?;
    if !(0xDC00..=0xDFFF).contains(&low) {
        return Err(EscapeError::InvalidCodePoint(code));
    }

    let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
    char::from_u32(combined).ok_or(EscapeError::InvalidCodePoint(combined))
}

fn read_hex4(chars: &mut Chars<'_>) -> Result<u32, EscapeError> {
    let mut sum = 0;
    for _ in 0..4 {
        let next_char = chars.next().ok_or(EscapeError::UnfinishedEscape)?;
        let digit = next_char
            .to_digit(16)
            .ok_or(EscapeError::InvalidHexValue(next_char))?;
        sum = sum * 16 + digit;
    }
    Ok(sum)
}
