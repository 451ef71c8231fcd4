//! Splitting flag strings into argument vectors
//!
//! Build flags and run arguments arrive as single strings from the command
//! line. They are split into words here so the toolchain is spawned with an
//! explicit argument list instead of going through a shell.

use super::BuildError;

/// Splits `input` on unquoted whitespace.
///
/// Single quotes preserve everything literally, double quotes allow `\"` and
/// `\\` escapes, and a backslash outside quotes escapes the next character.
pub fn split_words(input: &str) -> Result<Vec<String>, BuildError> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => current.push(ch),
                        None => return Err(unterminated(input, "single quote")),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(ch @ ('"' | '\\')) => current.push(ch),
                            Some(ch) => {
                                current.push('\\');
                                current.push(ch);
                            }
                            None => return Err(unterminated(input, "double quote")),
                        },
                        Some(ch) => current.push(ch),
                        None => return Err(unterminated(input, "double quote")),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(ch) => current.push(ch),
                    None => {
                        return Err(BuildError::InvalidFlags {
                            flags: input.to_string(),
                            reason: "trailing backslash".to_string(),
                        })
                    }
                }
            }
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                in_word = true;
                current.push(c);
            }
        }
    }

    if in_word {
        words.push(current);
    }

    Ok(words)
}

fn unterminated(input: &str, what: &str) -> BuildError {
    BuildError::InvalidFlags {
        flags: input.to_string(),
        reason: format!("unterminated {}", what),
    }
}
