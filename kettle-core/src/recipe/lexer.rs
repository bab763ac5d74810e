// kettle-core/src/recipe/lexer.rs
//! Single-line tokenizer for the formula DSL subset.

use kettle_common::error::{KettleError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    /// Bare identifier or constant (`depends_on`, `Formula`, `install`).
    Word(String),
    /// Quoted string literal, escapes resolved, `#{}` kept verbatim.
    Str(String),
    /// `:git`
    Symbol(String),
    /// `using:` keyword-argument key
    Key(String),
    Arrow,
    Comma,
    Lt,
    LParen,
    RParen,
    LBracket,
    RBracket,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '?' | '!' | '.' | '/')
}

/// Splits one source line into tokens, dropping any trailing comment.
pub(crate) fn tokenize(line: &str, line_no: usize) -> Result<Vec<Token>> {
    let chars: Vec<char> = line.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '#' => break,
            '\'' | '"' => {
                let (text, next) = read_string(&chars, i, line_no)?;
                tokens.push(Token::Str(text));
                i = next;
            }
            ':' => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && is_word_char(chars[end]) {
                    end += 1;
                }
                if end == start {
                    return Err(KettleError::ParseError(
                        line_no,
                        "expected a symbol name after ':'".to_string(),
                    ));
                }
                tokens.push(Token::Symbol(chars[start..end].iter().collect()));
                i = end;
            }
            '=' if chars.get(i + 1) == Some(&'>') => {
                tokens.push(Token::Arrow);
                i += 2;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '<' => {
                tokens.push(Token::Lt);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '[' => {
                tokens.push(Token::LBracket);
                i += 1;
            }
            ']' => {
                tokens.push(Token::RBracket);
                i += 1;
            }
            c if is_word_char(c) => {
                let start = i;
                while i < chars.len() && is_word_char(chars[i]) {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                // `using: :git` style keyword argument
                if chars.get(i) == Some(&':') && chars.get(i + 1).is_none_or(|n| n.is_whitespace())
                {
                    tokens.push(Token::Key(word));
                    i += 1;
                } else {
                    tokens.push(Token::Word(word));
                }
            }
            other => {
                return Err(KettleError::ParseError(
                    line_no,
                    format!("unexpected character '{other}'"),
                ));
            }
        }
    }

    Ok(tokens)
}

fn read_string(chars: &[char], start: usize, line_no: usize) -> Result<(String, usize)> {
    let quote = chars[start];
    let mut out = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        let c = chars[i];
        if c == quote {
            return Ok((out, i + 1));
        }
        if c == '\\' {
            let Some(&next) = chars.get(i + 1) else {
                break;
            };
            match (quote, next) {
                (_, '\\') => out.push('\\'),
                (_, q) if q == quote => out.push(q),
                ('"', 'n') => out.push('\n'),
                ('"', 't') => out.push('\t'),
                ('"', 'r') => out.push('\r'),
                // Single-quoted strings keep unknown escapes literally.
                (_, other) => {
                    out.push('\\');
                    out.push(other);
                }
            }
            i += 2;
            continue;
        }
        out.push(c);
        i += 1;
    }

    Err(KettleError::ParseError(
        line_no,
        "unterminated string literal".to_string(),
    ))
}
