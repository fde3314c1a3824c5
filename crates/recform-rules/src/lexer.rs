//! Tokenizer for rule expressions.

use crate::error::ConversionError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Eof,
}

impl Token {
    pub(crate) fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Self::Ident(name) if name == keyword)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub offset: usize,
}

pub(crate) fn tokenize(source: &str) -> Result<Vec<Spanned>, ConversionError> {
    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let (offset, ch) = chars[pos];
        if ch.is_whitespace() {
            pos += 1;
            continue;
        }
        let peek = chars.get(pos + 1).map(|(_, c)| *c);

        let token = if ch.is_ascii_digit() || (ch == '.' && peek.is_some_and(|c| c.is_ascii_digit()))
        {
            let (token, next) = lex_number(source, &chars, pos)?;
            pos = next;
            token
        } else if ch == '_' || ch.is_alphabetic() {
            let start = pos;
            while pos < chars.len() && (chars[pos].1 == '_' || chars[pos].1.is_alphanumeric()) {
                pos += 1;
            }
            Token::Ident(chars[start..pos].iter().map(|(_, c)| c).collect())
        } else if ch == '"' || ch == '\'' {
            let (text, next) = lex_string(&chars, pos)?;
            pos = next;
            Token::Str(text)
        } else {
            let (token, width) = match (ch, peek) {
                ('/', Some('/')) => (Token::DoubleSlash, 2),
                ('=', Some('=')) => (Token::EqEq, 2),
                ('!', Some('=')) => (Token::NotEq, 2),
                ('<', Some('=')) => (Token::Le, 2),
                ('>', Some('=')) => (Token::Ge, 2),
                ('(', _) => (Token::LParen, 1),
                (')', _) => (Token::RParen, 1),
                ('[', _) => (Token::LBracket, 1),
                (']', _) => (Token::RBracket, 1),
                ('{', _) => (Token::LBrace, 1),
                ('}', _) => (Token::RBrace, 1),
                (',', _) => (Token::Comma, 1),
                (':', _) => (Token::Colon, 1),
                ('.', _) => (Token::Dot, 1),
                ('+', _) => (Token::Plus, 1),
                ('-', _) => (Token::Minus, 1),
                ('*', _) => (Token::Star, 1),
                ('/', _) => (Token::Slash, 1),
                ('%', _) => (Token::Percent, 1),
                ('<', _) => (Token::Lt, 1),
                ('>', _) => (Token::Gt, 1),
                _ => {
                    return Err(ConversionError::syntax(
                        offset,
                        format!("unexpected character {ch:?}"),
                    ));
                }
            };
            pos += width;
            token
        };
        tokens.push(Spanned { token, offset });
    }

    tokens.push(Spanned {
        token: Token::Eof,
        offset: source.len(),
    });
    Ok(tokens)
}

fn lex_number(
    source: &str,
    chars: &[(usize, char)],
    start: usize,
) -> Result<(Token, usize), ConversionError> {
    let digit_at = |pos: usize| chars.get(pos).is_some_and(|(_, c)| c.is_ascii_digit());
    let mut pos = start;
    let mut is_float = false;

    while digit_at(pos) {
        pos += 1;
    }
    // `5.` is a float; a dot followed by an identifier is left to the parser.
    if chars.get(pos).is_some_and(|(_, c)| *c == '.')
        && !chars
            .get(pos + 1)
            .is_some_and(|(_, c)| c.is_alphabetic() || *c == '_')
    {
        is_float = true;
        pos += 1;
        while digit_at(pos) {
            pos += 1;
        }
    }
    if chars.get(pos).is_some_and(|(_, c)| matches!(c, 'e' | 'E')) {
        let mut probe = pos + 1;
        if chars.get(probe).is_some_and(|(_, c)| matches!(c, '+' | '-')) {
            probe += 1;
        }
        if digit_at(probe) {
            is_float = true;
            pos = probe;
            while digit_at(pos) {
                pos += 1;
            }
        }
    }

    let begin = chars[start].0;
    let end = chars.get(pos).map_or(source.len(), |(offset, _)| *offset);
    let text = &source[begin..end];
    let token = if is_float {
        text.parse::<f64>()
            .map(Token::Float)
            .map_err(|_| ConversionError::syntax(begin, format!("bad float literal {text:?}")))?
    } else {
        text.parse::<i64>()
            .map(Token::Int)
            .map_err(|_| ConversionError::syntax(begin, format!("bad int literal {text:?}")))?
    };
    Ok((token, pos))
}

fn lex_string(chars: &[(usize, char)], start: usize) -> Result<(String, usize), ConversionError> {
    let (offset, quote) = chars[start];
    let mut text = String::new();
    let mut pos = start + 1;
    while let Some(&(_, ch)) = chars.get(pos) {
        pos += 1;
        if ch == quote {
            return Ok((text, pos));
        }
        if ch == '\\' {
            let Some(&(_, escaped)) = chars.get(pos) else {
                break;
            };
            pos += 1;
            text.push(match escaped {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                '0' => '\0',
                other => other,
            });
        } else {
            text.push(ch);
        }
    }
    Err(ConversionError::syntax(offset, "unterminated string literal"))
}
