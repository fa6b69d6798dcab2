use super::ExprError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Not,
    Minus,
    And,
    Or,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    Lte,
    Gt,
    Gte,
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, ExprError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        let next2 = chars.get(i + 2).copied();

        match c {
            c if c.is_whitespace() => i += 1,
            '(' => push(&mut tokens, &mut i, Token::LParen, 1),
            ')' => push(&mut tokens, &mut i, Token::RParen, 1),
            '[' => push(&mut tokens, &mut i, Token::LBracket, 1),
            ']' => push(&mut tokens, &mut i, Token::RBracket, 1),
            ',' => push(&mut tokens, &mut i, Token::Comma, 1),
            '-' => push(&mut tokens, &mut i, Token::Minus, 1),
            '.' if !next.is_some_and(|n| n.is_ascii_digit()) => {
                push(&mut tokens, &mut i, Token::Dot, 1)
            }
            '&' if next == Some('&') => push(&mut tokens, &mut i, Token::And, 2),
            '|' if next == Some('|') => push(&mut tokens, &mut i, Token::Or, 2),
            '=' if next == Some('=') && next2 == Some('=') => {
                push(&mut tokens, &mut i, Token::StrictEq, 3)
            }
            '=' if next == Some('=') => push(&mut tokens, &mut i, Token::Eq, 2),
            '!' if next == Some('=') && next2 == Some('=') => {
                push(&mut tokens, &mut i, Token::StrictNotEq, 3)
            }
            '!' if next == Some('=') => push(&mut tokens, &mut i, Token::NotEq, 2),
            '!' => push(&mut tokens, &mut i, Token::Not, 1),
            '<' if next == Some('=') => push(&mut tokens, &mut i, Token::Lte, 2),
            '<' => push(&mut tokens, &mut i, Token::Lt, 1),
            '>' if next == Some('=') => push(&mut tokens, &mut i, Token::Gte, 2),
            '>' => push(&mut tokens, &mut i, Token::Gt, 1),
            '\'' | '"' => {
                let (s, end) = read_string(&chars, i)?;
                tokens.push(Token::Str(s));
                i = end;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let n = text
                    .parse::<f64>()
                    .map_err(|_| ExprError(format!("invalid number: {text}")))?;
                tokens.push(Token::Number(n));
            }
            c if c.is_alphabetic() || c == '_' || c == '$' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$')
                {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => return Err(ExprError(format!("unexpected character: {other}"))),
        }
    }

    Ok(tokens)
}

fn push(tokens: &mut Vec<Token>, i: &mut usize, token: Token, width: usize) {
    tokens.push(token);
    *i += width;
}

/// Read a quoted string starting at `start`; returns the text and the index
/// just past the closing quote.
fn read_string(chars: &[char], start: usize) -> Result<(String, usize), ExprError> {
    let quote = chars[start];
    let mut out = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                let escaped = chars
                    .get(i + 1)
                    .ok_or_else(|| ExprError("unterminated escape".into()))?;
                out.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    other => *other,
                });
                i += 2;
            }
            c if c == quote => return Ok((out, i + 1)),
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    Err(ExprError("unterminated string".into()))
}
