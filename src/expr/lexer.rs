//! Tokenizer for expression text.

use super::errors::{ExprError, ExprResult};

/// Token kinds produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),

    // Keywords
    And,
    Or,
    Not,
    In,
    Is,
    If,
    Else,
    True,
    False,
    None,

    // Punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,

    // Operators
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    SlashSlash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    Eof,
}

impl TokenKind {
    /// Short description used in syntax errors
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Int(n) => n.to_string(),
            TokenKind::Float(n) => n.to_string(),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::Ident(name) => format!("'{}'", name),
            TokenKind::Eof => "end of expression".to_string(),
            other => format!("'{}'", other.symbol()),
        }
    }

    fn symbol(&self) -> &'static str {
        match self {
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::Not => "not",
            TokenKind::In => "in",
            TokenKind::Is => "is",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::True => "True",
            TokenKind::False => "False",
            TokenKind::None => "None",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Colon => ":",
            TokenKind::Dot => ".",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::StarStar => "**",
            TokenKind::Slash => "/",
            TokenKind::SlashSlash => "//",
            TokenKind::Percent => "%",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::LtEq => "<=",
            TokenKind::Gt => ">",
            TokenKind::GtEq => ">=",
            _ => "?",
        }
    }
}

/// A token and its byte offset in the source text
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

/// Splits expression text into tokens.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Tokenize the whole input. The last token is always `Eof`.
    pub fn tokenize(input: &'a str) -> ExprResult<Vec<Token>> {
        let mut lexer = Self { input, pos: 0 };
        let mut tokens = Vec::new();
        loop {
            lexer.skip_whitespace();
            let offset = lexer.pos;
            let Some(c) = lexer.peek() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    offset,
                });
                return Ok(tokens);
            };
            let kind = if c.is_ascii_digit()
                || (c == '.' && lexer.peek_nth(1).is_some_and(|d| d.is_ascii_digit()))
            {
                lexer.lex_number()?
            } else if c == '\'' || c == '"' {
                TokenKind::Str(lexer.lex_string()?)
            } else if c.is_alphabetic() || c == '_' {
                lexer.lex_word()
            } else {
                lexer.lex_symbol()?
            };
            tokens.push(Token { kind, offset });
        }
    }

    fn lex_number(&mut self) -> ExprResult<TokenKind> {
        let start = self.pos;
        let mut is_float = false;
        self.consume_digits();
        if self.peek() == Some('.') {
            is_float = true;
            self.advance();
            self.consume_digits();
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let save = self.pos;
            self.advance();
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.advance();
            }
            if self.peek().is_some_and(|d| d.is_ascii_digit()) {
                is_float = true;
                self.consume_digits();
            } else {
                self.pos = save;
            }
        }
        let text: String = self.input[start..self.pos].chars().filter(|c| *c != '_').collect();
        if is_float {
            text.parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| ExprError::syntax(format!("invalid number '{}'", text), start))
        } else {
            text.parse::<i64>()
                .map(TokenKind::Int)
                .map_err(|_| ExprError::syntax(format!("integer literal '{}' too large", text), start))
        }
    }

    fn consume_digits(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn lex_string(&mut self) -> ExprResult<String> {
        let start = self.pos;
        let quote = self.peek().unwrap_or('\'');
        self.advance();

        let mut result = String::new();
        loop {
            match self.peek() {
                None => return Err(ExprError::syntax("unterminated string literal", start)),
                Some(c) if c == quote => {
                    self.advance();
                    return Ok(result);
                }
                Some('\\') => {
                    self.advance();
                    let escaped = match self.peek() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('0') => '\0',
                        Some('\\') => '\\',
                        Some('\'') => '\'',
                        Some('"') => '"',
                        Some('u') => {
                            self.advance();
                            result.push(self.lex_unicode_escape()?);
                            continue;
                        }
                        Some(other) => {
                            // Unknown escapes are kept verbatim
                            result.push('\\');
                            other
                        }
                        None => {
                            return Err(ExprError::syntax("unterminated string literal", start))
                        }
                    };
                    result.push(escaped);
                    self.advance();
                }
                Some(c) => {
                    result.push(c);
                    self.advance();
                }
            }
        }
    }

    fn lex_unicode_escape(&mut self) -> ExprResult<char> {
        let start = self.pos;
        let end = start + 4;
        let hex = self
            .input
            .get(start..end)
            .ok_or_else(|| ExprError::syntax("truncated \\u escape", start))?;
        let code = u32::from_str_radix(hex, 16)
            .map_err(|_| ExprError::syntax("invalid \\u escape", start))?;
        let c = char::from_u32(code).ok_or_else(|| ExprError::syntax("invalid \\u escape", start))?;
        self.pos = end;
        Ok(c)
    }

    fn lex_word(&mut self) -> TokenKind {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.advance();
            } else {
                break;
            }
        }
        match &self.input[start..self.pos] {
            "and" => TokenKind::And,
            "or" => TokenKind::Or,
            "not" => TokenKind::Not,
            "in" => TokenKind::In,
            "is" => TokenKind::Is,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "True" | "true" => TokenKind::True,
            "False" | "false" => TokenKind::False,
            "None" | "null" => TokenKind::None,
            word => TokenKind::Ident(word.to_string()),
        }
    }

    fn lex_symbol(&mut self) -> ExprResult<TokenKind> {
        let two = [
            ("**", TokenKind::StarStar),
            ("//", TokenKind::SlashSlash),
            ("==", TokenKind::EqEq),
            ("!=", TokenKind::NotEq),
            ("<=", TokenKind::LtEq),
            (">=", TokenKind::GtEq),
        ];
        for (text, kind) in two {
            if self.peek_str(text) {
                self.pos += 2;
                return Ok(kind);
            }
        }

        let start = self.pos;
        let c = self.peek().unwrap_or('\0');
        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            other => {
                return Err(ExprError::syntax(
                    format!("unexpected character '{}'", other),
                    start,
                ))
            }
        };
        self.advance();
        Ok(kind)
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(n)
    }

    fn peek_str(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::tokenize(input)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_subscript_expression() {
        assert_eq!(
            kinds("it['parent']==pa['id']"),
            vec![
                TokenKind::Ident("it".into()),
                TokenKind::LBracket,
                TokenKind::Str("parent".into()),
                TokenKind::RBracket,
                TokenKind::EqEq,
                TokenKind::Ident("pa".into()),
                TokenKind::LBracket,
                TokenKind::Str("id".into()),
                TokenKind::RBracket,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("1 2.5 .5 1e3 1_000"),
            vec![
                TokenKind::Int(1),
                TokenKind::Float(2.5),
                TokenKind::Float(0.5),
                TokenKind::Float(1000.0),
                TokenKind::Int(1000),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_two_char_operators() {
        assert_eq!(
            kinds("a // b ** c <= d"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::SlashSlash,
                TokenKind::Ident("b".into()),
                TokenKind::StarStar,
                TokenKind::Ident("c".into()),
                TokenKind::LtEq,
                TokenKind::Ident("d".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            kinds(r#"'it\'s' "a\nb" 'é'"#),
            vec![
                TokenKind::Str("it's".into()),
                TokenKind::Str("a\nb".into()),
                TokenKind::Str("é".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let err = Lexer::tokenize("'abc").unwrap_err();
        assert!(err.is_syntax());
    }

    #[test]
    fn test_unexpected_character() {
        let err = Lexer::tokenize("a ; b").unwrap_err();
        assert_eq!(
            err,
            ExprError::syntax("unexpected character ';'", 2)
        );
    }
}
