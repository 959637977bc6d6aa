use super::ast::Span;
use super::error::CompileError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Number(f64),
    String(String),
    True,
    False,

    // Identifiers & keywords
    Ident(String),
    Let,
    Const,
    Function,
    Event,
    Type,
    If,
    Else,
    While,
    For,
    In,
    Return,
    Break,
    Continue,
    TypeOf,
    Fn,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Colon,
    Dot,
    DotDot,    // ..
    Ellipsis,  // ...

    // Assignment
    Eq,        // =
    PlusEq,    // +=
    MinusEq,   // -=
    StarEq,    // *=
    SlashEq,   // /=

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    EqEq,      // ==
    Ne,        // !=
    Lt,
    Le,        // <=
    Gt,
    Ge,        // >=
    And,       // &&
    Or,        // ||
    Bang,      // !
    Pipe,      // |

    Eof,
}

#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

pub fn lex(source: &str) -> Result<Vec<SpannedToken>, CompileError> {
    let mut lexer = Lexer::new(source);
    lexer.tokenize()?;
    Ok(lexer.tokens)
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<SpannedToken>,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
        }
    }

    fn tokenize(&mut self) -> Result<(), CompileError> {
        loop {
            self.skip_whitespace_and_comments()?;
            if self.pos >= self.bytes.len() {
                break;
            }

            let start = self.pos;
            let ch = self.bytes[self.pos];

            match ch {
                b'(' => self.single(Token::LParen, start),
                b')' => self.single(Token::RParen, start),
                b'{' => self.single(Token::LBrace, start),
                b'}' => self.single(Token::RBrace, start),
                b'[' => self.single(Token::LBracket, start),
                b']' => self.single(Token::RBracket, start),
                b',' => self.single(Token::Comma, start),
                b';' => self.single(Token::Semicolon, start),
                b':' => self.single(Token::Colon, start),
                b'.' => {
                    self.pos += 1;
                    if self.peek() == Some(b'.') {
                        self.pos += 1;
                        if self.peek() == Some(b'.') {
                            self.pos += 1;
                            self.push(Token::Ellipsis, start, self.pos);
                        } else {
                            self.push(Token::DotDot, start, self.pos);
                        }
                    } else {
                        self.push(Token::Dot, start, self.pos);
                    }
                }
                b'+' => self.with_eq(Token::Plus, Token::PlusEq, start),
                b'-' => self.with_eq(Token::Minus, Token::MinusEq, start),
                b'*' => self.with_eq(Token::Star, Token::StarEq, start),
                b'/' => self.with_eq(Token::Slash, Token::SlashEq, start),
                b'=' => self.with_eq(Token::Eq, Token::EqEq, start),
                b'!' => self.with_eq(Token::Bang, Token::Ne, start),
                b'<' => self.with_eq(Token::Lt, Token::Le, start),
                b'>' => self.with_eq(Token::Gt, Token::Ge, start),
                b'|' => {
                    self.pos += 1;
                    if self.peek() == Some(b'|') {
                        self.pos += 1;
                        self.push(Token::Or, start, self.pos);
                    } else {
                        self.push(Token::Pipe, start, self.pos);
                    }
                }
                b'&' => {
                    self.pos += 1;
                    if self.peek() == Some(b'&') {
                        self.pos += 1;
                        self.push(Token::And, start, self.pos);
                    } else {
                        return Err(CompileError::parse(
                            "Expected '&&' for logical AND",
                            Span::new(start, self.pos),
                        ));
                    }
                }
                b'"' => {
                    self.pos += 1;
                    self.lex_string(start)?;
                }
                b'0'..=b'9' => self.lex_number(start)?,
                b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.lex_ident(start),
                _ => {
                    let ch = self.source[start..].chars().next().unwrap_or('?');
                    return Err(CompileError::parse(
                        format!("Unexpected character: '{ch}'"),
                        Span::new(start, start + ch.len_utf8()),
                    ));
                }
            }
        }

        self.tokens.push(SpannedToken {
            token: Token::Eof,
            span: Span::new(self.pos, self.pos),
        });
        Ok(())
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn push(&mut self, token: Token, start: usize, end: usize) {
        self.tokens.push(SpannedToken {
            token,
            span: Span::new(start, end),
        });
    }

    fn single(&mut self, token: Token, start: usize) {
        self.pos += 1;
        self.push(token, start, self.pos);
    }

    /// One-byte operator that turns into `with_eq` when followed by `=`.
    fn with_eq(&mut self, plain: Token, with_eq: Token, start: usize) {
        self.pos += 1;
        if self.peek() == Some(b'=') {
            self.pos += 1;
            self.push(with_eq, start, self.pos);
        } else {
            self.push(plain, start, self.pos);
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), CompileError> {
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                b'/' if self.bytes.get(self.pos + 1) == Some(&b'/') => {
                    while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                }
                b'/' if self.bytes.get(self.pos + 1) == Some(&b'*') => {
                    let start = self.pos;
                    self.pos += 2;
                    loop {
                        if self.pos + 1 >= self.bytes.len() {
                            return Err(CompileError::parse(
                                "Unterminated block comment",
                                Span::new(start, self.bytes.len()),
                            ));
                        }
                        if self.bytes[self.pos] == b'*' && self.bytes[self.pos + 1] == b'/' {
                            self.pos += 2;
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn lex_string(&mut self, start: usize) -> Result<(), CompileError> {
        let mut value = String::new();
        let mut chunk_start = self.pos;
        loop {
            match self.peek() {
                Some(b'"') => {
                    value.push_str(&self.source[chunk_start..self.pos]);
                    self.pos += 1;
                    break;
                }
                Some(b'\\') if matches!(self.bytes.get(self.pos + 1), Some(b'"' | b'\\')) => {
                    value.push_str(&self.source[chunk_start..self.pos]);
                    value.push(char::from(self.bytes[self.pos + 1]));
                    self.pos += 2;
                    chunk_start = self.pos;
                }
                Some(b'\n') | None => {
                    return Err(CompileError::parse(
                        "Unterminated string literal",
                        Span::new(start, self.pos),
                    ));
                }
                Some(_) => self.pos += 1,
            }
        }
        self.push(Token::String(value), start, self.pos);
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    fn lex_number(&mut self, start: usize) -> Result<(), CompileError> {
        let radix = match (self.bytes[self.pos], self.bytes.get(self.pos + 1)) {
            (b'0', Some(b'x' | b'X')) => 16,
            (b'0', Some(b'b' | b'B')) => 2,
            _ => 10,
        };

        if radix != 10 {
            self.pos += 2;
            let digits_start = self.pos;
            while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_alphanumeric() {
                self.pos += 1;
            }
            let digits = &self.source[digits_start..self.pos];
            return match u64::from_str_radix(digits, radix) {
                Ok(v) => {
                    self.push(Token::Number(v as f64), start, self.pos);
                    Ok(())
                }
                Err(_) => Err(CompileError::parse(
                    format!("Invalid number: {}", &self.source[start..self.pos]),
                    Span::new(start, self.pos),
                )),
            };
        }

        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        // `0..5` is a range, not a decimal
        if self.peek() == Some(b'.') && self.bytes.get(self.pos + 1).is_some_and(u8::is_ascii_digit) {
            self.pos += 1;
            while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_digit() {
                self.pos += 1;
            }
        }
        let text = &self.source[start..self.pos];
        match text.parse::<f64>() {
            Ok(v) if v.is_finite() => {
                self.push(Token::Number(v), start, self.pos);
                Ok(())
            }
            Ok(_) => Err(CompileError::parse(
                "Number literal is too large",
                Span::new(start, self.pos),
            )),
            Err(_) => Err(CompileError::parse(
                format!("Invalid number: {text}"),
                Span::new(start, self.pos),
            )),
        }
    }

    fn lex_ident(&mut self, start: usize) {
        while self.pos < self.bytes.len()
            && (self.bytes[self.pos].is_ascii_alphanumeric() || self.bytes[self.pos] == b'_')
        {
            self.pos += 1;
        }
        let word = &self.source[start..self.pos];
        let token = match word {
            "let" => Token::Let,
            "const" => Token::Const,
            "function" => Token::Function,
            "event" => Token::Event,
            "type" => Token::Type,
            "if" => Token::If,
            "else" => Token::Else,
            "while" => Token::While,
            "for" => Token::For,
            "in" => Token::In,
            "return" => Token::Return,
            "break" => Token::Break,
            "continue" => Token::Continue,
            "typeof" => Token::TypeOf,
            "fn" => Token::Fn,
            "true" => Token::True,
            "false" => Token::False,
            _ => Token::Ident(word.to_string()),
        };
        self.push(token, start, self.pos);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tok(s: &str) -> Vec<Token> {
        lex(s).unwrap().into_iter().map(|t| t.token).collect()
    }

    #[test]
    fn simple_tokens() {
        let tokens = tok("1 + 2.5");
        assert_eq!(tokens, vec![Token::Number(1.0), Token::Plus, Token::Number(2.5), Token::Eof]);
    }

    #[test]
    fn keywords() {
        let tokens = tok("let const function event type if else while for in return break continue typeof fn");
        assert_eq!(tokens, vec![
            Token::Let, Token::Const, Token::Function, Token::Event, Token::Type,
            Token::If, Token::Else, Token::While, Token::For, Token::In, Token::Return,
            Token::Break, Token::Continue, Token::TypeOf, Token::Fn, Token::Eof,
        ]);
    }

    #[test]
    fn operators() {
        let tokens = tok("+ - * / == != < <= > >= && || ! | = += -= *= /=");
        assert_eq!(tokens, vec![
            Token::Plus, Token::Minus, Token::Star, Token::Slash,
            Token::EqEq, Token::Ne, Token::Lt, Token::Le, Token::Gt, Token::Ge,
            Token::And, Token::Or, Token::Bang, Token::Pipe,
            Token::Eq, Token::PlusEq, Token::MinusEq, Token::StarEq, Token::SlashEq,
            Token::Eof,
        ]);
    }

    #[test]
    fn range_is_not_a_decimal() {
        let tokens = tok("0..5");
        assert_eq!(tokens, vec![Token::Number(0.0), Token::DotDot, Token::Number(5.0), Token::Eof]);
    }

    #[test]
    fn ellipsis_and_dot() {
        let tokens = tok("...T a.b");
        assert_eq!(tokens, vec![
            Token::Ellipsis, Token::Ident("T".into()),
            Token::Ident("a".into()), Token::Dot, Token::Ident("b".into()),
            Token::Eof,
        ]);
    }

    #[test]
    fn hex_and_binary_numbers() {
        let tokens = tok("0xFF 0b101 0x10");
        assert_eq!(tokens, vec![
            Token::Number(255.0), Token::Number(5.0), Token::Number(16.0), Token::Eof,
        ]);
    }

    #[test]
    fn invalid_binary_digit() {
        let err = lex("0b102").unwrap_err();
        assert!(err.message.contains("Invalid number"));
    }

    #[test]
    fn oversized_number_is_rejected() {
        let source = "9".repeat(309);
        let err = lex(&source).unwrap_err();
        assert_eq!(err.message, "Number literal is too large");
        assert_eq!(err.span, Span::new(0, 309));
        assert_eq!(tok(&"9".repeat(300)).len(), 2);
    }

    #[test]
    fn string_literal_with_escapes() {
        let tokens = tok(r#""say \"hi\"""#);
        assert_eq!(tokens, vec![Token::String("say \"hi\"".into()), Token::Eof]);
    }

    #[test]
    fn unterminated_string() {
        let err = lex("\"abc").unwrap_err();
        assert_eq!(err.message, "Unterminated string literal");
        assert_eq!(err.span, Span::new(0, 4));
    }

    #[test]
    fn comments_stripped() {
        let tokens = tok("a // trailing\n/* block\n comment */ b");
        assert_eq!(tokens, vec![Token::Ident("a".into()), Token::Ident("b".into()), Token::Eof]);
    }

    #[test]
    fn unterminated_block_comment() {
        let err = lex("a /* never closed").unwrap_err();
        assert_eq!(err.message, "Unterminated block comment");
    }

    #[test]
    fn unexpected_character() {
        let err = lex("let x = 1 # 2").unwrap_err();
        assert_eq!(err.message, "Unexpected character: '#'");
        assert_eq!(err.span, Span::new(10, 11));
    }

    #[test]
    fn spans_track_byte_offsets() {
        let tokens = lex("let abc").unwrap();
        assert_eq!(tokens[0].span, Span::new(0, 3));
        assert_eq!(tokens[1].span, Span::new(4, 7));
    }
}
