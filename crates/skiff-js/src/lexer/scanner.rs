//! The scanner that produces tokens from source text.

use super::{Span, Token, TokenKind};
use unicode_xid::UnicodeXID;

/// A scanner that tokenizes JavaScript source code.
#[derive(Clone)]
pub struct Scanner<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    current_pos: usize,
    newline_seen: bool,
}

impl<'a> Scanner<'a> {
    /// Creates a new scanner for the given source code.
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.char_indices().peekable(),
            current_pos: 0,
            newline_seen: false,
        }
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        self.newline_seen = false;
        self.skip_whitespace_and_comments();
        let newline_before = self.newline_seen;

        let start = self.current_pos;

        let Some((_pos, ch)) = self.advance() else {
            return Token::new(TokenKind::Eof, Span::new(start, start), newline_before);
        };

        let kind = match ch {
            // Single-character tokens
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,

            // Multi-character operators
            '+' => {
                if self.match_char('+') {
                    TokenKind::PlusPlus
                } else if self.match_char('=') {
                    TokenKind::PlusEqual
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.match_char('-') {
                    TokenKind::MinusMinus
                } else if self.match_char('=') {
                    TokenKind::MinusEqual
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.match_char('=') {
                    TokenKind::StarEqual
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                // Comments were consumed by skip_whitespace_and_comments
                if self.match_char('=') {
                    TokenKind::SlashEqual
                } else {
                    TokenKind::Slash
                }
            }
            '%' => {
                if self.match_char('=') {
                    TokenKind::PercentEqual
                } else {
                    TokenKind::Percent
                }
            }
            '<' => {
                if self.match_char('=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                }
            }
            '>' => {
                if self.match_char('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                }
            }
            '=' => {
                if self.match_char('>') {
                    TokenKind::Arrow
                } else if self.match_char('=') {
                    if self.match_char('=') {
                        TokenKind::EqualEqualEqual
                    } else {
                        TokenKind::EqualEqual
                    }
                } else {
                    TokenKind::Equal
                }
            }
            '!' => {
                if self.match_char('=') {
                    if self.match_char('=') {
                        TokenKind::BangEqualEqual
                    } else {
                        TokenKind::BangEqual
                    }
                } else {
                    TokenKind::Bang
                }
            }
            '&' => {
                if self.match_char('&') {
                    TokenKind::AmpAmp
                } else {
                    TokenKind::Invalid
                }
            }
            '|' => {
                if self.match_char('|') {
                    TokenKind::PipePipe
                } else {
                    TokenKind::Invalid
                }
            }
            '?' => {
                if self.match_char('?') {
                    TokenKind::QuestionQuestion
                } else {
                    TokenKind::Question
                }
            }

            // String literals
            '"' | '\'' => self.scan_string(ch),

            // Template literals
            '`' => self.scan_template(),

            // Numbers
            '0'..='9' => self.scan_number(ch),

            // Identifiers and keywords
            _ if is_id_start(ch) => self.scan_identifier(ch),

            _ => TokenKind::Invalid,
        };

        Token::new(kind, Span::new(start, self.current_pos), newline_before)
    }

    fn advance(&mut self) -> Option<(usize, char)> {
        let result = self.chars.next();
        if let Some((pos, ch)) = result {
            self.current_pos = pos + ch.len_utf8();
        }
        result
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, ch)| *ch)
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.chars.clone();
        iter.next();
        iter.next().map(|(_, ch)| ch)
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some('\n' | '\r') => {
                    self.newline_seen = true;
                    self.advance();
                }
                Some(' ' | '\t' | '\u{feff}') => {
                    self.advance();
                }
                Some('/') => {
                    match self.peek_next() {
                        Some('/') => {
                            // Single-line comment: skip until end of line
                            self.advance();
                            self.advance();
                            while let Some(ch) = self.peek() {
                                if ch == '\n' || ch == '\r' {
                                    break;
                                }
                                self.advance();
                            }
                        }
                        Some('*') => {
                            // Multi-line comment: skip until */
                            self.advance();
                            self.advance();
                            while let Some(ch) = self.peek() {
                                if ch == '\n' {
                                    // A comment spanning lines counts as a
                                    // line terminator for semicolon insertion
                                    self.newline_seen = true;
                                }
                                if ch == '*' && self.peek_next() == Some('/') {
                                    self.advance();
                                    self.advance();
                                    break;
                                }
                                self.advance();
                            }
                        }
                        _ => return,
                    }
                }
                _ => return,
            }
        }
    }

    fn scan_string(&mut self, quote: char) -> TokenKind {
        let mut value = String::new();
        loop {
            match self.advance() {
                None => return TokenKind::Invalid,
                Some((_, ch)) if ch == quote => break,
                Some((_, '\n')) => return TokenKind::Invalid,
                Some((_, '\\')) => match self.scan_escape() {
                    Some(ch) => value.push(ch),
                    None => return TokenKind::Invalid,
                },
                Some((_, ch)) => value.push(ch),
            }
        }
        TokenKind::String(value)
    }

    fn scan_template(&mut self) -> TokenKind {
        let mut value = String::new();
        loop {
            match self.advance() {
                None => return TokenKind::Invalid,
                Some((_, '`')) => break,
                Some((_, '$')) if self.peek() == Some('{') => {
                    // Substitutions are not supported by this engine
                    return TokenKind::Invalid;
                }
                Some((_, '\\')) => match self.scan_escape() {
                    Some(ch) => value.push(ch),
                    None => return TokenKind::Invalid,
                },
                Some((_, ch)) => value.push(ch),
            }
        }
        TokenKind::Template(value)
    }

    fn scan_escape(&mut self) -> Option<char> {
        let (_, ch) = self.advance()?;
        match ch {
            'n' => Some('\n'),
            't' => Some('\t'),
            'r' => Some('\r'),
            'b' => Some('\u{8}'),
            'f' => Some('\u{c}'),
            'v' => Some('\u{b}'),
            '0' => Some('\0'),
            'u' => self.scan_unicode_escape(),
            '\n' => None,
            other => Some(other),
        }
    }

    fn scan_unicode_escape(&mut self) -> Option<char> {
        let mut digits = String::new();
        if self.peek() == Some('{') {
            self.advance();
            while let Some(ch) = self.peek() {
                if ch == '}' {
                    self.advance();
                    break;
                }
                digits.push(ch);
                self.advance();
            }
        } else {
            for _ in 0..4 {
                digits.push(self.advance()?.1);
            }
        }
        let code = u32::from_str_radix(&digits, 16).ok()?;
        char::from_u32(code)
    }

    fn scan_number(&mut self, first: char) -> TokenKind {
        // Hexadecimal
        if first == '0' && matches!(self.peek(), Some('x' | 'X')) {
            self.advance();
            let mut digits = String::new();
            while let Some(ch) = self.peek() {
                if ch.is_ascii_hexdigit() {
                    digits.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
            return match i64::from_str_radix(&digits, 16) {
                Ok(n) => TokenKind::Number(n as f64),
                Err(_) => TokenKind::Invalid,
            };
        }

        let mut text = String::new();
        text.push(first);
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        // Fractional part
        if self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            text.push('.');
            self.advance();
            while let Some(ch) = self.peek() {
                if ch.is_ascii_digit() {
                    text.push(ch);
                    self.advance();
                } else {
                    break;
                }
            }
        }

        // Exponent part
        if matches!(self.peek(), Some('e' | 'E')) {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            let sign_or_digit = lookahead.next().map(|(_, c)| c);
            let valid = match sign_or_digit {
                Some('+' | '-') => lookahead.next().is_some_and(|(_, c)| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if valid {
                text.push('e');
                self.advance();
                if let Some(sign @ ('+' | '-')) = self.peek() {
                    text.push(sign);
                    self.advance();
                }
                while let Some(ch) = self.peek() {
                    if ch.is_ascii_digit() {
                        text.push(ch);
                        self.advance();
                    } else {
                        break;
                    }
                }
            }
        }

        match text.parse::<f64>() {
            Ok(n) => TokenKind::Number(n),
            Err(_) => TokenKind::Invalid,
        }
    }

    fn scan_identifier(&mut self, first: char) -> TokenKind {
        let mut name = String::new();
        name.push(first);
        while let Some(ch) = self.peek() {
            if is_id_continue(ch) {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        keyword_kind(&name).unwrap_or(TokenKind::Identifier(name))
    }
}

/// Returns true if the character can start an identifier.
fn is_id_start(ch: char) -> bool {
    ch == '_' || ch == '$' || UnicodeXID::is_xid_start(ch)
}

/// Returns true if the character can continue an identifier.
fn is_id_continue(ch: char) -> bool {
    ch == '$' || UnicodeXID::is_xid_continue(ch)
}

fn keyword_kind(name: &str) -> Option<TokenKind> {
    let kind = match name {
        "break" => TokenKind::Break,
        "catch" => TokenKind::Catch,
        "const" => TokenKind::Const,
        "continue" => TokenKind::Continue,
        "default" => TokenKind::Default,
        "else" => TokenKind::Else,
        "export" => TokenKind::Export,
        "false" => TokenKind::False,
        "finally" => TokenKind::Finally,
        "for" => TokenKind::For,
        "function" => TokenKind::Function,
        "if" => TokenKind::If,
        "import" => TokenKind::Import,
        "let" => TokenKind::Let,
        "new" => TokenKind::New,
        "null" => TokenKind::Null,
        "return" => TokenKind::Return,
        "throw" => TokenKind::Throw,
        "true" => TokenKind::True,
        "try" => TokenKind::Try,
        "typeof" => TokenKind::Typeof,
        "var" => TokenKind::Var,
        "void" => TokenKind::Void,
        "while" => TokenKind::While,
        _ => return None,
    };
    Some(kind)
}
