// src/script/lexer.rs

//! Tokenizer for the strategy script language.

use super::error::ScriptError;

/// Reserved words recognised by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keyword {
    Var,
    Let,
    Const,
    Function,
    Return,
    If,
    Else,
    For,
    While,
    Do,
    Break,
    Continue,
    True,
    False,
    Null,
    Undefined,
    Typeof,
    New,
    Throw,
    Try,
    Catch,
    Finally,
    In,
}

impl Keyword {
    fn lookup(word: &str) -> Option<Self> {
        let keyword = match word {
            "var" => Keyword::Var,
            "let" => Keyword::Let,
            "const" => Keyword::Const,
            "function" => Keyword::Function,
            "return" => Keyword::Return,
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "for" => Keyword::For,
            "while" => Keyword::While,
            "do" => Keyword::Do,
            "break" => Keyword::Break,
            "continue" => Keyword::Continue,
            "true" => Keyword::True,
            "false" => Keyword::False,
            "null" => Keyword::Null,
            "undefined" => Keyword::Undefined,
            "typeof" => Keyword::Typeof,
            "new" => Keyword::New,
            "throw" => Keyword::Throw,
            "try" => Keyword::Try,
            "catch" => Keyword::Catch,
            "finally" => Keyword::Finally,
            "in" => Keyword::In,
            _ => return None,
        };
        Some(keyword)
    }

    /// Source spelling, used when a keyword appears as a property name.
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Keyword::Var => "var",
            Keyword::Let => "let",
            Keyword::Const => "const",
            Keyword::Function => "function",
            Keyword::Return => "return",
            Keyword::If => "if",
            Keyword::Else => "else",
            Keyword::For => "for",
            Keyword::While => "while",
            Keyword::Do => "do",
            Keyword::Break => "break",
            Keyword::Continue => "continue",
            Keyword::True => "true",
            Keyword::False => "false",
            Keyword::Null => "null",
            Keyword::Undefined => "undefined",
            Keyword::Typeof => "typeof",
            Keyword::New => "new",
            Keyword::Throw => "throw",
            Keyword::Try => "try",
            Keyword::Catch => "catch",
            Keyword::Finally => "finally",
            Keyword::In => "in",
        }
    }
}

/// Operators and delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Punct {
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Semi,
    Comma,
    Dot,
    Question,
    QuestionQuestion,
    Colon,
    Arrow,
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    Percent,
    PlusPlus,
    MinusMinus,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    EqEq,
    EqEqEq,
    NotEq,
    NotEqEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    AndAnd,
    OrOr,
    Bang,
}

/// A piece of a template literal: literal text or the source of a `${...}` hole.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TemplateChunk {
    Text(String),
    Code { source: String, line: usize, column: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Number(f64),
    Str(String),
    Template(Vec<TemplateChunk>),
    Ident(String),
    Keyword(Keyword),
    Punct(Punct),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) line: usize,
    pub(crate) column: usize,
    /// A line terminator separates this token from the previous one.
    pub(crate) newline_before: bool,
}

/// Splits source text into tokens. The final token is always `Eof`.
pub(crate) fn tokenize(source: &str) -> Result<Vec<Token>, ScriptError> {
    Lexer::new(source, 1, 1).run()
}

/// Tokenizes a nested fragment (a template hole) keeping the outer positions.
pub(crate) fn tokenize_at(source: &str, line: usize, column: usize) -> Result<Vec<Token>, ScriptError> {
    Lexer::new(source, line, column).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    newline_before: bool,
}

impl Lexer {
    fn new(source: &str, line: usize, column: usize) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line,
            column,
            newline_before: false,
        }
    }

    fn run(mut self) -> Result<Vec<Token>, ScriptError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia()?;
            let (line, column) = (self.line, self.column);
            let newline_before = std::mem::take(&mut self.newline_before);
            let Some(c) = self.peek() else {
                tokens.push(Token { kind: TokenKind::Eof, line, column, newline_before });
                return Ok(tokens);
            };

            let kind = if c.is_ascii_digit() || (c == '.' && self.peek_at(1).is_some_and(|n| n.is_ascii_digit())) {
                self.number()?
            } else if c == '"' || c == '\'' {
                TokenKind::Str(self.string(c)?)
            } else if c == '`' {
                self.template()?
            } else if is_ident_start(c) {
                let word = self.identifier();
                match Keyword::lookup(&word) {
                    Some(keyword) => TokenKind::Keyword(keyword),
                    None => TokenKind::Ident(word),
                }
            } else {
                TokenKind::Punct(self.punct()?)
            };
            tokens.push(Token { kind, line, column, newline_before });
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.get(self.pos).copied()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> ScriptError {
        ScriptError::syntax(self.line, self.column, message)
    }

    fn skip_trivia(&mut self) -> Result<(), ScriptError> {
        while let Some(c) = self.peek() {
            if c == '\n' {
                self.newline_before = true;
                self.bump();
            } else if c.is_whitespace() {
                self.bump();
            } else if c == '/' && self.peek_at(1) == Some('/') {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.bump();
                }
            } else if c == '/' && self.peek_at(1) == Some('*') {
                self.bump();
                self.bump();
                loop {
                    match self.bump() {
                        Some('*') if self.peek() == Some('/') => {
                            self.bump();
                            break;
                        }
                        Some('\n') => self.newline_before = true,
                        Some(_) => {}
                        None => return Err(self.error("unterminated block comment")),
                    }
                }
            } else {
                break;
            }
        }
        Ok(())
    }

    fn number(&mut self) -> Result<TokenKind, ScriptError> {
        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x' | 'X')) {
            self.bump();
            self.bump();
            let mut digits = String::new();
            while let Some(c) = self.peek().filter(char::is_ascii_hexdigit) {
                digits.push(c);
                self.bump();
            }
            let value = u64::from_str_radix(&digits, 16)
                .map_err(|_| self.error("malformed hexadecimal literal"))?;
            return Ok(TokenKind::Number(value as f64));
        }

        let mut text = String::new();
        while let Some(c) = self.peek().filter(char::is_ascii_digit) {
            text.push(c);
            self.bump();
        }
        if self.peek() == Some('.') {
            text.push('.');
            self.bump();
            while let Some(c) = self.peek().filter(char::is_ascii_digit) {
                text.push(c);
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let sign = self.peek_at(1);
            let digit_at = if matches!(sign, Some('+' | '-')) { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    if let Some(c) = self.bump() {
                        text.push(c);
                    }
                }
                while let Some(c) = self.peek().filter(char::is_ascii_digit) {
                    text.push(c);
                    self.bump();
                }
            }
        }
        if self.peek().is_some_and(is_ident_start) {
            return Err(self.error("identifier starts immediately after numeric literal"));
        }
        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| self.error(format!("malformed numeric literal '{text}'")))
    }

    fn escape(&mut self) -> Result<char, ScriptError> {
        let Some(c) = self.bump() else {
            return Err(self.error("unterminated escape sequence"));
        };
        let decoded = match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{8}',
            'f' => '\u{c}',
            'v' => '\u{b}',
            '0' => '\0',
            'x' => self.hex_escape(2)?,
            'u' => {
                if self.peek() == Some('{') {
                    self.bump();
                    let mut digits = String::new();
                    while let Some(c) = self.peek().filter(|c| *c != '}') {
                        digits.push(c);
                        self.bump();
                    }
                    self.bump();
                    u32::from_str_radix(&digits, 16)
                        .ok()
                        .and_then(char::from_u32)
                        .ok_or_else(|| self.error("malformed unicode escape"))?
                } else {
                    self.hex_escape(4)?
                }
            }
            other => other,
        };
        Ok(decoded)
    }

    fn hex_escape(&mut self, width: usize) -> Result<char, ScriptError> {
        let mut digits = String::with_capacity(width);
        for _ in 0..width {
            match self.bump() {
                Some(c) if c.is_ascii_hexdigit() => digits.push(c),
                _ => return Err(self.error("malformed hexadecimal escape")),
            }
        }
        u32::from_str_radix(&digits, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error("escape does not name a character"))
    }

    fn string(&mut self, quote: char) -> Result<String, ScriptError> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(value),
                Some('\\') => {
                    // Line continuation
                    if self.peek() == Some('\n') {
                        self.bump();
                        continue;
                    }
                    value.push(self.escape()?);
                }
                Some('\n') | None => return Err(self.error("unterminated string literal")),
                Some(c) => value.push(c),
            }
        }
    }

    fn template(&mut self) -> Result<TokenKind, ScriptError> {
        self.bump();
        let mut chunks = Vec::new();
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('`') => break,
                Some('\\') => text.push(self.escape()?),
                Some('$') if self.peek() == Some('{') => {
                    self.bump();
                    if !text.is_empty() {
                        chunks.push(TemplateChunk::Text(std::mem::take(&mut text)));
                    }
                    let (line, column) = (self.line, self.column);
                    let source = self.template_hole()?;
                    chunks.push(TemplateChunk::Code { source, line, column });
                }
                Some(c) => text.push(c),
                None => return Err(self.error("unterminated template literal")),
            }
        }
        if !text.is_empty() {
            chunks.push(TemplateChunk::Text(text));
        }
        Ok(TokenKind::Template(chunks))
    }

    /// Collects the raw source of a `${...}` hole up to its matching brace.
    fn template_hole(&mut self) -> Result<String, ScriptError> {
        let mut source = String::new();
        let mut depth = 0usize;
        loop {
            let Some(c) = self.bump() else {
                return Err(self.error("unterminated template expression"));
            };
            match c {
                '{' => depth += 1,
                '}' if depth == 0 => return Ok(source),
                '}' => depth -= 1,
                '"' | '\'' | '`' => {
                    source.push(c);
                    loop {
                        match self.bump() {
                            Some('\\') => {
                                source.push('\\');
                                if let Some(escaped) = self.bump() {
                                    source.push(escaped);
                                }
                            }
                            Some(q) if q == c => break,
                            Some(other) => source.push(other),
                            None => return Err(self.error("unterminated string in template expression")),
                        }
                    }
                }
                _ => {}
            }
            source.push(c);
        }
    }

    fn identifier(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.peek().filter(|c| is_ident_part(*c)) {
            word.push(c);
            self.bump();
        }
        word
    }

    fn punct(&mut self) -> Result<Punct, ScriptError> {
        const TABLE: &[(&str, Punct)] = &[
            ("===", Punct::EqEqEq),
            ("!==", Punct::NotEqEq),
            ("**", Punct::StarStar),
            ("=>", Punct::Arrow),
            ("==", Punct::EqEq),
            ("!=", Punct::NotEq),
            ("<=", Punct::LtEq),
            (">=", Punct::GtEq),
            ("&&", Punct::AndAnd),
            ("||", Punct::OrOr),
            ("??", Punct::QuestionQuestion),
            ("++", Punct::PlusPlus),
            ("--", Punct::MinusMinus),
            ("+=", Punct::PlusAssign),
            ("-=", Punct::MinusAssign),
            ("*=", Punct::StarAssign),
            ("/=", Punct::SlashAssign),
            ("%=", Punct::PercentAssign),
            ("{", Punct::LBrace),
            ("}", Punct::RBrace),
            ("(", Punct::LParen),
            (")", Punct::RParen),
            ("[", Punct::LBracket),
            ("]", Punct::RBracket),
            (";", Punct::Semi),
            (",", Punct::Comma),
            (".", Punct::Dot),
            ("?", Punct::Question),
            (":", Punct::Colon),
            ("+", Punct::Plus),
            ("-", Punct::Minus),
            ("*", Punct::Star),
            ("/", Punct::Slash),
            ("%", Punct::Percent),
            ("=", Punct::Assign),
            ("<", Punct::Lt),
            (">", Punct::Gt),
            ("!", Punct::Bang),
        ];

        for (spelling, punct) in TABLE {
            let matches = spelling
                .chars()
                .enumerate()
                .all(|(offset, expected)| self.peek_at(offset) == Some(expected));
            if matches {
                for _ in 0..spelling.len() {
                    self.bump();
                }
                return Ok(*punct);
            }
        }
        let unexpected = self.peek().unwrap_or(' ');
        Err(self.error(format!("unexpected character '{unexpected}'")))
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphabetic()
}

fn is_ident_part(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .expect("source should tokenize")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn numbers_and_operators() {
        assert_eq!(
            kinds("x += 1.5e2 ** .5"),
            vec![
                TokenKind::Ident("x".into()),
                TokenKind::Punct(Punct::PlusAssign),
                TokenKind::Number(150.0),
                TokenKind::Punct(Punct::StarStar),
                TokenKind::Number(0.5),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn strict_equality_is_one_token() {
        assert_eq!(
            kinds("a !== b"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Punct(Punct::NotEqEq),
                TokenKind::Ident("b".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn string_escapes_are_decoded() {
        assert_eq!(kinds(r#"'a\'b\n'"#)[0], TokenKind::Str("a'b\n".into()));
    }

    #[test]
    fn template_holes_keep_source() {
        let tokens = kinds("`${w} * x${i}`");
        let TokenKind::Template(chunks) = &tokens[0] else {
            panic!("expected template token, got {:?}", tokens[0]);
        };
        assert_eq!(chunks.len(), 3);
        assert!(matches!(&chunks[0], TemplateChunk::Code { source, .. } if source == "w"));
        assert_eq!(chunks[1], TemplateChunk::Text(" * x".into()));
    }

    #[test]
    fn comments_are_skipped_and_newlines_tracked() {
        let tokens = tokenize("a // trailing\n/* block\n */ b").expect("tokenize");
        assert_eq!(tokens[1].kind, TokenKind::Ident("b".into()));
        assert!(tokens[1].newline_before);
        assert_eq!(tokens[1].line, 3);
    }

    #[test]
    fn unterminated_string_is_a_syntax_error() {
        let err = tokenize("let s = 'open").unwrap_err();
        assert!(matches!(err, ScriptError::Syntax { line: 1, .. }));
    }
}
