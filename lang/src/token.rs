//! Tokenizer and the lookahead-capable token stream feeding the parser.
//!
//! The whole source is lexed up front into a `Vec<Token>`; the stream then
//! offers single-token consumption plus an unbounded speculative peek cursor
//! that never consumes. Whitespace is ordinarily skipped, but inside vector
//! and matrix literals a run of spaces separates elements, so the stream can
//! be switched into space-significant mode and back.

use core::fmt;

/// Kind of a lexed token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// End of input. The token vector always ends with exactly one `Eof`.
    Eof,
    /// `(`.
    LParen,
    /// `)`.
    RParen,
    /// `=`.
    Equal,
    /// `=>`.
    Definer,
    /// A run of one or more spaces or tabs, collapsed into a single token.
    Space,
    /// `\n`.
    Eol,
    /// Identifier: `[A-Za-z_][A-Za-z0-9_]*`.
    Ident,
    /// Integer literal: a digit run.
    Integer,
    /// Float literal: digits, `.`, digits, with an optional exponent.
    Float,
    /// `+`.
    Plus,
    /// `-`.
    Minus,
    /// `*`.
    Star,
    /// `/`.
    Slash,
    /// `.` (dot product operator; a `.` starting a fraction lexes as `Float`).
    Dot,
    /// `^`.
    Caret,
    /// `!`.
    Bang,
    /// `,`.
    Comma,
    /// `[`.
    LBracket,
    /// `]`.
    RBracket,
    /// Any character the tokenizer does not recognize.
    Unknown,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Eof => "end of input",
            Self::LParen => "`(`",
            Self::RParen => "`)`",
            Self::Equal => "`=`",
            Self::Definer => "`=>`",
            Self::Space => "space",
            Self::Eol => "end of line",
            Self::Ident => "identifier",
            Self::Integer => "integer literal",
            Self::Float => "float literal",
            Self::Plus => "`+`",
            Self::Minus => "`-`",
            Self::Star => "`*`",
            Self::Slash => "`/`",
            Self::Dot => "`.`",
            Self::Caret => "`^`",
            Self::Bang => "`!`",
            Self::Comma => "`,`",
            Self::LBracket => "`[`",
            Self::RBracket => "`]`",
            Self::Unknown => "unrecognized character",
        })
    }
}

/// Token with its verbatim text and 1-based source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Kind of the token.
    pub kind: TokenKind,
    /// Verbatim source text of the token.
    pub text: String,
    /// 1-based line of the first character.
    pub line: u32,
    /// 1-based column of the first character.
    pub col: u32,
}

struct Tokenizer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: u32,
    col: u32,
}

impl Tokenizer<'_> {
    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn eat_while(&mut self, text: &mut String, mut cond: impl FnMut(char) -> bool) {
        while let Some(&ch) = self.chars.peek() {
            if !cond(ch) {
                break;
            }
            text.push(ch);
            self.bump();
        }
    }

    fn next_token(&mut self) -> Option<Token> {
        // Carriage returns are dropped so that CRLF input lexes like LF.
        while self.chars.peek() == Some(&'\r') {
            self.bump();
        }

        let (line, col) = (self.line, self.col);
        let ch = self.bump()?;
        let mut text = ch.to_string();

        let kind = match ch {
            ' ' | '\t' => {
                self.eat_while(&mut text, |ch| ch == ' ' || ch == '\t');
                TokenKind::Space
            }
            '\n' => TokenKind::Eol,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '.' => TokenKind::Dot,
            '^' => TokenKind::Caret,
            '!' => TokenKind::Bang,
            ',' => TokenKind::Comma,
            '=' => {
                if self.chars.peek() == Some(&'>') {
                    text.push('>');
                    self.bump();
                    TokenKind::Definer
                } else {
                    TokenKind::Equal
                }
            }
            '0'..='9' => self.number(&mut text),
            ch if ch.is_ascii_alphabetic() || ch == '_' => {
                self.eat_while(&mut text, |ch| ch.is_ascii_alphanumeric() || ch == '_');
                TokenKind::Ident
            }
            _ => TokenKind::Unknown,
        };

        Some(Token {
            kind,
            text,
            line,
            col,
        })
    }

    fn number(&mut self, text: &mut String) -> TokenKind {
        self.eat_while(text, |ch| ch.is_ascii_digit());

        // A dot is part of the number only if a digit follows; otherwise it
        // is left in place as the dot product operator.
        let mut lookahead = self.chars.clone();
        if lookahead.next() == Some('.') && lookahead.next().map_or(false, |ch| ch.is_ascii_digit())
        {
            text.push('.');
            self.bump();
            self.eat_while(text, |ch| ch.is_ascii_digit());

            let mut lookahead = self.chars.clone();
            if let Some(e) = lookahead.next() {
                if e == 'e' || e == 'E' {
                    let next = lookahead.next();
                    let exponent_follows = match next {
                        Some('+') | Some('-') => {
                            lookahead.next().map_or(false, |ch| ch.is_ascii_digit())
                        }
                        Some(ch) => ch.is_ascii_digit(),
                        None => false,
                    };
                    if exponent_follows {
                        text.push(e);
                        self.bump();
                        if let Some(&sign) = self.chars.peek() {
                            if sign == '+' || sign == '-' {
                                text.push(sign);
                                self.bump();
                            }
                        }
                        self.eat_while(text, |ch| ch.is_ascii_digit());
                    }
                }
            }
            TokenKind::Float
        } else {
            TokenKind::Integer
        }
    }
}

/// Lexes the entire source into tokens. The result always ends with a single
/// `Eof` token; unrecognized characters become `Unknown` tokens for the
/// parser to report.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokenizer = Tokenizer {
        chars: source.chars().peekable(),
        line: 1,
        col: 1,
    };
    let mut tokens = vec![];
    while let Some(token) = tokenizer.next_token() {
        tokens.push(token);
    }
    tokens.push(Token {
        kind: TokenKind::Eof,
        text: String::new(),
        line: tokenizer.line,
        col: tokenizer.col,
    });
    tokens
}

/// Cursor over a pre-lexed token vector with speculative lookahead.
///
/// `advance` consumes one token; `peek` walks a separate cursor forward
/// without consuming anything, so the parser can look arbitrarily far ahead
/// (e.g., to tell a function call from a function definition) and then either
/// consume normally or [`Self::reset_peek`].
#[derive(Debug)]
pub struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
    peek_pos: usize,
    space_significant: bool,
}

impl TokenStream {
    /// Creates a stream over the given tokens. `tokens` must end with `Eof`.
    pub fn new(tokens: Vec<Token>) -> Self {
        debug_assert_eq!(tokens.last().map(|token| token.kind), Some(TokenKind::Eof));
        let mut this = Self {
            tokens,
            pos: 0,
            peek_pos: 0,
            space_significant: false,
        };
        this.skip_insignificant();
        this
    }

    fn skip_insignificant(&mut self) {
        if !self.space_significant {
            while self.tokens[self.pos].kind == TokenKind::Space {
                self.pos += 1;
            }
        }
        self.peek_pos = self.pos;
    }

    /// Returns the current (not yet consumed) token.
    pub fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    /// Consumes and returns the current token. At the end of input, keeps
    /// returning `Eof`.
    pub fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        self.skip_insignificant();
        token
    }

    /// Advances the speculative cursor and returns the token it lands on.
    /// The first `peek` after an `advance` (or [`Self::reset_peek`]) returns
    /// the token following the current one.
    pub fn peek(&mut self) -> &Token {
        if self.peek_pos + 1 < self.tokens.len() {
            self.peek_pos += 1;
        }
        if !self.space_significant {
            while self.tokens[self.peek_pos].kind == TokenKind::Space
                && self.peek_pos + 1 < self.tokens.len()
            {
                self.peek_pos += 1;
            }
        }
        &self.tokens[self.peek_pos]
    }

    /// Rewinds the speculative cursor back to the current token.
    pub fn reset_peek(&mut self) {
        self.peek_pos = self.pos;
    }

    /// Switches space significance on or off and returns the previous mode.
    /// Turning significance off skips any spaces at the current position.
    pub fn set_space_significant(&mut self, significant: bool) -> bool {
        let previous = self.space_significant;
        self.space_significant = significant;
        if !significant {
            self.skip_insignificant();
        }
        previous
    }
}
