//! Lexical scanner for IRC lines.
//!
//! The scanner classifies the bytes of one line into [`Token`]s. It knows the
//! *shape* of each token (what a nickname, a host or a trailing parameter may
//! contain) but not the legal *order* of tokens; that is the parser's job.
//!
//! Its only state is a lexical mode: inside the prefix the same bytes mean
//! different things before `!`, between `!` and `@`, and after `@`, and after
//! a trailing marker everything up to the terminator is one token.
//!
//! ```text
//! :nick!user@host PRIVMSG #chan :hello world\r\n
//! ^^   ^^   ^^   ^^      ^^    ^^^          ^
//! |    ||   ||   |Command|Param|Trailing    Crlf
//! |    ||   |Host Space  Space Colon
//! |    |User At
//! |    Exclamation
//! Colon Nickname
//! ```

use std::fmt;

use nom::bytes::complete::{tag, take_while, take_while1};
use nom::IResult;

use crate::command::CommandKind;
use crate::error::ParseError;

const CRLF: &[u8] = b"\r\n";

/// Shape of a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// `\r\n`.
    Crlf,
    /// `:` introducing a prefix or a trailing parameter.
    Colon,
    /// Prefix source without a dot.
    Nickname,
    /// One or more spaces.
    Space,
    /// Prefix source containing a dot.
    ServerName,
    /// `!` between source and user.
    Exclamation,
    /// Username after `!`.
    User,
    /// `@` before the host.
    At,
    /// Hostname after `@`.
    Host,
    /// A recognized command keyword.
    Command(CommandKind),
    /// Any other word.
    Param,
    /// Free text after a trailing marker, up to the terminator.
    Trailing,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Crlf => f.write_str("line terminator"),
            TokenKind::Colon => f.write_str("':'"),
            TokenKind::Nickname => f.write_str("nickname"),
            TokenKind::Space => f.write_str("space"),
            TokenKind::ServerName => f.write_str("server name"),
            TokenKind::Exclamation => f.write_str("'!'"),
            TokenKind::User => f.write_str("user"),
            TokenKind::At => f.write_str("'@'"),
            TokenKind::Host => f.write_str("host"),
            TokenKind::Command(kind) => write!(f, "command {}", kind),
            TokenKind::Param => f.write_str("parameter"),
            TokenKind::Trailing => f.write_str("trailing parameter"),
        }
    }
}

/// One token, borrowing its bytes from the line being scanned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token<'a> {
    /// Token shape.
    pub kind: TokenKind,
    /// The bytes the token covers.
    pub lexeme: &'a [u8],
    /// Byte offset of the token in the line.
    pub position: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Very first byte: a colon here opens a prefix.
    Start,
    PrefixSource,
    PrefixUser,
    PrefixHost,
    Body,
    /// Right after a trailing marker.
    Trailing,
    /// After the terminator.
    Done,
    /// A lexical error was reported; the scanner is fused.
    Failed,
}

type LexResult<'a> = IResult<&'a [u8], &'a [u8]>;

fn crlf(input: &[u8]) -> LexResult<'_> {
    tag(CRLF)(input)
}

fn spaces(input: &[u8]) -> LexResult<'_> {
    take_while1(|b: u8| b == b' ')(input)
}

fn prefix_source(input: &[u8]) -> LexResult<'_> {
    take_while1(|b: u8| is_text_byte(b) && !matches!(b, b' ' | b'!' | b'@'))(input)
}

fn prefix_user(input: &[u8]) -> LexResult<'_> {
    take_while1(|b: u8| is_text_byte(b) && !matches!(b, b' ' | b'!' | b'@'))(input)
}

fn prefix_host(input: &[u8]) -> LexResult<'_> {
    take_while1(|b: u8| is_text_byte(b) && b != b' ')(input)
}

fn word(input: &[u8]) -> LexResult<'_> {
    take_while1(|b: u8| is_text_byte(b) && b != b' ')(input)
}

fn trailing(input: &[u8]) -> LexResult<'_> {
    take_while(is_text_byte)(input)
}

/// Bytes allowed anywhere inside a line.
#[inline]
fn is_text_byte(b: u8) -> bool {
    !matches!(b, b'\0' | b'\r' | b'\n')
}

/// Streaming tokenizer over one line.
///
/// Yields tokens until the input is exhausted. After the first lexical error
/// the scanner yields that error once and then stops.
#[derive(Clone, Debug)]
pub struct Scanner<'a> {
    input: &'a [u8],
    rest: &'a [u8],
    mode: Mode,
}

impl<'a> Scanner<'a> {
    /// Create a scanner over a line buffer.
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            rest: input,
            mode: Mode::Start,
        }
    }

    /// Byte offset of the next unscanned byte.
    #[inline]
    pub fn offset(&self) -> usize {
        self.input.len() - self.rest.len()
    }

    fn emit(&mut self, kind: TokenKind, rest: &'a [u8], lexeme: &'a [u8]) -> Token<'a> {
        let token = Token {
            kind,
            lexeme,
            position: self.offset(),
        };
        self.rest = rest;
        token
    }

    fn fail(&mut self, error: ParseError) -> Option<Result<Token<'a>, ParseError>> {
        self.mode = Mode::Failed;
        Some(Err(error))
    }

    fn illegal_byte(&mut self) -> Option<Result<Token<'a>, ParseError>> {
        let position = self.offset();
        match self.rest.first().copied() {
            Some(byte) => self.fail(ParseError::IllegalByte { byte, position }),
            None => None,
        }
    }

    fn scan_prefix(&mut self) -> Option<Result<Token<'a>, ParseError>> {
        let input = self.rest;
        match input.first().copied()? {
            b'!' => {
                self.mode = Mode::PrefixUser;
                let (lexeme, rest) = input.split_at(1);
                Some(Ok(self.emit(TokenKind::Exclamation, rest, lexeme)))
            }
            b'@' => {
                self.mode = Mode::PrefixHost;
                let (lexeme, rest) = input.split_at(1);
                Some(Ok(self.emit(TokenKind::At, rest, lexeme)))
            }
            b' ' => {
                self.mode = Mode::Body;
                self.scan_body()
            }
            _ => {
                let lexed = match self.mode {
                    Mode::PrefixSource => prefix_source(input).ok().map(|(rest, lexeme)| {
                        let kind = if lexeme.contains(&b'.') {
                            TokenKind::ServerName
                        } else {
                            TokenKind::Nickname
                        };
                        (kind, rest, lexeme)
                    }),
                    Mode::PrefixUser => prefix_user(input)
                        .ok()
                        .map(|(rest, lexeme)| (TokenKind::User, rest, lexeme)),
                    _ => prefix_host(input)
                        .ok()
                        .map(|(rest, lexeme)| (TokenKind::Host, rest, lexeme)),
                };
                match lexed {
                    Some((kind, rest, lexeme)) => Some(Ok(self.emit(kind, rest, lexeme))),
                    // Terminator or an illegal byte inside the prefix.
                    None => {
                        self.mode = Mode::Body;
                        self.scan_body()
                    }
                }
            }
        }
    }

    fn scan_body(&mut self) -> Option<Result<Token<'a>, ParseError>> {
        let input = self.rest;
        if input.is_empty() {
            return None;
        }

        if let Ok((rest, lexeme)) = crlf(input) {
            self.mode = Mode::Done;
            return Some(Ok(self.emit(TokenKind::Crlf, rest, lexeme)));
        }
        if let Ok((rest, lexeme)) = spaces(input) {
            return Some(Ok(self.emit(TokenKind::Space, rest, lexeme)));
        }
        if input.first() == Some(&b':') {
            self.mode = Mode::Trailing;
            let (lexeme, rest) = input.split_at(1);
            return Some(Ok(self.emit(TokenKind::Colon, rest, lexeme)));
        }
        if let Ok((rest, lexeme)) = word(input) {
            let kind = match CommandKind::from_keyword(lexeme) {
                Some(command) => TokenKind::Command(command),
                None => TokenKind::Param,
            };
            return Some(Ok(self.emit(kind, rest, lexeme)));
        }

        self.illegal_byte()
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token<'a>, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.mode {
            Mode::Failed => None,
            Mode::Done => {
                if self.rest.is_empty() {
                    None
                } else {
                    let position = self.offset();
                    self.fail(ParseError::TrailingData { position })
                }
            }
            Mode::Start => {
                if self.rest.first() == Some(&b':') {
                    self.mode = Mode::PrefixSource;
                    let (lexeme, rest) = self.rest.split_at(1);
                    Some(Ok(self.emit(TokenKind::Colon, rest, lexeme)))
                } else {
                    self.mode = Mode::Body;
                    self.scan_body()
                }
            }
            Mode::PrefixSource | Mode::PrefixUser | Mode::PrefixHost => self.scan_prefix(),
            Mode::Trailing => {
                self.mode = Mode::Body;
                // take_while never fails; an empty trailing parameter is legal.
                let (rest, lexeme) = trailing(self.rest).unwrap_or((self.rest, &[]));
                Some(Ok(self.emit(TokenKind::Trailing, rest, lexeme)))
            }
            Mode::Body => self.scan_body(),
        }
    }
}
