//! # slirc-proto
//!
//! The IRC line grammar used by the slirc client engine.
//!
//! ## Features
//!
//! - A byte-level [`Scanner`] that classifies one line into tokens
//! - A table-driven [`Parser`] that turns tokens into a [`Message`]
//! - Message construction and wire serialization
//! - Optional Tokio integration: a CR LF [`LineCodec`] with overlong-line recovery

#![deny(clippy::all)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! ## Quick Start
//!
//! ### Creating IRC Messages
//!
//! ```rust
//! use slirc_proto::{Message, Prefix};
//!
//! let privmsg = Message::privmsg("#rust", "Hello, world!");
//! let with_source = Message::notice("nick", "Server notice")
//!     .with_prefix(Prefix::source("irc.example.com"));
//!
//! assert_eq!(with_source.to_string(), ":irc.example.com NOTICE nick :Server notice");
//! assert_eq!(privmsg.to_line(), "PRIVMSG #rust :Hello, world!\r\n");
//! ```
//!
//! ### Parsing IRC Messages
//!
//! ```rust
//! use slirc_proto::{parse, Command};
//!
//! let message = parse(b":nick!user@host PRIVMSG #channel :Hello!\r\n").expect("valid line");
//! assert_eq!(message.command, Command::Privmsg);
//! assert_eq!(message.params, ["#channel"]);
//! ```

pub mod command;
pub mod error;
pub mod grammar;
#[cfg(feature = "tokio")]
pub mod line;
pub mod message;
pub mod prefix;
pub mod scanner;

pub use self::command::{Command, CommandKind};
pub use self::error::ParseError;
pub use self::grammar::{parse, Parser, MAX_PARAMS};
#[cfg(feature = "tokio")]
pub use self::line::{Line, LineCodec, MAX_LINE_LEN};
pub use self::message::Message;
pub use self::prefix::Prefix;
pub use self::scanner::{Scanner, Token, TokenKind};
