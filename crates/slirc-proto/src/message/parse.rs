//! `FromStr` for `Message`, built on the line grammar.

use std::str::FromStr;

use crate::error::ParseError;
use crate::grammar;

use super::types::Message;

impl FromStr for Message {
    type Err = ParseError;

    /// Parse a line with or without its CR LF terminator.
    fn from_str(s: &str) -> Result<Message, Self::Err> {
        if s.ends_with("\r\n") {
            grammar::parse(s.as_bytes())
        } else {
            let mut line = String::with_capacity(s.len() + 2);
            line.push_str(s);
            line.push_str("\r\n");
            grammar::parse(line.as_bytes())
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{Command, Message, ParseError};

    #[test]
    fn test_terminator_is_optional() {
        let a: Message = "PING :x".parse().unwrap();
        let b: Message = "PING :x\r\n".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.command, Command::Ping);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!("".parse::<Message>(), Err(ParseError::MissingCommand));
    }

    #[test]
    fn test_embedded_newline_is_rejected() {
        assert!("PING :a\nb".parse::<Message>().is_err());
    }
}
