//! IRC message prefix.
//!
//! A prefix identifies the origin of a message: a server name, or a user's
//! `nick!user@host` mask. Servers frequently send only the source, so every
//! component is optional.
//!
//! # Reference
//! - RFC 2812 Section 2.3.1: Message format

use std::fmt;

/// Message origin: `source[!user][@host]`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Prefix {
    /// Nickname or server name.
    pub source: Option<String>,
    /// Username (ident).
    pub user: Option<String>,
    /// Hostname.
    pub host: Option<String>,
}

impl Prefix {
    /// Create a full user prefix from nick, user, and host components.
    ///
    /// # Example
    ///
    /// ```
    /// use slirc_proto::Prefix;
    ///
    /// let prefix = Prefix::new("nick", "user", "host.example.com");
    /// assert_eq!(prefix.to_string(), "nick!user@host.example.com");
    /// ```
    pub fn new(nick: impl Into<String>, user: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            source: Some(nick.into()),
            user: Some(user.into()),
            host: Some(host.into()),
        }
    }

    /// Create a prefix carrying only a source (server name or bare nick).
    pub fn source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            user: None,
            host: None,
        }
    }

    /// Get the nickname if this looks like a user prefix.
    ///
    /// A bare source containing a dot is treated as a server name.
    pub fn nick(&self) -> Option<&str> {
        let source = self.source.as_deref()?;
        if self.user.is_none() && self.host.is_none() && source.contains('.') {
            None
        } else {
            Some(source)
        }
    }

    /// True when no component is set.
    pub fn is_empty(&self) -> bool {
        self.source.is_none() && self.user.is_none() && self.host.is_none()
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            f.write_str(source)?;
        }
        if let Some(user) = &self.user {
            write!(f, "!{}", user)?;
        }
        if let Some(host) = &self.host {
            write!(f, "@{}", host)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_partial_prefixes() {
        assert_eq!(Prefix::source("irc.example.com").to_string(), "irc.example.com");

        let nick_host = Prefix {
            source: Some("nick".into()),
            user: None,
            host: Some("host".into()),
        };
        assert_eq!(nick_host.to_string(), "nick@host");
        assert_eq!(Prefix::default().to_string(), "");
    }

    #[test]
    fn nick_detection() {
        assert_eq!(Prefix::source("irc.example.com").nick(), None);
        assert_eq!(Prefix::source("dala").nick(), Some("dala"));
        assert_eq!(Prefix::new("a", "b", "c.d").nick(), Some("a"));
        assert!(Prefix::default().is_empty());
    }
}
