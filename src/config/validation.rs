//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use thiserror::Error;

/// Smallest usable line limit: a command keyword plus CR LF.
const MIN_LINE_LEN: usize = 16;

/// Validation errors for configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("server.host is required")]
    MissingHost,
    #[error("identity.nick is required")]
    MissingNick,
    #[error("identity.nick must not contain spaces, got '{0}'")]
    InvalidNick(String),
    #[error("session.max_line_len must be at least 16, got {0}")]
    LineLimitTooSmall(usize),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.host.trim().is_empty() {
        errors.push(ValidationError::MissingHost);
    }

    let nick = &config.identity.nick;
    if nick.is_empty() {
        errors.push(ValidationError::MissingNick);
    } else if nick.contains([' ', '\r', '\n']) {
        errors.push(ValidationError::InvalidNick(nick.clone()));
    }

    if config.session.max_line_len < MIN_LINE_LEN {
        errors.push(ValidationError::LineLimitTooSmall(
            config.session.max_line_len,
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(host: &str, nick: &str, max_line_len: usize) -> Config {
        let mut config: Config = toml::from_str(&format!(
            "[server]\nhost = \"{host}\"\n[identity]\nnick = \"{nick}\""
        ))
        .unwrap();
        config.session.max_line_len = max_line_len;
        config
    }

    #[test]
    fn test_valid() {
        assert_eq!(validate(&config("irc.example.net", "bot", 512)), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let errors = validate(&config("", "", 8)).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::MissingHost,
                ValidationError::MissingNick,
                ValidationError::LineLimitTooSmall(8),
            ]
        );
    }

    #[test]
    fn test_nick_with_space() {
        let errors = validate(&config("h", "two words", 512)).unwrap_err();
        assert_eq!(errors, vec![ValidationError::InvalidNick("two words".into())]);
    }
}
