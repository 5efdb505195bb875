//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

// =============================================================================
// Server Defaults
// =============================================================================

/// Plain-text IRC port.
pub fn default_port() -> u16 {
    6667
}

// =============================================================================
// Identity Defaults
// =============================================================================

/// Username sent in USER.
pub fn default_user() -> String {
    "slirc".to_string()
}

/// Real name sent in USER.
pub fn default_realname() -> String {
    "slirc client".to_string()
}

// =============================================================================
// Session Defaults
// =============================================================================

/// RFC 1459 line limit.
pub fn default_max_line_len() -> usize {
    slirc_proto::MAX_LINE_LEN
}
