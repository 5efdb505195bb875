use std::fmt::{self, Display, Formatter};

use super::types::Message;

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(ref prefix) = self.prefix {
            write!(f, ":{} ", prefix)?;
        }

        write!(f, "{}", self.command)?;

        for param in &self.params {
            write!(f, " {}", param)?;
        }

        if let Some(ref trailing) = self.trailing {
            write!(f, " :{}", trailing)?;
        }

        Ok(())
    }
}

impl Message {
    /// Serialize to a complete wire line, CR LF included.
    pub fn to_line(&self) -> String {
        let mut line = self.to_string();
        line.push_str("\r\n");
        line
    }
}
