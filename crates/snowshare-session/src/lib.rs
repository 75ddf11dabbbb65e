//! Administrative session abstraction
//!
//! A `Session` is a pure statement transport against one Snowflake account:
//! it executes opaque statement strings and returns rows, with no SQL
//! parsing of its own. The production implementation speaks the Snowflake
//! REST protocol; tests substitute scripted sessions.

pub mod rest;
pub mod url;

pub use rest::RestConnector;
pub use url::account_identifier_from_url;

use snowshare_errors::Result;

/// One result row; values are `None` for SQL NULL
pub type Row = Vec<Option<String>>;

/// Connection parameters for one administrative target
#[derive(Debug, Clone)]
pub struct ConnectTarget {
    /// Account identifier, e.g. `xy12345` or `orgname-accountname`
    pub account: String,
    pub user: String,
    pub password: String,
    /// Role to assume after login, when set
    pub role: Option<String>,
}

impl ConnectTarget {
    /// Identity string for error reporting (never includes the password)
    pub fn identity(&self) -> String {
        format!("account '{}' as user '{}'", self.account, self.user)
    }
}

/// A live administrative connection to one target account
pub trait Session {
    /// Execute a statement and return its rows in order
    fn query(&mut self, statement: &str) -> Result<Vec<Row>>;

    /// Execute a statement, discarding any rows
    fn exec(&mut self, statement: &str) -> Result<()>;

    /// Close the connection; idempotent, errors are logged not raised
    fn close(&mut self);
}

/// Opens administrative sessions; the seam tests replace with fakes
pub trait SessionFactory {
    /// Open exactly one connection to the target, failing fast on
    /// authentication rejection
    fn connect(&self, target: &ConnectTarget) -> Result<Box<dyn Session>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_omits_password() {
        let target = ConnectTarget {
            account: "xy12345".to_string(),
            user: "ADMIN".to_string(),
            password: "secret".to_string(),
            role: None,
        };
        let identity = target.identity();
        assert!(identity.contains("xy12345"));
        assert!(identity.contains("ADMIN"));
        assert!(!identity.contains("secret"));
    }
}
