use serde::{Deserialize, Serialize};

/// Customer information persisted in the authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    custid: String,
    role: String,
    verified: bool,
}

impl SessionIdentity {
    /// Creates a session identity from authentication data.
    #[must_use]
    pub fn new(custid: impl Into<String>, role: impl Into<String>, verified: bool) -> Self {
        Self {
            custid: custid.into(),
            role: role.into(),
            verified,
        }
    }

    /// Returns the customer identifier (canonical email address).
    #[must_use]
    pub fn custid(&self) -> &str {
        self.custid.as_str()
    }

    /// Returns the customer role as stored at login time.
    #[must_use]
    pub fn role(&self) -> &str {
        self.role.as_str()
    }

    /// Returns whether the account email has been verified.
    #[must_use]
    pub fn verified(&self) -> bool {
        self.verified
    }
}
