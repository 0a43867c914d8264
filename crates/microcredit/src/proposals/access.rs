use std::fmt;

/// Bearer credential presented with staff requests.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Extract the token from an `Authorization: Bearer ...` header value.
    pub fn from_bearer(header: &str) -> Option<Self> {
        let (scheme, token) = header.trim().split_once(' ')?;
        let token = token.trim();
        (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| Self::new(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(***)")
    }
}

/// An authenticated staff member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffSession {
    pub subject: String,
}

/// Capability gating every staff-only record operation.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, token: Option<&SessionToken>) -> Result<StaffSession, AccessError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("staff session token required")]
    MissingToken,
    #[error("staff session token rejected")]
    InvalidToken,
}

/// Accepts a fixed set of operator tokens supplied through configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticTokenAuthenticator {
    grants: Vec<(String, String)>,
}

impl StaticTokenAuthenticator {
    /// `grants` are `(subject, token)` pairs. Empty tokens are ignored.
    pub fn new(grants: Vec<(String, String)>) -> Self {
        let grants = grants
            .into_iter()
            .filter(|(_, token)| !token.trim().is_empty())
            .collect();
        Self { grants }
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

impl Authenticator for StaticTokenAuthenticator {
    fn authenticate(&self, token: Option<&SessionToken>) -> Result<StaffSession, AccessError> {
        let token = token.ok_or(AccessError::MissingToken)?;
        self.grants
            .iter()
            .find(|(_, expected)| expected.as_bytes() == token.as_str().as_bytes())
            .map(|(subject, _)| StaffSession {
                subject: subject.clone(),
            })
            .ok_or(AccessError::InvalidToken)
    }
}
