//! Hello result codes
//!
//! The `d.code` of a Hello signal reports the outcome of the handshake.

/// Handshake result carried by a Hello signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HelloCode {
    /// Handshake accepted
    Success,
    /// A required connection parameter is missing
    MissingParameter,
    /// Token is malformed
    InvalidToken,
    /// Token failed verification
    TokenVerificationFailed,
    /// Token has expired
    TokenExpired,
    /// Any code this client does not know about
    Unknown(u32),
}

impl HelloCode {
    /// Classify a raw hello code
    #[must_use]
    pub const fn from_u32(value: u32) -> Self {
        match value {
            0 => Self::Success,
            40100 => Self::MissingParameter,
            40101 => Self::InvalidToken,
            40102 => Self::TokenVerificationFailed,
            40103 => Self::TokenExpired,
            other => Self::Unknown(other),
        }
    }

    /// Get the raw value
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        match self {
            Self::Success => 0,
            Self::MissingParameter => 40100,
            Self::InvalidToken => 40101,
            Self::TokenVerificationFailed => 40102,
            Self::TokenExpired => 40103,
            Self::Unknown(value) => value,
        }
    }

    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Whether the rejection points at the bot credentials
    #[must_use]
    pub const fn is_credential_failure(self) -> bool {
        matches!(
            self,
            Self::InvalidToken | Self::TokenVerificationFailed | Self::TokenExpired
        )
    }

    /// Get the description for this code
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Success => "Handshake accepted",
            Self::MissingParameter => "Missing connection parameter",
            Self::InvalidToken => "Invalid token",
            Self::TokenVerificationFailed => "Token verification failed",
            Self::TokenExpired => "Token expired",
            Self::Unknown(_) => "Unknown hello code",
        }
    }
}

impl std::fmt::Display for HelloCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_u32())
    }
}
