//! Outcomes of a relay request other than a winning mirror response.

/// Error type for the dispatcher, mapped to a status at the HTTP boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    /// Identifier too short (or empty) to be worth racing.
    #[error("bad ipfs hash: {0}")]
    InvalidIdentifier(String),
    /// Bare root without a sub-path; the client should retry at `location`.
    #[error("missing sub-path, redirecting to {location}")]
    Redirect { location: String },
    /// The last liveness sweep left no mirrors to race.
    #[error("no live mirrors available")]
    EmptyPool,
    /// Every raced mirror failed, was rejected, or timed out.
    #[error("none of {attempted} mirrors could serve {identifier}")]
    NoWinner { identifier: String, attempted: usize },
}

impl RelayError {
    /// Short label for metrics and logs.
    pub fn outcome(&self) -> &'static str {
        match self {
            RelayError::InvalidIdentifier(_) => "invalid",
            RelayError::Redirect { .. } => "redirect",
            RelayError::EmptyPool => "empty_pool",
            RelayError::NoWinner { .. } => "no_winner",
        }
    }
}
