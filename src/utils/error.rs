use std::fmt;

/// Failure modes of the wallet operations. The API layer maps these to
/// HTTP status codes.
#[derive(Debug)]
pub enum WalletError {
    DatabaseError(String),
    UserNotFound(String),
    InsufficientFunds,
    /// Optimistic-lock conflict: another writer updated the balance first.
    Conflict,
    InvalidRequest(String),
}

impl fmt::Display for WalletError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            WalletError::UserNotFound(msg) => write!(f, "{}", msg),
            WalletError::InsufficientFunds => {
                write!(f, "Insufficient funds in the account")
            }
            WalletError::Conflict => write!(
                f,
                "Concurrency conflict occurred while updating the balance. Please try again."
            ),
            WalletError::InvalidRequest(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for WalletError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_message_asks_for_retry() {
        let msg = WalletError::Conflict.to_string();
        assert!(msg.contains("Please try again"));
    }
}
