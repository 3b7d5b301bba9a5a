use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CheckoutError>;

/// Known failure categories reported by the persistent store.
///
/// Used to map low-level write failures to user-facing remediation text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceKind {
    PermissionDenied,
    ForeignKeyViolation,
    NullConstraintViolation,
    Other,
}

/// Errors produced by the checkout pipeline.
///
/// `Validation` and `AdmissionBlocked` are raised strictly before any order is
/// written. `PaymentGateway` and `Persistence` can occur after one or more
/// sellers' orders are already committed; those orders are never rolled back.
#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("checkout blocked: {0}")]
    AdmissionBlocked(String),

    #[error("payment gateway error: {0}")]
    PaymentGateway(String),

    #[error("persistence error ({kind:?}): {detail}")]
    Persistence {
        kind: PersistenceKind,
        detail: String,
    },
}

impl CheckoutError {
    pub fn validation(detail: impl Into<String>) -> Self {
        Self::Validation(detail.into())
    }

    pub fn persistence(kind: PersistenceKind, detail: impl Into<String>) -> Self {
        Self::Persistence {
            kind,
            detail: detail.into(),
        }
    }

    /// Maps the error to remediation text suitable for end users.
    ///
    /// Only a small set of underlying reasons is recognized; everything else
    /// falls back to a generic message.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(detail) => format!("Please check your input: {detail}"),
            Self::AdmissionBlocked(detail) => {
                format!("Checkout is currently unavailable: {detail}")
            }
            Self::PaymentGateway(_) => {
                "We could not reach the payment provider. Your created orders are kept; \
                 please retry payment from your order list."
                    .to_string()
            }
            Self::Persistence { kind, .. } => match kind {
                PersistenceKind::PermissionDenied => {
                    "You do not have permission to perform this action. Please sign in again."
                        .to_string()
                }
                PersistenceKind::ForeignKeyViolation => {
                    "One of the items in your cart no longer exists. Please refresh your cart."
                        .to_string()
                }
                PersistenceKind::NullConstraintViolation => {
                    "Some required information was missing. Please complete the delivery form."
                        .to_string()
                }
                PersistenceKind::Other => {
                    "Something went wrong while saving your order. Please try again.".to_string()
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_known_kinds() {
        let err =
            CheckoutError::persistence(PersistenceKind::ForeignKeyViolation, "fk order_lines");
        assert!(err.user_message().contains("no longer exists"));

        let err = CheckoutError::persistence(PersistenceKind::PermissionDenied, "denied");
        assert!(err.user_message().contains("permission"));
    }

    #[test]
    fn test_user_message_generic_fallback() {
        let err = CheckoutError::persistence(PersistenceKind::Other, "disk full");
        assert!(err.user_message().contains("try again"));
        // The raw detail must not leak into the user-facing text.
        assert!(!err.user_message().contains("disk full"));
    }
}
