use thiserror::Error;

use super::status::ValidationStatus;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("form state lock poisoned while {0}")]
    StatePoisoned(&'static str),
    #[error("unknown field `{0}`")]
    UnknownField(String),
    #[error("field `{field}` has no element at index {index}")]
    ElementOutOfRange { field: String, index: usize },
    #[error("invalid validation status transition: {from:?} -> {to:?}")]
    InvalidStatusTransition {
        from: ValidationStatus,
        to: ValidationStatus,
    },
    #[error("invalid form configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type FormResult<T> = Result<T, FormError>;

/// Failure raised by a validator while checking a value.
///
/// A fault is contained at the binding that produced it: the binding settles
/// as `Invalid` and the fault is logged.
#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ValidatorFault {
    #[error("transport failed: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("could not schedule check: {0}")]
    Spawn(String),
    #[error("validator panicked: {0}")]
    Panicked(String),
    #[error("{0}")]
    Message(String),
}
