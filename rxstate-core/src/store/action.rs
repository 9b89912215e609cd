//! Actions.
//!
//! An action names a state transition with a type string and optionally
//! carries a payload. Reducers dispatch on the type string.

use serde::{Deserialize, Serialize};

/// Type of the action signalling an asynchronous operation.
pub const ASYNC_ACTION: &str = "[ASYNC_ACTION]";

/// Type of the action signalling a failure.
pub const ERROR_ACTION: &str = "[ERROR_ACTION]";

/// Type of the action asking reducers to restore their initial state.
pub const RESET_STATE: &str = "[RESET_STATE]";

/// Anything a reducer can dispatch on.
pub trait ActionType {
    fn action_type(&self) -> &str;
}

impl ActionType for &str {
    fn action_type(&self) -> &str {
        self
    }
}

impl ActionType for String {
    fn action_type(&self) -> &str {
        self.as_str()
    }
}

/// A typed action with an optional payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action<P> {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<P>,
}

impl<P> Action<P> {
    /// An action without payload.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: None,
        }
    }

    /// An action carrying `payload`.
    pub fn with_payload(kind: impl Into<String>, payload: P) -> Self {
        Self {
            kind: kind.into(),
            payload: Some(payload),
        }
    }

    pub fn async_action(payload: P) -> Self {
        Self::with_payload(ASYNC_ACTION, payload)
    }

    pub fn error() -> Self {
        Self::new(ERROR_ACTION)
    }

    pub fn reset_state() -> Self {
        Self::new(RESET_STATE)
    }

    /// Borrow the payload, if any.
    pub fn payload(&self) -> Option<&P> {
        self.payload.as_ref()
    }
}

impl<P> ActionType for Action<P> {
    fn action_type(&self) -> &str {
        &self.kind
    }
}
