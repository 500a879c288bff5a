//! Conversion of core results into payloads for a presentation layer.
//!
//! Errors, and panics, never cross this boundary as faults. Every operation
//! ends as an [`Outcome`], which serializes to a tagged JSON object:
//!
//! ```json
//! {"status": "success", "value": true}
//! {"status": "failure", "error": {"kind": "registry_error", "status_code": 404, "status_text": "Not Found"},
//!  "message": "Release registry returned 404 Not Found"}
//! ```

use crate::core::{UpdateResult, UpdaterError};
use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

/// A failure as shown to a presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub error: UpdaterError,
    pub message: String,
}

impl From<UpdaterError> for ErrorPayload {
    fn from(error: UpdaterError) -> Self {
        Self {
            message: error.to_string(),
            error,
        }
    }
}

/// Success value or serialized failure of one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    Success { value: T },
    Failure(ErrorPayload),
}

impl<T> Outcome<T> {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn into_result(self) -> UpdateResult<T> {
        match self {
            Self::Success { value } => Ok(value),
            Self::Failure(payload) => Err(payload.error),
        }
    }
}

impl<T> From<UpdateResult<T>> for Outcome<T> {
    fn from(result: UpdateResult<T>) -> Self {
        match result {
            Ok(value) => Self::Success { value },
            Err(error) => Self::Failure(error.into()),
        }
    }
}

/// Awaits `operation`, turning both errors and panics into an [`Outcome`].
pub async fn serialize_errors<T, F>(operation: F) -> Outcome<T>
where
    F: Future<Output = UpdateResult<T>>,
{
    match AssertUnwindSafe(operation).catch_unwind().await {
        Ok(result) => result.into(),
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::error!("Operation panicked: {}", message);
            Outcome::Failure(UpdaterError::Internal { message }.into())
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
