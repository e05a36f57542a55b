// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Errors raised by the derived-state engine.
///
/// Ownership and precondition failures are terminal for the request that
/// caused them; only `Persistence` is worth retrying.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("user '{user_id}' does not own this {entity}")]
    AccessDenied {
        entity: &'static str,
        user_id: String,
    },

    #[error("{0}")]
    InvalidState(String),

    #[error("{entity} {key} not found")]
    NotFound { entity: &'static str, key: String },

    #[error("persistence failure: {0}")]
    Persistence(#[from] rusqlite::Error),
}

impl EngineError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Whether a caller may retry the failed operation as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}
