// Copyright 2025 Rowdex Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for Rowdex
//!
//! Absent keys and rows are never errors; every lookup returns an `Option`.
//! Errors are reserved for capacity exhaustion, constraint violations and
//! caller contract violations.

use thiserror::Error;

use super::types::Representation;

/// Result type alias for Rowdex operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Rowdex storage operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // =========================================================================
    // Capacity errors
    // =========================================================================
    /// Growing the slot arrays would exceed the representable slot count.
    /// The instance is left in its last consistent state.
    #[error("capacity exhausted: {requested} slots requested, limit is {limit}")]
    CapacityExhausted { requested: usize, limit: usize },

    // =========================================================================
    // Contract errors
    // =========================================================================
    /// A key or value was passed in a representation other than the one
    /// the map was constructed with
    #[error("{role} representation mismatch, expected {expected}, got {got}")]
    RepresentationMismatch {
        role: &'static str,
        expected: Representation,
        got: Representation,
    },

    /// A value was supplied to a map constructed without a value column (a set)
    #[error("map has no value column")]
    MissingValueColumn,

    /// Comparator refers to a column the row provider cannot project
    #[error("column position {position} out of range for index {index}")]
    ColumnOutOfRange { index: String, position: usize },

    /// Invalid construction-time configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // =========================================================================
    // Constraint errors
    // =========================================================================
    /// Unique constraint violation
    #[error("unique constraint failed for index {index} with key {key}")]
    UniqueConstraint { index: String, key: String },

    // =========================================================================
    // Transaction errors
    // =========================================================================
    /// Transaction is not active (never started, already committed or aborted)
    #[error("transaction {0} is not active")]
    TransactionNotActive(i64),

    /// Registry is not accepting new transactions
    #[error("transaction registry is not accepting new transactions")]
    NotAccepting,

    // =========================================================================
    // Other errors
    // =========================================================================
    /// Internal error for broken structural invariants
    #[error("{message}")]
    Internal { message: String },
}

impl Error {
    /// Create a new CapacityExhausted error
    pub fn capacity_exhausted(requested: usize, limit: usize) -> Self {
        Error::CapacityExhausted { requested, limit }
    }

    /// Create a new RepresentationMismatch error
    pub fn representation_mismatch(
        role: &'static str,
        expected: Representation,
        got: Representation,
    ) -> Self {
        Error::RepresentationMismatch {
            role,
            expected,
            got,
        }
    }

    /// Create a new UniqueConstraint error
    pub fn unique_constraint(index: impl Into<String>, key: impl Into<String>) -> Self {
        Error::UniqueConstraint {
            index: index.into(),
            key: key.into(),
        }
    }

    /// Create a new InvalidConfig error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Error::InvalidConfig(message.into())
    }

    /// Create a new Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// Check if this is a capacity error
    pub fn is_capacity_error(&self) -> bool {
        matches!(self, Error::CapacityExhausted { .. })
    }

    /// Check if this is a constraint violation error
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Error::UniqueConstraint { .. })
    }

    /// Check if this error reports a caller contract violation
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Error::RepresentationMismatch { .. }
                | Error::MissingValueColumn
                | Error::ColumnOutOfRange { .. }
                | Error::InvalidConfig(_)
        )
    }

    /// Check if this is a transaction-related error
    pub fn is_transaction_error(&self) -> bool {
        matches!(self, Error::TransactionNotActive(_) | Error::NotAccepting)
    }
}
