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

//! Core types and definitions for Rowdex
//!
//! This module contains the fundamental types used throughout the crate:
//!
//! - [`Representation`] - Key/value storage representations
//! - [`CompareType`] - Relational operators for index searches
//! - [`Value`] - Projected column values
//! - [`Row`] - An immutable row of values
//! - [`Error`] - Error types for all storage operations

pub mod error;
pub mod row;
pub mod types;
pub mod value;

// Re-export main types for convenience
pub use error::{Error, Result};
pub use row::Row;
pub use types::{
    CompareType, IsolationLevel, NullsOrder, Representation, ScanDirection, SortDirection,
};
pub use value::Value;
