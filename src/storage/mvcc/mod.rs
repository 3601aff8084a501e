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

//! MVCC visibility support
//!
//! - [`TransactionRegistry`]: transaction ids, sequences and visibility rules
//! - [`VisibilityContext`] / [`VisibilityFilter`]: per-call viewer and the
//!   iterator adapter that drops rows it cannot see
//! - [`VersionedRows`]: a row store whose handles an ordered index can hold

pub mod registry;
pub mod version_rows;
pub mod visibility;

pub use registry::{TransactionRegistry, BOOTSTRAP_TRANSACTION_ID};
pub use version_rows::{RowRef, RowVersion, VersionedRows};
pub use visibility::{VisibilityContext, VisibilityFilter};
