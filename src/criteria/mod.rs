// SPDX-License-Identifier: MIT

pub mod condition;
pub mod error;
pub mod job;
pub mod loader;
pub mod snapshot;
pub mod types;

pub use error::{CriteriaError, Result};
pub use snapshot::Snapshot;
