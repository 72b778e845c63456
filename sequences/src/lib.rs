// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Dialect-agnostic sequence ID generator.
//!
//! Application code asks for identifiers by the symbolic name of a *generator*, such as
//! `STAT_PARAMETER_SEQ`, and gets back the next value of the database sequence that backs it.
//! Which sequence object is read, and with which statement, depends on the dialect of the database
//! the process is configured against:
//!
//! * Oracle: `SELECT <name>.NEXTVAL FROM DUAL`
//! * PostgreSQL: `select nextval('<name>'::regclass)`
//!
//! The pieces fit together as follows:
//!
//! 1.  `config`: Detects the `Dialect` from the connection URL and validates the optional schema.
//!     The result is an immutable `SequenceConfig`.
//!
//! 1.  `catalog`: Holds the immutable mapping from generator names to the physical sequence names
//!     in each dialect, and resolves generator names.
//!
//! 1.  `session`: Defines the `Session` capability used to run the retrieval statements, and
//!     implements it on top of a `dualseq_core::db::Executor`.
//!
//! 1.  `provider`: Fetches one or many values for a single generator.
//!
//! 1.  `customizer`: Registers one provider per catalog entry into a `SequenceSession` once, at
//!     session initialization time, after applying the schema qualifier.
//!
//! Uniqueness of the returned values across concurrent sessions is entirely delegated to the
//! database: no state is shared between sessions other than the read-only catalog and config.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use dualseq_core::db::DbError;

pub mod catalog;
pub use catalog::Catalog;
pub mod config;
pub use config::{SequenceConfig, SequenceOptions};
pub mod customizer;
pub use customizer::{SequenceSession, customize};
pub mod model;
pub use model::Dialect;
pub mod provider;
pub use provider::SequenceProvider;
pub mod session;
pub use session::{DbSession, Session};

/// Sequence generation errors.
///
/// All of these are hard failures of the operation that raised them: a missing or wrong identifier
/// is a correctness violation, so nothing here is ever downgraded to a best-effort result.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum SequenceError {
    /// Indicates that a provider for the given generator name already lives in the session.
    #[error("Sequence {0} is already registered in this session")]
    AlreadyRegistered(String),

    /// Indicates that a value was requested before the database dialect was known.
    #[error("Database dialect is unknown; cannot pick a sequence statement")]
    AmbiguousDialect,

    /// Indicates a defect in the definition of the catalog.
    #[error("Invalid sequence catalog: {0}")]
    InvalidCatalog(String),

    /// Indicates a defect in the configuration of the generator.
    #[error("Invalid sequence configuration: {0}")]
    InvalidConfig(String),

    /// Indicates that the database failed to run a sequence statement.  The original error is
    /// carried as is.
    #[error("{0}")]
    QueryFailed(#[from] DbError),

    /// Indicates that strict detection could not classify the connection URL with the given
    /// scheme.
    #[error("Cannot determine the database dialect of '{0}' URLs")]
    UnknownDialect(String),

    /// Indicates that the requested generator name is not in the catalog.
    #[error("Unknown sequence generator {0}")]
    UnknownGenerator(String),
}

/// Result type for this crate.
pub type SequenceResult<T> = Result<T, SequenceError>;
