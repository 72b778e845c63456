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

//! High-level data types that describe sequences and the databases that hold them.
//!
//! There is no logic in here other than the validation performed by the constructors.  All types
//! are immutable once built.

mod dialect;
pub use dialect::Dialect;
mod identifier;
pub use identifier::{SchemaName, SequenceName};
mod sequence_names;
pub use sequence_names::{Generator, SequenceNames};

/// Model errors.  Raised when an untrusted value does not represent a valid model object.
#[derive(Debug, thiserror::Error, PartialEq)]
#[error("{0}")]
pub struct ModelError(pub String);

/// Result type for this module.
pub type ModelResult<T> = Result<T, ModelError>;
