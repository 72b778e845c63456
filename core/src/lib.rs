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

//! Database plumbing shared by the `dualseq` sequence generator.
//!
//! This crate knows nothing about sequences.  It offers the two pieces that any consumer of a
//! database needs regardless of what it stores:
//!
//! 1.  `db`: A thin layer over `sqlx` that hides the concrete database behind the `Db` trait and
//!     the `Executor` enum.  Consumers destructure the `Executor` to issue backend-specific
//!     statements, which is what allows them to speak different SQL dialects while sharing all of
//!     the connection management code.
//!
//! 1.  `env`: Helpers to read typed configuration from environment variables that share a common
//!     prefix.
//!
//! Errors from the database are classified into `DbError` so that they can float up to higher
//! layers with the `?` operator and be wrapped there into domain-specific error types.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

pub mod db;
pub mod env;
