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

//! Configuration of the sequence generator and detection of the database dialect.

use crate::model::{Dialect, SchemaName};
use crate::{SequenceError, SequenceResult};
use derivative::Derivative;
use dualseq_core::env::get_optional_var;
use log::info;

/// URL prefixes that identify Oracle databases under strict detection.
const ORACLE_PREFIXES: &[&str] = &["jdbc:oracle"];

/// URL prefixes that identify PostgreSQL databases under strict detection.
const POSTGRES_PREFIXES: &[&str] = &["jdbc:postgresql", "postgres://", "postgresql://"];

/// Returns true if `url` starts with `prefix` ignoring ASCII case.
fn has_prefix_ignore_case(url: &str, prefix: &str) -> bool {
    url.len() >= prefix.len()
        && url.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Extracts the scheme components of `url` (like `jdbc:oracle`) so that they can be logged
/// without leaking credentials that may appear later in the URL.
fn url_scheme(url: &str) -> String {
    url.split(':')
        .take_while(|part| {
            !part.is_empty()
                && part.chars().all(|ch| ch.is_ascii_alphanumeric() || "+-.".contains(ch))
        })
        .take(2)
        .collect::<Vec<&str>>()
        .join(":")
}

/// Classifies the database behind the connection `url`.
///
/// URLs that start with `jdbc:oracle`, in any case, are Oracle databases.  Anything else is
/// assumed to be PostgreSQL, including malformed URLs.
pub fn detect_dialect(url: &str) -> Dialect {
    let dialect = if has_prefix_ignore_case(url, ORACLE_PREFIXES[0]) {
        Dialect::Oracle
    } else {
        Dialect::Postgres
    };
    info!("Detected {} dialect for '{}' URL", dialect, url_scheme(url));
    dialect
}

/// Classifies the database behind the connection `url`, failing if the URL does not positively
/// identify one of the supported dialects.
pub fn detect_dialect_strict(url: &str) -> SequenceResult<Dialect> {
    let dialect = if ORACLE_PREFIXES.iter().any(|prefix| has_prefix_ignore_case(url, prefix)) {
        Dialect::Oracle
    } else if POSTGRES_PREFIXES.iter().any(|prefix| has_prefix_ignore_case(url, prefix)) {
        Dialect::Postgres
    } else {
        return Err(SequenceError::UnknownDialect(url_scheme(url)));
    };
    info!("Detected {} dialect for '{}' URL", dialect, url_scheme(url));
    Ok(dialect)
}

/// Raw configuration of the sequence generator as supplied by the environment.
#[derive(Derivative)]
#[derivative(Debug, Default, PartialEq)]
pub struct SequenceOptions {
    /// Connection URL of the database, used only to detect its dialect.  May contain credentials.
    #[derivative(Debug = "ignore")]
    pub url: Option<String>,

    /// Schema to qualify table and sequence names with.
    pub schema: Option<String>,

    /// Whether URLs that do not positively identify a dialect are rejected.
    pub strict_dialect: bool,
}

impl SequenceOptions {
    /// Initializes a set of options from environment variables whose name is prefixed with the
    /// given `prefix`.
    ///
    /// This will use the optional variables `<prefix>_URL`, `<prefix>_SCHEMA` and
    /// `<prefix>_STRICT_DIALECT`.
    pub fn from_env(prefix: &str) -> Result<SequenceOptions, String> {
        Ok(SequenceOptions {
            url: get_optional_var::<String>(prefix, "URL")?,
            schema: get_optional_var::<String>(prefix, "SCHEMA")?,
            strict_dialect: get_optional_var::<bool>(prefix, "STRICT_DIALECT")?.unwrap_or(false),
        })
    }
}

/// Validated configuration of the sequence generator.
///
/// This is computed once during startup and copied into every session.  It is never modified
/// afterwards.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SequenceConfig {
    /// Dialect of the database, or `None` if it is not known.
    dialect: Option<Dialect>,

    /// Schema to qualify table and sequence names with, if any.
    schema: Option<SchemaName>,
}

impl SequenceConfig {
    /// Creates a configuration from already-validated values.
    pub fn new(dialect: Option<Dialect>, schema: Option<SchemaName>) -> Self {
        Self { dialect, schema }
    }

    /// Validates the raw `opts` and detects the database dialect.
    ///
    /// A missing URL leaves the dialect unknown, which makes every later retrieval fail.  A blank
    /// schema is the same as no schema.
    pub fn from_options(opts: &SequenceOptions) -> SequenceResult<Self> {
        let dialect = match opts.url.as_deref() {
            Some(url) if opts.strict_dialect => Some(detect_dialect_strict(url)?),
            Some(url) => Some(detect_dialect(url)),
            None => None,
        };

        let schema = match opts.schema.as_deref().map(str::trim) {
            Some("") | None => None,
            Some(schema) => Some(
                SchemaName::new(schema).map_err(|e| SequenceError::InvalidConfig(e.to_string()))?,
            ),
        };

        Ok(Self { dialect, schema })
    }

    /// Loads and validates the configuration from environment variables prefixed with `prefix`.
    pub fn from_env(prefix: &str) -> SequenceResult<Self> {
        let opts = SequenceOptions::from_env(prefix).map_err(SequenceError::InvalidConfig)?;
        Self::from_options(&opts)
    }

    /// Returns the dialect of the database, if known.
    pub fn dialect(&self) -> Option<Dialect> {
        self.dialect
    }

    /// Returns the schema to qualify names with, if any.
    pub fn schema(&self) -> Option<&SchemaName> {
        self.schema.as_ref()
    }
}
