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

//! The `SequenceName` and `SchemaName` data types.
//!
//! Both types end up pasted verbatim into SQL statements, which is why their constructors are
//! strict: only unquoted identifiers that are valid in Oracle and PostgreSQL alike are accepted.

use crate::model::{ModelError, ModelResult};
use std::fmt;

/// Maximum length of a physical sequence name, including any qualifiers.
const MAX_SEQUENCE_NAME_LENGTH: usize = 128;

/// Maximum length of a schema name.  This is PostgreSQL's `NAMEDATALEN - 1`.
const MAX_SCHEMA_NAME_LENGTH: usize = 63;

/// Validates that `segment` is a single unquoted SQL identifier.
///
/// `what` names the kind of identifier being validated and `full` is the complete input, both for
/// error reporting purposes only.  `leading_underscore` allows segments to start with `_`, which
/// PostgreSQL accepts but Oracle does not.
fn validate_segment(
    what: &str,
    full: &str,
    segment: &str,
    leading_underscore: bool,
) -> ModelResult<()> {
    let mut chars = segment.chars();
    match chars.next() {
        None => return Err(ModelError(format!("{} '{}' has an empty component", what, full))),
        Some('_') if leading_underscore => (),
        Some(ch) if !ch.is_ascii_alphabetic() => {
            return Err(ModelError(format!(
                "{} '{}' must start every component with a letter",
                what, full
            )));
        }
        Some(_) => (),
    }

    for ch in chars {
        if !(ch.is_ascii_alphanumeric() || "_$#".find(ch).is_some()) {
            return Err(ModelError(format!(
                "Unsupported character '{}' in {} '{}'",
                ch, what, full
            )));
        }
    }
    Ok(())
}

/// Represents the physical name of a sequence object in the database.
///
/// The name may be qualified with dots (as in `schema.sequence`) and is kept exactly as given:
/// case folding rules differ between databases so we never touch it.  Every component must start
/// with a letter so that the same name is a valid unquoted identifier in Oracle too.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SequenceName(String);

impl SequenceName {
    /// Creates a new sequence name from an untrusted string `s`, making sure it is valid.
    pub fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();

        if s.is_empty() {
            return Err(ModelError("Sequence name cannot be empty".to_owned()));
        }
        if s.len() > MAX_SEQUENCE_NAME_LENGTH {
            return Err(ModelError(format!("Sequence name '{}' is too long", s)));
        }
        for segment in s.split('.') {
            validate_segment("sequence name", &s, segment, false)?;
        }

        Ok(Self(s))
    }

    /// Returns a string view of the sequence name.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for SequenceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Represents a database schema used to qualify the names of tables and sequences.
///
/// Schemas are only applied to PostgreSQL sessions, so names like `_staging` are accepted.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SchemaName(String);

impl SchemaName {
    /// Creates a new schema name from an untrusted string `s`, making sure it is valid.
    pub fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();

        if s.is_empty() {
            return Err(ModelError("Schema name cannot be empty".to_owned()));
        }
        if s.len() > MAX_SCHEMA_NAME_LENGTH {
            return Err(ModelError(format!("Schema name '{}' is too long", s)));
        }
        validate_segment("schema name", &s, &s, true)?;

        Ok(Self(s))
    }

    /// Returns a string view of the schema name.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_name_ok() {
        assert_eq!("SEQ_STAT_PARAMETER", SequenceName::new("SEQ_STAT_PARAMETER").unwrap().as_str());
        assert_eq!(
            "stat_parameter_reportid_seq",
            SequenceName::new("stat_parameter_reportid_seq").unwrap().as_str()
        );
        assert_eq!("Mixed_Case", SequenceName::new("Mixed_Case").unwrap().as_str());
        assert_eq!("reporting.SEQ$1#", SequenceName::new("reporting.SEQ$1#").unwrap().as_str());
    }

    #[test]
    fn test_sequence_name_error() {
        assert!(SequenceName::new("").is_err());
        assert!(SequenceName::new("1seq").is_err());
        assert!(SequenceName::new("seq name").is_err());
        assert!(SequenceName::new("seq'; DROP TABLE users; --").is_err());
        assert!(SequenceName::new("seq\"quoted\"").is_err());
        assert!(SequenceName::new("a..b").is_err());
        assert!(SequenceName::new(".seq").is_err());
        assert!(SequenceName::new("seq.").is_err());
        assert!(SequenceName::new("s\u{00e9}q").is_err());
        assert!(SequenceName::new("_seq").is_err());
        assert!(SequenceName::new("reporting._seq").is_err());
        assert!(SequenceName::new("_reporting.seq").is_err());

        let mut long_name = "s".repeat(MAX_SEQUENCE_NAME_LENGTH);
        assert!(SequenceName::new(&long_name).is_ok());
        long_name.push('x');
        assert!(SequenceName::new(&long_name).is_err());
    }

    #[test]
    fn test_sequence_name_error_messages() {
        assert_eq!(
            ModelError("Unsupported character ' ' in sequence name 'a b'".to_owned()),
            SequenceName::new("a b").unwrap_err()
        );
        assert_eq!(
            ModelError("sequence name 'a..b' has an empty component".to_owned()),
            SequenceName::new("a..b").unwrap_err()
        );
        match SequenceName::new("SEQ_A._B") {
            Err(ModelError(e)) => {
                assert_eq!("sequence name 'SEQ_A._B' must start every component with a letter", e)
            }
            e => panic!("Must have failed with ModelError but got: {:?}", e),
        }
    }

    #[test]
    fn test_schema_name_ok() {
        assert_eq!("reporting", SchemaName::new("reporting").unwrap().as_str());
        assert_eq!("PRODIS_01", SchemaName::new("PRODIS_01").unwrap().as_str());
        assert_eq!("pg_temp", SchemaName::new("pg_temp").unwrap().to_string());
        assert_eq!("_staging", SchemaName::new("_staging").unwrap().as_str());
    }

    #[test]
    fn test_schema_name_error() {
        assert!(SchemaName::new("").is_err());
        assert!(SchemaName::new("a.b").is_err());
        assert!(SchemaName::new("public; RESET ALL").is_err());
        assert!(SchemaName::new("9lives").is_err());

        let mut long_name = "s".repeat(MAX_SCHEMA_NAME_LENGTH);
        assert!(SchemaName::new(&long_name).is_ok());
        long_name.push('x');
        assert!(SchemaName::new(&long_name).is_err());
    }
}
