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

//! The `SequenceNames` and `Generator` data types.

use crate::model::{Dialect, SequenceName};
use log::debug;

/// Physical names of one logical sequence in every supported dialect, along with the statements
/// that fetch its next value.
///
/// The statements are formatted once at construction time.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SequenceNames {
    /// Name of the sequence object in Oracle databases.
    oracle_name: SequenceName,

    /// Name of the sequence object in PostgreSQL databases.
    postgres_name: SequenceName,

    /// Statement that fetches the next value from `oracle_name`.
    oracle_select: String,

    /// Statement that fetches the next value from `postgres_name`.
    postgres_select: String,
}

impl SequenceNames {
    /// Creates the record for a sequence named `oracle_name` in Oracle and `postgres_name` in
    /// PostgreSQL.
    pub fn new(oracle_name: SequenceName, postgres_name: SequenceName) -> Self {
        let oracle_select = format!("SELECT {}.NEXTVAL FROM DUAL", oracle_name);
        let postgres_select = format!("select nextval('{}'::regclass)", postgres_name);
        debug!("Oracle select from sequence: {}", oracle_name);
        debug!("Postgres select from sequence: {}", postgres_name);
        Self { oracle_name, postgres_name, oracle_select, postgres_select }
    }

    /// Returns the physical name of the sequence in the given `dialect`.
    pub fn name(&self, dialect: Dialect) -> &SequenceName {
        match dialect {
            Dialect::Oracle => &self.oracle_name,
            Dialect::Postgres => &self.postgres_name,
        }
    }

    /// Returns the statement that fetches the next value of the sequence in the given `dialect`.
    pub fn select(&self, dialect: Dialect) -> &str {
        match dialect {
            Dialect::Oracle => &self.oracle_select,
            Dialect::Postgres => &self.postgres_select,
        }
    }
}

/// A logical sequence as known by the application.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Generator {
    /// Symbolic name used by the application to request identifiers.
    name: String,

    /// Physical names of the sequence backing this generator.
    sequence_names: SequenceNames,
}

impl Generator {
    /// Creates a new generator called `name` backed by `sequence_names`.
    pub(crate) fn new(name: String, sequence_names: SequenceNames) -> Self {
        Self { name, sequence_names }
    }

    /// Returns the symbolic name of the generator.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the physical names of the sequence backing this generator.
    pub fn sequence_names(&self) -> &SequenceNames {
        &self.sequence_names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_names_statements() {
        let names = SequenceNames::new(
            SequenceName::new("SEQ_STAT_PARAMETER").unwrap(),
            SequenceName::new("stat_parameter_reportid_seq").unwrap(),
        );
        assert_eq!("SELECT SEQ_STAT_PARAMETER.NEXTVAL FROM DUAL", names.select(Dialect::Oracle));
        assert_eq!(
            "select nextval('stat_parameter_reportid_seq'::regclass)",
            names.select(Dialect::Postgres)
        );
        assert_eq!("SEQ_STAT_PARAMETER", names.name(Dialect::Oracle).as_str());
        assert_eq!("stat_parameter_reportid_seq", names.name(Dialect::Postgres).as_str());
    }

    #[test]
    fn test_sequence_names_qualified() {
        let names = SequenceNames::new(
            SequenceName::new("REPORTING.SEQ_A").unwrap(),
            SequenceName::new("reporting.a_id_seq").unwrap(),
        );
        assert_eq!("SELECT REPORTING.SEQ_A.NEXTVAL FROM DUAL", names.select(Dialect::Oracle));
        assert_eq!(
            "select nextval('reporting.a_id_seq'::regclass)",
            names.select(Dialect::Postgres)
        );
    }
}
