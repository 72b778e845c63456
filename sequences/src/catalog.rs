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

//! The catalog of known generators.
//!
//! Every generator that application code can request identifiers from must be declared here
//! together with the names of its backing sequence in each dialect.  Entities reference generators
//! by their symbolic name, for example `STAT_PARAMETER_SEQ`, and the catalog takes care of
//! finding the right physical sequence.
//!
//! A catalog is built once at startup, either from the built-in table or from a JSON document,
//! and cannot be modified afterwards.  Share it with `Arc`.

use crate::model::{Generator, SequenceName, SequenceNames};
use crate::{SequenceError, SequenceResult};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Generator for the identifiers of statistics parameters.
pub const STAT_PARAMETER_SEQ: &str = "STAT_PARAMETER_SEQ";

/// Generator for the identifiers of privilege objects.
pub const PRIVILEGE_OBJECT_SEQ: &str = "PRIVILEGE_OBJECT_SEQ";

/// Built-in generators as `(name, oracle sequence, postgres sequence)` tuples.
const BUILTIN: &[(&str, &str, &str)] = &[
    (STAT_PARAMETER_SEQ, "SEQ_STAT_PARAMETER", "stat_parameter_reportid_seq"),
    (PRIVILEGE_OBJECT_SEQ, "SEQ_PRIVILEGE_OBJECT", "privilege_object_objectid_seq"),
];

/// A catalog entry as represented in JSON documents.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogEntry {
    /// Symbolic name of the generator.
    name: String,

    /// Physical name of the sequence in Oracle.
    oracle: String,

    /// Physical name of the sequence in PostgreSQL.
    postgres: String,
}

/// Immutable mapping of generator names to their physical sequences.
#[derive(Debug)]
pub struct Catalog {
    /// All known generators keyed by their symbolic name.
    generators: BTreeMap<String, Generator>,
}

impl Catalog {
    /// Returns the catalog of generators used by the application.
    pub fn builtin() -> Self {
        Self::from_table(BUILTIN).expect("Built-in catalog must be valid")
    }

    /// Builds a catalog from a table of `(name, oracle sequence, postgres sequence)` tuples.
    pub fn from_table(table: &[(&str, &str, &str)]) -> SequenceResult<Self> {
        Self::build(table.iter().map(|(name, oracle, postgres)| CatalogEntry {
            name: (*name).to_owned(),
            oracle: (*oracle).to_owned(),
            postgres: (*postgres).to_owned(),
        }))
    }

    /// Builds a catalog from a JSON array of objects with `name`, `oracle` and `postgres` keys.
    pub fn from_json(json: &str) -> SequenceResult<Self> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(json)
            .map_err(|e| SequenceError::InvalidCatalog(format!("Malformed JSON: {}", e)))?;
        Self::build(entries)
    }

    /// Builds a catalog from a collection of untrusted `entries`.
    fn build<I: IntoIterator<Item = CatalogEntry>>(entries: I) -> SequenceResult<Self> {
        let mut generators = BTreeMap::default();
        for entry in entries {
            if entry.name.trim().is_empty() {
                return Err(SequenceError::InvalidCatalog(
                    "Generator name cannot be empty".to_owned(),
                ));
            }

            let oracle = SequenceName::new(entry.oracle).map_err(|e| {
                SequenceError::InvalidCatalog(format!("Generator {}: {}", entry.name, e))
            })?;
            let postgres = SequenceName::new(entry.postgres).map_err(|e| {
                SequenceError::InvalidCatalog(format!("Generator {}: {}", entry.name, e))
            })?;

            match generators.entry(entry.name) {
                Entry::Occupied(e) => {
                    return Err(SequenceError::InvalidCatalog(format!(
                        "Generator {} defined more than once",
                        e.key()
                    )));
                }
                Entry::Vacant(e) => {
                    let names = SequenceNames::new(oracle, postgres);
                    let generator = Generator::new(e.key().clone(), names);
                    e.insert(generator);
                }
            }
        }
        Ok(Self { generators })
    }

    /// Looks up the generator called exactly `name`.
    ///
    /// Names are case sensitive.  Callers must resolve the generator before issuing any SQL so
    /// that unknown names never reach the database.
    pub fn resolve(&self, name: &str) -> SequenceResult<&Generator> {
        self.generators.get(name).ok_or_else(|| SequenceError::UnknownGenerator(name.to_owned()))
    }

    /// Returns the names of all generators in the catalog in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.generators.keys().map(String::as_str)
    }

    /// Returns all generators in the catalog sorted by name.
    pub fn generators(&self) -> impl Iterator<Item = &Generator> {
        self.generators.values()
    }

    /// Returns the number of generators in the catalog.
    pub fn len(&self) -> usize {
        self.generators.len()
    }

    /// Returns true if the catalog has no generators.
    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dialect;

    #[test]
    fn test_builtin_resolves_all_names() {
        let catalog = Catalog::builtin();
        assert_eq!(2, catalog.len());
        assert_eq!(
            vec![PRIVILEGE_OBJECT_SEQ, STAT_PARAMETER_SEQ],
            catalog.names().collect::<Vec<_>>()
        );

        for name in catalog.names() {
            let generator = catalog.resolve(name).unwrap();
            assert_eq!(name, generator.name());

            let names = generator.sequence_names();
            assert_eq!(
                format!("SELECT {}.NEXTVAL FROM DUAL", names.name(Dialect::Oracle)),
                names.select(Dialect::Oracle)
            );
            assert_eq!(
                format!("select nextval('{}'::regclass)", names.name(Dialect::Postgres)),
                names.select(Dialect::Postgres)
            );
        }
    }

    #[test]
    fn test_builtin_physical_names() {
        let catalog = Catalog::builtin();

        let names = catalog.resolve(STAT_PARAMETER_SEQ).unwrap().sequence_names();
        assert_eq!("SEQ_STAT_PARAMETER", names.name(Dialect::Oracle).as_str());
        assert_eq!("stat_parameter_reportid_seq", names.name(Dialect::Postgres).as_str());

        let names = catalog.resolve(PRIVILEGE_OBJECT_SEQ).unwrap().sequence_names();
        assert_eq!("SEQ_PRIVILEGE_OBJECT", names.name(Dialect::Oracle).as_str());
        assert_eq!("privilege_object_objectid_seq", names.name(Dialect::Postgres).as_str());
    }

    #[test]
    fn test_resolve_unknown() {
        let catalog = Catalog::builtin();
        for name in
            ["", "UNKNOWN_SEQ", "stat_parameter_seq", " STAT_PARAMETER_SEQ", "SEQ_STAT_PARAMETER"]
        {
            assert_eq!(
                SequenceError::UnknownGenerator(name.to_owned()),
                catalog.resolve(name).unwrap_err()
            );
        }
    }

    #[test]
    fn test_from_table_ok() {
        let catalog = Catalog::from_table(&[("B", "SEQ_B", "b_id_seq"), ("A", "SEQ_A", "a_id_seq")])
            .unwrap();
        assert!(!catalog.is_empty());
        assert_eq!(vec!["A", "B"], catalog.generators().map(Generator::name).collect::<Vec<_>>());
        assert_eq!(
            "select nextval('b_id_seq'::regclass)",
            catalog.resolve("B").unwrap().sequence_names().select(Dialect::Postgres)
        );
    }

    #[test]
    fn test_from_table_empty() {
        let catalog = Catalog::from_table(&[]).unwrap();
        assert!(catalog.is_empty());
        assert_eq!(0, catalog.names().count());
    }

    #[test]
    fn test_from_table_duplicate() {
        assert_eq!(
            SequenceError::InvalidCatalog("Generator A defined more than once".to_owned()),
            Catalog::from_table(&[("A", "SEQ_A", "a_id_seq"), ("A", "SEQ_B", "b_id_seq")])
                .unwrap_err()
        );
    }

    #[test]
    fn test_from_table_invalid_names() {
        match Catalog::from_table(&[(" ", "SEQ_A", "a_id_seq")]) {
            Err(SequenceError::InvalidCatalog(e)) => assert!(e.contains("cannot be empty")),
            e => panic!("Must have failed with InvalidCatalog but got: {:?}", e),
        }

        match Catalog::from_table(&[("A", "SEQ A", "a_id_seq")]) {
            Err(SequenceError::InvalidCatalog(e)) => assert!(e.starts_with("Generator A: ")),
            e => panic!("Must have failed with InvalidCatalog but got: {:?}", e),
        }

        match Catalog::from_table(&[("A", "SEQ_A", "a_id_seq'::regclass); --")]) {
            Err(SequenceError::InvalidCatalog(e)) => assert!(e.contains("Unsupported character")),
            e => panic!("Must have failed with InvalidCatalog but got: {:?}", e),
        }
    }

    #[test]
    fn test_from_json_ok() {
        let catalog = Catalog::from_json(
            r#"[
                {"name": "STAT_PARAMETER_SEQ", "oracle": "SEQ_STAT_PARAMETER",
                 "postgres": "stat_parameter_reportid_seq"},
                {"name": "ORDER_SEQ", "oracle": "SEQ_ORDER", "postgres": "order_id_seq"}
            ]"#,
        )
        .unwrap();
        assert_eq!(vec!["ORDER_SEQ", STAT_PARAMETER_SEQ], catalog.names().collect::<Vec<_>>());
        assert_eq!(
            "SELECT SEQ_ORDER.NEXTVAL FROM DUAL",
            catalog.resolve("ORDER_SEQ").unwrap().sequence_names().select(Dialect::Oracle)
        );
    }

    #[test]
    fn test_from_json_errors() {
        for json in [
            "",
            "{}",
            r#"[{"name": "A", "oracle": "SEQ_A"}]"#,
            r#"[{"name": "A", "oracle": "SEQ_A", "postgres": "a_seq", "mysql": "a"}]"#,
        ] {
            match Catalog::from_json(json) {
                Err(SequenceError::InvalidCatalog(e)) => assert!(e.starts_with("Malformed JSON")),
                e => panic!("Must have failed with InvalidCatalog for {} but got: {:?}", json, e),
            }
        }

        assert_eq!(
            SequenceError::InvalidCatalog("Generator A defined more than once".to_owned()),
            Catalog::from_json(
                r#"[{"name": "A", "oracle": "SEQ_A", "postgres": "a_seq"},
                    {"name": "A", "oracle": "SEQ_A", "postgres": "a_seq"}]"#
            )
            .unwrap_err()
        );
    }
}
