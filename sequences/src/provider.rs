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

//! Retrieval of values from the sequence that backs one generator.

use crate::catalog::Catalog;
use crate::model::Dialect;
use crate::session::Session;
use crate::{SequenceError, SequenceResult};
use log::debug;
use std::sync::Arc;

/// Upper bound of the number of slots reserved ahead of time by `next_values`.
const MAX_BATCH_RESERVATION: usize = 1024;

/// Fetches values for a single generator from the database.
///
/// A provider is bound to one generator name and to the dialect that was known when it was
/// created.  Every value is fetched with a fresh round trip to the database: nothing is cached,
/// nothing is fetched ahead of time, and no transaction is opened around the statement because
/// sequences are not transactional in any of the supported dialects.
#[derive(Clone, Debug)]
pub struct SequenceProvider {
    /// Name of the generator this provider serves.
    name: String,

    /// Catalog to resolve `name` against.
    catalog: Arc<Catalog>,

    /// Dialect of the database, or `None` if it was never detected.
    dialect: Option<Dialect>,
}

impl SequenceProvider {
    /// Creates a new provider for the generator `name` as defined in `catalog`.
    ///
    /// `name` is not validated here: unknown names are only reported when a value is requested.
    pub fn new<S: Into<String>>(name: S, catalog: Arc<Catalog>, dialect: Option<Dialect>) -> Self {
        Self { name: name.into(), catalog, dialect }
    }

    /// Returns the name of the generator this provider serves.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the dialect this provider issues statements for, if known.
    pub fn dialect(&self) -> Option<Dialect> {
        self.dialect
    }

    /// Returns the statement that fetches the next value of the generator.
    ///
    /// The generator is resolved before looking at the dialect so that an unknown name is always
    /// reported as such.
    pub fn statement(&self) -> SequenceResult<&str> {
        let generator = self.catalog.resolve(&self.name)?;
        let dialect = self.dialect.ok_or(SequenceError::AmbiguousDialect)?;
        Ok(generator.sequence_names().select(dialect))
    }

    /// Fetches the next value of the generator with exactly one statement on `session`.
    pub async fn next_value<S: Session + ?Sized>(&self, session: &mut S) -> SequenceResult<i64> {
        let query_str = self.statement()?;
        Ok(session.query_scalar(query_str).await?)
    }

    /// Fetches `count` values of the generator, in order, with one statement each.
    ///
    /// Either all values are returned or none is: the first failing statement aborts the batch and
    /// its error is returned, discarding the values fetched so far.
    pub async fn next_values<S: Session + ?Sized>(
        &self,
        session: &mut S,
        count: usize,
    ) -> SequenceResult<Vec<i64>> {
        debug!("Generating pre-allocation batch: {} {}", self.name, count);
        let query_str = self.statement()?;

        let mut values = Vec::with_capacity(count.min(MAX_BATCH_RESERVATION));
        for _ in 0..count {
            values.push(session.query_scalar(query_str).await?);
        }
        Ok(values)
    }

    /// Hook invoked when the session this provider lives in gets its connection.
    ///
    /// Nothing to do for now.  Dialect-specific prepared statements could be warmed up here.
    pub fn on_acquire_connection(&self) {}

    /// Hook invoked when the session this provider lives in releases its connection.
    ///
    /// Nothing to do for now.
    pub fn on_release_connection(&self) {}

    /// Whether values must be fetched after the row they identify is inserted.  Never: the
    /// database assigns the value before the insert.
    pub fn should_acquire_value_after_insert(&self) -> bool {
        false
    }

    /// Whether fetching values must happen inside a transaction.  Never: sequence increments must
    /// not roll back with the enclosing write.
    pub fn should_use_transaction(&self) -> bool {
        false
    }
}
