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

//! The database session that sequence statements run against.

use crate::model::SchemaName;
use async_trait::async_trait;
#[cfg(feature = "postgres")]
use dualseq_core::db::postgres;
#[cfg(any(feature = "sqlite", test))]
use dualseq_core::db::sqlite;
#[cfg(any(feature = "sqlite", feature = "testutils", test))]
use dualseq_core::db::DbError;
use dualseq_core::db::{DbResult, Executor};

/// Capabilities that the sequence providers need from a live database session.
#[async_trait]
pub trait Session: Send {
    /// Runs `sql`, which must return exactly one row with one integer column, and returns the
    /// value in that column.
    async fn query_scalar(&mut self, sql: &str) -> DbResult<i64>;

    /// Scopes the resolution of unqualified table and sequence names to `schema`.
    ///
    /// The setting outlives the session if the underlying connection is pooled, so callers must
    /// undo it with `reset_name_qualifier` before giving the connection back.
    async fn set_name_qualifier(&mut self, schema: &SchemaName) -> DbResult<()>;

    /// Restores the default resolution of unqualified names.
    async fn reset_name_qualifier(&mut self) -> DbResult<()>;
}

/// A session backed by a database executor.
///
/// The executor runs in autocommit mode so every value fetched from a sequence is consumed right
/// away, independently of any transaction the caller may have open elsewhere.
#[derive(Debug)]
pub struct DbSession {
    /// The executor to run statements on.
    ex: Executor,
}

impl DbSession {
    /// Creates a new session that runs statements on `ex`.
    pub fn new(ex: Executor) -> Self {
        Self { ex }
    }

    /// Returns the executor backing this session to run other statements on it.
    pub fn ex(&mut self) -> &mut Executor {
        &mut self.ex
    }

    /// Consumes the session and returns its executor.
    pub fn into_inner(self) -> Executor {
        self.ex
    }
}

#[async_trait]
impl Session for DbSession {
    async fn query_scalar(&mut self, sql: &str) -> DbResult<i64> {
        match &mut self.ex {
            #[cfg(feature = "postgres")]
            Executor::Postgres(ex) => sqlx::query_scalar::<_, i64>(sql)
                .fetch_one(ex.conn())
                .await
                .map_err(postgres::map_sqlx_error),

            #[cfg(any(feature = "sqlite", test))]
            Executor::Sqlite(ex) => sqlx::query_scalar::<_, i64>(sql)
                .fetch_one(ex.conn())
                .await
                .map_err(sqlite::map_sqlx_error),

            #[allow(unused)]
            _ => unreachable!(),
        }
    }

    async fn set_name_qualifier(&mut self, schema: &SchemaName) -> DbResult<()> {
        match &mut self.ex {
            #[cfg(feature = "postgres")]
            Executor::Postgres(ex) => {
                // Schema names are validated identifiers so they are safe to paste.
                let query_str = format!("SET search_path TO {}", schema.as_str());
                sqlx::query(&query_str)
                    .execute(ex.conn())
                    .await
                    .map_err(postgres::map_sqlx_error)?;
                Ok(())
            }

            #[cfg(any(feature = "sqlite", test))]
            Executor::Sqlite(_) => Err(DbError::BackendError(format!(
                "Cannot qualify names with schema {}: SQLite does not support schemas",
                schema
            ))),

            #[allow(unused)]
            _ => unreachable!(),
        }
    }

    async fn reset_name_qualifier(&mut self) -> DbResult<()> {
        match &mut self.ex {
            #[cfg(feature = "postgres")]
            Executor::Postgres(ex) => {
                sqlx::query("RESET search_path")
                    .execute(ex.conn())
                    .await
                    .map_err(postgres::map_sqlx_error)?;
                Ok(())
            }

            // Nothing to undo: SQLite never accepts a qualifier.
            #[cfg(any(feature = "sqlite", test))]
            Executor::Sqlite(_) => Ok(()),

            #[allow(unused)]
            _ => unreachable!(),
        }
    }
}

/// Test utilities for sessions.
#[cfg(any(test, feature = "testutils"))]
pub mod testutils {
    use super::*;
    use std::collections::VecDeque;

    /// A session that records the statements it receives and answers them from a script.
    #[derive(Debug, Default)]
    pub struct MockSession {
        /// Statements received by `query_scalar`, in order.
        queries: Vec<String>,

        /// Schemas received by `set_name_qualifier`, in order.
        qualifiers: Vec<String>,

        /// Number of calls to `reset_name_qualifier`.
        resets: usize,

        /// Results to return from the next calls to `query_scalar`.
        results: VecDeque<DbResult<i64>>,

        /// Result to return from `query_scalar` once `results` is exhausted.
        fallback: Option<i64>,

        /// Error to return from `set_name_qualifier`, if any.
        qualifier_error: Option<DbError>,
    }

    impl MockSession {
        /// Creates a session that returns `value` for every query.
        pub fn returning(value: i64) -> Self {
            Self { fallback: Some(value), ..Default::default() }
        }

        /// Creates a session that returns `results` for the first queries, in order, and fails
        /// any queries after that.
        pub fn scripted<I: IntoIterator<Item = DbResult<i64>>>(results: I) -> Self {
            Self { results: results.into_iter().collect(), ..Default::default() }
        }

        /// Makes `set_name_qualifier` fail with `error`.
        pub fn with_qualifier_error(mut self, error: DbError) -> Self {
            self.qualifier_error = Some(error);
            self
        }

        /// Returns the statements received so far.
        pub fn queries(&self) -> &[String] {
            &self.queries
        }

        /// Returns the schemas received so far.
        pub fn qualifiers(&self) -> &[String] {
            &self.qualifiers
        }

        /// Returns how many times the qualifier was reset.
        pub fn resets(&self) -> usize {
            self.resets
        }
    }

    #[async_trait]
    impl Session for MockSession {
        async fn query_scalar(&mut self, sql: &str) -> DbResult<i64> {
            self.queries.push(sql.to_owned());
            match (self.results.pop_front(), self.fallback) {
                (Some(result), _) => result,
                (None, Some(value)) => Ok(value),
                (None, None) => Err(DbError::BackendError("No more scripted results".to_owned())),
            }
        }

        async fn set_name_qualifier(&mut self, schema: &SchemaName) -> DbResult<()> {
            if let Some(e) = self.qualifier_error.take() {
                return Err(e);
            }
            self.qualifiers.push(schema.as_str().to_owned());
            Ok(())
        }

        async fn reset_name_qualifier(&mut self) -> DbResult<()> {
            self.resets += 1;
            Ok(())
        }
    }
}
