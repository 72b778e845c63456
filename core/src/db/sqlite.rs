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

//! Common utilities to interact with an SQLite database.

use crate::db::{Db, DbError, DbResult, Executor};
use async_trait::async_trait;
use futures::TryStreamExt;
use log::warn;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{Sqlite, SqliteConnection, SqlitePool};

/// Takes a raw SQLx error `e` and converts it to our generic error type.
pub fn map_sqlx_error(e: sqlx::Error) -> DbError {
    match e {
        sqlx::Error::ColumnDecode { source, .. } => DbError::DataIntegrityError(source.to_string()),
        sqlx::Error::RowNotFound => DbError::NotFound,
        e if e.to_string().contains("FOREIGN KEY constraint failed") => DbError::NotFound,
        e if e.to_string().contains("UNIQUE constraint failed") => DbError::AlreadyExists,
        e => DbError::BackendError(e.to_string()),
    }
}

/// Creates a new connection pool against the database identified by `conn_str`.
pub async fn connect(conn_str: &str) -> DbResult<SqliteDb> {
    let pool = SqlitePool::connect(conn_str).await.map_err(map_sqlx_error)?;
    Ok(SqliteDb { pool })
}

/// A database executor for SQLite backed by a pooled connection in autocommit mode.
#[derive(Debug)]
pub struct SqliteExecutor(PoolConnection<Sqlite>);

impl SqliteExecutor {
    /// Returns the raw connection to issue `sqlx` operations against.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.0
    }
}

/// A database instance backed by an SQLite database, usually in memory.
pub struct SqliteDb {
    /// Shared SQLite connection pool.  This is a cloneable type that all concurrent
    /// sessions can use concurrently.
    pool: SqlitePool,
}

impl SqliteDb {
    /// Returns an executor of the specific type used by this database.
    pub async fn typed_ex(&self) -> DbResult<SqliteExecutor> {
        let conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        Ok(SqliteExecutor(conn))
    }
}

impl Drop for SqliteDb {
    fn drop(&mut self) {
        if !self.pool.is_closed() {
            warn!("Dropping connection without having called close() first");
        }
    }
}

#[async_trait]
impl Db for SqliteDb {
    async fn ex(&self) -> DbResult<Executor> {
        let ex = self.typed_ex().await?;
        Ok(Executor::Sqlite(ex))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Helper function to initialize the database with a schema.
pub async fn run_schema(e: &mut SqliteExecutor, schema: &str) -> DbResult<()> {
    let mut results = sqlx::raw_sql(schema).execute_many(e.conn());
    while results.try_next().await.map_err(map_sqlx_error)?.is_some() {
        // Nothing to do.
    }
    Ok(())
}

/// Test utilities for the SQLite connection.
#[cfg(any(feature = "testutils", test))]
pub mod testutils {
    use super::*;

    /// Initializes the test database.
    pub async fn setup() -> SqliteDb {
        let _can_fail = env_logger::builder().is_test(true).try_init();
        connect(":memory:").await.unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::testutils::*;
    use super::*;
    use crate::db::tests::{generate_db_ro_concurrent_tests, generate_db_rw_tests};

    generate_db_ro_concurrent_tests!(Box::from(setup().await));

    generate_db_rw_tests!(Box::from(setup().await));

    #[tokio::test]
    async fn test_run_schema_multiple_statements() {
        let db = setup().await;
        {
            let mut ex = db.typed_ex().await.unwrap();
            run_schema(
                &mut ex,
                "CREATE TABLE counters (value INTEGER);
                INSERT INTO counters (value) VALUES (5);
                INSERT INTO counters (value) VALUES (7);",
            )
            .await
            .unwrap();
            let sum: i64 = sqlx::query_scalar("SELECT SUM(value) FROM counters")
                .fetch_one(ex.conn())
                .await
                .unwrap();
            assert_eq!(12, sum);
        }
        db.close().await;
    }

    #[tokio::test]
    async fn test_map_sqlx_error_row_not_found() {
        let db = setup().await;
        {
            let mut ex = db.typed_ex().await.unwrap();
            run_schema(&mut ex, "CREATE TABLE empty (value INTEGER)").await.unwrap();
            let err = sqlx::query_scalar::<_, i64>("SELECT value FROM empty")
                .fetch_one(ex.conn())
                .await
                .unwrap_err();
            assert_eq!(DbError::NotFound, map_sqlx_error(err));
        }
        db.close().await;
    }

    #[tokio::test]
    async fn test_map_sqlx_error_unique_violation() {
        let db = setup().await;
        {
            let mut ex = db.typed_ex().await.unwrap();
            run_schema(&mut ex, "CREATE TABLE names (name TEXT PRIMARY KEY)").await.unwrap();
            run_schema(&mut ex, "INSERT INTO names (name) VALUES ('a')").await.unwrap();
            let err =
                run_schema(&mut ex, "INSERT INTO names (name) VALUES ('a')").await.unwrap_err();
            assert_eq!(DbError::AlreadyExists, err);
        }
        db.close().await;
    }
}
