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

//! The `Dialect` data type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// SQL variant spoken by the database that holds the sequences.
///
/// Only the statement used to fetch the next value of a sequence differs between dialects.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Oracle-family databases, where sequences are read with `<name>.NEXTVAL`.
    Oracle,

    /// PostgreSQL-family databases, where sequences are read with `nextval('<name>')`.
    Postgres,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Oracle => f.write_str("oracle"),
            Dialect::Postgres => f.write_str("postgres"),
        }
    }
}
