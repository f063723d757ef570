// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! File-level metadata tables for Apache Iceberg.
//!
//! Exposes the data and delete files of a table, with their per-column
//! statistics, as Arrow record batches: the `files`, `data_files`,
//! `delete_files` tables and their `all_*` counterparts that span every
//! retained snapshot.
//!
//! ```rust,ignore
//! use futures::TryStreamExt;
//! use iceberg_files::table::Table;
//!
//! let table = Table::builder()
//!     .loader(loader)
//!     .metadata(metadata)
//!     .build()?;
//!
//! let batches: Vec<_> = table.inspect().files().scan().await?.try_collect().await?;
//! ```

#[macro_use]
mod error;
pub use error::{Error, ErrorKind, Result};

pub mod aggregation;
pub mod arrow;
pub mod inspect;
pub mod io;
pub mod scan;
pub mod spec;
pub mod table;
