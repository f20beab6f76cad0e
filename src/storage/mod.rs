// Copyright 2017-2021 Parity Technologies (UK) Ltd.
// This file is part of hn-archive.

// hn-archive is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// hn-archive is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with hn-archive.  If not, see <http://www.gnu.org/licenses/>.

//! The relational store: the `object` and `source_id_to_object_id` tables (spec §3).
//! Mirrors the original's `db/dbi.go` prepared statements as `sqlx::query` calls bound at
//! the call site as raw `sqlx::query` calls rather than a query builder.

pub mod queries;

use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnection, MySqlPool, MySqlPoolOptions};
use sqlx::Connection;

use crate::error::Result;
use crate::model::{Object, SourceId};

pub use self::queries::*;

/// The storage operations the Object Builder needs (spec §4.2). Split out as a trait so
/// `Resolver` can be exercised against an in-memory fake instead of a live MySQL connection.
#[async_trait]
pub trait ObjectStore: Send + Sync {
	async fn get_object_id_from_source_id(&self, id: &SourceId) -> Result<Option<i64>>;
	async fn insert_source_id_to_object_id(&self, id: &SourceId, object_id: i64) -> Result<()>;
	async fn insert_object(&self, obj: &Object, source_id: SourceId) -> Result<()>;
	async fn get_object(&self, id: i64) -> Result<Option<Object>>;
	async fn update_source_object(&self, obj: &Object, expected_version: i64) -> Result<()>;
}

#[async_trait]
impl ObjectStore for Database {
	async fn get_object_id_from_source_id(&self, id: &SourceId) -> Result<Option<i64>> {
		Database::get_object_id_from_source_id(self, id).await
	}

	async fn insert_source_id_to_object_id(&self, id: &SourceId, object_id: i64) -> Result<()> {
		Database::insert_source_id_to_object_id(self, id, object_id).await
	}

	async fn insert_object(&self, obj: &Object, source_id: SourceId) -> Result<()> {
		Database::insert_object(self, obj, source_id).await
	}

	async fn get_object(&self, id: i64) -> Result<Option<Object>> {
		Database::get_object(self, id).await
	}

	async fn update_source_object(&self, obj: &Object, expected_version: i64) -> Result<()> {
		Database::update_source_object(self, obj, expected_version).await
	}
}

/// Runs all migrations against `url`.
pub async fn migrate<T: AsRef<str>>(url: T) -> Result<()> {
	let mut conn = MySqlConnection::connect(url.as_ref()).await?;
	sqlx::migrate!("./src/storage/migrations/").run(&mut conn).await?;
	Ok(())
}

#[derive(Clone)]
pub struct Database {
	pool: MySqlPool,
}

impl Database {
	pub async fn new(url: &str) -> Result<Self> {
		let pool = MySqlPoolOptions::new()
			.min_connections(4)
			.max_connections(28)
			.idle_timeout(Duration::from_secs(3600))
			.connect(url)
			.await?;
		Ok(Self { pool })
	}

	pub fn with_pool(pool: MySqlPool) -> Self {
		Self { pool }
	}

	pub fn pool(&self) -> &MySqlPool {
		&self.pool
	}
}
