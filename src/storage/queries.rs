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

//! Prepared-statement-shaped queries against the `object` and `source_id_to_object_id`
//! tables, grounded on the original's `db/dbi.go`.

use sqlx::Row;

use crate::codec::proto;
use crate::error::{Error, Result};
use crate::model::{Compression, Encoding, Object, ObjectType, Source, SourceId};
use crate::storage::Database;

/// MySQL's "duplicate entry" error code (spec §7 kind 2).
const ER_DUP_ENTRY: u16 = 1062;

fn is_duplicate_key(err: &sqlx::Error) -> bool {
	matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("1062"))
}

/// Classifies a raw sqlx error the way the original type-asserts on `*mysql.MySQLError`
/// (spec §4.2 step 9, §7 kind 2): duplicate-key becomes a typed, expected condition;
/// anything else is passed through as fatal.
fn classify(err: sqlx::Error, on_duplicate: SourceId) -> Error {
	if is_duplicate_key(&err) {
		Error::DuplicateKey(on_duplicate)
	} else {
		Error::Sql(err)
	}
}

impl Database {
	/// Looks up `(source, key) -> object_id`. `None` on a clean miss.
	pub async fn get_object_id_from_source_id(&self, id: &SourceId) -> Result<Option<i64>> {
		let row = sqlx::query("SELECT object_id FROM source_id_to_object_id WHERE source = ? AND source_id = ?")
			.bind(id.source as i32)
			.bind(&id.key)
			.fetch_optional(self.pool())
			.await?;
		Ok(row.map(|r| r.get::<i64, _>("object_id")))
	}

	/// Inserts a new `(source, key) -> object_id` mapping. Duplicate-key means a concurrent
	/// worker already won this identity; the caller re-reads and uses theirs (spec §4.2
	/// step 2, §3 Invariants).
	pub async fn insert_source_id_to_object_id(&self, id: &SourceId, object_id: i64) -> Result<()> {
		sqlx::query("INSERT INTO source_id_to_object_id (source, source_id, object_id) VALUES (?, ?, ?)")
			.bind(id.source as i32)
			.bind(&id.key)
			.bind(object_id)
			.execute(self.pool())
			.await
			.map_err(|e| classify(e, id.clone()))?;
		Ok(())
	}

	/// Inserts a freshly built object at version 1. On duplicate-key the caller is
	/// expected to `get_object` + merge + `update_source_object` (spec §4.2 step 9).
	pub async fn insert_object(&self, obj: &Object, source_id: SourceId) -> Result<()> {
		let payload = proto::encode_payload(&obj.payload);
		let kids = proto::encode_kids(&obj.kids);
		sqlx::query(
			r#"INSERT INTO object
				(id, source, type, score, source_score, deleted, unixtime, compression, encoding, data, kids, num_kids, version)
				VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1)"#,
		)
		.bind(obj.id)
		.bind(obj.source as i32)
		.bind(obj.kind as i32)
		.bind(obj.score)
		.bind(obj.source_score)
		.bind(obj.deleted)
		.bind(obj.unixtime)
		.bind(obj.compression as i32)
		.bind(obj.encoding as i32)
		.bind(payload)
		.bind(kids)
		.bind(obj.num_kids)
		.execute(self.pool())
		.await
		.map_err(|e| classify(e, source_id))?;
		Ok(())
	}

	/// `SELECT ... FROM object WHERE id = ?`, returning the stored object and its version.
	pub async fn get_object(&self, id: i64) -> Result<Option<Object>> {
		let row = sqlx::query("SELECT * FROM object WHERE id = ?").bind(id).fetch_optional(self.pool()).await?;
		let row = match row {
			Some(r) => r,
			None => return Ok(None),
		};
		decode_row(row).map(Some)
	}

	/// Optimistic-concurrency update (spec §3 Invariants, §9 "Optimistic concurrency"):
	/// `WHERE id = ? AND version = ?`, bumping `version` by one. Zero rows affected means a
	/// conflict; the caller must reread and retry.
	pub async fn update_source_object(&self, obj: &Object, expected_version: i64) -> Result<()> {
		let payload = proto::encode_payload(&obj.payload);
		let kids = proto::encode_kids(&obj.kids);
		let result = sqlx::query(
			r#"UPDATE object SET source_score = ?, deleted = ?, compression = ?, encoding = ?, data = ?, kids = ?, num_kids = ?, version = version + 1
				WHERE id = ? AND version = ?"#,
		)
		.bind(obj.source_score)
		.bind(obj.deleted)
		.bind(obj.compression as i32)
		.bind(obj.encoding as i32)
		.bind(payload)
		.bind(kids)
		.bind(obj.num_kids)
		.bind(obj.id)
		.bind(expected_version)
		.execute(self.pool())
		.await?;
		if result.rows_affected() == 0 {
			return Err(Error::VersionConflict(obj.id));
		}
		Ok(())
	}
}

fn decode_row(row: sqlx::mysql::MySqlRow) -> Result<Object> {
	use sqlx::Row as _;
	let kind = ObjectType::from_i32(row.get::<i32, _>("type"))?;
	let data: Vec<u8> = row.get("data");
	let payload = match kind {
		ObjectType::User => proto::decode_user_payload(&data)?,
		_ => proto::decode_post_payload(&data)?,
	};
	let kids_raw: Vec<u8> = row.get("kids");
	let kids = proto::decode_kids(&kids_raw)?;
	Ok(Object {
		id: row.get("id"),
		source: Source::from_i32(row.get::<i32, _>("source"))?,
		kind,
		score: row.get("score"),
		source_score: row.get("source_score"),
		deleted: row.get("deleted"),
		unixtime: row.get("unixtime"),
		compression: Compression::None,
		encoding: Encoding::Protobuf,
		payload,
		kids,
		num_kids: row.get("num_kids"),
		version: row.get("version"),
	})
}
