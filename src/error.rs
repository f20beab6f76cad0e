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

use std::{env, io};
use thiserror::Error;

use crate::model::SourceId;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
	#[error(transparent)]
	Io(#[from] io::Error),
	#[error(transparent)]
	Env(#[from] env::VarError),

	#[error(transparent)]
	Serialization(#[from] serde_json::Error),
	#[error("protobuf decode error: {0}")]
	ProtoDecode(#[from] prost::DecodeError),
	#[error("protobuf encode error: {0}")]
	ProtoEncode(#[from] prost::EncodeError),
	#[error("malformed cache-view record: {0}")]
	Codec(String),

	#[error("sqlx error: {0}")]
	Sql(#[from] sqlx::Error),
	#[error("migration error: {0}")]
	Migration(#[from] sqlx::migrate::MigrateError),
	#[error("memcache error: {0}")]
	Cache(#[from] memcache::MemcacheError),

	#[error(transparent)]
	Http(#[from] reqwest::Error),
	#[error(transparent)]
	Nats(#[from] async_nats::Error),

	/// A write hit a relational unique-key violation on `(source, source_id)`. The caller
	/// should read the existing row and merge rather than treat this as a failure.
	#[error("duplicate key for source id {0:?}")]
	DuplicateKey(SourceId),

	/// An optimistic-concurrency `UPDATE ... WHERE id = ? AND version = ?` touched zero rows.
	#[error("version conflict updating object {0}")]
	VersionConflict(i64),

	/// A request/reply round trip exceeded its deadline.
	#[error("request timed out waiting for reply on {0}")]
	RequestTimeout(String),

	/// Sending on a channel whose receiver has gone away.
	#[error("sending on a disconnected channel")]
	Channel,

	/// Malformed input, an object type the system does not recognize, or anything else
	/// spec'd as unrecoverable for the current message. The caller logs and exits; the
	/// durable subscription replays the message after restart.
	#[error("fatal: {0}")]
	Fatal(String),

	#[error("shutting down: {0}")]
	Shutdown(String),
}

impl<T> From<flume::SendError<T>> for Error {
	fn from(_: flume::SendError<T>) -> Self {
		Self::Channel
	}
}
