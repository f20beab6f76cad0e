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

pub mod durable;
pub mod subjects;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// The one bus operation the Object Builder needs (spec §4.2 step 9, §4.3): publish a
/// notification and move on. Split out as a trait so `Resolver` can be exercised against an
/// in-memory fake instead of a live NATS connection.
#[async_trait]
pub trait Publisher: Send + Sync {
	async fn publish(&self, subject: String, payload: Bytes) -> Result<()>;
}

#[async_trait]
impl Publisher for async_nats::Client {
	async fn publish(&self, subject: String, payload: Bytes) -> Result<()> {
		async_nats::Client::publish(self, subject, payload).await?;
		Ok(())
	}
}
