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

//! Dereferences source ids the Builder hasn't seen yet by issuing a request/reply round
//! trip on `hacker-news.get-object` (spec §4.2 steps 3-6, §6). A 10 s timeout without a
//! reply surfaces as `Error::RequestTimeout`, which the caller leaves unacked (spec §4.2
//! "Failure semantics", §7 kind 1).

use std::time::Duration;

use async_trait::async_trait;
use prost::Message as _;

use crate::bus::subjects;
use crate::codec::proto::{FeedPost, FeedUser, GetObjectRequest, ObjectKind};
use crate::error::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait ObjectFetcher: Send + Sync {
	async fn fetch_post(&self, id: i64) -> Result<FeedPost>;
	async fn fetch_user(&self, login: &str) -> Result<FeedUser>;
}

pub struct NatsFetcher {
	client: async_nats::Client,
}

impl NatsFetcher {
	pub fn new(client: async_nats::Client) -> Self {
		NatsFetcher { client }
	}

	async fn request(&self, req: GetObjectRequest) -> Result<Vec<u8>> {
		let payload = req.encode_to_vec();
		let fut = self.client.request(subjects::GET_OBJECT, payload.into());
		match tokio::time::timeout(REQUEST_TIMEOUT, fut).await {
			Ok(Ok(msg)) => Ok(msg.payload.to_vec()),
			Ok(Err(e)) => Err(Error::Nats(e.into())),
			Err(_) => Err(Error::RequestTimeout(subjects::GET_OBJECT.to_string())),
		}
	}
}

#[async_trait]
impl ObjectFetcher for NatsFetcher {
	async fn fetch_post(&self, id: i64) -> Result<FeedPost> {
		let reply = self.request(GetObjectRequest { r#type: ObjectKind::Post as i32, id, username: String::new() }).await?;
		Ok(FeedPost::decode(reply.as_slice())?)
	}

	async fn fetch_user(&self, login: &str) -> Result<FeedUser> {
		let reply =
			self.request(GetObjectRequest { r#type: ObjectKind::User as i32, id: 0, username: login.to_string() }).await?;
		Ok(FeedUser::decode(reply.as_slice())?)
	}
}
