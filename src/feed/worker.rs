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

//! Serves `hacker-news.get-object` request/reply with a worker pool of size
//! `HN_REQUEST_CONCURRENCY` (spec §4.5). Each worker owns one external HTTP client,
//! receives a request, issues one HTTP GET, and publishes the reply on the caller's
//! reply subject, or `subjects::GET_OBJECT_DEFAULT_REPLY` if the request carried none
//! (spec §4.5). A fetch failure means "do not reply" (spec §9): the caller's own
//! request/reply timeout drives any retry.

use futures::StreamExt;
use prost::Message as _;

use crate::bus::subjects;
use crate::codec::proto::{GetObjectRequest, ObjectKind};
use crate::error::Result;
use crate::feed::client::FeedClient;

pub async fn run(worker_count: usize, bus: async_nats::Client) -> Result<()> {
	let mut sub = bus.subscribe(subjects::GET_OBJECT).await?;
	let (tx, rx) = flume::bounded::<async_nats::Message>(worker_count * 4);

	let mut workers = Vec::with_capacity(worker_count);
	for _ in 0..worker_count {
		let rx = rx.clone();
		let bus = bus.clone();
		workers.push(tokio::spawn(async move {
			let client = FeedClient::new();
			while let Ok(msg) = rx.recv_async().await {
				if let Err(e) = handle_one(&client, &bus, msg).await {
					log::warn!("get-object request failed, not replying: {:?}", e);
				}
			}
		}));
	}
	drop(rx);

	while let Some(msg) = sub.next().await {
		if tx.send_async(msg).await.is_err() {
			break;
		}
	}
	drop(tx);
	for w in workers {
		let _ = w.await;
	}
	Ok(())
}

async fn handle_one(client: &FeedClient, bus: &async_nats::Client, msg: async_nats::Message) -> Result<()> {
	let reply_to = msg.reply.unwrap_or_else(|| subjects::GET_OBJECT_DEFAULT_REPLY.into());
	let req = GetObjectRequest::decode(msg.payload.as_ref())?;

	let payload = if req.r#type == ObjectKind::User as i32 {
		client.fetch_user(&req.username).await?.map(|u| u.encode_to_vec())
	} else {
		client.fetch_item(req.id).await?.map(|p| p.encode_to_vec())
	};

	if let Some(bytes) = payload {
		bus.publish(reply_to, bytes.into()).await?;
	}
	Ok(())
}
