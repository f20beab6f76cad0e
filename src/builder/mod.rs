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

//! The Object Builder (spec §4.2, §5): durable consumer of `hacker-news.posts`, 10
//! workers sharing one delivery channel, each running a fresh processing context per
//! message.

pub mod context;
pub mod fetch;
pub mod resolve;

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use prost::Message as _;

use crate::bus::{durable, subjects};
use crate::codec::proto::FeedPost;
use crate::error::{Error, Result};

use self::context::ProcessingContext;
use self::resolve::Resolver;

const WORKER_COUNT: usize = 10;
const ACK_WAIT: Duration = Duration::from_secs(30);

/// Runs the Builder until the bus connection is lost. A fatal per-message error (spec §7
/// kind 4) is logged and the process exits; the durable subscription replays the message
/// after restart.
pub async fn run(resolver: Arc<Resolver>, js: async_nats::jetstream::Context) -> Result<()> {
	let consumer =
		durable::pull_consumer(&js, "hacker-news-posts", subjects::POSTS, subjects::BUILDER_DURABLE_NAME, ACK_WAIT, 0)
			.await?;

	let (tx, rx) = flume::bounded::<async_nats::jetstream::Message>(WORKER_COUNT * 4);

	let mut workers = Vec::with_capacity(WORKER_COUNT);
	for _ in 0..WORKER_COUNT {
		let rx = rx.clone();
		let resolver = resolver.clone();
		workers.push(tokio::spawn(async move { worker_loop(resolver, rx).await }));
	}
	drop(rx);

	let mut messages = consumer.messages().await?;
	while let Some(msg) = messages.next().await {
		let msg = msg?;
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

async fn worker_loop(resolver: Arc<Resolver>, rx: flume::Receiver<async_nats::jetstream::Message>) {
	while let Ok(msg) = rx.recv_async().await {
		match handle_one(&resolver, &msg).await {
			Ok(()) => {
				if let Err(e) = msg.ack().await {
					log::error!("failed to ack: {:?}", e);
				}
			}
			Err(Error::Fatal(reason)) => {
				log::error!("fatal error processing message, exiting for replay: {}", reason);
				std::process::exit(1);
			}
			Err(e) => {
				// transient: leave unacked, the bus redelivers after ack-wait (spec §4.2
				// "Acknowledgement", §7 kind 1).
				log::warn!("leaving message unacked after error: {:?}", e);
			}
		}
	}
}

async fn handle_one(resolver: &Resolver, msg: &async_nats::jetstream::Message) -> Result<()> {
	let feed_post =
		FeedPost::decode(msg.payload.as_ref()).map_err(|e| Error::Fatal(format!("unmarshal error: {}", e)))?;
	let mut ctx = ProcessingContext::new();
	resolver.process_post(feed_post, &mut ctx).await?;
	Ok(())
}
