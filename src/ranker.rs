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

//! The Ranker (spec §4.4): durable consumer of `objects.modified`. A single task maintains
//! an in-memory window of delivered ids and their (not-yet-acked) deliveries, flushing on
//! a 5-second timer or when the window reaches `max-in-flight` (4096), whichever comes
//! first.

use std::collections::HashSet;
use std::time::Duration;

use futures::StreamExt;
use prost::Message as _;

use crate::bus::{durable, subjects};
use crate::cache::{ListingView, ObjectView};
use crate::codec::proto::ObjectModified;
use crate::error::Result;
use crate::model::{Listing, LISTING_HOT, MAX_LISTING_SIZE};

const ACK_WAIT: Duration = Duration::from_secs(30);
const MAX_IN_FLIGHT: i64 = 4096;
const WINDOW: Duration = Duration::from_secs(5);

pub async fn run(js: async_nats::jetstream::Context, objects: ObjectView, listings: ListingView) -> Result<()> {
	let consumer = durable::pull_consumer(
		&js,
		"objects-modified",
		subjects::OBJECTS_MODIFIED,
		subjects::RANKER_DURABLE_NAME,
		ACK_WAIT,
		MAX_IN_FLIGHT,
	)
	.await?;

	let mut messages = consumer.messages().await?;
	let mut window: Vec<async_nats::jetstream::Message> = Vec::with_capacity(MAX_IN_FLIGHT as usize);
	let mut ids: HashSet<i64> = HashSet::new();
	let mut timer = tokio::time::interval(WINDOW);
	timer.tick().await; // first tick fires immediately; consume it so the real window starts now

	loop {
		tokio::select! {
			msg = messages.next() => {
				match msg {
					Some(Ok(m)) => {
						if let Ok(evt) = ObjectModified::decode(m.payload.as_ref()) {
							ids.insert(evt.id);
						}
						window.push(m);
						if window.len() as i64 >= MAX_IN_FLIGHT {
							flush(&objects, &listings, &mut window, &mut ids).await;
						}
					}
					Some(Err(e)) => log::error!("ranker stream error: {:?}", e),
					None => break,
				}
			}
			_ = timer.tick() => {
				if !window.is_empty() {
					flush(&objects, &listings, &mut window, &mut ids).await;
				}
			}
		}
	}
	Ok(())
}

/// Flush procedure for the Hot listing (spec §4.4 steps 1-6). On any storage error the
/// window is left intact and un-acked so the bus redelivers after ack-wait; on success
/// every buffered delivery is acked and the window resets.
async fn flush(
	objects: &ObjectView,
	listings: &ListingView,
	window: &mut Vec<async_nats::jetstream::Message>,
	ids: &mut HashSet<i64>,
) {
	match recompute(objects, listings, ids).await {
		Ok(()) => {
			for msg in window.drain(..) {
				if let Err(e) = msg.ack().await {
					log::error!("failed to ack ranked delivery: {:?}", e);
				}
			}
			ids.clear();
		}
		Err(e) => {
			log::error!("ranking flush failed, leaving window unacked: {:?}", e);
		}
	}
}

async fn recompute(objects: &ObjectView, listings: &ListingView, window_ids: &HashSet<i64>) -> Result<()> {
	let existing = listings.get(LISTING_HOT).await?;
	let mut union: HashSet<i64> = existing.objects.iter().copied().collect();
	union.extend(window_ids.iter().copied());

	let mut surviving = Vec::with_capacity(union.len());
	for id in union {
		if let Some(obj) = objects.get(id).await? {
			if obj.kind.listable() {
				surviving.push(obj);
			}
		}
	}

	surviving.sort_by_key(|o| std::cmp::Reverse(o.score + o.source_score));
	surviving.truncate(MAX_LISTING_SIZE);

	let listing = Listing { objects: surviving.into_iter().map(|o| o.id).collect() };
	listings.set(LISTING_HOT, &listing).await
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::{Object, ObjectType, Payload, Post, Source};

	fn link(id: i64, score: i64) -> Object {
		Object::new(id, Source::HackerNews, ObjectType::LinkPost, score, false, 0, Payload::Post(Post::default()), vec![])
	}

	#[test]
	fn sorts_descending_by_combined_score() {
		let mut objs = vec![link(1, 5), link(2, 20), link(3, 1)];
		objs.sort_by_key(|o| std::cmp::Reverse(o.score + o.source_score));
		assert_eq!(objs.iter().map(|o| o.id).collect::<Vec<_>>(), vec![2, 1, 3]);
	}

	#[test]
	fn truncates_to_max_listing_size() {
		let mut ids: Vec<i64> = (0..(MAX_LISTING_SIZE as i64 + 50)).collect();
		ids.truncate(MAX_LISTING_SIZE);
		assert_eq!(ids.len(), MAX_LISTING_SIZE);
	}
}
