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

//! Durable JetStream consumer setup: durable name, manual ack, ack-wait, start-at-first,
//! max-in-flight (spec §6 "All payloads..." / §4.2 / §4.4). This plays the role the
//! teacher's `database::listener::Builder` plays for Postgres LISTEN/NOTIFY: connect and
//! subscribe up front so nothing is missed before the caller starts consuming.

use std::time::Duration;

use async_nats::jetstream::{self, consumer::pull::Config as PullConfig, consumer::AckPolicy, consumer::DeliverPolicy};

use crate::error::Result;

/// Ensures a stream covering `subject` exists and returns a durable pull consumer bound
/// to it, configured per spec §6/§4.2/§4.4.
pub async fn pull_consumer(
	js: &jetstream::Context,
	stream_name: &str,
	subject: &str,
	durable_name: &str,
	ack_wait: Duration,
	max_in_flight: i64,
) -> Result<jetstream::consumer::PullConsumer> {
	let stream = js
		.get_or_create_stream(jetstream::stream::Config {
			name: stream_name.to_string(),
			subjects: vec![subject.to_string()],
			..Default::default()
		})
		.await?;

	let consumer = stream
		.get_or_create_consumer(
			durable_name,
			PullConfig {
				durable_name: Some(durable_name.to_string()),
				ack_policy: AckPolicy::Explicit,
				ack_wait,
				deliver_policy: DeliverPolicy::All,
				max_ack_pending: max_in_flight,
				..Default::default()
			},
		)
		.await?;
	Ok(consumer)
}
