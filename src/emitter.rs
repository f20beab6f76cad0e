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

//! The Change Emitter (spec §4.3): tails the `object` table's commit log and republishes
//! each committed row change as `objects.modified`, with the binlog coordinate embedded so
//! a restarted emitter can resume without double-publishing or dropping events.
//!
//! Startup is the tricky part: the bus itself is the source of truth for "where did I
//! leave off", not local disk. We replay `objects.modified` from the earliest retained
//! message, track the newest binlog position we observe, and declare ourselves caught up
//! once that position stops moving for two consecutive one-second ticks.

use std::time::Duration;

use futures::StreamExt;
use mysql_cdc::binlog_client::BinlogClient;
use mysql_cdc::binlog_options::BinlogOptions;
use mysql_cdc::events::event_data::EventData;
use mysql_cdc::replica_options::ReplicaOptions;
use mysql_cdc::ssl_mode::SslMode;
use prost::Message as _;

use crate::bus::{durable, subjects};
use crate::config::DatabaseConfig;
use crate::error::Result;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
	pub file: [u8; 64],
	pub file_len: usize,
	pub pos: u32,
}

impl Position {
	fn from_parts(file: &str, pos: u32) -> Self {
		let mut buf = [0u8; 64];
		let len = file.len().min(64);
		buf[..len].copy_from_slice(&file.as_bytes()[..len]);
		Position { file: buf, file_len: len, pos }
	}

	fn file_str(&self) -> &str {
		std::str::from_utf8(&self.file[..self.file_len]).unwrap_or("")
	}
}

/// Drains `objects.modified` from earliest until the observed position stops advancing
/// for two consecutive one-second ticks (spec §4.3 "Startup cursor recovery"). Returns the
/// last position seen, or `None` if the stream was empty (fresh deployment).
pub async fn recover_cursor(js: &async_nats::jetstream::Context) -> Result<Option<Position>> {
	let consumer = durable::pull_consumer(
		js,
		"objects-modified",
		subjects::OBJECTS_MODIFIED,
		"mysql2nats-recovery",
		Duration::from_secs(30),
		0,
	)
	.await?;

	let mut last: Option<Position> = None;
	let mut ticker = tokio::time::interval(Duration::from_secs(1));
	let mut idle_ticks = 0u32;
	let mut messages = consumer.messages().await?;

	loop {
		tokio::select! {
			msg = messages.next() => {
				match msg {
					Some(Ok(m)) => {
						if let Ok(evt) = crate::codec::proto::ObjectModified::decode(m.payload.as_ref()) {
							if !evt.mysql_file.is_empty() {
								let pos = Position::from_parts(&evt.mysql_file, evt.mysql_pos);
								last = Some(pos);
								idle_ticks = 0;
							}
						}
						let _ = m.ack().await;
					}
					Some(Err(e)) => {
						log::warn!("recovery stream error: {:?}", e);
						break;
					}
					None => break,
				}
			}
			_ = ticker.tick() => {
				idle_ticks += 1;
				if idle_ticks >= 2 {
					log::info!("cursor recovery quiesced at {:?}", last.map(|p| (p.file_str().to_string(), p.pos)));
					break;
				}
			}
		}
	}

	Ok(last)
}

/// One batch of primary keys affected by a single binlog row-change event.
struct RowChange {
	ids: Vec<i64>,
	file: String,
	pos: u32,
}

/// Tails the `object` table's row-change log from `resume_from` (or the current binlog
/// position if `None`) and republishes each affected primary key on `objects.modified`
/// (spec §4.3).
///
/// `mysql_cdc`'s `BinlogClient::replicate` is a synchronous blocking iterator, so the
/// replay loop runs on a blocking thread and hands each row change to this async task over
/// a channel; that keeps the executor free to poll the caller's own cancellation (e.g. the
/// `ctrl_c()` race in the `emitter` binary) between events instead of only between `.await`
/// points buried inside the blocking loop.
pub async fn tail(
	db_config: &DatabaseConfig,
	bus: async_nats::Client,
	resume_from: Option<Position>,
) -> Result<()> {
	let binlog_options = match resume_from {
		Some(pos) => BinlogOptions::from_position(pos.file_str().to_string(), pos.pos),
		None => BinlogOptions::from_end(),
	};

	let options = ReplicaOptions {
		hostname: host_only(&db_config.address),
		port: port_of(&db_config.address),
		username: db_config.user.clone(),
		password: db_config.password.clone(),
		binlog: binlog_options,
		ssl_mode: SslMode::Disabled,
		..Default::default()
	};

	let (tx, rx) = flume::bounded::<std::result::Result<RowChange, String>>(256);
	let replication = tokio::task::spawn_blocking(move || {
		let mut client = BinlogClient::new(options);
		for result in client.replicate() {
			let outcome = match result {
				Ok((header, data)) => {
					let (file, pos) = (header.file_name().to_string(), header.next_event_position);
					let ids = match data {
						EventData::WriteRows(ev) | EventData::UpdateRows(ev) | EventData::DeleteRows(ev) if ev.table_name() == "object" => {
							primary_keys(&ev)
						}
						_ => Vec::new(),
					};
					Ok(RowChange { ids, file, pos })
				}
				Err(e) => Err(format!("binlog error: {}", e)),
			};
			let failed = outcome.is_err();
			if tx.send(outcome).is_err() || failed {
				break;
			}
		}
	});

	while let Ok(outcome) = rx.recv_async().await {
		let change = outcome.map_err(crate::error::Error::Fatal)?;
		for id in change.ids {
			publish_modified(&bus, id, &change.file, change.pos).await?;
		}
	}

	replication.await.map_err(|e| crate::error::Error::Fatal(format!("binlog replication task panicked: {}", e)))?;
	Ok(())
}

/// Extracts the `id` column (first column, the primary key) from each affected row.
fn primary_keys(ev: &mysql_cdc::events::rows_event::RowsEvent) -> Vec<i64> {
	ev.rows.iter().filter_map(|row| row.cells.first().and_then(|c| c.as_i64())).collect()
}

async fn publish_modified(bus: &async_nats::Client, id: i64, file: &str, pos: u32) -> Result<()> {
	let msg = crate::codec::proto::ObjectModified { id, mysql_file: file.to_string(), mysql_pos: pos };
	bus.publish(subjects::OBJECTS_MODIFIED, msg.encode_to_vec().into()).await?;
	Ok(())
}

fn host_only(address: &str) -> String {
	address.split(':').next().unwrap_or(address).to_string()
}

fn port_of(address: &str) -> u16 {
	address.split(':').nth(1).and_then(|p| p.parse().ok()).unwrap_or(3306)
}
