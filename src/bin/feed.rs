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

//! Entry point for the Feed Adapter (spec §4.5): runs the updates watcher and the
//! `get-object` request/reply worker pool side by side.

use hn_archive::config::{FeedConfig, NatsConfig};
use hn_archive::feed::client::FeedClient;
use hn_archive::feed::{watcher, worker};

#[tokio::main]
async fn main() -> hn_archive::error::Result<()> {
	hn_archive::logger::init("feed", log::LevelFilter::Info, log::LevelFilter::Debug).expect("failed to init logging");

	let nats_config = NatsConfig::from_env("hn-archive-feed")?;
	let feed_config = FeedConfig::from_env();
	log::info!("connecting to {}, request concurrency {}", nats_config, feed_config.request_concurrency);

	let bus = async_nats::connect(&nats_config.url).await?;

	let watcher_bus = bus.clone();
	let watcher_client = FeedClient::new();
	let watcher = tokio::spawn(async move { watcher::run(watcher_client, watcher_bus).await });

	let worker_count = feed_config.request_concurrency;
	let worker = tokio::spawn(async move { worker::run(worker_count, bus).await });

	tokio::select! {
		res = watcher => res.map_err(|e| hn_archive::error::Error::Fatal(e.to_string()))?,
		res = worker => res.map_err(|e| hn_archive::error::Error::Fatal(e.to_string()))?,
		_ = tokio::signal::ctrl_c() => {
			log::info!("shutting down on ctrl-c");
			Ok(())
		}
	}
}
