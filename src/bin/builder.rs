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

//! Entry point for the Object Builder (spec §4.2).

use std::sync::Arc;

use hn_archive::builder::fetch::NatsFetcher;
use hn_archive::builder::resolve::Resolver;
use hn_archive::config::{DatabaseConfig, NatsConfig};
use hn_archive::ids::Snowflake;
use hn_archive::storage::Database;

#[tokio::main]
async fn main() -> hn_archive::error::Result<()> {
	fdlimit::raise_fd_limit();
	hn_archive::logger::init("builder", log::LevelFilter::Info, log::LevelFilter::Debug).expect("failed to init logging");

	let nats_config = NatsConfig::from_env("hn-archive-builder")?;
	let db_config = DatabaseConfig::from_env()?;
	log::info!("connecting to {} and {}", nats_config, db_config);

	hn_archive::storage::migrate(db_config.url()).await?;
	let db: Arc<dyn hn_archive::storage::ObjectStore> = Arc::new(Database::new(&db_config.url()).await?);

	let client = async_nats::connect(&nats_config.url).await?;
	let js = async_nats::jetstream::new(client.clone());

	let fetcher = Arc::new(NatsFetcher::new(client.clone()));
	let ids = Arc::new(Snowflake::new(node_id(), EPOCH_MS));
	let bus: Arc<dyn hn_archive::bus::Publisher> = Arc::new(client);
	let resolver = Arc::new(Resolver { db, ids, fetcher, bus });

	tokio::select! {
		res = hn_archive::builder::run(resolver, js) => res,
		_ = tokio::signal::ctrl_c() => {
			log::info!("shutting down on ctrl-c");
			Ok(())
		}
	}
}

/// 2021-01-01T00:00:00Z, the workspace's snowflake epoch.
const EPOCH_MS: i64 = 1_609_459_200_000;

fn node_id() -> i64 {
	std::env::var("HN_ARCHIVE_NODE_ID").ok().and_then(|s| s.parse().ok()).unwrap_or(1)
}
