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

//! Entry point for the Ranker (spec §4.4).

use hn_archive::cache::{ListingView, ObjectView};
use hn_archive::config::{ApiConfig, NatsConfig};

#[tokio::main]
async fn main() -> hn_archive::error::Result<()> {
	hn_archive::logger::init("ranker", log::LevelFilter::Info, log::LevelFilter::Debug).expect("failed to init logging");

	let nats_config = NatsConfig::from_env("hn-archive-ranker")?;
	let api_config = ApiConfig::from_env();
	log::info!("connecting to {} and cache {}", nats_config, api_config.memcache_address);

	let client = async_nats::connect(&nats_config.url).await?;
	let js = async_nats::jetstream::new(client);

	let objects = ObjectView::connect(&api_config.memcache_address)?;
	let listings = ListingView::connect(&api_config.memcache_address)?;

	tokio::select! {
		res = hn_archive::ranker::run(js, objects, listings) => res,
		_ = tokio::signal::ctrl_c() => {
			log::info!("shutting down on ctrl-c");
			Ok(())
		}
	}
}
