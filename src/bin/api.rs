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

//! Entry point for the Read API (spec §4.6).

use std::sync::Arc;

use hn_archive::api::{self, AppState};
use hn_archive::cache::{ListingView, ObjectView};
use hn_archive::config::ApiConfig;

#[tokio::main]
async fn main() -> hn_archive::error::Result<()> {
	hn_archive::logger::init("api", log::LevelFilter::Info, log::LevelFilter::Debug).expect("failed to init logging");

	let config = ApiConfig::from_env();
	log::info!("binding {}, cache {}", config.bind_addr(), config.memcache_address);

	let objects = Arc::new(ObjectView::connect(&config.memcache_address)?);
	let listings = Arc::new(ListingView::connect(&config.memcache_address)?);
	let shutdown = Arc::new(tokio::sync::Notify::new());

	let state = AppState { objects, listings, shutdown: shutdown.clone() };
	let app = api::router(state);

	let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
	axum::serve(listener, app)
		.with_graceful_shutdown(async move {
			tokio::select! {
				_ = shutdown.notified() => {}
				_ = tokio::signal::ctrl_c() => {}
			}
		})
		.await?;
	Ok(())
}
