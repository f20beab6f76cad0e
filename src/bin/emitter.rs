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

//! Entry point for the Change Emitter (spec §4.3).

use hn_archive::config::{DatabaseConfig, NatsConfig};

#[tokio::main]
async fn main() -> hn_archive::error::Result<()> {
	hn_archive::logger::init("emitter", log::LevelFilter::Info, log::LevelFilter::Debug).expect("failed to init logging");

	let nats_config = NatsConfig::from_env("hn-archive-emitter")?;
	let db_config = DatabaseConfig::from_env()?;
	log::info!("connecting to {} and {}", nats_config, db_config);

	let client = async_nats::connect(&nats_config.url).await?;
	let js = async_nats::jetstream::new(client.clone());

	log::info!("recovering cursor from objects.modified");
	let resume_from = hn_archive::emitter::recover_cursor(&js).await?;
	match &resume_from {
		Some(_) => log::info!("resuming binlog tail from a recovered position"),
		None => log::info!("no prior position found, tailing from the current binlog position"),
	}

	tokio::select! {
		res = hn_archive::emitter::tail(&db_config, client, resume_from) => res,
		_ = tokio::signal::ctrl_c() => {
			log::info!("shutting down on ctrl-c");
			Ok(())
		}
	}
}
