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

//! A mirror-and-rank pipeline for a Hacker-News-shaped feed: a Feed Adapter that shadows
//! the upstream source onto a bus, an Object Builder that resolves references into a
//! durable relational store, a Change Emitter that republishes committed rows, a Ranker
//! that maintains a Hot listing, and a Read API serving both from a cache.

pub mod api;
pub mod builder;
pub mod bus;
pub mod cache;
pub mod codec;
pub mod config;
pub mod emitter;
pub mod error;
pub mod feed;
pub mod ids;
pub mod logger;
pub mod model;
pub mod ranker;
pub mod storage;

use std::io;
use std::path::PathBuf;

/// Get the path to a local directory where this crate's binaries can save logs.
/// Platform | Value | Example
/// -- | -- | --
/// Linux | $XDG_DATA_HOME or $HOME/.local/share/hn_archive | /home/alice/.local/share/hn_archive/
/// macOS | $HOME/Library/Application Support/hn_archive | /Users/Alice/Library/Application Support/hn_archive/
/// Windows | {FOLDERID_LocalAppData}\hn_archive | C:\Users\Alice\AppData\Local\hn_archive
pub fn data_dir() -> io::Result<PathBuf> {
	let base_dirs = dirs::BaseDirs::new().ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "invalid home directory path"))?;
	let mut path = base_dirs.data_local_dir().to_path_buf();
	path.push("hn_archive");
	Ok(path)
}

#[cfg(test)]
pub mod test_util {
	use std::sync::Once;

	static INIT: Once = Once::new();

	/// Initializes logging once per test binary.
	pub fn init_logger() {
		INIT.call_once(|| {
			let _ = pretty_env_logger::try_init();
		});
	}
}
