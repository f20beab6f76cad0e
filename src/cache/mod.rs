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

//! The memcache-compatible cache views (spec §6 "Cache views"): the object view (key =
//! decimal ObjectID, value = hybrid record per §4.1) and the listing view (key = decimal
//! listing-type, value = Listing wire-form). Namespace selection is a sentinel
//! `GET "@@<viewName>"` issued once at connect time.

use std::sync::Arc;

use crate::codec::{hybrid, proto};
use crate::error::{Error, Result};
use crate::model::{Listing, Object};

/// Runs a blocking `memcache::Client` call on a blocking-pool thread, the way the rest of
/// this crate keeps synchronous I/O (the binlog reader, the MySQL driver) off the executor
/// (spec §9 "no blocking calls on the async runtime").
async fn blocking<F, T>(f: F) -> Result<T>
where
	F: FnOnce() -> std::result::Result<T, memcache::MemcacheError> + Send + 'static,
	T: Send + 'static,
{
	tokio::task::spawn_blocking(f)
		.await
		.map_err(|e| Error::Fatal(format!("cache task panicked: {}", e)))?
		.map_err(Error::Cache)
}

/// A connection into one named view of the cache.
pub struct View {
	client: Arc<memcache::Client>,
}

impl View {
	/// Connects to `address` and selects `view_name` via the connect-time sentinel.
	pub fn connect(address: &str, view_name: &str) -> Result<Self> {
		let url = format!("memcache://{}", address);
		let client = memcache::Client::connect(url.as_str())?;
		// selects the namespace; the reply itself carries no data we need (spec §6).
		let _: Option<String> = client.get(&format!("@@{}", view_name))?;
		Ok(View { client: Arc::new(client) })
	}
}

/// The object view.
pub struct ObjectView(View);

impl ObjectView {
	pub fn connect(address: &str) -> Result<Self> {
		Ok(ObjectView(View::connect(address, "object_data")?))
	}

	pub async fn get(&self, id: i64) -> Result<Option<Object>> {
		let client = self.0.client.clone();
		let raw: Option<Vec<u8>> = blocking(move || client.get(&id.to_string())).await?;
		raw.map(|bytes| hybrid::decode(&bytes)).transpose()
	}

	pub async fn get_multi(&self, ids: &[i64]) -> Result<std::collections::HashMap<i64, Object>> {
		let mut out = std::collections::HashMap::with_capacity(ids.len());
		for id in ids {
			if let Some(obj) = self.get(*id).await? {
				out.insert(*id, obj);
			}
		}
		Ok(out)
	}

	pub async fn set(&self, obj: &Object) -> Result<()> {
		let client = self.0.client.clone();
		let bytes = hybrid::encode(obj);
		let id = obj.id;
		blocking(move || client.set(&id.to_string(), bytes.as_slice(), 0)).await
	}
}

/// The listing view.
pub struct ListingView(View);

impl ListingView {
	pub fn connect(address: &str) -> Result<Self> {
		Ok(ListingView(View::connect(address, "listing_data")?))
	}

	/// A miss is treated as an empty listing, not an error (spec §4.4 step 1, §4.4 final
	/// paragraph).
	pub async fn get(&self, listing_type: i32) -> Result<Listing> {
		let client = self.0.client.clone();
		let raw: Option<Vec<u8>> = blocking(move || client.get(&listing_type.to_string())).await?;
		match raw {
			Some(bytes) => proto::decode_listing(&bytes),
			None => Ok(Listing::default()),
		}
	}

	pub async fn set(&self, listing_type: i32, listing: &Listing) -> Result<()> {
		let client = self.0.client.clone();
		let bytes = proto::encode_listing(listing);
		blocking(move || client.set(&listing_type.to_string(), bytes.as_slice(), 0)).await
	}
}
