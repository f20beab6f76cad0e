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

//! The Read API (spec §4.6, §6): a stateless HTTP front reading objects and listings from
//! the cache, hydrating author references.

pub mod json;

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::cache::{ListingView, ObjectView};
use crate::model::{Object, LISTING_HOT};

use self::json::{ApiObject, Author};

#[derive(Clone)]
pub struct AppState {
	pub objects: Arc<ObjectView>,
	pub listings: Arc<ListingView>,
	pub shutdown: Arc<tokio::sync::Notify>,
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/object/:id", get(get_object))
		.route("/object/bulk", post(get_object_bulk))
		.route("/hot", get(get_hot))
		.route("/exit", get(exit))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

#[derive(Deserialize, Default)]
struct PrettyQuery {
	#[serde(default)]
	#[allow(dead_code)]
	pretty: Option<String>,
}

/// `GET /object/:id?pretty=` (spec §6).
async fn get_object(State(state): State<AppState>, Path(id): Path<String>, Query(_q): Query<PrettyQuery>) -> impl IntoResponse {
	let id: i64 = match id.parse() {
		Ok(v) => v,
		Err(_) => return (StatusCode::BAD_REQUEST, "id must be a decimal integer").into_response(),
	};

	let obj = match state.objects.get(id).await {
		Ok(Some(o)) => o,
		Ok(None) => return StatusCode::NOT_FOUND.into_response(),
		Err(e) => {
			log::error!("object fetch failed: {:?}", e);
			return StatusCode::INTERNAL_SERVER_ERROR.into_response();
		}
	};

	let author = hydrate_one(&state.objects, &obj).await;
	Json(ApiObject::from_object(&obj, author)).into_response()
}

#[derive(Deserialize)]
struct BulkRequest {
	ids: Vec<String>,
}

/// `POST /object/bulk` (spec §6).
async fn get_object_bulk(State(state): State<AppState>, Json(body): Json<BulkRequest>) -> impl IntoResponse {
	if body.ids.is_empty() {
		return (StatusCode::BAD_REQUEST, "ids must not be empty").into_response();
	}
	let mut parsed = Vec::with_capacity(body.ids.len());
	for raw in &body.ids {
		match raw.parse::<i64>() {
			Ok(v) => parsed.push(v),
			Err(_) => return (StatusCode::BAD_REQUEST, format!("invalid id {:?}", raw)).into_response(),
		}
	}

	let found = match state.objects.get_multi(&parsed).await {
		Ok(m) => m,
		Err(e) => {
			log::error!("bulk fetch failed: {:?}", e);
			return StatusCode::INTERNAL_SERVER_ERROR.into_response();
		}
	};

	let authors = hydrate_many(&state.objects, found.values()).await;
	let out: Vec<ApiObject> = parsed
		.iter()
		.filter_map(|id| found.get(id))
		.map(|obj| {
			let author = ApiObject::author_id(obj).and_then(|a| authors.get(&a)).map(|u| Author { id: u.0.clone(), name: u.1.clone() });
			ApiObject::from_object(obj, author)
		})
		.collect();
	Json(out).into_response()
}

#[derive(Deserialize)]
struct HotQuery {
	#[serde(default)]
	start: usize,
	#[serde(default = "default_count")]
	count: usize,
}

fn default_count() -> usize {
	30
}

/// `GET /hot?start=&count=` (spec §4.6, §6; scenario 8).
async fn get_hot(State(state): State<AppState>, Query(q): Query<HotQuery>) -> impl IntoResponse {
	if q.count > 100 {
		return (StatusCode::BAD_REQUEST, "count must be <= 100").into_response();
	}

	let listing = match state.listings.get(LISTING_HOT).await {
		Ok(l) => l,
		Err(e) => {
			log::error!("listing fetch failed: {:?}", e);
			return StatusCode::INTERNAL_SERVER_ERROR.into_response();
		}
	};

	let (start, end) = slice_bounds(listing.objects.len(), q.start, q.count);
	let slice = &listing.objects[start..end];

	let found = match state.objects.get_multi(slice).await {
		Ok(m) => m,
		Err(e) => {
			log::error!("hot listing object fetch failed: {:?}", e);
			return StatusCode::INTERNAL_SERVER_ERROR.into_response();
		}
	};
	let authors = hydrate_many(&state.objects, found.values()).await;

	let out: Vec<ApiObject> = slice
		.iter()
		.filter_map(|id| found.get(id))
		.map(|obj| {
			let author = ApiObject::author_id(obj).and_then(|a| authors.get(&a)).map(|u| Author { id: u.0.clone(), name: u.1.clone() });
			ApiObject::from_object(obj, author)
		})
		.collect();
	Json(out).into_response()
}

/// Clamps `[start, start+count)` to `[0, len]` (spec §6 "slice clamped to listing length").
fn slice_bounds(len: usize, start: usize, count: usize) -> (usize, usize) {
	let end = start.saturating_add(count).min(len);
	let start = start.min(end);
	(start, end)
}

/// `GET /exit` (spec §6 "operational").
async fn exit(State(state): State<AppState>) -> impl IntoResponse {
	state.shutdown.notify_one();
	StatusCode::OK
}

async fn hydrate_one(objects: &ObjectView, obj: &Object) -> Option<Author> {
	let author_id = ApiObject::author_id(obj)?;
	match objects.get(author_id).await {
		Ok(Some(user)) => user.payload.as_user().map(|u| Author { id: author_id.to_string(), name: u.name.clone() }),
		Ok(None) => {
			log::debug!("author {} missing from cache", author_id);
			None
		}
		Err(e) => {
			log::debug!("author {} lookup failed: {:?}", author_id, e);
			None
		}
	}
}

/// Collects distinct author ids from `objs`, looks each up once, and returns `id ->
/// (id_string, name)`. A cache-miss on an author is logged, not fatal (spec §4.6).
async fn hydrate_many<'a>(objects: &ObjectView, objs: impl Iterator<Item = &'a Object>) -> HashMap<i64, (String, String)> {
	let mut ids: Vec<i64> = objs.filter_map(ApiObject::author_id).collect();
	ids.sort_unstable();
	ids.dedup();

	let mut out = HashMap::with_capacity(ids.len());
	for id in ids {
		match objects.get(id).await {
			Ok(Some(user)) => {
				if let Some(u) = user.payload.as_user() {
					out.insert(id, (id.to_string(), u.name.clone()));
				}
			}
			Ok(None) => log::debug!("author {} missing from cache", id),
			Err(e) => log::debug!("author {} lookup failed: {:?}", id, e),
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn slice_returns_the_tail_when_start_plus_count_overruns_the_listing() {
		// spec §8 scenario 8: a 50-entry listing, start=40 count=30 returns the last 10.
		assert_eq!(slice_bounds(50, 40, 30), (40, 50));
	}

	#[test]
	fn slice_is_empty_past_the_end_of_the_listing() {
		assert_eq!(slice_bounds(50, 60, 10), (50, 50));
	}

	#[test]
	fn slice_of_an_empty_listing_is_empty() {
		assert_eq!(slice_bounds(0, 0, 30), (0, 0));
	}
}
