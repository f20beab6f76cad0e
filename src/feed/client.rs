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

//! The external feed client (spec §1 "Out of scope" names this as an external
//! collaborator, but the Feed Adapter still needs one concrete HTTP client to run
//! standalone). One client is owned per worker (spec §4.5).

use serde::Deserialize;

use crate::codec::proto::{FeedPost, FeedUser};
use crate::error::Result;

const BASE: &str = "https://hacker-news.firebaseio.com/v0";

#[derive(Deserialize)]
struct RawItem {
	id: i64,
	#[serde(default)]
	deleted: bool,
	#[serde(rename = "type")]
	kind: String,
	#[serde(default)]
	by: String,
	#[serde(default)]
	time: i64,
	#[serde(default)]
	text: String,
	#[serde(default)]
	dead: bool,
	#[serde(default)]
	parent: i64,
	#[serde(default)]
	poll: i64,
	#[serde(default)]
	kids: Vec<i64>,
	#[serde(default)]
	url: String,
	#[serde(default)]
	score: i64,
	#[serde(default)]
	title: String,
	#[serde(default)]
	parts: Vec<i64>,
	#[serde(default)]
	descendants: i32,
}

#[derive(Deserialize)]
struct RawUser {
	id: String,
	#[serde(default)]
	about: String,
	#[serde(default)]
	karma: i64,
	#[serde(default)]
	submitted: Vec<i64>,
}

pub struct FeedClient {
	http: reqwest::Client,
}

impl Default for FeedClient {
	fn default() -> Self {
		Self::new()
	}
}

impl FeedClient {
	pub fn new() -> Self {
		FeedClient { http: reqwest::Client::new() }
	}

	/// Fetches one item and converts it to the Builder's wire form. A silent miss (item
	/// removed upstream) surfaces as `Ok(None)`, not an error (spec §4.5, §9 "do not
	/// reply").
	pub async fn fetch_item(&self, id: i64) -> Result<Option<FeedPost>> {
		let url = format!("{}/item/{}.json", BASE, id);
		let resp = self.http.get(&url).send().await?;
		if !resp.status().is_success() {
			return Ok(None);
		}
		let raw: Option<RawItem> = resp.json().await?;
		Ok(raw.map(|r| FeedPost {
			id: r.id,
			kind: r.kind,
			author: r.by,
			deleted: r.deleted,
			dead: r.dead,
			descendants: r.descendants,
			parent: if r.parent != 0 { r.parent } else { r.poll },
			kids: r.kids,
			parts: r.parts,
			time: r.time * 1000,
			url: r.url,
			title: r.title,
			text: r.text,
			score: r.score,
		}))
	}

	pub async fn fetch_user(&self, login: &str) -> Result<Option<FeedUser>> {
		let url = format!("{}/user/{}.json", BASE, login);
		let resp = self.http.get(&url).send().await?;
		if !resp.status().is_success() {
			return Ok(None);
		}
		let raw: Option<RawUser> = resp.json().await?;
		Ok(raw.map(|r| FeedUser { login: r.id, about: r.about, karma: r.karma, submitted: r.submitted }))
	}

	/// Polls the "recent updates" endpoint for newly changed item/profile ids (spec §4.5
	/// "long-poll watch").
	pub async fn fetch_updates(&self) -> Result<(Vec<i64>, Vec<String>)> {
		#[derive(Deserialize)]
		struct Updates {
			items: Vec<i64>,
			profiles: Vec<String>,
		}
		let url = format!("{}/updates.json", BASE);
		let updates: Updates = self.http.get(&url).send().await?.json().await?;
		Ok((updates.items, updates.profiles))
	}
}
