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

//! Generated protobuf messages (spec §6 "compact tagged binary encoding") plus the glue
//! that converts them to and from the canonical model in `crate::model`.

include!(concat!(env!("OUT_DIR"), "/hn.archive.rs"));

use prost::Message;

use crate::error::Result;
use crate::model;

impl From<&model::Post> for Post {
	fn from(p: &model::Post) -> Self {
		Post {
			author: p.author,
			dead: p.dead,
			parent: p.parent,
			url: p.url.clone(),
			title: p.title.clone(),
			text: p.text.clone(),
			parts: p.parts.clone(),
		}
	}
}

impl From<Post> for model::Post {
	fn from(p: Post) -> Self {
		model::Post { author: p.author, dead: p.dead, parent: p.parent, url: p.url, title: p.title, text: p.text, parts: p.parts }
	}
}

impl From<&model::User> for User {
	fn from(u: &model::User) -> Self {
		User { name: u.name.clone(), about: u.about.clone() }
	}
}

impl From<User> for model::User {
	fn from(u: User) -> Self {
		model::User { name: u.name, about: u.about }
	}
}

/// Encodes the typed payload frame (the first binary frame in §4.1's wire record).
pub fn encode_payload(payload: &model::Payload) -> Vec<u8> {
	match payload {
		model::Payload::Post(p) => Post::from(p).encode_to_vec(),
		model::Payload::User(u) => User::from(u).encode_to_vec(),
	}
}

pub fn decode_post_payload(buf: &[u8]) -> Result<model::Payload> {
	Ok(model::Payload::Post(Post::decode(buf)?.into()))
}

pub fn decode_user_payload(buf: &[u8]) -> Result<model::Payload> {
	Ok(model::Payload::User(User::decode(buf)?.into()))
}

/// Encodes the Kids frame (the second binary frame in §4.1's wire record).
pub fn encode_kids(kids: &[i64]) -> Vec<u8> {
	Kids { kids: kids.to_vec() }.encode_to_vec()
}

pub fn decode_kids(buf: &[u8]) -> Result<Vec<i64>> {
	Ok(Kids::decode(buf)?.kids)
}

pub fn encode_listing(listing: &model::Listing) -> Vec<u8> {
	Listing { objects: listing.objects.clone() }.encode_to_vec()
}

pub fn decode_listing(buf: &[u8]) -> Result<model::Listing> {
	Ok(model::Listing { objects: Listing::decode(buf)?.objects })
}
