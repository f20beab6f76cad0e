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

//! The canonical object model. Every component in this crate reads and writes these types;
//! nothing downstream should ever see the wire/protobuf shapes directly.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Origin authority of an object.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum Source {
	Site = 1,
	HackerNews = 2,
}

impl Source {
	pub fn from_i32(v: i32) -> Result<Self> {
		match v {
			1 => Ok(Source::Site),
			2 => Ok(Source::HackerNews),
			other => Err(Error::Fatal(format!("unrecognized source id {}", other))),
		}
	}
}

/// Object kind, inferred from the feed's type string on ingestion (§4.2 step 8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum ObjectType {
	LinkPost = 1,
	Comment = 2,
	TextPost = 3,
	Job = 4,
	Poll = 5,
	PollOpt = 6,
	User = 7,
}

impl ObjectType {
	pub fn from_i32(v: i32) -> Result<Self> {
		Ok(match v {
			1 => ObjectType::LinkPost,
			2 => ObjectType::Comment,
			3 => ObjectType::TextPost,
			4 => ObjectType::Job,
			5 => ObjectType::Poll,
			6 => ObjectType::PollOpt,
			7 => ObjectType::User,
			other => return Err(Error::Fatal(format!("unrecognized object type {}", other))),
		})
	}

	/// The feed's source-type string maps onto a subset of object kinds; anything else is
	/// a fatal ingestion error (spec §4.2 step 8).
	pub fn from_feed_type(kind: &str) -> Result<Self> {
		Ok(match kind {
			"job" => ObjectType::Job,
			"story" => ObjectType::TextPost,
			"comment" => ObjectType::Comment,
			"poll" => ObjectType::Poll,
			"pollopt" => ObjectType::PollOpt,
			other => return Err(Error::Fatal(format!("unrecognized feed item type {:?}", other))),
		})
	}

	/// Whether objects of this type are eligible for a ranked listing (spec §3 Invariants).
	pub fn listable(self) -> bool {
		matches!(self, ObjectType::LinkPost | ObjectType::TextPost | ObjectType::Job | ObjectType::Poll)
	}

	/// The JSON discriminator used by the Read API (spec §6).
	pub fn as_json_tag(self) -> &'static str {
		match self {
			ObjectType::LinkPost => "link",
			ObjectType::Comment => "comment",
			ObjectType::TextPost => "story",
			ObjectType::Job => "job",
			ObjectType::Poll => "poll",
			ObjectType::PollOpt => "pollopt",
			ObjectType::User => "user",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum Compression {
	None = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum Encoding {
	Protobuf = 1,
}

/// The `Post` payload shape (spec §3).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Post {
	pub author: i64,
	pub dead: bool,
	pub parent: i64,
	pub url: String,
	pub title: String,
	pub text: String,
	pub parts: Vec<i64>,
}

/// The `User` payload shape (spec §3).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct User {
	pub name: String,
	pub about: String,
}

/// Tagged union of the two payload shapes, discriminated by `ObjectType` at decode time
/// (spec §9 "Duck-typed Payload").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
	Post(Post),
	User(User),
}

impl Payload {
	pub fn as_post(&self) -> Option<&Post> {
		match self {
			Payload::Post(p) => Some(p),
			Payload::User(_) => None,
		}
	}

	pub fn as_user(&self) -> Option<&User> {
		match self {
			Payload::User(u) => Some(u),
			Payload::Post(_) => None,
		}
	}
}

/// The canonical stored record for any addressable entity (spec §3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Object {
	pub id: i64,
	pub source: Source,
	pub kind: ObjectType,
	pub score: i64,
	pub source_score: i64,
	pub deleted: bool,
	pub unixtime: i32,
	pub compression: Compression,
	pub encoding: Encoding,
	pub payload: Payload,
	/// Ordered on the wire, set-significant for merges (spec §3 Invariants).
	pub kids: Vec<i64>,
	pub num_kids: i32,
	pub version: i64,
}

impl Object {
	/// Builds a fresh object with `version` left at the storage layer's initial value; callers
	/// populate `version` only after a successful insert is known (spec §4.2 step 9 notes
	/// version==1 after first insert).
	pub fn new(
		id: i64,
		source: Source,
		kind: ObjectType,
		source_score: i64,
		deleted: bool,
		unixtime: i32,
		payload: Payload,
		kids: Vec<i64>,
	) -> Self {
		let num_kids = kids.len() as i32;
		Object {
			id,
			source,
			kind,
			score: 0,
			source_score,
			deleted,
			unixtime,
			compression: Compression::None,
			encoding: Encoding::Protobuf,
			payload,
			kids,
			num_kids,
			version: 0,
		}
	}

	/// Merges a fresh observation onto an existing row (spec §4.2 "Merge rule"): `Score` is
	/// preserved, everything else source-originated is replaced, and `Kids` unions as a set.
	/// The prose invariant (§3, §8 scenario 3) is authoritative over the literal behavior of
	/// the program this spec was distilled from, whose final merge call is believed to have
	/// dropped the union and stored only the newest observation's kids; see DESIGN.md.
	pub fn merge_from(&self, new: &Object) -> Object {
		let mut kids = self.kids.clone();
		for k in &new.kids {
			if !kids.contains(k) {
				kids.push(*k);
			}
		}
		let num_kids = kids.len() as i32;
		Object {
			id: self.id,
			source: self.source,
			kind: self.kind,
			score: self.score,
			source_score: new.source_score,
			deleted: new.deleted,
			unixtime: self.unixtime,
			compression: new.compression,
			encoding: new.encoding,
			payload: new.payload.clone(),
			kids,
			num_kids,
			version: self.version,
		}
	}
}

/// A key into the Source-ID Mapping relation: `(Source, SourceID)` (spec §3).
///
/// `SourceId` bytes follow the original scheme verbatim: `"u" + login` for users and
/// `"p" + decimal id` for posts (spec §4.2).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceId {
	pub source: Source,
	pub key: Vec<u8>,
}

impl SourceId {
	pub fn for_user(source: Source, login: &str) -> Self {
		let mut key = Vec::with_capacity(login.len() + 1);
		key.push(b'u');
		key.extend_from_slice(login.as_bytes());
		SourceId { source, key }
	}

	pub fn for_post(source: Source, id: i64) -> Self {
		let mut key = Vec::with_capacity(16);
		key.push(b'p');
		key.extend_from_slice(id.to_string().as_bytes());
		SourceId { source, key }
	}
}

impl std::fmt::Debug for Source {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Source::Site => write!(f, "Site"),
			Source::HackerNews => write!(f, "HackerNews"),
		}
	}
}

/// The single in-scope listing type (spec §3, §GLOSSARY).
pub const LISTING_HOT: i32 = 1;
/// Hard cap on a listing's length (spec §3 Invariants).
pub const MAX_LISTING_SIZE: usize = 800;

/// An ordered, truncated sequence of ObjectIDs materialized per listing type (spec §3).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Listing {
	pub objects: Vec<i64>,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn post(kids: Vec<i64>) -> Object {
		Object::new(
			42,
			Source::HackerNews,
			ObjectType::TextPost,
			5,
			false,
			1_600_000_000,
			Payload::Post(Post { title: "hi".into(), ..Default::default() }),
			kids,
		)
	}

	#[test]
	fn merge_unions_kids_as_a_set() {
		let existing = post(vec![100, 101]);
		let incoming = post(vec![101, 102]);
		let merged = existing.merge_from(&incoming);
		assert_eq!(merged.kids, vec![100, 101, 102]);
		assert_eq!(merged.num_kids, 3);
	}

	#[test]
	fn merge_preserves_score_but_replaces_source_score() {
		let mut existing = post(vec![]);
		existing.score = 77;
		let mut incoming = post(vec![]);
		incoming.source_score = 9;
		let merged = existing.merge_from(&incoming);
		assert_eq!(merged.score, 77);
		assert_eq!(merged.source_score, 9);
	}

	#[test]
	fn merge_is_idempotent_on_repeated_identical_observation() {
		let existing = post(vec![100, 101]);
		let once = existing.merge_from(&existing);
		let twice = once.merge_from(&existing);
		assert_eq!(once.kids, twice.kids);
		assert_eq!(once.num_kids, twice.num_kids);
	}

	#[test]
	fn source_id_keys_are_disjoint_between_users_and_posts() {
		let user = SourceId::for_user(Source::HackerNews, "42");
		let post = SourceId::for_post(Source::HackerNews, 42);
		assert_ne!(user.key, post.key);
	}
}
