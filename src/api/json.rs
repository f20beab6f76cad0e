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

//! The JSON shape returned to API clients (spec §6). Field naming here is part of the
//! external interface and must not drift from what's documented there.

use serde::Serialize;

use crate::model::{Object, ObjectType, Payload};

#[derive(Serialize)]
pub struct Author {
	pub id: String,
	pub name: String,
}

#[derive(Serialize)]
pub struct ApiObject {
	pub id: String,
	/// Always empty; the origin this spec was distilled from never populated it either
	/// (spec §9 "The `Source` JSON field").
	pub source: String,
	#[serde(rename = "type")]
	pub kind: &'static str,
	pub score: i64,
	pub deleted: bool,
	pub created: i32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub title: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub text: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub dead: Option<bool>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub parent: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub author: Option<Author>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub num_kids: Option<i32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub about: Option<String>,
}

impl ApiObject {
	/// Builds the client-facing shape for `obj`. `author` is resolved separately by the
	/// caller via the author-hydration pass (spec §4.6) and passed in once available.
	pub fn from_object(obj: &Object, author: Option<Author>) -> Self {
		let score = obj.score + obj.source_score;
		let mut out = ApiObject {
			id: obj.id.to_string(),
			source: String::new(),
			kind: obj.kind.as_json_tag(),
			score,
			deleted: obj.deleted,
			created: obj.unixtime,
			title: None,
			text: None,
			url: None,
			dead: None,
			parent: None,
			author: None,
			num_kids: None,
			name: None,
			about: None,
		};

		match &obj.payload {
			Payload::User(user) => {
				out.name = Some(user.name.clone());
				out.about = Some(user.about.clone());
			}
			Payload::Post(post) => {
				out.author = author;
				out.num_kids = Some(obj.num_kids);
				match obj.kind {
					ObjectType::LinkPost => {
						out.url = Some(post.url.clone());
						out.text = Some(post.text.clone());
						out.dead = Some(post.dead);
					}
					ObjectType::TextPost | ObjectType::Job | ObjectType::Poll | ObjectType::PollOpt => {
						out.title = Some(post.title.clone());
						out.text = Some(post.text.clone());
					}
					ObjectType::Comment => {
						out.text = Some(post.text.clone());
						out.parent = Some(post.parent.to_string());
					}
					ObjectType::User => unreachable!("User kind carries a User payload"),
				}
			}
		}

		out
	}

	pub fn author_id(obj: &Object) -> Option<i64> {
		obj.payload.as_post().map(|p| p.author).filter(|id| *id != 0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::{Object, Source};

	fn link() -> Object {
		Object::new(
			1,
			Source::HackerNews,
			ObjectType::LinkPost,
			5,
			false,
			0,
			Payload::Post(crate::model::Post { author: 9, url: "http://example.com".into(), text: "hi".into(), ..Default::default() }),
			vec![],
		)
	}

	#[test]
	fn link_post_carries_url_text_dead_but_not_title_or_parent() {
		let dto = ApiObject::from_object(&link(), None);
		assert_eq!(dto.kind, "link");
		assert!(dto.url.is_some());
		assert!(dto.text.is_some());
		assert!(dto.dead.is_some());
		assert!(dto.title.is_none());
		assert!(dto.parent.is_none());
	}

	#[test]
	fn comment_carries_parent_and_text_but_not_url() {
		let mut comment = link();
		comment.kind = ObjectType::Comment;
		if let Payload::Post(ref mut p) = comment.payload {
			p.parent = 7;
			p.text = "reply".into();
		}
		let dto = ApiObject::from_object(&comment, None);
		assert_eq!(dto.kind, "comment");
		assert_eq!(dto.parent.as_deref(), Some("7"));
		assert!(dto.url.is_none());
	}

	#[test]
	fn score_is_the_sum_of_score_and_source_score() {
		let mut obj = link();
		obj.score = 3;
		obj.source_score = 4;
		let dto = ApiObject::from_object(&obj, None);
		assert_eq!(dto.score, 7);
	}

	#[test]
	fn author_id_of_zero_is_treated_as_absent() {
		let mut obj = link();
		if let Payload::Post(ref mut p) = obj.payload {
			p.author = 0;
		}
		assert_eq!(ApiObject::author_id(&obj), None);
	}
}
