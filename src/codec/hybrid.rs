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

//! The hybrid ASCII+binary cache-view record (spec §4.1):
//!
//! ```text
//! <ID>|<Source>|<Type>|<Score>|<SourceScore>|<Deleted>|<UnixTime>|<Compression>|<Encoding>|<NumKids>|<payload-frame><kids-frame>
//! ```
//!
//! This is the upstream storage engine's on-disk/cache-view layout and must be preserved
//! bit-exactly (spec §9); it is hand-written rather than built on a general serializer.

use crate::codec::{proto, varint};
use crate::error::{Error, Result};
use crate::model::{Compression, Encoding, Object, ObjectType, Payload, Source};

/// Parses a cache-view value into a canonical `Object`. `version` is not part of the wire
/// record (it lives only in the relational store) and must be supplied by the caller if
/// known; callers that only have the cache view leave it at 0.
pub fn decode(buf: &[u8]) -> Result<Object> {
	let mut fields = [0i64; 10];
	let mut pos = 0usize;
	for slot in fields.iter_mut() {
		let bar = find(buf, pos).ok_or_else(|| Error::Codec("expected 10 `|`-delimited fields".into()))?;
		let text = std::str::from_utf8(&buf[pos..bar]).map_err(|_| Error::Codec("non-utf8 ascii field".into()))?;
		*slot = text.parse::<i64>().map_err(|_| Error::Codec(format!("bad integer field {:?}", text)))?;
		pos = bar + 1;
	}

	let [id, source, kind, score, source_score, deleted, unixtime, compression, encoding, num_kids] = fields;

	let (payload_len, used) = varint::read(buf, pos)?;
	pos += used;
	let payload_end = pos + payload_len as usize;
	let payload_buf = buf.get(pos..payload_end).ok_or_else(|| Error::Codec("truncated payload frame".into()))?;
	pos = payload_end;

	let kind = ObjectType::from_i32(kind as i32)?;
	let payload = match kind {
		ObjectType::User => proto::decode_user_payload(payload_buf)?,
		_ => proto::decode_post_payload(payload_buf)?,
	};

	let (kids_len, used) = varint::read(buf, pos)?;
	pos += used;
	let kids_end = pos + kids_len as usize;
	let kids_buf = buf.get(pos..kids_end).ok_or_else(|| Error::Codec("truncated kids frame".into()))?;
	let kids = proto::decode_kids(kids_buf)?;

	Ok(Object {
		id,
		source: Source::from_i32(source as i32)?,
		kind,
		score,
		source_score,
		deleted: deleted != 0,
		unixtime: unixtime as i32,
		compression: if compression == 1 { Compression::None } else { return Err(Error::Codec("unknown compression".into())) },
		encoding: if encoding == 1 { Encoding::Protobuf } else { return Err(Error::Codec("unknown encoding".into())) },
		payload,
		kids,
		num_kids: num_kids as i32,
		version: 0,
	})
}

/// Encodes a canonical `Object` into the wire record above. The Builder writes exactly
/// this layout on insert/update (spec §4.1 "Encoding is symmetric").
pub fn encode(obj: &Object) -> Vec<u8> {
	let mut out = Vec::new();
	write_ascii_fields(&mut out, obj);

	let payload = proto::encode_payload(&obj.payload);
	varint::write(&mut out, payload.len() as u64);
	out.extend_from_slice(&payload);

	let kids = proto::encode_kids(&obj.kids);
	varint::write(&mut out, kids.len() as u64);
	out.extend_from_slice(&kids);

	out
}

fn write_ascii_fields(out: &mut Vec<u8>, obj: &Object) {
	use std::fmt::Write as _;
	let mut s = String::new();
	let _ = write!(
		s,
		"{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|",
		obj.id,
		obj.source as i32,
		obj.kind as i32,
		obj.score,
		obj.source_score,
		if obj.deleted { 1 } else { 0 },
		obj.unixtime,
		obj.compression as i32,
		obj.encoding as i32,
		obj.num_kids,
	);
	out.extend_from_slice(s.as_bytes());
}

fn find(buf: &[u8], from: usize) -> Option<usize> {
	buf[from..].iter().position(|&b| b == b'|').map(|i| from + i)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::Post;

	fn sample() -> Object {
		Object::new(
			42,
			Source::HackerNews,
			ObjectType::TextPost,
			5,
			false,
			1_600_000_000,
			Payload::Post(Post { author: 7, dead: false, parent: 0, url: String::new(), title: "hi".into(), text: String::new(), parts: vec![] }),
			vec![100, 101, 102],
		)
	}

	#[test]
	fn round_trips() {
		let obj = sample();
		let encoded = encode(&obj);
		let decoded = decode(&encoded).unwrap();
		assert_eq!(decoded.id, obj.id);
		assert_eq!(decoded.source, obj.source);
		assert_eq!(decoded.kind, obj.kind);
		assert_eq!(decoded.kids, obj.kids);
		assert_eq!(decoded.num_kids, obj.num_kids);
		assert_eq!(decoded.payload, obj.payload);
	}

	#[test]
	fn empty_kids_round_trip() {
		let mut obj = sample();
		obj.kids.clear();
		obj.num_kids = 0;
		let decoded = decode(&encode(&obj)).unwrap();
		assert!(decoded.kids.is_empty());
	}

	#[test]
	fn rejects_missing_delimiter() {
		assert!(decode(b"42|2|3").is_err());
	}
}
