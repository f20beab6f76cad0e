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

//! URL normalization (spec §3, §4.2 step 7): lowercase scheme, lowercase host, uppercase
//! percent-escapes. A failure here is fatal (spec treats it as operator misconfiguration,
//! not a data-quality issue to tolerate).

use url::Url;

use crate::error::{Error, Result};

pub fn normalize(raw: &str) -> Result<String> {
	if raw.is_empty() {
		return Ok(String::new());
	}
	let mut parsed = Url::parse(raw).map_err(|e| Error::Fatal(format!("url normalization failed for {:?}: {}", raw, e)))?;
	let scheme = parsed.scheme().to_lowercase();
	parsed.set_scheme(&scheme).map_err(|_| Error::Fatal(format!("could not set lowercase scheme on {:?}", raw)))?;
	if let Some(host) = parsed.host_str() {
		let lower = host.to_lowercase();
		parsed.set_host(Some(&lower)).map_err(|_| Error::Fatal(format!("could not set lowercase host on {:?}", raw)))?;
	}
	Ok(uppercase_escapes(parsed.as_str()))
}

/// Percent-escapes in a URL are case-insensitive; uppercase is the canonical form used
/// here (`%2f` -> `%2F`).
fn uppercase_escapes(s: &str) -> String {
	let bytes = s.as_bytes();
	let mut out = String::with_capacity(s.len());
	let mut i = 0;
	while i < bytes.len() {
		if bytes[i] == b'%' && i + 2 < bytes.len() && bytes[i + 1].is_ascii_hexdigit() && bytes[i + 2].is_ascii_hexdigit() {
			out.push('%');
			out.push(bytes[i + 1].to_ascii_uppercase() as char);
			out.push(bytes[i + 2].to_ascii_uppercase() as char);
			i += 3;
		} else {
			out.push(bytes[i] as char);
			i += 1;
		}
	}
	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn lowercases_scheme_and_host() {
		let n = normalize("HTTP://Example.COM/Path").unwrap();
		assert!(n.starts_with("http://example.com/"));
	}

	#[test]
	fn uppercases_escapes() {
		let n = normalize("http://example.com/a%2fb").unwrap();
		assert!(n.contains("%2F"));
	}

	#[test]
	fn empty_url_is_allowed() {
		assert_eq!(normalize("").unwrap(), "");
	}

	#[test]
	fn garbage_is_fatal() {
		assert!(normalize("not a url at all").is_err());
	}
}
