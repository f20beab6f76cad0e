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

//! Monotonic unique-ID generation. The spec treats `NextID() -> int64` as an external
//! collaborator (§1 Out of scope); `Snowflake` is the one concrete implementation this
//! workspace needs in order to run standalone.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Generates strictly increasing 64-bit object IDs.
pub trait IdGenerator: Send + Sync {
	fn next_id(&self) -> i64;
}

/// A minimal snowflake-style generator: 41 bits of millisecond timestamp, 10 bits of node
/// id, 12 bits of per-millisecond sequence. Collisions within a process are prevented by
/// the sequence counter; collisions across processes are prevented by the node id.
pub struct Snowflake {
	node_id: i64,
	epoch_ms: i64,
	state: AtomicI64,
}

const SEQUENCE_BITS: i64 = 12;
const NODE_BITS: i64 = 10;
const SEQUENCE_MASK: i64 = (1 << SEQUENCE_BITS) - 1;
const NODE_MASK: i64 = (1 << NODE_BITS) - 1;

impl Snowflake {
	/// `epoch_ms` is a custom epoch subtracted from wall-clock time so the timestamp
	/// component doesn't burn through its 41 bits before the archive is retired.
	pub fn new(node_id: i64, epoch_ms: i64) -> Self {
		Snowflake { node_id: node_id & NODE_MASK, epoch_ms, state: AtomicI64::new(0) }
	}

	fn now_ms(&self) -> i64 {
		let since_epoch = SystemTime::now().duration_since(UNIX_EPOCH).expect("system clock before 1970").as_millis();
		since_epoch as i64 - self.epoch_ms
	}
}

impl IdGenerator for Snowflake {
	fn next_id(&self) -> i64 {
		loop {
			let now = self.now_ms();
			let prev = self.state.load(Ordering::Acquire);
			let prev_ms = prev >> SEQUENCE_BITS;
			let (ms, seq) = if now > prev_ms {
				(now, 0)
			} else {
				let seq = (prev & SEQUENCE_MASK) + 1;
				if seq > SEQUENCE_MASK {
					// sequence exhausted for this millisecond; spin into the next one
					continue;
				}
				(prev_ms, seq)
			};
			let next = (ms << SEQUENCE_BITS) | seq;
			if self.state.compare_exchange(prev, next, Ordering::AcqRel, Ordering::Acquire).is_ok() {
				return (ms << (SEQUENCE_BITS + NODE_BITS)) | (self.node_id << SEQUENCE_BITS) | seq;
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ids_strictly_increase() {
		let gen = Snowflake::new(1, 1_700_000_000_000);
		let mut last = gen.next_id();
		for _ in 0..10_000 {
			let id = gen.next_id();
			assert!(id > last, "{} should be greater than {}", id, last);
			last = id;
		}
	}

	#[test]
	fn distinct_nodes_do_not_collide_in_a_tight_window() {
		let a = Snowflake::new(1, 1_700_000_000_000);
		let b = Snowflake::new(2, 1_700_000_000_000);
		let mut seen = std::collections::HashSet::new();
		for _ in 0..1000 {
			assert!(seen.insert(a.next_id()));
			assert!(seen.insert(b.next_id()));
		}
	}
}
