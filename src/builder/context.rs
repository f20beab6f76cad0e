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

//! Per-message processing context (spec §4.2, §9 "Recursive dereference with cycles").
//!
//! A fresh context is created for every delivered message and must never outlive it: it
//! memoizes `SourceID -> ObjectID` for users and posts so the graph walk over parents,
//! parts, and kids doesn't refetch or infinitely recurse when it revisits an id already
//! seen earlier in the same message.

use std::collections::HashMap;

#[derive(Default)]
pub struct ProcessingContext {
	processed_users: HashMap<String, i64>,
	processed_posts: HashMap<i64, i64>,
}

impl ProcessingContext {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn post(&self, source_id: i64) -> Option<i64> {
		self.processed_posts.get(&source_id).copied()
	}

	/// Records the allocated object id *before* recursing into this post's references, so
	/// a cycle back to the same source id resolves immediately instead of re-entering.
	pub fn record_post(&mut self, source_id: i64, object_id: i64) {
		self.processed_posts.insert(source_id, object_id);
	}

	pub fn user(&self, login: &str) -> Option<i64> {
		self.processed_users.get(login).copied()
	}

	pub fn record_user(&mut self, login: &str, object_id: i64) {
		self.processed_users.insert(login.to_string(), object_id);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn a_post_recorded_before_recursing_resolves_a_cycle_back_to_itself() {
		let mut ctx = ProcessingContext::new();
		assert_eq!(ctx.post(7), None);
		ctx.record_post(7, 1001);
		// if post 7's own kids list contains 7 again, the second lookup must return
		// immediately instead of recursing back into process_post.
		assert_eq!(ctx.post(7), Some(1001));
	}

	#[test]
	fn distinct_logins_and_post_ids_do_not_collide() {
		let mut ctx = ProcessingContext::new();
		ctx.record_user("42", 5);
		ctx.record_post(42, 6);
		assert_eq!(ctx.user("42"), Some(5));
		assert_eq!(ctx.post(42), Some(6));
	}
}
