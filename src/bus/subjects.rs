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

//! Bus subject names (spec §6 "Bus topics").

pub const POSTS: &str = "hacker-news.posts";
pub const USERS: &str = "hacker-news.users";
pub const GET_OBJECT: &str = "hacker-news.get-object";
pub const GET_OBJECT_DEFAULT_REPLY: &str = "hacker-news.get-object.reply";
pub const OBJECTS_MODIFIED: &str = "objects.modified";

pub const BUILDER_DURABLE_NAME: &str = "nats2db";
pub const RANKER_DURABLE_NAME: &str = "ranking";
