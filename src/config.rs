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

//! Environment-variable configuration (spec §6 "Environment configuration").

use std::env;
use std::fmt;

use crate::error::Result;

fn var(name: &str, default: &str) -> String {
	env::var(name).unwrap_or_else(|_| default.to_string())
}

fn required(name: &str) -> Result<String> {
	Ok(env::var(name)?)
}

#[derive(Clone, Debug)]
pub struct NatsConfig {
	pub cluster_id: String,
	pub client_id: String,
	pub url: String,
}

impl NatsConfig {
	pub fn from_env(client_id: &str) -> Result<Self> {
		Ok(NatsConfig {
			cluster_id: var("NATS_CLUSTER_ID", "hn-archive"),
			client_id: var("NATS_CLIENT_ID", client_id),
			url: var("NATS_URL", "nats://127.0.0.1:4222"),
		})
	}
}

impl fmt::Display for NatsConfig {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{} (cluster {}, client {})", self.url, self.cluster_id, self.client_id)
	}
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
	pub address: String,
	pub user: String,
	pub password: String,
}

impl DatabaseConfig {
	pub fn from_env() -> Result<Self> {
		Ok(DatabaseConfig {
			address: required("MYSQL_ADDRESS")?,
			user: required("MYSQL_USER")?,
			password: required("MYSQL_PASSWORD")?,
		})
	}

	/// A `mysql://` connection url sqlx can consume directly.
	pub fn url(&self) -> String {
		format!("mysql://{}:{}@{}/site", self.user, self.password, self.address)
	}
}

impl fmt::Display for DatabaseConfig {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "mysql://{}@{}/site", self.user, self.address)
	}
}

#[derive(Clone, Debug)]
pub struct ApiConfig {
	pub memcache_address: String,
	pub server_host: String,
	pub server_port: u16,
}

impl ApiConfig {
	pub fn from_env() -> Self {
		ApiConfig {
			memcache_address: var("API_MEMCACHE_ADDRESS", "127.0.0.1:11211"),
			server_host: var("API_SERVER_HOST", "127.0.0.1"),
			server_port: var("API_SERVER_PORT", "8080").parse().unwrap_or(8080),
		}
	}

	pub fn bind_addr(&self) -> String {
		format!("{}:{}", self.server_host, self.server_port)
	}
}

#[derive(Clone, Debug)]
pub struct FeedConfig {
	pub request_concurrency: usize,
}

impl FeedConfig {
	pub fn from_env() -> Self {
		FeedConfig { request_concurrency: var("HN_REQUEST_CONCURRENCY", "1").parse().unwrap_or(1) }
	}
}
