// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use memcache_loop_rs::{Client, Result};

/// `(host, port)` for the integration suite, from `MEMCACHE_TEST_ADDR`
/// (`host:port`) or the memcached default (§9c).
pub fn test_addr() -> (String, u16) {
    let raw = std::env::var("MEMCACHE_TEST_ADDR").unwrap_or_else(|_| "127.0.0.1:11211".into());
    match raw.rsplit_once(':') {
        Some((host, port)) => (host.to_string(), port.parse().unwrap_or(11211)),
        None => (raw, 11211),
    }
}

pub fn client(size: usize) -> Result<Client> {
    let (host, port) = test_addr();
    Client::new(host, port, size, false)
}
