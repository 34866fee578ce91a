// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! A synchronous, thread-safe client for the memcached text protocol,
//! backed by a single-threaded `mio` event loop and a fixed-size
//! connection pool.

pub mod cfg;
pub mod client;
pub mod error;
pub mod protocol;

pub use client::Client;
pub use error::{MemcacheError, Result};
