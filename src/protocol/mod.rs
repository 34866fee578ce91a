// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The memcached ASCII text-protocol subset this crate speaks: `get` and
//! `set` request encoding, plus the incremental response parser.

pub mod codec;
pub mod response;

pub use codec::{ResponseParser, encode_get, encode_set};
pub use response::{Operation, Parsed, Response};
