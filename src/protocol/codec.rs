// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The memcached ASCII text-protocol wire codec.
//!
//! Request encoding is a one-shot `Vec<u8>` builder. Response parsing is the
//! incremental half: [`ResponseParser::feed`] is handed whatever bytes the
//! event loop just read off the socket and returns either a fully parsed
//! [`Parsed`] response or `None` to mean "keep reading". The parser carries
//! no state beyond its byte accumulator, so it can be, and is, unit tested
//! with no socket in sight.
//!
//! The `VALUE <key> <flags> <length>\r\n<payload>\r\nEND\r\n` framing is
//! deliberately **length-directed**: the header line gives an exact byte
//! count for the payload, so the parser slices exactly `length` bytes and
//! then demands the literal `\r\nEND\r\n` immediately after. A payload that
//! happens to contain the bytes `\r\nEND\r\n` therefore cannot be mistaken
//! for the real terminator; matching on the length is what disambiguates
//! it, not a regex scan over the whole buffer.

use bytes::{Bytes, BytesMut};

use crate::{
    error::MemcacheError,
    protocol::response::{Operation, Parsed},
};

const END_LINE: &[u8] = b"END\r\n";
const STORED_LINE: &[u8] = b"STORED\r\n";
const ERROR_LINE: &[u8] = b"ERROR\r\n";
const CLIENT_ERROR_PREFIX: &[u8] = b"CLIENT_ERROR ";
const SERVER_ERROR_PREFIX: &[u8] = b"SERVER_ERROR ";
const VALUE_PREFIX: &[u8] = b"VALUE ";
const CRLF: &[u8] = b"\r\n";

/// Builds the `get <key>\r\n` request line.
pub fn encode_get(key: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(key.len() + 8);
    out.extend_from_slice(b"get ");
    out.extend_from_slice(key.as_bytes());
    out.extend_from_slice(CRLF);
    out
}

/// Builds the `set <key> 0 <expiration> <byte-length>\r\n<value>\r\n`
/// request. Flags are always `0`; the field is accepted but unused by
/// this client.
pub fn encode_set(key: &str, value: &[u8], expiration: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(key.len() + value.len() + 32);
    out.extend_from_slice(b"set ");
    out.extend_from_slice(key.as_bytes());
    out.extend_from_slice(format!(" 0 {expiration} {}\r\n", value.len()).as_bytes());
    out.extend_from_slice(value);
    out.extend_from_slice(CRLF);
    out
}

/// Incremental response parser. Owns the byte accumulator for one in-flight
/// operation; everything else about `feed` is a pure function of its inputs.
#[derive(Debug)]
pub struct ResponseParser {
    op: Operation,
    acc: BytesMut,
}

impl ResponseParser {
    pub fn new(op: Operation) -> Self {
        Self { op, acc: BytesMut::new() }
    }

    /// Appends `new_bytes` to the accumulator and attempts to recognize a
    /// complete response.
    ///
    /// Returns `Ok(Some(parsed))` once a full response (success or protocol
    /// error) has been recognized, `Ok(None)` when more bytes are needed,
    /// and never returns an `Err` for anything short of a caller bug.
    pub fn feed(&mut self, new_bytes: &[u8]) -> Result<Option<Parsed>, MemcacheError> {
        self.acc.extend_from_slice(new_bytes);
        try_parse(&self.op, &self.acc)
    }
}

/// The pure parsing step: given an operation and the bytes accumulated so
/// far, decide whether a complete response is present.
fn try_parse(op: &Operation, acc: &[u8]) -> Result<Option<Parsed>, MemcacheError> {
    if let Some(outcome) = check_error_framing(acc) {
        // `Ok(())` means "still a growing prefix of some error framing",
        // i.e. incomplete; `Err` means the framing is complete.
        return outcome.map(|()| None);
    }
    match op {
        Operation::Get => try_parse_get(acc),
        Operation::Set => try_parse_set(acc),
    }
}

/// Checks the three error framings that can appear in place of either
/// operation's success response. Returns:
/// - `None` if `acc` cannot currently be (a prefix of) any error framing;
///   the caller should continue trying to parse the operation's own
///   success framing.
/// - `Some(Ok(()))` if `acc` is a strict, still-growing prefix of one of the
///   framings; more bytes are needed before we know anything.
/// - `Some(Err(..))` once a complete error framing has been recognized.
fn check_error_framing(acc: &[u8]) -> Option<Result<(), MemcacheError>> {
    if starts_or_is_prefix_of(acc, ERROR_LINE) {
        return Some(if acc == ERROR_LINE {
            Err(MemcacheError::Protocol("unknown error from server".into()))
        } else {
            Ok(())
        });
    }
    if let Some(line) = complete_line(acc, CLIENT_ERROR_PREFIX) {
        let text = strip_prefix_and_crlf(line, CLIENT_ERROR_PREFIX);
        return Some(Err(MemcacheError::Protocol(format!("client error: {text}"))));
    }
    if is_prefix_of_variable(acc, CLIENT_ERROR_PREFIX) {
        return Some(Ok(()));
    }
    if let Some(line) = complete_line(acc, SERVER_ERROR_PREFIX) {
        let text = strip_prefix_and_crlf(line, SERVER_ERROR_PREFIX);
        return Some(Err(MemcacheError::Protocol(format!("server error: {text}"))));
    }
    if is_prefix_of_variable(acc, SERVER_ERROR_PREFIX) {
        return Some(Ok(()));
    }
    None
}

fn try_parse_get(acc: &[u8]) -> Result<Option<Parsed>, MemcacheError> {
    if acc == END_LINE {
        return Ok(Some(Parsed::Get(None)));
    }
    if starts_or_is_prefix_of(acc, END_LINE) {
        return Ok(None);
    }

    if is_prefix_of_variable(acc, VALUE_PREFIX) {
        return Ok(None);
    }
    if !acc.starts_with(VALUE_PREFIX) {
        return Err(MemcacheError::Protocol(format!(
            "unrecognized response from server: {:?}",
            lossy_preview(acc)
        )));
    }

    let Some(header_end) = find_subslice(acc, CRLF) else {
        return Ok(None);
    };
    let header_line = &acc[..header_end];
    let fields: Vec<&[u8]> = header_line.split(|b| *b == b' ').collect();
    if fields.len() != 4 {
        return Err(MemcacheError::Protocol(
            "malformed VALUE header from server".into(),
        ));
    }
    let length: usize = std::str::from_utf8(fields[3])
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| MemcacheError::Protocol("malformed VALUE length".into()))?;

    let header_len = header_end + CRLF.len();
    let total_needed = header_len + length + CRLF.len() + END_LINE.len();
    if acc.len() < total_needed {
        return Ok(None);
    }

    let payload = &acc[header_len..header_len + length];
    let trailer = &acc[header_len + length..total_needed];
    if trailer != b"\r\nEND\r\n" {
        return Err(MemcacheError::Protocol(
            "malformed VALUE framing: expected \\r\\nEND\\r\\n trailer".into(),
        ));
    }

    Ok(Some(Parsed::Get(Some(Bytes::copy_from_slice(payload)))))
}

fn try_parse_set(acc: &[u8]) -> Result<Option<Parsed>, MemcacheError> {
    if acc == STORED_LINE {
        return Ok(Some(Parsed::Set));
    }
    if starts_or_is_prefix_of(acc, STORED_LINE) {
        return Ok(None);
    }
    Err(MemcacheError::Protocol(format!(
        "unrecognized response from server: {:?}",
        lossy_preview(acc)
    )))
}

/// True if `acc` equals `full` or is a (possibly empty) prefix of it, i.e.
/// `acc` might still grow into `full`.
fn starts_or_is_prefix_of(acc: &[u8], full: &[u8]) -> bool {
    acc.len() <= full.len() && full.starts_with(acc)
}

/// True if `acc` is strictly shorter than `prefix` and could still grow
/// into it (used for variable-length framings like `CLIENT_ERROR `, where
/// we only know the fixed leading literal, not a full terminated line).
fn is_prefix_of_variable(acc: &[u8], prefix: &[u8]) -> bool {
    acc.len() < prefix.len() && prefix.starts_with(acc)
}

/// If `acc` starts with `prefix` and contains a terminating CRLF, returns
/// the full line (including the CRLF). Otherwise `None`.
fn complete_line<'a>(acc: &'a [u8], prefix: &[u8]) -> Option<&'a [u8]> {
    if !acc.starts_with(prefix) {
        return None;
    }
    let end = find_subslice(acc, CRLF)?;
    Some(&acc[..end + CRLF.len()])
}

fn strip_prefix_and_crlf(line: &[u8], prefix: &[u8]) -> String {
    let body = &line[prefix.len()..line.len() - CRLF.len()];
    String::from_utf8_lossy(body).into_owned()
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn lossy_preview(acc: &[u8]) -> String {
    let cap = acc.len().min(64);
    String::from_utf8_lossy(&acc[..cap]).into_owned()
}
