// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use bytes::Bytes;

use crate::error::MemcacheError;

/// The operation a [`super::codec::ResponseParser`] was armed to recognize.
///
/// Carrying the key here (rather than threading it through every call) keeps
/// `feed` itself a pure function of `(operation, accumulator, new bytes)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Get,
    Set,
}

/// A fully parsed, successful server response for one operation.
#[derive(Debug, Clone)]
pub enum Parsed {
    /// `getted(key, value-or-absent)`. The key is carried by the
    /// [`Operation`] the parser was armed with, not duplicated here.
    Get(Option<Bytes>),
    /// `setted`.
    Set,
}

/// The tagged record delivered into a caller's mailbox.
///
/// A mailbox receives exactly one `Response` and is then discarded (§3).
#[derive(Debug, Clone)]
pub enum Response {
    Checked,
    Connected,
    Getted(Option<Bytes>),
    Setted,
    Stopped,
    Error(MemcacheError),
}
