// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use thiserror::Error;

/// The single error type surfaced to callers of [`crate::client::Client`].
///
/// Every failure mode described by the error taxonomy is represented by its
/// own variant so callers can match on failure class instead of parsing a
/// message string.
#[derive(Debug, Error, Clone)]
pub enum MemcacheError {
    /// A key or value failed the surface-level validation rules before it
    /// was ever enqueued for the loop thread.
    #[error("validation error: {0}")]
    Validation(String),

    /// A socket-level failure while warming up the connection pool.
    #[error("connect error: {0}")]
    Connect(String),

    /// The server replied with `ERROR`, `CLIENT_ERROR ...` or `SERVER_ERROR
    /// ...`.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The caller's mailbox wait exceeded its deadline. The loop-side work
    /// item is not cancelled; its eventual response is discarded.
    #[error("timeout waiting for response")]
    Timeout,

    /// The request was observed after the loop had already processed
    /// `stop`.
    #[error("client is stopped")]
    Stopped,

    /// An unexpected failure inside the dispatcher. Always a bug, never a
    /// protocol condition, but captured so the loop thread never hangs a
    /// caller.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, MemcacheError>;
