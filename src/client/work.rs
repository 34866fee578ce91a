// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use bytes::Bytes;

use crate::client::mailbox::MailboxTx;

/// The operation-specific payload of a [`WorkItem`].
#[derive(Debug)]
pub enum WorkKind {
    Check,
    Connect,
    Get { key: String },
    Set { key: String, value: Bytes, expiration: u32 },
    Stop,
}

/// A tagged record submitted by a caller thread to the loop thread.
///
/// `mailbox` is `None` for a fire-and-forget `set` (the `wait: false` case of
/// [`crate::client::Client::set`]) and for the internal `connect` items the
/// constructor submits during pool warm-up when it only cares about the
/// aggregate outcome, not each individual connection's handle.
#[derive(Debug)]
pub struct WorkItem {
    pub kind: WorkKind,
    pub mailbox: Option<MailboxTx>,
}

impl WorkItem {
    pub fn new(kind: WorkKind, mailbox: Option<MailboxTx>) -> Self {
        Self { kind, mailbox }
    }
}
