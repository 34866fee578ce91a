// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{
    sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TrySendError},
    time::Duration,
};

use crate::{error::MemcacheError, protocol::response::Response};

/// A single-slot, single-producer/single-consumer handoff for one response.
///
/// The loop thread holds [`MailboxTx`] and the caller thread holds
/// [`MailboxRx`]. A mailbox receives exactly one [`Response`] and is then
/// discarded; the loop's write is always a try-put so a caller that already
/// timed out and stopped listening can never block the loop thread.
pub fn channel() -> (MailboxTx, MailboxRx) {
    let (tx, rx) = mpsc::sync_channel(1);
    (MailboxTx(tx), MailboxRx(rx))
}

#[derive(Clone)]
pub struct MailboxTx(SyncSender<Response>);

impl MailboxTx {
    /// Attempts to deliver `response`. Failure (the caller already gave up
    /// and dropped its receiver, or, impossible by construction since the
    /// slot is single-use, the slot is full) is silently discarded: a
    /// try-put may fail harmlessly.
    pub fn try_post(&self, response: Response) {
        match self.0.try_send(response) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {},
            Err(TrySendError::Full(_)) => {
                // A mailbox is only ever posted to once by construction; a
                // full slot here would mean a completion fired twice.
                debug_assert!(false, "mailbox posted to more than once");
            },
        }
    }
}

pub struct MailboxRx(Receiver<Response>);

impl MailboxRx {
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Response, MemcacheError> {
        match self.0.recv_timeout(timeout) {
            Ok(response) => Ok(response),
            Err(RecvTimeoutError::Timeout) => Err(MemcacheError::Timeout),
            Err(RecvTimeoutError::Disconnected) => {
                Err(MemcacheError::Internal("mailbox dropped without a response".into()))
            },
        }
    }
}
