// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::net::SocketAddr;

use mio::net::TcpStream;

use crate::{client::mailbox::MailboxTx, protocol::ResponseParser};

/// A connection's position in its own lifecycle (§3: `Connecting → Idle →
/// InFlight → Idle`, with terminal `Closed`).
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ConnState {
    Connecting,
    Idle,
    InFlight,
    Closed,
}

/// What to do, and where to post, once the operation bound to a connection
/// finishes, success or protocol error alike. Built by the dispatcher when
/// it binds a work item to a connection; consumed exactly once by the event
/// loop's completion path.
pub enum Completion {
    Connect { mailbox: Option<MailboxTx> },
    Get { mailbox: Option<MailboxTx> },
    Set { mailbox: Option<MailboxTx> },
}

/// One pooled TCP connection to the memcached server.
///
/// Owned exclusively by the loop thread; no caller thread ever reaches
/// into a `Connection`. Identity is the `slab` index the event loop stores
/// it under, offset into a `mio::Token` (see [`crate::client::event_loop`]).
pub struct Connection {
    pub stream: TcpStream,
    pub peer: SocketAddr,
    pub state: ConnState,
    pub write_buf: Vec<u8>,
    pub written: usize,
    pub parser: Option<ResponseParser>,
    pub completion: Option<Completion>,
    /// Set once the socket is registered for `WRITABLE` interest (during
    /// connect, or while a request is still being flushed) so the loop
    /// knows whether a re-registration is needed.
    pub writable_registered: bool,
}

impl Connection {
    pub fn connecting(stream: TcpStream, peer: SocketAddr, mailbox: Option<MailboxTx>) -> Self {
        Self {
            stream,
            peer,
            state: ConnState::Connecting,
            write_buf: Vec::new(),
            written: 0,
            parser: None,
            completion: Some(Completion::Connect { mailbox }),
            writable_registered: true,
        }
    }

    /// True once every byte of the pending request has been handed to the
    /// kernel.
    pub fn write_complete(&self) -> bool {
        self.written >= self.write_buf.len()
    }
}
