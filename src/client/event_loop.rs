// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! The single-threaded reactor (§4.2). Owns every socket, every
//! connection's parser state, and the idle pool. The only thing it shares
//! with caller threads is the [`RequestQueue`] (and, transitively, the
//! `mio::Waker` that wakes it).

use std::{
    io::{self, Read, Write},
    net::{SocketAddr, ToSocketAddrs},
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use bytes::Bytes;
use mio::{Events, Interest, Poll, Token, Waker, net::TcpStream};
use slab::Slab;

use crate::{
    client::{
        connection::{Completion, ConnState, Connection},
        mailbox::MailboxTx,
        pool::IdlePool,
        queue::RequestQueue,
        work::{WorkItem, WorkKind},
    },
    error::MemcacheError,
    protocol::{Operation, Parsed, Response, ResponseParser, encode_get, encode_set},
};

const WAKER_TOKEN: Token = Token(0);

/// Spawns the loop thread and returns the queue used to talk to it.
///
/// `connect_timeout` bounds how long the loop will wait, from its own side,
/// for the constructor's initial `check` to round-trip before giving up and
/// self-stopping, a guard against a wedged loop thread independent of the
/// timeout the caller's own mailbox wait enforces.
pub fn spawn(
    host: String,
    port: u16,
    connect_timeout: Duration,
) -> io::Result<(JoinHandle<()>, Arc<RequestQueue>)> {
    let poll = Poll::new()?;
    let waker = Arc::new(Waker::new(poll.registry(), WAKER_TOKEN)?);
    let queue = Arc::new(RequestQueue::new(Arc::clone(&waker)));

    let event_loop = EventLoop {
        poll,
        events: Events::with_capacity(128),
        connections: Slab::new(),
        idle: IdlePool::new(),
        queue: Arc::clone(&queue),
        host,
        port,
        stopped: false,
        startup_done: false,
        startup_deadline: Some(Instant::now() + connect_timeout),
    };

    let handle = thread::Builder::new()
        .name("memcache-loop".into())
        .spawn(move || event_loop.run())?;

    Ok((handle, queue))
}

struct EventLoop {
    poll: Poll,
    events: Events,
    connections: Slab<Connection>,
    idle: IdlePool,
    queue: Arc<RequestQueue>,
    host: String,
    port: u16,
    stopped: bool,
    startup_done: bool,
    startup_deadline: Option<Instant>,
}

impl EventLoop {
    fn run(mut self) {
        tracing::info!(host = %self.host, port = self.port, "event loop starting");
        loop {
            let timeout = self.next_timeout();
            match self.poll.poll(&mut self.events, timeout) {
                Ok(()) => {},
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::error!(error = %e, "poll failed, stopping loop");
                    self.begin_shutdown();
                    break;
                },
            }

            if self.events.is_empty() && self.check_startup_expired() {
                tracing::warn!("initial check did not complete within the connect timeout");
                self.begin_shutdown();
                break;
            }

            let ready: Vec<(Token, bool, bool)> =
                self.events.iter().map(|e| (e.token(), e.is_readable(), e.is_writable())).collect();

            for (token, readable, writable) in ready {
                if token == WAKER_TOKEN {
                    let queue = Arc::clone(&self.queue);
                    queue.drain_and_dispatch(|item| self.dispatch(item));
                } else {
                    let key = token.0 - 1;
                    if writable {
                        self.handle_writable(key);
                    }
                    if readable && !self.stopped {
                        self.handle_readable(key);
                    }
                }
                if self.stopped {
                    break;
                }
            }

            if self.stopped {
                break;
            }
        }
        tracing::info!("event loop stopped");
    }

    fn next_timeout(&self) -> Option<Duration> {
        if self.startup_done {
            return None;
        }
        self.startup_deadline.map(|d| d.saturating_duration_since(Instant::now()))
    }

    fn check_startup_expired(&self) -> bool {
        !self.startup_done && self.startup_deadline.is_some_and(|d| Instant::now() >= d)
    }

    fn dispatch(&mut self, item: WorkItem) -> Option<WorkItem> {
        let WorkItem { kind, mailbox } = item;
        match kind {
            WorkKind::Check => {
                self.startup_done = true;
                if let Some(mb) = mailbox {
                    mb.try_post(Response::Checked);
                }
                None
            },
            WorkKind::Connect => {
                self.start_connect(mailbox);
                None
            },
            WorkKind::Get { key } => self.dispatch_get(key, mailbox),
            WorkKind::Set { key, value, expiration } => {
                self.dispatch_set(key, value, expiration, mailbox)
            },
            WorkKind::Stop => {
                self.begin_shutdown();
                if let Some(mb) = mailbox {
                    mb.try_post(Response::Stopped);
                }
                None
            },
        }
    }

    fn start_connect(&mut self, mailbox: Option<MailboxTx>) {
        let target = format!("{}:{}", self.host, self.port);
        let addr: Option<SocketAddr> = match target.to_socket_addrs() {
            Ok(mut it) => it.next(),
            Err(_) => None,
        };
        let Some(addr) = addr else {
            tracing::warn!(%target, "could not resolve memcached address");
            if let Some(mb) = mailbox {
                mb.try_post(Response::Error(MemcacheError::Connect(format!(
                    "could not resolve {target}"
                ))));
            }
            return;
        };

        let stream = match TcpStream::connect(addr) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(%addr, error = %e, "connect failed");
                if let Some(mb) = mailbox {
                    mb.try_post(Response::Error(MemcacheError::Connect(e.to_string())));
                }
                return;
            },
        };

        let entry = self.connections.vacant_entry();
        let key = entry.key();
        let token = Token(key + 1);
        let mut conn = Connection::connecting(stream, addr, mailbox);
        if let Err(e) = self.poll.registry().register(&mut conn.stream, token, Interest::WRITABLE) {
            tracing::warn!(%addr, error = %e, "failed to register connecting socket");
            if let Some(Completion::Connect { mailbox }) = conn.completion {
                if let Some(mb) = mailbox {
                    mb.try_post(Response::Error(MemcacheError::Connect(e.to_string())));
                }
            }
            return;
        }
        entry.insert(conn);
        tracing::debug!(%addr, "connect in progress");
    }

    fn dispatch_get(&mut self, key: String, mailbox: Option<MailboxTx>) -> Option<WorkItem> {
        let Some(conn_key) = self.idle.acquire() else {
            tracing::debug!(%key, "no idle connection, reposting get");
            return Some(WorkItem::new(WorkKind::Get { key }, mailbox));
        };
        tracing::debug!(%key, "dispatching get");
        let bytes = encode_get(&key);
        self.begin_request(conn_key, bytes, Operation::Get, Completion::Get { mailbox });
        None
    }

    fn dispatch_set(
        &mut self,
        key: String,
        value: Bytes,
        expiration: u32,
        mailbox: Option<MailboxTx>,
    ) -> Option<WorkItem> {
        let Some(conn_key) = self.idle.acquire() else {
            tracing::debug!(%key, "no idle connection, reposting set");
            return Some(WorkItem::new(WorkKind::Set { key, value, expiration }, mailbox));
        };
        tracing::debug!(%key, expiration, "dispatching set");
        let bytes = encode_set(&key, &value, expiration);
        self.begin_request(conn_key, bytes, Operation::Set, Completion::Set { mailbox });
        None
    }

    fn begin_request(
        &mut self,
        conn_key: usize,
        request: Vec<u8>,
        op: Operation,
        completion: Completion,
    ) {
        let conn = &mut self.connections[conn_key];
        conn.state = ConnState::InFlight;
        conn.parser = Some(ResponseParser::new(op));
        conn.completion = Some(completion);
        conn.write_buf = request;
        conn.written = 0;
        self.try_flush(conn_key);
    }

    fn handle_writable(&mut self, key: usize) {
        if !self.connections.contains(key) {
            return;
        }
        match self.connections[key].state {
            ConnState::Connecting => self.complete_connect(key),
            ConnState::InFlight => self.try_flush(key),
            ConnState::Idle | ConnState::Closed => {},
        }
    }

    fn complete_connect(&mut self, key: usize) {
        let outcome = self.connections[key].stream.take_error();
        match outcome {
            Ok(None) => {
                let conn = &mut self.connections[key];
                conn.state = ConnState::Idle;
                let token = Token(key + 1);
                if let Err(e) = self.poll.registry().reregister(&mut conn.stream, token, Interest::READABLE) {
                    tracing::warn!(error = %e, "failed to reregister connected socket");
                }
                conn.writable_registered = false;
                let completion = conn.completion.take();
                let peer = conn.peer;
                self.idle.release(key);
                tracing::debug!(%key, %peer, "connected");
                if let Some(Completion::Connect { mailbox }) = completion {
                    if let Some(mb) = mailbox {
                        mb.try_post(Response::Connected);
                    }
                }
                self.wake_for_reposts();
            },
            Ok(Some(err)) | Err(err) => {
                tracing::warn!(error = %err, "connect failed");
                let completion = self.connections[key].completion.take();
                self.close_connection(key);
                if let Some(Completion::Connect { mailbox }) = completion {
                    if let Some(mb) = mailbox {
                        mb.try_post(Response::Error(MemcacheError::Connect(err.to_string())));
                    }
                }
            },
        }
    }

    fn try_flush(&mut self, key: usize) {
        loop {
            let conn = &mut self.connections[key];
            if conn.write_complete() {
                break;
            }
            match conn.stream.write(&conn.write_buf[conn.written..]) {
                Ok(0) => {
                    self.fail_inflight(key, MemcacheError::Connect("connection closed while writing".into()));
                    return;
                },
                Ok(n) => {
                    conn.written += n;
                },
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if !conn.writable_registered {
                        let token = Token(key + 1);
                        let _ = self.poll.registry().reregister(
                            &mut conn.stream,
                            token,
                            Interest::READABLE | Interest::WRITABLE,
                        );
                        conn.writable_registered = true;
                    }
                    return;
                },
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.fail_inflight(key, MemcacheError::Protocol(e.to_string()));
                    return;
                },
            }
        }
        let conn = &mut self.connections[key];
        if conn.writable_registered {
            let token = Token(key + 1);
            let _ = self.poll.registry().reregister(&mut conn.stream, token, Interest::READABLE);
            conn.writable_registered = false;
        }
    }

    fn handle_readable(&mut self, key: usize) {
        if !self.connections.contains(key) || self.connections[key].state != ConnState::InFlight {
            return;
        }
        let mut buf = [0u8; 4096];
        loop {
            let read = self.connections[key].stream.read(&mut buf);
            match read {
                Ok(0) => {
                    self.fail_inflight(key, MemcacheError::Protocol("connection closed by server".into()));
                    return;
                },
                Ok(n) => {
                    let parsed = self.connections[key].parser.as_mut().expect("armed parser").feed(&buf[..n]);
                    match parsed {
                        Ok(Some(parsed)) => {
                            self.complete_inflight(key, Ok(parsed));
                            return;
                        },
                        Ok(None) => continue,
                        Err(e) => {
                            self.complete_inflight(key, Err(e));
                            return;
                        },
                    }
                },
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.fail_inflight(key, MemcacheError::Protocol(e.to_string()));
                    return;
                },
            }
        }
    }

    fn fail_inflight(&mut self, key: usize, err: MemcacheError) {
        self.complete_inflight(key, Err(err));
    }

    /// Delivers a completed (or errored) response for the in-flight
    /// operation on `key` and returns the connection to the idle pool.
    /// Fires at most once per request, matching the completion contract in
    /// §4.5: success and protocol error alike release the connection, they
    /// never close it (see the Open Question recorded in `DESIGN.md`).
    fn complete_inflight(&mut self, key: usize, result: Result<Parsed, MemcacheError>) {
        if !self.connections.contains(key) {
            return;
        }
        let conn = &mut self.connections[key];
        conn.state = ConnState::Idle;
        conn.parser = None;
        conn.write_buf.clear();
        conn.written = 0;
        let completion = conn.completion.take();
        self.idle.release(key);

        let response = match result {
            Ok(Parsed::Get(value)) => Response::Getted(value),
            Ok(Parsed::Set) => Response::Setted,
            Err(e) => {
                tracing::warn!(error = %e, "protocol error from server");
                Response::Error(e)
            },
        };
        if let Some(completion) = completion {
            let mailbox = match completion {
                Completion::Get { mailbox } | Completion::Set { mailbox } => mailbox,
                Completion::Connect { mailbox } => {
                    tracing::error!("connect completion reached the request completion path");
                    mailbox
                },
            };
            if let Some(mb) = mailbox {
                mb.try_post(response);
            }
        }
        self.wake_for_reposts();
    }

    fn close_connection(&mut self, key: usize) {
        if self.connections.contains(key) {
            let mut conn = self.connections.remove(key);
            let _ = self.poll.registry().deregister(&mut conn.stream);
        }
    }

    /// Re-signals the notifier after a connection is released so any work
    /// item sitting reposted at the head of the queue (because the pool was
    /// empty when it was last drawn) gets retried on the next wake.
    fn wake_for_reposts(&self) {
        self.queue.wake();
    }

    fn begin_shutdown(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        tracing::info!("loop shutting down");
        let keys: Vec<usize> = self.connections.iter().map(|(k, _)| k).collect();
        for key in keys {
            let completion = self.connections[key].completion.take();
            if let Some(completion) = completion {
                let mailbox = match completion {
                    Completion::Connect { mailbox }
                    | Completion::Get { mailbox }
                    | Completion::Set { mailbox } => mailbox,
                };
                if let Some(mb) = mailbox {
                    mb.try_post(Response::Error(MemcacheError::Stopped));
                }
            }
            let mut conn = self.connections.remove(key);
            let _ = self.poll.registry().deregister(&mut conn.stream);
        }
        self.idle = IdlePool::new();

        let queue = Arc::clone(&self.queue);
        queue.drain_and_dispatch(|item| {
            if let Some(mb) = item.mailbox {
                mb.try_post(Response::Stopped);
            }
            None
        });
    }
}
