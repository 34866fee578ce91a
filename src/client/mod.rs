//! The synchronous, thread-safe client surface (§6) and the machinery
//! behind it: the cross-thread request/response plane, the single-threaded
//! event loop, and the fixed-size connection pool.

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

mod connection;
mod event_loop;
mod mailbox;
mod pool;
mod queue;
mod validate;
mod work;

use std::{sync::Mutex, thread::JoinHandle, time::Duration};

use bytes::Bytes;

use crate::{
    cfg::config::ClientConfig,
    error::{MemcacheError, Result},
    protocol::Response,
};
use work::{WorkItem, WorkKind};

/// A synchronous, thread-safe handle onto a pool of memcached connections
/// driven by one background event-loop thread.
///
/// Every public method blocks the calling thread on a private mailbox; the
/// network I/O itself always happens on the loop thread spawned by
/// [`Client::new`]/[`Client::with_config`]. Cloning is not supported;
/// share a `Client` behind an `Arc` across caller threads instead.
pub struct Client {
    queue: std::sync::Arc<queue::RequestQueue>,
    handle: Mutex<Option<JoinHandle<()>>>,
    config: ClientConfig,
    closed: Mutex<bool>,
}

impl Client {
    /// Constructs a client from positional arguments, sugar over
    /// [`Client::with_config`] (§9a).
    pub fn new(host: impl Into<String>, port: u16, size: usize, debug: bool) -> Result<Self> {
        let config = ClientConfig {
            host: host.into(),
            port,
            pool_size: size,
            debug,
            ..ClientConfig::default()
        };
        Self::with_config(config)
    }

    /// Constructs a client from a fully assembled [`ClientConfig`]. Starts
    /// the loop thread, performs the startup `check`, then opens
    /// `config.pool_size` connections one at a time. If the check times out
    /// or any connection fails, every connection opened so far is torn
    /// down (by stopping the whole loop) and construction fails (§3).
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        config.validate().map_err(|e| MemcacheError::Validation(e.to_string()))?;

        let (handle, queue) =
            event_loop::spawn(config.host.clone(), config.port, config.connect_timeout)
                .map_err(|e| MemcacheError::Internal(format!("failed to start loop thread: {e}")))?;

        let client = Self {
            queue,
            handle: Mutex::new(Some(handle)),
            config,
            closed: Mutex::new(false),
        };

        if let Err(e) = client.bootstrap() {
            let _ = client.close();
            return Err(e);
        }

        Ok(client)
    }

    fn bootstrap(&self) -> Result<()> {
        self.check()?;
        for _ in 0..self.config.pool_size {
            self.connect_once()?;
        }
        tracing::info!(pool_size = self.config.pool_size, "pool warmed up");
        Ok(())
    }

    fn connect_once(&self) -> Result<()> {
        let (tx, rx) = mailbox::channel();
        self.queue.submit(WorkItem::new(WorkKind::Connect, Some(tx)));
        match rx.recv_timeout(self.config.connect_timeout)? {
            Response::Connected => Ok(()),
            Response::Error(e) => Err(e),
            other => Err(unexpected("connect", &other)),
        }
    }

    /// Round-trip through the loop; succeeds iff the loop is running.
    pub fn check(&self) -> Result<()> {
        self.ensure_open()?;
        let (tx, rx) = mailbox::channel();
        self.queue.submit(WorkItem::new(WorkKind::Check, Some(tx)));
        match rx.recv_timeout(self.config.connect_timeout)? {
            Response::Checked => Ok(()),
            Response::Error(e) => Err(e),
            Response::Stopped => Err(MemcacheError::Stopped),
            other => Err(unexpected("check", &other)),
        }
    }

    /// Fetches `key`. Returns `Ok(None)` for a miss, never an error.
    pub fn get(&self, key: &str) -> Result<Option<Bytes>> {
        self.ensure_open()?;
        validate::validate_key(key)?;
        let (tx, rx) = mailbox::channel();
        self.queue.submit(WorkItem::new(WorkKind::Get { key: key.to_string() }, Some(tx)));
        match rx.recv_timeout(self.config.op_timeout)? {
            Response::Getted(value) => Ok(value),
            Response::Error(e) => Err(e),
            Response::Stopped => Err(MemcacheError::Stopped),
            other => Err(unexpected("get", &other)),
        }
    }

    /// Stores `key` → `value`. If `wait`, blocks for `setted` (or an
    /// error); otherwise submits and returns immediately, discarding the
    /// eventual response.
    pub fn set(&self, key: &str, value: impl Into<Bytes>, expiration: u32, wait: bool) -> Result<()> {
        self.ensure_open()?;
        validate::validate_key(key)?;
        let value = value.into();
        validate::validate_value(&value)?;

        if !wait {
            self.queue.submit(WorkItem::new(
                WorkKind::Set { key: key.to_string(), value, expiration },
                None,
            ));
            return Ok(());
        }

        let (tx, rx) = mailbox::channel();
        self.queue.submit(WorkItem::new(
            WorkKind::Set { key: key.to_string(), value, expiration },
            Some(tx),
        ));
        match rx.recv_timeout(self.config.op_timeout)? {
            Response::Setted => Ok(()),
            Response::Error(e) => Err(e),
            Response::Stopped => Err(MemcacheError::Stopped),
            other => Err(unexpected("set", &other)),
        }
    }

    /// Idempotent. Sends `stop`, waits for the loop to acknowledge it, and
    /// (unless `debug` is set, see §9b) joins the loop thread.
    pub fn close(&self) -> Result<()> {
        {
            let mut closed = self.closed.lock().unwrap_or_else(|e| e.into_inner());
            if *closed {
                return Ok(());
            }
            *closed = true;
        }

        let (tx, rx) = mailbox::channel();
        self.queue.submit(WorkItem::new(WorkKind::Stop, Some(tx)));
        // Best-effort: if the loop is already gone the wait simply times
        // out and we still proceed to join below.
        let _ = rx.recv_timeout(self.config.op_timeout);

        if !self.config.debug {
            if let Some(handle) = self.handle.lock().unwrap_or_else(|e| e.into_inner()).take() {
                let _ = handle.join();
            }
        }
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if *self.closed.lock().unwrap_or_else(|e| e.into_inner()) {
            return Err(MemcacheError::Stopped);
        }
        Ok(())
    }

    /// The operation timeout this client was built with, mostly useful for
    /// tests that want to wait slightly longer than the client itself
    /// would before giving up.
    pub fn op_timeout(&self) -> Duration {
        self.config.op_timeout
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        let already_closed = *self.closed.lock().unwrap_or_else(|e| e.into_inner());
        if !already_closed {
            let pending = self.queue.len();
            if pending > 0 {
                tracing::warn!(pending, "client dropped with outstanding requests");
            }
            let _ = self.close();
        }
    }
}

fn unexpected(op: &str, response: &Response) -> MemcacheError {
    MemcacheError::Internal(format!("unexpected response to {op}: {response:?}"))
}
