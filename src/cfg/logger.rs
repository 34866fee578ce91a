// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt};

/// Installs a process-global `tracing` subscriber honoring `RUST_LOG`
/// (falling back to `level` when unset).
///
/// This is a convenience for binaries embedding the client (the demo and
/// the integration tests call it); library code never calls this itself,
/// a library must never install a global subscriber on a caller's behalf.
pub fn init_logger(level: &str) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("failed to build tracing env filter")?;

    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}
