// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use anyhow::{Context, Result};
use memcache_loop_rs::{Client, cfg::logger::init_logger};
use tracing::info;

fn main() -> Result<()> {
    init_logger("info")?;

    let host = std::env::var("MEMCACHE_DEMO_HOST").unwrap_or_else(|_| "127.0.0.1".into());
    let port: u16 = std::env::var("MEMCACHE_DEMO_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(11211);

    let client = Client::new(host, port, 5, false).context("failed to start client")?;
    info!("pool warmed up, running check/set/get/close demo");

    client.check().context("check failed")?;
    client.set("demo-key", "demo-value", 0, true).context("set failed")?;

    match client.get("demo-key").context("get failed")? {
        Some(value) => info!(value = %String::from_utf8_lossy(&value), "fetched value"),
        None => info!("key missing after set (unexpected)"),
    }

    client.close().context("close failed")?;
    info!("closed cleanly");
    Ok(())
}
