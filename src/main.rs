// Copyright (c) 2026 MXP contributors
//
// SPDX-License-Identifier: MIT
mod cli;
mod config;
mod demo;

use clap::Parser;
use cli::Cli;
use mxp_signaling::MemoryHub;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = config::Config::load(cli.config.as_deref())?;
    let peer_config = config.to_peer_config(cli.local_id.clone());

    let hub = MemoryHub::new();
    demo::run(&cli.local_id, &cli.remote_id, &cli.message, peer_config, hub).await
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "mxp=debug" } else { "mxp=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::registry().with(fmt::layer().with_target(false)).with(filter).try_init();
}
