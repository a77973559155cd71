// Copyright (c) 2026 MXP contributors
//
// SPDX-License-Identifier: MIT
use clap::Parser;

/// Two-peer chat demo exercising the MXP agent-to-agent protocol end to end,
/// over an in-memory signaling hub and an in-memory datagram-channel test
/// double rather than a real ICE/SDP stack.
#[derive(Parser, Debug)]
#[command(name = "mxp", version, about)]
pub struct Cli {
    /// This peer's local id, used on both the signaling hub and as the MXP
    /// peer id.
    #[arg(long, default_value = "alice")]
    pub local_id: String,

    /// The remote peer id to connect to and chat with.
    #[arg(long, default_value = "bob")]
    pub remote_id: String,

    /// The message text to send once connected.
    #[arg(long, default_value = "Hello from the MXP chat demo!")]
    pub message: String,

    /// Path to a TOML config file overriding the peer defaults (heartbeat
    /// interval, connection timeout, channel mode).
    #[arg(long, short = 'c')]
    pub config: Option<std::path::PathBuf>,

    /// Increase log verbosity (equivalent to RUST_LOG=mxp=debug).
    #[arg(long, short = 'v')]
    pub verbose: bool,
}
