// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wardend` configuration, from flags or environment.

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "wardend", about = "warden coordination service daemon", version)]
pub struct ServerConfig {
    /// Address to listen on for client connections
    #[arg(long, default_value = "127.0.0.1:7700", env = "WARDEN_LISTEN")]
    pub listen: String,

    /// Numeric id of this node within the cluster
    #[arg(long, default_value_t = 1, env = "WARDEN_NODE_ID")]
    pub node_id: u64,

    /// Peer addresses, comma separated
    #[arg(long, value_delimiter = ',', env = "WARDEN_PEERS")]
    pub peers: Vec<String>,

    /// Join an existing cluster instead of bootstrapping one
    #[arg(long)]
    pub join: bool,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
