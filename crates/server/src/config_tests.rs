// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn defaults_are_single_node() {
    let config = ServerConfig::parse_from(["wardend"]);
    assert_eq!(config.listen, "127.0.0.1:7700");
    assert_eq!(config.node_id, 1);
    assert!(config.peers.is_empty());
    assert!(!config.join);
    assert!(!config.verbose);
}

#[test]
fn peers_split_on_commas() {
    let config = ServerConfig::parse_from([
        "wardend",
        "--node-id",
        "2",
        "--peers",
        "n1:7700,n2:7700,n3:7700",
        "--join",
    ]);
    assert_eq!(config.node_id, 2);
    assert_eq!(config.peers, vec!["n1:7700", "n2:7700", "n3:7700"]);
    assert!(config.join);
}
