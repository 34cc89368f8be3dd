//! steemrpc-chains: static registry of known Steem-family networks.
//!
//! Each entry is keyed by the core asset symbol a node reports in the
//! `current_supply` field of `get_dynamic_global_properties`.
//!
//! # Quick start
//! ```rust
//! let steem = steemrpc_chains::by_symbol("STEEM").unwrap();
//! assert_eq!(steem.prefix, "STM");
//! ```

use serde::Serialize;

/// Network parameters of a single chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChainParams {
    /// Hex-encoded chain id used when signing transactions.
    pub chain_id: &'static str,
    /// Public key / address prefix (e.g. `"STM"`).
    pub prefix: &'static str,
    /// Symbol of the core liquid asset.
    pub steem_symbol: &'static str,
    /// Symbol of the debt asset.
    pub sbd_symbol: &'static str,
    /// Symbol of the vesting share asset.
    pub vests_symbol: &'static str,
}

/// All chains the client can identify, keyed by supply symbol.
pub const KNOWN_CHAINS: &[(&str, ChainParams)] = &[
    (
        "STEEM",
        ChainParams {
            chain_id: "0000000000000000000000000000000000000000000000000000000000000000",
            prefix: "STM",
            steem_symbol: "STEEM",
            sbd_symbol: "SBD",
            vests_symbol: "VESTS",
        },
    ),
    (
        "GOLOS",
        ChainParams {
            chain_id: "782a3039b478c839e4cb0c941ff4eaeb7df40bdd68bd441afd444b9da763de12",
            prefix: "GLS",
            steem_symbol: "GOLOS",
            sbd_symbol: "GBG",
            vests_symbol: "GESTS",
        },
    ),
    (
        "VIT",
        ChainParams {
            chain_id: "73f14dd4b7b07a8663be9d84300de0f65ef2ee7e27aae32bbe911c548c08f000",
            prefix: "VIT",
            steem_symbol: "VIT",
            sbd_symbol: "VBD",
            vests_symbol: "VESTS",
        },
    ),
    (
        "WIT",
        ChainParams {
            chain_id: "1d50f6bcf387a5af6ebac42146ef920aedb5cc61d8f8ed37fb1ac671d722a302",
            prefix: "WIT",
            steem_symbol: "WIT",
            sbd_symbol: "WBD",
            vests_symbol: "VESTS",
        },
    ),
    (
        "TEST",
        ChainParams {
            chain_id: "18dcf0a285365fc58b71f18b3d3fec954aa0c141c44e4e5cb4cf777b9eab274e",
            prefix: "TST",
            steem_symbol: "CORE",
            sbd_symbol: "TEST",
            vests_symbol: "CESTS",
        },
    ),
];

/// Look up a chain by the symbol reported in `current_supply`.
pub fn by_symbol(symbol: &str) -> Option<&'static ChainParams> {
    KNOWN_CHAINS
        .iter()
        .find(|(key, _)| *key == symbol)
        .map(|(_, params)| params)
}

/// Iterate over every registered `(symbol, params)` pair.
pub fn all() -> impl Iterator<Item = (&'static str, &'static ChainParams)> {
    KNOWN_CHAINS.iter().map(|(key, params)| (*key, params))
}
