// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! fhEVM network presets.

use alloy::primitives::{address, Address};

use super::contract::ChainError;

/// Addresses of the fhEVM system contracts on a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FhevmContracts {
    pub acl: Address,
    pub executor: Address,
    pub kms_verifier: Address,
    pub gateway: Address,
}

/// fhEVM network configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    pub chain_id: u64,
    /// RPC endpoint URL
    pub rpc_url: &'static str,
    /// Decryption gateway / relayer URL
    pub gateway_url: &'static str,
    /// Block explorer URL
    pub explorer_url: &'static str,
    /// System contracts, when known for this network.
    pub system_contracts: Option<FhevmContracts>,
}

/// Zama Ethereum devnet.
pub const ZAMA_DEVNET: NetworkConfig = NetworkConfig {
    name: "Zama Ethereum Devnet",
    chain_id: 8009,
    rpc_url: "https://devnet.zama.ai",
    gateway_url: "https://gateway.devnet.zama.ai",
    explorer_url: "https://explorer.devnet.zama.ai",
    system_contracts: Some(FhevmContracts {
        acl: address!("339EcE85B9E11a3A3AA557582784a15d7F82AAf2"),
        executor: address!("687408ab54661ba0b4aef3a44156c616c6955e07"),
        kms_verifier: address!("208De73316E44722e16f6dDFF40881A3e4F86104"),
        gateway: address!("33347831500F1e73f0ccCBb95c9f86B94d7b1123"),
    }),
};

/// Ethereum Sepolia with the Zama fhEVM coprocessor.
pub const SEPOLIA: NetworkConfig = NetworkConfig {
    name: "Sepolia",
    chain_id: 11155111,
    rpc_url: "https://rpc.sepolia.org",
    gateway_url: "https://gateway.sepolia.zama.ai",
    explorer_url: "https://sepolia.etherscan.io",
    system_contracts: None,
};

pub const NETWORK_ZAMA_DEVNET: &str = "zama-devnet";
pub const NETWORK_SEPOLIA: &str = "sepolia";

/// Resolve a network preset by name. Defaults to the Zama devnet.
pub fn network_by_name(raw: Option<&str>) -> Result<NetworkConfig, ChainError> {
    let value = raw.unwrap_or(NETWORK_ZAMA_DEVNET).trim().to_ascii_lowercase();
    match value.as_str() {
        NETWORK_ZAMA_DEVNET | "zama" | "devnet" => Ok(ZAMA_DEVNET),
        NETWORK_SEPOLIA => Ok(SEPOLIA),
        other => Err(ChainError::UnknownNetwork(other.to_string())),
    }
}

impl NetworkConfig {
    /// Explorer link for a transaction hash.
    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url.trim_end_matches('/'), tx_hash)
    }
}
