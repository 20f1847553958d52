// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client-side input encryption strategies.
//!
//! The strategy is picked once when a client is built:
//!
//! - [`SimulatedEncryptor`] registers values with an in-process
//!   [`MockCoprocessor`]; used for demos and tests.
//! - [`RelayerEncryptor`] asks a remote relayer over HTTPS for a handle and
//!   input proof (`POST {relayer}/v1/fhe/inputs`).

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use reqwest::Client;
use url::Url;

use super::{EncryptedInput, FheError, InputRegistrationRequest, MockCoprocessor};

/// Default relayer request timeout.
const RELAYER_TIMEOUT: Duration = Duration::from_secs(15);

/// Turns a plaintext `u64` into a ciphertext handle plus input proof bound
/// to `(contract, submitter)`.
pub trait InputEncryptor: Send + Sync {
    /// Whether the backend can encrypt right now.
    fn is_ready(&self) -> bool;

    fn encrypt_u64(
        &self,
        value: u64,
        contract: Address,
        submitter: Address,
    ) -> impl Future<Output = Result<EncryptedInput, FheError>> + Send;
}

/// Encrypts against an in-process mock coprocessor.
#[derive(Clone)]
pub struct SimulatedEncryptor {
    coprocessor: Arc<MockCoprocessor>,
}

impl SimulatedEncryptor {
    pub fn new(coprocessor: Arc<MockCoprocessor>) -> Self {
        Self { coprocessor }
    }
}

impl InputEncryptor for SimulatedEncryptor {
    fn is_ready(&self) -> bool {
        true
    }

    async fn encrypt_u64(
        &self,
        value: u64,
        contract: Address,
        submitter: Address,
    ) -> Result<EncryptedInput, FheError> {
        Ok(self.coprocessor.encrypt_input(value, contract, submitter))
    }
}

/// Encrypts through a remote relayer.
#[derive(Clone)]
pub struct RelayerEncryptor {
    base_url: Url,
    client: Client,
}

impl RelayerEncryptor {
    /// Build a relayer client without contacting it.
    pub fn new(base_url: &str) -> Result<Self, FheError> {
        let base_url =
            Url::parse(base_url).map_err(|e| FheError::InvalidRelayerUrl(e.to_string()))?;
        let client = Client::builder()
            .timeout(RELAYER_TIMEOUT)
            .build()
            .map_err(|e| FheError::Relayer(e.to_string()))?;
        Ok(Self { base_url, client })
    }

    /// Build a relayer client and check that it answers its liveness check.
    pub async fn connect(base_url: &str) -> Result<Self, FheError> {
        let relayer = Self::new(base_url)?;
        let url = relayer.endpoint("health/live")?;
        let response = relayer
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FheError::Relayer(format!("liveness check failed: {e}")))?;

        if !response.status().is_success() {
            return Err(FheError::Relayer(format!(
                "liveness check returned {}",
                response.status()
            )));
        }

        tracing::info!(relayer = %relayer.base_url, "Connected to FHE relayer");
        Ok(relayer)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, FheError> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        base.join(path)
            .map_err(|e| FheError::InvalidRelayerUrl(e.to_string()))
    }
}

impl InputEncryptor for RelayerEncryptor {
    fn is_ready(&self) -> bool {
        true
    }

    async fn encrypt_u64(
        &self,
        value: u64,
        contract: Address,
        submitter: Address,
    ) -> Result<EncryptedInput, FheError> {
        let url = self.endpoint("v1/fhe/inputs")?;
        let body = InputRegistrationRequest {
            value,
            contract_address: Some(contract),
            submitter,
        };

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| FheError::Relayer(format!("input request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(FheError::Relayer(format!(
                "input request returned {status}: {text}"
            )));
        }

        response
            .json::<EncryptedInput>()
            .await
            .map_err(|e| FheError::Relayer(format!("invalid input response: {e}")))
    }
}

/// The encryption backend selected at construction time.
#[derive(Clone)]
pub enum EncryptionStrategy {
    Simulated(SimulatedEncryptor),
    Relayer(RelayerEncryptor),
}

impl EncryptionStrategy {
    pub fn simulated(coprocessor: Arc<MockCoprocessor>) -> Self {
        EncryptionStrategy::Simulated(SimulatedEncryptor::new(coprocessor))
    }

    pub async fn relayer(base_url: &str) -> Result<Self, FheError> {
        Ok(EncryptionStrategy::Relayer(
            RelayerEncryptor::connect(base_url).await?,
        ))
    }

    pub fn name(&self) -> &'static str {
        match self {
            EncryptionStrategy::Simulated(_) => "simulated",
            EncryptionStrategy::Relayer(_) => "relayer",
        }
    }
}

impl InputEncryptor for EncryptionStrategy {
    fn is_ready(&self) -> bool {
        match self {
            EncryptionStrategy::Simulated(inner) => inner.is_ready(),
            EncryptionStrategy::Relayer(inner) => inner.is_ready(),
        }
    }

    async fn encrypt_u64(
        &self,
        value: u64,
        contract: Address,
        submitter: Address,
    ) -> Result<EncryptedInput, FheError> {
        match self {
            EncryptionStrategy::Simulated(inner) => {
                inner.encrypt_u64(value, contract, submitter).await
            }
            EncryptionStrategy::Relayer(inner) => {
                inner.encrypt_u64(value, contract, submitter).await
            }
        }
    }
}
