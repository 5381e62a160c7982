use crate::models::{
    Aat, ApplicationParameters, NetworkApplication, PocketAccount, StakingStatus,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error("pocket network request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("pocket network rejected the request: {0}")]
    Rejected(String),
}

/// The account directory: everything we ask the Pocket network service for.
///
/// Split out as a trait so the service can be exercised against a mock.
/// Every call crosses the wire and may fail.
pub trait PocketNetwork {
    fn create_account(
        &self,
        passphrase: &str,
    ) -> impl Future<Output = Result<PocketAccount, NetworkError>> + Send;

    fn import_account(
        &self,
        private_key: &str,
        passphrase: &str,
    ) -> impl Future<Output = Result<PocketAccount, NetworkError>> + Send;

    fn get_application(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<NetworkApplication, NetworkError>> + Send;

    fn get_applications(
        &self,
        status: StakingStatus,
    ) -> impl Future<Output = Result<Vec<NetworkApplication>, NetworkError>> + Send;

    fn get_application_parameters(
        &self,
    ) -> impl Future<Output = Result<ApplicationParameters, NetworkError>> + Send;

    fn get_application_authentication_token(
        &self,
        client_public_key: &str,
        account: &PocketAccount,
        passphrase: &str,
    ) -> impl Future<Output = Result<Aat, NetworkError>> + Send;

    fn stake_application(
        &self,
        account: &PocketAccount,
        passphrase: &str,
        stake_amount: &str,
        chains: &[String],
    ) -> impl Future<Output = Result<(), NetworkError>> + Send;

    fn unstake_application(
        &self,
        account: &PocketAccount,
        passphrase: &str,
    ) -> impl Future<Output = Result<(), NetworkError>> + Send;

    fn get_free_tier_account(
        &self,
        passphrase: &str,
    ) -> impl Future<Output = Result<PocketAccount, NetworkError>> + Send;
}

/// Wire shape of an application as the network service reports it. Status
/// comes over as the numeric code.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireApplication {
    address: String,
    public_key: String,
    staked_tokens: String,
    max_relays: String,
    status: u8,
    chains: Vec<String>,
    #[serde(default)]
    jailed: bool,
}

impl WireApplication {
    fn into_network_application(self) -> Result<NetworkApplication, NetworkError> {
        let status = StakingStatus::from_code(self.status).ok_or_else(|| {
            NetworkError::Rejected(format!("unknown staking status code {}", self.status))
        })?;
        Ok(NetworkApplication {
            address: self.address,
            public_key: self.public_key,
            staked_tokens: self.staked_tokens,
            max_relays: self.max_relays,
            status,
            chains: self.chains,
            jailed: self.jailed,
        })
    }
}

#[derive(Debug, Deserialize)]
struct WireApplicationPage {
    applications: Vec<WireApplication>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTx {
    #[allow(dead_code)]
    tx_hash: String,
}

/// HTTP implementation of the account directory, talking JSON to the
/// Pocket network gateway.
#[derive(Clone)]
pub struct HttpPocketClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPocketClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<HttpPocketClient, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(HttpPocketClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, NetworkError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client.post(&url).json(body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(NetworkError::Rejected(format!("{status} on {path}: {detail}")));
        }

        Ok(response.json().await?)
    }
}

impl PocketNetwork for HttpPocketClient {
    async fn create_account(&self, passphrase: &str) -> Result<PocketAccount, NetworkError> {
        self.post_json("/v1/accounts", &json!({ "passphrase": passphrase }))
            .await
    }

    async fn import_account(
        &self,
        private_key: &str,
        passphrase: &str,
    ) -> Result<PocketAccount, NetworkError> {
        self.post_json(
            "/v1/accounts/import",
            &json!({ "privateKey": private_key, "passphrase": passphrase }),
        )
        .await
    }

    async fn get_application(&self, address: &str) -> Result<NetworkApplication, NetworkError> {
        let wire: WireApplication = self
            .post_json("/v1/query/app", &json!({ "address": address }))
            .await?;
        wire.into_network_application()
    }

    async fn get_applications(
        &self,
        status: StakingStatus,
    ) -> Result<Vec<NetworkApplication>, NetworkError> {
        let page: WireApplicationPage = self
            .post_json("/v1/query/apps", &json!({ "stakingStatus": status.code() }))
            .await?;
        page.applications
            .into_iter()
            .map(WireApplication::into_network_application)
            .collect()
    }

    async fn get_application_parameters(&self) -> Result<ApplicationParameters, NetworkError> {
        self.post_json("/v1/query/appparams", &json!({})).await
    }

    async fn get_application_authentication_token(
        &self,
        client_public_key: &str,
        account: &PocketAccount,
        passphrase: &str,
    ) -> Result<Aat, NetworkError> {
        self.post_json(
            "/v1/aat",
            &json!({
                "clientPublicKey": client_public_key,
                "applicationAddress": account.address,
                "passphrase": passphrase,
            }),
        )
        .await
    }

    async fn stake_application(
        &self,
        account: &PocketAccount,
        passphrase: &str,
        stake_amount: &str,
        chains: &[String],
    ) -> Result<(), NetworkError> {
        let _tx: WireTx = self
            .post_json(
                "/v1/apps/stake",
                &json!({
                    "address": account.address,
                    "passphrase": passphrase,
                    "amount": stake_amount,
                    "chains": chains,
                }),
            )
            .await?;
        Ok(())
    }

    async fn unstake_application(
        &self,
        account: &PocketAccount,
        passphrase: &str,
    ) -> Result<(), NetworkError> {
        let _tx: WireTx = self
            .post_json(
                "/v1/apps/unstake",
                &json!({ "address": account.address, "passphrase": passphrase }),
            )
            .await?;
        Ok(())
    }

    async fn get_free_tier_account(&self, passphrase: &str) -> Result<PocketAccount, NetworkError> {
        self.post_json("/v1/accounts/freetier", &json!({ "passphrase": passphrase }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_application_parses_and_converts() {
        let wire: WireApplication = serde_json::from_value(json!({
            "address": "addr1",
            "publicKey": "pk1",
            "stakedTokens": "15000000",
            "maxRelays": "250000",
            "status": 2,
            "chains": ["0001", "0021"]
        }))
        .unwrap();

        let app = wire.into_network_application().unwrap();
        assert_eq!(app.status, StakingStatus::Staked);
        assert_eq!(app.staked_tokens, "15000000");
        assert!(!app.jailed);
    }

    #[test]
    fn unknown_status_code_is_rejected() {
        let wire = WireApplication {
            address: "addr1".to_string(),
            public_key: "pk1".to_string(),
            staked_tokens: "0".to_string(),
            max_relays: "0".to_string(),
            status: 9,
            chains: vec![],
            jailed: false,
        };
        assert!(matches!(
            wire.into_network_application(),
            Err(NetworkError::Rejected(_))
        ));
    }
}
