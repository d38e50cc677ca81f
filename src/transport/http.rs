use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::common::ClientError;
use crate::config::{PROBE_TIMEOUT, REQUEST_TIMEOUT};
use crate::protocol::{
    AttackInit, AttackOrder, FleetSubmission, PeerHealth, ATTACK_INIT, ATTACK_SEND,
    ATTACK_STATUS, DEFENSE_SETUP, DEFENSE_STATUS, HEALTH,
};
use crate::status::{AttackStatus, DefenseStatus};
use crate::transport::EngineApi;

/// JSON-over-HTTP client for the local engine.
#[derive(Clone)]
pub struct HttpEngine {
    client: Client,
    base_url: String,
}

impl HttpEngine {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ClientError> {
        let response = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(network_error)?;
        read_json(response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(network_error)?;
        read_json(response).await
    }
}

fn network_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Network(format!("request timed out: {}", err))
    } else {
        ClientError::Network(err.to_string())
    }
}

/// Decode a success body, or turn a failure status into an error carrying
/// whatever text the server sent.
async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.text().await.map_err(network_error)?;
    if !status.is_success() {
        return Err(ClientError::http(status.as_u16(), body));
    }
    Ok(serde_json::from_str(&body)?)
}

#[async_trait::async_trait]
impl EngineApi for HttpEngine {
    async fn setup_fleet(&self, submission: &FleetSubmission) -> Result<(), ClientError> {
        let ack: serde_json::Value = self.post_json(DEFENSE_SETUP, submission).await?;
        log::debug!("Fleet setup acknowledged: {}", ack);
        Ok(())
    }

    async fn defense_status(&self, game_id: &str) -> Result<DefenseStatus, ClientError> {
        self.get_json(DEFENSE_STATUS, &[("game_id", game_id)]).await
    }

    async fn init_attack(&self, game_id: &str) -> Result<(), ClientError> {
        let body = AttackInit {
            game_id: game_id.to_string(),
        };
        let ack: serde_json::Value = self.post_json(ATTACK_INIT, &body).await?;
        log::debug!("Attack game initialised: {}", ack);
        Ok(())
    }

    async fn send_attack(&self, order: &AttackOrder) -> Result<serde_json::Value, ClientError> {
        self.post_json(ATTACK_SEND, order).await
    }

    async fn attack_status(&self, game_id: &str) -> Result<AttackStatus, ClientError> {
        self.get_json(ATTACK_STATUS, &[("game_id", game_id)]).await
    }

    async fn probe_peer(&self, host: &str, port: u16) -> PeerHealth {
        let url = format!("http://{}:{}{}", host, port, HEALTH);
        match self.client.get(&url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) if response.status().is_success() => PeerHealth::Healthy,
            Ok(response) => PeerHealth::ErrorStatus(response.status().as_u16()),
            Err(e) => PeerHealth::Unreachable(e.to_string()),
        }
    }
}
