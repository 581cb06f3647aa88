//! Gateways to the user and transfer services

use std::time::Duration;

use async_trait::async_trait;
use common::error::{Error, Result};
use common::model::transfer::Transfer;
use common::model::user::{UserId, UserProfile};
use dashmap::DashMap;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

/// Fetches user profiles from the user service
#[async_trait]
pub trait UserGateway: Send + Sync {
    /// `None` when the user service does not know the user
    async fn get_user_by_id(&self, user_id: UserId) -> Result<Option<UserProfile>>;
}

/// Fetches transfer history from the transfer service
#[async_trait]
pub trait TransferGateway: Send + Sync {
    /// Transfers touching the account; empty when there are none
    async fn get_transfers_by_account(&self, account_id: Uuid) -> Result<Vec<Transfer>>;
}

fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::ConfigurationError(format!("Failed to build HTTP client: {}", e)))
}

fn upstream(service: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::UpstreamUnavailable(format!("{} timed out", service))
    } else {
        Error::UpstreamUnavailable(format!("{}: {}", service, err))
    }
}

/// GET `url`, decoding the body; `Ok(None)` on 404
async fn get_json<T: DeserializeOwned>(client: &Client, service: &str, url: &str) -> Result<Option<T>> {
    debug!("GET {}", url);

    let response = client.get(url).send().await.map_err(|e| upstream(service, e))?;

    if response.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !response.status().is_success() {
        return Err(Error::UpstreamUnavailable(format!(
            "{} answered HTTP {}",
            service,
            response.status()
        )));
    }

    let body = response.json::<T>().await.map_err(|e| upstream(service, e))?;
    Ok(Some(body))
}

/// User service over HTTP
pub struct HttpUserGateway {
    client: Client,
    base_url: String,
}

impl HttpUserGateway {
    /// # Arguments
    /// * `base_url` - Base URL of the user service (e.g. "http://localhost:5170")
    /// * `timeout` - Deadline for each request
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl UserGateway for HttpUserGateway {
    async fn get_user_by_id(&self, user_id: UserId) -> Result<Option<UserProfile>> {
        let url = format!("{}/api/User/{}", self.base_url, user_id);
        get_json(&self.client, "user service", &url).await
    }
}

/// Transfer service over HTTP
pub struct HttpTransferGateway {
    client: Client,
    base_url: String,
}

impl HttpTransferGateway {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl TransferGateway for HttpTransferGateway {
    async fn get_transfers_by_account(&self, account_id: Uuid) -> Result<Vec<Transfer>> {
        let url = format!("{}/api/Transfer/{}", self.base_url, account_id);
        let transfers: Option<Vec<Transfer>> = get_json(&self.client, "transfer service", &url).await?;
        Ok(transfers.unwrap_or_default())
    }
}

/// In-memory user directory
#[derive(Default)]
pub struct InMemoryUserGateway {
    pub users: DashMap<UserId, UserProfile>,
}

impl InMemoryUserGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: UserProfile) {
        self.users.insert(user.id, user);
    }
}

#[async_trait]
impl UserGateway for InMemoryUserGateway {
    async fn get_user_by_id(&self, user_id: UserId) -> Result<Option<UserProfile>> {
        Ok(self.users.get(&user_id).map(|u| u.clone()))
    }
}

/// In-memory transfer history
#[derive(Default)]
pub struct InMemoryTransferGateway {
    pub transfers: DashMap<Uuid, Vec<Transfer>>,
}

impl InMemoryTransferGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, account_id: Uuid, transfer: Transfer) {
        self.transfers.entry(account_id).or_default().push(transfer);
    }
}

#[async_trait]
impl TransferGateway for InMemoryTransferGateway {
    async fn get_transfers_by_account(&self, account_id: Uuid) -> Result<Vec<Transfer>> {
        Ok(self
            .transfers
            .get(&account_id)
            .map(|t| t.clone())
            .unwrap_or_default())
    }
}
