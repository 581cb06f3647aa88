//! Shared fixtures and collaborator doubles for the account service tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use account_service::{
    AccountRepository, AccountService, AccountServiceConfig, Collaborators, InMemoryAccountRepository,
    InMemoryReferenceLookup, InMemoryTransferGateway, InMemoryUserGateway, TransferGateway,
    UniquenessOracle, UserGateway,
};
use async_trait::async_trait;
use common::decimal::Amount;
use common::error::{Error, Result};
use common::model::account::{Account, AccountIdentifiers, AccountPatch, IdentifierClass};
use common::model::transfer::Transfer;
use common::model::user::{UserId, UserProfile};
use dashmap::DashMap;
use uuid::Uuid;

pub fn user(id: UserId) -> UserProfile {
    UserProfile {
        id,
        name: "Ana".to_string(),
        last_name: "Gómez".to_string(),
        email: format!("user{}@example.com", id),
        phone: None,
        dni: Some(30111222),
        country: Some("Argentina".to_string()),
        city: Some("Córdoba".to_string()),
        last_login: None,
    }
}

pub fn config() -> AccountServiceConfig {
    AccountServiceConfig {
        bank_code: "4748".to_string(),
        cbu_prefix: "28505909".to_string(),
        starting_balance: Amount::ZERO,
        max_generation_attempts: 20,
        gateway_timeout: Duration::from_secs(2),
        ..AccountServiceConfig::default()
    }
}

/// In-memory repository that counts every write
#[derive(Default)]
pub struct CountingRepository {
    pub inner: InMemoryAccountRepository,
    pub inserts: AtomicUsize,
    pub updates: AtomicUsize,
    pub balance_writes: AtomicUsize,
}

impl CountingRepository {
    pub fn writes(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
            + self.updates.load(Ordering::SeqCst)
            + self.balance_writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UniquenessOracle for CountingRepository {
    async fn is_unique(&self, class: IdentifierClass, value: &str) -> Result<bool> {
        self.inner.is_unique(class, value).await
    }
}

#[async_trait]
impl AccountRepository for CountingRepository {
    async fn insert_account(&self, account: &Account) -> Result<()> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert_account(account).await
    }

    async fn apply_patch(&self, id: Uuid, patch: &AccountPatch) -> Result<Account> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.apply_patch(id, patch).await
    }

    async fn update_balance(&self, id: Uuid, balance: Amount) -> Result<()> {
        self.balance_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.update_balance(id, balance).await
    }

    async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        self.inner.get_account(id).await
    }

    async fn get_account_by_user(&self, user_id: UserId) -> Result<Option<Account>> {
        self.inner.get_account_by_user(user_id).await
    }

    async fn user_has_account(&self, user_id: UserId) -> Result<bool> {
        self.inner.user_has_account(user_id).await
    }
}

/// Oracle that rejects every candidate of one class and counts checks per class
pub struct RejectingOracle {
    pub rejected: IdentifierClass,
    pub calls: DashMap<IdentifierClass, usize>,
}

impl RejectingOracle {
    pub fn new(rejected: IdentifierClass) -> Self {
        Self { rejected, calls: DashMap::new() }
    }

    pub fn calls(&self, class: IdentifierClass) -> usize {
        self.calls.get(&class).map(|c| *c).unwrap_or(0)
    }
}

#[async_trait]
impl UniquenessOracle for RejectingOracle {
    async fn is_unique(&self, class: IdentifierClass, _value: &str) -> Result<bool> {
        *self.calls.entry(class).or_insert(0) += 1;
        Ok(class != self.rejected)
    }
}

/// Oracle that reports every candidate as free
pub struct AcceptingOracle;

#[async_trait]
impl UniquenessOracle for AcceptingOracle {
    async fn is_unique(&self, _class: IdentifierClass, _value: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Store whose reads by ID hand back the record, then stall before returning
pub struct SlowReadRepository {
    pub inner: InMemoryAccountRepository,
    pub delay: Duration,
}

#[async_trait]
impl UniquenessOracle for SlowReadRepository {
    async fn is_unique(&self, class: IdentifierClass, value: &str) -> Result<bool> {
        self.inner.is_unique(class, value).await
    }
}

#[async_trait]
impl AccountRepository for SlowReadRepository {
    async fn insert_account(&self, account: &Account) -> Result<()> {
        self.inner.insert_account(account).await
    }

    async fn apply_patch(&self, id: Uuid, patch: &AccountPatch) -> Result<Account> {
        self.inner.apply_patch(id, patch).await
    }

    async fn update_balance(&self, id: Uuid, balance: Amount) -> Result<()> {
        self.inner.update_balance(id, balance).await
    }

    async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        let account = self.inner.get_account(id).await?;
        tokio::time::sleep(self.delay).await;
        Ok(account)
    }

    async fn get_account_by_user(&self, user_id: UserId) -> Result<Option<Account>> {
        self.inner.get_account_by_user(user_id).await
    }

    async fn user_has_account(&self, user_id: UserId) -> Result<bool> {
        self.inner.user_has_account(user_id).await
    }
}

/// Owner of the account that wins every insert race in [`RacingRepository`]
pub const RIVAL_USER: UserId = 9_000;

/// Store where another request claims the candidate CBU between the oracle check and the insert
#[derive(Default)]
pub struct RacingRepository {
    pub inner: InMemoryAccountRepository,
    pub inserts: AtomicUsize,
    pub attempted: Mutex<Option<Account>>,
}

#[async_trait]
impl UniquenessOracle for RacingRepository {
    async fn is_unique(&self, class: IdentifierClass, value: &str) -> Result<bool> {
        self.inner.is_unique(class, value).await
    }
}

#[async_trait]
impl AccountRepository for RacingRepository {
    async fn insert_account(&self, account: &Account) -> Result<()> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        *self.attempted.lock().unwrap() = Some(account.clone());

        let rival = Account::open(
            RIVAL_USER,
            1,
            1,
            AccountIdentifiers {
                account_number: "4748-99999999".to_string(),
                cbu: account.cbu.clone(),
                alias: "rival.rival.rival".to_string(),
            },
            Amount::ZERO,
        );
        self.inner.insert_account(&rival).await?;
        self.inner.insert_account(account).await
    }

    async fn apply_patch(&self, id: Uuid, patch: &AccountPatch) -> Result<Account> {
        self.inner.apply_patch(id, patch).await
    }

    async fn update_balance(&self, id: Uuid, balance: Amount) -> Result<()> {
        self.inner.update_balance(id, balance).await
    }

    async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        self.inner.get_account(id).await
    }

    async fn get_account_by_user(&self, user_id: UserId) -> Result<Option<Account>> {
        self.inner.get_account_by_user(user_id).await
    }

    async fn user_has_account(&self, user_id: UserId) -> Result<bool> {
        self.inner.user_has_account(user_id).await
    }
}

/// User gateway that counts calls before delegating
pub struct CountingUserGateway {
    pub inner: InMemoryUserGateway,
    pub calls: AtomicUsize,
}

#[async_trait]
impl UserGateway for CountingUserGateway {
    async fn get_user_by_id(&self, user_id: UserId) -> Result<Option<UserProfile>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_user_by_id(user_id).await
    }
}

/// User gateway that answers after a delay
pub struct SlowUserGateway {
    pub delay: Duration,
}

#[async_trait]
impl UserGateway for SlowUserGateway {
    async fn get_user_by_id(&self, user_id: UserId) -> Result<Option<UserProfile>> {
        tokio::time::sleep(self.delay).await;
        Ok(Some(user(user_id)))
    }
}

/// Transfer gateway whose service is down
pub struct FailingTransferGateway;

#[async_trait]
impl TransferGateway for FailingTransferGateway {
    async fn get_transfers_by_account(&self, _account_id: Uuid) -> Result<Vec<Transfer>> {
        Err(Error::UpstreamUnavailable("transfer service answered HTTP 503".to_string()))
    }
}

/// Account service over in-memory collaborators, with handles to each of them
pub struct Fixture {
    pub service: AccountService,
    pub store: Arc<CountingRepository>,
    pub users: Arc<InMemoryUserGateway>,
    pub transfers: Arc<InMemoryTransferGateway>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(&config())
    }

    pub fn with_config(config: &AccountServiceConfig) -> Self {
        let store = Arc::new(CountingRepository::default());
        let users = Arc::new(InMemoryUserGateway::new());
        let transfers = Arc::new(InMemoryTransferGateway::new());

        let collaborators = Collaborators::new(
            store.clone(),
            Arc::new(InMemoryReferenceLookup::new()),
            users.clone(),
            transfers.clone(),
        );
        let service = AccountService::new(collaborators, config).unwrap();

        Self { service, store, users, transfers }
    }
}
