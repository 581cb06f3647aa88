//! Account service implementation
//!
//! [`AccountService`] is the entry point used by request handlers. It wires
//! the three services that do the work:
//! - [`ProvisioningService`] opens accounts
//! - [`AggregationService`] reads accounts joined with user and transfer data
//! - [`LifecycleService`] applies updates, balance writes and disabling

mod aggregation;
mod lifecycle;
mod provisioning;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use common::db::DbPool;
use common::decimal::Amount;
use common::error::{Error, Result};
use common::model::account::{AccountPatch, ReferenceId};
use common::model::reference::{ReferenceCategory, ReferenceEntry};
use common::model::user::UserId;
use common::model::view::{AccountDetailView, AccountView, ReferenceNames};
use tracing::info;
use uuid::Uuid;

pub use aggregation::AggregationService;
pub use lifecycle::LifecycleService;
pub use provisioning::ProvisioningService;

use crate::config::AccountServiceConfig;
use crate::gateway::{
    HttpTransferGateway, HttpUserGateway, InMemoryTransferGateway, InMemoryUserGateway,
    TransferGateway, UserGateway,
};
use crate::generator::{IdentifierGenerator, UniquenessOracle};
use crate::reference::{InMemoryReferenceLookup, PostgresReferenceLookup, ReferenceLookup};
use crate::repository::{AccountRepository, InMemoryAccountRepository, PostgresAccountRepository};

/// External collaborators the services depend on
#[derive(Clone)]
pub struct Collaborators {
    pub repo: Arc<dyn AccountRepository>,
    pub oracle: Arc<dyn UniquenessOracle>,
    pub references: Arc<dyn ReferenceLookup>,
    pub users: Arc<dyn UserGateway>,
    pub transfers: Arc<dyn TransferGateway>,
}

impl Collaborators {
    /// Use one store as both account repository and uniqueness oracle
    pub fn new<R>(
        store: Arc<R>,
        references: Arc<dyn ReferenceLookup>,
        users: Arc<dyn UserGateway>,
        transfers: Arc<dyn TransferGateway>,
    ) -> Self
    where
        R: AccountRepository + UniquenessOracle + 'static,
    {
        Self {
            repo: store.clone(),
            oracle: store,
            references,
            users,
            transfers,
        }
    }

    /// Fresh in-memory collaborators with the default reference tables
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryAccountRepository::new()),
            Arc::new(InMemoryReferenceLookup::new()),
            Arc::new(InMemoryUserGateway::new()),
            Arc::new(InMemoryTransferGateway::new()),
        )
    }
}

/// Account service for provisioning and managing wallet accounts
pub struct AccountService {
    provisioning: ProvisioningService,
    aggregation: AggregationService,
    lifecycle: LifecycleService,
    references: Arc<dyn ReferenceLookup>,
}

impl AccountService {
    /// Create a new account service over the given collaborators
    pub fn new(collaborators: Collaborators, config: &AccountServiceConfig) -> Result<Self> {
        let generator = IdentifierGenerator::with_config(collaborators.oracle.clone(), config)?;

        Ok(Self {
            provisioning: ProvisioningService::new(
                collaborators.repo.clone(),
                collaborators.references.clone(),
                generator,
                config.starting_balance,
                config.gateway_timeout,
            ),
            aggregation: AggregationService::new(
                collaborators.repo.clone(),
                collaborators.references.clone(),
                collaborators.users.clone(),
                collaborators.transfers.clone(),
                config.gateway_timeout,
                config.transfer_failure_policy,
            ),
            lifecycle: LifecycleService::new(
                collaborators.repo.clone(),
                collaborators.oracle.clone(),
                collaborators.references.clone(),
                config.gateway_timeout,
            ),
            references: collaborators.references,
        })
    }

    /// Create an account service backed entirely by in-memory collaborators
    pub fn in_memory(config: &AccountServiceConfig) -> Result<Self> {
        Self::new(Collaborators::in_memory(), config)
    }

    /// Create a new account service with PostgreSQL storage and HTTP gateways
    pub async fn with_config(config: &AccountServiceConfig) -> Result<Self> {
        config.validate()?;

        let store = PostgresAccountRepository::with_config(config).await?;
        Self::with_store(store, config)
    }

    /// Create a new account service over an existing pool, with HTTP gateways
    pub fn with_pool(pool: DbPool, config: &AccountServiceConfig) -> Result<Self> {
        Self::with_store(PostgresAccountRepository::new(pool), config)
    }

    fn with_store(store: PostgresAccountRepository, config: &AccountServiceConfig) -> Result<Self> {
        let store = Arc::new(store);
        let references = Arc::new(PostgresReferenceLookup::new(store.pool().clone()));
        let users = Arc::new(HttpUserGateway::new(&config.user_service_url, config.gateway_timeout)?);
        let transfers = Arc::new(HttpTransferGateway::new(
            &config.transfer_service_url,
            config.gateway_timeout,
        )?);

        info!(
            "Account service wired to user service {} and transfer service {}",
            config.user_service_url, config.transfer_service_url
        );

        Self::new(Collaborators::new(store, references, users, transfers), config)
    }

    /// Open a new account for a user
    pub async fn create_account(
        &self,
        owner_user_id: UserId,
        account_type_id: ReferenceId,
        currency_id: ReferenceId,
    ) -> Result<AccountView> {
        self.provisioning
            .create_account(owner_user_id, account_type_id, currency_id)
            .await
    }

    /// Get an account joined with its owner and transfers
    pub async fn get_account_by_id(&self, id: Uuid) -> Result<AccountDetailView> {
        self.aggregation.get_by_id(id).await
    }

    /// Get the account owned by a user, joined with its owner and transfers
    pub async fn get_account_by_user_id(&self, user_id: UserId) -> Result<AccountDetailView> {
        self.aggregation.get_by_user_id(user_id).await
    }

    /// Apply a partial update
    pub async fn update_account(&self, id: Uuid, patch: AccountPatch) -> Result<AccountView> {
        self.lifecycle.update_account(id, patch).await
    }

    /// Overwrite an account balance
    pub async fn update_balance(&self, id: Uuid, balance: Amount) -> Result<()> {
        self.lifecycle.update_balance(id, balance).await
    }

    /// Disable the account owned by a user
    pub async fn disable_account_by_user(&self, user_id: UserId) -> Result<AccountView> {
        self.lifecycle.disable_account_by_user(user_id).await
    }

    /// List a reference catalogue (account types, currencies, statuses)
    pub async fn reference_entries(&self, category: ReferenceCategory) -> Result<Vec<ReferenceEntry>> {
        self.references.entries(category).await
    }
}

/// Run `fut` under `deadline`; expiry counts as the dependency being unavailable
pub(crate) async fn with_deadline<T, F>(deadline: Duration, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::UpstreamUnavailable(format!(
            "{} timed out after {}ms",
            what,
            deadline.as_millis()
        ))),
    }
}

/// Resolve the display names of three reference codes concurrently
pub(crate) async fn resolve_names(
    references: &dyn ReferenceLookup,
    deadline: Duration,
    account_type_id: ReferenceId,
    currency_id: ReferenceId,
    status_id: ReferenceId,
) -> Result<ReferenceNames> {
    let lookup = |category, id| {
        with_deadline(deadline, "reference lookup", references.name_of(category, id))
    };

    let (account_type, currency, status) = futures::try_join!(
        lookup(ReferenceCategory::AccountType, account_type_id),
        lookup(ReferenceCategory::Currency, currency_id),
        lookup(ReferenceCategory::AccountStatus, status_id),
    )
    .map_err(|e| match e {
        Error::Database(db) => Error::UpstreamUnavailable(format!("reference lookup: {}", db)),
        other => other,
    })?;

    Ok(ReferenceNames {
        account_type,
        currency,
        status,
    })
}
