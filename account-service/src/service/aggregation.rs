use std::sync::Arc;
use std::time::Duration;

use common::error::{Error, Result};
use common::model::account::Account;
use common::model::transfer::Transfer;
use common::model::user::{UserId, UserProfile};
use common::model::view::{AccountDetailView, AccountView};
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::{resolve_names, with_deadline};
use crate::config::TransferFailurePolicy;
use crate::gateway::{TransferGateway, UserGateway};
use crate::reference::ReferenceLookup;
use crate::repository::AccountRepository;

/// Reads accounts and joins them with data owned by other services
pub struct AggregationService {
    repo: Arc<dyn AccountRepository>,
    references: Arc<dyn ReferenceLookup>,
    users: Arc<dyn UserGateway>,
    transfers: Arc<dyn TransferGateway>,
    deadline: Duration,
    transfer_policy: TransferFailurePolicy,
}

impl AggregationService {
    pub fn new(
        repo: Arc<dyn AccountRepository>,
        references: Arc<dyn ReferenceLookup>,
        users: Arc<dyn UserGateway>,
        transfers: Arc<dyn TransferGateway>,
        deadline: Duration,
        transfer_policy: TransferFailurePolicy,
    ) -> Self {
        Self {
            repo,
            references,
            users,
            transfers,
            deadline,
            transfer_policy,
        }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<AccountDetailView> {
        let account = self
            .repo
            .get_account(id)
            .await?
            .ok_or_else(|| Error::AccountNotFound(format!("Account not found: {}", id)))?;

        self.compose(account).await
    }

    pub async fn get_by_user_id(&self, user_id: UserId) -> Result<AccountDetailView> {
        let account = self
            .repo
            .get_account_by_user(user_id)
            .await?
            .ok_or_else(|| Error::AccountNotFound(format!("Account not found for user {}", user_id)))?;

        self.compose(account).await
    }

    /// Fan out to reference lookup, user service and transfer service at once.
    /// The first failure cancels the calls still in flight.
    async fn compose(&self, account: Account) -> Result<AccountDetailView> {
        debug!("Composing detail view for account {}", account.id);

        let (names, user, transfers) = futures::try_join!(
            resolve_names(
                self.references.as_ref(),
                self.deadline,
                account.account_type_id,
                account.currency_id,
                account.status_id,
            ),
            self.fetch_user(account.owner_user_id),
            self.fetch_transfers(account.id),
        )
        .map_err(|e| {
            error!("Failed to compose account {}: {}", account.id, e);
            e
        })?;

        Ok(AccountDetailView {
            account: AccountView::new(&account, names),
            user,
            transfers,
        })
    }

    async fn fetch_user(&self, user_id: UserId) -> Result<UserProfile> {
        with_deadline(self.deadline, "user service", self.users.get_user_by_id(user_id))
            .await?
            .ok_or_else(|| Error::UserNotFound(format!("User not found: {}", user_id)))
    }

    async fn fetch_transfers(&self, account_id: Uuid) -> Result<Vec<Transfer>> {
        let fetched = with_deadline(
            self.deadline,
            "transfer service",
            self.transfers.get_transfers_by_account(account_id),
        )
        .await;

        match (fetched, self.transfer_policy) {
            (Ok(transfers), _) => Ok(transfers),
            (Err(e), TransferFailurePolicy::DegradeToEmpty) => {
                warn!("Transfers unavailable for account {}, returning none: {}", account_id, e);
                Ok(Vec::new())
            }
            (Err(e), TransferFailurePolicy::FailFast) => Err(e),
        }
    }
}
