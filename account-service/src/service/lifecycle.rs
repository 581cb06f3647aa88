use std::sync::Arc;
use std::time::Duration;

use common::decimal::Amount;
use common::error::{Error, ErrorExt, Result};
use common::model::account::{Account, AccountPatch, AccountStatus, IdentifierClass};
use common::model::user::UserId;
use common::model::view::{AccountView, ReferenceNames};
use tracing::{debug, info};
use uuid::Uuid;

use super::resolve_names;
use crate::generator::UniquenessOracle;
use crate::reference::ReferenceLookup;
use crate::repository::AccountRepository;

/// Applies updates, balance writes and the disable transition
pub struct LifecycleService {
    repo: Arc<dyn AccountRepository>,
    oracle: Arc<dyn UniquenessOracle>,
    references: Arc<dyn ReferenceLookup>,
    deadline: Duration,
}

impl LifecycleService {
    pub fn new(
        repo: Arc<dyn AccountRepository>,
        oracle: Arc<dyn UniquenessOracle>,
        references: Arc<dyn ReferenceLookup>,
        deadline: Duration,
    ) -> Self {
        Self {
            repo,
            oracle,
            references,
            deadline,
        }
    }

    /// Merge-patch alias, currency, status and account type
    ///
    /// Fields absent from `patch` keep their stored value. Codes are resolved
    /// before anything is written, so an unknown code leaves the account as it was.
    pub async fn update_account(&self, id: Uuid, patch: AccountPatch) -> Result<AccountView> {
        let mut account = self
            .repo
            .get_account(id)
            .await?
            .ok_or_else(|| Error::AccountNotFound(format!("Account not found: {}", id)))?;

        if let Some(alias) = &patch.alias {
            if alias.trim().is_empty() {
                return Err(Error::ValidationError("Alias must not be blank".to_string()));
            }
            if *alias != account.alias && !self.oracle.is_unique(IdentifierClass::Alias, alias).await? {
                return Err(alias_taken(alias));
            }
        }

        let changed = account.apply(&patch);
        let names = self.names_of(&account).await?;
        if !changed {
            debug!("Update of account {} changed nothing", id);
            return Ok(AccountView::new(&account, names));
        }

        let stored = self
            .repo
            .apply_patch(id, &patch)
            .await
            .map_err(|e| match e {
                Error::DuplicateIdentifier(IdentifierClass::Alias, alias) => alias_taken(&alias),
                other => other,
            })
            .with_context(|| format!("Failed to update account {}", id))?;
        info!("Updated account {}", id);

        self.view_of(&stored, &account, names).await
    }

    /// Overwrite the balance with an absolute value computed by the caller
    pub async fn update_balance(&self, id: Uuid, balance: Amount) -> Result<()> {
        if self.repo.get_account(id).await?.is_none() {
            return Err(Error::AccountNotFound(format!("Account not found: {}", id)));
        }

        self.repo
            .update_balance(id, balance)
            .await
            .with_context(|| format!("Failed to write balance of account {}", id))?;

        info!("Balance of account {} set to {}", id, balance);
        Ok(())
    }

    /// Move the account owned by `user_id` to `Disabled`
    ///
    /// Only the status is written. Display names are resolved first, so a
    /// failed lookup leaves the account untouched.
    pub async fn disable_account_by_user(&self, user_id: UserId) -> Result<AccountView> {
        let mut account = self
            .repo
            .get_account_by_user(user_id)
            .await?
            .ok_or_else(|| Error::AccountNotFound(format!("Account not found for user {}", user_id)))?;

        account.disable();
        let names = self.names_of(&account).await?;

        let patch = AccountPatch::default().with_status(AccountStatus::DISABLED_ID);
        let stored = self
            .repo
            .apply_patch(account.id, &patch)
            .await
            .with_context(|| format!("Failed to disable account {}", account.id))?;

        info!("Disabled account {} of user {}", account.id, user_id);
        self.view_of(&stored, &account, names).await
    }

    async fn names_of(&self, account: &Account) -> Result<ReferenceNames> {
        resolve_names(
            self.references.as_ref(),
            self.deadline,
            account.account_type_id,
            account.currency_id,
            account.status_id,
        )
        .await
    }

    /// Render `stored`, reusing `names` unless a concurrent write moved its codes away from `expected`
    async fn view_of(&self, stored: &Account, expected: &Account, names: ReferenceNames) -> Result<AccountView> {
        let codes = |a: &Account| (a.account_type_id, a.currency_id, a.status_id);
        let names = if codes(stored) == codes(expected) {
            names
        } else {
            self.names_of(stored).await?
        };
        Ok(AccountView::new(stored, names))
    }
}

fn alias_taken(alias: &str) -> Error {
    Error::Conflict(format!("Alias {} is already taken", alias))
}
