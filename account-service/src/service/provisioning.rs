use std::sync::Arc;
use std::time::Duration;

use common::decimal::Amount;
use common::error::{Error, ErrorExt, Result};
use common::model::account::{Account, AccountStatus, ReferenceId};
use common::model::user::UserId;
use common::model::view::AccountView;
use tracing::{debug, info};

use super::resolve_names;
use crate::generator::IdentifierGenerator;
use crate::reference::ReferenceLookup;
use crate::repository::AccountRepository;

/// Opens new accounts
pub struct ProvisioningService {
    repo: Arc<dyn AccountRepository>,
    references: Arc<dyn ReferenceLookup>,
    generator: IdentifierGenerator,
    starting_balance: Amount,
    deadline: Duration,
}

impl ProvisioningService {
    pub fn new(
        repo: Arc<dyn AccountRepository>,
        references: Arc<dyn ReferenceLookup>,
        generator: IdentifierGenerator,
        starting_balance: Amount,
        deadline: Duration,
    ) -> Self {
        Self {
            repo,
            references,
            generator,
            starting_balance,
            deadline,
        }
    }

    /// Open an active account for `owner_user_id`
    ///
    /// Fails with `Conflict` when the user already owns an account, with
    /// `ValidationError` on an unknown type or currency code, and with
    /// `GenerationExhausted` when no free identifier could be found. Nothing
    /// is written unless every step before the insert succeeded.
    pub async fn create_account(
        &self,
        owner_user_id: UserId,
        account_type_id: ReferenceId,
        currency_id: ReferenceId,
    ) -> Result<AccountView> {
        info!("Creating account for user {}", owner_user_id);

        if self.repo.user_has_account(owner_user_id).await? {
            return Err(Error::Conflict(format!(
                "User {} already has an account",
                owner_user_id
            )));
        }

        let names = resolve_names(
            self.references.as_ref(),
            self.deadline,
            account_type_id,
            currency_id,
            AccountStatus::ACTIVE_ID,
        )
        .await?;

        let identifiers = self.generator.generate_all().await?;
        debug!(
            "Minted identifiers for user {}: {} / {} / {}",
            owner_user_id, identifiers.account_number, identifiers.cbu, identifiers.alias
        );

        let account = Account::open(
            owner_user_id,
            account_type_id,
            currency_id,
            identifiers,
            self.starting_balance,
        );

        self.repo
            .insert_account(&account)
            .await
            .with_context(|| format!("Failed to insert account for user {}", owner_user_id))?;

        info!("Created account {} ({}) for user {}", account.id, account.account_number, owner_user_id);
        Ok(AccountView::new(&account, names))
    }
}
