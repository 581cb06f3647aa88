//! Repository for account data
//!
//! Both implementations enforce uniqueness of account number, CBU, alias and
//! owner at write time, independently of any earlier oracle check.

use async_trait::async_trait;
use chrono::Utc;
use common::decimal::Amount;
use common::db::models::DbAccount;
use common::db::{self, DbPool};
use common::error::{Error, Result};
use common::model::account::{Account, AccountPatch, IdentifierClass};
use common::model::user::UserId;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::generator::UniquenessOracle;

/// Account repository trait defining the interface for account data storage
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a new account
    async fn insert_account(&self, account: &Account) -> Result<()>;

    /// Write only the fields present in `patch` and return the stored result; never touches the balance
    async fn apply_patch(&self, id: Uuid, patch: &AccountPatch) -> Result<Account>;

    /// Overwrite the balance of an account
    async fn update_balance(&self, id: Uuid, balance: Amount) -> Result<()>;

    /// Get an account by ID
    async fn get_account(&self, id: Uuid) -> Result<Option<Account>>;

    /// Get the account owned by a user
    async fn get_account_by_user(&self, user_id: UserId) -> Result<Option<Account>>;

    /// Whether the user already owns an account
    async fn user_has_account(&self, user_id: UserId) -> Result<bool>;
}

/// In-memory repository for account data
pub struct InMemoryAccountRepository {
    /// Accounts by ID
    pub accounts: DashMap<Uuid, Account>,
    account_numbers: DashMap<String, Uuid>,
    cbus: DashMap<String, Uuid>,
    aliases: DashMap<String, Uuid>,
    owners: DashMap<UserId, Uuid>,
}

impl Default for InMemoryAccountRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAccountRepository {
    /// Create a new in-memory account repository
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            account_numbers: DashMap::new(),
            cbus: DashMap::new(),
            aliases: DashMap::new(),
            owners: DashMap::new(),
        }
    }

    fn index(&self, class: IdentifierClass) -> &DashMap<String, Uuid> {
        match class {
            IdentifierClass::AccountNumber => &self.account_numbers,
            IdentifierClass::Cbu => &self.cbus,
            IdentifierClass::Alias => &self.aliases,
        }
    }

    /// Claim `value` for `id`; false if another account holds it
    fn claim(&self, class: IdentifierClass, value: &str, id: Uuid) -> bool {
        match self.index(class).entry(value.to_string()) {
            Entry::Occupied(entry) => *entry.get() == id,
            Entry::Vacant(entry) => {
                entry.insert(id);
                true
            }
        }
    }

    fn release(&self, class: IdentifierClass, value: &str, id: Uuid) {
        self.index(class).remove_if(value, |_, owner| *owner == id);
    }
}

#[async_trait]
impl UniquenessOracle for InMemoryAccountRepository {
    async fn is_unique(&self, class: IdentifierClass, value: &str) -> Result<bool> {
        Ok(!self.index(class).contains_key(value))
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn insert_account(&self, account: &Account) -> Result<()> {
        if self.accounts.contains_key(&account.id) {
            return Err(Error::Conflict(format!("Account {} already exists", account.id)));
        }

        let owner_claimed = match self.owners.entry(account.owner_user_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(account.id);
                true
            }
        };
        if !owner_claimed {
            return Err(Error::Conflict(format!(
                "User {} already has an account",
                account.owner_user_id
            )));
        }

        let mut claimed = Vec::with_capacity(IdentifierClass::ALL.len());
        for class in IdentifierClass::ALL {
            let value = account.identifier(class);
            if !self.claim(class, value, account.id) {
                for done in claimed {
                    self.release(done, account.identifier(done), account.id);
                }
                self.owners.remove_if(&account.owner_user_id, |_, id| *id == account.id);
                return Err(Error::DuplicateIdentifier(class, value.to_string()));
            }
            claimed.push(class);
        }

        self.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn apply_patch(&self, id: Uuid, patch: &AccountPatch) -> Result<Account> {
        let mut stored = self
            .accounts
            .get_mut(&id)
            .ok_or_else(|| Error::AccountNotFound(format!("Account not found: {}", id)))?;

        if let Some(alias) = &patch.alias {
            if *alias != stored.alias {
                if !self.claim(IdentifierClass::Alias, alias, id) {
                    return Err(Error::DuplicateIdentifier(IdentifierClass::Alias, alias.clone()));
                }
                self.release(IdentifierClass::Alias, &stored.alias, id);
            }
        }

        // The entry guard is held, so the patch lands on the latest record.
        stored.apply(patch);
        Ok(stored.clone())
    }

    async fn update_balance(&self, id: Uuid, balance: Amount) -> Result<()> {
        let mut stored = self
            .accounts
            .get_mut(&id)
            .ok_or_else(|| Error::AccountNotFound(format!("Account not found: {}", id)))?;

        stored.balance = balance;
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.accounts.get(&id).map(|a| a.clone()))
    }

    async fn get_account_by_user(&self, user_id: UserId) -> Result<Option<Account>> {
        let id = match self.owners.get(&user_id) {
            Some(entry) => *entry.value(),
            None => return Ok(None),
        };
        Ok(self.accounts.get(&id).map(|a| a.clone()))
    }

    async fn user_has_account(&self, user_id: UserId) -> Result<bool> {
        Ok(self.owners.contains_key(&user_id))
    }
}

const ACCOUNT_COLUMNS: &str = "id, account_number, cbu, alias, balance, owner_user_id, \
     account_type_id, currency_id, status_id, created_at, updated_at";

/// PostgreSQL repository for account data
pub struct PostgresAccountRepository {
    /// Database connection pool
    pool: DbPool,
}

impl PostgresAccountRepository {
    /// Create a repository over an existing pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a new PostgreSQL account repository with configuration
    pub async fn with_config(config: &crate::config::AccountServiceConfig) -> Result<Self> {
        info!("Connecting to PostgreSQL database with pool size: {}", config.db_pool_size);
        let pool = db::connect(&config.database_url, config.db_pool_size).await?;
        Ok(Self::new(pool))
    }

    /// The underlying pool (shared with the reference lookup)
    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

/// Translate constraint violations into domain errors
///
/// `value_of` supplies the written value of an identifier class, for the error message.
fn map_write_error<F>(err: sqlx::Error, id: Uuid, owner_user_id: Option<UserId>, value_of: F) -> Error
where
    F: Fn(IdentifierClass) -> String,
{
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let class = match db_err.constraint() {
                Some("accounts_owner_user_id_key") => {
                    return Error::Conflict(match owner_user_id {
                        Some(user_id) => format!("User {} already has an account", user_id),
                        None => format!("Owner of account {} already has an account", id),
                    })
                }
                Some("accounts_account_number_key") => Some(IdentifierClass::AccountNumber),
                Some("accounts_cbu_key") => Some(IdentifierClass::Cbu),
                Some("accounts_alias_key") => Some(IdentifierClass::Alias),
                _ => None,
            };
            if let Some(class) = class {
                return Error::DuplicateIdentifier(class, value_of(class));
            }
        }
        if db_err.is_foreign_key_violation() {
            return Error::ValidationError(format!(
                "Unknown reference code on account {}: {}",
                id,
                db_err.message()
            ));
        }
    }
    Error::Database(err)
}

#[async_trait]
impl UniquenessOracle for PostgresAccountRepository {
    async fn is_unique(&self, class: IdentifierClass, value: &str) -> Result<bool> {
        // Column names come from a closed enum, never from input.
        let sql = format!(
            "SELECT NOT EXISTS (SELECT 1 FROM accounts WHERE {} = $1)",
            class.as_str()
        );
        let unique: bool = sqlx::query_scalar(&sql)
            .bind(value)
            .fetch_one(&self.pool)
            .await?;
        Ok(unique)
    }
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn insert_account(&self, account: &Account) -> Result<()> {
        debug!("Inserting account {} for user {}", account.id, account.owner_user_id);

        sqlx::query(
            "INSERT INTO accounts (id, account_number, cbu, alias, balance, owner_user_id, \
             account_type_id, currency_id, status_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(account.id)
        .bind(&account.account_number)
        .bind(&account.cbu)
        .bind(&account.alias)
        .bind(account.balance)
        .bind(account.owner_user_id)
        .bind(account.account_type_id)
        .bind(account.currency_id)
        .bind(account.status_id)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(e, account.id, Some(account.owner_user_id), |class| {
                account.identifier(class).to_string()
            })
        })?;

        Ok(())
    }

    async fn apply_patch(&self, id: Uuid, patch: &AccountPatch) -> Result<Account> {
        debug!("Patching account {}: {:?}", id, patch);

        // Absent fields bind NULL and keep the column as stored.
        let row = sqlx::query_as::<_, DbAccount>(&format!(
            "UPDATE accounts SET alias = COALESCE($2, alias), \
             account_type_id = COALESCE($3, account_type_id), \
             currency_id = COALESCE($4, currency_id), \
             status_id = COALESCE($5, status_id), \
             updated_at = NOW() WHERE id = $1 RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .bind(patch.alias.as_deref())
        .bind(patch.account_type_id)
        .bind(patch.currency_id)
        .bind(patch.status_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(e, id, None, |_| patch.alias.clone().unwrap_or_default())
        })?;

        row.map(Account::from)
            .ok_or_else(|| Error::AccountNotFound(format!("Account not found: {}", id)))
    }

    async fn update_balance(&self, id: Uuid, balance: Amount) -> Result<()> {
        debug!("Writing balance {} to account {}", balance, id);

        let result = sqlx::query("UPDATE accounts SET balance = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(balance)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::AccountNotFound(format!("Account not found: {}", id)));
        }
        Ok(())
    }

    async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        debug!("Getting account from database: {}", id);

        let row = sqlx::query_as::<_, DbAccount>(&format!(
            "SELECT {} FROM accounts WHERE id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Account::from))
    }

    async fn get_account_by_user(&self, user_id: UserId) -> Result<Option<Account>> {
        debug!("Getting account for user: {}", user_id);

        let row = sqlx::query_as::<_, DbAccount>(&format!(
            "SELECT {} FROM accounts WHERE owner_user_id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Account::from))
    }

    async fn user_has_account(&self, user_id: UserId) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM accounts WHERE owner_user_id = $1)")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}
