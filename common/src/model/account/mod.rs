//! Account models and related types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Amount;
use crate::model::user::UserId;

/// Numeric code into one of the reference tables (account type, currency, status)
pub type ReferenceId = i32;

/// Length of a CBU clearing code
pub const CBU_LENGTH: usize = 22;

/// Number of random digits after the bank code in an account number
pub const ACCOUNT_NUMBER_DIGITS: usize = 8;

/// Number of dictionary words in an alias
pub const ALIAS_WORDS: usize = 3;

/// Separator between alias words
pub const ALIAS_SEPARATOR: &str = ".";

/// The identifier classes minted for every new account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierClass {
    /// `<bank_code>-<8 digits>`
    AccountNumber,
    /// 22-digit clearing code
    Cbu,
    /// `word.word.word`
    Alias,
}

impl IdentifierClass {
    /// All identifier classes, in generation order
    pub const ALL: [IdentifierClass; 3] = [
        IdentifierClass::AccountNumber,
        IdentifierClass::Cbu,
        IdentifierClass::Alias,
    ];

    /// Stable machine name (also the store column name)
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierClass::AccountNumber => "account_number",
            IdentifierClass::Cbu => "cbu",
            IdentifierClass::Alias => "alias",
        }
    }
}

impl fmt::Display for IdentifierClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierClass::AccountNumber => write!(f, "account number"),
            IdentifierClass::Cbu => write!(f, "CBU"),
            IdentifierClass::Alias => write!(f, "alias"),
        }
    }
}

/// Lifecycle state of an account
///
/// Only `Active` and `Disabled` carry behavior; any other code stored in the
/// status table is carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Active,
    Disabled,
    Other(ReferenceId),
}

impl AccountStatus {
    /// Status code of an active account
    pub const ACTIVE_ID: ReferenceId = 1;
    /// Status code of a disabled account
    pub const DISABLED_ID: ReferenceId = 2;

    pub fn from_id(id: ReferenceId) -> Self {
        match id {
            Self::ACTIVE_ID => AccountStatus::Active,
            Self::DISABLED_ID => AccountStatus::Disabled,
            other => AccountStatus::Other(other),
        }
    }

    pub fn id(&self) -> ReferenceId {
        match self {
            AccountStatus::Active => Self::ACTIVE_ID,
            AccountStatus::Disabled => Self::DISABLED_ID,
            AccountStatus::Other(id) => *id,
        }
    }
}

/// The three unique identifiers minted when an account is opened
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountIdentifiers {
    pub account_number: String,
    pub cbu: String,
    pub alias: String,
}

/// Account model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique account ID, assigned once at creation
    pub id: Uuid,
    /// `<bank_code>-<8 digits>`, immutable
    pub account_number: String,
    /// Clearing code, immutable
    pub cbu: String,
    /// Three-word handle, may be changed by the owner
    pub alias: String,
    /// Current balance; only written through the balance update path
    pub balance: Amount,
    /// Owning user (lookup-only reference)
    pub owner_user_id: UserId,
    /// Account type code
    pub account_type_id: ReferenceId,
    /// Currency code
    pub currency_id: ReferenceId,
    /// Status code
    pub status_id: ReferenceId,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Build a new active account with a fresh ID
    pub fn open(
        owner_user_id: UserId,
        account_type_id: ReferenceId,
        currency_id: ReferenceId,
        identifiers: AccountIdentifiers,
        starting_balance: Amount,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            account_number: identifiers.account_number,
            cbu: identifiers.cbu,
            alias: identifiers.alias,
            balance: starting_balance,
            owner_user_id,
            account_type_id,
            currency_id,
            status_id: AccountStatus::ACTIVE_ID,
            created_at: now,
            updated_at: now,
        }
    }

    /// Value of the given identifier class
    pub fn identifier(&self, class: IdentifierClass) -> &str {
        match class {
            IdentifierClass::AccountNumber => &self.account_number,
            IdentifierClass::Cbu => &self.cbu,
            IdentifierClass::Alias => &self.alias,
        }
    }

    /// Current lifecycle state
    pub fn status(&self) -> AccountStatus {
        AccountStatus::from_id(self.status_id)
    }

    /// Move the account to `Disabled` (allowed from any state)
    pub fn disable(&mut self) {
        self.status_id = AccountStatus::DISABLED_ID;
        self.updated_at = Utc::now();
    }

    /// Apply a merge-patch; returns whether any field changed
    pub fn apply(&mut self, patch: &AccountPatch) -> bool {
        let mut changed = false;

        if let Some(alias) = &patch.alias {
            if *alias != self.alias {
                self.alias = alias.clone();
                changed = true;
            }
        }
        if let Some(currency_id) = patch.currency_id {
            changed |= currency_id != self.currency_id;
            self.currency_id = currency_id;
        }
        if let Some(status_id) = patch.status_id {
            changed |= status_id != self.status_id;
            self.status_id = status_id;
        }
        if let Some(account_type_id) = patch.account_type_id {
            changed |= account_type_id != self.account_type_id;
            self.account_type_id = account_type_id;
        }

        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }
}

/// Partial update of an account
///
/// Each field is applied only when present; `None` means "not supplied" and
/// leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_id: Option<ReferenceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_id: Option<ReferenceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_type_id: Option<ReferenceId>,
}

impl AccountPatch {
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_currency(mut self, currency_id: ReferenceId) -> Self {
        self.currency_id = Some(currency_id);
        self
    }

    pub fn with_status(mut self, status_id: ReferenceId) -> Self {
        self.status_id = Some(status_id);
        self
    }

    pub fn with_account_type(mut self, account_type_id: ReferenceId) -> Self {
        self.account_type_id = Some(account_type_id);
        self
    }

    /// True when no field was supplied
    pub fn is_empty(&self) -> bool {
        self.alias.is_none()
            && self.currency_id.is_none()
            && self.status_id.is_none()
            && self.account_type_id.is_none()
    }
}
