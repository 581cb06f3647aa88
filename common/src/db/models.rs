use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::model::account::Account;
use crate::model::reference::ReferenceEntry;

/// Database model for the accounts table
#[derive(Debug, Clone, FromRow)]
pub struct DbAccount {
    pub id: Uuid,
    pub account_number: String,
    pub cbu: String,
    pub alias: String,
    pub balance: Decimal,
    pub owner_user_id: i64,
    pub account_type_id: i32,
    pub currency_id: i32,
    pub status_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DbAccount> for Account {
    fn from(row: DbAccount) -> Self {
        Account {
            id: row.id,
            account_number: row.account_number,
            cbu: row.cbu,
            alias: row.alias,
            balance: row.balance,
            owner_user_id: row.owner_user_id,
            account_type_id: row.account_type_id,
            currency_id: row.currency_id,
            status_id: row.status_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database model for the reference tables (account_types, currencies, account_statuses)
#[derive(Debug, Clone, FromRow)]
pub struct DbReference {
    pub id: i32,
    pub name: String,
}

impl From<DbReference> for ReferenceEntry {
    fn from(row: DbReference) -> Self {
        ReferenceEntry::new(row.id, row.name)
    }
}
