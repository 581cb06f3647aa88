//! Composed views returned to callers
//!
//! Field names on the wire follow the wallet front-end contract.

use serde::{Deserialize, Serialize};

use crate::decimal::Amount;
use crate::model::account::Account;
use crate::model::transfer::Transfer;
use crate::model::user::UserProfile;

/// Display names resolved for an account's reference codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceNames {
    pub account_type: String,
    pub currency: String,
    pub status: String,
}

/// Account fields plus resolved display names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountView {
    #[serde(rename = "CBU")]
    pub cbu: String,
    #[serde(rename = "Alias")]
    pub alias: String,
    #[serde(rename = "NumeroDeCuenta")]
    pub account_number: String,
    #[serde(rename = "Balance")]
    pub balance: Amount,
    #[serde(rename = "TipoDeCuenta")]
    pub account_type: String,
    #[serde(rename = "TipoDeMoneda")]
    pub currency: String,
    #[serde(rename = "EstadoDeLaCuenta")]
    pub status: String,
}

impl AccountView {
    pub fn new(account: &Account, names: ReferenceNames) -> Self {
        Self {
            cbu: account.cbu.clone(),
            alias: account.alias.clone(),
            account_number: account.account_number.clone(),
            balance: account.balance,
            account_type: names.account_type,
            currency: names.currency,
            status: names.status,
        }
    }
}

/// Account view joined with its owner and transfer history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountDetailView {
    #[serde(rename = "Account")]
    pub account: AccountView,
    #[serde(rename = "User")]
    pub user: UserProfile,
    #[serde(rename = "Transfers")]
    pub transfers: Vec<Transfer>,
}
