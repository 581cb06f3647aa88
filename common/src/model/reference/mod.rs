//! Reference tables resolved to display names

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::account::ReferenceId;

/// Reference table a code belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceCategory {
    AccountType,
    Currency,
    AccountStatus,
}

impl ReferenceCategory {
    pub const ALL: [ReferenceCategory; 3] = [
        ReferenceCategory::AccountType,
        ReferenceCategory::Currency,
        ReferenceCategory::AccountStatus,
    ];

    /// Backing table name
    pub fn table(&self) -> &'static str {
        match self {
            ReferenceCategory::AccountType => "account_types",
            ReferenceCategory::Currency => "currencies",
            ReferenceCategory::AccountStatus => "account_statuses",
        }
    }
}

impl fmt::Display for ReferenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceCategory::AccountType => write!(f, "account type"),
            ReferenceCategory::Currency => write!(f, "currency"),
            ReferenceCategory::AccountStatus => write!(f, "account status"),
        }
    }
}

/// One code/name pair of a reference table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub id: ReferenceId,
    pub name: String,
}

impl ReferenceEntry {
    pub fn new(id: ReferenceId, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}
