//! Transfer records owned by the transfer service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Amount;

/// A transfer touching an account, as served by the transfer service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub id: i64,
    pub amount: Amount,
    pub date: DateTime<Utc>,
    pub status: String,
}
