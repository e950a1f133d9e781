//! Plaintext record shapes carried inside an export bundle.
//!
//! These only exist while a bundle is being built or read; the `Vault`
//! stores every sensitive field encrypted. Field names are camelCase on the
//! wire (`billName`, `dueDate`) so bundles stay readable by the mobile app.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::errors::VaultError;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Zeroize)]
#[serde(rename_all = "camelCase")]
pub struct PlainCredential {
    pub title: String,
    pub username: String,
    pub password: String,
    /// Absent from legacy bundles.
    #[serde(default)]
    pub url: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize)]
#[serde(rename_all = "camelCase")]
pub struct PlainBill {
    pub bill_name: String,
    pub amount: String,
    pub notes: String,
    /// Epoch milliseconds.
    pub due_date: i64,
    #[zeroize(skip)]
    pub frequency: BillFrequency,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Zeroize)]
#[serde(rename_all = "camelCase")]
pub struct PlainNote {
    pub title: String,
    pub content: String,
}

/// Everything an export bundle carries, in insertion order per kind.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, Zeroize)]
pub struct AllRecords {
    pub credentials: Vec<PlainCredential>,
    pub bills: Vec<PlainBill>,
    pub notes: Vec<PlainNote>,
}

impl AllRecords {
    /// Wrap a legacy credentials-only payload.
    pub fn from_legacy(credentials: Vec<PlainCredential>) -> Self {
        Self {
            credentials,
            bills: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.credentials.len() + self.bills.len() + self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// How often a bill recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillFrequency {
    #[default]
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
}

impl BillFrequency {
    pub const ALL: [BillFrequency; 4] = [
        BillFrequency::Monthly,
        BillFrequency::Quarterly,
        BillFrequency::SemiAnnual,
        BillFrequency::Annual,
    ];

    /// Wire name, e.g. `SEMI_ANNUAL`.
    pub fn as_str(&self) -> &'static str {
        match self {
            BillFrequency::Monthly => "MONTHLY",
            BillFrequency::Quarterly => "QUARTERLY",
            BillFrequency::SemiAnnual => "SEMI_ANNUAL",
            BillFrequency::Annual => "ANNUAL",
        }
    }
}

impl fmt::Display for BillFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillFrequency {
    type Err = VaultError;

    /// Accepts the wire name in any case, with `-` or `_` as separator.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == normalized)
            .ok_or_else(|| {
                VaultError::InvalidRecord(format!(
                    "unknown bill frequency '{s}' (expected monthly, quarterly, semi-annual or annual)"
                ))
            })
    }
}
