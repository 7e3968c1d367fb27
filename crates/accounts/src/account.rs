//! Account model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ledgerpost_core::Classification;

/// Account type reserved for partner-originated loans; provisioning
/// resolves its classification through the partner's configured loan
/// sub-category instead of the product-type path.
pub const PARTNER_LOAN_ACCOUNT_TYPE: &str = "PARTNER_LOAN";

/// Metadata key carrying the partner id on partner-loan requests.
pub const PARTNER_ID_METADATA_KEY: &str = "partner_id";

/// Account status. Creation only ever produces `Active`; deactivation is
/// outside this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
}

/// A general-ledger account.
///
/// The account number is immutable once assigned; (entity code, category
/// code) determine its numeric prefix. Accounts are never physically
/// deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_number: String,
    pub owner_id: String,
    pub account_type: Option<String>,
    pub classification: Classification,
    pub status: AccountStatus,
    pub display_name: String,
    pub alternate_id: Option<String>,
    /// Identifier assigned by an external core-banking system, when the
    /// account originated there.
    pub legacy_id: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

/// Which counterpart a satellite link binds to its primary account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SatelliteKind {
    Invested,
    Receivables,
    LoanAdvance,
}

/// Link row between a primary account and one satellite. At most one active
/// link exists per (primary, kind); links are created atomically alongside
/// the accounts they bind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SatelliteLink {
    pub primary_number: String,
    pub satellite_number: String,
    pub kind: SatelliteKind,
}

/// Inbound account-creation request.
///
/// Classification is given either as an `account_type` (resolved through
/// product configuration) or as an explicit category/sub-category pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub owner_id: String,
    pub display_name: String,
    pub account_type: Option<String>,
    pub account_number: Option<String>,
    pub category_code: Option<String>,
    pub sub_category_code: Option<String>,
    pub entity_code: Option<String>,
    pub currency: Option<String>,
    pub alternate_id: Option<String>,
    pub legacy_id: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Strip display names down to `[A-Za-z0-9]`, whitespace and `. , / - ' ( )`,
/// then collapse whitespace runs to a single space.
pub fn sanitize_display_name(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| {
            c.is_ascii_alphanumeric()
                || c.is_whitespace()
                || matches!(c, '.' | ',' | '/' | '-' | '\'' | '(' | ')')
        })
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}
