//! Read-only classification reference data.
//!
//! Categories, sub-categories, product types, legal entities and currencies
//! are resolved (never created) by the posting core; they are keyed by code
//! and owned by an external source.

use serde::{Deserialize, Serialize};

/// Top-level account category, e.g. `"131"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub code: String,
    pub name: String,
    /// Width of the zero-padded sequence suffix for numbers minted under
    /// this category.
    pub pad_width: u32,
}

/// Sub-category, e.g. `"13112"`. Carries the satellite-account
/// configuration: which counterpart sub-categories (if any) must be minted
/// alongside a primary account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubCategory {
    pub code: String,
    pub category_code: String,
    pub name: String,
    pub entity_code: String,
    pub currency: String,
    /// Sub-category of the invested satellite account, when required.
    pub invested_sub_category: Option<String>,
    /// Sub-category of the receivables satellite account, when required.
    pub receivables_sub_category: Option<String>,
    /// Sub-category of the advance-payment satellite account for
    /// multi-loan products, when required.
    pub advance_sub_category: Option<String>,
}

impl SubCategory {
    pub fn has_satellites(&self) -> bool {
        self.invested_sub_category.is_some()
            || self.receivables_sub_category.is_some()
            || self.advance_sub_category.is_some()
    }
}

/// Product type, resolved from an account type during provisioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductType {
    pub code: String,
    pub name: String,
    pub sub_category_code: String,
}

/// Legal entity status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityStatus {
    Active,
    Inactive,
}

/// Legal entity, e.g. `"001"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalEntity {
    pub code: String,
    pub name: String,
    pub status: EntityStatus,
}

impl LegalEntity {
    pub fn is_active(&self) -> bool {
        self.status == EntityStatus::Active
    }
}

/// Currency with its minor-unit precision (e.g. `"USD"` with 2 decimals).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub code: String,
    pub decimals: u32,
}

/// Fully resolved classification of an account: the snapshot stamped onto
/// minted accounts and journal details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub category_code: String,
    pub sub_category_code: String,
    pub product_code: Option<String>,
    pub entity_code: String,
    pub currency: String,
}
