//! Collaborator contracts consumed by account provisioning.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use ledgerpost_core::{Category, Currency, LedgerResult, LegalEntity, ProductType, SubCategory};

use crate::account::{Account, SatelliteLink};

/// One atomic unit of provisioning writes: every minted account plus every
/// link row, visible all together or not at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionedBatch {
    pub accounts: Vec<Account>,
    pub links: Vec<SatelliteLink>,
}

/// Account persistence collaborator.
///
/// `persist_provisioned` must be all-or-nothing. Idempotent create is an
/// explicit check-then-create-or-fetch: a narrow race between
/// `find_by_number` and the insert remains possible unless the backing
/// store enforces a uniqueness constraint on account number, which durable
/// implementations should.
pub trait AccountStore: Send + Sync {
    fn find_by_number(&self, account_number: &str) -> LedgerResult<Option<Account>>;

    fn find_by_legacy_id(&self, legacy_id: &str) -> LedgerResult<Option<Account>>;

    /// Accounts of `owner_id` under `sub_category_code`, in the store's
    /// retrieval order. The reconciler's tie-break depends on that order.
    fn find_by_owner_and_sub_category(
        &self,
        owner_id: &str,
        sub_category_code: &str,
    ) -> LedgerResult<Vec<Account>>;

    fn persist_provisioned(&self, batch: &ProvisionedBatch) -> LedgerResult<()>;

    fn update_account(&self, account: &Account) -> LedgerResult<()>;
}

impl<S> AccountStore for Arc<S>
where
    S: AccountStore + ?Sized,
{
    fn find_by_number(&self, account_number: &str) -> LedgerResult<Option<Account>> {
        (**self).find_by_number(account_number)
    }

    fn find_by_legacy_id(&self, legacy_id: &str) -> LedgerResult<Option<Account>> {
        (**self).find_by_legacy_id(legacy_id)
    }

    fn find_by_owner_and_sub_category(
        &self,
        owner_id: &str,
        sub_category_code: &str,
    ) -> LedgerResult<Vec<Account>> {
        (**self).find_by_owner_and_sub_category(owner_id, sub_category_code)
    }

    fn persist_provisioned(&self, batch: &ProvisionedBatch) -> LedgerResult<()> {
        (**self).persist_provisioned(batch)
    }

    fn update_account(&self, account: &Account) -> LedgerResult<()> {
        (**self).update_account(account)
    }
}

/// Read-only classification reference source.
pub trait ClassificationSource: Send + Sync {
    fn category(&self, code: &str) -> LedgerResult<Option<Category>>;

    fn sub_category(&self, code: &str) -> LedgerResult<Option<SubCategory>>;

    /// Sub-category configured for an account type (product configuration).
    fn sub_category_by_account_type(&self, account_type: &str)
        -> LedgerResult<Option<SubCategory>>;

    fn product_type(&self, code: &str) -> LedgerResult<Option<ProductType>>;

    fn entity(&self, code: &str) -> LedgerResult<Option<LegalEntity>>;

    /// Looked up against the external ledger-currency source.
    fn currency(&self, code: &str) -> LedgerResult<Option<Currency>>;

    /// Loan sub-category configured for a partner, used by the partner-loan
    /// provisioning path.
    fn loan_sub_category_for_partner(&self, partner_id: &str) -> LedgerResult<Option<String>>;
}

/// Loan-account record served by an external core-banking/partner system,
/// carrying what a migration import needs to complete an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerLoanRecord {
    pub legacy_id: String,
    pub owner_id: String,
    pub owner_name: String,
    pub sector: String,
    pub sub_category_code: String,
    pub alternate_id: Option<String>,
}

/// External partner-system lookups, used only by the migration and
/// relationship entry points.
pub trait PartnerDirectory: Send + Sync {
    fn loan_account(&self, legacy_id: &str) -> LedgerResult<Option<PartnerLoanRecord>>;
}
