//! In-memory ledger store with all-or-nothing batch persistence.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use ledgerpost_accounts::{Account, AccountStore, ProvisionedBatch, SatelliteLink};
use ledgerpost_core::{LedgerError, LedgerResult, ResourceKind};
use ledgerpost_journal::{
    AccountDirectory, AccountSnapshot, JournalDetail, JournalStore, PostingBatch, Split,
    SplitAccountLink, TransactionHeader,
};

#[derive(Debug, Default)]
struct StoreInner {
    // Insertion order is the retrieval order the reconciler depends on.
    accounts: Vec<Account>,
    satellite_links: Vec<SatelliteLink>,
    transactions: Vec<TransactionHeader>,
    splits: Vec<Split>,
    split_links: Vec<SplitAccountLink>,
    details: Vec<JournalDetail>,
}

/// Reference store. Batches are validated under the write lock and applied
/// only when every row passes, so a failure leaves nothing visible. The
/// account-number uniqueness check stands in for the recommended database
/// constraint.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    inner: RwLock<StoreInner>,
    fail_next_persist: AtomicBool,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next batch persist, leaving the store untouched.
    pub fn fail_next_persist(&self) {
        self.fail_next_persist.store(true, Ordering::SeqCst);
    }

    pub fn seed_account(&self, account: Account) {
        self.inner.write().unwrap().accounts.push(account);
    }

    pub fn account_count(&self) -> usize {
        self.inner.read().unwrap().accounts.len()
    }

    pub fn transaction_count(&self) -> usize {
        self.inner.read().unwrap().transactions.len()
    }

    pub fn split_count(&self) -> usize {
        self.inner.read().unwrap().splits.len()
    }

    pub fn split_link_count(&self) -> usize {
        self.inner.read().unwrap().split_links.len()
    }

    pub fn links_of(&self, primary_number: &str) -> Vec<SatelliteLink> {
        self.inner
            .read()
            .unwrap()
            .satellite_links
            .iter()
            .filter(|l| l.primary_number == primary_number)
            .cloned()
            .collect()
    }

    pub fn details_of(&self, transaction_id: &str) -> Vec<JournalDetail> {
        self.inner
            .read()
            .unwrap()
            .details
            .iter()
            .filter(|d| d.transaction_id == transaction_id)
            .cloned()
            .collect()
    }

    fn take_injected_failure(&self) -> LedgerResult<()> {
        if self.fail_next_persist.swap(false, Ordering::SeqCst) {
            return Err(LedgerError::infrastructure("store unreachable"));
        }
        Ok(())
    }
}

impl AccountStore for InMemoryLedgerStore {
    fn find_by_number(&self, account_number: &str) -> LedgerResult<Option<Account>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .accounts
            .iter()
            .find(|a| a.account_number == account_number)
            .cloned())
    }

    fn find_by_legacy_id(&self, legacy_id: &str) -> LedgerResult<Option<Account>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .accounts
            .iter()
            .find(|a| a.legacy_id.as_deref() == Some(legacy_id))
            .cloned())
    }

    fn find_by_owner_and_sub_category(
        &self,
        owner_id: &str,
        sub_category_code: &str,
    ) -> LedgerResult<Vec<Account>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .accounts
            .iter()
            .filter(|a| {
                a.owner_id == owner_id && a.classification.sub_category_code == sub_category_code
            })
            .cloned()
            .collect())
    }

    fn persist_provisioned(&self, batch: &ProvisionedBatch) -> LedgerResult<()> {
        self.take_injected_failure()?;
        let mut inner = self.inner.write().unwrap();
        for account in &batch.accounts {
            if inner
                .accounts
                .iter()
                .any(|a| a.account_number == account.account_number)
            {
                return Err(LedgerError::conflict(format!(
                    "account number {} already exists",
                    account.account_number
                )));
            }
        }
        for link in &batch.links {
            if inner
                .satellite_links
                .iter()
                .any(|l| l.primary_number == link.primary_number && l.kind == link.kind)
            {
                return Err(LedgerError::conflict(format!(
                    "satellite link {:?} already exists for {}",
                    link.kind, link.primary_number
                )));
            }
        }
        inner.accounts.extend(batch.accounts.iter().cloned());
        inner.satellite_links.extend(batch.links.iter().cloned());
        Ok(())
    }

    fn update_account(&self, account: &Account) -> LedgerResult<()> {
        let mut inner = self.inner.write().unwrap();
        match inner
            .accounts
            .iter_mut()
            .find(|a| a.account_number == account.account_number)
        {
            Some(slot) => {
                *slot = account.clone();
                Ok(())
            }
            None => Err(LedgerError::not_found(
                ResourceKind::Account,
                &account.account_number,
            )),
        }
    }
}

impl AccountDirectory for InMemoryLedgerStore {
    fn account_snapshot(&self, account_number: &str) -> LedgerResult<Option<AccountSnapshot>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .accounts
            .iter()
            .find(|a| a.account_number == account_number)
            .map(|a| AccountSnapshot {
                account_number: a.account_number.clone(),
                classification: a.classification.clone(),
            }))
    }
}

impl JournalStore for InMemoryLedgerStore {
    fn transaction_exists(&self, transaction_id: &str) -> LedgerResult<bool> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .transactions
            .iter()
            .any(|t| t.transaction_id == transaction_id))
    }

    fn persist_posting(&self, batch: &PostingBatch) -> LedgerResult<()> {
        self.take_injected_failure()?;
        let mut inner = self.inner.write().unwrap();
        if inner
            .transactions
            .iter()
            .any(|t| t.transaction_id == batch.transaction.transaction_id)
        {
            return Err(LedgerError::conflict(format!(
                "transaction id {} already posted",
                batch.transaction.transaction_id
            )));
        }
        inner.transactions.push(batch.transaction.clone());
        inner.splits.extend(batch.splits.iter().cloned());
        inner.split_links.extend(batch.links.iter().cloned());
        inner.details.extend(batch.details.iter().cloned());
        Ok(())
    }
}
