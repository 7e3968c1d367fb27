//! Shared fixtures for this crate's tests.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};

use ledgerpost_core::{
    Category, Classification, CounterCache, Currency, EntityStatus, LedgerError, LedgerResult,
    LegalEntity, ProductType, SequenceGenerator, SubCategory,
};
use ledgerpost_events::{EventGateway, InMemoryPublisher, Publisher};

use crate::account::{Account, AccountStatus, CreateAccountRequest, SatelliteLink};
use crate::ports::{
    AccountStore, ClassificationSource, PartnerDirectory, PartnerLoanRecord, ProvisionedBatch,
};
use crate::provisioning::ProvisioningEngine;

#[derive(Default)]
pub struct MemStore {
    accounts: Mutex<Vec<Account>>,
    links: Mutex<Vec<SatelliteLink>>,
    fail_next: AtomicBool,
}

impl MemStore {
    pub fn fail_next_persist(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn seed_account(&self, account: Account) {
        self.accounts.lock().unwrap().push(account);
    }

    pub fn account_count(&self) -> usize {
        self.accounts.lock().unwrap().len()
    }

    pub fn links_of(&self, primary_number: &str) -> Vec<SatelliteLink> {
        self.links
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.primary_number == primary_number)
            .cloned()
            .collect()
    }
}

impl AccountStore for MemStore {
    fn find_by_number(&self, account_number: &str) -> LedgerResult<Option<Account>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.account_number == account_number)
            .cloned())
    }

    fn find_by_legacy_id(&self, legacy_id: &str) -> LedgerResult<Option<Account>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
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
            .accounts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| {
                a.owner_id == owner_id
                    && a.classification.sub_category_code == sub_category_code
            })
            .cloned()
            .collect())
    }

    fn persist_provisioned(&self, batch: &ProvisionedBatch) -> LedgerResult<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(LedgerError::infrastructure("store unreachable"));
        }
        let mut accounts = self.accounts.lock().unwrap();
        let mut links = self.links.lock().unwrap();
        for account in &batch.accounts {
            if accounts
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
            if links
                .iter()
                .any(|l| l.primary_number == link.primary_number && l.kind == link.kind)
            {
                return Err(LedgerError::conflict(format!(
                    "satellite link {:?} already exists for {}",
                    link.kind, link.primary_number
                )));
            }
        }
        accounts.extend(batch.accounts.iter().cloned());
        links.extend(batch.links.iter().cloned());
        Ok(())
    }

    fn update_account(&self, account: &Account) -> LedgerResult<()> {
        let mut accounts = self.accounts.lock().unwrap();
        match accounts
            .iter_mut()
            .find(|a| a.account_number == account.account_number)
        {
            Some(slot) => {
                *slot = account.clone();
                Ok(())
            }
            None => Err(LedgerError::not_found(
                ledgerpost_core::ResourceKind::Account,
                &account.account_number,
            )),
        }
    }
}

pub struct FixtureClassification {
    categories: HashMap<String, Category>,
    sub_categories: HashMap<String, SubCategory>,
    sub_by_account_type: HashMap<String, String>,
    products: HashMap<String, ProductType>,
    entities: Mutex<HashMap<String, LegalEntity>>,
    currencies: HashMap<String, Currency>,
    partner_loans: HashMap<String, String>,
}

impl FixtureClassification {
    pub fn standard() -> Self {
        let mut categories = HashMap::new();
        categories.insert(
            "131".to_string(),
            Category {
                code: "131".to_string(),
                name: "Deposits".to_string(),
                pad_width: 7,
            },
        );

        let plain = |code: &str| SubCategory {
            code: code.to_string(),
            category_code: "131".to_string(),
            name: code.to_string(),
            entity_code: "001".to_string(),
            currency: "USD".to_string(),
            invested_sub_category: None,
            receivables_sub_category: None,
            advance_sub_category: None,
        };
        let mut sub_categories = HashMap::new();
        for code in ["13112", "13140", "13151", "13152", "13161", "13170"] {
            sub_categories.insert(code.to_string(), plain(code));
        }
        sub_categories.insert(
            "13150".to_string(),
            SubCategory {
                invested_sub_category: Some("13151".to_string()),
                receivables_sub_category: Some("13152".to_string()),
                ..plain("13150")
            },
        );
        sub_categories.insert(
            "13160".to_string(),
            SubCategory {
                advance_sub_category: Some("13161".to_string()),
                ..plain("13160")
            },
        );

        let mut sub_by_account_type = HashMap::new();
        sub_by_account_type.insert("TERM_DEPOSIT".to_string(), "13140".to_string());
        let mut products = HashMap::new();
        products.insert(
            "TERM_DEPOSIT".to_string(),
            ProductType {
                code: "TERM_DEPOSIT".to_string(),
                name: "Term deposit".to_string(),
                sub_category_code: "13140".to_string(),
            },
        );

        let mut entities = HashMap::new();
        for code in ["001", "002"] {
            entities.insert(
                code.to_string(),
                LegalEntity {
                    code: code.to_string(),
                    name: format!("Entity {code}"),
                    status: EntityStatus::Active,
                },
            );
        }

        let mut currencies = HashMap::new();
        currencies.insert(
            "USD".to_string(),
            Currency {
                code: "USD".to_string(),
                decimals: 2,
            },
        );

        let mut partner_loans = HashMap::new();
        partner_loans.insert("P-1".to_string(), "13170".to_string());

        Self {
            categories,
            sub_categories,
            sub_by_account_type,
            products,
            entities: Mutex::new(entities),
            currencies,
            partner_loans,
        }
    }

    pub fn set_entity_status(&self, code: &str, status: EntityStatus) {
        if let Some(entity) = self.entities.lock().unwrap().get_mut(code) {
            entity.status = status;
        }
    }
}

impl ClassificationSource for FixtureClassification {
    fn category(&self, code: &str) -> LedgerResult<Option<Category>> {
        Ok(self.categories.get(code).cloned())
    }

    fn sub_category(&self, code: &str) -> LedgerResult<Option<SubCategory>> {
        Ok(self.sub_categories.get(code).cloned())
    }

    fn sub_category_by_account_type(
        &self,
        account_type: &str,
    ) -> LedgerResult<Option<SubCategory>> {
        Ok(self
            .sub_by_account_type
            .get(account_type)
            .and_then(|code| self.sub_categories.get(code))
            .cloned())
    }

    fn product_type(&self, code: &str) -> LedgerResult<Option<ProductType>> {
        Ok(self.products.get(code).cloned())
    }

    fn entity(&self, code: &str) -> LedgerResult<Option<LegalEntity>> {
        Ok(self.entities.lock().unwrap().get(code).cloned())
    }

    fn currency(&self, code: &str) -> LedgerResult<Option<Currency>> {
        Ok(self.currencies.get(code).cloned())
    }

    fn loan_sub_category_for_partner(&self, partner_id: &str) -> LedgerResult<Option<String>> {
        Ok(self.partner_loans.get(partner_id).cloned())
    }
}

#[derive(Default)]
pub struct FixturePartners {
    records: HashMap<String, PartnerLoanRecord>,
}

impl FixturePartners {
    pub fn standard() -> Self {
        let mut records = HashMap::new();
        records.insert(
            "L-500".to_string(),
            PartnerLoanRecord {
                legacy_id: "L-500".to_string(),
                owner_id: "OWNER-500".to_string(),
                owner_name: "Sample Owner".to_string(),
                sector: "AGRI".to_string(),
                sub_category_code: "13112".to_string(),
                alternate_id: None,
            },
        );
        Self { records }
    }
}

impl PartnerDirectory for FixturePartners {
    fn loan_account(&self, legacy_id: &str) -> LedgerResult<Option<PartnerLoanRecord>> {
        Ok(self.records.get(legacy_id).cloned())
    }
}

#[derive(Default)]
pub struct MemCounter {
    counters: Mutex<HashMap<String, u64>>,
    values: Mutex<HashMap<String, String>>,
    pub deleted: Mutex<Vec<String>>,
}

impl CounterCache for MemCounter {
    fn increment(&self, key: &str) -> LedgerResult<u64> {
        let mut counters = self.counters.lock().unwrap();
        let value = counters.entry(key.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    fn get(&self, key: &str) -> LedgerResult<Option<String>> {
        Ok(self.values.lock().unwrap().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str, _ttl: Option<Duration>) -> LedgerResult<()> {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, keys: &[&str]) -> LedgerResult<()> {
        let mut values = self.values.lock().unwrap();
        let mut deleted = self.deleted.lock().unwrap();
        for key in keys {
            values.remove(*key);
            deleted.push(key.to_string());
        }
        Ok(())
    }

    fn delete_by_prefix(&self, prefix: &str) -> LedgerResult<()> {
        self.values
            .lock()
            .unwrap()
            .retain(|k, _| !k.starts_with(prefix));
        Ok(())
    }
}

pub struct Harness {
    pub engine: ProvisioningEngine,
    pub store: Arc<MemStore>,
    pub classification: Arc<FixtureClassification>,
    pub publisher: Arc<InMemoryPublisher>,
    pub cache: Arc<MemCounter>,
}

pub fn harness() -> Harness {
    let store = Arc::new(MemStore::default());
    let classification = Arc::new(FixtureClassification::standard());
    let publisher = Arc::new(InMemoryPublisher::new());
    let cache = Arc::new(MemCounter::default());
    let engine = ProvisioningEngine::new(
        store.clone(),
        classification.clone(),
        Arc::new(FixturePartners::standard()),
        SequenceGenerator::new(cache.clone()),
        EventGateway::new(publisher.clone() as Arc<dyn Publisher>),
    );
    Harness {
        engine,
        store,
        classification,
        publisher,
        cache,
    }
}

/// Direct-path request matching the documented example: category `131`,
/// entity `001`, sub-category `13112`, owner `12345`.
pub fn request_131() -> CreateAccountRequest {
    CreateAccountRequest {
        owner_id: "12345".to_string(),
        display_name: "Test Owner".to_string(),
        category_code: Some("131".to_string()),
        sub_category_code: Some("13112".to_string()),
        entity_code: Some("001".to_string()),
        currency: Some("USD".to_string()),
        ..CreateAccountRequest::default()
    }
}

/// A bare account row, as an external system would have created it.
pub fn plain_account(
    number: &str,
    owner_id: &str,
    sub_category_code: &str,
    created_at: DateTime<Utc>,
) -> Account {
    Account {
        account_number: number.to_string(),
        owner_id: owner_id.to_string(),
        account_type: None,
        classification: Classification {
            category_code: "131".to_string(),
            sub_category_code: sub_category_code.to_string(),
            product_code: None,
            entity_code: "001".to_string(),
            currency: "USD".to_string(),
        },
        status: AccountStatus::Active,
        display_name: "Seeded Account".to_string(),
        alternate_id: None,
        legacy_id: None,
        metadata: BTreeMap::new(),
        created_at,
    }
}
