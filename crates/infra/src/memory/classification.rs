//! Static classification and partner-directory sources.

use std::collections::HashMap;
use std::sync::RwLock;

use ledgerpost_accounts::{ClassificationSource, PartnerDirectory, PartnerLoanRecord};
use ledgerpost_core::{Category, Currency, LedgerResult, LegalEntity, ProductType, SubCategory};
use ledgerpost_journal::CurrencySource;

/// Classification reference data loaded once and served read-only, the way
/// the core consumes it.
#[derive(Debug, Default)]
pub struct StaticClassification {
    categories: HashMap<String, Category>,
    sub_categories: HashMap<String, SubCategory>,
    sub_by_account_type: HashMap<String, String>,
    products: HashMap<String, ProductType>,
    entities: RwLock<HashMap<String, LegalEntity>>,
    currencies: HashMap<String, Currency>,
    partner_loans: HashMap<String, String>,
}

impl StaticClassification {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.categories.insert(category.code.clone(), category);
        self
    }

    pub fn with_sub_category(mut self, sub_category: SubCategory) -> Self {
        self.sub_categories
            .insert(sub_category.code.clone(), sub_category);
        self
    }

    /// Register a product type and bind its account type to its
    /// sub-category.
    pub fn with_product(mut self, account_type: &str, product: ProductType) -> Self {
        self.sub_by_account_type
            .insert(account_type.to_string(), product.sub_category_code.clone());
        self.products.insert(account_type.to_string(), product);
        self
    }

    pub fn with_entity(self, entity: LegalEntity) -> Self {
        self.entities
            .write()
            .unwrap()
            .insert(entity.code.clone(), entity);
        self
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currencies.insert(currency.code.clone(), currency);
        self
    }

    pub fn with_partner_loan(mut self, partner_id: &str, sub_category_code: &str) -> Self {
        self.partner_loans
            .insert(partner_id.to_string(), sub_category_code.to_string());
        self
    }

    /// Replace an entity record (e.g. to deactivate it in a test).
    pub fn put_entity(&self, entity: LegalEntity) {
        self.entities
            .write()
            .unwrap()
            .insert(entity.code.clone(), entity);
    }
}

impl ClassificationSource for StaticClassification {
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
        Ok(self.entities.read().unwrap().get(code).cloned())
    }

    fn currency(&self, code: &str) -> LedgerResult<Option<Currency>> {
        Ok(self.currencies.get(code).cloned())
    }

    fn loan_sub_category_for_partner(&self, partner_id: &str) -> LedgerResult<Option<String>> {
        Ok(self.partner_loans.get(partner_id).cloned())
    }
}

impl CurrencySource for StaticClassification {
    fn currency(&self, code: &str) -> LedgerResult<Option<Currency>> {
        Ok(self.currencies.get(code).cloned())
    }
}

/// Partner-system directory served from a fixed record set.
#[derive(Debug, Default)]
pub struct StaticPartnerDirectory {
    records: HashMap<String, PartnerLoanRecord>,
}

impl StaticPartnerDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_loan_account(mut self, record: PartnerLoanRecord) -> Self {
        self.records.insert(record.legacy_id.clone(), record);
        self
    }
}

impl PartnerDirectory for StaticPartnerDirectory {
    fn loan_account(&self, legacy_id: &str) -> LedgerResult<Option<PartnerLoanRecord>> {
        Ok(self.records.get(legacy_id).cloned())
    }
}
