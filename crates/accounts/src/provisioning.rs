//! Account provisioning engine.
//!
//! Resolves classification, mints deterministic account numbers, derives
//! satellite accounts, persists everything in one atomic unit and emits
//! account events after the commit.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use ledgerpost_core::{
    category_scope, encode_account_number, CallContext, Category, Classification, LedgerError,
    LedgerResult, ResourceKind, SequenceGenerator, SubCategory,
};
use ledgerpost_events::{
    AccountCreated, AccountUpdated, EventGateway, TOPIC_ACCOUNTS, TOPIC_ACCOUNTS_DLQ,
};

use crate::account::{
    sanitize_display_name, Account, AccountStatus, CreateAccountRequest, SatelliteKind,
    SatelliteLink, PARTNER_ID_METADATA_KEY, PARTNER_LOAN_ACCOUNT_TYPE,
};
use crate::ports::{AccountStore, ClassificationSource, PartnerDirectory, ProvisionedBatch};

/// Classification resolved for one mint, with the records needed downstream
/// (category for the pad width, sub-category for satellite configuration).
#[derive(Debug, Clone)]
pub(crate) struct ResolvedClassification {
    pub classification: Classification,
    pub category: Category,
    pub sub_category: SubCategory,
}

#[derive(Clone)]
pub struct ProvisioningEngine {
    store: Arc<dyn AccountStore>,
    classification: Arc<dyn ClassificationSource>,
    partners: Arc<dyn PartnerDirectory>,
    sequences: SequenceGenerator,
    gateway: EventGateway,
}

impl ProvisioningEngine {
    pub fn new(
        store: Arc<dyn AccountStore>,
        classification: Arc<dyn ClassificationSource>,
        partners: Arc<dyn PartnerDirectory>,
        sequences: SequenceGenerator,
        gateway: EventGateway,
    ) -> Self {
        Self {
            store,
            classification,
            partners,
            sequences,
            gateway,
        }
    }

    pub(crate) fn store(&self) -> &Arc<dyn AccountStore> {
        &self.store
    }

    pub(crate) fn classification_source(&self) -> &Arc<dyn ClassificationSource> {
        &self.classification
    }

    /// Provision an account: resolve classification, mint or accept a
    /// number, derive satellites, persist atomically, then publish and
    /// invalidate listings. Re-submitting an existing number is success and
    /// returns the existing record.
    pub fn create_account(
        &self,
        ctx: &CallContext,
        request: &CreateAccountRequest,
    ) -> LedgerResult<Account> {
        ctx.check()?;
        let resolved = self.resolve_classification(request)?;

        // A legacy core-banking id overrides any caller-supplied number.
        ctx.check()?;
        let account_number = match (&request.legacy_id, &request.account_number) {
            (Some(legacy), _) => legacy.clone(),
            (None, Some(number)) => number.clone(),
            (None, None) => self.mint_number(&resolved)?,
        };

        ctx.check()?;
        if let Some(existing) = self.store.find_by_number(&account_number)? {
            return self.return_existing(existing, request);
        }

        let primary = Account {
            account_number: account_number.clone(),
            owner_id: request.owner_id.clone(),
            account_type: request.account_type.clone(),
            classification: resolved.classification.clone(),
            status: AccountStatus::Active,
            display_name: sanitize_display_name(&request.display_name),
            alternate_id: request.alternate_id.clone(),
            legacy_id: request.legacy_id.clone(),
            metadata: request.metadata.clone(),
            created_at: Utc::now(),
        };

        let mut batch = ProvisionedBatch {
            accounts: vec![primary.clone()],
            links: Vec::new(),
        };
        self.derive_satellites(ctx, &primary, &resolved.sub_category, &mut batch)?;

        ctx.check()?;
        self.persist_and_publish(ctx, &batch)?;

        info!(
            account_number = %primary.account_number,
            owner_id = %primary.owner_id,
            satellites = batch.accounts.len() - 1,
            "account provisioned"
        );
        Ok(primary)
    }

    /// Migration import: complete an account record from the external
    /// partner system and funnel it through the normal create path with the
    /// legacy id set.
    pub fn import_account(&self, ctx: &CallContext, legacy_id: &str) -> LedgerResult<Account> {
        ctx.check()?;
        let record = self
            .partners
            .loan_account(legacy_id)?
            .ok_or_else(|| LedgerError::not_found(ResourceKind::Account, legacy_id))?;

        let sub_category = self.require_sub_category(&record.sub_category_code)?;
        let mut metadata = BTreeMap::new();
        metadata.insert("sector".to_string(), record.sector.clone());

        let request = CreateAccountRequest {
            owner_id: record.owner_id.clone(),
            display_name: record.owner_name.clone(),
            category_code: Some(sub_category.category_code.clone()),
            sub_category_code: Some(record.sub_category_code.clone()),
            alternate_id: record.alternate_id.clone(),
            legacy_id: Some(record.legacy_id.clone()),
            metadata,
            ..CreateAccountRequest::default()
        };
        self.create_account(ctx, &request)
    }

    /// Rename an account (sanitized).
    pub fn rename(
        &self,
        ctx: &CallContext,
        account_number: &str,
        display_name: &str,
    ) -> LedgerResult<Account> {
        self.update_account(ctx, account_number, |account| {
            account.display_name = sanitize_display_name(display_name);
            Ok(())
        })
    }

    pub fn set_alternate_id(
        &self,
        ctx: &CallContext,
        account_number: &str,
        alternate_id: &str,
    ) -> LedgerResult<Account> {
        self.update_account(ctx, account_number, |account| {
            account.alternate_id = Some(alternate_id.to_string());
            Ok(())
        })
    }

    /// Bind a legacy core-banking id. Fails with a conflict if the id is
    /// already bound to another account, or if this account is already
    /// bound to a different one.
    pub fn bind_legacy_id(
        &self,
        ctx: &CallContext,
        account_number: &str,
        legacy_id: &str,
    ) -> LedgerResult<Account> {
        ctx.check()?;
        if let Some(holder) = self.store.find_by_legacy_id(legacy_id)? {
            if holder.account_number != account_number {
                return Err(LedgerError::conflict(format!(
                    "legacy id {legacy_id} already bound to account {}",
                    holder.account_number
                )));
            }
        }
        self.update_account(ctx, account_number, |account| {
            match &account.legacy_id {
                Some(bound) if bound != legacy_id => Err(LedgerError::conflict(format!(
                    "account {} already bound to legacy id {bound}",
                    account.account_number
                ))),
                _ => {
                    account.legacy_id = Some(legacy_id.to_string());
                    Ok(())
                }
            }
        })
    }

    /// Move an account to another legal entity. The target entity must be
    /// active; the account number itself never changes.
    pub fn change_entity(
        &self,
        ctx: &CallContext,
        account_number: &str,
        entity_code: &str,
    ) -> LedgerResult<Account> {
        ctx.check()?;
        let entity = self
            .classification
            .entity(entity_code)?
            .ok_or_else(|| LedgerError::not_found(ResourceKind::Entity, entity_code))?;
        if !entity.is_active() {
            return Err(LedgerError::validation(format!(
                "entity {entity_code} is not active"
            )));
        }
        self.update_account(ctx, account_number, |account| {
            account.classification.entity_code = entity.code.clone();
            Ok(())
        })
    }

    fn update_account(
        &self,
        ctx: &CallContext,
        account_number: &str,
        mutate: impl FnOnce(&mut Account) -> LedgerResult<()>,
    ) -> LedgerResult<Account> {
        ctx.check()?;
        let mut account = self
            .store
            .find_by_number(account_number)?
            .ok_or_else(|| LedgerError::not_found(ResourceKind::Account, account_number))?;
        mutate(&mut account)?;

        ctx.check()?;
        self.store.update_account(&account)?;
        self.publish_updated(&account);
        self.invalidate_listings(std::slice::from_ref(&account));
        Ok(account)
    }

    // --- classification resolution -------------------------------------

    fn resolve_classification(
        &self,
        request: &CreateAccountRequest,
    ) -> LedgerResult<ResolvedClassification> {
        match request.account_type.as_deref() {
            Some(PARTNER_LOAN_ACCOUNT_TYPE) => self.resolve_partner_loan(request),
            Some(account_type) => self.resolve_by_account_type(account_type),
            None => self.resolve_direct(request),
        }
    }

    fn resolve_partner_loan(
        &self,
        request: &CreateAccountRequest,
    ) -> LedgerResult<ResolvedClassification> {
        let partner_id = request
            .metadata
            .get(PARTNER_ID_METADATA_KEY)
            .ok_or_else(|| {
                LedgerError::validation("partner-loan request is missing partner_id metadata")
            })?;
        let sub_code = self
            .classification
            .loan_sub_category_for_partner(partner_id)?
            .ok_or_else(|| LedgerError::not_found(ResourceKind::LoanPartner, partner_id))?;
        let sub_category = self.require_sub_category(&sub_code)?;
        self.finish_resolution(sub_category, None)
    }

    fn resolve_by_account_type(&self, account_type: &str) -> LedgerResult<ResolvedClassification> {
        let sub_category = self
            .classification
            .sub_category_by_account_type(account_type)?
            .ok_or_else(|| LedgerError::not_found(ResourceKind::SubCategory, account_type))?;
        let product = self
            .classification
            .product_type(account_type)?
            .ok_or_else(|| LedgerError::not_found(ResourceKind::ProductType, account_type))?;
        self.finish_resolution(sub_category, Some(product.code))
    }

    fn resolve_direct(&self, request: &CreateAccountRequest) -> LedgerResult<ResolvedClassification> {
        let category_code = request
            .category_code
            .as_deref()
            .ok_or_else(|| LedgerError::validation("category code is required"))?;
        let sub_category_code = request
            .sub_category_code
            .as_deref()
            .ok_or_else(|| LedgerError::validation("sub-category code is required"))?;

        let category = self
            .classification
            .category(category_code)?
            .ok_or_else(|| LedgerError::not_found(ResourceKind::Category, category_code))?;
        let sub_category = self.require_sub_category(sub_category_code)?;
        if sub_category.category_code != category.code {
            return Err(LedgerError::validation(format!(
                "sub-category {sub_category_code} does not belong to category {category_code}"
            )));
        }

        let entity_code = request
            .entity_code
            .clone()
            .unwrap_or_else(|| sub_category.entity_code.clone());
        let entity = self
            .classification
            .entity(&entity_code)?
            .ok_or_else(|| LedgerError::not_found(ResourceKind::Entity, &entity_code))?;
        if !entity.is_active() {
            return Err(LedgerError::validation(format!(
                "entity {entity_code} is not active"
            )));
        }

        let currency_code = request
            .currency
            .clone()
            .unwrap_or_else(|| sub_category.currency.clone());
        self.classification
            .currency(&currency_code)?
            .ok_or_else(|| LedgerError::not_found(ResourceKind::Currency, &currency_code))?;

        Ok(ResolvedClassification {
            classification: Classification {
                category_code: category.code.clone(),
                sub_category_code: sub_category.code.clone(),
                product_code: None,
                entity_code,
                currency: currency_code,
            },
            category,
            sub_category,
        })
    }

    /// Complete resolution from a configured sub-category record. The
    /// record's entity and currency are product configuration and are
    /// taken as-is.
    fn finish_resolution(
        &self,
        sub_category: SubCategory,
        product_code: Option<String>,
    ) -> LedgerResult<ResolvedClassification> {
        let category = self
            .classification
            .category(&sub_category.category_code)?
            .ok_or_else(|| {
                LedgerError::not_found(ResourceKind::Category, &sub_category.category_code)
            })?;
        Ok(ResolvedClassification {
            classification: Classification {
                category_code: category.code.clone(),
                sub_category_code: sub_category.code.clone(),
                product_code,
                entity_code: sub_category.entity_code.clone(),
                currency: sub_category.currency.clone(),
            },
            category,
            sub_category,
        })
    }

    fn require_sub_category(&self, code: &str) -> LedgerResult<SubCategory> {
        self.classification
            .sub_category(code)?
            .ok_or_else(|| LedgerError::not_found(ResourceKind::SubCategory, code))
    }

    // --- minting -------------------------------------------------------

    fn mint_number(&self, resolved: &ResolvedClassification) -> LedgerResult<String> {
        let sequence = self
            .sequences
            .next(&category_scope(&resolved.category.code))?;
        encode_account_number(
            &resolved.category.code,
            Some(&resolved.classification.entity_code),
            resolved.category.pad_width,
            sequence,
        )
    }

    /// Mint (but do not persist) one account under `sub_category_code` for
    /// `owner_id`, through the same classification + sequence path as a
    /// primary account.
    pub(crate) fn mint_account(
        &self,
        ctx: &CallContext,
        owner_id: &str,
        sub_category_code: &str,
        display_name: &str,
        alternate_id: Option<String>,
    ) -> LedgerResult<Account> {
        ctx.check()?;
        let sub_category = self.require_sub_category(sub_category_code)?;
        let resolved = self.finish_resolution(sub_category, None)?;
        let account_number = self.mint_number(&resolved)?;
        Ok(Account {
            account_number,
            owner_id: owner_id.to_string(),
            account_type: None,
            classification: resolved.classification,
            status: AccountStatus::Active,
            display_name: sanitize_display_name(display_name),
            alternate_id,
            legacy_id: None,
            metadata: BTreeMap::new(),
            created_at: Utc::now(),
        })
    }

    fn derive_satellites(
        &self,
        ctx: &CallContext,
        primary: &Account,
        sub_category: &SubCategory,
        batch: &mut ProvisionedBatch,
    ) -> LedgerResult<()> {
        if let Some(code) = &sub_category.invested_sub_category {
            let satellite =
                self.mint_account(ctx, &primary.owner_id, code, &primary.display_name, None)?;
            batch.links.push(SatelliteLink {
                primary_number: primary.account_number.clone(),
                satellite_number: satellite.account_number.clone(),
                kind: SatelliteKind::Invested,
            });
            batch.accounts.push(satellite);
        }
        if let Some(code) = &sub_category.receivables_sub_category {
            let satellite =
                self.mint_account(ctx, &primary.owner_id, code, &primary.display_name, None)?;
            batch.links.push(SatelliteLink {
                primary_number: primary.account_number.clone(),
                satellite_number: satellite.account_number.clone(),
                kind: SatelliteKind::Receivables,
            });
            batch.accounts.push(satellite);
        }
        if let Some(code) = &sub_category.advance_sub_category {
            let alternate = compose_advance_alternate_id(
                &primary.account_number,
                primary.alternate_id.as_deref(),
            );
            let satellite = self.mint_account(
                ctx,
                &primary.owner_id,
                code,
                &primary.display_name,
                Some(alternate),
            )?;
            batch.links.push(SatelliteLink {
                primary_number: primary.account_number.clone(),
                satellite_number: satellite.account_number.clone(),
                kind: SatelliteKind::LoanAdvance,
            });
            batch.accounts.push(satellite);
        }
        Ok(())
    }

    // --- persist / publish / invalidate --------------------------------

    /// Persist one atomic batch, then publish created events (best-effort)
    /// and invalidate cached listings. Store errors surface verbatim and
    /// nothing from the batch becomes visible.
    pub(crate) fn persist_and_publish(
        &self,
        ctx: &CallContext,
        batch: &ProvisionedBatch,
    ) -> LedgerResult<()> {
        self.store.persist_provisioned(batch)?;

        // The commit is durable; from here on, cancellation and publish
        // failures no longer affect the outcome of the call.
        for account in &batch.accounts {
            if ctx.check().is_err() {
                warn!(
                    account_number = %account.account_number,
                    "cancelled after commit, remaining account events skipped"
                );
                break;
            }
            let event = created_event(account);
            if let Err(err) = self.gateway.publish_or_dead_letter(
                TOPIC_ACCOUNTS,
                TOPIC_ACCOUNTS_DLQ,
                &account.account_number,
                &event,
            ) {
                error!(
                    account_number = %account.account_number,
                    %err,
                    "account event lost: dead letter unreachable"
                );
            }
        }

        self.invalidate_listings(&batch.accounts);
        Ok(())
    }

    fn return_existing(
        &self,
        mut existing: Account,
        request: &CreateAccountRequest,
    ) -> LedgerResult<Account> {
        // The external core-banking system may have created this account
        // before we were called; that is success, not a conflict.
        if let Some(alternate) = &request.alternate_id {
            if existing.alternate_id.as_deref() != Some(alternate) {
                existing.alternate_id = Some(alternate.clone());
                self.store.update_account(&existing)?;
                self.publish_updated(&existing);
                self.invalidate_listings(std::slice::from_ref(&existing));
            }
        }
        info!(
            account_number = %existing.account_number,
            "create was idempotent, returning existing account"
        );
        Ok(existing)
    }

    fn publish_updated(&self, account: &Account) {
        let event = AccountUpdated {
            event_id: Uuid::now_v7(),
            account_number: account.account_number.clone(),
            owner_id: account.owner_id.clone(),
            classification: account.classification.clone(),
            display_name: account.display_name.clone(),
            alternate_id: account.alternate_id.clone(),
            legacy_id: account.legacy_id.clone(),
            updated_at: Utc::now(),
        };
        if let Err(err) = self.gateway.publish_or_dead_letter(
            TOPIC_ACCOUNTS,
            TOPIC_ACCOUNTS_DLQ,
            &account.account_number,
            &event,
        ) {
            error!(account_number = %account.account_number, %err, "account update event lost");
        }
    }

    fn invalidate_listings(&self, accounts: &[Account]) {
        let mut keys: Vec<String> = Vec::new();
        for account in accounts {
            keys.push(format!("accounts_owner_{}", account.owner_id));
            keys.push(format!(
                "accounts_subcat_{}",
                account.classification.sub_category_code
            ));
            if let Some(alternate) = &account.alternate_id {
                keys.push(format!("accounts_alt_{alternate}"));
            }
            if let Some(account_type) = &account.account_type {
                keys.push(format!("accounts_type_{account_type}"));
            }
        }
        keys.sort();
        keys.dedup();
        let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        if let Err(err) = self.sequences.cache().delete(&refs) {
            warn!(%err, "listing cache invalidation skipped");
        }
    }
}

impl core::fmt::Debug for ProvisioningEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProvisioningEngine").finish_non_exhaustive()
    }
}

/// Alternate id of a loan-advance satellite: the primary account number,
/// suffixed with the caller's alternate id when one was supplied.
pub(crate) fn compose_advance_alternate_id(
    primary_number: &str,
    caller_alternate: Option<&str>,
) -> String {
    match caller_alternate {
        Some(alternate) => format!("{primary_number}-{alternate}"),
        None => primary_number.to_string(),
    }
}

fn created_event(account: &Account) -> AccountCreated {
    AccountCreated {
        event_id: Uuid::now_v7(),
        account_number: account.account_number.clone(),
        owner_id: account.owner_id.clone(),
        account_type: account.account_type.clone(),
        classification: account.classification.clone(),
        display_name: account.display_name.clone(),
        alternate_id: account.alternate_id.clone(),
        legacy_id: account.legacy_id.clone(),
        created_at: account.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::{harness, request_131, Harness};
    use ledgerpost_core::EntityStatus;

    #[test]
    fn mints_the_documented_account_number() {
        let h = harness();
        let account = h
            .engine
            .create_account(&CallContext::background(), &request_131())
            .unwrap();
        assert_eq!(account.account_number, "1310010000001");
        assert_eq!(account.classification.entity_code, "001");
        assert_eq!(account.status, AccountStatus::Active);

        // Listing caches are invalidated after the commit.
        let deleted = h.cache.deleted.lock().unwrap();
        assert!(deleted.contains(&"accounts_owner_12345".to_string()));
        assert!(deleted.contains(&"accounts_subcat_13112".to_string()));
    }

    #[test]
    fn create_is_idempotent_on_account_number() {
        let h = harness();
        let ctx = CallContext::background();
        let first = h.engine.create_account(&ctx, &request_131()).unwrap();

        let mut repeat = request_131();
        repeat.account_number = Some(first.account_number.clone());
        let second = h.engine.create_account(&ctx, &repeat).unwrap();

        assert_eq!(second.account_number, first.account_number);
        assert_eq!(h.store.account_count(), 1);
    }

    #[test]
    fn idempotent_create_patches_a_newly_supplied_alternate_id() {
        let h = harness();
        let ctx = CallContext::background();
        let first = h.engine.create_account(&ctx, &request_131()).unwrap();
        assert_eq!(first.alternate_id, None);

        let mut repeat = request_131();
        repeat.account_number = Some(first.account_number.clone());
        repeat.alternate_id = Some("ALT-9".to_string());
        let second = h.engine.create_account(&ctx, &repeat).unwrap();

        assert_eq!(second.alternate_id.as_deref(), Some("ALT-9"));
        let stored = h.store.find_by_number(&first.account_number).unwrap().unwrap();
        assert_eq!(stored.alternate_id.as_deref(), Some("ALT-9"));
    }

    #[test]
    fn legacy_id_overrides_the_caller_supplied_number() {
        let h = harness();
        let mut request = request_131();
        request.account_number = Some("9999999999999".to_string());
        request.legacy_id = Some("L-777".to_string());

        let account = h
            .engine
            .create_account(&CallContext::background(), &request)
            .unwrap();
        assert_eq!(account.account_number, "L-777");
    }

    #[test]
    fn missing_sub_category_is_a_specific_not_found() {
        let h = harness();
        let mut request = request_131();
        request.sub_category_code = Some("99999".to_string());

        let err = h
            .engine
            .create_account(&CallContext::background(), &request)
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::not_found(ResourceKind::SubCategory, "99999")
        );
    }

    #[test]
    fn inactive_entity_is_rejected_before_any_write() {
        let h: Harness = harness();
        h.classification
            .set_entity_status("001", EntityStatus::Inactive);

        let err = h
            .engine
            .create_account(&CallContext::background(), &request_131())
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert_eq!(h.store.account_count(), 0);
    }

    #[test]
    fn lender_sub_category_mints_the_satellite_triple_atomically() {
        let h = harness();
        let mut request = request_131();
        request.sub_category_code = Some("13150".to_string());

        let primary = h
            .engine
            .create_account(&CallContext::background(), &request)
            .unwrap();

        // Primary + invested + receivables, linked in the same unit.
        assert_eq!(h.store.account_count(), 3);
        let links = h.store.links_of(&primary.account_number);
        assert_eq!(links.len(), 2);
        assert!(links.iter().any(|l| l.kind == SatelliteKind::Invested));
        assert!(links.iter().any(|l| l.kind == SatelliteKind::Receivables));
    }

    #[test]
    fn advance_satellite_composes_its_alternate_id() {
        let h = harness();
        let mut request = request_131();
        request.sub_category_code = Some("13160".to_string());
        request.alternate_id = Some("C-42".to_string());

        let primary = h
            .engine
            .create_account(&CallContext::background(), &request)
            .unwrap();

        let links = h.store.links_of(&primary.account_number);
        assert_eq!(links.len(), 1);
        let advance = h
            .store
            .find_by_number(&links[0].satellite_number)
            .unwrap()
            .unwrap();
        assert_eq!(
            advance.alternate_id,
            Some(format!("{}-C-42", primary.account_number))
        );
    }

    #[test]
    fn persist_failure_rolls_back_the_whole_unit() {
        let h = harness();
        let mut request = request_131();
        request.sub_category_code = Some("13150".to_string());
        h.store.fail_next_persist();

        let err = h
            .engine
            .create_account(&CallContext::background(), &request)
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(h.store.account_count(), 0);
        assert!(h.publisher.published_to(TOPIC_ACCOUNTS).is_empty());
    }

    #[test]
    fn partner_loan_path_requires_partner_metadata() {
        let h = harness();
        let mut request = request_131();
        request.category_code = None;
        request.sub_category_code = None;
        request.account_type = Some(PARTNER_LOAN_ACCOUNT_TYPE.to_string());

        let err = h
            .engine
            .create_account(&CallContext::background(), &request)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn partner_loan_path_resolves_the_partner_sub_category() {
        let h = harness();
        let mut request = request_131();
        request.category_code = None;
        request.sub_category_code = None;
        request.account_type = Some(PARTNER_LOAN_ACCOUNT_TYPE.to_string());
        request
            .metadata
            .insert(PARTNER_ID_METADATA_KEY.to_string(), "P-1".to_string());

        let account = h
            .engine
            .create_account(&CallContext::background(), &request)
            .unwrap();
        assert_eq!(account.classification.sub_category_code, "13170");
    }

    #[test]
    fn unknown_partner_mapping_is_a_specific_not_found() {
        let h = harness();
        let mut request = request_131();
        request.category_code = None;
        request.sub_category_code = None;
        request.account_type = Some(PARTNER_LOAN_ACCOUNT_TYPE.to_string());
        request
            .metadata
            .insert(PARTNER_ID_METADATA_KEY.to_string(), "P-404".to_string());

        let err = h
            .engine
            .create_account(&CallContext::background(), &request)
            .unwrap_err();
        assert_eq!(err, LedgerError::not_found(ResourceKind::LoanPartner, "P-404"));
    }

    #[test]
    fn account_type_path_resolves_product_classification() {
        let h = harness();
        let mut request = request_131();
        request.category_code = None;
        request.sub_category_code = None;
        request.account_type = Some("TERM_DEPOSIT".to_string());

        let account = h
            .engine
            .create_account(&CallContext::background(), &request)
            .unwrap();
        assert_eq!(account.classification.product_code.as_deref(), Some("TERM_DEPOSIT"));
        assert_eq!(account.classification.sub_category_code, "13140");
    }

    #[test]
    fn created_events_are_published_per_minted_account() {
        let h = harness();
        let mut request = request_131();
        request.sub_category_code = Some("13150".to_string());

        h.engine
            .create_account(&CallContext::background(), &request)
            .unwrap();
        assert_eq!(h.publisher.published_to(TOPIC_ACCOUNTS).len(), 3);
    }

    #[test]
    fn publish_failure_does_not_fail_the_create() {
        let h = harness();
        h.publisher.fail_topic(TOPIC_ACCOUNTS);

        let account = h
            .engine
            .create_account(&CallContext::background(), &request_131())
            .unwrap();
        assert_eq!(h.store.account_count(), 1);
        let parked = h.publisher.published_to(TOPIC_ACCOUNTS_DLQ);
        assert_eq!(parked.len(), 1);
        assert_eq!(parked[0].0, account.account_number);
    }

    #[test]
    fn bind_legacy_id_conflicts_when_bound_elsewhere() {
        let h = harness();
        let ctx = CallContext::background();
        let first = h.engine.create_account(&ctx, &request_131()).unwrap();
        let second = h.engine.create_account(&ctx, &request_131()).unwrap();

        h.engine
            .bind_legacy_id(&ctx, &first.account_number, "L-1")
            .unwrap();
        let err = h
            .engine
            .bind_legacy_id(&ctx, &second.account_number, "L-1")
            .unwrap_err();
        assert!(matches!(err, LedgerError::Conflict(_)));
    }

    #[test]
    fn rename_sanitizes_the_new_name() {
        let h = harness();
        let ctx = CallContext::background();
        let account = h.engine.create_account(&ctx, &request_131()).unwrap();

        let renamed = h
            .engine
            .rename(&ctx, &account.account_number, "New*  Name!!")
            .unwrap();
        assert_eq!(renamed.display_name, "New Name");
    }

    #[test]
    fn change_entity_requires_an_active_target() {
        let h = harness();
        let ctx = CallContext::background();
        let account = h.engine.create_account(&ctx, &request_131()).unwrap();
        h.classification
            .set_entity_status("002", EntityStatus::Inactive);

        let err = h
            .engine
            .change_entity(&ctx, &account.account_number, "002")
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[test]
    fn import_completes_the_record_from_the_partner_system() {
        let h = harness();
        let account = h
            .engine
            .import_account(&CallContext::background(), "L-500")
            .unwrap();
        assert_eq!(account.account_number, "L-500");
        assert_eq!(account.owner_id, "OWNER-500");
        assert_eq!(account.metadata.get("sector").map(String::as_str), Some("AGRI"));
    }

    #[test]
    fn cancelled_context_aborts_before_any_write() {
        let h = harness();
        let ctx = CallContext::background();
        ctx.cancel_handle().cancel();

        let err = h.engine.create_account(&ctx, &request_131()).unwrap_err();
        assert!(matches!(err, LedgerError::Cancelled(_)));
        assert_eq!(h.store.account_count(), 0);
    }
}
