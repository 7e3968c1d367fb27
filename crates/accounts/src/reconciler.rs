//! Account relationship reconciler.
//!
//! Resolves satellite linkage when candidate counterpart accounts may
//! already exist for an owner, e.g. after out-of-order creation by an
//! external system. Selection is first-created-wins: scanning candidates in
//! retrieval order, the first one created at or before the primary account
//! wins; a new satellite is minted only when no candidate qualifies.

use tracing::info;

use ledgerpost_core::{CallContext, LedgerError, LedgerResult, ResourceKind};

use crate::account::{Account, SatelliteKind, SatelliteLink};
use crate::ports::ProvisionedBatch;
use crate::provisioning::{compose_advance_alternate_id, ProvisioningEngine};

#[derive(Debug, Clone)]
pub struct RelationshipReconciler {
    engine: ProvisioningEngine,
}

impl RelationshipReconciler {
    pub fn new(engine: ProvisioningEngine) -> Self {
        Self { engine }
    }

    /// Link `primary` to a satellite of the given kind, reusing an existing
    /// counterpart account when one qualifies. Returns the satellite's
    /// account number. The link row (and the satellite, when minted) is
    /// persisted in one atomic unit.
    pub fn link_satellite(
        &self,
        ctx: &CallContext,
        primary: &Account,
        kind: SatelliteKind,
    ) -> LedgerResult<String> {
        ctx.check()?;
        let sub_category = self
            .engine
            .classification_source()
            .sub_category(&primary.classification.sub_category_code)?
            .ok_or_else(|| {
                LedgerError::not_found(
                    ResourceKind::SubCategory,
                    &primary.classification.sub_category_code,
                )
            })?;

        let target_code = match kind {
            SatelliteKind::Invested => sub_category.invested_sub_category,
            SatelliteKind::Receivables => sub_category.receivables_sub_category,
            SatelliteKind::LoanAdvance => sub_category.advance_sub_category,
        }
        .ok_or_else(|| {
            LedgerError::validation(format!(
                "sub-category {} has no {kind:?} satellite configured",
                primary.classification.sub_category_code
            ))
        })?;

        ctx.check()?;
        let candidates = self
            .engine
            .store()
            .find_by_owner_and_sub_category(&primary.owner_id, &target_code)?;

        let chosen = match candidates.len() {
            0 => None,
            1 => Some(candidates[0].clone()),
            // First candidate in retrieval order that pre-dates (or ties)
            // the primary; deliberately not the true minimum.
            _ => candidates
                .iter()
                .find(|c| c.created_at <= primary.created_at)
                .cloned(),
        };

        match chosen {
            Some(existing) => {
                let batch = ProvisionedBatch {
                    accounts: Vec::new(),
                    links: vec![SatelliteLink {
                        primary_number: primary.account_number.clone(),
                        satellite_number: existing.account_number.clone(),
                        kind,
                    }],
                };
                self.engine.persist_and_publish(ctx, &batch)?;
                info!(
                    primary = %primary.account_number,
                    satellite = %existing.account_number,
                    ?kind,
                    "linked existing satellite account"
                );
                Ok(existing.account_number)
            }
            None => {
                let alternate = match kind {
                    SatelliteKind::LoanAdvance => Some(compose_advance_alternate_id(
                        &primary.account_number,
                        primary.alternate_id.as_deref(),
                    )),
                    _ => None,
                };
                let satellite = self.engine.mint_account(
                    ctx,
                    &primary.owner_id,
                    &target_code,
                    &primary.display_name,
                    alternate,
                )?;
                let batch = ProvisionedBatch {
                    accounts: vec![satellite.clone()],
                    links: vec![SatelliteLink {
                        primary_number: primary.account_number.clone(),
                        satellite_number: satellite.account_number.clone(),
                        kind,
                    }],
                };
                self.engine.persist_and_publish(ctx, &batch)?;
                info!(
                    primary = %primary.account_number,
                    satellite = %satellite.account_number,
                    ?kind,
                    "minted satellite account"
                );
                Ok(satellite.account_number)
            }
        }
    }
}
