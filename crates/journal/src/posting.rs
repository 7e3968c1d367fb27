//! Journal posting engine.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use tracing::{error, info, warn};
use uuid::Uuid;

use ledgerpost_core::{
    CallContext, LedgerError, LedgerResult, ResourceKind, SequenceGenerator, SPLIT_ID_SCOPE,
};
use ledgerpost_events::{
    Delivery, EntryCreated, EventGateway, TOPIC_JOURNAL_ENTRIES, TOPIC_JOURNAL_ENTRIES_DLQ,
};

use crate::amount::to_minor_units;
use crate::ports::{
    AccountDirectory, AdjustmentJob, AdjustmentScheduler, CurrencySource, JournalStore,
    PostingBatch, TrialBalanceStore,
};
use crate::transaction::{
    ensure_not_future, parse_posting_date, JournalDetail, JournalRequest, Split, SplitAccountLink,
    TransactionHeader,
};

/// Enables the automatic trial-balance adjustment side effect.
#[derive(Clone)]
pub struct TrialBalanceHook {
    pub store: Arc<dyn TrialBalanceStore>,
    pub scheduler: Arc<dyn AdjustmentScheduler>,
}

#[derive(Clone)]
pub struct PostingEngine {
    store: Arc<dyn JournalStore>,
    accounts: Arc<dyn AccountDirectory>,
    currencies: Arc<dyn CurrencySource>,
    sequences: SequenceGenerator,
    gateway: EventGateway,
    trial_balance: Option<TrialBalanceHook>,
}

impl PostingEngine {
    pub fn new(
        store: Arc<dyn JournalStore>,
        accounts: Arc<dyn AccountDirectory>,
        currencies: Arc<dyn CurrencySource>,
        sequences: SequenceGenerator,
        gateway: EventGateway,
    ) -> Self {
        Self {
            store,
            accounts,
            currencies,
            sequences,
            gateway,
            trial_balance: None,
        }
    }

    pub fn with_trial_balance(mut self, hook: TrialBalanceHook) -> Self {
        self.trial_balance = Some(hook);
        self
    }

    /// Post one journal transaction: validate, expand into splits, persist
    /// the whole posting atomically, then emit one entry-created event per
    /// split in line-item order.
    pub fn post_journal(
        &self,
        ctx: &CallContext,
        request: &JournalRequest,
    ) -> LedgerResult<Vec<EntryCreated>> {
        ctx.check()?;
        if request.line_items.is_empty() {
            return Err(LedgerError::validation("journal request has no line items"));
        }
        if self.store.transaction_exists(&request.transaction_id)? {
            return Err(LedgerError::conflict(format!(
                "transaction id {} already posted",
                request.transaction_id
            )));
        }

        let today = Utc::now().date_naive();
        let transaction_date = parse_posting_date(&request.transaction_date)?;
        ensure_not_future(transaction_date, today)?;
        let processing_date = parse_posting_date(&request.processing_date)?;
        ensure_not_future(processing_date, today)?;

        ctx.check()?;
        let currency = self
            .currencies
            .currency(&request.currency)?
            .ok_or_else(|| LedgerError::not_found(ResourceKind::Currency, &request.currency))?;

        let booked_at = Utc::now();
        let day_prefix = transaction_date.format("%Y%m%d").to_string();
        let mut splits = Vec::with_capacity(request.line_items.len());
        let mut links = Vec::with_capacity(request.line_items.len());
        let mut details = Vec::with_capacity(request.line_items.len());
        let mut entity_codes = Vec::with_capacity(request.line_items.len());

        for item in &request.line_items {
            ctx.check()?;
            if item.amount <= Decimal::ZERO {
                return Err(LedgerError::validation(format!(
                    "line amount must be positive, got {}",
                    item.amount
                )));
            }
            let sequence = self.sequences.next(SPLIT_ID_SCOPE)?;
            let split_id = format!("{day_prefix}{sequence:08}");
            let snapshot = self
                .accounts
                .account_snapshot(&item.account_number)?
                .ok_or_else(|| {
                    LedgerError::not_found(ResourceKind::Account, &item.account_number)
                })?;
            let magnitude = to_minor_units(item.amount, currency.decimals)?;
            let amount_minor = if item.is_debit { magnitude } else { -magnitude };
            let description = item.description.clone().unwrap_or_default();

            entity_codes.push(snapshot.classification.entity_code.clone());
            splits.push(Split {
                split_id: split_id.clone(),
                split_date: transaction_date,
                description: description.clone(),
                currency: currency.code.clone(),
                amount_minor,
                account_number: snapshot.account_number.clone(),
                transaction_id: request.transaction_id.clone(),
            });
            links.push(SplitAccountLink {
                split_id: split_id.clone(),
                account_number: snapshot.account_number.clone(),
            });
            details.push(JournalDetail {
                split_id,
                transaction_id: request.transaction_id.clone(),
                reference_number: request.reference_number.clone(),
                account_number: snapshot.account_number,
                classification: snapshot.classification,
                is_debit: item.is_debit,
                amount_minor,
                currency: currency.code.clone(),
                description,
                split_date: transaction_date,
                booked_at,
            });
        }

        ensure_balanced_entities(&entity_codes)?;

        let batch = PostingBatch {
            transaction: TransactionHeader {
                transaction_id: request.transaction_id.clone(),
                reference_number: request.reference_number.clone(),
                order_type: request.order_type.clone(),
                transaction_date,
                processing_date,
                currency: currency.code.clone(),
                booked_at,
            },
            splits,
            links,
            details,
        };

        ctx.check()?;
        self.store.persist_posting(&batch)?;
        info!(
            transaction_id = %request.transaction_id,
            splits = batch.splits.len(),
            "journal transaction posted"
        );

        let events = self.emit_entries(ctx, &batch.details);
        self.maybe_schedule_adjustment(&batch.transaction, today);
        Ok(events)
    }

    /// Emit entry-created events in line-item order. The commit is already
    /// durable: a failed (or cancelled) publish dead-letters that entry and
    /// stops delivery of the remaining entries from this call; the caller
    /// still receives every created entry.
    fn emit_entries(&self, ctx: &CallContext, details: &[JournalDetail]) -> Vec<EntryCreated> {
        let mut events = Vec::with_capacity(details.len());
        let mut deliver = true;
        for detail in details {
            let event = entry_event(detail);
            if deliver {
                if let Err(cancel) = ctx.check() {
                    warn!(split_id = %event.split_id, "cancelled after commit, dead-lettering entry");
                    if let Err(err) = self.gateway.dead_letter(
                        TOPIC_JOURNAL_ENTRIES,
                        TOPIC_JOURNAL_ENTRIES_DLQ,
                        &event.split_id,
                        &event,
                        &cancel.to_string(),
                    ) {
                        error!(split_id = %event.split_id, %err, "entry event lost");
                    }
                    deliver = false;
                } else {
                    match self.gateway.publish_or_dead_letter(
                        TOPIC_JOURNAL_ENTRIES,
                        TOPIC_JOURNAL_ENTRIES_DLQ,
                        &event.split_id,
                        &event,
                    ) {
                        Ok(Delivery::Delivered) => {}
                        Ok(Delivery::DeadLettered { .. }) => deliver = false,
                        Err(err) => {
                            error!(split_id = %event.split_id, %err, "entry event lost");
                            deliver = false;
                        }
                    }
                }
            }
            events.push(event);
        }
        events
    }

    /// Trial-balance side effect: for a non-today transaction whose
    /// year-month has an open period not yet adjusted today, mark it and
    /// submit the adjustment job fire-and-forget. Failures are logged,
    /// never propagated.
    fn maybe_schedule_adjustment(&self, header: &TransactionHeader, today: NaiveDate) {
        let Some(hook) = &self.trial_balance else {
            return;
        };
        if header.transaction_date == today {
            return;
        }
        let outcome = (|| -> LedgerResult<bool> {
            let Some(period) = hook
                .store
                .open_period(header.transaction_date.year(), header.transaction_date.month())?
            else {
                return Ok(false);
            };
            if !hook.store.mark_adjusted(&period.id, today)? {
                return Ok(false);
            }
            hook.scheduler.submit(AdjustmentJob {
                period_id: period.id,
                year: header.transaction_date.year(),
                month: header.transaction_date.month(),
                transaction_id: header.transaction_id.clone(),
                submitted_at: Utc::now(),
            })?;
            Ok(true)
        })();
        match outcome {
            Ok(true) => info!(
                transaction_id = %header.transaction_id,
                "trial balance adjustment scheduled"
            ),
            Ok(false) => {}
            Err(err) => warn!(
                transaction_id = %header.transaction_id,
                %err,
                "trial balance adjustment skipped"
            ),
        }
    }
}

impl core::fmt::Debug for PostingEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PostingEngine")
            .field("trial_balance", &self.trial_balance.is_some())
            .finish_non_exhaustive()
    }
}

/// Balanced-entity invariant: the list must have even length and each
/// consecutive pair must resolve to the same legal entity.
fn ensure_balanced_entities(entity_codes: &[String]) -> LedgerResult<()> {
    if entity_codes.len() % 2 != 0 {
        return Err(LedgerError::invariant(format!(
            "line items must pair into debit/credit entries, got {}",
            entity_codes.len()
        )));
    }
    for (pair, codes) in entity_codes.chunks_exact(2).enumerate() {
        if codes[0] != codes[1] {
            return Err(LedgerError::invariant(format!(
                "entity mismatch in pair {pair}: {} vs {}",
                codes[0], codes[1]
            )));
        }
    }
    Ok(())
}

fn entry_event(detail: &JournalDetail) -> EntryCreated {
    EntryCreated {
        event_id: Uuid::now_v7(),
        split_id: detail.split_id.clone(),
        transaction_id: detail.transaction_id.clone(),
        reference_number: detail.reference_number.clone(),
        account_number: detail.account_number.clone(),
        classification: detail.classification.clone(),
        is_debit: detail.is_debit,
        amount_minor: detail.amount_minor,
        currency: detail.currency.clone(),
        description: detail.description.clone(),
        split_date: detail.split_date,
        booked_at: detail.booked_at,
    }
}
