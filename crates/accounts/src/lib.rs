//! `ledgerpost-accounts` — account provisioning for the posting core.
//!
//! Covers deterministic account minting, idempotent creation, satellite
//! account derivation, explicit update operations, migration import, and
//! first-created-wins satellite reconciliation.

pub mod account;
pub mod ports;
pub mod provisioning;
pub mod reconciler;

#[cfg(test)]
pub(crate) mod testkit;

pub use account::{
    sanitize_display_name, Account, AccountStatus, CreateAccountRequest, SatelliteKind,
    SatelliteLink, PARTNER_LOAN_ACCOUNT_TYPE,
};
pub use ports::{
    AccountStore, ClassificationSource, PartnerDirectory, PartnerLoanRecord, ProvisionedBatch,
};
pub use provisioning::ProvisioningEngine;
pub use reconciler::RelationshipReconciler;
