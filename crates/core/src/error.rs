//! Error model for the posting core.

use thiserror::Error;

/// Result type used across the posting core.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// The kind of reference record a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Category,
    SubCategory,
    ProductType,
    Entity,
    Currency,
    Account,
    LoanPartner,
    TrialBalancePeriod,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Category => "category",
            ResourceKind::SubCategory => "sub-category",
            ResourceKind::ProductType => "product type",
            ResourceKind::Entity => "entity",
            ResourceKind::Currency => "currency",
            ResourceKind::Account => "account",
            ResourceKind::LoanPartner => "loan partner mapping",
            ResourceKind::TrialBalancePeriod => "trial balance period",
        }
    }
}

impl core::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed error surfaced by every engine operation.
///
/// Lookup and validation failures abort a request before any write. Store
/// failures abort and roll back the atomic unit. Publish failures after a
/// durable commit are NOT represented here from the caller's point of view;
/// they are dead-lettered inside the gateway.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Malformed input (bad date, empty line-item list, unparseable amount).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A reference record or account was not found.
    #[error("{kind} not found: {code}")]
    NotFound { kind: ResourceKind, code: String },

    /// Duplicate transaction id, legacy id bound elsewhere, or similar clash.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A posting-core invariant was violated (unbalanced entity pairing,
    /// sequence overflow against the pad width).
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// A collaborator (counter cache, store, publisher) was unreachable.
    /// Retryable from the caller's perspective.
    #[error("infrastructure failure: {0}")]
    Infrastructure(String),

    /// The caller's deadline expired or the call was cancelled.
    #[error("call cancelled: {0}")]
    Cancelled(String),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(kind: ResourceKind, code: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            code: code.into(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn infrastructure(msg: impl Into<String>) -> Self {
        Self::Infrastructure(msg.into())
    }

    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Whether a retry of the whole call may succeed without input changes.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Infrastructure(_))
    }
}
