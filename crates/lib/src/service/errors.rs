//! Error types raised by the aggregation service itself.
//!
//! Store errors pass through the service unchanged; these cover the cases that
//! only exist at the aggregate level.

use thiserror::Error;

use super::cascade::{CascadeFailure, CascadeReport};

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ServiceError {
    /// One or more cascade steps failed. The remaining steps still ran;
    /// `report` shows what was removed.
    #[error("Cascade delete of account {account_id} failed in {} step(s)", failures.len())]
    PartialCascadeFailure {
        account_id: String,
        failures: Vec<CascadeFailure>,
        report: CascadeReport,
    },

    #[error("Export format '{format}' is not supported")]
    UnsupportedExportFormat { format: String },
}

impl ServiceError {
    pub fn is_cascade_failure(&self) -> bool {
        matches!(self, ServiceError::PartialCascadeFailure { .. })
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, ServiceError::UnsupportedExportFormat { .. })
    }
}

impl From<ServiceError> for crate::Error {
    fn from(err: ServiceError) -> Self {
        crate::Error::Service(err)
    }
}
