//! The coordinator's error vocabulary (spec §7), one variant per
//! client-visible failure kind. Every upstream crate's error type gets a
//! `From` impl here so `?` composes across crate boundaries without
//! manual mapping at call sites — the way the teacher splits
//! `SigningFailureReason`/`KeygenFailureReason` by concern instead of
//! flattening everything into one enum, except here the concerns are
//! already separated by crate and this is the join point.

use gv_chains::ChainError;
use gv_curve::CurveError;
use gv_multisig::InvalidContributionReason;
use gv_primitives::DecimalUintError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("bad input: {0}")]
    BadInput(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("state conflict: {0}")]
    StateConflict(String),

    #[error("submitting guardian does not match the authenticated session")]
    IdentityMismatch,

    #[error("invalid contribution in {stage}: {reason}")]
    InvalidContribution {
        stage: gv_multisig::SigningStageName,
        reason: InvalidContributionReason,
    },

    #[error("transaction timed out")]
    TimedOut,

    #[error("spending from this sender address type is not supported: {0}")]
    UnsupportedSenderType(String),

    #[error("persistence error: {0}")]
    PersistenceError(String),
}

impl From<ChainError> for CoordinatorError {
    fn from(value: ChainError) -> Self {
        match value {
            ChainError::UnsupportedSenderType => {
                CoordinatorError::UnsupportedSenderType(value.to_string())
            }
            ChainError::BadAddress | ChainError::BadRlp(_) | ChainError::IntegerOverflow => {
                CoordinatorError::BadInput(value.to_string())
            }
        }
    }
}

impl From<CurveError> for CoordinatorError {
    fn from(value: CurveError) -> Self {
        CoordinatorError::BadInput(value.to_string())
    }
}

impl From<DecimalUintError> for CoordinatorError {
    fn from(value: DecimalUintError) -> Self {
        CoordinatorError::PersistenceError(format!("non-canonical large integer: {value}"))
    }
}
