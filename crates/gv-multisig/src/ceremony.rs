//! Ceremony-level vocabulary shared with `gv-coordinator`: which round a
//! transaction's signing state machine is in, and why a round's
//! contribution was rejected (spec §4.4, §7).

use thiserror::Error;

/// Tag constants for structured logging, in the style this workspace's
/// teacher uses for its own ceremony failure logs.
pub const SIGNING_ROUND_REJECTED: &str = "E1";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum SigningStageName {
    Round1,
    Round2,
    Round3,
    Round4,
}

impl std::fmt::Display for SigningStageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SigningStageName::Round1 => write!(f, "round 1 (nonce commitment)"),
            SigningStageName::Round2 => write!(f, "round 2 (nonce aggregation)"),
            SigningStageName::Round3 => write!(f, "round 3 (signature share)"),
            SigningStageName::Round4 => write!(f, "round 4 (signature aggregation)"),
        }
    }
}

/// Why a round's contribution was rejected. These map directly onto the
/// `InvalidContribution` error kind surfaced to clients (spec §7) — the
/// ceremony itself never recovers from one; the transaction moves to
/// `Failed` (spec §4.4 state machine).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidContributionReason {
    #[error("nonce commitment is the point at infinity")]
    ZeroNonce,
    #[error("submitted point is not on the curve")]
    PointNotOnCurve,
    #[error("submitted scalar is not in the valid range")]
    ScalarOutOfRange,
    #[error("aggregated signature is zero")]
    ZeroSignature,
}

/// Emits the structured warning a rejected round produces, identifying
/// which round and (if known) which guardian submitted the bad
/// contribution. Never logs share material — only public round artifacts
/// ever reach this function.
pub fn log_rejected_contribution(
    stage: SigningStageName,
    guardian_id: Option<&str>,
    reason: InvalidContributionReason,
) {
    tracing::warn!(
        tag = SIGNING_ROUND_REJECTED,
        stage = %stage,
        guardian_id = guardian_id.unwrap_or("unknown"),
        "signing round rejected: {reason}",
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_name_display_is_human_readable() {
        assert_eq!(
            SigningStageName::Round3.to_string(),
            "round 3 (signature share)"
        );
    }
}
