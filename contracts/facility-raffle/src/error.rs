use cosmwasm_std::{Decimal, StdError, Uint128};
use facility_raffle_common::{DrawError, NotificationError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Draw(#[from] DrawError),

    #[error("{0}")]
    Notification(#[from] NotificationError),

    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("facility {facility_id} not found")]
    FacilityNotFound { facility_id: u64 },

    #[error("facility name must not be empty")]
    EmptyFacilityName,

    #[error("a submission cannot refer itself")]
    SelfReferral,

    #[error("draw {draw_id} not found")]
    DrawNotFound { draw_id: u64 },

    #[error("draw {draw_id} is not in Committed status")]
    DrawNotCommitted { draw_id: u64 },

    #[error("draw {draw_id} has not been revealed")]
    DrawNotRevealed { draw_id: u64 },

    #[error("draw {draw_id} has expired (deadline: {deadline})")]
    DrawExpired { draw_id: u64, deadline: u64 },

    #[error("draw {draw_id} has not expired yet (deadline: {deadline})")]
    DrawNotExpired { draw_id: u64, deadline: u64 },

    #[error("no winner at position {position} in draw {draw_id}")]
    WinnerNotFound { draw_id: u64, position: u32 },

    #[error("commit pre-image mismatch: sha256(secret) != commit")]
    CommitMismatch,

    #[error("invalid commit: expected 32-byte hex digest")]
    InvalidCommit,

    #[error("invalid hex: {field}")]
    InvalidHex { field: String },

    #[error("invalid reveal deadline: {value}s (must be between {min}s and {max}s)")]
    InvalidRevealDeadline { value: u64, min: u64, max: u64 },

    #[error("invalid winner fraction {value}: must be greater than 0 and at most 1")]
    InvalidWinnerFraction { value: Decimal },

    #[error("invalid prize amount {amount}: must be non-zero")]
    InvalidPrizeAmount { amount: Uint128 },

    #[error("invalid prize denom: must not be empty")]
    InvalidPrizeDenom,
}
