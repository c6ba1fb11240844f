use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Decimal, Timestamp, Uint128};
use facility_raffle_common::EquipmentCounts;

use crate::state::{Draw, DrawRecord, DrawStateInfo, Facility, RaffleConfig, Respondent};

#[cw_serde]
pub struct InstantiateMsg {
    pub operator: String,
    pub reveal_deadline_seconds: u64,
    pub prize_amount: Uint128,
    pub prize_denom: String,
    /// Defaults to 5% of the eligible pool
    pub winner_fraction: Option<Decimal>,
}

/// One completed facility survey.
#[cw_serde]
pub struct SurveySubmission {
    pub facility_name: String,
    pub state: Option<String>,
    pub respondent: Respondent,
    pub equipment: EquipmentCounts,
    pub challenges: Option<String>,
    pub solutions: Option<String>,
    /// Address of the participant who shared the referral link
    pub referred_by: Option<String>,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Record a survey submission. Anyone can call.
    SubmitSurvey(SurveySubmission),
    /// Admit a facility to the raffle. Admin only.
    ApproveFacility { facility_id: u64 },
    /// Withdraw a facility from the raffle. Admin only.
    RejectFacility { facility_id: u64 },
    /// Snapshot the eligible pool and commit to a secret. Operator only.
    CommitDraw {
        /// sha256(secret), hex-encoded
        operator_commit: String,
    },
    /// Reveal the secret and select winners. Operator only.
    RevealDraw {
        draw_id: u64,
        /// The pre-image secret (hex-encoded)
        operator_secret_hex: String,
    },
    /// Expire a draw that wasn't revealed in time. Anyone can call.
    ExpireDraw { draw_id: u64 },
    /// Send the winner notice again for one recorded winner. Admin or operator.
    NotifyWinner { draw_id: u64, position: u32 },
    /// Update configuration. Admin only.
    UpdateConfig {
        operator: Option<String>,
        reveal_deadline_seconds: Option<u64>,
        prize_amount: Option<Uint128>,
        winner_fraction: Option<Decimal>,
    },
}

/// Parameters for update_config (avoids too_many_arguments).
pub struct UpdateConfigParams {
    pub operator: Option<String>,
    pub reveal_deadline_seconds: Option<u64>,
    pub prize_amount: Option<Uint128>,
    pub winner_fraction: Option<Decimal>,
}

#[cw_serde]
pub struct MigrateMsg {}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    #[returns(RaffleConfig)]
    Config {},
    #[returns(DrawStateInfo)]
    DrawState {},
    #[returns(Facility)]
    Facility { facility_id: u64 },
    #[returns(FacilitiesResponse)]
    Facilities {
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    #[returns(ParticipantsResponse)]
    Participants {
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    #[returns(RaffleStatusResponse)]
    RaffleStatus {},
    #[returns(Draw)]
    Draw { draw_id: u64 },
    /// Most recent draws first
    #[returns(DrawHistoryResponse)]
    DrawHistory {
        start_before: Option<u64>,
        limit: Option<u32>,
    },
    #[returns(DrawResultsResponse)]
    DrawResults { draw_id: u64 },
    #[returns(FacilityWinsResponse)]
    FacilityWins {
        facility_id: u64,
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    #[returns(ReferralsResponse)]
    Referrals {
        referrer: String,
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    /// Recompute a revealed draw from its snapshot and randomness.
    #[returns(VerifyDrawResponse)]
    VerifyDraw { draw_id: u64 },
}

#[cw_serde]
pub struct FacilitiesResponse {
    pub facilities: Vec<Facility>,
}

#[cw_serde]
pub struct Participant {
    pub facility_id: u64,
    pub name: String,
    pub respondent_email: Option<String>,
    pub points: u32,
    /// Chance of winning a single pick, in basis points
    pub win_chance_bps: u32,
}

#[cw_serde]
pub struct ParticipantsResponse {
    pub participants: Vec<Participant>,
    pub total_points: Uint128,
}

#[cw_serde]
pub struct RaffleStatusResponse {
    pub total_participants: u64,
    pub total_points: Uint128,
    pub prize_amount: Uint128,
    pub prize_denom: String,
    pub winner_fraction: Decimal,
    /// Winners the next draw would produce with the current pool
    pub next_draw_winner_count: u64,
    pub total_draws_completed: u64,
}

#[cw_serde]
pub struct DrawHistoryResponse {
    pub draws: Vec<Draw>,
}

#[cw_serde]
pub struct DrawResultsResponse {
    pub draw_id: u64,
    pub records: Vec<DrawRecord>,
}

#[cw_serde]
pub struct FacilityWinsResponse {
    pub facility_id: u64,
    pub draw_ids: Vec<u64>,
    pub total_won_amount: Uint128,
}

#[cw_serde]
pub struct ReferralInfo {
    pub facility_id: u64,
    pub facility_name: String,
    pub respondent_name: Option<String>,
    pub respondent_email: Option<String>,
    pub submitted_at: Timestamp,
}

#[cw_serde]
pub struct ReferralsResponse {
    pub referrer: String,
    pub total_referrals: u32,
    pub referrals: Vec<ReferralInfo>,
}

#[cw_serde]
pub struct VerifyDrawResponse {
    pub draw_id: u64,
    /// All three checks below hold
    pub valid: bool,
    /// sha256(revealed secret) equals the commit
    pub commit_matches: bool,
    /// Stored randomness re-derives from the secret and draw context
    pub randomness_matches: bool,
    /// Re-running the draw over the snapshot gives the stored winners
    pub winners_match: bool,
    pub recomputed_winners: Vec<u64>,
}
