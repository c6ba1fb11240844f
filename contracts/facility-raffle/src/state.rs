use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Decimal, Timestamp, Uint128};
use cw_storage_plus::{Item, Map};
use facility_raffle_common::{Contact, DrawResult, DrawStatus, Entry, EquipmentCounts};

pub const CONFIG: Item<RaffleConfig> = Item::new("config");
pub const DRAW_STATE: Item<DrawStateInfo> = Item::new("draw_state");

pub const FACILITIES: Map<u64, Facility> = Map::new("facilities");
/// Submitter -> their most recent facility, which receives referral credit
pub const LATEST_SUBMISSION: Map<&Addr, u64> = Map::new("latest_submission");
/// Approved facilities with positive points. This is the draw pool.
pub const ELIGIBLE: Map<u64, ()> = Map::new("eligible");

/// (referrer, facility_id) for every referred submission
pub const REFERRALS: Map<(&Addr, u64), ()> = Map::new("referrals");
pub const REFERRAL_COUNT: Map<&Addr, u32> = Map::new("referral_count");

pub const DRAWS: Map<u64, Draw> = Map::new("draws");
/// Pool captured when a draw is committed
pub const DRAW_SNAPSHOTS: Map<u64, Vec<Entry>> = Map::new("draw_snapshots");
/// (draw_id, position) -> winner record, append-only
pub const DRAW_RECORDS: Map<(u64, u32), DrawRecord> = Map::new("draw_records");
/// (facility_id, draw_id) -> prize amount won in that draw
pub const FACILITY_WINS: Map<(u64, u64), Uint128> = Map::new("facility_wins");

#[cw_serde]
pub struct RaffleConfig {
    pub admin: Addr,
    pub operator: Addr,
    /// How long the operator has to reveal after committing (seconds)
    pub reveal_deadline_seconds: u64,
    /// Prize attached to every winner of a draw
    pub prize_amount: Uint128,
    pub prize_denom: String,
    /// Share of the eligible pool that wins, at least one winner per draw
    pub winner_fraction: Decimal,
}

#[cw_serde]
pub struct DrawStateInfo {
    pub next_draw_id: u64,
    pub next_facility_id: u64,
    pub eligible_count: u64,
    pub eligible_points: Uint128,
    pub total_draws_completed: u64,
    pub total_winners: u64,
    pub total_prizes_awarded: Uint128,
}

#[cw_serde]
pub struct Respondent {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[cw_serde]
pub struct Facility {
    pub id: u64,
    pub name: String,
    pub state: Option<String>,
    pub respondent: Respondent,
    pub equipment: EquipmentCounts,
    pub points: u32,
    pub approved: bool,
    pub submitted_by: Addr,
    pub referred_by: Option<Addr>,
    pub submitted_at: Timestamp,
}

impl Facility {
    pub fn is_eligible(&self) -> bool {
        self.approved && self.points > 0
    }

    pub fn contact(&self) -> Contact {
        Contact {
            name: self
                .respondent
                .name
                .clone()
                .or_else(|| self.respondent.email.clone())
                .or_else(|| Some(self.name.clone()).filter(|n| !n.is_empty())),
            email: self.respondent.email.clone(),
        }
    }

    pub fn to_entry(&self) -> Entry {
        Entry {
            id: self.id,
            weight: i64::from(self.points),
            contact: self.contact(),
        }
    }
}

#[cw_serde]
pub struct Draw {
    pub id: u64,
    pub status: DrawStatus,
    /// sha256(operator_secret), hex-encoded
    pub operator_commit: String,
    pub prize_amount: Uint128,
    pub prize_denom: String,
    pub winner_fraction: Decimal,
    /// Size and total weight of the snapshot taken at commit
    pub entries_count: u64,
    pub total_weight: Uint128,
    pub created_at: Timestamp,
    pub reveal_deadline: Timestamp,
    pub revealed_at: Option<Timestamp>,
    /// hex-encoded
    pub operator_secret: Option<String>,
    /// hex-encoded seed the winners were drawn with
    pub final_randomness: Option<String>,
    /// Facility ids in selection order
    pub winners: Vec<u64>,
}

#[cw_serde]
pub struct DrawRecord {
    pub draw_id: u64,
    /// Selection order within the draw, starting at 0
    pub position: u32,
    pub facility_id: u64,
    pub weight_at_selection: u64,
    pub prize_amount: Uint128,
    pub created_at: Timestamp,
}

impl DrawRecord {
    pub fn result(&self) -> DrawResult {
        DrawResult {
            entry_id: self.facility_id,
            weight_at_selection: self.weight_at_selection,
            prize_amount: self.prize_amount,
        }
    }
}
