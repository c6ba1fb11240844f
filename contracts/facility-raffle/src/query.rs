use cosmwasm_std::{to_json_binary, Binary, Deps, Order, StdError, StdResult, Uint128};
use cw_storage_plus::Bound;
use facility_raffle_common::{
    commit_hash, draw_randomness, select_winners, win_chance_bps, winner_count, DrawStatus,
    HashChainRandomness,
};

use crate::msg::{
    DrawHistoryResponse, DrawResultsResponse, FacilitiesResponse, FacilityWinsResponse,
    Participant, ParticipantsResponse, RaffleStatusResponse, ReferralInfo, ReferralsResponse,
    VerifyDrawResponse,
};
use crate::state::{
    CONFIG, DRAWS, DRAW_RECORDS, DRAW_SNAPSHOTS, DRAW_STATE, ELIGIBLE, FACILITIES,
    FACILITY_WINS, REFERRALS, REFERRAL_COUNT,
};

const DEFAULT_LIMIT: u32 = 20;
const MAX_LIMIT: u32 = 100;

fn page_size(limit: Option<u32>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize
}

pub fn query_config(deps: Deps) -> StdResult<Binary> {
    let config = CONFIG.load(deps.storage)?;
    to_json_binary(&config)
}

pub fn query_draw_state(deps: Deps) -> StdResult<Binary> {
    let state = DRAW_STATE.load(deps.storage)?;
    to_json_binary(&state)
}

pub fn query_facility(deps: Deps, facility_id: u64) -> StdResult<Binary> {
    let facility = FACILITIES.load(deps.storage, facility_id)?;
    to_json_binary(&facility)
}

pub fn query_facilities(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let start = start_after.map(Bound::exclusive);

    let facilities: Vec<_> = FACILITIES
        .range(deps.storage, start, None, Order::Ascending)
        .take(page_size(limit))
        .filter_map(|r| r.ok())
        .map(|(_, facility)| facility)
        .collect();

    to_json_binary(&FacilitiesResponse { facilities })
}

pub fn query_participants(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let state = DRAW_STATE.load(deps.storage)?;
    let start = start_after.map(Bound::exclusive);

    let participants: Vec<Participant> = ELIGIBLE
        .keys(deps.storage, start, None, Order::Ascending)
        .take(page_size(limit))
        .filter_map(|r| r.ok())
        .filter_map(|id| FACILITIES.load(deps.storage, id).ok())
        .map(|f| Participant {
            facility_id: f.id,
            win_chance_bps: win_chance_bps(u64::from(f.points), state.eligible_points.u128()),
            name: f.name,
            respondent_email: f.respondent.email,
            points: f.points,
        })
        .collect();

    to_json_binary(&ParticipantsResponse {
        participants,
        total_points: state.eligible_points,
    })
}

pub fn query_raffle_status(deps: Deps) -> StdResult<Binary> {
    let config = CONFIG.load(deps.storage)?;
    let state = DRAW_STATE.load(deps.storage)?;
    let next_draw_winner_count =
        winner_count(state.eligible_count as usize, config.winner_fraction) as u64;

    to_json_binary(&RaffleStatusResponse {
        total_participants: state.eligible_count,
        total_points: state.eligible_points,
        prize_amount: config.prize_amount,
        prize_denom: config.prize_denom,
        winner_fraction: config.winner_fraction,
        next_draw_winner_count,
        total_draws_completed: state.total_draws_completed,
    })
}

pub fn query_draw(deps: Deps, draw_id: u64) -> StdResult<Binary> {
    let draw = DRAWS.load(deps.storage, draw_id)?;
    to_json_binary(&draw)
}

pub fn query_draw_history(
    deps: Deps,
    start_before: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let end = start_before.map(Bound::exclusive);

    let draws: Vec<_> = DRAWS
        .range(deps.storage, None, end, Order::Descending)
        .take(page_size(limit))
        .filter_map(|r| r.ok())
        .map(|(_, draw)| draw)
        .collect();

    to_json_binary(&DrawHistoryResponse { draws })
}

pub fn query_draw_results(deps: Deps, draw_id: u64) -> StdResult<Binary> {
    let records: Vec<_> = DRAW_RECORDS
        .prefix(draw_id)
        .range(deps.storage, None, None, Order::Ascending)
        .filter_map(|r| r.ok())
        .map(|(_, record)| record)
        .collect();

    to_json_binary(&DrawResultsResponse { draw_id, records })
}

pub fn query_facility_wins(
    deps: Deps,
    facility_id: u64,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let start = start_after.map(Bound::exclusive);

    let draw_ids: Vec<u64> = FACILITY_WINS
        .prefix(facility_id)
        .range(deps.storage, start, None, Order::Ascending)
        .take(page_size(limit))
        .filter_map(|r| r.ok())
        .map(|(draw_id, _)| draw_id)
        .collect();

    let total_won_amount = FACILITY_WINS
        .prefix(facility_id)
        .range(deps.storage, None, None, Order::Ascending)
        .filter_map(|r| r.ok())
        .fold(Uint128::zero(), |acc, (_, amount)| acc.saturating_add(amount));

    to_json_binary(&FacilityWinsResponse {
        facility_id,
        draw_ids,
        total_won_amount,
    })
}

pub fn query_referrals(
    deps: Deps,
    referrer: String,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Binary> {
    let addr = deps.api.addr_validate(&referrer)?;
    let start = start_after.map(Bound::exclusive);

    let referrals: Vec<ReferralInfo> = REFERRALS
        .prefix(&addr)
        .range(deps.storage, start, None, Order::Ascending)
        .take(page_size(limit))
        .filter_map(|r| r.ok())
        .filter_map(|(facility_id, _)| FACILITIES.load(deps.storage, facility_id).ok())
        .map(|f| ReferralInfo {
            facility_id: f.id,
            facility_name: f.name,
            respondent_name: f.respondent.name,
            respondent_email: f.respondent.email,
            submitted_at: f.submitted_at,
        })
        .collect();

    let total_referrals = REFERRAL_COUNT.may_load(deps.storage, &addr)?.unwrap_or(0);

    to_json_binary(&ReferralsResponse {
        referrer,
        total_referrals,
        referrals,
    })
}

/// Audit a revealed draw from what is stored on chain.
///
/// The secret is checked against the commit, the final randomness is derived
/// again from the secret and draw context, and the engine is re-run over the
/// snapshot with that randomness.
pub fn query_verify_draw(deps: Deps, draw_id: u64) -> StdResult<Binary> {
    let draw = DRAWS.load(deps.storage, draw_id)?;
    let (secret_hex, stored_randomness) =
        match (&draw.status, &draw.operator_secret, &draw.final_randomness) {
            (DrawStatus::Revealed, Some(secret), Some(randomness)) => (secret, randomness),
            _ => {
                return Err(StdError::generic_err(format!(
                    "draw {} has not been revealed",
                    draw_id
                )))
            }
        };
    let secret = hex::decode(secret_hex)
        .map_err(|_| StdError::generic_err("stored operator secret is malformed"))?;

    let commit_matches = commit_hash(&secret) == draw.operator_commit;
    let randomness = draw_randomness(&secret, draw_id, draw.created_at.nanos());
    let randomness_matches = hex::encode(randomness) == *stored_randomness;

    let snapshot = DRAW_SNAPSHOTS.load(deps.storage, draw_id)?;
    let mut rng = HashChainRandomness::new(randomness);
    let recomputed_winners: Vec<u64> =
        select_winners(&snapshot, draw.winner_fraction, draw.prize_amount, &mut rng)
            .map_err(|e| StdError::generic_err(e.to_string()))?
            .into_iter()
            .map(|r| r.entry_id)
            .collect();
    let winners_match = recomputed_winners == draw.winners;

    to_json_binary(&VerifyDrawResponse {
        draw_id,
        valid: commit_matches && randomness_matches && winners_match,
        commit_matches,
        randomness_matches,
        winners_match,
        recomputed_winners,
    })
}
