use cosmwasm_std::{
    entry_point, Binary, Decimal, Deps, DepsMut, Env, MessageInfo, Response, StdResult, Uint128,
};
use cw2::{get_contract_version, set_contract_version};

use crate::error::ContractError;
use crate::execute;
use crate::msg::{ExecuteMsg, InstantiateMsg, MigrateMsg, QueryMsg, UpdateConfigParams};
use crate::query;
use crate::state::{DrawStateInfo, RaffleConfig, CONFIG, DRAW_STATE};

const CONTRACT_NAME: &str = "crates.io:facility-raffle";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// 5% of eligible facilities win when no fraction is configured
const DEFAULT_WINNER_FRACTION_PERCENT: u64 = 5;

#[entry_point]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    execute::validate_reveal_deadline(msg.reveal_deadline_seconds)?;
    execute::validate_prize_amount(msg.prize_amount)?;
    let winner_fraction = msg
        .winner_fraction
        .unwrap_or_else(|| Decimal::percent(DEFAULT_WINNER_FRACTION_PERCENT));
    execute::validate_winner_fraction(winner_fraction)?;
    let prize_denom = msg.prize_denom.trim().to_string();
    if prize_denom.is_empty() {
        return Err(ContractError::InvalidPrizeDenom);
    }

    let config = RaffleConfig {
        admin: info.sender.clone(),
        operator: deps.api.addr_validate(&msg.operator)?,
        reveal_deadline_seconds: msg.reveal_deadline_seconds,
        prize_amount: msg.prize_amount,
        prize_denom,
        winner_fraction,
    };
    CONFIG.save(deps.storage, &config)?;

    let draw_state = DrawStateInfo {
        next_draw_id: 0,
        next_facility_id: 0,
        eligible_count: 0,
        eligible_points: Uint128::zero(),
        total_draws_completed: 0,
        total_winners: 0,
        total_prizes_awarded: Uint128::zero(),
    };
    DRAW_STATE.save(deps.storage, &draw_state)?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("contract", "facility-raffle")
        .add_attribute("admin", info.sender.to_string()))
}

#[entry_point]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::SubmitSurvey(submission) => {
            execute::submit_survey(deps, env, info, submission)
        }
        ExecuteMsg::ApproveFacility { facility_id } => {
            execute::set_approval(deps, env, info, facility_id, true)
        }
        ExecuteMsg::RejectFacility { facility_id } => {
            execute::set_approval(deps, env, info, facility_id, false)
        }
        ExecuteMsg::CommitDraw { operator_commit } => {
            execute::commit_draw(deps, env, info, operator_commit)
        }
        ExecuteMsg::RevealDraw {
            draw_id,
            operator_secret_hex,
        } => execute::reveal_draw(deps, env, info, draw_id, operator_secret_hex),
        ExecuteMsg::ExpireDraw { draw_id } => execute::expire_draw(deps, env, info, draw_id),
        ExecuteMsg::NotifyWinner { draw_id, position } => {
            execute::resend_notification(deps, env, info, draw_id, position)
        }
        ExecuteMsg::UpdateConfig {
            operator,
            reveal_deadline_seconds,
            prize_amount,
            winner_fraction,
        } => execute::update_config(
            deps,
            env,
            info,
            UpdateConfigParams {
                operator,
                reveal_deadline_seconds,
                prize_amount,
                winner_fraction,
            },
        ),
    }
}

#[entry_point]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Config {} => query::query_config(deps),
        QueryMsg::DrawState {} => query::query_draw_state(deps),
        QueryMsg::Facility { facility_id } => query::query_facility(deps, facility_id),
        QueryMsg::Facilities { start_after, limit } => {
            query::query_facilities(deps, start_after, limit)
        }
        QueryMsg::Participants { start_after, limit } => {
            query::query_participants(deps, start_after, limit)
        }
        QueryMsg::RaffleStatus {} => query::query_raffle_status(deps),
        QueryMsg::Draw { draw_id } => query::query_draw(deps, draw_id),
        QueryMsg::DrawHistory {
            start_before,
            limit,
        } => query::query_draw_history(deps, start_before, limit),
        QueryMsg::DrawResults { draw_id } => query::query_draw_results(deps, draw_id),
        QueryMsg::FacilityWins {
            facility_id,
            start_after,
            limit,
        } => query::query_facility_wins(deps, facility_id, start_after, limit),
        QueryMsg::Referrals {
            referrer,
            start_after,
            limit,
        } => query::query_referrals(deps, referrer, start_after, limit),
        QueryMsg::VerifyDraw { draw_id } => query::query_verify_draw(deps, draw_id),
    }
}

#[entry_point]
pub fn migrate(deps: DepsMut, _env: Env, _msg: MigrateMsg) -> Result<Response, ContractError> {
    let stored = get_contract_version(deps.storage)?;
    if stored.contract != CONTRACT_NAME {
        return Err(ContractError::Unauthorized {
            reason: "Cannot migrate from different contract type".to_string(),
        });
    }

    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    Ok(Response::new()
        .add_attribute("action", "migrate")
        .add_attribute("from_version", stored.version)
        .add_attribute("to_version", CONTRACT_VERSION))
}
