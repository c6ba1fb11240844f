use std::collections::HashMap;

use cosmwasm_std::{
    Addr, Decimal, DepsMut, Env, Event, MessageInfo, Response, StdError, Storage, Uint128,
};
use facility_raffle_common::{
    commit_hash, draw_randomness, notify_winner, notify_winners, persist_results,
    select_winners, winner_count, Contact, DrawError, DrawStatus, EligibilityProvider,
    HashChainRandomness, SurveyScore, REFERRAL_BONUS,
};

use crate::adapters::{EventNotifier, FacilityRegistry, RecordWriter};
use crate::error::ContractError;
use crate::msg::{SurveySubmission, UpdateConfigParams};
use crate::state::{
    Draw, DrawStateInfo, Facility, RaffleConfig, CONFIG, DRAWS, DRAW_RECORDS, DRAW_SNAPSHOTS,
    DRAW_STATE, ELIGIBLE, FACILITIES, LATEST_SUBMISSION, REFERRALS, REFERRAL_COUNT,
};

/// Reveal window bounds (5 minutes to 24 hours)
pub const MIN_REVEAL_DEADLINE_SECONDS: u64 = 300;
pub const MAX_REVEAL_DEADLINE_SECONDS: u64 = 86_400;

pub fn validate_reveal_deadline(seconds: u64) -> Result<(), ContractError> {
    if !(MIN_REVEAL_DEADLINE_SECONDS..=MAX_REVEAL_DEADLINE_SECONDS).contains(&seconds) {
        return Err(ContractError::InvalidRevealDeadline {
            value: seconds,
            min: MIN_REVEAL_DEADLINE_SECONDS,
            max: MAX_REVEAL_DEADLINE_SECONDS,
        });
    }
    Ok(())
}

pub fn validate_winner_fraction(fraction: Decimal) -> Result<(), ContractError> {
    if fraction.is_zero() || fraction > Decimal::one() {
        return Err(ContractError::InvalidWinnerFraction { value: fraction });
    }
    Ok(())
}

pub fn validate_prize_amount(amount: Uint128) -> Result<(), ContractError> {
    if amount.is_zero() {
        return Err(ContractError::InvalidPrizeAmount { amount });
    }
    Ok(())
}

fn ensure_admin(config: &RaffleConfig, sender: &Addr, reason: &str) -> Result<(), ContractError> {
    if *sender != config.admin {
        return Err(ContractError::Unauthorized {
            reason: reason.to_string(),
        });
    }
    Ok(())
}

fn ensure_operator(
    config: &RaffleConfig,
    sender: &Addr,
    reason: &str,
) -> Result<(), ContractError> {
    if *sender != config.operator {
        return Err(ContractError::Unauthorized {
            reason: reason.to_string(),
        });
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Record a survey submission. Anyone can call.
///
/// The facility starts unapproved and is not in the draw pool until an
/// admin approves it.
pub fn submit_survey(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    submission: SurveySubmission,
) -> Result<Response, ContractError> {
    let SurveySubmission {
        facility_name,
        state,
        mut respondent,
        equipment,
        challenges,
        solutions,
        referred_by,
    } = submission;

    let facility_name = facility_name.trim().to_string();
    if facility_name.is_empty() {
        return Err(ContractError::EmptyFacilityName);
    }

    let referrer = match non_blank(referred_by) {
        Some(addr) => {
            let referrer = deps.api.addr_validate(&addr)?;
            if referrer == info.sender {
                return Err(ContractError::SelfReferral);
            }
            Some(referrer)
        }
        None => None,
    };

    respondent.name = non_blank(respondent.name);
    respondent.email = non_blank(respondent.email);
    respondent.phone = non_blank(respondent.phone);

    let points = SurveyScore {
        equipment: &equipment,
        respondent_email: respondent.email.as_deref(),
        respondent_phone: respondent.phone.as_deref(),
        challenges: challenges.as_deref(),
        solutions: solutions.as_deref(),
        referred: referrer.is_some(),
    }
    .points();

    let mut draw_state = DRAW_STATE.load(deps.storage)?;
    let facility_id = draw_state.next_facility_id;
    draw_state.next_facility_id += 1;

    let facility = Facility {
        id: facility_id,
        name: facility_name.clone(),
        state: non_blank(state),
        respondent,
        equipment,
        points,
        approved: false,
        submitted_by: info.sender.clone(),
        referred_by: referrer.clone(),
        submitted_at: env.block.time,
    };
    FACILITIES.save(deps.storage, facility_id, &facility)?;
    LATEST_SUBMISSION.save(deps.storage, &info.sender, &facility_id)?;

    let mut event = Event::new("raffle_survey_submitted")
        .add_attribute("facility_id", facility_id.to_string())
        .add_attribute("facility_name", facility_name)
        .add_attribute("points", points.to_string())
        .add_attribute("submitted_by", info.sender.to_string());

    if let Some(referrer) = &referrer {
        REFERRALS.save(deps.storage, (referrer, facility_id), &())?;
        let count = REFERRAL_COUNT.may_load(deps.storage, referrer)?.unwrap_or(0);
        REFERRAL_COUNT.save(deps.storage, referrer, &(count + 1))?;
        event = event.add_attribute("referred_by", referrer.to_string());

        if let Some(credited) = credit_referrer(deps.storage, referrer, &mut draw_state)? {
            event = event.add_attribute("referrer_facility_id", credited.to_string());
        }
    }
    DRAW_STATE.save(deps.storage, &draw_state)?;

    Ok(Response::new()
        .add_attribute("action", "submit_survey")
        .add_attribute("facility_id", facility_id.to_string())
        .add_attribute("points", points.to_string())
        .add_event(event))
}

/// Add the referral bonus to the referrer's latest facility, if they have one.
///
/// Committed draws keep their own snapshot, so only the live pool totals move.
fn credit_referrer(
    storage: &mut dyn Storage,
    referrer: &Addr,
    state: &mut DrawStateInfo,
) -> Result<Option<u64>, ContractError> {
    let Some(facility_id) = LATEST_SUBMISSION.may_load(storage, referrer)? else {
        return Ok(None);
    };
    let mut facility = FACILITIES.load(storage, facility_id)?;
    let before = facility.points;
    facility.points = facility.points.saturating_add(REFERRAL_BONUS);
    FACILITIES.save(storage, facility_id, &facility)?;

    if ELIGIBLE.has(storage, facility_id) {
        state.eligible_points += Uint128::from(facility.points - before);
    }
    Ok(Some(facility_id))
}

fn admit(
    storage: &mut dyn Storage,
    facility: &Facility,
    state: &mut DrawStateInfo,
) -> Result<(), ContractError> {
    ELIGIBLE.save(storage, facility.id, &())?;
    state.eligible_count += 1;
    state.eligible_points += Uint128::from(facility.points);
    Ok(())
}

fn withdraw(storage: &mut dyn Storage, facility: &Facility, state: &mut DrawStateInfo) {
    ELIGIBLE.remove(storage, facility.id);
    state.eligible_count = state.eligible_count.saturating_sub(1);
    state.eligible_points = state
        .eligible_points
        .saturating_sub(Uint128::from(facility.points));
}

/// Approve or reject a facility. Admin only. Idempotent.
pub fn set_approval(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    facility_id: u64,
    approved: bool,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_admin(&config, &info.sender, "only admin can review facilities")?;

    let mut facility = FACILITIES
        .may_load(deps.storage, facility_id)?
        .ok_or(ContractError::FacilityNotFound { facility_id })?;

    let was_eligible = facility.is_eligible();
    facility.approved = approved;
    FACILITIES.save(deps.storage, facility_id, &facility)?;

    let mut draw_state = DRAW_STATE.load(deps.storage)?;
    match (was_eligible, facility.is_eligible()) {
        (false, true) => admit(deps.storage, &facility, &mut draw_state)?,
        (true, false) => withdraw(deps.storage, &facility, &mut draw_state),
        _ => {}
    }
    DRAW_STATE.save(deps.storage, &draw_state)?;

    let action = if approved {
        "approve_facility"
    } else {
        "reject_facility"
    };

    Ok(Response::new()
        .add_attribute("action", action)
        .add_attribute("facility_id", facility_id.to_string())
        .add_event(
            Event::new("raffle_facility_reviewed")
                .add_attribute("facility_id", facility_id.to_string())
                .add_attribute("approved", approved.to_string())
                .add_attribute("eligible", facility.is_eligible().to_string())
                .add_attribute("eligible_count", draw_state.eligible_count.to_string())
                .add_attribute("eligible_points", draw_state.eligible_points.to_string()),
        ))
}

/// Commit to a draw. Operator only.
///
/// The eligible pool is read once here and stored with the draw, so
/// submissions and approvals that land before the reveal do not change it.
pub fn commit_draw(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    operator_commit: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info.sender, "only operator can commit draws")?;

    let operator_commit = operator_commit.trim().to_lowercase();
    match hex::decode(&operator_commit) {
        Ok(bytes) if bytes.len() == 32 => {}
        _ => return Err(ContractError::InvalidCommit),
    }

    let entries = FacilityRegistry {
        storage: &*deps.storage,
    }
    .list_eligible()?;
    if entries.is_empty() {
        return Err(DrawError::NoEligibleEntries.into());
    }
    let total_weight: u128 = entries.iter().map(|e| e.weight.max(0) as u128).sum();
    let expected_winners = winner_count(entries.len(), config.winner_fraction);

    let mut draw_state = DRAW_STATE.load(deps.storage)?;
    let draw_id = draw_state.next_draw_id;
    draw_state.next_draw_id += 1;

    let reveal_deadline = env.block.time.plus_seconds(config.reveal_deadline_seconds);

    let draw = Draw {
        id: draw_id,
        status: DrawStatus::Committed,
        operator_commit: operator_commit.clone(),
        prize_amount: config.prize_amount,
        prize_denom: config.prize_denom.clone(),
        winner_fraction: config.winner_fraction,
        entries_count: entries.len() as u64,
        total_weight: Uint128::new(total_weight),
        created_at: env.block.time,
        reveal_deadline,
        revealed_at: None,
        operator_secret: None,
        final_randomness: None,
        winners: vec![],
    };

    DRAWS.save(deps.storage, draw_id, &draw)?;
    DRAW_SNAPSHOTS.save(deps.storage, draw_id, &entries)?;
    DRAW_STATE.save(deps.storage, &draw_state)?;

    Ok(Response::new()
        .add_attribute("action", "commit_draw")
        .add_attribute("draw_id", draw_id.to_string())
        .add_event(
            Event::new("raffle_draw_committed")
                .add_attribute("draw_id", draw_id.to_string())
                .add_attribute("operator_commit", operator_commit)
                .add_attribute("entries_count", entries.len().to_string())
                .add_attribute("total_weight", total_weight.to_string())
                .add_attribute("expected_winners", expected_winners.to_string())
                .add_attribute("prize_amount", config.prize_amount.to_string())
                .add_attribute("prize_denom", config.prize_denom)
                .add_attribute("reveal_deadline", reveal_deadline.seconds().to_string()),
        ))
}

/// Reveal a committed draw. Operator only.
///
/// 1. Verify commit pre-image: sha256(secret) == commit
/// 2. final = sha256(secret) XOR sha256(draw_id || committed_at)
/// 3. Draw winners from the committed snapshot seeded with `final`
/// 4. Append one record per winner; a failed write is reported, not fatal
/// 5. Emit one notification per winner; failures are reported per winner
pub fn reveal_draw(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    draw_id: u64,
    operator_secret_hex: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_operator(&config, &info.sender, "only operator can reveal draws")?;

    let mut draw = DRAWS
        .may_load(deps.storage, draw_id)?
        .ok_or(ContractError::DrawNotFound { draw_id })?;

    if draw.status != DrawStatus::Committed {
        return Err(ContractError::DrawNotCommitted { draw_id });
    }
    if env.block.time > draw.reveal_deadline {
        return Err(ContractError::DrawExpired {
            draw_id,
            deadline: draw.reveal_deadline.seconds(),
        });
    }

    let operator_secret =
        hex::decode(operator_secret_hex.trim()).map_err(|_| ContractError::InvalidHex {
            field: "operator_secret_hex".to_string(),
        })?;
    if commit_hash(&operator_secret) != draw.operator_commit {
        return Err(ContractError::CommitMismatch);
    }

    let final_randomness = draw_randomness(&operator_secret, draw_id, draw.created_at.nanos());
    let snapshot = DRAW_SNAPSHOTS.load(deps.storage, draw_id)?;

    let mut rng = HashChainRandomness::new(final_randomness);
    let results = select_winners(&snapshot, draw.winner_fraction, draw.prize_amount, &mut rng)?;

    let persist_report = {
        let mut writer = RecordWriter::new(deps.storage, draw_id, env.block.time);
        persist_results(&mut writer, &results)
    };

    let contacts: HashMap<u64, &Contact> =
        snapshot.iter().map(|e| (e.id, &e.contact)).collect();
    let no_contact = Contact::default();
    let mut notifier = EventNotifier::new(draw_id, draw.prize_denom.clone());
    let notify_report = notify_winners(
        &mut notifier,
        results.iter().map(|r| {
            let contact = contacts.get(&r.entry_id).copied().unwrap_or(&no_contact);
            (r, contact)
        }),
    );

    draw.status = DrawStatus::Revealed;
    draw.revealed_at = Some(env.block.time);
    draw.operator_secret = Some(hex::encode(&operator_secret));
    draw.final_randomness = Some(hex::encode(final_randomness));
    draw.winners = results.iter().map(|r| r.entry_id).collect();
    DRAWS.save(deps.storage, draw_id, &draw)?;

    let recorded = persist_report.persisted.len() as u64;
    let mut draw_state = DRAW_STATE.load(deps.storage)?;
    draw_state.total_draws_completed += 1;
    draw_state.total_winners += recorded;
    draw_state.total_prizes_awarded += draw
        .prize_amount
        .checked_mul(Uint128::from(recorded))
        .map_err(StdError::from)?;
    DRAW_STATE.save(deps.storage, &draw_state)?;

    let mut events: Vec<Event> = results
        .iter()
        .enumerate()
        .map(|(position, r)| {
            Event::new("raffle_winner")
                .add_attribute("draw_id", draw_id.to_string())
                .add_attribute("position", position.to_string())
                .add_attribute("facility_id", r.entry_id.to_string())
                .add_attribute("weight_at_selection", r.weight_at_selection.to_string())
                .add_attribute("prize_amount", r.prize_amount.to_string())
        })
        .collect();
    events.extend(persist_report.failed.iter().map(|(facility_id, reason)| {
        Event::new("raffle_record_failed")
            .add_attribute("draw_id", draw_id.to_string())
            .add_attribute("facility_id", facility_id.to_string())
            .add_attribute("reason", reason.clone())
    }));
    events.extend(notifier.events);
    events.extend(notify_report.failed.iter().map(|err| {
        Event::new("raffle_notification_failed")
            .add_attribute("draw_id", draw_id.to_string())
            .add_attribute("facility_id", err.entry_id().to_string())
            .add_attribute("reason", err.to_string())
    }));

    Ok(Response::new()
        .add_attribute("action", "reveal_draw")
        .add_attribute("draw_id", draw_id.to_string())
        .add_attribute("winners", results.len().to_string())
        .add_attribute("recorded", recorded.to_string())
        .add_attribute("notified", notify_report.summary())
        .add_event(
            Event::new("raffle_draw_result")
                .add_attribute("draw_id", draw_id.to_string())
                .add_attribute("entries_count", draw.entries_count.to_string())
                .add_attribute("total_weight", draw.total_weight.to_string())
                .add_attribute("winners", results.len().to_string())
                .add_attribute("prize_amount", draw.prize_amount.to_string())
                .add_attribute("prize_denom", draw.prize_denom.clone())
                .add_attribute("final_randomness", hex::encode(final_randomness))
                .add_attribute("timestamp", env.block.time.seconds().to_string()),
        )
        .add_events(events))
}

/// Expire a draw that wasn't revealed in time. Anyone can call.
pub fn expire_draw(
    deps: DepsMut,
    env: Env,
    _info: MessageInfo,
    draw_id: u64,
) -> Result<Response, ContractError> {
    let mut draw = DRAWS
        .may_load(deps.storage, draw_id)?
        .ok_or(ContractError::DrawNotFound { draw_id })?;

    if draw.status != DrawStatus::Committed {
        return Err(ContractError::DrawNotCommitted { draw_id });
    }

    if env.block.time <= draw.reveal_deadline {
        return Err(ContractError::DrawNotExpired {
            draw_id,
            deadline: draw.reveal_deadline.seconds(),
        });
    }

    draw.status = DrawStatus::Expired;
    DRAWS.save(deps.storage, draw_id, &draw)?;
    DRAW_SNAPSHOTS.remove(deps.storage, draw_id);

    Ok(Response::new()
        .add_attribute("action", "expire_draw")
        .add_attribute("draw_id", draw_id.to_string())
        .add_event(
            Event::new("raffle_draw_expired")
                .add_attribute("draw_id", draw_id.to_string())
                .add_attribute("entries_count", draw.entries_count.to_string()),
        ))
}

/// Re-send the notice for a single recorded winner. Admin or operator.
///
/// Uses the facility's current contact details.
pub fn resend_notification(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    draw_id: u64,
    position: u32,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin && info.sender != config.operator {
        return Err(ContractError::Unauthorized {
            reason: "only admin or operator can notify winners".to_string(),
        });
    }

    let draw = DRAWS
        .may_load(deps.storage, draw_id)?
        .ok_or(ContractError::DrawNotFound { draw_id })?;
    if draw.status != DrawStatus::Revealed {
        return Err(ContractError::DrawNotRevealed { draw_id });
    }

    let record = DRAW_RECORDS
        .may_load(deps.storage, (draw_id, position))?
        .ok_or(ContractError::WinnerNotFound { draw_id, position })?;
    let facility = FACILITIES.load(deps.storage, record.facility_id)?;

    let mut notifier = EventNotifier::new(draw_id, draw.prize_denom);
    notify_winner(&mut notifier, &record.result(), &facility.contact())?;

    Ok(Response::new()
        .add_attribute("action", "notify_winner")
        .add_attribute("draw_id", draw_id.to_string())
        .add_attribute("facility_id", record.facility_id.to_string())
        .add_events(notifier.events))
}

/// Update configuration. Admin only.
pub fn update_config(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    params: UpdateConfigParams,
) -> Result<Response, ContractError> {
    let UpdateConfigParams {
        operator,
        reveal_deadline_seconds,
        prize_amount,
        winner_fraction,
    } = params;

    let mut config = CONFIG.load(deps.storage)?;
    ensure_admin(&config, &info.sender, "only admin can update config")?;

    if let Some(op) = operator {
        config.operator = deps.api.addr_validate(&op)?;
    }
    if let Some(deadline) = reveal_deadline_seconds {
        validate_reveal_deadline(deadline)?;
        config.reveal_deadline_seconds = deadline;
    }
    if let Some(amount) = prize_amount {
        validate_prize_amount(amount)?;
        config.prize_amount = amount;
    }
    if let Some(fraction) = winner_fraction {
        validate_winner_fraction(fraction)?;
        config.winner_fraction = fraction;
    }

    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new().add_attribute("action", "update_config"))
}
