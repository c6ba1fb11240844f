//! Integration tests for the facility raffle.
//!
//! These tests drive the contract through its `instantiate` / `execute` /
//! `query` entry points with `cosmwasm_std::testing` mocks, covering the
//! whole survey -> approval -> commit -> reveal -> notification cycle.
//!
//! Run:
//! ```bash
//! cargo test -p facility-raffle-integration-tests
//! ```

use cosmwasm_std::testing::{message_info, mock_dependencies, mock_env, MockApi, MockQuerier};
use cosmwasm_std::{
    from_json, Decimal, Env, MemoryStorage, OwnedDeps, Response, Timestamp, Uint128,
};
use facility_raffle::contract::{execute, instantiate, query};
use facility_raffle::msg::{
    DrawHistoryResponse, DrawResultsResponse, ExecuteMsg, FacilitiesResponse,
    FacilityWinsResponse, InstantiateMsg, ParticipantsResponse, QueryMsg, RaffleStatusResponse,
    ReferralsResponse, SurveySubmission, VerifyDrawResponse,
};
use facility_raffle::state::{Draw, DrawStateInfo, Facility, Respondent};
use facility_raffle::ContractError;
use facility_raffle_common::{
    draw_randomness, select_winners, DrawStatus, Entry, EquipmentCounts, HashChainRandomness,
};
use sha2::{Digest, Sha256};

type TestDeps = OwnedDeps<MemoryStorage, MockApi, MockQuerier>;

const SECRET: &[u8] = b"quarterly_survey_raffle";

// ─── Helpers ───

fn commit_for(secret: &[u8]) -> String {
    hex::encode(Sha256::digest(secret))
}

fn setup(winner_fraction: Option<Decimal>) -> TestDeps {
    let mut deps = mock_dependencies();
    let admin = deps.api.addr_make("admin");
    let msg = InstantiateMsg {
        operator: deps.api.addr_make("operator").to_string(),
        reveal_deadline_seconds: 3600,
        prize_amount: Uint128::new(500),
        prize_denom: "usd".to_string(),
        winner_fraction,
    };
    instantiate(deps.as_mut(), mock_env(), message_info(&admin, &[]), msg).unwrap();
    deps
}

fn survey(index: u32, email: Option<String>) -> SurveySubmission {
    SurveySubmission {
        facility_name: format!("Facility {}", index),
        state: Some("Oyo".to_string()),
        respondent: Respondent {
            name: Some(format!("Respondent {}", index)),
            email,
            phone: Some("+234 800 000 0000".to_string()),
        },
        equipment: EquipmentCounts {
            mri: index % 3,
            ct: index % 2,
            ultrasound: 1,
            xray: index % 4,
        },
        challenges: Some("Power outages".to_string()),
        solutions: None,
        referred_by: None,
    }
}

fn submit(deps: &mut TestDeps, sender: &str, submission: SurveySubmission) -> u64 {
    let sender = deps.api.addr_make(sender);
    let res = execute(
        deps.as_mut(),
        mock_env(),
        message_info(&sender, &[]),
        ExecuteMsg::SubmitSurvey(submission),
    )
    .unwrap();
    res.attributes
        .iter()
        .find(|a| a.key == "facility_id")
        .map(|a| a.value.parse().unwrap())
        .unwrap()
}

fn review(deps: &mut TestDeps, facility_id: u64, approve: bool) {
    let admin = deps.api.addr_make("admin");
    let msg = if approve {
        ExecuteMsg::ApproveFacility { facility_id }
    } else {
        ExecuteMsg::RejectFacility { facility_id }
    };
    execute(deps.as_mut(), mock_env(), message_info(&admin, &[]), msg).unwrap();
}

fn commit(deps: &mut TestDeps, env: Env, secret: &[u8]) -> u64 {
    let operator = deps.api.addr_make("operator");
    let res = execute(
        deps.as_mut(),
        env,
        message_info(&operator, &[]),
        ExecuteMsg::CommitDraw {
            operator_commit: commit_for(secret),
        },
    )
    .unwrap();
    res.attributes
        .iter()
        .find(|a| a.key == "draw_id")
        .map(|a| a.value.parse().unwrap())
        .unwrap()
}

fn reveal(
    deps: &mut TestDeps,
    env: Env,
    draw_id: u64,
    secret: &[u8],
) -> Result<Response, ContractError> {
    let operator = deps.api.addr_make("operator");
    execute(
        deps.as_mut(),
        env,
        message_info(&operator, &[]),
        ExecuteMsg::RevealDraw {
            draw_id,
            operator_secret_hex: hex::encode(secret),
        },
    )
}

fn query_json<T: serde::de::DeserializeOwned>(deps: &TestDeps, msg: QueryMsg) -> T {
    from_json(query(deps.as_ref(), mock_env(), msg).unwrap()).unwrap()
}

fn load_draw(deps: &TestDeps, draw_id: u64) -> Draw {
    query_json(deps, QueryMsg::Draw { draw_id })
}

fn load_facility(deps: &TestDeps, facility_id: u64) -> Facility {
    query_json(deps, QueryMsg::Facility { facility_id })
}

fn env_at(seconds: u64) -> Env {
    let mut env = mock_env();
    env.block.time = Timestamp::from_seconds(seconds);
    env
}

fn count_events(res: &Response, ty: &str) -> usize {
    res.events.iter().filter(|e| e.ty == ty).count()
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[test]
fn test_full_raffle_cycle() {
    let mut deps = setup(None);

    let mut approved = vec![];
    for i in 0..42u32 {
        let email = Some(format!("lead{}@clinic{}.ng", i, i));
        let id = submit(&mut deps, &format!("user{}", i), survey(i, email));
        // Two submissions fail review
        let approve = i % 20 != 7;
        review(&mut deps, id, approve);
        if approve {
            approved.push(id);
        }
    }
    assert_eq!(approved.len(), 40);

    let status: RaffleStatusResponse = query_json(&deps, QueryMsg::RaffleStatus {});
    assert_eq!(status.total_participants, 40);
    // floor(40 * 5%) = 2
    assert_eq!(status.next_draw_winner_count, 2);

    let draw_id = commit(&mut deps, mock_env(), SECRET);
    assert_eq!(draw_id, 0);

    let res = reveal(&mut deps, mock_env(), draw_id, SECRET).unwrap();
    assert_eq!(count_events(&res, "raffle_winner"), 2);
    assert_eq!(count_events(&res, "raffle_winner_notification"), 2);
    assert_eq!(count_events(&res, "raffle_notification_failed"), 0);

    let draw = load_draw(&deps, draw_id);
    assert_eq!(draw.status, DrawStatus::Revealed);
    assert_eq!(draw.winners.len(), 2);
    assert_ne!(draw.winners[0], draw.winners[1]);
    assert!(draw.winners.iter().all(|id| approved.contains(id)));

    let results: DrawResultsResponse = query_json(&deps, QueryMsg::DrawResults { draw_id });
    assert_eq!(results.records.len(), 2);
    for (position, record) in results.records.iter().enumerate() {
        assert_eq!(record.position as usize, position);
        assert_eq!(record.facility_id, draw.winners[position]);
        assert_eq!(record.prize_amount, Uint128::new(500));

        let facility = load_facility(&deps, record.facility_id);
        assert_eq!(record.weight_at_selection, u64::from(facility.points));

        let wins: FacilityWinsResponse = query_json(
            &deps,
            QueryMsg::FacilityWins {
                facility_id: record.facility_id,
                start_after: None,
                limit: None,
            },
        );
        assert_eq!(wins.draw_ids, vec![draw_id]);
        assert_eq!(wins.total_won_amount, Uint128::new(500));
    }

    let state: DrawStateInfo = query_json(&deps, QueryMsg::DrawState {});
    assert_eq!(state.total_draws_completed, 1);
    assert_eq!(state.total_winners, 2);
    assert_eq!(state.total_prizes_awarded, Uint128::new(1_000));

    let verify: VerifyDrawResponse = query_json(&deps, QueryMsg::VerifyDraw { draw_id });
    assert!(verify.valid);
}

#[test]
fn test_draw_reproducible_off_chain() {
    let mut deps = setup(Some(Decimal::percent(25)));

    for i in 0..8u32 {
        let id = submit(&mut deps, &format!("user{}", i), survey(i, None));
        review(&mut deps, id, true);
    }

    let draw_id = commit(&mut deps, mock_env(), SECRET);
    reveal(&mut deps, mock_env(), draw_id, SECRET).unwrap();
    let draw = load_draw(&deps, draw_id);

    // Anyone holding the revealed secret and the pool can recompute winners
    let facilities: FacilitiesResponse = query_json(
        &deps,
        QueryMsg::Facilities {
            start_after: None,
            limit: None,
        },
    );
    let entries: Vec<Entry> = facilities.facilities.iter().map(Facility::to_entry).collect();
    let randomness = draw_randomness(SECRET, draw_id, draw.created_at.nanos());
    assert_eq!(draw.final_randomness, Some(hex::encode(randomness)));

    let mut rng = HashChainRandomness::new(randomness);
    let expected: Vec<u64> =
        select_winners(&entries, Decimal::percent(25), Uint128::new(500), &mut rng)
            .unwrap()
            .into_iter()
            .map(|r| r.entry_id)
            .collect();
    assert_eq!(expected.len(), 2);
    assert_eq!(draw.winners, expected);
}

#[test]
fn test_rejected_and_pending_facilities_never_win() {
    let mut deps = setup(Some(Decimal::one()));

    let mut approved = vec![];
    for i in 0..6u32 {
        let id = submit(&mut deps, &format!("user{}", i), survey(i, None));
        match i % 3 {
            0 => {
                review(&mut deps, id, true);
                approved.push(id);
            }
            1 => {
                // Approved, then withdrawn
                review(&mut deps, id, true);
                review(&mut deps, id, false);
            }
            _ => {}
        }
    }

    let participants: ParticipantsResponse = query_json(
        &deps,
        QueryMsg::Participants {
            start_after: None,
            limit: None,
        },
    );
    let ids: Vec<u64> = participants.participants.iter().map(|p| p.facility_id).collect();
    assert_eq!(ids, approved);

    let draw_id = commit(&mut deps, mock_env(), SECRET);
    reveal(&mut deps, mock_env(), draw_id, SECRET).unwrap();

    let mut winners = load_draw(&deps, draw_id).winners;
    winners.sort_unstable();
    assert_eq!(winners, approved);
}

#[test]
fn test_participant_win_chances() {
    let mut deps = setup(None);

    for i in 0..5u32 {
        let id = submit(&mut deps, &format!("user{}", i), survey(i, None));
        review(&mut deps, id, true);
    }

    let participants: ParticipantsResponse = query_json(
        &deps,
        QueryMsg::Participants {
            start_after: None,
            limit: None,
        },
    );
    let total: u32 = participants.participants.iter().map(|p| p.points).sum();
    assert_eq!(participants.total_points, Uint128::from(total));

    let bps: u32 = participants.participants.iter().map(|p| p.win_chance_bps).sum();
    assert!(bps <= 10_000);
    assert!(bps >= 10_000 - participants.participants.len() as u32);
}

#[test]
fn test_snapshot_ignores_later_changes() {
    let mut deps = setup(Some(Decimal::one()));

    let early = submit(&mut deps, "early", survey(1, None));
    review(&mut deps, early, true);
    let withdrawn = submit(&mut deps, "withdrawn", survey(2, None));
    review(&mut deps, withdrawn, true);

    let draw_id = commit(&mut deps, mock_env(), SECRET);

    // Pool changes between commit and reveal
    let late = submit(&mut deps, "late", survey(3, None));
    review(&mut deps, late, true);
    review(&mut deps, withdrawn, false);

    reveal(&mut deps, mock_env(), draw_id, SECRET).unwrap();
    let mut winners = load_draw(&deps, draw_id).winners;
    winners.sort_unstable();
    assert_eq!(winners, vec![early, withdrawn]);

    let verify: VerifyDrawResponse = query_json(&deps, QueryMsg::VerifyDraw { draw_id });
    assert!(verify.valid);
}

#[test]
fn test_notification_failures_reported_per_winner() {
    let mut deps = setup(Some(Decimal::one()));

    let emails = [
        Some("first@clinic.ng".to_string()),
        None,
        Some("not-an-email".to_string()),
        Some("fourth@clinic.ng".to_string()),
    ];
    for (i, email) in emails.into_iter().enumerate() {
        let id = submit(&mut deps, &format!("user{}", i), survey(i as u32, email));
        review(&mut deps, id, true);
    }

    let draw_id = commit(&mut deps, mock_env(), SECRET);
    let res = reveal(&mut deps, mock_env(), draw_id, SECRET).unwrap();

    assert_eq!(count_events(&res, "raffle_winner"), 4);
    assert_eq!(count_events(&res, "raffle_winner_notification"), 2);
    assert_eq!(count_events(&res, "raffle_notification_failed"), 2);
    assert!(res
        .attributes
        .iter()
        .any(|a| a.key == "notified" && a.value == "2 of 4 winners notified"));

    // Every winner is recorded even when notification fails
    let results: DrawResultsResponse = query_json(&deps, QueryMsg::DrawResults { draw_id });
    assert_eq!(results.records.len(), 4);

    let notification = res
        .events
        .iter()
        .find(|e| e.ty == "raffle_winner_notification")
        .unwrap();
    for key in ["to_name", "to_email", "prize_amount", "prize_denom"] {
        assert!(notification.attributes.iter().any(|a| a.key == key));
    }
}

#[test]
fn test_referrals_tracked() {
    let mut deps = setup(None);
    let referrer = deps.api.addr_make("champion");

    let own = submit(&mut deps, "champion", survey(1, None));
    let baseline = load_facility(&deps, own).points;
    review(&mut deps, own, true);

    let mut referred = vec![];
    for i in 1..4u32 {
        let mut submission = survey(i, None);
        submission.referred_by = Some(referrer.to_string());
        referred.push(submit(&mut deps, &format!("user{}", i), submission));
    }

    // Same survey answers, plus the referral bonus
    let referred_facility = load_facility(&deps, referred[0]);
    assert_eq!(referred_facility.referred_by, Some(referrer.clone()));
    assert_eq!(referred_facility.points, baseline + 25);

    // The referrer earns the bonus once per referral
    assert_eq!(load_facility(&deps, own).points, baseline + 75);
    let participants: ParticipantsResponse = query_json(
        &deps,
        QueryMsg::Participants {
            start_after: None,
            limit: None,
        },
    );
    assert_eq!(participants.total_points, Uint128::from(baseline + 75));

    let res: ReferralsResponse = query_json(
        &deps,
        QueryMsg::Referrals {
            referrer: referrer.to_string(),
            start_after: None,
            limit: Some(2),
        },
    );
    assert_eq!(res.total_referrals, 3);
    assert_eq!(res.referrals.len(), 2);
    assert_eq!(res.referrals[0].facility_id, referred[0]);

    let next: ReferralsResponse = query_json(
        &deps,
        QueryMsg::Referrals {
            referrer: referrer.to_string(),
            start_after: Some(referred[1]),
            limit: None,
        },
    );
    assert_eq!(next.referrals.len(), 1);
    assert_eq!(next.referrals[0].facility_id, referred[2]);
}

#[test]
fn test_expired_draw_then_new_draw() {
    let mut deps = setup(None);
    for i in 0..3u32 {
        let id = submit(&mut deps, &format!("user{}", i), survey(i, None));
        review(&mut deps, id, true);
    }

    let start = mock_env().block.time.seconds();
    let first = commit(&mut deps, env_at(start), SECRET);

    let err = reveal(&mut deps, env_at(start + 3601), first, SECRET).unwrap_err();
    assert!(matches!(err, ContractError::DrawExpired { .. }));

    let anyone = deps.api.addr_make("anyone");
    execute(
        deps.as_mut(),
        env_at(start + 3601),
        message_info(&anyone, &[]),
        ExecuteMsg::ExpireDraw { draw_id: first },
    )
    .unwrap();
    assert_eq!(load_draw(&deps, first).status, DrawStatus::Expired);

    let second = commit(&mut deps, env_at(start + 4000), b"second_secret");
    assert_eq!(second, 1);
    reveal(&mut deps, env_at(start + 4100), second, b"second_secret").unwrap();

    // Newest first
    let history: DrawHistoryResponse = query_json(
        &deps,
        QueryMsg::DrawHistory {
            start_before: None,
            limit: None,
        },
    );
    let ids: Vec<u64> = history.draws.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![1, 0]);

    let older: DrawHistoryResponse = query_json(
        &deps,
        QueryMsg::DrawHistory {
            start_before: Some(1),
            limit: None,
        },
    );
    assert_eq!(older.draws.len(), 1);
    assert_eq!(older.draws[0].status, DrawStatus::Expired);

    let state: DrawStateInfo = query_json(&deps, QueryMsg::DrawState {});
    assert_eq!(state.total_draws_completed, 1);
}

#[test]
fn test_commit_requires_eligible_pool() {
    let mut deps = setup(None);
    let id = submit(&mut deps, "pending", survey(0, None));

    let operator = deps.api.addr_make("operator");
    let err = execute(
        deps.as_mut(),
        mock_env(),
        message_info(&operator, &[]),
        ExecuteMsg::CommitDraw {
            operator_commit: commit_for(SECRET),
        },
    )
    .unwrap_err();
    assert!(matches!(err, ContractError::Draw(_)));

    review(&mut deps, id, true);
    let draw_id = commit(&mut deps, mock_env(), SECRET);
    assert_eq!(load_draw(&deps, draw_id).entries_count, 1);
}
