//! Integration tests: build a bracket, report results, resolve standings.

use elimination_bracket::{
    AllowAll, BracketId, BracketService, BracketStatus, BracketView, BuildBracketRequest, Caller,
    CompletionDetector, EngineConfig, EngineError, EntrantId, LogNotifier, Match, MatchKind,
    MatchStatus, MemoryStore, PairingMode, Participant, ReportResultRequest, SeedingConfig, Slot,
    SlotPosition,
};
use std::sync::Arc;

fn setup() -> (BracketService, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let service = BracketService::new(
        store.clone(),
        Arc::new(AllowAll),
        Arc::new(LogNotifier),
        EngineConfig::default(),
    );
    (service, store)
}

fn ranked(n: u32) -> Vec<Participant> {
    (1..=n).map(|i| Participant::new(format!("Seed {i}")).with_rank(i)).collect()
}

fn admin() -> Caller {
    Caller::new("admin")
}

fn build(service: &BracketService, participants: Vec<Participant>, with_consolation: bool) -> BracketView {
    service
        .build_bracket(
            &admin(),
            BuildBracketRequest {
                name: "Club Championship".into(),
                participants,
                with_consolation: Some(with_consolation),
                ..Default::default()
            },
        )
        .unwrap()
}

fn seed_at(m: &Match, pos: SlotPosition) -> Option<u32> {
    m.slot(pos).competitor().map(|c| c.seed)
}

fn entrant_with_seed(m: &Match, seed: u32) -> EntrantId {
    [SlotPosition::Player1, SlotPosition::Player2]
        .into_iter()
        .filter_map(|pos| m.slot(pos).competitor())
        .find(|c| c.seed == seed)
        .map(|c| c.id)
        .unwrap_or_else(|| panic!("seed {seed} not in match {}", m.id))
}

fn report(service: &BracketService, bracket: BracketId, m: &Match, winner_seed: u32) {
    service
        .report_result(
            &admin(),
            bracket,
            m.id,
            ReportResultRequest {
                winner_id: entrant_with_seed(m, winner_seed),
                score: Some(serde_json::json!({ "legs": [3, 1] })),
            },
        )
        .unwrap();
}

fn reload(service: &BracketService, id: BracketId) -> BracketView {
    service.get_bracket(id).unwrap()
}

#[test]
fn four_entrants_advance_into_final() {
    let (service, _) = setup();
    let view = build(&service, ranked(4), false);
    let id = view.bracket.id;
    assert_eq!(view.matches.len(), 3);

    let round0 = view.round(0);
    assert_eq!((seed_at(round0[0], SlotPosition::Player1), seed_at(round0[0], SlotPosition::Player2)), (Some(1), Some(4)));
    assert_eq!((seed_at(round0[1], SlotPosition::Player1), seed_at(round0[1], SlotPosition::Player2)), (Some(2), Some(3)));

    report(&service, id, round0[0], 1);
    assert!(!service.check_completion(id).unwrap().completed);
    report(&service, id, round0[1], 2);

    let view = reload(&service, id);
    let fin = view.final_match().unwrap();
    assert_eq!(fin.kind, MatchKind::Final);
    assert_eq!(seed_at(fin, SlotPosition::Player1), Some(1));
    assert_eq!(seed_at(fin, SlotPosition::Player2), Some(2));
    assert_eq!(fin.status, MatchStatus::Scheduled);
    assert!(!service.check_completion(id).unwrap().completed);

    report(&service, id, fin, 2);
    let report = service.check_completion(id).unwrap();
    assert!(report.completed);
    let ranking = report.ranking.unwrap();
    assert_eq!(ranking.winner.map(|c| c.seed), Some(2));
    assert_eq!(ranking.runner_up.map(|c| c.seed), Some(1));
    assert!(ranking.third_place.is_none());
    assert!(ranking.fourth_place.is_none());

    let bracket = reload(&service, id).bracket;
    assert_eq!(bracket.status, BracketStatus::Complete);
    assert!(bracket.completed_at.is_some());
}

#[test]
fn eight_entrants_with_consolation_rank_top_four() {
    let (service, _) = setup();
    let view = build(&service, ranked(8), true);
    let id = view.bracket.id;
    assert_eq!(view.matches.len(), 8);

    // Quarterfinals: 1v8, 4v5, 2v7, 3v6. Upsets by 5 and 6.
    let qf = view.round(0);
    report(&service, id, qf[0], 1);
    report(&service, id, qf[1], 5);
    report(&service, id, qf[2], 2);
    report(&service, id, qf[3], 6);

    let view = reload(&service, id);
    let semis = view.round(1);
    assert_eq!((seed_at(semis[0], SlotPosition::Player1), seed_at(semis[0], SlotPosition::Player2)), (Some(1), Some(5)));
    assert_eq!((seed_at(semis[1], SlotPosition::Player1), seed_at(semis[1], SlotPosition::Player2)), (Some(2), Some(6)));
    report(&service, id, semis[0], 5);
    report(&service, id, semis[1], 2);

    let view = reload(&service, id);
    let consolation = view.consolation_match().unwrap();
    assert_eq!(seed_at(consolation, SlotPosition::Player1), Some(1));
    assert_eq!(seed_at(consolation, SlotPosition::Player2), Some(6));
    assert_eq!(consolation.status, MatchStatus::Scheduled);

    report(&service, id, view.final_match().unwrap(), 5);
    assert!(!service.check_completion(id).unwrap().completed);
    report(&service, id, consolation, 6);

    let ranking = service.check_completion(id).unwrap().ranking.unwrap();
    assert_eq!(ranking.winner.map(|c| c.seed), Some(5));
    assert_eq!(ranking.runner_up.map(|c| c.seed), Some(2));
    assert_eq!(ranking.third_place.map(|c| c.seed), Some(6));
    assert_eq!(ranking.fourth_place.map(|c| c.seed), Some(1));
}

#[test]
fn second_report_is_rejected_without_change() {
    let (service, _) = setup();
    let view = build(&service, ranked(4), false);
    let id = view.bracket.id;
    let m = view.round(0)[0].clone();
    report(&service, id, &m, 1);
    let before = reload(&service, id);

    let err = service
        .report_result(
            &admin(),
            id,
            m.id,
            ReportResultRequest {
                winner_id: entrant_with_seed(&m, 4),
                score: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::FailedPrecondition(_)));
    assert_eq!(reload(&service, id), before);
}

#[test]
fn winner_outside_match_is_invalid() {
    let (service, _) = setup();
    let view = build(&service, ranked(4), false);
    let id = view.bracket.id;
    let round0 = view.round(0);
    let stranger = entrant_with_seed(round0[1], 3);

    let err = service
        .report_result(
            &admin(),
            id,
            round0[0].id,
            ReportResultRequest { winner_id: stranger, score: None },
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument(_)));
    assert_eq!(reload(&service, id), view);
}

#[test]
fn unknown_ids_are_not_found() {
    let (service, _) = setup();
    let view = build(&service, ranked(2), false);
    let request = || ReportResultRequest {
        winner_id: uuid::Uuid::new_v4(),
        score: None,
    };

    let err = service
        .report_result(&admin(), uuid::Uuid::new_v4(), view.matches[0].id, request())
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    let err = service
        .report_result(&admin(), view.bracket.id, uuid::Uuid::new_v4(), request())
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    assert!(matches!(service.get_bracket(uuid::Uuid::new_v4()), Err(EngineError::NotFound(_))));
}

#[test]
fn match_waiting_for_opponent_cannot_be_reported() {
    let (service, _) = setup();
    let view = build(&service, ranked(4), false);
    let fin = view.final_match().unwrap();
    assert_eq!(fin.status, MatchStatus::Pending);
    let err = service
        .report_result(
            &admin(),
            view.bracket.id,
            fin.id,
            ReportResultRequest {
                winner_id: view.bracket.entrants[0].entrant.id,
                score: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::FailedPrecondition(_)));
}

#[test]
fn rebuilding_an_existing_bracket_fails() {
    let (service, store) = setup();
    let view = build(&service, ranked(4), false);
    let docs = store.len();

    let err = service
        .build_bracket(
            &admin(),
            BuildBracketRequest {
                bracket_id: Some(view.bracket.id),
                participants: ranked(8),
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::FailedPrecondition(_)));
    assert_eq!(store.len(), docs);
    assert_eq!(reload(&service, view.bracket.id), view);
}

#[test]
fn invalid_participants_write_nothing() {
    let (service, store) = setup();
    let p = Participant::new("Solo");
    let err = service
        .build_bracket(
            &admin(),
            BuildBracketRequest {
                participants: vec![p.clone()],
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument(_)));

    let err = service
        .build_bracket(
            &admin(),
            BuildBracketRequest {
                participants: vec![p.clone(), p],
                ..Default::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidArgument(_)));
    assert!(store.is_empty());
}

#[test]
fn byes_put_top_seeds_straight_into_round_two() {
    let (service, _) = setup();
    let view = build(&service, ranked(6), true);
    assert_eq!(view.bracket.bracket_size, 8);
    assert_eq!(view.bracket.bye_count, 2);
    assert_eq!(view.bracket.status, BracketStatus::InProgress);

    let walkovers: Vec<_> = view.round(0).into_iter().filter(|m| m.walkover).collect();
    assert_eq!(walkovers.len(), 2);
    let semis = view.round(1);
    assert_eq!(seed_at(semis[0], SlotPosition::Player1), Some(1));
    assert_eq!(seed_at(semis[1], SlotPosition::Player1), Some(2));
    assert!(semis.iter().all(|m| m.player2 == Slot::Open));
}

#[test]
fn reports_after_completion_are_rejected() {
    let (service, _) = setup();
    let view = build(&service, ranked(2), false);
    let fin = view.final_match().unwrap().clone();
    report(&service, view.bracket.id, &fin, 1);

    let err = service
        .report_result(
            &admin(),
            view.bracket.id,
            fin.id,
            ReportResultRequest {
                winner_id: entrant_with_seed(&fin, 2),
                score: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::FailedPrecondition(_)));
    let ranking = reload(&service, view.bracket.id).bracket.ranking;
    assert_eq!(ranking.winner.map(|c| c.seed), Some(1));
}

#[test]
fn committing_the_ranking_twice_is_idempotent() {
    let (service, store) = setup();
    let view = build(&service, ranked(2), false);
    let id = view.bracket.id;
    report(&service, id, view.final_match().unwrap(), 2);
    let completed = reload(&service, id).bracket;

    let detector = CompletionDetector::new(store, EngineConfig::default());
    let again = detector.commit_ranking(id).unwrap();
    assert!(!again.newly_completed);
    assert!(again.report.completed);
    assert_eq!(again.report.ranking, Some(completed.ranking.clone()));
    assert_eq!(reload(&service, id).bracket, completed);
}

#[test]
fn team_first_doubles_play_as_units() {
    let (service, _) = setup();
    let mut ps: Vec<Participant> = (1..=8).map(|i| Participant::new(format!("Player {i}")).with_rank(i)).collect();
    for pair in [(0, 7), (1, 6), (2, 5), (3, 4)] {
        let (a, b) = (ps[pair.0].id, ps[pair.1].id);
        ps[pair.0].partner_id = Some(b);
        ps[pair.1].partner_id = Some(a);
    }
    let view = service
        .build_bracket(
            &admin(),
            BuildBracketRequest {
                participants: ps.clone(),
                seeding: SeedingConfig {
                    mode: PairingMode::TeamFirst,
                    ..Default::default()
                },
                with_consolation: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(view.bracket.entrants.len(), 4);
    assert_eq!(view.bracket.bracket_size, 4);
    let team_one = &view.bracket.entrants[0].entrant;
    assert_eq!(team_one.name, "Player 1 / Player 8");
    assert_eq!(team_one.members, vec![ps[0].id, ps[7].id]);

    let semi = view.round(0)[0];
    report(&service, view.bracket.id, semi, 1);
    let fin = reload(&service, view.bracket.id).final_match().unwrap().clone();
    assert_eq!(fin.player1.competitor().map(|c| c.id), Some(ps[0].id));
}
