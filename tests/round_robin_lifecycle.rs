//! Integration tests for round-robin scheduling, byes, and withdrawal.

use matchplay::{
    Format, Player, SequentialIds, Status, Tournament, TournamentConfig, TournamentError,
};

fn event_with(config: TournamentConfig, names: &[&str]) -> Tournament {
    let mut event = Tournament::with_id_source(config, Box::new(SequentialIds::new("m")));
    for name in names {
        event.add_player(Player::new(name, name)).unwrap();
    }
    event
}

/// Report every active match; `winner` picks the id that takes it 2-0.
fn sweep_round(event: &mut Tournament, winner: impl Fn(&str, &str) -> bool) {
    let live: Vec<_> = event
        .matches()
        .iter()
        .filter(|m| m.active)
        .map(|m| {
            (
                m.id.clone(),
                m.player_one.clone().unwrap(),
                m.player_two.clone().unwrap(),
            )
        })
        .collect();
    for (id, one, two) in live {
        if winner(&one, &two) {
            event.report_result(&id, 2, 0, 0).unwrap();
        } else {
            event.report_result(&id, 0, 2, 0).unwrap();
        }
    }
}

#[test]
fn test_four_player_single_cycle_standings() {
    let mut event = event_with(
        TournamentConfig::round_robin(3.0, 1.0),
        &["A", "B", "C", "D"],
    );
    event.start().unwrap();

    assert_eq!(event.scheduled_rounds(), 3);
    assert_eq!(event.matches().len(), 6);
    assert_eq!(event.matches().iter().filter(|m| m.active).count(), 2);

    // Alphabetical order wins every match: A > B > C > D.
    for _ in 0..3 {
        sweep_round(&mut event, |one, two| one < two);
        event.next_round().unwrap();
    }
    assert_eq!(event.status(), Status::Finished);

    let standings = event.standings(true);
    let points: Vec<(String, f64)> = standings
        .iter()
        .map(|p| (p.id.clone(), p.match_points))
        .collect();
    assert_eq!(
        points,
        vec![
            ("A".to_string(), 9.0),
            ("B".to_string(), 6.0),
            ("C".to_string(), 3.0),
            ("D".to_string(), 0.0),
        ]
    );
    assert!(standings.iter().all(|p| p.match_count == 3));
}

#[test]
fn test_five_players_each_bye_once() {
    let mut event = event_with(
        TournamentConfig::round_robin(3.0, 1.0),
        &["A", "B", "C", "D", "E"],
    );
    event.start().unwrap();
    assert_eq!(event.scheduled_rounds(), 5);

    for _ in 0..5 {
        sweep_round(&mut event, |one, two| one < two);
        event.next_round().unwrap();
    }
    assert_eq!(event.status(), Status::Finished);

    for player in event.players() {
        let byes = player
            .results
            .iter()
            .filter(|r| r.opponent.is_none())
            .count();
        assert_eq!(byes, 1, "{} should bye exactly once", player.id);
        assert_eq!(player.match_count, 5);
    }
}

#[test]
fn test_double_cycle_meets_everyone_twice() {
    let mut event = event_with(
        TournamentConfig::double_round_robin(3.0, 1.0),
        &["A", "B", "C", "D"],
    );
    event.start().unwrap();
    assert_eq!(event.scheduled_rounds(), 6);
    assert_eq!(event.matches().len(), 12);

    for _ in 0..6 {
        sweep_round(&mut event, |one, two| one < two);
        event.next_round().unwrap();
    }

    for player in event.players() {
        assert_eq!(player.match_count, 6);
        for other in event.players() {
            if other.id == player.id {
                continue;
            }
            let meetings = player.opponents().filter(|o| **o == other.id).count();
            assert_eq!(meetings, 2, "{} vs {}", player.id, other.id);
        }
    }
}

#[test]
fn test_double_cycle_swaps_sides() {
    let mut event = event_with(
        TournamentConfig::double_round_robin(3.0, 1.0),
        &["A", "B", "C", "D"],
    );
    event.start().unwrap();

    let first_cycle: Vec<_> = event
        .matches()
        .iter()
        .filter(|m| m.round <= 3)
        .map(|m| (m.player_one.clone(), m.player_two.clone()))
        .collect();
    let second_cycle: Vec<_> = event
        .matches()
        .iter()
        .filter(|m| m.round > 3)
        .map(|m| (m.player_one.clone(), m.player_two.clone()))
        .collect();
    for (one, two) in &first_cycle {
        assert!(
            second_cycle.contains(&(two.clone(), one.clone())),
            "{one:?} vs {two:?} should recur with sides swapped"
        );
    }
}

#[test]
fn test_removal_forfeits_and_clears_future_double_cycle_slots() {
    let mut event = event_with(
        TournamentConfig::double_round_robin(3.0, 1.0),
        &["A", "B", "C", "D"],
    );
    event.start().unwrap();

    event.remove_player("D").unwrap();
    assert!(!event.player("D").unwrap().active);

    // D's current match was forfeited to the opponent.
    let forfeited = event
        .matches()
        .iter()
        .find(|m| m.round == 1 && m.contains("D"))
        .unwrap();
    assert!(!forfeited.active);
    assert!(forfeited.is_reported());

    // Every future slot that held D is now open.
    for m in event.matches().iter().filter(|m| m.round > 1) {
        assert!(!m.contains("D"), "round {} still schedules D", m.round);
    }

    // The opponents left behind get byes when their rounds activate.
    sweep_round(&mut event, |one, two| one < two);
    event.next_round().unwrap();
    let bye = event
        .matches()
        .iter()
        .find(|m| m.round == 2 && m.is_bye())
        .expect("the round-two opponent of D inherits a bye");
    assert!(bye.is_reported());
}

#[test]
fn test_late_additions_rejected_after_start() {
    let mut event = event_with(
        TournamentConfig::round_robin(3.0, 1.0),
        &["A", "B", "C", "D"],
    );
    event.start().unwrap();
    assert!(matches!(
        event.add_player(Player::new("E", "E")),
        Err(TournamentError::LateEntryClosed)
    ));
}

#[test]
fn test_round_robin_requires_four_players() {
    let mut event = event_with(TournamentConfig::round_robin(3.0, 1.0), &["A", "B", "C"]);
    assert!(matches!(
        event.start(),
        Err(TournamentError::NotEnoughPlayers { needed: 4, .. })
    ));
    assert_eq!(event.config().format, Format::RoundRobin);
}
