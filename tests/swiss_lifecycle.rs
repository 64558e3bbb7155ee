//! Integration tests for the Swiss lifecycle: pairing, byes, late
//! entries, and result retraction.

use matchplay::{
    LateEntry, Outcome, Player, SequentialIds, Sorting, Status, Tiebreak, Tournament,
    TournamentConfig, TournamentError,
};

fn swiss_event(players: usize) -> Tournament {
    let config = TournamentConfig::swiss(1.0, 0.5).with_sorting(Sorting::Ascending);
    let mut event = Tournament::with_id_source(config, Box::new(SequentialIds::new("m")));
    for i in 1..=players {
        event
            .add_player(Player::new(&format!("p{i}"), &format!("Player {i}")).with_seed(i as u32))
            .unwrap();
    }
    event
}

/// Report every active match with the lower-seeded player winning 2-1.
fn favourites_win(event: &mut Tournament) {
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
        let seed_one = event.player(&one).unwrap().seed;
        let seed_two = event.player(&two).unwrap().seed;
        if seed_one < seed_two {
            event.report_result(&id, 2, 1, 0).unwrap();
        } else {
            event.report_result(&id, 1, 2, 0).unwrap();
        }
    }
}

#[test]
fn test_eight_player_event_runs_three_rounds() {
    let mut event = swiss_event(8);
    event.start().unwrap();
    assert_eq!(event.scheduled_rounds(), 3);
    assert_eq!(event.status(), Status::Active);
    assert_eq!(event.matches().len(), 4);

    for round in 1..=3 {
        assert_eq!(event.current_round(), round);
        favourites_win(&mut event);
        event.next_round().unwrap();
    }
    assert_eq!(event.status(), Status::Finished);

    let standings = event.standings(true);
    assert_eq!(standings[0].id, "p1");
    assert_eq!(standings[0].match_points, 3.0);
    assert_eq!(standings[0].match_count, 3);

    // Solkoff is the sum of the winner's three opponents' match points.
    let expected: f64 = standings[0]
        .results
        .iter()
        .filter_map(|r| r.opponent.as_ref())
        .map(|o| event.player(o).unwrap().match_points)
        .sum();
    assert_eq!(standings[0].tiebreaks.solkoff, expected);
}

#[test]
fn test_round_one_splits_top_and_bottom_half() {
    let mut event = swiss_event(8);
    event.start().unwrap();

    let first = &event.matches()[0];
    assert_eq!(first.player_one.as_deref(), Some("p1"));
    assert_eq!(first.player_two.as_deref(), Some("p5"));
}

#[test]
fn test_nine_players_bye_rotates() {
    let mut event = swiss_event(9);
    event.start().unwrap();

    let real: Vec<_> = event.matches().iter().filter(|m| !m.is_bye()).collect();
    let byes: Vec<_> = event.matches().iter().filter(|m| m.is_bye()).collect();
    assert_eq!(real.len(), 4);
    assert_eq!(byes.len(), 1);

    // The bye goes to the lowest-ranked player and is materialised at once.
    let bye = byes[0];
    assert_eq!(bye.player_one.as_deref(), Some("p9"));
    assert!(!bye.active);
    let p9 = event.player("p9").unwrap();
    assert_eq!(p9.match_points, 1.0);
    assert!(p9.pairing_bye);
    assert_eq!(p9.results[0].outcome, Outcome::Bye);

    favourites_win(&mut event);
    event.next_round().unwrap();

    let round_two_bye = event
        .matches()
        .iter()
        .find(|m| m.round == 2 && m.is_bye())
        .expect("nine players always leave one unpaired");
    assert_ne!(round_two_bye.player_one.as_deref(), Some("p9"));
}

#[test]
fn test_no_player_meets_twice_over_the_event() {
    let mut event = swiss_event(8);
    event.start().unwrap();
    for _ in 1..=3 {
        favourites_win(&mut event);
        event.next_round().unwrap();
    }

    for player in event.players() {
        let mut seen = Vec::new();
        for opponent in player.opponents() {
            assert!(
                !seen.contains(&opponent),
                "{} met {opponent} twice",
                player.id
            );
            seen.push(opponent);
        }
    }
}

#[test]
fn test_late_entry_catches_up_with_byes() {
    let mut event = swiss_event(8);
    event.start().unwrap();
    favourites_win(&mut event);
    event.next_round().unwrap();

    event
        .add_player(Player::new("p9", "Latecomer"))
        .unwrap();
    let late = event.player("p9").unwrap();
    assert_eq!(late.results.len(), 2);
    assert_eq!(late.match_points, 2.0);
    assert!(late.results.iter().all(|r| r.outcome == Outcome::Bye));
    assert!(!late.pairing_bye);
}

#[test]
fn test_late_entry_catches_up_with_losses() {
    let config = TournamentConfig::swiss(1.0, 0.5)
        .with_sorting(Sorting::Ascending)
        .with_late_entry(LateEntry::Losses);
    let mut event = Tournament::with_id_source(config, Box::new(SequentialIds::new("m")));
    for i in 1..=8 {
        event
            .add_player(Player::new(&format!("p{i}"), &format!("Player {i}")).with_seed(i))
            .unwrap();
    }
    event.start().unwrap();
    favourites_win(&mut event);
    event.next_round().unwrap();

    event.add_player(Player::new("p9", "Latecomer")).unwrap();
    let late = event.player("p9").unwrap();
    assert_eq!(late.match_points, 0.0);
    assert_eq!(late.match_count, 2);
    assert!(late.game_count > 0);
}

#[test]
fn test_report_erase_report_leaves_single_history_entry() {
    let mut event = swiss_event(8);
    event.start().unwrap();

    let id = event.matches()[0].id.clone();
    let one = event.matches()[0].player_one.clone().unwrap();
    let two = event.matches()[0].player_two.clone().unwrap();

    event.report_result(&id, 2, 1, 0).unwrap();
    event.erase_result(&id).unwrap();
    event.report_result(&id, 1, 2, 1).unwrap();

    let p_one = event.player(&one).unwrap();
    let p_two = event.player(&two).unwrap();
    assert_eq!(p_one.results.len(), 1);
    assert_eq!(p_two.results.len(), 1);
    assert_eq!(p_one.results[0].outcome, Outcome::Loss);
    assert_eq!(p_two.results[0].outcome, Outcome::Win);
    assert_eq!(p_one.game_points, 1.0 + 0.5);
    assert_eq!(p_two.game_points, 2.0 + 0.5);
}

#[test]
fn test_erase_then_state_matches_pre_report() {
    let mut event = swiss_event(8);
    event.start().unwrap();

    let players_before = event.players().to_vec();
    let matches_before = event.matches().to_vec();

    let id = event.matches()[2].id.clone();
    event.report_result(&id, 2, 0, 0).unwrap();
    event.erase_result(&id).unwrap();

    assert_eq!(event.players(), players_before.as_slice());
    assert_eq!(event.matches(), matches_before.as_slice());
}

#[test]
fn test_custom_tiebreak_precedence_orders_standings() {
    let config = TournamentConfig::swiss(1.0, 0.5)
        .with_sorting(Sorting::Ascending)
        .with_tiebreaks(vec![
            Tiebreak::MatchWinPct,
            Tiebreak::MedianBuchholz,
            Tiebreak::Cumulative,
            Tiebreak::OppCumulative,
            Tiebreak::OppOppMatchWinPct,
        ]);
    let mut event = Tournament::with_id_source(config, Box::new(SequentialIds::new("m")));
    for i in 1..=8 {
        event
            .add_player(Player::new(&format!("p{i}"), &format!("Player {i}")).with_seed(i))
            .unwrap();
    }
    event.start().unwrap();
    for _ in 0..3 {
        favourites_win(&mut event);
        event.next_round().unwrap();
    }
    assert_eq!(event.status(), Status::Finished);

    // Favourites sweeping every round leaves p2, p3, p4 tied on two wins
    // and p5, p6, p7 tied on one; the configured precedence resolves both
    // cohorts, so the final order is the seed order.
    let standings = event.standings(false);
    let order: Vec<&str> = standings.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(order, vec!["p1", "p2", "p3", "p4", "p5", "p6", "p7", "p8"]);

    let close = |a: f64, b: f64| (a - b).abs() < 1e-9;
    let by_id = |id: &str| standings.iter().find(|p| p.id == id).unwrap();

    // Match win % separates the score groups and floors the winless p8.
    assert!(close(by_id("p1").tiebreaks.match_win_pct, 1.0));
    assert!(close(by_id("p8").tiebreaks.match_win_pct, 1.0 / 3.0));

    // Median Buchholz lifts p2 (opponents on 1, 2, 3 points, median 2)
    // over p3 and p4 (both median 1).
    assert!(close(by_id("p2").tiebreaks.median_buchholz, 2.0));
    assert!(close(by_id("p3").tiebreaks.median_buchholz, 1.0));
    assert!(close(by_id("p4").tiebreaks.median_buchholz, 1.0));

    // Cumulative sums the running totals: p1 ran 1, 2, 3; p3 ran 1, 1, 2.
    assert!(close(by_id("p1").tiebreaks.cumulative, 6.0));
    assert!(close(by_id("p3").tiebreaks.cumulative, 4.0));

    // Opponents' cumulative splits the p3/p4 tie: p3 faced p7 (1),
    // p1 (6), and p5 (2); p4 faced p8 (0), p2 (5), and p6 (2).
    assert!(close(by_id("p3").tiebreaks.opp_cumulative, 9.0));
    assert!(close(by_id("p4").tiebreaks.opp_cumulative, 7.0));

    // Opponents' opponent match win %, self-results excluded at each
    // level: 13/18 for the undefeated p1, 23/54 for the winless p8.
    assert!(close(by_id("p1").tiebreaks.opp_opp_match_win_pct, 13.0 / 18.0));
    assert!(close(by_id("p8").tiebreaks.opp_opp_match_win_pct, 23.0 / 54.0));
}

#[test]
fn test_next_round_refused_while_matches_open() {
    let mut event = swiss_event(8);
    event.start().unwrap();
    assert!(matches!(
        event.next_round(),
        Err(TournamentError::RoundStillOpen)
    ));
}

#[test]
fn test_start_requires_eight_players() {
    let mut event = swiss_event(7);
    match event.start() {
        Err(TournamentError::NotEnoughPlayers { needed, have }) => {
            assert_eq!(needed, 8);
            assert_eq!(have, 7);
        }
        other => panic!("expected NotEnoughPlayers, got {other:?}"),
    }
}

#[test]
fn test_withdrawal_forfeits_current_match() {
    let mut event = swiss_event(8);
    event.start().unwrap();

    let m = &event.matches()[0];
    let id = m.id.clone();
    let loser = m.player_one.clone().unwrap();
    let winner = m.player_two.clone().unwrap();

    event.remove_player(&loser).unwrap();

    let m = event.matches().iter().find(|m| m.id == id).unwrap();
    assert!(!m.active);
    assert_eq!(m.result.player_two_wins, 1);
    assert_eq!(m.result.player_one_wins, 0);
    assert!(!event.player(&loser).unwrap().active);
    assert_eq!(event.player(&winner).unwrap().match_points, 1.0);
}

#[test]
fn test_initial_byes_sit_out_early_rounds() {
    let mut event = swiss_event(8);
    event
        .add_player(Player::new("p9", "Preregistered").with_initial_byes(1))
        .unwrap();
    event.start().unwrap();

    // p9 sits out round one with an awarded bye; the other eight pair off.
    let p9 = event.player("p9").unwrap();
    assert_eq!(p9.match_points, 1.0);
    assert!(!p9.pairing_bye);
    assert_eq!(
        event.matches().iter().filter(|m| m.active).count(),
        4,
        "eight remaining players pair into four matches"
    );
}
