//! Completion check and final standings. Read-only over match state.

use crate::models::{Bracket, EngineError, EngineResult, Match, MatchId, Ranking, Slot};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct CompletionReport {
    pub completed: bool,
    /// Set only once every match is completed.
    pub ranking: Option<Ranking>,
}

/// Decide whether every match of `bracket` is completed and, if so, rank 1st-4th.
///
/// `matches` must hold every match listed by the bracket.
pub fn check_completion(bracket: &Bracket, matches: &[Match]) -> EngineResult<CompletionReport> {
    let find = |id: MatchId| {
        matches
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| EngineError::NotFound(format!("match {id} of bracket {}", bracket.id)))
    };
    for id in &bracket.match_ids {
        if !find(*id)?.is_completed() {
            return Ok(CompletionReport::default());
        }
    }

    let fin = find(bracket.final_match_id)?;
    let winner = fin.winning_competitor().cloned().ok_or_else(|| {
        EngineError::FailedPrecondition(format!(
            "final match {} is completed without a recorded winner",
            fin.id
        ))
    })?;
    let runner_up = fin.losing_slot().and_then(Slot::competitor).cloned();

    let (third_place, fourth_place) = match bracket.consolation_match_id {
        Some(cid) => {
            let consolation = find(cid)?;
            (
                consolation.winning_competitor().cloned(),
                consolation.losing_slot().and_then(Slot::competitor).cloned(),
            )
        }
        None => (None, None),
    };

    Ok(CompletionReport {
        completed: true,
        ranking: Some(Ranking {
            winner: Some(winner),
            runner_up,
            third_place,
            fourth_place,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::advancement::record_result;
    use crate::logic::builder::{build_bracket, BracketOptions};
    use crate::logic::seeding::{assign_seeds, SeedingConfig};
    use crate::models::{BracketView, MatchStatus, Participant};
    use chrono::Utc;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn built(n: u32, with_consolation: bool) -> BracketView {
        let ps: Vec<_> = (1..=n).map(|i| Participant::new(format!("P{i}")).with_rank(i)).collect();
        let list = assign_seeds(&ps, &SeedingConfig::default()).unwrap();
        let options = BracketOptions {
            name: "league".into(),
            with_consolation,
        };
        build_bracket(Uuid::new_v4(), &list, &options).unwrap()
    }

    /// Report every playable match, lower seed winning, until nothing is scheduled.
    fn play_out(view: &BracketView) -> Vec<Match> {
        let mut graph: HashMap<MatchId, Match> =
            view.matches.iter().cloned().map(|m| (m.id, m)).collect();
        loop {
            let next = graph
                .values()
                .find(|m| m.status == MatchStatus::Scheduled)
                .map(|m| {
                    let a = m.player1.competitor().unwrap();
                    let b = m.player2.competitor().unwrap();
                    (m.id, if a.seed < b.seed { a.id } else { b.id })
                });
            let Some((id, winner)) = next else { break };
            record_result(&mut graph, id, winner, None, Utc::now()).unwrap();
        }
        graph.into_values().collect()
    }

    #[test]
    fn incomplete_bracket_has_no_ranking() {
        let v = built(4, false);
        let report = check_completion(&v.bracket, &v.matches).unwrap();
        assert_eq!(report, CompletionReport::default());
    }

    #[test]
    fn favourites_finish_in_seed_order() {
        let v = built(8, true);
        let matches = play_out(&v);
        let report = check_completion(&v.bracket, &matches).unwrap();
        assert!(report.completed);
        let ranking = report.ranking.unwrap();
        let seed = |c: &Option<crate::models::Competitor>| c.as_ref().map(|c| c.seed);
        let seeds = vec![
            seed(&ranking.winner),
            seed(&ranking.runner_up),
            seed(&ranking.third_place),
            seed(&ranking.fourth_place),
        ];
        assert_eq!(seeds, vec![Some(1), Some(2), Some(3), Some(4)]);
    }

    #[test]
    fn walkover_consolation_leaves_fourth_unset() {
        let v = built(3, true);
        let matches = play_out(&v);
        let ranking = check_completion(&v.bracket, &matches).unwrap().ranking.unwrap();
        assert_eq!(ranking.winner.map(|c| c.seed), Some(1));
        assert_eq!(ranking.runner_up.map(|c| c.seed), Some(2));
        assert_eq!(ranking.third_place.map(|c| c.seed), Some(3));
        assert!(ranking.fourth_place.is_none());
    }

    #[test]
    fn final_without_winner_is_surfaced() {
        let v = built(2, false);
        let mut matches = v.matches.clone();
        matches[0].status = MatchStatus::Completed;
        let err = check_completion(&v.bracket, &matches).unwrap_err();
        assert!(matches!(err, EngineError::FailedPrecondition(_)));
    }
}
