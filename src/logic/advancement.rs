//! The advancement rule: record a result, then push winner and loser into
//! downstream slots. Build-time BYE resolution and runtime reporting both go
//! through `propagate`, over any `MatchGraph`.

use crate::models::{
    EngineError, EngineResult, EntrantId, Match, MatchId, MatchLink, MatchStatus, Slot,
};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};

/// Access to match documents by id. Implemented by the in-memory arena used at
/// build time and by the transactional view used at runtime.
pub trait MatchGraph {
    fn load(&mut self, id: MatchId) -> EngineResult<Match>;
    fn store(&mut self, m: Match);
}

impl MatchGraph for HashMap<MatchId, Match> {
    fn load(&mut self, id: MatchId) -> EngineResult<Match> {
        self.get(&id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("match {id}")))
    }

    fn store(&mut self, m: Match) {
        self.insert(m.id, m);
    }
}

/// A reported result after it has been applied to the graph.
#[derive(Clone, Debug)]
pub struct RecordedResult {
    pub resolved: Match,
    /// Downstream matches that received a slot fill, in the order they were written.
    pub advanced_to: Vec<MatchId>,
}

/// Apply `winner` to a scheduled match and advance both sides.
pub fn record_result<G: MatchGraph>(
    graph: &mut G,
    match_id: MatchId,
    winner: EntrantId,
    score: Option<serde_json::Value>,
    now: DateTime<Utc>,
) -> EngineResult<RecordedResult> {
    let mut m = graph.load(match_id)?;
    match m.status {
        MatchStatus::Completed => {
            return Err(EngineError::FailedPrecondition(format!(
                "match {match_id} already has a result"
            )))
        }
        MatchStatus::Pending => {
            return Err(EngineError::FailedPrecondition(format!(
                "match {match_id} is waiting for an opponent"
            )))
        }
        MatchStatus::Scheduled => {}
    }
    if m.position_of(winner).is_none() {
        return Err(EngineError::InvalidArgument(format!(
            "{winner} is not playing in match {match_id}"
        )));
    }

    m.status = MatchStatus::Completed;
    m.winner = Some(winner);
    m.score = score;
    m.completed_at = Some(now);
    graph.store(m.clone());

    let advanced_to = propagate(graph, &m, now)?;
    Ok(RecordedResult {
        resolved: m,
        advanced_to,
    })
}

/// Push a completed match's winner and loser along its links. Targets that a
/// fill resolves as walkovers are propagated in turn.
pub fn propagate<G: MatchGraph>(
    graph: &mut G,
    completed: &Match,
    now: DateTime<Utc>,
) -> EngineResult<Vec<MatchId>> {
    let mut advanced_to = Vec::new();
    let mut queue = VecDeque::from([completed.clone()]);

    while let Some(done) = queue.pop_front() {
        let winner = done
            .winning_competitor()
            .cloned()
            .map(Slot::Filled)
            .unwrap_or(Slot::Bye);
        let loser = done.losing_slot().cloned().unwrap_or(Slot::Bye);

        let routes = [
            (done.next_match_for_winner, winner),
            (done.next_match_for_loser, loser),
        ];
        for (link, occupant) in routes {
            let Some(link) = link else { continue };
            let mut target = graph.load(link.match_id)?;
            fill_slot(&mut target, link, occupant)?;
            let walkover = refresh_status(&mut target, now);
            advanced_to.push(target.id);
            if walkover {
                queue.push_back(target.clone());
            }
            graph.store(target);
        }
    }
    Ok(advanced_to)
}

/// Write into an open slot. A slot is written once; anything else is a broken graph.
fn fill_slot(target: &mut Match, link: MatchLink, occupant: Slot) -> EngineResult<()> {
    if target.is_completed() {
        return Err(EngineError::FailedPrecondition(format!(
            "match {} is already completed",
            target.id
        )));
    }
    let slot = target.slot_mut(link.slot);
    if !slot.is_open() {
        return Err(EngineError::FailedPrecondition(format!(
            "slot {:?} of match {} is already filled",
            link.slot, target.id
        )));
    }
    *slot = occupant;
    Ok(())
}

/// Recompute status from the slots. Returns true when the match resolves as a
/// walkover (one or both sides are BYEs) and must be propagated.
pub fn refresh_status(m: &mut Match, now: DateTime<Utc>) -> bool {
    let winner = match (&m.player1, &m.player2) {
        (Slot::Filled(_), Slot::Filled(_)) => {
            m.status = MatchStatus::Scheduled;
            return false;
        }
        (Slot::Filled(c), Slot::Bye) | (Slot::Bye, Slot::Filled(c)) => Some(c.id),
        (Slot::Bye, Slot::Bye) => None,
        _ => {
            m.status = MatchStatus::Pending;
            return false;
        }
    };
    m.status = MatchStatus::Completed;
    m.winner = winner;
    m.walkover = true;
    m.completed_at = Some(now);
    true
}
