//! Match-graph construction for a single-elimination bracket, with an optional
//! third-place (consolation) match.

use crate::logic::advancement::{self, MatchGraph};
use crate::logic::seeding::{SeedSlot, SeededList};
use crate::models::{
    Bracket, BracketId, BracketStatus, BracketView, Competitor, EngineError, EngineResult, Match,
    MatchId, MatchKind, MatchLink, Ranking, Slot, SlotPosition,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct BracketOptions {
    pub name: String,
    /// Route semifinal losers into a third-place match (needs at least two rounds).
    pub with_consolation: bool,
}

/// Human label for a main-bracket round with `matches` matches.
pub fn round_label(matches: u32) -> String {
    match matches {
        1 => "Final".to_string(),
        2 => "Semifinal".to_string(),
        4 => "Quarterfinal".to_string(),
        n => format!("Round of {}", n * 2),
    }
}

/// Build every match of the bracket in memory.
///
/// Round-0 slots come straight from the seeded list. BYE matches resolve here
/// and advance through the same rule runtime results use, so downstream
/// rounds never wait on them.
pub fn build_bracket(id: BracketId, seeded: &SeededList, options: &BracketOptions) -> EngineResult<BracketView> {
    let size = seeded.bracket_size;
    if size < 2 || !size.is_power_of_two() || seeded.slots.len() != size as usize {
        return Err(EngineError::InvalidArgument(format!(
            "seeded list of {} slots does not form a bracket of {}",
            seeded.slots.len(),
            size
        )));
    }
    let rounds = size.trailing_zeros();
    let now = Utc::now();

    // rounds_ids[r][p] = id of the match at round r, position p.
    let mut arena: HashMap<MatchId, Match> = HashMap::new();
    let mut order: Vec<MatchId> = Vec::with_capacity(size as usize);
    let mut rounds_ids: Vec<Vec<MatchId>> = Vec::with_capacity(rounds as usize);
    for r in 0..rounds {
        let count = size >> (r + 1);
        let kind = if r + 1 == rounds { MatchKind::Final } else { MatchKind::Normal };
        let label = round_label(count);
        let ids: Vec<MatchId> = (0..count)
            .map(|p| {
                let m = Match::new(id, r, p, label.clone(), kind);
                let mid = m.id;
                arena.insert(mid, m);
                order.push(mid);
                mid
            })
            .collect();
        rounds_ids.push(ids);
    }

    // Winner links: (r, p) feeds (r + 1, p / 2).
    for r in 0..rounds.saturating_sub(1) as usize {
        for (p, mid) in rounds_ids[r].iter().enumerate() {
            let link = MatchLink {
                match_id: rounds_ids[r + 1][p / 2],
                slot: SlotPosition::for_child(p as u32),
            };
            if let Some(m) = arena.get_mut(mid) {
                m.next_match_for_winner = Some(link);
            }
        }
    }

    let final_match_id = rounds_ids[rounds as usize - 1][0];
    let consolation_match_id = if options.with_consolation && rounds >= 2 {
        let consolation = Match::new(id, rounds - 1, 1, "Third Place", MatchKind::Consolation);
        let cid = consolation.id;
        arena.insert(cid, consolation);
        order.push(cid);
        for (p, semi) in rounds_ids[rounds as usize - 2].iter().enumerate() {
            if let Some(m) = arena.get_mut(semi) {
                m.next_match_for_loser = Some(MatchLink {
                    match_id: cid,
                    slot: SlotPosition::for_child(p as u32),
                });
            }
        }
        Some(cid)
    } else {
        if options.with_consolation {
            log::debug!("bracket {id} has no semifinals, skipping the third-place match");
        }
        None
    };

    for (p, pair) in seeded.slots.chunks_exact(2).enumerate() {
        let mut m = arena.load(rounds_ids[0][p])?;
        m.player1 = to_slot(&pair[0]);
        m.player2 = to_slot(&pair[1]);
        let walkover = advancement::refresh_status(&mut m, now);
        arena.store(m.clone());
        if walkover {
            advancement::propagate(&mut arena, &m, now)?;
        }
    }

    let matches = order
        .iter()
        .map(|mid| arena.load(*mid))
        .collect::<EngineResult<Vec<_>>>()?;

    let bracket = Bracket {
        id,
        name: options.name.clone(),
        status: BracketStatus::Building,
        bracket_size: size,
        rounds,
        bye_count: seeded.bye_count(),
        entrants: seeded.entrants.clone(),
        match_ids: order,
        final_match_id,
        consolation_match_id,
        ranking: Ranking::default(),
        created_at: now,
        completed_at: None,
    };
    Ok(BracketView { bracket, matches })
}

fn to_slot(seed_slot: &SeedSlot) -> Slot {
    match seed_slot {
        SeedSlot::Entrant(e) => Slot::Filled(Competitor::from(e)),
        SeedSlot::Bye => Slot::Bye,
    }
}
