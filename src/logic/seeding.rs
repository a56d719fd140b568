//! Seed assignment: entrant ordering, Team-First pairing, and BYE placement.

use crate::models::{EngineError, EngineResult, Entrant, Participant, ParticipantId, SeededEntrant};
use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Singles seeds individuals; Team-First seeds mutual partner pairs as one unit.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PairingMode {
    #[default]
    Singles,
    TeamFirst,
}

/// Which entrants receive the BYEs.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ByePolicy {
    /// Seeds 1..=byes, the professional-draw convention.
    #[default]
    TopSeeds,
    /// A random subset of entrants; slot structure is unchanged.
    Random,
}

/// How a team's rank is derived from its members.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamRank {
    /// The better (lower) member rank.
    #[default]
    BetterMember,
    /// Sum of both member ranks; unranked if either member is.
    Combined,
    /// The pair's `team_rank`, given on either member (both must agree if both give one).
    Explicit,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedingConfig {
    pub mode: PairingMode,
    pub bye_policy: ByePolicy,
    pub team_rank: TeamRank,
    /// Draw unranked entrants in random order instead of input order.
    pub shuffle_unranked: bool,
    /// Fixed RNG seed for reproducible draws.
    pub rng_seed: Option<u64>,
}

/// One position of the first round.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "entrant", rename_all = "snake_case")]
pub enum SeedSlot {
    Entrant(SeededEntrant),
    Bye,
}

/// Output of seeding: entrants by seed, and the first-round slot list
/// (length = bracket size; slots 2k and 2k+1 meet in round 0).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SeededList {
    pub bracket_size: u32,
    pub entrants: Vec<SeededEntrant>,
    pub slots: Vec<SeedSlot>,
}

impl SeededList {
    pub fn bye_count(&self) -> u32 {
        self.slots.iter().filter(|s| matches!(s, SeedSlot::Bye)).count() as u32
    }

    /// Entrants that face a BYE in round 0.
    pub fn bye_receivers(&self) -> Vec<&SeededEntrant> {
        self.slots
            .chunks_exact(2)
            .filter_map(|pair| match pair {
                [SeedSlot::Entrant(e), SeedSlot::Bye] | [SeedSlot::Bye, SeedSlot::Entrant(e)] => Some(e),
                _ => None,
            })
            .collect()
    }
}

/// Order participants (or Team-First pairs) into seeds and lay out round-0 slots.
///
/// 1. Reject duplicate ids and blank names.
/// 2. Form entrants (teams in Team-First mode); require at least 2.
/// 3. Ranked entrants ascending by rank, then unranked (input order, or shuffled).
/// 4. Bracket size = next power of two; BYEs fill the remainder.
/// 5. Place labels in canonical order (1 vs N, 2 vs N-1, recursively halved).
pub fn assign_seeds(participants: &[Participant], config: &SeedingConfig) -> EngineResult<SeededList> {
    let mut seen = HashSet::with_capacity(participants.len());
    for p in participants {
        if !seen.insert(p.id) {
            return Err(EngineError::InvalidArgument(format!(
                "participant {} listed more than once",
                p.id
            )));
        }
        if p.name.trim().is_empty() {
            return Err(EngineError::InvalidArgument(format!(
                "participant {} has an empty name",
                p.id
            )));
        }
    }

    let entrants = match config.mode {
        PairingMode::Singles => participants.iter().map(Entrant::single).collect(),
        PairingMode::TeamFirst => form_teams(participants, config.team_rank)?,
    };
    if entrants.len() < 2 {
        return Err(EngineError::InvalidArgument(format!(
            "need at least 2 entrants, got {}",
            entrants.len()
        )));
    }

    let mut rng = match config.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let ordered = order_entrants(entrants, config.shuffle_unranked, &mut rng);
    let seeded: Vec<SeededEntrant> = ordered
        .into_iter()
        .zip(1u32..)
        .map(|(entrant, seed)| SeededEntrant { seed, entrant })
        .collect();

    let n = seeded.len() as u32;
    let bracket_size = n.next_power_of_two();
    let bye_count = bracket_size - n;

    // Bye receivers take labels 1..=byes, everyone else the labels after, both in seed order.
    let receivers: HashSet<u32> = match config.bye_policy {
        ByePolicy::TopSeeds => (1..=bye_count).collect(),
        ByePolicy::Random => index::sample(&mut rng, n as usize, bye_count as usize)
            .into_iter()
            .map(|i| i as u32 + 1)
            .collect(),
    };
    let (with_bye, without_bye): (Vec<&SeededEntrant>, Vec<&SeededEntrant>) =
        seeded.iter().partition(|s| receivers.contains(&s.seed));
    let by_label: Vec<&SeededEntrant> = with_bye.into_iter().chain(without_bye).collect();

    let slots = seed_positions(bracket_size)
        .into_iter()
        .map(|label| match by_label.get(label as usize - 1) {
            Some(s) => SeedSlot::Entrant((*s).clone()),
            None => SeedSlot::Bye,
        })
        .collect();

    log::debug!(
        "seeded {} entrants into a bracket of {} ({} byes)",
        n,
        bracket_size,
        bye_count
    );

    Ok(SeededList {
        bracket_size,
        entrants: seeded,
        slots,
    })
}

/// Canonical draw order of seed labels for a bracket of `size` (a power of two).
/// For 8: [1, 8, 4, 5, 2, 7, 3, 6]; 1 and 2 land in opposite halves.
pub fn seed_positions(size: u32) -> Vec<u32> {
    let mut seeds = vec![1u32];
    while seeds.len() < size as usize {
        let n = seeds.len() as u32;
        let mut next = Vec::with_capacity(seeds.len() * 2);
        for seed in seeds.iter().copied() {
            next.push(seed);
            next.push(n * 2 + 1 - seed);
        }
        seeds = next;
    }
    seeds
}

fn order_entrants(entrants: Vec<Entrant>, shuffle_unranked: bool, rng: &mut StdRng) -> Vec<Entrant> {
    let (mut ranked, mut unranked): (Vec<Entrant>, Vec<Entrant>) =
        entrants.into_iter().partition(|e| e.rank.is_some());
    // Stable: equal ranks keep input order.
    ranked.sort_by_key(|e| e.rank);
    if shuffle_unranked {
        unranked.shuffle(rng);
    }
    ranked.append(&mut unranked);
    ranked
}

/// Pair participants into teams. Every participant must name a partner that names them back.
fn form_teams(participants: &[Participant], team_rank: TeamRank) -> EngineResult<Vec<Entrant>> {
    let by_id: HashMap<ParticipantId, &Participant> = participants.iter().map(|p| (p.id, p)).collect();
    let mut paired: HashSet<ParticipantId> = HashSet::new();
    let mut teams = Vec::with_capacity(participants.len() / 2);

    for p in participants {
        if paired.contains(&p.id) {
            continue;
        }
        let partner_id = p.partner_id.ok_or_else(|| {
            EngineError::InvalidArgument(format!("participant {} has no partner", p.name))
        })?;
        if partner_id == p.id {
            return Err(EngineError::InvalidArgument(format!(
                "participant {} is listed as their own partner",
                p.name
            )));
        }
        let partner = by_id.get(&partner_id).ok_or_else(|| {
            EngineError::InvalidArgument(format!(
                "partner {} of {} is not a participant",
                partner_id, p.name
            ))
        })?;
        if partner.partner_id != Some(p.id) {
            return Err(EngineError::InvalidArgument(format!(
                "partnership between {} and {} is not mutual",
                p.name, partner.name
            )));
        }
        paired.insert(p.id);
        paired.insert(partner.id);

        let rank = match team_rank {
            TeamRank::BetterMember => match (p.rank, partner.rank) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            },
            TeamRank::Combined => match (p.rank, partner.rank) {
                (Some(a), Some(b)) => Some(a.checked_add(b).ok_or_else(|| {
                    EngineError::InvalidArgument(format!(
                        "combined rank of {} and {} is out of range",
                        p.name, partner.name
                    ))
                })?),
                _ => None,
            },
            TeamRank::Explicit => match (p.team_rank, partner.team_rank) {
                (Some(a), Some(b)) if a != b => {
                    return Err(EngineError::InvalidArgument(format!(
                        "{} and {} give different team ranks ({} and {})",
                        p.name, partner.name, a, b
                    )))
                }
                (a, b) => a.or(b),
            },
        };
        teams.push(Entrant {
            id: p.id,
            name: format!("{} / {}", p.name, partner.name),
            members: vec![p.id, partner.id],
            rank,
        });
    }
    Ok(teams)
}
