//! Persisting components: each public call is one transaction against the store.

use crate::collab::MatchCompleted;
use crate::config::EngineConfig;
use crate::logic::{self, BracketOptions, CompletionReport, MatchGraph, SeededList};
use crate::models::{
    Bracket, BracketId, BracketStatus, BracketView, EngineError, EngineResult, EntrantId, Match,
    MatchId, Slot,
};
use crate::store::{run_transaction, DocumentStore, Transaction};
use chrono::Utc;
use std::sync::Arc;

/// Match documents of one bracket, seen through an open transaction.
struct TxGraph<'t, 'a> {
    tx: &'t mut Transaction<'a>,
    bracket_id: BracketId,
}

impl MatchGraph for TxGraph<'_, '_> {
    fn load(&mut self, id: MatchId) -> EngineResult<Match> {
        self.tx
            .get_match(self.bracket_id, id)?
            .ok_or_else(|| EngineError::NotFound(format!("match {id} in bracket {}", self.bracket_id)))
    }

    fn store(&mut self, m: Match) {
        self.tx.put_match(m);
    }
}

fn load_bracket(tx: &mut Transaction<'_>, id: BracketId) -> EngineResult<Bracket> {
    tx.get_bracket(id)?
        .ok_or_else(|| EngineError::NotFound(format!("bracket {id}")))
}

fn load_matches(tx: &mut Transaction<'_>, bracket: &Bracket) -> EngineResult<Vec<Match>> {
    let mut graph = TxGraph {
        tx,
        bracket_id: bracket.id,
    };
    bracket.match_ids.iter().map(|id| graph.load(*id)).collect()
}

/// Read a bracket and all its matches in one snapshot.
pub fn load_view(store: &dyn DocumentStore, config: &EngineConfig, id: BracketId) -> EngineResult<BracketView> {
    run_transaction(store, config.max_transaction_attempts, |tx| {
        let bracket = load_bracket(tx, id)?;
        let matches = load_matches(tx, &bracket)?;
        Ok(BracketView { bracket, matches })
    })
}

/// Creates a bracket's whole match graph in a single atomic write.
pub struct BracketBuilder {
    store: Arc<dyn DocumentStore>,
    config: EngineConfig,
}

impl BracketBuilder {
    pub fn new(store: Arc<dyn DocumentStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Build and persist. Fails with `FailedPrecondition` if the bracket already exists.
    pub fn build(&self, id: BracketId, seeded: &SeededList, options: &BracketOptions) -> EngineResult<BracketView> {
        let mut view = logic::build_bracket(id, seeded, options)?;
        view.bracket.status = BracketStatus::InProgress;

        run_transaction(self.store.as_ref(), self.config.max_transaction_attempts, |tx| {
            if tx.get_bracket(id)?.is_some() {
                return Err(EngineError::FailedPrecondition(format!(
                    "bracket {id} already exists"
                )));
            }
            for m in &view.matches {
                tx.put_match(m.clone());
            }
            tx.put_bracket(view.bracket.clone());
            Ok(())
        })?;

        log::info!(
            "built bracket {} ({} entrants, size {}, {} byes, {} matches)",
            id,
            view.bracket.entrants.len(),
            view.bracket.bracket_size,
            view.bracket.bye_count,
            view.matches.len()
        );
        Ok(view)
    }
}

/// Outcome of a committed result.
#[derive(Clone, Debug, PartialEq)]
pub struct Advancement {
    /// Whether a winner or loser was written into a downstream match.
    pub advanced_to_next: bool,
    /// Post-commit hook payload.
    pub event: MatchCompleted,
    /// Downstream matches this result resolved as walkovers, in resolution order.
    pub walkovers: Vec<MatchCompleted>,
}

/// Records results and advances winners/losers, one transaction per report.
pub struct AdvancementEngine {
    store: Arc<dyn DocumentStore>,
    config: EngineConfig,
}

impl AdvancementEngine {
    pub fn new(store: Arc<dyn DocumentStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// The transaction reads the bracket, the match, and every downstream match it
    /// feeds; two siblings completing at once conflict and one of them re-runs.
    pub fn report_result(
        &self,
        bracket_id: BracketId,
        match_id: MatchId,
        winner: EntrantId,
        score: Option<serde_json::Value>,
    ) -> EngineResult<Advancement> {
        let (recorded, resolved_downstream) =
            run_transaction(self.store.as_ref(), self.config.max_transaction_attempts, |tx| {
                let bracket = load_bracket(tx, bracket_id)?;
                if bracket.is_complete() {
                    return Err(EngineError::FailedPrecondition(format!(
                        "bracket {bracket_id} is already complete"
                    )));
                }
                let mut graph = TxGraph { tx, bracket_id };
                let recorded =
                    logic::record_result(&mut graph, match_id, winner, score.clone(), Utc::now())?;
                // A fill never lands on a completed match, so any target completed now
                // was resolved by this result.
                let mut resolved = Vec::new();
                for id in &recorded.advanced_to {
                    let target = graph.load(*id)?;
                    if target.is_completed() {
                        resolved.push(target);
                    }
                }
                Ok((recorded, resolved))
            })?;

        let advanced_to = recorded.advanced_to;
        let event = completed_event(bracket_id, recorded.resolved, advanced_to.clone())
            .ok_or_else(|| EngineError::Internal(format!("match {match_id} committed without a winner")))?;
        log::info!(
            "match {} ({}) won by {}; advanced to {} match(es)",
            match_id,
            event.round_label,
            event.winner.name,
            advanced_to.len()
        );

        let walkovers: Vec<MatchCompleted> = resolved_downstream
            .into_iter()
            .filter_map(|m| {
                let next = [m.next_match_for_winner, m.next_match_for_loser]
                    .into_iter()
                    .flatten()
                    .map(|link| link.match_id)
                    .collect();
                completed_event(bracket_id, m, next)
            })
            .collect();
        for w in &walkovers {
            log::info!(
                "match {} ({}) resolved as a walkover for {}",
                w.match_id,
                w.round_label,
                w.winner.name
            );
        }

        Ok(Advancement {
            advanced_to_next: !advanced_to.is_empty(),
            event,
            walkovers,
        })
    }
}

/// Event for a completed match; `None` if it has no winner (a BYE-vs-BYE walkover).
fn completed_event(bracket_id: BracketId, m: Match, advanced_to: Vec<MatchId>) -> Option<MatchCompleted> {
    let winner = m.winning_competitor().cloned()?;
    let loser = m.losing_slot().and_then(Slot::competitor).cloned();
    Some(MatchCompleted {
        bracket_id,
        match_id: m.id,
        kind: m.kind,
        round_label: m.round_label,
        winner,
        loser,
        score: m.score,
        advanced_to,
    })
}

/// Result of `CompletionDetector::commit_ranking`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CompletionCommit {
    pub report: CompletionReport,
    /// True only for the call that flipped the bracket to complete.
    pub newly_completed: bool,
}

/// Decides whether a bracket is resolved and persists the standings.
pub struct CompletionDetector {
    store: Arc<dyn DocumentStore>,
    config: EngineConfig,
}

impl CompletionDetector {
    pub fn new(store: Arc<dyn DocumentStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Read-only check.
    pub fn check(&self, bracket_id: BracketId) -> EngineResult<CompletionReport> {
        let view = load_view(self.store.as_ref(), &self.config, bracket_id)?;
        logic::check_completion(&view.bracket, &view.matches)
    }

    /// Check and, when resolved, write the ranking and flip the bracket to complete.
    /// Safe to call repeatedly or concurrently: once complete, the stored ranking is
    /// returned and nothing is written.
    pub fn commit_ranking(&self, bracket_id: BracketId) -> EngineResult<CompletionCommit> {
        let commit = run_transaction(self.store.as_ref(), self.config.max_transaction_attempts, |tx| {
            let mut bracket = load_bracket(tx, bracket_id)?;
            if bracket.is_complete() {
                return Ok(CompletionCommit {
                    report: CompletionReport {
                        completed: true,
                        ranking: Some(bracket.ranking.clone()),
                    },
                    newly_completed: false,
                });
            }
            let matches = load_matches(tx, &bracket)?;
            let report = logic::check_completion(&bracket, &matches)?;
            let Some(ranking) = report.ranking.clone().filter(|_| report.completed) else {
                return Ok(CompletionCommit {
                    report,
                    newly_completed: false,
                });
            };
            bracket.ranking = ranking;
            bracket.status = BracketStatus::Complete;
            bracket.completed_at = Some(Utc::now());
            tx.put_bracket(bracket);
            Ok(CompletionCommit {
                report,
                newly_completed: true,
            })
        })?;

        if commit.newly_completed {
            log::info!("bracket {} complete", bracket_id);
        }
        Ok(commit)
    }
}
