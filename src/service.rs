//! Facade wiring the engine to its collaborators: authorization before,
//! notifications and completion after each committed result.

use crate::collab::{AccessDecision, Action, Authorizer, Caller, EngineEvent, Notifier};
use crate::config::EngineConfig;
use crate::engine::{self, AdvancementEngine, BracketBuilder, CompletionDetector};
use crate::logic::{assign_seeds, BracketOptions, CompletionReport, SeedingConfig};
use crate::models::{BracketId, BracketView, EngineError, EngineResult, EntrantId, MatchId, Participant};
use crate::store::DocumentStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct BuildBracketRequest {
    /// Chosen by the caller to make builds addressable; generated when absent.
    #[serde(default)]
    pub bracket_id: Option<BracketId>,
    #[serde(default)]
    pub name: String,
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub seeding: SeedingConfig,
    /// Falls back to `EngineConfig::default_consolation`.
    #[serde(default)]
    pub with_consolation: Option<bool>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ReportResultRequest {
    pub winner_id: EntrantId,
    #[serde(default)]
    pub score: Option<serde_json::Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReportOutcome {
    pub advanced_to_next: bool,
    /// `None` if the standings could not be committed; retry with `commit_ranking`.
    pub completion: Option<CompletionReport>,
}

pub struct BracketService {
    store: Arc<dyn DocumentStore>,
    authorizer: Arc<dyn Authorizer>,
    notifier: Arc<dyn Notifier>,
    config: EngineConfig,
    builder: BracketBuilder,
    advancement: AdvancementEngine,
    completion: CompletionDetector,
}

impl BracketService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        authorizer: Arc<dyn Authorizer>,
        notifier: Arc<dyn Notifier>,
        config: EngineConfig,
    ) -> Self {
        Self {
            builder: BracketBuilder::new(store.clone(), config.clone()),
            advancement: AdvancementEngine::new(store.clone(), config.clone()),
            completion: CompletionDetector::new(store.clone(), config.clone()),
            store,
            authorizer,
            notifier,
            config,
        }
    }

    fn authorize(&self, caller: &Caller, action: Action) -> EngineResult<()> {
        match self.authorizer.authorize(caller, &action) {
            AccessDecision::Allow => Ok(()),
            AccessDecision::Deny(reason) => {
                log::debug!("{} denied {:?}: {}", caller.id, action, reason);
                Err(EngineError::PermissionDenied(reason))
            }
        }
    }

    /// Fire-and-forget: a failing notifier is logged, never surfaced.
    fn dispatch(&self, event: EngineEvent) {
        if let Err(e) = self.notifier.notify(&event) {
            log::warn!("{} (event suppressed: {:?})", e, event);
        }
    }

    /// Seed the participants and persist the full match graph.
    pub fn build_bracket(&self, caller: &Caller, request: BuildBracketRequest) -> EngineResult<BracketView> {
        let bracket_id = request.bracket_id.unwrap_or_else(Uuid::new_v4);
        self.authorize(caller, Action::BuildBracket { bracket_id })?;

        let seeded = assign_seeds(&request.participants, &request.seeding)?;
        let options = BracketOptions {
            name: request.name,
            with_consolation: request
                .with_consolation
                .unwrap_or(self.config.default_consolation),
        };
        self.builder.build(bracket_id, &seeded, &options)
    }

    /// Record a result, then run the post-commit hook: notify, and commit the
    /// standings if this was the last open match.
    ///
    /// Once the result commits the call succeeds; a failed standings commit is
    /// logged and leaves `completion` unset.
    pub fn report_result(
        &self,
        caller: &Caller,
        bracket_id: BracketId,
        match_id: MatchId,
        request: ReportResultRequest,
    ) -> EngineResult<ReportOutcome> {
        self.authorize(caller, Action::ReportResult { bracket_id, match_id })?;

        let advancement = self
            .advancement
            .report_result(bracket_id, match_id, request.winner_id, request.score)?;
        let advanced_to_next = advancement.advanced_to_next;
        self.dispatch(EngineEvent::MatchCompleted(advancement.event));
        for walkover in advancement.walkovers {
            self.dispatch(EngineEvent::MatchCompleted(walkover));
        }

        let completion = match self.finish(bracket_id) {
            Ok(report) => Some(report),
            Err(e) => {
                log::warn!("result for match {} committed, standings not: {}", match_id, e);
                None
            }
        };
        Ok(ReportOutcome {
            advanced_to_next,
            completion,
        })
    }

    /// Commit the standings of a resolved bracket. Safe to repeat; only the call
    /// that completes the bracket emits `BracketCompleted`.
    pub fn commit_ranking(&self, caller: &Caller, bracket_id: BracketId) -> EngineResult<CompletionReport> {
        self.authorize(caller, Action::CommitRanking { bracket_id })?;
        self.finish(bracket_id)
    }

    fn finish(&self, bracket_id: BracketId) -> EngineResult<CompletionReport> {
        let commit = self.completion.commit_ranking(bracket_id)?;
        if commit.newly_completed {
            if let Some(ranking) = commit.report.ranking.clone() {
                self.dispatch(EngineEvent::BracketCompleted { bracket_id, ranking });
            }
        }
        Ok(commit.report)
    }

    pub fn check_completion(&self, bracket_id: BracketId) -> EngineResult<CompletionReport> {
        self.completion.check(bracket_id)
    }

    pub fn get_bracket(&self, bracket_id: BracketId) -> EngineResult<BracketView> {
        engine::load_view(self.store.as_ref(), &self.config, bracket_id)
    }
}
