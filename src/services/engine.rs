use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::catalog::{Question, QuestionCatalog};
use crate::db::SessionStore;
use crate::error::{AppError, AppResult};
use crate::models::{
    AnalyticsEvent, Candidate, Context, EmotionalProfile, Feedback, Progress, QuickAdjust,
    Session, SessionStatus,
};
use crate::services::providers::{AnalyticsSink, Enricher, PreferenceWriter, SimilarityIndex};
use crate::services::surprise::{POOL_EXTRA, SAFE_COUNT};
use crate::services::{emotional, refinement, search, surprise, synthesis};

/// Read-modify-write attempts before a version race is surfaced
const CAS_ATTEMPTS: u32 = 3;
/// Satisfaction score below which the UI is told to collect deeper feedback
const FOLLOW_UP_THRESHOLD: u8 = 3;

/// A question as shown to the client (weights stay server-side)
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: String,
    pub text: String,
    pub options: Vec<OptionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionView {
    pub id: String,
    pub label: String,
}

impl From<&Question> for QuestionView {
    fn from(question: &Question) -> Self {
        Self {
            id: question.id.clone(),
            text: question.text.clone(),
            options: question
                .options
                .iter()
                .map(|o| OptionView {
                    id: o.id.clone(),
                    label: o.label.clone(),
                })
                .collect(),
        }
    }
}

/// The moment snapshot returned alongside recommendations
#[derive(Debug, Clone, Serialize)]
pub struct MomentView {
    pub summary: String,
    pub confidence: u8,
}

impl From<&EmotionalProfile> for MomentView {
    fn from(profile: &EmotionalProfile) -> Self {
        Self {
            summary: profile.summary.clone(),
            confidence: profile.confidence,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StartedSession {
    pub session_id: Uuid,
    pub first_question: QuestionView,
    pub progress: Progress,
}

/// Outcome of an answer submission: either the next question, or the
/// first recommendation list once the flow completes
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnswerOutcome {
    Question {
        next_question: QuestionView,
        progress: Progress,
    },
    Recommendations {
        recommendations: Vec<Candidate>,
        moment: MomentView,
    },
}

#[derive(Debug, Serialize)]
pub struct RecommendationSet {
    pub recommendations: Vec<Candidate>,
    pub moment: MomentView,
    /// Which strategy or preset produced this list
    pub applied: String,
    pub refinement_count: u32,
}

#[derive(Debug, Serialize)]
pub struct MomentAck {
    pub acknowledged: bool,
    pub follow_up: bool,
}

/// Session orchestrator: owns the state machine and sequences the
/// mapping → synthesis → search → surprise pipeline per request.
///
/// Stateless across requests; all session state lives in the store, and
/// every mutating operation is a versioned read-modify-write retried on
/// conflict.
pub struct SessionEngine {
    store: Arc<dyn SessionStore>,
    catalog: Arc<dyn QuestionCatalog>,
    index: Arc<dyn SimilarityIndex>,
    enricher: Arc<dyn Enricher>,
    writer: Option<Arc<dyn PreferenceWriter>>,
    analytics: Arc<dyn AnalyticsSink>,
    upstream_timeout: Duration,
    session_ttl: u64,
}

impl SessionEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn SessionStore>,
        catalog: Arc<dyn QuestionCatalog>,
        index: Arc<dyn SimilarityIndex>,
        enricher: Arc<dyn Enricher>,
        writer: Option<Arc<dyn PreferenceWriter>>,
        analytics: Arc<dyn AnalyticsSink>,
        upstream_timeout: Duration,
        session_ttl: u64,
    ) -> Self {
        Self {
            store,
            catalog,
            index,
            enricher,
            writer,
            analytics,
            upstream_timeout,
            session_ttl,
        }
    }

    /// Creates a session and returns the first question. The session is
    /// persisted already in `Questioning`: `Created` exists only for the
    /// instant before the first question is generated.
    pub async fn start_session(
        &self,
        domain: String,
        flow: String,
        context: Context,
    ) -> AppResult<StartedSession> {
        let questions = self.catalog.questions_for_flow(&flow, &context).await?;
        let first = questions.first().ok_or_else(|| {
            AppError::Internal(format!("Flow {} has no questions", flow))
        })?;

        let mut session = Session::new(domain, flow, self.session_ttl);
        session.status = SessionStatus::Questioning;
        self.commit(&mut session).await?;

        tracing::info!(session_id = %session.id, flow = %session.flow, "Session started");
        self.emit(AnalyticsEvent::SessionStarted {
            session_id: session.id,
            domain: session.domain.clone(),
            flow: session.flow.clone(),
        });

        Ok(StartedSession {
            session_id: session.id,
            first_question: QuestionView::from(first),
            progress: Progress::new(0, questions.len()),
        })
    }

    /// Records one answer. Stays in `Questioning` until every distinct
    /// question is answered, then transitions to `Recommended` exactly
    /// once, running the full pipeline synchronously.
    pub async fn submit_answer(
        &self,
        session_id: Uuid,
        question_id: &str,
        option_id: &str,
        context: Context,
    ) -> AppResult<AnswerOutcome> {
        self.with_session(session_id, |mut session| async move {
            if session.status != SessionStatus::Questioning {
                return Err(AppError::InvalidInput(
                    "Question flow is already complete; use refine or adjust".to_string(),
                ));
            }

            let questions = self
                .catalog
                .questions_for_flow(&session.flow, &context)
                .await?;

            let question = questions
                .iter()
                .find(|q| q.id == question_id)
                .ok_or_else(|| AppError::UnknownQuestion(question_id.to_string()))?;
            if question.option(option_id).is_none() {
                return Err(AppError::InvalidInput(format!(
                    "Unknown option {} for question {}",
                    option_id, question_id
                )));
            }

            session.record_answer(question_id, option_id);

            let outcome = if session.answers.len() == questions.len() {
                // The flow just completed: build the profile once, derive
                // the base filters, and produce the first recommendations.
                session.status = SessionStatus::Recommended;
                let profile =
                    emotional::build_profile(&session.answers, &questions, &context);
                let moment = MomentView::from(&profile);
                session.profile = Some(profile);
                session.filters = Some(search::derive_filters(&session.answers, &questions));

                let recommendations = self.recommend(&mut session, &questions).await?;
                AnswerOutcome::Recommendations {
                    recommendations,
                    moment,
                }
            } else {
                let next = questions
                    .iter()
                    .find(|q| session.answer_for(&q.id).is_none())
                    .ok_or_else(|| {
                        AppError::Internal("No unanswered question remains".to_string())
                    })?;
                AnswerOutcome::Question {
                    next_question: QuestionView::from(next),
                    progress: Progress::new(session.answers.len(), questions.len()),
                }
            };

            self.commit(&mut session).await?;
            Ok(outcome)
        })
        .await
    }

    /// Feedback-driven refinement: detect a strategy from the batch,
    /// adjust profile and filters, and re-run the pipeline. An optional
    /// named action overrides detection.
    pub async fn refine(
        &self,
        session_id: Uuid,
        batch: Vec<Feedback>,
        action: Option<QuickAdjust>,
        context: Context,
    ) -> AppResult<RecommendationSet> {
        self.with_session(session_id, |mut session| {
            let batch = batch.clone();
            async move {
                require_recommended(&session)?;
                session.status = SessionStatus::Refining;

                let questions = self
                    .catalog
                    .questions_for_flow(&session.flow, &context)
                    .await?;

                let applied = {
                    let profile = session
                        .profile
                        .as_ref()
                        .ok_or_else(|| AppError::Internal("Missing profile".to_string()))?;
                    let filters = session.filters.clone().unwrap_or_default();
                    let last = session.last_recommendations.clone().unwrap_or_default();

                    match action {
                        Some(adjust) => {
                            let applied = adjust.as_str().to_string();
                            let plan = refinement::quick_adjust_plan(adjust);
                            session.last_adjustment = Some(adjust);
                            apply_plan(&mut session, plan);
                            applied
                        }
                        None => {
                            let (strategy, plan) = refinement::plan_from_feedback(
                                &batch, &last, profile, &filters,
                            );
                            tracing::info!(
                                session_id = %session.id,
                                strategy = strategy.name(),
                                batch_size = batch.len(),
                                "Feedback refinement strategy selected"
                            );
                            let applied = strategy.name().to_string();
                            apply_plan(&mut session, plan);
                            applied
                        }
                    }
                };

                session.feedback_history.extend(batch);
                // The counter moves on every call, whatever the outcome.
                session.refinement_count += 1;

                let recommendations = self.recommend(&mut session, &questions).await?;
                session.status = SessionStatus::Recommended;

                self.emit(AnalyticsEvent::Refined {
                    session_id: session.id,
                    strategy: applied.clone(),
                    refinement_count: session.refinement_count,
                });

                let moment = MomentView::from(
                    session
                        .profile
                        .as_ref()
                        .ok_or_else(|| AppError::Internal("Missing profile".to_string()))?,
                );
                let refinement_count = session.refinement_count;
                self.commit(&mut session).await?;

                Ok(RecommendationSet {
                    recommendations,
                    moment,
                    applied,
                    refinement_count,
                })
            }
        })
        .await
    }

    /// Named preset adjustment over the same base answers; no new
    /// feedback required
    pub async fn quick_adjust(
        &self,
        session_id: Uuid,
        adjust: QuickAdjust,
        context: Context,
    ) -> AppResult<RecommendationSet> {
        self.refine(session_id, Vec::new(), Some(adjust), context)
            .await
    }

    /// Records a satisfaction score. Persistence is best-effort on both
    /// the read and the write: a store outage is logged and the call
    /// still acks. Only an expired or missing session fails the call.
    pub async fn record_moment_feedback(
        &self,
        session_id: Uuid,
        score: u8,
    ) -> AppResult<MomentAck> {
        if !(1..=5).contains(&score) {
            return Err(AppError::InvalidInput(
                "Satisfaction score must be between 1 and 5".to_string(),
            ));
        }

        match self.load(session_id).await {
            Ok(mut session) => {
                session.satisfaction = Some(score);
                if let Err(e) = self.commit(&mut session).await {
                    tracing::warn!(
                        session_id = %session_id,
                        error = %e,
                        "Failed to persist moment feedback; acknowledging anyway"
                    );
                }
            }
            Err(e @ AppError::SessionExpired(_)) => return Err(e),
            Err(e) => {
                tracing::warn!(
                    session_id = %session_id,
                    error = %e,
                    "Failed to load session for moment feedback; acknowledging anyway"
                );
            }
        }

        self.emit(AnalyticsEvent::MomentFeedback { session_id, score });

        Ok(MomentAck {
            acknowledged: true,
            follow_up: score < FOLLOW_UP_THRESHOLD,
        })
    }

    /// Explicit reset: removes the session record entirely
    pub async fn reset(&self, session_id: Uuid) -> AppResult<()> {
        self.store.delete(session_id).await?;
        tracing::info!(session_id = %session_id, "Session reset");
        Ok(())
    }

    /// Synthesis → search → surprise → enrichment, using the session's
    /// current profile and filters. Enrichment overlaps the surprise
    /// bookkeeping and degrades to bare candidates on failure.
    async fn recommend(
        &self,
        session: &mut Session,
        questions: &[Question],
    ) -> AppResult<Vec<Candidate>> {
        let profile = session
            .profile
            .as_ref()
            .ok_or_else(|| AppError::Internal("Missing profile".to_string()))?;
        let filters = session.filters.clone().unwrap_or_default();

        let text = synthesis::synthesize(
            self.writer.as_ref(),
            self.upstream_timeout,
            &session.answers,
            questions,
            profile,
            &session.domain,
        )
        .await;
        tracing::debug!(session_id = %session.id, preference_text = %text, "Preference text synthesized");

        let hits = search::run_search(
            self.index.as_ref(),
            &text,
            &filters,
            SAFE_COUNT + POOL_EXTRA,
            self.upstream_timeout,
        )
        .await;

        // Enrichment for everything we fetched overlaps the surprise
        // split. Joined rather than spawned, so an aborted request drops
        // the in-flight enrich call with it.
        let item_ids: Vec<String> = hits.iter().map(|h| h.item_id.clone()).collect();
        let (enriched, mut candidates) = tokio::join!(
            tokio::time::timeout(self.upstream_timeout, self.enricher.enrich(&item_ids)),
            async {
                let mut rng = rand::thread_rng();
                surprise::inject_surprises(hits, profile, &mut rng)
            }
        );

        match enriched {
            Ok(Ok(metadata)) => {
                for candidate in &mut candidates {
                    candidate.metadata = metadata.get(&candidate.item_id).cloned();
                }
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Enrichment failed, returning bare candidates");
            }
            Err(_) => {
                tracing::warn!("Enrichment timed out, returning bare candidates");
            }
        }

        let surprise_count = candidates.iter().filter(|c| c.is_surprise).count();
        self.emit(AnalyticsEvent::RecommendationsServed {
            session_id: session.id,
            count: candidates.len(),
            surprise_count,
        });

        session.last_recommendations = Some(candidates.clone());
        Ok(candidates)
    }

    async fn load(&self, session_id: Uuid) -> AppResult<Session> {
        let session = self
            .store
            .get(session_id)
            .await?
            .ok_or_else(|| AppError::SessionExpired(session_id.to_string()))?;
        if session.is_expired(Utc::now()) {
            return Err(AppError::SessionExpired(session_id.to_string()));
        }
        Ok(session)
    }

    /// Runs a read-modify-write closure, retrying the whole thing on a
    /// version conflict. Nothing is persisted on the failing attempts, so
    /// the write-back stays all-or-nothing per request.
    async fn with_session<T, F, Fut>(&self, session_id: Uuid, op: F) -> AppResult<T>
    where
        F: Fn(Session) -> Fut,
        Fut: std::future::Future<Output = AppResult<T>>,
    {
        let mut last_error = None;
        for attempt in 0..CAS_ATTEMPTS {
            let session = self.load(session_id).await?;
            match op(session).await {
                Err(AppError::Conflict(msg)) => {
                    tracing::warn!(
                        session_id = %session_id,
                        attempt,
                        "Session version conflict, retrying"
                    );
                    last_error = Some(AppError::Conflict(msg));
                }
                other => return other,
            }
        }
        Err(last_error
            .unwrap_or_else(|| AppError::Conflict(session_id.to_string())))
    }

    /// Versioned write-back; maps a lost race to `Conflict` for the retry
    /// loop
    async fn commit(&self, session: &mut Session) -> AppResult<()> {
        session.version += 1;
        session.expires_at = Utc::now() + chrono::Duration::seconds(self.session_ttl as i64);
        if self.store.put(session, self.session_ttl).await? {
            Ok(())
        } else {
            Err(AppError::Conflict(session.id.to_string()))
        }
    }

    /// Fire-and-forget analytics; failures land in the log, never in the
    /// primary result
    fn emit(&self, event: AnalyticsEvent) {
        let sink = Arc::clone(&self.analytics);
        tokio::spawn(async move {
            if let Err(e) = sink.record(event).await {
                tracing::warn!(error = %e, "Analytics record failed");
            }
        });
    }
}

fn require_recommended(session: &Session) -> AppResult<()> {
    match session.status {
        SessionStatus::Recommended => Ok(()),
        SessionStatus::Questioning | SessionStatus::Created => Err(AppError::InvalidInput(
            "Answer the remaining questions before refining".to_string(),
        )),
        SessionStatus::Refining => Err(AppError::Conflict(
            "Another refinement is in flight".to_string(),
        )),
        SessionStatus::Expired => Err(AppError::SessionExpired(session.id.to_string())),
    }
}

fn apply_plan(session: &mut Session, plan: refinement::Adjustment) {
    let mut filters = session.filters.take().unwrap_or_default();
    if let Some(profile) = session.profile.as_mut() {
        plan.apply(profile, &mut filters);
        // Adjusting the profile does not change how much evidence it is
        // built on, so confidence and summary stay as mapped.
    }
    session.filters = Some(filters);
}
