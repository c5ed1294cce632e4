use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One independent dimension of the emotional profile.
///
/// The declaration order here is load-bearing: enhancement phrases are
/// concatenated in this order so that identical profiles always produce
/// byte-identical preference text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Energy,
    Mood,
    Openness,
    Focus,
    Comfort,
    Darkness,
}

impl Axis {
    /// All axes, in fixed phrase-concatenation order
    pub fn all() -> &'static [Axis] {
        &[
            Axis::Energy,
            Axis::Mood,
            Axis::Openness,
            Axis::Focus,
            Axis::Comfort,
            Axis::Darkness,
        ]
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Axis::Energy => "energy",
            Axis::Mood => "mood",
            Axis::Openness => "openness",
            Axis::Focus => "focus",
            Axis::Comfort => "comfort",
            Axis::Darkness => "darkness",
        };
        write!(f, "{}", name)
    }
}

/// Coarse time-of-day bucket, part of the explicit request context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Morning,
    #[default]
    Afternoon,
    Evening,
    LateNight,
}

/// Ambient request context, passed explicitly into every call that needs it.
/// Never read from process-global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Context {
    #[serde(default)]
    pub time_of_day: TimeOfDay,
}

/// The inferred emotional snapshot for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalProfile {
    pub energy: f32,
    pub mood: f32,
    pub openness: f32,
    pub focus: f32,
    pub comfort: f32,
    pub darkness: f32,
    /// Confidence in [0, 100], scales with answered-question coverage
    pub confidence: u8,
    /// Human-readable one-line description of the moment
    pub summary: String,
}

impl EmotionalProfile {
    pub fn get(&self, axis: Axis) -> f32 {
        match axis {
            Axis::Energy => self.energy,
            Axis::Mood => self.mood,
            Axis::Openness => self.openness,
            Axis::Focus => self.focus,
            Axis::Comfort => self.comfort,
            Axis::Darkness => self.darkness,
        }
    }

    pub fn set(&mut self, axis: Axis, value: f32) {
        let value = value.clamp(0.0, 1.0);
        match axis {
            Axis::Energy => self.energy = value,
            Axis::Mood => self.mood = value,
            Axis::Openness => self.openness = value,
            Axis::Focus => self.focus = value,
            Axis::Comfort => self.comfort = value,
            Axis::Darkness => self.darkness = value,
        }
    }

    /// Shift an axis by `delta`, clamped to [0, 1]
    pub fn nudge(&mut self, axis: Axis, delta: f32) {
        self.set(axis, self.get(axis) + delta);
    }

    /// The axis with the highest value (ties broken by declaration order)
    pub fn dominant_axis(&self) -> Axis {
        let mut best = Axis::Energy;
        let mut best_value = f32::MIN;
        for &axis in Axis::all() {
            let value = self.get(axis);
            if value > best_value {
                best = axis;
                best_value = value;
            }
        }
        best
    }
}

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Created,
    Questioning,
    Recommended,
    Refining,
    Expired,
}

/// A chosen option for one question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: String,
    pub option_id: String,
    pub answered_at: DateTime<Utc>,
}

/// Named quick-adjustment presets, dispatched as a closed enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuickAdjust {
    Lighter,
    Deeper,
    Weirder,
    Safer,
    Shorter,
    Longer,
}

impl QuickAdjust {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuickAdjust::Lighter => "lighter",
            QuickAdjust::Deeper => "deeper",
            QuickAdjust::Weirder => "weirder",
            QuickAdjust::Safer => "safer",
            QuickAdjust::Shorter => "shorter",
            QuickAdjust::Longer => "longer",
        }
    }
}

impl std::fmt::Display for QuickAdjust {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// User reaction to a single recommended item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    Like,
    Dislike,
    Neutral,
}

/// One item of a feedback batch; append-only once submitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub item_id: String,
    pub reaction: Reaction,
}

/// Lightweight per-item payload returned by the similarity index alongside
/// the score. Used by refinement pattern detection; not display data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CandidateTraits {
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub darkness: f32,
    #[serde(default)]
    pub energy: f32,
}

/// Display metadata merged in from the enrichment collaborator, when available
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateMetadata {
    pub title: String,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub poster_url: Option<String>,
}

/// A raw similarity-search hit, before surprise injection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub item_id: String,
    pub score: f32,
    #[serde(default)]
    pub traits: CandidateTraits,
}

/// A recommended item as returned to the client and persisted in the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub item_id: String,
    pub score: f32,
    pub is_surprise: bool,
    #[serde(default)]
    pub surprise_reason: Option<String>,
    #[serde(default)]
    pub traits: CandidateTraits,
    #[serde(default)]
    pub metadata: Option<CandidateMetadata>,
}

impl Candidate {
    pub fn safe(hit: ScoredItem) -> Self {
        Self {
            item_id: hit.item_id,
            score: hit.score,
            is_surprise: false,
            surprise_reason: None,
            traits: hit.traits,
            metadata: None,
        }
    }

    pub fn surprise(hit: ScoredItem, reason: String) -> Self {
        Self {
            item_id: hit.item_id,
            score: hit.score,
            is_surprise: true,
            surprise_reason: Some(reason),
            traits: hit.traits,
            metadata: None,
        }
    }
}

/// Advisory search constraints; the similarity index may honor them
/// partially or not at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SoftFilters {
    #[serde(default)]
    pub year_min: Option<i32>,
    #[serde(default)]
    pub year_max: Option<i32>,
    #[serde(default)]
    pub genre_hint: Option<String>,
    #[serde(default)]
    pub exclude_genres: Vec<String>,
    #[serde(default)]
    pub min_rating: Option<f32>,
    #[serde(default)]
    pub min_runtime: Option<u32>,
    #[serde(default)]
    pub max_runtime: Option<u32>,
}

impl SoftFilters {
    /// Adds a genre to the exclusion list, once
    pub fn exclude_genre(&mut self, genre: &str) {
        if !self.exclude_genres.iter().any(|g| g == genre) {
            self.exclude_genres.push(genre.to_string());
        }
    }
}

/// Flow progress as shown to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub answered: usize,
    pub total: usize,
    pub percent: u8,
}

impl Progress {
    pub fn new(answered: usize, total: usize) -> Self {
        let percent = if total == 0 {
            0
        } else {
            ((answered as f32 / total as f32) * 100.0).round() as u8
        };
        Self {
            answered,
            total,
            percent,
        }
    }
}

/// Events emitted to the analytics sink, fire-and-forget
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AnalyticsEvent {
    SessionStarted {
        session_id: Uuid,
        domain: String,
        flow: String,
    },
    RecommendationsServed {
        session_id: Uuid,
        count: usize,
        surprise_count: usize,
    },
    Refined {
        session_id: Uuid,
        strategy: String,
        refinement_count: u32,
    },
    MomentFeedback {
        session_id: Uuid,
        score: u8,
    },
}

/// A single mood-capture session. The session exclusively owns its answers,
/// profile, and last recommendation list; nothing is shared across sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub domain: String,
    pub flow: String,
    pub status: SessionStatus,
    pub answers: Vec<Answer>,
    pub profile: Option<EmotionalProfile>,
    pub filters: Option<SoftFilters>,
    pub last_recommendations: Option<Vec<Candidate>>,
    pub feedback_history: Vec<Feedback>,
    pub refinement_count: u32,
    pub last_adjustment: Option<QuickAdjust>,
    pub satisfaction: Option<u8>,
    pub expires_at: DateTime<Utc>,
    /// Optimistic-concurrency counter; bumped on every write
    pub version: u64,
}

impl Session {
    pub fn new(domain: String, flow: String, ttl_seconds: u64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            domain,
            flow,
            status: SessionStatus::Created,
            answers: Vec::new(),
            profile: None,
            filters: None,
            last_recommendations: None,
            feedback_history: Vec::new(),
            refinement_count: 0,
            last_adjustment: None,
            satisfaction: None,
            expires_at: now + chrono::Duration::seconds(ttl_seconds as i64),
            version: 0,
        }
    }

    /// Records an answer. A resubmission for an already-answered question
    /// replaces the stored entry in place; the distinct count never grows
    /// from a replacement.
    pub fn record_answer(&mut self, question_id: &str, option_id: &str) {
        let answer = Answer {
            question_id: question_id.to_string(),
            option_id: option_id.to_string(),
            answered_at: Utc::now(),
        };
        match self
            .answers
            .iter_mut()
            .find(|a| a.question_id == question_id)
        {
            Some(existing) => *existing = answer,
            None => self.answers.push(answer),
        }
    }

    pub fn answer_for(&self, question_id: &str) -> Option<&Answer> {
        self.answers.iter().find(|a| a.question_id == question_id)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
