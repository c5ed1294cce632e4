use crate::{
    error::{AppError, AppResult},
    models::{Axis, Context},
};
use serde::{Deserialize, Serialize};

/// One selectable option within a question, carrying its partial
/// per-axis weight contribution plus optional filter hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub label: String,
    /// Partial vector-weight contribution, each weight in [0, 1]
    pub weights: Vec<(Axis, f32)>,
    #[serde(default)]
    pub year_range: Option<(i32, i32)>,
    #[serde(default)]
    pub genre_hint: Option<String>,
    #[serde(default)]
    pub min_runtime: Option<u32>,
    #[serde(default)]
    pub max_runtime: Option<u32>,
}

/// Immutable question content; the engine only reads these
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub options: Vec<QuestionOption>,
}

impl Question {
    pub fn option(&self, option_id: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.id == option_id)
    }
}

/// Read-only question content source
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait QuestionCatalog: Send + Sync {
    /// Returns the ordered question list for a flow. Unknown flows are an
    /// input error, not a degraded path.
    async fn questions_for_flow(&self, flow: &str, context: &Context) -> AppResult<Vec<Question>>;
}

/// Built-in catalog with the "standard" five-question movie flow.
///
/// Question authoring is owned by an external collaborator in the larger
/// system; this bundled catalog is the read-only content the engine ships
/// with so it can run standalone.
pub struct StaticCatalog;

#[async_trait::async_trait]
impl QuestionCatalog for StaticCatalog {
    async fn questions_for_flow(&self, flow: &str, _context: &Context) -> AppResult<Vec<Question>> {
        match flow {
            "standard" => Ok(standard_flow()),
            other => Err(AppError::InvalidInput(format!(
                "Unknown question flow: {}",
                other
            ))),
        }
    }
}

fn option(
    id: &str,
    label: &str,
    weights: &[(Axis, f32)],
) -> QuestionOption {
    QuestionOption {
        id: id.to_string(),
        label: label.to_string(),
        weights: weights.to_vec(),
        year_range: None,
        genre_hint: None,
        min_runtime: None,
        max_runtime: None,
    }
}

/// The standard five-question flow. Weights are hand-tuned content, not
/// derived values.
fn standard_flow() -> Vec<Question> {
    vec![
        Question {
            id: "energy".to_string(),
            text: "How much energy do you have right now?".to_string(),
            options: vec![
                option(
                    "wired",
                    "Wired and ready for anything",
                    &[(Axis::Energy, 0.9), (Axis::Openness, 0.6)],
                ),
                option(
                    "steady",
                    "Steady, could go either way",
                    &[(Axis::Energy, 0.55), (Axis::Focus, 0.6)],
                ),
                option(
                    "mellow",
                    "Mellow, winding down",
                    &[(Axis::Energy, 0.3), (Axis::Comfort, 0.6)],
                ),
                option(
                    "drained",
                    "Running on fumes",
                    &[(Axis::Energy, 0.1), (Axis::Comfort, 0.9)],
                ),
            ],
        },
        Question {
            id: "mood".to_string(),
            text: "What's the mood tonight?".to_string(),
            options: vec![
                option(
                    "bright",
                    "Bright, keep it fun",
                    &[(Axis::Mood, 0.85), (Axis::Comfort, 0.5)],
                ),
                option(
                    "thoughtful",
                    "Thoughtful, something to chew on",
                    &[(Axis::Mood, 0.5), (Axis::Focus, 0.8)],
                ),
                option(
                    "moody",
                    "Moody, lean into it",
                    &[(Axis::Mood, 0.25), (Axis::Darkness, 0.7)],
                ),
                option(
                    "escapist",
                    "Anywhere but here",
                    &[(Axis::Mood, 0.6), (Axis::Openness, 0.8)],
                ),
            ],
        },
        Question {
            id: "era".to_string(),
            text: "Which era sounds right?".to_string(),
            options: vec![
                QuestionOption {
                    year_range: Some((2018, 2026)),
                    ..option("fresh", "Fresh off the press", &[(Axis::Openness, 0.5)])
                },
                QuestionOption {
                    year_range: Some((2005, 2020)),
                    ..option("modern", "Modern era", &[(Axis::Openness, 0.35)])
                },
                QuestionOption {
                    year_range: Some((1990, 2005)),
                    ..option(
                        "nineties",
                        "Nineties and thereabouts",
                        &[(Axis::Comfort, 0.45)],
                    )
                },
                QuestionOption {
                    year_range: Some((1940, 1995)),
                    ..option("classic", "Golden-age classics", &[(Axis::Comfort, 0.6)])
                },
            ],
        },
        Question {
            id: "flavor".to_string(),
            text: "Pick a flavor".to_string(),
            options: vec![
                QuestionOption {
                    genre_hint: Some("comedy".to_string()),
                    ..option("laughs", "Laughs", &[(Axis::Mood, 0.8), (Axis::Energy, 0.4)])
                },
                QuestionOption {
                    genre_hint: Some("thriller".to_string()),
                    ..option(
                        "thrills",
                        "Thrills",
                        &[(Axis::Energy, 0.7), (Axis::Darkness, 0.6)],
                    )
                },
                QuestionOption {
                    genre_hint: Some("drama".to_string()),
                    ..option(
                        "feels",
                        "The feels",
                        &[(Axis::Focus, 0.6), (Axis::Mood, 0.4)],
                    )
                },
                QuestionOption {
                    genre_hint: Some("science fiction".to_string()),
                    ..option(
                        "wonder",
                        "Wonder",
                        &[(Axis::Openness, 0.85), (Axis::Focus, 0.5)],
                    )
                },
            ],
        },
        Question {
            id: "commitment".to_string(),
            text: "How long are you in for?".to_string(),
            options: vec![
                QuestionOption {
                    max_runtime: Some(100),
                    ..option("quick", "Something quick", &[(Axis::Energy, 0.3)])
                },
                option("standard", "A regular movie night", &[(Axis::Focus, 0.4)]),
                QuestionOption {
                    min_runtime: Some(120),
                    ..option("epic", "Ready for an epic", &[(Axis::Focus, 0.8)])
                },
            ],
        },
    ]
}
