use std::sync::Arc;
use std::time::Duration;

use crate::catalog::Question;
use crate::models::{Answer, Axis, EmotionalProfile};
use crate::services::providers::PreferenceWriter;

/// Axis value at or above which the "high" phrase fires
const HIGH_THRESHOLD: f32 = 0.7;
/// Axis value at or below which the "low" phrase fires (energy and
/// darkness only)
const LOW_THRESHOLD: f32 = 0.3;

/// Builds the preference text fed to similarity search: a baseline
/// statement (LLM-assisted when the collaborator is configured and
/// healthy, deterministic template otherwise) plus enhancement phrases
/// derived from the profile.
///
/// The enhancement section is concatenated in fixed axis order, so
/// identical profiles always append byte-identical text.
pub async fn synthesize(
    writer: Option<&Arc<dyn PreferenceWriter>>,
    timeout: Duration,
    answers: &[Answer],
    questions: &[Question],
    profile: &EmotionalProfile,
    domain: &str,
) -> String {
    let baseline = baseline_text(writer, timeout, answers, questions, domain).await;
    let phrases = enhancement_phrases(profile);

    if phrases.is_empty() {
        baseline
    } else {
        format!(
            "{} Leaning toward: {}.",
            baseline.trim_end(),
            phrases.join(", ")
        )
    }
}

async fn baseline_text(
    writer: Option<&Arc<dyn PreferenceWriter>>,
    timeout: Duration,
    answers: &[Answer],
    questions: &[Question],
    domain: &str,
) -> String {
    if let Some(writer) = writer {
        match tokio::time::timeout(timeout, writer.preference_text(answers, domain)).await {
            Ok(Ok(text)) => return text,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Preference-text service failed, using template");
            }
            Err(_) => {
                tracing::warn!(timeout_ms = timeout.as_millis() as u64, "Preference-text service timed out, using template");
            }
        }
    }
    fallback_text(answers, questions, domain)
}

/// Deterministic template over the raw answers, in question order
pub fn fallback_text(answers: &[Answer], questions: &[Question], domain: &str) -> String {
    let labels: Vec<&str> = questions
        .iter()
        .filter_map(|question| {
            answers
                .iter()
                .find(|a| a.question_id == question.id)
                .and_then(|a| question.option(&a.option_id))
                .map(|o| o.label.as_str())
        })
        .collect();

    if labels.is_empty() {
        format!("Well-liked {} for an undecided moment.", domain)
    } else {
        format!("{} to match this moment: {}.", capitalize(domain), labels.join("; "))
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// One fixed phrase per axis crossing its threshold, emitted in axis
/// declaration order
pub fn enhancement_phrases(profile: &EmotionalProfile) -> Vec<&'static str> {
    let mut phrases = Vec::new();
    for &axis in Axis::all() {
        let value = profile.get(axis);
        match axis {
            Axis::Energy => {
                if value >= HIGH_THRESHOLD {
                    phrases.push("high-energy, exciting, thrilling");
                } else if value <= LOW_THRESHOLD {
                    phrases.push("calm, gentle, slow-burn");
                }
            }
            Axis::Mood => {
                if value >= HIGH_THRESHOLD {
                    phrases.push("uplifting, feel-good, warm");
                }
            }
            Axis::Openness => {
                if value >= HIGH_THRESHOLD {
                    phrases.push("inventive, unconventional, mind-bending");
                }
            }
            Axis::Focus => {
                if value >= HIGH_THRESHOLD {
                    phrases.push("layered, thought-provoking, intricate");
                }
            }
            Axis::Comfort => {
                if value >= HIGH_THRESHOLD {
                    phrases.push("cozy, familiar, reassuring");
                }
            }
            Axis::Darkness => {
                if value >= HIGH_THRESHOLD {
                    phrases.push("dark, brooding, intense");
                } else if value <= LOW_THRESHOLD {
                    phrases.push("light, easygoing");
                }
            }
        }
    }
    phrases
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{QuestionCatalog, StaticCatalog};
    use crate::models::Context;
    use crate::services::providers::MockPreferenceWriter;
    use chrono::Utc;

    fn profile_with(energy: f32, darkness: f32) -> EmotionalProfile {
        EmotionalProfile {
            energy,
            mood: 0.5,
            openness: 0.5,
            focus: 0.5,
            comfort: 0.5,
            darkness,
            confidence: 100,
            summary: String::new(),
        }
    }

    fn answer(question_id: &str, option_id: &str) -> Answer {
        Answer {
            question_id: question_id.to_string(),
            option_id: option_id.to_string(),
            answered_at: Utc::now(),
        }
    }

    async fn standard_questions() -> Vec<crate::catalog::Question> {
        StaticCatalog
            .questions_for_flow("standard", &Context::default())
            .await
            .unwrap()
    }

    #[test]
    fn test_phrases_follow_axis_order() {
        let mut profile = profile_with(0.9, 0.8);
        profile.comfort = 0.75;
        let phrases = enhancement_phrases(&profile);
        assert_eq!(
            phrases,
            vec![
                "high-energy, exciting, thrilling",
                "cozy, familiar, reassuring",
                "dark, brooding, intense",
            ]
        );
    }

    #[test]
    fn test_low_energy_and_low_darkness_phrases() {
        let phrases = enhancement_phrases(&profile_with(0.1, 0.2));
        assert_eq!(
            phrases,
            vec!["calm, gentle, slow-burn", "light, easygoing"]
        );
    }

    #[test]
    fn test_mid_range_profile_emits_nothing() {
        assert!(enhancement_phrases(&profile_with(0.5, 0.5)).is_empty());
    }

    #[tokio::test]
    async fn test_fallback_text_is_deterministic() {
        let questions = standard_questions().await;
        let answers = vec![answer("energy", "wired"), answer("mood", "bright")];
        let a = fallback_text(&answers, &questions, "movies");
        let b = fallback_text(&answers, &questions, "movies");
        assert_eq!(a, b);
        assert_eq!(
            a,
            "Movies to match this moment: Wired and ready for anything; Bright, keep it fun."
        );
    }

    #[tokio::test]
    async fn test_synthesize_without_writer_is_byte_identical() {
        let questions = standard_questions().await;
        let answers = vec![answer("energy", "wired")];
        let profile = profile_with(0.9, 0.2);
        let timeout = Duration::from_millis(100);
        let a = synthesize(None, timeout, &answers, &questions, &profile, "movies").await;
        let b = synthesize(None, timeout, &answers, &questions, &profile, "movies").await;
        assert_eq!(a, b);
        assert!(a.contains("Leaning toward: high-energy, exciting, thrilling, light, easygoing."));
    }

    #[tokio::test]
    async fn test_synthesize_uses_writer_when_healthy() {
        let mut writer = MockPreferenceWriter::new();
        writer
            .expect_preference_text()
            .returning(|_, _| Ok("Something moody and slow.".to_string()));
        let writer: Arc<dyn PreferenceWriter> = Arc::new(writer);

        let questions = standard_questions().await;
        let text = synthesize(
            Some(&writer),
            Duration::from_millis(100),
            &[],
            &questions,
            &profile_with(0.5, 0.5),
            "movies",
        )
        .await;
        assert_eq!(text, "Something moody and slow.");
    }

    #[tokio::test]
    async fn test_synthesize_falls_back_on_writer_error() {
        let mut writer = MockPreferenceWriter::new();
        writer.expect_preference_text().returning(|_, _| {
            Err(crate::error::AppError::ExternalApi("boom".to_string()))
        });
        let writer: Arc<dyn PreferenceWriter> = Arc::new(writer);

        let questions = standard_questions().await;
        let answers = vec![answer("mood", "moody")];
        let text = synthesize(
            Some(&writer),
            Duration::from_millis(100),
            &answers,
            &questions,
            &profile_with(0.5, 0.5),
            "movies",
        )
        .await;
        assert!(text.starts_with("Movies to match this moment: Moody, lean into it."));
    }
}
