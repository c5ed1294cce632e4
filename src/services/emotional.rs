use crate::catalog::Question;
use crate::models::{Answer, Axis, Context, EmotionalProfile, TimeOfDay};

/// Neutral midpoint used for axes no answered option contributed to
const NEUTRAL: f32 = 0.5;

// Additive context shifts. Late night pulls toward comfort; mornings
// lift energy.
const LATE_NIGHT_COMFORT_SHIFT: f32 = 0.15;
const LATE_NIGHT_ENERGY_SHIFT: f32 = -0.10;
const MORNING_ENERGY_SHIFT: f32 = 0.10;

/// Builds the emotional profile from the answer set.
///
/// Each answered option's partial weights are accumulated per axis and
/// averaged over the options that touched that axis; axes nothing touched
/// sit at the neutral midpoint. Axes are independent dimensions, with no
/// renormalization across them. Fully deterministic for a given input.
pub fn build_profile(
    answers: &[Answer],
    questions: &[Question],
    context: &Context,
) -> EmotionalProfile {
    let mut sums = [0.0f32; 6];
    let mut counts = [0u32; 6];

    for answer in answers {
        let Some(question) = questions.iter().find(|q| q.id == answer.question_id) else {
            continue;
        };
        let Some(option) = question.option(&answer.option_id) else {
            tracing::warn!(
                question_id = %answer.question_id,
                option_id = %answer.option_id,
                "Answer references an option missing from the catalog"
            );
            continue;
        };
        for &(axis, weight) in &option.weights {
            let i = axis_index(axis);
            sums[i] += weight;
            counts[i] += 1;
        }
    }

    let mut profile = EmotionalProfile {
        energy: NEUTRAL,
        mood: NEUTRAL,
        openness: NEUTRAL,
        focus: NEUTRAL,
        comfort: NEUTRAL,
        darkness: NEUTRAL,
        confidence: confidence(answers.len(), questions.len()),
        summary: String::new(),
    };

    for &axis in Axis::all() {
        let i = axis_index(axis);
        if counts[i] > 0 {
            profile.set(axis, sums[i] / counts[i] as f32);
        }
    }

    apply_context_shift(&mut profile, context);
    profile.summary = summarize(&profile);
    profile
}

fn axis_index(axis: Axis) -> usize {
    match axis {
        Axis::Energy => 0,
        Axis::Mood => 1,
        Axis::Openness => 2,
        Axis::Focus => 3,
        Axis::Comfort => 4,
        Axis::Darkness => 5,
    }
}

fn apply_context_shift(profile: &mut EmotionalProfile, context: &Context) {
    match context.time_of_day {
        TimeOfDay::LateNight => {
            profile.nudge(Axis::Comfort, LATE_NIGHT_COMFORT_SHIFT);
            profile.nudge(Axis::Energy, LATE_NIGHT_ENERGY_SHIFT);
        }
        TimeOfDay::Morning => {
            profile.nudge(Axis::Energy, MORNING_ENERGY_SHIFT);
        }
        TimeOfDay::Afternoon | TimeOfDay::Evening => {}
    }
}

/// Confidence grows monotonically with distinct-answer coverage, scaled
/// to [0, 100]
fn confidence(answered: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let answered = answered.min(total);
    ((answered as f32 / total as f32) * 100.0).round() as u8
}

/// Fixed template table keyed by the dominant axis. No randomness here.
fn summarize(profile: &EmotionalProfile) -> String {
    let template = match profile.dominant_axis() {
        Axis::Energy => "Charged up and chasing a rush",
        Axis::Mood => "Riding a bright mood, keeping it warm",
        Axis::Openness => "Curious and game for something unfamiliar",
        Axis::Focus => "Locked in and ready to pay real attention",
        Axis::Comfort => "Craving something cozy and familiar",
        Axis::Darkness => "Drawn to the shadows right now",
    };
    template.to_string()
}
