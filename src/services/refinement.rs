use crate::models::{
    Axis, Candidate, EmotionalProfile, Feedback, QuickAdjust, Reaction, SoftFilters,
};

// Pattern-detection thresholds. Tunable constants, documented in DESIGN.md;
// the priority order of the rules is the contract, the literals are not.
const DISLIKE_SHARE: f32 = 0.6;
const HIGH_DARKNESS: f32 = 0.65;
const ENERGY_MATCH_BAND: f32 = 0.2;
const GENRE_MISMATCH_MIN: usize = 2;

/// The refinement strategy chosen for one feedback batch. Closed enum,
/// matched in declaration (priority) order.
#[derive(Debug, Clone, PartialEq)]
pub enum RefinementStrategy {
    /// Dislikes concentrated on high-darkness items
    TooIntense,
    /// Dislikes concentrated on items whose pacing matched the profile;
    /// the energy read was wrong, so invert it
    WrongEnergy,
    /// A genre cluster the user consistently disliked
    GenreMismatch { genre: String },
    /// All likes concentrated in one category the filters never asked for
    HiddenDesire { genre: String },
    /// Generic fallback: nudge away from disliked items' dominant axes
    Auto,
}

impl RefinementStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            RefinementStrategy::TooIntense => "too_intense",
            RefinementStrategy::WrongEnergy => "wrong_energy",
            RefinementStrategy::GenreMismatch { .. } => "genre_mismatch",
            RefinementStrategy::HiddenDesire { .. } => "hidden_desire",
            RefinementStrategy::Auto => "auto",
        }
    }
}

/// A vector delta plus filter delta, fed back into synthesis and search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Adjustment {
    pub axis_deltas: Vec<(Axis, f32)>,
    pub exclude_genres: Vec<String>,
    pub set_genre_hint: Option<String>,
    pub clear_genre_hint: bool,
    pub widen_years: bool,
    pub min_rating: Option<f32>,
    pub min_runtime: Option<u32>,
    pub max_runtime: Option<u32>,
}

impl Adjustment {
    /// Applies this adjustment to the session's profile and filters
    pub fn apply(&self, profile: &mut EmotionalProfile, filters: &mut SoftFilters) {
        for &(axis, delta) in &self.axis_deltas {
            profile.nudge(axis, delta);
        }
        for genre in &self.exclude_genres {
            filters.exclude_genre(genre);
        }
        if self.clear_genre_hint {
            filters.genre_hint = None;
        }
        if let Some(genre) = &self.set_genre_hint {
            filters.genre_hint = Some(genre.clone());
        }
        if self.widen_years {
            filters.year_min = None;
            filters.year_max = None;
        }
        if self.min_rating.is_some() {
            filters.min_rating = self.min_rating;
        }
        if self.min_runtime.is_some() {
            filters.min_runtime = self.min_runtime;
            filters.max_runtime = None;
        }
        if self.max_runtime.is_some() {
            filters.max_runtime = self.max_runtime;
            filters.min_runtime = None;
        }
    }
}

/// Hand-authored preset per quick-adjustment name. Exhaustive over the
/// enum, deterministic.
pub fn quick_adjust_plan(adjust: QuickAdjust) -> Adjustment {
    match adjust {
        QuickAdjust::Lighter => Adjustment {
            axis_deltas: vec![
                (Axis::Mood, 0.20),
                (Axis::Darkness, -0.30),
                (Axis::Comfort, 0.10),
            ],
            ..Default::default()
        },
        QuickAdjust::Deeper => Adjustment {
            axis_deltas: vec![
                (Axis::Focus, 0.25),
                (Axis::Darkness, 0.15),
                (Axis::Mood, -0.10),
            ],
            ..Default::default()
        },
        QuickAdjust::Weirder => Adjustment {
            axis_deltas: vec![(Axis::Openness, 0.30)],
            clear_genre_hint: true,
            widen_years: true,
            ..Default::default()
        },
        QuickAdjust::Safer => Adjustment {
            axis_deltas: vec![(Axis::Openness, -0.25), (Axis::Comfort, 0.20)],
            min_rating: Some(7.0),
            ..Default::default()
        },
        QuickAdjust::Shorter => Adjustment {
            max_runtime: Some(100),
            ..Default::default()
        },
        QuickAdjust::Longer => Adjustment {
            axis_deltas: vec![(Axis::Focus, 0.10)],
            min_runtime: Some(120),
            ..Default::default()
        },
    }
}

/// Runs pattern detection over a feedback batch joined to the previous
/// recommendation list, in fixed priority order. Exactly one strategy is
/// selected; the first matching rule wins, `Auto` is the fallback.
pub fn plan_from_feedback(
    batch: &[Feedback],
    last_recommendations: &[Candidate],
    profile: &EmotionalProfile,
    filters: &SoftFilters,
) -> (RefinementStrategy, Adjustment) {
    let joined: Vec<(&Feedback, &Candidate)> = batch
        .iter()
        .filter_map(|f| {
            last_recommendations
                .iter()
                .find(|c| c.item_id == f.item_id)
                .map(|c| (f, c))
        })
        .collect();

    let dislikes: Vec<&Candidate> = joined
        .iter()
        .filter(|(f, _)| f.reaction == Reaction::Dislike)
        .map(|(_, c)| *c)
        .collect();
    let likes: Vec<&Candidate> = joined
        .iter()
        .filter(|(f, _)| f.reaction == Reaction::Like)
        .map(|(_, c)| *c)
        .collect();

    let strategy = detect(&joined, &dislikes, &likes, profile, filters);
    let adjustment = plan(&strategy, &dislikes, profile);
    (strategy, adjustment)
}

fn detect(
    joined: &[(&Feedback, &Candidate)],
    dislikes: &[&Candidate],
    likes: &[&Candidate],
    profile: &EmotionalProfile,
    filters: &SoftFilters,
) -> RefinementStrategy {
    if joined.is_empty() {
        return RefinementStrategy::Auto;
    }
    let dislike_share = dislikes.len() as f32 / joined.len() as f32;

    // Rule 1: too intense.
    if dislike_share >= DISLIKE_SHARE && !dislikes.is_empty() {
        let dark_share = dislikes
            .iter()
            .filter(|c| c.traits.darkness >= HIGH_DARKNESS)
            .count() as f32
            / dislikes.len() as f32;
        if dark_share >= DISLIKE_SHARE {
            return RefinementStrategy::TooIntense;
        }
    }

    // Rule 2: wrong energy. Dislikes sit on items whose energy agreed with
    // the profile, so the pacing read itself was off.
    if dislike_share >= DISLIKE_SHARE && !dislikes.is_empty() {
        let matched_share = dislikes
            .iter()
            .filter(|c| (c.traits.energy - profile.energy).abs() <= ENERGY_MATCH_BAND)
            .count() as f32
            / dislikes.len() as f32;
        if matched_share >= DISLIKE_SHARE {
            return RefinementStrategy::WrongEnergy;
        }
    }

    // Rule 3: genre mismatch. A genre on multiple dislikes and no like.
    if let Some(genre) = disliked_genre_cluster(dislikes, likes) {
        return RefinementStrategy::GenreMismatch { genre };
    }

    // Rule 4: hidden desire. Every like shares one genre the current
    // filters never asked for.
    if likes.len() >= 2 {
        if let Some(genre) = common_genre(likes) {
            if filters.genre_hint.as_deref() != Some(genre.as_str()) {
                return RefinementStrategy::HiddenDesire { genre };
            }
        }
    }

    RefinementStrategy::Auto
}

/// First genre (in dislike order) appearing on at least
/// `GENRE_MISMATCH_MIN` disliked items and on no liked item
fn disliked_genre_cluster(dislikes: &[&Candidate], likes: &[&Candidate]) -> Option<String> {
    for candidate in dislikes {
        for genre in &candidate.traits.genres {
            let dislike_count = dislikes
                .iter()
                .filter(|c| c.traits.genres.iter().any(|g| g == genre))
                .count();
            let liked = likes
                .iter()
                .any(|c| c.traits.genres.iter().any(|g| g == genre));
            if dislike_count >= GENRE_MISMATCH_MIN && !liked {
                return Some(genre.clone());
            }
        }
    }
    None
}

/// A genre present on every liked item, if one exists
fn common_genre(likes: &[&Candidate]) -> Option<String> {
    let first = likes.first()?;
    first
        .traits
        .genres
        .iter()
        .find(|genre| {
            likes
                .iter()
                .all(|c| c.traits.genres.iter().any(|g| &g == genre))
        })
        .cloned()
}

fn plan(
    strategy: &RefinementStrategy,
    dislikes: &[&Candidate],
    profile: &EmotionalProfile,
) -> Adjustment {
    match strategy {
        RefinementStrategy::TooIntense => Adjustment {
            axis_deltas: vec![
                (Axis::Comfort, 0.25),
                (Axis::Darkness, -0.30),
                (Axis::Mood, 0.10),
            ],
            ..Default::default()
        },
        RefinementStrategy::WrongEnergy => {
            // Invert the pacing preference around the midpoint.
            let delta = if profile.energy >= 0.5 { -0.4 } else { 0.4 };
            Adjustment {
                axis_deltas: vec![(Axis::Energy, delta)],
                ..Default::default()
            }
        }
        RefinementStrategy::GenreMismatch { genre } => Adjustment {
            exclude_genres: vec![genre.clone()],
            axis_deltas: vec![(Axis::Openness, 0.05)],
            ..Default::default()
        },
        RefinementStrategy::HiddenDesire { genre } => Adjustment {
            set_genre_hint: Some(genre.clone()),
            axis_deltas: vec![(Axis::Openness, 0.20)],
            ..Default::default()
        },
        RefinementStrategy::Auto => auto_plan(dislikes),
    }
}

/// Generic fallback: step away from the disliked items' average darkness
/// and energy
fn auto_plan(dislikes: &[&Candidate]) -> Adjustment {
    if dislikes.is_empty() {
        return Adjustment::default();
    }
    let n = dislikes.len() as f32;
    let avg_darkness: f32 = dislikes.iter().map(|c| c.traits.darkness).sum::<f32>() / n;
    let avg_energy: f32 = dislikes.iter().map(|c| c.traits.energy).sum::<f32>() / n;

    let mut axis_deltas = Vec::new();
    axis_deltas.push((
        Axis::Darkness,
        if avg_darkness >= 0.5 { -0.15 } else { 0.15 },
    ));
    axis_deltas.push((Axis::Energy, if avg_energy >= 0.5 { -0.15 } else { 0.15 }));

    Adjustment {
        axis_deltas,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CandidateTraits;

    fn profile() -> EmotionalProfile {
        EmotionalProfile {
            energy: 0.8,
            mood: 0.5,
            openness: 0.5,
            focus: 0.5,
            comfort: 0.5,
            darkness: 0.5,
            confidence: 100,
            summary: String::new(),
        }
    }

    fn candidate(id: &str, darkness: f32, energy: f32, genres: &[&str]) -> Candidate {
        Candidate {
            item_id: id.to_string(),
            score: 0.8,
            is_surprise: false,
            surprise_reason: None,
            traits: CandidateTraits {
                genres: genres.iter().map(|g| g.to_string()).collect(),
                darkness,
                energy,
            },
            metadata: None,
        }
    }

    fn feedback(id: &str, reaction: Reaction) -> Feedback {
        Feedback {
            item_id: id.to_string(),
            reaction,
        }
    }

    #[test]
    fn test_all_dislikes_on_dark_items_selects_too_intense() {
        let last = vec![
            candidate("a", 0.8, 0.3, &["horror"]),
            candidate("b", 0.75, 0.4, &["thriller"]),
            candidate("c", 0.7, 0.5, &["horror"]),
        ];
        let batch = vec![
            feedback("a", Reaction::Dislike),
            feedback("b", Reaction::Dislike),
            feedback("c", Reaction::Dislike),
        ];
        let (strategy, adjustment) =
            plan_from_feedback(&batch, &last, &profile(), &SoftFilters::default());
        assert_eq!(strategy, RefinementStrategy::TooIntense);
        assert!(adjustment
            .axis_deltas
            .contains(&(Axis::Darkness, -0.30)));
    }

    #[test]
    fn test_too_intense_outranks_genre_mismatch() {
        // Dark dislikes that also share a genre; rule 1 must win.
        let last = vec![
            candidate("a", 0.9, 0.5, &["horror"]),
            candidate("b", 0.85, 0.5, &["horror"]),
        ];
        let batch = vec![
            feedback("a", Reaction::Dislike),
            feedback("b", Reaction::Dislike),
        ];
        let (strategy, _) =
            plan_from_feedback(&batch, &last, &profile(), &SoftFilters::default());
        assert_eq!(strategy, RefinementStrategy::TooIntense);
    }

    #[test]
    fn test_wrong_energy_inverts_pacing() {
        // Low-darkness dislikes whose energy matches the (high) profile.
        let last = vec![
            candidate("a", 0.2, 0.8, &["action"]),
            candidate("b", 0.1, 0.75, &["adventure"]),
        ];
        let batch = vec![
            feedback("a", Reaction::Dislike),
            feedback("b", Reaction::Dislike),
        ];
        let (strategy, adjustment) =
            plan_from_feedback(&batch, &last, &profile(), &SoftFilters::default());
        assert_eq!(strategy, RefinementStrategy::WrongEnergy);
        assert_eq!(adjustment.axis_deltas, vec![(Axis::Energy, -0.4)]);
    }

    #[test]
    fn test_genre_mismatch_excludes_cluster() {
        // Half dislikes, so the intensity rules don't fire; two dislikes
        // share "musical" and no like does.
        let last = vec![
            candidate("a", 0.2, 0.2, &["musical"]),
            candidate("b", 0.3, 0.3, &["musical"]),
            candidate("c", 0.2, 0.2, &["comedy"]),
            candidate("d", 0.3, 0.3, &["comedy"]),
        ];
        let batch = vec![
            feedback("a", Reaction::Dislike),
            feedback("b", Reaction::Dislike),
            feedback("c", Reaction::Like),
            feedback("d", Reaction::Like),
        ];
        let (strategy, adjustment) =
            plan_from_feedback(&batch, &last, &profile(), &SoftFilters::default());
        assert_eq!(
            strategy,
            RefinementStrategy::GenreMismatch {
                genre: "musical".to_string()
            }
        );
        assert_eq!(adjustment.exclude_genres, vec!["musical".to_string()]);
    }

    #[test]
    fn test_hidden_desire_pivots_genre_hint() {
        let last = vec![
            candidate("a", 0.4, 0.5, &["documentary", "drama"]),
            candidate("b", 0.5, 0.4, &["documentary"]),
            candidate("c", 0.4, 0.5, &["comedy"]),
        ];
        let batch = vec![
            feedback("a", Reaction::Like),
            feedback("b", Reaction::Like),
            feedback("c", Reaction::Neutral),
        ];
        let filters = SoftFilters {
            genre_hint: Some("comedy".to_string()),
            ..Default::default()
        };
        let (strategy, adjustment) = plan_from_feedback(&batch, &last, &profile(), &filters);
        assert_eq!(
            strategy,
            RefinementStrategy::HiddenDesire {
                genre: "documentary".to_string()
            }
        );
        assert_eq!(
            adjustment.set_genre_hint.as_deref(),
            Some("documentary")
        );
    }

    #[test]
    fn test_no_pattern_falls_back_to_auto() {
        let last = vec![
            candidate("a", 0.3, 0.2, &["comedy"]),
            candidate("b", 0.4, 0.3, &["drama"]),
            candidate("c", 0.3, 0.2, &["romance"]),
        ];
        let batch = vec![
            feedback("a", Reaction::Dislike),
            feedback("b", Reaction::Like),
            feedback("c", Reaction::Neutral),
        ];
        let (strategy, adjustment) =
            plan_from_feedback(&batch, &last, &profile(), &SoftFilters::default());
        assert_eq!(strategy, RefinementStrategy::Auto);
        // One dislike at darkness 0.3, energy 0.2: nudge both up.
        assert_eq!(
            adjustment.axis_deltas,
            vec![(Axis::Darkness, 0.15), (Axis::Energy, 0.15)]
        );
    }

    #[test]
    fn test_feedback_for_unknown_items_is_ignored() {
        let (strategy, adjustment) = plan_from_feedback(
            &[feedback("ghost", Reaction::Dislike)],
            &[],
            &profile(),
            &SoftFilters::default(),
        );
        assert_eq!(strategy, RefinementStrategy::Auto);
        assert_eq!(adjustment, Adjustment::default());
    }

    #[test]
    fn test_quick_adjust_plans_are_deterministic() {
        assert_eq!(
            quick_adjust_plan(QuickAdjust::Lighter),
            quick_adjust_plan(QuickAdjust::Lighter)
        );
        assert_eq!(
            quick_adjust_plan(QuickAdjust::Shorter).max_runtime,
            Some(100)
        );
        assert_eq!(
            quick_adjust_plan(QuickAdjust::Longer).min_runtime,
            Some(120)
        );
        assert!(quick_adjust_plan(QuickAdjust::Weirder).clear_genre_hint);
        assert_eq!(
            quick_adjust_plan(QuickAdjust::Safer).min_rating,
            Some(7.0)
        );
    }

    #[test]
    fn test_apply_adjustment_clamps_and_merges() {
        let mut p = profile();
        let mut filters = SoftFilters {
            year_min: Some(1990),
            year_max: Some(2005),
            genre_hint: Some("comedy".to_string()),
            ..Default::default()
        };
        quick_adjust_plan(QuickAdjust::Weirder).apply(&mut p, &mut filters);
        assert_eq!(p.openness, 0.8);
        assert_eq!(filters.genre_hint, None);
        assert_eq!(filters.year_min, None);
        assert_eq!(filters.year_max, None);
    }

    #[test]
    fn test_shorter_then_longer_drops_conflicting_bound() {
        let mut p = profile();
        let mut filters = SoftFilters::default();
        quick_adjust_plan(QuickAdjust::Shorter).apply(&mut p, &mut filters);
        assert_eq!(filters.max_runtime, Some(100));
        quick_adjust_plan(QuickAdjust::Longer).apply(&mut p, &mut filters);
        assert_eq!(filters.min_runtime, Some(120));
        assert_eq!(filters.max_runtime, None);
    }
}
