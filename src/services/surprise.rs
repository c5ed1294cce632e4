use std::collections::HashMap;

use rand::Rng;

use crate::models::{Candidate, EmotionalProfile, ScoredItem};

/// Size of the "safe" head of the ranked list
pub const SAFE_COUNT: usize = 10;
/// Extra pool fetched beyond the safe set so surprises have somewhere to
/// come from
pub const POOL_EXTRA: usize = 20;
/// Deliberately off-distribution items injected per response, strategy mix
/// aside
pub const SURPRISE_QUOTA: usize = 2;

// Per-slot strategy draw weights.
const CHAOS_WEIGHT: f64 = 0.4;
const ADJACENT_WEIGHT: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    ControlledChaos,
    AdjacentDiscovery,
    Wildcard,
}

/// Splits the ranked hits into the safe set plus an injected surprise
/// quota. Every surprise carries `is_surprise = true` and a one-sentence
/// reason. A short pool yields fewer items; items are never duplicated.
pub fn inject_surprises<R: Rng>(
    hits: Vec<ScoredItem>,
    profile: &EmotionalProfile,
    rng: &mut R,
) -> Vec<Candidate> {
    let mut iter = hits.into_iter();
    let safe: Vec<ScoredItem> = iter.by_ref().take(SAFE_COUNT).collect();
    let mut pool: Vec<ScoredItem> = iter.collect();

    let dominant_genre = dominant_genre(&safe);

    let mut result: Vec<Candidate> = safe.into_iter().map(Candidate::safe).collect();

    for _ in 0..SURPRISE_QUOTA {
        if pool.is_empty() {
            break;
        }
        let strategy = draw_strategy(rng);
        let (hit, reason) = match pick(strategy, &mut pool, dominant_genre.as_deref(), profile, rng)
        {
            Some(picked) => picked,
            // A filtered strategy can find nothing in a non-empty pool
            // (AdjacentDiscovery over a genre-homogeneous pool). Retry the
            // slot as a plain chaos draw; only an exhausted pool leaves the
            // quota short.
            None => {
                match pick(
                    Strategy::ControlledChaos,
                    &mut pool,
                    dominant_genre.as_deref(),
                    profile,
                    rng,
                ) {
                    Some(picked) => picked,
                    None => break,
                }
            }
        };
        tracing::debug!(item_id = %hit.item_id, strategy = ?strategy, "Injecting surprise");
        result.push(Candidate::surprise(hit, reason));
    }

    result
}

fn draw_strategy<R: Rng>(rng: &mut R) -> Strategy {
    let roll: f64 = rng.gen();
    if roll < CHAOS_WEIGHT {
        Strategy::ControlledChaos
    } else if roll < CHAOS_WEIGHT + ADJACENT_WEIGHT {
        Strategy::AdjacentDiscovery
    } else {
        Strategy::Wildcard
    }
}

/// The most common genre across the safe set, if any genre appears at all.
/// Ties resolve to the genre seen first in list order.
fn dominant_genre(safe: &[ScoredItem]) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<&str> = Vec::new();
    for hit in safe {
        for genre in &hit.traits.genres {
            let entry = counts.entry(genre.as_str()).or_insert(0);
            if *entry == 0 {
                order.push(genre.as_str());
            }
            *entry += 1;
        }
    }
    let mut best: Option<(&str, usize)> = None;
    for genre in order {
        let count = counts[genre];
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((genre, count));
        }
    }
    best.map(|(genre, _)| genre.to_string())
}

fn pick<R: Rng>(
    strategy: Strategy,
    pool: &mut Vec<ScoredItem>,
    dominant_genre: Option<&str>,
    profile: &EmotionalProfile,
    rng: &mut R,
) -> Option<(ScoredItem, String)> {
    match strategy {
        Strategy::ControlledChaos => {
            let index = rng.gen_range(0..pool.len());
            let hit = pool.swap_remove(index);
            let reason = format!(
                "A roll of the dice from beyond the obvious picks, since {} is running the show tonight.",
                profile.dominant_axis()
            );
            Some((hit, reason))
        }
        Strategy::AdjacentDiscovery => {
            // Best-scored pool item outside the safe set's dominant genre
            // cluster; without a cluster, plain best-of-pool.
            let index = match dominant_genre {
                Some(genre) => pool
                    .iter()
                    .enumerate()
                    .filter(|(_, hit)| !hit.traits.genres.iter().any(|g| g == genre))
                    .max_by(|(_, a), (_, b)| a.score.total_cmp(&b.score))
                    .map(|(i, _)| i),
                None => pool
                    .iter()
                    .enumerate()
                    .max_by(|(_, a), (_, b)| a.score.total_cmp(&b.score))
                    .map(|(i, _)| i),
            }?;
            let hit = pool.swap_remove(index);
            let reason = match dominant_genre {
                Some(genre) => format!(
                    "A step sideways from the {} crowd the rest of the list leans on.",
                    genre
                ),
                None => "A near miss to your picks that deserves a look of its own.".to_string(),
            };
            Some((hit, reason))
        }
        Strategy::Wildcard => {
            let index = pool
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| a.score.total_cmp(&b.score))
                .map(|(i, _)| i)?;
            let hit = pool.swap_remove(index);
            Some((
                hit,
                "A deliberate long shot with little resemblance to the rest of the list."
                    .to_string(),
            ))
        }
    }
}
