use crate::models::context::SourceType;
use crate::suggestion::extractor::ExtractedSignals;
use crate::suggestion::tables::{Lexicon, PriorityWeights};

/// Weighted indicator sum, clipped to [0, 1]:
/// baseline + urgency + time marker + domain keywords (capped) - sentiment.
pub fn score_priority(
    signals: &ExtractedSignals,
    baseline: f64,
    weights: &PriorityWeights,
    lexicon: &Lexicon,
) -> f64 {
    let urgency = weights.urgency_hit_weight * signals.urgency_hits.max(0.0);
    let time = if signals.time_markers > 0 {
        weights.time_marker_weight
    } else {
        0.0
    };
    let domain = (weights.domain_keyword_weight * signals.domain_keyword_count(lexicon) as f64)
        .min(weights.domain_keyword_cap);
    let mood = -weights.sentiment_weight * signals.sentiment.clamp(-1.0, 1.0);

    clip_unit(baseline + urgency + time + domain + mood)
}

pub fn score_for_source(
    signals: &ExtractedSignals,
    source: SourceType,
    weights: &PriorityWeights,
    lexicon: &Lexicon,
) -> f64 {
    score_priority(signals, weights.baseline(source), weights, lexicon)
}

fn clip_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
