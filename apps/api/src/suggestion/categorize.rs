use std::collections::BTreeMap;

use crate::suggestion::tables::{CategoryTable, Lexicon};

/// Keyword → accumulated frequency weight.
pub type KeywordWeights = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMatch {
    pub category: String,
    /// Summed weight of the winning cluster's keywords; 0.0 for the fallback.
    pub overlap: f64,
    pub is_fallback: bool,
}

/// Picks the cluster whose keywords carry the most weight.
/// Ties go to the cluster declared first; no overlap at all yields the
/// configured default category.
pub fn suggest_category(keywords: &KeywordWeights, table: &CategoryTable) -> CategoryMatch {
    let mut best: Option<(&str, f64)> = None;

    for cluster in &table.clusters {
        let overlap: f64 = cluster
            .keywords
            .iter()
            .filter_map(|k| keywords.get(k.as_str()))
            .sum();
        if overlap <= 0.0 {
            continue;
        }
        // strict > keeps the earlier cluster on ties
        if best.map_or(true, |(_, b)| overlap > b) {
            best = Some((cluster.name.as_str(), overlap));
        }
    }

    match best {
        Some((name, overlap)) => CategoryMatch {
            category: name.to_string(),
            overlap,
            is_fallback: false,
        },
        None => CategoryMatch {
            category: table.default_category.clone(),
            overlap: 0.0,
            is_fallback: true,
        },
    }
}

/// Top `count` keywords by lexicon weight, alphabetical on ties.
pub fn suggest_tags(keywords: &KeywordWeights, lexicon: &Lexicon, count: usize) -> Vec<String> {
    let mut ranked: Vec<(&str, f64)> = keywords
        .keys()
        .map(|k| (k.as_str(), lexicon.keyword_weight(k)))
        .collect();
    // keys are already alphabetical; a stable sort keeps that order on ties
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked
        .into_iter()
        .take(count)
        .map(|(k, _)| k.to_string())
        .collect()
}
