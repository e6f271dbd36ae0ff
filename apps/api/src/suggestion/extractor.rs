//! Keyword and sentiment extraction over raw text.
//!
//! Word-boundary matching against the lexicon, no NLP. Deterministic.

use std::collections::BTreeSet;

use crate::suggestion::tables::Lexicon;

/// Everything the scorers need from one piece of text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedSignals {
    /// Lexicon terms present in the text, in lexicon form.
    pub keywords: BTreeSet<String>,
    /// Sum of urgency-term weights over every occurrence.
    pub urgency_hits: f64,
    pub time_markers: usize,
    pub positive_hits: usize,
    pub negative_hits: usize,
    /// Non-stopword tokens.
    pub token_count: usize,
    /// In [-1, 1].
    pub sentiment: f64,
}

impl ExtractedSignals {
    /// Keywords that come from the domain list (not urgency terms).
    pub fn domain_keyword_count(&self, lexicon: &Lexicon) -> usize {
        self.keywords
            .iter()
            .filter(|k| lexicon.domain_weight(k).is_some())
            .count()
    }
}

pub fn extract(text: &str, lexicon: &Lexicon) -> ExtractedSignals {
    let tokens = tokenize(text, lexicon);
    if tokens.is_empty() {
        return ExtractedSignals::default();
    }

    let mut signals = ExtractedSignals {
        token_count: tokens.len(),
        ..Default::default()
    };

    for (idx, token) in tokens.iter().enumerate() {
        if let Some(term) = lexicon.urgency_terms.iter().find(|t| matches_term(token, &t.term)) {
            signals.urgency_hits += term.weight;
            signals.keywords.insert(term.term.clone());
        } else if let Some(term) = lexicon.domain_terms.iter().find(|t| matches_term(token, &t.term)) {
            signals.keywords.insert(term.term.clone());
        }

        let previous = idx.checked_sub(1).map(|i| tokens[i].as_str());
        if is_time_marker(token, previous, lexicon) {
            signals.time_markers += 1;
        }
        if lexicon.positive_terms.iter().any(|t| matches_term(token, t)) {
            signals.positive_hits += 1;
        }
        if lexicon.negative_terms.iter().any(|t| matches_term(token, t)) {
            signals.negative_hits += 1;
        }
    }

    signals.sentiment = sentiment_score(
        signals.positive_hits,
        signals.negative_hits,
        signals.token_count,
        lexicon.sentiment_gain,
    );
    signals
}

/// `(positive - negative) / tokens * gain`, clipped to [-1, 1].
pub fn sentiment_score(positive: usize, negative: usize, tokens: usize, gain: f64) -> f64 {
    if positive == 0 && negative == 0 {
        return 0.0;
    }
    let raw = (positive as f64 - negative as f64) / tokens.max(1) as f64 * gain;
    if raw.is_finite() {
        raw.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Lowercased alphanumeric runs with stopwords removed.
/// Clock times such as `14:30` stay one token.
fn tokenize(text: &str, lexicon: &Lexicon) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != ':')
        .flat_map(|piece| {
            if is_clock_time(piece) {
                vec![piece]
            } else {
                piece.split(':').collect()
            }
        })
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .filter(|t| !lexicon.is_stopword(t))
        .collect()
}

/// Exact match, or the term with a plural suffix.
fn matches_term(token: &str, term: &str) -> bool {
    match token.strip_prefix(term) {
        Some("") | Some("s") | Some("es") => true,
        _ => false,
    }
}

fn is_time_marker(token: &str, previous: Option<&str>, lexicon: &Lexicon) -> bool {
    if lexicon.time_markers.iter().any(|m| m == token) || is_clock_time(token) {
        return true;
    }
    // "2 pm" counts, the verb in "I am" does not
    if token == "am" || token == "pm" {
        return previous.is_some_and(is_hour);
    }
    // clock times written without a space, e.g. "2pm", "11am"
    let digits = token.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    let suffix = &token[digits.len()..];
    (suffix == "am" || suffix == "pm") && is_hour(digits)
}

fn is_hour(token: &str) -> bool {
    (1..=2).contains(&token.len()) && token.chars().all(|c| c.is_ascii_digit())
}

/// `H:MM` or `HH:MM`, 24-hour.
fn is_clock_time(token: &str) -> bool {
    let Some((hours, minutes)) = token.split_once(':') else {
        return false;
    };
    is_hour(hours)
        && minutes.len() == 2
        && minutes.chars().all(|c| c.is_ascii_digit())
        && hours.parse::<u32>().is_ok_and(|h| h < 24)
        && minutes.parse::<u32>().is_ok_and(|m| m < 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lexicon() -> Lexicon {
        Lexicon::default()
    }

    #[test]
    fn test_example_message_keywords() {
        let s = extract(
            "Urgent: Client meeting tomorrow at 2 PM. Need presentation ready by noon.",
            &lexicon(),
        );
        for kw in ["urgent", "client", "meeting", "presentation"] {
            assert!(s.keywords.contains(kw), "missing {kw}: {:?}", s.keywords);
        }
        assert_eq!(s.urgency_hits, 1.0);
        assert!(s.time_markers >= 2);
        assert_eq!(s.sentiment, 0.0);
    }

    #[test]
    fn test_empty_text_is_neutral() {
        let s = extract("", &lexicon());
        assert!(s.keywords.is_empty());
        assert_eq!(s.sentiment, 0.0);
        assert_eq!(s.token_count, 0);

        let s = extract("   \n\t ", &lexicon());
        assert_eq!(s, ExtractedSignals::default());
    }

    #[test]
    fn test_matching_is_case_insensitive_and_word_bounded() {
        let s = extract("URGENT!! Insurgent forces", &lexicon());
        assert!(s.keywords.contains("urgent"));
        // "insurgent" must not count as "urgent"
        assert_eq!(s.urgency_hits, 1.0);
    }

    #[test]
    fn test_plural_forms_match() {
        let s = extract("Two meetings and three deadlines", &lexicon());
        assert!(s.keywords.contains("meeting"));
        assert!(s.keywords.contains("deadline"));
    }

    #[test]
    fn test_every_occurrence_adds_urgency() {
        let once = extract("urgent", &lexicon());
        let twice = extract("urgent urgent", &lexicon());
        assert!(twice.urgency_hits > once.urgency_hits);
        assert_eq!(twice.keywords.len(), 1);
    }

    #[test]
    fn test_clock_time_token_is_time_marker() {
        let s = extract("call at 2pm", &lexicon());
        assert_eq!(s.time_markers, 1);
        let s = extract("version 2pmx", &lexicon());
        assert_eq!(s.time_markers, 0);
    }

    #[test]
    fn test_24_hour_clock_is_time_marker() {
        let s = extract("meet at 14:30", &lexicon());
        assert_eq!(s.time_markers, 1);
        assert_eq!(extract("standup 9:05 sharp", &lexicon()).time_markers, 1);
        // not a time of day
        assert_eq!(extract("ratio 25:99", &lexicon()).time_markers, 0);
        // a trailing colon still splits off the word
        assert!(extract("Urgent: now", &lexicon()).keywords.contains("urgent"));
    }

    #[test]
    fn test_meridiem_needs_a_preceding_hour() {
        assert_eq!(extract("I am at home", &lexicon()).time_markers, 0);
        assert_eq!(extract("pm me the notes", &lexicon()).time_markers, 0);
        assert_eq!(extract("landing at 7 am", &lexicon()).time_markers, 1);
        assert_eq!(extract("call at 2 PM", &lexicon()).time_markers, 1);
    }

    #[test]
    fn test_positive_text_has_positive_sentiment() {
        let s = extract("Weather looks great for the weekend. Anyone up for a hike?", &lexicon());
        assert!(s.sentiment > 0.0);
        assert!(s.keywords.contains("weekend"));
        assert!(s.keywords.contains("hike"));
    }

    #[test]
    fn test_negative_text_has_negative_sentiment() {
        let s = extract("Sorry, the build failed again and the release is delayed", &lexicon());
        assert!(s.sentiment < 0.0);
    }

    #[test]
    fn test_sentiment_is_clipped() {
        assert_eq!(sentiment_score(10, 0, 1, 4.0), 1.0);
        assert_eq!(sentiment_score(0, 10, 1, 4.0), -1.0);
        assert_eq!(sentiment_score(0, 0, 0, 4.0), 0.0);
    }

    #[test]
    fn test_domain_keyword_count_excludes_urgency_terms() {
        let lex = lexicon();
        let s = extract("urgent client deadline", &lex);
        assert_eq!(s.domain_keyword_count(&lex), 1);
    }
}
