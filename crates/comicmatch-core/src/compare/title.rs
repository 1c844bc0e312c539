use once_cell::sync::Lazy;
use regex::Regex;

use crate::cache::SimilarityCache;
use crate::parser::clean_title;

static BRAND_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"x-[a-z]+").expect("valid brand token regex"));

/// Editorial prefixes removed when only one side carries them.
const ASYMMETRIC_PREFIXES: [&str; 6] = ["the", "uncanny", "all-new", "all new", "amazing", "spectacular"];

/// Title similarity with the precomputed cache consulted first.
///
/// A cached score always wins over the live comparison.
pub fn compare_titles(cache: &SimilarityCache, title_a: &str, title_b: &str) -> f64 {
    if let Some(score) = cache.lookup(title_a, title_b) {
        return score;
    }
    title_similarity(title_a, title_b)
}

/// Live title comparison, symmetric in its arguments.
pub fn title_similarity(title_a: &str, title_b: &str) -> f64 {
    let mut clean_a = clean_title(title_a);
    let mut clean_b = clean_title(title_b);

    if clean_a == clean_b {
        return 1.0;
    }

    // X-Men vs X-Force: different sub-brands are never the same series.
    if let (Some(brand_a), Some(brand_b)) = (brand_token(&clean_a), brand_token(&clean_b))
        && brand_a != brand_b
    {
        return 0.0;
    }

    for prefix in ASYMMETRIC_PREFIXES {
        let stripped_a = strip_word_prefix(&clean_a, prefix).map(str::to_string);
        let stripped_b = strip_word_prefix(&clean_b, prefix).map(str::to_string);
        match (stripped_a, stripped_b) {
            (Some(rest), None) => clean_a = rest,
            (None, Some(rest)) => clean_b = rest,
            _ => {}
        }
    }

    // strsim's greedy Jaro matching can depend on argument order.
    let (first, second) = if clean_a <= clean_b {
        (&clean_a, &clean_b)
    } else {
        (&clean_b, &clean_a)
    };
    strsim::jaro_winkler(first, second)
}

fn brand_token(clean: &str) -> Option<&str> {
    BRAND_TOKEN_RE.find(clean).map(|m| m.as_str())
}

/// Remainder after a whole-word, case-insensitive `prefix`.
fn strip_word_prefix<'a>(title: &'a str, prefix: &str) -> Option<&'a str> {
    let head = title.get(..prefix.len())?;
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    let rest = &title[prefix.len()..];
    let trimmed = rest.trim_start();
    if trimmed.len() == rest.len() {
        return None;
    }
    Some(trimmed)
}
