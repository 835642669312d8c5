//! Query keyword extraction.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Function words dropped from queries.
static STOPWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        // Korean
        "해줘", "좀", "이거", "저거", "그거", "뭐", "뭔가", "어떻게", "왜", "언제", "어디", "누구",
        "무엇", "어떤", "있어", "없어", "하는", "되는", "같은", "있는", "없는", "해서", "해요",
        "합니다", "이다", "입니다", "새로운", "하려고", "있는데", "싶어", "만들어줘", "짜줘", "너무",
        "복잡한", "복잡해서", "찾고", "하고", "싶은", "필요",
        // English
        "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
        "do", "does", "did", "will", "would", "should", "could", "can", "may", "might", "must",
        "shall", "this", "that", "these", "those", "i", "you", "he", "she", "it", "we", "they",
        "me", "him", "her", "us", "them", "my", "your", "his", "its", "our", "their", "what",
        "which", "who", "when", "where", "why", "how", "please", "just", "some", "need", "want",
        "help", "with", "for", "about", "like", "make", "create", "new", "to", "of", "in", "on",
        "at", "by", "from", "or", "and", "as", "so", "if", "then", "than", "but", "also", "only",
        "not", "no", "yes", "all", "any", "each", "every", "both", "few", "more", "most", "other",
        "such",
    ]
    .into_iter()
    .collect()
});

/// Common words excluded when mining skill descriptions and use cases.
static GENERAL_STOPWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "the", "and", "for", "this", "that", "with", "from", "use", "when", "should", "will", "can",
        "are", "was", "were", "been", "have", "has", "had", "not", "but", "what", "all", "your",
        "you", "they", "them", "their", "which", "who", "whom", "how", "any", "some", "such",
        "more", "most", "other", "into", "over", "only", "than", "then", "also", "just", "about",
        "using", "before", "after", "during", "like", "need", "needs",
    ]
    .into_iter()
    .collect()
});

/// Korean case-marking particles, checked in this order.
const PARTICLES: [&str; 19] = [
    "가", "이", "은", "는", "을", "를", "에", "에서", "에게", "께서", "으로", "로", "의", "도", "만",
    "부터", "까지", "와", "과",
];

static ALPHA_TERM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-zA-Z]{3,}\b").unwrap());

fn is_hangul(c: char) -> bool {
    matches!(c, 'ㄱ'..='ㅎ' | 'ㅏ'..='ㅣ' | '가'..='힣')
}

fn keep_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c.is_whitespace() || is_hangul(c)
}

/// First particle (in list order) whose removal leaves at least two characters.
fn strip_particle(word: &str) -> &str {
    PARTICLES
        .iter()
        .find_map(|particle| {
            word.strip_suffix(particle)
                .filter(|stem| stem.chars().count() >= 2)
        })
        .unwrap_or(word)
}

/// Normalize a query into ordered keywords.
///
/// Lowercases, blanks out punctuation, drops one-character tokens, strips a
/// trailing particle when at least two characters remain, and removes
/// stopwords. Duplicates are kept.
#[must_use]
pub fn extract_keywords(text: &str) -> Vec<String> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| if keep_char(c) { c } else { ' ' })
        .collect();

    normalized
        .split_whitespace()
        .filter(|w| w.chars().count() >= 2)
        .map(strip_particle)
        .filter(|w| !w.is_empty() && !STOPWORDS.contains(w))
        .map(str::to_owned)
        .collect()
}

/// Lowercase alphabetic runs of three or more letters.
pub(crate) fn alpha_terms(text: &str) -> impl Iterator<Item = String> + '_ {
    ALPHA_TERM_RE
        .find_iter(text)
        .map(|m| m.as_str().to_ascii_lowercase())
}

/// Like [`alpha_terms`] without general stopwords.
pub(crate) fn content_terms(text: &str) -> impl Iterator<Item = String> + '_ {
    alpha_terms(text).filter(|w| !GENERAL_STOPWORDS.contains(w.as_str()))
}
