//! Multi-signal keyword scoring of registry skills against a query.

use std::collections::{BTreeSet, HashSet};

use regex::{Regex, RegexBuilder};

use crate::config::MatchConfig;
use crate::keywords::{alpha_terms, content_terms, extract_keywords};
use crate::record::SkillRecord;
use crate::registry::SkillRegistry;

#[derive(Debug, Clone, Copy)]
pub struct SkillMatch<'a> {
    pub skill: &'a SkillRecord,
    /// Normalized score; bonuses can push it above 1.0.
    pub score: f64,
}

impl SkillMatch<'_> {
    /// Score capped at 1.0 for display.
    #[must_use]
    pub fn display_confidence(&self) -> f64 {
        self.score.min(1.0)
    }
}

/// Primary keyword with word-boundary matching, or plain containment when the
/// boundary pattern cannot be built.
#[derive(Debug)]
struct Primary {
    regex: Option<Regex>,
    literal: String,
}

impl Primary {
    fn new(keyword: &str) -> Self {
        let regex = Regex::new(&format!(r"\b{}\b", regex::escape(keyword))).ok();
        Self {
            regex,
            literal: keyword.to_owned(),
        }
    }

    fn is_match(&self, query_lower: &str) -> bool {
        match &self.regex {
            Some(re) => re.is_match(query_lower),
            None => query_lower.contains(&self.literal),
        }
    }
}

/// Per-skill data derived once when the matcher is built.
#[derive(Debug)]
struct Compiled<'a> {
    record: &'a SkillRecord,
    intents: Vec<Regex>,
    primary: Vec<Primary>,
    keywords: Vec<String>,
    keyword_set: HashSet<String>,
    use_case_terms: BTreeSet<String>,
    description_terms: BTreeSet<String>,
    use_case_phrases: Vec<HashSet<String>>,
    tags: HashSet<String>,
}

impl<'a> Compiled<'a> {
    fn new(record: &'a SkillRecord, skipped: &mut usize) -> Self {
        let intents = record
            .intent_patterns
            .iter()
            .filter_map(|pattern| {
                match RegexBuilder::new(pattern).case_insensitive(true).build() {
                    Ok(re) => Some(re),
                    Err(e) => {
                        *skipped += 1;
                        tracing::warn!(skill = %record.name, pattern = %pattern, "skipping invalid intent pattern: {e}");
                        None
                    }
                }
            })
            .collect();

        let explicit = record.keywords.flatten_lowercase();
        let primary = explicit.iter().take(3).map(|k| Primary::new(k)).collect();

        let use_case_terms: BTreeSet<String> = record
            .use_cases
            .iter()
            .flat_map(|uc| content_terms(uc).collect::<Vec<_>>())
            .collect();
        let description_terms: BTreeSet<String> = content_terms(&record.description).collect();

        let keywords = if explicit.is_empty() {
            description_terms.iter().cloned().collect()
        } else {
            explicit
        };

        Self {
            record,
            intents,
            primary,
            keyword_set: keywords.iter().cloned().collect(),
            keywords,
            use_case_terms,
            description_terms,
            use_case_phrases: record
                .use_cases
                .iter()
                .map(|uc| alpha_terms(uc).collect())
                .collect(),
            tags: record.tags.iter().map(|t| t.to_lowercase()).collect(),
        }
    }
}

/// Scores and selects skills from one registry snapshot.
#[derive(Debug)]
pub struct SkillMatcher<'a> {
    config: MatchConfig,
    skills: Vec<Compiled<'a>>,
    skipped_patterns: usize,
}

impl<'a> SkillMatcher<'a> {
    /// Precompile every skill in `registry`. Invalid intent patterns are
    /// skipped and counted.
    #[must_use]
    pub fn new(registry: &'a SkillRegistry, config: MatchConfig) -> Self {
        let mut skipped_patterns = 0;
        let skills = registry
            .all()
            .map(|record| Compiled::new(record, &mut skipped_patterns))
            .collect();
        if skipped_patterns > 0 {
            tracing::warn!(skipped_patterns, "some intent patterns failed to compile");
        }
        Self {
            config,
            skills,
            skipped_patterns,
        }
    }

    /// Intent patterns dropped because they did not compile.
    #[must_use]
    pub fn skipped_patterns(&self) -> usize {
        self.skipped_patterns
    }

    #[must_use]
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Ranked, thresholded, capped candidates for `query`.
    #[must_use]
    pub fn detect(&self, query: &str) -> Vec<SkillMatch<'a>> {
        let keywords = extract_keywords(query);
        if keywords.is_empty() {
            return Vec::new();
        }
        let query_lower = query.to_lowercase();

        let mut matches: Vec<SkillMatch<'a>> = self
            .skills
            .iter()
            .filter(|skill| skill.record.auto_activate)
            .filter_map(|skill| {
                let score = self.score(skill, &keywords, query, &query_lower);
                let threshold = self.threshold_for(skill.record);
                tracing::debug!(skill = %skill.record.name, score, threshold, "scored");
                (score >= threshold).then_some(SkillMatch {
                    skill: skill.record,
                    score,
                })
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(self.config.activation.max_suggestions);
        matches
    }

    /// Normalized score of the named skill, ignoring thresholds and `auto_activate`.
    #[must_use]
    pub fn score_skill(&self, name: &str, query: &str) -> Option<f64> {
        let skill = self.skills.iter().find(|s| s.record.name == name)?;
        let keywords = extract_keywords(query);
        Some(self.score(skill, &keywords, query, &query.to_lowercase()))
    }

    /// Override beats the record's own threshold, which beats the global one.
    /// A non-positive record threshold counts as unset.
    fn threshold_for(&self, record: &SkillRecord) -> f64 {
        self.config.override_threshold.unwrap_or(if record.confidence_threshold > 0.0 {
            record.confidence_threshold
        } else {
            self.config.activation.confidence_threshold
        })
    }

    fn score(&self, skill: &Compiled<'_>, keywords: &[String], query: &str, query_lower: &str) -> f64 {
        let (raw, max) = self.raw_score(skill, keywords, query, query_lower);
        if max <= 0.0 {
            return 0.0;
        }
        let multiplier = self
            .config
            .activation
            .priority_multipliers
            .for_priority(skill.record.priority);
        raw / max * multiplier
    }

    /// Unnormalized score and the normalizing maximum.
    #[allow(clippy::cast_precision_loss)]
    fn raw_score(
        &self,
        skill: &Compiled<'_>,
        keywords: &[String],
        query: &str,
        query_lower: &str,
    ) -> (f64, f64) {
        if keywords.is_empty() {
            return (0.0, 0.0);
        }
        let w = &self.config.weights;
        let mut score = 0.0;

        if skill.intents.iter().any(|re| re.is_match(query)) {
            score += w.exact_match * 2.0;
        }
        for primary in &skill.primary {
            if primary.is_match(query_lower) {
                score += w.exact_match * 2.0;
            }
        }

        let max = keywords.len() as f64 * w.exact_match;
        if max <= 0.0 {
            return (score, max);
        }

        let mut distinct: Vec<&str> = Vec::with_capacity(keywords.len());
        for kw in keywords {
            if !distinct.contains(&kw.as_str()) {
                distinct.push(kw);
            }
        }

        let mut consumed: HashSet<&str> = HashSet::new();
        for skill_kw in &skill.keywords {
            let parts: Vec<&str> = distinct
                .iter()
                .copied()
                .filter(|uk| uk.chars().count() >= 2 && skill_kw.contains(uk))
                .collect();
            if parts.len() >= 2 {
                score += parts.len() as f64 * w.compound_match;
                consumed.extend(parts);
            }
        }

        for uk in keywords {
            if consumed.contains(uk.as_str()) {
                continue;
            }
            let weight = if skill.keyword_set.contains(uk) {
                w.exact_match
            } else if skill.use_case_terms.contains(uk) {
                w.use_case_match
            } else if skill.description_terms.contains(uk) {
                w.partial_match
            } else if skill.keywords.iter().any(|sk| fuzzy_match(uk, sk)) {
                w.partial_match
            } else if skill.tags.contains(uk) {
                w.tag_match
            } else {
                continue;
            };
            score += weight;
            consumed.insert(uk);
        }

        let query_set: HashSet<&str> = keywords.iter().map(String::as_str).collect();
        for phrase in &skill.use_case_phrases {
            let overlap = phrase
                .iter()
                .filter(|t| query_set.contains(t.as_str()))
                .count();
            if overlap >= 2 {
                score += 0.5 * overlap as f64;
            }
        }

        for uk in keywords {
            for uc in &skill.use_case_terms {
                if shares_stem(uk, uc) {
                    score += 1.0;
                }
            }
        }

        (score, max)
    }
}

/// Substring with similar lengths, or a shared five-character prefix.
fn fuzzy_match(query_kw: &str, skill_kw: &str) -> bool {
    let q_len = query_kw.chars().count();
    let s_len = skill_kw.chars().count();

    let substring = (skill_kw.contains(query_kw) || query_kw.contains(skill_kw))
        && q_len.min(s_len) >= 4
        && q_len.abs_diff(s_len) <= 3;
    let prefix = q_len >= 5
        && s_len >= 5
        && (skill_kw.starts_with(char_prefix(query_kw, 5))
            || query_kw.starts_with(char_prefix(skill_kw, 5)));
    substring || prefix
}

/// One is a prefix of the other and both have at least four characters.
fn shares_stem(a: &str, b: &str) -> bool {
    a.chars().count() >= 4 && b.chars().count() >= 4 && (a.starts_with(b) || b.starts_with(a))
}

fn char_prefix(s: &str, n: usize) -> &str {
    s.char_indices().nth(n).map_or(s, |(i, _)| &s[..i])
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::record::{Priority, SourceTier};

    fn skill(name: &str, keywords: &[&str]) -> SkillRecord {
        SkillRecord::new(name, format!("/skills/{name}"), SourceTier::User)
            .with_keywords("english", keywords)
    }

    fn matcher(registry: &SkillRegistry) -> SkillMatcher<'_> {
        SkillMatcher::new(registry, MatchConfig::default())
    }

    #[test]
    fn primary_keyword_query_is_candidate() {
        let registry = SkillRegistry::from_records([skill("debugger", &["debug", "error", "bug"])]);
        let m = matcher(&registry);
        let found = m.detect("fix bug in payment flow");
        assert_eq!(found.len(), 1);
        // primary "bug" (6) + exact "bug" (3) over 4 keywords * 3
        assert!((found[0].score - 0.75).abs() < 1e-9);
    }

    #[test]
    fn stopword_only_query_has_no_candidates() {
        let registry = SkillRegistry::from_records([skill("any", &["the", "is"])]);
        assert!(matcher(&registry).detect("the a is").is_empty());
    }

    #[test]
    fn respects_auto_activate() {
        let mut record = skill("quiet", &["deploy"]);
        record.auto_activate = false;
        let registry = SkillRegistry::from_records([record]);
        assert!(matcher(&registry).detect("deploy now").is_empty());
    }

    #[test]
    fn override_threshold_beats_record_threshold() {
        let mut record = skill("strict", &["deploy", "release"]);
        record.confidence_threshold = 5.0;
        let registry = SkillRegistry::from_records([record]);

        assert!(matcher(&registry).detect("deploy service").is_empty());

        let config = MatchConfig {
            override_threshold: Some(0.1),
            ..MatchConfig::default()
        };
        assert_eq!(SkillMatcher::new(&registry, config).detect("deploy service").len(), 1);
    }

    #[test]
    fn zero_record_threshold_uses_global() {
        let mut record = skill("loose", &["alpha"]);
        record.confidence_threshold = 0.0;
        let registry = SkillRegistry::from_records([record]);
        let config = MatchConfig {
            activation: crate::config::ActivationConfig {
                confidence_threshold: 100.0,
                ..Default::default()
            },
            ..MatchConfig::default()
        };
        assert!(SkillMatcher::new(&registry, config).detect("alpha beta").is_empty());
    }

    #[test]
    fn sorted_and_capped() {
        let registry = SkillRegistry::from_records([
            skill("a", &["deploy"]),
            skill("b", &["deploy", "docker"]),
            skill("c", &["deploy", "docker", "kubernetes"]),
            skill("d", &["deploy", "docker", "kubernetes", "helm"]),
        ]);
        let found = matcher(&registry).detect("deploy docker kubernetes helm");
        assert_eq!(found.len(), 3);
        assert!(found.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(found[0].skill.name, "d");
    }

    #[test]
    fn priority_multiplier_applied() {
        let mut high = skill("high", &["deploy"]);
        high.priority = Priority::High;
        let registry = SkillRegistry::from_records([high, skill("medium", &["deploy"])]);
        let m = matcher(&registry);
        let h = m.score_skill("high", "deploy").unwrap();
        let med = m.score_skill("medium", "deploy").unwrap();
        assert!((h - med * 1.5).abs() < 1e-9);
    }

    #[test]
    fn scores_can_exceed_one() {
        let registry = SkillRegistry::from_records([skill("deploy", &["deploy"])]);
        let m = matcher(&registry);
        // primary (6) + exact (3) over one keyword (3)
        let found = m.detect("deploy");
        assert!((found[0].score - 3.0).abs() < 1e-9);
        assert!((found[0].display_confidence() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn intent_pattern_adds_double_exact_weight() {
        let mut record = skill("perf", &["zzzz"]);
        record.intent_patterns = vec![r"(make|get).*faster".into()];
        let registry = SkillRegistry::from_records([record]);
        let score = matcher(&registry).score_skill("perf", "Make the page FASTER").unwrap();
        // keywords: page, faster -> max 6; intent adds 6
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_intent_patterns_are_counted_not_fatal() {
        let mut record = skill("bad", &["deploy"]);
        record.intent_patterns = vec!["(unclosed".into(), "ok.*".into(), "[".into()];
        let registry = SkillRegistry::from_records([record]);
        let m = matcher(&registry);
        assert_eq!(m.skipped_patterns(), 2);
        assert_eq!(m.detect("deploy").len(), 1);
    }

    #[test]
    fn compound_match_consumes_parts() {
        let registry = SkillRegistry::from_records([skill("api", &["zzz", "yyy", "restapi"])]);
        let score = matcher(&registry).score_skill("api", "rest api").unwrap();
        // compound: 2 * 2.5 over 2 * 3
        assert!((score - 5.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn description_terms_stand_in_for_missing_keywords() {
        let record = SkillRecord::new("docs", "/d", SourceTier::User)
            .with_description("Generate documentation for modules");
        let registry = SkillRegistry::from_records([record]);
        let score = matcher(&registry).score_skill("docs", "documentation").unwrap();
        // exact against description-derived keyword
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn use_case_signals() {
        let mut record = skill("tests", &["zzzz"]);
        record.use_cases = vec!["writing unit tests".into()];
        let registry = SkillRegistry::from_records([record]);
        let score = matcher(&registry).score_skill("tests", "writing unit tests").unwrap();
        // use-case match 3 * 2.5, overlap 0.5 * 3, stems 1.0 * 3 (writing, unit, tests self-prefix)
        let expected = (7.5 + 1.5 + 3.0) / 9.0;
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn fuzzy_and_tag_matches() {
        let mut record = skill("errs", &["zzzz", "yyyy", "xxxx", "errors"]);
        record.tags = vec!["Observability".into()];
        let registry = SkillRegistry::from_records([record]);
        let m = matcher(&registry);
        // "error" is a substring of "errors": partial
        let fuzzy = m.score_skill("errs", "error").unwrap();
        assert!((fuzzy - 0.5).abs() < 1e-9);
        let tag = m.score_skill("errs", "observability").unwrap();
        assert!((tag - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn fuzzy_rules() {
        assert!(fuzzy_match("validate", "validation"));
        assert!(fuzzy_match("error", "errors"));
        assert!(!fuzzy_match("bug", "debug"));
        assert!(!fuzzy_match("test", "testing-framework"));
    }

    fn word(letters: &'static str) -> impl Strategy<Value = String> {
        proptest::string::string_regex(&format!("[{letters}]{{6}}")).unwrap()
    }

    proptest! {
        #[test]
        fn exact_keyword_strictly_increases_raw_score(
            skill_kws in proptest::collection::btree_set(word("a-m"), 1..6),
            noise in proptest::collection::vec(word("n-z"), 0..4),
            take in 0usize..6,
        ) {
            let skill_kws: Vec<String> = skill_kws.into_iter().collect();
            let refs: Vec<&str> = skill_kws.iter().map(String::as_str).collect();
            let registry = SkillRegistry::from_records([skill("p", &refs)]);
            let m = matcher(&registry);
            let compiled = &m.skills[0];

            let split = take.min(skill_kws.len() - 1);
            let mut query: Vec<String> = skill_kws[..split].to_vec();
            query.extend(noise);
            let added = skill_kws[split].clone();

            let before_q = query.join(" ");
            let (before, _) = m.raw_score(compiled, &query, &before_q, &before_q);

            query.push(added);
            let after_q = query.join(" ");
            let (after, _) = m.raw_score(compiled, &query, &after_q, &after_q);

            prop_assert!(after > before, "before={before} after={after}");
        }
    }
}
