//! Pure record merging used while building the registry.
//!
//! Neither function touches the filesystem; both return a new record.

use crate::record::{DEFAULT_CONFIDENCE_THRESHOLD, Enforcement, Priority, SkillRecord};

/// Merge an artifact-sourced record into an existing record of the same name.
///
/// Lists, keyword languages, the description, and a default enforcement level
/// are filled only where `existing` is empty. Non-default priority, a
/// non-default threshold, and `auto_activate: false` override. Identity
/// (name, path, tier) stays with `existing`.
#[must_use]
pub fn merge_artifact(existing: &SkillRecord, incoming: &SkillRecord) -> SkillRecord {
    let mut merged = existing.clone();
    fill_empty(&mut merged, incoming);

    if merged.enforcement == Enforcement::default() {
        merged.enforcement = incoming.enforcement;
    }
    if incoming.priority != Priority::default() {
        merged.priority = incoming.priority;
    }
    if (incoming.confidence_threshold - DEFAULT_CONFIDENCE_THRESHOLD).abs() > f64::EPSILON {
        merged.confidence_threshold = incoming.confidence_threshold;
    }
    if !incoming.auto_activate {
        merged.auto_activate = false;
    }
    merged
}

/// Merge a document from a higher-priority tier over a lower-tier record.
///
/// The incoming document wins wherever it has content and takes over identity
/// and scalar settings; fields it leaves empty keep the lower tier's values.
#[must_use]
pub fn merge_document(existing: &SkillRecord, incoming: &SkillRecord) -> SkillRecord {
    let mut merged = incoming.clone();
    fill_empty(&mut merged, existing);
    merged
}

fn fill_empty(target: &mut SkillRecord, source: &SkillRecord) {
    if target.description.trim().is_empty() && !source.description.trim().is_empty() {
        target.description.clone_from(&source.description);
    }
    for (lang, terms) in source.keywords.iter() {
        if target.keywords.get(lang).is_empty() && !terms.is_empty() {
            target.keywords.set(lang, terms.to_vec());
        }
    }
    if target.tags.is_empty() {
        target.tags.clone_from(&source.tags);
    }
    if target.use_cases.is_empty() {
        target.use_cases.clone_from(&source.use_cases);
    }
    if target.intent_patterns.is_empty() {
        target.intent_patterns.clone_from(&source.intent_patterns);
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::record::{Keywords, SourceTier};

    fn doc() -> SkillRecord {
        SkillRecord::new("debug-helper", "/p/debug-helper", SourceTier::Project)
            .with_keywords("english", &["debug", "error"])
            .with_description("Debugging")
    }

    #[test]
    fn artifact_fills_empty_lists() {
        let mut incoming = SkillRecord::new("debug-helper", "/u", SourceTier::User);
        incoming.tags = vec!["diagnostics".into()];
        incoming.use_cases = vec!["fixing crashes".into()];
        incoming.keywords = Keywords::single("english", vec!["other".into()]);

        let merged = merge_artifact(&doc(), &incoming);
        assert_eq!(merged.tags, vec!["diagnostics"]);
        assert_eq!(merged.use_cases, vec!["fixing crashes"]);
        assert_eq!(merged.keywords.get("english"), ["debug", "error"]);
        assert_eq!(merged.path, doc().path);
        assert_eq!(merged.source, SourceTier::Project);
    }

    #[test]
    fn artifact_adds_missing_language() {
        let mut incoming = SkillRecord::new("debug-helper", "/u", SourceTier::User);
        incoming.keywords = Keywords::single("korean", vec!["디버그".into()]);
        let merged = merge_artifact(&doc(), &incoming);
        assert_eq!(merged.keywords.get("korean"), ["디버그"]);
        assert_eq!(merged.keywords.get("english"), ["debug", "error"]);
    }

    #[test]
    fn artifact_overrides_non_default_scalars() {
        let mut incoming = SkillRecord::new("debug-helper", "/u", SourceTier::User);
        incoming.priority = Priority::High;
        incoming.confidence_threshold = 0.8;
        incoming.auto_activate = false;

        let merged = merge_artifact(&doc(), &incoming);
        assert_eq!(merged.priority, Priority::High);
        assert!((merged.confidence_threshold - 0.8).abs() < f64::EPSILON);
        assert!(!merged.auto_activate);
    }

    #[test]
    fn artifact_defaults_do_not_override() {
        let mut existing = doc();
        existing.priority = Priority::Low;
        existing.confidence_threshold = 0.9;
        existing.enforcement = Enforcement::Required;

        let incoming = SkillRecord::new("debug-helper", "/u", SourceTier::User);
        let merged = merge_artifact(&existing, &incoming);
        assert_eq!(merged, existing);
    }

    #[test]
    fn document_takes_identity_and_keeps_lower_content() {
        let mut lower = SkillRecord::new("debug-helper", "/u/debug-helper", SourceTier::User);
        lower.tags = vec!["diagnostics".into()];
        lower.description = "from user tier".into();

        let merged = merge_document(&lower, &doc());
        assert_eq!(merged.source, SourceTier::Project);
        assert_eq!(merged.path, doc().path);
        assert_eq!(merged.description, "Debugging");
        assert_eq!(merged.tags, vec!["diagnostics"]);
        assert_eq!(merged.keywords.get("english"), ["debug", "error"]);
    }

    fn arb_list() -> impl Strategy<Value = Vec<String>> {
        proptest::collection::vec("[a-z]{1,6}", 0..3)
    }

    fn arb_record(tier: SourceTier) -> impl Strategy<Value = SkillRecord> {
        (
            "[a-z ]{0,8}",
            arb_list(),
            arb_list(),
            arb_list(),
            arb_list(),
            0usize..3,
            any::<bool>(),
            prop_oneof![Just(0.5f64), 0.0f64..1.0],
        )
            .prop_map(
                move |(description, kw, tags, use_cases, patterns, prio, auto, threshold)| {
                    let mut r = SkillRecord::new("s", "/s", tier);
                    r.description = description;
                    r.keywords = Keywords::single("english", kw);
                    r.tags = tags;
                    r.use_cases = use_cases;
                    r.intent_patterns = patterns;
                    r.priority = [Priority::High, Priority::Medium, Priority::Low][prio];
                    r.auto_activate = auto;
                    r.confidence_threshold = threshold;
                    r
                },
            )
    }

    proptest! {
        #[test]
        fn artifact_never_erases_non_empty_fields(
            existing in arb_record(SourceTier::Project),
            incoming in arb_record(SourceTier::User),
        ) {
            let merged = merge_artifact(&existing, &incoming);
            if !existing.description.trim().is_empty() {
                prop_assert_eq!(&merged.description, &existing.description);
            }
            if !existing.tags.is_empty() {
                prop_assert_eq!(&merged.tags, &existing.tags);
            }
            if !existing.use_cases.is_empty() {
                prop_assert_eq!(&merged.use_cases, &existing.use_cases);
            }
            if !existing.intent_patterns.is_empty() {
                prop_assert_eq!(&merged.intent_patterns, &existing.intent_patterns);
            }
            if !existing.keywords.get("english").is_empty() {
                prop_assert_eq!(merged.keywords.get("english"), existing.keywords.get("english"));
            }
            if incoming.priority == Priority::Medium {
                prop_assert_eq!(merged.priority, existing.priority);
            }
            if incoming.auto_activate {
                prop_assert_eq!(merged.auto_activate, existing.auto_activate);
            }
        }

        #[test]
        fn document_merge_keeps_every_non_empty_field(
            lower in arb_record(SourceTier::User),
            higher in arb_record(SourceTier::Project),
        ) {
            let merged = merge_document(&lower, &higher);
            prop_assert_eq!(merged.tags.is_empty(), lower.tags.is_empty() && higher.tags.is_empty());
            prop_assert_eq!(
                merged.use_cases.is_empty(),
                lower.use_cases.is_empty() && higher.use_cases.is_empty()
            );
            prop_assert_eq!(
                merged.keywords.is_empty(),
                lower.keywords.is_empty() && higher.keywords.is_empty()
            );
            prop_assert_eq!(merged.source, SourceTier::Project);
        }
    }
}
