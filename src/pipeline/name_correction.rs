//! Passenger-name correction classifier.
//!
//! Decides whether a proposed name change can be applied without supporting
//! documentation. Both names are normalized (uppercase, honorific tokens
//! stripped, whitespace collapsed), then five heuristics are tried in a fixed
//! priority order; the first one that holds is authoritative. A change that
//! blanks the name is never approved.
//!
//! Orthographic similarity is a capped positional character-difference count:
//! the shorter name is right-padded with spaces and compared position by
//! position, approving at most `max_orthographic_differences` mismatches. It
//! does not realign after an inserted or dropped letter, so "SILVA" → "SSILVA"
//! is not orthographic, while short names with few letters in common can be.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Heuristic that approved a correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionHeuristic {
    Trivial,
    Orthographic,
    Inversion,
    Addition,
    DuplicateRemoval,
    SuffixToggle,
}

impl CorrectionHeuristic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trivial => "trivial",
            Self::Orthographic => "orthographic",
            Self::Inversion => "inversion",
            Self::Addition => "addition",
            Self::DuplicateRemoval => "duplicate_removal",
            Self::SuffixToggle => "suffix_toggle",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionDecision {
    pub approved: bool,
    pub matched_heuristic: Option<CorrectionHeuristic>,
    pub reason: String,
}

impl CorrectionDecision {
    fn approve(heuristic: CorrectionHeuristic, reason: &str) -> Self {
        Self {
            approved: true,
            matched_heuristic: Some(heuristic),
            reason: reason.to_string(),
        }
    }

    fn reject() -> Self {
        Self {
            approved: false,
            matched_heuristic: None,
            reason: "requires supporting documentation".to_string(),
        }
    }
}

/// Token lists and limits for name normalization and classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NameRules {
    pub honorifics: Vec<String>,
    pub generational_suffixes: Vec<String>,
    pub max_orthographic_differences: usize,
}

impl Default for NameRules {
    fn default() -> Self {
        Self {
            honorifics: ["MS", "MR", "MSTR", "JR", "NETO", "FILHO"]
                .map(String::from)
                .to_vec(),
            generational_suffixes: ["JR", "NETO", "FILHO", "SR"].map(String::from).to_vec(),
            max_orthographic_differences: 3,
        }
    }
}

/// Pure, deterministic classifier of an (old, new) name pair.
#[derive(Debug, Clone)]
pub struct NameCorrectionClassifier {
    honorifics: HashSet<String>,
    suffixes: HashSet<String>,
    max_differences: usize,
}

impl Default for NameCorrectionClassifier {
    fn default() -> Self {
        Self::new(&NameRules::default())
    }
}

impl NameCorrectionClassifier {
    pub fn new(rules: &NameRules) -> Self {
        Self {
            honorifics: rules.honorifics.iter().map(|t| t.to_uppercase()).collect(),
            suffixes: rules
                .generational_suffixes
                .iter()
                .map(|t| t.to_uppercase())
                .collect(),
            max_differences: rules.max_orthographic_differences,
        }
    }

    pub fn classify(&self, old_name: &str, new_name: &str) -> CorrectionDecision {
        let old = self.normalize(old_name);
        let new = self.normalize(new_name);

        if old == new {
            return CorrectionDecision::approve(
                CorrectionHeuristic::Trivial,
                "names are identical after normalization",
            );
        }

        let decision = if new.is_empty() {
            CorrectionDecision::reject()
        } else if self.is_orthographic(&old, &new) {
            CorrectionDecision::approve(
                CorrectionHeuristic::Orthographic,
                "spelling differs by only a few letters",
            )
        } else if is_inversion(&old, &new) {
            CorrectionDecision::approve(CorrectionHeuristic::Inversion, "name parts are inverted")
        } else if is_addition(&old, &new) {
            CorrectionDecision::approve(
                CorrectionHeuristic::Addition,
                "name parts were added without removing any",
            )
        } else if is_duplicate_removal(&old, &new) {
            CorrectionDecision::approve(
                CorrectionHeuristic::DuplicateRemoval,
                "repeated name parts were removed",
            )
        } else if self.is_suffix_toggle(&old, &new) {
            CorrectionDecision::approve(
                CorrectionHeuristic::SuffixToggle,
                "generational suffix was added or removed",
            )
        } else {
            CorrectionDecision::reject()
        };

        tracing::debug!(
            approved = decision.approved,
            heuristic = decision.matched_heuristic.map(|h| h.as_str()),
            "Name correction classified"
        );
        decision
    }

    /// Uppercase, drop honorific tokens, collapse whitespace.
    ///
    /// Honorifics are matched on whole parts, whether separated by spaces or
    /// attached with a slash (`SILVA/JR`).
    pub fn normalize(&self, name: &str) -> String {
        name.to_uppercase()
            .split_whitespace()
            .filter_map(|token| {
                let kept: Vec<&str> = token
                    .split('/')
                    .filter(|part| !self.honorifics.contains(*part))
                    .collect();
                if kept.is_empty() {
                    None
                } else {
                    Some(kept.join("/"))
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn is_orthographic(&self, old: &str, new: &str) -> bool {
        positional_differences(old, new, self.max_differences) <= self.max_differences
    }

    fn is_suffix_toggle(&self, old: &str, new: &str) -> bool {
        let has_suffix = |name: &str| name_parts(name).iter().any(|t| self.suffixes.contains(*t));
        has_suffix(old) != has_suffix(new)
    }
}

/// Count positions where the padded names differ, stopping once `cap` is exceeded.
fn positional_differences(a: &str, b: &str, cap: usize) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let len = a.len().max(b.len());

    let mut diffs = 0;
    for i in 0..len {
        let ca = a.get(i).copied().unwrap_or(' ');
        let cb = b.get(i).copied().unwrap_or(' ');
        if ca != cb {
            diffs += 1;
            if diffs > cap {
                break;
            }
        }
    }
    diffs
}

/// Split on spaces and slashes (SURNAME/GIVEN NAMES layout).
fn name_parts(name: &str) -> Vec<&str> {
    name.split(|c: char| c == '/' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect()
}

fn is_inversion(old: &str, new: &str) -> bool {
    let old_parts = name_parts(old);
    let new_parts = name_parts(new);
    old_parts.len() >= 2
        && old_parts.len() == new_parts.len()
        && old_parts.iter().eq(new_parts.iter().rev())
}

fn is_addition(old: &str, new: &str) -> bool {
    let old_set: HashSet<&str> = name_parts(old).into_iter().collect();
    let new_set: HashSet<&str> = name_parts(new).into_iter().collect();
    old_set.is_subset(&new_set) && new_set.len() > old_set.len()
}

fn is_duplicate_removal(old: &str, new: &str) -> bool {
    let mut seen = HashSet::new();
    let deduped: Vec<&str> = old
        .split_whitespace()
        .filter(|token| seen.insert(*token))
        .collect();
    deduped.into_iter().eq(new.split_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(old: &str, new: &str) -> CorrectionDecision {
        NameCorrectionClassifier::default().classify(old, new)
    }

    fn heuristic(old: &str, new: &str) -> Option<CorrectionHeuristic> {
        classify(old, new).matched_heuristic
    }

    #[test]
    fn orthographic_spelling_fix() {
        let d = classify("GONSALES", "GONZALEZ");
        assert!(d.approved);
        assert_eq!(d.matched_heuristic, Some(CorrectionHeuristic::Orthographic));
    }

    #[test]
    fn inverted_surname_and_given_name() {
        let d = classify("LUISA/GALVEZ", "GALVEZ/LUISA");
        assert!(d.approved);
        assert_eq!(d.matched_heuristic, Some(CorrectionHeuristic::Inversion));
    }

    #[test]
    fn added_middle_name() {
        let d = classify("SILVA/ALBERTO", "SILVA/LUIS ALBERTO");
        assert!(d.approved);
        assert_eq!(d.matched_heuristic, Some(CorrectionHeuristic::Addition));
    }

    #[test]
    fn identical_names_are_trivial() {
        for name in ["", "SILVA/ANA", "silva/ana ms", "  A  B  ", "Ñ/Ö", "X/Y/Z W"] {
            let d = classify(name, name);
            assert!(d.approved, "{name:?} should be approved");
            assert_eq!(d.matched_heuristic, Some(CorrectionHeuristic::Trivial));
        }
    }

    #[test]
    fn honorifics_and_case_are_normalized_away() {
        assert_eq!(heuristic("silva/joao  mr", "SILVA/JOAO"), Some(CorrectionHeuristic::Trivial));
        assert_eq!(heuristic("SILVA/JOAO JR", "SILVA/JOAO"), Some(CorrectionHeuristic::Trivial));
    }

    #[test]
    fn slash_attached_honorific_is_stripped() {
        let classifier = NameCorrectionClassifier::default();
        assert_eq!(classifier.normalize("silva/jr"), "SILVA");
        assert_eq!(classifier.normalize("MR/SILVA/JOAO"), "SILVA/JOAO");
        assert_eq!(heuristic("SILVA/JR", "SILVA"), Some(CorrectionHeuristic::Trivial));
    }

    #[test]
    fn blanking_the_name_is_rejected() {
        for old in ["ANA", "SILVA/ANA", "LI"] {
            let d = classify(old, "");
            assert!(!d.approved, "{old:?} -> \"\" should be rejected");
            assert!(d.matched_heuristic.is_none());
        }
        // only honorifics left after normalization
        assert!(!classify("ANA", "MR").approved);
    }

    #[test]
    fn honorific_inside_a_word_is_kept() {
        let classifier = NameCorrectionClassifier::default();
        assert_eq!(classifier.normalize("WILLIAMS/EMMA MS"), "WILLIAMS/EMMA");
    }

    #[test]
    fn duplicate_token_removed() {
        assert_eq!(
            heuristic("MARIA MARIA SOUZA", "MARIA SOUZA"),
            Some(CorrectionHeuristic::DuplicateRemoval)
        );
    }

    #[test]
    fn suffix_dropped_with_reordering() {
        assert_eq!(
            heuristic("OLIVEIRA/BRUNO SR", "BRUNO OLIVEIRA"),
            Some(CorrectionHeuristic::SuffixToggle)
        );
    }

    #[test]
    fn unrelated_name_needs_documentation() {
        let d = classify("SILVA/ANA", "COSTA/BEATRIZ");
        assert!(!d.approved);
        assert!(d.matched_heuristic.is_none());
        assert_eq!(d.reason, "requires supporting documentation");
    }

    #[test]
    fn first_heuristic_in_order_wins() {
        // Also a suffix toggle, but only two positions differ.
        assert_eq!(
            heuristic("SOUZA/PEDRO ANTONIO SR", "SOUZA/PEDRO ANTONIO"),
            Some(CorrectionHeuristic::Orthographic)
        );
        // Also an addition, but within the positional cap.
        assert_eq!(heuristic("LIMA/ANA", "LIMA/ANA B"), Some(CorrectionHeuristic::Orthographic));
    }

    // Pins the positional-count definition where a similarity ratio disagrees.
    #[test]
    fn borderline_pairs_follow_positional_count() {
        // Both definitions approve.
        assert_eq!(heuristic("MARTINES", "MARTINEZ"), Some(CorrectionHeuristic::Orthographic));
        // A ratio (~0.91) would approve; the shifted letters exceed the cap.
        assert!(!classify("SILVA", "SSILVA").approved);
        // A ratio (~0.67) would reject; one position differs.
        assert_eq!(heuristic("ANA", "ANE"), Some(CorrectionHeuristic::Orthographic));
    }

    #[test]
    fn positional_differences_pads_shorter_name() {
        assert_eq!(positional_differences("ABC", "ABC", 3), 0);
        assert_eq!(positional_differences("ABC", "ABCDE", 3), 2);
        assert_eq!(positional_differences("GONSALES", "GONZALEZ", 3), 2);
        // stops counting past the cap
        assert_eq!(positional_differences("AAAAAAAA", "BBBBBBBB", 3), 4);
    }

    #[test]
    fn inversion_needs_two_parts() {
        assert!(!is_inversion("ANA", "ANA"));
        assert!(is_inversion("ANA MARIA", "MARIA/ANA"));
        assert!(!is_inversion("A B C", "C A B"));
    }

    #[test]
    fn classification_is_deterministic() {
        let classifier = NameCorrectionClassifier::default();
        let first = classifier.classify("SILVA/ALBERTO", "SILVA/LUIS ALBERTO");
        for _ in 0..10 {
            assert_eq!(classifier.classify("SILVA/ALBERTO", "SILVA/LUIS ALBERTO"), first);
        }
    }

    #[test]
    fn custom_rules_change_cap() {
        let rules = NameRules {
            max_orthographic_differences: 1,
            ..NameRules::default()
        };
        let classifier = NameCorrectionClassifier::new(&rules);
        assert!(!classifier.classify("GONSALES", "GONZALEZ").approved);
    }
}
