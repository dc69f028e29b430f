//! Permission rules for the sandbox facade.
//!
//! Rules map glob patterns to an access level. The rule set is append-only
//! at construction and compiled once; lookups walk the compiled rules in
//! descending specificity order.
//!
//! # Specificity
//!
//! Host configurations depend on the exact scoring, so it is part of the
//! contract: a pattern scores `segments * 1000 + per-segment bonus`, where
//! each literal segment adds 10, each wildcard segment (containing `*` or
//! `?` but not equal to `**`) adds 1, and each `**` segment adds 0. The
//! highest score wins; ties resolve by insertion order. Writing the broad
//! rule first therefore still lets a narrower rule override it.

use regex::Regex;

/// Access level granted by a permission rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Reads and writes allowed
    ReadWrite,
    /// Reads allowed, writes rejected
    ReadOnly,
    /// Neither reads nor writes allowed; hidden from glob results
    Excluded,
}

#[derive(Debug)]
struct Rule {
    regex: Regex,
    access: Access,
    specificity: u64,
}

/// Compiled, ordered permission rules with a default for unmatched paths.
#[derive(Debug)]
pub struct RuleSet {
    /// Sorted by descending specificity; stable sort keeps insertion order
    /// for equal scores.
    rules: Vec<Rule>,
    default_access: Access,
}

impl RuleSet {
    /// Compile a rule list. `default_access` applies when no rule matches
    /// (read-write for the standard sandbox, read-only for the read-only
    /// variant).
    pub fn new(rules: &[(String, Access)], default_access: Access) -> Self {
        let mut compiled: Vec<Rule> = rules
            .iter()
            .map(|(pattern, access)| Rule {
                regex: pattern_regex(pattern),
                access: *access,
                specificity: specificity(pattern),
            })
            .collect();
        compiled.sort_by(|a, b| b.specificity.cmp(&a.specificity));
        Self {
            rules: compiled,
            default_access,
        }
    }

    /// Rules that deny everything by default.
    pub fn empty(default_access: Access) -> Self {
        Self {
            rules: Vec::new(),
            default_access,
        }
    }

    /// Resolve the access level for a normalized virtual path.
    pub fn access_for(&self, path: &str) -> Access {
        let path = path.trim_start_matches('/');
        self.rules
            .iter()
            .find(|rule| rule.regex.is_match(path))
            .map(|rule| rule.access)
            .unwrap_or(self.default_access)
    }
}

/// Score a pattern; see the module docs for the exact formula.
fn specificity(pattern: &str) -> u64 {
    let segments: Vec<&str> = pattern
        .trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();
    let mut score = segments.len() as u64 * 1000;
    for segment in segments {
        score += if segment == "**" {
            0
        } else if segment.contains(['*', '?']) {
            1
        } else {
            10
        };
    }
    score
}

/// Translate a rule pattern into an anchored regex: `**` matches across
/// separators, `*` within a segment, `?` a single non-separator character.
fn pattern_regex(pattern: &str) -> Regex {
    let segments: Vec<String> = pattern
        .trim_start_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|segment| {
            if segment == "**" {
                ".*".to_string()
            } else {
                let mut out = String::new();
                for ch in segment.chars() {
                    match ch {
                        '*' => out.push_str("[^/]*"),
                        '?' => out.push_str("[^/]"),
                        other => out.push_str(&regex::escape(&other.to_string())),
                    }
                }
                out
            }
        })
        .collect();
    let source = format!("^{}$", segments.join("/"));
    // The translation only emits escaped literals and fixed classes, so
    // the pattern is always syntactically valid.
    Regex::new(&source).expect("rule pattern translation produces a valid regex")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(list: &[(&str, Access)]) -> RuleSet {
        let owned: Vec<(String, Access)> =
            list.iter().map(|(p, a)| (p.to_string(), *a)).collect();
        RuleSet::new(&owned, Access::ReadWrite)
    }

    #[test]
    fn test_default_when_no_rule_matches() {
        let set = rules(&[]);
        assert_eq!(set.access_for("/anything"), Access::ReadWrite);
    }

    #[test]
    fn test_literal_rule_matches() {
        let set = rules(&[("/etc/passwd", Access::Excluded)]);
        assert_eq!(set.access_for("/etc/passwd"), Access::Excluded);
        assert_eq!(set.access_for("/etc/hosts"), Access::ReadWrite);
    }

    #[test]
    fn test_star_stays_within_segment() {
        let set = rules(&[("/logs/*.log", Access::ReadOnly)]);
        assert_eq!(set.access_for("/logs/app.log"), Access::ReadOnly);
        assert_eq!(set.access_for("/logs/sub/app.log"), Access::ReadWrite);
    }

    #[test]
    fn test_double_star_crosses_segments() {
        let set = rules(&[("/secrets/**", Access::Excluded)]);
        assert_eq!(set.access_for("/secrets/a"), Access::Excluded);
        assert_eq!(set.access_for("/secrets/deep/nested/key"), Access::Excluded);
    }

    #[test]
    fn test_more_specific_rule_wins_regardless_of_order() {
        // Broad rule first; the narrower literal still overrides it.
        let set = rules(&[
            ("/data/**", Access::ReadOnly),
            ("/data/scratch/tmp.txt", Access::ReadWrite),
        ]);
        assert_eq!(set.access_for("/data/other.txt"), Access::ReadOnly);
        assert_eq!(set.access_for("/data/scratch/tmp.txt"), Access::ReadWrite);
    }

    #[test]
    fn test_ties_resolve_by_insertion_order() {
        let set = rules(&[
            ("/a/*", Access::ReadOnly),
            ("/a/*", Access::Excluded),
        ]);
        assert_eq!(set.access_for("/a/x"), Access::ReadOnly);
    }

    #[test]
    fn test_question_mark_matches_one_char() {
        let set = rules(&[("/f?", Access::ReadOnly)]);
        assert_eq!(set.access_for("/fa"), Access::ReadOnly);
        assert_eq!(set.access_for("/fab"), Access::ReadWrite);
    }

    #[test]
    fn test_specificity_scoring() {
        assert_eq!(specificity("/a/b"), 2020);
        assert_eq!(specificity("/a/*"), 2011);
        assert_eq!(specificity("/a/**"), 2010);
        assert_eq!(specificity("/**"), 1000);
    }

    #[test]
    fn test_regex_metachars_are_escaped() {
        let set = rules(&[("/file.txt", Access::Excluded)]);
        assert_eq!(set.access_for("/file.txt"), Access::Excluded);
        // '.' must not act as a regex wildcard
        assert_eq!(set.access_for("/fileXtxt"), Access::ReadWrite);
    }
}
