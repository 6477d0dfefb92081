//! Pattern Matcher (component C): compiles operator-configured conflict
//! patterns once, then classifies role lists against them.

use regex::Regex;

/// A single configured pattern together with its compiled, case-insensitive
/// matcher. Patterns are substrings/regex fragments — `"prod"` matches
/// `"production-admin"` and `"non-prod-reader"` alike; operators who need
/// anchored matching supply their own anchors.
struct CompiledPattern {
    text: String,
    regex: Regex,
}

/// Compiles a set of conflict patterns once at construction and classifies
/// role lists against them. Compile failure aborts startup (§4.H).
pub struct PatternMatcher {
    patterns: Vec<CompiledPattern>,
}

/// The result of classifying a role list: one entry per configured pattern,
/// in configured order, holding the roles (in input order) that matched it.
/// A role may appear under more than one pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    entries: Vec<(String, Vec<String>)>,
}

impl Classification {
    /// Number of patterns with at least one matching role.
    #[must_use]
    pub fn populated_count(&self) -> usize {
        self.entries.iter().filter(|(_, roles)| !roles.is_empty()).count()
    }

    /// Iterate the populated `(pattern, matching roles)` pairs, in the
    /// configured pattern order — the ordering diagnostics rely on.
    pub fn populated(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .filter(|(_, roles)| !roles.is_empty())
            .map(|(pattern, roles)| (pattern.as_str(), roles.as_slice()))
    }

    /// True iff two or more distinct patterns matched — the definition of a
    /// conflict (§4.C).
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.populated_count() >= 2
    }
}

impl PatternMatcher {
    /// Compile `patterns` in order. Patterns are indexed by their original
    /// string so diagnostics name exactly what the operator configured.
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut compiled = Vec::new();
        for text in patterns {
            let text = text.into();
            let regex = regex::RegexBuilder::new(&text).case_insensitive(true).build()?;
            compiled.push(CompiledPattern { text, regex });
        }
        Ok(Self { patterns: compiled })
    }

    /// Classify `roles` into a `pattern -> [matching roles]` map, preserving
    /// the order of `roles` within each pattern's bucket. A role matching no
    /// configured pattern is simply absent from every bucket.
    #[must_use]
    pub fn classify(&self, roles: &[String]) -> Classification {
        let entries = self
            .patterns
            .iter()
            .map(|p| {
                let matched: Vec<String> =
                    roles.iter().filter(|role| p.regex.is_match(role)).cloned().collect();
                (p.text.clone(), matched)
            })
            .collect();
        Classification { entries }
    }

    /// True iff `role` matches at least one configured pattern.
    #[must_use]
    pub fn matches_any(&self, role: &str) -> bool {
        self.patterns.iter().any(|p| p.regex.is_match(role))
    }

    /// The configured patterns, in order, as plain strings — used to render
    /// "<p1> vs <p2> vs …" diagnostics independent of which roles matched.
    #[must_use]
    pub fn pattern_names(&self) -> Vec<&str> {
        self.patterns.iter().map(|p| p.text.as_str()).collect()
    }
}
