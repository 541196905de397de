//! Glob pattern validation, matching and include/exclude filters
//!
//! User-supplied patterns are checked against [`GlobLimits`] before a matcher
//! is built, so a pattern like `{a,b}{c,d}{e,f}...` cannot blow up matching
//! cost. Matching itself is delegated to `glob-match`.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Limits a glob pattern must stay within.
///
/// Each limit is enforced independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobLimits {
    pub max_length: usize,
    pub max_segments: usize,
    pub max_stars: usize,
    pub max_question_marks: usize,
    /// Upper bound on the number of alternatives brace groups expand into.
    pub max_brace_expansions: usize,
}

impl Default for GlobLimits {
    fn default() -> Self {
        Self {
            max_length: 256,
            max_segments: 16,
            max_stars: 32,
            max_question_marks: 32,
            max_brace_expansions: 24,
        }
    }
}

/// Check whether `pattern` is well-formed and within `limits`.
pub fn is_valid_glob_pattern(pattern: &str, limits: &GlobLimits) -> bool {
    if pattern.is_empty() || pattern.len() > limits.max_length {
        return false;
    }
    if pattern.split('/').filter(|s| !s.is_empty()).count() > limits.max_segments {
        return false;
    }
    if pattern.matches('*').count() > limits.max_stars {
        return false;
    }
    if pattern.matches('?').count() > limits.max_question_marks {
        return false;
    }
    match count_brace_expansions(pattern) {
        Some(count) => count <= limits.max_brace_expansions,
        None => false,
    }
}

/// Number of concrete patterns the brace groups in `pattern` expand into.
///
/// Sequential groups multiply (`{a,b}{c,d}` is 4), a nested group multiplies
/// into the option that contains it (`{a,{b,c}}` is 3). Returns `None` when
/// braces are unbalanced.
pub fn count_brace_expansions(pattern: &str) -> Option<usize> {
    let chars: Vec<char> = pattern.chars().collect();
    let (count, pos) = expand_sequence(&chars, 0, false)?;
    (pos == chars.len()).then_some(count)
}

fn expand_sequence(chars: &[char], mut pos: usize, in_group: bool) -> Option<(usize, usize)> {
    let mut count: usize = 1;
    while pos < chars.len() {
        match chars[pos] {
            '\\' => pos += 2,
            '{' => {
                let (group, next) = expand_group(chars, pos + 1)?;
                count = count.saturating_mul(group);
                pos = next;
            }
            '}' | ',' if in_group => return Some((count, pos)),
            '}' => return None,
            _ => pos += 1,
        }
    }
    Some((count, pos.min(chars.len())))
}

fn expand_group(chars: &[char], mut pos: usize) -> Option<(usize, usize)> {
    let mut total: usize = 0;
    loop {
        let (option, next) = expand_sequence(chars, pos, true)?;
        total = total.saturating_add(option);
        match chars.get(next) {
            Some(',') => pos = next + 1,
            Some('}') => return Some((total, next + 1)),
            _ => return None,
        }
    }
}

/// Matching behaviour for a compiled glob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobOptions {
    pub case_insensitive: bool,
    /// Whether wildcards match path segments starting with a dot.
    pub dot: bool,
}

impl Default for GlobOptions {
    fn default() -> Self {
        Self {
            case_insensitive: true,
            dot: true,
        }
    }
}

/// A validated, reusable glob matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobMatcher {
    source: String,
    pattern: String,
    options: GlobOptions,
    targets_dotfiles: bool,
}

impl GlobMatcher {
    /// Compile `pattern` with default limits.
    pub fn new(pattern: &str, options: GlobOptions) -> Result<Self> {
        Self::with_limits(pattern, options, &GlobLimits::default())
    }

    /// Compile `pattern`, rejecting it if it exceeds `limits`.
    pub fn with_limits(pattern: &str, options: GlobOptions, limits: &GlobLimits) -> Result<Self> {
        if !is_valid_glob_pattern(pattern, limits) {
            return Err(Error::InvalidGlobPattern {
                pattern: pattern.to_string(),
            });
        }
        let trimmed = pattern.trim_start_matches('/');
        let compiled = if options.case_insensitive {
            trimmed.to_lowercase()
        } else {
            trimmed.to_string()
        };
        Ok(Self {
            source: pattern.to_string(),
            targets_dotfiles: trimmed.starts_with('.') || trimmed.contains("/."),
            pattern: compiled,
            options,
        })
    }

    /// The pattern as originally supplied.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, path: &str) -> bool {
        let path = path.trim_start_matches('/');
        if !self.options.dot && !self.targets_dotfiles && has_hidden_segment(path) {
            return false;
        }
        let candidate = if self.options.case_insensitive {
            Cow::Owned(path.to_lowercase())
        } else {
            Cow::Borrowed(path)
        };
        glob_match::glob_match(&self.pattern, &candidate)
    }
}

/// One-shot match; invalid patterns never match.
pub fn match_glob(pattern: &str, path: &str, options: GlobOptions) -> bool {
    GlobMatcher::new(pattern, options).is_ok_and(|m| m.matches(path))
}

fn has_hidden_segment(path: &str) -> bool {
    path.split('/').any(|segment| segment.starts_with('.'))
}

/// Include/exclude pattern lists as they appear in configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl FilterConfig {
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

/// Compiled include/exclude filter over relative paths.
///
/// A path passes when it matches any include pattern (or there are none)
/// and no exclude pattern.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    include: Vec<GlobMatcher>,
    exclude: Vec<GlobMatcher>,
    limits: GlobLimits,
}

impl PathFilter {
    pub fn new(config: &FilterConfig, limits: &GlobLimits) -> Result<Self> {
        let mut filter = Self {
            include: Vec::new(),
            exclude: Vec::new(),
            limits: *limits,
        };
        filter.push(config)?;
        Ok(filter)
    }

    /// A copy of this filter with extra patterns layered on top.
    pub fn extend(&self, extra: &FilterConfig) -> Result<Self> {
        let mut filter = self.clone();
        filter.push(extra)?;
        Ok(filter)
    }

    fn push(&mut self, config: &FilterConfig) -> Result<()> {
        let options = GlobOptions::default();
        for pattern in &config.include {
            self.include
                .push(GlobMatcher::with_limits(pattern, options, &self.limits)?);
        }
        for pattern in &config.exclude {
            self.exclude
                .push(GlobMatcher::with_limits(pattern, options, &self.limits)?);
        }
        Ok(())
    }

    pub fn matches(&self, path: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|m| m.matches(path));
        included && !self.exclude.iter().any(|m| m.matches(path))
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("*.txt", 1)]
    #[case("{a,b}", 2)]
    #[case("{a,b}{c,d}", 4)]
    #[case("{a,{b,c}}", 3)]
    #[case("{a,b}/{c,{d,e}}", 6)]
    #[case("{a,b,c}{d,e,f}{g,h,i}", 27)]
    #[case("x{,y}", 2)]
    fn brace_expansion_counts(#[case] pattern: &str, #[case] expected: usize) {
        assert_eq!(count_brace_expansions(pattern), Some(expected));
    }

    #[rstest]
    #[case("{a,b")]
    #[case("a,b}")]
    #[case("{a,{b,c}")]
    #[case("}{")]
    fn unbalanced_braces_are_rejected(#[case] pattern: &str) {
        assert_eq!(count_brace_expansions(pattern), None);
        assert!(!is_valid_glob_pattern(pattern, &GlobLimits::default()));
    }

    #[test]
    fn escaped_braces_do_not_count() {
        assert_eq!(count_brace_expansions("\\{a,b\\}"), Some(1));
    }
}
