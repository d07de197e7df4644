//! Icon reference matching
//!
//! A [`ReferenceMatcher`] pulls candidate symbol ids out of module source
//! text. The default is a regex with a named capture group.

use regex::Regex;

use crate::error::{Result, SpriteError};

/// Default reference pattern, e.g. `icon: "arrow-left"`
pub const DEFAULT_REFERENCE_PATTERN: &str = r#"(?:name|iconName|icon): "(?P<icon>.+?)""#;

/// Capture group holding the symbol id in the default pattern
pub const DEFAULT_REFERENCE_GROUP: &str = "icon";

/// Extracts candidate symbol ids from source text
pub trait ReferenceMatcher: Send + Sync + std::fmt::Debug {
    /// Every candidate id found in `text`, in order of appearance
    fn find_references<'t>(&self, text: &'t str) -> Vec<&'t str>;
}

/// Regex matcher reading one named capture group
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    regex: Regex,
    group: String,
}

impl RegexMatcher {
    pub fn new(pattern: &str, group: impl Into<String>) -> Result<Self> {
        let group = group.into();
        let regex = Regex::new(pattern)
            .map_err(|e| SpriteError::invalid_pattern("reference", pattern, e))?;

        if !regex.capture_names().flatten().any(|name| name == group) {
            return Err(SpriteError::invalid_pattern(
                "reference",
                pattern,
                format!("no capture group named '{}'", group),
            ));
        }

        Ok(Self { regex, group })
    }
}

impl Default for RegexMatcher {
    fn default() -> Self {
        Self {
            regex: Regex::new(DEFAULT_REFERENCE_PATTERN)
                .expect("default reference pattern compiles"),
            group: DEFAULT_REFERENCE_GROUP.to_string(),
        }
    }
}

impl ReferenceMatcher for RegexMatcher {
    fn find_references<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.regex
            .captures_iter(text)
            .filter_map(|caps| caps.name(&self.group))
            .map(|m| m.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pattern_finds_all_keys() {
        let source = r#"
            <Icon name: "icons-a" />
            const x = { iconName: "icons-b" };
            render({ icon: "icons-c" })
        "#;
        let refs = RegexMatcher::default().find_references(source);
        assert_eq!(refs, vec!["icons-a", "icons-b", "icons-c"]);
    }

    #[test]
    fn test_default_pattern_is_lazy() {
        let refs = RegexMatcher::default().find_references(r#"{ icon: "a", name: "b" }"#);
        assert_eq!(refs, vec!["a", "b"]);
    }

    #[test]
    fn test_custom_pattern() {
        let matcher = RegexMatcher::new(r#"sprite#(?P<id>[a-z-]+)"#, "id").unwrap();
        assert_eq!(
            matcher.find_references(r#"<use href="sprite#arrow-up"/>"#),
            vec!["arrow-up"]
        );
    }

    #[test]
    fn test_missing_group_rejected() {
        let err = RegexMatcher::new(r#"icon: "(.+?)""#, "icon").unwrap_err();
        assert!(matches!(err, SpriteError::InvalidPattern { kind: "reference", .. }));
    }
}
