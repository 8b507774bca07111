use crate::domain::version::SemanticVersion;
use crate::error::{RelsyncError, Result};
use std::cmp::Ordering;

/// Tag naming pattern (e.g., "v{version}", "{version}+chart{chart}")
#[derive(Debug, Clone)]
pub struct TagPattern {
    pub pattern: String,
}

impl TagPattern {
    /// Create a new tag pattern
    pub fn new(pattern: impl Into<String>) -> Self {
        TagPattern {
            pattern: pattern.into(),
        }
    }

    /// Format a version according to pattern
    /// Example: pattern="v{version}", version="1.2.3" -> "v1.2.3"
    pub fn format(&self, version: &str) -> String {
        self.pattern.replace("{version}", version)
    }

    /// Extract the version from a tag that matches this pattern
    pub fn extract(&self, tag: &str) -> Result<Option<SemanticVersion>> {
        if !self.pattern.contains("{version}") {
            return Err(RelsyncError::config(
                "Tag pattern must contain {version} placeholder",
            ));
        }

        let escaped = regex::escape(&self.pattern);
        let regex_pattern = escaped.replace(r"\{version\}", r"(?P<version>.+)");
        let re = regex::Regex::new(&format!("^{}$", regex_pattern))
            .map_err(|e| RelsyncError::config(format!("Invalid tag pattern: {}", e)))?;

        Ok(re
            .captures(tag)
            .and_then(|caps| caps.name("version"))
            .and_then(|m| SemanticVersion::parse(m.as_str()).ok()))
    }

    /// Validate if a tag matches this pattern with a parseable version
    pub fn matches(&self, tag: &str) -> Result<bool> {
        Ok(self.extract(tag)?.is_some())
    }
}

/// Order tags newest first: version tags by precedence, then anything else by name.
pub fn sort_tags_newest_first(tags: &mut [String]) {
    tags.sort_by(|a, b| {
        match (SemanticVersion::parse(a).ok(), SemanticVersion::parse(b).ok()) {
            (Some(va), Some(vb)) => vb.cmp(&va).then_with(|| b.cmp(a)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => b.cmp(a),
        }
    });
}
