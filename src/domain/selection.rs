/// What the user picked for a submodule when asked which tag to check out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// The suggested tag (override or newest)
    Suggested,
    /// The newest tag
    Latest,
    /// Leave the submodule where it is
    Skip,
    /// Zero-based index into the candidate tags
    ManualIndex(usize),
    /// Input that matched none of the above
    Invalid(String),
}

/// Interpret a raw answer against the candidate tag list.
///
/// Empty input defaults to [`Selection::Suggested`]. Numbers are 1-based, as shown to
/// the user, and must fall within the candidate list.
pub fn resolve_choice(input: &str, candidates: &[String]) -> Selection {
    let answer = input.trim();

    match answer.to_lowercase().as_str() {
        "" | "s" => Selection::Suggested,
        "l" => Selection::Latest,
        "n" => Selection::Skip,
        other => match other.parse::<usize>() {
            Ok(n) if n >= 1 && n <= candidates.len() => Selection::ManualIndex(n - 1),
            _ => Selection::Invalid(answer.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags() -> Vec<String> {
        vec!["v1.2.0".to_string(), "v1.1.0".to_string(), "v1.0.0".to_string()]
    }

    #[test]
    fn test_resolve_default_is_suggested() {
        assert_eq!(resolve_choice("", &tags()), Selection::Suggested);
        assert_eq!(resolve_choice("  \n", &tags()), Selection::Suggested);
        assert_eq!(resolve_choice("S", &tags()), Selection::Suggested);
    }

    #[test]
    fn test_resolve_latest_and_skip() {
        assert_eq!(resolve_choice("l", &tags()), Selection::Latest);
        assert_eq!(resolve_choice("N\n", &tags()), Selection::Skip);
    }

    #[test]
    fn test_resolve_manual_index_is_one_based() {
        assert_eq!(resolve_choice("1", &tags()), Selection::ManualIndex(0));
        assert_eq!(resolve_choice("3", &tags()), Selection::ManualIndex(2));
    }

    #[test]
    fn test_resolve_out_of_range_index() {
        assert_eq!(resolve_choice("0", &tags()), Selection::Invalid("0".to_string()));
        assert_eq!(resolve_choice("4", &tags()), Selection::Invalid("4".to_string()));
        assert_eq!(resolve_choice("1", &[]), Selection::Invalid("1".to_string()));
    }

    #[test]
    fn test_resolve_unrecognized() {
        assert_eq!(
            resolve_choice(" latest ", &tags()),
            Selection::Invalid("latest".to_string())
        );
        assert_eq!(resolve_choice("-1", &tags()), Selection::Invalid("-1".to_string()));
    }
}
