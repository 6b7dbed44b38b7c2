//! Query equivalence checks
//!
//! Generated query text is compared to a trusted baseline after
//! normalization: every line trimmed, blank lines dropped.

use serde::Serialize;

/// Outcome of comparing a generated query to its baseline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryValidation {
    pub matches: bool,
    /// Line-indexed differences (1-based, over normalized text)
    pub differences: Vec<String>,
}

/// Trim each line, drop blank lines and rejoin with `\n`
pub fn normalize(text: &str) -> String {
    normalized_lines(text).join("\n")
}

fn normalized_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Compare `generated` against `baseline`
///
/// # Examples
///
/// ```
/// use catalog_sync::core::query::validator::validate;
///
/// let result = validate("{\n  id\n}", "{\nid\n\n}");
/// assert!(result.matches);
///
/// let result = validate("{\n  id\n  sku\n}", "{\n  id\n  title\n}");
/// assert_eq!(result.differences, vec!["Line 3: expected `title`, got `sku`"]);
/// ```
pub fn validate(generated: &str, baseline: &str) -> QueryValidation {
    let generated = normalized_lines(generated);
    let baseline = normalized_lines(baseline);

    let mut differences = Vec::new();
    for index in 0..generated.len().max(baseline.len()) {
        let got = generated.get(index).copied();
        let expected = baseline.get(index).copied();
        if got != expected {
            differences.push(format!(
                "Line {}: expected {}, got {}",
                index + 1,
                quoted(expected),
                quoted(got)
            ));
        }
    }

    QueryValidation {
        matches: differences.is_empty(),
        differences,
    }
}

fn quoted(line: Option<&str>) -> String {
    match line {
        Some(text) => format!("`{text}`"),
        None => "<missing>".to_string(),
    }
}

/// Metafield aliases in the order they appear in a query
pub fn metafield_aliases(query: &str) -> Vec<String> {
    query.lines().filter_map(metafield_alias).collect()
}

fn metafield_alias(line: &str) -> Option<String> {
    let (alias, rest) = line.trim().split_once(':')?;
    let alias = alias.trim();
    let is_identifier = !alias.is_empty()
        && alias
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    let accessor = rest.trim_start().strip_prefix("metafield")?;
    (is_identifier && accessor.trim_start().starts_with('(')).then(|| alias.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_ignores_indentation_and_blank_lines() {
        let a = "query {\n    id\n\n    sku\n}\n";
        let b = "  query {\n id\n sku\n\n}";
        assert_eq!(normalize(a), normalize(b));
        assert_eq!(normalize(a), "query {\nid\nsku\n}");
    }

    #[test]
    fn test_validate_reports_missing_lines() {
        let result = validate("a\nb", "a\nb\nc");
        assert!(!result.matches);
        assert_eq!(result.differences, vec!["Line 3: expected `c`, got <missing>"]);

        let result = validate("a\nb\nc", "a\nb");
        assert_eq!(result.differences, vec!["Line 3: expected <missing>, got `c`"]);
    }

    #[test]
    fn test_metafield_aliases_in_order() {
        let query = r#"
            season: metafield(namespace: "custom", key: "season") { value }
            sku
            fabric: metafield(namespace: "custom", key: "fabric") { value }
        "#;
        assert_eq!(metafield_aliases(query), vec!["season", "fabric"]);
    }
}
