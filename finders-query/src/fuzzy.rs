//! Fuzzy text matching shared by the in-memory and SQL sources.
//!
//! A query is split into words; double-quoted phrases stay whole and words
//! shorter than [`MIN_CHARS_FOR_PARTIAL_MATCHING`] are dropped. A column
//! matches when it contains every remaining word, case-insensitively. When no
//! word survives, the column must equal the whole query case-insensitively.

pub const MIN_CHARS_FOR_PARTIAL_MATCHING: usize = 3;

/// How a query is matched against a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTerms {
    /// Substring match on every word.
    Words(Vec<String>),
    /// Case-insensitive equality with the whole query.
    Exact(String),
}

pub fn terms(query: &str) -> SearchTerms {
    let words = select_fuzzy_words(query);
    if words.is_empty() {
        SearchTerms::Exact(query.to_string())
    } else {
        SearchTerms::Words(words)
    }
}

/// Splits a query into partial-match words, keeping quoted phrases intact.
pub fn select_fuzzy_words(query: &str) -> Vec<String> {
    let mut unquoted = String::with_capacity(query.len());
    let mut quoted = Vec::new();
    let mut rest = query;

    while let Some(open) = rest.find('"') {
        let after_open = &rest[open + 1..];
        match after_open.find('"') {
            Some(close) => {
                unquoted.push_str(&rest[..open]);
                quoted.push(after_open[..close].to_string());
                rest = &after_open[close + 1..];
            }
            None => break,
        }
    }
    unquoted.push_str(rest);

    unquoted
        .split_whitespace()
        .map(str::to_string)
        .chain(quoted)
        .filter(|word| word.chars().count() >= MIN_CHARS_FOR_PARTIAL_MATCHING)
        .collect()
}

/// Whether `text` matches `query` under the fuzzy rules.
pub fn matches(text: &str, query: &str) -> bool {
    let haystack = text.to_lowercase();
    match terms(query) {
        SearchTerms::Words(words) => words
            .iter()
            .all(|word| haystack.contains(&word.to_lowercase())),
        SearchTerms::Exact(query) => haystack == query.to_lowercase(),
    }
}

/// Escapes `LIKE` wildcards so user input only matches literally.
pub fn sanitize_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn keeps_quoted_phrases_and_drops_short_words() {
        assert_eq!(
            select_fuzzy_words(r#"deploy "rollback plan" to k8s"#),
            vec!["deploy", "k8s", "rollback plan"]
        );
        assert!(select_fuzzy_words("a is ok").is_empty());
    }

    #[test]
    fn unbalanced_quotes_are_left_in_place() {
        assert_eq!(select_fuzzy_words(r#"say "hello"#), vec!["say", "\"hello"]);
    }

    #[test_case("Deploy script for staging", "staging deploy" => true; "all words in any order")]
    #[test_case("Deploy script", "staging deploy" => false; "missing word")]
    #[test_case("Rollback plan v2", r#""rollback plan""# => true; "quoted phrase")]
    #[test_case("plan for rollback", r#""rollback plan""# => false; "quoted phrase out of order")]
    #[test_case("Go", "go" => true; "short query equal")]
    #[test_case("Golang", "go" => false; "short query needs exact match")]
    fn fuzzy_matching(text: &str, query: &str) -> bool {
        matches(text, query)
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(sanitize_like(r"100%_a\b"), r"100\%\_a\\b");
    }
}
