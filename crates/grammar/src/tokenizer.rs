//! Splits a call name into raw tokens.

use callframe_common::{Error, Result};

/// Lower-cases `name` and splits it strictly on `_`.
///
/// Empty tokens (leading, trailing or doubled separators) are rejected:
/// the grammar has no way to give them meaning.
pub fn tokenize(name: &str) -> Result<Vec<String>> {
    if name.is_empty() {
        return Err(Error::malformed(name, "empty call name"));
    }
    let lowered = name.to_lowercase();
    let tokens: Vec<String> = lowered.split('_').map(str::to_string).collect();
    if tokens.iter().any(String::is_empty) {
        return Err(Error::malformed(name, "empty token between separators"));
    }
    tracing::trace!(?tokens, "tokenized call name");
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_lowercases() {
        let tokens = tokenize("Filter_Age_GreaterThan_30").unwrap();
        assert_eq!(tokens, vec!["filter", "age", "greaterthan", "30"]);
    }

    #[test]
    fn keeps_decimal_points_inside_tokens() {
        let tokens = tokenize("filter_price_lt_9.5").unwrap();
        assert_eq!(tokens.last().map(String::as_str), Some("9.5"));
    }

    #[test]
    fn rejects_empty_tokens() {
        assert!(matches!(tokenize(""), Err(Error::MalformedSpan { .. })));
        assert!(matches!(tokenize("filter__age"), Err(Error::MalformedSpan { .. })));
        assert!(matches!(tokenize("_filter"), Err(Error::MalformedSpan { .. })));
        assert!(matches!(tokenize("select_a_"), Err(Error::MalformedSpan { .. })));
    }
}
