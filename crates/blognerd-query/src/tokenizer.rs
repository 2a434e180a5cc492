//! Single left-to-right scan that locates directive spans in the raw query.

use std::ops::Range;

use crate::lexicon::DirectiveKey;

/// A recognized directive and where it sits in the raw input.
///
/// For `DirectiveKey::Negation` the value is the whole bracket span, e.g.
/// `<helm charts>`, or `<helm` when the bracket is never closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveMatch<'a> {
    pub key: DirectiveKey,
    pub value: &'a str,
    pub span: Range<usize>,
}

/// Find every directive in `raw`, in input order.
///
/// Tokens are whitespace-separated. A `<` at a token start opens a negation
/// that runs to the next `>` (across whitespace); without a `>` only the
/// current token is consumed. Tokens with an unknown `key:` prefix are text.
pub fn scan(raw: &str) -> Vec<DirectiveMatch<'_>> {
    let mut found = Vec::new();
    let mut pos = 0;

    while let Some(offset) = raw[pos..].find(|c: char| !c.is_whitespace()) {
        let start = pos + offset;
        let end = if raw[start..].starts_with('<') {
            let end = match raw[start + 1..].find('>') {
                Some(close) => start + 1 + close + 1,
                None => token_end(raw, start),
            };
            found.push(DirectiveMatch {
                key: DirectiveKey::Negation,
                value: &raw[start..end],
                span: start..end,
            });
            end
        } else {
            let end = token_end(raw, start);
            if let Some((key, value)) = DirectiveKey::split_token(&raw[start..end]) {
                found.push(DirectiveMatch { key, value, span: start..end });
            }
            end
        };
        pos = end;
    }

    found
}

fn token_end(raw: &str, from: usize) -> usize {
    raw[from..].find(char::is_whitespace).map_or(raw.len(), |o| from + o)
}

/// Remove `spans` (ascending, non-overlapping) from `raw`, each together with
/// one trailing whitespace character, and trim the result.
pub fn strip_spans<'a, I>(raw: &str, spans: I) -> String
where
    I: IntoIterator<Item = &'a Range<usize>>,
{
    let mut out = String::with_capacity(raw.len());
    let mut kept_from = 0;
    for span in spans {
        out.push_str(&raw[kept_from..span.start]);
        let mut end = span.end;
        if let Some(c) = raw[end..].chars().next().filter(|c| c.is_whitespace()) {
            end += c.len_utf8();
        }
        kept_from = end;
    }
    out.push_str(&raw[kept_from..]);
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(raw: &str) -> Vec<(DirectiveKey, &str)> {
        scan(raw).into_iter().map(|m| (m.key, m.value)).collect()
    }

    #[test]
    fn finds_prefixed_directives_in_order() {
        assert_eq!(
            keys("rust since:last_week async site:blog.rust-lang.org"),
            vec![(DirectiveKey::Since, "last_week"), (DirectiveKey::Site, "blog.rust-lang.org")]
        );
    }

    #[test]
    fn unknown_keys_are_text() {
        assert!(scan("author:bob https://example.com").is_empty());
    }

    #[test]
    fn negation_spans_whitespace() {
        let found = scan("kubernetes <helm charts> tips");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value, "<helm charts>");
        assert_eq!(found[0].span, 11..24);
    }

    #[test]
    fn unclosed_negation_consumes_one_token() {
        assert_eq!(keys("kubernetes <helm charts"), vec![(DirectiveKey::Negation, "<helm")]);
    }

    #[test]
    fn bracket_mid_token_is_text() {
        assert!(scan("a<b>c").is_empty());
    }

    #[test]
    fn strip_removes_one_trailing_space() {
        let raw = "since:last_week rust  async lang:en";
        let spans: Vec<_> = scan(raw).into_iter().map(|m| m.span).collect();
        assert_eq!(strip_spans(raw, &spans), "rust  async");
    }

    #[test]
    fn strip_handles_multibyte_text() {
        let raw = "café lang:fr crème";
        let spans: Vec<_> = scan(raw).into_iter().map(|m| m.span).collect();
        assert_eq!(strip_spans(raw, &spans), "café crème");
    }
}
