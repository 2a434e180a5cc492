//! Builds query strings from structured UI options and result affordances.

use serde::{Deserialize, Serialize};

use blognerd_core::types::Scope;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    #[default]
    Pages,
    Sites,
}

/// Dropdown-style options that get appended to the free text as directives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    #[serde(default)]
    pub search_type: SearchType,
    /// `type:` value, e.g. `blog` or `news`.
    #[serde(default)]
    pub content: Option<String>,
    /// Window suffix for `since:last_<time>`, e.g. `week`.
    #[serde(default)]
    pub time: Option<String>,
}

impl SearchOptions {
    pub fn default_scope(&self) -> Scope {
        match self.search_type {
            SearchType::Pages => Scope::Pages,
            SearchType::Sites => Scope::Feeds,
        }
    }

    /// Site searches get `type:feeds`; page searches get the content type and
    /// the time window, when set.
    pub fn compose(&self, query: &str) -> String {
        let mut out = query.trim().to_string();
        match self.search_type {
            SearchType::Sites => out.push_str(" type:feeds"),
            SearchType::Pages => {
                if let Some(content) = self.content.as_deref().filter(|c| !c.is_empty()) {
                    out.push_str(" type:");
                    out.push_str(content);
                }
                if let Some(time) = self.time.as_deref().filter(|t| !t.is_empty()) {
                    out.push_str(" since:last_");
                    out.push_str(time);
                }
            }
        }
        out
    }
}

/// "More like this" for a result URL.
pub fn more_like_this(url: &str) -> String { format!("like:{url}") }

/// "More from this site", newest first.
pub fn more_from_site(domain: &str) -> String { format!("sort:time site:{domain}") }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_options_append_type_and_window() {
        let opts = SearchOptions {
            search_type: SearchType::Pages,
            content: Some("blog".into()),
            time: Some("week".into()),
        };
        assert_eq!(opts.compose("rust"), "rust type:blog since:last_week");
        assert_eq!(opts.default_scope(), Scope::Pages);
    }

    #[test]
    fn site_options_append_feeds_only() {
        let opts = SearchOptions {
            search_type: SearchType::Sites,
            content: Some("blog".into()),
            time: Some("week".into()),
        };
        assert_eq!(opts.compose("rust"), "rust type:feeds");
        assert_eq!(opts.default_scope(), Scope::Feeds);
    }

    #[test]
    fn empty_options_leave_text_alone() {
        assert_eq!(SearchOptions::default().compose("  rust  "), "rust");
    }

    #[test]
    fn affordances() {
        assert_eq!(more_like_this("https://a.dev/p"), "like:https://a.dev/p");
        assert_eq!(more_from_site("a.dev"), "sort:time site:a.dev");
    }
}
