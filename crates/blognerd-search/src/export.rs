//! OPML, CSV and RSS exports of search results.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use blognerd_core::types::{Scope, SearchResult};

/// Items past this are dropped from RSS output.
pub const RSS_MAX_ITEMS: usize = 50;
const SITE_URL: &str = "https://blognerd.app";

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn display_title(r: &SearchResult) -> &str {
    if r.title.is_empty() { &r.basedomain } else { &r.title }
}

/// OPML 1.0 document with one `rss` outline per feed, grouped under the query.
pub fn to_opml(results: &[SearchResult], query: &str, now: DateTime<Utc>) -> String {
    let stamp = now.to_rfc2822();
    let mut doc = String::new();
    doc.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<opml version=\"1.0\">\n<head>\n");
    doc.push_str("<title>BlogNerd Feed Export</title>\n");
    doc.push_str(&format!(
        "<dateCreated>{stamp}</dateCreated>\n<dateModified>{stamp}</dateModified>\n"
    ));
    doc.push_str("<ownerName>blognerd</ownerName>\n</head>\n<body>\n");
    doc.push_str(&format!(
        "<outline text=\"BlogNerd Search Results: {}\" title=\"BlogNerd Search Results\">\n",
        escape_xml(query)
    ));
    for r in results.iter().filter(|r| r.rss_url.is_some()) {
        let title = escape_xml(display_title(r));
        let xml_url = escape_xml(r.rss_url.as_deref().unwrap_or_default());
        doc.push_str(&format!(
            "<outline type=\"rss\" text=\"{title}\" title=\"{title}\" \
             xmlUrl=\"{xml_url}\" htmlUrl=\"{}\"",
            escape_xml(&r.url)
        ));
        if !r.subtitle.is_empty() {
            doc.push_str(&format!(" description=\"{}\"", escape_xml(&r.subtitle)));
        }
        doc.push_str("/>\n");
    }
    doc.push_str("</outline>\n</body>\n</opml>\n");
    doc
}

/// RSS 2.0 channel of page results, newest build stamp `now`. Feed results
/// are skipped and at most [`RSS_MAX_ITEMS`] are emitted.
pub fn to_rss(results: &[SearchResult], query: &str, scope: Scope, now: DateTime<Utc>) -> String {
    let description = match scope {
        Scope::Feeds => format!("RSS feeds matching: {query}"),
        Scope::Pages => format!("Blog posts matching: {query}"),
    };
    let mut doc = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <rss version=\"2.0\" xmlns:atom=\"http://www.w3.org/2005/Atom\">\n<channel>\n",
    );
    let title = format!("BlogNerd Search: {query}");
    doc.push_str(&format!("<title>{}</title>\n", escape_xml(&title)));
    doc.push_str(&format!("<description>{}</description>\n", escape_xml(&description)));
    doc.push_str(&format!("<link>{SITE_URL}/?qry={}</link>\n", escape_xml(query)));
    doc.push_str(&format!("<lastBuildDate>{}</lastBuildDate>\n", now.to_rfc2822()));
    doc.push_str("<generator>BlogNerd</generator>\n<ttl>600</ttl>\n");

    for r in results.iter().take(RSS_MAX_ITEMS).filter(|r| r.rss_url.is_none()) {
        let description =
            if r.subtitle.is_empty() { "No description available" } else { r.subtitle.as_str() };
        let url = escape_xml(&r.url);
        doc.push_str("<item>\n");
        doc.push_str(&format!("<title>{}</title>\n", escape_xml(display_title(r))));
        doc.push_str(&format!("<description>{}</description>\n", escape_xml(description)));
        doc.push_str(&format!("<link>{url}</link>\n<guid isPermaLink=\"true\">{url}</guid>\n"));
        doc.push_str(&format!("<pubDate>{}</pubDate>\n", pub_date(&r.date, now).to_rfc2822()));
        doc.push_str(&format!("<source>{}</source>\n", escape_xml(&r.basedomain)));
        doc.push_str("</item>\n");
    }
    doc.push_str("</channel>\n</rss>\n");
    doc
}

/// Result dates are `DD-MM-YYYY`; anything else publishes at `now`.
fn pub_date(date: &str, now: DateTime<Utc>) -> DateTime<Utc> {
    NaiveDate::parse_from_str(date, "%d-%m-%Y")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map_or(now, |naive| Utc.from_utc_datetime(&naive))
}

/// Quoting follows the usual CSV writer rules: separators, quotes and line
/// breaks force quotes, as do a leading space and a lone `\.`.
fn csv_field(s: &str) -> String {
    let needs_quotes = s == "\\."
        || s.contains([',', '"', '\n', '\r'])
        || s.starts_with(char::is_whitespace);
    if needs_quotes { format!("\"{}\"", s.replace('"', "\"\"")) } else { s.to_string() }
}

/// CSV with header `Title,Description,Website URL,RSS Feed URL`.
pub fn to_csv(results: &[SearchResult]) -> String {
    let mut out = String::from("Title,Description,Website URL,RSS Feed URL\n");
    for r in results.iter().filter(|r| r.rss_url.is_some()) {
        let row = [
            display_title(r),
            r.subtitle.as_str(),
            r.url.as_str(),
            r.rss_url.as_deref().unwrap_or_default(),
        ];
        out.push_str(&row.iter().map(|f| csv_field(f)).collect::<Vec<_>>().join(","));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(title: &str, subtitle: &str) -> SearchResult {
        SearchResult {
            url: "a.dev".into(),
            title: title.into(),
            subtitle: subtitle.into(),
            date: String::new(),
            score: 0.9,
            basedomain: "a.dev".into(),
            rss_url: Some("https://a.dev/feed.xml?x=1&y=2".into()),
            latest_post: None,
        }
    }

    #[test]
    fn opml_escapes_and_lists_feeds() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let doc = to_opml(&[feed("Ana & Co (a.dev)", "Rust <3")], "rust \"feeds\"", now);
        assert!(doc.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(doc.contains("Jan 2024 03:04:05 +0000</dateCreated>"));
        assert!(doc.contains("text=\"BlogNerd Search Results: rust &quot;feeds&quot;\""));
        assert!(doc.contains("title=\"Ana &amp; Co (a.dev)\""));
        assert!(doc.contains("xmlUrl=\"https://a.dev/feed.xml?x=1&amp;y=2\""));
        assert!(doc.contains("description=\"Rust &lt;3\""));
        assert!(doc.trim_end().ends_with("</opml>"));
    }

    #[test]
    fn csv_quotes_when_needed() {
        let csv = to_csv(&[feed("Ana, \"the\" dev", ""), feed("", "plain")]);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "Title,Description,Website URL,RSS Feed URL");
        assert_eq!(lines[1], "\"Ana, \"\"the\"\" dev\",,a.dev,https://a.dev/feed.xml?x=1&y=2");
        assert_eq!(lines[2], "a.dev,plain,a.dev,https://a.dev/feed.xml?x=1&y=2");
    }

    #[test]
    fn csv_quotes_leading_whitespace_and_lone_backslash_dot() {
        assert_eq!(csv_field("\u{a0}nbsp"), "\"\u{a0}nbsp\"");
        assert_eq!(csv_field("\tindented"), "\"\tindented\"");
        assert_eq!(csv_field("\\."), "\"\\.\"");
        assert_eq!(csv_field("a\\.b"), "a\\.b");
        assert_eq!(csv_field("trailing "), "trailing ");
        assert_eq!(csv_field("line\rbreak"), "\"line\rbreak\"");
    }

    fn post(title: &str, subtitle: &str, date: &str) -> SearchResult {
        SearchResult {
            url: "https://a.dev/p?x=1&y=2".into(),
            date: date.into(),
            rss_url: None,
            ..feed(title, subtitle)
        }
    }

    #[test]
    fn rss_channel_lists_posts() {
        let now = Utc.with_ymd_and_hms(2024, 1, 12, 3, 4, 5).unwrap();
        let results = [
            post("Async <Rust>", "tokio & friends", "13-02-2024"),
            post("", "", "not a date"),
            feed("Ana (a.dev)", "a feed"),
        ];
        let doc = to_rss(&results, "rust & co", Scope::Pages, now);
        assert!(doc.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n"));
        assert!(doc.contains("<rss version=\"2.0\" xmlns:atom=\"http://www.w3.org/2005/Atom\">"));
        assert!(doc.contains("<title>BlogNerd Search: rust &amp; co</title>"));
        assert!(doc.contains("<description>Blog posts matching: rust &amp; co</description>"));
        assert!(doc.contains("<link>https://blognerd.app/?qry=rust &amp; co</link>"));
        assert!(doc.contains("<lastBuildDate>Fri, 12 Jan 2024 03:04:05 +0000</lastBuildDate>"));
        assert!(doc.contains("<generator>BlogNerd</generator>\n<ttl>600</ttl>"));

        assert_eq!(doc.matches("<item>").count(), 2, "feed results are skipped");
        assert!(doc.contains("<title>Async &lt;Rust&gt;</title>"));
        assert!(doc.contains("<description>tokio &amp; friends</description>"));
        assert!(doc.contains("<guid isPermaLink=\"true\">https://a.dev/p?x=1&amp;y=2</guid>"));
        assert!(doc.contains("<pubDate>Tue, 13 Feb 2024 00:00:00 +0000</pubDate>"));
        assert!(doc.contains("<title>a.dev</title>"), "empty title falls back to the domain");
        assert!(doc.contains("<description>No description available</description>"));
        assert!(doc.contains("<pubDate>Fri, 12 Jan 2024 03:04:05 +0000</pubDate>"));
        assert!(doc.contains("<source>a.dev</source>"));
        assert!(doc.trim_end().ends_with("</channel>\n</rss>"));
    }

    #[test]
    fn rss_description_follows_scope_and_items_are_capped() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let doc = to_rss(&[], "rss readers", Scope::Feeds, now);
        assert!(doc.contains("<description>RSS feeds matching: rss readers</description>"));
        assert!(!doc.contains("<item>"));

        let many = vec![post("P", "S", "01-01-2024"); RSS_MAX_ITEMS + 5];
        let doc = to_rss(&many, "q", Scope::Pages, now);
        assert_eq!(doc.matches("<item>").count(), RSS_MAX_ITEMS);
    }

    #[test]
    fn page_results_are_not_exported() {
        let mut page = feed("Post", "");
        page.rss_url = None;
        assert_eq!(to_csv(&[page]).lines().count(), 1);
    }
}
