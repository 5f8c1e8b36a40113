//! Static lookup data used by the aggregator: page titles and referrer
//! categories. Both are plain data so deployments can extend them from a JSON
//! file without touching code.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Source label for events without a referrer.
pub const DIRECT_SOURCE: &str = "Direct";
/// Source label for referrers that match no rule.
pub const OTHER_SOURCE: &str = "Other";

/// One referrer category: a label and the lowercase substrings that select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferrerRule {
    pub label: String,
    pub patterns: Vec<String>,
}

impl ReferrerRule {
    fn new(label: &str, patterns: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn matches(&self, lowered: &str) -> bool {
        self.patterns.iter().any(|p| lowered.contains(p.as_str()))
    }
}

/// A dynamic-route family, e.g. every path under `/free/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagePrefix {
    pub prefix: String,
    pub title: String,
}

/// Path → title and referrer → source mappings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub page_titles: HashMap<String, String>,
    /// Checked in order, before the exact map.
    pub page_prefixes: Vec<PagePrefix>,
    /// Checked in order, before `social_platforms`.
    pub search_engines: Vec<ReferrerRule>,
    pub social_platforms: Vec<ReferrerRule>,
    /// Rules from the override file, checked after the built-in ones.
    pub extra_referrers: Vec<ReferrerRule>,
}

/// On-disk shape of a catalog override file. Every section is optional and
/// merges over the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogFile {
    pub page_titles: HashMap<String, String>,
    pub page_prefixes: Vec<PagePrefix>,
    pub referrer_rules: Vec<ReferrerRule>,
}

impl Default for Catalog {
    fn default() -> Self {
        let page_titles = [
            ("/", "Home"),
            ("/free", "Free Board"),
            ("/it-ai", "IT & AI"),
            ("/login", "Log In"),
            ("/signup", "Sign Up"),
            ("/admin", "Admin Dashboard"),
            ("/admin/analytics", "Visitor Analytics"),
            ("/admin/members", "Members"),
            ("/admin/saas-spark", "SaaS Spark"),
            ("/profile", "Profile"),
            ("/settings", "Settings"),
        ]
        .into_iter()
        .map(|(path, title)| (path.to_string(), title.to_string()))
        .collect();

        let page_prefixes = [
            ("/it-ai/", "IT & AI Article"),
            ("/free/", "Free Board Post"),
            ("/profile/", "User Profile"),
        ]
        .into_iter()
        .map(|(prefix, title)| PagePrefix {
            prefix: prefix.to_string(),
            title: title.to_string(),
        })
        .collect();

        Self {
            page_titles,
            page_prefixes,
            search_engines: vec![
                ReferrerRule::new("Google", &["google"]),
                ReferrerRule::new("Naver", &["naver"]),
                ReferrerRule::new("Daum", &["daum"]),
                ReferrerRule::new("Bing", &["bing"]),
            ],
            social_platforms: vec![
                ReferrerRule::new("Instagram", &["instagram"]),
                ReferrerRule::new("Facebook", &["facebook", "fb."]),
                ReferrerRule::new("X (Twitter)", &["twitter", "t.co", "x.com"]),
                ReferrerRule::new("YouTube", &["youtube"]),
                ReferrerRule::new("LinkedIn", &["linkedin"]),
                ReferrerRule::new("Threads", &["threads"]),
            ],
            extra_referrers: Vec::new(),
        }
    }
}

impl Catalog {
    /// Load the defaults and merge the JSON override file at `path` over them.
    ///
    /// Exact titles replace same-path defaults; prefixes and referrer rules
    /// are appended after the built-in ones so the defaults keep priority.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let file: CatalogFile = serde_json::from_str(&raw)?;
        let mut catalog = Self::default();
        catalog.merge(file);
        tracing::info!(
            path = %path.as_ref().display(),
            page_titles = catalog.page_titles.len(),
            page_prefixes = catalog.page_prefixes.len(),
            referrer_rules = catalog.extra_referrers.len(),
            "Catalog overrides loaded"
        );
        Ok(catalog)
    }

    pub fn merge(&mut self, file: CatalogFile) {
        self.page_titles.extend(file.page_titles);
        self.page_prefixes.extend(file.page_prefixes);
        self.extra_referrers.extend(file.referrer_rules);
    }

    /// Human-readable title for a path; falls back to the raw path.
    pub fn page_title(&self, path: &str) -> String {
        if let Some(p) = self
            .page_prefixes
            .iter()
            .find(|p| path.starts_with(p.prefix.as_str()))
        {
            return p.title.clone();
        }
        self.page_titles
            .get(path)
            .cloned()
            .unwrap_or_else(|| path.to_string())
    }

    /// Traffic-source label for a raw referrer URL.
    ///
    /// Case-insensitive substring match, first hit wins: search engines, then
    /// social platforms, then rules loaded from the override file, then
    /// [`OTHER_SOURCE`]. A missing or empty referrer is
    /// [`DIRECT_SOURCE`].
    pub fn categorize_referrer(&self, referrer: Option<&str>) -> String {
        let Some(referrer) = referrer.filter(|r| !r.is_empty()) else {
            return DIRECT_SOURCE.to_string();
        };
        let lowered = referrer.to_lowercase();
        self.search_engines
            .iter()
            .chain(self.social_platforms.iter())
            .chain(self.extra_referrers.iter())
            .find(|rule| rule.matches(&lowered))
            .map(|rule| rule.label.clone())
            .unwrap_or_else(|| OTHER_SOURCE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_titles_resolve() {
        let c = Catalog::default();
        assert_eq!(c.page_title("/"), "Home");
        assert_eq!(c.page_title("/free"), "Free Board");
        assert_eq!(c.page_title("/admin/analytics"), "Visitor Analytics");
    }

    #[test]
    fn dynamic_routes_use_prefix_titles() {
        let c = Catalog::default();
        assert_eq!(c.page_title("/free/123"), "Free Board Post");
        assert_eq!(c.page_title("/it-ai/rust-tips"), "IT & AI Article");
        assert_eq!(c.page_title("/profile/alice"), "User Profile");
    }

    #[test]
    fn unknown_path_falls_back_to_raw_path() {
        assert_eq!(Catalog::default().page_title("/pricing"), "/pricing");
    }

    #[test]
    fn referrer_categories() {
        let c = Catalog::default();
        assert_eq!(c.categorize_referrer(None), "Direct");
        assert_eq!(c.categorize_referrer(Some("")), "Direct");
        assert_eq!(c.categorize_referrer(Some("https://www.Google.com/search?q=x")), "Google");
        assert_eq!(c.categorize_referrer(Some("https://m.search.naver.com/")), "Naver");
        assert_eq!(c.categorize_referrer(Some("https://l.facebook.com/l.php")), "Facebook");
        assert_eq!(c.categorize_referrer(Some("https://t.co/abc")), "X (Twitter)");
        assert_eq!(c.categorize_referrer(Some("https://www.threads.net/")), "Threads");
        assert_eq!(c.categorize_referrer(Some("https://news.ycombinator.com/")), "Other");
    }

    #[test]
    fn search_engines_take_priority_over_social() {
        // Matches both "google" and "youtube"; search rules are checked first.
        let c = Catalog::default();
        assert_eq!(
            c.categorize_referrer(Some("https://www.google.com/url?q=https://youtube.com")),
            "Google"
        );
    }

    #[test]
    fn merge_extends_defaults() {
        let mut c = Catalog::default();
        let file: CatalogFile = serde_json::from_str(
            r#"{
                "page_titles": {"/pricing": "Pricing", "/": "Front Page"},
                "page_prefixes": [{"prefix": "/docs/", "title": "Docs"}],
                "referrer_rules": [
                    {"label": "DuckDuckGo", "patterns": ["duckduckgo"]},
                    {"label": "Search Partner", "patterns": ["google"]}
                ]
            }"#,
        )
        .expect("parse catalog");
        c.merge(file);

        assert_eq!(c.page_title("/pricing"), "Pricing");
        assert_eq!(c.page_title("/"), "Front Page");
        assert_eq!(c.page_title("/docs/intro"), "Docs");
        assert_eq!(c.categorize_referrer(Some("https://duckduckgo.com/")), "DuckDuckGo");
        assert_eq!(c.categorize_referrer(Some("https://google.com/")), "Google");
    }

    #[test]
    fn load_reports_missing_file() {
        assert!(Catalog::load("/nonexistent/footfall-catalog.json").is_err());
    }

    #[test]
    fn load_reads_override_file_from_disk() {
        let path = std::env::temp_dir()
            .join(format!("footfall-catalog-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"{
                "page_titles": {"/pricing": "Pricing"},
                "page_prefixes": [{"prefix": "/docs/", "title": "Docs"}],
                "referrer_rules": [{"label": "DDG", "patterns": ["duckduckgo"]}]
            }"#,
        )
        .expect("write catalog");

        let loaded = Catalog::load(&path);
        std::fs::remove_file(&path).ok();
        let c = loaded.expect("load catalog");

        assert_eq!(c.page_title("/pricing"), "Pricing");
        assert_eq!(c.page_title("/docs/setup"), "Docs");
        assert_eq!(c.page_title("/free"), "Free Board");
        assert_eq!(c.categorize_referrer(Some("https://duckduckgo.com/?q=x")), "DDG");
        assert_eq!(c.categorize_referrer(Some("https://www.bing.com/")), "Bing");
    }

    #[test]
    fn override_file_rejects_unknown_sections() {
        assert!(serde_json::from_str::<CatalogFile>(r#"{"titles": {}}"#).is_err());
    }
}
