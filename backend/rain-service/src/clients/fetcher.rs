use crate::config::FetcherConfig;
use crate::error::AppError;
use lazy_static::lazy_static;
use regex::Regex;
use std::time::Duration;
use tracing::debug;

lazy_static! {
    static ref READER_HEADER: Regex =
        Regex::new(r"(?s)Markdown Content:\s*\n(.*)").expect("valid reader header regex");
    static ref OG_IMAGE: Regex = Regex::new(
        r#"(?i)<meta[^>]*property=["']og:image["'][^>]*content=["']([^"']+)["']"#
    )
    .expect("valid og:image regex");
    static ref OG_IMAGE_REVERSED: Regex = Regex::new(
        r#"(?i)<meta[^>]*content=["']([^"']+)["'][^>]*property=["']og:image["']"#
    )
    .expect("valid reversed og:image regex");
    static ref HTML_TITLE: Regex =
        Regex::new(r"(?i)<title[^>]*>([^<]+)</title>").expect("valid title regex");
}

/// Strip the reader API's metadata header, leaving only the article body.
pub fn strip_reader_header(content: &str) -> String {
    match READER_HEADER.captures(content) {
        Some(captures) => captures[1].trim().to_string(),
        None => content.trim().to_string(),
    }
}

/// Page metadata scraped from the raw HTML, best effort.
#[derive(Debug, Default)]
pub struct PageScrape {
    pub title: Option<String>,
    pub image_url: Option<String>,
}

/// Client for the document fetcher collaborator (a reader API that returns
/// cleaned markdown for a URL).
pub struct DocumentFetcher {
    http: reqwest::Client,
    base_url: String,
    content_timeout: Duration,
    metadata_timeout: Duration,
}

impl DocumentFetcher {
    pub fn new(http: reqwest::Client, config: &FetcherConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            content_timeout: Duration::from_secs(config.content_timeout_secs),
            metadata_timeout: Duration::from_secs(config.metadata_timeout_secs),
        }
    }

    /// Fetch the cleaned markdown body of a page. There is no safe fallback
    /// for the canonical text, so failures propagate.
    pub async fn fetch_markdown(&self, url: &str) -> Result<String, AppError> {
        let response = self
            .http
            .get(format!("{}/{}", self.base_url, url))
            .header("Accept", "text/markdown")
            .timeout(self.content_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Upstream(format!(
                "failed to fetch markdown ({})",
                response.status()
            )));
        }

        let content = response.text().await?;
        Ok(strip_reader_header(&content))
    }

    /// Best-effort title/description via the reader API's JSON mode.
    pub async fn fetch_metadata(&self, url: &str) -> (Option<String>, Option<String>) {
        let result = self
            .http
            .get(format!("{}/{}", self.base_url, url))
            .header("Accept", "application/json")
            .timeout(self.metadata_timeout)
            .send()
            .await;

        let Ok(response) = result else {
            return (None, None);
        };
        if !response.status().is_success() {
            return (None, None);
        }
        let Ok(body) = response.json::<serde_json::Value>().await else {
            return (None, None);
        };

        let data = &body["data"];
        let title = data["title"]
            .as_str()
            .map(|t| t.chars().take(200).collect::<String>());
        let description = data["description"]
            .as_str()
            .map(|d| d.chars().take(300).collect::<String>());
        (title, description)
    }

    /// Best-effort OG-image / title scrape straight off the page HTML.
    pub async fn scrape_page(&self, url: &str) -> PageScrape {
        let result = self
            .http
            .get(url)
            .header("User-Agent", "Mozilla/5.0 (compatible; RainBot/1.0)")
            .timeout(Duration::from_secs(5))
            .send()
            .await;

        let Ok(response) = result else {
            return PageScrape::default();
        };
        if !response.status().is_success() {
            return PageScrape::default();
        }
        let Ok(html) = response.text().await else {
            return PageScrape::default();
        };

        let image_url = OG_IMAGE
            .captures(&html)
            .or_else(|| OG_IMAGE_REVERSED.captures(&html))
            .map(|c| c[1].to_string());
        let title = HTML_TITLE
            .captures(&html)
            .map(|c| c[1].trim().chars().take(200).collect::<String>());

        debug!(has_image = image_url.is_some(), has_title = title.is_some(), "page scraped");
        PageScrape { title, image_url }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_reader_header_when_present() {
        let raw = "Title: Example\nURL Source: https://example.com\nMarkdown Content:\n# Hello\n\nBody text.";
        assert_eq!(strip_reader_header(raw), "# Hello\n\nBody text.");
    }

    #[test]
    fn passes_through_content_without_header() {
        assert_eq!(strip_reader_header("  plain body  "), "plain body");
    }

    #[test]
    fn og_image_regex_matches_both_attribute_orders() {
        let forward = r#"<meta property="og:image" content="https://img.example/a.png">"#;
        let reversed = r#"<meta content="https://img.example/b.png" property="og:image">"#;
        assert_eq!(&OG_IMAGE.captures(forward).unwrap()[1], "https://img.example/a.png");
        assert_eq!(
            &OG_IMAGE_REVERSED.captures(reversed).unwrap()[1],
            "https://img.example/b.png"
        );
    }
}
