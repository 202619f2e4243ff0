use super::{is_spec_file, SpecSource};
use crate::constants::MANIFEST_FILE;
use crate::error::LoadError;
use async_trait::async_trait;
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    files: Vec<String>,
}

fn manifest_entries(manifest: Manifest) -> Vec<String> {
    manifest
        .files
        .into_iter()
        .filter(|f| is_spec_file(f))
        .collect()
}

// =====================================================
// Local directory
// =====================================================

/// Specialization files in a local directory
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SpecSource for DirectorySource {
    fn describe(&self) -> String {
        self.dir.display().to_string()
    }

    async fn list_files(&self) -> Result<Vec<String>, LoadError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| LoadError::Listing(format!("{}: {e}", self.dir.display())))?;

        let mut files = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| LoadError::Listing(e.to_string()))?
        {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if is_spec_file(name) {
                    files.push(name.to_string());
                }
            }
        }
        files.sort();
        Ok(files)
    }

    async fn manifest_files(&self) -> Result<Vec<String>, LoadError> {
        let path = self.dir.join(MANIFEST_FILE);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| LoadError::Manifest(format!("{}: {e}", path.display())))?;
        let manifest: Manifest =
            serde_json::from_str(&text).map_err(|e| LoadError::Manifest(e.to_string()))?;
        Ok(manifest_entries(manifest))
    }

    async fn fetch(&self, file: &str) -> Result<Value, LoadError> {
        let fetch_err = |reason: String| LoadError::Fetch {
            file: file.to_string(),
            reason,
        };
        let text = tokio::fs::read_to_string(self.dir.join(file))
            .await
            .map_err(|e| fetch_err(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| fetch_err(e.to_string()))
    }
}

// =====================================================
// HTTP server
// =====================================================

/// Specialization files served under `{base_url}/specializations/`
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, file: &str) -> String {
        format!("{}/specializations/{}", self.base_url, file)
    }
}

/// Spec files named by a directory listing body. The planner server answers
/// with a JSON array of file names; a plain static server's HTML index is
/// scraped for `href="…json"` targets instead.
fn parse_listing(body: &str) -> Vec<String> {
    let names = match serde_json::from_str::<Vec<String>>(body) {
        Ok(names) => names,
        Err(_) => listing_links(body),
    };

    let mut files: Vec<String> = names
        .into_iter()
        .map(|name| name.rsplit('/').next().unwrap_or_default().to_string())
        .filter(|f| is_spec_file(f))
        .collect();
    files.sort();
    files.dedup();
    files
}

fn listing_links(html: &str) -> Vec<String> {
    static HREF: OnceLock<Regex> = OnceLock::new();
    let href = HREF.get_or_init(|| {
        Regex::new(r#"href="([^"?#]+\.json)""#).expect("listing href pattern is a valid regex")
    });

    href.captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

#[async_trait]
impl SpecSource for HttpSource {
    fn describe(&self) -> String {
        self.url("")
    }

    async fn list_files(&self) -> Result<Vec<String>, LoadError> {
        let resp = self
            .client
            .get(self.url(""))
            .send()
            .await
            .map_err(|e| LoadError::Listing(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(LoadError::Listing(format!("HTTP {}", resp.status())));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| LoadError::Listing(e.to_string()))?;
        Ok(parse_listing(&body))
    }

    async fn manifest_files(&self) -> Result<Vec<String>, LoadError> {
        let resp = self
            .client
            .get(self.url(MANIFEST_FILE))
            .send()
            .await
            .map_err(|e| LoadError::Manifest(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(LoadError::Manifest(format!("HTTP {}", resp.status())));
        }
        let manifest: Manifest = resp
            .json()
            .await
            .map_err(|e| LoadError::Manifest(e.to_string()))?;
        Ok(manifest_entries(manifest))
    }

    async fn fetch(&self, file: &str) -> Result<Value, LoadError> {
        let fetch_err = |reason: String| LoadError::Fetch {
            file: file.to_string(),
            reason,
        };

        let resp = self
            .client
            .get(self.url(file))
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(fetch_err(format!("HTTP {}", resp.status())));
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !content_type.contains("application/json") {
            return Err(fetch_err(format!(
                "expected JSON, got content type '{content_type}'"
            )));
        }

        resp.json().await.map_err(|e| fetch_err(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_listing() {
        let body = r#"["warrior_arms.json", "priest_holy.json", "specialization_schema.json"]"#;
        assert_eq!(
            parse_listing(body),
            vec!["priest_holy.json", "warrior_arms.json"]
        );
        assert!(parse_listing("[]").is_empty());
    }

    #[test]
    fn test_parse_html_listing() {
        let html = r#"
            <a href="../">../</a>
            <a href="warrior_arms.json">warrior_arms.json</a>
            <a href="/specializations/priest_holy.json">priest_holy.json</a>
            <a href="specialization_schema.json">schema</a>
            <a href="manifest.json">manifest</a>
            <a href="notes.txt">notes</a>
            <a href="warrior_arms.json">dup</a>
        "#;
        assert_eq!(
            parse_listing(html),
            vec!["priest_holy.json", "warrior_arms.json"]
        );
    }

    #[test]
    fn test_manifest_entries_filter() {
        let manifest: Manifest = serde_json::from_str(
            r#"{"files": ["a.json", "specialization_schema.json", "b.txt"]}"#,
        )
        .unwrap();
        assert_eq!(manifest_entries(manifest), vec!["a.json"]);
    }

    #[test]
    fn test_http_source_urls() {
        let source = HttpSource::new("http://localhost:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            source.url("warrior_arms.json"),
            "http://localhost:8080/specializations/warrior_arms.json"
        );
        assert_eq!(source.describe(), "http://localhost:8080/specializations/");
    }
}
