//! Cookie store and Cloudflare cookie refresh.
//!
//! Cloudflare clearance cookies are produced out-of-process (typically by a
//! browser automation script) and written to a JSON file shaped like
//! `{"cookies": {"cf_clearance": "..."}}`. The client reads that file at
//! construction and again after every refresh.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;

/// Immutable snapshot of the cookies sent with every request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: BTreeMap<String, String>,
}

impl CookieJar {
    pub fn new(cookies: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            cookies: cookies.into_iter().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Render as a `Cookie` request header value, or `None` when empty.
    pub fn header_value(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        Some(pairs.join("; "))
    }
}

#[derive(Debug, Deserialize)]
struct CookieFile {
    #[serde(default)]
    cookies: BTreeMap<String, String>,
}

/// Location of the cookie file written by the refresh collaborator.
#[derive(Debug, Clone)]
pub struct CookieStore {
    path: PathBuf,
}

impl Default for CookieStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieStore {
    /// Cookie store in the platform data directory.
    pub fn new() -> Self {
        let data_dir = directories::ProjectDirs::from("com", "deepseek", "dsk")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            path: data_dir.join("cookies.json"),
        }
    }

    /// Cookie store at a custom path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cookie file.
    ///
    /// A missing or corrupt file is not an error: it yields an empty jar and a
    /// warning, since the gateway recovery path will try to recreate it.
    pub fn load(&self) -> CookieJar {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!("Could not load cookies from {:?}: {}", self.path, e);
                return CookieJar::default();
            }
        };

        match serde_json::from_str::<CookieFile>(&contents) {
            Ok(file) => {
                tracing::debug!("Loaded {} cookies from {:?}", file.cookies.len(), self.path);
                CookieJar {
                    cookies: file.cookies,
                }
            }
            Err(e) => {
                tracing::warn!("Could not parse cookies from {:?}: {}", self.path, e);
                CookieJar::default()
            }
        }
    }
}

/// Regenerates the cookie file after a Cloudflare interception.
///
/// Implementations must not fail loudly: a refresh that did not help simply
/// leads to another interception and, eventually, a
/// [`crate::DskError::GatewayBypass`].
#[async_trait]
pub trait CookieRefresher: Send + Sync {
    async fn refresh(&self);
}

/// Refresher that does nothing but note the interception.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRefresher;

#[async_trait]
impl CookieRefresher for NoopRefresher {
    async fn refresh(&self) {
        tracing::warn!("No cookie refresher configured; retrying with the current cookies");
    }
}

/// Runs an external program that rewrites the cookie file.
#[derive(Debug, Clone)]
pub struct CommandRefresher {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandRefresher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

#[async_trait]
impl CookieRefresher for CommandRefresher {
    async fn refresh(&self) {
        tracing::info!("Refreshing cookies via {:?}", self.program);

        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                tracing::debug!("Cookie refresher exited successfully");
            }
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                tracing::warn!(
                    "Cookie refresher exited with {}: {}",
                    output.status,
                    stderr.trim()
                );
            }
            Err(e) => {
                tracing::warn!("Failed to refresh cookies: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_value() {
        assert_eq!(CookieJar::default().header_value(), None);

        let jar = CookieJar::new([
            ("cf_clearance".to_string(), "abc".to_string()),
            ("__cf_bm".to_string(), "xyz".to_string()),
        ]);
        assert_eq!(
            jar.header_value().as_deref(),
            Some("__cf_bm=xyz; cf_clearance=abc")
        );
        assert_eq!(jar.get("cf_clearance"), Some("abc"));
        assert_eq!(jar.len(), 2);
    }

    #[test]
    fn test_load_cookie_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        std::fs::write(&path, r#"{"cookies":{"cf_clearance":"abc"},"user_agent":"x"}"#).unwrap();

        let jar = CookieStore::with_path(&path).load();
        assert_eq!(jar.get("cf_clearance"), Some("abc"));
    }

    #[test]
    fn test_missing_or_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        assert!(CookieStore::with_path(&path).load().is_empty());

        std::fs::write(&path, "{not json").unwrap();
        assert!(CookieStore::with_path(&path).load().is_empty());

        std::fs::write(&path, "{}").unwrap();
        assert!(CookieStore::with_path(&path).load().is_empty());
    }

    #[tokio::test]
    async fn test_command_refresher_failure_is_silent() {
        CommandRefresher::new("/nonexistent/dsk-refresher").refresh().await;
        NoopRefresher.refresh().await;
    }
}
