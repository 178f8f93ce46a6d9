//! Remote bucket synchronization.
//!
//! The store file and the reorder list can be mirrored to a shared bucket so
//! the phone capture workflow and other machines see the same files. Three
//! providers, selected by `bucket.provider` in the configuration:
//!
//! - **firebase** — Firebase Storage REST API over plain HTTPS. Reads use
//!   `GET /v0/b/<bucket>/o/<object>?alt=media`, writes use the
//!   `uploadType=media` endpoint. An optional bearer token is read from the
//!   environment variable named by `bucket.token_env`.
//! - **local** — a directory on disk; used by the integration tests and for
//!   offline mirrors.
//! - **disabled** — any push/pull attempt fails with an instructive error.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::BucketConfig;
use crate::retry::RetryPolicy;

/// A remote object store holding whole-file text objects.
///
/// The API is deliberately tiny: the tool only ever mirrors whole files, so
/// there is no listing, no metadata, and no append primitive.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Returns the provider identifier (e.g. `"firebase"`, `"local"`).
    fn name(&self) -> &str;

    /// Fetch an object's text. `Ok(None)` when the object does not exist.
    async fn get(&self, object: &str) -> Result<Option<String>>;

    /// Create or overwrite an object with the given text.
    async fn put(&self, object: &str, content: &str) -> Result<()>;
}

/// Append a line to a bucket object via download-modify-upload. The line
/// terminator is added here; callers pass the bare line.
///
/// The bucket API has no append primitive, so a concurrent writer can lose
/// lines between the read and the write.
pub async fn append_line(bucket: &dyn BlobStore, object: &str, line: &str) -> Result<()> {
    let mut content = bucket.get(object).await?.unwrap_or_default();
    // A hand-edited object may lack its trailing newline.
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(line);
    content.push('\n');
    bucket.put(object, &content).await
}

// ============ Disabled Bucket ============

/// A no-op bucket that always returns errors.
///
/// Used when `bucket.provider = "disabled"` in the configuration.
pub struct DisabledBucket;

#[async_trait]
impl BlobStore for DisabledBucket {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn get(&self, _object: &str) -> Result<Option<String>> {
        bail!(
            "Bucket sync is disabled. Set bucket.provider = \"firebase\" or \"local\" \
             in the config file."
        )
    }

    async fn put(&self, _object: &str, _content: &str) -> Result<()> {
        bail!(
            "Bucket sync is disabled. Set bucket.provider = \"firebase\" or \"local\" \
             in the config file."
        )
    }
}

// ============ Firebase Bucket ============

/// Bucket provider for Firebase Storage.
///
/// Talks to `firebasestorage.googleapis.com` directly; no SDK. Public-read
/// buckets need no credentials, otherwise `bucket.token_env` names an
/// environment variable holding a bearer token. Transient failures
/// (429/5xx/network) are retried per the configured [`RetryPolicy`]; other
/// client errors fail fast.
pub struct FirebaseBucket {
    bucket: String,
    token: Option<String>,
    policy: RetryPolicy,
}

impl FirebaseBucket {
    /// Create a new Firebase bucket client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `bucket.token_env` is set but the named
    /// environment variable is not.
    pub fn new(config: &BucketConfig) -> Result<Self> {
        let token = match &config.token_env {
            Some(var) => Some(
                std::env::var(var)
                    .map_err(|_| anyhow::anyhow!("{} environment variable not set", var))?,
            ),
            None => None,
        };

        Ok(Self {
            bucket: config.name.clone(),
            token,
            policy: RetryPolicy::new(
                config.max_retries,
                Duration::from_secs(config.base_delay_secs),
            ),
        })
    }

    fn download_url(&self, object: &str) -> String {
        format!(
            "https://firebasestorage.googleapis.com/v0/b/{}/o/{}?alt=media",
            self.bucket,
            uri_encode(object)
        )
    }

    fn upload_url(&self, object: &str) -> String {
        format!(
            "https://firebasestorage.googleapis.com/v0/b/{}/o?uploadType=media&name={}",
            self.bucket,
            uri_encode(object)
        )
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.header("Authorization", format!("Bearer {}", token)),
            None => req,
        }
    }
}

#[async_trait]
impl BlobStore for FirebaseBucket {
    fn name(&self) -> &str {
        "firebase"
    }

    async fn get(&self, object: &str) -> Result<Option<String>> {
        let client = reqwest::Client::new();
        let mut last_err = None;

        for attempt in 0..=self.policy.max_retries {
            self.policy.wait(attempt).await;

            let resp = self
                .authorize(client.get(self.download_url(object)))
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Ok(None);
                    }

                    if status.is_success() {
                        let bytes = response.bytes().await?;
                        return Ok(Some(String::from_utf8_lossy(&bytes).to_string()));
                    }

                    // Rate limited or server error: retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body = response.text().await.unwrap_or_default();
                        last_err = Some(anyhow::anyhow!(
                            "Bucket download failed (HTTP {}) for object '{}': {}",
                            status,
                            object,
                            body.chars().take(500).collect::<String>()
                        ));
                        continue;
                    }

                    // Client error (not 429): don't retry
                    let body = response.text().await.unwrap_or_default();
                    bail!(
                        "Bucket download failed (HTTP {}) for object '{}': {}",
                        status,
                        object,
                        body.chars().take(500).collect::<String>()
                    );
                }
                Err(e) => {
                    last_err = Some(anyhow::anyhow!(
                        "Failed to fetch '{}' from bucket {}: {}",
                        object,
                        self.bucket,
                        e
                    ));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Bucket download failed after retries")))
    }

    async fn put(&self, object: &str, content: &str) -> Result<()> {
        let client = reqwest::Client::new();
        let mut last_err = None;

        for attempt in 0..=self.policy.max_retries {
            self.policy.wait(attempt).await;

            let resp = self
                .authorize(client.post(self.upload_url(object)))
                .header("Content-Type", "text/plain")
                .body(content.to_string())
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return Ok(());
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let body = response.text().await.unwrap_or_default();
                        last_err = Some(anyhow::anyhow!(
                            "Bucket upload failed (HTTP {}) for object '{}': {}",
                            status,
                            object,
                            body.chars().take(500).collect::<String>()
                        ));
                        continue;
                    }

                    let body = response.text().await.unwrap_or_default();
                    bail!(
                        "Bucket upload failed (HTTP {}) for object '{}': {}",
                        status,
                        object,
                        body.chars().take(500).collect::<String>()
                    );
                }
                Err(e) => {
                    last_err = Some(anyhow::anyhow!(
                        "Failed to upload '{}' to bucket {}: {}",
                        object,
                        self.bucket,
                        e
                    ));
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Bucket upload failed after retries")))
    }
}

// ============ Local Bucket ============

/// Bucket provider backed by a directory on disk.
pub struct LocalBucket {
    dir: PathBuf,
}

impl LocalBucket {
    /// Create a new local bucket rooted at `bucket.local_dir`.
    pub fn new(config: &BucketConfig) -> Result<Self> {
        let dir = config
            .local_dir
            .clone()
            .ok_or_else(|| anyhow::anyhow!("bucket.local_dir must be set when provider is 'local'"))?;
        Ok(Self { dir })
    }
}

#[async_trait]
impl BlobStore for LocalBucket {
    fn name(&self) -> &str {
        "local"
    }

    async fn get(&self, object: &str) -> Result<Option<String>> {
        let path = self.dir.join(object);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read bucket object: {}", path.display())),
        }
    }

    async fn put(&self, object: &str, content: &str) -> Result<()> {
        let path = self.dir.join(object);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create bucket directory: {}", parent.display())
            })?;
        }
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write bucket object: {}", path.display()))
    }
}

/// Create the appropriate [`BlobStore`] based on configuration.
///
/// # Errors
///
/// Returns an error for unknown provider names or if the provider cannot be
/// initialized (missing directory or token variable).
pub fn create_bucket(config: &BucketConfig) -> Result<Box<dyn BlobStore>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledBucket)),
        "firebase" => Ok(Box::new(FirebaseBucket::new(config)?)),
        "local" => Ok(Box::new(LocalBucket::new(config)?)),
        other => bail!("Unknown bucket provider: {}", other),
    }
}

/// URI-encode a string per RFC 3986.
///
/// Encodes all characters except unreserved characters:
/// `A-Z a-z 0-9 - _ . ~`
fn uri_encode(s: &str) -> String {
    let mut result = String::new();
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char);
            }
            _ => {
                result.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    result
}
