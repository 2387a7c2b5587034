//! Storage-proxy adapter with locally minted signed URLs.
//!
//! Uploads go to an internal storage proxy over HTTP. Read URLs are minted
//! locally: the public URL carries an expiry timestamp, a random nonce, and
//! a SHA-256 token over `key:container/object:expires:nonce` that the
//! serving proxy recomputes before streaming the object. The nonce makes
//! every minted URL distinct, so a leaked URL can be tied to one issuance.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::RngCore;
use reqwest::{Client, StatusCode};
use sha2::{Digest, Sha256};
use url::Url;

use crate::domain::ports::{ObjectStorage, ObjectStorageError};

/// Validity window for minted read URLs.
const SIGNED_URL_TTL: Duration = Duration::from_secs(15 * 60);

/// Connection settings for the storage proxy.
#[derive(Debug, Clone)]
pub struct StorageSettings {
    /// Internal endpoint uploads are PUT against.
    pub endpoint: Url,
    /// Public base the signed read URLs are built on.
    pub public_base: Url,
    /// Shared secret between this service and the serving proxy.
    pub signing_key: String,
}

/// Storage adapter uploading via HTTP and signing read URLs locally.
#[derive(Clone)]
pub struct ProxySignedStorage {
    client: Client,
    settings: StorageSettings,
}

impl ProxySignedStorage {
    /// Build an adapter with a 30-second request timeout.
    ///
    /// # Errors
    ///
    /// Returns the underlying error when the HTTP client cannot be
    /// constructed.
    pub fn new(settings: StorageSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client, settings })
    }

    fn object_url(base: &Url, container: &str, object_key: &str) -> String {
        format!(
            "{}/{container}/{object_key}",
            base.as_str().trim_end_matches('/')
        )
    }
}

fn map_transport_error(error: reqwest::Error) -> ObjectStorageError {
    ObjectStorageError::backend(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> ObjectStorageError {
    let message = format!("status {}: {}", status.as_u16(), body_preview(body));
    match status {
        StatusCode::NOT_FOUND => ObjectStorageError::not_found(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ObjectStorageError::permission_denied(message)
        }
        _ if status.is_client_error() => ObjectStorageError::bad_request(message),
        _ => ObjectStorageError::backend(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

fn signing_token(key: &str, container: &str, object_key: &str, expires: i64, nonce: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hasher.update(b":");
    hasher.update(container.as_bytes());
    hasher.update(b"/");
    hasher.update(object_key.as_bytes());
    hasher.update(b":");
    hasher.update(expires.to_string().as_bytes());
    hasher.update(b":");
    hasher.update(nonce.as_bytes());
    hex::encode(hasher.finalize())
}

fn fresh_nonce() -> String {
    let mut bytes = [0_u8; 8];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[async_trait]
impl ObjectStorage for ProxySignedStorage {
    async fn upload<'a>(
        &self,
        container: &str,
        bytes: Vec<u8>,
        destination: &str,
        content_type: Option<&'a str>,
    ) -> Result<String, ObjectStorageError> {
        let url = Self::object_url(&self.settings.endpoint, container, destination);

        let mut request = self.client.put(url).body(bytes);
        if let Some(content_type) = content_type {
            request = request.header(reqwest::header::CONTENT_TYPE, content_type);
        }

        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(map_status_error(status, body.as_ref()));
        }

        Ok(destination.to_owned())
    }

    async fn sign_for_read(
        &self,
        container: &str,
        object_key: &str,
    ) -> Result<String, ObjectStorageError> {
        if object_key.trim().is_empty() {
            return Err(ObjectStorageError::bad_request(
                "object key must not be empty",
            ));
        }

        let expires = Utc::now().timestamp().saturating_add(
            i64::try_from(SIGNED_URL_TTL.as_secs()).unwrap_or(i64::MAX),
        );
        let nonce = fresh_nonce();
        let token = signing_token(
            &self.settings.signing_key,
            container,
            object_key,
            expires,
            &nonce,
        );

        Ok(format!(
            "{}?expires={expires}&nonce={nonce}&token={token}",
            Self::object_url(&self.settings.public_base, container, object_key)
        ))
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for the non-network signing helpers.

    use rstest::rstest;

    use super::*;

    fn settings() -> StorageSettings {
        StorageSettings {
            endpoint: Url::parse("http://storage.internal:9000").expect("valid url"),
            public_base: Url::parse("https://cdn.example.test/media/").expect("valid url"),
            signing_key: "test-signing-key".to_owned(),
        }
    }

    #[rstest]
    fn token_is_deterministic_for_fixed_inputs() {
        let a = signing_token("k", "exams", "fig.webp", 1_700_000_000, "abcd");
        let b = signing_token("k", "exams", "fig.webp", 1_700_000_000, "abcd");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[rstest]
    fn token_changes_with_every_input() {
        let base = signing_token("k", "exams", "fig.webp", 1_700_000_000, "abcd");
        assert_ne!(base, signing_token("k2", "exams", "fig.webp", 1_700_000_000, "abcd"));
        assert_ne!(base, signing_token("k", "other", "fig.webp", 1_700_000_000, "abcd"));
        assert_ne!(base, signing_token("k", "exams", "fig2.webp", 1_700_000_000, "abcd"));
        assert_ne!(base, signing_token("k", "exams", "fig.webp", 1_700_000_001, "abcd"));
        assert_ne!(base, signing_token("k", "exams", "fig.webp", 1_700_000_000, "efgh"));
    }

    #[rstest]
    #[tokio::test]
    async fn signed_urls_are_unique_per_issuance() {
        let storage = ProxySignedStorage::new(settings()).expect("client builds");
        let first = storage
            .sign_for_read("exams", "fig.webp")
            .await
            .expect("sign succeeds");
        let second = storage
            .sign_for_read("exams", "fig.webp")
            .await
            .expect("sign succeeds");

        assert!(first.starts_with("https://cdn.example.test/media/exams/fig.webp?"));
        assert!(first.contains("expires="));
        assert!(first.contains("token="));
        assert_ne!(first, second, "nonce makes every issuance distinct");
    }

    #[rstest]
    #[tokio::test]
    async fn blank_object_keys_are_rejected() {
        let storage = ProxySignedStorage::new(settings()).expect("client builds");
        let err = storage
            .sign_for_read("exams", " ")
            .await
            .expect_err("must fail");
        assert!(matches!(err, ObjectStorageError::BadRequest { .. }));
    }

    #[rstest]
    #[case::not_found(StatusCode::NOT_FOUND, "NotFound")]
    #[case::forbidden(StatusCode::FORBIDDEN, "PermissionDenied")]
    #[case::unauthorized(StatusCode::UNAUTHORIZED, "PermissionDenied")]
    #[case::bad_request(StatusCode::BAD_REQUEST, "BadRequest")]
    #[case::server_error(StatusCode::INTERNAL_SERVER_ERROR, "Backend")]
    fn statuses_map_to_distinguishable_kinds(#[case] status: StatusCode, #[case] expected: &str) {
        let error = map_status_error(status, b"bucket missing");
        let matched = match expected {
            "NotFound" => matches!(error, ObjectStorageError::NotFound { .. }),
            "PermissionDenied" => matches!(error, ObjectStorageError::PermissionDenied { .. }),
            "BadRequest" => matches!(error, ObjectStorageError::BadRequest { .. }),
            "Backend" => matches!(error, ObjectStorageError::Backend { .. }),
            _ => false,
        };
        assert!(matched, "{status} should map to {expected}");
    }
}
