//! S3 REST backend (path-style addressing, SigV4 header auth).
//!
//! Status mapping:
//! - 2xx -> Ok
//! - 404 -> `StoreError::NotFound`
//! - anything else, or a transport failure -> `StoreError::Storage`
//!
//! No retries and no client-side timeout: callers that need bounded latency
//! wrap calls in their own deadline.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Method, StatusCode, Url};
use tracing::debug;

use crate::error::StoreError;
use crate::object_store::{ObjectMeta, ObjectStore};
use crate::sigv4::{self, RequestToSign};

pub struct S3ObjectStore {
    client: reqwest::Client,
    access_key_id: String,
    secret_access_key: String,
    region: String,
    endpoint: String,
}

impl std::fmt::Debug for S3ObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ObjectStore")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &"<REDACTED>")
            .finish()
    }
}

impl S3ObjectStore {
    /// AWS regional endpoint `https://s3.<region>.amazonaws.com`.
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let region = region.into();
        let endpoint = format!("https://s3.{region}.amazonaws.com");
        Self::new_with_endpoint(access_key_id, secret_access_key, region, endpoint)
    }

    /// S3-compatible service at `endpoint` (MinIO, localstack, test servers).
    pub fn new_with_endpoint(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| StoreError::storage("connect", "", "", e.to_string()))?;
        Ok(Self {
            client,
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Build, sign and send one request. Returns the raw response; status
    /// mapping is left to the caller because HEAD/GET/PUT differ in what
    /// they read back.
    async fn send(
        &self,
        op: &'static str,
        method: Method,
        bucket: &str,
        key: &str,
        query: &[(&str, &str)],
        payload: Vec<u8>,
    ) -> Result<reqwest::Response, StoreError> {
        let path = if key.is_empty() {
            format!("/{}", sigv4::uri_encode(bucket, false))
        } else {
            format!(
                "/{}/{}",
                sigv4::uri_encode(bucket, false),
                sigv4::uri_encode(key, true)
            )
        };
        let qs = sigv4::canonical_query(query);
        let raw = if qs.is_empty() {
            format!("{}{path}", self.endpoint)
        } else {
            format!("{}{path}?{qs}", self.endpoint)
        };
        let url = Url::parse(&raw)
            .map_err(|e| StoreError::storage(op, bucket, key, format!("bad url '{raw}': {e}")))?;
        let host = match (url.host_str(), url.port()) {
            (Some(h), Some(p)) => format!("{h}:{p}"),
            (Some(h), None) => h.to_string(),
            (None, _) => {
                return Err(StoreError::storage(op, bucket, key, format!("no host in '{raw}'")))
            }
        };

        let signed = sigv4::sign(
            &RequestToSign {
                method: method.as_str(),
                host: &host,
                canonical_path: &path,
                query,
                payload: &payload,
            },
            &self.access_key_id,
            &self.secret_access_key,
            &self.region,
            Utc::now(),
        );

        self.client
            .request(method, url)
            .header("authorization", signed.authorization)
            .header("x-amz-date", signed.amz_date)
            .header("x-amz-content-sha256", signed.content_sha256)
            .body(payload)
            .send()
            .await
            .map_err(|e| StoreError::storage(op, bucket, key, format!("transport: {e}")))
    }
}

async fn status_error(
    op: &'static str,
    bucket: &str,
    key: &str,
    resp: reqwest::Response,
) -> StoreError {
    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
        return StoreError::not_found(bucket, key);
    }
    let body = resp.text().await.unwrap_or_default();
    let snippet: String = body.chars().take(200).collect();
    StoreError::storage(op, bucket, key, format!("HTTP {}: {snippet}", status.as_u16()))
}

/// Text content of every `<Key>` element in a ListObjectsV2 response.
fn parse_list_keys(xml: &str) -> Vec<String> {
    const OPEN: &str = "<Key>";
    const CLOSE: &str = "</Key>";
    let mut keys = Vec::new();
    let mut rest = xml;
    while let Some(start) = rest.find(OPEN) {
        let after = &rest[start + OPEN.len()..];
        let Some(end) = after.find(CLOSE) else {
            break;
        };
        keys.push(decode_xml_entities(&after[..end]));
        rest = &after[end + CLOSE.len()..];
    }
    keys
}

fn decode_xml_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn backend_name(&self) -> &'static str {
        "s3"
    }

    async fn head(&self, bucket: &str, key: &str) -> Result<ObjectMeta, StoreError> {
        let resp = self
            .send("head", Method::HEAD, bucket, key, &[], Vec::new())
            .await?;
        if !resp.status().is_success() {
            return Err(status_error("head", bucket, key, resp).await);
        }
        let size = resp
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0);
        Ok(ObjectMeta {
            key: key.to_string(),
            size,
        })
    }

    async fn list_prefix(
        &self,
        bucket: &str,
        prefix: &str,
        limit: usize,
    ) -> Result<Vec<String>, StoreError> {
        let max_keys = limit.to_string();
        let query = [
            ("list-type", "2"),
            ("max-keys", max_keys.as_str()),
            ("prefix", prefix),
        ];
        let resp = self
            .send("list", Method::GET, bucket, "", &query, Vec::new())
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            debug!(bucket, prefix, "s3 list: no such bucket");
            return Ok(Vec::new());
        }
        if !resp.status().is_success() {
            return Err(status_error("list", bucket, prefix, resp).await);
        }
        let body = resp
            .text()
            .await
            .map_err(|e| StoreError::storage("list", bucket, prefix, format!("read body: {e}")))?;
        let mut keys = parse_list_keys(&body);
        keys.truncate(limit);
        debug!(bucket, prefix, found = keys.len(), "s3 list");
        Ok(keys)
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StoreError> {
        let resp = self
            .send("get", Method::GET, bucket, key, &[], Vec::new())
            .await?;
        if !resp.status().is_success() {
            return Err(status_error("get", bucket, key, resp).await);
        }
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| StoreError::storage("get", bucket, key, format!("read body: {e}")))?;
        debug!(bucket, key, bytes = bytes.len(), "s3 get");
        Ok(bytes.to_vec())
    }

    async fn put(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), StoreError> {
        let len = body.len();
        let resp = self.send("put", Method::PUT, bucket, key, &[], body).await?;
        if !resp.status().is_success() {
            return Err(status_error("put", bucket, key, resp).await);
        }
        debug!(bucket, key, bytes = len, "s3 put");
        Ok(())
    }
}
