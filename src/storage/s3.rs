//! S3-compatible backend
//!
//! One signed PUT per file. Requests are signed with AWS Signature V4 and
//! addressed path-style (`{endpoint}/{bucket}/{key}`) so any operator-supplied
//! endpoint (MinIO, Spaces, R2) works without DNS assumptions.

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use url::Url;

use crate::core::config::S3Config;
use crate::core::error::AppError;
use crate::storage::{object_name, ObjectStore};

type HmacSha256 = Hmac<Sha256>;

/// All uploads land under this key prefix.
const KEY_PREFIX: &str = "yt-dlp";

const SERVICE: &str = "s3";
const SIGNED_HEADERS: &str = "host;x-amz-content-sha256;x-amz-date";
const ALGORITHM: &str = "AWS4-HMAC-SHA256";

pub struct S3Store {
    scheme: String,
    /// host[:port], used both for the request URL and the signed Host header
    host: String,
    bucket: String,
    region: String,
    access_key_id: String,
    secret_access_key: String,
    client: reqwest::Client,
}

impl S3Store {
    pub fn new(config: &S3Config) -> Result<Self, AppError> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| AppError::Config(format!("invalid S3_ENDPOINT '{}': {}", config.endpoint, e)))?;
        let host_str = endpoint
            .host_str()
            .ok_or_else(|| AppError::Config(format!("S3_ENDPOINT '{}' has no host", config.endpoint)))?;
        let host = match endpoint.port() {
            Some(port) => format!("{}:{}", host_str, port),
            None => host_str.to_string(),
        };

        Ok(Self {
            scheme: endpoint.scheme().to_string(),
            host,
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            access_key_id: config.access_key_id.clone(),
            secret_access_key: config.secret_access_key.clone(),
            client: reqwest::Client::new(),
        })
    }

    /// Path-style canonical URI: `/bucket/key`, each segment URI-encoded
    /// with the unreserved set AWS expects.
    fn canonical_uri(&self, key: &str) -> String {
        let mut uri = String::from("/");
        uri.push_str(&encode_segment(&self.bucket));
        for segment in key.split('/') {
            uri.push('/');
            uri.push_str(&encode_segment(segment));
        }
        uri
    }

    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), AppError> {
        let now = Utc::now();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date_stamp = now.format("%Y%m%d").to_string();

        let payload_hash = hex::encode(Sha256::digest(&body));
        let canonical_uri = self.canonical_uri(key);

        // Canonical request: method, URI, empty query string, sorted signed
        // headers, header list, payload hash.
        let canonical_request = format!(
            "PUT\n{}\n\nhost:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n\n{}\n{}",
            canonical_uri, self.host, payload_hash, amz_date, SIGNED_HEADERS, payload_hash
        );

        let scope = format!("{}/{}/{}/aws4_request", date_stamp, self.region, SERVICE);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let signature = hex::encode(self.signing_key(&date_stamp, &string_to_sign));
        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, self.access_key_id, scope, SIGNED_HEADERS, signature
        );

        let request_url = format!("{}://{}{}", self.scheme, self.host, canonical_uri);
        let response = self
            .client
            .put(&request_url)
            .header("x-amz-date", &amz_date)
            .header("x-amz-content-sha256", &payload_hash)
            .header("Authorization", authorization)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(AppError::Upload(format!(
                "S3 PUT returned status {}: {}",
                status,
                body_text.trim()
            )));
        }
        Ok(())
    }

    /// Derives the SigV4 signing key and signs `string_to_sign` with it.
    fn signing_key(&self, date_stamp: &str, string_to_sign: &str) -> Vec<u8> {
        let secret = format!("AWS4{}", self.secret_access_key);
        let k_date = hmac_sha256(secret.as_bytes(), date_stamp.as_bytes());
        let k_region = hmac_sha256(&k_date, self.region.as_bytes());
        let k_service = hmac_sha256(&k_region, SERVICE.as_bytes());
        let k_signing = hmac_sha256(&k_service, b"aws4_request");
        hmac_sha256(&k_signing, string_to_sign.as_bytes())
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn name(&self) -> &'static str {
        "S3"
    }

    async fn upload_file(&self, local_path: &str) -> Result<String, AppError> {
        let file_name = object_name(local_path)?;
        let key = format!("{}/{}", KEY_PREFIX, file_name);

        let body = tokio::fs::read(local_path).await?;
        log::info!("Uploading {} bytes to s3://{}/{}", body.len(), self.bucket, key);

        self.put_object(&key, body).await?;
        Ok(key)
    }
}

fn hmac_sha256(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// Percent-encodes one path segment, leaving the AWS unreserved characters
/// (A-Z a-z 0-9 `-` `_` `.` `~`) intact.
fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}
