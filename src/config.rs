//! Provider settings resolved from the environment: region, endpoints and
//! the addressing style of object urls.
use tracing::debug;
use url::Url;

use crate::env::Env;
use crate::errors::*;
use crate::sigv4::url_encode;

pub const DEFAULT_REGION: &str = "us-east-1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub region: String,
    /// Custom S3 endpoint, e.g. a MinIO server. Implies path-style urls.
    pub endpoint: Option<Url>,
    /// Custom STS endpoint used to assume roles.
    pub sts_endpoint: Option<Url>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            endpoint: None,
            sts_endpoint: None,
        }
    }
}

fn parse_endpoint(var: &str, value: Option<String>) -> Result<Option<Url>> {
    value
        .map(|v| Url::parse(&v).chain_err(|| format!("invalid endpoint in {}: {}", var, v)))
        .transpose()
}

impl Settings {
    pub fn from_env(env: &Env) -> Result<Self> {
        let region = env
            .first_of(&["AWS_REGION", "AWS_DEFAULT_REGION"])
            .unwrap_or_else(|| DEFAULT_REGION.to_string());
        let endpoint = parse_endpoint(
            "AWS_ENDPOINT_URL_S3",
            env.first_of(&["AWS_ENDPOINT_URL_S3", "AWS_ENDPOINT_URL"]),
        )?;
        let sts_endpoint = parse_endpoint(
            "AWS_ENDPOINT_URL_STS",
            env.first_of(&["AWS_ENDPOINT_URL_STS", "AWS_ENDPOINT_URL"]),
        )?;
        debug!(%region, endpoint = ?endpoint.as_ref().map(Url::as_str), "resolved settings");
        Ok(Self {
            region,
            endpoint,
            sts_endpoint,
        })
    }

    fn s3_host(&self) -> String {
        if self.region == DEFAULT_REGION {
            "s3.amazonaws.com".to_string()
        } else {
            format!("s3.{}.amazonaws.com", self.region)
        }
    }

    /// Url addressing `key` in `bucket`, without query string.
    pub fn object_url(&self, bucket: &str, key: &str) -> Result<Url> {
        let key = encode_key(key);
        let uri = match &self.endpoint {
            Some(endpoint) => format!(
                "{}/{}/{}",
                endpoint.as_str().trim_end_matches('/'),
                url_encode(bucket),
                key
            ),
            None if is_dns_compatible(bucket) => {
                format!("https://{}.{}/{}", bucket, self.s3_host(), key)
            }
            None => format!("https://{}/{}/{}", self.s3_host(), url_encode(bucket), key),
        };
        Ok(Url::parse(&uri)?)
    }

    /// Url of the STS service used to assume roles.
    pub fn sts_url(&self) -> Result<Url> {
        match &self.sts_endpoint {
            Some(endpoint) => Ok(endpoint.clone()),
            None => Ok(Url::parse(&format!(
                "https://sts.{}.amazonaws.com/",
                self.region
            ))?),
        }
    }
}

/// Uri-encode every path segment of `key`, keeping the `/` separators.
fn encode_key(key: &str) -> String {
    key.split('/')
        .map(|segment| url_encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Buckets that can be used as a host name label (virtual-hosted style).
/// Names containing dots are excluded since they break TLS wildcard matching.
fn is_dns_compatible(bucket: &str) -> bool {
    let bytes = bucket.as_bytes();
    (3..=63).contains(&bytes.len())
        && bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
        && bytes[0] != b'-'
        && bytes[bytes.len() - 1] != b'-'
}
