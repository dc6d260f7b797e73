//! Temporary credentials obtained by assuming a role through STS.
//!
//! reference: https://docs.aws.amazon.com/STS/latest/APIReference/API_AssumeRole.html
use std::cell::OnceCell;
use std::fmt;

use chrono::Utc;
use tracing::debug;
use url::Url;

use crate::client::{send, with_signature};
use crate::credentials::{Credentials, ProvideCredentials};
use crate::errors::*;
use crate::sigv4;

const STS_VERSION: &str = "2011-06-15";

/// Wraps a base provider; the base credentials sign the `AssumeRole` call and
/// the returned credentials are cached for the life of the provider.
pub struct AssumeRoleProvider {
    base: Box<dyn ProvideCredentials>,
    role_arn: String,
    session_name: String,
    region: String,
    endpoint: Url,
    agent: ureq::Agent,
    cached: OnceCell<Credentials>,
}

impl fmt::Debug for AssumeRoleProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssumeRoleProvider")
            .field("base", &self.base)
            .field("role_arn", &self.role_arn)
            .field("session_name", &self.session_name)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint.as_str())
            .finish()
    }
}

impl AssumeRoleProvider {
    pub fn new(
        base: Box<dyn ProvideCredentials>,
        role_arn: impl Into<String>,
        region: impl Into<String>,
        endpoint: Url,
        agent: ureq::Agent,
    ) -> Self {
        Self {
            base,
            role_arn: role_arn.into(),
            session_name: format!("aws-presign-{}", Utc::now().timestamp()),
            region: region.into(),
            endpoint,
            agent,
            cached: OnceCell::new(),
        }
    }

    fn assume_role(&self) -> Result<Credentials> {
        let base = self.base.credentials()?;
        let body = request_body(&self.role_arn, &self.session_name);
        let signature = sigv4::signature(
            &self.endpoint,
            "POST",
            &base,
            &self.region,
            "sts",
            &sigv4::payload_hash(body.as_bytes()),
        )?;
        debug!(role_arn = %self.role_arn, endpoint = %self.endpoint, "assuming role");
        let request = with_signature(self.agent.post(self.endpoint.as_str()), &signature)
            .set(
                "content-type",
                "application/x-www-form-urlencoded; charset=utf-8",
            );
        let response = send(request.send_string(&body))
            .chain_err(|| format!("unable to assume role {}", self.role_arn))?;
        let text = response.into_string()?;
        parse_response(&text)
    }
}

impl ProvideCredentials for AssumeRoleProvider {
    fn credentials(&self) -> Result<Credentials> {
        if let Some(credentials) = self.cached.get() {
            return Ok(credentials.clone());
        }
        let credentials = self.assume_role()?;
        let _ = self.cached.set(credentials.clone());
        Ok(credentials)
    }
}

/// Form encoded `AssumeRole` query.
fn request_body(role_arn: &str, session_name: &str) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .append_pair("Action", "AssumeRole")
        .append_pair("Version", STS_VERSION)
        .append_pair("RoleArn", role_arn)
        .append_pair("RoleSessionName", session_name)
        .finish()
}

/// Extract the temporary credentials from an `AssumeRoleResponse` document.
fn parse_response(text: &str) -> Result<Credentials> {
    let doc = roxmltree::Document::parse(text).chain_err(|| ErrorKind::Sts("malformed xml".to_string()))?;
    let node = doc
        .descendants()
        .find(|n| n.has_tag_name("Credentials"))
        .chain_err(|| ErrorKind::Sts("missing Credentials element".to_string()))?;
    let field = |name: &str| -> Result<String> {
        node.children()
            .find(|c| c.has_tag_name(name))
            .and_then(|c| c.text())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .chain_err(|| ErrorKind::Sts(format!("missing {}", name)))
    };
    Ok(Credentials::new(
        field("AccessKeyId")?,
        field("SecretAccessKey")?,
        Some(field("SessionToken")?),
    ))
}
