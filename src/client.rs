//! Provider client: pre-signs urls and performs transfers with `ureq`.
use std::fmt;
use std::io::Read;
use std::time::Duration;

use chrono::Utc;
use tracing::debug;
use ureq::AgentBuilder;
use url::Url;

use crate::config::Settings;
use crate::credentials::{DefaultChain, ProvideCredentials};
use crate::env::Env;
use crate::errors::*;
use crate::input::Payload;
use crate::operation::{Operation, Target};
use crate::sigv4::{self, Signature, UNSIGNED_PAYLOAD};
use crate::sts::AssumeRoleProvider;

const SERVICE: &str = "s3";

/// Result of a transfer.
#[derive(Debug, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Object bytes.
    Downloaded(Vec<u8>),
    /// Location of the uploaded object.
    Uploaded(String),
}

/// The two things the command needs from a storage provider.
pub trait ObjectStore {
    /// Pre-signed url for `operation`, valid for `expiration`.
    fn presign(&self, operation: &Operation, expiration: Duration) -> Result<String>;
    /// Perform `operation`.
    fn transfer(&self, operation: Operation) -> Result<TransferOutcome>;
}

//------------------------------------------------------------------------------
/// Attach the headers of a header-signed request.
pub(crate) fn with_signature(request: ureq::Request, signature: &Signature) -> ureq::Request {
    let request = request
        .set("x-amz-content-sha256", &signature.payload_hash)
        .set("x-amz-date", &signature.date_time)
        .set("authorization", &signature.auth_header);
    match &signature.security_token {
        Some(token) => request.set("x-amz-security-token", token),
        None => request,
    }
}

/// Turn error statuses into `ErrorKind::Http`, keeping the response body.
pub(crate) fn send(
    result: std::result::Result<ureq::Response, ureq::Error>,
) -> Result<ureq::Response> {
    match result {
        Ok(response) => {
            debug!(status = response.status(), "request completed");
            Ok(response)
        }
        Err(ureq::Error::Status(status, response)) => {
            let body = response.into_string().unwrap_or_default();
            bail!(ErrorKind::Http(status, body))
        }
        Err(err) => Err(err).chain_err(|| "request failed"),
    }
}

//------------------------------------------------------------------------------
pub struct ClientBuilder {
    env: Env,
    role: Option<String>,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            env: Env::real(),
            role: None,
        }
    }
}

impl ClientBuilder {
    pub fn env(mut self, env: Env) -> Self {
        self.env = env;
        self
    }

    /// Role to assume; `None` or an empty string uses the default credentials.
    pub fn role(mut self, role: Option<&str>) -> Self {
        self.role = role.filter(|r| !r.is_empty()).map(str::to_string);
        self
    }

    /// Build the client. No credentials are resolved and no request is made.
    pub fn build(self) -> Result<Client> {
        let settings = Settings::from_env(&self.env)?;
        let agent = AgentBuilder::new().build();
        let base: Box<dyn ProvideCredentials> = Box::new(DefaultChain::new(self.env));
        let credentials: Box<dyn ProvideCredentials> = match self.role {
            Some(role) => Box::new(AssumeRoleProvider::new(
                base,
                role,
                settings.region.clone(),
                settings.sts_url()?,
                agent.clone(),
            )),
            None => base,
        };
        Ok(Client {
            settings,
            credentials,
            agent,
        })
    }
}

pub struct Client {
    settings: Settings,
    credentials: Box<dyn ProvideCredentials>,
    agent: ureq::Agent,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("settings", &self.settings)
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    pub fn new(settings: Settings, credentials: Box<dyn ProvideCredentials>) -> Self {
        Self {
            settings,
            credentials,
            agent: AgentBuilder::new().build(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn url(&self, target: &Target) -> Result<Url> {
        self.settings.object_url(&target.bucket, &target.key)
    }

    fn signature(&self, url: &Url, method: &str) -> Result<Signature> {
        let credentials = self.credentials.credentials()?;
        sigv4::signature(
            url,
            method,
            &credentials,
            &self.settings.region,
            SERVICE,
            UNSIGNED_PAYLOAD,
        )
    }

    /// Read the whole object in memory.
    fn download(&self, target: &Target) -> Result<Vec<u8>> {
        let url = self.url(target)?;
        let signature = self.signature(&url, "GET")?;
        debug!(%url, "downloading");
        let response = send(with_signature(self.agent.get(url.as_str()), &signature).call())
            .chain_err(|| format!("unable to download {}", url))?;
        let mut buf = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut buf)
            .chain_err(|| format!("unable to read {}", url))?;
        Ok(buf)
    }

    /// Stream `body` to the object, returning its location.
    fn upload(&self, target: &Target, body: Payload) -> Result<String> {
        let url = self.url(target)?;
        let len = body.content_length()?;
        let signature = self.signature(&url, "PUT")?;
        debug!(%url, bytes = len, "uploading");
        let request = with_signature(self.agent.put(url.as_str()), &signature)
            .set("content-length", &len.to_string());
        send(request.send(body)).chain_err(|| format!("unable to upload {}", url))?;
        Ok(url.to_string())
    }
}

impl ObjectStore for Client {
    fn presign(&self, operation: &Operation, expiration: Duration) -> Result<String> {
        let url = self.url(operation.target())?;
        let credentials = self.credentials.credentials()?;
        debug!(method = operation.method(), %url, ?expiration, "pre-signing");
        sigv4::pre_signed_url(
            &credentials,
            expiration.as_secs(),
            &url,
            operation.method(),
            UNSIGNED_PAYLOAD,
            &self.settings.region,
            &Utc::now(),
            SERVICE,
        )
    }

    fn transfer(&self, operation: Operation) -> Result<TransferOutcome> {
        match operation {
            Operation::Get { target } => self.download(&target).map(TransferOutcome::Downloaded),
            Operation::Put { target, body } => {
                self.upload(&target, body).map(TransferOutcome::Uploaded)
            }
        }
    }
}
