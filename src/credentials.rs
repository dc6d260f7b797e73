//! Credentials and the providers resolving them.
//!
//! The default chain looks at the environment first and then at the shared
//! credentials file. Resolution is lazy: nothing is read until a request is
//! signed.
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use tracing::debug;

use crate::env::Env;
use crate::errors::*;

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    secret_access_key: String,
    session_token: Option<String>,
}

impl Credentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token,
        }
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn secret_access_key(&self) -> &str {
        &self.secret_access_key
    }

    pub fn session_token(&self) -> Option<&str> {
        self.session_token.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "** redacted **"),
            )
            .finish()
    }
}

/// Source of credentials used to sign requests.
pub trait ProvideCredentials: fmt::Debug {
    fn credentials(&self) -> Result<Credentials>;
}

/// `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and `AWS_SESSION_TOKEN`.
#[derive(Debug, Clone)]
pub struct EnvironmentProvider {
    env: Env,
}

impl EnvironmentProvider {
    pub fn new(env: Env) -> Self {
        Self { env }
    }
}

impl ProvideCredentials for EnvironmentProvider {
    fn credentials(&self) -> Result<Credentials> {
        let access = self.env.get("AWS_ACCESS_KEY_ID");
        let secret = self.env.get("AWS_SECRET_ACCESS_KEY");
        match (access, secret) {
            (Some(access), Some(secret)) => Ok(Credentials::new(
                access,
                secret,
                self.env.get("AWS_SESSION_TOKEN"),
            )),
            (Some(_), None) => bail!(ErrorKind::Credentials(
                "AWS_SECRET_ACCESS_KEY is not set".to_string()
            )),
            _ => bail!(ErrorKind::Credentials(
                "AWS_ACCESS_KEY_ID is not set".to_string()
            )),
        }
    }
}

/// Static keys from the shared credentials file, `~/.aws/credentials` unless
/// `AWS_SHARED_CREDENTIALS_FILE` says otherwise.
#[derive(Debug, Clone)]
pub struct ProfileFileProvider {
    env: Env,
}

impl ProfileFileProvider {
    pub fn new(env: Env) -> Self {
        Self { env }
    }

    fn path(&self) -> Result<PathBuf> {
        if let Some(path) = self.env.get("AWS_SHARED_CREDENTIALS_FILE") {
            return Ok(PathBuf::from(path));
        }
        let home = self
            .env
            .first_of(&["HOME", "USERPROFILE"])
            .chain_err(|| ErrorKind::Credentials("home directory is unknown".to_string()))?;
        Ok(PathBuf::from(home).join(".aws").join("credentials"))
    }

    fn profile(&self) -> String {
        self.env
            .get("AWS_PROFILE")
            .unwrap_or_else(|| "default".to_string())
    }
}

impl ProvideCredentials for ProfileFileProvider {
    fn credentials(&self) -> Result<Credentials> {
        let path = self.path()?;
        let text = std::fs::read_to_string(&path).chain_err(|| {
            ErrorKind::Credentials(format!("cannot read {}", path.display()))
        })?;
        let profile = self.profile();
        let mut sections = parse_profiles(&text);
        let mut section = sections.remove(&profile).chain_err(|| {
            ErrorKind::Credentials(format!("profile {} not found in {}", profile, path.display()))
        })?;
        let access = section.remove("aws_access_key_id");
        let secret = section.remove("aws_secret_access_key");
        match (access, secret) {
            (Some(access), Some(secret)) => Ok(Credentials::new(
                access,
                secret,
                section.remove("aws_session_token"),
            )),
            _ => bail!(ErrorKind::Credentials(format!(
                "profile {} has no static keys",
                profile
            ))),
        }
    }
}

type Section = HashMap<String, String>;

/// Minimal ini parser: `[section]` headers (an optional `profile ` prefix is
/// dropped), `key = value` properties, `#` and `;` comments.
fn parse_profiles(text: &str) -> HashMap<String, Section> {
    let mut sections = HashMap::new();
    let mut current: Option<String> = None;
    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim();
            let name = name.strip_prefix("profile ").unwrap_or(name).trim();
            sections.entry(name.to_string()).or_insert_with(Section::new);
            current = Some(name.to_string());
            continue;
        }
        if let (Some(section), Some((k, v))) = (&current, line.split_once('=')) {
            if let Some(props) = sections.get_mut(section) {
                props.insert(k.trim().to_lowercase(), v.trim().to_string());
            }
        }
    }
    sections
}

/// Environment first, shared credentials file second.
#[derive(Debug, Clone)]
pub struct DefaultChain {
    environment: EnvironmentProvider,
    profile: ProfileFileProvider,
}

impl DefaultChain {
    pub fn new(env: Env) -> Self {
        Self {
            environment: EnvironmentProvider::new(env.clone()),
            profile: ProfileFileProvider::new(env),
        }
    }
}

impl ProvideCredentials for DefaultChain {
    fn credentials(&self) -> Result<Credentials> {
        match self.environment.credentials() {
            Ok(credentials) => {
                debug!("using credentials from the environment");
                Ok(credentials)
            }
            Err(env_err) => {
                debug!(error = %env_err, "falling back to the shared credentials file");
                let credentials = self.profile.credentials().chain_err(|| {
                    ErrorKind::Credentials(format!("no credentials in the environment ({})", env_err))
                })?;
                debug!("using credentials from the shared credentials file");
                Ok(credentials)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn environment_credentials() -> Result<()> {
        let env = Env::from_slice(&[
            ("AWS_ACCESS_KEY_ID", "AKID"),
            ("AWS_SECRET_ACCESS_KEY", "SECRET"),
            ("AWS_SESSION_TOKEN", "TOKEN"),
        ]);
        let credentials = EnvironmentProvider::new(env).credentials()?;
        assert_eq!(
            Credentials::new("AKID", "SECRET", Some("TOKEN".to_string())),
            credentials
        );
        Ok(())
    }

    #[test]
    fn environment_requires_secret() {
        let env = Env::from_slice(&[("AWS_ACCESS_KEY_ID", "AKID")]);
        let err = EnvironmentProvider::new(env).credentials().unwrap_err();
        assert!(err.to_string().contains("AWS_SECRET_ACCESS_KEY"));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let credentials = Credentials::new("AKID", "SECRET", Some("TOKEN".to_string()));
        let text = format!("{:?}", credentials);
        assert!(text.contains("AKID"));
        assert!(!text.contains("SECRET"));
        assert!(!text.contains("TOKEN"));
    }

    #[test]
    fn parse_profile_sections() {
        let sections = parse_profiles(
            "# comment\n[default]\naws_access_key_id = A\naws_secret_access_key=B\n\n[profile dev]\n; other\nAWS_ACCESS_KEY_ID = C\n",
        );
        assert_eq!(Some("A"), sections["default"].get("aws_access_key_id").map(String::as_str));
        assert_eq!(Some("B"), sections["default"].get("aws_secret_access_key").map(String::as_str));
        assert_eq!(Some("C"), sections["dev"].get("aws_access_key_id").map(String::as_str));
    }

    #[test]
    fn chain_falls_back_to_profile_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(
            file,
            "[default]\naws_access_key_id = A\naws_secret_access_key = B\n\n[dev]\naws_access_key_id = C\naws_secret_access_key = D\naws_session_token = E\n"
        )?;
        let path = file.path().to_string_lossy().to_string();

        let env = Env::from_slice(&[("AWS_SHARED_CREDENTIALS_FILE", path.as_str())]);
        assert_eq!(Credentials::new("A", "B", None), DefaultChain::new(env).credentials()?);

        let env = Env::from_slice(&[("AWS_SHARED_CREDENTIALS_FILE", path.as_str()), ("AWS_PROFILE", "dev")]);
        assert_eq!(
            Credentials::new("C", "D", Some("E".to_string())),
            DefaultChain::new(env).credentials()?
        );
        Ok(())
    }

    #[test]
    fn chain_prefers_environment() -> Result<()> {
        let env = Env::from_slice(&[
            ("AWS_ACCESS_KEY_ID", "AKID"),
            ("AWS_SECRET_ACCESS_KEY", "SECRET"),
            ("AWS_SHARED_CREDENTIALS_FILE", "/does/not/exist"),
        ]);
        assert_eq!(Credentials::new("AKID", "SECRET", None), DefaultChain::new(env).credentials()?);
        Ok(())
    }

    #[test]
    fn chain_reports_missing_credentials() {
        let env = Env::from_slice(&[("AWS_SHARED_CREDENTIALS_FILE", "/does/not/exist")]);
        let err = DefaultChain::new(env).credentials().unwrap_err();
        match err.kind() {
            ErrorKind::Credentials(_) => {}
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn missing_profile_is_an_error() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, "[default]\naws_access_key_id = A\naws_secret_access_key = B\n")?;
        let path = file.path().to_string_lossy().to_string();
        let env = Env::from_slice(&[("AWS_SHARED_CREDENTIALS_FILE", path.as_str()), ("AWS_PROFILE", "prod")]);
        let err = ProfileFileProvider::new(env).credentials().unwrap_err();
        assert!(err.to_string().contains("profile prod not found"));
        Ok(())
    }
}
