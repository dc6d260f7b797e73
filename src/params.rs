//! Invocation parameters.
use std::ffi::OsString;
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, CommandFactory, Parser};

use crate::errors::*;
use crate::operation::Target;

/// Long options that may also be spelled with a single dash, e.g. `-role`.
const SINGLE_DASH_LONG: [&str; 4] = ["role", "file", "expiration", "transfer"];

/// Generate a pre-signed url for an S3 object, GET without input and PUT with
/// input, or perform the request directly
#[derive(Parser, Debug)]
#[command(name = "aws-presign", version)]
#[command(override_usage = "aws-presign [OPTIONS] bucket key")]
pub struct Args {
    /// iam role to assume
    #[arg(long, value_name = "ARN")]
    pub role: Option<String>,

    /// path to file for a PUT request, "-" reads standard input
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<String>,

    /// duration before presigned url expiration
    #[arg(short, long, default_value = "15m", value_name = "DURATION")]
    pub expiration: String,

    /// perform the actual request instead of presigning a url
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new(),
    )]
    pub transfer: bool,

    /// bucket and key
    #[arg(value_name = "bucket key")]
    pub positional: Vec<String>,
}

/// Validated parameters of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Params {
    pub target: Target,
    pub role: Option<String>,
    pub expiration: Duration,
    pub file: Option<String>,
    pub transfer: bool,
}

impl TryFrom<Args> for Params {
    type Error = Error;

    fn try_from(args: Args) -> Result<Self> {
        let (bucket, key) = match args.positional.as_slice() {
            [bucket, key] if !bucket.is_empty() && !key.is_empty() => {
                (bucket.clone(), key.clone())
            }
            _ => bail!(ErrorKind::Usage(
                "bucket and key are required fields".to_string()
            )),
        };
        let expiration = humantime::parse_duration(&args.expiration).map_err(|err| {
            ErrorKind::Usage(format!(
                "unable to parse expiration {:?}: {}",
                args.expiration, err
            ))
        })?;
        Ok(Params {
            target: Target::new(bucket, key),
            role: args.role.filter(|r| !r.is_empty()),
            expiration,
            file: args.file.filter(|f| !f.is_empty()),
            transfer: args.transfer,
        })
    }
}

impl Params {
    /// Parse and validate `argv`; clap errors and `--help` exit the process,
    /// validation failures are returned as `ErrorKind::Usage`.
    pub fn parse_from<I, T>(argv: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Params::try_from(Args::parse_from(normalize_args(argv)))
    }
}

/// Print a usage error the way clap reports its own and exit.
pub fn exit_usage(err: &Error) -> ! {
    Args::command()
        .error(clap::error::ErrorKind::ValueValidation, err)
        .exit()
}

/// Rewrite `-role`, `-file`, `-expiration` and `-transfer` (optionally with
/// `=value`) to their double dash form. Arguments after `--` are untouched.
pub fn normalize_args<I, T>(argv: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut options_done = false;
    argv.into_iter()
        .map(Into::into)
        .map(|arg: OsString| {
            if options_done {
                return arg;
            }
            let Some(text) = arg.to_str() else {
                return arg;
            };
            if text == "--" {
                options_done = true;
                return arg;
            }
            match text.strip_prefix('-') {
                Some(rest) if !rest.starts_with('-') => {
                    let name = rest.split_once('=').map_or(rest, |(n, _)| n);
                    if SINGLE_DASH_LONG.contains(&name) {
                        OsString::from(format!("-{}", text))
                    } else {
                        arg
                    }
                }
                _ => arg,
            }
        })
        .collect()
}
