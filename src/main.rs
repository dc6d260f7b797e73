//! Print a pre-signed url for an S3 object, or perform the request.
//! Usage:
//! ```shell
//! # pre-signed GET url, valid for 15 minutes
//! $ aws-presign bucket key
//! # pre-signed PUT url, valid for one hour
//! $ echo data | aws-presign -e 1h bucket key
//! # upload a file with the credentials of an assumed role
//! $ aws-presign -role arn:aws:iam::123456789012:role/uploader -file data.bin -transfer bucket key
//! # download an object
//! $ aws-presign -transfer bucket key > object
//! ```
//! Log output goes to standard error, filtered through `AWS_PRESIGN_LOG`
//! (e.g. `AWS_PRESIGN_LOG=debug`).
use std::io::{self, IsTerminal};
use std::process;

use aws_presign::errors::Result;
use aws_presign::input::resolve_input;
use aws_presign::params::{self, Params};
use aws_presign::Client;
use error_chain::ChainedError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("AWS_PRESIGN_LOG").unwrap_or_else(|_| "warn".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(io::stderr().is_terminal()),
        )
        .init();

    let params = match Params::parse_from(std::env::args_os()) {
        Ok(params) => params,
        Err(err) => params::exit_usage(&err),
    };
    if let Err(err) = execute(&params) {
        eprintln!("{}", err.display_chain());
        process::exit(1);
    }
}

fn execute(params: &Params) -> Result<()> {
    let stdin = io::stdin();
    let piped = !stdin.is_terminal();
    let input = resolve_input(params.file.as_deref(), piped, stdin.lock())?;
    let client = Client::builder().role(params.role.as_deref()).build()?;
    aws_presign::run(params, input, &client, &mut io::stdout().lock())
}
