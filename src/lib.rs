//! Pre-signed URLs for S3 `GET`/`PUT` requests.
//!
//! Given a bucket, a key and an optional input source this crate either
//! generates a time-limited, pre-signed URL for the matching operation or
//! performs the transfer itself:
//!
//! * no input: `GET` (download, object bytes written to the output);
//! * input present: `PUT` (upload, object location written to the output).
//!
//! Requests are signed with AWS Signature Version 4, see [`sigv4`].
//! Credentials are read from the environment or the shared credentials file
//! and can optionally be exchanged for the credentials of an assumed role
//! through STS, see [`credentials`] and [`sts`].
//!
//! reference: https://docs.aws.amazon.com/AmazonS3/latest/API/sigv4-query-string-auth.html
#[macro_use]
extern crate error_chain;

pub mod errors {
    error_chain! {
        foreign_links {
            Io(std::io::Error);
            Url(url::ParseError);
        }

        errors {
            Usage(msg: String) {
                description("usage error")
                display("{}", msg)
            }
            Credentials(msg: String) {
                description("unable to resolve credentials")
                display("unable to resolve credentials: {}", msg)
            }
            Http(status: u16, body: String) {
                description("request failed")
                display("request failed with status {}: {}", status, body)
            }
            Sts(msg: String) {
                description("invalid STS response")
                display("invalid STS response: {}", msg)
            }
            InvalidExpiration(seconds: u64) {
                description("invalid expiration")
                display(
                    "pre-signed URL expiration must be between 1 and {} seconds, got {}",
                    crate::sigv4::MAX_PRESIGN_EXPIRATION,
                    seconds
                )
            }
        }
    }
}

pub mod client;
pub mod command;
pub mod config;
pub mod credentials;
pub mod env;
pub mod input;
pub mod operation;
pub mod params;
pub mod sigv4;
pub mod sts;

pub use client::{Client, ObjectStore, TransferOutcome};
pub use command::run;
pub use errors::{Error, ErrorKind, Result};
pub use input::Payload;
pub use operation::Operation;
pub use params::Params;
