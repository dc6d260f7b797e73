//! Command processing: pre-sign or transfer, then write the result.
use std::io::{self, Cursor, Write};

use tracing::debug;

use crate::client::{ObjectStore, TransferOutcome};
use crate::errors::*;
use crate::input::Payload;
use crate::operation::Operation;
use crate::params::Params;

/// Run one invocation against `store`, writing to `out`:
///
/// * pre-sign mode: the url, without trailing newline;
/// * download: the object bytes, verbatim;
/// * upload: the object location, without trailing newline.
pub fn run<S, W>(params: &Params, input: Option<Payload>, store: &S, out: &mut W) -> Result<()>
where
    S: ObjectStore + ?Sized,
    W: Write,
{
    let operation = Operation::select(params.target.clone(), input);
    debug!(
        method = operation.method(),
        bucket = %params.target.bucket,
        key = %params.target.key,
        transfer = params.transfer,
        "selected operation"
    );
    if params.transfer {
        match store.transfer(operation)? {
            TransferOutcome::Downloaded(bytes) => {
                io::copy(&mut Cursor::new(bytes), out)
                    .chain_err(|| "unable to write object to output")?;
            }
            TransferOutcome::Uploaded(location) => write!(out, "{}", location)?,
        }
    } else {
        let url = store.presign(&operation, params.expiration)?;
        write!(out, "{}", url)?;
    }
    out.flush()?;
    Ok(())
}
