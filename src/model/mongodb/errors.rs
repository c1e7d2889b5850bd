//! The mongodb crate doesn't provide error code constants, so the ones we
//! need live here.

use mongodb::error::{Error as DbError, ErrorKind, WriteFailure};

pub const DUPLICATE_KEY: i32 = 11000;

/// Return true if the given result is a duplicate key write error.
pub fn is_duplicate_key_error<T>(result: Result<T, &DbError>) -> bool {
    match result {
        Err(err) => match *err.kind {
            ErrorKind::Write(WriteFailure::WriteError(ref e)) => e.code == DUPLICATE_KEY,
            ErrorKind::BulkWrite(ref failure) => failure
                .write_errors
                .iter()
                .flatten()
                .any(|e| e.code == DUPLICATE_KEY),
            _ => false,
        },
        Ok(_) => false,
    }
}
