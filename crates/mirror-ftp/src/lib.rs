//! FTP transport for Remote Mirror
//!
//! Implements [`RemoteFileStore`] over a plain FTP control connection
//! using `suppaftp`. Transfers run in binary mode.
//!
//! | Operation                | Command               |
//! |--------------------------|-----------------------|
//! | `change_directory`       | `CWD`                 |
//! | `list`                   | `LIST`                |
//! | `store`                  | `STOR`                |
//! | `delete`                 | `DELE`                |
//! | `make_directory`         | `MKD`                 |
//! | `remove_directory`       | `RMD`                 |
//! | `modification_time`      | `MDTM`                |
//! | `set_modification_time`  | `MFMT`                |
//! | `noop`                   | `NOOP`                |
//!
//! A negative reply on a yes/no operation is reported as `false`; a broken
//! transport is a [`RemoteError::Connection`].

mod listing;
mod store;

pub use listing::parse_listing;
pub use store::{FtpConnector, FtpStore};

use mirror_core::RemoteError;
use suppaftp::{FtpError, Status};

/// Map a suppaftp failure onto the remote error taxonomy.
pub(crate) fn remote_error(operation: &'static str, error: FtpError) -> RemoteError {
    match error {
        FtpError::ConnectionError(e) => RemoteError::connection(operation, e.to_string()),
        FtpError::UnexpectedResponse(response) if response.status == Status::NotAvailable => {
            RemoteError::connection(operation, "service closing control connection")
        }
        other => RemoteError::protocol(operation, other.to_string()),
    }
}

/// Turn a command outcome into accepted/refused, keeping transport
/// failures as errors.
pub(crate) fn accepted<T>(
    operation: &'static str,
    result: suppaftp::FtpResult<T>,
) -> mirror_core::RemoteResult<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(FtpError::UnexpectedResponse(response)) if response.status != Status::NotAvailable => {
            tracing::debug!(operation, status = ?response.status, "Request refused");
            Ok(false)
        }
        Err(e) => Err(remote_error(operation, e)),
    }
}
