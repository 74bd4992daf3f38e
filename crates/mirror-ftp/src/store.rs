//! FTP session

use std::io::Read;

use mirror_core::{ModTime, RemoteConnector, RemoteEntry, RemoteFileStore, RemoteResult};
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream, Status};
use tracing::debug;

use crate::listing::parse_listing;
use crate::{accepted, remote_error};

/// Opens plain FTP control connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct FtpConnector;

impl RemoteConnector for FtpConnector {
    fn connect(&self, server: &str, port: u16) -> RemoteResult<Box<dyn RemoteFileStore>> {
        let stream = FtpStream::connect((server, port)).map_err(|e| remote_error("connect", e))?;
        debug!(server, port, welcome = ?stream.get_welcome_msg(), "FTP control connection open");
        Ok(Box::new(FtpStore { stream }))
    }
}

/// One authenticated FTP session.
pub struct FtpStore {
    stream: FtpStream,
}

impl FtpStore {
    pub fn new(stream: FtpStream) -> Self {
        Self { stream }
    }
}

/// The `MFMT` command setting `path`'s modification time.
pub(crate) fn mfmt_command(path: &str, time: ModTime) -> String {
    format!("MFMT {time} {path}")
}

impl RemoteFileStore for FtpStore {
    fn login(&mut self, user: &str, password: &str) -> RemoteResult<bool> {
        accepted("USER", self.stream.login(user, password))
    }

    fn set_binary_mode(&mut self) -> RemoteResult<()> {
        self.stream
            .transfer_type(FileType::Binary)
            .map_err(|e| remote_error("TYPE", e))
    }

    fn change_directory(&mut self, path: &str) -> RemoteResult<bool> {
        accepted("CWD", self.stream.cwd(path))
    }

    fn list(&mut self, path: Option<&str>) -> RemoteResult<Vec<RemoteEntry>> {
        match self.stream.list(path) {
            Ok(lines) => Ok(parse_listing(&lines)),
            // No such file or directory
            Err(FtpError::UnexpectedResponse(response))
                if response.status != Status::NotAvailable =>
            {
                Ok(Vec::new())
            }
            Err(e) => Err(remote_error("LIST", e)),
        }
    }

    fn store(&mut self, path: &str, mut data: &mut dyn Read) -> RemoteResult<()> {
        let written = self
            .stream
            .put_file(path, &mut data)
            .map_err(|e| remote_error("STOR", e))?;
        debug!(path, bytes = written, "Stored file");
        Ok(())
    }

    fn delete(&mut self, path: &str) -> RemoteResult<bool> {
        accepted("DELE", self.stream.rm(path))
    }

    fn make_directory(&mut self, path: &str) -> RemoteResult<bool> {
        accepted("MKD", self.stream.mkdir(path))
    }

    fn remove_directory(&mut self, path: &str) -> RemoteResult<bool> {
        accepted("RMD", self.stream.rmdir(path))
    }

    fn modification_time(&mut self, path: &str) -> RemoteResult<ModTime> {
        self.stream
            .mdtm(path)
            .map(ModTime::from_naive)
            .map_err(|e| remote_error("MDTM", e))
    }

    fn set_modification_time(&mut self, path: &str, time: ModTime) -> RemoteResult<()> {
        self.stream
            .custom_command(mfmt_command(path, time), &[Status::File])
            .map(|_| ())
            .map_err(|e| remote_error("MFMT", e))
    }

    fn noop(&mut self) -> RemoteResult<bool> {
        accepted("NOOP", self.stream.noop())
    }

    fn quit(&mut self) -> RemoteResult<()> {
        self.stream.quit().map_err(|e| remote_error("QUIT", e))
    }
}
