//! The sync engine: one remote session, one local root.

use std::fs::{self, File};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use mirror_fs::PathMapper;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::backup::{BackupArchiver, DirectoryArchiver};
use crate::config::MirrorConfig;
use crate::metadata::{MetadataStore, USER_OWNER};
use crate::remote::{ConnectionParams, EntryKind, RemoteConnector, RemoteFileStore};
use crate::scheduler::{Scheduler, SchedulerStatus};
use crate::timestamp::ModTime;
use crate::{Error, Result};

use super::cleanup::RemoteSweep;
use super::report::CycleReport;
use super::session::Session;
use super::snapshot::LocalTreeSnapshot;

/// Mirrors a local directory tree onto a remote file store.
///
/// The remote session has a single working-directory cursor, so every
/// operation that touches it (uploads, deletes, full cycles and the
/// scheduler's probes) is serialized through one lock.
pub struct SyncEngine {
    mapper: PathMapper,
    archiver: Box<dyn BackupArchiver>,
    session: Mutex<Session>,
    scheduler: Mutex<Option<Scheduler>>,
}

impl SyncEngine {
    /// Connect, authenticate and load the metadata of `root`.
    pub fn connect(
        root: &Path,
        params: &ConnectionParams,
        connector: &dyn RemoteConnector,
        archiver: Box<dyn BackupArchiver>,
    ) -> Result<Self> {
        let mapper = validate_root(root)?;
        let connect_error = |source| Error::Connect {
            server: params.server.clone(),
            port: params.port,
            source,
        };

        let mut remote = connector
            .connect(&params.server, params.port)
            .map_err(connect_error)?;
        if !remote.login(&params.user, &params.password).map_err(connect_error)? {
            let _ = remote.quit();
            return Err(Error::Authenticate {
                user: params.user.clone(),
            });
        }
        remote.set_binary_mode()?;

        let metadata = MetadataStore::load(mapper.root())?;
        info!(
            server = %params.server,
            port = params.port,
            root = %mapper.root().display(),
            tracked = metadata.tracked_paths().len(),
            "Connected to remote store"
        );
        Ok(Self::assemble(mapper, remote, metadata, archiver))
    }

    /// Build an engine around an already authenticated session.
    pub fn with_session(
        root: &Path,
        remote: Box<dyn RemoteFileStore>,
        metadata: MetadataStore,
        archiver: Box<dyn BackupArchiver>,
    ) -> Result<Self> {
        let mapper = validate_root(root)?;
        Ok(Self::assemble(mapper, remote, metadata, archiver))
    }

    /// Connect using a loaded configuration, backing up into its
    /// configured destination.
    pub fn from_config(config: &MirrorConfig, connector: &dyn RemoteConnector) -> Result<Self> {
        let archiver = DirectoryArchiver::new(config.backup_destination()?);
        Self::connect(&config.root, &config.remote, connector, Box::new(archiver))
    }

    fn assemble(
        mapper: PathMapper,
        remote: Box<dyn RemoteFileStore>,
        metadata: MetadataStore,
        archiver: Box<dyn BackupArchiver>,
    ) -> Self {
        Self {
            mapper,
            archiver,
            session: Mutex::new(Session { remote, metadata }),
            scheduler: Mutex::new(None),
        }
    }

    /// Canonical synced root.
    pub fn root(&self) -> &Path {
        self.mapper.root()
    }

    /// Copy of the current ownership and lifetime mappings.
    pub fn metadata(&self) -> Result<MetadataStore> {
        Ok(self.session()?.metadata.clone())
    }

    fn session(&self) -> Result<MutexGuard<'_, Session>> {
        self.session.lock().map_err(|_| Error::LockPoisoned)
    }

    /// Upload one local file, recording `owner` and an optional lifetime.
    ///
    /// A zero `lifetime` means the file never expires. Returns the remote
    /// path written.
    pub fn upload(&self, file: &Path, owner: &str, lifetime: Duration) -> Result<String> {
        let mut session = self.session()?;
        self.upload_locked(&mut session, file, owner, lifetime)
    }

    fn upload_locked(
        &self,
        session: &mut Session,
        file: &Path,
        owner: &str,
        lifetime: Duration,
    ) -> Result<String> {
        if !file.is_file() {
            return Err(Error::NotAFile {
                path: file.to_path_buf(),
            });
        }
        let remote_path = self.mapper.to_remote(file, false)?;

        let backup = self.archiver.archive(file, &remote_path)?;
        debug!(path = %remote_path, backup = %backup.display(), "Backed up before upload");

        session.ensure_parent_dirs(&remote_path)?;

        let mut reader = File::open(file).map_err(|e| mirror_fs::Error::io(file, e))?;
        session.at_root()?.store(&remote_path, &mut reader)?;

        let modified = ModTime::of_file(file).map_err(|e| mirror_fs::Error::io(file, e))?;
        session
            .remote
            .set_modification_time(&remote_path, modified)?;

        session
            .metadata
            .record(&remote_path, owner, expires_at(lifetime));
        session.metadata.save()?;

        info!(path = %remote_path, owner, modified = %modified, "Uploaded file");
        Ok(remote_path)
    }

    /// Whether the remote copy is missing or its mtime differs from `local`.
    ///
    /// Any difference counts, so a remote copy touched later is replaced
    /// by the local one.
    fn needs_upload(session: &mut Session, remote_path: &str, local: ModTime) -> Result<bool> {
        match session.remote_mod_time(remote_path)? {
            None => Ok(true),
            Some(remote) => Ok(remote != local),
        }
    }

    /// Remove `path` from the remote store and the local tree.
    ///
    /// `path` is a remote path; a missing leading `/` is added. `kind`
    /// only affects how the removal is reported. Local entries that are
    /// already gone are not an error.
    pub fn delete(&self, path: &str, kind: EntryKind) -> Result<()> {
        let remote_path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        let local = self.mapper.to_local(&remote_path);
        let mut session = self.session()?;

        let local_result = match fs::symlink_metadata(&local) {
            Ok(meta) if meta.is_dir() => fs::remove_dir(&local),
            Ok(_) => fs::remove_file(&local),
            Err(e) => Err(e),
        };
        match &local_result {
            Ok(()) => debug!(path = %local.display(), %kind, "Removed local copy"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %local.display(), %kind, "No local copy to remove");
            }
            Err(e) => warn!(path = %local.display(), %kind, error = %e, "Unable to remove local copy"),
        }

        if !session.at_root()?.delete(&remote_path)? {
            warn!(path = %remote_path, %kind, "Unable to delete remote copy");
            return Err(Error::RemoteDelete {
                path: remote_path,
                kind,
            });
        }
        session.forget(&remote_path)?;
        info!(path = %remote_path, %kind, "Deleted");

        match local_result {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                Err(mirror_fs::Error::io(&local, e).into())
            }
            _ => Ok(()),
        }
    }

    /// Run one reconciliation cycle: upload, sweep, probe.
    ///
    /// Failures on individual entries are logged and collected in the
    /// report. Losing the connection aborts the cycle with an error.
    pub fn run_cycle(&self) -> Result<CycleReport> {
        let snapshot = LocalTreeSnapshot::scan(&self.mapper)?;
        let mut report = CycleReport::default();
        let mut session = self.session()?;

        for entry in snapshot.files() {
            let Some(modified) = entry.modified else {
                continue;
            };
            let outcome = match Self::needs_upload(&mut session, &entry.remote, modified) {
                Ok(true) => self
                    .upload_locked(&mut session, &entry.local, USER_OWNER, Duration::ZERO)
                    .map(Some),
                Ok(false) => Ok(None),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(Some(remote)) => report.uploaded.push(remote),
                Ok(None) => {}
                Err(e) if e.is_connectivity() => return Err(e),
                Err(e) => {
                    warn!(path = %entry.remote, error = %e, "Unable to upload");
                    report.record_error(&entry.remote, &e);
                }
            }
        }

        RemoteSweep::new(&mut session, &snapshot, now_ms(), &mut report).run()?;

        if report.is_quiet() && !report.has_errors() {
            debug!("{}", report.summary());
        } else {
            info!("{}", report.summary());
        }

        probe_session(&mut session)?;
        Ok(report)
    }

    /// Send a liveness probe over the session.
    pub fn probe(&self) -> Result<()> {
        probe_session(&mut *self.session()?)
    }

    /// Start running cycles every `interval` on a background thread.
    ///
    /// The first cycle runs one interval after the call. The schedule
    /// halts on its own if the connection is lost.
    pub fn start_sync(self: &Arc<Self>, interval: Duration) -> Result<watch::Receiver<SchedulerStatus>> {
        let mut slot = self.scheduler.lock().map_err(|_| Error::LockPoisoned)?;
        if let Some(existing) = slot.as_ref()
            && !existing.is_finished()
        {
            return Err(Error::SchedulerRunning);
        }

        let scheduler = Scheduler::spawn(Arc::downgrade(self), interval)?;
        let status = scheduler.subscribe();
        *slot = Some(scheduler);
        info!(interval_secs = interval.as_secs(), "Sync scheduled");
        Ok(status)
    }

    /// Stop the background schedule, waiting for an in-flight cycle.
    ///
    /// Returns the final status, or `None` if nothing was scheduled.
    pub fn stop_sync(&self) -> Result<Option<SchedulerStatus>> {
        let scheduler = self
            .scheduler
            .lock()
            .map_err(|_| Error::LockPoisoned)?
            .take();
        Ok(scheduler.map(Scheduler::stop))
    }

    /// Current status of the background schedule, if one was started.
    pub fn sync_status(&self) -> Result<Option<SchedulerStatus>> {
        let slot = self.scheduler.lock().map_err(|_| Error::LockPoisoned)?;
        Ok(slot.as_ref().map(Scheduler::status))
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        if let Ok(slot) = self.scheduler.get_mut()
            && let Some(scheduler) = slot.take()
        {
            scheduler.stop();
        }
        if let Ok(session) = self.session.get_mut()
            && let Err(e) = session.remote.quit()
        {
            debug!(error = %e, "Remote session did not close cleanly");
        }
    }
}

fn validate_root(root: &Path) -> Result<PathMapper> {
    if !root.is_dir() {
        return Err(Error::InvalidRoot {
            path: root.to_path_buf(),
        });
    }
    Ok(PathMapper::new(root)?)
}

fn probe_session(session: &mut Session) -> Result<()> {
    if session.remote.noop()? {
        Ok(())
    } else {
        Err(Error::ConnectionLost)
    }
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn expires_at(lifetime: Duration) -> Option<i64> {
    if lifetime.is_zero() {
        return None;
    }
    let millis = i64::try_from(lifetime.as_millis()).unwrap_or(i64::MAX);
    Some(now_ms().saturating_add(millis))
}
