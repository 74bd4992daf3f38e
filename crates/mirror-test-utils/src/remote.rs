//! In-memory [`RemoteFileStore`].
//!
//! Every clone shares the same state, so a test keeps one handle for
//! assertions while the engine owns another.

use std::collections::{BTreeMap, HashSet};
use std::io::Read;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use mirror_core::{
    ModTime, RemoteConnector, RemoteEntry, RemoteError, RemoteFileStore, RemoteResult,
};

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File { data: Vec<u8>, modified: ModTime },
}

#[derive(Debug)]
struct State {
    /// Absolute paths without trailing slash; the root is implicit
    nodes: BTreeMap<String, Node>,
    cwd: String,
    credentials: Option<(String, String)>,
    stores: usize,
    deletes: usize,
    removed_dirs: usize,
    noops: usize,
    fail_noop: bool,
    disconnected: bool,
    fail_make_directory: HashSet<String>,
    fail_store: HashSet<String>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
            cwd: "/".into(),
            credentials: None,
            stores: 0,
            deletes: 0,
            removed_dirs: 0,
            noops: 0,
            fail_noop: false,
            disconnected: false,
            fail_make_directory: HashSet::new(),
            fail_store: HashSet::new(),
        }
    }
}

impl State {
    fn resolve(&self, path: &str) -> String {
        let mut segments: Vec<&str> = if path.starts_with('/') {
            Vec::new()
        } else {
            self.cwd.split('/').filter(|s| !s.is_empty()).collect()
        };
        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                name => segments.push(name),
            }
        }
        format!("/{}", segments.join("/"))
    }

    fn is_dir(&self, abs: &str) -> bool {
        abs == "/" || matches!(self.nodes.get(abs), Some(Node::Dir))
    }

    fn parent_of(abs: &str) -> &str {
        match abs.rfind('/') {
            Some(0) | None => "/",
            Some(index) => &abs[..index],
        }
    }

    fn children(&self, dir: &str) -> Vec<RemoteEntry> {
        self.nodes
            .iter()
            .filter(|(path, _)| Self::parent_of(path) == dir)
            .map(|(path, node)| {
                let name = path.rsplit('/').next().unwrap_or_default();
                match node {
                    Node::Dir => RemoteEntry::directory(name),
                    Node::File { .. } => RemoteEntry::file(name),
                }
            })
            .collect()
    }

    fn check(&self, operation: &'static str) -> RemoteResult<()> {
        if self.disconnected {
            Err(RemoteError::connection(operation, "connection closed by peer"))
        } else {
            Ok(())
        }
    }

    fn insert_parents(&mut self, abs: &str) {
        let mut current = String::new();
        let parent = Self::parent_of(abs);
        for segment in parent.split('/').filter(|s| !s.is_empty()) {
            current.push('/');
            current.push_str(segment);
            self.nodes.entry(current.clone()).or_insert(Node::Dir);
        }
    }
}

/// Shared-state in-memory remote store.
#[derive(Debug, Clone, Default)]
pub struct MemoryRemoteStore {
    state: Arc<Mutex<State>>,
}

impl MemoryRemoteStore {
    /// An empty store that accepts any login.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty store that only accepts `user`/`password`.
    pub fn with_credentials(user: &str, password: &str) -> Self {
        let store = Self::new();
        store.state().credentials = Some((user.into(), password.into()));
        store
    }

    /// A boxed handle sharing this store's state.
    pub fn boxed(&self) -> Box<dyn RemoteFileStore> {
        Box::new(self.clone())
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Seed a file, creating parent directories.
    pub fn put_file(&self, path: &str, data: &[u8], modified: ModTime) {
        let mut state = self.state();
        let abs = state.resolve(path);
        state.insert_parents(&abs);
        state.nodes.insert(
            abs,
            Node::File {
                data: data.to_vec(),
                modified,
            },
        );
    }

    /// Seed a directory, creating parent directories.
    pub fn put_dir(&self, path: &str) {
        let mut state = self.state();
        let abs = state.resolve(path);
        state.insert_parents(&abs);
        state.nodes.insert(abs, Node::Dir);
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        let state = self.state();
        match state.nodes.get(&state.resolve(path)) {
            Some(Node::File { data, .. }) => Some(data.clone()),
            _ => None,
        }
    }

    pub fn file_text(&self, path: &str) -> Option<String> {
        self.file(path)
            .map(|data| String::from_utf8_lossy(&data).into_owned())
    }

    pub fn mod_time(&self, path: &str) -> Option<ModTime> {
        let state = self.state();
        match state.nodes.get(&state.resolve(path)) {
            Some(Node::File { modified, .. }) => Some(*modified),
            _ => None,
        }
    }

    pub fn exists(&self, path: &str) -> bool {
        let state = self.state();
        let abs = state.resolve(path);
        abs == "/" || state.nodes.contains_key(&abs)
    }

    pub fn is_dir(&self, path: &str) -> bool {
        let state = self.state();
        state.is_dir(&state.resolve(path))
    }

    /// Every entry, directories with a trailing `/`, in sorted order.
    pub fn paths(&self) -> Vec<String> {
        self.state()
            .nodes
            .iter()
            .map(|(path, node)| match node {
                Node::Dir => format!("{path}/"),
                Node::File { .. } => path.clone(),
            })
            .collect()
    }

    /// Current working directory of the shared cursor.
    pub fn cwd(&self) -> String {
        self.state().cwd.clone()
    }

    /// Move the shared cursor, as another client of the session would.
    pub fn set_cwd(&self, path: &str) {
        let mut state = self.state();
        state.cwd = state.resolve(path);
    }

    pub fn stores(&self) -> usize {
        self.state().stores
    }

    pub fn deletes(&self) -> usize {
        self.state().deletes
    }

    pub fn removed_dirs(&self) -> usize {
        self.state().removed_dirs
    }

    pub fn noops(&self) -> usize {
        self.state().noops
    }

    /// Make NOOP answer negatively.
    pub fn fail_noop(&self, fail: bool) {
        self.state().fail_noop = fail;
    }

    /// Drop the transport: every later call fails with a connection error.
    pub fn disconnect(&self) {
        self.state().disconnected = true;
    }

    /// Refuse to create directories named `segment`.
    pub fn fail_make_directory(&self, segment: &str) {
        self.state().fail_make_directory.insert(segment.into());
    }

    /// Reject uploads to `path`.
    pub fn fail_store(&self, path: &str) {
        let mut state = self.state();
        let abs = state.resolve(path);
        state.fail_store.insert(abs);
    }
}

impl RemoteFileStore for MemoryRemoteStore {
    fn login(&mut self, user: &str, password: &str) -> RemoteResult<bool> {
        let state = self.state();
        state.check("USER")?;
        Ok(match &state.credentials {
            Some((expected_user, expected_password)) => {
                expected_user == user && expected_password == password
            }
            None => true,
        })
    }

    fn set_binary_mode(&mut self) -> RemoteResult<()> {
        self.state().check("TYPE")
    }

    fn change_directory(&mut self, path: &str) -> RemoteResult<bool> {
        let mut state = self.state();
        state.check("CWD")?;
        let abs = state.resolve(path);
        if state.is_dir(&abs) {
            state.cwd = abs;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn list(&mut self, path: Option<&str>) -> RemoteResult<Vec<RemoteEntry>> {
        let state = self.state();
        state.check("LIST")?;
        let abs = state.resolve(path.unwrap_or("."));
        if state.is_dir(&abs) {
            // Only a bare LIST reports the navigation entries
            let mut entries = match path {
                None => vec![RemoteEntry::directory("."), RemoteEntry::directory("..")],
                Some(_) => Vec::new(),
            };
            entries.extend(state.children(&abs));
            return Ok(entries);
        }
        Ok(match state.nodes.get(&abs) {
            Some(Node::File { .. }) => {
                let name = abs.rsplit('/').next().unwrap_or_default();
                vec![RemoteEntry::file(name)]
            }
            _ => Vec::new(),
        })
    }

    fn store(&mut self, path: &str, data: &mut dyn Read) -> RemoteResult<()> {
        let mut state = self.state();
        state.check("STOR")?;
        let abs = state.resolve(path);
        if state.fail_store.contains(&abs) {
            return Err(RemoteError::protocol("STOR", format!("553 {abs}: permission denied")));
        }
        if !state.is_dir(State::parent_of(&abs)) || state.is_dir(&abs) {
            return Err(RemoteError::protocol("STOR", format!("553 {abs}: no such directory")));
        }
        let mut bytes = Vec::new();
        data.read_to_end(&mut bytes)
            .map_err(|source| RemoteError::LocalRead {
                operation: "STOR",
                source,
            })?;
        state.nodes.insert(
            abs,
            Node::File {
                data: bytes,
                modified: ModTime::from_system_time(SystemTime::now()),
            },
        );
        state.stores += 1;
        Ok(())
    }

    fn delete(&mut self, path: &str) -> RemoteResult<bool> {
        let mut state = self.state();
        state.check("DELE")?;
        let abs = state.resolve(path);
        if matches!(state.nodes.get(&abs), Some(Node::File { .. })) {
            state.nodes.remove(&abs);
            state.deletes += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn make_directory(&mut self, path: &str) -> RemoteResult<bool> {
        let mut state = self.state();
        state.check("MKD")?;
        let abs = state.resolve(path);
        let name = abs.rsplit('/').next().unwrap_or_default();
        if state.fail_make_directory.contains(name) {
            return Ok(false);
        }
        if state.nodes.contains_key(&abs) || !state.is_dir(State::parent_of(&abs)) {
            return Ok(false);
        }
        state.nodes.insert(abs, Node::Dir);
        Ok(true)
    }

    fn remove_directory(&mut self, path: &str) -> RemoteResult<bool> {
        let mut state = self.state();
        state.check("RMD")?;
        let abs = state.resolve(path);
        if abs == "/" || !state.is_dir(&abs) || !state.children(&abs).is_empty() {
            return Ok(false);
        }
        state.nodes.remove(&abs);
        state.removed_dirs += 1;
        if state.cwd == abs || state.cwd.starts_with(&format!("{abs}/")) {
            state.cwd = "/".into();
        }
        Ok(true)
    }

    fn modification_time(&mut self, path: &str) -> RemoteResult<ModTime> {
        let state = self.state();
        state.check("MDTM")?;
        let abs = state.resolve(path);
        match state.nodes.get(&abs) {
            Some(Node::File { modified, .. }) => Ok(*modified),
            _ => Err(RemoteError::protocol("MDTM", format!("550 {abs}: not a plain file"))),
        }
    }

    fn set_modification_time(&mut self, path: &str, time: ModTime) -> RemoteResult<()> {
        let mut state = self.state();
        state.check("MFMT")?;
        let abs = state.resolve(path);
        match state.nodes.get_mut(&abs) {
            Some(Node::File { modified, .. }) => {
                *modified = time;
                Ok(())
            }
            _ => Err(RemoteError::protocol("MFMT", format!("550 {abs}: not a plain file"))),
        }
    }

    fn noop(&mut self) -> RemoteResult<bool> {
        let mut state = self.state();
        state.check("NOOP")?;
        state.noops += 1;
        Ok(!state.fail_noop)
    }
}

/// Hands out handles to one shared [`MemoryRemoteStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    store: MemoryRemoteStore,
    refuse: bool,
}

impl MemoryConnector {
    pub fn new(store: MemoryRemoteStore) -> Self {
        Self {
            store,
            refuse: false,
        }
    }

    /// A connector whose server is unreachable.
    pub fn unreachable() -> Self {
        Self {
            store: MemoryRemoteStore::new(),
            refuse: true,
        }
    }
}

impl RemoteConnector for MemoryConnector {
    fn connect(&self, server: &str, port: u16) -> RemoteResult<Box<dyn RemoteFileStore>> {
        if self.refuse {
            return Err(RemoteError::connection(
                "connect",
                format!("{server}:{port} refused the connection"),
            ));
        }
        Ok(self.store.boxed())
    }
}
