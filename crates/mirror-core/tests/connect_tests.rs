//! Engine construction through a connector

use mirror_core::{ConnectionParams, DirectoryArchiver, Error, SyncEngine};
use mirror_test_utils::{MemoryConnector, MemoryRemoteStore, TestTree};

fn params() -> ConnectionParams {
    ConnectionParams::new("ftp.example", 2121, "camera", "pw")
}

fn archiver(tree: &TestTree) -> Box<DirectoryArchiver> {
    Box::new(tree.archiver())
}

#[test]
fn test_connect_loads_existing_metadata() {
    let tree = TestTree::new();
    let mut metadata = tree.metadata();
    metadata.record("/kept.txt", "user", None);
    metadata.save().unwrap();
    let connector = MemoryConnector::new(MemoryRemoteStore::with_credentials("camera", "pw"));

    let engine = SyncEngine::connect(tree.root(), &params(), &connector, archiver(&tree))
        .expect("Connect should succeed");

    assert_eq!(engine.metadata().unwrap().owner("/kept.txt"), Some("user"));
}

#[test]
fn test_wrong_credentials_fail_authentication() {
    let tree = TestTree::new();
    let connector = MemoryConnector::new(MemoryRemoteStore::with_credentials("camera", "other"));

    let result = SyncEngine::connect(tree.root(), &params(), &connector, archiver(&tree));

    assert!(matches!(result, Err(Error::Authenticate { ref user }) if user == "camera"));
}

#[test]
fn test_unreachable_server_fails_to_connect() {
    let tree = TestTree::new();

    let result = SyncEngine::connect(
        tree.root(),
        &params(),
        &MemoryConnector::unreachable(),
        archiver(&tree),
    );

    let Err(Error::Connect { server, port, .. }) = result else {
        panic!("expected a connect error");
    };
    assert_eq!((server.as_str(), port), ("ftp.example", 2121));
}

#[test]
fn test_missing_root_is_rejected_before_connecting() {
    let tree = TestTree::new();
    let missing = tree.path("does-not-exist");

    let result = SyncEngine::connect(
        &missing,
        &params(),
        &MemoryConnector::unreachable(),
        archiver(&tree),
    );

    assert!(matches!(result, Err(Error::InvalidRoot { .. })));
}

#[test]
fn test_file_as_root_is_rejected() {
    let tree = TestTree::new();
    let file = tree.write("plain.txt", "x");

    let result = SyncEngine::with_session(
        &file,
        MemoryRemoteStore::new().boxed(),
        tree.metadata(),
        archiver(&tree),
    );

    assert!(matches!(result, Err(Error::InvalidRoot { .. })));
}
