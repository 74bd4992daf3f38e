//! End-to-end reconciliation tests against the in-memory remote store

use std::time::Duration;

use mirror_core::{CycleReport, EntryKind, Error, USER_OWNER};
use mirror_test_utils::{MemoryRemoteStore, TestTree, mod_time};
use pretty_assertions::assert_eq;

const T: i64 = 1_700_000_000;

fn seeded_metadata(tree: &TestTree, entries: &[(&str, &str, Option<i64>)]) {
    let mut metadata = tree.metadata();
    for (path, owner, expiry) in entries {
        metadata.record(path, owner, *expiry);
    }
    metadata.save().expect("Should persist seeded metadata");
}

mod upload_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_file_is_uploaded_with_mtime() {
        let tree = TestTree::new();
        tree.write_at("docs/a.txt", "hello", T);
        let remote = MemoryRemoteStore::new();
        let engine = tree.engine(&remote);

        let report = engine.run_cycle().expect("Cycle should succeed");

        assert_eq!(report.uploaded, vec!["/docs/a.txt".to_string()]);
        assert!(remote.is_dir("/docs"));
        assert_eq!(remote.file_text("/docs/a.txt").as_deref(), Some("hello"));
        assert_eq!(remote.mod_time("/docs/a.txt"), Some(mod_time(T as u64)));

        let metadata = tree.metadata();
        assert_eq!(metadata.owner("/docs/a.txt"), Some(USER_OWNER));
        assert_eq!(metadata.expiry("/docs/a.txt"), None);
        assert!(tree.backup_dir().join("docs").join("a.txt").is_file());
    }

    #[test]
    fn test_second_cycle_is_quiet() {
        let tree = TestTree::new();
        tree.write_at("a.txt", "a", T);
        tree.write_at("nested/deeper/b.txt", "b", T);
        let remote = MemoryRemoteStore::new();
        let engine = tree.engine(&remote);

        engine.run_cycle().expect("First cycle should succeed");
        let second = engine.run_cycle().expect("Second cycle should succeed");

        assert_eq!(second, CycleReport::default());
        assert_eq!(remote.stores(), 2);
        assert_eq!(remote.noops(), 2);
    }

    #[test]
    fn test_locally_newer_file_is_uploaded_again() {
        let tree = TestTree::new();
        tree.write_at("a.txt", "v1", T);
        let remote = MemoryRemoteStore::new();
        let engine = tree.engine(&remote);
        engine.run_cycle().unwrap();

        tree.write_at("a.txt", "v2", T + 10);
        let report = engine.run_cycle().unwrap();

        assert_eq!(report.uploaded, vec!["/a.txt".to_string()]);
        assert_eq!(remote.file_text("/a.txt").as_deref(), Some("v2"));
        assert_eq!(remote.mod_time("/a.txt"), Some(mod_time((T + 10) as u64)));
    }

    #[test]
    fn test_remote_copy_with_other_mtime_is_replaced() {
        let tree = TestTree::new();
        tree.write_at("a.txt", "local", T);
        let remote = MemoryRemoteStore::new();
        remote.put_file("/a.txt", b"remote", mod_time((T + 100) as u64));
        let engine = tree.engine(&remote);

        let report = engine.run_cycle().unwrap();

        assert_eq!(report.uploaded, vec!["/a.txt".to_string()]);
        assert_eq!(remote.file_text("/a.txt").as_deref(), Some("local"));
        assert_eq!(remote.mod_time("/a.txt"), Some(mod_time(T as u64)));
    }

    #[test]
    fn test_matching_remote_copy_is_left_alone() {
        let tree = TestTree::new();
        tree.write_at("a.txt", "local", T);
        let remote = MemoryRemoteStore::new();
        remote.put_file("/a.txt", b"same", mod_time(T as u64));
        let engine = tree.engine(&remote);

        let report = engine.run_cycle().unwrap();

        assert!(report.is_quiet());
        assert_eq!(remote.stores(), 0);
    }

    #[test]
    fn test_metadata_files_are_not_mirrored() {
        let tree = TestTree::new();
        tree.write_at("a.txt", "a", T);
        let remote = MemoryRemoteStore::new();
        let engine = tree.engine(&remote);

        engine.run_cycle().unwrap();
        engine.run_cycle().unwrap();

        assert_eq!(remote.paths(), vec!["/a.txt".to_string()]);
    }

    #[test]
    fn test_direct_upload_records_owner_and_lifetime() {
        let tree = TestTree::new();
        let file = tree.write_at("photos/2024/p.jpg", "jpeg", T);
        let remote = MemoryRemoteStore::new();
        let engine = tree.engine(&remote);

        let remote_path = engine
            .upload(&file, "camera", Duration::from_secs(60))
            .expect("Upload should succeed");

        assert_eq!(remote_path, "/photos/2024/p.jpg");
        assert!(remote.is_dir("/photos/2024"));
        let metadata = tree.metadata();
        assert_eq!(metadata.owner(&remote_path), Some("camera"));
        let expiry = metadata.expiry(&remote_path).expect("Lifetime should be recorded");
        assert!(expiry > chrono::Utc::now().timestamp_millis());
    }

    #[test]
    fn test_upload_resets_a_drifted_cursor() {
        let tree = TestTree::new();
        let file = tree.write_at("top.txt", "x", T);
        let remote = MemoryRemoteStore::new();
        remote.put_dir("/elsewhere");
        remote.set_cwd("/elsewhere");
        let engine = tree.engine(&remote);

        engine.upload(&file, USER_OWNER, Duration::ZERO).unwrap();

        assert!(remote.exists("/top.txt"));
        assert!(!remote.exists("/elsewhere/top.txt"));
    }

    #[test]
    fn test_upload_of_directory_is_rejected() {
        let tree = TestTree::new();
        let dir = tree.mkdir("docs");
        let engine = tree.engine(&MemoryRemoteStore::new());

        let err = engine.upload(&dir, USER_OWNER, Duration::ZERO).unwrap_err();
        assert!(matches!(err, Error::NotAFile { .. }), "got: {err}");
    }

    #[test]
    fn test_upload_outside_root_is_rejected() {
        let tree = TestTree::new();
        let outside = tempfile::NamedTempFile::new().unwrap();
        let engine = tree.engine(&MemoryRemoteStore::new());

        let err = engine
            .upload(outside.path(), USER_OWNER, Duration::ZERO)
            .unwrap_err();
        assert!(
            matches!(err, Error::Fs(mirror_fs::Error::OutsideRoot { .. })),
            "got: {err}"
        );
    }

    #[test]
    fn test_directory_creation_failure_names_segment() {
        let tree = TestTree::new();
        tree.write_at("photos/a.jpg", "a", T);
        tree.write_at("b.txt", "b", T);
        let remote = MemoryRemoteStore::new();
        remote.fail_make_directory("photos");
        let engine = tree.engine(&remote);

        let report = engine.run_cycle().expect("Per-item failures do not abort");

        assert_eq!(report.uploaded, vec!["/b.txt".to_string()]);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("'photos'"), "got: {:?}", report.errors);
        assert!(!remote.exists("/photos/a.jpg"));
    }

    #[test]
    fn test_rejected_store_is_reported_and_skipped() {
        let tree = TestTree::new();
        tree.write_at("a.txt", "a", T);
        tree.write_at("b.txt", "b", T);
        let remote = MemoryRemoteStore::new();
        remote.fail_store("/a.txt");
        let engine = tree.engine(&remote);

        let report = engine.run_cycle().unwrap();

        assert_eq!(report.uploaded, vec!["/b.txt".to_string()]);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(tree.metadata().owner("/a.txt"), None);
    }

    #[test]
    fn test_ambiguous_listing_is_a_per_item_error() {
        let tree = TestTree::new();
        tree.write_at("clash", "file locally", T);
        let remote = MemoryRemoteStore::new();
        remote.put_file("/clash/one", b"1", mod_time(T as u64));
        remote.put_file("/clash/two", b"2", mod_time(T as u64));
        let engine = tree.engine(&remote);

        let report = engine.run_cycle().unwrap();

        assert!(report.uploaded.is_empty());
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("2 entries"), "got: {:?}", report.errors);
    }
}

mod cleanup_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_foreign_orphan_is_deleted() {
        let tree = TestTree::new();
        let remote = MemoryRemoteStore::new();
        remote.put_file("/stale.txt", b"old", mod_time(T as u64));
        seeded_metadata(&tree, &[("/stale.txt", "camera", None)]);
        let engine = tree.engine(&remote);

        let report = engine.run_cycle().unwrap();

        assert_eq!(report.deleted, vec!["/stale.txt".to_string()]);
        assert!(!remote.exists("/stale.txt"));
        assert!(tree.metadata().is_empty());
    }

    #[test]
    fn test_untracked_orphan_is_deleted() {
        let tree = TestTree::new();
        let remote = MemoryRemoteStore::new();
        remote.put_file("/unknown.bin", b"?", mod_time(T as u64));
        let engine = tree.engine(&remote);

        let report = engine.run_cycle().unwrap();

        assert_eq!(report.deleted, vec!["/unknown.bin".to_string()]);
    }

    #[test]
    fn test_user_owned_orphan_is_protected() {
        let tree = TestTree::new();
        let remote = MemoryRemoteStore::new();
        remote.put_file("/keep.txt", b"mine", mod_time(T as u64));
        seeded_metadata(&tree, &[("/keep.txt", USER_OWNER, None)]);
        let engine = tree.engine(&remote);

        let report = engine.run_cycle().unwrap();

        assert!(report.is_quiet());
        assert!(remote.exists("/keep.txt"));
        assert_eq!(tree.metadata().owner("/keep.txt"), Some(USER_OWNER));
    }

    #[test]
    fn test_expired_entry_is_deleted_even_when_present_locally() {
        let tree = TestTree::new();
        tree.write_at("report.pdf", "pdf", T);
        let remote = MemoryRemoteStore::new();
        remote.put_file("/report.pdf", b"pdf", mod_time(T as u64));
        seeded_metadata(&tree, &[("/report.pdf", USER_OWNER, Some(1))]);
        let engine = tree.engine(&remote);

        let report = engine.run_cycle().unwrap();

        assert_eq!(report.deleted, vec!["/report.pdf".to_string()]);
        let metadata = tree.metadata();
        assert_eq!(metadata.owner("/report.pdf"), None);
        assert_eq!(metadata.expiry("/report.pdf"), None);
    }

    #[test]
    fn test_short_lifetime_expires_on_a_later_cycle() {
        let tree = TestTree::new();
        let file = tree.write_at("tmp.txt", "t", T);
        let remote = MemoryRemoteStore::new();
        let engine = tree.engine(&remote);

        engine
            .upload(&file, "camera", Duration::from_millis(1))
            .unwrap();
        std::thread::sleep(Duration::from_millis(20));
        let report = engine.run_cycle().unwrap();

        assert_eq!(report.deleted, vec!["/tmp.txt".to_string()]);
        assert!(!remote.exists("/tmp.txt"));
    }

    #[test]
    fn test_orphan_directories_are_removed_bottom_up() {
        let tree = TestTree::new();
        let remote = MemoryRemoteStore::new();
        remote.put_file("/old/deep/f.txt", b"f", mod_time(T as u64));
        let engine = tree.engine(&remote);

        let report = engine.run_cycle().unwrap();

        assert_eq!(report.deleted, vec!["/old/deep/f.txt".to_string()]);
        assert_eq!(
            report.removed_dirs,
            vec!["/old/deep/".to_string(), "/old/".to_string()]
        );
        assert!(remote.paths().is_empty());
    }

    #[test]
    fn test_directory_with_protected_child_survives() {
        let tree = TestTree::new();
        let remote = MemoryRemoteStore::new();
        remote.put_file("/album/keep.jpg", b"k", mod_time(T as u64));
        remote.put_file("/album/drop.jpg", b"d", mod_time(T as u64));
        seeded_metadata(&tree, &[("/album/keep.jpg", USER_OWNER, None)]);
        let engine = tree.engine(&remote);

        let report = engine.run_cycle().unwrap();

        assert_eq!(report.deleted, vec!["/album/drop.jpg".to_string()]);
        assert!(report.removed_dirs.is_empty());
        assert!(remote.exists("/album/keep.jpg"));
    }

    #[test]
    fn test_local_directories_are_descended() {
        let tree = TestTree::new();
        tree.write_at("docs/a.txt", "a", T);
        let remote = MemoryRemoteStore::new();
        remote.put_file("/docs/a.txt", b"a", mod_time(T as u64));
        remote.put_file("/docs/gone.txt", b"g", mod_time(T as u64));
        let engine = tree.engine(&remote);

        let report = engine.run_cycle().unwrap();

        assert_eq!(report.deleted, vec!["/docs/gone.txt".to_string()]);
        assert!(remote.exists("/docs/a.txt"));
    }

    #[test]
    fn test_expired_directory_is_emptied_and_removed() {
        let tree = TestTree::new();
        tree.mkdir("burst");
        let remote = MemoryRemoteStore::new();
        remote.put_file("/burst/1.jpg", b"1", mod_time(T as u64));
        remote.put_file("/burst/2.jpg", b"2", mod_time(T as u64));
        seeded_metadata(&tree, &[("/burst/", "camera", Some(1))]);
        let engine = tree.engine(&remote);

        let report = engine.run_cycle().unwrap();

        assert_eq!(
            report.deleted,
            vec!["/burst/1.jpg".to_string(), "/burst/2.jpg".to_string()]
        );
        assert_eq!(report.removed_dirs, vec!["/burst/".to_string()]);
        assert!(!remote.exists("/burst"));
        let metadata = tree.metadata();
        assert_eq!(metadata.owner("/burst/"), None);
        assert_eq!(metadata.expiry("/burst/"), None);
    }

    #[test]
    fn test_expired_directory_with_kept_child_survives() {
        let tree = TestTree::new();
        tree.write_at("shots/a.jpg", "a", T);
        let remote = MemoryRemoteStore::new();
        remote.put_file("/shots/a.jpg", b"a", mod_time(T as u64));
        seeded_metadata(&tree, &[("/shots/", "camera", Some(1))]);
        let engine = tree.engine(&remote);

        let report = engine.run_cycle().unwrap();

        assert!(report.deleted.is_empty());
        assert!(report.removed_dirs.is_empty());
        assert!(remote.exists("/shots/a.jpg"));
        assert_eq!(tree.metadata().expiry("/shots/"), Some(1));
    }

    #[test]
    fn test_empty_directory_present_locally_is_kept() {
        let tree = TestTree::new();
        tree.mkdir("inbox");
        let remote = MemoryRemoteStore::new();
        remote.put_dir("/inbox");
        let engine = tree.engine(&remote);

        let report = engine.run_cycle().unwrap();

        assert!(report.is_quiet());
        assert!(remote.is_dir("/inbox"));
        assert_eq!(remote.removed_dirs(), 0);
    }

    #[test]
    fn test_mixed_directory_keeps_only_protected_child() {
        let tree = TestTree::new();
        tree.mkdir("mix");
        let remote = MemoryRemoteStore::new();
        remote.put_file("/mix/exp.txt", b"e", mod_time(T as u64));
        remote.put_file("/mix/orphan.txt", b"o", mod_time(T as u64));
        remote.put_file("/mix/keep.txt", b"k", mod_time(T as u64));
        seeded_metadata(
            &tree,
            &[
                ("/mix/exp.txt", USER_OWNER, Some(1)),
                ("/mix/orphan.txt", "camera", None),
                ("/mix/keep.txt", USER_OWNER, None),
            ],
        );
        let engine = tree.engine(&remote);

        let report = engine.run_cycle().unwrap();

        assert_eq!(
            report.deleted,
            vec!["/mix/exp.txt".to_string(), "/mix/orphan.txt".to_string()]
        );
        assert!(report.removed_dirs.is_empty());
        assert!(remote.exists("/mix/keep.txt"));
        let metadata = tree.metadata();
        assert_eq!(metadata.owner("/mix/exp.txt"), None);
        assert_eq!(metadata.owner("/mix/orphan.txt"), None);
        assert_eq!(metadata.owner("/mix/keep.txt"), Some(USER_OWNER));
    }

    #[cfg(unix)]
    #[test]
    fn test_linked_file_is_mirrored_not_orphaned() {
        let tree = TestTree::new();
        let real = tree.write_at("real.txt", "data", T);
        std::os::unix::fs::symlink(&real, tree.path("link.txt")).unwrap();
        let remote = MemoryRemoteStore::new();
        remote.put_file("/link.txt", b"data", mod_time(T as u64));
        seeded_metadata(&tree, &[("/link.txt", "camera", None)]);
        let engine = tree.engine(&remote);

        let report = engine.run_cycle().unwrap();

        assert!(report.deleted.is_empty());
        assert_eq!(report.uploaded, vec!["/real.txt".to_string()]);
        assert_eq!(remote.file_text("/link.txt").as_deref(), Some("data"));
    }
}

mod delete_tests {
    use super::*;

    #[test]
    fn test_delete_removes_both_sides_and_metadata() {
        let tree = TestTree::new();
        let file = tree.write_at("a.txt", "a", T);
        let remote = MemoryRemoteStore::new();
        let engine = tree.engine(&remote);
        engine.upload(&file, "camera", Duration::ZERO).unwrap();

        engine
            .delete("a.txt", EntryKind::File)
            .expect("Delete should succeed");

        assert!(!file.exists());
        assert!(!remote.exists("/a.txt"));
        assert!(tree.metadata().is_empty());
    }

    #[test]
    fn test_missing_local_copy_is_not_an_error() {
        let tree = TestTree::new();
        let remote = MemoryRemoteStore::new();
        remote.put_file("/only-remote.txt", b"r", mod_time(T as u64));
        let engine = tree.engine(&remote);

        engine.delete("/only-remote.txt", EntryKind::File).unwrap();

        assert!(!remote.exists("/only-remote.txt"));
    }

    #[test]
    fn test_refused_remote_delete_is_an_error() {
        let tree = TestTree::new();
        let engine = tree.engine(&MemoryRemoteStore::new());

        let err = engine.delete("/nothing.txt", EntryKind::File).unwrap_err();

        assert!(matches!(err, Error::RemoteDelete { .. }), "got: {err}");
    }
}

mod connectivity_tests {
    use super::*;

    #[test]
    fn test_negative_probe_fails_the_cycle() {
        let tree = TestTree::new();
        let remote = MemoryRemoteStore::new();
        remote.fail_noop(true);
        let engine = tree.engine(&remote);

        let err = engine.run_cycle().unwrap_err();

        assert!(matches!(err, Error::ConnectionLost));
        assert!(err.is_connectivity());
    }

    #[test]
    fn test_lost_transport_aborts_the_cycle() {
        let tree = TestTree::new();
        tree.write_at("a.txt", "a", T);
        let remote = MemoryRemoteStore::new();
        remote.disconnect();
        let engine = tree.engine(&remote);

        let err = engine.run_cycle().unwrap_err();

        assert!(err.is_connectivity(), "got: {err}");
    }
}
