use bytedupe::duplicates::{DuplicateFinder, FinderError};
use bytedupe::scanner::ScanError;
use std::fs::{self, File};
use std::io::Write;
use tempfile::tempdir;

#[test]
fn test_scan_non_existent_path() {
    let finder = DuplicateFinder::with_defaults();
    let result = finder.find_duplicates(std::path::Path::new("/non/existent/path/12345"));

    match result {
        Err(FinderError::PathNotFound(path)) => {
            assert!(path.to_string_lossy().contains("non/existent/path/12345"));
        }
        other => panic!("Expected PathNotFound error, got {:?}", other),
    }
}

#[test]
fn test_scan_file_instead_of_directory() {
    let dir = tempdir().unwrap();
    let file_path = dir.path().join("file.txt");
    File::create(&file_path).unwrap();

    let result = DuplicateFinder::with_defaults().find_duplicates(&file_path);

    match result {
        Err(FinderError::NotADirectory(path)) => {
            assert!(path.to_string_lossy().contains("file.txt"));
        }
        other => panic!("Expected NotADirectory error, got {:?}", other),
    }
}

#[test]
fn test_invalid_root_errors_are_invalid_arguments() {
    let dir = tempdir().unwrap();
    let file_path = dir.path().join("file.txt");
    File::create(&file_path).unwrap();

    let finder = DuplicateFinder::with_defaults();
    for path in [dir.path().join("missing"), file_path] {
        let err = finder.find_duplicates(&path).unwrap_err();
        assert!(err.is_invalid_argument(), "{:?}", err);
    }
}

/// Remove all permissions from `path`. Returns false when they are not
/// enforced (e.g. running as root), in which case the caller skips.
#[cfg(unix)]
fn lock_down(path: &std::path::Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o000)).unwrap();
    if path.is_dir() {
        fs::read_dir(path).is_err()
    } else {
        File::open(path).is_err()
    }
}

#[cfg(unix)]
fn unlock(path: &std::path::Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
}

#[cfg(unix)]
#[test]
fn test_unreadable_subdirectory_is_skipped() {
    let dir = tempdir().unwrap();
    let sub = dir.path().join("no_access");
    fs::create_dir(&sub).unwrap();
    File::create(sub.join("hidden.txt"))
        .unwrap()
        .write_all(b"public")
        .unwrap();
    File::create(dir.path().join("ok.txt"))
        .unwrap()
        .write_all(b"public")
        .unwrap();

    if !lock_down(&sub) {
        unlock(&sub, 0o755);
        return;
    }

    let result = DuplicateFinder::with_defaults().find_duplicates(dir.path());
    unlock(&sub, 0o755);
    let (groups, summary) = result.unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);
    assert_eq!(summary.scan_errors.len(), 1);
    assert!(matches!(
        &summary.scan_errors[0],
        ScanError::UnreadableDirectory { path, .. } if path.ends_with("no_access")
    ));
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_in_group_of_three() {
    let dir = tempdir().unwrap();
    for name in ["a.bin", "b.bin", "locked.bin"] {
        File::create(dir.path().join(name))
            .unwrap()
            .write_all(b"identical bytes")
            .unwrap();
    }
    let locked = dir.path().join("locked.bin");

    if !lock_down(&locked) {
        unlock(&locked, 0o644);
        return;
    }

    let result = DuplicateFinder::with_defaults().find_duplicates(dir.path());
    unlock(&locked, 0o644);
    let (groups, summary) = result.unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert!(!groups[0].contains(&locked));
    assert_eq!(summary.failed_files, 1);
    assert!(matches!(
        &summary.scan_errors[0],
        ScanError::FileRead { path, .. } if path.ends_with("locked.bin")
    ));
}

#[cfg(unix)]
#[test]
fn test_unreadable_root_is_rejected() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("root");
    fs::create_dir(&root).unwrap();

    if !lock_down(&root) {
        unlock(&root, 0o755);
        return;
    }

    let result = DuplicateFinder::with_defaults().find_duplicates(&root);
    unlock(&root, 0o755);

    assert!(matches!(result, Err(FinderError::UnreadableDirectory(_))));
}
