use bytedupe::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use bytedupe::progress::ScanObserver;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

#[derive(Default)]
struct RecordingObserver {
    directories: Mutex<Vec<PathBuf>>,
    uniques: Mutex<Vec<PathBuf>>,
    failed: Mutex<Vec<PathBuf>>,
    groups: Mutex<Vec<Vec<PathBuf>>>,
}

impl ScanObserver for RecordingObserver {
    fn entered_new_directory(&self, path: &Path) {
        self.directories.lock().unwrap().push(path.to_path_buf());
    }

    fn unique_file(&self, path: &Path) {
        self.uniques.lock().unwrap().push(path.to_path_buf());
    }

    fn failed_file(&self, path: &Path) {
        self.failed.lock().unwrap().push(path.to_path_buf());
    }

    fn duplicate_group(&self, paths: &[PathBuf]) {
        self.groups.lock().unwrap().push(paths.to_vec());
    }
}

fn names(paths: &[PathBuf]) -> Vec<String> {
    let mut names: Vec<String> = paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_scenario_callbacks() {
    let dir = tempdir().unwrap();
    let x = vec![b'X'; 91];
    let y = vec![b'Y'; 91];
    fs::write(dir.path().join("a.txt"), &x).unwrap();
    fs::write(dir.path().join("b.txt"), &x).unwrap();
    fs::write(dir.path().join("c.txt"), &y).unwrap();
    fs::write(dir.path().join("d.txt"), vec![b'D'; 26]).unwrap();

    let observer = Arc::new(RecordingObserver::default());
    let finder = DuplicateFinder::new(FinderConfig::default().with_observer(observer.clone()));
    finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(observer.directories.lock().unwrap().len(), 1);
    assert_eq!(names(&observer.uniques.lock().unwrap()), vec!["c.txt", "d.txt"]);
    assert!(observer.failed.lock().unwrap().is_empty());

    let groups = observer.groups.lock().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(names(&groups[0]), vec!["a.txt", "b.txt"]);
}

#[test]
fn test_empty_directory_reports_only_root() {
    let dir = tempdir().unwrap();
    let observer = Arc::new(RecordingObserver::default());
    let finder = DuplicateFinder::new(FinderConfig::default().with_observer(observer.clone()));

    finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(observer.directories.lock().unwrap().len(), 1);
    assert!(observer.uniques.lock().unwrap().is_empty());
    assert!(observer.groups.lock().unwrap().is_empty());
}

#[test]
fn test_every_directory_is_entered_once() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("a").join("b")).unwrap();
    fs::create_dir_all(dir.path().join("c")).unwrap();

    let observer = Arc::new(RecordingObserver::default());
    let finder = DuplicateFinder::new(FinderConfig::default().with_observer(observer.clone()));
    finder.find_duplicates(dir.path()).unwrap();

    let mut entered = observer.directories.lock().unwrap().clone();
    entered.sort();
    entered.dedup();
    assert_eq!(entered.len(), 4);
}

struct PanickingObserver;

impl ScanObserver for PanickingObserver {
    fn duplicate_group(&self, _paths: &[PathBuf]) {
        panic!("presentation layer crashed");
    }
}

#[test]
fn test_observer_panic_fails_the_run() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), "same").unwrap();
    fs::write(dir.path().join("b"), "same").unwrap();

    let finder =
        DuplicateFinder::new(FinderConfig::default().with_observer(Arc::new(PanickingObserver)));

    match finder.find_duplicates(dir.path()) {
        Err(FinderError::TaskFailed(message)) => {
            assert!(message.contains("presentation layer crashed"))
        }
        other => panic!("Expected TaskFailed, got {:?}", other),
    }
}

struct ShutdownOnDirectory(Arc<AtomicBool>);

impl ScanObserver for ShutdownOnDirectory {
    fn entered_new_directory(&self, _path: &Path) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[test]
fn test_shutdown_during_walk_interrupts() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub").join("a"), "same").unwrap();
    fs::write(dir.path().join("b"), "same").unwrap();

    let flag = Arc::new(AtomicBool::new(false));
    let config = FinderConfig::default()
        .with_shutdown_flag(Arc::clone(&flag))
        .with_observer(Arc::new(ShutdownOnDirectory(Arc::clone(&flag))));

    let result = DuplicateFinder::new(config).find_duplicates(dir.path());
    assert!(matches!(result, Err(FinderError::Interrupted)));
}
