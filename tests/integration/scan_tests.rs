use bytedupe::duplicates::{DuplicateFinder, FinderConfig};
use bytedupe::scanner::GrouperConfig;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write_file(path: &Path, content: &[u8]) {
    File::create(path).unwrap().write_all(content).unwrap();
}

fn membership(groups: &[bytedupe::duplicates::DuplicateGroup]) -> BTreeSet<Vec<PathBuf>> {
    groups
        .iter()
        .map(|g| {
            let mut files = g.files.clone();
            files.sort();
            files
        })
        .collect()
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::with_defaults();

    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 0);
    assert_eq!(summary.duplicate_groups, 0);
}

#[test]
fn test_scan_single_file() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("only.txt"), b"alone");

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);
    assert_eq!(summary.eliminated_by_length, 1);
    assert_eq!(summary.comparison_steps, 0);
}

#[test]
fn test_reference_scenario() {
    let dir = tempdir().unwrap();
    let x = vec![b'x'; 91];
    let mut y = vec![b'x'; 91];
    y[45] = b'y';

    write_file(&dir.path().join("a.txt"), &x);
    write_file(&dir.path().join("b.txt"), &x);
    write_file(&dir.path().join("c.txt"), &y);
    write_file(&dir.path().join("d.txt"), &[b'd'; 26]);

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].length, 91);
    let names: Vec<_> = groups[0]
        .files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.txt", "b.txt"]);

    assert_eq!(summary.unique_files, 2);
    assert_eq!(summary.eliminated_by_length, 1);
    assert_eq!(summary.failed_files, 0);
    assert_eq!(summary.reclaimable_space, 91);
}

#[test]
fn test_two_zero_length_files() {
    let dir = tempdir().unwrap();
    File::create(dir.path().join("empty1")).unwrap();
    File::create(dir.path().join("empty2")).unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(groups[0].length, 0);
    assert_eq!(summary.reclaimable_space, 0);
    assert_eq!(summary.comparison_steps, 1);
}

#[test]
fn test_duplicates_across_subdirectories() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("one").join("two");
    fs::create_dir_all(&nested).unwrap();
    fs::create_dir(dir.path().join("other")).unwrap();

    write_file(&dir.path().join("top.bin"), b"shared payload");
    write_file(&nested.join("deep.bin"), b"shared payload");
    write_file(&dir.path().join("other").join("side.bin"), b"shared payload");
    write_file(&dir.path().join("other").join("near.bin"), b"shared paylo4d");

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 3);
    assert!(groups[0].files.iter().all(|p| p.is_absolute()));
    assert_eq!(summary.directories_scanned, 4);
    assert_eq!(summary.duplicate_files, 2);
}

#[test]
fn test_multiple_groups_same_length() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("a1"), b"aaaa");
    write_file(&dir.path().join("a2"), b"aaaa");
    write_file(&dir.path().join("b1"), b"bbbb");
    write_file(&dir.path().join("b2"), b"bbbb");
    write_file(&dir.path().join("c"), b"cccc");

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 2);
    assert!(groups[0].files[0].ends_with("a1"));
    assert!(groups[1].files[0].ends_with("b1"));
    assert_eq!(summary.unique_files, 1);
}

#[test]
fn test_scan_is_idempotent() {
    let dir = tempdir().unwrap();
    for i in 0..6 {
        let content = format!("content-{}", i % 3);
        write_file(&dir.path().join(format!("f{}", i)), content.as_bytes());
    }

    let finder = DuplicateFinder::with_defaults();
    let (first, _) = finder.find_duplicates(dir.path()).unwrap();
    let (second, _) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(first.len(), 3);
    assert_eq!(membership(&first), membership(&second));
}

#[test]
fn test_single_worker_thread() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    write_file(&dir.path().join("a"), b"same bytes");
    write_file(&dir.path().join("sub").join("b"), b"same bytes");

    let finder = DuplicateFinder::new(FinderConfig::default().with_io_threads(1));
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    assert!(summary.tasks_executed > 0);
}

#[test]
fn test_coverage_of_all_files() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("d1"), b"dup");
    write_file(&dir.path().join("d2"), b"dup");
    write_file(&dir.path().join("u1"), b"uni");
    write_file(&dir.path().join("u2"), b"longer unique");

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    let grouped: usize = groups.iter().map(|g| g.len()).sum();
    assert_eq!(
        summary.unique_files + summary.failed_files + grouped,
        summary.total_files
    );
}

#[test]
fn test_skip_hidden_and_ignore_patterns() {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("build")).unwrap();
    write_file(&dir.path().join("keep1.txt"), b"same");
    write_file(&dir.path().join("keep2.txt"), b"same");
    write_file(&dir.path().join(".hidden"), b"same");
    write_file(&dir.path().join("scratch.tmp"), b"same");
    write_file(&dir.path().join("build").join("out.txt"), b"same");

    let grouper = GrouperConfig::new(true, vec!["*.tmp".to_string(), "build/".to_string()]);
    let finder = DuplicateFinder::new(FinderConfig::default().with_grouper_config(grouper));
    let (groups, summary) = finder.find_duplicates(dir.path()).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(summary.total_files, 2);

    let (all, _) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    assert_eq!(all[0].len(), 5);
}

#[cfg(unix)]
#[test]
fn test_symlinked_duplicate_is_not_reported() {
    let dir = tempdir().unwrap();
    write_file(&dir.path().join("real.txt"), b"linked content");
    std::os::unix::fs::symlink(dir.path().join("real.txt"), dir.path().join("alias.txt")).unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.total_files, 1);
}

#[test]
fn test_large_identical_files() {
    let dir = tempdir().unwrap();
    let content: Vec<u8> = (0..64 * 1024).map(|i| (i % 251) as u8).collect();
    write_file(&dir.path().join("big1"), &content);
    write_file(&dir.path().join("big2"), &content);

    let mut altered = content.clone();
    if let Some(last) = altered.last_mut() {
        *last ^= 0xff;
    }
    write_file(&dir.path().join("big3"), &altered);

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(summary.unique_files, 1);
    assert_eq!(summary.comparison_steps as u64, content.len() as u64 + 1);
}
