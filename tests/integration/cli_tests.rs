use bytedupe::cli::Cli;
use bytedupe::error::ExitCode;
use bytedupe::output::TextOutput;
use bytedupe::run_app;
use clap::Parser;
use std::fs;
use tempfile::tempdir;

fn run(args: &[&str]) -> ExitCode {
    let mut argv = vec!["bytedupe", "-q"];
    argv.extend_from_slice(args);
    run_app(Cli::try_parse_from(argv).unwrap()).unwrap()
}

#[test]
fn test_missing_argument_is_usage_error() {
    assert_eq!(run(&[]), ExitCode::UsageError);
}

#[test]
fn test_file_argument_is_usage_error() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("plain.txt");
    fs::write(&file, "x").unwrap();

    assert_eq!(run(&[file.to_str().unwrap()]), ExitCode::UsageError);
}

#[test]
fn test_missing_directory_is_usage_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope");

    assert_eq!(run(&[missing.to_str().unwrap()]), ExitCode::UsageError);
}

#[test]
fn test_successful_scan() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), "dup").unwrap();
    fs::write(dir.path().join("b"), "dup").unwrap();

    assert_eq!(run(&[dir.path().to_str().unwrap()]), ExitCode::Success);
}

#[test]
fn test_json_output_scan() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), "dup").unwrap();
    fs::write(dir.path().join("b"), "dup").unwrap();

    let code = run(&["--output", "json", "--no-lengths", dir.path().to_str().unwrap()]);
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_text_output_of_scan() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "twin").unwrap();
    fs::write(dir.path().join("b.txt"), "twin").unwrap();
    fs::write(dir.path().join("c.txt"), "solo file").unwrap();

    let (groups, _) = bytedupe::duplicates::DuplicateFinder::with_defaults()
        .find_duplicates(dir.path())
        .unwrap();
    let text = TextOutput::new(&groups).render();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "( Orte mit 4 Bytes Länge )");
    assert!(lines[1].ends_with("a.txt"));
    assert!(lines[2].ends_with("b.txt"));
    assert!(std::path::Path::new(lines[1]).is_absolute());
}
