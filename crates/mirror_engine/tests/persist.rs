use std::fs;

use chrono::{TimeZone, Utc};
use filetime::FileTime;
use mirror_engine::{
    ensure_output_dir, remove_mirror_file, scan_mirror, write_mirror_file, PersistError,
};
use tempfile::TempDir;

#[test]
fn creates_missing_output_dir() {
    let temp = TempDir::new().unwrap();
    let new_dir = temp.path().join("content").join("intro");
    assert!(!new_dir.exists());
    ensure_output_dir(&new_dir).unwrap();
    assert!(new_dir.is_dir());
}

#[test]
fn output_dir_that_is_a_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let file_path = temp.path().join("not_a_dir");
    fs::write(&file_path, "x").unwrap();
    assert!(matches!(
        ensure_output_dir(&file_path),
        Err(PersistError::OutputDir(_))
    ));
}

#[test]
fn write_replaces_content_and_stamps_times() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("intro").join("intro.md");
    let synced_at = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();

    write_mirror_file(&path, b"hello", synced_at).unwrap();
    write_mirror_file(&path, b"world", synced_at).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "world");
    let meta = fs::metadata(&path).unwrap();
    let mtime = FileTime::from_last_modification_time(&meta);
    assert_eq!(mtime.unix_seconds(), synced_at.timestamp());

    // Only the target remains; the temp file was renamed over it.
    let names: Vec<_> = fs::read_dir(path.parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names, vec!["intro.md"]);
}

#[test]
fn no_partial_file_when_parent_is_a_file() {
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("intro");
    fs::write(&blocker, "x").unwrap();

    let target = blocker.join("intro.md");
    let result = write_mirror_file(&target, b"data", Utc::now());
    assert!(result.is_err());
    assert_eq!(fs::read_to_string(&blocker).unwrap(), "x");
}

#[test]
fn scan_only_reports_mirror_entries() {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    for (dir, file) in [
        ("intro", "intro.md"),
        ("intro", "notes.md"),
        ("old_post", "old_post.md"),
        ("images_only", "cover.png"),
    ] {
        fs::create_dir_all(root.join(dir)).unwrap();
        fs::write(root.join(dir).join(file), "x").unwrap();
    }
    fs::write(root.join("index.md"), "top level").unwrap();
    fs::create_dir_all(root.join("deep").join("deep")).unwrap();
    fs::write(root.join("deep").join("deep").join("deep.md"), "x").unwrap();

    let found: Vec<_> = scan_mirror(root).unwrap().into_iter().collect();
    assert_eq!(
        found,
        vec![
            root.join("intro").join("intro.md"),
            root.join("old_post").join("old_post.md"),
        ]
    );
}

#[test]
fn scan_of_missing_root_is_empty() {
    let temp = TempDir::new().unwrap();
    let found = scan_mirror(&temp.path().join("absent")).unwrap();
    assert!(found.is_empty());
}

#[test]
fn remove_prunes_images_and_empty_page_dir() {
    let temp = TempDir::new().unwrap();
    let page_dir = temp.path().join("old_post");
    fs::create_dir_all(page_dir.join("images")).unwrap();
    fs::write(page_dir.join("images").join("a.png"), "png").unwrap();
    let markup = page_dir.join("old_post.md");
    fs::write(&markup, "bye").unwrap();

    remove_mirror_file(&markup).unwrap();
    assert!(!page_dir.exists());
}

#[test]
fn remove_keeps_page_dir_with_foreign_files() {
    let temp = TempDir::new().unwrap();
    let page_dir = temp.path().join("old_post");
    fs::create_dir_all(&page_dir).unwrap();
    let markup = page_dir.join("old_post.md");
    fs::write(&markup, "bye").unwrap();
    fs::write(page_dir.join("notes.txt"), "mine").unwrap();

    remove_mirror_file(&markup).unwrap();
    assert!(!markup.exists());
    assert!(page_dir.join("notes.txt").exists());
}

#[test]
fn remove_of_missing_file_fails() {
    let temp = TempDir::new().unwrap();
    let result = remove_mirror_file(&temp.path().join("gone").join("gone.md"));
    assert!(matches!(result, Err(PersistError::Io(_))));
}
