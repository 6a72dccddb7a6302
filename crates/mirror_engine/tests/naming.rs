use std::path::Path;

use mirror_engine::{asset_filename, page_slug, MirrorEntry};
use pretty_assertions::assert_eq;

#[test]
fn slug_lowercases_and_replaces_spaces() {
    assert_eq!(page_slug("My First Post"), "my_first_post");
    assert_eq!(page_slug("Intro"), "intro");
}

#[test]
fn slug_strips_path_characters() {
    assert_eq!(page_slug("a/b: c?"), "a_b__c_");
    assert_eq!(page_slug(".."), "untitled");
    assert_eq!(page_slug(""), "untitled");
    assert_eq!(page_slug("CON"), "con_");
}

#[test]
fn slug_is_deterministic() {
    assert_eq!(page_slug("Release Notes 2024"), page_slug("Release Notes 2024"));
}

#[test]
fn entry_layout_follows_slug() {
    let entry = MirrorEntry::for_title(Path::new("/content"), "My First Post");
    assert_eq!(entry.slug, "my_first_post");
    assert_eq!(entry.page_dir, Path::new("/content/my_first_post"));
    assert_eq!(entry.images_dir, Path::new("/content/my_first_post/images"));
    assert_eq!(
        entry.markup_path,
        Path::new("/content/my_first_post/my_first_post.md")
    );
}

#[test]
fn asset_name_is_last_path_segment() {
    assert_eq!(
        asset_filename("https://files.example.com/a/b/photo.png?X-Amz-Signature=abc"),
        "photo.png"
    );
    assert_eq!(
        asset_filename("https://files.example.com/a/My%20Photo.png"),
        "My_20Photo.png"
    );
}

#[test]
fn asset_name_without_segment_is_hashed() {
    let name = asset_filename("https://files.example.com/");
    assert_eq!(name.len(), 16);
    assert!(name.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(name, asset_filename("https://files.example.com/"));
    assert_ne!(name, asset_filename("https://other.example.com/"));
}
