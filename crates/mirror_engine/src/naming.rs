use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use url::Url;

pub const MARKUP_EXTENSION: &str = "md";
pub const IMAGES_DIR: &str = "images";

const SLUG_SEPARATOR: char = '_';

/// Filesystem-safe, deterministic slug: lowercase, spaces become `_`.
pub fn page_slug(title: &str) -> String {
    let lowered: String = title
        .to_lowercase()
        .chars()
        .map(|c| {
            if c == ' ' || is_forbidden(c) {
                SLUG_SEPARATOR
            } else {
                c
            }
        })
        .collect();
    // Leading or trailing dots would allow `.` and `..` entries.
    let mut slug = lowered.trim_matches('.').to_string();
    if slug.is_empty() {
        slug = "untitled".to_string();
    }
    if is_reserved_windows_name(&slug) {
        slug.push(SLUG_SEPARATOR);
    }
    slug
}

/// Paths of one page in the local mirror. Pure function of (root, slug).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorEntry {
    pub slug: String,
    pub page_dir: PathBuf,
    pub images_dir: PathBuf,
    pub markup_path: PathBuf,
}

impl MirrorEntry {
    pub fn new(content_root: &Path, slug: &str) -> Self {
        let page_dir = content_root.join(slug);
        Self {
            slug: slug.to_string(),
            images_dir: page_dir.join(IMAGES_DIR),
            markup_path: page_dir.join(format!("{slug}.{MARKUP_EXTENSION}")),
            page_dir,
        }
    }

    pub fn for_title(content_root: &Path, title: &str) -> Self {
        Self::new(content_root, &page_slug(title))
    }
}

/// Local filename for a downloaded asset.
///
/// The last path segment of the URL when there is one, otherwise a short hash
/// of the URL plus its extension. The same URL always maps to the same name.
pub fn asset_filename(asset_url: &str) -> String {
    let Ok(parsed) = Url::parse(asset_url) else {
        return hashed_filename(asset_url, extension_of(asset_url));
    };
    let segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");
    if segment.is_empty() || segment == "." || segment == ".." {
        return hashed_filename(asset_url, extension_of(parsed.path()));
    }
    sanitize_segment(segment)
}

fn hashed_filename(asset_url: &str, extension: Option<&str>) -> String {
    let hash = short_hash(asset_url);
    match extension {
        Some(ext) => format!("{hash}.{ext}"),
        None => hash,
    }
}

fn extension_of(path: &str) -> Option<&str> {
    let last = path.rsplit('/').next().unwrap_or(path);
    Path::new(last)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
}

// `%` is replaced too: the name ends up in a link, where escapes would be decoded.
fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c == '%' || is_forbidden(c) {
                SLUG_SEPARATOR
            } else {
                c
            }
        })
        .collect()
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

/// First 8 bytes of SHA-256 as 16 hex characters.
fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    let mut hex = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
