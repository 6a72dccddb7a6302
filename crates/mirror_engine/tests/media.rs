use std::fs;
use std::sync::Arc;

use mirror_engine::{
    find_asset_references, DownloadError, DownloadSettings, MediaLocalizer, MediaSettings,
    ReqwestAssetDownloader, AssetDownloader,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn localizer(settings: MediaSettings) -> MediaLocalizer {
    let downloader = ReqwestAssetDownloader::new(DownloadSettings::default()).unwrap();
    MediaLocalizer::new(settings, Arc::new(downloader))
}

fn page_dir(temp: &TempDir) -> std::path::PathBuf {
    let dir = temp.path().join("intro");
    fs::create_dir_all(dir.join("images")).unwrap();
    dir
}

#[test]
fn references_split_caption_and_alt() {
    let refs = find_asset_references("a ![Sunset|alt:Red sky](https://x/s.png) b ![Plain](u)");
    assert_eq!(refs.len(), 2);
    assert_eq!(refs[0].caption, "Sunset");
    assert_eq!(refs[0].alt, "Red sky");
    assert_eq!(refs[0].url, "https://x/s.png");
    assert_eq!(refs[1].caption, "Plain");
    assert_eq!(refs[1].alt, "");
}

#[tokio::test]
async fn downloaded_image_becomes_figure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/sunset.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PNGDATA".to_vec()))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let dir = page_dir(&temp);
    let markdown = format!(
        "Before\n\n![Sunset|alt:Red sky]({}/files/sunset.png)\n\nAfter",
        server.uri()
    );

    let settings = MediaSettings {
        base_uri: "/posts/".to_string(),
        ..MediaSettings::default()
    };
    let out = localizer(settings).localize(&markdown, &dir, "intro").await;

    assert_eq!(
        out,
        "Before\n\n\n\n{{< figure src=\"/posts/intro/images/sunset.png\" caption=\"Sunset\" alt=\"Red sky\" position=\"center\" captionStyle=\"font-style: italic;\" >}}\n\n\n\nAfter"
    );
    assert_eq!(fs::read(dir.join("images").join("sunset.png")).unwrap(), b"PNGDATA");
}

#[tokio::test]
async fn failed_download_keeps_marker() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let dir = page_dir(&temp);
    let markdown = format!("![Gone]({}/files/missing.png)", server.uri());

    let out = localizer(MediaSettings::default())
        .localize(&markdown, &dir, "intro")
        .await;
    assert_eq!(out, markdown);
    assert!(!dir.join("images").join("missing.png").exists());
}

#[tokio::test]
async fn disabled_localization_passes_through() {
    let temp = TempDir::new().unwrap();
    let dir = page_dir(&temp);
    let markdown = "![Hosted](https://cdn.example.com/a.png)";
    let settings = MediaSettings {
        enabled: false,
        ..MediaSettings::default()
    };
    let out = localizer(settings).localize(markdown, &dir, "intro").await;
    assert_eq!(out, markdown);
}

#[tokio::test]
async fn existing_asset_is_reused_when_enabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"NEW".to_vec()))
        .expect(0)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let dir = page_dir(&temp);
    fs::write(dir.join("images").join("cached.png"), b"OLD").unwrap();
    let markdown = format!("![Cached]({}/files/cached.png)", server.uri());

    let settings = MediaSettings {
        reuse_existing: true,
        ..MediaSettings::default()
    };
    let out = localizer(settings).localize(&markdown, &dir, "intro").await;
    assert!(out.contains("src=\"/intro/images/cached.png\""));
    assert_eq!(fs::read(dir.join("images").join("cached.png")).unwrap(), b"OLD");
}

#[tokio::test]
async fn oversized_asset_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/big.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 64]))
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let downloader = ReqwestAssetDownloader::new(DownloadSettings {
        max_bytes: 16,
        ..DownloadSettings::default()
    })
    .unwrap();
    let dest = temp.path().join("big.bin");
    let err = downloader
        .download(&format!("{}/big.bin", server.uri()), &dest)
        .await
        .unwrap_err();
    assert_eq!(err, DownloadError::TooLarge { max_bytes: 16 });
    assert!(!dest.exists());
}
