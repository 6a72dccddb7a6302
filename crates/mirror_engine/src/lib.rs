//! Mirror engine: remote tree reconciliation, media localization and
//! mirror persistence.
mod convert;
mod document;
mod emitter;
mod media;
mod naming;
mod notion;
mod persist;
mod reconciler;
mod remote;
mod types;

pub use convert::{ContentConverter, ConvertError};
pub use document::{build_page_document, DocumentError};
pub use emitter::{
    observer_channel, OutcomeReceiver, OutcomeSender, DEFAULT_OBSERVER_CAPACITY,
};
pub use media::{
    figure_directive, find_asset_references, AssetDownloader, AssetReference, DownloadError,
    DownloadSettings, MediaLocalizer, MediaSettings, ReqwestAssetDownloader, ALT_DELIMITER,
};
pub use naming::{asset_filename, page_slug, MirrorEntry, IMAGES_DIR, MARKUP_EXTENSION};
pub use notion::{
    page_id_from_url, NotionClient, NotionSettings, DEFAULT_API_BASE, DEFAULT_NOTION_VERSION,
};
pub use persist::{
    ensure_output_dir, remove_mirror_file, scan_mirror, write_mirror_file, PersistError,
};
pub use reconciler::{Clock, Reconciler, SyncConfig};
pub use remote::{list_all_children, RemoteError, RemoteTree, MAX_PAGE_SIZE};
pub use types::{
    ChildrenPage, NodeId, NodeKind, OutcomeRecord, OutcomeStatus, RemoteNode, RunAbort,
    SyncReport, SyncScope,
};
