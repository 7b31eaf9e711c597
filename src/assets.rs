use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// A static file read from the asset directory.
pub struct Asset {
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Serves files from one directory, the page and script that talk to `/api`.
pub struct AssetStore {
    pub(crate) base_path: PathBuf,
}

impl AssetStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Reads the file behind a request path. `/` and directory paths resolve to `index.html`.
    ///
    /// Returns `None` for missing files and for paths that would leave the base directory.
    pub async fn get(&self, request_path: &str) -> Option<Asset> {
        let mut path = self.file_path(request_path)?;
        if path.is_dir() {
            path.push("index.html");
        }

        match tokio::fs::read(&path).await {
            Ok(bytes) => Some(Asset {
                content_type: content_type(&path),
                bytes,
            }),
            Err(e) => {
                debug!("Asset {} not served: {}", path.display(), e);
                None
            }
        }
    }

    pub(crate) fn file_path(&self, request_path: &str) -> Option<PathBuf> {
        let relative = Path::new(request_path.trim_start_matches('/'));

        // only plain names, no `..`, roots or prefixes
        if !relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
        {
            return None;
        }

        Some(self.base_path.join(relative))
    }
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") | Some("mjs") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> AssetStore {
        AssetStore::new(concat!(env!("CARGO_MANIFEST_DIR"), "/public"))
    }

    #[test]
    fn traversal_is_rejected() {
        let store = store();
        assert!(store.file_path("/../Cargo.toml").is_none());
        assert!(store.file_path("/css/../../Cargo.toml").is_none());
        assert!(store.file_path("/script.js").is_some());
    }

    #[tokio::test]
    async fn root_resolves_to_index() {
        let asset = store().get("/").await.unwrap();
        assert_eq!(asset.content_type, "text/html; charset=utf-8");
        assert!(String::from_utf8_lossy(&asset.bytes).contains("messages-list"));
    }

    #[tokio::test]
    async fn missing_files_are_none() {
        assert!(store().get("/nope.txt").await.is_none());
    }

    #[test]
    fn content_type_follows_extension() {
        assert_eq!(content_type(Path::new("a/script.js")), "text/javascript; charset=utf-8");
        assert_eq!(content_type(Path::new("blob")), "application/octet-stream");
    }
}
