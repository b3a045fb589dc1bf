//! Bundled client files served for plain GET requests.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use tokio::fs::File;

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Only the extensions the web client ships. The `.ico` is really a PNG and
/// `.map` files are JSON source maps.
static CONTENT_TYPES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("html", "text/html; charset=utf-8"),
        ("js", "application/javascript"),
        ("css", "text/css; charset=utf-8"),
        ("png", "image/png"),
        ("ico", "image/png"),
        ("json", "application/json"),
        ("map", "application/json"),
        ("txt", "text/plain; charset=utf-8"),
    ])
});

pub fn content_type(path: &str) -> &'static str {
    path.rsplit_once('.')
        .and_then(|(_, extension)| CONTENT_TYPES.get(extension).copied())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

#[derive(Clone, Debug)]
pub struct Assets {
    root: PathBuf,
}

impl Assets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Assets { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map decoded path steps to a file under the root. `None` for steps
    /// that could escape it.
    pub fn resolve(&self, steps: &[String]) -> Option<PathBuf> {
        if steps.is_empty() {
            return Some(self.root.join("index.html"));
        }

        let mut path = self.root.clone();
        for step in steps {
            if step == "." || step == ".." || step.contains(['/', '\\']) {
                return None;
            }
            path.push(step);
        }
        Some(path)
    }

    /// Open the file for `steps`. `Ok(None)` when there is no such file.
    pub async fn open(&self, steps: &[String]) -> std::io::Result<Option<File>> {
        let Some(path) = self.resolve(steps) else {
            return Ok(None);
        };

        match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => File::open(&path).await.map(Some),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    fn steps(path: &[&str]) -> Vec<String> {
        path.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn maps_known_extensions() {
        assert_eq!(content_type("/index.html"), "text/html; charset=utf-8");
        assert_eq!(content_type("/main.bundle.js"), "application/javascript");
        assert_eq!(content_type("/favicon.ico"), "image/png");
        assert_eq!(content_type("/main.js.map"), "application/json");
        assert_eq!(content_type("/LICENSE"), DEFAULT_CONTENT_TYPE);
        assert_eq!(content_type("/archive.tar.gz"), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn root_resolves_to_index() {
        let assets = Assets::new("dist");
        assert_eq!(assets.resolve(&[]), Some(PathBuf::from("dist/index.html")));
        assert_eq!(
            assets.resolve(&steps(&["assets", "logo.png"])),
            Some(PathBuf::from("dist/assets/logo.png"))
        );
    }

    #[test]
    fn refuses_escaping_steps() {
        let assets = Assets::new("dist");
        assert_eq!(assets.resolve(&steps(&["..", "Cargo.toml"])), None);
        assert_eq!(assets.resolve(&steps(&["a/../../b"])), None);
        assert_eq!(assets.resolve(&steps(&["."])), None);
    }

    #[tokio::test]
    async fn opens_existing_files_only() {
        let root = std::env::temp_dir().join(format!("poker-assets-{}", std::process::id()));
        tokio::fs::create_dir_all(root.join("nested")).await.unwrap();
        tokio::fs::write(root.join("index.html"), "<html></html>")
            .await
            .unwrap();
        let assets = Assets::new(&root);

        let mut file = assets.open(&[]).await.unwrap().unwrap();
        let mut contents = String::new();
        file.read_to_string(&mut contents).await.unwrap();
        assert_eq!(contents, "<html></html>");

        assert!(assets.open(&steps(&["missing.js"])).await.unwrap().is_none());
        assert!(assets.open(&steps(&["nested"])).await.unwrap().is_none());

        tokio::fs::remove_dir_all(&root).await.unwrap();
    }
}
