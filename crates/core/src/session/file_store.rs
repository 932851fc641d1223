use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::sampling::domain::resize::fit_within;
use crate::shared::constants::{THUMBNAIL_EXTENSIONS, THUMBNAIL_SIZE};

/// Private scratch directory for uploaded media; deleted on drop.
pub struct FileStore {
    dir: TempDir,
}

impl FileStore {
    pub fn new() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("motoscan-").tempdir()?;
        log::debug!("File store at {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `bytes` under the final component of `name`, so a name like
    /// `../../etc/passwd` lands inside the store as `passwd`.
    pub fn save(&self, name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let file_name = Path::new(name)
            .file_name()
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("not a file name: {name:?}"),
                )
            })?;
        let path = self.dir.path().join(file_name);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Writes `<stem>_thumb.<ext>` next to `path`, at most 128x128.
    ///
    /// Returns `Ok(None)` for files that are not thumbnailable images.
    pub fn thumbnail(&self, path: &Path) -> image::ImageResult<Option<PathBuf>> {
        let Some(ext) = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
        else {
            return Ok(None);
        };
        if !THUMBNAIL_EXTENSIONS.contains(&ext.as_str()) {
            return Ok(None);
        }

        let image = image::open(path)?;
        let (w, h) = fit_within(image.width(), image.height(), THUMBNAIL_SIZE);
        let thumb = image.thumbnail(w, h);

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let thumb_path = path.with_file_name(format!("{stem}_thumb.{ext}"));
        thumb.save(&thumb_path)?;
        Ok(Some(thumb_path))
    }

    pub fn remove(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }
}
