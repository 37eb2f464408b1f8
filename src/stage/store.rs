use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use image::ImageEncoder as _;

use crate::foundation::core::{FrameIndex, FrameRGBA};
use crate::foundation::error::{ConvertError, ConvertResult};

const MIN_KEY_DIGITS: usize = 4;

/// Handle to one staged frame on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagedFrame {
    /// Frame index.
    pub index: FrameIndex,
    /// Zero-padded key; lexicographic order equals frame order.
    pub key: String,
    /// PNG file in the staging directory.
    pub path: PathBuf,
}

impl StagedFrame {
    /// Read the staged pixels back.
    pub fn load(&self) -> ConvertResult<FrameRGBA> {
        let img = image::open(&self.path)
            .map_err(|e| {
                ConvertError::staging(format!("read staged frame '{}': {e}", self.path.display()))
            })?
            .to_rgba8();
        let (width, height) = img.dimensions();
        FrameRGBA::new(self.index, width, height, img.into_raw())
    }
}

/// Owns the staging directory for one conversion run.
///
/// The directory is deleted by [`FrameStore::release_all`] or, failing that, when the store is
/// dropped, whichever happens first.
pub struct FrameStore {
    dir: Option<tempfile::TempDir>,
    key_digits: usize,
    staged: BTreeMap<String, StagedFrame>,
}

impl FrameStore {
    /// Create a fresh staging directory under the system temp dir.
    pub fn create(total_frames: u64) -> ConvertResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix("lottiegif-frames-")
            .tempdir()
            .map_err(|e| ConvertError::staging(format!("create staging directory: {e}")))?;
        Ok(Self::with_dir(dir, total_frames))
    }

    /// Create the staging directory under `parent`.
    pub fn create_in(parent: &Path, total_frames: u64) -> ConvertResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix("lottiegif-frames-")
            .tempdir_in(parent)
            .map_err(|e| {
                ConvertError::staging(format!(
                    "create staging directory in '{}': {e}",
                    parent.display()
                ))
            })?;
        Ok(Self::with_dir(dir, total_frames))
    }

    fn with_dir(dir: tempfile::TempDir, total_frames: u64) -> Self {
        let digits = total_frames.saturating_sub(1).to_string().len();
        tracing::debug!(dir = %dir.path().display(), "staging directory created");
        Self {
            dir: Some(dir),
            key_digits: digits.max(MIN_KEY_DIGITS),
            staged: BTreeMap::new(),
        }
    }

    /// Staging directory, or `None` once released.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_ref().map(tempfile::TempDir::path)
    }

    /// Frames staged so far.
    pub fn len(&self) -> usize {
        self.staged.len()
    }

    /// True before the first `stage`.
    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Zero-padded key for `index`.
    pub fn key_for(&self, index: FrameIndex) -> String {
        format!("frame_{:0width$}", index.0, width = self.key_digits)
    }

    /// Write `frame` as a PNG keyed by its index. Staging the same index twice is
    /// [`ConvertError::DuplicateFrame`].
    pub fn stage(&mut self, frame: &FrameRGBA) -> ConvertResult<StagedFrame> {
        let Some(dir) = self.dir.as_ref() else {
            return Err(ConvertError::staging("staging area already released"));
        };
        let key = self.key_for(frame.index);
        if self.staged.contains_key(&key) {
            return Err(ConvertError::duplicate_frame(format!(
                "frame {} is already staged as '{key}'",
                frame.index
            )));
        }

        let path = dir.path().join(format!("{key}.png"));
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => ConvertError::duplicate_frame(format!(
                    "staged resource '{}' already exists",
                    path.display()
                )),
                _ => ConvertError::staging(format!("create '{}': {e}", path.display())),
            })?;

        let mut writer = BufWriter::new(file);
        image::codecs::png::PngEncoder::new(&mut writer)
            .write_image(
                &frame.data,
                frame.width,
                frame.height,
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e| ConvertError::staging(format!("write '{}': {e}", path.display())))?;
        writer
            .flush()
            .map_err(|e| ConvertError::staging(format!("flush '{}': {e}", path.display())))?;

        let staged = StagedFrame {
            index: frame.index,
            key: key.clone(),
            path,
        };
        self.staged.insert(key, staged.clone());
        Ok(staged)
    }

    /// Every staged frame, sorted by key ascending.
    pub fn list_ordered(&self) -> Vec<StagedFrame> {
        self.staged.values().cloned().collect()
    }

    /// Delete the staging directory. Safe to call repeatedly.
    pub fn release_all(&mut self) -> ConvertResult<()> {
        self.staged.clear();
        let Some(dir) = self.dir.take() else {
            return Ok(());
        };
        let path = dir.path().to_path_buf();
        dir.close().map_err(|e| {
            ConvertError::staging(format!("remove staging directory '{}': {e}", path.display()))
        })?;
        tracing::debug!(dir = %path.display(), "staging directory released");
        Ok(())
    }
}

impl Drop for FrameStore {
    fn drop(&mut self) {
        if let Err(e) = self.release_all() {
            tracing::warn!(error = %e, "staging cleanup failed");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stage/store.rs"]
mod tests;
