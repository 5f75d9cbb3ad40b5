//! Camera directory reader
//!
//! A camera stream is a directory with a frame metadata CSV next to the
//! encoded video. Only the metadata is tabulated; the video must exist.

use std::path::{Path, PathBuf};

use contracts::{ContractError, StreamKind, StreamReader, Table};
use tracing::debug;

use super::delimited::CsvReader;

#[derive(Debug, Clone)]
pub struct CameraReader {
    metadata: String,
    video_extensions: Vec<String>,
}

impl Default for CameraReader {
    fn default() -> Self {
        Self::new("metadata.csv", ["avi", "mp4"])
    }
}

impl CameraReader {
    pub fn new<I, S>(metadata: impl Into<String>, video_extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            metadata: metadata.into(),
            video_extensions: video_extensions.into_iter().map(Into::into).collect(),
        }
    }

    /// First video file in `dir` with an accepted extension
    pub fn find_video(&self, dir: &Path) -> Result<PathBuf, ContractError> {
        let entries = std::fs::read_dir(dir).map_err(|e| ContractError::from_io(dir, e))?;
        let mut videos: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|ext| {
                        self.video_extensions
                            .iter()
                            .any(|accepted| accepted.eq_ignore_ascii_case(ext))
                    })
            })
            .collect();
        videos.sort();
        videos.into_iter().next().ok_or_else(|| {
            ContractError::missing_source(
                dir,
                format!("no video with extension {:?}", self.video_extensions),
            )
        })
    }
}

impl StreamReader for CameraReader {
    fn kind(&self) -> StreamKind {
        StreamKind::Camera
    }

    fn read(&self, path: &Path) -> Result<Table, ContractError> {
        if !path.is_dir() {
            return Err(ContractError::missing_source(
                path,
                "camera source is not a directory",
            ));
        }
        let metadata = path.join(&self.metadata);
        if !metadata.is_file() {
            return Err(ContractError::missing_source(
                &metadata,
                "camera metadata not found",
            ));
        }
        let video = self.find_video(path)?;
        debug!(video = %video.display(), "camera video located");
        CsvReader::default().read(&metadata)
    }
}
