//! Image files from a local directory, played back in file-name order.

use super::FrameSource;
use crate::core_modules::frame::Frame;
use crate::error::SourceError;
use std::path::{Path, PathBuf};
use tracing::debug;

const EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

pub struct ImageSequenceSource {
    directory: PathBuf,
    paths: Vec<PathBuf>,
    cursor: usize,
}

impl ImageSequenceSource {
    pub fn open(directory: impl AsRef<Path>) -> Result<Self, SourceError> {
        let directory = directory.as_ref().to_path_buf();
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&directory)? {
            let path = entry?.path();
            if path.is_file() && has_image_extension(&path) {
                paths.push(path);
            }
        }
        paths.sort();
        debug!(directory = %directory.display(), frames = paths.len(), "opened image sequence");
        Ok(Self {
            directory,
            paths,
            cursor: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        let Some(path) = self.paths.get(self.cursor) else {
            return Ok(None);
        };
        self.cursor += 1;
        let image = image::open(path).map_err(|source| SourceError::Decode {
            path: path.clone(),
            source,
        })?;
        Ok(Some(Frame::from_dynamic(image)?))
    }

    fn rewind(&mut self) -> Result<bool, SourceError> {
        self.cursor = 0;
        Ok(!self.paths.is_empty())
    }

    fn describe(&self) -> String {
        format!("{} ({} images)", self.directory.display(), self.paths.len())
    }
}
