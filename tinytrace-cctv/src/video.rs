use std::fs;
use std::path::{Path, PathBuf};

use crate::error::VideoError;

/// One decoded frame. The payload is opaque to the worker and only
/// interpreted by the detector.
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: u64,
    pub data: Vec<u8>,
}

/// Sequential frame reader; `Ok(None)` marks the end of the video.
pub trait VideoSource: Send {
    fn read_frame(&mut self) -> Result<Option<Frame>, VideoError>;
}

/// Opens a fresh reader per worker run, so a worker that never samples
/// never touches the video.
pub trait VideoOpener: Send + Sync {
    fn open(&self) -> Result<Box<dyn VideoSource>, VideoError>;

    fn describe(&self) -> String;
}

/// A video stored as a directory of pre-extracted frame files, read in file
/// name order (`ffmpeg -i clip.mp4 frames/%05d.jpg` layout).
#[derive(Debug, Clone)]
pub struct FrameDirectory {
    path: PathBuf,
}

impl FrameDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Sample footage shipped with the crate.
    pub fn bundled() -> Self {
        Self::new(concat!(env!("CARGO_MANIFEST_DIR"), "/samples/gate-3"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }
}

impl VideoOpener for FrameDirectory {
    fn open(&self) -> Result<Box<dyn VideoSource>, VideoError> {
        if !self.exists() {
            return Err(VideoError::NotFound(self.path.clone()));
        }

        let entries = fs::read_dir(&self.path).map_err(|source| VideoError::Open {
            path: self.path.clone(),
            source,
        })?;

        let mut frames = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect::<Vec<_>>();
        frames.sort();

        tracing::debug!("opened {} with {} frames", self.path.display(), frames.len());

        Ok(Box::new(FrameDirectoryReader {
            frames: frames.into_iter(),
            next_index: 0,
        }))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

struct FrameDirectoryReader {
    frames: std::vec::IntoIter<PathBuf>,
    next_index: u64,
}

impl VideoSource for FrameDirectoryReader {
    fn read_frame(&mut self) -> Result<Option<Frame>, VideoError> {
        let Some(path) = self.frames.next() else {
            return Ok(None);
        };

        let index = self.next_index;
        self.next_index += 1;

        let data = fs::read(&path).map_err(|source| VideoError::Read { index, source })?;

        Ok(Some(Frame { index, data }))
    }
}
