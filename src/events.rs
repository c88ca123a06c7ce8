use std::path::PathBuf;

use crate::tasks::viewer::layout::{FitRect, Viewport, WindowRect};

/// Presenter -> Loader: the scheduler picked a new image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShowImage {
    pub index: usize,
    pub path: PathBuf,
    pub lap: u64,
}

/// A loaded display resource. Owned by the viewer's slot while shown and
/// released when replaced.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    pub index: usize,
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// External -> Viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerCommand {
    /// The available display area changed.
    Resize(Viewport),
    /// Drop the shown image without waiting for a replacement.
    Clear,
}

/// Emitted by the viewer after an image is laid out on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Displayed {
    pub index: usize,
    pub path: PathBuf,
    pub rect: FitRect,
    /// Window placement when presenting standalone.
    pub window: Option<WindowRect>,
}
