pub mod layout;

use std::path::PathBuf;

use anyhow::Result;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::events::{Displayed, ImageHandle, ViewerCommand};
use layout::{Viewport, WindowChrome, WindowRect, fit_to_viewport, standalone_window};

/// The image resource currently on screen.
///
/// A handle is acquired when shown and handed back when replaced or cleared,
/// so at most one loaded image is held at a time.
#[derive(Debug, Default)]
pub struct DisplaySlot {
    current: Option<ImageHandle>,
}

impl DisplaySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&ImageHandle> {
        self.current.as_ref()
    }

    pub fn replace(&mut self, next: ImageHandle) -> Option<ImageHandle> {
        self.current.replace(next)
    }

    pub fn clear(&mut self) -> Option<ImageHandle> {
        self.current.take()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ViewerOptions {
    pub viewport: Viewport,
    /// Resize the window around each image instead of letterboxing.
    pub standalone: bool,
    pub chrome: WindowChrome,
}

/// Layout state for the presentation: the slot, the viewport it fills and,
/// when standalone, where the window currently sits.
pub struct PresentationView {
    slot: DisplaySlot,
    viewport: Viewport,
    standalone: bool,
    chrome: WindowChrome,
    window: WindowRect,
}

impl PresentationView {
    pub fn new(options: ViewerOptions) -> Self {
        let window = WindowRect {
            x: 0,
            y: 0,
            width: options.viewport.width.saturating_add(options.chrome.width),
            height: options.viewport.height.saturating_add(options.chrome.height),
        };
        Self {
            slot: DisplaySlot::new(),
            viewport: options.viewport,
            standalone: options.standalone,
            chrome: options.chrome,
            window,
        }
    }

    pub fn slot(&self) -> &DisplaySlot {
        &self.slot
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Put `handle` on screen, releasing whatever was shown before.
    pub fn show(&mut self, handle: ImageHandle) -> Displayed {
        let displayed = self.layout(handle.index, handle.path.clone(), handle.width, handle.height);
        info!(
            index = handle.index,
            path = %handle.path.display(),
            width = displayed.rect.width,
            height = displayed.rect.height,
            "displaying image"
        );
        if let Some(previous) = self.slot.replace(handle) {
            release(previous, "replaced");
        }
        displayed
    }

    /// Adopt a new viewport and lay the current image out again.
    pub fn resize(&mut self, viewport: Viewport) -> Option<Displayed> {
        debug!(width = viewport.width, height = viewport.height, "viewport changed");
        self.viewport = viewport;
        let (index, path, width, height) = {
            let current = self.slot.current()?;
            (current.index, current.path.clone(), current.width, current.height)
        };
        Some(self.layout(index, path, width, height))
    }

    pub fn release_current(&mut self, reason: &'static str) {
        if let Some(previous) = self.slot.clear() {
            release(previous, reason);
        }
    }

    fn layout(&mut self, index: usize, path: PathBuf, width: u32, height: u32) -> Displayed {
        let rect = fit_to_viewport(width, height, self.viewport);
        let window = if self.standalone {
            self.window = standalone_window(width, height, self.viewport, self.window, self.chrome);
            Some(self.window)
        } else {
            None
        };
        Displayed {
            index,
            path,
            rect,
            window,
        }
    }
}

fn release(handle: ImageHandle, reason: &'static str) {
    debug!(
        index = handle.index,
        bytes = handle.bytes.len(),
        reason,
        "released image"
    );
}

/// Presentation view task: shows what the loader hands over and follows
/// viewport changes until cancelled or the loader goes away.
#[instrument(skip_all, fields(standalone = options.standalone))]
pub async fn run(
    mut from_loader: Receiver<ImageHandle>,
    mut control: Receiver<ViewerCommand>,
    to_host: Sender<Displayed>,
    options: ViewerOptions,
    cancel: CancellationToken,
) -> Result<()> {
    let mut view = PresentationView::new(options);
    let mut control_open = true;

    loop {
        select! {
            _ = cancel.cancelled() => break,

            maybe_handle = from_loader.recv() => {
                let Some(handle) = maybe_handle else {
                    debug!("loader closed; viewer exiting");
                    break;
                };
                let displayed = view.show(handle);
                if to_host.send(displayed).await.is_err() {
                    debug!("host stopped listening for displayed images");
                }
            }

            maybe_cmd = control.recv(), if control_open => match maybe_cmd {
                Some(ViewerCommand::Resize(viewport)) => {
                    if let Some(displayed) = view.resize(viewport) {
                        if to_host.send(displayed).await.is_err() {
                            debug!("host stopped listening for displayed images");
                        }
                    }
                }
                Some(ViewerCommand::Clear) => view.release_current("cleared"),
                None => control_open = false,
            },
        }
    }

    view.release_current("session ended");
    Ok(())
}
