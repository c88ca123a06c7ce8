use crate::events::{ImageHandle, ShowImage};
use anyhow::{Context, Result};
use std::io::Cursor;
use tokio::select;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

// Reads the file and probes the header for pixel dimensions. Pixels are
// never decoded; the viewer only needs the size to lay the image out.
pub fn load_image(request: &ShowImage) -> Result<ImageHandle> {
    let bytes = std::fs::read(&request.path)
        .with_context(|| format!("failed to read {}", request.path.display()))?;
    let (width, height) = image::ImageReader::new(Cursor::new(bytes.as_slice()))
        .with_guessed_format()
        .context("failed to sniff image format")?
        .into_dimensions()
        .with_context(|| format!("failed to read dimensions of {}", request.path.display()))?;
    debug!(
        index = request.index,
        width,
        height,
        bytes = bytes.len(),
        "image loaded"
    );
    Ok(ImageHandle {
        index: request.index,
        path: request.path.clone(),
        bytes,
        width,
        height,
    })
}

/// Loads each requested image off the async runtime and forwards it to the
/// viewer. Requests are handled one at a time, in the order the presenter
/// issued them. An image that fails to load is skipped; the viewer keeps
/// showing the previous one.
pub async fn run(
    mut from_presenter: Receiver<ShowImage>,
    to_viewer: Sender<ImageHandle>,
    cancel: CancellationToken,
) -> Result<()> {
    loop {
        let request = select! {
            _ = cancel.cancelled() => break,
            maybe = from_presenter.recv() => match maybe {
                Some(request) => request,
                None => {
                    debug!("presenter closed; loader exiting");
                    break;
                }
            },
        };

        let path = request.path.clone();
        let loaded = select! {
            _ = cancel.cancelled() => break,
            res = tokio::task::spawn_blocking(move || load_image(&request)) => res,
        };

        match loaded {
            Ok(Ok(handle)) => {
                if to_viewer.send(handle).await.is_err() {
                    warn!("viewer channel closed");
                    break;
                }
            }
            Ok(Err(err)) => warn!(path = %path.display(), "skipping unreadable image: {err:#}"),
            Err(err) => warn!(path = %path.display(), "image load task failed: {err}"),
        }
    }

    Ok(())
}
