use sketch_slideshow::events::{Displayed, ImageHandle, ViewerCommand};
use sketch_slideshow::tasks::viewer::layout::{FitRect, Viewport};
use sketch_slideshow::tasks::viewer::{self, ViewerOptions};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn handle(index: usize, width: u32, height: u32) -> ImageHandle {
    ImageHandle {
        index,
        path: PathBuf::from(format!("/poses/{index}.jpg")),
        bytes: vec![0; 8],
        width,
        height,
    }
}

async fn next_displayed(rx: &mut mpsc::Receiver<Displayed>) -> Displayed {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timeout waiting for Displayed")
        .expect("viewer closed")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn viewer_letterboxes_and_follows_resizes() {
    let (to_viewer, from_loader) = mpsc::channel::<ImageHandle>(2);
    let (control_tx, control_rx) = mpsc::channel::<ViewerCommand>(2);
    let (displayed_tx, mut displayed_rx) = mpsc::channel::<Displayed>(4);
    let cancel = CancellationToken::new();

    let task = tokio::spawn(viewer::run(
        from_loader,
        control_rx,
        displayed_tx,
        ViewerOptions::default(),
        cancel.clone(),
    ));

    to_viewer.send(handle(2, 4000, 2000)).await.unwrap();
    let shown = next_displayed(&mut displayed_rx).await;
    assert_eq!(shown.index, 2);
    assert_eq!(
        shown.rect,
        FitRect {
            x: 0,
            y: 60,
            width: 1920,
            height: 960
        }
    );
    assert!(shown.window.is_none());

    control_tx
        .send(ViewerCommand::Resize(Viewport {
            width: 1000,
            height: 1000,
        }))
        .await
        .unwrap();
    let relaid = next_displayed(&mut displayed_rx).await;
    assert_eq!(relaid.index, 2);
    assert_eq!(
        relaid.rect,
        FitRect {
            x: 0,
            y: 250,
            width: 1000,
            height: 500
        }
    );

    // Small images are scaled up to fill the viewport.
    to_viewer.send(handle(0, 100, 200)).await.unwrap();
    let shown = next_displayed(&mut displayed_rx).await;
    assert_eq!(
        shown.rect,
        FitRect {
            x: 250,
            y: 0,
            width: 500,
            height: 1000
        }
    );

    drop(to_viewer);
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("viewer did not exit after loader closed")
        .unwrap()
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn viewer_survives_closed_control_channel_until_cancelled() {
    let (to_viewer, from_loader) = mpsc::channel::<ImageHandle>(2);
    let (control_tx, control_rx) = mpsc::channel::<ViewerCommand>(1);
    let (displayed_tx, mut displayed_rx) = mpsc::channel::<Displayed>(4);
    let cancel = CancellationToken::new();
    drop(control_tx);

    let task = tokio::spawn(viewer::run(
        from_loader,
        control_rx,
        displayed_tx,
        ViewerOptions::default(),
        cancel.clone(),
    ));

    to_viewer.send(handle(1, 1920, 1080)).await.unwrap();
    let shown = next_displayed(&mut displayed_rx).await;
    assert_eq!((shown.rect.width, shown.rect.height), (1920, 1080));

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("viewer did not stop on cancel")
        .unwrap()
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn viewer_keeps_running_when_host_stops_listening() {
    let (to_viewer, from_loader) = mpsc::channel::<ImageHandle>(2);
    let (control_tx, control_rx) = mpsc::channel::<ViewerCommand>(2);
    let (displayed_tx, displayed_rx) = mpsc::channel::<Displayed>(1);
    let cancel = CancellationToken::new();
    drop(displayed_rx);

    let task = tokio::spawn(viewer::run(
        from_loader,
        control_rx,
        displayed_tx,
        ViewerOptions::default(),
        cancel.clone(),
    ));

    to_viewer.send(handle(0, 800, 600)).await.unwrap();
    control_tx
        .send(ViewerCommand::Resize(Viewport {
            width: 640,
            height: 480,
        }))
        .await
        .unwrap();
    to_viewer.send(handle(1, 800, 600)).await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!task.is_finished(), "viewer exited after host went away");

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("viewer did not stop on cancel")
        .unwrap()
        .unwrap();
}
