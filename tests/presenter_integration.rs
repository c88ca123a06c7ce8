use session_model::{CustomSchedule, IntervalGroup, TimingConfig};
use sketch_slideshow::error::SessionError;
use sketch_slideshow::events::ShowImage;
use sketch_slideshow::library::ImageCollection;
use sketch_slideshow::scheduler::PresentationSnapshot;
use sketch_slideshow::tasks::presenter;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

fn collection(dir: &std::path::Path, count: usize) -> Arc<ImageCollection> {
    let paths: Vec<_> = (0..count)
        .map(|i| {
            let path = dir.join(format!("pose-{i}.png"));
            std::fs::write(&path, b"not decoded here").unwrap();
            path
        })
        .collect();
    Arc::new(ImageCollection::from_files("poses", paths).unwrap())
}

async fn next_show(rx: &mut mpsc::Receiver<ShowImage>) -> ShowImage {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timeout waiting for ShowImage")
        .expect("channel closed")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn presenter_shows_every_image_before_repeating() {
    let tmp = tempdir().unwrap();
    let images = collection(tmp.path(), 3);
    let (to_loader, mut from_presenter) = mpsc::channel::<ShowImage>(1);
    let (snapshot_tx, snapshot_rx) = watch::channel(PresentationSnapshot::Idle);
    let cancel = CancellationToken::new();

    let handle = tokio::spawn(presenter::run(
        images.clone(),
        TimingConfig::Fixed {
            duration: Duration::from_millis(40),
        },
        Some(4),
        to_loader,
        snapshot_tx,
        cancel.clone(),
    ));

    let mut first_lap = BTreeSet::new();
    for _ in 0..3 {
        let show = next_show(&mut from_presenter).await;
        assert_eq!(show.lap, 0);
        assert_eq!(show.path, images.get(show.index).unwrap().path);
        first_lap.insert(show.index);
    }
    assert_eq!(first_lap, (0..3).collect());

    let wrapped = next_show(&mut from_presenter).await;
    assert_eq!(wrapped.lap, 1);
    assert!(snapshot_rx.borrow().is_running());

    cancel.cancel();
    handle.await.unwrap().unwrap();
    assert_eq!(*snapshot_rx.borrow(), PresentationSnapshot::Idle);

    // Nothing is scheduled once the session has stopped.
    while let Ok(Some(_)) =
        tokio::time::timeout(Duration::from_millis(10), from_presenter.recv()).await
    {}
    assert!(
        tokio::time::timeout(Duration::from_millis(150), from_presenter.recv())
            .await
            .map_or(true, |msg| msg.is_none()),
        "no image may be requested after stop"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn presenter_refuses_empty_schedule() {
    let tmp = tempdir().unwrap();
    let images = collection(tmp.path(), 2);
    let (to_loader, mut from_presenter) = mpsc::channel::<ShowImage>(1);
    let (snapshot_tx, snapshot_rx) = watch::channel(PresentationSnapshot::Idle);

    let err = presenter::run(
        images,
        TimingConfig::Schedule {
            schedule: CustomSchedule::new("blank", Vec::new()),
        },
        None,
        to_loader,
        snapshot_tx,
        CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert_eq!(
        err.downcast_ref::<SessionError>(),
        Some(&SessionError::EmptySchedule("blank".into()))
    );
    assert!(from_presenter.recv().await.is_none());
    assert_eq!(*snapshot_rx.borrow(), PresentationSnapshot::Idle);
}

#[test]
fn simulate_plans_fixed_session() {
    let timing = TimingConfig::Fixed {
        duration: Duration::from_secs(30),
    };
    let plan = presenter::simulate(3, &timing, Some(7), 6).unwrap();
    assert_eq!(plan.len(), 6);
    for (i, step) in plan.iter().enumerate() {
        assert_eq!(step.at, Duration::from_secs(30 * i as u64));
        assert_eq!(step.wait, Duration::from_secs(30));
        assert_eq!(step.lap, (i / 3) as u64);
    }
    let first_lap: BTreeSet<usize> = plan[..3].iter().map(|s| s.index).collect();
    let second_lap: BTreeSet<usize> = plan[3..].iter().map(|s| s.index).collect();
    assert_eq!(first_lap, (0..3).collect());
    assert_eq!(second_lap, (0..3).collect());

    assert_eq!(plan, presenter::simulate(3, &timing, Some(7), 6).unwrap());
}

#[test]
fn simulate_plans_schedule_session() {
    let timing = TimingConfig::Schedule {
        schedule: CustomSchedule::new(
            "short",
            vec![
                IntervalGroup::new(1000, 2).unwrap(),
                IntervalGroup::new(3000, 1).unwrap(),
            ],
        ),
    };
    let plan = presenter::simulate(10, &timing, Some(1), 4).unwrap();
    let waits: Vec<u64> = plan.iter().map(|s| s.wait.as_millis() as u64).collect();
    let starts: Vec<u64> = plan.iter().map(|s| s.at.as_millis() as u64).collect();
    let laps: Vec<u64> = plan.iter().map(|s| s.lap).collect();
    assert_eq!(waits, vec![1000, 1000, 3000, 1000]);
    assert_eq!(starts, vec![0, 1000, 2000, 5000]);
    assert_eq!(laps, vec![0, 0, 0, 1]);
}

#[test]
fn simulate_reports_start_errors() {
    let timing = TimingConfig::Fixed {
        duration: Duration::from_secs(1),
    };
    assert_eq!(
        presenter::simulate(0, &timing, None, 3),
        Err(SessionError::EmptyCollection)
    );
}
