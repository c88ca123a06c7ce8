use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser};
use session_model::{FixedTime, SessionType, TimingConfig};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use sketch_slideshow::config::Configuration;
use sketch_slideshow::events::{Displayed, ImageHandle, ShowImage, ViewerCommand};
use sketch_slideshow::library::ImageCollection;
use sketch_slideshow::scheduler::PresentationSnapshot;
use sketch_slideshow::store::LastFolderStore;
use sketch_slideshow::tasks;

#[derive(Debug, Parser)]
#[command(
    name = "sketch-slideshow",
    version,
    about = "Timed image slideshow for gesture drawing practice"
)]
struct Args {
    /// Path to YAML config; defaults are used when the file does not exist
    #[arg(short, long, value_name = "FILE", default_value = "sketch-slideshow.yaml")]
    config: PathBuf,
    /// Present the images in this folder (remembered for the next run)
    #[arg(long, value_name = "DIR", conflicts_with = "files")]
    folder: Option<PathBuf>,
    /// Present exactly these image files
    #[arg(long, value_name = "FILE", num_args = 1..)]
    files: Vec<PathBuf>,
    /// Run a schedule session with the saved schedule of this title
    #[arg(long, value_name = "TITLE", conflicts_with = "seconds")]
    schedule: Option<String>,
    /// Run a fixed session showing each image for this many seconds
    #[arg(long, value_name = "SECONDS")]
    seconds: Option<u32>,
    /// Deterministic RNG seed for the image order
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,
    /// Print the first STEPS images of the session plan without presenting
    #[arg(long = "dry-run", value_name = "STEPS")]
    dry_run: Option<usize>,
    /// Print the saved schedules and exit
    #[arg(long = "list-schedules")]
    list_schedules: bool,
    /// Size the window to each image instead of letterboxing
    #[arg(long)]
    standalone: bool,
    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut cfg = Configuration::load_or_default(&args.config)?;
    tracing::debug!("configuration from {}:\n{:#?}", args.config.display(), cfg);
    apply_overrides(&mut cfg, &args);

    if args.list_schedules {
        print_schedules(&cfg);
        return Ok(());
    }

    let timing = cfg.timing().context("cannot start a session")?;
    let seed = args.seed.or(cfg.shuffle_seed);
    let images = resolve_collection(&args, &cfg)?;
    tracing::info!(selection = %images.summary(), "image collection ready");

    if let Some(steps) = args.dry_run {
        return run_dry_run(&images, &timing, seed, steps);
    }

    // Channels (small/bounded)
    let (show_tx, show_rx) = mpsc::channel::<ShowImage>(1); // Presenter -> Loader
    let (loaded_tx, loaded_rx) = mpsc::channel::<ImageHandle>(1); // Loader -> Viewer
    let (displayed_tx, mut displayed_rx) = mpsc::channel::<Displayed>(16); // Viewer -> Host
    let (viewer_control_tx, viewer_control_rx) = mpsc::channel::<ViewerCommand>(16); // External -> Viewer
    let (snapshot_tx, mut snapshot_rx) = watch::channel(PresentationSnapshot::Idle);

    let cancel = CancellationToken::new();

    // Ctrl-D/Ctrl-C end the session
    if io::stdin().is_terminal() {
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || {
            let mut sink = Vec::new();
            match io::stdin().read_to_end(&mut sink) {
                Ok(_) => tracing::info!("stdin closed; ending session"),
                Err(err) => tracing::warn!("stdin watcher failed: {err}"),
            }
            cancel.cancel();
        });
    } else {
        tracing::debug!("stdin is not a terminal; skipping shutdown watcher");
    }

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; ending session");
            cancel.cancel();
        });
    }

    #[cfg(unix)]
    {
        let cancel = cancel.clone();
        let control = viewer_control_tx.clone();
        tokio::spawn(async move {
            match signal(SignalKind::user_defined1()) {
                Ok(mut sigusr1) => loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        received = sigusr1.recv() => {
                            if received.is_none() {
                                break;
                            }
                            tracing::info!("SIGUSR1 received; clearing the view");
                            if let Err(err) = control.send(ViewerCommand::Clear).await {
                                tracing::warn!("failed to forward clear request: {err}");
                                break;
                            }
                        }
                    }
                },
                Err(err) => tracing::warn!("failed to register SIGUSR1 handler: {err}"),
            }
        });
    }
    drop(viewer_control_tx);

    let mut tasks = JoinSet::new();

    // Presenter
    tasks.spawn({
        let images = Arc::new(images);
        let cancel = cancel.clone();
        async move {
            tasks::presenter::run(images, timing, seed, show_tx, snapshot_tx, cancel)
                .await
                .context("presenter task failed")
        }
    });

    // Loader
    tasks.spawn({
        let cancel = cancel.clone();
        async move {
            tasks::loader::run(show_rx, loaded_tx, cancel)
                .await
                .context("loader task failed")
        }
    });

    // Viewer
    tasks.spawn({
        let cancel = cancel.clone();
        let options = cfg.viewer.options();
        async move {
            tasks::viewer::run(loaded_rx, viewer_control_rx, displayed_tx, options, cancel)
                .await
                .context("viewer task failed")
        }
    });

    // Host: report what is on screen and where the session stands.
    tasks.spawn({
        let cancel = cancel.clone();
        async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    maybe = displayed_rx.recv() => {
                        let Some(displayed) = maybe else { break };
                        tracing::debug!(
                            index = displayed.index,
                            x = displayed.rect.x,
                            y = displayed.rect.y,
                            width = displayed.rect.width,
                            height = displayed.rect.height,
                            window = ?displayed.window,
                            "image on screen"
                        );
                    }
                    changed = snapshot_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let snapshot = *snapshot_rx.borrow_and_update();
                        if let PresentationSnapshot::Running(state) = snapshot {
                            tracing::debug!(
                                position = state.position + 1,
                                of = state.len,
                                lap = state.lap + 1,
                                "session progress"
                            );
                        }
                    }
                }
            }
            Ok::<_, anyhow::Error>(())
        }
    });

    // The session ends as soon as any task does; ask the rest to stop.
    if let Some(first) = tasks.join_next().await {
        log_task_result(first);
    }
    cancel.cancel();

    while let Some(res) = tasks.join_next().await {
        log_task_result(res);
    }

    Ok(())
}

fn log_task_result(res: Result<Result<()>, tokio::task::JoinError>) {
    match res {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!("task error: {e:?}"),
        Err(e) => tracing::error!("join error: {e}"),
    }
}

fn apply_overrides(cfg: &mut Configuration, args: &Args) {
    if let Some(title) = &args.schedule {
        cfg.session_type = SessionType::Schedule;
        cfg.selected_schedule = Some(title.clone());
    }
    if let Some(seconds) = args.seconds {
        cfg.session_type = SessionType::Fixed;
        cfg.fixed_time = FixedTime::Other;
        cfg.custom_fixed_time = Some(seconds);
    }
    if args.standalone {
        cfg.viewer.standalone = true;
    }
}

/// Explicit files win, then a folder from the command line or config, then
/// the folder remembered from the last run.
fn resolve_collection(args: &Args, cfg: &Configuration) -> Result<ImageCollection> {
    if !args.files.is_empty() {
        return ImageCollection::from_files("selected files", args.files.iter().cloned())
            .context("no usable images among --files");
    }

    let store = LastFolderStore::new(&cfg.state_file);
    let folder = match args.folder.as_ref().or(cfg.image_folder.as_ref()) {
        Some(folder) => {
            let images = ImageCollection::from_folder(folder)
                .with_context(|| format!("failed to read image folder {}", folder.display()))?;
            if let Err(err) = store.save(folder) {
                tracing::warn!("could not remember image folder: {err:#}");
            }
            return Ok(images);
        }
        None => store.load()?,
    };

    match folder {
        Some(last) => {
            tracing::info!(
                folder = %last.path.display(),
                saved_at = %last.saved_at,
                "reusing last image folder"
            );
            ImageCollection::from_folder(&last.path).with_context(|| {
                format!("failed to read last image folder {}", last.path.display())
            })
        }
        None => bail!("no image folder selected; pass --folder or --files"),
    }
}

fn print_schedules(cfg: &Configuration) {
    let selected = cfg.selected_schedule().ok().map(|s| s.title().to_string());
    for schedule in cfg.schedules.iter() {
        let marker = if selected.as_deref() == Some(schedule.title()) {
            "*"
        } else {
            " "
        };
        let tag = if schedule.is_default() { " [default]" } else { "" };
        println!("{marker} {schedule}{tag}");
        for group in schedule.interval_groups() {
            println!("      {group}");
        }
    }
}

fn run_dry_run(
    images: &ImageCollection,
    timing: &TimingConfig,
    seed: Option<u64>,
    steps: usize,
) -> Result<()> {
    println!(
        "# session dry run\n# images: {}\n# timing: {}\n# steps: {}\n# seed: {}\n",
        images.len(),
        timing,
        steps,
        seed.map_or_else(|| "(random)".to_string(), |s| s.to_string())
    );

    let plan = tasks::presenter::simulate(images.len(), timing, seed, steps)?;
    println!("# planned order:");
    for (idx, step) in plan.iter().enumerate() {
        let path = images
            .get(step.index)
            .map(|entry| entry.path.display().to_string())
            .unwrap_or_default();
        println!(
            "  {:>4}: +{:<10} lap {:<3} {:<8} {}",
            idx + 1,
            humantime::format_duration(step.at).to_string(),
            step.lap + 1,
            humantime::format_duration(step.wait).to_string(),
            path
        );
    }
    Ok(())
}
