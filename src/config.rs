use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use session_model::{CustomSchedule, FixedTime, ScheduleLibrary, SessionType, TimingConfig};

use crate::error::SessionError;
use crate::tasks::viewer::ViewerOptions;
use crate::tasks::viewer::layout::{Viewport, WindowChrome};

const DEFAULT_STATE_FILE: &str = ".sketch-slideshow/last-folder.json";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    /// Folder to present. When unset, the last presented folder is reused.
    pub image_folder: Option<PathBuf>,
    /// Which timing scheme governs the session.
    pub session_type: SessionType,
    /// Display time per image for fixed sessions.
    pub fixed_time: FixedTime,
    /// Seconds per image when `fixed-time` is `other`.
    pub custom_fixed_time: Option<u32>,
    /// Saved schedules; the built-in default is always first.
    pub schedules: ScheduleLibrary,
    /// Title of the schedule used for schedule sessions. Defaults to the
    /// first schedule in the library.
    pub selected_schedule: Option<String>,
    /// Optional deterministic seed for the image order.
    pub shuffle_seed: Option<u64>,
    /// Where the last presented folder is remembered.
    pub state_file: PathBuf,
    /// Presentation view sizing.
    pub viewer: ViewerConfig,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ViewerConfig {
    pub viewport: Viewport,
    /// Resize the window to each image instead of letterboxing.
    pub standalone: bool,
    pub window_chrome: WindowChrome,
}

impl ViewerConfig {
    pub fn options(&self) -> ViewerOptions {
        ViewerOptions {
            viewport: self.viewport,
            standalone: self.standalone,
            chrome: self.window_chrome,
        }
    }
}

impl Configuration {
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let s = std::fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            self.viewer.viewport.width > 0 && self.viewer.viewport.height > 0,
            "viewer.viewport must have a positive width and height"
        );
        ensure!(
            !self.state_file.as_os_str().is_empty(),
            "state-file must not be empty"
        );
        if let Some(folder) = &self.image_folder {
            ensure!(
                !folder.as_os_str().is_empty(),
                "image-folder must not be empty when provided"
            );
        }
        if let Some(title) = &self.selected_schedule {
            ensure!(
                self.schedules.find(title).is_some(),
                "selected-schedule '{}' does not match any saved schedule",
                title
            );
        }
        Ok(self)
    }

    pub fn selected_schedule(&self) -> Result<&CustomSchedule, SessionError> {
        match &self.selected_schedule {
            Some(title) => self
                .schedules
                .find(title)
                .ok_or_else(|| SessionError::UnknownSchedule(title.clone())),
            None => Ok(self.schedules.first()),
        }
    }

    /// Resolve the timing for a session, rejecting configurations that must
    /// not start: an `other` fixed time without a value, or an empty schedule.
    pub fn timing(&self) -> Result<TimingConfig, SessionError> {
        match self.session_type {
            SessionType::Fixed => self
                .fixed_time
                .to_duration(self.custom_fixed_time)
                .map(|duration| TimingConfig::Fixed { duration })
                .ok_or(SessionError::UnresolvedCustomDuration),
            SessionType::Schedule => {
                let schedule = self.selected_schedule()?;
                if schedule.is_empty() {
                    return Err(SessionError::EmptySchedule(schedule.title().to_string()));
                }
                Ok(TimingConfig::Schedule {
                    schedule: schedule.clone(),
                })
            }
        }
    }

    /// Load `path` when it exists, otherwise start from defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        let cfg = if path.exists() {
            Self::from_yaml_file(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?
        } else {
            tracing::info!(path = %path.display(), "no configuration file; using defaults");
            Self::default()
        };
        cfg.validated().context("invalid configuration values")
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            image_folder: None,
            session_type: SessionType::default(),
            fixed_time: FixedTime::default(),
            custom_fixed_time: None,
            schedules: ScheduleLibrary::default(),
            selected_schedule: None,
            shuffle_seed: None,
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            viewer: ViewerConfig::default(),
        }
    }
}
