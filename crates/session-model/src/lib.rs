use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use fixed::{FixedTime, SessionType};
pub use interval::{Interval, IntervalGroup, InvalidIntervalError};
pub use library::ScheduleLibrary;
pub use schedule::{CustomSchedule, EditError};
pub use timing::TimingConfig;

/// Render a millisecond count as an `1h 2m 3s` style breakdown.
pub fn format_duration_ms(total_ms: u64) -> String {
    humantime::format_duration(Duration::from_millis(total_ms)).to_string()
}

mod interval {
    use super::*;

    /// Rejected attempt to build an interval or interval group from
    /// non-positive values.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
    #[error(
        "intervals need a positive duration and repeat count (duration-ms={duration_ms}, repeat-count={repeat_count})"
    )]
    pub struct InvalidIntervalError {
        pub duration_ms: u64,
        pub repeat_count: u32,
    }

    /// A single timed display slot.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Interval {
        duration_ms: u64,
    }

    impl Interval {
        pub fn new(duration_ms: u64) -> Result<Self, InvalidIntervalError> {
            if duration_ms == 0 {
                return Err(InvalidIntervalError {
                    duration_ms,
                    repeat_count: 1,
                });
            }
            Ok(Self { duration_ms })
        }

        pub fn duration_ms(&self) -> u64 {
            self.duration_ms
        }

        pub fn duration(&self) -> Duration {
            Duration::from_millis(self.duration_ms)
        }
    }

    /// `repeat_count` consecutive intervals of `duration_ms` each.
    ///
    /// Both fields are positive for every value of this type; deserialization
    /// runs through the same check as [`IntervalGroup::new`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case", try_from = "RawIntervalGroup")]
    pub struct IntervalGroup {
        pub(crate) duration_ms: u64,
        pub(crate) repeat_count: u32,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "kebab-case", deny_unknown_fields)]
    struct RawIntervalGroup {
        duration_ms: u64,
        repeat_count: u32,
    }

    impl TryFrom<RawIntervalGroup> for IntervalGroup {
        type Error = InvalidIntervalError;

        fn try_from(raw: RawIntervalGroup) -> Result<Self, Self::Error> {
            Self::new(raw.duration_ms, raw.repeat_count)
        }
    }

    impl IntervalGroup {
        pub fn new(duration_ms: u64, repeat_count: u32) -> Result<Self, InvalidIntervalError> {
            if duration_ms == 0 || repeat_count == 0 {
                return Err(InvalidIntervalError {
                    duration_ms,
                    repeat_count,
                });
            }
            Ok(Self {
                duration_ms,
                repeat_count,
            })
        }

        pub fn duration_ms(&self) -> u64 {
            self.duration_ms
        }

        pub fn repeat_count(&self) -> u32 {
            self.repeat_count
        }

        pub fn duration(&self) -> Duration {
            Duration::from_millis(self.duration_ms)
        }

        /// Copy of this group with a different per-interval duration.
        pub fn with_duration_ms(self, duration_ms: u64) -> Result<Self, InvalidIntervalError> {
            Self::new(duration_ms, self.repeat_count)
        }

        /// Copy of this group with a different repeat count.
        pub fn with_repeat_count(self, repeat_count: u32) -> Result<Self, InvalidIntervalError> {
            Self::new(self.duration_ms, repeat_count)
        }

        pub fn total_ms(&self) -> u64 {
            self.duration_ms.saturating_mul(u64::from(self.repeat_count))
        }

        pub fn intervals(&self) -> impl Iterator<Item = Interval> + '_ {
            let interval = Interval {
                duration_ms: self.duration_ms,
            };
            std::iter::repeat_n(interval, self.repeat_count as usize)
        }
    }

    impl fmt::Display for IntervalGroup {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(
                f,
                "{} x {}",
                self.repeat_count,
                format_duration_ms(self.duration_ms)
            )
        }
    }
}

mod schedule {
    use super::*;

    const BUILTIN_TITLE: &str = "Classic Gesture";

    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    pub enum EditError {
        #[error("schedule '{title}' is a built-in default and cannot be changed")]
        DefaultScheduleImmutable { title: String },
        #[error("interval group {index} is out of range (schedule has {len} groups)")]
        GroupOutOfRange { index: usize, len: usize },
        #[error("schedule {index} is out of range (library has {len} schedules)")]
        ScheduleOutOfRange { index: usize, len: usize },
        #[error("no saved schedule matches '{title}'")]
        UnknownSchedule { title: String },
    }

    /// A named, ordered sequence of interval groups.
    ///
    /// Equality is structural: two schedules built separately with the same
    /// title, groups and default flag compare equal.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case", deny_unknown_fields)]
    pub struct CustomSchedule {
        title: String,
        #[serde(default)]
        interval_groups: Vec<IntervalGroup>,
        /// Only the built-in schedule is ever default; the flag is not read
        /// from or written to saved schedules.
        #[serde(skip)]
        is_default: bool,
    }

    impl CustomSchedule {
        pub fn new(title: impl Into<String>, interval_groups: Vec<IntervalGroup>) -> Self {
            Self {
                title: title.into(),
                interval_groups,
                is_default: false,
            }
        }

        /// The built-in warm-up schedule that heads every library.
        pub fn builtin_default() -> Self {
            let groups = [(30_000, 10), (60_000, 5), (300_000, 2)]
                .into_iter()
                .map(|(duration_ms, repeat_count)| IntervalGroup {
                    duration_ms,
                    repeat_count,
                })
                .collect();
            Self {
                title: BUILTIN_TITLE.to_string(),
                interval_groups: groups,
                is_default: true,
            }
        }

        pub fn title(&self) -> &str {
            &self.title
        }

        pub fn interval_groups(&self) -> &[IntervalGroup] {
            &self.interval_groups
        }

        pub fn is_default(&self) -> bool {
            self.is_default
        }

        pub fn is_empty(&self) -> bool {
            self.interval_groups.is_empty()
        }

        pub fn total_duration_ms(&self) -> u64 {
            self.interval_groups
                .iter()
                .fold(0u64, |acc, group| acc.saturating_add(group.total_ms()))
        }

        pub fn total_duration(&self) -> Duration {
            Duration::from_millis(self.total_duration_ms())
        }

        pub fn total_time_string(&self) -> String {
            format_duration_ms(self.total_duration_ms())
        }

        /// Every group expanded into its repeated intervals, in playback order.
        pub fn intervals(&self) -> impl Iterator<Item = Interval> + '_ {
            self.interval_groups.iter().flat_map(|group| group.intervals())
        }

        pub fn rename(&mut self, title: impl Into<String>) -> Result<(), EditError> {
            self.ensure_editable()?;
            self.title = title.into();
            Ok(())
        }

        pub fn push_group(&mut self, group: IntervalGroup) -> Result<(), EditError> {
            self.ensure_editable()?;
            self.interval_groups.push(group);
            Ok(())
        }

        pub fn replace_group(&mut self, index: usize, group: IntervalGroup) -> Result<(), EditError> {
            self.ensure_editable()?;
            let len = self.interval_groups.len();
            let slot = self
                .interval_groups
                .get_mut(index)
                .ok_or(EditError::GroupOutOfRange { index, len })?;
            *slot = group;
            Ok(())
        }

        pub fn remove_group(&mut self, index: usize) -> Result<IntervalGroup, EditError> {
            self.ensure_editable()?;
            let len = self.interval_groups.len();
            if index >= len {
                return Err(EditError::GroupOutOfRange { index, len });
            }
            Ok(self.interval_groups.remove(index))
        }

        fn ensure_editable(&self) -> Result<(), EditError> {
            if self.is_default {
                return Err(EditError::DefaultScheduleImmutable {
                    title: self.title.clone(),
                });
            }
            Ok(())
        }
    }

    impl fmt::Display for CustomSchedule {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{} ({})", self.title, self.total_time_string())
        }
    }
}

mod fixed {
    use super::*;

    /// Preset display durations for fixed-time sessions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub enum FixedTime {
        #[default]
        #[serde(rename = "30s")]
        ThirtySeconds,
        #[serde(rename = "45s")]
        FortyFiveSeconds,
        #[serde(rename = "1m")]
        OneMinute,
        #[serde(rename = "2m")]
        TwoMinutes,
        #[serde(rename = "5m")]
        FiveMinutes,
        #[serde(rename = "10m")]
        TenMinutes,
        /// Use the separately stored custom number of seconds.
        #[serde(rename = "other")]
        Other,
    }

    impl FixedTime {
        pub const ALL: &'static [Self] = &[
            Self::ThirtySeconds,
            Self::FortyFiveSeconds,
            Self::OneMinute,
            Self::TwoMinutes,
            Self::FiveMinutes,
            Self::TenMinutes,
            Self::Other,
        ];

        pub fn label(&self) -> &'static str {
            match self {
                Self::ThirtySeconds => "30s",
                Self::FortyFiveSeconds => "45s",
                Self::OneMinute => "1m",
                Self::TwoMinutes => "2m",
                Self::FiveMinutes => "5m",
                Self::TenMinutes => "10m",
                Self::Other => "other",
            }
        }

        /// Table value for presets; `None` for [`FixedTime::Other`].
        pub fn preset_ms(&self) -> Option<u64> {
            match self {
                Self::ThirtySeconds => Some(30_000),
                Self::FortyFiveSeconds => Some(45_000),
                Self::OneMinute => Some(60_000),
                Self::TwoMinutes => Some(120_000),
                Self::FiveMinutes => Some(300_000),
                Self::TenMinutes => Some(600_000),
                Self::Other => None,
            }
        }

        /// Resolve to a display duration. `Other` needs a positive custom value;
        /// without one the duration is unresolved and `None` is returned.
        pub fn to_duration(&self, custom_seconds: Option<u32>) -> Option<Duration> {
            match self.preset_ms() {
                Some(ms) => Some(Duration::from_millis(ms)),
                None => custom_seconds
                    .filter(|seconds| *seconds > 0)
                    .map(|seconds| Duration::from_millis(u64::from(seconds) * 1000)),
            }
        }
    }

    impl fmt::Display for FixedTime {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.label())
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    #[serde(rename_all = "kebab-case")]
    pub enum SessionType {
        #[default]
        Fixed,
        Schedule,
    }

    impl SessionType {
        pub const ALL: &'static [Self] = &[Self::Fixed, Self::Schedule];

        pub fn description(&self) -> &'static str {
            match self {
                Self::Fixed => "Every image is shown for the same amount of time.",
                Self::Schedule => {
                    "Images follow a custom schedule of timed stages,\nfrom quick warm-ups to long studies."
                }
            }
        }
    }

    impl fmt::Display for SessionType {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::Fixed => f.write_str("Fixed"),
                Self::Schedule => f.write_str("Schedule"),
            }
        }
    }
}

mod timing {
    use super::*;

    /// Resolved timing handed to the presentation scheduler at session start.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum TimingConfig {
        Fixed { duration: Duration },
        Schedule { schedule: CustomSchedule },
    }

    impl TimingConfig {
        pub fn session_type(&self) -> SessionType {
            match self {
                Self::Fixed { .. } => SessionType::Fixed,
                Self::Schedule { .. } => SessionType::Schedule,
            }
        }
    }

    impl fmt::Display for TimingConfig {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::Fixed { duration } => write!(
                    f,
                    "fixed {}",
                    format_duration_ms(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
                ),
                Self::Schedule { schedule } => write!(f, "schedule {schedule}"),
            }
        }
    }
}

mod library {
    use super::*;

    const NEW_SCHEDULE_GROUP: (u64, u32) = (30_000, 5);

    /// The saved schedules, in display order. A built-in default always sits
    /// at index 0.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(from = "Vec<CustomSchedule>", into = "Vec<CustomSchedule>")]
    pub struct ScheduleLibrary {
        schedules: Vec<CustomSchedule>,
    }

    impl From<Vec<CustomSchedule>> for ScheduleLibrary {
        fn from(mut schedules: Vec<CustomSchedule>) -> Self {
            let builtin = CustomSchedule::builtin_default();
            // A saved copy of the built-in comes back without its flag.
            schedules.retain(|schedule| {
                !schedule.is_default()
                    && !(schedule.title() == builtin.title()
                        && schedule.interval_groups() == builtin.interval_groups())
            });
            schedules.insert(0, builtin);
            Self { schedules }
        }
    }

    impl From<ScheduleLibrary> for Vec<CustomSchedule> {
        fn from(library: ScheduleLibrary) -> Self {
            library.schedules
        }
    }

    impl Default for ScheduleLibrary {
        fn default() -> Self {
            Self::from(Vec::new())
        }
    }

    impl ScheduleLibrary {
        pub fn len(&self) -> usize {
            self.schedules.len()
        }

        pub fn is_empty(&self) -> bool {
            self.schedules.is_empty()
        }

        pub fn iter(&self) -> impl Iterator<Item = &CustomSchedule> {
            self.schedules.iter()
        }

        pub fn get(&self, index: usize) -> Option<&CustomSchedule> {
            self.schedules.get(index)
        }

        pub fn first(&self) -> &CustomSchedule {
            &self.schedules[0]
        }

        pub fn find(&self, title: &str) -> Option<&CustomSchedule> {
            self.schedules.iter().find(|s| s.title() == title)
        }

        pub fn position(&self, schedule: &CustomSchedule) -> Option<usize> {
            self.schedules.iter().position(|s| s == schedule)
        }

        /// Append a fresh editable schedule and return a copy of it.
        pub fn add_new(&mut self) -> CustomSchedule {
            let (duration_ms, repeat_count) = NEW_SCHEDULE_GROUP;
            let group = IntervalGroup {
                duration_ms,
                repeat_count,
            };
            let schedule = CustomSchedule::new(
                format!("Custom Schedule {}", self.schedules.len()),
                vec![group],
            );
            self.schedules.push(schedule.clone());
            schedule
        }

        /// Remove the schedule at `index` and return what should be selected
        /// afterwards: the library head when the removed schedule was the
        /// selected one, otherwise `selected` unchanged.
        pub fn delete(
            &mut self,
            index: usize,
            selected: &CustomSchedule,
        ) -> Result<CustomSchedule, EditError> {
            let len = self.schedules.len();
            let target = self
                .schedules
                .get(index)
                .ok_or(EditError::ScheduleOutOfRange { index, len })?;
            if target.is_default() {
                return Err(EditError::DefaultScheduleImmutable {
                    title: target.title().to_string(),
                });
            }
            let removed = self.schedules.remove(index);
            if removed == *selected {
                Ok(self.first().clone())
            } else {
                Ok(selected.clone())
            }
        }

        /// Swap the saved schedule equal to `original` for `edited`.
        pub fn replace(
            &mut self,
            original: &CustomSchedule,
            edited: CustomSchedule,
        ) -> Result<usize, EditError> {
            let index = self
                .position(original)
                .ok_or_else(|| EditError::UnknownSchedule {
                    title: original.title().to_string(),
                })?;
            if original.is_default() {
                return Err(EditError::DefaultScheduleImmutable {
                    title: original.title().to_string(),
                });
            }
            self.schedules[index] = edited;
            Ok(index)
        }
    }
}
