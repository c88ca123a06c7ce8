//! Maps elapsed session time onto a schedule's flattened intervals.
//!
//! Everything here is recomputed from the elapsed time and the schedule
//! definition, so a timer that fires late or a session that was suspended
//! lands on the correct interval without any carried-over state.

use std::time::Duration;

use session_model::CustomSchedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockPosition {
    /// `elapsed` falls inside interval `index`, which ends after `remaining`.
    Active { index: usize, remaining: Duration },
    /// `elapsed` is at or past the end of the last interval.
    Exhausted,
}

/// Position within a schedule that restarts from interval 0 whenever it runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CyclePosition {
    /// Completed passes through the whole schedule.
    pub pass: u64,
    pub index: usize,
    pub remaining: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleClock {
    /// One span per run of equal intervals, in playback order. Repeats are
    /// resolved arithmetically and never expanded.
    spans: Vec<Span>,
    len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    start_ms: u64,
    end_ms: u64,
    duration_ms: u64,
    first_index: usize,
    count: usize,
}

impl ScheduleClock {
    pub fn new(schedule: &CustomSchedule) -> Self {
        Self::from_groups(
            schedule
                .interval_groups()
                .iter()
                .map(|group| (group.duration_ms(), group.repeat_count())),
        )
    }

    /// One interval per duration. Zero-length entries never become active
    /// and are dropped.
    pub fn from_durations<I>(durations_ms: I) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        Self::from_groups(durations_ms.into_iter().map(|ms| (ms, 1)))
    }

    /// `(duration_ms, repeat_count)` pairs, expanded lazily.
    pub fn from_groups<I>(groups: I) -> Self
    where
        I: IntoIterator<Item = (u64, u32)>,
    {
        let mut spans: Vec<Span> = Vec::new();
        let mut total = 0u64;
        let mut len = 0usize;
        for (duration_ms, repeat_count) in groups {
            if duration_ms == 0 || repeat_count == 0 {
                continue;
            }
            let count = usize::try_from(repeat_count).unwrap_or(usize::MAX);
            let end_ms = total.saturating_add(duration_ms.saturating_mul(u64::from(repeat_count)));
            match spans.last_mut() {
                Some(last) if last.duration_ms == duration_ms => {
                    last.end_ms = end_ms;
                    last.count = last.count.saturating_add(count);
                }
                _ => spans.push(Span {
                    start_ms: total,
                    end_ms,
                    duration_ms,
                    first_index: len,
                    count,
                }),
            }
            total = end_ms;
            len = len.saturating_add(count);
        }
        Self { spans, len }
    }

    /// Number of flattened intervals.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn total_ms(&self) -> u64 {
        self.spans.last().map_or(0, |span| span.end_ms)
    }

    pub fn interval_duration(&self, index: usize) -> Option<Duration> {
        let at = self
            .spans
            .partition_point(|span| span.first_index.saturating_add(span.count) <= index);
        self.spans
            .get(at)
            .map(|span| Duration::from_millis(span.duration_ms))
    }

    pub fn position(&self, elapsed: Duration) -> ClockPosition {
        let (elapsed_ms, fraction) = split_millis(elapsed);
        match self.locate(elapsed_ms, fraction) {
            Some((index, remaining)) => ClockPosition::Active { index, remaining },
            None => ClockPosition::Exhausted,
        }
    }

    /// Like [`position`](Self::position), but an exhausted schedule wraps back
    /// to interval 0. `None` only for a schedule without intervals.
    pub fn cycle_position(&self, elapsed: Duration) -> Option<CyclePosition> {
        let total = self.total_ms();
        if total == 0 {
            return None;
        }
        let (elapsed_ms, fraction) = split_millis(elapsed);
        let pass = elapsed_ms / total;
        let (index, remaining) = self.locate(elapsed_ms % total, fraction)?;
        Some(CyclePosition {
            pass,
            index,
            remaining,
        })
    }

    fn locate(&self, elapsed_ms: u64, fraction: Duration) -> Option<(usize, Duration)> {
        // Span windows are [start, end); the active one is the first whose
        // end lies beyond the elapsed time.
        let at = self.spans.partition_point(|span| span.end_ms <= elapsed_ms);
        let span = self.spans.get(at)?;
        let offset = elapsed_ms - span.start_ms;
        // Only a saturated total can push `repeat` past the last interval.
        let repeat = usize::try_from(offset / span.duration_ms)
            .unwrap_or(usize::MAX)
            .min(span.count - 1);
        let interval_end = span
            .start_ms
            .saturating_add(span.duration_ms.saturating_mul(repeat as u64 + 1))
            .min(span.end_ms);
        let remaining = Duration::from_millis(interval_end - elapsed_ms).saturating_sub(fraction);
        Some((span.first_index + repeat, remaining))
    }
}

fn split_millis(elapsed: Duration) -> (u64, Duration) {
    let whole = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    let fraction = elapsed.saturating_sub(Duration::from_millis(whole));
    (whole, fraction)
}
