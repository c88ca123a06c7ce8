use std::time::Duration;

use rand::{Rng, SeedableRng, rngs::StdRng};
use session_model::TimingConfig;
use tracing::{debug, info};

use crate::clock::ScheduleClock;
use crate::error::SessionError;
use crate::order::{is_permutation, random_order};

/// Owns the shuffled traversal order and the current image for one session.
///
/// Rules:
/// - `start` builds a fresh random order and shows its first entry.
/// - `advance` steps through the order; past the last entry it reshuffles and
///   begins a new lap, so every image is shown once per lap.
/// - In schedule mode `tick` also begins a new lap whenever the schedule runs
///   out and restarts at its first interval.
/// - `stop` discards everything; nothing survives into the next session.
pub struct PresentationScheduler<R = StdRng> {
    rng: R,
    session: Option<Session>,
}

struct Session {
    order: Vec<usize>,
    position: usize,
    lap: u64,
    pacing: Pacing,
}

enum Pacing {
    Fixed(Duration),
    Schedule { clock: ScheduleClock, pass: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub current_index: usize,
    /// Position of `current_index` within the lap's order.
    pub position: usize,
    pub lap: u64,
    pub len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresentationSnapshot {
    #[default]
    Idle,
    Running(SessionSnapshot),
}

impl PresentationSnapshot {
    pub fn current_index(&self) -> Option<usize> {
        match self {
            Self::Idle => None,
            Self::Running(snapshot) => Some(snapshot.current_index),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }
}

/// Result of one step. `previous` is handed back so the caller can release
/// whatever it loaded for that image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advance {
    pub previous: usize,
    pub current: usize,
    pub position: usize,
    pub lap: u64,
    /// A new order was generated for this step.
    pub wrapped: bool,
}

#[derive(Debug, Clone, Copy)]
enum LapReason {
    SessionStart,
    LapComplete,
    ScheduleExhausted,
}

impl PresentationScheduler<StdRng> {
    /// OS-seeded unless a seed is given for reproducible orders.
    pub fn from_seed(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_rng(rng)
    }
}

impl<R: Rng> PresentationScheduler<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng, session: None }
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.session.as_ref().map(Session::current)
    }

    /// The current lap's traversal order.
    pub fn order(&self) -> Option<&[usize]> {
        self.session.as_ref().map(|s| s.order.as_slice())
    }

    pub fn snapshot(&self) -> PresentationSnapshot {
        match &self.session {
            Some(session) => PresentationSnapshot::Running(session.snapshot()),
            None => PresentationSnapshot::Idle,
        }
    }

    /// `Idle -> Running`. Starting while running replaces the session.
    pub fn start(
        &mut self,
        len: usize,
        timing: &TimingConfig,
    ) -> Result<SessionSnapshot, SessionError> {
        if len == 0 {
            return Err(SessionError::EmptyCollection);
        }
        let pacing = match timing {
            TimingConfig::Fixed { duration } => Pacing::Fixed(*duration),
            TimingConfig::Schedule { schedule } => {
                let clock = ScheduleClock::new(schedule);
                if clock.is_empty() {
                    return Err(SessionError::EmptySchedule(schedule.title().to_string()));
                }
                Pacing::Schedule { clock, pass: 0 }
            }
        };
        let order = self.fresh_order(len, LapReason::SessionStart, 0);
        let session = Session {
            order,
            position: 0,
            lap: 0,
            pacing,
        };
        let snapshot = session.snapshot();
        info!(
            images = len,
            first = snapshot.current_index,
            timing = %timing,
            "presentation session started"
        );
        self.session = Some(session);
        Ok(snapshot)
    }

    /// Step to the next image of the lap, reshuffling when the lap is done.
    pub fn advance(&mut self) -> Option<Advance> {
        let session = self.session.as_mut()?;
        let previous = session.current();
        let wrapped = session.position + 1 >= session.order.len();
        if wrapped {
            let lap = session.lap + 1;
            let len = session.order.len();
            let order = fresh_order(&mut self.rng, len, LapReason::LapComplete, lap);
            session.order = order;
            session.position = 0;
            session.lap = lap;
        } else {
            session.position += 1;
        }
        Some(session.step_from(previous, wrapped))
    }

    /// Timer entry point. `elapsed` is measured from session start.
    pub fn tick(&mut self, elapsed: Duration) -> Option<Advance> {
        let session = self.session.as_mut()?;
        let Pacing::Schedule { clock, pass } = &mut session.pacing else {
            return self.advance();
        };
        let Some(position) = clock.cycle_position(elapsed) else {
            return self.advance();
        };
        if position.pass <= *pass {
            return self.advance();
        }

        // The schedule ran out: restart at its first interval with a new lap.
        *pass = position.pass;
        let previous = session.current();
        let lap = session.lap + 1;
        let len = session.order.len();
        session.order = fresh_order(&mut self.rng, len, LapReason::ScheduleExhausted, lap);
        session.position = 0;
        session.lap = lap;
        Some(session.step_from(previous, true))
    }

    /// How long the current image stays up, measured from `elapsed`.
    pub fn next_wait(&self, elapsed: Duration) -> Option<Duration> {
        let session = self.session.as_ref()?;
        match &session.pacing {
            Pacing::Fixed(duration) => Some(*duration),
            Pacing::Schedule { clock, .. } => clock
                .cycle_position(elapsed)
                .map(|position| position.remaining),
        }
    }

    /// `Running -> Idle`. Safe to call repeatedly.
    pub fn stop(&mut self) -> Option<SessionSnapshot> {
        let session = self.session.take()?;
        let snapshot = session.snapshot();
        info!(
            last = snapshot.current_index,
            laps = snapshot.lap + 1,
            "presentation session stopped"
        );
        Some(snapshot)
    }

    fn fresh_order(&mut self, len: usize, reason: LapReason, lap: u64) -> Vec<usize> {
        fresh_order(&mut self.rng, len, reason, lap)
    }
}

fn fresh_order<R: Rng + ?Sized>(rng: &mut R, len: usize, reason: LapReason, lap: u64) -> Vec<usize> {
    let order = random_order(len, rng);
    debug_assert!(is_permutation(&order));
    debug!(images = len, lap, reason = ?reason, "image order shuffled");
    order
}

impl Session {
    fn current(&self) -> usize {
        self.order[self.position]
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            current_index: self.current(),
            position: self.position,
            lap: self.lap,
            len: self.order.len(),
        }
    }

    fn step_from(&self, previous: usize, wrapped: bool) -> Advance {
        Advance {
            previous,
            current: self.current(),
            position: self.position,
            lap: self.lap,
            wrapped,
        }
    }
}
