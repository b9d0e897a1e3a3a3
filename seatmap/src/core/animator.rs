//! Marker Animator - 用户标记平滑移动
//!
//! Moves the user's marker from its displayed position to a new fix by
//! linear interpolation over a fixed window. Built on [`ScheduledRepeat`],
//! a cancellable frame loop: starting a new animation cancels the one in
//! flight (last update wins, nothing is chained).

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use shared::geo::Coordinate;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::map::MapSurface;

/// Length of one marker animation
pub const ANIMATION_DURATION: Duration = Duration::from_millis(400);

/// Frame period (~60 Hz)
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

struct Running {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Cancellable scheduled-repeat operation
///
/// Calls the frame callback with the elapsed time once per tick until the
/// callback breaks or the run is cancelled. At most one run is in flight.
pub struct ScheduledRepeat {
    interval: Duration,
    running: Option<Running>,
}

impl ScheduledRepeat {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            running: None,
        }
    }

    /// Start a new run, cancelling the current one first
    pub fn start<F>(&mut self, mut frame: F)
    where
        F: FnMut(Duration) -> ControlFlow<()> + Send + 'static,
    {
        self.cancel();

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let period = self.interval.max(Duration::from_millis(1));

        let task = tokio::spawn(async move {
            let started = Instant::now();
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if frame(started.elapsed()).is_break() {
                            break;
                        }
                    }
                }
            }
        });

        self.running = Some(Running { cancel, task });
    }

    /// Cancel the current run; no-op when idle
    pub fn cancel(&mut self) {
        if let Some(running) = self.running.take() {
            running.cancel.cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|r| !r.cancel.is_cancelled() && !r.task.is_finished())
    }
}

impl Drop for ScheduledRepeat {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Marker position shared with the running frame loop
#[derive(Debug, Default)]
struct Displayed {
    position: Option<Coordinate>,
    /// Bumped by every `animate_to`; frames of older runs are ignored
    generation: u64,
}

impl Displayed {
    /// Record a frame of run `generation`; `false` when that run is stale
    fn apply_frame(&mut self, generation: u64, position: Coordinate) -> bool {
        if generation != self.generation {
            return false;
        }
        self.position = Some(position);
        true
    }
}

/// Animates the user's marker on a [`MapSurface`]
pub struct MarkerAnimator {
    map: Arc<dyn MapSurface>,
    /// Position currently shown on the map (updated every frame)
    displayed: Arc<Mutex<Displayed>>,
    duration: Duration,
    repeat: ScheduledRepeat,
}

impl MarkerAnimator {
    pub fn new(map: Arc<dyn MapSurface>) -> Self {
        Self::with_timing(map, ANIMATION_DURATION, FRAME_INTERVAL)
    }

    pub fn with_timing(map: Arc<dyn MapSurface>, duration: Duration, frame: Duration) -> Self {
        Self {
            map,
            displayed: Arc::new(Mutex::new(Displayed::default())),
            duration,
            repeat: ScheduledRepeat::new(frame),
        }
    }

    /// Position currently shown, `None` before the first fix
    pub fn displayed(&self) -> Option<Coordinate> {
        self.displayed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .position
    }

    pub fn is_active(&self) -> bool {
        self.repeat.is_active()
    }

    /// Move the marker to `target`
    ///
    /// The first position is placed immediately. Later ones animate from the
    /// currently displayed position, cancelling any animation in flight.
    pub fn animate_to(&mut self, target: Coordinate) {
        // 先取消旧动画；旧帧可能仍在执行，由 generation 在锁内拦截
        self.repeat.cancel();

        let (from, generation) = {
            let mut displayed = self.displayed.lock().unwrap_or_else(PoisonError::into_inner);
            displayed.generation = displayed.generation.wrapping_add(1);
            match displayed.position {
                Some(from) => (from, displayed.generation),
                None => {
                    displayed.position = Some(target);
                    self.map.set_user_marker(target);
                    return;
                }
            }
        };

        let map = self.map.clone();
        let displayed = self.displayed.clone();
        let duration = self.duration;

        self.repeat.start(move |elapsed| {
            let t = if duration.is_zero() {
                1.0
            } else {
                elapsed.as_secs_f64() / duration.as_secs_f64()
            };
            let position = from.interpolate(target, t);
            {
                let mut displayed = displayed.lock().unwrap_or_else(PoisonError::into_inner);
                if !displayed.apply_frame(generation, position) {
                    return ControlFlow::Break(());
                }
                // Drawn under the lock so a newer run cannot interleave
                map.set_user_marker(position);
            }

            if t >= 1.0 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
    }

    /// Stop the animation in flight, leaving the marker where it is
    pub fn cancel(&mut self) {
        self.repeat.cancel();
    }
}
