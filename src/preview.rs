//! Looping preview playback of a sampled or merged sequence.
//!
//! Playback is budgeted at one second per ten frames, never less than one second in total. Two
//! timers drive it: one advances the displayed frame, one advances the elapsed-time readout in
//! 100 ms steps. Both belong to a single [`Playback`] guard and stop together.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError, mpsc},
    thread::JoinHandle,
    time::Duration,
};

use crate::foundation::error::{FramestripError, FramestripResult};

/// Step of the elapsed-time timer.
pub const ELAPSED_TICK: Duration = Duration::from_millis(100);

/// Total loop length for a sequence of `len` frames: `max(1s, len / 10 s)`.
pub fn preview_duration(len: usize) -> Duration {
    Duration::from_millis((len as u64).saturating_mul(100).max(1000))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum PlaybackState {
    Stopped,
    Playing,
}

/// Read model polled by a display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct PreviewSnapshot {
    /// 0-based position in the sequence.
    pub current_index: usize,
    pub elapsed_ms: u64,
    pub total_ms: u64,
    pub state: PlaybackState,
}

/// Timer-free playback state machine.
#[derive(Clone, Debug)]
pub struct PreviewClock {
    len: usize,
    total_ms: u64,
    state: PlaybackState,
    current_index: usize,
    elapsed_ms: u64,
}

impl PreviewClock {
    pub fn new(len: usize) -> FramestripResult<Self> {
        if len == 0 {
            return Err(FramestripError::validation(
                "cannot preview an empty sequence",
            ));
        }
        Ok(Self {
            len,
            total_ms: preview_duration(len).as_millis() as u64,
            state: PlaybackState::Stopped,
            current_index: 0,
            elapsed_ms: 0,
        })
    }

    /// Time each frame stays on screen.
    pub fn frame_period(&self) -> Duration {
        Duration::from_millis(self.total_ms) / self.len as u32
    }

    pub fn start(&mut self) {
        self.state = PlaybackState::Playing;
        self.current_index = 0;
        self.elapsed_ms = 0;
    }

    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
    }

    pub fn advance_frame(&mut self) {
        if self.state == PlaybackState::Playing {
            self.current_index = (self.current_index + 1) % self.len;
        }
    }

    pub fn advance_elapsed(&mut self) {
        if self.state != PlaybackState::Playing {
            return;
        }
        self.elapsed_ms += ELAPSED_TICK.as_millis() as u64;
        if self.elapsed_ms >= self.total_ms {
            self.elapsed_ms = 0;
        }
    }

    pub fn snapshot(&self) -> PreviewSnapshot {
        PreviewSnapshot {
            current_index: self.current_index,
            elapsed_ms: self.elapsed_ms,
            total_ms: self.total_ms,
            state: self.state,
        }
    }
}

/// Runs a [`PreviewClock`] on two background timers.
pub struct PreviewPlayer {
    clock: Arc<Mutex<PreviewClock>>,
    playback: Option<Playback>,
}

impl PreviewPlayer {
    pub fn new(len: usize) -> FramestripResult<Self> {
        Ok(Self {
            clock: Arc::new(Mutex::new(PreviewClock::new(len)?)),
            playback: None,
        })
    }

    /// Begin (or restart) playback from the first frame.
    pub fn start(&mut self) {
        self.stop();

        let period = {
            let mut clock = lock(&self.clock);
            clock.start();
            clock.frame_period()
        };
        self.playback = Some(Playback::spawn(&self.clock, period));
        tracing::debug!(?period, "preview started");
    }

    /// Stop playback; returns once both timers have exited.
    pub fn stop(&mut self) {
        if let Some(playback) = self.playback.take() {
            drop(playback);
            tracing::debug!("preview stopped");
        }
        lock(&self.clock).stop();
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_some()
    }

    pub fn snapshot(&self) -> PreviewSnapshot {
        lock(&self.clock).snapshot()
    }
}

fn lock(clock: &Mutex<PreviewClock>) -> MutexGuard<'_, PreviewClock> {
    clock.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Both timer threads of one playback. Dropping it signals and joins them.
struct Playback {
    stop_tx: Vec<mpsc::Sender<()>>,
    workers: Vec<JoinHandle<()>>,
}

impl Playback {
    fn spawn(clock: &Arc<Mutex<PreviewClock>>, frame_period: Duration) -> Self {
        let mut playback = Self {
            stop_tx: Vec::with_capacity(2),
            workers: Vec::with_capacity(2),
        };
        playback.add_timer(clock, frame_period, PreviewClock::advance_frame);
        playback.add_timer(clock, ELAPSED_TICK, PreviewClock::advance_elapsed);
        playback
    }

    fn add_timer(
        &mut self,
        clock: &Arc<Mutex<PreviewClock>>,
        period: Duration,
        tick: fn(&mut PreviewClock),
    ) {
        let (tx, rx) = mpsc::channel::<()>();
        let clock = Arc::clone(clock);
        let worker = std::thread::spawn(move || {
            // Any message or a dropped sender ends the timer.
            while let Err(mpsc::RecvTimeoutError::Timeout) = rx.recv_timeout(period) {
                tick(&mut lock(&clock));
            }
        });
        self.stop_tx.push(tx);
        self.workers.push(worker);
    }
}

impl Drop for Playback {
    fn drop(&mut self) {
        self.stop_tx.clear();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                tracing::warn!("preview timer panicked");
            }
        }
    }
}
