//! Gesture episode state machine, vote aggregation and final classification.
//!
//! One engine instance owns the full lifecycle of a gesture episode: it
//! drains pending samples from the [`SampleSource`] each tick, buffers them
//! through the entry/exit phases, and fires the gesture callback at most once
//! per episode. Transport errors never tear an episode down; the tick's
//! remaining work is skipped and the same state resumes on the next tick.

use std::fmt;

use log::{debug, warn};

use crate::config::Tuning;
use crate::ring::SampleRing;
use crate::sample::{Channel, Sample};
use crate::source::SampleSource;

/// Classified gesture symbol reported through the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Up,
    Down,
    Left,
    Right,
    Hold,
    Unknown,
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Gesture::Up => "up",
            Gesture::Down => "down",
            Gesture::Left => "left",
            Gesture::Right => "right",
            Gesture::Hold => "hold",
            Gesture::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Entry,
    Exit,
}

/// Episode progress. `filled` counts samples buffered in the current stage;
/// it saturates at the ring depth during the exit stage while wraparound
/// keeps the most recent samples circulating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Collecting { stage: Stage, filled: usize },
    /// Episode over (held, abandoned or timed out); waiting for the hardware
    /// validity flag to clear before returning to `Idle`.
    Exiting,
}

/// How much one axis total must exceed the other for a cardinal call.
const CLASSIFY_MARGIN: i32 = 3;

pub struct GestureEngine {
    min_gesture_ms: u64,
    hold_gesture_ms: u64,
    max_gesture_ms: u64,
    phase: Phase,
    entry_ms: u64,
    entry_ring: SampleRing,
    exit_ring: SampleRing,
    score_x: i32,
    score_y: i32,
}

impl GestureEngine {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            min_gesture_ms: tuning.min_gesture_ms,
            hold_gesture_ms: tuning.hold_gesture_ms,
            max_gesture_ms: tuning.max_gesture_ms,
            phase: Phase::Idle,
            entry_ms: 0,
            entry_ring: SampleRing::new(tuning.sample_depth),
            exit_ring: SampleRing::new(tuning.sample_depth),
            score_x: 0,
            score_y: 0,
        }
    }

    /// One poll tick: drain pending samples, apply the timeout rules, then
    /// check whether the hardware still considers the gesture in progress.
    ///
    /// `on_gesture` is invoked at most once, and only for a completed or held
    /// episode; noise and abandoned episodes fire nothing.
    pub fn process<S, F>(&mut self, src: &mut S, now_ms: u64, mut on_gesture: F)
    where
        S: SampleSource,
        F: FnMut(Gesture),
    {
        let pending = match src.pending_samples() {
            Ok(n) => n,
            Err(e) => {
                debug!("pending count read failed: {e}");
                return;
            }
        };

        for _ in 0..pending {
            match src.next_sample() {
                Ok(sample) => self.buffer_sample(now_ms, sample),
                Err(e) => {
                    // keep partial progress; the rest of the sweep waits for
                    // the next tick
                    warn!("sample pull failed mid-sweep: {e}");
                    break;
                }
            }
        }

        // buffering may have just (re)started the episode and stamped
        // entry_ms, so elapsed is only meaningful from here on
        let elapsed = now_ms.saturating_sub(self.entry_ms);

        if matches!(self.phase, Phase::Collecting { .. }) {
            if elapsed > self.max_gesture_ms {
                debug!("gesture ran too long ({elapsed} ms), abandoned");
                self.phase = Phase::Exiting;
            } else if elapsed > self.hold_gesture_ms {
                debug!("hold detected after {elapsed} ms");
                on_gesture(Gesture::Hold);
                self.phase = Phase::Exiting;
            }
        }

        let status = match src.gesture_status() {
            Ok(s) => s,
            Err(e) => {
                debug!("gesture status read failed: {e}");
                return;
            }
        };
        if status.fifo_overflow {
            warn!("hardware gesture fifo overflowed; oldest samples lost");
        }

        if !status.data_valid {
            if elapsed < self.min_gesture_ms {
                debug!("gesture too short ({elapsed} ms), dropped as noise");
            } else if let Some(gesture) = self.finish() {
                debug!("gesture classified: {gesture}");
                on_gesture(gesture);
            }
            self.phase = Phase::Idle;

            // a gesture interrupt asserted with no backing data outlived its
            // episode; latch it so it cannot re-fire
            if let Ok(dev) = src.device_status() {
                if dev.gesture_int_asserted {
                    debug!("stale gesture interrupt asserted, clearing");
                    if let Err(e) = src.clear_gesture_interrupt() {
                        debug!("interrupt clear failed: {e}");
                    }
                }
            }
        }
    }

    /// Buffer one sample pulled from the FIFO. No-op once the episode is
    /// already exiting.
    fn buffer_sample(&mut self, tick_ms: u64, sample: Sample) {
        if self.phase == Phase::Exiting {
            return;
        }
        if self.phase == Phase::Idle {
            debug!("gesture episode begins");
            self.entry_ms = tick_ms;
            self.entry_ring.clear();
            self.exit_ring.clear();
            self.phase = Phase::Collecting {
                stage: Stage::Entry,
                filled: 0,
            };
        }
        let Phase::Collecting { stage, filled } = self.phase else {
            return;
        };
        match stage {
            Stage::Entry => {
                self.entry_ring.push(sample);
                let filled = filled + 1;
                if filled == self.entry_ring.capacity() {
                    self.score_x = 0;
                    self.score_y = 0;
                    self.run_entry_pass();
                    self.phase = Phase::Collecting {
                        stage: Stage::Exit,
                        filled: 0,
                    };
                } else {
                    self.phase = Phase::Collecting {
                        stage: Stage::Entry,
                        filled,
                    };
                }
            }
            Stage::Exit => {
                self.exit_ring.push(sample);
                self.phase = Phase::Collecting {
                    stage: Stage::Exit,
                    filled: (filled + 1).min(self.exit_ring.capacity()),
                };
            }
        }
    }

    /// Weighted entry votes; the earliest sample carries the most weight.
    /// Up/Down/Left/Right map to +y/−y/−x/+x while the hand approaches.
    fn run_entry_pass(&mut self) {
        let count = self.entry_ring.len() as i32;
        for (idx, sample) in self.entry_ring.iter().enumerate() {
            let weight = count - idx as i32;
            match sample.dominant_channel() {
                Channel::Up => self.score_y += weight,
                Channel::Down => self.score_y -= weight,
                Channel::Left => self.score_x -= weight,
                Channel::Right => self.score_x += weight,
            }
        }
    }

    /// Weighted exit votes; the latest sample carries the most weight.
    /// The axis mapping is inverted relative to the entry pass: the hand is
    /// receding now, so the same channel vote means the opposite motion.
    fn run_exit_pass(&mut self) {
        for (idx, sample) in self.exit_ring.iter().enumerate() {
            let weight = idx as i32 + 2;
            match sample.dominant_channel() {
                Channel::Up => self.score_y -= weight,
                Channel::Down => self.score_y += weight,
                Channel::Left => self.score_x += weight,
                Channel::Right => self.score_x -= weight,
            }
        }
    }

    /// Terminate the episode. Classification only happens when the exit ring
    /// filled every slot; an episode cut off earlier has too little data and
    /// reports nothing.
    fn finish(&mut self) -> Option<Gesture> {
        match self.phase {
            Phase::Collecting {
                stage: Stage::Exit,
                filled,
            } if filled == self.exit_ring.capacity() => {
                self.run_exit_pass();
                Some(self.classify())
            }
            _ => None,
        }
    }

    fn classify(&self) -> Gesture {
        let abs_x = self.score_x.abs();
        let abs_y = self.score_y.abs();
        if abs_y > abs_x + CLASSIFY_MARGIN {
            if self.score_y < 0 {
                Gesture::Down
            } else {
                Gesture::Up
            }
        } else if abs_x > abs_y + CLASSIFY_MARGIN {
            if self.score_x < 0 {
                Gesture::Left
            } else {
                Gesture::Right
            }
        } else {
            Gesture::Unknown
        }
    }
}
