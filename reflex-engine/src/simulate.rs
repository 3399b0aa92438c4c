//! Scripted devices for headless runs and tests.
//!
//! A script is a comma-separated list with one entry per trial. Each entry is
//! one or more `+`-joined steps:
//!
//! - `250` presses 250 ms after the go-cue,
//! - `fs` / `false-start` presses as soon as the trial is armed, `fs@120`
//!   presses 120 ms after arming,
//! - `abort` / `abort@120` asks to stop the run, timed from arming.
//!
//! `fs@5+180` presses 5 ms into the wait and again 180 ms after the go-cue.

use std::collections::VecDeque;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reflex_core::{Cue, TrialPhase};
use thiserror::Error;
use tokio::time::Instant;

use crate::device::{InputSignal, InputSource, Presenter};
use crate::error::DeviceError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("empty step in script entry {0}")]
    EmptyStep(usize),
    #[error("bad step '{step}' in script entry {entry}")]
    BadStep { entry: usize, step: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Armed,
    Stimulus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScriptStep {
    anchor: Anchor,
    offset: Duration,
    signal: InputSignal,
}

/// Scripted behavior for one trial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialScript {
    steps: Vec<ScriptStep>,
}

impl TrialScript {
    fn parse_entry(entry: usize, text: &str) -> Result<Self, ScriptError> {
        let mut steps = Vec::new();
        for raw in text.split('+') {
            let step = raw.trim();
            if step.is_empty() {
                return Err(ScriptError::EmptyStep(entry));
            }
            let bad = || ScriptError::BadStep {
                entry,
                step: step.to_string(),
            };
            let (head, at) = match step.split_once('@') {
                Some((head, at)) => (head, Some(parse_millis(at).ok_or_else(bad)?)),
                None => (step, None),
            };
            let parsed = match head {
                "fs" | "false-start" => ScriptStep {
                    anchor: Anchor::Armed,
                    offset: at.unwrap_or(Duration::ZERO),
                    signal: InputSignal::Press,
                },
                "abort" => ScriptStep {
                    anchor: Anchor::Armed,
                    offset: at.unwrap_or(Duration::ZERO),
                    signal: InputSignal::Abort,
                },
                _ if at.is_none() => ScriptStep {
                    anchor: Anchor::Stimulus,
                    offset: parse_millis(head).ok_or_else(bad)?,
                    signal: InputSignal::Press,
                },
                _ => return Err(bad()),
            };
            steps.push(parsed);
        }
        Ok(Self { steps })
    }
}

impl FromStr for TrialScript {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_entry(1, s)
    }
}

fn parse_millis(text: &str) -> Option<Duration> {
    let ms: f64 = text.trim().parse().ok()?;
    if ms.is_finite() && ms >= 0.0 {
        Some(Duration::from_secs_f64(ms / 1000.0))
    } else {
        None
    }
}

/// Input source that replays a script against the runtime clock.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    trials: VecDeque<TrialScript>,
    current: VecDeque<ScriptStep>,
    armed_at: Option<Instant>,
    stimulus_at: Option<Instant>,
    exhausted: bool,
}

impl ScriptedInput {
    pub fn new(trials: impl IntoIterator<Item = TrialScript>) -> Self {
        Self {
            trials: trials.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn parse(script: &str) -> Result<Self, ScriptError> {
        let trials = script
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .enumerate()
            .map(|(i, entry)| TrialScript::parse_entry(i + 1, entry))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(trials))
    }

    /// Trials not yet started.
    pub fn remaining(&self) -> usize {
        self.trials.len()
    }
}

#[async_trait]
impl InputSource for ScriptedInput {
    async fn next_signal(&mut self) -> Result<InputSignal, DeviceError> {
        if self.exhausted {
            return Ok(InputSignal::Closed);
        }
        let Some(step) = self.current.front().copied() else {
            return Ok(InputSignal::Closed);
        };
        let anchor = match step.anchor {
            Anchor::Armed => self.armed_at,
            Anchor::Stimulus => self.stimulus_at,
        };
        let Some(anchor) = anchor else {
            // Waits for a phase that has not started; the monitor drops this
            // future when the phase changes.
            return std::future::pending().await;
        };
        tokio::time::sleep_until(anchor + step.offset).await;
        self.current.pop_front();
        Ok(step.signal)
    }

    fn on_phase(&mut self, phase: TrialPhase) {
        match phase {
            TrialPhase::ArmedWait => match self.trials.pop_front() {
                Some(trial) => {
                    self.current = trial.steps.into();
                    self.armed_at = Some(Instant::now());
                    self.stimulus_at = None;
                }
                None => {
                    self.current.clear();
                    self.exhausted = true;
                }
            },
            TrialPhase::StimulusPresented => self.stimulus_at = Some(Instant::now()),
            _ => {}
        }
    }
}

/// Presenter that remembers every cue it was asked to show.
#[derive(Debug, Clone, Default)]
pub struct RecordingPresenter {
    cues: Vec<Cue>,
    /// Simulated time for a cue to become visible.
    pub latency: Duration,
}

impl RecordingPresenter {
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }
}

#[async_trait]
impl Presenter for RecordingPresenter {
    async fn present(&mut self, cue: Cue) -> Result<(), DeviceError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        log::debug!("present {:?}", cue);
        self.cues.push(cue);
        Ok(())
    }
}
