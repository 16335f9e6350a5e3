// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Background loop feeding a sample source into a shared estimator.
//!
//! The loop runs on its own thread and can be paused, resumed and cancelled from the
//! [`RunnerHandle`]. Pausing suspends the loop between two samples; resuming continues
//! with the next unread sample; cancelling stops the loop and keeps every update that
//! already completed.

use std::panic;
use std::sync::Arc;
use std::sync::Condvar;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use tracing::info;
use tracing::warn;

use crate::error::Error;
use crate::error::ErrorKind;
use crate::estimator::DensityCurve;
use crate::estimator::SharedEstimator;
use crate::sample::SampleSource;
use crate::wavelet::BasisLoader;

/// Number of samples between two published snapshots, by default.
pub const DEFAULT_UPDATE_FREQUENCY: u64 = 100;

/// Pacing and error policy of a [`DensityRunner`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerSettings {
    /// Samples consumed between two snapshots.
    #[serde(default = "default_update_frequency")]
    pub update_frequency: u64,
    /// Simulated delay after each sample, in milliseconds.
    #[serde(default)]
    pub sample_delay_ms: u64,
    /// Skip malformed samples instead of stopping the loop.
    #[serde(default)]
    pub skip_malformed: bool,
}

fn default_update_frequency() -> u64 {
    DEFAULT_UPDATE_FREQUENCY
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            update_frequency: DEFAULT_UPDATE_FREQUENCY,
            sample_delay_ms: 0,
            skip_malformed: false,
        }
    }
}

impl RunnerSettings {
    /// Returns the delay applied after each sample.
    pub fn sample_delay(&self) -> Duration {
        Duration::from_millis(self.sample_delay_ms)
    }

    /// Checks that the settings can drive a loop.
    pub fn validate(&self) -> Result<(), Error> {
        if self.update_frequency == 0 {
            return Err(Error::config_invalid("update frequency must be positive"));
        }
        Ok(())
    }
}

/// What a finished loop did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Samples folded into the estimator.
    pub samples: u64,
    /// Malformed samples that were skipped.
    pub skipped: u64,
    /// Snapshots handed to the callback.
    pub snapshots: u64,
    /// True if the loop stopped because of [`RunnerHandle::cancel`].
    pub cancelled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Running,
    Paused,
    Cancelled,
}

#[derive(Debug)]
struct Control {
    state: Mutex<RunState>,
    changed: Condvar,
}

impl Control {
    fn new() -> Self {
        Self {
            state: Mutex::new(RunState::Running),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Moves `from` to `to`; returns false if the loop was in another state.
    fn transition(&self, from: RunState, to: RunState) -> bool {
        let mut state = self.lock();
        if *state != from {
            return false;
        }
        *state = to;
        self.changed.notify_all();
        true
    }

    fn cancel(&self) -> bool {
        let mut state = self.lock();
        if *state == RunState::Cancelled {
            return false;
        }
        *state = RunState::Cancelled;
        self.changed.notify_all();
        true
    }

    fn state(&self) -> RunState {
        *self.lock()
    }

    /// Blocks while paused and returns the state that ended the wait.
    fn wait_while_paused(&self) -> RunState {
        let guard = self.lock();
        let guard = self
            .changed
            .wait_while(guard, |state| *state == RunState::Paused)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }

    /// Sleeps for `delay` unless cancelled first.
    fn pace(&self, delay: Duration) {
        let guard = self.lock();
        let _ = self
            .changed
            .wait_timeout_while(guard, delay, |state| *state != RunState::Cancelled)
            .unwrap_or_else(PoisonError::into_inner);
    }
}

/// Spawns update loops.
#[derive(Debug)]
pub struct DensityRunner;

impl DensityRunner {
    /// Starts feeding `source` into `shared` on a background thread.
    ///
    /// Every `update_frequency` samples, and once more when the source runs dry, the
    /// loop takes a snapshot and passes it to `on_snapshot` together with the number of
    /// samples consumed so far. The lock on the estimator is not held while the callback
    /// runs.
    ///
    /// Fails with `ConfigInvalid` if the settings are invalid or the estimator has not
    /// been reset.
    pub fn spawn<L, S, F>(
        shared: SharedEstimator<L>,
        source: S,
        settings: RunnerSettings,
        on_snapshot: F,
    ) -> Result<RunnerHandle, Error>
    where
        L: BasisLoader + Send + 'static,
        S: SampleSource + Send + 'static,
        F: FnMut(u64, DensityCurve) + Send + 'static,
    {
        settings.validate()?;
        if !shared.is_initialized() {
            return Err(Error::config_invalid(
                "estimator must be reset before it can be driven",
            ));
        }

        let control = Arc::new(Control::new());
        let thread = {
            let control = Arc::clone(&control);
            thread::spawn(move || run(&control, &shared, source, &settings, on_snapshot))
        };
        Ok(RunnerHandle { control, thread })
    }
}

fn run<L, S, F>(
    control: &Control,
    shared: &SharedEstimator<L>,
    mut source: S,
    settings: &RunnerSettings,
    mut on_snapshot: F,
) -> Result<RunSummary, Error>
where
    L: BasisLoader,
    S: SampleSource,
    F: FnMut(u64, DensityCurve),
{
    let delay = settings.sample_delay();
    let mut summary = RunSummary {
        samples: 0,
        skipped: 0,
        snapshots: 0,
        cancelled: false,
    };
    let mut published = true;

    loop {
        if control.wait_while_paused() == RunState::Cancelled {
            summary.cancelled = true;
            break;
        }
        if !source.has_next() {
            break;
        }
        match source.next_sample() {
            Ok(x) => {
                shared.update(x);
                summary.samples += 1;
                published = false;
            }
            Err(err) if settings.skip_malformed && err.kind() == ErrorKind::MalformedSample => {
                warn!(error = %err, "skipping malformed sample");
                summary.skipped += 1;
                continue;
            }
            Err(err) => return Err(err),
        }

        if summary.samples % settings.update_frequency == 0 {
            on_snapshot(summary.samples, shared.snapshot());
            summary.snapshots += 1;
            published = true;
        }
        if !delay.is_zero() {
            control.pace(delay);
        }
    }

    if !summary.cancelled && !published {
        on_snapshot(summary.samples, shared.snapshot());
        summary.snapshots += 1;
    }
    info!(
        samples = summary.samples,
        skipped = summary.skipped,
        snapshots = summary.snapshots,
        cancelled = summary.cancelled,
        "density runner stopped"
    );
    Ok(summary)
}

/// Controls a loop started by [`DensityRunner::spawn`].
#[derive(Debug)]
pub struct RunnerHandle {
    control: Arc<Control>,
    thread: JoinHandle<Result<RunSummary, Error>>,
}

impl RunnerHandle {
    /// Suspends the loop before its next sample. Has no effect unless running.
    pub fn pause(&self) {
        if self.control.transition(RunState::Running, RunState::Paused) {
            info!("density runner paused");
        }
    }

    /// Continues a paused loop with the next unread sample.
    pub fn resume(&self) {
        if self.control.transition(RunState::Paused, RunState::Running) {
            info!("density runner resumed");
        }
    }

    /// Stops the loop before its next sample. Completed updates are kept.
    pub fn cancel(&self) {
        if self.control.cancel() {
            info!("density runner cancelled");
        }
    }

    /// Returns true if the loop is paused.
    pub fn is_paused(&self) -> bool {
        self.control.state() == RunState::Paused
    }

    /// Returns true once the loop thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Waits for the loop to exit.
    ///
    /// Returns the error that stopped the loop, if any. A panic on the loop thread is
    /// propagated to the caller.
    pub fn join(self) -> Result<RunSummary, Error> {
        match self.thread.join() {
            Ok(result) => result,
            Err(payload) => panic::resume_unwind(payload),
        }
    }
}
