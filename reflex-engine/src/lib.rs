pub mod aggregate;
pub mod config;
pub mod controller;
pub mod delay;
pub mod device;
pub mod error;
pub mod monitor;
pub mod output;
pub mod sequencer;
pub mod simulate;

pub use aggregate::ResultAggregator;
pub use config::{FalseStartPolicy, RunConfig, ValidatedConfig};
pub use controller::RunController;
pub use delay::DelayGenerator;
pub use device::{InputSignal, InputSource, Presenter};
pub use error::{AbortReason, ConfigError, DeviceError, EngineError};
pub use monitor::{MonitorOutcome, StimulusMonitor};
pub use output::{OutputTargets, read_run_result};
pub use sequencer::TrialSequencer;
pub use simulate::{RecordingPresenter, ScriptError, ScriptedInput, TrialScript};
