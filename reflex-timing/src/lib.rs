pub mod priority;
pub mod timer;
pub mod wait;

pub use priority::PriorityGuard;
pub use timer::{FrameStats, HighPrecisionTimer, Timer};
pub use wait::sleep_until_precise;
