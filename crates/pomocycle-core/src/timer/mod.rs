mod clock;
mod display;
mod engine;
mod mode;

pub use clock::{Clock, ManualClock, SystemClock};
pub use display::{format_clock, greeting_for_hour, state_label, CYCLE_COMPLETE_LABEL};
pub use engine::{CycleEngine, CycleState, Snapshot};
pub use mode::{parse_positive, Mode, Settings};
