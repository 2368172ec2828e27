pub mod config;
pub mod goal;
pub mod settings;
pub mod timer;

use pomocycle_core::{Database, Silent, SystemClock, TimerHost};

/// Host with no sound or live display, for one-shot commands.
pub fn quiet_host(db: &Database) -> TimerHost<SystemClock, &Database> {
    TimerHost::open(db, SystemClock, Box::new(Silent), Box::new(Silent))
}
