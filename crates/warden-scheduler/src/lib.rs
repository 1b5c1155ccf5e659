//! Two cooperating schedulers (spec §4.5): a single-threaded foreground
//! scheduler for job ordering, and a background heartbeat, both wired to a
//! shared cooperative shutdown token.

pub mod background;
pub mod foreground;
pub mod shutdown;

pub use background::BackgroundScheduler;
pub use foreground::{run_periodic_job, ForegroundScheduler};
pub use shutdown::{Shutdown, ShutdownHandle};
