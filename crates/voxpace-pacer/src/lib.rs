pub mod clock;
pub mod pacer;
pub mod schedule;

pub use clock::{compute_wait, Clock, ManualClock, TokioClock, Wait};
pub use pacer::{ChunkTiming, Pacer, PacingClock, PacingMode, PacingReport};
pub use schedule::DelaySchedule;
