//! Client-side session flow.
//!
//! [`SessionFlow`] walks a learner from the preset list through a run to
//! the result screen. [`SessionClock`] drives countdowns and race
//! opponents. [`CachedProgressApi`] keeps a short-lived progress hint in
//! front of the real [`ProgressApi`](crate::recording::ProgressApi).

pub mod cache;
pub mod clock;
pub mod machine;

pub use cache::{CachedProgressApi, ProgressCache};
pub use clock::{ClockTick, SessionClock};
pub use machine::{Celebration, LoadRequest, ResultView, SessionFlow, Stage};
