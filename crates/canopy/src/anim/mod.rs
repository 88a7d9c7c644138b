//! Headless animation engine.
//!
//! - [`trans`]: easing transitions
//! - [`animation`]: the per-animation state machine
//! - [`scheduler`]: the cooperative job queue, driven by a [`Clock`]
//! - [`interp`]: node interpolators

pub mod animation;
pub mod clock;
pub mod interp;
pub mod scheduler;
pub mod trans;

pub use animation::{Animation, AnimationOptions, Frame, State};
pub use clock::{Clock, ManualClock, SystemClock};
pub use interp::Mode;
pub use scheduler::{CancelToken, DEFAULT_SEQUENCE_INTERVAL, Scheduler};
pub use trans::{Curve, Ease, Transition};
