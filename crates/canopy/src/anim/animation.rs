use std::time::Duration;

use super::trans::Transition;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationOptions {
    pub duration: Duration,
    pub fps: u32,
    pub transition: Transition,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(2500),
            fps: 40,
            transition: Transition::default(),
        }
    }
}

impl AnimationOptions {
    /// Time between two frames, `round(1000 / fps)` milliseconds.
    pub fn interval(&self) -> Duration {
        let fps = f64::from(self.fps.max(1));
        Duration::from_millis((1000.0 / fps).round() as u64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Running,
    Complete,
}

/// Outcome of a due frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Frame {
    /// Interpolate with this delta.
    Running(f64),
    /// The duration has elapsed: interpolate with delta `1` and complete.
    Finished,
}

/// A single timed transition: `idle -> running -> complete`.
///
/// The animation does not own any callbacks; whoever polls it applies the frames.
#[derive(Debug, Clone)]
pub struct Animation {
    options: AnimationOptions,
    state: State,
    started: Duration,
    next_frame: Duration,
}

impl Animation {
    pub fn new(options: AnimationOptions) -> Self {
        Self {
            options,
            state: State::Idle,
            started: Duration::ZERO,
            next_frame: Duration::ZERO,
        }
    }

    pub fn options(&self) -> &AnimationOptions {
        &self.options
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Starts the animation at `now`; restarting a running animation is a no-op.
    pub fn start(&mut self, now: Duration) {
        if self.state == State::Running {
            return;
        }
        self.state = State::Running;
        self.started = now;
        self.next_frame = now + self.options.interval();
    }

    /// When the next frame is due, while running.
    pub fn next_frame(&self) -> Option<Duration> {
        (self.state == State::Running).then_some(self.next_frame)
    }

    /// Produces the frame due at `now`, if any. `Finished` is returned exactly once.
    pub fn poll(&mut self, now: Duration) -> Option<Frame> {
        if self.state != State::Running || now < self.next_frame {
            return None;
        }
        self.next_frame = now + self.options.interval();

        let elapsed = now.saturating_sub(self.started);
        if elapsed < self.options.duration {
            let p = elapsed.as_secs_f64() / self.options.duration.as_secs_f64();
            Some(Frame::Running(self.options.transition.apply(p)))
        } else {
            self.state = State::Complete;
            Some(Frame::Finished)
        }
    }
}
