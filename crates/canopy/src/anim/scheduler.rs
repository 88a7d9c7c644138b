//! Cooperative job queue driving animations.
//!
//! The scheduler lives inside the context it drives (a visualization), so `tick` is an associated
//! function that takes the context plus a projection back to the scheduler. Jobs are moved out of
//! the queue while they run; anything they schedule is appended behind the surviving jobs.

use rustc_hash::FxHashSet;
use std::time::Duration;

use super::animation::{Animation, AnimationOptions, Frame};
use super::clock::Clock;

/// Per-frame callback receiving the interpolation delta.
pub type Compute<C> = Box<dyn FnMut(&mut C, f64)>;
/// One-shot continuation.
pub type Then<C> = Box<dyn FnOnce(&mut C)>;

pub const DEFAULT_SEQUENCE_INTERVAL: Duration = Duration::from_millis(200);

/// Handle returned by every `schedule` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CancelToken(u64);

enum Job<C> {
    Animate {
        animation: Animation,
        compute: Compute<C>,
        complete: Option<Then<C>>,
    },
    Sequence {
        interval: Duration,
        next: Duration,
        condition: Box<dyn FnMut(&mut C) -> bool>,
        step: Box<dyn FnMut(&mut C)>,
        complete: Option<Then<C>>,
    },
    /// Waits on an external condition, e.g. subtrees being delivered by a loader.
    When {
        ready: Box<dyn FnMut(&mut C) -> bool>,
        then: Option<Then<C>>,
    },
}

enum Progress {
    Idle,
    Advanced,
    Done,
}

impl<C> Job<C> {
    fn advance(&mut self, ctx: &mut C, now: Duration) -> Progress {
        match self {
            Job::Animate {
                animation,
                compute,
                complete,
            } => match animation.poll(now) {
                None => Progress::Idle,
                Some(Frame::Running(delta)) => {
                    compute(ctx, delta);
                    Progress::Advanced
                }
                Some(Frame::Finished) => {
                    compute(ctx, 1.0);
                    if let Some(complete) = complete.take() {
                        complete(ctx);
                    }
                    Progress::Done
                }
            },
            Job::Sequence {
                interval,
                next,
                condition,
                step,
                complete,
            } => {
                if now < *next {
                    return Progress::Idle;
                }
                *next = now + *interval;
                if condition(ctx) {
                    step(ctx);
                    Progress::Advanced
                } else {
                    if let Some(complete) = complete.take() {
                        complete(ctx);
                    }
                    Progress::Done
                }
            }
            Job::When { ready, then } => {
                if !ready(ctx) {
                    return Progress::Idle;
                }
                if let Some(then) = then.take() {
                    then(ctx);
                }
                Progress::Done
            }
        }
    }

    fn deadline(&self, now: Duration) -> Duration {
        match self {
            Job::Animate { animation, .. } => animation.next_frame().unwrap_or(now),
            Job::Sequence { next, .. } => *next,
            Job::When { .. } => now,
        }
    }
}

struct Entry<C> {
    token: CancelToken,
    job: Job<C>,
}

pub struct Scheduler<C> {
    clock: Box<dyn Clock>,
    jobs: Vec<Entry<C>>,
    /// Tokens of the jobs taken out of the queue by the current `tick`.
    in_flight: FxHashSet<CancelToken>,
    cancelled: FxHashSet<CancelToken>,
    next_token: u64,
}

impl<C> std::fmt::Debug for Scheduler<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("now", &self.now())
            .field("jobs", &self.jobs.len())
            .finish()
    }
}

impl<C> Scheduler<C> {
    pub fn new(clock: Box<dyn Clock>) -> Self {
        Self {
            clock,
            jobs: Vec::new(),
            in_flight: FxHashSet::default(),
            cancelled: FxHashSet::default(),
            next_token: 0,
        }
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.jobs.len()
    }

    /// Only externally-driven waits remain; ticking cannot make progress on its own.
    pub fn is_stalled(&self) -> bool {
        !self.jobs.is_empty() && self.jobs.iter().all(|e| matches!(e.job, Job::When { .. }))
    }

    /// Earliest time at which some job has work to do.
    pub fn next_deadline(&self) -> Option<Duration> {
        let now = self.now();
        self.jobs.iter().map(|e| e.job.deadline(now)).min()
    }

    fn push(&mut self, job: Job<C>) -> CancelToken {
        let token = CancelToken(self.next_token);
        self.next_token += 1;
        self.jobs.push(Entry { token, job });
        token
    }

    /// Starts an animation now. `compute` sees every frame, including the final `1.0`, then
    /// `complete` runs once.
    pub fn animate(
        &mut self,
        options: AnimationOptions,
        compute: Compute<C>,
        complete: Then<C>,
    ) -> CancelToken {
        let mut animation = Animation::new(options);
        animation.start(self.now());
        self.push(Job::Animate {
            animation,
            compute,
            complete: Some(complete),
        })
    }

    /// Runs `step` every `interval` while `condition` holds, then `complete`.
    pub fn sequence(
        &mut self,
        interval: Duration,
        condition: Box<dyn FnMut(&mut C) -> bool>,
        step: Box<dyn FnMut(&mut C)>,
        complete: Then<C>,
    ) -> CancelToken {
        let next = self.now() + interval;
        self.push(Job::Sequence {
            interval,
            next,
            condition,
            step,
            complete: Some(complete),
        })
    }

    /// Runs `then` on the first tick where `ready` returns true.
    pub fn when(&mut self, ready: Box<dyn FnMut(&mut C) -> bool>, then: Then<C>) -> CancelToken {
        self.push(Job::When {
            ready,
            then: Some(then),
        })
    }

    /// Drops a job without running its completion. Returns false when the job already finished,
    /// was already cancelled or never existed.
    pub fn cancel(&mut self, token: CancelToken) -> bool {
        if let Some(i) = self.jobs.iter().position(|e| e.token == token) {
            self.jobs.remove(i);
            return true;
        }
        // Taken out by the running tick; dropped when it comes back.
        self.in_flight.contains(&token) && self.cancelled.insert(token)
    }

    /// Drops every pending job.
    pub fn clear(&mut self) {
        self.jobs.clear();
        self.in_flight.clear();
        self.cancelled.clear();
    }

    /// Advances every due job once, in scheduling order. Returns how many jobs did work.
    pub fn tick(ctx: &mut C, access: fn(&mut C) -> &mut Scheduler<C>) -> usize {
        let scheduler = access(ctx);
        let now = scheduler.now();
        let jobs = std::mem::take(&mut scheduler.jobs);
        scheduler.in_flight.extend(jobs.iter().map(|e| e.token));
        let mut kept = Vec::with_capacity(jobs.len());
        let mut advanced = 0;

        for mut entry in jobs {
            if access(ctx).cancelled.remove(&entry.token) {
                access(ctx).in_flight.remove(&entry.token);
                continue;
            }
            match entry.job.advance(ctx, now) {
                Progress::Idle => kept.push(entry),
                Progress::Advanced => {
                    advanced += 1;
                    kept.push(entry);
                }
                Progress::Done => {
                    advanced += 1;
                    access(ctx).in_flight.remove(&entry.token);
                }
            }
        }

        let scheduler = access(ctx);
        kept.retain(|e| !scheduler.cancelled.contains(&e.token));
        kept.append(&mut scheduler.jobs);
        scheduler.jobs = kept;
        scheduler.in_flight.clear();
        scheduler.cancelled.clear();
        advanced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::{ManualClock, Transition};
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Ctx {
        scheduler: Scheduler<Ctx>,
        log: Vec<String>,
    }

    fn access(ctx: &mut Ctx) -> &mut Scheduler<Ctx> {
        &mut ctx.scheduler
    }

    fn ctx(clock: &ManualClock) -> Ctx {
        Ctx {
            scheduler: Scheduler::new(Box::new(clock.clone())),
            log: Vec::new(),
        }
    }

    #[test]
    fn continuations_can_schedule_follow_up_jobs() {
        let clock = ManualClock::new();
        let mut c = ctx(&clock);
        let opts = AnimationOptions {
            duration: Duration::from_millis(100),
            fps: 10,
            transition: Transition::Linear,
        };
        c.scheduler.animate(
            opts,
            Box::new(|c: &mut Ctx, d: f64| c.log.push(format!("a{d}"))),
            Box::new(move |c: &mut Ctx| {
                c.log.push("a done".into());
                c.scheduler.animate(
                    opts,
                    Box::new(|c: &mut Ctx, d: f64| c.log.push(format!("b{d}"))),
                    Box::new(|c: &mut Ctx| c.log.push("b done".into())),
                );
            }),
        );

        clock.advance(Duration::from_millis(100));
        Scheduler::tick(&mut c, access);
        assert_eq!(c.log, ["a1", "a done"]);
        assert_eq!(c.scheduler.pending(), 1);

        clock.advance(Duration::from_millis(100));
        Scheduler::tick(&mut c, access);
        assert_eq!(c.log, ["a1", "a done", "b1", "b done"]);
        assert!(c.scheduler.is_idle());
    }

    #[test]
    fn an_animation_finishes_once_with_non_decreasing_deltas() {
        for transition in [Transition::Linear, Transition::default()] {
            let clock = ManualClock::new();
            let mut c = ctx(&clock);
            let opts = AnimationOptions {
                duration: Duration::from_millis(1000),
                fps: 40,
                transition,
            };
            let deltas = Rc::new(RefCell::new(Vec::new()));
            let finished_at = Rc::new(RefCell::new(Vec::new()));
            let seen = Rc::clone(&deltas);
            let done = Rc::clone(&finished_at);
            let done_clock = clock.clone();
            c.scheduler.animate(
                opts,
                Box::new(move |_: &mut Ctx, d: f64| seen.borrow_mut().push(d)),
                Box::new(move |_: &mut Ctx| done.borrow_mut().push(done_clock.now())),
            );

            for _ in 0..150 {
                clock.advance(Duration::from_millis(7));
                Scheduler::tick(&mut c, access);
            }

            let deltas = deltas.borrow();
            assert_eq!(deltas.iter().filter(|d| **d == 1.0).count(), 1, "{transition:?}");
            assert_eq!(deltas.last(), Some(&1.0));
            assert!(deltas.windows(2).all(|w| w[0] <= w[1]), "{deltas:?}");

            let finished_at = finished_at.borrow();
            assert_eq!(finished_at.len(), 1);
            let at = finished_at[0];
            assert!(at >= opts.duration);
            assert!(at < opts.duration + opts.interval() + Duration::from_millis(7));
            assert!(c.scheduler.is_idle());
        }
    }

    #[test]
    fn sequence_steps_until_the_condition_fails() {
        let clock = ManualClock::new();
        let mut c = ctx(&clock);
        c.scheduler.sequence(
            DEFAULT_SEQUENCE_INTERVAL,
            Box::new(|c: &mut Ctx| c.log.len() < 3),
            Box::new(|c: &mut Ctx| c.log.push("step".into())),
            Box::new(|c: &mut Ctx| c.log.push("done".into())),
        );

        Scheduler::tick(&mut c, access);
        assert!(c.log.is_empty());
        for _ in 0..4 {
            clock.advance(DEFAULT_SEQUENCE_INTERVAL);
            Scheduler::tick(&mut c, access);
        }
        assert_eq!(c.log, ["step", "step", "step", "done"]);
        assert!(c.scheduler.is_idle());
    }

    #[test]
    fn cancelled_jobs_never_complete() {
        let clock = ManualClock::new();
        let mut c = ctx(&clock);
        let token = c.scheduler.when(
            Box::new(|_: &mut Ctx| true),
            Box::new(|c: &mut Ctx| c.log.push("ran".into())),
        );
        assert!(c.scheduler.cancel(token));
        assert!(!c.scheduler.cancel(CancelToken(99)));
        Scheduler::tick(&mut c, access);
        assert!(c.log.is_empty());
    }

    #[test]
    fn finished_jobs_cannot_be_cancelled() {
        let clock = ManualClock::new();
        let mut c = ctx(&clock);
        let token = c.scheduler.when(
            Box::new(|_: &mut Ctx| true),
            Box::new(|c: &mut Ctx| c.log.push("ran".into())),
        );
        Scheduler::tick(&mut c, access);
        assert_eq!(c.log, ["ran"]);
        assert!(!c.scheduler.cancel(token));
        assert!(c.scheduler.cancelled.is_empty());
    }

    #[test]
    fn a_job_cannot_cancel_a_sibling_that_already_finished_in_the_same_tick() {
        let clock = ManualClock::new();
        let mut c = ctx(&clock);
        let first = c.scheduler.when(
            Box::new(|_: &mut Ctx| true),
            Box::new(|c: &mut Ctx| c.log.push("first".into())),
        );
        c.scheduler.when(
            Box::new(|_: &mut Ctx| true),
            Box::new(move |c: &mut Ctx| {
                let cancelled = c.scheduler.cancel(first);
                c.log.push(format!("cancelled {cancelled}"));
            }),
        );
        Scheduler::tick(&mut c, access);
        assert_eq!(c.log, ["first", "cancelled false"]);
        assert!(c.scheduler.is_idle());
    }

    #[test]
    fn a_job_can_cancel_a_sibling_during_the_same_tick() {
        let clock = ManualClock::new();
        let mut c = ctx(&clock);
        let victim = CancelToken(1);
        c.scheduler.when(
            Box::new(|_: &mut Ctx| true),
            Box::new(move |c: &mut Ctx| {
                c.scheduler.cancel(victim);
            }),
        );
        let token = c.scheduler.when(
            Box::new(|_: &mut Ctx| true),
            Box::new(|c: &mut Ctx| c.log.push("victim ran".into())),
        );
        assert_eq!(token, victim);
        Scheduler::tick(&mut c, access);
        assert!(c.log.is_empty());
        assert!(c.scheduler.is_idle());
    }

    #[test]
    fn waits_report_a_stall() {
        let clock = ManualClock::new();
        let mut c = ctx(&clock);
        c.scheduler
            .when(Box::new(|_: &mut Ctx| false), Box::new(|_: &mut Ctx| {}));
        assert_eq!(Scheduler::tick(&mut c, access), 0);
        assert!(c.scheduler.is_stalled());
        assert_eq!(c.scheduler.next_deadline(), Some(clock.now()));
    }
}
