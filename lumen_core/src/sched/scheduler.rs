//! Deadline-ordered cooperative scheduler.
//!
//! Suspended tasks live in a min-heap keyed by `(resume_at, seq)`; the
//! monotonic `seq` preserves FIFO order among tasks sharing a deadline.
//! Between resumptions the scheduler drains the event queue and invokes the
//! registered handlers, so event delivery never races task execution.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, warn};

use super::handlers::HandlerRegistry;
use super::task::{Step, Task};
use crate::event::EventQueue;

/// Longest idle sleep between wake-signal checks while no deadline is near.
const MAX_IDLE_WAIT: Duration = Duration::from_millis(200);

/// Sleep granularity for the blocking pump path.
const PUMP_WAIT: Duration = Duration::from_millis(5);

struct Entry {
    resume_at: Instant,
    seq: u64,
    task: Box<dyn Task>,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.resume_at == other.resume_at && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Reversed so BinaryHeap pops the earliest deadline; equal deadlines
    // pop in insertion order.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .resume_at
            .cmp(&self.resume_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Central orchestrator: holds suspended tasks, drives resumptions and
/// event dispatch.
pub struct Scheduler {
    queue: BinaryHeap<Entry>,
    seq: u64,
    events: Arc<EventQueue>,
    handlers: Arc<HandlerRegistry>,
}

impl Scheduler {
    /// Create a scheduler consuming from `events` and dispatching through
    /// `handlers`.
    pub fn new(events: Arc<EventQueue>, handlers: Arc<HandlerRegistry>) -> Self {
        Self {
            queue: BinaryHeap::new(),
            seq: 0,
            events,
            handlers,
        }
    }

    /// Suspend `task` and resume it after at least `delay`.
    pub fn schedule(&mut self, task: impl Task + 'static, delay: Duration) {
        self.schedule_boxed(Box::new(task), delay);
    }

    fn schedule_boxed(&mut self, task: Box<dyn Task>, delay: Duration) {
        self.seq += 1;
        self.queue.push(Entry {
            resume_at: Instant::now() + delay,
            seq: self.seq,
            task,
        });
    }

    /// Number of suspended tasks.
    pub fn pending_tasks(&self) -> usize {
        self.queue.len()
    }

    /// Drain the event queue, invoking registered handlers.
    fn pump_events(&mut self) {
        while let Some(event) = self.events.pop() {
            self.handlers.dispatch(event);
        }
    }

    /// Resume every task whose deadline has elapsed. Returns how many tasks
    /// were resumed.
    fn resume_due(&mut self) -> usize {
        let mut resumed = 0;
        loop {
            let due = match self.queue.peek() {
                Some(head) => head.resume_at <= Instant::now(),
                None => false,
            };
            if !due {
                break;
            }
            let Some(mut entry) = self.queue.pop() else { break };
            resumed += 1;
            match entry.task.resume() {
                Ok(Step::Complete) => debug!("task completed"),
                Ok(Step::Yield(delay)) => self.schedule_boxed(entry.task, delay),
                Err(e) => warn!("task faulted, discarding: {e}"),
            }
            // Deliver anything the task produced before the next resume.
            self.pump_events();
        }
        resumed
    }

    /// Run until no suspended tasks remain.
    ///
    /// While waiting on the next deadline the scheduler sleeps on the event
    /// queue's wake signal, so events are dispatched promptly even when all
    /// tasks are far from due.
    pub fn run(&mut self) {
        while !self.queue.is_empty() {
            self.pump_events();
            if self.resume_due() > 0 {
                continue;
            }
            let Some(head) = self.queue.peek() else { break };
            let now = Instant::now();
            let until_due = head.resume_at.saturating_duration_since(now);
            self.events.wait(until_due.min(MAX_IDLE_WAIT));
            self.pump_events();
        }
        // Final drain for producers that raced the last resume.
        self.pump_events();
    }

    /// One non-blocking pump: dispatch pending events and resume any due
    /// tasks. Returns `true` while suspended tasks remain. For callers that
    /// must not block.
    pub fn run_once(&mut self) -> bool {
        self.pump_events();
        self.resume_due();
        self.pump_events();
        !self.queue.is_empty()
    }

    /// Block the calling context for `duration` while keeping the runtime
    /// alive: due tasks are resumed and events dispatched throughout the
    /// wait.
    ///
    /// This is the degrade path for contexts that cannot yield back to the
    /// scheduler; the caller loses `duration` of wall-clock time, but every
    /// other task keeps making forward progress.
    pub fn wait_with_pump(&mut self, duration: Duration) {
        let deadline = Instant::now() + duration;
        loop {
            let _ = self.run_once();
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let remaining = deadline - now;
            self.events.wait(remaining.min(PUMP_WAIT));
        }
    }
}
