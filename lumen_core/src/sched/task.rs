//! Resumable automation tasks.

use std::time::Duration;

use crate::error::LumenResult;

/// What a resumed task reports back to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Suspend again and resume after at least this long.
    Yield(Duration),
    /// The task is finished and can be discarded.
    Complete,
}

/// A suspendable unit of automation logic.
///
/// The scheduler calls [`resume`](Task::resume) each time the task's
/// deadline elapses; the task runs to its next suspend point and returns.
/// Returning `Err` marks the task as faulted: the error is logged and the
/// task is discarded, without affecting any other task.
pub trait Task: Send {
    fn resume(&mut self) -> LumenResult<Step>;
}

impl<F> Task for F
where
    F: FnMut() -> LumenResult<Step> + Send,
{
    fn resume(&mut self) -> LumenResult<Step> {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_tasks() {
        let mut calls = 0;
        let mut task = move || {
            calls += 1;
            if calls < 3 {
                Ok(Step::Yield(Duration::from_millis(1)))
            } else {
                Ok(Step::Complete)
            }
        };

        assert_eq!(task.resume().unwrap(), Step::Yield(Duration::from_millis(1)));
        assert_eq!(task.resume().unwrap(), Step::Yield(Duration::from_millis(1)));
        assert_eq!(task.resume().unwrap(), Step::Complete);
    }
}
