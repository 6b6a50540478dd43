/// Progress events emitted by long-running engine tasks.
#[derive(Debug, Clone)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total: u64 },
    TaskIncrement { amount: u64 },
    TaskFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards progress events to an optional callback; a reporter without a
/// callback is free to construct and free to report to.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn events_reach_the_callback() {
        let count = AtomicU64::new(0);
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::TaskIncrement { amount } = event {
                count.fetch_add(amount, Ordering::Relaxed);
            }
        }));
        reporter.report(Progress::TaskStart { total: 2 });
        reporter.report(Progress::TaskIncrement { amount: 1 });
        reporter.report(Progress::TaskIncrement { amount: 1 });
        reporter.report(Progress::TaskFinish);
        assert_eq!(count.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn a_silent_reporter_ignores_events() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::PhaseStart { name: "noop" });
        reporter.report(Progress::PhaseFinish);
    }
}
