use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use launchgate_core::traits::{Scheduler, Task};

struct Entry {
    due: Duration,
    seq: u64,
    task: Task,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Reversed so the max-heap pops the earliest (due, seq) first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct LooperInner {
    now: Cell<Duration>,
    seq: Cell<u64>,
    queue: RefCell<BinaryHeap<Entry>>,
    /// Wall-clock origin when running in realtime mode.
    origin: Option<Instant>,
}

/// Single-threaded cooperative event loop.
///
/// Tasks run in `(due, posting order)` order. A task may post further
/// tasks; no internal borrow is held while it runs. Cloning yields another
/// handle to the same queue.
#[derive(Clone)]
pub struct Looper {
    inner: Rc<LooperInner>,
}

impl Looper {
    /// A loop on a virtual clock. Time only moves through
    /// [`advance_by`](Self::advance_by) or [`run_until_idle`](Self::run_until_idle).
    pub fn virtual_time() -> Self {
        Self::build(None)
    }

    /// A loop that sleeps until each task's deadline.
    pub fn realtime() -> Self {
        Self::build(Some(Instant::now()))
    }

    fn build(origin: Option<Instant>) -> Self {
        Self {
            inner: Rc::new(LooperInner {
                now: Cell::new(Duration::ZERO),
                seq: Cell::new(0),
                queue: RefCell::new(BinaryHeap::new()),
                origin,
            }),
        }
    }

    /// Current loop time, measured from loop creation.
    pub fn now(&self) -> Duration {
        match self.inner.origin {
            Some(origin) => origin.elapsed(),
            None => self.inner.now.get(),
        }
    }

    pub fn pending(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    /// Deadline of the next queued task, relative to loop creation.
    pub fn next_due(&self) -> Option<Duration> {
        self.inner.queue.borrow().peek().map(|e| e.due)
    }

    /// Run every task due within `delta` of the current time, then move
    /// the clock to `now + delta`. Returns the number of tasks run.
    pub fn advance_by(&self, delta: Duration) -> usize {
        let target = self.now() + delta;
        let mut ran = 0;
        while let Some(entry) = self.pop_due(target) {
            self.run_entry(entry);
            ran += 1;
        }
        self.inner.now.set(target);
        ran
    }

    /// Drain the queue, jumping (or sleeping, in realtime mode) to each
    /// deadline in turn. Returns the number of tasks run.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = self.inner.queue.borrow_mut().pop();
            let Some(entry) = next else {
                return ran;
            };
            if let Some(origin) = self.inner.origin {
                let elapsed = origin.elapsed();
                if entry.due > elapsed {
                    std::thread::sleep(entry.due - elapsed);
                }
            }
            self.run_entry(entry);
            ran += 1;
        }
    }

    fn pop_due(&self, limit: Duration) -> Option<Entry> {
        let mut queue = self.inner.queue.borrow_mut();
        if queue.peek().is_some_and(|e| e.due <= limit) {
            queue.pop()
        } else {
            None
        }
    }

    fn run_entry(&self, entry: Entry) {
        if entry.due > self.now() {
            self.inner.now.set(entry.due);
        }
        (entry.task)();
    }
}

impl Scheduler for Looper {
    fn schedule_after(&self, delay: Duration, task: Task) {
        let seq = self.inner.seq.get();
        self.inner.seq.set(seq + 1);
        let due = self.now() + delay;
        self.inner.queue.borrow_mut().push(Entry { due, seq, task });
    }
}
