//! Quiet-period gate for `Changed` events.
//!
//! Editors often write a file several times per save. Each write pushes the
//! path's deadline back; the path is released once its deadline passes.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Debouncer {
    /// relative path -> instant after which it may be released
    deadlines: BTreeMap<String, Instant>,
    quiet: Duration,
}

impl Debouncer {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            deadlines: BTreeMap::new(),
            quiet: Duration::from_millis(debounce_ms),
        }
    }

    /// A zero quiet period means changes bypass the debouncer entirely.
    pub fn is_immediate(&self) -> bool {
        self.quiet.is_zero()
    }

    /// Note a change to `path`, pushing its deadline back.
    pub fn record(&mut self, path: String) {
        self.record_at(path, Instant::now());
    }

    fn record_at(&mut self, path: String, at: Instant) {
        self.deadlines.insert(path, at + self.quiet);
    }

    /// Drop a pending change. Returns false if nothing was pending.
    pub fn remove(&mut self, path: &str) -> bool {
        self.deadlines.remove(path).is_some()
    }

    /// Release every path whose deadline has passed, in path order.
    pub fn take_ready(&mut self) -> Vec<String> {
        self.take_ready_at(Instant::now())
    }

    fn take_ready_at(&mut self, now: Instant) -> Vec<String> {
        let ready: Vec<String> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(path, _)| path.clone())
            .collect();
        for path in &ready {
            self.deadlines.remove(path);
        }
        ready
    }

    /// Earliest pending deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    pub fn has_pending(&self) -> bool {
        !self.deadlines.is_empty()
    }
}
