use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use launchgate_core::traits::{AuthCallback, Authenticator, Scheduler};
use launchgate_core::types::AuthOutcome;
use tracing::debug;

use super::looper::Looper;

/// Replays a fixed sequence of outcomes through the event loop.
///
/// Each outcome is posted as its own task, `step` apart, so the callback
/// never runs inside `authenticate`. Outcomes after the first terminal one
/// are dropped, matching the one-terminal-callback contract.
pub struct ScriptedAuthenticator {
    looper: Looper,
    script: Vec<AuthOutcome>,
    step: Duration,
    calls: Cell<u32>,
}

impl ScriptedAuthenticator {
    pub fn new(looper: Looper, script: Vec<AuthOutcome>) -> Self {
        Self {
            looper,
            script: truncate_at_terminal(script),
            step: Duration::ZERO,
            calls: Cell::new(0),
        }
    }

    /// Space successive outcomes `step` apart on the loop clock.
    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    /// Number of times `authenticate` has been called.
    pub fn calls(&self) -> u32 {
        self.calls.get()
    }

    pub fn script(&self) -> &[AuthOutcome] {
        &self.script
    }
}

fn truncate_at_terminal(mut script: Vec<AuthOutcome>) -> Vec<AuthOutcome> {
    if let Some(pos) = script.iter().position(|o| o.is_terminal()) {
        script.truncate(pos + 1);
    }
    script
}

impl Authenticator for ScriptedAuthenticator {
    fn authenticate(&self, callback: AuthCallback) {
        self.calls.set(self.calls.get() + 1);
        let callback = Rc::new(RefCell::new(callback));
        for (i, outcome) in self.script.iter().copied().enumerate() {
            let callback = Rc::clone(&callback);
            let delay = self.step * i as u32;
            self.looper.schedule_after(
                delay,
                Box::new(move || {
                    debug!(%outcome, "delivering scripted auth outcome");
                    let mut callback = callback.borrow_mut();
                    (*callback)(outcome);
                }),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(auth: &ScriptedAuthenticator, looper: &Looper) -> Vec<AuthOutcome> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        auth.authenticate(Box::new(move |o: AuthOutcome| sink.borrow_mut().push(o)));
        looper.run_until_idle();
        let out = seen.borrow().clone();
        out
    }

    #[test]
    fn delivers_nothing_until_loop_runs() {
        let looper = Looper::virtual_time();
        let auth = ScriptedAuthenticator::new(looper.clone(), vec![AuthOutcome::Success]);
        let seen = Rc::new(Cell::new(false));
        let flag = Rc::clone(&seen);
        auth.authenticate(Box::new(move |_: AuthOutcome| flag.set(true)));
        assert!(!seen.get());
        looper.run_until_idle();
        assert!(seen.get());
        assert_eq!(auth.calls(), 1);
    }

    #[test]
    fn retries_precede_terminal_outcome() {
        let looper = Looper::virtual_time();
        let auth = ScriptedAuthenticator::new(
            looper.clone(),
            vec![AuthOutcome::Retry, AuthOutcome::Retry, AuthOutcome::Success],
        );
        assert_eq!(
            collect(&auth, &looper),
            vec![AuthOutcome::Retry, AuthOutcome::Retry, AuthOutcome::Success]
        );
    }

    #[test]
    fn outcomes_after_terminal_are_dropped() {
        let looper = Looper::virtual_time();
        let auth = ScriptedAuthenticator::new(
            looper.clone(),
            vec![AuthOutcome::Cancelled, AuthOutcome::Success],
        );
        assert_eq!(auth.script(), &[AuthOutcome::Cancelled]);
        assert_eq!(collect(&auth, &looper), vec![AuthOutcome::Cancelled]);
    }

    #[test]
    fn step_spaces_outcomes_on_loop_clock() {
        let looper = Looper::virtual_time();
        let auth = ScriptedAuthenticator::new(
            looper.clone(),
            vec![AuthOutcome::Retry, AuthOutcome::Success],
        )
        .with_step(Duration::from_millis(200));
        collect(&auth, &looper);
        assert_eq!(looper.now(), Duration::from_millis(200));
    }
}
