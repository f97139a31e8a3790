use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use launchgate_core::errors::GateError;
use launchgate_core::invocation::Invocation;
use launchgate_core::state::{GateState, TransitionRecord, Trigger};
use launchgate_core::traits::{Authenticator, GateHost, Navigator, Scheduler};
use launchgate_core::types::{AuthOutcome, Destination};
use tracing::{debug, error, info, warn};

use super::decision::GateReport;
use super::dispatch::{resolve_destination, GateConfig};
use super::policy::AuthPolicy;

/// Collaborators a gate is wired to.
pub struct GateDeps {
    pub policy: AuthPolicy,
    pub authenticator: Rc<dyn Authenticator>,
    pub navigator: Rc<dyn Navigator>,
    pub scheduler: Rc<dyn Scheduler>,
    pub host: Rc<dyn GateHost>,
}

#[derive(Default)]
struct GateRun {
    invocation: Invocation,
    state: GateState,
    destination: Option<Destination>,
    termination_delay: Option<Duration>,
    policy_cleared: bool,
    host_finished: bool,
    transitions: Vec<TransitionRecord>,
    entered_at: Option<DateTime<Utc>>,
}

struct GateCore {
    deps: GateDeps,
    config: GateConfig,
    run: RefCell<GateRun>,
}

/// Launch-time authentication gate.
///
/// `enter` reads the auth policy once. With gating off it dispatches right
/// away and closes on the next loop turn. With gating on it starts the
/// authenticator and returns; the outcome callback then either dispatches
/// (closing after the configured delay) or closes the gate with no
/// destination.
///
/// Callbacks hold only a weak handle: once the gate is dropped, or its
/// host reports destroyed, late callbacks do nothing. No `RefCell` borrow
/// is held across a collaborator call.
pub struct LaunchGate {
    core: Rc<GateCore>,
}

impl LaunchGate {
    pub fn new(deps: GateDeps, config: GateConfig) -> Self {
        Self {
            core: Rc::new(GateCore {
                deps,
                config,
                run: RefCell::new(GateRun::default()),
            }),
        }
    }

    /// Start the gate for `invocation`. Only valid once, from `Idle`.
    pub fn enter(&self, invocation: Invocation) -> Result<(), GateError> {
        let state = self.state();
        if state != GateState::Idle {
            return Err(GateError::AlreadyEntered(state));
        }
        if self.core.deps.host.is_destroyed() {
            return Err(GateError::HostDestroyed);
        }
        {
            let mut run = self.core.run.borrow_mut();
            debug!(action = ?invocation.action, "entering launch gate");
            run.invocation = invocation;
            run.entered_at = Some(Utc::now());
        }

        if !self.core.deps.policy.is_enabled() {
            self.core.advance(GateState::Dispatching, Trigger::PolicyDisabled);
            GateCore::dispatch(&self.core, true);
            return Ok(());
        }

        self.core.advance(GateState::AwaitingAuth, Trigger::PolicyEnabled);
        let weak: Weak<GateCore> = Rc::downgrade(&self.core);
        self.core
            .deps
            .authenticator
            .authenticate(Box::new(move |outcome: AuthOutcome| match weak.upgrade() {
                Some(core) => GateCore::on_outcome(&core, outcome),
                None => debug!(%outcome, "gate dropped, ignoring auth outcome"),
            }));
        Ok(())
    }

    pub fn state(&self) -> GateState {
        self.core.run.borrow().state
    }

    pub fn destination(&self) -> Option<Destination> {
        self.core.run.borrow().destination.clone()
    }

    pub fn transitions(&self) -> Vec<TransitionRecord> {
        self.core.run.borrow().transitions.clone()
    }

    pub fn report(&self) -> GateReport {
        let run = self.core.run.borrow();
        GateReport {
            invocation: run.invocation.clone(),
            state: run.state,
            destination: run.destination.clone(),
            termination_delay_ms: run.termination_delay.map(|d| d.as_millis() as u64),
            policy_cleared: run.policy_cleared,
            host_finished: run.host_finished,
            transitions: run.transitions.clone(),
            entered_at: run.entered_at,
        }
    }
}

impl GateCore {
    /// Apply one state-machine edge. Refuses edges the table doesn't allow.
    fn advance(&self, to: GateState, trigger: Trigger) -> bool {
        let mut run = self.run.borrow_mut();
        let from = run.state;
        if !from.permits(to) {
            error!(%from, %to, ?trigger, "refusing illegal gate transition");
            return false;
        }
        run.state = to;
        run.transitions.push(TransitionRecord {
            from,
            to,
            trigger,
            at: Utc::now(),
        });
        debug!(%from, %to, ?trigger, "gate transition");
        true
    }

    fn on_outcome(core: &Rc<GateCore>, outcome: AuthOutcome) {
        if core.deps.host.is_destroyed() {
            debug!(%outcome, "host destroyed, ignoring auth outcome");
            return;
        }
        let state = core.run.borrow().state;
        if state != GateState::AwaitingAuth {
            debug!(%state, %outcome, "ignoring auth outcome outside awaiting_auth");
            return;
        }

        match outcome {
            AuthOutcome::Success => {
                core.advance(GateState::Dispatching, Trigger::Outcome(outcome));
                GateCore::dispatch(core, false);
            }
            AuthOutcome::HardwareUnavailable => {
                match core.deps.policy.clear() {
                    Ok(()) => {
                        core.run.borrow_mut().policy_cleared = true;
                        info!("biometric hardware unavailable, auth policy cleared");
                    }
                    Err(e) => warn!(error = %e, "cannot clear auth policy"),
                }
                core.advance(GateState::Dispatching, Trigger::Outcome(outcome));
                GateCore::dispatch(core, false);
            }
            AuthOutcome::Failure | AuthOutcome::Cancelled => {
                info!(%outcome, "authentication not granted, closing gate");
                core.terminate(Trigger::Outcome(outcome));
            }
            AuthOutcome::Retry => {
                core.advance(GateState::AwaitingAuth, Trigger::Outcome(outcome));
            }
        }
    }

    fn dispatch(core: &Rc<GateCore>, skip_delay: bool) {
        let destination = resolve_destination(&core.run.borrow().invocation);
        core.deps.navigator.launch(&destination);

        let delay = core.config.termination_delay(skip_delay);
        info!(%destination, delay_ms = delay.as_millis() as u64, "destination launched");
        {
            let mut run = core.run.borrow_mut();
            run.destination = Some(destination);
            run.termination_delay = Some(delay);
        }

        let weak = Rc::downgrade(core);
        core.deps.scheduler.schedule_after(
            delay,
            Box::new(move || match weak.upgrade() {
                Some(core) => core.terminate(Trigger::TerminationTimer),
                None => debug!("gate dropped before termination timer"),
            }),
        );
    }

    fn terminate(&self, trigger: Trigger) {
        if self.deps.host.is_destroyed() {
            debug!(?trigger, "host destroyed, skipping termination");
            return;
        }
        if !self.advance(GateState::Terminated, trigger) {
            return;
        }
        self.deps.host.finish();
        self.run.borrow_mut().host_finished = true;
    }
}
