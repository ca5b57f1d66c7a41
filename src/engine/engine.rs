use std::fmt::Display;

use tracing::{debug, info, warn};

use crate::device::driver::DeviceDriver;
use crate::executor::executor::{ActionExecutor, parse_direction, parse_key};
use crate::hierarchy::snapshot::hierarchy_fingerprint;
use crate::resolver::resolver::ElementResolver;
use crate::scenario::scenario_model::{
    ActionKind, ErrorInfo, ErrorKind, ExecutionState, Frame, Scenario, ScreenInfo, Trace,
};
use crate::trace::logger::RunJournal;
use crate::trace::trace::RunEvent;

/// Runs scenarios step by step against one device session.
///
/// Steps run strictly in order. The first failure marks its frame `broken`,
/// attaches the error and stops the run; later frames stay `pending`. The
/// device session is stopped whenever a run ends.
pub struct ScenarioEngine<'o> {
    resolver: ElementResolver<'o>,
    executor: ActionExecutor,
    journal: RunJournal,
}

impl<'o> ScenarioEngine<'o> {
    pub fn new(resolver: ElementResolver<'o>, executor: ActionExecutor) -> Self {
        Self {
            resolver,
            executor,
            journal: RunJournal::disabled(),
        }
    }

    pub fn with_journal(mut self, journal: RunJournal) -> Self {
        self.journal = journal;
        self
    }

    pub fn resolver(&self) -> &ElementResolver<'o> {
        &self.resolver
    }

    /// Execute a fresh scenario and return its trace.
    pub fn explore(&mut self, device: &mut dyn DeviceDriver, scenario: Scenario) -> Trace {
        info!(steps = scenario.actions.len(), "exploring scenario");
        self.run(device, Trace::from(scenario))
    }

    /// Run a previously recorded trace again.
    ///
    /// `executed` frames only repeat their device side effect with the stored
    /// locator. A `broken` frame is reset and resolved again, so replaying a
    /// halted trace resumes at the step that failed. `pending` frames run as
    /// in [`explore`](Self::explore).
    pub fn replay(&mut self, device: &mut dyn DeviceDriver, trace: Trace) -> Trace {
        info!(
            frames = trace.len(),
            executed = trace.count(ExecutionState::Executed),
            "replaying trace"
        );
        self.run(device, trace)
    }

    fn run(&mut self, device: &mut dyn DeviceDriver, mut trace: Trace) -> Trace {
        for (step, frame) in trace.frames.iter_mut().enumerate() {
            self.journal
                .log(&RunEvent::now(step, "start").with_action(frame.action.kind));

            match self.run_frame(device, step, frame) {
                Ok(()) => {
                    let mut event = RunEvent::now(step, "done")
                        .with_action(frame.action.kind)
                        .with_status(frame.action.status);
                    if let Some(locator) = frame.action.locator() {
                        event = event.with_locator(locator);
                    }
                    self.journal.log(&event);
                }
                Err(error) => {
                    warn!(
                        step,
                        action = %frame.action.label(),
                        "halting: {} {}",
                        error.kind,
                        error.message.as_deref().unwrap_or_default()
                    );
                    frame.action.status = ExecutionState::Broken;
                    let mut event = RunEvent::now(step, "halted")
                        .with_action(frame.action.kind)
                        .with_status(ExecutionState::Broken)
                        .with_error(error.kind);
                    if let Some(screen) = &frame.screen {
                        event = event.with_screen(hierarchy_fingerprint(&screen.hierarchy));
                    }
                    self.journal.log(&event);
                    frame.error = Some(error);
                    break;
                }
            }
        }

        if let Err(e) = device.stop() {
            warn!("failed to stop device session: {}", e);
        }

        info!(
            executed = trace.count(ExecutionState::Executed),
            broken = trace.count(ExecutionState::Broken),
            pending = trace.count(ExecutionState::Pending),
            "run finished"
        );
        trace
    }

    fn run_frame(
        &mut self,
        device: &mut dyn DeviceDriver,
        step: usize,
        frame: &mut Frame,
    ) -> Result<(), ErrorInfo> {
        match frame.action.status {
            ExecutionState::Executed => {
                debug!(step, "re-running executed step without resolution");
                return self
                    .executor
                    .perform(device, &mut frame.action)
                    .map_err(|e| failure(e.kind(), e));
            }
            ExecutionState::Broken => {
                info!(step, "retrying broken step from scratch");
                frame.action.status = ExecutionState::Pending;
                frame.error = None;
                frame.screen = None;
                if let Some(element) = frame.action.element.as_mut() {
                    element.locator = None;
                }
            }
            ExecutionState::Pending => {}
        }

        if frame.action.kind.targets_element() {
            self.run_element_action(device, step, frame)
        } else {
            self.run_device_action(device, frame)
        }
    }

    /// `press_key` / `swipe_screen`: validate, snapshot, execute.
    fn run_device_action(
        &mut self,
        device: &mut dyn DeviceDriver,
        frame: &mut Frame,
    ) -> Result<(), ErrorInfo> {
        let data = frame.action.data.as_deref();
        let validation = match frame.action.kind {
            ActionKind::PressKey => parse_key(data).map(|_| ()),
            _ => parse_direction(data).map(|_| ()),
        };

        frame.screen = snapshot_screen(device);
        validation.map_err(|e| failure(e.kind(), e))?;

        self.executor
            .perform(device, &mut frame.action)
            .map_err(|e| failure(e.kind(), e))
    }

    /// `click` / `text_input` / `swipe_element`: resolve, then execute.
    fn run_element_action(
        &mut self,
        device: &mut dyn DeviceDriver,
        step: usize,
        frame: &mut Frame,
    ) -> Result<(), ErrorInfo> {
        if frame.action.kind == ActionKind::SwipeElement {
            if let Err(e) = parse_direction(frame.action.data.as_deref()) {
                frame.screen = snapshot_screen(device);
                return Err(failure(e.kind(), e));
            }
        }

        let Some(description) = frame.action.element.as_ref().map(|e| e.description.clone())
        else {
            frame.screen = snapshot_screen(device);
            return Err(failure(
                ErrorKind::InvalidActionError,
                format!("{} action has no element", frame.action.kind),
            ));
        };

        let resolved = match self.resolver.resolve(device, &description) {
            Ok(resolved) => resolved,
            Err(e) => {
                frame.screen = self
                    .resolver
                    .last_hierarchy()
                    .map(|raw| ScreenInfo::unnamed(raw.to_string()));
                return Err(failure(e.kind(), e));
            }
        };

        self.journal.log(
            &RunEvent::now(step, "resolved")
                .with_action(frame.action.kind)
                .with_screen(hierarchy_fingerprint(&resolved.hierarchy))
                .with_locator(&resolved.locator),
        );

        if let Some(element) = frame.action.element.as_mut() {
            element.locator = Some(resolved.locator);
            element.name = Some(resolved.name);
        }
        frame.screen = Some(ScreenInfo {
            name: resolved.screen_name,
            description: resolved.screen_description,
            hierarchy: resolved.hierarchy,
        });

        self.executor
            .perform(device, &mut frame.action)
            .map_err(|e| failure(e.kind(), e))
    }
}

fn failure(kind: ErrorKind, message: impl Display) -> ErrorInfo {
    ErrorInfo::new(kind, message.to_string())
}

/// Unnamed screen snapshot for frames that never reach the resolver.
fn snapshot_screen(device: &mut dyn DeviceDriver) -> Option<ScreenInfo> {
    match device.dump_hierarchy() {
        Ok(raw) => Some(ScreenInfo::unnamed(raw)),
        Err(e) => {
            warn!("could not capture screen: {}", e);
            None
        }
    }
}
