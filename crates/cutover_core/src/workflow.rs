//! The cutover state machine: current step, every selection pool, step gates
//! and the load requests issued on step entry.

use std::fmt;

use shared::{
    domain::{
        ControllerRef, CutoverType, ModuleCandidate, PointCandidate, PointType, ReferenceRecord,
        ReportRow,
    },
    protocol::Dataset,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    pagination::Paginator,
    resolver,
    selection::SelectionSet,
    source::DatasetPayload,
    steps::{Step, StepProgress},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkflowOptions {
    /// Return selected points to the available pool when the active
    /// controller changes on the TPS step. Off by default: selections made
    /// for the previous controller are kept.
    pub clear_points_on_controller_change: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    Controllers,
    Points,
    Modules,
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Controllers => "controller list",
            Self::Points => "TPS point list",
            Self::Modules => "cutover list",
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("{pool} has no item named '{key}'")]
    UnknownItem { pool: Pool, key: String },
    #[error("controller '{0}' is not among the selected controllers")]
    ControllerNotSelected(String),
}

/// Which results a fetch may still apply to. Session fetches always apply;
/// step fetches only while the step generation they captured is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchScope {
    Session,
    Step(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRequest {
    pub dataset: Dataset,
    pub scope: FetchScope,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub step: Step,
    pub message: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Moved {
        from: Step,
        to: Step,
        load: Option<LoadRequest>,
    },
    Blocked(ValidationFailure),
    /// Boundary move: `back()` on the first step or `next()` on the last.
    Unchanged,
}

#[derive(Debug, Clone, Default)]
pub struct WorkflowState {
    step: Step,
    cutover_type: CutoverType,
    controllers: SelectionSet<ControllerRef>,
    active_controller: Option<ControllerRef>,
    point_type: Option<PointType>,
    points: SelectionSet<PointCandidate>,
    paginator: Paginator,
    modules: SelectionSet<ModuleCandidate>,
    references: Vec<ReferenceRecord>,
    validation_message: Option<String>,
}

impl WorkflowState {
    pub fn step(&self) -> Step {
        self.step
    }

    pub fn cutover_type(&self) -> CutoverType {
        self.cutover_type
    }

    pub fn controllers(&self) -> &SelectionSet<ControllerRef> {
        &self.controllers
    }

    pub fn active_controller(&self) -> Option<&ControllerRef> {
        self.active_controller.as_ref()
    }

    pub fn point_type(&self) -> Option<PointType> {
        self.point_type
    }

    pub fn points(&self) -> &SelectionSet<PointCandidate> {
        &self.points
    }

    pub fn modules(&self) -> &SelectionSet<ModuleCandidate> {
        &self.modules
    }

    pub fn references(&self) -> &[ReferenceRecord] {
        &self.references
    }

    pub fn validation_message(&self) -> Option<&str> {
        self.validation_message.as_deref()
    }

    pub fn current_page(&self) -> usize {
        self.paginator.current(self.points.available().len())
    }

    pub fn total_pages(&self) -> usize {
        self.paginator.total_pages(self.points.available().len())
    }

    /// Slice of available TPS points on the current page.
    pub fn point_page(&self) -> &[PointCandidate] {
        self.paginator.page(self.points.available())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Workflow {
    state: WorkflowState,
    options: WorkflowOptions,
    generation: u64,
}

impl Workflow {
    pub fn new(options: WorkflowOptions) -> Self {
        Self {
            state: WorkflowState::default(),
            options,
            generation: 0,
        }
    }

    /// The controller list is fetched once per session, independent of
    /// step entry.
    pub fn start(&self) -> LoadRequest {
        LoadRequest {
            dataset: Dataset::ControllerTypes,
            scope: FetchScope::Session,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn options(&self) -> WorkflowOptions {
        self.options
    }

    pub fn step(&self) -> Step {
        self.state.step
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn progress(&self) -> StepProgress {
        StepProgress::at(self.state.step)
    }

    pub fn can_go_back(&self) -> bool {
        self.state.step.previous().is_some()
    }

    pub fn can_go_next(&self) -> bool {
        !self.state.step.is_terminal()
    }

    pub fn validate(&self) -> Result<(), ValidationFailure> {
        match self.state.step.first_unmet(&self.state) {
            Some(message) => Err(ValidationFailure {
                step: self.state.step,
                message,
            }),
            None => Ok(()),
        }
    }

    pub(crate) fn next(&mut self) -> Transition {
        let from = self.state.step;
        let Some(to) = from.next() else {
            return Transition::Unchanged;
        };

        if let Err(failure) = self.validate() {
            debug!(step = %from, message = failure.message, "transition refused");
            self.state.validation_message = Some(failure.message.to_owned());
            return Transition::Blocked(failure);
        }

        self.enter(from, to)
    }

    pub(crate) fn back(&mut self) -> Transition {
        let from = self.state.step;
        match from.previous() {
            Some(to) => self.enter(from, to),
            None => Transition::Unchanged,
        }
    }

    fn enter(&mut self, from: Step, to: Step) -> Transition {
        self.generation += 1;
        self.state.step = to;
        self.state.validation_message = None;
        let load = self.on_step_enter(to);
        info!(%from, %to, generation = self.generation, "workflow step changed");
        Transition::Moved { from, to, load }
    }

    /// Synchronous entry effects of `step`, plus the dataset to (re)load.
    pub(crate) fn on_step_enter(&mut self, step: Step) -> Option<LoadRequest> {
        match step {
            Step::Select | Step::Cutover => {}
            Step::Configure => {
                self.state.paginator.reset();
                if self.state.active_controller.is_none() {
                    self.state.active_controller =
                        self.state.controllers.selected().first().cloned();
                }
            }
            Step::Report => self.state.references.clear(),
        }

        step.dataset().map(|dataset| LoadRequest {
            dataset,
            scope: FetchScope::Step(self.generation),
        })
    }

    pub fn is_current(&self, scope: FetchScope) -> bool {
        match scope {
            FetchScope::Session => true,
            FetchScope::Step(generation) => generation == self.generation,
        }
    }

    /// Applies a fetched dataset. Returns `false` when the result is stale or
    /// does not match the request.
    pub fn apply(&mut self, request: LoadRequest, payload: DatasetPayload) -> bool {
        if payload.dataset() != request.dataset {
            warn!(
                requested = %request.dataset,
                received = %payload.dataset(),
                "dataset payload does not match its request"
            );
            return false;
        }
        if !self.is_current(request.scope) {
            debug!(
                dataset = %request.dataset,
                scope = ?request.scope,
                generation = self.generation,
                "dropping stale dataset"
            );
            return false;
        }

        debug!(dataset = %request.dataset, items = payload.len(), "applying dataset");
        match payload {
            DatasetPayload::Controllers(items) => self.state.controllers.seed(items),
            DatasetPayload::Points(items) => self.state.points.seed(items),
            DatasetPayload::Modules(items) => self.state.modules.seed(items),
            DatasetPayload::References(items) => self.state.references = items,
        }
        true
    }

    pub fn set_cutover_type(&mut self, cutover_type: CutoverType) {
        self.state.cutover_type = cutover_type;
        self.state.validation_message = None;
    }

    pub fn add_controller(&mut self, name: &str) -> Result<bool, WorkflowError> {
        if self.state.controllers.is_selected(name) {
            return Ok(false);
        }
        let controller = self
            .state
            .controllers
            .find_available(name)
            .cloned()
            .ok_or_else(|| WorkflowError::UnknownItem {
                pool: Pool::Controllers,
                key: name.to_owned(),
            })?;
        Ok(self.changed(|state| state.controllers.add(controller)))
    }

    pub fn remove_controller(&mut self, name: &str) -> bool {
        let removed = self.changed(|state| state.controllers.remove(name));
        let was_active = self
            .state
            .active_controller
            .as_ref()
            .is_some_and(|active| active.name == name);
        if removed && was_active {
            self.state.active_controller = None;
            self.state.point_type = None;
        }
        removed
    }

    /// Picks the controller whose TPS points are configured. On the TPS step
    /// this always forces the point type to be chosen again.
    pub fn select_active_controller(&mut self, name: &str) -> Result<(), WorkflowError> {
        let controller = self
            .state
            .controllers
            .find_selected(name)
            .cloned()
            .ok_or_else(|| WorkflowError::ControllerNotSelected(name.to_owned()))?;

        let changed = self
            .state
            .active_controller
            .as_ref()
            .map_or(true, |active| active.name != controller.name);
        self.state.active_controller = Some(controller);
        self.state.validation_message = None;

        if self.state.step == Step::Configure {
            self.state.point_type = None;
            if changed && !self.state.points.selected().is_empty() {
                if self.options.clear_points_on_controller_change {
                    let cleared = self.state.points.clear_selected();
                    debug!(cleared, "cleared TPS selections after controller change");
                } else {
                    warn!(
                        controller = name,
                        retained = self.state.points.selected().len(),
                        "TPS selections from the previous controller are kept"
                    );
                }
            }
        }
        Ok(())
    }

    pub fn set_point_type(&mut self, point_type: PointType) {
        self.state.point_type = Some(point_type);
        self.state.validation_message = None;
    }

    pub fn add_point(&mut self, name: &str) -> Result<bool, WorkflowError> {
        if self.state.points.is_selected(name) {
            return Ok(false);
        }
        let point = self
            .state
            .points
            .find_available(name)
            .cloned()
            .ok_or_else(|| WorkflowError::UnknownItem {
                pool: Pool::Points,
                key: name.to_owned(),
            })?;
        Ok(self.changed(|state| state.points.add(point)))
    }

    pub fn remove_point(&mut self, name: &str) -> bool {
        self.changed(|state| state.points.remove(name))
    }

    pub fn add_module(&mut self, name: &str) -> Result<bool, WorkflowError> {
        if self.state.modules.is_selected(name) {
            return Ok(false);
        }
        let module = self
            .state
            .modules
            .find_available(name)
            .cloned()
            .ok_or_else(|| WorkflowError::UnknownItem {
                pool: Pool::Modules,
                key: name.to_owned(),
            })?;
        Ok(self.changed(|state| state.modules.add(module)))
    }

    pub fn remove_module(&mut self, name: &str) -> bool {
        self.changed(|state| state.modules.remove(name))
    }

    pub fn next_page(&mut self) -> usize {
        let len = self.state.points.available().len();
        self.state.paginator.next(len)
    }

    pub fn previous_page(&mut self) -> usize {
        let len = self.state.points.available().len();
        self.state.paginator.previous(len)
    }

    pub fn go_to_page(&mut self, page: usize) -> usize {
        let len = self.state.points.available().len();
        self.state.paginator.go_to(page, len)
    }

    /// Report rows, available once the terminal step is reached.
    pub fn report(&self) -> Option<Vec<ReportRow>> {
        if self.state.step != Step::Report {
            return None;
        }
        Some(resolver::resolve(
            self.state.modules.selected_keys(),
            &self.state.references,
        ))
    }

    fn changed(&mut self, mutate: impl FnOnce(&mut WorkflowState) -> bool) -> bool {
        let changed = mutate(&mut self.state);
        if changed {
            self.state.validation_message = None;
        }
        changed
    }
}

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod tests;
