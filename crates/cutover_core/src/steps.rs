//! Static description of the ordered workflow steps.

use std::fmt;

use serde::Serialize;
use shared::protocol::Dataset;

use crate::workflow::WorkflowState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    Select,
    Configure,
    Cutover,
    Report,
}

/// A single gate checked before leaving a step.
pub struct Requirement {
    pub message: &'static str,
    pub holds: fn(&WorkflowState) -> bool,
}

const SELECT_REQUIREMENTS: &[Requirement] = &[Requirement {
    message: "Please select at least one controller.",
    holds: |state: &WorkflowState| !state.controllers().selected().is_empty(),
}];

const CONFIGURE_REQUIREMENTS: &[Requirement] = &[
    Requirement {
        message: "Please select a controller.",
        holds: |state: &WorkflowState| state.active_controller().is_some(),
    },
    Requirement {
        message: "Please select a point type.",
        holds: |state: &WorkflowState| state.point_type().is_some(),
    },
    Requirement {
        message: "Please select at least one TPS point.",
        holds: |state: &WorkflowState| !state.points().selected().is_empty(),
    },
];

const CUTOVER_REQUIREMENTS: &[Requirement] = &[Requirement {
    message: "Please select at least one cutover item.",
    holds: |state: &WorkflowState| !state.modules().selected().is_empty(),
}];

impl Step {
    pub const ALL: [Step; 4] = [Step::Select, Step::Configure, Step::Cutover, Step::Report];
    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        match self {
            Self::Select => 0,
            Self::Configure => 1,
            Self::Cutover => 2,
            Self::Report => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Select => "Select",
            Self::Configure => "Configure",
            Self::Cutover => "Cutover",
            Self::Report => "Report",
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    /// Dataset (re)loaded every time the step is entered. The controller list
    /// is session-scoped and not tied to `Select`.
    pub fn dataset(self) -> Option<Dataset> {
        match self {
            Self::Select => None,
            Self::Configure => Some(Dataset::LoopSelection),
            Self::Cutover => Some(Dataset::CutoutoverContent),
            Self::Report => Some(Dataset::ReferenceBlocks),
        }
    }

    /// Checked top to bottom; the first failing entry wins.
    pub fn requirements(self) -> &'static [Requirement] {
        match self {
            Self::Select => SELECT_REQUIREMENTS,
            Self::Configure => CONFIGURE_REQUIREMENTS,
            Self::Cutover => CUTOVER_REQUIREMENTS,
            Self::Report => &[],
        }
    }

    pub fn first_unmet(self, state: &WorkflowState) -> Option<&'static str> {
        self.requirements()
            .iter()
            .find(|requirement| !(requirement.holds)(state))
            .map(|requirement| requirement.message)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Completed,
    Active,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepBadge {
    pub number: usize,
    pub label: &'static str,
    pub status: StepStatus,
}

/// Data behind the step indicator: one badge per step plus the progress bar
/// geometry in percent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepProgress {
    pub badges: Vec<StepBadge>,
    pub width_percent: f64,
    pub left_percent: f64,
}

impl StepProgress {
    pub fn at(current: Step) -> Self {
        let count = Step::COUNT as f64;
        let badges = Step::ALL
            .iter()
            .map(|step| StepBadge {
                number: step.index() + 1,
                label: step.label(),
                status: match step.cmp(&current) {
                    std::cmp::Ordering::Less => StepStatus::Completed,
                    std::cmp::Ordering::Equal => StepStatus::Active,
                    std::cmp::Ordering::Greater => StepStatus::Pending,
                },
            })
            .collect();

        Self {
            badges,
            width_percent: current.index() as f64 * (100.0 / count),
            left_percent: 100.0 / (count * 2.0),
        }
    }
}
