//! Stepwise cutover configuration workflow: selection pools, step gates,
//! dataset loading and the final reference report.

pub mod pagination;
pub mod resolver;
pub mod selection;
pub mod session;
pub mod source;
pub mod steps;
pub mod workflow;

pub use pagination::{Paginator, TPS_PAGE_SIZE};
pub use selection::{SelectionKey, SelectionSet};
pub use session::CutoverSession;
pub use source::{DataSource, DatasetLoader, DatasetPayload, FileDataSource, HttpDataSource};
pub use steps::{Step, StepProgress, StepStatus};
pub use workflow::{
    FetchScope, LoadRequest, Transition, ValidationFailure, Workflow, WorkflowError,
    WorkflowOptions,
};
