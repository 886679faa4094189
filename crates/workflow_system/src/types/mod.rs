pub mod input;
pub mod workflow;

pub use input::{InputType, WorkflowInput};
pub use workflow::{Workflow, WorkflowError};
