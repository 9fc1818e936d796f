pub mod error;
pub mod orchestrator;
pub mod pacer;
pub mod session;
pub mod status;
pub mod traits;
pub mod types;

pub use error::{CollaboratorError, WorkflowError};
pub use orchestrator::WorkflowOrchestrator;
pub use session::{FormSessionLock, SessionGuard, StopSignal};
pub use status::TracingStatusSink;
pub use traits::*;
pub use types::*;
