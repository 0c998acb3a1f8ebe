// ABOUTME: Deployment orchestration using the type state pattern.
// ABOUTME: Exports state markers, the Deployment struct, and the orchestrator that drives it.

mod deployment;
mod error;
mod lock;
mod orchestrator;
mod outcome;
mod request;
mod state;
mod transitions;

pub use deployment::Deployment;
pub use error::{DeployError, DeployErrorKind, DeploymentFailure, LockHolderInfo};
pub use lock::{DeployLock, LockInfo};
pub use orchestrator::Orchestrator;
pub use outcome::{DeploymentOutcome, DeploymentReport, Stage};
pub use request::DeploymentRequest;
pub use state::{
    BackedUp, Completed, Extracted, Fetched, Initialized, Installed, Started, Stopped, Validated,
};
