//! The CloudConvert action node.
//!
//! Parameters are read through [`NodeParameters`], resolved into a typed
//! [`Operation`] per input item and dispatched by [`CloudConvertNode`].

mod action;
mod operation;
mod params;

pub use action::{build_job_body, CloudConvertNode, NodeOutput, OperationResult, AUTOIMPORT_PREFIX};
pub use operation::{CreateJob, JobOperation, Operation, Resource, WebhookOperation};
pub use params::{NodeParameters, StaticParameters};
