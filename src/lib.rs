//! CloudConvert integration for workflow automation.
//!
//! Provides the credential descriptor, the job/webhook action node and the
//! webhook trigger, plus a small receiver for running the trigger standalone.

pub mod api;
pub mod config;
pub mod credentials;
pub mod exports;
pub mod node;
pub mod output;
pub mod server;
pub mod state;
pub mod trigger;
