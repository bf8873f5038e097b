//! Source validation pipeline
//!
//! - **Dispatcher**: protocol and mode to an ordered stage plan
//! - **Stages**: reachability, content signature, media structure, behavioral
//! - **Retry**: bounded retry of transient stage failures
//! - **Validator**: one source through its plan, fail-fast
//! - **Orchestrator**: bounded concurrent validation with timeouts
//! - **Channel processor**: dedup, filter and latency ordering per channel
//! - **Catalog walker**: every channel of every category, plus run metadata

pub mod catalog_walker;
pub mod channel_processor;
pub mod dispatcher;
pub mod orchestrator;
pub mod retry;
pub mod stages;
pub mod validator;

pub use catalog_walker::CatalogWalker;
pub use channel_processor::{ChannelProcessor, ChannelReport, order_valid};
pub use dispatcher::{dispatch, stage_plan};
pub use orchestrator::Orchestrator;
pub use retry::{Retryable, with_retry};
pub use stages::{StageReport, StageRunner, StageSettings};
pub use validator::SourceValidator;
