//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod dispatcher;
pub mod llm;
pub mod llm_extractor;
pub mod llm_synthesis;
pub mod scheduled_tasks;
pub mod test_dependencies;
pub mod traits;

pub use deps::ServerDeps;
pub use dispatcher::{ChannelDispatcher, WorkerPool, DEFAULT_QUEUE_CAPACITY};
pub use llm::{LlmClient, LlmError};
pub use llm_extractor::LlmSemanticExtractor;
pub use llm_synthesis::LlmSynthesisService;
pub use scheduled_tasks::start_scheduler;
pub use test_dependencies::TestDependencies;
pub use traits::*;
