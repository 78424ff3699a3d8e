// Usage accounting hooks
//
// A usage handler runs around every `execute` call: `check` before the task
// handler (e.g. to reject a caller without quota) and `collect` after it
// (e.g. to record consumed tokens).

use std::sync::Arc;

use crate::execution::{Execution, ExecutionContext};
use crate::record::Record;

/// Pre/post hooks around a task invocation.
#[async_trait::async_trait]
pub trait UsageHandler: Send + Sync {
	/// Runs after input validation and before the task handler.
	async fn check(&self, ctx: &ExecutionContext, inputs: &[Record]) -> anyhow::Result<()>;

	/// Runs after output validation.
	async fn collect(&self, ctx: &ExecutionContext, inputs: &[Record], outputs: &[Record]) -> anyhow::Result<()>;
}

/// Builds the usage handler of one execution.
pub type UsageHandlerCreator = Arc<dyn Fn(&Execution) -> anyhow::Result<Box<dyn UsageHandler>> + Send + Sync>;

/// Usage handler that accepts everything and records nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopUsageHandler;

#[async_trait::async_trait]
impl UsageHandler for NoopUsageHandler {
	async fn check(&self, _ctx: &ExecutionContext, _inputs: &[Record]) -> anyhow::Result<()> {
		Ok(())
	}

	async fn collect(&self, _ctx: &ExecutionContext, _inputs: &[Record], _outputs: &[Record]) -> anyhow::Result<()> {
		Ok(())
	}
}

/// Creator used when a component does not install its own.
pub fn noop_usage_handler_creator() -> UsageHandlerCreator {
	Arc::new(|_| Ok(Box::new(NoopUsageHandler)))
}
