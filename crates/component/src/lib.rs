// Component plug-in framework for pipeline runtimes
//
// Components describe themselves with JSON documents (identity, setup
// schema, task schemas). The framework loads and registers them, binds
// tasks to setups and drives every call through validation, secret
// resolution and usage accounting.

pub mod component;
pub mod config;
pub mod contracts;
pub mod definition;
pub mod error;
pub mod execution;
pub mod record;
pub mod registry;
pub mod schema;
pub mod secrets;
pub mod telemetry;
pub mod usage;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use component::Component;
pub use config::{Config, ConfigError, LogFormat, LoggingConfig};
pub use definition::{ComponentDefinition, TaskDefinition, load_definition};
pub use error::ComponentError;
pub use execution::{ComponentHandler, Execution, ExecutionContext, ExecutionParams, TaskHandler};
pub use record::{ConversionError, Record, from_record, to_record};
pub use registry::{Registry, RegistryStore};
pub use schema::{CompiledSchema, ValidationError};
pub use secrets::{SECRET_KEYWORD, SecretMap, resolve_setup};
pub use usage::{NoopUsageHandler, UsageHandler, UsageHandlerCreator};
