//! Pipeline execution engine

pub mod config;
pub mod engine;
pub mod events;
pub mod executor;
pub mod scheduler;

pub use config::EngineConfig;
pub use engine::{ExecutionEngine, ValidationError};
pub use events::{EventBus, EventHandler, ExecutionEvent};
pub use executor::StepExecutor;
pub use scheduler::{execution_order, topological_order, TopologyError};
