//! ECS компоненты и registry-owned записи патруля
//!
//! - agent: PatrolAgent (запись), AgentId, AgentBounds, PatrolProxy (hit-test entity)

pub mod agent;

// Re-exports для удобного импорта
pub use agent::*;
