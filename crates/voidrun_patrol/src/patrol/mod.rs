//! Patrol module — registry, controller, ECS systems
//!
//! Поток управления:
//! planner (один раз, когда арена готова) → registry создаёт агентов →
//! каждый FixedUpdate тик controller двигает живых агентов.

use bevy::prelude::*;

pub mod controller;
pub mod events;
pub mod registry;
pub mod systems;


pub use controller::{step_agent, PatrolContext, ReversalCause, TickOutcome, MAX_TICK_DELTA, STALL_REVERSAL_TICKS};
pub use events::{PatrolAgentDied, PatrolHit, PatrolTeardown};
pub use registry::{initial_heading, DeathCallback, DeathRecord, HitProxy, PatrolRegistry};
pub use systems::PlannerState;

use crate::debug::log_patrol_debug;
use crate::PatrolConfig;

/// Patrol Plugin
///
/// Порядок выполнения:
/// - Update: plan_patrol_spawns → apply_patrol_hits → teardown_patrol
/// - FixedUpdate: tick_patrol_agents → sync_hit_proxies → log_patrol_debug
///
/// `PatrolConfig` вставляется default'ом если хост не положил свой.
pub struct PatrolPlugin;

impl Plugin for PatrolPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PatrolConfig>()
            .init_resource::<PatrolRegistry>()
            .init_resource::<PlannerState>()
            .add_event::<PatrolHit>()
            .add_event::<PatrolAgentDied>()
            .add_event::<PatrolTeardown>()
            .add_systems(
                Update,
                (
                    systems::plan_patrol_spawns,
                    systems::apply_patrol_hits,
                    systems::teardown_patrol,
                )
                    .chain(),
            )
            .add_systems(
                FixedUpdate,
                (
                    systems::tick_patrol_agents,
                    systems::sync_hit_proxies,
                    log_patrol_debug,
                )
                    .chain(), // Последовательное выполнение для детерминизма
            );
    }
}
