//! VOIDRUN Patrol Core
//!
//! Патрульные агенты арены на Bevy 0.16 ECS (headless, strategic layer)
//!
//! Подсистемы:
//! - Placement Planner — layered fallback спавн (explicit → normalized → секторы)
//! - Patrol Controller — ping-pong движение с anti-jitter гарантиями
//! - Exclusion Zone Resolver — inflated регионы + precise mask
//! - Agent Registry — alive/dead state, hit entry point
//! - Spatial Query Service — внешний, через trait `SpatialQuery`

use bevy::prelude::*;

// Публичные модули
pub mod arena;
pub mod collision;
pub mod components;
pub mod config;
pub mod debug;
pub mod exclusion;
pub mod logger;
pub mod patrol;
pub mod placement;
pub mod spatial;

// Re-export базовых типов для удобства
pub use arena::Arena;
pub use components::*;
pub use config::{HeadingOverride, PatrolConfig, PatrolConfigError};
pub use debug::{PatrolDebug, PatrolDebugSnapshot};
pub use exclusion::{ExclusionRegion, ExclusionZones};
pub use logger::{init_logger, log, log_error, log_info, log_warning, set_log_level, LogLevel, LogPrinter};
pub use patrol::{
    PatrolAgentDied, PatrolHit, PatrolPlugin, PatrolRegistry, PatrolTeardown, PlannerState, ReversalCause,
};
pub use placement::{plan_spawn_points, PlacementReport, PlacementStage, Sector, SpawnPoint};
pub use spatial::{Block, PatrolGeometry, SpatialQuery, StaticGeometry};

/// Главный plugin (fixed timestep + патрульная подсистема)
pub struct PatrolSimulationPlugin;

impl Plugin for PatrolSimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для patrol tick
            .insert_resource(Time::<Fixed>::from_hz(60.0))
            .add_plugins(PatrolPlugin);
    }
}

/// Создаёт minimal Bevy App для headless симуляции патруля
///
/// Патруль детерминирован сам по себе: одинаковые арена + конфиг → одинаковые траектории.
pub fn create_headless_app() -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins).add_plugins(PatrolSimulationPlugin);

    app
}
