//! Debug / query hooks патрульной подсистемы
//!
//! Lifecycle:
//! - `PatrolDebug` вставляется когда планировщик отработал (subsystem ready)
//! - удаляется на `PatrolTeardown`
//!
//! Никакого глобального mutable state: только ECS resource.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::components::AgentId;
use crate::patrol::{PatrolRegistry, ReversalCause, TickOutcome};
use crate::placement::{min_pairwise_spacing, PlacementReport};

/// Интервал периодического debug лога (секунды)
pub const DEBUG_LOG_INTERVAL: f32 = 1.0;

#[derive(Resource, Debug, Clone)]
pub struct PatrolDebug {
    pub requested: usize,
    pub spawned: usize,
    /// Min spacing на момент спавна (диагностика планировщика)
    pub spawn_min_spacing: Option<f32>,
    pub ticks: u64,
    pub reversals: HashMap<ReversalCause, u64>,
    /// Периодический лог (выключен по умолчанию)
    pub log_enabled: bool,
    since_last_log: f32,
}

/// Снимок состояния для тестов / debug overlay
#[derive(Debug, Clone, PartialEq)]
pub struct PatrolDebugSnapshot {
    pub requested: usize,
    pub spawned: usize,
    pub alive: usize,
    pub positions: Vec<(AgentId, Vec3)>,
    pub min_spacing: Option<f32>,
    pub ticks: u64,
    pub total_reversals: u64,
}

impl PatrolDebug {
    pub fn init(report: &PlacementReport) -> Self {
        Self {
            requested: report.requested,
            spawned: report.points.len(),
            spawn_min_spacing: report.min_spacing,
            ticks: 0,
            reversals: HashMap::new(),
            log_enabled: false,
            since_last_log: 0.0,
        }
    }

    pub fn record(&mut self, outcome: &TickOutcome) {
        if let Some(cause) = outcome.reversal {
            *self.reversals.entry(cause).or_default() += 1;
        }
    }

    pub fn reversals_of(&self, cause: ReversalCause) -> u64 {
        self.reversals.get(&cause).copied().unwrap_or(0)
    }

    pub fn snapshot(&self, registry: &PatrolRegistry) -> PatrolDebugSnapshot {
        let positions: Vec<(AgentId, Vec3)> = registry
            .alive_agents()
            .into_iter()
            .map(|proxy| (proxy.agent, proxy.position))
            .collect();
        let alive_positions: Vec<Vec3> = positions.iter().map(|(_, p)| *p).collect();

        PatrolDebugSnapshot {
            requested: self.requested,
            spawned: self.spawned,
            alive: positions.len(),
            min_spacing: min_pairwise_spacing(&alive_positions),
            positions,
            ticks: self.ticks,
            total_reversals: self.reversals.values().sum(),
        }
    }
}

/// Система: периодический debug лог (если включён)
pub fn log_patrol_debug(
    time: Res<Time<Fixed>>,
    debug: Option<ResMut<PatrolDebug>>,
    registry: Res<PatrolRegistry>,
) {
    let Some(mut debug) = debug else {
        return;
    };
    if !debug.log_enabled {
        return;
    }

    debug.since_last_log += time.delta_secs();
    if debug.since_last_log < DEBUG_LOG_INTERVAL {
        return;
    }
    debug.since_last_log = 0.0;

    let snapshot = debug.snapshot(&registry);
    crate::log(&format!(
        "🛰️ Patrol: {}/{} alive (requested {}), tick {}, reversals {}, min spacing {:?}",
        snapshot.alive,
        snapshot.spawned,
        snapshot.requested,
        snapshot.ticks,
        snapshot.total_reversals,
        snapshot.min_spacing,
    ));
}
