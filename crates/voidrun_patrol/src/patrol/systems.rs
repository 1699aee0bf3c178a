//! Patrol systems (ECS glue вокруг planner / controller / registry)
//!
//! Update:
//! - `plan_patrol_spawns` — один раз, когда Arena + PatrolGeometry + ExclusionZones готовы
//! - `apply_patrol_hits` — PatrolHit → registry.hit → PatrolAgentDied
//! - `teardown_patrol` — PatrolTeardown → despawn proxies, очистка
//!
//! FixedUpdate:
//! - `tick_patrol_agents` — controller для каждого живого агента
//! - `sync_hit_proxies` — Transform proxy ← позиция агента

use bevy::prelude::*;

use super::controller::{step_agent, PatrolContext};
use super::events::{PatrolAgentDied, PatrolHit, PatrolTeardown};
use super::registry::PatrolRegistry;
use crate::collision::patrol_proxy_bundle;
use crate::components::PatrolProxy;
use crate::debug::PatrolDebug;
use crate::exclusion::ExclusionZones;
use crate::placement::plan_spawn_points;
use crate::spatial::PatrolGeometry;
use crate::{Arena, PatrolConfig};

/// Жизненный цикл планировщика (planner отрабатывает ровно один раз)
#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub enum PlannerState {
    /// Ждём Arena / PatrolGeometry / ExclusionZones
    Waiting { deferred_frames: u32 },
    /// Агенты созданы
    Ready,
    /// Конфиг или арена не прошли validate (агентов нет)
    Rejected(String),
    /// После PatrolTeardown планировщик больше не запускается
    TornDown,
}

impl Default for PlannerState {
    fn default() -> Self {
        Self::Waiting { deferred_frames: 0 }
    }
}

impl PlannerState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// System: планировщик + registry + hit proxies (polling до готовности входов)
pub fn plan_patrol_spawns(
    mut commands: Commands,
    mut state: ResMut<PlannerState>,
    mut registry: ResMut<PatrolRegistry>,
    config: Res<PatrolConfig>,
    arena: Option<Res<Arena>>,
    geometry: Option<Res<PatrolGeometry>>,
    zones: Option<Res<ExclusionZones>>,
) {
    let PlannerState::Waiting { deferred_frames } = *state else {
        return;
    };

    let (Some(arena), Some(geometry), Some(zones)) = (arena, geometry, zones) else {
        if deferred_frames == 0 {
            crate::log("Patrol planner: arena not ready, deferring");
        }
        *state = PlannerState::Waiting {
            deferred_frames: deferred_frames.saturating_add(1),
        };
        return;
    };

    if let Err(err) = config.validate().and_then(|_| arena.validate()) {
        crate::log_error(&format!("Patrol planner: invalid config: {}", err));
        *state = PlannerState::Rejected(err.to_string());
        return;
    }

    let report = plan_spawn_points(config.agent_count, &arena, &zones, geometry.query(), &config);

    let spawned: Vec<_> = registry
        .spawn(&report.points, &config)
        .iter()
        .map(|agent| (agent.id, commands.spawn(patrol_proxy_bundle(agent)).id()))
        .collect();
    for (id, proxy) in spawned {
        registry.attach_proxy(id, proxy);
    }

    commands.insert_resource(PatrolDebug::init(&report));
    *state = PlannerState::Ready;

    crate::log_info(&format!(
        "Patrol ready: {} agents after {} deferred frames",
        registry.alive_count(),
        deferred_frames
    ));
}

/// System: один тик контроллера для всех живых агентов
///
/// Входы read-only, агенты мутируются на месте в registry.
pub fn tick_patrol_agents(
    time: Res<Time<Fixed>>,
    mut registry: ResMut<PatrolRegistry>,
    config: Res<PatrolConfig>,
    arena: Option<Res<Arena>>,
    geometry: Option<Res<PatrolGeometry>>,
    zones: Option<Res<ExclusionZones>>,
    mut debug: Option<ResMut<PatrolDebug>>,
) {
    let (Some(arena), Some(geometry), Some(zones)) = (arena, geometry, zones) else {
        return;
    };

    let ctx = PatrolContext {
        arena: &arena,
        zones: &zones,
        spatial: geometry.query(),
        config: &config,
    };
    let dt = time.delta_secs();

    for agent in registry.alive_agents_mut() {
        let outcome = step_agent(agent, dt, &ctx);
        if let Some(debug) = debug.as_mut() {
            debug.record(&outcome);
        }
    }

    if let Some(debug) = debug.as_mut() {
        debug.ticks += 1;
    }
}

/// System: синхронизация hit-proxy Transform с позицией агента
pub fn sync_hit_proxies(registry: Res<PatrolRegistry>, mut proxies: Query<(&PatrolProxy, &mut Transform)>) {
    for (proxy, mut transform) in proxies.iter_mut() {
        let Some(agent) = registry.get(proxy.agent) else {
            continue;
        };
        if !agent.alive {
            continue;
        }

        transform.translation = agent.position;
        transform.rotation = agent.rotation();
    }
}

/// System: внешние попадания → смерть агента
///
/// Combat снаружи шлёт `PatrolHit { proxy }`; proxy деспавнится сразу.
pub fn apply_patrol_hits(
    mut commands: Commands,
    mut hits: EventReader<PatrolHit>,
    mut registry: ResMut<PatrolRegistry>,
    mut died: EventWriter<PatrolAgentDied>,
) {
    for hit in hits.read() {
        let Some(record) = registry.hit(hit.proxy) else {
            continue;
        };

        if let Some(proxy) = record.detached_proxy {
            commands.entity(proxy).despawn();
        }

        died.write(PatrolAgentDied {
            agent: record.agent,
            position: record.position,
        });
    }
}

/// System: teardown подсистемы (смена уровня / выход)
pub fn teardown_patrol(
    mut commands: Commands,
    mut teardown: EventReader<PatrolTeardown>,
    mut registry: ResMut<PatrolRegistry>,
    mut state: ResMut<PlannerState>,
) {
    if teardown.is_empty() {
        return;
    }
    teardown.clear();

    let proxies = registry.clear();
    for proxy in &proxies {
        commands.entity(*proxy).despawn();
    }

    commands.remove_resource::<PatrolDebug>();
    *state = PlannerState::TornDown;

    crate::log_info(&format!("Patrol teardown: {} hit proxies despawned", proxies.len()));
}
