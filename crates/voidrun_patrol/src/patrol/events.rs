//! Patrol events — вход от combat системы и выход для one-shot эффектов

use bevy::prelude::*;

use crate::components::AgentId;

/// Combat попал по hit-proxy (handle = proxy Entity)
///
/// Combat/scoring система внешняя: патруль только резолвит handle → агент.
#[derive(Event, Debug, Clone, Copy)]
pub struct PatrolHit {
    pub proxy: Entity,
}

/// Агент умер (последняя позиция для взрыва/звука/очков)
#[derive(Event, Debug, Clone, Copy)]
pub struct PatrolAgentDied {
    pub agent: AgentId,
    pub position: Vec3,
}

/// Teardown патрульной подсистемы (смена арены, выход из уровня)
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct PatrolTeardown;
