//! Agent Registry — канонический alive/dead state патрульных агентов
//!
//! Владеет записями `PatrolAgent` (адресация по `AgentId` = индекс),
//! и явной таблицей hit-proxy Entity ↔ AgentId (без обхода иерархии сцены).

use bevy::prelude::*;
use std::collections::HashMap;

use crate::components::{AgentBounds, AgentId, PatrolAgent};
use crate::placement::SpawnPoint;
use crate::PatrolConfig;

/// Callback смерти агента (combat/scoring живёт снаружи)
pub type DeathCallback = Box<dyn Fn(AgentId, Vec3) + Send + Sync>;

/// Hit-test proxy живого агента (targeting, raycast, minimap)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitProxy {
    pub agent: AgentId,
    pub proxy: Option<Entity>,
    pub position: Vec3,
    pub bounds: AgentBounds,
}

/// Что осталось после смерти (для one-shot эффектов)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeathRecord {
    pub agent: AgentId,
    /// Последняя известная позиция
    pub position: Vec3,
    /// Отвязанный proxy (деспавнит вызывающий)
    pub detached_proxy: Option<Entity>,
}

#[derive(Resource, Default)]
pub struct PatrolRegistry {
    agents: Vec<PatrolAgent>,
    proxies: HashMap<Entity, AgentId>,
    on_death: Option<DeathCallback>,
}

impl PatrolRegistry {
    /// Создаёт по агенту на каждую точку планировщика
    ///
    /// ID = индекс в порядке создания. Возвращает только что созданных.
    pub fn spawn(&mut self, points: &[SpawnPoint], config: &PatrolConfig) -> &[PatrolAgent] {
        let first = self.agents.len();

        for (offset, point) in points.iter().enumerate() {
            let id = AgentId((first + offset) as u32);
            let heading = initial_heading(config, id, point.position);
            let agent = PatrolAgent::new(
                id,
                point.position,
                heading,
                config.speed,
                point.bounds.half_extents(),
            );
            self.agents.push(agent);
        }

        crate::log_info(&format!(
            "PatrolRegistry: spawned {} agents (total {})",
            points.len(),
            self.agents.len()
        ));

        &self.agents[first..]
    }

    pub fn attach_proxy(&mut self, id: AgentId, proxy: Entity) -> bool {
        let Some(agent) = self.agents.get_mut(id.index()) else {
            return false;
        };
        if !agent.alive {
            return false;
        }
        if let Some(previous) = agent.hit_proxy.replace(proxy) {
            self.proxies.remove(&previous);
        }
        self.proxies.insert(proxy, id);
        true
    }

    pub fn resolve_proxy(&self, proxy: Entity) -> Option<AgentId> {
        self.proxies.get(&proxy).copied()
    }

    pub fn set_death_callback(&mut self, callback: impl Fn(AgentId, Vec3) + Send + Sync + 'static) {
        self.on_death = Some(Box::new(callback));
    }

    /// alive → dead, proxy отвязывается. `None` если агента нет или он уже мёртв.
    pub fn mark_dead(&mut self, id: AgentId) -> Option<DeathRecord> {
        let agent = self.agents.get_mut(id.index())?;
        if !agent.alive {
            return None;
        }

        agent.alive = false;
        let detached_proxy = agent.hit_proxy.take();
        if let Some(proxy) = detached_proxy {
            self.proxies.remove(&proxy);
        }

        Some(DeathRecord {
            agent: id,
            position: agent.position,
            detached_proxy,
        })
    }

    /// Entry point для combat: handle → AgentId → mark_dead → callback
    pub fn hit(&mut self, proxy: Entity) -> Option<DeathRecord> {
        let Some(id) = self.resolve_proxy(proxy) else {
            crate::log_warning(&format!("PatrolRegistry: hit on unknown proxy {:?}", proxy));
            return None;
        };

        let record = self.mark_dead(id)?;
        if let Some(callback) = self.on_death.as_ref() {
            callback(record.agent, record.position);
        }
        crate::log_info(&format!(
            "PatrolRegistry: {} killed at {:?} ({} alive)",
            record.agent,
            record.position,
            self.alive_count()
        ));
        Some(record)
    }

    pub fn alive_agents(&self) -> Vec<HitProxy> {
        self.agents
            .iter()
            .filter(|agent| agent.alive)
            .map(|agent| HitProxy {
                agent: agent.id,
                proxy: agent.hit_proxy,
                position: agent.position,
                bounds: agent.bounds,
            })
            .collect()
    }

    pub fn alive_count(&self) -> usize {
        self.agents.iter().filter(|agent| agent.alive).count()
    }

    pub fn positions(&self, alive_only: bool) -> Vec<Vec3> {
        self.agents
            .iter()
            .filter(|agent| !alive_only || agent.alive)
            .map(|agent| agent.position)
            .collect()
    }

    pub fn get(&self, id: AgentId) -> Option<&PatrolAgent> {
        self.agents.get(id.index())
    }

    pub fn agents(&self) -> &[PatrolAgent] {
        &self.agents
    }

    /// Живые агенты для контроллера (по ссылке)
    pub fn alive_agents_mut(&mut self) -> impl Iterator<Item = &mut PatrolAgent> {
        self.agents.iter_mut().filter(|agent| agent.alive)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Teardown: забыть всех агентов и proxy таблицу (callback остаётся)
    pub fn clear(&mut self) -> Vec<Entity> {
        self.agents.clear();
        self.proxies.drain().map(|(proxy, _)| proxy).collect()
    }
}

/// Начальное направление: default ось или "смотреть на точку" из override
pub fn initial_heading(config: &PatrolConfig, id: AgentId, position: Vec3) -> Vec2 {
    let default = config.default_heading_vec();

    config
        .heading_overrides
        .iter()
        .find(|o| o.agent == id.0)
        .map(|o| (Vec2::from(o.toward) - Vec2::new(position.x, position.z)).normalize_or(default))
        .unwrap_or(default)
}
