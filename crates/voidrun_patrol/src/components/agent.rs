//! Patrol agent: registry-owned запись + hit-proxy компонент

use bevy::prelude::*;

/// Стабильный ID агента (= индекс в порядке создания)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect)]
pub struct AgentId(pub u32);

impl AgentId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "patrol#{}", self.0)
    }
}

/// Axis-aligned hit-test box вокруг агента
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct AgentBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl AgentBounds {
    pub fn around(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// Запись агента (владеет `PatrolRegistry`, контроллер мутирует по ссылке)
///
/// Инварианты:
/// - `traveled_in_leg >= 0`
/// - `stalled_frames` сбрасывается в 0 на любом ненулевом продвижении и на reversal
/// - `reversed_since_advance` снимается только committed шагом
/// - мёртвый агент не воскресает
#[derive(Debug, Clone, PartialEq)]
pub struct PatrolAgent {
    pub id: AgentId,
    pub position: Vec3,
    pub alive: bool,
    pub bounds: AgentBounds,
    /// Текущее направление (x, z), unit
    pub direction: Vec2,
    /// Базовая ось патруля, флипается вместе с `direction`
    pub base_direction: Vec2,
    /// m/s
    pub speed: f32,
    pub traveled_in_leg: f32,
    pub stalled_frames: u32,
    /// Был reversal, а ненулевого шага с тех пор нет (повторный Blocked решает stall rule)
    pub reversed_since_advance: bool,
    /// Секунды с момента спавна (grace period)
    pub age: f32,
    /// Yaw (радианы), forward = -Z
    pub facing: f32,
    /// Hit-test proxy entity (снимается при смерти)
    pub hit_proxy: Option<Entity>,
}

impl PatrolAgent {
    pub fn new(id: AgentId, position: Vec3, heading: Vec2, speed: f32, half_extents: Vec3) -> Self {
        let direction = heading.normalize_or(Vec2::NEG_Y);
        let mut agent = Self {
            id,
            position,
            alive: true,
            bounds: AgentBounds::around(position, half_extents),
            direction,
            base_direction: direction,
            speed,
            traveled_in_leg: 0.0,
            stalled_frames: 0,
            reversed_since_advance: false,
            age: 0.0,
            facing: 0.0,
            hit_proxy: None,
        };
        agent.face_direction();
        agent
    }

    /// Reversal: флип обоих направлений + сброс обоих счётчиков
    pub fn reverse(&mut self) {
        self.direction = -self.direction;
        self.base_direction = -self.base_direction;
        self.traveled_in_leg = 0.0;
        self.stalled_frames = 0;
        self.reversed_since_advance = true;
        self.face_direction();
    }

    /// Развернуть агента по `direction`
    pub fn face_direction(&mut self) {
        if self.direction.length_squared() > 1e-8 {
            // Bevy forward = -Z: yaw=0 смотрит в (0, -1)
            self.facing = (-self.direction.x).atan2(-self.direction.y);
        }
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_rotation_y(self.facing)
    }

    pub fn refresh_bounds(&mut self) {
        let half = self.bounds.half_extents();
        self.bounds = AgentBounds::around(self.position, half);
    }
}

/// Hit-test proxy (Collider sensor entity) → агент
///
/// Связь держит `PatrolRegistry` (явная таблица Entity ↔ AgentId),
/// компонент только дублирует ID для внешних query.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct PatrolProxy {
    pub agent: AgentId,
}
