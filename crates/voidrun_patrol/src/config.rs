//! Конфиг патрульной подсистемы
//!
//! Загружается и валидируется ОДИН раз при ingestion (до старта планировщика).
//! В runtime не мутируется.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Ошибки ingestion конфига
#[derive(Debug, Error)]
pub enum PatrolConfigError {
    #[error("failed to parse patrol config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("`{field}` must be a finite positive number, got {value}")]
    NotPositive { field: &'static str, value: f32 },

    #[error("`{field}` must be finite and non-negative, got {value}")]
    Negative { field: &'static str, value: f32 },

    #[error("normalized spawn #{index} ({x}, {z}) is outside [-1, 1]")]
    NormalizedOutOfRange { index: usize, x: f32, z: f32 },

    #[error("explicit spawn #{index} is not finite")]
    NonFiniteSpawn { index: usize },

    #[error("default heading must be a non-zero vector")]
    ZeroHeading,

    #[error("arena bounds must be finite and ordered, got {min} .. {max}")]
    InvalidArena { min: Vec2, max: Vec2 },
}

/// Переопределение начального направления для конкретного агента
///
/// Агент `agent` смотрит на фиксированную точку `toward` (x, z) вместо default оси.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingOverride {
    pub agent: u32,
    pub toward: [f32; 2],
}

/// Параметры патруля (agent count, leg distance, clearance, spawn hints)
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatrolConfig {
    /// Сколько агентов хотим заспавнить
    pub agent_count: usize,
    /// Длина одного leg ping-pong (метры)
    pub ping_pong_distance: f32,
    /// Скорость агента (m/s)
    pub speed: f32,
    /// Радиус wall clearance (метры)
    pub clearance_radius: f32,
    /// Capsule агента (собственные размеры, не игрока)
    pub capsule_radius: f32,
    pub capsule_half_height: f32,
    /// Минимальный просвет над агентом (метры)
    pub headroom: f32,
    /// Grace period после спавна (секунды)
    pub grace_period: f32,
    /// Inset от краёв арены (метры)
    pub arena_margin: f32,
    /// Высота центра агента над поверхностью
    pub spawn_altitude: f32,
    /// Размер агента — half-extent AABB для hit-testing = agent_size × 0.5
    pub agent_size: f32,
    /// Явные координаты спавна (x, z)
    pub explicit_spawns: Vec<[f32; 2]>,
    /// Нормализованные координаты спавна в [-1, 1]²
    pub normalized_spawns: Vec<[f32; 2]>,
    /// Default ось начального направления (x, z)
    pub default_heading: [f32; 2],
    pub heading_overrides: Vec<HeadingOverride>,
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            agent_count: 5,
            ping_pong_distance: 4.0,
            speed: 2.0,
            clearance_radius: 0.5,
            capsule_radius: 0.35,
            capsule_half_height: 0.5,
            headroom: 1.2,
            grace_period: 2.0,
            arena_margin: 1.0,
            spawn_altitude: 0.9,
            agent_size: 1.0,
            explicit_spawns: Vec::new(),
            normalized_spawns: Vec::new(),
            default_heading: [0.0, -1.0], // -Z (forward)
            heading_overrides: Vec::new(),
        }
    }
}

impl PatrolConfig {
    /// Парсит JSON и сразу валидирует
    pub fn from_json(json: &str) -> Result<Self, PatrolConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PatrolConfigError> {
        let positive = [
            ("ping_pong_distance", self.ping_pong_distance),
            ("speed", self.speed),
            ("clearance_radius", self.clearance_radius),
            ("capsule_radius", self.capsule_radius),
            ("capsule_half_height", self.capsule_half_height),
            ("headroom", self.headroom),
            ("agent_size", self.agent_size),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(PatrolConfigError::NotPositive { field, value });
            }
        }

        let non_negative = [
            ("grace_period", self.grace_period),
            ("arena_margin", self.arena_margin),
            ("spawn_altitude", self.spawn_altitude),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(PatrolConfigError::Negative { field, value });
            }
        }

        for (index, [x, z]) in self.explicit_spawns.iter().enumerate() {
            if !x.is_finite() || !z.is_finite() {
                return Err(PatrolConfigError::NonFiniteSpawn { index });
            }
        }

        for (index, &[x, z]) in self.normalized_spawns.iter().enumerate() {
            let in_range = |v: f32| v.is_finite() && (-1.0..=1.0).contains(&v);
            if !in_range(x) || !in_range(z) {
                return Err(PatrolConfigError::NormalizedOutOfRange { index, x, z });
            }
        }

        if self.default_heading_vec() == Vec2::ZERO {
            return Err(PatrolConfigError::ZeroHeading);
        }

        Ok(())
    }

    pub fn default_heading_vec(&self) -> Vec2 {
        Vec2::from(self.default_heading).normalize_or_zero()
    }

    pub fn explicit_spawn_points(&self) -> Vec<Vec2> {
        self.explicit_spawns.iter().copied().map(Vec2::from).collect()
    }

    pub fn normalized_spawn_points(&self) -> Vec<Vec2> {
        self.normalized_spawns.iter().copied().map(Vec2::from).collect()
    }

    /// Arena по world bounds с margin из конфига
    pub fn arena(&self, min_x: f32, max_x: f32, min_z: f32, max_z: f32) -> crate::Arena {
        crate::Arena::new(min_x, max_x, min_z, max_z, self.arena_margin)
    }

    /// Half-extent hit-test AABB (пропорционален размеру агента)
    pub fn bounds_half_extents(&self) -> Vec3 {
        Vec3::splat(self.agent_size * 0.5)
    }
}
