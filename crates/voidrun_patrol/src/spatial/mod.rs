//! Spatial Query Service — интерфейс к статической геометрии арены
//!
//! Сам collision/query engine внешний (engine bridge, rapier, navmesh).
//! Патруль потребляет только эти шесть запросов. Все запросы read-only:
//! геометрия не мутируется во время симуляции, поэтому их можно дёргать
//! сколько угодно раз на агента за тик без синхронизации.
//!
//! `StaticGeometry` — headless реализация (пол + AABB блоки) для бинарника и тестов.

use bevy::prelude::*;
use std::sync::Arc;

pub mod static_geometry;

pub use static_geometry::{Block, RayHit, StaticGeometry};

/// Количество горизонтальных лучей для wall clearance (равномерный веер)
pub const WALL_RAY_COUNT: usize = 16;

/// Поверхность считается стеной если |normal.y| < порога
pub const WALL_NORMAL_Y_THRESHOLD: f32 = 0.4;

/// Поверхность walkable если normal.y >= порога
pub const WALKABLE_NORMAL_Y: f32 = 0.7;

/// Запросы к статической геометрии
///
/// Контракт: либо валидный результат, либо явный `None` / non-finite sentinel.
/// Частичных результатов нет.
pub trait SpatialQuery: Send + Sync {
    /// Высота walkable поверхности под (x, z)
    fn ground_height(&self, x: f32, z: f32) -> Option<f32>;

    /// Вертикальный луч вниз от `origin_y_hint` → первая walkable поверхность
    fn project_to_surface(&self, x: f32, z: f32, origin_y_hint: f32) -> Option<Vec3>;

    /// Веер из `WALL_RAY_COUNT` горизонтальных лучей, fail если стена ближе `radius`
    fn is_clear_of_walls(&self, point: Vec3, radius: f32) -> bool;

    /// Один луч вверх, fail если hit ближе `clearance`
    fn has_headroom(&self, point: Vec3, clearance: f32) -> bool;

    /// Максимальное безопасное планарное смещение вертикальной capsule
    ///
    /// При полной блокировке — near-zero или non-finite вектор.
    fn sweep_capsule(&self, cap_start: Vec3, cap_end: Vec3, radius: f32, wish: Vec3) -> Vec3;

    fn is_inside_exclusion(&self, x: f32, z: f32) -> bool;
}

/// Resource: shared handle на spatial service
///
/// Присутствие resource = геометрия арены готова.
#[derive(Resource, Clone)]
pub struct PatrolGeometry(pub Arc<dyn SpatialQuery>);

impl PatrolGeometry {
    pub fn new(query: impl SpatialQuery + 'static) -> Self {
        Self(Arc::new(query))
    }

    pub fn query(&self) -> &dyn SpatialQuery {
        self.0.as_ref()
    }
}

impl std::fmt::Debug for PatrolGeometry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PatrolGeometry(..)")
    }
}

/// Горизонтальные направления веера wall clearance
pub fn wall_ray_directions() -> impl Iterator<Item = Vec3> {
    (0..WALL_RAY_COUNT).map(|i| {
        let angle = std::f32::consts::TAU * i as f32 / WALL_RAY_COUNT as f32;
        Vec3::new(angle.cos(), 0.0, angle.sin())
    })
}
