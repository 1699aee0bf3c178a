//! Headless статическая геометрия: плоский пол + solid AABB блоки
//!
//! Блоки — стены, колонны, платформы, навесы. Верхняя грань блока walkable,
//! боковые грани — стены (normal.y = 0), нижняя — потолок.
//! Блок с флагом `masked` участвует в precise exclusion mask.

use bevy::math::Rect;
use bevy::prelude::*;

use super::{wall_ray_directions, SpatialQuery, WALKABLE_NORMAL_Y, WALL_NORMAL_Y_THRESHOLD};
use crate::exclusion::{ExclusionMask, MaskSample};

/// Зазор, который sweep оставляет до препятствия
const SWEEP_SKIN: f32 = 0.01;

/// Блоки ниже этой высоты над низом capsule перешагиваются (ступеньки)
const MAX_STEP_HEIGHT: f32 = 0.3;

/// Solid AABB блок
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub min: Vec3,
    pub max: Vec3,
    /// Геометрия под precise exclusion mask (декорации, реквизит)
    pub masked: bool,
}

impl Block {
    pub fn solid(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: max.max(min),
            masked: false,
        }
    }

    pub fn masked(min: Vec3, max: Vec3) -> Self {
        Self {
            masked: true,
            ..Self::solid(min, max)
        }
    }

    fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

/// Результат raycast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub distance: f32,
    pub point: Vec3,
    pub normal: Vec3,
    /// Индекс блока (`None` = пол)
    pub block: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct StaticGeometry {
    floor_y: f32,
    /// Где пол существует (за пределами — пустота, projection = None)
    floor_bounds: Rect,
    blocks: Vec<Block>,
    excluded_areas: Vec<Rect>,
}

impl StaticGeometry {
    pub fn new(floor_y: f32, floor_bounds: Rect) -> Self {
        Self {
            floor_y,
            floor_bounds,
            blocks: Vec::new(),
            excluded_areas: Vec::new(),
        }
    }

    /// Плоский пол на y=0, покрывающий арену целиком
    pub fn flat_arena(arena: &crate::Arena) -> Self {
        Self::new(
            0.0,
            Rect::new(arena.min_x, arena.min_z, arena.max_x, arena.max_z),
        )
    }

    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    /// Area, которую сам engine считает запретной (`is_inside_exclusion`)
    pub fn with_excluded_area(mut self, area: Rect) -> Self {
        self.excluded_areas.push(area);
        self
    }

    pub fn floor_y(&self) -> f32 {
        self.floor_y
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Стартовая высота для "луча с неба"
    fn sky_height(&self) -> f32 {
        self.blocks
            .iter()
            .map(|b| b.max.y)
            .fold(self.floor_y, f32::max)
            + 1.0
    }

    /// Ближайший hit вдоль луча в пределах `max_distance`
    ///
    /// `direction` должен быть нормализован. Старт внутри блока = hit на дистанции 0.
    pub fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayHit> {
        let mut best: Option<RayHit> = None;

        // Пол (односторонний: только сверху)
        if direction.y < 0.0 && origin.y >= self.floor_y {
            let t = (self.floor_y - origin.y) / direction.y;
            let point = origin + direction * t;
            if t <= max_distance && self.floor_bounds.contains(Vec2::new(point.x, point.z)) {
                best = Some(RayHit {
                    distance: t,
                    point,
                    normal: Vec3::Y,
                    block: None,
                });
            }
        }

        for (index, block) in self.blocks.iter().enumerate() {
            let Some((t, normal)) = ray_box(origin, direction, block) else {
                continue;
            };
            if t > max_distance {
                continue;
            }
            if best.map_or(true, |hit| t < hit.distance) {
                best = Some(RayHit {
                    distance: t,
                    point: origin + direction * t,
                    normal,
                    block: Some(index),
                });
            }
        }

        best
    }
}

/// Slab test: (t входа, normal грани входа)
fn ray_box(origin: Vec3, direction: Vec3, block: &Block) -> Option<(f32, Vec3)> {
    if block.contains(origin) {
        return Some((0.0, -direction));
    }

    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;
    let mut normal = Vec3::ZERO;

    for (axis, unit) in Vec3::AXES.iter().enumerate() {
        let o = origin[axis];
        let d = direction[axis];
        let (lo, hi) = (block.min[axis], block.max[axis]);

        if d.abs() < 1e-8 {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }

        let t1 = (lo - o) / d;
        let t2 = (hi - o) / d;
        // Вход через min грань → normal смотрит в -axis
        let (t_enter, t_exit, sign) = if t1 < t2 { (t1, t2, -1.0) } else { (t2, t1, 1.0) };

        if t_enter > t_near {
            t_near = t_enter;
            normal = *unit * sign;
        }
        t_far = t_far.min(t_exit);
    }

    if t_near > t_far || t_far < 0.0 || t_near < 0.0 {
        return None;
    }

    Some((t_near, normal))
}

/// 2D slab test луча против прямоугольника: t входа
fn ray_rect(origin: Vec2, direction: Vec2, min: Vec2, max: Vec2) -> Option<f32> {
    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;

    for axis in 0..2 {
        let o = origin[axis];
        let d = direction[axis];
        if d.abs() < 1e-8 {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }
        let t1 = (min[axis] - o) / d;
        let t2 = (max[axis] - o) / d;
        t_near = t_near.max(t1.min(t2));
        t_far = t_far.min(t1.max(t2));
    }

    if t_near > t_far || t_far < 0.0 {
        return None;
    }
    Some(t_near.max(0.0))
}

impl SpatialQuery for StaticGeometry {
    fn ground_height(&self, x: f32, z: f32) -> Option<f32> {
        self.project_to_surface(x, z, self.sky_height()).map(|p| p.y)
    }

    fn project_to_surface(&self, x: f32, z: f32, origin_y_hint: f32) -> Option<Vec3> {
        if !origin_y_hint.is_finite() {
            return None;
        }
        let origin = Vec3::new(x, origin_y_hint, z);
        let hit = self.raycast(origin, Vec3::NEG_Y, f32::INFINITY)?;
        (hit.normal.y >= WALKABLE_NORMAL_Y).then_some(hit.point)
    }

    fn is_clear_of_walls(&self, point: Vec3, radius: f32) -> bool {
        wall_ray_directions().all(|dir| match self.raycast(point, dir, radius) {
            Some(hit) => hit.normal.y.abs() >= WALL_NORMAL_Y_THRESHOLD,
            None => true,
        })
    }

    fn has_headroom(&self, point: Vec3, clearance: f32) -> bool {
        self.raycast(point, Vec3::Y, clearance).is_none()
    }

    fn sweep_capsule(&self, cap_start: Vec3, cap_end: Vec3, radius: f32, wish: Vec3) -> Vec3 {
        let wish_2d = Vec2::new(wish.x, wish.z);
        let length = wish_2d.length();
        if !length.is_finite() || !radius.is_finite() {
            return Vec3::NAN;
        }
        if length < 1e-6 {
            return Vec3::ZERO;
        }

        let direction = wish_2d / length;
        let origin = Vec2::new(cap_start.x, cap_start.z);
        let bottom = cap_start.y.min(cap_end.y) - radius;
        let top = cap_start.y.max(cap_end.y) + radius;

        let mut allowed = length;
        for block in &self.blocks {
            // Ступеньки и то, что целиком над головой, не блокируют
            if block.max.y <= bottom + MAX_STEP_HEIGHT || block.min.y >= top {
                continue;
            }

            // Minkowski: capsule радиуса r против прямоугольника, раздутого на r
            let min = Vec2::new(block.min.x, block.min.z) - Vec2::splat(radius);
            let max = Vec2::new(block.max.x, block.max.z) + Vec2::splat(radius);

            let inside = origin.cmpgt(min).all() && origin.cmplt(max).all();
            if inside {
                // Уже в контакте: пускаем только движение наружу
                let center = (min + max) * 0.5;
                if direction.dot(center - origin) > 0.0 {
                    allowed = 0.0;
                }
                continue;
            }

            if let Some(t) = ray_rect(origin, direction, min, max) {
                if t < allowed {
                    allowed = (t - SWEEP_SKIN).max(0.0);
                }
            }
        }

        if allowed >= length {
            return Vec3::new(wish.x, 0.0, wish.z);
        }
        let safe = direction * allowed;
        Vec3::new(safe.x, 0.0, safe.y)
    }

    fn is_inside_exclusion(&self, x: f32, z: f32) -> bool {
        let point = Vec2::new(x, z);
        self.excluded_areas.iter().any(|area| area.contains(point))
    }
}

impl ExclusionMask for StaticGeometry {
    fn surface_below(&self, x: f32, z: f32) -> Option<MaskSample> {
        let origin = Vec3::new(x, self.sky_height(), z);
        let hit = self.raycast(origin, Vec3::NEG_Y, f32::INFINITY)?;
        let masked = hit
            .block
            .and_then(|index| self.blocks.get(index))
            .is_some_and(|block| block.masked);

        Some(MaskSample {
            height: hit.point.y,
            masked,
        })
    }
}
