//! Arena: axis-aligned прямоугольник в горизонтальной плоскости + inset margin
//!
//! Иммутабельна после того как геометрия арены готова.
//! Присутствие `Arena` resource = арена готова (планировщик ждёт её).

use bevy::prelude::*;

use crate::PatrolConfigError;

#[derive(Resource, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Resource)]
pub struct Arena {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
    /// Inset для interior placement и hard clamp движения
    pub margin: f32,
}

impl Arena {
    /// Non-finite значения → 0 (clamp с NaN границами паникует)
    pub fn new(min_x: f32, max_x: f32, min_z: f32, max_z: f32, margin: f32) -> Self {
        let [min_x, max_x, min_z, max_z, margin] = [min_x, max_x, min_z, max_z, margin].map(finite_or_zero);
        Self {
            min_x: min_x.min(max_x),
            max_x: max_x.max(min_x),
            min_z: min_z.min(max_z),
            max_z: max_z.max(min_z),
            margin: margin.max(0.0),
        }
    }

    /// Проверка для resource, собранного без `new` (поля публичные)
    pub fn validate(&self) -> Result<(), PatrolConfigError> {
        let bounds = [self.min_x, self.max_x, self.min_z, self.max_z, self.margin];
        if bounds.iter().any(|v| !v.is_finite()) || self.min_x > self.max_x || self.min_z > self.max_z {
            return Err(PatrolConfigError::InvalidArena {
                min: Vec2::new(self.min_x, self.min_z),
                max: Vec2::new(self.max_x, self.max_z),
            });
        }
        Ok(())
    }

    /// Квадратная/прямоугольная арена с центром в origin
    pub fn centered(width: f32, depth: f32, margin: f32) -> Self {
        Self::new(-width * 0.5, width * 0.5, -depth * 0.5, depth * 0.5, margin)
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn depth(&self) -> f32 {
        self.max_z - self.min_z
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new((self.min_x + self.max_x) * 0.5, (self.min_z + self.max_z) * 0.5)
    }

    /// Interior (arena minus margin) как (min, max) по XZ
    ///
    /// Если margin больше половины размера — interior схлопывается в центр.
    pub fn interior(&self) -> (Vec2, Vec2) {
        let center = self.center();
        let min = Vec2::new(
            (self.min_x + self.margin).min(center.x),
            (self.min_z + self.margin).min(center.y),
        );
        let max = Vec2::new(
            (self.max_x - self.margin).max(center.x),
            (self.max_z - self.margin).max(center.y),
        );
        (min, max)
    }

    pub fn interior_contains(&self, x: f32, z: f32) -> bool {
        let (min, max) = self.interior();
        x >= min.x && x <= max.x && z >= min.y && z <= max.y
    }

    /// Hard clamp XZ в interior (Y не трогаем)
    pub fn clamp_to_interior(&self, point: Vec3) -> Vec3 {
        let (min, max) = self.interior();
        Vec3::new(point.x.clamp(min.x, max.x), point.y, point.z.clamp(min.y, max.y))
    }

    /// Маппинг нормализованной точки [-1, 1]² линейно в interior
    pub fn denormalize(&self, hint: Vec2) -> Vec2 {
        let (min, max) = self.interior();
        let half = (max - min) * 0.5;
        let center = (min + max) * 0.5;
        center + hint.clamp(Vec2::NEG_ONE, Vec2::ONE) * half
    }
}

fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
