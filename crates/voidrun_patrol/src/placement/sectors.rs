//! Автоматические секторы: 3×3 сетка по interior арены, пять фиксированных ячеек
//!
//! Row растёт вдоль +Z, col вдоль +X. North = row 0 (−Z, Bevy forward).

use bevy::prelude::*;

use crate::Arena;

/// Доля меньшего размера арены для шага сетки кандидатов
const CANDIDATE_STEP_FRACTION: f32 = 0.04;
const CANDIDATE_STEP_MIN: f32 = 1.0;
const CANDIDATE_STEP_MAX: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sector {
    North,
    South,
    East,
    West,
    Center,
}

impl Sector {
    /// Порядок обхода секторов
    pub const ORDER: [Sector; 5] = [
        Sector::North,
        Sector::South,
        Sector::East,
        Sector::West,
        Sector::Center,
    ];

    /// (row, col) в 3×3 сетке
    pub fn cell(self) -> (usize, usize) {
        match self {
            Sector::North => (0, 1),
            Sector::South => (2, 1),
            Sector::East => (1, 2),
            Sector::West => (1, 0),
            Sector::Center => (1, 1),
        }
    }

    /// Прямоугольник ячейки (min, max) по XZ
    pub fn bounds(self, arena: &Arena) -> (Vec2, Vec2) {
        let (min, max) = arena.interior();
        let cell_size = (max - min) / 3.0;
        let (row, col) = self.cell();
        let cell_min = min + Vec2::new(col as f32 * cell_size.x, row as f32 * cell_size.y);
        (cell_min, cell_min + cell_size)
    }

    pub fn center(self, arena: &Arena) -> Vec2 {
        let (min, max) = self.bounds(arena);
        (min + max) * 0.5
    }

    pub fn contains(self, arena: &Arena, point: Vec2) -> bool {
        let (min, max) = self.bounds(arena);
        point.cmpge(min).all() && point.cmple(max).all()
    }

    /// Кандидаты сетки внутри ячейки, по возрастанию расстояния до центра
    pub fn candidates(self, arena: &Arena) -> Vec<Vec2> {
        let step = candidate_step(arena);
        let (min, max) = self.bounds(arena);
        let center = (min + max) * 0.5;
        let half = (max - min) * 0.5;

        let steps_x = (half.x / step).floor() as i32;
        let steps_z = (half.y / step).floor() as i32;

        let mut points = Vec::with_capacity(((2 * steps_x + 1) * (2 * steps_z + 1)) as usize);
        for iz in -steps_z..=steps_z {
            for ix in -steps_x..=steps_x {
                points.push(center + Vec2::new(ix as f32, iz as f32) * step);
            }
        }

        // Стабильная сортировка: равные дистанции остаются в порядке генерации
        points.sort_by(|a, b| {
            a.distance_squared(center)
                .total_cmp(&b.distance_squared(center))
        });
        points
    }
}

/// Шаг сетки кандидатов: 4% меньшего размера арены, clamp [1, 2]
pub fn candidate_step(arena: &Arena) -> f32 {
    (arena.width().min(arena.depth()) * CANDIDATE_STEP_FRACTION)
        .clamp(CANDIDATE_STEP_MIN, CANDIDATE_STEP_MAX)
}
