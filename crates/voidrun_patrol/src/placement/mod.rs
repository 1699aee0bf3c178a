//! Placement Planner — layered fallback спавн патрульных агентов
//!
//! Стадии (стоп как только набрали `want_count`):
//! 1. Explicit координаты из конфига
//! 2. Нормализованные [-1, 1]² hints → interior арены
//! 3. Автоматические секторы (N/S/E/W/C), первый валидный кандидат на сектор
//!
//! Никогда не падает: частичный результат — норма (видно через alive_count).
//! Nudge: кандидат, не прошедший wall/headroom, двигаем к центру арены
//! шагами `NUDGE_STEP`, максимум `NUDGE_MAX_STEPS` раз.

use bevy::prelude::*;

use crate::components::AgentBounds;
use crate::exclusion::ExclusionZones;
use crate::spatial::SpatialQuery;
use crate::{Arena, PatrolConfig};

pub mod sectors;

#[cfg(test)]
mod planner_tests;

pub use sectors::{candidate_step, Sector};

/// Шаг nudge к центру арены (метры)
pub const NUDGE_STEP: f32 = 0.4;

/// Максимум итераций nudge
pub const NUDGE_MAX_STEPS: usize = 7;

/// Какая стадия дала точку
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlacementStage {
    Explicit,
    Normalized,
    Sector(Sector),
}

/// Принятая точка спавна (уже поднята на altitude над поверхностью)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnPoint {
    pub position: Vec3,
    pub bounds: AgentBounds,
    pub stage: PlacementStage,
}

/// Кандидат + флаги валидности (transient)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnCandidate {
    /// Поднятая над поверхностью точка (центр агента)
    pub point: Vec3,
    pub in_arena: bool,
    pub non_excluded: bool,
    pub wall_clear: bool,
    pub headroom_clear: bool,
}

impl SpawnCandidate {
    pub fn is_valid(&self) -> bool {
        self.in_arena && self.non_excluded && self.wall_clear && self.headroom_clear
    }

    /// Nudge имеет смысл только для clearance провалов
    fn needs_nudge(&self) -> bool {
        self.in_arena && self.non_excluded && !(self.wall_clear && self.headroom_clear)
    }
}

/// Итог планировщика
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacementReport {
    pub requested: usize,
    pub points: Vec<SpawnPoint>,
    /// Отброшенные кандидаты (после nudge) + секторы без валидной точки
    pub rejected: usize,
    /// Минимальная попарная XZ дистанция (диагностика, не инвариант)
    pub min_spacing: Option<f32>,
}

impl PlacementReport {
    pub fn positions(&self) -> Vec<Vec3> {
        self.points.iter().map(|p| p.position).collect()
    }

    pub fn count_from(&self, stage: PlacementStage) -> usize {
        self.points.iter().filter(|p| p.stage == stage).count()
    }

    pub fn is_complete(&self) -> bool {
        self.points.len() >= self.requested
    }
}

/// Планировщик на одну арену (все входы read-only)
pub struct PlacementPlanner<'a> {
    arena: &'a Arena,
    zones: &'a ExclusionZones,
    spatial: &'a dyn SpatialQuery,
    config: &'a PatrolConfig,
}

impl<'a> PlacementPlanner<'a> {
    pub fn new(
        arena: &'a Arena,
        zones: &'a ExclusionZones,
        spatial: &'a dyn SpatialQuery,
        config: &'a PatrolConfig,
    ) -> Self {
        Self {
            arena,
            zones,
            spatial,
            config,
        }
    }

    /// Проекция + все проверки для (x, z); `None` если поверхности нет
    ///
    /// Высоту берёт геометрия (`ground_height` стреляет луч выше всего, что в ней есть).
    pub fn evaluate(&self, xz: Vec2) -> Option<SpawnCandidate> {
        let ground = self.spatial.ground_height(xz.x, xz.y).filter(|y| y.is_finite())?;
        let point = Vec3::new(xz.x, ground + self.config.spawn_altitude, xz.y);

        let in_arena = self.arena.interior_contains(point.x, point.z);
        let non_excluded = !self.zones.is_excluded(point.x, point.z)
            && !self.spatial.is_inside_exclusion(point.x, point.z);

        Some(SpawnCandidate {
            point,
            in_arena,
            non_excluded,
            wall_clear: self.spatial.is_clear_of_walls(point, self.config.clearance_radius),
            headroom_clear: self.spatial.has_headroom(point, self.config.headroom),
        })
    }

    /// Валидирует кандидата с nudge коррекцией
    pub fn accept(&self, xz: Vec2) -> Option<Vec3> {
        let center = self.arena.center();
        let mut current = xz;

        for attempt in 0..=NUDGE_MAX_STEPS {
            let candidate = self.evaluate(current)?;
            if candidate.is_valid() {
                return Some(candidate.point);
            }
            if !candidate.needs_nudge() || attempt == NUDGE_MAX_STEPS {
                return None;
            }
            current = nudge_toward(current, center, NUDGE_STEP);
        }

        None
    }

    pub fn plan(&self, want_count: usize) -> PlacementReport {
        let mut report = PlacementReport {
            requested: want_count,
            ..Default::default()
        };

        // Стадия 1: explicit
        for xz in self.config.explicit_spawn_points().into_iter().take(want_count) {
            if report.points.len() >= want_count {
                break;
            }
            self.try_push(&mut report, xz, PlacementStage::Explicit);
        }

        // Стадия 2: normalized
        for hint in self.config.normalized_spawn_points() {
            if report.points.len() >= want_count {
                break;
            }
            let xz = self.arena.denormalize(hint);
            self.try_push(&mut report, xz, PlacementStage::Normalized);
        }

        // Стадия 3: секторы, которые ещё не заняты
        for sector in Sector::ORDER {
            if report.points.len() >= want_count {
                break;
            }
            let occupied = report
                .points
                .iter()
                .any(|p| sector.contains(self.arena, Vec2::new(p.position.x, p.position.z)));
            if occupied {
                continue;
            }

            let mut found = false;
            for xz in sector.candidates(self.arena) {
                if let Some(position) = self.accept(xz) {
                    report.points.push(self.spawn_point(position, PlacementStage::Sector(sector)));
                    found = true;
                    break;
                }
            }
            if !found {
                report.rejected += 1;
                crate::log_warning(&format!(
                    "Placement: sector {:?} has no valid candidate",
                    sector
                ));
            }
        }

        report.min_spacing = min_pairwise_spacing(&report.positions());

        let summary = format!(
            "Placement: {}/{} spawn points (explicit {}, normalized {}, sectors {}), rejected {}, min spacing {:?}",
            report.points.len(),
            want_count,
            report.count_from(PlacementStage::Explicit),
            report.count_from(PlacementStage::Normalized),
            report
                .points
                .iter()
                .filter(|p| matches!(p.stage, PlacementStage::Sector(_)))
                .count(),
            report.rejected,
            report.min_spacing,
        );
        if report.is_complete() {
            crate::log_info(&summary);
        } else {
            crate::log_warning(&summary);
        }

        report
    }

    fn try_push(&self, report: &mut PlacementReport, xz: Vec2, stage: PlacementStage) {
        match self.accept(xz) {
            Some(position) => report.points.push(self.spawn_point(position, stage)),
            None => {
                report.rejected += 1;
                crate::log(&format!("Placement: {:?} candidate {:?} rejected", stage, xz));
            }
        }
    }

    fn spawn_point(&self, position: Vec3, stage: PlacementStage) -> SpawnPoint {
        SpawnPoint {
            position,
            bounds: AgentBounds::around(position, self.config.bounds_half_extents()),
            stage,
        }
    }
}

/// Shortcut: планировщик + plan одним вызовом
pub fn plan_spawn_points(
    want_count: usize,
    arena: &Arena,
    zones: &ExclusionZones,
    spatial: &dyn SpatialQuery,
    config: &PatrolConfig,
) -> PlacementReport {
    PlacementPlanner::new(arena, zones, spatial, config).plan(want_count)
}

fn nudge_toward(point: Vec2, target: Vec2, step: f32) -> Vec2 {
    let offset = target - point;
    if offset.length() <= step {
        target
    } else {
        point + offset.normalize() * step
    }
}

/// Минимальная попарная дистанция по XZ
pub fn min_pairwise_spacing(points: &[Vec3]) -> Option<f32> {
    let mut best: Option<f32> = None;
    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            let d = Vec2::new(a.x - b.x, a.z - b.z).length();
            best = Some(best.map_or(d, |current| current.min(d)));
        }
    }
    best
}
