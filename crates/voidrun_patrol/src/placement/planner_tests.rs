//! Tests for the placement planner.

use bevy::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::sync::Arc;

use super::*;
use crate::exclusion::{ExclusionRegion, ExclusionZones};
use crate::spatial::{Block, SpatialQuery, StaticGeometry};
use crate::{Arena, PatrolConfig};

fn arena_20() -> Arena {
    Arena::centered(20.0, 20.0, 1.0)
}

fn assert_valid_spawn(
    point: &SpawnPoint,
    arena: &Arena,
    zones: &ExclusionZones,
    geometry: &dyn SpatialQuery,
    config: &PatrolConfig,
) {
    let p = point.position;
    assert!(arena.interior_contains(p.x, p.z), "{:?} outside interior", p);
    assert!(!zones.is_excluded(p.x, p.z), "{:?} excluded", p);
    assert!(!geometry.is_inside_exclusion(p.x, p.z), "{:?} inside engine exclusion", p);
    assert!(geometry.is_clear_of_walls(p, config.clearance_radius), "{:?} near wall", p);
    assert!(geometry.has_headroom(p, config.headroom), "{:?} no headroom", p);
    assert!(point.bounds.contains(p));
}

#[test]
fn test_scenario_a_five_sectors_on_empty_arena() {
    let arena = arena_20();
    let geometry = StaticGeometry::flat_arena(&arena);
    let zones = ExclusionZones::empty();
    let config = PatrolConfig::default();

    let report = plan_spawn_points(5, &arena, &zones, &geometry, &config);

    assert_eq!(report.points.len(), 5);
    assert!(report.is_complete());

    let sectors: HashSet<_> = report.points.iter().map(|p| p.stage).collect();
    assert_eq!(sectors.len(), 5, "one point per sector");
    for sector in Sector::ORDER {
        assert!(sectors.contains(&PlacementStage::Sector(sector)));
    }

    for point in &report.points {
        let p = point.position;
        assert!(p.x >= -9.0 && p.x <= 9.0 && p.z >= -9.0 && p.z <= 9.0);
        // Поднят на altitude над полом
        assert!((p.y - config.spawn_altitude).abs() < 1e-5);
        assert_valid_spawn(point, &arena, &zones, &geometry, &config);
    }
}

#[test]
fn test_scenario_b_explicit_inside_exclusion_falls_back_to_sector() {
    let arena = arena_20();
    let geometry = StaticGeometry::flat_arena(&arena);
    // После inflation на 0.4 → [4, 6] × [4, 6]
    let zones = ExclusionZones::from_regions([ExclusionRegion::new(
        "generator",
        Vec2::new(4.4, 4.4),
        Vec2::new(5.6, 5.6),
    )]);
    let config = PatrolConfig {
        explicit_spawns: vec![[5.0, 5.0]],
        ..Default::default()
    };

    let report = plan_spawn_points(1, &arena, &zones, &geometry, &config);

    assert_eq!(report.points.len(), 1);
    assert_eq!(report.count_from(PlacementStage::Explicit), 0);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.points[0].stage, PlacementStage::Sector(Sector::North));
    assert_valid_spawn(&report.points[0], &arena, &zones, &geometry, &config);
}

#[test]
fn test_explicit_and_normalized_are_used_first() {
    let arena = arena_20();
    let geometry = StaticGeometry::flat_arena(&arena);
    let zones = ExclusionZones::empty();
    let config = PatrolConfig {
        explicit_spawns: vec![[-7.0, 7.0]],
        normalized_spawns: vec![[0.5, -0.5], [1.0, 1.0]],
        ..Default::default()
    };

    let report = plan_spawn_points(2, &arena, &zones, &geometry, &config);

    assert_eq!(report.points.len(), 2);
    assert_eq!(report.points[0].stage, PlacementStage::Explicit);
    assert_eq!(report.points[1].stage, PlacementStage::Normalized);
    let p = report.points[1].position;
    assert!((p.x - 4.5).abs() < 1e-5 && (p.z + 4.5).abs() < 1e-5, "p = {:?}", p);
}

#[test]
fn test_explicit_list_capped_by_want_count() {
    let arena = arena_20();
    let geometry = StaticGeometry::flat_arena(&arena);
    let config = PatrolConfig {
        explicit_spawns: vec![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0]],
        ..Default::default()
    };

    let report = plan_spawn_points(2, &arena, &ExclusionZones::empty(), &geometry, &config);
    assert_eq!(report.points.len(), 2);
    assert_eq!(report.count_from(PlacementStage::Explicit), 2);
}

#[test]
fn test_nudge_moves_candidate_off_wall() {
    let arena = arena_20();
    let geometry = StaticGeometry::flat_arena(&arena)
        .with_block(Block::solid(Vec3::new(8.3, 0.0, -9.0), Vec3::new(8.6, 3.0, 9.0)));
    let zones = ExclusionZones::empty();
    let config = PatrolConfig {
        explicit_spawns: vec![[8.0, 0.0]],
        ..Default::default()
    };

    let report = plan_spawn_points(1, &arena, &zones, &geometry, &config);

    assert_eq!(report.count_from(PlacementStage::Explicit), 1);
    let p = report.points[0].position;
    // Один шаг nudge к центру
    assert!((p.x - (8.0 - NUDGE_STEP)).abs() < 1e-4, "p = {:?}", p);
    assert!(p.z.abs() < 1e-5);
    assert_valid_spawn(&report.points[0], &arena, &zones, &geometry, &config);
}

#[test]
fn test_nudge_budget_exhausted_discards_candidate() {
    let arena = arena_20();
    // Стена вдоль всего пути nudge: 7 шагов по 0.4 не уводят от неё дальше clearance
    let geometry = StaticGeometry::flat_arena(&arena)
        .with_block(Block::solid(Vec3::new(-0.4, 0.0, 4.0), Vec3::new(0.0, 3.0, 9.5)));
    let config = PatrolConfig {
        explicit_spawns: vec![[0.3, 9.0]],
        ..Default::default()
    };

    let report = plan_spawn_points(1, &arena, &ExclusionZones::empty(), &geometry, &config);

    assert_eq!(report.count_from(PlacementStage::Explicit), 0);
    assert!(report.rejected >= 1);
    assert_eq!(report.points.len(), 1);
    assert!(report.points[0].position.z < 5.0);
}

#[test]
fn test_mask_pushes_sector_point_off_center() {
    let arena = arena_20();
    let geometry = Arc::new(
        StaticGeometry::flat_arena(&arena)
            // Низкий masked реквизит в центре North сектора
            .with_block(Block::masked(Vec3::new(-0.5, 0.0, -6.5), Vec3::new(0.5, 0.2, -5.5))),
    );
    let zones = ExclusionZones::empty().with_mask(geometry.clone(), geometry.floor_y());
    let config = PatrolConfig::default();

    let report = plan_spawn_points(1, &arena, &zones, geometry.as_ref(), &config);

    assert_eq!(report.points.len(), 1);
    let p = report.points[0].position;
    assert_ne!(Vec2::new(p.x, p.z), Vec2::new(0.0, -6.0));
    assert_valid_spawn(&report.points[0], &arena, &zones, geometry.as_ref(), &config);
}

#[test]
fn test_partial_result_when_sectors_exhausted() {
    let arena = arena_20();
    let geometry = StaticGeometry::flat_arena(&arena);

    let report = plan_spawn_points(8, &arena, &ExclusionZones::empty(), &geometry, &PatrolConfig::default());

    assert_eq!(report.points.len(), 5);
    assert!(!report.is_complete());
}

#[test]
fn test_void_floor_yields_nothing() {
    let arena = arena_20();
    // Пол где-то далеко от арены
    let geometry = StaticGeometry::new(0.0, bevy::math::Rect::new(100.0, 100.0, 110.0, 110.0));
    let config = PatrolConfig {
        explicit_spawns: vec![[0.0, 0.0]],
        ..Default::default()
    };

    let report = plan_spawn_points(5, &arena, &ExclusionZones::empty(), &geometry, &config);
    assert!(report.points.is_empty());
    assert_eq!(report.min_spacing, None);
}

#[test]
fn test_occupied_sector_is_skipped() {
    let arena = arena_20();
    let geometry = StaticGeometry::flat_arena(&arena);
    let config = PatrolConfig {
        // Внутри North ячейки
        explicit_spawns: vec![[1.0, -7.0]],
        ..Default::default()
    };

    let report = plan_spawn_points(5, &arena, &ExclusionZones::empty(), &geometry, &config);

    assert_eq!(report.points.len(), 5);
    assert_eq!(report.count_from(PlacementStage::Sector(Sector::North)), 0);
    assert_eq!(report.count_from(PlacementStage::Sector(Sector::Center)), 1);
}

#[test]
fn test_planner_is_idempotent() {
    let arena = arena_20();
    let geometry = StaticGeometry::flat_arena(&arena)
        .with_block(Block::solid(Vec3::new(-1.0, 0.0, -1.0), Vec3::new(1.0, 2.0, 1.0)));
    let zones = ExclusionZones::from_regions([ExclusionRegion::new("pit", Vec2::new(5.0, -1.0), Vec2::new(7.0, 1.0))]);
    let config = PatrolConfig {
        normalized_spawns: vec![[0.0, 0.0]],
        ..Default::default()
    };

    let first = plan_spawn_points(5, &arena, &zones, &geometry, &config);
    let second = plan_spawn_points(5, &arena, &zones, &geometry, &config);

    assert_eq!(first.points.len(), second.points.len());
    for point in first.points.iter().chain(second.points.iter()) {
        assert_valid_spawn(point, &arena, &zones, &geometry, &config);
    }
}

#[test]
fn test_random_geometry_spawns_stay_valid() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    for _ in 0..20 {
        let arena = Arena::centered(rng.gen_range(12.0..40.0), rng.gen_range(12.0..40.0), 1.0);
        let (min, max) = arena.interior();

        let mut geometry = StaticGeometry::flat_arena(&arena);
        for _ in 0..rng.gen_range(0..6) {
            let corner = Vec3::new(rng.gen_range(min.x..max.x), 0.0, rng.gen_range(min.y..max.y));
            let size = Vec3::new(rng.gen_range(0.3..3.0), rng.gen_range(0.5..3.0), rng.gen_range(0.3..3.0));
            geometry = geometry.with_block(Block::solid(corner, corner + size));
        }

        let regions: Vec<_> = (0..rng.gen_range(0..4))
            .map(|i| {
                let corner = Vec2::new(rng.gen_range(min.x..max.x), rng.gen_range(min.y..max.y));
                ExclusionRegion::new(format!("zone_{i}"), corner, corner + Vec2::splat(rng.gen_range(0.5..4.0)))
            })
            .collect();
        let zones = ExclusionZones::from_regions(regions);

        let config = PatrolConfig {
            explicit_spawns: vec![[rng.gen_range(min.x..max.x), rng.gen_range(min.y..max.y)]],
            normalized_spawns: vec![[rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)]],
            ..Default::default()
        };

        let report = plan_spawn_points(5, &arena, &zones, &geometry, &config);
        assert!(report.points.len() <= 5);
        for point in &report.points {
            assert_valid_spawn(point, &arena, &zones, &geometry, &config);
        }
    }
}

#[test]
fn test_min_pairwise_spacing() {
    assert_eq!(min_pairwise_spacing(&[]), None);
    assert_eq!(min_pairwise_spacing(&[Vec3::ZERO]), None);

    let spacing = min_pairwise_spacing(&[
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(3.0, 5.0, 4.0),
        Vec3::new(10.0, 0.0, 0.0),
    ])
    .unwrap();
    // Y игнорируется
    assert!((spacing - 5.0).abs() < 1e-5);
}

#[test]
fn test_evaluate_lands_on_top_of_tall_geometry() {
    let arena = arena_20();
    // Башня выше любой "фиксированной" высоты старта луча
    let geometry = StaticGeometry::flat_arena(&arena)
        .with_block(Block::solid(Vec3::new(-3.0, 0.0, -3.0), Vec3::new(3.0, 150.0, 3.0)));
    let zones = ExclusionZones::empty();
    let config = PatrolConfig::default();
    let planner = PlacementPlanner::new(&arena, &zones, &geometry, &config);

    let candidate = planner.evaluate(Vec2::ZERO).expect("tower top is walkable");
    assert!((candidate.point.y - (150.0 + config.spawn_altitude)).abs() < 1e-4);
    assert_eq!(candidate.point.x, 0.0);
    assert_eq!(candidate.point.z, 0.0);

    let floor = planner.evaluate(Vec2::new(6.0, 6.0)).expect("floor");
    assert!((floor.point.y - config.spawn_altitude).abs() < 1e-5);
}
