//! Headless патрульная симуляция VOIDRUN
//!
//! Демо арена: стены, колонна, навес, запретная зона. 1000 тиков,
//! на середине "стреляем" в первого агента через PatrolHit.
//!
//! Опционально: путь к JSON конфигу первым аргументом.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::time::Duration;

use voidrun_patrol::{
    create_headless_app, log_error, log_info, Arena, Block, ExclusionRegion, ExclusionZones, PatrolConfig,
    PatrolDebug, PatrolGeometry, PatrolHit, PatrolRegistry, StaticGeometry,
};

fn load_config() -> PatrolConfig {
    let Some(path) = std::env::args().nth(1) else {
        return PatrolConfig::default();
    };

    let loaded = std::fs::read_to_string(&path)
        .map_err(|err| err.to_string())
        .and_then(|json| PatrolConfig::from_json(&json).map_err(|err| err.to_string()));

    match loaded {
        Ok(config) => config,
        Err(err) => {
            log_error(&format!("Config {}: {} (using defaults)", path, err));
            PatrolConfig::default()
        }
    }
}

fn demo_geometry(arena: &Arena) -> StaticGeometry {
    StaticGeometry::flat_arena(arena)
        // Стена восточного коридора
        .with_block(Block::solid(Vec3::new(6.0, 0.0, -4.0), Vec3::new(6.5, 3.0, 4.0)))
        // Колонна у центра
        .with_block(Block::solid(Vec3::new(-1.5, 0.0, 2.0), Vec3::new(-0.5, 3.0, 3.0)))
        // Низкий навес над северо-западом
        .with_block(Block::solid(Vec3::new(-12.0, 1.4, -12.0), Vec3::new(-8.0, 1.7, -8.0)))
}

fn main() {
    println!("Starting VOIDRUN patrol simulation");

    let config = load_config();
    let mut app = create_headless_app();
    app.insert_resource(config.clone())
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(1.0 / 60.0)));

    // Арена ещё не готова → planner откладывает
    for _ in 0..3 {
        app.update();
    }

    let arena = config.arena(-15.0, 15.0, -15.0, 15.0);
    app.insert_resource(arena)
        .insert_resource(PatrolGeometry::new(demo_geometry(&arena)))
        .insert_resource(ExclusionZones::from_regions([ExclusionRegion::new(
            "reactor",
            Vec2::new(7.0, 7.0),
            Vec2::new(10.0, 10.0),
        )]));

    // Запускаем 1000 тиков симуляции
    for tick in 0..1000 {
        app.update();

        // PatrolDebug появляется после первого кадра с готовой ареной
        if tick == 0 {
            if let Some(mut debug) = app.world_mut().get_resource_mut::<PatrolDebug>() {
                debug.log_enabled = true;
            }
        }

        if tick == 500 {
            let target = app
                .world()
                .resource::<PatrolRegistry>()
                .alive_agents()
                .first()
                .and_then(|proxy| proxy.proxy);
            if let Some(proxy) = target {
                app.world_mut().send_event(PatrolHit { proxy });
            }
        }

        if tick % 100 == 0 {
            let registry = app.world().resource::<PatrolRegistry>();
            println!("Tick {}: {}/{} patrol agents alive", tick, registry.alive_count(), registry.len());
        }
    }

    if let Some(debug) = app.world().get_resource::<PatrolDebug>() {
        let snapshot = debug.snapshot(app.world().resource::<PatrolRegistry>());
        log_info(&format!("Final: {:?}", snapshot));
    }

    println!("Simulation complete!");
}
