//! Patrol Controller — ping-pong движение одного агента за тик
//!
//! Состояние агента непрерывное (direction, base_direction, traveled_in_leg,
//! stalled_frames). Единственный дискретный переход — reversal.
//!
//! Порядок тика:
//! 1. Grace period после спавна → zero advance
//! 2. Проекция wished target на поверхность (нет поверхности → zero advance)
//! 3. Capsule sweep; блок/NaN → reversal (если с прошлого reversal не было
//!    ненулевого шага — без флипа, ждём stall rule). Re-project Y, hard clamp в interior
//!    (clamp сдвинул точку → reversal как от стены)
//! 4. Exclusion → reversal
//! 5. Wall/headroom → zero advance (без reversal)
//! 6. Bounds + facing
//!
//! Leg/anti-jitter правило после каждого тика: leg ≥ ping_pong_distance или
//! `STALL_REVERSAL_TICKS` нулевых тиков подряд → reversal.

use bevy::prelude::*;

use crate::components::PatrolAgent;
use crate::exclusion::ExclusionZones;
use crate::spatial::SpatialQuery;
use crate::{Arena, PatrolConfig};

/// Clamp delta time (секунды) — ограничивает смещение за тик при фризах
pub const MAX_TICK_DELTA: f32 = 0.05;

/// Сколько нулевых тиков подряд до reversal (меньше → вибрация у стен)
pub const STALL_REVERSAL_TICKS: u32 = 5;

/// Меньше этого — считаем что не сдвинулись
pub const MIN_ADVANCE_EPSILON: f32 = 1e-4;

/// Почему агент развернулся
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReversalCause {
    /// Sweep вернул ноль/NaN
    Blocked,
    /// Hard clamp в interior сдвинул точку
    ArenaClamp,
    /// Новая позиция в exclusion зоне
    Exclusion,
    /// Leg пройден целиком
    LegComplete,
    /// `STALL_REVERSAL_TICKS` нулевых тиков подряд
    Stalled,
}

/// Результат тика
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickOutcome {
    /// Пройденная XZ дистанция
    pub advance: f32,
    pub reversal: Option<ReversalCause>,
    /// Тик съеден grace period
    pub in_grace: bool,
}

/// Read-only окружение тика
#[derive(Clone, Copy)]
pub struct PatrolContext<'a> {
    pub arena: &'a Arena,
    pub zones: &'a ExclusionZones,
    pub spatial: &'a dyn SpatialQuery,
    pub config: &'a PatrolConfig,
}

impl<'a> PatrolContext<'a> {
    fn is_excluded(&self, point: Vec3) -> bool {
        self.zones.is_excluded(point.x, point.z) || self.spatial.is_inside_exclusion(point.x, point.z)
    }
}

/// Один тик агента (мутирует запись на месте)
pub fn step_agent(agent: &mut PatrolAgent, dt: f32, ctx: &PatrolContext) -> TickOutcome {
    if !agent.alive {
        return TickOutcome::default();
    }

    let dt = if dt.is_finite() { dt.clamp(0.0, MAX_TICK_DELTA) } else { 0.0 };
    agent.age += dt;

    if agent.age < ctx.config.grace_period {
        return TickOutcome {
            in_grace: true,
            ..Default::default()
        };
    }

    let desired = agent.speed * dt;
    let mut reversal = None;
    let advance = advance_agent(agent, desired, ctx, &mut reversal);

    // Leg / anti-jitter (reversal этого тика уже сбросил счётчики)
    agent.traveled_in_leg += advance;
    if reversal.is_some() {
        agent.stalled_frames = 0;
    } else if advance <= MIN_ADVANCE_EPSILON && desired > 0.0 {
        agent.stalled_frames += 1;
    } else {
        agent.stalled_frames = 0;
    }

    let leg_complete = agent.traveled_in_leg >= ctx.config.ping_pong_distance;
    let stalled = agent.stalled_frames >= STALL_REVERSAL_TICKS;
    if leg_complete || stalled {
        // Уже развернулись в этом тике — второй флип вернул бы назад
        if reversal.is_none() {
            agent.reverse();
            reversal = Some(if leg_complete {
                ReversalCause::LegComplete
            } else {
                ReversalCause::Stalled
            });
        }
        agent.traveled_in_leg = 0.0;
        agent.stalled_frames = 0;
    }

    agent.refresh_bounds();
    agent.face_direction();

    TickOutcome {
        advance,
        reversal,
        in_grace: false,
    }
}

/// Шаги 2–5: возвращает committed advance (0 если шаг не принят)
fn advance_agent(
    agent: &mut PatrolAgent,
    desired: f32,
    ctx: &PatrolContext,
    reversal: &mut Option<ReversalCause>,
) -> f32 {
    if desired <= 0.0 {
        return 0.0;
    }

    let direction = agent.direction.normalize_or_zero();
    if direction == Vec2::ZERO {
        return 0.0;
    }

    let origin = agent.position;
    let wished = Vec2::new(origin.x, origin.z) + direction * desired;

    let Some(surface) = ctx.spatial.project_to_surface(wished.x, wished.y, origin.y) else {
        return 0.0;
    };

    let wish = Vec3::new(surface.x - origin.x, 0.0, surface.z - origin.z);
    let half = Vec3::Y * ctx.config.capsule_half_height;
    let moved = ctx
        .spatial
        .sweep_capsule(origin - half, origin + half, ctx.config.capsule_radius, wish);

    let planar = Vec2::new(moved.x, moved.z);
    if !moved.is_finite() || planar.length() < MIN_ADVANCE_EPSILON {
        // Зажат с обеих сторон: следующий флип — по stall rule, не каждый кадр
        if agent.reversed_since_advance {
            return 0.0;
        }
        agent.reverse();
        *reversal = Some(ReversalCause::Blocked);
        return 0.0;
    }

    let mut next = origin + Vec3::new(planar.x, 0.0, planar.y);

    // Re-project Y (без вертикального дрейфа)
    let Some(ground) = ctx.spatial.project_to_surface(next.x, next.z, origin.y) else {
        return 0.0;
    };
    next.y = ground.y + ctx.config.spawn_altitude;

    let clamped = ctx.arena.clamp_to_interior(next);
    if Vec2::new(clamped.x - next.x, clamped.z - next.z).length() > 1e-6 {
        agent.reverse();
        *reversal = Some(ReversalCause::ArenaClamp);
        return 0.0;
    }

    if ctx.is_excluded(next) {
        agent.reverse();
        *reversal = Some(ReversalCause::Exclusion);
        return 0.0;
    }

    if !ctx.spatial.is_clear_of_walls(next, ctx.config.clearance_radius)
        || !ctx.spatial.has_headroom(next, ctx.config.headroom)
    {
        return 0.0;
    }

    agent.position = next;
    agent.reversed_since_advance = false;
    planar.length()
}
