//! Collision groups для hit-proxy патрульных агентов
//!
//! ## Слои (битовая маска):
//! - Layer 2 (0b10): Actors (игрок, NPC)
//! - Layer 3 (0b100): Environment (статическая геометрия арены)
//! - Layer 4 (0b1000): Projectiles
//! - Layer 7 (0b1000000): Patrol proxies (sensor hitbox патрульных агентов)
//!
//! Proxy — sensor: сам ни с чем не коллидит физически, но projectiles и
//! targeting raycast его видят через свою маску.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::components::{PatrolAgent, PatrolProxy};

pub const COLLISION_LAYER_ACTORS: u32 = 0b10;
pub const COLLISION_LAYER_ENVIRONMENT: u32 = 0b100;
pub const COLLISION_LAYER_PROJECTILES: u32 = 0b1000;
pub const COLLISION_LAYER_PATROL: u32 = 0b100_0000;

/// Mask: с чем proxy пересекается (projectiles + targeting rays от actors)
pub const COLLISION_MASK_PATROL: u32 = COLLISION_LAYER_PROJECTILES | COLLISION_LAYER_ACTORS;

/// Mask для targeting raycast внешних систем (patrol + environment для LOS)
pub const COLLISION_MASK_PATROL_TARGETING: u32 = COLLISION_LAYER_PATROL | COLLISION_LAYER_ENVIRONMENT;

pub fn patrol_proxy_groups() -> CollisionGroups {
    CollisionGroups::new(
        Group::from_bits_truncate(COLLISION_LAYER_PATROL),
        Group::from_bits_truncate(COLLISION_MASK_PATROL),
    )
}

/// Bundle hit-proxy entity для агента
///
/// Collider = AABB агента (cuboid по half extents), sensor.
pub fn patrol_proxy_bundle(agent: &PatrolAgent) -> impl Bundle {
    let half = agent.bounds.half_extents();
    (
        PatrolProxy { agent: agent.id },
        Name::new(format!("PatrolProxy({})", agent.id)),
        Transform::from_translation(agent.position).with_rotation(agent.rotation()),
        Collider::cuboid(half.x, half.y, half.z),
        Sensor,
        patrol_proxy_groups(),
    )
}

/// Название слоя для debug логов
pub fn get_layer_name(layer_bits: u32) -> &'static str {
    match layer_bits {
        COLLISION_LAYER_ACTORS => "Actors",
        COLLISION_LAYER_ENVIRONMENT => "Environment",
        COLLISION_LAYER_PROJECTILES => "Projectiles",
        COLLISION_LAYER_PATROL => "Patrol",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patrol_layer_is_distinct() {
        assert_eq!(COLLISION_LAYER_PATROL & COLLISION_LAYER_ACTORS, 0);
        assert_eq!(COLLISION_LAYER_PATROL & COLLISION_LAYER_ENVIRONMENT, 0);
        assert_eq!(get_layer_name(COLLISION_LAYER_PATROL), "Patrol");
        assert_ne!(COLLISION_MASK_PATROL_TARGETING & COLLISION_LAYER_PATROL, 0);
    }

    #[test]
    fn test_proxy_groups_bits() {
        let groups = patrol_proxy_groups();
        assert_eq!(groups.memberships.bits(), COLLISION_LAYER_PATROL);
        assert_eq!(groups.filters.bits(), COLLISION_MASK_PATROL);
    }
}
