//! Exclusion Zone Resolver
//!
//! Строится ОДИН раз из именованных регионов: каждый регион раздувается на
//! `EXCLUSION_PADDING` за свои границы. Опционально — precise mask predicate
//! (луч вниз: если ближайшая поверхность под точкой принадлежит masked геометрии
//! и заметно выше ground reference — точка запрещена).
//!
//! После построения только читается (планировщик + патруль).

use bevy::math::Rect;
use bevy::prelude::*;
use std::sync::Arc;

/// Padding вокруг каждого source региона (метры)
pub const EXCLUSION_PADDING: f32 = 0.4;

/// Насколько masked поверхность должна быть выше ground reference
pub const MASK_HEIGHT_EPSILON: f32 = 0.05;

/// Сэмпл поверхности под точкой (для precise mask)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskSample {
    pub height: f32,
    /// Поверхность принадлежит masked геометрии
    pub masked: bool,
}

/// Precise mask predicate поверх геометрии
pub trait ExclusionMask: Send + Sync {
    /// Ближайшая поверхность под (x, z), луч сверху вниз
    fn surface_below(&self, x: f32, z: f32) -> Option<MaskSample>;
}

/// Именованный source регион (до inflation)
#[derive(Debug, Clone, PartialEq)]
pub struct ExclusionRegion {
    pub name: String,
    pub min: Vec2,
    pub max: Vec2,
}

impl ExclusionRegion {
    pub fn new(name: impl Into<String>, min: Vec2, max: Vec2) -> Self {
        Self {
            name: name.into(),
            min: min.min(max),
            max: max.max(min),
        }
    }
}

#[derive(Clone)]
struct InflatedRect {
    name: String,
    rect: Rect,
}

/// Resource: запретные зоны арены
///
/// Присутствие resource = exclusion data готова (планировщик ждёт её).
#[derive(Resource, Clone, Default)]
pub struct ExclusionZones {
    rects: Vec<InflatedRect>,
    mask: Option<Arc<dyn ExclusionMask>>,
    /// Высота "земли" для mask сравнения
    ground_reference: f32,
}

impl ExclusionZones {
    /// Без зон (ничего не запрещено)
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_regions(regions: impl IntoIterator<Item = ExclusionRegion>) -> Self {
        let rects = regions
            .into_iter()
            .map(|region| {
                let pad = Vec2::splat(EXCLUSION_PADDING);
                InflatedRect {
                    rect: Rect::from_corners(region.min - pad, region.max + pad),
                    name: region.name,
                }
            })
            .collect();

        Self {
            rects,
            ..Default::default()
        }
    }

    pub fn with_mask(mut self, mask: Arc<dyn ExclusionMask>, ground_reference: f32) -> Self {
        self.mask = Some(mask);
        self.ground_reference = ground_reference;
        self
    }

    pub fn region_count(&self) -> usize {
        self.rects.len()
    }

    pub fn has_mask(&self) -> bool {
        self.mask.is_some()
    }

    /// Inflated прямоугольник по индексу (для debug/тестов)
    pub fn rect(&self, index: usize) -> Option<Rect> {
        self.rects.get(index).map(|r| r.rect)
    }

    /// Имя первого региона, содержащего точку
    pub fn region_at(&self, x: f32, z: f32) -> Option<&str> {
        let point = Vec2::new(x, z);
        self.rects
            .iter()
            .find(|r| r.rect.contains(point))
            .map(|r| r.name.as_str())
    }

    pub fn is_excluded(&self, x: f32, z: f32) -> bool {
        if self.region_at(x, z).is_some() {
            return true;
        }

        let Some(mask) = self.mask.as_ref() else {
            return false;
        };

        match mask.surface_below(x, z) {
            Some(sample) => sample.masked && sample.height > self.ground_reference + MASK_HEIGHT_EPSILON,
            None => false,
        }
    }
}

impl std::fmt::Debug for ExclusionZones {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExclusionZones")
            .field("regions", &self.rects.iter().map(|r| (&r.name, r.rect)).collect::<Vec<_>>())
            .field("mask", &self.mask.is_some())
            .field("ground_reference", &self.ground_reference)
            .finish()
    }
}
