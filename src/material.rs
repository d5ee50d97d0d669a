use std::collections::HashMap;

use serde::Serialize;

use crate::classify::Role;
use crate::options::StylePreset;
use crate::style::{Paint, Style};
use crate::types::Color;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    pub base_color: Color,
    pub alpha: f32,
    pub roughness: f32,
    pub metallic: f32,
    pub specular: f32,
    pub clearcoat: f32,
    pub is_transparent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_variation_strength: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bump_strength: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Surface {
    roughness: f32,
    metallic: f32,
    specular: f32,
    clearcoat: f32,
}

fn preset_surface(preset: StylePreset) -> Surface {
    let (roughness, metallic, specular, clearcoat) = match preset {
        StylePreset::Technical => (0.6, 0.0, 0.3, 0.0),
        StylePreset::Organic => (0.8, 0.0, 0.2, 0.0),
        StylePreset::Professional => (0.4, 0.1, 0.5, 0.1),
        StylePreset::Glossy => (0.15, 0.0, 0.7, 0.6),
        StylePreset::Metal => (0.3, 0.9, 0.6, 0.0),
    };
    Surface {
        roughness,
        metallic,
        specular,
        clearcoat,
    }
}

fn role_surface(role: Role, preset: StylePreset) -> Surface {
    let s = preset_surface(preset);
    match role {
        Role::PrimaryNode => s,
        Role::SecondaryNode => Surface {
            roughness: (s.roughness + 0.05).min(1.0),
            ..s
        },
        // Connectors read as wiring: shinier and more metallic.
        Role::Connector => Surface {
            roughness: s.roughness * 0.6,
            metallic: (s.metallic + 0.3).min(1.0),
            specular: (s.specular + 0.1).min(1.0),
            ..s
        },
        Role::Text => Surface {
            roughness: s.roughness * 0.5,
            clearcoat: s.clearcoat.max(0.1),
            ..s
        },
        Role::Decoration => Surface {
            roughness: (s.roughness + 0.1).min(1.0),
            ..s
        },
    }
}

/// Picks the channel that supplies the color: fill first, then stroke.
/// An unparseable paint on the chosen channel yields neutral gray.
fn base_color(style: &Style) -> (Color, f32) {
    let channel = |paint: &Paint, opacity: f32| match paint {
        Paint::Color(c) => Some((*c, opacity)),
        Paint::Invalid(_) => Some((Color::NEUTRAL_GRAY, opacity)),
        Paint::None | Paint::Unset => None,
    };
    channel(&style.fill, style.fill_alpha())
        .or_else(|| channel(&style.stroke, style.stroke_alpha()))
        .unwrap_or((Color::NEUTRAL_GRAY, 1.0))
}

pub fn assign(style: &Style, role: Role, preset: StylePreset) -> Material {
    let (color, channel_opacity) = base_color(style);
    let alpha = (style.opacity * channel_opacity).clamp(0.0, 1.0);
    let surface = role_surface(role, preset);
    let professional_primary = role == Role::PrimaryNode && preset == StylePreset::Professional;
    Material {
        base_color: color,
        alpha,
        roughness: surface.roughness,
        metallic: surface.metallic,
        specular: surface.specular,
        clearcoat: surface.clearcoat,
        is_transparent: alpha < 1.0,
        color_variation_strength: professional_primary.then_some(0.05),
        bump_strength: professional_primary.then_some(0.02),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct MaterialKey {
    color: [u32; 3],
    alpha: u32,
    role: Role,
}

/// Per-run material table. Equal (color, opacity, role) triples share one entry.
#[derive(Debug)]
pub struct MaterialCache {
    preset: StylePreset,
    index: HashMap<MaterialKey, usize>,
    materials: Vec<Material>,
    hits: usize,
}

impl MaterialCache {
    pub fn new(preset: StylePreset) -> Self {
        Self {
            preset,
            index: HashMap::new(),
            materials: Vec::new(),
            hits: 0,
        }
    }

    /// Index of the material for `style` under `role`, creating it on first use.
    pub fn material_for(&mut self, style: &Style, role: Role) -> usize {
        let (color, channel_opacity) = base_color(style);
        let alpha = (style.opacity * channel_opacity).clamp(0.0, 1.0);
        let key = MaterialKey {
            color: [color.r.to_bits(), color.g.to_bits(), color.b.to_bits()],
            alpha: alpha.to_bits(),
            role,
        };
        if let Some(&idx) = self.index.get(&key) {
            self.hits += 1;
            return idx;
        }
        let idx = self.materials.len();
        self.materials.push(assign(style, role, self.preset));
        self.index.insert(key, idx);
        idx
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn into_materials(self) -> Vec<Material> {
        self.materials
    }
}
