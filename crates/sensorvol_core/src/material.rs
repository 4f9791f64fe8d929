//! Surface materials for sensor volumes
//!
//! A [`Material`] carries a stable identity, its uniform values, and the WGSL
//! snippet that defines `sensor_material`. Re-resolving a [`MaterialProperty`]
//! against an existing material of the same kind keeps the identity and only
//! refreshes uniforms, so downstream shader caches are not invalidated every
//! frame.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::color::Color;
use crate::property::{value_or_default, PropertyRef};
use crate::time::SimTime;

/// Stable identity of a material instance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(u64);

impl MaterialId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        MaterialId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

/// WGSL for the solid color material; reads the color from the shared uniform block
pub const COLOR_MATERIAL_SOURCE: &str = "\
fn sensor_material(input: MaterialInput) -> MaterialOutput {
    var out: MaterialOutput;
    out.diffuse = u.material_color.rgb;
    out.alpha = u.material_color.a;
    return out;
}
";

/// Default color used when no material is supplied
pub const DEFAULT_MATERIAL_COLOR: Color = Color::new(1.0, 0.0, 0.0, 0.5);

/// Shading model family of a material
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MaterialKind {
    /// Uniform color
    Color,
    /// User supplied WGSL `sensor_material` function
    Custom { name: Arc<str> },
}

/// A resolved surface material
#[derive(Clone, Debug, PartialEq)]
pub struct Material {
    id: MaterialId,
    kind: MaterialKind,
    color: Color,
    shader_source: Arc<str>,
    translucent: Option<bool>,
}

impl Default for Material {
    fn default() -> Self {
        Self::color(DEFAULT_MATERIAL_COLOR)
    }
}

impl Material {
    /// Solid color material with a fresh identity
    pub fn color(color: Color) -> Self {
        Self {
            id: MaterialId::next(),
            kind: MaterialKind::Color,
            color,
            shader_source: Arc::from(COLOR_MATERIAL_SOURCE),
            translucent: None,
        }
    }

    /// Material from a custom WGSL snippet defining `sensor_material`
    pub fn custom(
        name: impl Into<Arc<str>>,
        source: impl Into<Arc<str>>,
        translucent: bool,
    ) -> Self {
        Self {
            id: MaterialId::next(),
            kind: MaterialKind::Custom { name: name.into() },
            color: Color::WHITE,
            shader_source: source.into(),
            translucent: Some(translucent),
        }
    }

    pub fn id(&self) -> MaterialId {
        self.id
    }

    pub fn kind(&self) -> &MaterialKind {
        &self.kind
    }

    pub fn color_uniform(&self) -> Color {
        self.color
    }

    /// Update the color uniform; identity is unchanged
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn shader_source(&self) -> &str {
        &self.shader_source
    }

    /// Whether this material requires blending
    pub fn is_translucent(&self) -> bool {
        self.translucent.unwrap_or_else(|| self.color.is_translucent())
    }
}

/// Time-varying material description
#[derive(Clone, Debug)]
pub enum MaterialProperty {
    Color(PropertyRef<Color>),
    Custom {
        name: Arc<str>,
        source: Arc<str>,
        translucent: bool,
    },
}

impl MaterialProperty {
    /// Resolve at `time`, reusing `existing` when its kind matches
    pub fn resolve(&self, time: SimTime, existing: Option<&Material>) -> Material {
        match self {
            MaterialProperty::Color(color) => {
                let color = value_or_default(Some(color), time, Color::WHITE);
                match existing {
                    Some(m) if m.kind == MaterialKind::Color => {
                        let mut m = m.clone();
                        m.set_color(color);
                        m
                    }
                    _ => Material::color(color),
                }
            }
            MaterialProperty::Custom { name, source, translucent } => match existing {
                Some(m) if matches!(&m.kind, MaterialKind::Custom { name: n } if n == name)
                    && &m.shader_source == source
                    && m.translucent == Some(*translucent) =>
                {
                    m.clone()
                }
                _ => Material::custom(name.clone(), source.clone(), *translucent),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::constant;
    use crate::time::parse_time;

    fn t0() -> SimTime {
        parse_time("2024-01-01T00:00:00Z").unwrap()
    }

    #[test]
    fn test_default_material_is_translucent_red() {
        let m = Material::default();
        assert!(m.is_translucent());
        assert_eq!(m.color_uniform(), DEFAULT_MATERIAL_COLOR);
        assert!(m.shader_source().contains("fn sensor_material"));
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(Material::default().id(), Material::default().id());
    }

    #[test]
    fn test_resolve_keeps_identity_for_same_kind() {
        let prop = MaterialProperty::Color(constant(Color::WHITE));
        let first = prop.resolve(t0(), None);
        let translucent_red = MaterialProperty::Color(constant(Color::RED.with_alpha(0.2)));
        let again = translucent_red.resolve(t0(), Some(&first));
        assert_eq!(first.id(), again.id());
        assert!(again.is_translucent());
        assert!(!first.is_translucent());
    }

    #[test]
    fn test_resolve_new_identity_on_kind_change() {
        let color = MaterialProperty::Color(constant(Color::WHITE)).resolve(t0(), None);
        let custom = MaterialProperty::Custom {
            name: Arc::from("stripes"),
            source: Arc::from(
                "fn sensor_material(input: MaterialInput) -> MaterialOutput { \
                 var o: MaterialOutput; return o; }",
            ),
            translucent: true,
        };
        let resolved = custom.resolve(t0(), Some(&color));
        assert_ne!(resolved.id(), color.id());
        assert!(resolved.is_translucent());
        assert_eq!(custom.resolve(t0(), Some(&resolved)).id(), resolved.id());
    }
}
