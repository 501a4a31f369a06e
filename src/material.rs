//! Surface materials and the named-property bag mesh instances carry.

use std::collections::HashMap;

use glam::Vec3;

use crate::error::{Error, Result};

/// Shading parameters for one primitive.
///
/// Immutable once assigned; duplicated per triangle during extraction rather
/// than shared.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Diffuse reflectance, each channel in [0, 1].
    pub albedo: Vec3,
    /// Specular reflectance, each channel in [0, 1].
    pub specular: Vec3,
    /// Glossiness in [0, 1]; 1 = mirror-sharp highlights.
    pub smoothness: f32,
    /// Emitted radiance scale, >= 0. Zero for non-emissive surfaces.
    pub emission: f32,
}

impl Material {
    pub const PROP_ALBEDO: &'static str = "albedo";
    pub const PROP_SPECULAR: &'static str = "specular";
    pub const PROP_SMOOTHNESS: &'static str = "smoothness";
    pub const PROP_EMISSION: &'static str = "emission";
}

/// One value in a [`MaterialProperties`] bag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyValue {
    Color(Vec3),
    Scalar(f32),
}

/// Named shading properties attached to a mesh instance.
///
/// Extraction resolves the four required properties into a [`Material`];
/// a missing or wrongly-typed entry is an extraction-time error for that
/// instance, never silently zero-filled.
#[derive(Debug, Clone, Default)]
pub struct MaterialProperties {
    values: HashMap<String, PropertyValue>,
}

impl MaterialProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fully-populated bag, the common case for hosts that own their data.
    pub fn with_standard(albedo: Vec3, specular: Vec3, smoothness: f32, emission: f32) -> Self {
        let mut props = Self::new();
        props.set_color(Material::PROP_ALBEDO, albedo);
        props.set_color(Material::PROP_SPECULAR, specular);
        props.set_scalar(Material::PROP_SMOOTHNESS, smoothness);
        props.set_scalar(Material::PROP_EMISSION, emission);
        props
    }

    pub fn set_color(&mut self, name: impl Into<String>, value: Vec3) {
        self.values.insert(name.into(), PropertyValue::Color(value));
    }

    pub fn set_scalar(&mut self, name: impl Into<String>, value: f32) {
        self.values.insert(name.into(), PropertyValue::Scalar(value));
    }

    /// Look up a color property. Errors name the instance for reporting.
    pub fn color(&self, instance: &str, name: &str) -> Result<Vec3> {
        match self.values.get(name) {
            Some(PropertyValue::Color(v)) => Ok(*v),
            _ => Err(Error::missing_material(instance, name)),
        }
    }

    /// Look up a scalar property. Errors name the instance for reporting.
    pub fn scalar(&self, instance: &str, name: &str) -> Result<f32> {
        match self.values.get(name) {
            Some(PropertyValue::Scalar(v)) => Ok(*v),
            _ => Err(Error::missing_material(instance, name)),
        }
    }

    /// Resolve the four required properties into a [`Material`].
    pub fn resolve(&self, instance: &str) -> Result<Material> {
        Ok(Material {
            albedo: self.color(instance, Material::PROP_ALBEDO)?,
            specular: self.color(instance, Material::PROP_SPECULAR)?,
            smoothness: self.scalar(instance, Material::PROP_SMOOTHNESS)?,
            emission: self.scalar(instance, Material::PROP_EMISSION)?,
        })
    }
}
