use super::Technique;
use crate::{
    error::{RaycastError, RaycastResult},
    volumetric::DEFAULT_INTERNAL_VOLUME_SIZE,
};

/// Tunables of the GPU ray cast mapper
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapperOptions {
    /// Initial number of samples along the texture diagonal, adapted per frame
    pub ray_steps: f32,
    /// Edge of the voxel budget cube for resampling
    pub internal_volume_size: usize,
    pub technique: Technique,
    pub icpe_scale: f32,
    pub icpe_smoothness: f32,
    /// Strength of the fading of samples far from the eye, 0 disables it
    pub distance_color_blending: f32,
    /// Samples below this scalar are skipped until the first one at or above it
    pub depth_peeling_threshold: f32,
    /// Desired frames per second
    pub framerate: f32,
}

impl Default for MapperOptions {
    fn default() -> Self {
        MapperOptions {
            ray_steps: 500.0,
            internal_volume_size: DEFAULT_INTERNAL_VOLUME_SIZE,
            technique: Technique::Composite,
            icpe_scale: 1.0,
            icpe_smoothness: 0.5,
            distance_color_blending: 0.0,
            depth_peeling_threshold: 0.0,
            framerate: 5.0,
        }
    }
}

impl MapperOptions {
    pub fn builder() -> MapperOptionsBuilder {
        MapperOptionsBuilder::default()
    }

    /// Check ranges of all values
    pub fn validate(&self) -> RaycastResult<()> {
        let finite = [
            ("ray_steps", self.ray_steps),
            ("icpe_scale", self.icpe_scale),
            ("icpe_smoothness", self.icpe_smoothness),
            ("distance_color_blending", self.distance_color_blending),
            ("depth_peeling_threshold", self.depth_peeling_threshold),
            ("framerate", self.framerate),
        ];
        if let Some((name, _)) = finite.iter().find(|(_, v)| !v.is_finite()) {
            return Err(RaycastError::invalid(format!("{} must be finite", name)));
        }
        if self.ray_steps <= 0.0 {
            return Err(RaycastError::invalid("ray_steps must be positive"));
        }
        if self.internal_volume_size < 2 {
            return Err(RaycastError::invalid("internal_volume_size must be at least 2"));
        }
        if self.icpe_scale < 0.0 || self.icpe_smoothness < 0.0 {
            return Err(RaycastError::invalid("ICPE parameters must not be negative"));
        }
        if self.distance_color_blending < 0.0 {
            return Err(RaycastError::invalid(
                "distance_color_blending must not be negative",
            ));
        }
        Ok(())
    }
}

/// Builder of [`MapperOptions`], starts from the defaults
#[derive(Debug, Clone, Default)]
pub struct MapperOptionsBuilder {
    options: MapperOptions,
}

impl MapperOptionsBuilder {
    pub fn ray_steps(mut self, ray_steps: f32) -> Self {
        self.options.ray_steps = ray_steps;
        self
    }

    pub fn internal_volume_size(mut self, size: usize) -> Self {
        self.options.internal_volume_size = size;
        self
    }

    pub fn technique(mut self, technique: Technique) -> Self {
        self.options.technique = technique;
        self
    }

    pub fn icpe_scale(mut self, scale: f32) -> Self {
        self.options.icpe_scale = scale;
        self
    }

    pub fn icpe_smoothness(mut self, smoothness: f32) -> Self {
        self.options.icpe_smoothness = smoothness;
        self
    }

    pub fn distance_color_blending(mut self, blending: f32) -> Self {
        self.options.distance_color_blending = blending;
        self
    }

    pub fn depth_peeling_threshold(mut self, threshold: f32) -> Self {
        self.options.depth_peeling_threshold = threshold;
        self
    }

    pub fn framerate(mut self, framerate: f32) -> Self {
        self.options.framerate = framerate;
        self
    }

    pub fn build(self) -> RaycastResult<MapperOptions> {
        self.options.validate()?;
        Ok(self.options)
    }

    /// Skip validation
    pub fn build_unchecked(self) -> MapperOptions {
        self.options
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn defaults() {
        let options = MapperOptions::builder().build().unwrap();

        assert_eq!(options, MapperOptions::default());
        assert_eq!(options.ray_steps, 500.0);
        assert_eq!(options.internal_volume_size, 256);
        assert_eq!(options.icpe_smoothness, 0.5);
        assert_eq!(options.framerate, 5.0);
    }

    #[test]
    fn builder_sets_values() {
        let options = MapperOptions::builder()
            .technique(Technique::Mip)
            .ray_steps(800.0)
            .depth_peeling_threshold(12.0)
            .build()
            .unwrap();

        assert_eq!(options.technique, Technique::Mip);
        assert_eq!(options.ray_steps, 800.0);
        assert_eq!(options.depth_peeling_threshold, 12.0);
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(MapperOptions::builder().ray_steps(0.0).build().is_err());
        assert!(MapperOptions::builder().ray_steps(f32::NAN).build().is_err());
        assert!(MapperOptions::builder().internal_volume_size(1).build().is_err());
        assert!(MapperOptions::builder().icpe_scale(-1.0).build().is_err());

        let unchecked = MapperOptions::builder().ray_steps(0.0).build_unchecked();
        assert_eq!(unchecked.ray_steps, 0.0);
    }
}
