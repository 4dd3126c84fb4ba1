use super::{ColorTransferFunction, PiecewiseFunction};

/// Texture filtering of the volume textures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    Nearest,
    #[default]
    Linear,
}

/// Color mapping of the property, gray or RGB.
#[derive(Debug, Clone)]
pub enum ColorSource {
    Gray(PiecewiseFunction),
    Rgb(ColorTransferFunction),
}

impl ColorSource {
    pub fn channels(&self) -> usize {
        match self {
            ColorSource::Gray(_) => 1,
            ColorSource::Rgb(_) => 3,
        }
    }

    pub fn stamp(&self) -> crate::common::Stamp {
        match self {
            ColorSource::Gray(f) => f.stamp(),
            ColorSource::Rgb(f) => f.stamp(),
        }
    }

    /// `n` RGB entries sampled over `[min, max]`, gray replicated into all channels.
    pub fn sample_table(&self, min: f64, max: f64, n: usize) -> Vec<[f32; 3]> {
        match self {
            ColorSource::Gray(f) => f
                .sample_table(min, max, n)
                .into_iter()
                .map(|v| [v, v, v])
                .collect(),
            ColorSource::Rgb(f) => f.sample_table(min, max, n),
        }
    }
}

/// Lighting coefficients of the volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shading {
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub specular_power: f32,
}

impl Default for Shading {
    fn default() -> Self {
        Shading {
            ambient: 0.3,
            diffuse: 0.6,
            specular: 0.5,
            specular_power: 40.0,
        }
    }
}

/// Appearance of a volume: transfer functions, shading and filtering.
#[derive(Debug, Clone)]
pub struct VolumeProperty {
    pub color: ColorSource,
    pub scalar_opacity: PiecewiseFunction,
    pub gradient_opacity: PiecewiseFunction,
    pub scalar_opacity_unit_distance: f64,
    pub shading: Shading,
    pub interpolation: Interpolation,
}

impl VolumeProperty {
    pub fn new(color: ColorSource, scalar_opacity: PiecewiseFunction) -> VolumeProperty {
        VolumeProperty {
            color,
            scalar_opacity,
            gradient_opacity: PiecewiseFunction::from_points(&[(0.0, 1.0)]),
            scalar_opacity_unit_distance: 1.0,
            shading: Shading::default(),
            interpolation: Interpolation::default(),
        }
    }

    pub fn with_gradient_opacity(mut self, gradient_opacity: PiecewiseFunction) -> Self {
        self.gradient_opacity = gradient_opacity;
        self
    }

    pub fn with_shading(mut self, shading: Shading) -> Self {
        self.shading = shading;
        self
    }

    pub fn with_interpolation(mut self, interpolation: Interpolation) -> Self {
        self.interpolation = interpolation;
        self
    }

    pub fn color_channels(&self) -> usize {
        self.color.channels()
    }
}

impl Default for VolumeProperty {
    fn default() -> Self {
        VolumeProperty::new(
            ColorSource::Gray(PiecewiseFunction::from_points(&[(0.0, 0.0), (255.0, 1.0)])),
            PiecewiseFunction::from_points(&[(0.0, 0.0), (255.0, 1.0)]),
        )
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn gray_table_is_replicated() {
        let gray = ColorSource::Gray(PiecewiseFunction::from_points(&[(0.0, 0.0), (1.0, 1.0)]));

        assert_eq!(gray.channels(), 1);
        assert_eq!(gray.sample_table(0.0, 1.0, 2), vec![[0.0; 3], [1.0; 3]]);
    }

    #[test]
    fn default_gradient_opacity_is_flat() {
        let property = VolumeProperty::default();

        assert_eq!(property.gradient_opacity.value(0.0), 1.0);
        assert_eq!(property.gradient_opacity.value(1000.0), 1.0);
        assert_eq!(property.interpolation, Interpolation::Linear);
    }
}
