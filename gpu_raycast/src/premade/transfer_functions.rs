use crate::{
    common::ValueRange,
    transfer::{ColorSource, ColorTransferFunction, PiecewiseFunction, Shading, VolumeProperty},
};

/// Linear gray ramp over `range`, opacity rising with the value.
pub fn gray_ramp(range: ValueRange) -> VolumeProperty {
    let ramp = [(range.low, 0.0), (range.high, 1.0)];
    VolumeProperty::new(
        ColorSource::Gray(PiecewiseFunction::from_points(&ramp)),
        PiecewiseFunction::from_points(&ramp),
    )
}

/// CT preset, Hounsfield units.
/// Soft tissue is faint, bone is opaque and ivory colored.
pub fn ct_bone() -> VolumeProperty {
    let color = ColorTransferFunction::from_points(&[
        (-3024.0, [0.0, 0.0, 0.0]),
        (-16.0, [0.73, 0.25, 0.30]),
        (641.0, [0.90, 0.82, 0.56]),
        (3071.0, [1.0, 1.0, 1.0]),
    ]);
    let opacity = PiecewiseFunction::from_points(&[
        (-3024.0, 0.0),
        (-16.0, 0.0),
        (641.0, 0.72),
        (3071.0, 0.71),
    ]);

    VolumeProperty::new(ColorSource::Rgb(color), opacity).with_shading(Shading {
        ambient: 0.2,
        diffuse: 1.0,
        specular: 0.0,
        specular_power: 1.0,
    })
}

/// MRI preset for 12 bit data, edges emphasized by gradient opacity.
pub fn mri() -> VolumeProperty {
    let color = ColorTransferFunction::from_points(&[
        (0.0, [0.0, 0.0, 0.0]),
        (20.0, [0.17, 0.0, 0.0]),
        (40.0, [0.78, 0.78, 0.64]),
        (4095.0, [1.0, 1.0, 1.0]),
    ]);
    let opacity = PiecewiseFunction::from_points(&[(0.0, 0.0), (20.0, 0.0), (40.0, 0.15), (120.0, 0.3), (4095.0, 0.4)]);
    let gradient = PiecewiseFunction::from_points(&[(0.0, 0.0), (90.0, 0.5), (100.0, 1.0)]);

    VolumeProperty::new(ColorSource::Rgb(color), opacity).with_gradient_opacity(gradient)
}
