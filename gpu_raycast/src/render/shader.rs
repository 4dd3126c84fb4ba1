//! GLSL source generation for the ray casting program
//!
//! The fragment shader is assembled from small pieces chosen by the
//! rendering technique and by how voxel components are packed into the
//! textures. Texture units: `TextureVol` 7, `TextureVol1` 5,
//! `TextureColorLookup` 6.

use log::{debug, error};

use super::gl::{GraphicsContext, ProgramHandle, ShaderHandle, ShaderStage};
use crate::error::{RaycastError, RaycastResult};

/// Ray casting technique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Technique {
    /// Front to back compositing with Blinn-Phong shading
    #[default]
    Composite = 0,
    /// Compositing shaded by the angle between normal and view direction
    EdgeColoring = 1,
    /// Maximum intensity projection
    Mip = 2,
    /// Minimum intensity projection
    MinIp = 3,
    /// Compositing with opacity scaled by gradient magnitude
    GradientModulated = 4,
    /// Illustrative context preserving exploration
    Icpe = 5,
}

impl Technique {
    pub const ALL: [Technique; 6] = [
        Technique::Composite,
        Technique::EdgeColoring,
        Technique::Mip,
        Technique::MinIp,
        Technique::GradientModulated,
        Technique::Icpe,
    ];

    pub fn from_index(index: usize) -> Option<Technique> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Normals are sampled by every technique except the projections
    pub fn needs_normals(self) -> bool {
        !matches!(self, Technique::Mip | Technique::MinIp)
    }

    /// Opacity is weighted by the gradient magnitude
    pub fn uses_gradient_magnitude(self) -> bool {
        matches!(self, Technique::GradientModulated | Technique::Icpe)
    }

    pub fn uses_lighting(self) -> bool {
        matches!(
            self,
            Technique::Composite | Technique::GradientModulated | Technique::Icpe
        )
    }
}

/// How voxel components map onto the textures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorLayout {
    /// One scalar in `.x`, gradient magnitude in `.w`
    Scalar,
    /// Color scalar in `.x`, opacity scalar in `.y`
    ScalarPair,
    /// Color in `TextureVol`, gradient magnitude in `TextureVol1.w`
    Rgba,
}

impl ColorLayout {
    pub fn from_components(components: usize) -> RaycastResult<ColorLayout> {
        match components {
            1 => Ok(ColorLayout::Scalar),
            2 => Ok(ColorLayout::ScalarPair),
            3 | 4 => Ok(ColorLayout::Rgba),
            n => Err(RaycastError::invalid(format!(
                "unsupported component count {}",
                n
            ))),
        }
    }
}

const VERTEX_SHADER: &str = "\
varying vec3 ViewDir;
void main()
{
    gl_Position = ftransform();
    gl_TexCoord[0] = gl_Color;
    ViewDir = vec3(gl_ModelViewMatrix * gl_Vertex);
}
";

const HEADER: &str = "\
varying vec3 ViewDir;
uniform sampler3D TextureVol;
uniform sampler3D TextureVol1;
uniform sampler2D TextureColorLookup;
uniform mat4 ParaMatrix;
uniform mat4 VolumeMatrix;

//ParaMatrix:
//EyePos.x,      EyePos.y,      EyePos.z,     Step
//VolBBoxLow.x,  VolBBoxLow.y,  VolBBoxLow.z, VolBBoxHigh.x
//VolBBoxHigh.y, VolBBoxHigh.z, MinDist,      DepthPeelingThreshold
//ICPE_s,        DistanceColorBlending, MinMaxLen, ICPE_t

";

const RAY_BOUNDS: &str = "\
vec4 computeRayEnd()
{
    vec3 o = vec3(ParaMatrix[0][0], ParaMatrix[0][1], ParaMatrix[0][2]);
    vec3 mmn = vec3(ParaMatrix[1][0], ParaMatrix[1][1], ParaMatrix[1][2]);
    vec3 mmx = vec3(ParaMatrix[1][3], ParaMatrix[2][0], ParaMatrix[2][1]);
    mmn = clamp(mmn, 0.0, 1.0);
    mmx = clamp(mmx, 0.0, 1.0);

    if (all(greaterThanEqual(o, mmn)) && all(lessThanEqual(o, mmx)))
        return gl_TexCoord[0];

    vec3 a1 = gl_TexCoord[0].xyz;
    vec3 a2 = a1 + normalize(a1 - o) * length(mmx - mmn);
    vec3 a3;

    float halfStep = ParaMatrix[0][3] * 0.5;
    for (int i = 0; i < 10; i++)
    {
        a3 = (a1 + a2) * 0.5;
        if (length(a2 - a1) <= halfStep)
            return vec4(clamp(a3, mmn, mmx), 1.0);
        if (all(greaterThanEqual(a3, mmn)) && all(lessThanEqual(a3, mmx)))
            a1 = a3;
        else
            a2 = a3;
    }
    return vec4(clamp(a3, mmn, mmx), 1.0);
}

vec4 computeRayOrigin()
{
    vec3 o = vec3(ParaMatrix[0][0], ParaMatrix[0][1], ParaMatrix[0][2]);
    vec3 mmn = vec3(ParaMatrix[1][0], ParaMatrix[1][1], ParaMatrix[1][2]);
    vec3 mmx = vec3(ParaMatrix[1][3], ParaMatrix[2][0], ParaMatrix[2][1]);
    mmn = clamp(mmn, 0.0, 1.0);
    mmx = clamp(mmx, 0.0, 1.0);

    if (all(greaterThanEqual(o, mmn)) && all(lessThanEqual(o, mmx)))
        return vec4(o, 1.0);
    else
        return gl_TexCoord[0];
}

";

const VOXEL_COLOR_SCALAR: &str = "\
vec4 voxelColor(vec3 coord)
{
    vec4 scalar = texture3D(TextureVol, coord);
    return texture2D(TextureColorLookup, vec2(scalar.x, scalar.w));
}

";

const VOXEL_COLOR_SCALAR_PAIR: &str = "\
vec4 voxelColor(vec3 coord)
{
    vec4 scalar = texture3D(TextureVol, coord);
    vec4 color = texture2D(TextureColorLookup, vec2(scalar.x, scalar.w));
    vec4 opacity = texture2D(TextureColorLookup, vec2(scalar.y, scalar.w));
    color.w = opacity.w;
    return color;
}

";

const VOXEL_COLOR_RGBA: &str = "\
vec4 voxelColor(vec3 coord)
{
    vec4 color = texture3D(TextureVol, coord);
    vec4 scalar = texture3D(TextureVol1, coord);
    vec4 opacity = texture2D(TextureColorLookup, vec2(color.w, scalar.w));
    color.w = opacity.w;
    return color;
}

";

const VOXEL_SCALAR_X: &str = "\
float voxelScalar(vec3 coord)
{
    return texture3D(TextureVol, coord).x;
}

";

const VOXEL_SCALAR_W: &str = "\
float voxelScalar(vec3 coord)
{
    return texture3D(TextureVol, coord).w;
}

";

const GRADIENT_MAGNITUDE_VOL: &str = "\
float gradientMagnitude(vec3 coord)
{
    return texture3D(TextureVol, coord).w;
}

";

const GRADIENT_MAGNITUDE_VOL1: &str = "\
float gradientMagnitude(vec3 coord)
{
    return texture3D(TextureVol1, coord).w;
}

";

const VOXEL_NORMAL: &str = "\
vec3 voxelNormal(vec3 coord)
{
    vec4 normal = texture3D(TextureVol1, coord);
    normal = normal * 2.0 - 1.0;
    normal = VolumeMatrix * normal;
    return gl_NormalMatrix * normal.xyz;
}

";

const DIRECTIONAL_LIGHT: &str = "\
vec4 directionalLight(vec3 coord, vec3 lightDir, vec4 color)
{
    vec3 normal = normalize(voxelNormal(coord));
    float NdotL = abs(dot(normal, lightDir));
    vec4 specular = vec4(0);
    if (NdotL > 0.0)
    {
        float NdotHV = max(dot(normal, gl_LightSource[0].halfVector.xyz), 0.0);
        specular = gl_FrontMaterial.specular * pow(NdotHV, gl_FrontMaterial.shininess) * color;
    }
    vec4 diffuse = (gl_FrontMaterial.ambient + gl_FrontMaterial.diffuse * NdotL) * color;
    return specular + diffuse;
}

";

const EDGE_COLORING: &str = "\
vec4 edgeColoring(vec3 coord, vec4 diffuse)
{
    vec3 normal = normalize(voxelNormal(coord));
    float NdotV = abs(dot(normal, normalize(-ViewDir)));
    return diffuse * NdotV;
}

";

const ICPE: &str = "\
float ICPE(vec3 coord, float shading, float alpha, float dist)
{
    float gradMag = gradientMagnitude(coord);
    float base = shading * ParaMatrix[3][3] * (1.0 - dist) * (1.0 - alpha);
    if (base > 0.0)
        return pow(gradMag, pow(base, ParaMatrix[3][0]));
    else
        return 1.0;
}

";

const MAIN_PROLOGUE: &str = "\
void main()
{
    vec4 rayOrigin = computeRayOrigin();
    vec4 rayEnd = computeRayEnd();

    vec3 rayDir = rayEnd.xyz - rayOrigin.xyz;
    float rayLen = length(rayDir);
    if (rayLen > 1.732)
        rayLen = 1.732;
    rayDir = normalize(rayDir);

    vec3 rayStep = rayDir * ParaMatrix[0][3];
    vec3 nextRayOrigin = rayOrigin.xyz;

    float fading = 1.0;
    if (ParaMatrix[3][1] > 0.0001)
    {
        vec3 eyePos = vec3(ParaMatrix[0][0], ParaMatrix[0][1], ParaMatrix[0][2]);
        vec3 mmn = clamp(vec3(ParaMatrix[1][0], ParaMatrix[1][1], ParaMatrix[1][2]), 0.0, 1.0);
        vec3 mmx = clamp(vec3(ParaMatrix[1][3], ParaMatrix[2][0], ParaMatrix[2][1]), 0.0, 1.0);
        if (any(lessThanEqual(eyePos, mmn)) || any(greaterThanEqual(eyePos, mmx)))
        {
            float toEyeDist = length(nextRayOrigin - eyePos);
            fading = 1.0 - (toEyeDist - ParaMatrix[2][2]) / ParaMatrix[3][2];
        }
    }

    vec4 pixelColor = vec4(0);
    float alpha = 0.0;
    float t = 0.0;
    vec3 lightDir = normalize(gl_LightSource[0].position.xyz);

    float depthPeeling = ParaMatrix[2][3];
    while (t < rayLen)
    {
        if (voxelScalar(nextRayOrigin) >= depthPeeling)
            break;
        t += ParaMatrix[0][3];
        nextRayOrigin += rayStep;
        fading -= ParaMatrix[3][1] * ParaMatrix[0][3];
    }

";

/// Compositing loop, `$shade` applied to samples with nonzero opacity
/// and `$weight` multiplied into their opacity.
macro_rules! composite_loop {
    ($shade:literal, $weight:literal) => {
        concat!(
            "    while ((t < rayLen) && (alpha < 0.985))
    {
        vec4 nextColor = voxelColor(nextRayOrigin);
        float tempAlpha = nextColor.w;
        nextColor *= vec4(fading, fading, fading, 1.0);
        if (tempAlpha > 0.0)
        {
            nextColor = ",
            $shade,
            ";
            tempAlpha = (1.0 - alpha) * tempAlpha",
            $weight,
            ";
            pixelColor += nextColor * tempAlpha;
            alpha += tempAlpha;
        }
        t += ParaMatrix[0][3];
        nextRayOrigin += rayStep;
        fading -= ParaMatrix[3][1] * ParaMatrix[0][3];
    }
    gl_FragColor = vec4(pixelColor.xyz, alpha);
}
"
        )
    };
}

const LOOP_COMPOSITE: &str = composite_loop!("directionalLight(nextRayOrigin, lightDir, nextColor)", "");

const LOOP_EDGE: &str = composite_loop!("edgeColoring(nextRayOrigin, nextColor)", "");

const LOOP_GRADIENT_MODULATED: &str = composite_loop!(
    "directionalLight(nextRayOrigin, lightDir, nextColor)",
    " * gradientMagnitude(nextRayOrigin)"
);

const LOOP_MIP: &str = "\
    float maxScalar = voxelScalar(nextRayOrigin);
    vec3 maxScalarCoord = nextRayOrigin;
    float maxFading = fading;
    while (t < rayLen)
    {
        float scalar = voxelScalar(nextRayOrigin);
        if (maxScalar < scalar)
        {
            maxScalar = scalar;
            maxScalarCoord = nextRayOrigin;
            maxFading = fading;
        }
        fading -= ParaMatrix[3][1] * ParaMatrix[0][3];
        t += ParaMatrix[0][3];
        nextRayOrigin += rayStep;
    }
    pixelColor = voxelColor(maxScalarCoord) * vec4(maxFading, maxFading, maxFading, 1.0);
    alpha = pixelColor.w;
    gl_FragColor = vec4(pixelColor.xyz, alpha);
}
";

const LOOP_MINIP: &str = "\
    float minScalar = voxelScalar(nextRayOrigin);
    vec3 minScalarCoord = nextRayOrigin;
    while (t < rayLen)
    {
        float scalar = voxelScalar(nextRayOrigin);
        if (minScalar > scalar)
        {
            minScalar = scalar;
            minScalarCoord = nextRayOrigin;
        }
        t += ParaMatrix[0][3];
        nextRayOrigin += rayStep;
    }
    pixelColor = voxelColor(minScalarCoord);
    alpha = pixelColor.w;
    gl_FragColor = vec4(pixelColor.xyz, alpha);
}
";

const LOOP_ICPE: &str = "\
    vec3 eyePos = vec3(ParaMatrix[0][0], ParaMatrix[0][1], ParaMatrix[0][2]);
    while ((t < rayLen) && (alpha < 0.985))
    {
        vec4 nextColor = voxelColor(nextRayOrigin);
        float tempAlpha = nextColor.w;
        if (tempAlpha > 0.0)
        {
            nextColor = directionalLight(nextRayOrigin, lightDir, nextColor);
            float toEyeDist = (length(nextRayOrigin - eyePos) - ParaMatrix[2][2]) / ParaMatrix[3][2];
            float icpe = ICPE(nextRayOrigin, length(nextColor), alpha, toEyeDist);
            tempAlpha = (1.0 - alpha) * tempAlpha * icpe;
            pixelColor += nextColor * tempAlpha;
            alpha += tempAlpha;
        }
        t += ParaMatrix[0][3];
        nextRayOrigin += rayStep;
    }
    gl_FragColor = vec4(pixelColor.xyz, alpha);
}
";

pub fn vertex_shader_source() -> &'static str {
    VERTEX_SHADER
}

fn voxel_color(layout: ColorLayout) -> &'static str {
    match layout {
        ColorLayout::Scalar => VOXEL_COLOR_SCALAR,
        ColorLayout::ScalarPair => VOXEL_COLOR_SCALAR_PAIR,
        ColorLayout::Rgba => VOXEL_COLOR_RGBA,
    }
}

fn voxel_scalar(layout: ColorLayout) -> &'static str {
    match layout {
        ColorLayout::Scalar | ColorLayout::ScalarPair => VOXEL_SCALAR_X,
        ColorLayout::Rgba => VOXEL_SCALAR_W,
    }
}

fn gradient_magnitude(layout: ColorLayout) -> &'static str {
    match layout {
        ColorLayout::Scalar | ColorLayout::ScalarPair => GRADIENT_MAGNITUDE_VOL,
        ColorLayout::Rgba => GRADIENT_MAGNITUDE_VOL1,
    }
}

fn shading(technique: Technique) -> &'static str {
    match technique {
        Technique::Composite | Technique::GradientModulated | Technique::Icpe => DIRECTIONAL_LIGHT,
        Technique::EdgeColoring => EDGE_COLORING,
        Technique::Mip | Technique::MinIp => "",
    }
}

fn ray_loop(technique: Technique) -> &'static str {
    match technique {
        Technique::Composite => LOOP_COMPOSITE,
        Technique::EdgeColoring => LOOP_EDGE,
        Technique::Mip => LOOP_MIP,
        Technique::MinIp => LOOP_MINIP,
        Technique::GradientModulated => LOOP_GRADIENT_MODULATED,
        Technique::Icpe => LOOP_ICPE,
    }
}

/// Fragment shader for `technique` over textures packed as `layout`
pub fn fragment_shader_source(technique: Technique, layout: ColorLayout) -> String {
    let mut source = String::with_capacity(8192);
    source.push_str(HEADER);
    source.push_str(RAY_BOUNDS);
    source.push_str(voxel_color(layout));
    source.push_str(voxel_scalar(layout));
    if technique.uses_gradient_magnitude() {
        source.push_str(gradient_magnitude(layout));
    }
    if technique.needs_normals() {
        source.push_str(VOXEL_NORMAL);
    }
    source.push_str(shading(technique));
    if technique == Technique::Icpe {
        source.push_str(ICPE);
    }
    source.push_str(MAIN_PROLOGUE);
    source.push_str(ray_loop(technique));
    source
}

/// Compiled and linked ray casting program
#[derive(Debug, PartialEq, Eq)]
pub struct ShaderProgram {
    pub technique: Technique,
    pub layout: ColorLayout,
    vertex: ShaderHandle,
    fragment: ShaderHandle,
    program: ProgramHandle,
}

impl ShaderProgram {
    /// Generate, compile and link the program.
    ///
    /// On failure every object created so far is deleted and the
    /// info log is returned inside the error.
    pub fn build(
        ctx: &mut dyn GraphicsContext,
        technique: Technique,
        layout: ColorLayout,
    ) -> RaycastResult<ShaderProgram> {
        let mut shader = ShaderProgram {
            technique,
            layout,
            vertex: ctx.create_shader(ShaderStage::Vertex),
            fragment: ctx.create_shader(ShaderStage::Fragment),
            program: ctx.create_program(),
        };

        let fragment_source = fragment_shader_source(technique, layout);
        match shader.compile_and_link(ctx, &fragment_source) {
            Ok(()) => {
                debug!("Built ray cast program {:?} {:?}", technique, layout);
                Ok(shader)
            }
            Err(e) => {
                error!("{}", e);
                shader.delete(ctx);
                Err(e)
            }
        }
    }

    fn compile_and_link(
        &self,
        ctx: &mut dyn GraphicsContext,
        fragment_source: &str,
    ) -> RaycastResult<()> {
        compile(ctx, self.vertex, ShaderStage::Vertex, VERTEX_SHADER)?;
        compile(ctx, self.fragment, ShaderStage::Fragment, fragment_source)?;
        ctx.link_program(self.program, &[self.vertex, self.fragment])
            .map_err(RaycastError::ProgramLink)
    }

    pub fn program(&self) -> ProgramHandle {
        self.program
    }

    /// Delete the GPU objects, safe to call more than once
    pub fn delete(&mut self, ctx: &mut dyn GraphicsContext) {
        if !self.vertex.is_none() {
            ctx.delete_shader(self.vertex);
        }
        if !self.fragment.is_none() {
            ctx.delete_shader(self.fragment);
        }
        if !self.program.is_none() {
            ctx.delete_program(self.program);
        }
        self.vertex = ShaderHandle::NONE;
        self.fragment = ShaderHandle::NONE;
        self.program = ProgramHandle::NONE;
    }
}

fn compile(
    ctx: &mut dyn GraphicsContext,
    shader: ShaderHandle,
    stage: ShaderStage,
    source: &str,
) -> RaycastResult<()> {
    ctx.compile_shader(shader, source)
        .map_err(|log| RaycastError::ShaderCompilation {
            stage: stage.name(),
            log,
        })
}

#[cfg(test)]
mod test {

    use super::*;

    fn count(source: &str, pattern: &str) -> usize {
        source.matches(pattern).count()
    }

    #[test]
    fn technique_indices() {
        for (i, t) in Technique::ALL.iter().enumerate() {
            assert_eq!(Technique::from_index(i), Some(*t));
            assert_eq!(t.index(), i);
        }
        assert_eq!(Technique::from_index(6), None);
    }

    #[test]
    fn layout_from_components() {
        assert_eq!(ColorLayout::from_components(1).unwrap(), ColorLayout::Scalar);
        assert_eq!(ColorLayout::from_components(2).unwrap(), ColorLayout::ScalarPair);
        assert_eq!(ColorLayout::from_components(3).unwrap(), ColorLayout::Rgba);
        assert_eq!(ColorLayout::from_components(4).unwrap(), ColorLayout::Rgba);
        assert!(ColorLayout::from_components(0).is_err());
        assert!(ColorLayout::from_components(5).is_err());
    }

    #[test]
    fn every_variant_defines_main_once() {
        for &technique in &Technique::ALL {
            for layout in [ColorLayout::Scalar, ColorLayout::ScalarPair, ColorLayout::Rgba] {
                let source = fragment_shader_source(technique, layout);

                assert_eq!(count(&source, "void main()"), 1);
                assert_eq!(count(&source, "vec4 voxelColor(vec3 coord)"), 1);
                assert_eq!(count(&source, "float voxelScalar(vec3 coord)"), 1);
                assert_eq!(count(&source, "{"), count(&source, "}"));
                assert!(source.contains("gl_FragColor"));
            }
        }
    }

    #[test]
    fn projections_skip_normals() {
        let mip = fragment_shader_source(Technique::Mip, ColorLayout::Scalar);
        let minip = fragment_shader_source(Technique::MinIp, ColorLayout::Scalar);
        let composite = fragment_shader_source(Technique::Composite, ColorLayout::Scalar);

        assert!(!mip.contains("voxelNormal"));
        assert!(!minip.contains("voxelNormal"));
        assert!(mip.contains("maxFading"));
        assert!(minip.contains("minScalarCoord"));
        assert!(composite.contains("vec3 voxelNormal(vec3 coord)"));
        assert!(composite.contains("directionalLight(nextRayOrigin, lightDir, nextColor)"));
    }

    #[test]
    fn shading_per_technique() {
        let edge = fragment_shader_source(Technique::EdgeColoring, ColorLayout::Scalar);
        let gradient = fragment_shader_source(Technique::GradientModulated, ColorLayout::Scalar);
        let icpe = fragment_shader_source(Technique::Icpe, ColorLayout::Scalar);

        assert!(edge.contains("edgeColoring(nextRayOrigin, nextColor)"));
        assert!(!edge.contains("directionalLight"));
        assert!(gradient.contains("tempAlpha * gradientMagnitude(nextRayOrigin)"));
        assert!(icpe.contains("float gradMag = gradientMagnitude(coord);"));
        assert!(!edge.contains("gradientMagnitude"));
        assert!(icpe.contains("float ICPE("));
        assert!(icpe.contains("length(nextColor)"));
        assert!(!edge.contains("float ICPE("));
    }

    #[test]
    fn color_lookup_per_layout() {
        let pair = fragment_shader_source(Technique::Composite, ColorLayout::ScalarPair);
        let rgba = fragment_shader_source(Technique::Composite, ColorLayout::Rgba);

        assert!(pair.contains("vec2(scalar.y, scalar.w)"));
        assert!(!pair.contains("TextureAlphaLookup"));
        assert!(rgba.contains("texture3D(TextureVol, coord).w;"));
        assert!(rgba.contains("vec2(color.w, scalar.w)"));
    }

    #[test]
    fn gradient_magnitude_per_layout() {
        for technique in [Technique::GradientModulated, Technique::Icpe] {
            let scalar = fragment_shader_source(technique, ColorLayout::Scalar);
            let rgba = fragment_shader_source(technique, ColorLayout::Rgba);

            assert_eq!(count(&scalar, "float gradientMagnitude(vec3 coord)"), 1);
            assert!(scalar.contains("return texture3D(TextureVol, coord).w;"));
            assert_eq!(count(&rgba, "float gradientMagnitude(vec3 coord)"), 1);
            assert!(rgba.contains("return texture3D(TextureVol1, coord).w;"));
            // alpha of TextureVol holds a color component here
            assert!(!rgba.contains("texture3D(TextureVol, nextRayOrigin).w"));
            assert!(!rgba.contains("gradMag = texture3D(TextureVol, coord).w"));
        }
    }

    #[test]
    fn every_variant_peels_and_bisects() {
        for &technique in &Technique::ALL {
            let source = fragment_shader_source(technique, ColorLayout::Scalar);

            assert!(source.contains("for (int i = 0; i < 10; i++)"));
            assert!(source.contains("if (voxelScalar(nextRayOrigin) >= depthPeeling)"));
            assert!(source.contains("rayLen = 1.732"));
        }
    }

    #[test]
    fn vertex_shader_passes_texcoords() {
        let source = vertex_shader_source();

        assert!(source.contains("gl_TexCoord[0] = gl_Color"));
        assert!(source.contains("ViewDir"));
    }
}
