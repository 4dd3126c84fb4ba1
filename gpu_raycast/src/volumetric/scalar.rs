use crate::error::{RaycastError, RaycastResult};

/// Numeric type of voxel samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
}

impl ScalarType {
    pub fn is_floating(&self) -> bool {
        matches!(self, ScalarType::F32 | ScalarType::F64)
    }

    /// Size of one sample in bytes
    pub fn size(&self) -> usize {
        match self {
            ScalarType::U8 | ScalarType::I8 => 1,
            ScalarType::U16 | ScalarType::I16 => 2,
            ScalarType::U32 | ScalarType::I32 | ScalarType::F32 => 4,
            ScalarType::F64 => 8,
        }
    }

    /// Tag used in volume file headers
    pub fn tag(&self) -> u8 {
        match self {
            ScalarType::U8 => 0,
            ScalarType::I8 => 1,
            ScalarType::U16 => 2,
            ScalarType::I16 => 3,
            ScalarType::U32 => 4,
            ScalarType::I32 => 5,
            ScalarType::F32 => 6,
            ScalarType::F64 => 7,
        }
    }

    pub fn from_tag(tag: u8) -> Option<ScalarType> {
        let t = match tag {
            0 => ScalarType::U8,
            1 => ScalarType::I8,
            2 => ScalarType::U16,
            3 => ScalarType::I16,
            4 => ScalarType::U32,
            5 => ScalarType::I32,
            6 => ScalarType::F32,
            7 => ScalarType::F64,
            _ => return None,
        };
        Some(t)
    }
}

/// Sample type usable in a voxel grid.
pub trait Scalar: Copy + Send + Sync + 'static {
    const TYPE: ScalarType;

    fn to_f64(self) -> f64;

    fn to_f32(self) -> f32 {
        self.to_f64() as f32
    }
}

macro_rules! impl_scalar {
    ($t:ty, $variant:ident) => {
        impl Scalar for $t {
            const TYPE: ScalarType = ScalarType::$variant;

            fn to_f64(self) -> f64 {
                self as f64
            }
        }
    };
}

impl_scalar!(u8, U8);
impl_scalar!(i8, I8);
impl_scalar!(u16, U16);
impl_scalar!(i16, I16);
impl_scalar!(u32, U32);
impl_scalar!(i32, I32);
impl_scalar!(f32, F32);
impl_scalar!(f64, F64);

/// Typed, interleaved voxel samples.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarData {
    U8(Vec<u8>),
    I8(Vec<i8>),
    U16(Vec<u16>),
    I16(Vec<i16>),
    U32(Vec<u32>),
    I32(Vec<i32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

/// Runs `$body` with `$v` bound to the typed sample slice.
macro_rules! with_samples {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            $crate::volumetric::ScalarData::U8($v) => $body,
            $crate::volumetric::ScalarData::I8($v) => $body,
            $crate::volumetric::ScalarData::U16($v) => $body,
            $crate::volumetric::ScalarData::I16($v) => $body,
            $crate::volumetric::ScalarData::U32($v) => $body,
            $crate::volumetric::ScalarData::I32($v) => $body,
            $crate::volumetric::ScalarData::F32($v) => $body,
            $crate::volumetric::ScalarData::F64($v) => $body,
        }
    };
}

pub(crate) use with_samples;

macro_rules! decode_le {
    ($bytes:expr, $t:ty) => {{
        const N: usize = std::mem::size_of::<$t>();
        $bytes
            .chunks_exact(N)
            .map(|c| {
                let mut b = [0u8; N];
                b.copy_from_slice(c);
                <$t>::from_le_bytes(b)
            })
            .collect::<Vec<$t>>()
    }};
}

impl ScalarData {
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            ScalarData::U8(_) => ScalarType::U8,
            ScalarData::I8(_) => ScalarType::I8,
            ScalarData::U16(_) => ScalarType::U16,
            ScalarData::I16(_) => ScalarType::I16,
            ScalarData::U32(_) => ScalarType::U32,
            ScalarData::I32(_) => ScalarType::I32,
            ScalarData::F32(_) => ScalarType::F32,
            ScalarData::F64(_) => ScalarType::F64,
        }
    }

    pub fn len(&self) -> usize {
        with_samples!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample at linear `index`, as double
    pub fn get(&self, index: usize) -> f64 {
        with_samples!(self, v => v[index].to_f64())
    }

    /// Copy of all samples as floats
    pub fn to_f32_vec(&self) -> Vec<f32> {
        with_samples!(self, v => v.iter().map(|s| s.to_f32()).collect())
    }

    /// Decode little endian samples of type `ty`.
    /// Trailing bytes that do not form a whole sample are ignored.
    pub fn from_le_bytes(ty: ScalarType, bytes: &[u8]) -> RaycastResult<ScalarData> {
        let data = match ty {
            ScalarType::U8 => ScalarData::U8(bytes.to_vec()),
            ScalarType::I8 => ScalarData::I8(bytes.iter().map(|&b| b as i8).collect()),
            ScalarType::U16 => ScalarData::U16(decode_le!(bytes, u16)),
            ScalarType::I16 => ScalarData::I16(decode_le!(bytes, i16)),
            ScalarType::U32 => ScalarData::U32(decode_le!(bytes, u32)),
            ScalarType::I32 => ScalarData::I32(decode_le!(bytes, i32)),
            ScalarType::F32 => ScalarData::F32(decode_le!(bytes, f32)),
            ScalarType::F64 => ScalarData::F64(decode_le!(bytes, f64)),
        };
        if data.is_empty() && !bytes.is_empty() {
            return Err(RaycastError::invalid("not enough bytes for a single sample"));
        }
        Ok(data)
    }
}

macro_rules! impl_from_vec {
    ($t:ty, $variant:ident) => {
        impl From<Vec<$t>> for ScalarData {
            fn from(v: Vec<$t>) -> Self {
                ScalarData::$variant(v)
            }
        }
    };
}

impl_from_vec!(u8, U8);
impl_from_vec!(i8, I8);
impl_from_vec!(u16, U16);
impl_from_vec!(i16, I16);
impl_from_vec!(u32, U32);
impl_from_vec!(i32, I32);
impl_from_vec!(f32, F32);
impl_from_vec!(f64, F64);

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn tags_roundtrip() {
        for tag in 0..8 {
            let ty = ScalarType::from_tag(tag).unwrap();
            assert_eq!(ty.tag(), tag);
        }
        assert!(ScalarType::from_tag(8).is_none());
    }

    #[test]
    fn decode_u16() {
        let bytes = [0x01, 0x00, 0xff, 0xff, 0x07];

        let data = ScalarData::from_le_bytes(ScalarType::U16, &bytes).unwrap();

        assert_eq!(data, ScalarData::U16(vec![1, 0xffff]));
    }

    #[test]
    fn decode_signed() {
        let data = ScalarData::from_le_bytes(ScalarType::I8, &[0xff, 0x02]).unwrap();

        assert_eq!(data.get(0), -1.0);
        assert_eq!(data.get(1), 2.0);
    }

    #[test]
    fn floating_types() {
        assert!(ScalarType::F32.is_floating());
        assert!(ScalarType::F64.is_floating());
        assert!(!ScalarType::I32.is_floating());
        assert_eq!(ScalarData::from(vec![1.5f32]).scalar_type(), ScalarType::F32);
    }
}
