//! Header parsers and transfer function presets for datasets used in development.
//! Other data formats need their own [`HeaderParser`](crate::volumetric::HeaderParser).

pub mod parse;
pub mod transfer_functions;
