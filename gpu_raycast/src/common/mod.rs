mod bound_box;
pub mod ray;
mod stamp;
mod value_range;

pub use bound_box::{BoundBox, BoundBoxIterator};
pub use ray::Ray;
pub use stamp::{ObjectId, Stamp};
pub use value_range::ValueRange;
