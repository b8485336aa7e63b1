/*
[INPUT]:  API schema definitions and serde requirements
[OUTPUT]: Typed Rust structs with serialization support
[POS]:    Data layer - domain values and request options
[UPDATE]: When API schema changes or new types added
*/

pub mod models;
pub mod options;

pub use models::*;
pub use options::*;
