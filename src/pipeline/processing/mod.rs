// Pipeline processing: value parsing, normalization, validation, grouping and diffing

pub mod aggregate;
pub mod diff;
pub mod normalize;
pub mod parser;
pub mod validate;
