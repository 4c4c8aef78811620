//! HTML 查询层

pub mod document;

pub use document::{Document, Element, SCAN_LIMIT};
