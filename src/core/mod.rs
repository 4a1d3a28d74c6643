// Core types and primitives

pub mod strong_types;

pub use strong_types::{strip_prefix, PageId, PageType, PAGE_ID_PREFIX};
