//! sea-orm entities
pub mod collections;
pub mod items;
