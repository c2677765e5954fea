pub mod arena;
pub mod bits;
pub mod list;
