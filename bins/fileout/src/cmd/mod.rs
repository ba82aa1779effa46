pub mod flush;
pub mod slice;
