//! Small shared helpers: typed collection constructors and id generation.

pub mod collections;
pub mod id_generator;
