// Folder Parser (C3, §4.3).

pub mod interpolate;
pub mod loader;
pub mod model;

pub use loader::parse_stack;
pub use model::{
    ComponentHeader, EnvValue, Resource, ResourceMetadata, ServiceHeader, ServiceParseResult,
    StackHeader, StackParseResult, UnresolvedReference, ValueFrom,
};
