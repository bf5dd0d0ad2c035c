//! Public declaration surface.

pub mod builder;

pub use builder::WorkflowBuilder;
