//! Request handlers, one module per resource

pub mod snippets;
pub mod tags;
