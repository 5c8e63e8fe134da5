//! Word-boundary usage search over a directory tree.

pub mod classify;
pub mod engine;
pub mod resolver;
pub mod scanner;

pub use engine::TextSearchEngine;
pub use resolver::TextResolver;
