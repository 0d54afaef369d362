//! Cross-component integration tests.

pub mod cross_context;
pub mod flows;
