//! Drawing layer for shoal.
//!
//! Retained containers with a vector graphics surface and pointer hit
//! testing, the canvas painter that puts them in the terminal, and the
//! shell chrome and console overlay. Rendering uses [`ratatui`]; this crate
//! owns presentation while [`shoal_core`] owns the state.

pub mod aquarium;
pub mod color;
pub mod console;
pub mod container;
pub mod graphics;
pub mod layout;
pub mod marker;
pub mod shell;
