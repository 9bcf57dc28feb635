//! Build orchestration for thesisbuild.
//!
//! Ties settings resolution, chapter discovery, and dataset loading to an
//! external [`render::Renderer`], then cleans up and records a build report.

pub mod cleanup;
pub mod pipeline;
pub mod render;
