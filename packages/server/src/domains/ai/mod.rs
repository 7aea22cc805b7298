//! AI-assisted content generation.

pub mod generate;

pub use generate::{generate_pitch, generate_subject_lines, improve_draft, PitchDraft};
