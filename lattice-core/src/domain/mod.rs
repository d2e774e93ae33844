//! Core domain types
//!
//! This module contains the core domain structures used across Lattice crates.
//! They are shared between the validator (which reads them), the request
//! builder (which assembles run payloads from them) and the persistence layer
//! (which stores them as flat, human-editable documents).

pub mod binding;
pub mod pipeline;
pub mod project;
pub mod run;
pub mod types;
