//! Lattice Core
//!
//! Core types and abstractions for the Lattice pipeline system.
//!
//! This crate contains:
//! - Domain types: type descriptors, bindings, pipelines, project descriptors, runs
//! - DTOs: payloads exchanged with the execution engine
//!
//! Everything here is plain data plus the parse/format pairs of the two
//! textual grammars (types and bindings). Resolution and validation live in
//! `lattice-flow`.

pub mod domain;
pub mod dto;
