//! Data Transfer Objects for collaborator communication
//!
//! This module contains DTOs exchanged with the execution engine. DTOs are
//! the wire shapes of requests; the domain types they reference live in
//! [`crate::domain`].

pub mod run;
