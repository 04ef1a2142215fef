//! Encore - audio feedback for shared music performances
//!
//! This crate provides the core functionality for recording spoken
//! feedback about a shared performance, previewing it locally, and
//! posting it as an audio comment anchored to a moment in the
//! performance video.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: The take and transport state machines, value objects, and errors
//! - **Application**: Use cases and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal, rodio, backend REST, config)
//! - **CLI**: Command-line interface, argument parsing, and output formatting

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
