//! Build tasks for Datalogics Conan projects
//!
//! This library drives the Conan package manager and CMake to:
//! - configure the company remotes and log in to Artifactory
//! - install requirements and build the native project
//! - build, test and publish packages across the configuration matrix
//! - promote third-party dependencies to the company repositories
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod artifactory;
pub mod ci;
pub mod cli;
pub mod conan;
pub mod error;
pub mod matrix;
pub mod platform;
pub mod process;
pub mod settings;
pub mod tasks;
pub mod tools;

// Re-export commonly used types
pub use error::{CliError, Result, TasksError};
