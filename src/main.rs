//! dl_conan_tasks - Conan and CMake tasks for Datalogics projects.
//!
//! Runs one task per invocation and exits non-zero when it fails.

use dl_conan_build_tools::cli;
use std::process;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    // Run CLI and get exit code
    let exit_code = match cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
