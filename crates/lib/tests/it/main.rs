/*! Integration tests for Dossier.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the main library structure:
 * - backend: Tests for the BackendImpl trait and its implementations
 * - account: Tests for the credential store and login
 * - profile: Tests for the profile store and completeness
 * - settings: Tests for the settings store and path updates
 * - files: Tests for the file record store and uploads
 * - service: Tests for the aggregated view, cascade delete and export
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("dossier=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod account;
mod backend;
mod files;
mod helpers;
mod service;
mod settings;
