//! Package specifier validation

use super::BuildError;

/// The only package specifier a relocated build accepts
pub const CURRENT_PACKAGE: &str = ".";

/// Checks that `packages` names the current directory and nothing else.
///
/// The binary name is derived from the working directory, so sub-packages,
/// import paths and wildcards are rejected before any filesystem work starts.
pub fn validate_package_spec(packages: &str) -> Result<(), BuildError> {
    if packages == CURRENT_PACKAGE {
        Ok(())
    } else {
        Err(BuildError::InvalidPackageSpec(packages.to_string()))
    }
}
