//! Build-time metadata embedded by the build script.

/// The git commit hash at build time (short form).
pub const GIT_HASH: &str = env!("BZLNAV_GIT_HASH");

/// The build profile (`debug` or `release`).
pub const BUILD_PROFILE: &str = env!("BZLNAV_BUILD_PROFILE");

/// The crate version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version line shown by `bzlnav --version` in long form, e.g. `"0.1.0 (abc1234, debug)"`.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("BZLNAV_GIT_HASH"),
    ", ",
    env!("BZLNAV_BUILD_PROFILE"),
    ")"
);
