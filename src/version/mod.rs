//! Version management and semver bumping.

pub mod bump;

pub use bump::{
    BumpType, INITIAL_VERSION, apply_bump_to_version, classify, next_version, release_version,
};
