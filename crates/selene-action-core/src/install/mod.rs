//! Locating, downloading and installing the analyzer executable.
//!
//! The canonical install path is a single shared location. Two resolvers
//! writing to the same install directory at once are not coordinated here;
//! callers running concurrent jobs on one host must serialize them.

pub mod archive;
pub mod error;
pub mod fingerprint;
pub mod release;
pub mod request;
pub mod resolve;

pub use error::ResolveError;
pub use release::{HttpReleaseClient, ReleaseClient, ReleaseHost};
pub use request::{InstalledBinary, ResolutionRequest};
pub use resolve::ArtifactResolver;
