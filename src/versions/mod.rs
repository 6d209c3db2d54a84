// Version metadata: manifest records, descriptors and compatibility ranges

use std::fmt;

pub mod compat;
pub mod descriptor;
pub mod record;
pub mod store;

pub use compat::{CompatibilityMapping, Scheme};
pub use descriptor::VersionDescriptor;
pub use record::VersionRecord;
pub use store::VersionStore;

/// The two independent identifier spaces a store holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Client/game versions.
    Primary,
    /// Mod builds and the server versions they target.
    Mod,
}

impl Namespace {
    pub const ALL: [Namespace; 2] = [Namespace::Primary, Namespace::Mod];
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Namespace::Primary => f.write_str("game"),
            Namespace::Mod => f.write_str("mod"),
        }
    }
}
