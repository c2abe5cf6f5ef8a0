//! PyPI metadata model, registry client and acceptability policy.
//!
//! The registry is consumed through the [`Registry`] trait — "fetch package
//! metadata by name, or fail" — so resolution logic can run against mocks.
//! The production implementation hits the PyPI JSON API over HTTP.

pub mod accept;
pub mod model;
pub mod registry;

pub use accept::{AcceptError, AcceptancePolicy, Compat, FloorScope, PythonTarget};
pub use model::{PackageInfo, PackageMetadata, Release};
pub use registry::{IMPORT_ALIASES, PyPiRegistry, Registry, RegistryError, registry_name};
