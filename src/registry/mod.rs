pub mod loader;
pub mod schema;
pub mod version;

pub use loader::{
    load, load_from_path, load_from_str, resolve, RegistryError, RegistrySource,
    EMBEDDED_REGISTRY, REGISTRY_ENV,
};
pub use schema::{Provider, ProviderRegistry, ValidationError, ValidationIssue};
pub use version::{installer_supports, matches_requirement, VersionError};
