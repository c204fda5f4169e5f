use crate::registry::schema::{ProviderRegistry, ValidationError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that points at an alternate registry file.
pub const REGISTRY_ENV: &str = "YUI_PROVIDERS";

/// Registry shipped inside the binary, used when nothing else is configured.
pub const EMBEDDED_REGISTRY: &str = include_str!("../../ui-providers.json");

#[derive(Debug)]
pub enum RegistryError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Json {
        path: Option<PathBuf>,
        source: serde_json::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
}

impl RegistryError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            RegistryError::Io { .. } => self,
            RegistryError::Json { path: None, source } => RegistryError::Json {
                path: Some(path),
                source,
            },
            RegistryError::Validation { path: None, source } => RegistryError::Validation {
                path: Some(path),
                source,
            },
            other => other,
        }
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::Io { path, source } => {
                write!(
                    f,
                    "failed to read provider registry from {}: {}",
                    path.display(),
                    source
                )
            }
            RegistryError::Json { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse provider registry JSON ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse provider registry JSON: {}", source),
            },
            RegistryError::Validation { path, source } => match path {
                Some(path) => write!(
                    f,
                    "invalid provider registry ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "invalid provider registry: {}", source),
            },
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RegistryError::Io { source, .. } => Some(source),
            RegistryError::Json { source, .. } => Some(source),
            RegistryError::Validation { source, .. } => Some(source),
        }
    }
}

/// Where a loaded registry came from, for the `providers` listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrySource {
    /// `--providers <FILE>` on the command line.
    Flag(PathBuf),
    /// The `YUI_PROVIDERS` environment variable.
    Environment(PathBuf),
    /// `~/.config/yui/ui-providers.json`.
    UserConfig(PathBuf),
    /// The registry compiled into the binary.
    Embedded,
}

impl fmt::Display for RegistrySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrySource::Flag(path) => write!(f, "{} (--providers)", path.display()),
            RegistrySource::Environment(path) => {
                write!(f, "{} (${})", path.display(), REGISTRY_ENV)
            }
            RegistrySource::UserConfig(path) => write!(f, "{} (user config)", path.display()),
            RegistrySource::Embedded => write!(f, "built-in registry"),
        }
    }
}

pub fn load_from_str(input: &str) -> Result<ProviderRegistry, RegistryError> {
    let registry: ProviderRegistry = serde_json::from_str(input)
        .map_err(|source| RegistryError::Json { path: None, source })?;
    registry
        .validate()
        .map_err(|source| RegistryError::Validation { path: None, source })?;
    Ok(registry)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<ProviderRegistry, RegistryError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| RegistryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}

/// Decide which registry to use.
///
/// Order: explicit `--providers` flag, then `$YUI_PROVIDERS`, then the user
/// config file if it exists, then the embedded registry. An explicit flag or
/// environment path that fails to load is an error, never a silent fallback.
pub fn resolve(explicit: Option<&Path>) -> RegistrySource {
    resolve_from(
        explicit,
        std::env::var_os(REGISTRY_ENV).map(PathBuf::from),
        user_config_path(),
    )
}

fn resolve_from(
    explicit: Option<&Path>,
    env_path: Option<PathBuf>,
    user_config: Option<PathBuf>,
) -> RegistrySource {
    if let Some(path) = explicit {
        return RegistrySource::Flag(path.to_path_buf());
    }
    if let Some(path) = env_path {
        return RegistrySource::Environment(path);
    }
    if let Some(path) = user_config {
        if path.is_file() {
            return RegistrySource::UserConfig(path);
        }
    }
    RegistrySource::Embedded
}

fn user_config_path() -> Option<PathBuf> {
    home::home_dir().map(|home| home.join(".config/yui/ui-providers.json"))
}

/// Resolve and load in one step.
pub fn load(explicit: Option<&Path>) -> Result<(ProviderRegistry, RegistrySource), RegistryError> {
    let source = resolve(explicit);
    let registry = match &source {
        RegistrySource::Flag(path)
        | RegistrySource::Environment(path)
        | RegistrySource::UserConfig(path) => load_from_path(path)?,
        RegistrySource::Embedded => load_from_str(EMBEDDED_REGISTRY)?,
    };
    Ok((registry, source))
}
