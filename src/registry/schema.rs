use serde::Deserialize;
use std::fmt;

/// UI provider catalog, usually loaded from `ui-providers.json`.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ProviderRegistry {
    #[serde(default)]
    pub providers: Vec<Provider>,
}

/// One installable UI kit.
#[derive(Debug, Deserialize, Clone)]
pub struct Provider {
    /// Display name shown in the selection prompt, e.g. "Hero UI".
    pub name: String,
    /// Composer package handed to `composer create-project`.
    pub package: String,
    /// Extra npm packages installed after the base frontend build.
    #[serde(default)]
    pub npm: Vec<String>,
    /// Name of the bundled tailwind.config.js preset this provider wires in,
    /// e.g. "heroui". Unknown names are skipped with a notice, not an error,
    /// so a newer registry file keeps working on an older installer.
    #[serde(default)]
    pub tailwind: Option<String>,
    /// Preselected answer for the provider prompt.
    #[serde(default)]
    pub default: bool,
    /// Installer version requirement, e.g. ">=0.2". Providers whose
    /// requirement the running installer does not satisfy are hidden.
    #[serde(default)]
    pub requires: Option<String>,
}

impl ProviderRegistry {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.providers.is_empty() {
            issues.push(ValidationIssue::EmptyProviderList);
        }

        let mut defaults = Vec::new();
        for (i, provider) in self.providers.iter().enumerate() {
            if provider.name.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    provider: None,
                    field: "name",
                });
            }
            if provider.package.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    provider: Some(provider.name.clone()),
                    field: "package",
                });
            } else if !provider.package.contains('/') {
                issues.push(ValidationIssue::InvalidPackage {
                    provider: provider.name.clone(),
                    package: provider.package.clone(),
                });
            }

            if self.providers[..i]
                .iter()
                .any(|p| p.name.eq_ignore_ascii_case(&provider.name))
            {
                issues.push(ValidationIssue::DuplicateName {
                    name: provider.name.clone(),
                });
            }

            if provider.default {
                defaults.push(provider.name.clone());
            }
        }

        if defaults.len() > 1 {
            issues.push(ValidationIssue::MultipleDefaults { names: defaults });
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name.as_str()).collect()
    }

    /// Index of the provider marked `default`, or the first entry.
    pub fn default_index(&self) -> usize {
        self.providers
            .iter()
            .position(|p| p.default)
            .unwrap_or(0)
    }

    pub fn by_name(&self, name: &str) -> Option<&Provider> {
        self.providers
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyProviderList,
    MissingField {
        provider: Option<String>,
        field: &'static str,
    },
    InvalidPackage {
        provider: String,
        package: String,
    },
    DuplicateName {
        name: String,
    },
    MultipleDefaults {
        names: Vec<String>,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyProviderList => {
                write!(f, "provider registry contains no providers")
            }
            ValidationIssue::MissingField { provider, field } => match provider {
                Some(name) => write!(f, "provider '{name}' missing required field '{field}'"),
                None => write!(f, "provider missing required field '{field}'"),
            },
            ValidationIssue::InvalidPackage { provider, package } => write!(
                f,
                "provider '{provider}' has package '{package}' without a vendor prefix"
            ),
            ValidationIssue::DuplicateName { name } => {
                write!(f, "provider name '{name}' appears more than once")
            }
            ValidationIssue::MultipleDefaults { names } => {
                write!(f, "multiple providers marked default: {}", names.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(name: &str, package: &str) -> Provider {
        Provider {
            name: name.to_string(),
            package: package.to_string(),
            npm: Vec::new(),
            tailwind: None,
            default: false,
            requires: None,
        }
    }

    #[test]
    fn test_validate_accepts_minimal_registry() {
        let registry = ProviderRegistry {
            providers: vec![provider("Hero UI", "yui-kit/yui-hero")],
        };
        assert!(registry.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_registry() {
        let registry = ProviderRegistry::default();
        let err = registry.validate().unwrap_err();
        assert!(err
            .issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::EmptyProviderList)));
    }

    #[test]
    fn test_validate_collects_multiple_issues() {
        let registry = ProviderRegistry {
            providers: vec![provider("", "no-vendor-prefix"), provider("A", "")],
        };
        let err = registry.validate().unwrap_err();
        assert!(err.issues.len() >= 3, "issues: {err}");
    }

    #[test]
    fn test_validate_rejects_duplicate_names_case_insensitive() {
        let registry = ProviderRegistry {
            providers: vec![
                provider("Hero UI", "yui-kit/yui-hero"),
                provider("hero ui", "yui-kit/yui-hero-2"),
            ],
        };
        let err = registry.validate().unwrap_err();
        assert!(err
            .issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::DuplicateName { .. })));
    }

    #[test]
    fn test_validate_rejects_multiple_defaults() {
        let mut a = provider("A", "x/a");
        let mut b = provider("B", "x/b");
        a.default = true;
        b.default = true;
        let registry = ProviderRegistry {
            providers: vec![a, b],
        };
        let err = registry.validate().unwrap_err();
        assert!(err
            .issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::MultipleDefaults { .. })));
    }

    #[test]
    fn test_default_index_prefers_flagged_provider() {
        let mut b = provider("B", "x/b");
        b.default = true;
        let registry = ProviderRegistry {
            providers: vec![provider("A", "x/a"), b],
        };
        assert_eq!(registry.default_index(), 1);

        let unflagged = ProviderRegistry {
            providers: vec![provider("A", "x/a")],
        };
        assert_eq!(unflagged.default_index(), 0);
    }

    #[test]
    fn test_by_name_is_case_insensitive() {
        let registry = ProviderRegistry {
            providers: vec![provider("Hero UI", "yui-kit/yui-hero")],
        };
        assert!(registry.by_name("hero ui").is_some());
        assert!(registry.by_name("Shadcn").is_none());
    }
}
