use crate::prompt::{nearest, Prompter};
use crate::registry::{installer_supports, Provider, ProviderRegistry};
use std::fmt;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_PROJECT_NAME: &str = "yui-laravel-project";

/// Package used when no UI provider is usable; plain framework skeleton.
pub const FALLBACK_PACKAGE: &str = "laravel/laravel";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Database {
    Sqlite,
    Mysql,
}

impl Database {
    pub fn as_str(&self) -> &'static str {
        match self {
            Database::Sqlite => "sqlite",
            Database::Mysql => "mysql",
        }
    }

    pub fn parse(value: &str) -> Option<Database> {
        if value.eq_ignore_ascii_case("sqlite") {
            Some(Database::Sqlite)
        } else if value.eq_ignore_ascii_case("mysql") {
            Some(Database::Mysql)
        } else {
            None
        }
    }
}

impl fmt::Display for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the install flow needs, collected before any step runs.
///
/// `provider` is `None` when the registry had no usable entry; the flow then
/// falls back to the plain skeleton package and skips provider-specific
/// steps.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub name: String,
    pub database: Database,
    pub provider: Option<Provider>,
    pub breeze: bool,
    pub orion: bool,
    pub permission: bool,
    pub extras: bool,
    pub assets: Option<PathBuf>,
}

impl InstallOptions {
    pub fn package(&self) -> &str {
        self.provider
            .as_ref()
            .map(|p| p.package.as_str())
            .unwrap_or(FALLBACK_PACKAGE)
    }
}

/// Command-line answers. `None`/`false` means the question is still open and
/// will be asked interactively, or answered with its default under
/// `--no-interaction`.
#[derive(Debug, Default, Clone)]
pub struct Flags {
    pub name: Option<String>,
    pub database: Option<Database>,
    pub ui: Option<String>,
    pub breeze: bool,
    pub orion: bool,
    pub permission: bool,
    pub extras: bool,
    pub assets: Option<PathBuf>,
    pub no_interaction: bool,
}

#[derive(Error, Debug)]
pub enum OptionsError {
    #[error("invalid project name '{name}': {reason}")]
    InvalidProjectName { name: String, reason: &'static str },

    #[error("unknown UI provider '{name}'{}", suggestion_suffix(.suggestion))]
    UnknownProvider {
        name: String,
        suggestion: Option<String>,
    },

    #[error("failed to read interactive input: {0}")]
    Io(#[from] std::io::Error),
}

fn suggestion_suffix(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(name) => format!(" (did you mean '{name}'?)"),
        None => String::new(),
    }
}

/// The project name becomes a directory name and the mysql database name,
/// so anything that cannot serve as both is rejected up front.
pub fn validate_project_name(name: &str) -> Result<(), OptionsError> {
    let reject = |reason| {
        Err(OptionsError::InvalidProjectName {
            name: name.to_string(),
            reason,
        })
    };

    if name.is_empty() {
        return reject("name is empty");
    }
    if name.contains('/') || name.contains('\\') {
        return reject("path separators are not allowed");
    }
    if name.starts_with('.') {
        return reject("must not start with '.'");
    }
    if name.starts_with('-') {
        return reject("must not start with '-'");
    }
    if name.chars().any(char::is_whitespace) {
        return reject("whitespace is not allowed");
    }
    Ok(())
}

/// Collect every install option, in a fixed question order: name, database,
/// UI provider, Breeze, Orion, Spatie permission, npm extras.
///
/// Flags pre-answer their question; `--no-interaction` answers everything
/// still open with its default. Nothing is executed here, so a failure exits
/// before the machine is touched.
pub fn gather<R: BufRead, W: Write>(
    flags: Flags,
    registry: &ProviderRegistry,
    prompter: &mut Prompter<R, W>,
) -> Result<InstallOptions, OptionsError> {
    let name = match flags.name {
        Some(name) => {
            validate_project_name(&name)?;
            name
        }
        None if flags.no_interaction => DEFAULT_PROJECT_NAME.to_string(),
        None => loop {
            let answer = prompter.ask_text("Enter the project name", DEFAULT_PROJECT_NAME)?;
            match validate_project_name(&answer) {
                Ok(()) => break answer,
                Err(e) => prompter.note(&e.to_string())?,
            }
        },
    };

    let database = match flags.database {
        Some(database) => database,
        None if flags.no_interaction => Database::Sqlite,
        None => {
            let index =
                prompter.ask_choice("Which database will you use?", &["sqlite", "mysql"], 0)?;
            if index == 1 {
                Database::Mysql
            } else {
                Database::Sqlite
            }
        }
    };

    let mut eligible: Vec<&Provider> = Vec::new();
    for provider in &registry.providers {
        match installer_supports(provider.requires.as_deref()) {
            Ok(true) => eligible.push(provider),
            Ok(false) => {}
            Err(e) => prompter.note(&format!(
                "Skipping provider '{}': {}",
                provider.name, e
            ))?,
        }
    }

    let provider = if eligible.is_empty() {
        prompter.note(
            "No usable UI providers in the registry; continuing with the plain laravel/laravel skeleton.",
        )?;
        None
    } else if let Some(wanted) = &flags.ui {
        match eligible
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(wanted))
        {
            Some(chosen) => Some((*chosen).clone()),
            None => {
                let names: Vec<&str> = eligible.iter().map(|p| p.name.as_str()).collect();
                return Err(OptionsError::UnknownProvider {
                    name: wanted.clone(),
                    suggestion: nearest(wanted, &names).map(str::to_string),
                });
            }
        }
    } else if flags.no_interaction {
        Some(eligible[default_index(&eligible)].clone())
    } else {
        let names: Vec<&str> = eligible.iter().map(|p| p.name.as_str()).collect();
        let index = prompter.ask_choice("Which UI provider?", &names, default_index(&eligible))?;
        Some(eligible[index].clone())
    };

    let mut ask_addon = |question: &str, flag: bool| -> Result<bool, OptionsError> {
        if flag {
            Ok(true)
        } else if flags.no_interaction {
            Ok(false)
        } else {
            Ok(prompter.ask_yes_no(question, false)?)
        }
    };

    let breeze = ask_addon("Install Breeze authentication (React + Pest)?", flags.breeze)?;
    let orion = ask_addon("Install Orion REST scaffolding?", flags.orion)?;
    let permission = ask_addon("Install Spatie roles and permissions?", flags.permission)?;
    let extras = ask_addon(
        "Install the standard npm extras (zustand, react-icons, react-query)?",
        flags.extras,
    )?;

    Ok(InstallOptions {
        name,
        database,
        provider,
        breeze,
        orion,
        permission,
        extras,
        assets: flags.assets,
    })
}

fn default_index(eligible: &[&Provider]) -> usize {
    eligible.iter().position(|p| p.default).unwrap_or(0)
}
