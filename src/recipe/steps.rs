use crate::patch::{AppendRule, PatchRule, ScaffoldRule};
use crate::process::CommandSpec;
use crate::recipe::options::{Database, InstallOptions};
use crate::recipe::rules;
use std::path::{Path, PathBuf};

/// npm packages every project gets when extras are enabled; the chosen
/// provider's own list is appended after these.
pub const BASE_NPM_EXTRAS: [&str; 3] = ["zustand", "react-icons", "@tanstack/react-query"];

/// The one tailwind preset this build knows how to write.
pub const TAILWIND_PRESET_HEROUI: &str = "heroui";

/// One unit of work in the install flow.
#[derive(Debug)]
pub enum Step {
    /// Section header printed before a group of related steps.
    Note(String),
    /// External tool invocation, blocking, stdio inherited.
    Run(CommandSpec),
    Patch {
        target: &'static str,
        rule: PatchRule,
    },
    Append {
        target: &'static str,
        rule: AppendRule,
    },
    Scaffold {
        target: &'static str,
        rule: ScaffoldRule,
    },
    /// Swap a project tree for a prepared one.
    ReplaceTree {
        source: PathBuf,
        target: &'static str,
    },
    /// Known at plan time to be unrunnable; printed and counted, never fatal.
    Skip { label: String, reason: String },
}

impl Step {
    pub fn describe(&self) -> String {
        match self {
            Step::Note(msg) => msg.clone(),
            Step::Run(spec) => format!("$ {}", spec),
            Step::Patch { target, rule } => format!("patch {} ({})", target, rule.label),
            Step::Append { target, rule } => format!("append to {} ({})", target, rule.label),
            Step::Scaffold { target, rule } => format!("scaffold {} ({})", target, rule.label),
            Step::ReplaceTree { source, target } => {
                format!("replace {} with {}", target, source.display())
            }
            Step::Skip { label, reason } => format!("skip {} ({})", label, reason),
        }
    }
}

/// The full ordered flow for one project, built before anything runs.
#[derive(Debug)]
pub struct Plan {
    /// Directory `composer create-project` will create.
    pub project_root: PathBuf,
    /// Directory the installer was invoked from; create-project runs here.
    pub base_dir: PathBuf,
    pub steps: Vec<Step>,
}

/// Build the step list for the collected options. Pure: no filesystem reads,
/// no prompts, nothing executed.
pub fn plan(options: &InstallOptions, base_dir: &Path) -> Plan {
    let project_root = base_dir.join(&options.name);
    let mut steps = Vec::new();

    steps.push(Step::Note(format!(
        "Creating project in {}",
        project_root.display()
    )));
    steps.push(Step::Run(CommandSpec::new(
        "composer",
        [
            "create-project".to_string(),
            options.package().to_string(),
            project_root.display().to_string(),
        ],
        base_dir,
    )));

    steps.push(Step::Patch {
        target: rules::ENV_FILE,
        rule: rules::app_name(),
    });
    match options.database {
        Database::Sqlite => steps.push(Step::Patch {
            target: rules::ENV_FILE,
            rule: rules::sqlite_connection(),
        }),
        Database::Mysql => {
            for rule in rules::mysql_family(&options.name) {
                steps.push(Step::Patch {
                    target: rules::ENV_FILE,
                    rule,
                });
            }
        }
    }

    steps.push(Step::Note(
        "Installing and building node dependencies".to_string(),
    ));
    steps.push(run_in(&project_root, "npm", &["i"]));
    steps.push(run_in(&project_root, "npm", &["run", "build"]));

    if options.breeze {
        steps.push(Step::Note("Installing Breeze".to_string()));
        steps.push(run_in(
            &project_root,
            "composer",
            &["require", "laravel/breeze", "--dev"],
        ));
        steps.push(run_in(
            &project_root,
            "php",
            &["artisan", "breeze:install", "react", "--pest"],
        ));
        steps.push(Step::Scaffold {
            target: rules::MAKE_INERTIA_COMMAND,
            rule: rules::make_inertia_command(),
        });
    }

    if options.orion {
        steps.push(Step::Note("Installing Orion".to_string()));
        steps.push(run_in(&project_root, "php", &["artisan", "install:api"]));
        steps.push(run_in(
            &project_root,
            "composer",
            &["require", "tailflow/laravel-orion"],
        ));
        steps.push(Step::Scaffold {
            target: rules::MAKE_ORION_COMMAND,
            rule: rules::make_orion_command(),
        });
        steps.push(Step::Append {
            target: rules::WEB_ROUTES,
            rule: rules::health_route(),
        });
    }

    if options.permission {
        steps.push(Step::Note("Installing Spatie Permission".to_string()));
        steps.push(run_in(
            &project_root,
            "composer",
            &["require", "spatie/laravel-permission"],
        ));
        steps.push(run_in(
            &project_root,
            "php",
            &[
                "artisan",
                "vendor:publish",
                r"--provider=Spatie\Permission\PermissionServiceProvider",
            ],
        ));
        steps.push(Step::Patch {
            target: rules::BOOTSTRAP_APP,
            rule: rules::middleware_aliases(),
        });
        // trait line first; see the marker note on user_model_traits
        steps.push(Step::Patch {
            target: rules::USER_MODEL,
            rule: rules::user_model_traits(),
        });
        steps.push(Step::Patch {
            target: rules::USER_MODEL,
            rule: rules::user_model_imports(),
        });
    }

    if options.extras {
        let mut packages: Vec<String> =
            BASE_NPM_EXTRAS.iter().map(|s| s.to_string()).collect();
        if let Some(provider) = &options.provider {
            for pkg in &provider.npm {
                if !packages.iter().any(|p| p == pkg) {
                    packages.push(pkg.clone());
                }
            }
        }
        steps.push(Step::Note("Installing npm extras".to_string()));
        let mut args = vec!["i".to_string()];
        args.extend(packages);
        steps.push(Step::Run(CommandSpec::new("npm", args, &project_root)));
    }

    if let Some(provider) = &options.provider {
        match provider.tailwind.as_deref() {
            Some(TAILWIND_PRESET_HEROUI) => steps.push(Step::Patch {
                target: rules::TAILWIND_CONFIG,
                rule: rules::tailwind_heroui(),
            }),
            Some(unknown) => steps.push(Step::Skip {
                label: "tailwind config".to_string(),
                reason: format!("unknown tailwind preset '{}' in the registry", unknown),
            }),
            None => {}
        }
    }

    if let Some(assets) = &options.assets {
        steps.push(Step::Note("Copying prepared assets".to_string()));
        steps.push(Step::ReplaceTree {
            source: assets.join("resources"),
            target: "resources",
        });
        steps.push(Step::ReplaceTree {
            source: assets.join("routes"),
            target: "routes",
        });
        steps.push(Step::ReplaceTree {
            source: assets.join("images"),
            target: "public/images",
        });
    }

    Plan {
        project_root,
        base_dir: base_dir.to_path_buf(),
        steps,
    }
}

fn run_in(root: &Path, program: &str, args: &[&str]) -> Step {
    Step::Run(CommandSpec::new(program, args.iter().copied(), root))
}
