//! The concrete patch rules the install flow applies to a generated project.
//!
//! Every anchor and marker here is the documented contract with the files
//! Laravel's scaffolder emits. If a future framework release changes one of
//! these spellings, the matching rule reports `PatternNotFound` and the file
//! is left alone; the fix is to update the anchor here, not to loosen it.

use crate::patch::{Anchor, AppendRule, Edit, PatchRule, ScaffoldRule};

pub const ENV_FILE: &str = ".env";
pub const BOOTSTRAP_APP: &str = "bootstrap/app.php";
pub const USER_MODEL: &str = "app/Models/User.php";
pub const TAILWIND_CONFIG: &str = "tailwind.config.js";
pub const WEB_ROUTES: &str = "routes/web.php";
pub const MAKE_INERTIA_COMMAND: &str = "app/Console/Commands/MakeInertiaComponent.php";
pub const MAKE_ORION_COMMAND: &str = "app/Console/Commands/MakeOrionController.php";

pub const MAKE_INERTIA_STUB: &str = include_str!("../../stubs/MakeInertiaComponent.stub");
pub const MAKE_ORION_STUB: &str = include_str!("../../stubs/MakeOrionController.stub");
pub const TAILWIND_HEROUI_STUB: &str = include_str!("../../stubs/UpdatedTailwindConfig.stub");

/// Rename the application in `.env`.
pub fn app_name() -> PatchRule {
    PatchRule {
        label: "env app name",
        marker: Anchor::line_start("APP_NAME=YUI"),
        anchors: vec![Anchor::line_start("APP_NAME=Laravel")],
        edit: Edit::ReplaceLine {
            with: "APP_NAME=YUI".to_string(),
        },
        not_found: "expected the stock APP_NAME=Laravel line".to_string(),
    }
}

/// Pin `.env` to sqlite. The commented `# DB_*` lines stay commented; sqlite
/// needs none of them.
pub fn sqlite_connection() -> PatchRule {
    PatchRule {
        label: "env db connection",
        marker: Anchor::line_start("DB_CONNECTION=sqlite"),
        anchors: vec![Anchor::line_start("DB_CONNECTION=")],
        edit: Edit::ReplaceLine {
            with: "DB_CONNECTION=sqlite".to_string(),
        },
        not_found: "no DB_CONNECTION line in .env".to_string(),
    }
}

/// Switch `.env` to mysql: rewrite the connection line and activate each
/// commented `# DB_*` line with its value. The database name is the project
/// name.
///
/// Marker and anchor differ only by the leading `# `, and `LineStart` never
/// matches through a comment, so an activated line can never be mistaken for
/// a commented one or vice versa.
pub fn mysql_family(project: &str) -> Vec<PatchRule> {
    let mut rules = vec![PatchRule {
        label: "env db connection",
        marker: Anchor::line_start("DB_CONNECTION=mysql"),
        anchors: vec![Anchor::line_start("DB_CONNECTION=")],
        edit: Edit::ReplaceLine {
            with: "DB_CONNECTION=mysql".to_string(),
        },
        not_found: "no DB_CONNECTION line in .env".to_string(),
    }];

    let keys: [(&'static str, &'static str, String); 5] = [
        ("env db host", "DB_HOST", "127.0.0.1".to_string()),
        ("env db port", "DB_PORT", "3306".to_string()),
        ("env db database", "DB_DATABASE", project.to_string()),
        ("env db username", "DB_USERNAME", "root".to_string()),
        ("env db password", "DB_PASSWORD", String::new()),
    ];

    for (label, key, value) in keys {
        rules.push(PatchRule {
            label,
            marker: Anchor::line_start(format!("{key}=")),
            anchors: vec![Anchor::line_start(format!("# {key}="))],
            edit: Edit::ReplaceLine {
                with: format!("{key}={value}"),
            },
            not_found: format!("expected a commented '# {key}=' line from the stock .env"),
        });
    }

    rules
}

/// Register the Spatie middleware aliases inside the `withMiddleware` block
/// of `bootstrap/app.php`.
pub fn middleware_aliases() -> PatchRule {
    PatchRule {
        label: "middleware aliases",
        marker: Anchor::substring(
            r"'role' => \Spatie\Permission\Middleware\RoleMiddleware::class",
        ),
        anchors: vec![Anchor::substring(
            "->withMiddleware(function (Middleware $middleware) {",
        )],
        edit: Edit::InsertAfterLine {
            text: r"        // Spatie Permission middleware
        $middleware->alias([
            'role' => \Spatie\Permission\Middleware\RoleMiddleware::class,
            'permission' => \Spatie\Permission\Middleware\PermissionMiddleware::class,
            'role_or_permission' => \Spatie\Permission\Middleware\RoleOrPermissionMiddleware::class,
        ]);"
                .to_string(),
        },
        not_found: "could not find the withMiddleware(...) block in bootstrap/app.php"
            .to_string(),
    }
}

/// Extend the trait list of `app/Models/User.php` with the Sanctum and
/// Spatie traits. Both trait-line spellings the generator is known to emit
/// are accepted.
///
/// The marker is `, HasRoles;` rather than the bare trait name: the import
/// rule below writes a `use ...\HasRoles;` line, and the bare name would
/// match that import, silently skipping this rule when the two run in the
/// wrong order.
pub fn user_model_traits() -> PatchRule {
    PatchRule {
        label: "user model traits",
        marker: Anchor::substring(", HasRoles;"),
        anchors: vec![
            Anchor::substring("use HasFactory, Notifiable;"),
            Anchor::substring("use HasFactory, Notifiable, HasApiTokens;"),
        ],
        edit: Edit::ReplaceSpan {
            with: "use HasFactory, Notifiable, HasApiTokens, HasRoles;".to_string(),
        },
        not_found: "could not find the HasFactory/Notifiable trait line in app/Models/User.php"
            .to_string(),
    }
}

/// Add the Sanctum and Spatie imports to `app/Models/User.php`, directly
/// below the Notifiable import.
pub fn user_model_imports() -> PatchRule {
    PatchRule {
        label: "user model imports",
        marker: Anchor::substring(r"use Spatie\Permission\Traits\HasRoles;"),
        anchors: vec![Anchor::substring(r"use Illuminate\Notifications\Notifiable;")],
        edit: Edit::InsertAfterLine {
            text: r"use Laravel\Sanctum\HasApiTokens;
use Spatie\Permission\Traits\HasRoles;"
                .to_string(),
        },
        not_found: "could not find the Notifiable import in app/Models/User.php".to_string(),
    }
}

/// Overwrite `tailwind.config.js` with the Hero UI preset.
///
/// Still anchor-gated: a config without a recognizable export shape was
/// written by someone, and gets a notice instead of an overwrite.
pub fn tailwind_heroui() -> PatchRule {
    PatchRule {
        label: "tailwind config",
        marker: Anchor::substring("@heroui/theme"),
        anchors: vec![
            Anchor::substring("export default"),
            Anchor::substring("module.exports"),
        ],
        edit: Edit::ReplaceFile {
            with: TAILWIND_HEROUI_STUB.to_string(),
        },
        not_found: "tailwind.config.js has no recognizable export; not overwriting".to_string(),
    }
}

/// Register a `/health` endpoint at the end of `routes/web.php`.
pub fn health_route() -> AppendRule {
    AppendRule {
        label: "health route",
        present: Anchor::substring("Route::get('/health'"),
        header: "<?php\n\nuse Illuminate\\Support\\Facades\\Route;\n\n".to_string(),
        text: "Route::get('/health', fn () => response()->json(['status' => 'ok']));\n"
            .to_string(),
    }
}

pub fn make_inertia_command() -> ScaffoldRule {
    ScaffoldRule {
        label: "make:inertia command",
        contents: MAKE_INERTIA_STUB.to_string(),
    }
}

pub fn make_orion_command() -> ScaffoldRule {
    ScaffoldRule {
        label: "make:orion command",
        contents: MAKE_ORION_STUB.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::{evaluate, Decision};

    const STOCK_ENV: &str = "\
APP_NAME=Laravel
APP_ENV=local
APP_KEY=
APP_DEBUG=true
APP_URL=http://localhost

DB_CONNECTION=sqlite
# DB_HOST=127.0.0.1
# DB_PORT=3306
# DB_DATABASE=laravel
# DB_USERNAME=root
# DB_PASSWORD=
";

    const STOCK_BOOTSTRAP: &str = "\
<?php

use Illuminate\\Foundation\\Application;
use Illuminate\\Foundation\\Configuration\\Exceptions;
use Illuminate\\Foundation\\Configuration\\Middleware;

return Application::configure(basePath: dirname(__DIR__))
    ->withRouting(
        web: __DIR__.'/../routes/web.php',
        commands: __DIR__.'/../routes/console.php',
        health: '/up',
    )
    ->withMiddleware(function (Middleware $middleware) {
        //
    })
    ->withExceptions(function (Exceptions $exceptions) {
        //
    })->create();
";

    const STOCK_USER_MODEL: &str = "\
<?php

namespace App\\Models;

use Illuminate\\Database\\Eloquent\\Factories\\HasFactory;
use Illuminate\\Foundation\\Auth\\User as Authenticatable;
use Illuminate\\Notifications\\Notifiable;

class User extends Authenticatable
{
    /** @use HasFactory<\\Database\\Factories\\UserFactory> */
    use HasFactory, Notifiable;

    protected $fillable = [
        'name',
        'email',
        'password',
    ];
}
";

    fn apply(content: &str, rule: &PatchRule) -> String {
        match evaluate(content, rule) {
            Decision::Apply { new_content } => new_content,
            other => panic!("rule '{}' did not apply: {:?}", rule.label, other),
        }
    }

    fn apply_all(content: &str, rules: &[PatchRule]) -> String {
        let mut current = content.to_string();
        for rule in rules {
            if let Decision::Apply { new_content } = evaluate(&current, rule) {
                current = new_content;
            }
        }
        current
    }

    #[test]
    fn test_app_name_rule_rewrites_stock_env() {
        let patched = apply(STOCK_ENV, &app_name());
        assert!(patched.starts_with("APP_NAME=YUI\nAPP_ENV=local\n"));
        assert_eq!(evaluate(&patched, &app_name()), Decision::AlreadyPresent);
    }

    #[test]
    fn test_sqlite_rule_touches_only_the_connection_line() {
        let env = "APP_NAME=Laravel\nDB_CONNECTION=mysql\n# DB_HOST=127.0.0.1\n";
        let patched = apply(env, &sqlite_connection());
        assert_eq!(patched, "APP_NAME=Laravel\nDB_CONNECTION=sqlite\n# DB_HOST=127.0.0.1\n");
        assert_eq!(
            evaluate(&patched, &sqlite_connection()),
            Decision::AlreadyPresent
        );
    }

    #[test]
    fn test_sqlite_rule_already_present_on_stock_env() {
        // fresh projects default to sqlite already
        assert_eq!(
            evaluate(STOCK_ENV, &sqlite_connection()),
            Decision::AlreadyPresent
        );
    }

    #[test]
    fn test_mysql_family_activates_commented_lines() {
        let patched = apply_all(STOCK_ENV, &mysql_family("my-shop"));

        assert!(patched.contains("DB_CONNECTION=mysql\n"));
        assert!(patched.contains("DB_HOST=127.0.0.1\n"));
        assert!(patched.contains("DB_PORT=3306\n"));
        assert!(patched.contains("DB_DATABASE=my-shop\n"));
        assert!(patched.contains("DB_USERNAME=root\n"));
        assert!(patched.contains("DB_PASSWORD=\n"));
        assert!(!patched.contains("# DB_"));
        // untouched neighbors
        assert!(patched.contains("APP_URL=http://localhost\n"));
    }

    #[test]
    fn test_mysql_family_is_idempotent() {
        let rules = mysql_family("my-shop");
        let once = apply_all(STOCK_ENV, &rules);
        for rule in &rules {
            assert_eq!(
                evaluate(&once, rule),
                Decision::AlreadyPresent,
                "rule '{}' not idempotent",
                rule.label
            );
        }
        assert_eq!(apply_all(&once, &rules), once);
    }

    #[test]
    fn test_middleware_rule_inserts_inside_block() {
        let patched = apply(STOCK_BOOTSTRAP, &middleware_aliases());

        let block_start = patched
            .find("->withMiddleware(function (Middleware $middleware) {")
            .unwrap();
        let alias = patched.find("$middleware->alias([").unwrap();
        let block_end = patched.find("->withExceptions").unwrap();
        assert!(block_start < alias && alias < block_end);

        assert!(patched
            .contains("'role' => \\Spatie\\Permission\\Middleware\\RoleMiddleware::class,"));
        assert!(patched.contains(
            "'role_or_permission' => \\Spatie\\Permission\\Middleware\\RoleOrPermissionMiddleware::class,"
        ));
        assert_eq!(
            evaluate(&patched, &middleware_aliases()),
            Decision::AlreadyPresent
        );
    }

    #[test]
    fn test_middleware_rule_reports_drifted_bootstrap() {
        let drifted = STOCK_BOOTSTRAP.replace(
            "->withMiddleware(function (Middleware $middleware) {",
            "->withMiddleware(function (Middleware $mw) {",
        );
        assert_eq!(
            evaluate(&drifted, &middleware_aliases()),
            Decision::PatternNotFound
        );
    }

    #[test]
    fn test_user_model_traits_rewrites_stock_line() {
        let patched = apply(STOCK_USER_MODEL, &user_model_traits());
        assert!(patched.contains("use HasFactory, Notifiable, HasApiTokens, HasRoles;"));
        // the docblock @use mention stays as the generator wrote it
        assert!(patched.contains("/** @use HasFactory<\\Database\\Factories\\UserFactory> */"));
        assert_eq!(
            evaluate(&patched, &user_model_traits()),
            Decision::AlreadyPresent
        );
    }

    #[test]
    fn test_user_model_traits_accepts_api_tokens_spelling() {
        let with_tokens =
            STOCK_USER_MODEL.replace("use HasFactory, Notifiable;", "use HasFactory, Notifiable, HasApiTokens;");
        let patched = apply(&with_tokens, &user_model_traits());
        assert!(patched.contains("use HasFactory, Notifiable, HasApiTokens, HasRoles;"));
        assert!(!patched.contains("HasApiTokens, HasApiTokens"));
    }

    #[test]
    fn test_user_model_imports_follow_notifiable() {
        let patched = apply(STOCK_USER_MODEL, &user_model_imports());
        assert!(patched.contains(
            "use Illuminate\\Notifications\\Notifiable;\nuse Laravel\\Sanctum\\HasApiTokens;\nuse Spatie\\Permission\\Traits\\HasRoles;\n"
        ));
        assert_eq!(
            evaluate(&patched, &user_model_imports()),
            Decision::AlreadyPresent
        );
    }

    #[test]
    fn test_user_model_rules_apply_in_either_order() {
        // the HasRoles import must not satisfy the trait rule's marker
        let imports_first = apply(STOCK_USER_MODEL, &user_model_imports());
        let then_traits = apply(&imports_first, &user_model_traits());
        assert!(then_traits.contains("use HasFactory, Notifiable, HasApiTokens, HasRoles;"));

        let traits_first = apply(STOCK_USER_MODEL, &user_model_traits());
        let then_imports = apply(&traits_first, &user_model_imports());
        assert!(then_imports.contains("use Spatie\\Permission\\Traits\\HasRoles;"));
    }

    #[test]
    fn test_tailwind_rule_overwrites_stock_config() {
        let stock = "import defaultTheme from 'tailwindcss/defaultTheme';\n\nexport default {\n    content: [],\n};\n";
        let patched = apply(stock, &tailwind_heroui());
        assert_eq!(patched, TAILWIND_HEROUI_STUB);
        assert_eq!(
            evaluate(&patched, &tailwind_heroui()),
            Decision::AlreadyPresent
        );
    }

    #[test]
    fn test_tailwind_rule_accepts_commonjs_config() {
        let commonjs = "module.exports = {\n    content: [],\n};\n";
        assert!(matches!(
            evaluate(commonjs, &tailwind_heroui()),
            Decision::Apply { .. }
        ));
    }

    #[test]
    fn test_tailwind_stub_carries_its_own_marker() {
        // ReplaceFile is only idempotent if the written content re-matches
        assert!(TAILWIND_HEROUI_STUB.contains("@heroui/theme"));
        assert!(TAILWIND_HEROUI_STUB.contains("export default"));
    }

    #[test]
    fn test_scaffold_stubs_define_their_commands() {
        assert!(MAKE_INERTIA_STUB.contains("make:inertia"));
        assert!(MAKE_INERTIA_STUB.contains("class MakeInertiaComponent"));
        assert!(MAKE_ORION_STUB.contains("make:orion"));
        assert!(MAKE_ORION_STUB.contains("class MakeOrionController"));
    }

    #[test]
    fn test_health_route_present_check_matches_own_text() {
        let rule = health_route();
        assert!(rule.present.matches(&rule.text));
        assert!(rule.present.matches(&format!("{}{}", rule.header, rule.text)));
    }
}
