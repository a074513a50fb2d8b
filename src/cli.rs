use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use declarative::{DesiredAttributes, Presence};
use serde_json::Value;
use std::path::PathBuf;

use crate::permission::Level;

#[derive(Parser)]
#[command(name = "repoconverge")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(
    about = "Reconcile Kallithea and RhodeCode servers with a declared state",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Server base URL
    #[arg(long, env = "REPOCONVERGE_URL", global = true)]
    pub url: Option<String>,

    /// API key of the acting user
    #[arg(long, env = "REPOCONVERGE_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Compute and report changes without applying them
    #[arg(short = 'n', long, global = true)]
    pub dry_run: bool,

    /// Print reports as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Identify the server and check it is supported
    ServerInfo,

    /// Reconcile every object in a manifest
    Apply(ApplyArgs),

    /// Reconcile one repository
    Repo(EntityArgs),

    /// Reconcile one repository group
    RepoGroup(EntityArgs),

    /// Reconcile one user
    User(EntityArgs),

    /// Reconcile one user group
    UserGroup(EntityArgs),

    /// Reconcile user group membership
    Membership(MembershipArgs),

    /// Grant or revoke repository and repository group permissions
    Permission(PermissionArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Manifest file (TOML)
    pub manifest: PathBuf,

    /// Only reconcile matching resources: "type" or "type.name"
    #[arg(short, long)]
    pub target: Option<String>,
}

#[derive(Args)]
pub struct EntityArgs {
    /// Name; nested objects use slashes, e.g. "group/subgroup/repo"
    pub name: String,

    /// Desired presence
    #[arg(short, long, value_enum, default_value = "present")]
    pub state: StateArg,

    /// Attribute to enforce; values are parsed as JSON, falling back to a string
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub attributes: Vec<(String, Value)>,
}

impl EntityArgs {
    /// Attributes from `--set`; `null` leaves an attribute unspecified
    pub fn desired(&self) -> DesiredAttributes {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), Some(value.clone()).filter(|v| !v.is_null())))
            .collect()
    }
}

#[derive(Args)]
pub struct MembershipArgs {
    /// User group (repeatable)
    #[arg(short, long = "group", required = true)]
    pub groups: Vec<String>,

    /// User (repeatable)
    #[arg(short, long = "user", required = true)]
    pub users: Vec<String>,

    /// present adds the users, absent removes them
    #[arg(short, long, value_enum, default_value = "present")]
    pub state: StateArg,
}

#[derive(Args)]
pub struct PermissionArgs {
    /// User subject (repeatable)
    #[arg(long = "user")]
    pub users: Vec<String>,

    /// User group subject (repeatable)
    #[arg(long = "user-group")]
    pub user_groups: Vec<String>,

    /// Repository (repeatable)
    #[arg(long = "repo")]
    pub repositories: Vec<String>,

    /// Repository group (repeatable)
    #[arg(long = "repo-group")]
    pub repo_groups: Vec<String>,

    /// Level to grant; required with --state present
    #[arg(short, long, value_enum)]
    pub level: Option<Level>,

    /// present grants, absent revokes, query reports
    #[arg(short, long, value_enum, default_value = "present")]
    pub state: StateArg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StateArg {
    Present,
    Absent,
    Query,
}

impl From<StateArg> for Presence {
    fn from(state: StateArg) -> Self {
        match state {
            StateArg::Present => Presence::Present,
            StateArg::Absent => Presence::Absent,
            StateArg::Query => Presence::Query,
        }
    }
}

/// Parse `key=value`; the value is JSON when it parses as JSON
fn parse_key_value(s: &str) -> Result<(String, Value), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty attribute name in '{s}'"));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::from(value));
    Ok((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(parse_key_value("private=true").unwrap(), ("private".into(), json!(true)));
        assert_eq!(
            parse_key_value("description=Web site").unwrap(),
            ("description".into(), json!("Web site"))
        );
        assert_eq!(parse_key_value("landing_rev=\"42\"").unwrap().1, json!("42"));
        assert!(parse_key_value("private").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_repo_command() {
        let cli = Cli::try_parse_from([
            "repoconverge",
            "--url",
            "https://code.example.com",
            "repo",
            "web/site",
            "--set",
            "repo_type=git",
            "--set",
            "private=true",
            "--dry-run",
        ])
        .unwrap();

        assert!(cli.dry_run);
        match cli.command {
            Command::Repo(args) => {
                assert_eq!(args.name, "web/site");
                assert_eq!(args.state, StateArg::Present);
                assert_eq!(args.attributes.len(), 2);
            }
            _ => panic!("expected repo command"),
        }
    }

    #[test]
    fn test_set_null_is_unspecified() {
        let cli = Cli::try_parse_from([
            "repoconverge",
            "repo",
            "proj",
            "--set",
            "description=null",
            "--set",
            "private=false",
        ])
        .unwrap();

        let Command::Repo(args) = cli.command else {
            panic!("expected repo command");
        };
        let desired = args.desired();
        assert_eq!(desired.names().collect::<Vec<_>>(), vec!["description", "private"]);
        assert_eq!(
            desired.specified().collect::<Vec<_>>(),
            vec![("private", &json!(false))]
        );
    }

    #[test]
    fn test_permission_command() {
        let cli = Cli::try_parse_from([
            "repoconverge",
            "permission",
            "--user-group",
            "devs",
            "--repo",
            "r1",
            "--level",
            "write",
        ])
        .unwrap();

        match cli.command {
            Command::Permission(args) => {
                assert_eq!(args.user_groups, vec!["devs"]);
                assert_eq!(args.level, Some(Level::Write));
            }
            _ => panic!("expected permission command"),
        }
    }
}
