mod cli;
mod commands;
mod config;
mod engine;
mod membership;
mod paths;
mod permission;
mod resource;
mod schema;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use declarative::{ApplyContext, Mode};
use std::io;
use std::process::ExitCode;
use std::rc::Rc;

use config::{Connection, ConnectionArgs, FileConfig};
use engine::{Output, Session};
use resource::{repo_group, repository, user, user_group};

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub json: bool,
    pub dry_run: bool,
    pub connection: ConnectionArgs,
}

impl Context {
    pub fn apply_context(&self) -> ApplyContext {
        ApplyContext::new(Mode::from_dry_run(self.dry_run))
    }

    pub fn output(&self) -> Output {
        Output {
            json: self.json,
            quiet: self.quiet,
        }
    }

    /// Resolve connection settings from flags, environment and config file
    pub fn connection(&self) -> Result<Connection> {
        Connection::resolve(&self.connection, &FileConfig::load()?)
    }

    /// Connect and identify the server
    pub fn connect(&self) -> Result<Rc<Session>> {
        self.connect_to(&self.connection()?)
    }

    pub fn connect_to(&self, connection: &Connection) -> Result<Rc<Session>> {
        log::debug!("Connecting to {}", connection.endpoint());
        Session::connect(connection.client())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        json: cli.json,
        dry_run: cli.dry_run,
        connection: ConnectionArgs {
            url: cli.url,
            api_key: cli.api_key,
            insecure: cli.insecure,
        },
    };

    let result = match cli.command {
        Command::ServerInfo => commands::server::run(&ctx),
        Command::Apply(args) => commands::apply::run(&ctx, &args),
        Command::Repo(args) => commands::entity::run(&ctx, &repository::KIND, args),
        Command::RepoGroup(args) => commands::entity::run(&ctx, &repo_group::KIND, args),
        Command::User(args) => commands::entity::run(&ctx, &user::KIND, args),
        Command::UserGroup(args) => commands::entity::run(&ctx, &user_group::KIND, args),
        Command::Membership(args) => commands::membership::run(&ctx, args),
        Command::Permission(args) => commands::permission::run(&ctx, args),
        Command::Completions { shell } => {
            generate(shell, &mut Cli::command(), "repoconverge", &mut io::stdout());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

/// One message for the whole failure, plus a hint for remote errors
fn report_error(err: &anyhow::Error) {
    ui::error(&format!("{err:#}"));

    if let Some(remote) = err.chain().find_map(|e| e.downcast_ref::<rpckit::Error>()) {
        let category = remote.category();
        ui::dim(&format!("{}: {}", category.description(), category.advice()));
    }
}
