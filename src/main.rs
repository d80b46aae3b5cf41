use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

use bookquest::cli::{Command, ExportCommand, StateCommand};
use bookquest::store::{LocalFsStore, resolve_store_path};

fn main() -> ExitCode {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn try_main() -> anyhow::Result<()> {
    let cli = bookquest::cli::Cli::parse();
    bookquest::logging::init(cli.quiet).context("init logging")?;
    tracing::debug!(?cli, "parsed cli");

    let store = LocalFsStore::new(resolve_store_path(cli.store.as_deref()));
    tracing::debug!(store = %store.path().display(), "using store");

    match cli.command {
        Command::Detect(args) => {
            bookquest::import::detect(args).context("detect")?;
        }
        Command::Import(args) => {
            bookquest::import::run(args, &store).context("import")?;
        }
        Command::Export {
            command: ExportCommand::Books(args),
        } => {
            bookquest::export::books(args, &store).context("export books")?;
        }
        Command::Export {
            command: ExportCommand::State(args),
        } => {
            bookquest::export::state(args, &store).context("export state")?;
        }
        Command::Mark(args) => {
            bookquest::state::mark(args, &store).context("mark")?;
        }
        Command::State {
            command: StateCommand::Import(args),
        } => {
            bookquest::state::import(args, &store).context("state import")?;
        }
        Command::State {
            command: StateCommand::Clear,
        } => {
            bookquest::state::clear(&store).context("state clear")?;
        }
        Command::List(args) => {
            bookquest::list::run(args, &store).context("list")?;
        }
        Command::Stats(args) => {
            bookquest::stats::run(args, &store).context("stats")?;
        }
        Command::Achievements(args) => {
            bookquest::achievements::run(args, &store).context("achievements")?;
        }
    }

    Ok(())
}
