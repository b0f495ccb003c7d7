use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use critter_guide::app::{App, ListOptions};
use critter_guide::config::ConfigLoader;
use critter_guide::domain::{CatalogId, SortOption};
use critter_guide::error::GuideError;
use critter_guide::output::{JsonOutput, OutputMode, TextOutput};
use critter_guide::store::FileStore;
use critter_guide::tui::Browser;

#[derive(Parser)]
#[command(name = "critter-guide")]
#[command(about = "Bug and fish checklists with a found flag per creature")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Print a catalog")]
    List(ListArgs),
    #[command(about = "Flip the found flag of one item")]
    Toggle(ToggleArgs),
    #[command(about = "Browse catalogs interactively")]
    Browse,
}

#[derive(Args)]
struct ListArgs {
    catalog: String,

    #[arg(long)]
    sort: Option<SortOption>,

    #[arg(long)]
    hide_found: bool,

    #[arg(long)]
    search: Option<String>,
}

#[derive(Args)]
struct ToggleArgs {
    catalog: String,
    name: String,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<GuideError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &GuideError) -> u8 {
    match error {
        GuideError::CatalogNotFound(_)
        | GuideError::ItemNotFound { .. }
        | GuideError::ConfigRead(_) => 2,
        GuideError::Parse { .. } => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let store = Arc::new(FileStore::open(config.preferences_path.clone()));
    let app = App::new(config.loader(), store);

    match cli.command {
        Some(Command::List(args)) => run_list(args, &app, output_mode),
        Some(Command::Toggle(args)) => run_toggle(args, &app, output_mode),
        Some(Command::Browse) => run_browse(&app),
        None => match output_mode {
            OutputMode::Interactive => run_browse(&app),
            OutputMode::NonInteractive => Err(miette::Report::msg(
                "command required (try `critter-guide --help`)",
            )),
        },
    }
}

fn run_list(args: ListArgs, app: &App<FileStore>, output_mode: OutputMode) -> miette::Result<()> {
    let catalog: CatalogId = args.catalog.parse()?;
    let options = ListOptions {
        sort: args.sort,
        hide_found: args.hide_found,
        search: args.search,
    };
    let result = app.list(catalog, options)?;
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_list(&result).into_diagnostic(),
        OutputMode::Interactive => TextOutput::print_list(&result).into_diagnostic(),
    }
}

fn run_toggle(
    args: ToggleArgs,
    app: &App<FileStore>,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let catalog: CatalogId = args.catalog.parse()?;
    let result = app.toggle(catalog, &args.name)?;
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_toggle(&result).into_diagnostic(),
        OutputMode::Interactive => TextOutput::print_toggle(&result).into_diagnostic(),
    }
}

fn run_browse(app: &App<FileStore>) -> miette::Result<()> {
    let presenters = vec![
        app.presenter(CatalogId::bugs()),
        app.presenter(CatalogId::fish()),
    ];
    Browser::new(presenters).run()
}
