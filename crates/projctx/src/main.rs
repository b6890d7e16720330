use anyhow::{Context, Result as AnyhowResult};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use projctx::app::{self, App};
use projctx::config::Config;
use projctx::config_io::{ConfigResolver, DirectoryContext};
use projctx::prompt::LinePrompter;
use projctx::services::{log_dirs, tracing_setup};
use projctx_core::clock::RealClock;
use projctx_core::commands::{self, CommandOutcome};
use projctx_core::prompt::Prompter;
use projctx_core::virtual_window::WindowState;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Named window layouts per project
#[derive(Parser, Debug)]
#[command(name = "projctx")]
#[command(about = "Save, switch and restore named editor layouts", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Workspace root (default: current directory)
    #[arg(long, short = 'w', value_name = "DIR", global = true)]
    workspace: Option<PathBuf>,

    /// Exported window arrangement to capture from and restore into
    #[arg(long, value_name = "PATH", global = true)]
    state: Option<PathBuf>,

    /// Path to configuration file, instead of the user and project layers
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Path to log file (default: $XDG_STATE_HOME/projctx/logs)
    #[arg(long, value_name = "PATH", global = true)]
    log_file: Option<PathBuf>,

    /// Answer yes to every confirmation
    #[arg(long, short = 'y', global = true)]
    yes: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,

    /// Print the directories and files used by projctx and exit
    #[arg(long)]
    show_paths: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List saved contexts, most recently used first
    List,
    /// Print one saved context as JSON
    Show {
        /// Context name or id
        context: String,
    },
    /// Capture the window as a new context and select it
    Save {
        /// Name of the new context; asked for when omitted
        name: Option<String>,
    },
    /// Pick a context and restore it
    Switch {
        /// Write the resulting window arrangement here
        #[arg(long, value_name = "PATH")]
        output_state: Option<PathBuf>,
    },
    /// Restore a context and print the window operations it took
    Restore {
        /// Context name or id
        context: String,
        #[arg(long, value_enum, default_value_t = PlanFormat::Json)]
        format: PlanFormat,
        /// Write the resulting window arrangement here
        #[arg(long, value_name = "PATH")]
        output_state: Option<PathBuf>,
    },
    /// Replace a context's layout with the current window
    Override {
        /// Context name or id
        context: String,
    },
    /// Give a context a new name
    Rename {
        /// Context name or id
        context: String,
        name: String,
    },
    /// Delete one context; picked interactively when omitted
    Delete {
        /// Context name or id
        context: Option<String>,
    },
    /// Delete every saved context
    Clear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PlanFormat {
    Json,
    Text,
}

fn main() -> AnyhowResult<ExitCode> {
    let args = Args::parse();

    let workspace = resolve_workspace(args.workspace.as_deref())?;
    let dir_context =
        DirectoryContext::from_system().context("Failed to determine config directory")?;
    let config = load_config(&args, &dir_context, &workspace)?;

    if args.show_paths {
        log_dirs::print_all_paths(&dir_context.config_dir, &config.storage_path(&workspace));
        return Ok(ExitCode::SUCCESS);
    }

    if args.dump_config {
        let json =
            serde_json::to_string_pretty(&config).context("Failed to serialize config")?;
        println!("{}", json);
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = args.command.as_ref() else {
        Args::command()
            .print_help()
            .context("Failed to print help")?;
        return Ok(ExitCode::SUCCESS);
    };

    initialize_app(&args)?;

    let state = match &args.state {
        Some(path) => app::load_window_state(path)?,
        None => WindowState::default(),
    };
    let app = App::new(workspace, &config, state, RealClock::shared());
    let prompter = LinePrompter::stdio(args.yes);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let outcome = runtime.block_on(run(&app, &prompter, command))?;

    tracing::info!("Finished with {:?}", outcome);
    Ok(match outcome {
        CommandOutcome::Completed | CommandOutcome::Cancelled => ExitCode::SUCCESS,
        CommandOutcome::Declined | CommandOutcome::Failed => ExitCode::FAILURE,
    })
}

fn initialize_app(args: &Args) -> AnyhowResult<()> {
    let log_file = args
        .log_file
        .clone()
        .unwrap_or_else(log_dirs::main_log_path);
    tracing_setup::init_global(&log_file)
        .with_context(|| format!("Failed to create log file {}", log_file.display()))?;

    log_dirs::cleanup_stale_logs();

    tracing::info!("projctx starting: {:?}", args.command);
    Ok(())
}

fn resolve_workspace(workspace: Option<&Path>) -> AnyhowResult<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let workspace = match workspace {
        Some(path) => cwd.join(path),
        None => cwd,
    };
    if !workspace.is_dir() {
        anyhow::bail!("Workspace {} is not a directory", workspace.display());
    }
    Ok(workspace)
}

fn load_config(
    args: &Args,
    dir_context: &DirectoryContext,
    workspace: &Path,
) -> AnyhowResult<Config> {
    match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => ConfigResolver::new(dir_context.clone(), workspace.to_path_buf())
            .resolve()
            .context("Failed to load configuration"),
    }
}

async fn run(
    app: &App,
    prompter: &dyn Prompter,
    command: &Command,
) -> AnyhowResult<CommandOutcome> {
    let manager = app.manager();
    let outcome = match command {
        Command::List => {
            let contexts = manager.list().await.context("Failed to list contexts")?;
            if contexts.is_empty() {
                prompter.show_info("No saved contexts found.").await;
            } else {
                let current = manager.current().await;
                print!("{}", app::render_list(&contexts, current.as_ref()));
            }
            CommandOutcome::Completed
        }
        Command::Show { context } => {
            let found = manager.find(context).await?;
            let json = serde_json::to_string_pretty(&found).context("Failed to serialize context")?;
            println!("{}", json);
            CommandOutcome::Completed
        }
        Command::Save { name: Some(name) } => {
            let created = manager.create(name).await.context("Failed to save context")?;
            prompter
                .show_info(&format!("Context \"{}\" saved and selected!", created.name))
                .await;
            CommandOutcome::Completed
        }
        Command::Save { name: None } => commands::save_context(manager, prompter).await,
        Command::Switch { output_state } => {
            let outcome = commands::switch_context(manager, prompter).await;
            if outcome == CommandOutcome::Completed {
                write_output_state(app, output_state.as_deref())?;
            }
            outcome
        }
        Command::Restore {
            context,
            format,
            output_state,
        } => {
            let found = manager.find(context).await?;
            app.window().clear_operations();
            let (restored, report) = manager
                .switch_to(&found.id)
                .await
                .with_context(|| format!("Failed to restore context \"{}\"", found.name))?;

            let operations = app.window().operations();
            match format {
                PlanFormat::Json => {
                    let json = serde_json::to_string_pretty(&operations)
                        .context("Failed to serialize operations")?;
                    println!("{}", json);
                }
                PlanFormat::Text => print!("{}", app::render_plan(&operations)),
            }
            eprintln!("{}: {}", restored.name, report.summary());
            write_output_state(app, output_state.as_deref())?;
            CommandOutcome::Completed
        }
        Command::Override { context } => {
            app.select(context).await?;
            commands::override_context(manager, prompter).await
        }
        Command::Rename { context, name } => {
            let found = manager.find(context).await?;
            let renamed = manager
                .rename(&found.id, name)
                .await
                .context("Failed to rename context")?;
            prompter
                .show_info(&format!(
                    "Context \"{}\" renamed to \"{}\".",
                    found.name, renamed.name
                ))
                .await;
            CommandOutcome::Completed
        }
        Command::Delete {
            context: Some(context),
        } => {
            let found = manager.find(context).await?;
            let confirmed = prompter
                .confirm(
                    &format!("Are you sure you want to delete \"{}\"?", found.name),
                    "Delete",
                )
                .await;
            if !confirmed {
                return Ok(CommandOutcome::Cancelled);
            }
            manager
                .delete(&found.id)
                .await
                .context("Failed to delete context")?;
            prompter
                .show_info(&format!("Context \"{}\" deleted.", found.name))
                .await;
            CommandOutcome::Completed
        }
        Command::Delete { context: None } => commands::delete_context(manager, prompter).await,
        Command::Clear => commands::clear_contexts(manager, prompter).await,
    };
    Ok(outcome)
}

fn write_output_state(app: &App, path: Option<&Path>) -> AnyhowResult<()> {
    if let Some(path) = path {
        app::write_window_state(path, &app.window().state())?;
        tracing::debug!(
            "Wrote window state of {} to {}",
            app.workspace().display(),
            path.display()
        );
    }
    Ok(())
}
