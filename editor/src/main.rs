mod project;
mod script;
mod session;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use sceneforge_core::HistoryConfig;

use session::Session;

/// Replays a scene edit script against an in-memory world with full
/// undo/redo history.
#[derive(Parser, Debug)]
#[command(
    name = "sceneforge",
    version,
    about = "SceneForge headless scene editor",
    long_about = "Runs a line-oriented edit script (create, move, set, drag, undo, redo, save, load, ...) \
                  against an in-memory scene and prints the result of each command."
)]
struct Args {
    /// Edit script to run
    script: PathBuf,

    /// Project file (`project.toml`) with an optional `[history]` table
    #[arg(long)]
    project: Option<PathBuf>,

    /// Write the final world and history to this JSON file
    #[arg(long)]
    save: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            log::error!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let history = match &args.project {
        Some(path) => {
            let project = project::load_project(path)?;
            log::info!("Project \"{}\"", project.project.name);
            project.history
        }
        None => HistoryConfig::default(),
    };

    let source = std::fs::read_to_string(&args.script)
        .map_err(|e| format!("failed to read {}: {e}", args.script.display()))?;
    let commands = script::parse_script(&source)
        .map_err(|e| format!("{}: {e}", args.script.display()))?;
    log::info!(
        "SceneForge v{}: {} commands from {}",
        sceneforge_core::VERSION,
        commands.len(),
        args.script.display()
    );

    let mut session = Session::new(history).map_err(|e| e.to_string())?;
    session
        .run(&commands, |output| println!("{output}"))
        .map_err(|e| format!("{}: {e}", args.script.display()))?;

    log::info!(
        "Finished with {} object(s), {} undo step(s)",
        session.world().len(),
        session.log().undo_count()
    );
    let issues = session.log().diagnostics().total_issues();
    if issues > 0 {
        log::warn!("{issues} change(s) could not be replayed during this session");
    }

    if let Some(path) = &args.save {
        session.save(path).map_err(|e| e.to_string())?;
    }
    Ok(())
}
