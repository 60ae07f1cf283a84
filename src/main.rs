// Application entry point for the word count and deadline widget

// Config document loading
mod config;
// External counting tool
mod counter;
// Deadline countdown
mod deadline;
// Window and refresh loop
mod gui;
// Tracing setup
mod logging;
// Data models shared across modules
mod models;

use clap::Parser;
use config::load_config;
use counter::{CommandCounter, CountTool};
use gui::refresher::{RenderModel, fetch_counts};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "ddl-counter", version)]
#[command(about = "Shows word counts of your documents next to a deadline countdown", long_about = None)]
struct Args {
    #[arg(help = "Path to the JSON config")]
    config: PathBuf,
    #[arg(short, long, action = clap::ArgAction::Count, help = "Raise log verbosity (repeatable)")]
    verbose: u8,
    #[arg(long, help = "Count once, print the result and exit without opening a window")]
    once: bool,
}

/// Process exit code when the config or deadline cannot be loaded.
const EXIT_CONFIG: u8 = 2;
/// Process exit code when the window cannot be created.
const EXIT_WINDOW: u8 = 1;

/// Entry point for the application.
fn main() -> ExitCode {
    let args = Args::parse();
    logging::enable_logging(args.verbose);
    ExitCode::from(run(args))
}

/// Loads the config before any window exists so config errors never open one.
/// Returns the process exit code.
fn run(args: Args) -> u8 {
    let config = match load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            return EXIT_CONFIG;
        }
    };

    let tool = CommandCounter::from_config(&config);

    if args.once {
        let counts = fetch_counts(&config, &tool);
        let model = RenderModel::build(&config, &counts, chrono::Local::now().naive_local());
        print!("{}", model.to_text());
        return 0;
    }

    // Height grows with the number of rows
    let rows = config.files.len() + usize::from(config.show_total);
    let height = 110.0 + 34.0 * rows as f32;

    let mut viewport = egui::ViewportBuilder::default()
        .with_title("Counter")
        .with_inner_size([320.0, height])
        .with_resizable(true);
    if config.always_on_top {
        viewport = viewport.with_always_on_top();
    }
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    let tool: Box<dyn CountTool> = Box::new(tool);
    let result = eframe::run_native(
        "Counter",
        options,
        Box::new(|cc| Ok(Box::new(gui::AppState::new(cc, config, tool)))),
    );

    match result {
        Ok(()) => 0,
        Err(e) => {
            error!("window failed: {e}");
            eprintln!("error: {e}");
            EXIT_WINDOW
        }
    }
}
