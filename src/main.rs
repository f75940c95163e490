// structed: step debugger front-end with a live struct and pointer graph

use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use eyre::{bail, Result, WrapErr};
use ratatui::{backend::CrosstermBackend, Terminal};

use structed::config::Config;
use structed::editor::completion::{Completer, WordList};
use structed::editor::SourceView;
use structed::logging;
use structed::session::Session;
use structed::stepper::engine::TraceEngine;
use structed::stepper::trace::Trace;
use structed::ui::{App, Theme};

/// Step through a recorded execution trace with a live struct/pointer graph
#[derive(Debug, Parser)]
#[command(name = "structed", version)]
struct Args {
    /// Execution trace (JSON)
    trace: PathBuf,

    /// Source file; defaults to the one named in the trace
    #[arg(long)]
    source: Option<PathBuf>,

    /// Config file path (uses ~/.structed.toml if not specified)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(args.config.as_deref()).wrap_err("Failed to load configuration")?;

    // Logs go to a file; the terminal belongs to the TUI
    let (log_path, _log_guard) = logging::init_file_logging(&config.logging.level)?;
    eprintln!("structed logs: {}", log_path.display());

    let trace = Trace::load(&args.trace)?;
    let source_path = match args.source.or_else(|| trace.source_path(&args.trace)) {
        Some(path) => path,
        None => bail!(
            "{} does not name its source file; pass --source",
            args.trace.display()
        ),
    };
    let source = fs::read_to_string(&source_path)
        .wrap_err_with(|| format!("Failed to read source file {}", source_path.display()))?;

    let mut words = match &config.editor.wordlist {
        Some(path) => WordList::load(path)
            .wrap_err_with(|| format!("Failed to read word list {}", path.display()))?,
        None => WordList::bundled(),
    };
    let view = SourceView::new(&source);
    words.extend(view.identifiers());
    let completer = Completer::new(words, config.editor.max_completions);

    let steps = trace.steps.len();
    let engine = TraceEngine::new(trace, config.stepper.snapshot_limit_bytes)?;
    let session = Session::new(
        Box::new(engine),
        config.layout.clone(),
        config.stepper.history_capacity,
    );
    tracing::info!(
        trace = %args.trace.display(),
        source = %source_path.display(),
        steps,
        "starting structed"
    );

    let mut app = App::new(
        session,
        view,
        completer,
        Theme::named(config.editor.theme),
        Duration::from_millis(config.stepper.play_interval_ms),
    );

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!("TUI error: {}", err);
        return Err(err.into());
    }
    tracing::info!("structed exited normally");
    Ok(())
}
