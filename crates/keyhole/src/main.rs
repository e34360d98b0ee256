#![forbid(unsafe_code)]

//! KeyHole front-panel display entry point.

use std::collections::HashMap;
use std::io;

use keyhole::buttons::{ButtonBindings, open_buttons, start_or_fallback};
use keyhole::cli::Opts;
use keyhole::config::{self, AppConfig};
use keyhole::detect::Hardware;
use keyhole::logging::{self, LogConfig};
use keyhole::DisplayOrchestrator;
use keyhole_core::terminal_session::{SessionOptions, TerminalSession};
use keyhole_runtime::{
    CrosstermEventSource, EventInbox, EventSender, Program, ProgramConfig, event_channel,
};
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};

fn main() {
    let opts = Opts::parse();

    let env: HashMap<String, String> = std::env::vars().collect();
    let config = match config::load_from_sources(&opts, &env).and_then(|c| c.validate().map(|()| c)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    let log = LogConfig {
        level: config.level_filter().unwrap_or(LevelFilter::WARN),
        file: config.log_file.clone(),
    };
    if let Err(e) = logging::init(&log) {
        eprintln!("Failed to open log file: {e}");
        std::process::exit(1);
    }
    info!(theme = %config.theme, version = %config.app_version, "keyhole starting");

    let (sender, inbox) = event_channel();
    let bindings = start_buttons(&opts, &config, &sender);

    let model = match DisplayOrchestrator::new(&config, bindings) {
        Ok(model) => model,
        Err(e) => {
            eprintln!("Failed to initialize: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(model, (sender, inbox), &config) {
        eprintln!("Runtime error: {e}");
        std::process::exit(1);
    }
    info!("keyhole stopped");
}

/// Decide which bindings to display and, on real hardware, start the
/// watchers that feed `sender`.
fn start_buttons(opts: &Opts, config: &AppConfig, sender: &EventSender) -> ButtonBindings {
    if opts.no_buttons {
        return ButtonBindings::none();
    }
    let bindings = match config.button_pins().and_then(|pins| ButtonBindings::from_pins(&pins)) {
        Ok(bindings) => bindings,
        Err(e) => {
            warn!(error = %e, "button map rejected");
            return ButtonBindings::none();
        }
    };
    if opts.simulate_buttons {
        info!(buttons = bindings.len(), "simulated buttons, use f13 and up");
        return bindings;
    }
    if !Hardware::default().buttons_available() {
        return ButtonBindings::none();
    }
    let source = open_buttons(&bindings);
    start_or_fallback(bindings, source, sender)
}

fn run(
    model: DisplayOrchestrator,
    channel: (EventSender, EventInbox),
    config: &AppConfig,
) -> io::Result<()> {
    let session = TerminalSession::new(SessionOptions::default())?;
    let events = CrosstermEventSource::new(session);
    let program_config = ProgramConfig {
        color_profile: config.colors,
        ..ProgramConfig::default()
    };
    let mut program = Program::with_channel(model, events, io::stdout(), program_config, channel)?;

    let result = program.run();
    // Restore the terminal before anything else reaches stdout.
    drop(program);
    println!();
    result
}
