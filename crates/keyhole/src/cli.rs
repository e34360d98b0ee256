#![forbid(unsafe_code)]

//! Command-line argument parsing.
//!
//! Arguments are parsed by hand in `--flag=value` form. Every option is an
//! override: anything left unset falls through to the environment, the config
//! file, and finally the built-in defaults (see [`crate::config`]).

use std::env;
use std::path::PathBuf;
use std::process;

use keyhole_style::ColorProfile;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
KeyHole front-panel display

USAGE:
    keyhole [OPTIONS]

OPTIONS:
    --config=PATH        Read settings from a JSON file
    --log-level=LEVEL    error, warning, info, debug, trace or off (default: warning)
    --log-file=PATH      Append log output to PATH (logs are discarded otherwise)
    --theme=NAME         Start with the named theme (default: main)
    --splash-secs=N      Seconds the splash screen stays up (default: 5)
    --colors=DEPTH       Color depth: 16, 256 (default) or truecolor
    --no-buttons         Keyboard only, even on button-equipped hardware
    --simulate-buttons   Bind the configured pins to f13.. without GPIO
    --help, -h           Show this help message
    --version, -V        Show version

KEYBINDINGS:
    Esc / q / Q          Quit
    Ctrl+L               Redraw the screen
    Enter / Space        Skip the splash screen
    F13..F24             Hardware buttons (toggle indicator lines)
    t                    Next theme
    c                    Clear indicator lines

ENVIRONMENT VARIABLES:
    KEYHOLE_CONFIG       Config file used when --config is not given
    KEYHOLE_LOG_LEVEL    Override the configured log level
    KEYHOLE_LOG_FILE     Override the configured log file
    KEYHOLE_THEME        Override the configured theme
    KEYHOLE_LOG          Full tracing filter directive (wins over log level)";

/// Parsed command-line options. `None` means "not given".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Opts {
    pub config: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
    pub theme: Option<String>,
    pub splash_secs: Option<u64>,
    pub colors: Option<ColorProfile>,
    pub no_buttons: bool,
    pub simulate_buttons: bool,
}

/// What the command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliAction {
    Run(Opts),
    Help,
    Version,
}

impl Opts {
    /// Parse the process arguments, exiting on `--help`, `--version`, or a
    /// bad argument.
    pub fn parse() -> Self {
        match Self::parse_from(env::args().skip(1)) {
            Ok(CliAction::Run(opts)) => opts,
            Ok(CliAction::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(CliAction::Version) => {
                println!("keyhole {VERSION}");
                process::exit(0);
            }
            Err(message) => {
                eprintln!("{message}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    /// Parse an argument list (without the program name).
    pub fn parse_from<I, S>(args: I) -> Result<CliAction, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut opts = Self::default();
        for arg in args {
            match arg.as_ref() {
                "--help" | "-h" => return Ok(CliAction::Help),
                "--version" | "-V" => return Ok(CliAction::Version),
                "--no-buttons" => opts.no_buttons = true,
                "--simulate-buttons" => opts.simulate_buttons = true,
                other => {
                    if let Some(val) = other.strip_prefix("--config=") {
                        opts.config = Some(PathBuf::from(val));
                    } else if let Some(val) = other.strip_prefix("--log-level=") {
                        opts.log_level = Some(val.to_string());
                    } else if let Some(val) = other.strip_prefix("--log-file=") {
                        opts.log_file = Some(PathBuf::from(val));
                    } else if let Some(val) = other.strip_prefix("--theme=") {
                        opts.theme = Some(val.to_string());
                    } else if let Some(val) = other.strip_prefix("--splash-secs=") {
                        match val.parse() {
                            Ok(n) => opts.splash_secs = Some(n),
                            Err(_) => return Err(format!("Invalid --splash-secs value: {val}")),
                        }
                    } else if let Some(val) = other.strip_prefix("--colors=") {
                        match parse_color_depth(val) {
                            Some(profile) => opts.colors = Some(profile),
                            None => return Err(format!("Invalid --colors value: {val}")),
                        }
                    } else {
                        return Err(format!("Unknown argument: {other}"));
                    }
                }
            }
        }
        Ok(CliAction::Run(opts))
    }
}

/// `16`, `256`, `truecolor`/`24bit`, or a raw depth such as `16777216`.
pub fn parse_color_depth(value: &str) -> Option<ColorProfile> {
    match value.trim().to_ascii_lowercase().as_str() {
        "truecolor" | "24bit" | "rgb" => Some(ColorProfile::TrueColor),
        other => other.parse().ok().and_then(ColorProfile::from_depth),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(args: &[&str]) -> Opts {
        match Opts::parse_from(args) {
            Ok(CliAction::Run(opts)) => opts,
            other => panic!("expected Run, got {other:?}"),
        }
    }

    #[test]
    fn no_args_overrides_nothing() {
        assert_eq!(run(&[]), Opts::default());
    }

    #[test]
    fn parses_every_flag() {
        let opts = run(&[
            "--config=/etc/keyhole.json",
            "--log-level=debug",
            "--log-file=/tmp/keyhole.log",
            "--theme=space",
            "--splash-secs=2",
            "--colors=truecolor",
            "--no-buttons",
            "--simulate-buttons",
        ]);
        assert_eq!(opts.config, Some(PathBuf::from("/etc/keyhole.json")));
        assert_eq!(opts.log_level.as_deref(), Some("debug"));
        assert_eq!(opts.log_file, Some(PathBuf::from("/tmp/keyhole.log")));
        assert_eq!(opts.theme.as_deref(), Some("space"));
        assert_eq!(opts.splash_secs, Some(2));
        assert_eq!(opts.colors, Some(ColorProfile::TrueColor));
        assert!(opts.no_buttons);
        assert!(opts.simulate_buttons);
    }

    #[test]
    fn help_and_version_short_circuit() {
        assert_eq!(Opts::parse_from(["--theme=x", "-h"]), Ok(CliAction::Help));
        assert_eq!(Opts::parse_from(["--version"]), Ok(CliAction::Version));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Opts::parse_from(["--splash-secs=soon"]).is_err());
        assert!(Opts::parse_from(["--colors=8"]).is_err());
        let err = Opts::parse_from(["--frobnicate"]).unwrap_err();
        assert!(err.contains("--frobnicate"));
    }

    #[test]
    fn color_depths() {
        assert_eq!(parse_color_depth("16"), Some(ColorProfile::Ansi16));
        assert_eq!(parse_color_depth("256"), Some(ColorProfile::Ansi256));
        assert_eq!(parse_color_depth("16777216"), Some(ColorProfile::TrueColor));
        assert_eq!(parse_color_depth("TrueColor"), Some(ColorProfile::TrueColor));
        assert_eq!(parse_color_depth("88"), None);
    }

    #[test]
    fn help_text_lists_env_vars() {
        for var in ["KEYHOLE_CONFIG", "KEYHOLE_LOG_LEVEL", "KEYHOLE_THEME", "KEYHOLE_LOG"] {
            assert!(HELP_TEXT.contains(var), "{var}");
        }
    }
}
