// src/main.rs
use clap::Parser;
use std::{
    fs::{self, OpenOptions},
    io,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};
use tracing_subscriber::EnvFilter;

use fanpad::{
    FanPadError, Result,
    auth::{Authenticator, CloudSession, LoginOutcome, TerminalPrompt},
    cipher::PasswordCipher,
    config::{self, ConfigDocument, GeneralSettings},
    credentials::CredentialStore,
    devices::{find_by_token, full_record_json, online_devices, select_device},
    dispatch::Dispatcher,
    fan::{FanConnector, FanController},
    input::{InputSource, KEYBOARD_HELP, KeyboardPad},
    output::{ConsoleReporter, Reporter, Tone},
    simulator::{SimulatedCloud, SimulatedConnector, SimulatorConfig},
};

// --- Command Line Arguments ---

#[derive(Parser, Debug)]
#[command(author, version, about = "Controls a Xiaomi smart fan from a gamepad.", long_about = None)]
struct CliArgs {
    /// List online devices and print the full record of the chosen one.
    #[arg(long, short = 'd')]
    devices: bool,

    /// Optional path to a TOML configuration file.
    #[arg(long, short = 'c', value_name = "FILE_PATH")]
    config: Option<PathBuf>,
}

// --- Initialization Helper Functions ---

/// Sends tracing output to the log file next to the config, so raw-mode terminal output stays clean.
fn init_logging(config_path: &Path, debug: bool) {
    let default_level = if debug { "fanpad=debug" } else { "fanpad=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let log_path = config::log_path_for(config_path);
    if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Warning: Failed to create log directory {}: {}", parent.display(), e);
        }
    }

    match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init(),
        Err(e) => {
            eprintln!("Warning: Failed to open log file {}: {}", log_path.display(), e);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(io::stderr)
                .init();
        }
    }
}

// --- Mode Functions ---

/// Runs the interactive controller against the selected fan.
fn run_controller<C: FanConnector>(
    connector: &C,
    address: &str,
    token: &str,
    model: Option<&str>,
    reporter: ConsoleReporter,
    debug: bool,
) -> Result<()> {
    let device = connector.connect(address, token, model)?;
    let mut controller = FanController::new(device, reporter);
    controller.print_status()?;

    // Setup termination flag and Ctrl+C handler
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        println!("\nReceived Ctrl-C, signalling termination...");
        r.store(false, Ordering::SeqCst);
    })
    .map_err(|e| FanPadError::Terminal(format!("failed to set Ctrl-C handler: {}", e)))?;

    let reporter = controller.reporter_mut();
    reporter.emit(Tone::Heading, "\nKeyboard pad bindings");
    for (keys, action) in KEYBOARD_HELP {
        reporter.emit(Tone::Debug, &format!("  {:<14} {}", keys, action));
    }

    let mut input = KeyboardPad::new();
    input.initialize()?;
    let result = Dispatcher::new(&mut input, &mut controller, running.clone(), debug).run();
    input.shutdown();

    result
}

fn run(cli_args: CliArgs) -> Result<()> {
    let config_path = config::resolve_config_path(cli_args.config);
    let document = ConfigDocument::load(&config_path)?;
    let (settings, warnings) = GeneralSettings::from_document(&document);

    init_logging(&config_path, settings.debug);
    tracing::info!(config = %config_path.display(), debug = settings.debug, "starting");

    let mut reporter = ConsoleReporter::new(settings.color);
    for warning in &warnings {
        reporter.notice(&format!("\n{}\n", warning));
    }

    let cipher = PasswordCipher::load_or_generate(config::key_path_for(&config_path))?;
    let mut store = CredentialStore::new(config_path.clone(), cipher);
    let cloud = SimulatedCloud::new(SimulatorConfig::from_document(&document)?);
    reporter.notice(&cloud.backend_notice());
    let mut prompt = TerminalPrompt;

    let outcome = Authenticator::new(&mut store, &cloud, &mut prompt, &mut reporter).login()?;
    let session = session_or_denied(outcome)?;

    let records = session.list_devices()?;
    let online = online_devices(&records);
    let index = select_device(&online, &mut io::stdin().lock(), &mut io::stdout())?;
    let selected = &online[index];
    let full_record = find_by_token(&records, &selected.token).ok_or_else(|| {
        FanPadError::InvalidInput(format!("no device record with the token of '{}'", selected.name))
    })?;
    tracing::info!(device = %selected.name, address = %selected.local_ip, "device selected");

    if cli_args.devices {
        println!("\nSelected Device Full Information:");
        println!("\n{}", full_record_json(full_record)?);
        return Ok(());
    }

    run_controller(
        &SimulatedConnector,
        &selected.local_ip,
        &selected.token,
        full_record.model.as_deref(),
        reporter,
        settings.debug,
    )
}

// --- Exit Status ---

/// A denied login ends the run as [`FanPadError::AccessDenied`].
fn session_or_denied(outcome: LoginOutcome) -> Result<Box<dyn CloudSession>> {
    match outcome {
        LoginOutcome::Authenticated(session) => Ok(session),
        LoginOutcome::Denied => Err(FanPadError::AccessDenied),
    }
}

/// Process exit status for a finished run.
fn exit_code(result: &Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(e) => e.exit_code(),
    }
}

// --- Main Function ---

fn main() -> ExitCode {
    let cli_args = CliArgs::parse();

    let result = run(cli_args);
    match &result {
        Ok(()) => {}
        // The authenticator has already told the user.
        Err(FanPadError::AccessDenied) => tracing::info!("login denied, exiting"),
        Err(e) => {
            tracing::error!(error = %e, "exiting with error");
            eprintln!("Error: {}", e);
        }
    }
    ExitCode::from(exit_code(&result))
}
