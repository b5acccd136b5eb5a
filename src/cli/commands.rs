//! CLI command implementations
//!
//! `init` prepares the data directory. `eval` answers one request and
//! exits. `start` answers requests until EOF, keeping example cursors
//! for the whole session. Responses go to stdout, logs to stderr.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::info_span;
use uuid::Uuid;

use crate::observability::{init_logging, log_event, log_event_with_fields, Event};

use super::args::{Cli, Command};
use super::config::Config;
use super::errors::{CliError, CliErrorCode, CliResult};
use super::io::{read_request, read_requests, write_line, write_response};
use super::session::{Response, Session};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config),
        Command::Eval { config } => eval(&config),
        Command::Start { config } => start(&config),
    }
}

/// Initialize a data directory, writing a default config first if none exists
pub fn init(config_path: &Path) -> CliResult<()> {
    let created = write_default_config(config_path)?;
    let config = prepare(config_path)?;
    initialize(&config, created, &mut io::stdout().lock())
}

/// Answer one request from stdin
pub fn eval(config_path: &Path) -> CliResult<()> {
    let config = prepare(config_path)?;
    eval_with(&config, &mut io::stdin().lock(), &mut io::stdout().lock())
}

/// Serve requests from stdin until EOF
pub fn start(config_path: &Path) -> CliResult<()> {
    let config = prepare(config_path)?;
    serve(&config, io::stdin().lock(), &mut io::stdout().lock())
}

/// Loads the config and installs logging as it specifies.
fn prepare(config_path: &Path) -> CliResult<Config> {
    let config = Config::load(config_path)?;
    init_logging(&config.log_level, config.log_format);
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("config", config_path.display().to_string().as_str()),
            ("data_dir", config.data_dir.as_str()),
        ],
    );
    Ok(config)
}

/// Writes a default config next to `config_path` unless one exists.
///
/// Returns whether a file was written.
pub fn write_default_config(config_path: &Path) -> CliResult<bool> {
    if config_path.exists() {
        return Ok(false);
    }
    let data_dir = match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join("data"),
        _ => PathBuf::from("data"),
    };
    Config::with_data_dir(data_dir.to_string_lossy()).save(config_path)?;
    Ok(true)
}

/// Creates the entity and helper directories.
pub fn initialize<W: Write>(config: &Config, config_created: bool, out: &mut W) -> CliResult<()> {
    if config.is_initialized() {
        return Err(CliError::already_initialized());
    }

    for dir in [config.entity_path(), config.helper_path()] {
        fs::create_dir_all(&dir).map_err(|e| {
            CliError::io_error(format!("Failed to create directory {:?}: {}", dir, e))
        })?;
    }

    log_event_with_fields(Event::Initialized, &[("data_dir", config.data_dir.as_str())]);
    write_response(
        out,
        json!({
            "initialized": true,
            "config_created": config_created,
            "data_dir": config.data_dir
        }),
    )
}

/// Reads one request line and writes one response line.
pub fn eval_with<R: BufRead, W: Write>(config: &Config, input: &mut R, out: &mut W) -> CliResult<()> {
    if !config.is_initialized() {
        return Err(CliError::not_initialized());
    }
    let mut session = Session::new(config.store(), config.coerce_params);

    let span = info_span!("request", request_id = %Uuid::new_v4());
    let _guard = span.enter();
    log_event(Event::RequestReceived);

    let response = match read_request(input) {
        Ok(request) => session.handle(request),
        Err(e) => rejected(e)?,
    };
    write_line(out, &response.to_json())
}

/// Handles request lines until EOF; one response line per request.
pub fn serve<R: BufRead, W: Write>(config: &Config, input: R, out: &mut W) -> CliResult<()> {
    if !config.is_initialized() {
        return Err(CliError::not_initialized());
    }
    let mut session = Session::new(config.store(), config.coerce_params);
    log_event_with_fields(Event::Serving, &[("data_dir", config.data_dir.as_str())]);

    let mut handled = 0u64;
    for request in read_requests(input) {
        let span = info_span!("request", request_id = %Uuid::new_v4());
        let _guard = span.enter();
        log_event(Event::RequestReceived);

        let response = match request {
            Ok(request) => session.handle(request),
            Err(e) => rejected(e)?,
        };
        write_line(out, &response.to_json())?;
        handled += 1;
    }

    log_event_with_fields(Event::ShutdownComplete, &[("requests", handled.to_string().as_str())]);
    Ok(())
}

/// Undecodable requests become error responses; I/O failures end the command.
fn rejected(e: CliError) -> CliResult<Response> {
    if *e.code() == CliErrorCode::IoError {
        return Err(e);
    }
    log_event_with_fields(Event::RequestRejected, &[("reason", e.message())]);
    Ok(e.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::io::Cursor;
    use tempfile::{tempdir, TempDir};

    fn initialized() -> (TempDir, Config) {
        let dir = tempdir().unwrap();
        let config = Config::with_data_dir(dir.path().to_string_lossy());
        initialize(&config, false, &mut Vec::new()).unwrap();
        fs::write(
            config.entity_path().join("Person.json"),
            r#"[{"id": 1, "name": "Ann"}, {"id": 2, "name": "Bob"}]"#,
        )
        .unwrap();
        (dir, config)
    }

    fn lines(out: Vec<u8>) -> Vec<Value> {
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_write_default_config_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pqlmock.json");
        assert!(write_default_config(&path).unwrap());
        assert!(!write_default_config(&path).unwrap());
        let config = Config::load(&path).unwrap();
        assert_eq!(config.data_path(), dir.path().join("data"));
    }

    #[test]
    fn test_initialize_twice_fails() {
        let (_dir, config) = initialized();
        let err = initialize(&config, false, &mut Vec::new()).unwrap_err();
        assert_eq!(err.code_str(), "CLI_ALREADY_INITIALIZED");
    }

    #[test]
    fn test_not_initialized() {
        let dir = tempdir().unwrap();
        let config = Config::with_data_dir(dir.path().join("missing").to_string_lossy());
        let err = serve(&config, Cursor::new(""), &mut Vec::new()).unwrap_err();
        assert_eq!(err.code_str(), "CLI_NOT_INITIALIZED");
    }

    #[test]
    fn test_eval_one_request() {
        let (_dir, config) = initialized();
        let mut input = Cursor::new(r#"{"schema": {"__from__": "Person", "__only__": ["name"]}}"#);
        let mut out = Vec::new();
        eval_with(&config, &mut input, &mut out).unwrap();
        assert_eq!(
            lines(out),
            vec![json!({"status": "ok", "data": [{"name": "Ann"}, {"name": "Bob"}]})]
        );
    }

    #[test]
    fn test_eval_bad_json_is_response() {
        let (_dir, config) = initialized();
        let mut out = Vec::new();
        eval_with(&config, &mut Cursor::new("{oops"), &mut out).unwrap();
        assert_eq!(lines(out)[0]["code"], json!("CLI_BAD_REQUEST"));
    }

    #[test]
    fn test_serve_answers_every_line() {
        let (_dir, config) = initialized();
        let input = [
            r#"{"schema": {"__from__": "Person", "__item__": [-1], "__only__": ["id"]}}"#,
            "not json",
            r#"{"op": "example", "example": {"v": [1, 2]}}"#,
            r#"{"op": "example", "example": {"v": [1, 2]}}"#,
            r#"{"schema": {"__from__": "Nobody"}}"#,
        ]
        .join("\n");
        let mut out = Vec::new();
        serve(&config, Cursor::new(input), &mut out).unwrap();

        let responses = lines(out);
        assert_eq!(responses.len(), 5);
        assert_eq!(responses[0]["data"], json!({"id": 2}));
        assert_eq!(responses[1]["code"], json!("CLI_BAD_REQUEST"));
        assert_eq!(responses[2]["data"], json!({"v": 1}));
        assert_eq!(responses[3]["data"], json!({"v": 2}));
        assert_eq!(responses[4]["code"], json!("PQL_NOT_FOUND"));
    }
}
