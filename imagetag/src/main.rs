// This file is part of the product ImageTag.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use imagetag::backend::{HttpRecordClient, RecordStore};
use imagetag::config::{BACKEND_URL_ENV, CONFIG_FILE_NAME, Config, ConfigSource, ValidatedConfig};
use imagetag::session::{GallerySelector, ImageSession, SessionSettings};
use imagetag::shell::{self, ShellError};
use imagetag::util;
use log::{debug, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

fn run() -> i32 {
    let parsed_args = match parse_args() {
        Ok(args) => args,
        Err(error) => {
            eprintln!("❌ Invalid command line arguments: {}", error);
            eprintln!("❌ Use -C <root> to set the directory holding config.yaml.");
            return 2;
        }
    };

    let tokens = match parsed_args.mode {
        RunMode::Help => {
            print!("{}", shell::help_text());
            return 0;
        }
        RunMode::Command(tokens) => tokens,
    };

    let command = match shell::parse_command(&tokens) {
        Ok(command) => command,
        Err(error) => {
            eprintln!("❌ {}", error);
            eprintln!("❌ Run 'imagetag help' for usage.");
            return error.exit_code();
        }
    };

    let (config, source) = match Config::load_for_runtime(&parsed_args.root) {
        Ok(loaded) => loaded,
        Err(error) => {
            eprintln!("❌ Configuration error: {}", error);
            return 1;
        }
    };

    if let Err(error) = init_logging(&config) {
        eprintln!("❌ Failed to initialize logger: {}", error);
        return 1;
    }
    log_config_source(&parsed_args.root, &source, &config);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            eprintln!("❌ Failed to start async runtime: {}", error);
            return 1;
        }
    };

    match runtime.block_on(execute(&config, command)) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("❌ {}", error);
            error.exit_code()
        }
    }
}

async fn execute(config: &ValidatedConfig, command: shell::ShellCommand) -> Result<(), ShellError> {
    let client = HttpRecordClient::new(&config.backend)
        .map_err(|error| ShellError::failed(format!("Backend setup failed: {}", error)))?;
    info!("Using backend {} (collection {})", client.base_url(), config.backend.collection);
    let store: Arc<dyn RecordStore> = Arc::new(client);

    let session = ImageSession::new(store, SessionSettings::from(config));
    let mut gallery = GallerySelector::new();
    debug!("Running {:?}", command);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    shell::run_command(&session, &mut gallery, command, &mut out).await?;
    out.flush()?;
    Ok(())
}

fn init_logging(config: &ValidatedConfig) -> Result<(), log::SetLoggerError> {
    // stdout carries command output, so logs go to stderr
    let logger = env_logger::Builder::from_default_env()
        .filter_level(config.log_level())
        .target(env_logger::Target::Stderr)
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f UTC"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .build();
    util::init_logger(util::http_stack_rules(), logger)
}

fn log_config_source(root: &Path, source: &ConfigSource, config: &ValidatedConfig) {
    match source {
        ConfigSource::File(path) => info!("Config file: {}", path.display()),
        ConfigSource::Environment => info!(
            "No {} in '{}'; backend URL from {}",
            CONFIG_FILE_NAME,
            root.display(),
            BACKEND_URL_ENV
        ),
        ConfigSource::Defaults => warn!(
            "No {} in '{}' and {} unset; using {}",
            CONFIG_FILE_NAME,
            root.display(),
            BACKEND_URL_ENV,
            config.backend.base_url
        ),
    }
}

enum RunMode {
    Command(Vec<String>),
    Help,
}

struct ParsedArgs {
    root: PathBuf,
    mode: RunMode,
}

fn parse_args() -> Result<ParsedArgs, String> {
    parse_args_from(std::env::args().skip(1))
}

fn parse_args_from<I>(args: I) -> Result<ParsedArgs, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut root = PathBuf::from(".");
    let mut tokens = Vec::new();

    // Global flags only before the command; the rest belongs to it.
    while let Some(arg) = args.next() {
        if arg == "--" {
            continue;
        } else if is_help_flag(&arg) {
            return Ok(ParsedArgs {
                root,
                mode: RunMode::Help,
            });
        } else if arg == "-C" {
            let value = args
                .next()
                .ok_or_else(|| "Missing value for -C".to_string())?;
            root = PathBuf::from(value);
        } else {
            tokens.push(arg);
            tokens.extend(args.by_ref());
        }
    }

    if tokens.is_empty() || (tokens.len() == 1 && tokens[0].eq_ignore_ascii_case("help")) {
        return Ok(ParsedArgs {
            root,
            mode: RunMode::Help,
        });
    }

    Ok(ParsedArgs {
        root: make_root_absolute(&root)?,
        mode: RunMode::Command(tokens),
    })
}

fn is_help_flag(arg: &str) -> bool {
    arg == "-h" || arg == "--help"
}

fn make_root_absolute(root: &Path) -> Result<PathBuf, String> {
    if root.is_absolute() {
        return Ok(root.to_path_buf());
    }
    let current_dir = std::env::current_dir()
        .map_err(|error| format!("Failed to resolve current directory: {}", error))?;
    Ok(current_dir.join(root))
}
