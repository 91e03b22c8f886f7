use std::path::PathBuf;

use log::LevelFilter;
use structopt::StructOpt;


/// Replays a bus script against an MBC6 cartridge.
///
/// Every line of the script is one bus operation: `w ADDR VALUE` writes,
/// `r ADDR` reads and prints, `r ADDR VALUE` reads and fails unless the value
/// matches, `flush` writes battery-backed memory to the save file. Numbers
/// are hexadecimal without prefix, `#` starts a comment.
#[derive(Debug, StructOpt)]
pub(crate) struct Args {
    #[structopt(
        parse(from_os_str),
        help = "Path to the ROM that should be loaded into the cartridge.",
    )]
    pub(crate) path_to_rom: PathBuf,

    #[structopt(
        long = "save",
        short = "s",
        parse(from_os_str),
        help = "Save file for RAM and flash. Without this, the cartridge has no battery and \
            nothing is persisted. A missing file is created when the cartridge is flushed.",
    )]
    pub(crate) save: Option<PathBuf>,

    #[structopt(
        long = "script",
        parse(from_os_str),
        help = "Bus script to replay. Read from stdin if not given.",
    )]
    pub(crate) script: Option<PathBuf>,

    #[structopt(
        long = "log-level",
        short = "l",
        parse(try_from_str = parse_log_level),
        help = "Specifies which log messages to display and which to supress. The specified \
            value will show all log messages with the same level or any higher level. So \
            `-l warn` will print errors and warnings and `-l trace` will show all levels. You \
            can also disable all log messages with `-l off`. Valid values: 'off', 'error', \
            'warn', 'info', 'debug' and 'trace'. Note that `trace` messages are statically \
            disabled in release builds. [default: 'warn']",
    )]
    pub(crate) log_level: Option<LevelFilter>,
}

fn parse_log_level(src: &str) -> Result<LevelFilter, &'static str> {
    match src {
        "off" => Ok(LevelFilter::Off),
        "error" => Ok(LevelFilter::Error),
        "warn" => Ok(LevelFilter::Warn),
        "info" => Ok(LevelFilter::Info),
        "debug" => Ok(LevelFilter::Debug),
        "trace" => Ok(LevelFilter::Trace),
        _ => Err(
            "invalid log level (valid values: 'off', 'error', 'warn', 'info', 'debug' \
                and 'trace'"
        ),
    }
}
