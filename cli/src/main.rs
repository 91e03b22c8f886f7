use std::{
    fs,
    io::{self, Read},
};

use failure::{bail, Error, ResultExt};
use log::LevelFilter;
use structopt::StructOpt;

use flashbank::{
    Cartridge, FileSave, SaveStore,
    log::*,
};
use crate::{
    args::Args,
    script::{Line, Op},
};


mod args;
mod script;


fn main() {
    // We just catch potential errors here and pretty print them.
    if let Err(e) = run() {
        println!("ERROR: {}", e);

        for cause in e.iter_causes() {
            println!("  ... caused by: {}", cause);
        }

        std::process::exit(1);
    }
}

/// The actual main function.
fn run() -> Result<(), Error> {
    // Parse CLI arguments
    let args = Args::from_args();

    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_module("flashbank", args.log_level.unwrap_or(LevelFilter::Warn));
    builder.init();

    // Prepare everything
    let mut cartridge = init_cartridge(&args)?;
    let src = match &args.script {
        Some(path) => fs::read_to_string(path)
            .with_context(|_| format!("failed to read script '{}'", path.display()))?,
        None => {
            let mut src = String::new();
            io::stdin().read_to_string(&mut src).context("failed to read script from stdin")?;
            src
        }
    };
    let lines = script::parse(&src)?;
    info!("[cli] running {} bus operations", lines.len());

    for line in &lines {
        execute(&mut cartridge, line)?;
    }

    // Dropping would flush as well, but only this way a failure reaches the
    // exit code.
    cartridge.flush()?;

    Ok(())
}

/// Loads the ROM and the save file and creates the cartridge.
fn init_cartridge(args: &Args) -> Result<Cartridge, Error> {
    let rom = fs::read(&args.path_to_rom).context("failed to load ROM file")?;
    let battery = args.save.as_ref().map(|path| {
        let store = FileSave::new(path);
        info!("[cli] using save file '{}'", store.path().display());
        Box::new(store) as Box<dyn SaveStore>
    });

    Cartridge::mbc6(&rom, battery)
}

fn execute(cartridge: &mut Cartridge, line: &Line) -> Result<(), Error> {
    match line.op {
        Op::Write(addr, byte) => cartridge.store_byte(addr, byte),
        Op::Read { addr, expected } => {
            let actual = cartridge.load_byte(addr);
            match expected {
                Some(expected) if expected != actual => {
                    bail!(
                        "line {}: read {} from {}, expected {}",
                        line.number,
                        actual,
                        addr,
                        expected,
                    );
                }
                Some(_) => {}
                None => println!("{:04x}: {:02x}", addr.get(), actual.get()),
            }
        }
        Op::Flush => cartridge.flush()
            .with_context(|_| format!("line {}: flush failed", line.number))?,
    }

    Ok(())
}
