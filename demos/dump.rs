use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{Level, LevelFilter, Metadata, Record};
use ncmkit::dump::{DumpStatus, dump_file};

/// Decode NCM files into plain MP3/FLAC.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// NCM files to decode.
    #[arg(required = true)]
    input: Vec<PathBuf>,
    /// Folder the decoded files are written to.
    #[arg(short, long, default_value = "music")]
    output: PathBuf,
    /// Print per-stage details.
    #[arg(short, long)]
    verbose: bool,
}

struct Logger;

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            Level::Info => eprintln!("{}", record.args()),
            level => eprintln!("[{level}] {}", record.args()),
        }
    }

    fn flush(&self) {}
}

static LOGGER: Logger = Logger;

fn main() -> ExitCode {
    let args = Args::parse();

    let _ = log::set_logger(&LOGGER);
    log::set_max_level(if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });

    let mut failed = false;
    for input in &args.input {
        let status = dump_file(input, &args.output);
        if status != DumpStatus::Success {
            eprintln!("{}: {status:?} ({})", input.display(), status.code());
            failed = true;
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
