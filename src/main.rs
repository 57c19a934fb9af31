use clap::{Arg, ArgAction, Command as ClapCommand};
use log::{error, Level};
use std::process;

use stackkit::commands::{CommandFactory, StackkitCommandFactory};
use stackkit::utils::logger::Logger;

fn main() {
    let matches = ClapCommand::new("stackkit")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect, convert and export TIFF files and MetaMorph STK stacks")
        .arg(
            Arg::new("input")
                .help("Input TIFF or STK file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("List every tag and raise the log level (repeat for trace output)")
                .action(ArgAction::Count),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Write log records to this file instead of stderr only")
                .value_name("FILE")
                .required(false),
        )
        .arg(
            Arg::new("extract")
                .short('e')
                .long("extract")
                .help("Export one plane as an image")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("plane")
                .long("plane")
                .help("Plane (or image) index to export")
                .value_name("N")
                .required(false),
        )
        .arg(
            Arg::new("convert")
                .short('c')
                .long("convert")
                .help("Rewrite the file with a different compression")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("compression")
                .long("compression")
                .help("Target compression by name or code (none, lzw, packbits, deflate)")
                .value_name("NAME|CODE")
                .required(false),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Output file")
                .value_name("FILE")
                .required(false),
        )
        .get_matches();

    let level = match matches.get_count("verbose") {
        0 => Level::Warn,
        1 => Level::Debug,
        _ => Level::Trace,
    };

    if let Some(log_file) = matches.get_one::<String>("log-file") {
        if let Err(e) = Logger::init_global_logger(log_file, level) {
            eprintln!("Error setting up file logger: {}", e);
            process::exit(1);
        }
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.as_str())).init();
    }

    let factory = StackkitCommandFactory::new();

    match factory.create_command(&matches) {
        Ok(command) => {
            if let Err(e) = command.execute() {
                error!("Command execution error: {}", e);
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
        Err(e) => {
            error!("Failed to create command: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
