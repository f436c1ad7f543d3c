
extern crate clap;
#[macro_use] extern crate log;
extern crate fern;
extern crate chrono;
extern crate regex;
extern crate term_grid;

pub mod assembler;

use clap::{Arg, ArgMatches, App};
use term_grid::{Grid, GridOptions, Direction, Filling, Cell};

use std::fs::File;
use std::io::Write;
use std::path::Path;

use assembler::lexer::Token;
use assembler::parser::parse;

fn main() {
    let args = process_arguments();
    initialize_logging(args.occurrences_of("verbose"));

    debug!("Arguments:\n\tVerbosity: {}\n\tPrint Tokens: {}\n\tOutfile: {}\n\tInfile: {}",
        match args.occurrences_of("verbose") {
            0 => log::LevelFilter::Error.to_string(),
            1 => log::LevelFilter::Warn.to_string(),
            2 => log::LevelFilter::Info.to_string(),
            3 | _ => log::LevelFilter::Debug.to_string(),
        },
        args.is_present("tokens"),
        args.value_of("output").unwrap_or("None"),
        args.value_of("INPUT").unwrap()
    );

    let ipath = Path::new(args.value_of("INPUT").unwrap());

    let source = match std::fs::read_to_string(&ipath) {
        Err(err) => {
            error!("fatal: unable to read input file `{}`: {}", ipath.display(), err);
            std::process::exit(1);
        },
        Ok(source) => source,
    };

    let lexer = match assembler::fisk::lexer() {
        Err(err) => {
            error!("fatal: invalid lexical rule: {}", err);
            std::process::exit(1);
        },
        Ok(lexer) => lexer,
    };

    let tokens = match lexer.tokenize(&source) {
        Err(err) => {
            error!("fatal: {}", err);
            std::process::exit(1);
        },
        Ok(tokens) => tokens,
    };

    if args.is_present("tokens") {
        print_tokens(&tokens);
    }

    let grammar = assembler::fisk::grammar();
    let (tree, remaining) = match parse(&grammar, &tokens) {
        Err(err) => {
            error!("fatal: {}", err);
            std::process::exit(1);
        },
        Ok(matched) => matched,
    };

    if !remaining.is_empty() {
        error!("fatal: {} token(s) left unparsed, starting with {:?}", remaining.len(), remaining[0]);
        std::process::exit(1);
    }

    let tree = tree.normalize();

    match args.value_of("output") {
        Some(filename) => {
            let opath = Path::new(filename);
            let mut ofile = match File::create(&opath) {
                Err(err) => {
                    error!("fatal: unable to open output file `{}`: {}", opath.display(), err);
                    std::process::exit(1);
                },
                Ok(file) => file,
            };

            if let Err(err) = write!(ofile, "{}", tree) {
                error!("fatal: unable to write to output file `{}`: {}", opath.display(), err);
                std::process::exit(1);
            }
        },
        None => print!("{}", tree),
    }
}

/// Prints an aligned index/name/value table of the token stream.
fn print_tokens(tokens: &[Token]) {
    let mut grid = Grid::new(GridOptions {
        filling:     Filling::Spaces(1),
        direction:   Direction::LeftToRight,
    });

    for (idx, token) in tokens.iter().enumerate() {
        grid.add(Cell::from(format!("{:4}:", idx)));
        grid.add(Cell::from(token.name.clone()));
        grid.add(Cell::from(format!("{:?}", token.value)));
    }

    println!("{}", grid.fit_into_columns(3));
}

fn process_arguments() -> ArgMatches<'static> {
    App::new(option_env!("CARGO_PKG_NAME").unwrap())
        .version(option_env!("CARGO_PKG_VERSION").unwrap())
        .author(option_env!("CARGO_PKG_AUTHORS").unwrap())
        .about(option_env!("CARGO_PKG_DESCRIPTION").unwrap())
        .arg(Arg::with_name("INPUT")
            .help("Sets the input file to use")
            .required(true)
            .multiple(false)
            .index(1))
        .arg(Arg::with_name("verbose")
            .short("v")
            .multiple(true)
            .takes_value(false)
            .help("Sets the level of verbosity"))
        .arg(Arg::with_name("output")
            .short("o")
            .takes_value(true)
            .help("write the syntax tree to an outfile instead of STDOUT"))
        .arg(Arg::with_name("tokens")
            .short("t")
            .alias("show-tokens")
            .takes_value(false)
            .help("prints the token stream to STDOUT before parsing"))
        .get_matches()
}

fn initialize_logging(verbosity: u64) {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(match verbosity {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Warn,
            2 => log::LevelFilter::Info,
            3 | _ => log::LevelFilter::Debug,
        })
        .chain(std::io::stdout())
        .apply().ok();
}
