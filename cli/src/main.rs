mod config;
mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use awl::block::Block;
use awl::{Encoding, ParseError, ParserOptions};

use crate::config::ProjectConfig;

const SUBCOMMANDS: &[&str] = &["parse", "test", "help"];

#[derive(Parser)]
#[command(name = "awl", version, about = "Statement list (AWL/STL) source parser")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Raise log verbosity (repeatable); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Project config file (defaults to awl.toml next to the input)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse an AWL source file
    Parse(ParseArgs),

    /// Run .test.awl fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct ParseArgs {
    /// AWL source file
    file: PathBuf,

    /// Source encoding: utf-8, latin-1 or ascii
    #[arg(long, value_parser = parse_encoding)]
    encoding: Option<Encoding>,

    /// Fail when the input ends inside a block
    #[arg(long)]
    strict: bool,

    /// Parse only and report success
    #[arg(long)]
    check: bool,

    /// Dump the parse tree
    #[arg(long)]
    tree: bool,

    /// List all blocks in the source
    #[arg(long)]
    list_blocks: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.awl file or directory containing them
    path: PathBuf,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn parse_encoding(name: &str) -> Result<Encoding, String> {
    Encoding::from_name(name)
        .ok_or_else(|| format!("unknown encoding '{}' (expected utf-8, latin-1 or ascii)", name))
}

fn main() {
    // `awl file.awl` is shorthand for `awl parse file.awl`.
    let mut args: Vec<String> = std::env::args().collect();
    inject_default_subcommand(&mut args);

    let cli = Cli::parse_from(&args);
    init_tracing(cli.verbose);

    match cli.command {
        Command::Parse(parse_args) => {
            let config = load_config(cli.config.as_deref(), &parse_args.file);
            process::exit(do_parse(parse_args, config.parser, cli.no_color));
        }
        Command::Test(test_args) => {
            if test_args.list_categories {
                test_runner::list_categories(&test_args.path);
                return;
            }
            let config = load_config(cli.config.as_deref(), &test_args.path);
            let exit_code = test_runner::run_tests(
                &test_args.path,
                &config.parser,
                cli.no_color,
                &test_args.category,
            );
            process::exit(exit_code);
        }
    }
}

fn inject_default_subcommand(args: &mut Vec<String>) {
    let mut i = 1;
    while i < args.len() {
        let arg = args[i].as_str();
        if arg == "--config" {
            // Skip the flag's value.
            i += 2;
            continue;
        }
        if !arg.starts_with('-') {
            if !SUBCOMMANDS.contains(&arg) {
                args.insert(i, "parse".to_string());
            }
            return;
        }
        i += 1;
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(explicit: Option<&Path>, near: &Path) -> ProjectConfig {
    match ProjectConfig::load(explicit, near) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

fn do_parse(args: ParseArgs, mut options: ParserOptions, no_color: bool) -> i32 {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    if let Some(encoding) = args.encoding {
        options.encoding = encoding;
    }
    if args.strict {
        options.require_block_end = true;
    }

    let name = args.file.display().to_string();
    let raw = match std::fs::read(&args.file) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", name, e);
            return 1;
        }
    };

    let mut files = SimpleFiles::new();
    let writer = StandardStream::stderr(color_choice);

    let parser = awl::Parser::new(0, name.clone()).with_options(options);
    let text = match parser.decode(&raw) {
        Ok(text) => text,
        Err(error) => {
            // Nothing decoded to point into; report by line only.
            let file_id = files.add(name, String::from_utf8_lossy(&raw).into_owned());
            emit_error(&writer, &files, &error, file_id);
            return 1;
        }
    };

    let file_id = files.add(name.clone(), text.clone());
    let parser = awl::Parser::new(file_id, name.clone()).with_options(parser.options().clone());

    let tree = match parser.parse_text(&text) {
        Ok(tree) => tree,
        Err(error) => {
            emit_error(&writer, &files, &error, file_id);
            return 1;
        }
    };

    if args.tree {
        println!("{:#?}", tree);
        return 0;
    }

    if args.list_blocks {
        for block in tree.iter() {
            println!("{}", block_summary(block));
        }
        return 0;
    }

    if args.check {
        eprintln!("ok: {} parsed successfully", name);
        return 0;
    }

    eprintln!(
        "{}: {} block(s), {} instruction(s)",
        name,
        tree.block_count(),
        tree.instruction_count()
    );
    0
}

fn emit_error(
    writer: &StandardStream,
    files: &SimpleFiles<String, String>,
    error: &ParseError,
    file_id: usize,
) {
    let mut error = error.clone();
    error.source_id = file_id;
    // A decode error's span (if any) refers to text that was never produced.
    if error.kind == awl::ErrorKind::Encoding {
        error.span = None;
    }
    let config = term::Config::default();
    let diagnostic = error.to_diagnostic();
    let _ = term::emit_to_write_style(&mut writer.lock(), &config, files, &diagnostic);
}

/// One line per block, e.g. `FB 10 (12 instructions)` or `DB 3 (4 fields)`.
fn block_summary(block: &Block) -> String {
    match block {
        Block::Ob(code) | Block::Fb(code) | Block::Fc(code) => format!(
            "{} ({} instructions)",
            block.block_ref(),
            code.instructions.len()
        ),
        Block::Db(db) => {
            let mut line = format!("{} ({} fields)", block.block_ref(), db.fields.len());
            if let Some(binding) = &db.instance_of {
                let of = match binding {
                    awl::block::InstanceBinding::Fb(id) => format!("FB {}", id),
                    awl::block::InstanceBinding::Sfb(n) => format!("SFB {}", n),
                };
                line.push_str(&format!(" instance of {}", of));
            }
            line
        }
        Block::Udt(udt) => format!("{} ({} fields)", block.block_ref(), udt.fields.len()),
    }
}
