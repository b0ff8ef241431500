mod test_runner;

use std::path::Path;
use std::process;

use clap::{Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use hdoc::body::Body;
use renderer::bridge::{bind_variables, decode_variables, render_parsed};
use renderer::{Diagnostic, MemoryTree};

const SUBCOMMANDS: &[&str] = &["render", "test", "help"];

#[derive(Parser)]
#[command(name = "hdoc", version, about = "Render HCL block documents into element trees")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log structural rendering steps (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a document and print the resulting tree as HTML
    Render(RenderArgs),

    /// Run .test.hcl test files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Document source file
    file: String,

    /// Variables file (.json or .toml) whose top level is a table of variables
    #[arg(long)]
    vars: Option<String>,

    /// Parse only, don't render (exit 0 if valid)
    #[arg(long)]
    check: bool,

    /// Dump parsed AST
    #[arg(long)]
    ast: bool,

    /// List the block structure of the document
    #[arg(long)]
    list_blocks: bool,

    /// Suppress HTML output (just check for errors)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.hcl file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    // If the first positional arg is not a known subcommand, inject "render"
    // so `hdoc page.hcl` works like `hdoc render page.hcl`.
    let mut args: Vec<String> = std::env::args().collect();
    if let Some(pos) = args
        .iter()
        .skip(1)
        .position(|a| !a.starts_with('-'))
        .map(|i| i + 1)
    {
        if !SUBCOMMANDS.contains(&args[pos].as_str()) {
            args.insert(pos, "render".to_string());
        }
    }

    let cli = Cli::parse_from(&args);
    init_tracing(cli.verbose);

    match cli.command {
        Command::Render(render_args) => do_render(render_args, cli.no_color),
        Command::Test(test_args) => {
            let path = Path::new(&test_args.path);
            if test_args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            let exit_code = test_runner::run_tests(path, cli.no_color, &test_args.category);
            process::exit(exit_code);
        }
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    // RUST_LOG, when set, replaces the level chosen by --verbose
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: failed to install log subscriber: {}", e);
    }
}

fn do_render(args: RenderArgs, no_color: bool) {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };

    // Read source
    let source = match std::fs::read_to_string(&args.file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read '{}': {}", args.file, e);
            process::exit(1);
        }
    };

    // Read variables before anything is parsed
    let variables = match &args.vars {
        Some(path) => match load_variables(Path::new(path)) {
            Ok(v) => v,
            Err(e) => {
                eprintln!("error: {}", e);
                process::exit(1);
            }
        },
        None => serde_json::Value::Null,
    };
    let host_values = match decode_variables(&variables) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    };

    // Set up codespan file database
    let mut files = SimpleFiles::new();
    let file_id = files.add(args.file.clone(), source.clone());

    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();

    // Parse
    let parser = hdoc::parser::Parser::new(source, file_id);
    let document = match parser.parse() {
        Ok(d) => d,
        Err(errors) => {
            for error in &errors {
                let diagnostic = error.to_diagnostic();
                let _ =
                    term::emit_to_write_style(&mut writer.lock(), &config, &files, &diagnostic);
            }
            process::exit(1);
        }
    };

    // --check: parse succeeded, exit
    if args.check {
        eprintln!("ok: {} parsed successfully", args.file);
        return;
    }

    // --ast: dump AST
    if args.ast {
        println!("{:#?}", document);
        return;
    }

    // --list-blocks: print the block outline
    if args.list_blocks {
        fn print_blocks(body: &Body, indent: usize) {
            for block in &body.blocks {
                let pad = "  ".repeat(indent);
                let labels: Vec<String> = block.labels.iter().map(|l| format!("{:?}", l)).collect();
                if labels.is_empty() {
                    println!("{}{}", pad, block.kind);
                } else {
                    println!("{}{} {}", pad, block.kind, labels.join(" "));
                }
                print_blocks(&block.body, indent + 1);
            }
        }
        print_blocks(&document.body, 0);
        return;
    }

    // Render
    let mut diagnostics = Vec::new();
    let bindings = bind_variables(host_values, &mut diagnostics);
    let mut tree = MemoryTree::new();
    let mount = tree.root();
    let result = render_parsed(&document, bindings, &mut tree, &mount, &mut diagnostics);

    emit_diagnostics(&writer, &config, &files, &diagnostics);

    if let Err(e) = result {
        eprintln!("error: {}", e);
        process::exit(1);
    }

    if !args.quiet {
        println!("{}", tree.to_html(mount));
    }
}

/// Load a variables file. TOML tables are converted to the same JSON shape a
/// browser host would pass.
fn load_variables(path: &Path) -> Result<serde_json::Value, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => {
            let table: toml::Table = toml::from_str(&text)
                .map_err(|e| format!("invalid TOML in '{}': {}", path.display(), e))?;
            serde_json::to_value(table)
                .map_err(|e| format!("cannot convert '{}': {}", path.display(), e))
        }
        _ => serde_json::from_str(&text)
            .map_err(|e| format!("invalid JSON in '{}': {}", path.display(), e)),
    }
}

fn emit_diagnostics(
    writer: &StandardStream,
    config: &term::Config,
    files: &SimpleFiles<String, String>,
    diagnostics: &[Diagnostic],
) {
    for diagnostic in diagnostics {
        if diagnostic.span.is_some() {
            let _ = term::emit_to_write_style(
                &mut writer.lock(),
                config,
                files,
                &diagnostic.to_diagnostic(),
            );
        } else {
            eprintln!("warning: {}", diagnostic);
        }
    }
}
