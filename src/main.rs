use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
    rc::Rc,
    time::Instant,
};

use arrowc::{
    compiler::compiler::compile,
    config::{CompilerConfig, TargetSelection},
    format_error,
    lexer::lexer::tokenize,
    parser::parser::parse,
    type_checker::type_checker::type_check,
};
use clap::Parser;
use inkwell::context::Context;
use rayon::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "arrowc", version, about = "Checks arrow programs and lowers them to LLVM IR")]
struct Cli {
    /// Source files to compile
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Directory for the `.ll` files. IR is printed to stdout when absent
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// `host` or an LLVM target triple
    #[arg(long)]
    target: Option<String>,

    /// Skip the LLVM module verifier
    #[arg(long)]
    no_verify: bool,

    /// Let the IR builder fold constant operations
    #[arg(long)]
    fold_constants: bool,

    /// Print every scope and its bindings after checking
    #[arg(long)]
    dump_scopes: bool,
}

/// What one input produced, printed in input order once every unit is done.
#[derive(Debug, Default)]
struct UnitReport {
    output: String,
    errors: String,
    failed: bool,
}

impl UnitReport {
    fn failure(errors: String) -> Self {
        UnitReport {
            output: String::new(),
            errors,
            failed: true,
        }
    }
}

impl Cli {
    fn config(&self, module_name: &str) -> CompilerConfig {
        let target = self
            .target
            .as_deref()
            .map(TargetSelection::from_arg)
            .unwrap_or_default();

        CompilerConfig::new(module_name)
            .with_target(target)
            .with_verify_module(!self.no_verify)
            .with_fold_constants(self.fold_constants)
    }
}

/// Runs the whole pipeline on one file. Each call owns its LLVM context.
fn compile_unit(path: &Path, cli: &Cli) -> UnitReport {
    let start = Instant::now();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| String::from("out"));

    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(error) => return UnitReport::failure(format!("{}: {}\n", path.display(), error)),
    };

    let tokens = match tokenize(source.clone(), Some(file_name.clone())) {
        Ok(tokens) => tokens,
        Err(error) => return UnitReport::failure(format_error(&error, &source)),
    };
    log::info!("{}: tokenized in {:?}", file_name, start.elapsed());

    let parse_start = Instant::now();
    let (_, program) = parse(tokens, Rc::new(file_name.clone()));
    let program = match program {
        Ok(program) => program,
        Err(error) => return UnitReport::failure(format_error(&error, &source)),
    };
    log::info!("{}: parsed in {:?}", file_name, parse_start.elapsed());

    let check_start = Instant::now();
    let mut analysis = type_check(&program);
    log::info!("{}: checked in {:?}", file_name, check_start.elapsed());

    let mut report = UnitReport::default();
    if cli.dump_scopes {
        report.output.push_str(&analysis.scopes.to_string());
    }

    if !analysis.diagnostics.is_empty() {
        report.errors = analysis.diagnostics.to_string();
        report.failed = true;
        return report;
    }

    let lower_start = Instant::now();
    let context = Context::create();
    let config = cli.config(&stem);
    let module = match compile(&context, &program, &mut analysis, &config) {
        Ok(module) => module,
        Err(diagnostics) => {
            report.errors = diagnostics.to_string();
            report.failed = true;
            return report;
        }
    };
    log::info!("{}: lowered in {:?}", file_name, lower_start.elapsed());

    match &cli.output {
        Some(directory) => {
            let target = directory.join(format!("{}.ll", stem));
            if let Err(error) = module.print_to_file(&target) {
                report.errors = format!("{}: {}\n", target.display(), error.to_string());
                report.failed = true;
                return report;
            }
            log::info!("{}: wrote {}", file_name, target.display());
        }
        None => report
            .output
            .push_str(&module.print_to_string().to_string()),
    }

    log::info!("{}: done in {:?}", file_name, start.elapsed());
    report
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    if let Some(directory) = &cli.output {
        if let Err(error) = fs::create_dir_all(directory) {
            eprintln!("{}: {}", directory.display(), error);
            return ExitCode::FAILURE;
        }
    }

    let start = Instant::now();
    let reports = cli
        .inputs
        .par_iter()
        .map(|path| compile_unit(path, &cli))
        .collect::<Vec<UnitReport>>();

    let mut failures = 0;
    for report in reports.iter() {
        print!("{}", report.output);
        eprint!("{}", report.errors);
        if report.failed {
            failures += 1;
        }
    }

    log::info!(
        "{} of {} units compiled in {:?}",
        reports.len() - failures,
        reports.len(),
        start.elapsed()
    );

    if failures > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
