use std::{
    error::Error,
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::Parser;
use tracing_subscriber::{
    EnvFilter, Registry, filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt,
};
use zero_vm::{bytecode::program::Program, runner::ZeroRunner};

#[derive(Parser)]
#[command(about = "Interpreter for compiled zero programs")]
enum Cli {
    #[command(about = "Execute a compiled program")]
    Run {
        #[arg(long, help = "Record the execution trace and pad it for proving")]
        proofmode: bool,
        #[arg(long, help = "Where to write the relocated binary trace")]
        tracefile: Option<PathBuf>,
        #[arg(long, help = "Where to write the relocated binary memory")]
        memoryfile: Option<PathBuf>,
        #[arg(long, default_value_t = 10_000_000, help = "Maximum number of steps")]
        maxsteps: usize,
        #[arg(help = "Compiled program (JSON)")]
        program: PathBuf,
    },
}

fn main() -> ExitCode {
    init_tracing();

    let Cli::Run {
        proofmode,
        tracefile,
        memoryfile,
        maxsteps,
        program,
    } = Cli::parse();

    match run(proofmode, tracefile, memoryfile, maxsteps, &program) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(
    proofmode: bool,
    tracefile: Option<PathBuf>,
    memoryfile: Option<PathBuf>,
    maxsteps: usize,
    program_path: &Path,
) -> Result<(), Box<dyn Error>> {
    let program = Program::from_file(program_path)?;
    let mut runner = ZeroRunner::new(program, proofmode, maxsteps)?;
    runner.run()?;
    tracing::info!(steps = runner.steps(), "execution finished");

    if proofmode {
        let (trace, memory) = runner.build_proof()?;
        if let Some(path) = tracefile {
            fs::write(path, trace)?;
        }
        if let Some(path) = memoryfile {
            fs::write(path, memory)?;
        }
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    Registry::default()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
