//! bvgraph CLI - command-line interface for the bvgraph solver

mod config;
mod output;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;

use bvgraph_core::{Error, ErrorContext, ResultExt};
use bvgraph_solver::{Config, Context, SolveResult, WeightsAdd};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use rand::Rng;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use config::CliConfig;
use output::{BvValue, OutputFormat, Report};

/// Verbosity level
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, PartialOrd, Ord)]
enum Verbosity {
    /// Errors only
    Quiet,
    /// Warnings and results
    Normal,
    /// Solver progress and statistics
    Verbose,
    /// Theory refinement rounds
    Debug,
    /// Every lemma and atom
    Trace,
}

impl Verbosity {
    fn from_config(value: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(value, true).ok()
    }

    fn level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARN,
            Self::Verbose => Level::INFO,
            Self::Debug => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }
}

/// bvgraph - SAT modulo graphs and bitvectors
#[derive(Parser, Debug)]
#[command(name = "bvgraph")]
#[command(version)]
#[command(about = "A SAT modulo graphs and bitvectors solver")]
struct Args {
    /// Verbosity level
    #[arg(short, long, value_enum, global = true)]
    verbosity: Option<Verbosity>,

    /// Configuration file (YAML); defaults to ~/.bvgraphrc
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Solve a GNF problem
    Solve(SolveArgs),

    /// Solve the bitvector-weighted distance puzzle
    Demo {
        /// Random seed (picked at random when omitted)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(clap::Args, Debug)]
struct SolveArgs {
    /// Input file in GNF format
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Assume a DIMACS literal (repeatable)
    #[arg(long = "assume", value_name = "LIT", allow_negative_numbers = true)]
    assume: Vec<i32>,

    /// Minimise a bitvector by file id (repeatable, in priority order)
    #[arg(long = "minimize", value_name = "BVID")]
    minimize: Vec<u32>,

    /// Conflict limit (0 = unlimited)
    #[arg(long, value_name = "N")]
    conflict_limit: Option<u64>,

    /// Propagation limit (0 = unlimited)
    #[arg(long, value_name = "N")]
    propagation_limit: Option<u64>,

    /// Time limit in seconds (0 = unlimited)
    #[arg(long, value_name = "SECS")]
    time_limit: Option<u64>,

    /// Random seed of the SAT search
    #[arg(long)]
    seed: Option<u64>,

    /// Output format
    #[arg(short = 'f', long, value_enum)]
    format: Option<OutputFormat>,
}

fn setup_logging(verbosity: Verbosity) -> Result<(), ErrorContext> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(verbosity.level())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).map_err(|e| {
        ErrorContext::new(Error::Io(e.to_string())).with_context("installing the log subscriber")
    })
}

fn run_solve(args: &SolveArgs, cli_config: &CliConfig, verbosity: Verbosity) -> Result<(), ErrorContext> {
    let mut solver_config: Config = cli_config.solver.clone();
    if let Some(seed) = args.seed {
        solver_config.sat.random_seed = seed;
    }
    let limits = &mut solver_config.limits;
    limits.conflicts = args.conflict_limit.unwrap_or(limits.conflicts);
    limits.propagations = args.propagation_limit.unwrap_or(limits.propagations);
    limits.time_secs = args.time_limit.unwrap_or(limits.time_secs);

    let format = args
        .format
        .or_else(|| cli_config.format.as_deref().and_then(OutputFormat::from_config))
        .unwrap_or(OutputFormat::Text);

    let mut ctx = Context::with_config(solver_config);
    let display = args.input.display();
    let file = File::open(&args.input)
        .map_err(Error::from)
        .with_context(|| format!("opening {display}"))?;
    let problem = ctx
        .read_gnf(BufReader::new(file))
        .with_context(|| format!("reading {display}"))
        .map_err(|e| e.with_suggestion("see the GNF line formats in the bvgraph_solver::gnf documentation"))?;
    info!(
        vars = ctx.num_vars(),
        clauses = ctx.num_clauses(),
        bitvectors = ctx.num_bitvectors(),
        "problem loaded"
    );

    let mut assumptions = Vec::with_capacity(args.assume.len());
    for &lit in &args.assume {
        let mapped = problem
            .lit(lit)
            .ok_or(Error::UnknownVariable(lit.unsigned_abs()))
            .with_context(|| format!("resolving --assume {lit}"))?;
        assumptions.push(mapped);
    }
    let mut objectives = Vec::with_capacity(args.minimize.len());
    for &id in &args.minimize {
        let bv = problem
            .bitvector(id)
            .ok_or(Error::UnknownBitvector(id))
            .with_context(|| format!("resolving --minimize {id}"))?;
        objectives.push(bv);
    }

    let result = if objectives.is_empty() {
        ctx.solve_limited(&assumptions)
    } else {
        ctx.solve_minimize(&assumptions, &objectives)
    }
    .context("solving")?;

    let mut bitvectors = Vec::new();
    if result == SolveResult::Sat {
        for (id, bv) in problem.bitvectors() {
            let value = ctx.bv_value(bv).with_context(|| format!("reading bitvector {id}"))?;
            bitvectors.push(BvValue { id, value });
        }
    }
    let conflict = if result == SolveResult::Unsat {
        ctx.conflict_clause()
            .iter()
            .filter_map(|&lit| problem.dimacs(lit))
            .collect()
    } else {
        Vec::new()
    };

    let report = Report {
        result,
        seed: ctx.random_seed(),
        bitvectors,
        optimal: (!objectives.is_empty() && result == SolveResult::Sat)
            .then(|| ctx.last_solution_was_optimal()),
        conflict,
        stats: ctx.stats(),
    };
    print!("{}", report.render(format, verbosity >= Verbosity::Verbose));
    Ok(())
}

fn run_demo(seed: Option<u64>, cli_config: &CliConfig) -> Result<(), ErrorContext> {
    println!("begin encode");
    let seed = seed.unwrap_or_else(|| rand::rng().random_range(1..=100_000));
    println!("RandomSeed={seed}");

    let mut config = cli_config.solver.clone();
    config.sat.random_seed = seed;
    let mut ctx = Context::with_config(config);
    let problem = WeightsAdd::encode(&mut ctx).context("encoding the demo")?;

    let result = ctx.solve().context("solving the demo")?;
    println!("Result is {result}");
    if result {
        for bv in problem.bitvectors() {
            let value = ctx.bv_value(bv).context("reading the model")?;
            println!("{bv} = {value}");
        }
    }
    Ok(())
}

fn run(args: Args) -> Result<(), ErrorContext> {
    if let Command::Completions { shell } = args.command {
        let mut cmd = Args::command();
        let bin_name = cmd.get_name().to_string();
        generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
        return Ok(());
    }

    let cli_config = CliConfig::load(args.config.as_deref())?;
    let verbosity = args
        .verbosity
        .or_else(|| cli_config.verbosity.as_deref().and_then(Verbosity::from_config))
        .unwrap_or(Verbosity::Normal);
    setup_logging(verbosity)?;

    match &args.command {
        Command::Solve(solve) => run_solve(solve, &cli_config, verbosity),
        Command::Demo { seed } => run_demo(*seed, &cli_config),
        Command::Completions { .. } => Ok(()),
    }
}

fn main() -> ExitCode {
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprint!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse_solve() {
        let args = Args::try_parse_from([
            "bvgraph",
            "solve",
            "problem.gnf",
            "--assume",
            "-3",
            "--assume",
            "4",
            "--minimize",
            "1",
            "--format",
            "json",
        ])
        .unwrap();
        let Command::Solve(solve) = args.command else {
            panic!("expected the solve subcommand");
        };
        assert_eq!(solve.assume, vec![-3, 4]);
        assert_eq!(solve.minimize, vec![1]);
        assert_eq!(solve.format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_global_verbosity_after_subcommand() {
        let args = Args::try_parse_from(["bvgraph", "demo", "--seed", "7", "-v", "debug"]).unwrap();
        assert_eq!(args.verbosity, Some(Verbosity::Debug));
        assert!(matches!(args.command, Command::Demo { seed: Some(7) }));
    }

    #[test]
    fn test_command_is_well_formed() {
        Args::command().debug_assert();
    }
}
