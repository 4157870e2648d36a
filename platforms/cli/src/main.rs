use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use tmsim::{Loader, Machine, ProgramManager, RunState, Simulator, TuringMachineError};

#[derive(Parser)]
#[clap(author, version, about = "Turing Machine Simulator", long_about = None, arg_required_else_help = true)]
struct Cli {
    /// The machine description file
    #[clap(required_unless_present_any = ["program", "list"])]
    machine: Option<PathBuf>,

    /// The tape file, one tape per line
    #[clap(required_unless_present_any = ["program", "list"])]
    tape: Option<PathBuf>,

    /// Run a bundled machine on its sample tapes instead of files
    #[clap(short, long, conflicts_with_all = ["machine", "tape"])]
    program: Option<String>,

    /// List the bundled machines
    #[clap(short, long)]
    list: bool,

    /// Print the state and head positions before each step
    #[clap(short = 'd', long)]
    debug: bool,

    /// Print the tapes before each step
    #[clap(short, long)]
    verbose: bool,

    /// Fail if the final state is not reached after this many steps
    #[clap(long)]
    max_steps: Option<usize>,

    /// Print the final tapes and counts as JSON
    #[clap(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = if cli.list { list() } else { execute(&cli) };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {e}");
            ExitCode::FAILURE
        }
    }
}

fn list() -> Result<(), Box<dyn Error>> {
    for (index, name) in ProgramManager::list_program_names()?.iter().enumerate() {
        println!("{index}: {name}");
    }
    Ok(())
}

fn load(cli: &Cli) -> Result<(Machine, RunState), TuringMachineError> {
    match (&cli.program, &cli.machine, &cli.tape) {
        (Some(name), _, _) => ProgramManager::get_program_by_name(name)?.load(),
        (None, Some(machine), Some(tape)) => Loader::load_files(machine, tape),
        _ => Err(TuringMachineError::FileError(
            "A machine file and a tape file are required".to_string(),
        )),
    }
}

fn execute(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let (machine, run) = load(cli)?;
    let mut simulator = Simulator::new(&machine, run);

    let print_state = |simulator: &Simulator| {
        if cli.debug {
            println!(
                "Step: {}, State: {}, Heads: {:?}",
                simulator.step_count(),
                simulator.state(),
                simulator.heads()
            );
        }
        if cli.verbose {
            let tapes: Vec<String> = simulator.tapes().iter().map(ToString::to_string).collect();
            println!("{tapes:?}");
        }
    };

    while !simulator.is_halted() {
        if let Some(max) = cli.max_steps {
            if simulator.step_count() >= max {
                return Err(TuringMachineError::StepLimitExceeded(max).into());
            }
        }

        print_state(&simulator);
        simulator.step()?;
    }

    if cli.debug {
        print_state(&simulator);
        println!("\nMachine halted.");
    }

    let report = simulator.report();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", report.tapes.join("\n"));
    if !report.tallies.is_empty() {
        print!("\n{report}");
    }

    Ok(())
}
