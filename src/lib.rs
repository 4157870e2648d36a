//! This crate provides the core logic for a multi-tape Turing machine simulator.
//! It includes modules for parsing machine descriptions and tape files, running machines
//! until their final state, counting the returned symbols, and a collection of bundled
//! sample machines.

pub mod loader;
pub mod machine;
pub mod parser;
pub mod programs;
pub mod report;
pub mod types;

/// Re-exports the `Loader` struct from the loader module.
pub use loader::Loader;
/// Re-exports the `Simulator` struct and the `run` function from the machine module.
pub use machine::{run, Simulator};
/// Re-exports the parsing functions from the parser module.
pub use parser::{parse_machine, parse_syntax, parse_tapes};
/// Re-exports `Program`, `ProgramManager`, and `PROGRAMS` from the programs module.
pub use programs::{Program, ProgramManager, PROGRAMS};
/// Re-exports the result computation from the report module.
pub use report::{tally, Report, Tally};
/// Re-exports the machine definition and execution types from the types module.
pub use types::{
    Direction, Field, Machine, Role, Rule, RunState, Step, StepSyntax, Tape, TuringMachineError,
};
