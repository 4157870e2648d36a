use crate::loader::Loader;
use crate::types::{Machine, RunState, TuringMachineError};

use std::sync::RwLock;

// Default embedded machines: (name, machine description, tapes)
const PROGRAM_TEXTS: [(&str, &str, &str); 4] = [
    (
        "Binary Increment",
        include_str!("../machines/binary-increment.tm"),
        include_str!("../machines/binary-increment.tape"),
    ),
    (
        "Two-Tape Copy",
        include_str!("../machines/two-tape-copy.tm"),
        include_str!("../machines/two-tape-copy.tape"),
    ),
    (
        "Unary Addition",
        include_str!("../machines/unary-addition.tm"),
        include_str!("../machines/unary-addition.tape"),
    ),
    (
        "Busy Beaver 3",
        include_str!("../machines/busy-beaver-3.tm"),
        include_str!("../machines/busy-beaver-3.tape"),
    ),
];

lazy_static::lazy_static! {
    pub static ref PROGRAMS: RwLock<Vec<Program>> = RwLock::new(Vec::new());
}

/// A bundled machine description together with a sample tape file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub name: String,
    pub machine: String,
    pub tapes: String,
}

impl Program {
    pub fn new(name: &str, machine: &str, tapes: &str) -> Self {
        Self {
            name: name.to_string(),
            machine: machine.to_string(),
            tapes: tapes.to_string(),
        }
    }

    /// Parses the bundled texts into a machine and its initial run state.
    pub fn load(&self) -> Result<(Machine, RunState), TuringMachineError> {
        Loader::load_from_strings(&self.machine, &self.tapes)
    }
}

/// Builds the programs from their texts, failing on the first one that does not load.
fn load_programs(texts: &[(&str, &str, &str)]) -> Result<Vec<Program>, TuringMachineError> {
    texts
        .iter()
        .map(|&(name, machine, tapes)| {
            let program = Program::new(name, machine, tapes);
            program.load()?;
            Ok(program)
        })
        .collect()
}

fn lock_error(kind: &str) -> TuringMachineError {
    TuringMachineError::FileError(format!("Failed to acquire {kind} lock"))
}

pub struct ProgramManager;

impl ProgramManager {
    /// Initialize the ProgramManager with the embedded programs
    pub fn load() -> Result<(), TuringMachineError> {
        let programs = load_programs(&PROGRAM_TEXTS)?;
        *PROGRAMS.write().map_err(|_| lock_error("write"))? = programs;
        Ok(())
    }

    /// Runs `f` over the registry, loading the embedded programs on first use.
    fn with_programs<T>(f: impl FnOnce(&[Program]) -> T) -> Result<T, TuringMachineError> {
        let empty = PROGRAMS.read().map_err(|_| lock_error("read"))?.is_empty();
        if empty {
            Self::load()?;
        }

        let programs = PROGRAMS.read().map_err(|_| lock_error("read"))?;
        Ok(f(&programs))
    }

    /// Get the number of available programs
    pub fn get_program_count() -> Result<usize, TuringMachineError> {
        Self::with_programs(<[Program]>::len)
    }

    /// Get a program by its index
    pub fn get_program_by_index(index: usize) -> Result<Program, TuringMachineError> {
        Self::with_programs(|programs| programs.get(index).cloned())?.ok_or_else(|| {
            TuringMachineError::FileError(format!("Program index {index} out of range"))
        })
    }

    /// Get a program by its name, ignoring case
    pub fn get_program_by_name(name: &str) -> Result<Program, TuringMachineError> {
        Self::with_programs(|programs| {
            programs
                .iter()
                .find(|program| program.name.eq_ignore_ascii_case(name))
                .cloned()
        })?
        .ok_or_else(|| TuringMachineError::FileError(format!("Program '{name}' not found")))
    }

    /// List all program names
    pub fn list_program_names() -> Result<Vec<String>, TuringMachineError> {
        Self::with_programs(|programs| programs.iter().map(|p| p.name.clone()).collect())
    }
}
