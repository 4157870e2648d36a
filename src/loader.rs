//! This module provides the `Loader` struct, which builds a machine and its initial run
//! state from a machine description and a tape file, read from streams, files or strings.

use crate::parser::{parse_machine, parse_tapes};
use crate::types::{Machine, RunState, TuringMachineError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// `Loader` is a utility struct for loading a machine together with its tapes.
pub struct Loader;

impl Loader {
    /// Loads a machine and its tapes from two readers.
    ///
    /// # Arguments
    ///
    /// * `machine` - The machine description stream.
    /// * `tapes` - The tape stream, one tape per line.
    ///
    /// # Returns
    ///
    /// * `Ok((Machine, RunState))` with every head on the first cell of its tape and the
    ///   run in the machine's initial state.
    /// * `Err(TuringMachineError)` if either stream is malformed or cannot be read.
    pub fn load<M: BufRead, T: BufRead>(
        machine: M,
        tapes: T,
    ) -> Result<(Machine, RunState), TuringMachineError> {
        let machine = parse_machine(machine)?;
        let tapes = parse_tapes(tapes)?;
        let run = RunState::new(&machine, tapes);

        Ok((machine, run))
    }

    /// Loads a machine and its tapes from the files at the given paths.
    ///
    /// # Returns
    ///
    /// * `Err(TuringMachineError::FileError)` if a file cannot be opened.
    /// * Any error of [`Loader::load`] otherwise.
    pub fn load_files(
        machine_path: &Path,
        tape_path: &Path,
    ) -> Result<(Machine, RunState), TuringMachineError> {
        Self::load(open(machine_path)?, open(tape_path)?)
    }

    /// Loads a machine and its tapes from string content.
    pub fn load_from_strings(
        machine: &str,
        tapes: &str,
    ) -> Result<(Machine, RunState), TuringMachineError> {
        Self::load(machine.as_bytes(), tapes.as_bytes())
    }
}

fn open(path: &Path) -> Result<BufReader<File>, TuringMachineError> {
    File::open(path).map(BufReader::new).map_err(|e| {
        TuringMachineError::FileError(format!("Failed to read file {}: {}", path.display(), e))
    })
}
