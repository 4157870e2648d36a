//! Result computation: how many times each returned symbol occurs on each tape.

use crate::types::{Machine, RunState};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of occurrences of one returned symbol on one tape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub tape: usize,
    pub symbol: char,
    pub count: usize,
}

/// Counts every returned symbol of `machine` on every tape of `run`.
///
/// Tallies are ordered by tape, then by the order the symbols are declared in. The
/// whole tape is counted, not only the cells around the head. A machine without
/// returned symbols produces no tallies.
pub fn tally(machine: &Machine, run: &RunState) -> Vec<Tally> {
    run.tapes
        .iter()
        .enumerate()
        .flat_map(|(tape, content)| {
            machine.returned.iter().map(move |&symbol| Tally {
                tape,
                symbol,
                count: content.count(symbol),
            })
        })
        .collect()
}

/// Final snapshot of a run: the tape contents and the returned-symbol tallies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub state: String,
    pub tapes: Vec<String>,
    pub tallies: Vec<Tally>,
}

impl Report {
    pub fn new(machine: &Machine, run: &RunState) -> Self {
        Self {
            state: run.state.clone(),
            tapes: run.tapes.iter().map(ToString::to_string).collect(),
            tallies: tally(machine, run),
        }
    }
}

impl fmt::Display for Report {
    /// Writes the tallies grouped per tape; writes nothing when there are none.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut current = None;

        for tally in &self.tallies {
            if current != Some(tally.tape) {
                writeln!(f, "Tape {}", tally.tape)?;
                current = Some(tally.tape);
            }
            writeln!(f, "\t {} : {}", tally.symbol, tally.count)?;
        }

        Ok(())
    }
}
