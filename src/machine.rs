//! This module defines the `Simulator` struct, which runs a loaded `Machine` over its
//! tapes. It selects the unique rule matching the current state and the symbols under
//! the heads, writes, moves the heads, and advances the state until the final state.

use crate::report::Report;
use crate::types::{
    is_wildcard, Field, Machine, Role, Rule, RunState, Step, Tape, TuringMachineError,
    WILDCARD_ANY, WILDCARD_NON_BLANK,
};

/// Executes a machine over an exclusively owned run state.
///
/// The machine itself is only borrowed, so any number of simulators can run the same
/// machine independently.
pub struct Simulator<'m> {
    machine: &'m Machine,
    run: RunState,
    step_count: usize,
}

impl<'m> Simulator<'m> {
    /// Creates a new `Simulator` for `machine`, starting from `run`.
    pub fn new(machine: &'m Machine, run: RunState) -> Self {
        Self {
            machine,
            run,
            step_count: 0,
        }
    }

    /// Executes a single step.
    ///
    /// # Returns
    ///
    /// * `Ok(Step::Continue)` if a rule was applied and the final state is not reached yet.
    /// * `Ok(Step::Halt)` if the machine is in its final state, either after this step
    ///   or before it (in which case nothing is applied).
    /// * `Err(TuringMachineError)` if no unique rule applies.
    pub fn step(&mut self) -> Result<Step, TuringMachineError> {
        if self.is_halted() {
            return Ok(Step::Halt);
        }

        let rule = self.transition()?;
        self.apply(rule);
        self.step_count += 1;

        Ok(if self.is_halted() {
            Step::Halt
        } else {
            Step::Continue
        })
    }

    /// Runs until the final state is reached. A machine that never reaches it runs forever.
    pub fn run(&mut self) -> Result<(), TuringMachineError> {
        while self.step()? == Step::Continue {}
        Ok(())
    }

    /// Runs until the final state is reached, failing once `max_steps` steps have been
    /// executed without reaching it.
    pub fn run_with_limit(&mut self, max_steps: usize) -> Result<(), TuringMachineError> {
        while !self.is_halted() {
            if self.step_count >= max_steps {
                return Err(TuringMachineError::StepLimitExceeded(max_steps));
            }
            self.step()?;
        }
        Ok(())
    }

    /// Finds the single rule matching the current state and the symbols under the heads.
    ///
    /// Ambiguity is only detected against the symbols actually read: two overlapping
    /// rules are accepted until a step reads a vector both of them match.
    pub fn transition(&self) -> Result<&'m Rule, TuringMachineError> {
        let machine = self.machine;
        let state = &self.run.state;
        let symbols = self.symbols();

        let candidates: Vec<&'m Rule> = machine
            .rules
            .iter()
            .filter(|rule| rule.state == *state)
            .collect();

        if candidates.is_empty() {
            return Err(TuringMachineError::NoStateFound(state.clone()));
        }

        let mut matched = Vec::new();
        for rule in candidates {
            self.check_arity(rule)?;
            if self.matches(rule, &symbols) {
                matched.push(rule);
            }
        }

        match matched.as_slice() {
            [rule] => Ok(rule),
            [] => Err(TuringMachineError::NoRuleFound {
                state: state.clone(),
                symbols,
            }),
            _ => Err(TuringMachineError::NonUniqueRule {
                state: state.clone(),
                symbols,
                lines: matched.iter().map(|rule| rule.line).collect(),
            }),
        }
    }

    /// A rule matches when every tape's read value is the symbol under its head, `*`,
    /// or `~` over a non-blank symbol. With no tapes every rule matches.
    fn matches(&self, rule: &Rule, symbols: &[char]) -> bool {
        symbols.iter().enumerate().all(|(tape, &symbol)| {
            rule.read.get(tape).is_some_and(|expected| {
                expected == symbol
                    || expected == WILDCARD_ANY
                    || (expected == WILDCARD_NON_BLANK && symbol != self.machine.blank)
            })
        })
    }

    /// Applies `rule`: write then move on every tape, then enter the next state once.
    fn apply(&mut self, rule: &Rule) {
        let blank = self.machine.blank;

        for (index, tape) in self.run.tapes.iter_mut().enumerate() {
            // Wildcards in the write column leave the cell unchanged.
            if let Some(symbol) = rule.write.as_ref().and_then(|write| write.get(index)) {
                if !is_wildcard(symbol) {
                    tape.write(symbol);
                }
            }

            if let Some(direction) = rule.moves.as_ref().and_then(|moves| moves.get(index)) {
                tape.shift(direction, blank);
            }
        }

        if let Some(next_state) = &rule.next_state {
            self.run.state.clone_from(next_state);
        }
    }

    /// Ensures every per-tape list of `rule` covers all the tapes.
    fn check_arity(&self, rule: &Rule) -> Result<(), TuringMachineError> {
        let tapes = self.run.tapes.len();

        check_field(rule, Role::Read, Some(&rule.read), tapes)?;
        check_field(rule, Role::Write, rule.write.as_ref(), tapes)?;
        check_field(rule, Role::Move, rule.moves.as_ref(), tapes)
    }

    /// Returns the current state.
    pub fn state(&self) -> &str {
        &self.run.state
    }

    /// Returns the machine being run.
    pub fn machine(&self) -> &'m Machine {
        self.machine
    }

    /// Returns the total number of steps executed.
    pub fn step_count(&self) -> usize {
        self.step_count
    }

    /// Checks if the machine has reached its final state.
    pub fn is_halted(&self) -> bool {
        self.run.state == self.machine.final_state
    }

    /// Returns a slice of the tapes.
    pub fn tapes(&self) -> &[Tape] {
        &self.run.tapes
    }

    /// Returns the head position of every tape.
    pub fn heads(&self) -> Vec<usize> {
        self.run.tapes.iter().map(Tape::head).collect()
    }

    /// Returns the symbol under each tape's head.
    pub fn symbols(&self) -> Vec<char> {
        self.run.tapes.iter().map(Tape::read).collect()
    }

    /// Returns the current run state.
    pub fn run_state(&self) -> &RunState {
        &self.run
    }

    /// Consumes the simulator, handing back its run state.
    pub fn into_run_state(self) -> RunState {
        self.run
    }

    /// Counts the returned symbols on the current tapes.
    pub fn report(&self) -> Report {
        Report::new(self.machine, &self.run)
    }
}

/// Runs `machine` from `run` to its final state and returns the final run state.
pub fn run(machine: &Machine, run: RunState) -> Result<RunState, TuringMachineError> {
    let mut simulator = Simulator::new(machine, run);
    simulator.run()?;
    Ok(simulator.into_run_state())
}

fn check_field<T>(
    rule: &Rule,
    role: Role,
    field: Option<&Field<T>>,
    tapes: usize,
) -> Result<(), TuringMachineError> {
    match field {
        Some(field) if field.arity() != 1 && field.arity() < tapes => {
            Err(TuringMachineError::FieldArity {
                line: rule.line,
                role,
                tapes,
                found: field.arity(),
            })
        }
        _ => Ok(()),
    }
}
