//! This module defines the core data structures and types used throughout the simulator:
//! the step syntax, rules and their per-tape fields, tapes, the loaded machine, the
//! mutable run state, and the error type.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Read wildcard matching every symbol. As a write token it leaves the cell unchanged.
pub const WILDCARD_ANY: char = '*';
/// Read wildcard matching every symbol except the blank one. As a write token it
/// leaves the cell unchanged, exactly like [`WILDCARD_ANY`].
pub const WILDCARD_NON_BLANK: char = '~';
/// Starts an end-of-line comment in both machine and tape files.
pub const COMMENT_CHARACTER: char = '#';
/// Move token for a left head movement.
pub const MOVE_LEFT: &str = "L";
/// Move token for a right head movement.
pub const MOVE_RIGHT: &str = "R";

/// Returns `true` if `symbol` is one of the two wildcard symbols.
pub fn is_wildcard(symbol: char) -> bool {
    symbol == WILDCARD_ANY || symbol == WILDCARD_NON_BLANK
}

/// The logical role of a column in a rule row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// `Q`: the state the rule applies to.
    CurrentState,
    /// `r`: the symbols that must be under the heads.
    Read,
    /// `w`: the symbols written under the heads.
    Write,
    /// `m`: the head movements.
    Move,
    /// `N`: the state entered after the rule is applied.
    NextState,
}

impl Role {
    /// Maps a syntax tag to its role.
    pub fn from_tag(tag: char) -> Option<Self> {
        match tag {
            'Q' => Some(Role::CurrentState),
            'r' => Some(Role::Read),
            'w' => Some(Role::Write),
            'm' => Some(Role::Move),
            'N' => Some(Role::NextState),
            _ => None,
        }
    }

    /// The syntax tag of the role.
    pub fn tag(self) -> char {
        match self {
            Role::CurrentState => 'Q',
            Role::Read => 'r',
            Role::Write => 'w',
            Role::Move => 'm',
            Role::NextState => 'N',
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// The column layout of every rule row.
///
/// `CurrentState` and `Read` are always present. A `None` position means the
/// corresponding effect is skipped for every rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSyntax {
    pub current_state: usize,
    pub read: usize,
    pub write: Option<usize>,
    pub moves: Option<usize>,
    pub next_state: Option<usize>,
    /// Number of columns a rule row must have.
    pub width: usize,
}

impl StepSyntax {
    /// Returns the column of `role`, if the syntax declares it.
    pub fn position(&self, role: Role) -> Option<usize> {
        match role {
            Role::CurrentState => Some(self.current_state),
            Role::Read => Some(self.read),
            Role::Write => self.write,
            Role::Move => self.moves,
            Role::NextState => self.next_state,
        }
    }

    /// Returns the role assigned to `column`, if any.
    pub fn role_at(&self, column: usize) -> Option<Role> {
        [
            Role::CurrentState,
            Role::Read,
            Role::Write,
            Role::Move,
            Role::NextState,
        ]
        .into_iter()
        .find(|&role| self.position(role) == Some(column))
    }
}

/// One rule field: either a single value shared by every tape, or one value per tape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Field<T> {
    Shared(T),
    PerTape(Vec<T>),
}

impl<T> Field<T> {
    /// The first value of the field, used for the single-valued state columns.
    pub fn first(&self) -> Option<&T> {
        match self {
            Field::Shared(value) => Some(value),
            Field::PerTape(values) => values.first(),
        }
    }

    /// Number of values written in the source row.
    pub fn arity(&self) -> usize {
        match self {
            Field::Shared(_) => 1,
            Field::PerTape(values) => values.len(),
        }
    }

    /// Converts every value of the field, keeping its shape.
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> Field<U> {
        match self {
            Field::Shared(value) => Field::Shared(f(value)),
            Field::PerTape(values) => Field::PerTape(values.iter().map(f).collect()),
        }
    }

    /// Like [`Field::map`], stopping at the first conversion error.
    pub fn try_map<U, E>(&self, mut f: impl FnMut(&T) -> Result<U, E>) -> Result<Field<U>, E> {
        Ok(match self {
            Field::Shared(value) => Field::Shared(f(value)?),
            Field::PerTape(values) => {
                Field::PerTape(values.iter().map(f).collect::<Result<_, _>>()?)
            }
        })
    }
}

impl<T: Copy> Field<T> {
    /// Returns the value that applies to `tape`.
    ///
    /// A shared value, or a list with a single entry, applies to every tape.
    pub fn get(&self, tape: usize) -> Option<T> {
        match self {
            Field::Shared(value) => Some(*value),
            Field::PerTape(values) if values.len() == 1 => values.first().copied(),
            Field::PerTape(values) => values.get(tape).copied(),
        }
    }
}

/// Represents the possible directions a head can move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Move the head one position to the right.
    Right,
    /// Keep the head in the same position.
    Stay,
}

impl Direction {
    /// `L` and `R` move the head; every other token keeps it in place.
    pub fn from_token(token: &str) -> Self {
        match token {
            MOVE_LEFT => Direction::Left,
            MOVE_RIGHT => Direction::Right,
            _ => Direction::Stay,
        }
    }
}

/// A single row of the rule table, with its columns resolved to roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// 1-based line of the row in the machine description.
    pub line: usize,
    pub state: String,
    pub read: Field<char>,
    pub write: Option<Field<char>>,
    pub moves: Option<Field<Direction>>,
    pub next_state: Option<String>,
}

/// A loaded machine description. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    /// Symbol used to extend the tapes.
    pub blank: char,
    /// Symbols whose occurrences are counted on every tape at halt.
    pub returned: Vec<char>,
    pub initial_state: String,
    pub final_state: String,
    pub syntax: StepSyntax,
    pub rules: Vec<Rule>,
}

/// A growable tape with a single read/write head.
///
/// The head is always a valid index: the tape is extended with a blank whenever
/// the head would leave it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tape {
    cells: Vec<char>,
    head: usize,
}

impl Tape {
    /// Creates a tape with the head on its first cell. An empty tape holds one blank.
    pub fn new(mut cells: Vec<char>, blank: char) -> Self {
        if cells.is_empty() {
            cells.push(blank);
        }
        Self { cells, head: 0 }
    }

    pub fn cells(&self) -> &[char] {
        &self.cells
    }

    pub fn head(&self) -> usize {
        self.head
    }

    /// The symbol under the head.
    pub fn read(&self) -> char {
        self.cells[self.head]
    }

    /// Overwrites the symbol under the head.
    pub fn write(&mut self, symbol: char) {
        self.cells[self.head] = symbol;
    }

    /// Moves the head, growing the tape by one blank if it would leave either end.
    pub fn shift(&mut self, direction: Direction, blank: char) {
        match direction {
            Direction::Left => {
                if self.head == 0 {
                    self.cells.insert(0, blank);
                } else {
                    self.head -= 1;
                }
            }
            Direction::Right => {
                self.head += 1;
                if self.head == self.cells.len() {
                    self.cells.push(blank);
                }
            }
            Direction::Stay => {}
        }
    }

    /// Counts the occurrences of `symbol` across the whole tape.
    pub fn count(&self, symbol: char) -> usize {
        self.cells.iter().filter(|&&c| c == symbol).count()
    }
}

impl fmt::Display for Tape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.cells.iter().try_for_each(|c| write!(f, "{c}"))
    }
}

/// The mutable part of a run: the current state and the tapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    pub state: String,
    pub tapes: Vec<Tape>,
}

impl RunState {
    /// Builds the initial run state of `machine` over the given tape contents.
    pub fn new(machine: &Machine, tapes: Vec<Vec<char>>) -> Self {
        Self {
            state: machine.initial_state.clone(),
            tapes: tapes
                .into_iter()
                .map(|cells| Tape::new(cells, machine.blank))
                .collect(),
        }
    }
}

/// Represents the outcome of a single execution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A rule was applied and the machine has not reached its final state.
    Continue,
    /// The machine is in its final state.
    Halt,
}

/// Represents the errors that can occur while loading or running a machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TuringMachineError {
    /// A tag in the syntax line is not one of `Q`, `r`, `w`, `m`, `N`.
    #[error("Invalid syntax: unknown step '{0}'")]
    InvalidSyntax(char),
    /// The syntax line lacks the current state or the read step.
    #[error("Incomplete syntax: a current state (Q) and a read (r) step are required")]
    IncompleteSyntax,
    /// A rule row could not be split into fields.
    #[error("Malformed rule on line {line}: {reason}")]
    MalformedRule { line: usize, reason: String },
    /// The machine description ended before the named header line.
    #[error("Missing header line: {0}")]
    MissingHeader(&'static str),
    /// No rule is declared for the current state.
    #[error("No state found: {0}")]
    NoStateFound(String),
    /// Rules exist for the state but none matches the symbols under the heads.
    #[error("No rule found for state {state} and symbols {symbols:?}")]
    NoRuleFound { state: String, symbols: Vec<char> },
    /// Several rules match the symbols under the heads.
    #[error("Non-unique rule for state {state} and symbols {symbols:?} (lines {lines:?})")]
    NonUniqueRule {
        state: String,
        symbols: Vec<char>,
        lines: Vec<usize>,
    },
    /// A per-tape list does not provide a value for every tape.
    #[error("Rule on line {line} gives {found} {role} values for {tapes} tapes")]
    FieldArity {
        line: usize,
        role: Role,
        tapes: usize,
        found: usize,
    },
    /// A bounded run did not reach the final state in time.
    #[error("Final state not reached after {0} steps")]
    StepLimitExceeded(usize),
    /// Reading a machine or tape file failed.
    #[error("File error: {0}")]
    FileError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_tags() {
        for tag in ['Q', 'r', 'w', 'm', 'N'] {
            assert_eq!(Role::from_tag(tag).unwrap().tag(), tag);
        }
        assert_eq!(Role::from_tag('x'), None);
    }

    #[test]
    fn test_direction_tokens() {
        assert_eq!(Direction::from_token("L"), Direction::Left);
        assert_eq!(Direction::from_token("R"), Direction::Right);
        assert_eq!(Direction::from_token("-"), Direction::Stay);
        assert_eq!(Direction::from_token("S"), Direction::Stay);
    }

    #[test]
    fn test_field_get() {
        let shared = Field::Shared('a');
        assert_eq!(shared.get(0), Some('a'));
        assert_eq!(shared.get(5), Some('a'));

        let single = Field::PerTape(vec!['b']);
        assert_eq!(single.get(3), Some('b'));

        let per_tape = Field::PerTape(vec!['x', 'y']);
        assert_eq!(per_tape.get(1), Some('y'));
        assert_eq!(per_tape.get(2), None);
        assert_eq!(per_tape.arity(), 2);
    }

    #[test]
    fn test_field_arity_of_raw_tokens() {
        let tokens = Field::PerTape(vec!["L".to_string(), "-".to_string(), "R".to_string()]);
        assert_eq!(tokens.arity(), 3);
        assert_eq!(Field::Shared("q0".to_string()).arity(), 1);
    }

    #[test]
    fn test_tape_grows_left() {
        let mut tape = Tape::new(vec!['a', 'b'], 'B');
        tape.shift(Direction::Left, 'B');

        assert_eq!(tape.cells(), &['B', 'a', 'b']);
        assert_eq!(tape.head(), 0);
    }

    #[test]
    fn test_tape_grows_right() {
        let mut tape = Tape::new(vec!['a', 'b'], 'B');
        tape.shift(Direction::Right, 'B');
        assert_eq!(tape.cells(), &['a', 'b']);
        assert_eq!(tape.head(), 1);

        tape.shift(Direction::Right, 'B');
        assert_eq!(tape.cells(), &['a', 'b', 'B']);
        assert_eq!(tape.head(), 2);
    }

    #[test]
    fn test_empty_tape_is_seeded_with_blank() {
        let tape = Tape::new(Vec::new(), '_');
        assert_eq!(tape.read(), '_');
    }

    #[test]
    fn test_tape_serialization() {
        let tape = Tape::new(vec!['1', '0'], 'B');
        let json = serde_json::to_string(&tape).unwrap();
        assert_eq!(json, r#"{"cells":["1","0"],"head":0}"#);

        let back: Tape = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tape);
    }

    #[test]
    fn test_error_display() {
        let error = TuringMachineError::NoStateFound("q5".to_string());
        assert_eq!(error.to_string(), "No state found: q5");

        let error = TuringMachineError::NoRuleFound {
            state: "q0".to_string(),
            symbols: vec!['a', 'B'],
        };
        assert_eq!(
            error.to_string(),
            "No rule found for state q0 and symbols ['a', 'B']"
        );
    }
}
