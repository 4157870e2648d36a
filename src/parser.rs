//! This module parses machine descriptions and tape files.
//!
//! A machine description starts with five header lines (blank symbol, returned symbols,
//! initial state, final state, step syntax) followed by one rule per line. Rule rows are
//! tokenized with the `pest` grammar in `grammar.pest`, then each field is converted to
//! the type its column's role requires.

use crate::types::{
    Direction, Field, Machine, Role, Rule, StepSyntax, TuringMachineError, COMMENT_CHARACTER,
};
use pest::{error::LineColLocation, Parser as PestParser};
use std::io::{BufRead, Lines};

mod row {
    use pest_derive::Parser as PestParser;

    /// Derives a `PestParser` for the rule row grammar defined in `grammar.pest`.
    #[derive(PestParser)]
    #[grammar = "grammar.pest"]
    pub struct RowParser;
}

pub use row::{RowParser, Rule as RowToken};

/// Parses a machine description into a `Machine`.
///
/// Only the shape of the description is checked here. Whether the rule table is
/// consistent (reachable states, unambiguous rules) is discovered while running.
///
/// # Returns
///
/// * `Err(TuringMachineError::MissingHeader)` if the stream ends inside the header.
/// * `Err(TuringMachineError::InvalidSyntax)` or `Err(TuringMachineError::IncompleteSyntax)`
///   if the step syntax line is invalid.
/// * `Err(TuringMachineError::MalformedRule)` if a rule row cannot be split into fields.
pub fn parse_machine<R: BufRead>(reader: R) -> Result<Machine, TuringMachineError> {
    let mut lines = SourceLines::new(reader);

    let blank = strip_comment(&lines.header("blank symbol", true)?)
        .chars()
        .next()
        .ok_or(TuringMachineError::MissingHeader("blank symbol"))?;
    let returned = returned_symbols(&lines.header("returned symbols", false)?);
    let initial_state = state_header(&lines.header("initial state", true)?);
    let final_state = state_header(&lines.header("final state", true)?);
    let syntax = parse_syntax(strip_comment(&lines.header("step syntax", true)?))?;

    let mut rules = Vec::new();
    while let Some((number, line)) = lines.next_line()? {
        let content = line.trim();
        if content.is_empty() || content.starts_with(COMMENT_CHARACTER) {
            continue;
        }
        rules.push(parse_rule(&line, number, &syntax)?);
    }

    Ok(Machine {
        blank,
        returned,
        initial_state,
        final_state,
        syntax,
        rules,
    })
}

/// Parses the step syntax line: whitespace separated role tags, in column order.
pub fn parse_syntax(line: &str) -> Result<StepSyntax, TuringMachineError> {
    let tags: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();

    let mut current_state = None;
    let mut read = None;
    let mut write = None;
    let mut moves = None;
    let mut next_state = None;

    for (column, &tag) in tags.iter().enumerate() {
        let slot = match Role::from_tag(tag).ok_or(TuringMachineError::InvalidSyntax(tag))? {
            Role::CurrentState => &mut current_state,
            Role::Read => &mut read,
            Role::Write => &mut write,
            Role::Move => &mut moves,
            Role::NextState => &mut next_state,
        };
        *slot = Some(column);
    }

    match (current_state, read) {
        (Some(current_state), Some(read)) => Ok(StepSyntax {
            current_state,
            read,
            write,
            moves,
            next_state,
            width: tags.len(),
        }),
        _ => Err(TuringMachineError::IncompleteSyntax),
    }
}

/// Parses a tape file: one tape per non-empty line, comments stripped.
pub fn parse_tapes<R: BufRead>(reader: R) -> Result<Vec<Vec<char>>, TuringMachineError> {
    let mut tapes = Vec::new();

    for line in reader.lines() {
        let line = line.map_err(read_error)?;
        let cells: Vec<char> = strip_comment(line.trim_end_matches('\r')).chars().collect();
        if !cells.is_empty() {
            tapes.push(cells);
        }
    }

    Ok(tapes)
}

/// Parses one rule row and resolves its columns against `syntax`.
fn parse_rule(
    line: &str,
    number: usize,
    syntax: &StepSyntax,
) -> Result<Rule, TuringMachineError> {
    let fields = split_fields(line, number)?;

    if fields.len() != syntax.width {
        return Err(malformed(
            number,
            format!("expected {} fields, found {}", syntax.width, fields.len()),
        ));
    }

    Ok(Rule {
        line: number,
        state: state_label(&fields[syntax.current_state]),
        read: symbol_field(&fields[syntax.read], number, Role::Read)?,
        write: syntax
            .write
            .map(|column| symbol_field(&fields[column], number, Role::Write))
            .transpose()?,
        moves: syntax
            .moves
            .map(|column| fields[column].map(|token| Direction::from_token(token))),
        next_state: syntax.next_state.map(|column| state_label(&fields[column])),
    })
}

/// Splits a rule row into raw fields, respecting parentheses.
fn split_fields(line: &str, number: usize) -> Result<Vec<Field<String>>, TuringMachineError> {
    let pairs = RowParser::parse(RowToken::row, line).map_err(|e| row_error(e, number))?;

    Ok(pairs
        .flat_map(|row| row.into_inner())
        .filter_map(|pair| match pair.as_rule() {
            RowToken::token => Some(Field::Shared(pair.as_str().to_string())),
            RowToken::list => Some(Field::PerTape(
                pair.into_inner()
                    .map(|item| item.as_str().chars().filter(|c| !is_separator(*c)).collect())
                    .collect(),
            )),
            _ => None,
        })
        .collect())
}

fn is_separator(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Converts a Read or Write field, whose values must be single symbols.
fn symbol_field(
    field: &Field<String>,
    line: usize,
    role: Role,
) -> Result<Field<char>, TuringMachineError> {
    field.try_map(|token| {
        single_symbol(token).ok_or_else(|| {
            malformed(
                line,
                format!("{role} value '{token}' is not a single symbol"),
            )
        })
    })
}

fn single_symbol(token: &str) -> Option<char> {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (Some(symbol), None) => Some(symbol),
        _ => None,
    }
}

/// State columns hold a single label; a list contributes its first value.
fn state_label(field: &Field<String>) -> String {
    field.first().cloned().unwrap_or_default()
}

/// Every character of the line is a returned symbol, whitespace included. Only the
/// padding in front of an end-of-line comment is dropped.
fn returned_symbols(line: &str) -> Vec<char> {
    match line.split_once(COMMENT_CHARACTER) {
        Some((content, _)) => content.trim_end().chars().collect(),
        None => line.chars().collect(),
    }
}

fn state_header(line: &str) -> String {
    strip_comment(line).trim().to_string()
}

fn strip_comment(line: &str) -> &str {
    line.split_once(COMMENT_CHARACTER)
        .map_or(line, |(content, _)| content)
}

fn malformed(line: usize, reason: String) -> TuringMachineError {
    TuringMachineError::MalformedRule { line, reason }
}

/// Creates a `TuringMachineError::MalformedRule` from a row grammar error.
fn row_error(error: pest::error::Error<RowToken>, line: usize) -> TuringMachineError {
    let column = match error.line_col {
        LineColLocation::Pos((_, column)) | LineColLocation::Span((_, column), _) => column,
    };

    malformed(
        line,
        format!("{} at column {column}", error.variant.message()),
    )
}

fn read_error(error: std::io::Error) -> TuringMachineError {
    TuringMachineError::FileError(format!("Failed to read input: {error}"))
}

/// Line reader that tracks 1-based line numbers and skips header comments.
struct SourceLines<R> {
    lines: Lines<R>,
    number: usize,
}

impl<R: BufRead> SourceLines<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            number: 0,
        }
    }

    fn next_line(&mut self) -> Result<Option<(usize, String)>, TuringMachineError> {
        match self.lines.next() {
            Some(line) => {
                self.number += 1;
                let line = line.map_err(read_error)?;
                Ok(Some((self.number, line.trim_end_matches('\r').to_string())))
            }
            None => Ok(None),
        }
    }

    /// Returns the next header line. Lines starting with `#` are skipped, and so are
    /// empty lines unless `skip_empty` is false.
    fn header(
        &mut self,
        name: &'static str,
        skip_empty: bool,
    ) -> Result<String, TuringMachineError> {
        while let Some((_, line)) = self.next_line()? {
            if line.starts_with(COMMENT_CHARACTER) || (skip_empty && line.is_empty()) {
                continue;
            }
            return Ok(line);
        }

        Err(TuringMachineError::MissingHeader(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<Machine, TuringMachineError> {
        parse_machine(input.as_bytes())
    }

    #[test]
    fn test_parse_simple_machine() {
        let input = "B\n|X\nq0\nhalt\nQ r w m N\nq0 | B R q1\nq0 B X - halt\nq1 | | - halt\n";

        let machine = parse(input).unwrap();
        assert_eq!(machine.blank, 'B');
        assert_eq!(machine.returned, vec!['|', 'X']);
        assert_eq!(machine.initial_state, "q0");
        assert_eq!(machine.final_state, "halt");
        assert_eq!(machine.rules.len(), 3);
        assert_eq!(
            machine.rules[0],
            Rule {
                line: 6,
                state: "q0".into(),
                read: Field::Shared('|'),
                write: Some(Field::Shared('B')),
                moves: Some(Field::Shared(Direction::Right)),
                next_state: Some("q1".into()),
            }
        );
    }

    #[test]
    fn test_parse_syntax_order() {
        let syntax = parse_syntax("N  r Q").unwrap();
        assert_eq!(syntax.next_state, Some(0));
        assert_eq!(syntax.read, 1);
        assert_eq!(syntax.current_state, 2);
        assert_eq!(syntax.write, None);
        assert_eq!(syntax.moves, None);
        assert_eq!(syntax.width, 3);
        assert_eq!(syntax.role_at(0), Some(Role::NextState));
    }

    #[test]
    fn test_parse_syntax_invalid_tag() {
        assert_eq!(
            parse_syntax("Q r x"),
            Err(TuringMachineError::InvalidSyntax('x'))
        );
    }

    #[test]
    fn test_parse_syntax_incomplete() {
        assert_eq!(
            parse_syntax("Q w m N"),
            Err(TuringMachineError::IncompleteSyntax)
        );
        assert_eq!(
            parse_syntax("r w"),
            Err(TuringMachineError::IncompleteSyntax)
        );
    }

    #[test]
    fn test_parse_per_tape_fields() {
        let input = "B\n\nq0\nhalt\nQ r w m N\nq0 (a, B) (*,a) (R,-) q0\n";

        let machine = parse(input).unwrap();
        let rule = &machine.rules[0];
        assert_eq!(rule.read, Field::PerTape(vec!['a', 'B']));
        assert_eq!(rule.write, Some(Field::PerTape(vec!['*', 'a'])));
        assert_eq!(
            rule.moves,
            Some(Field::PerTape(vec![Direction::Right, Direction::Stay]))
        );
        assert!(machine.returned.is_empty());
    }

    #[test]
    fn test_parse_whitespace_returned_symbols() {
        let machine = parse("B\n| \nq0\nhalt\nQ r\n").unwrap();
        assert_eq!(machine.returned, vec!['|', ' ']);

        let machine = parse("B\n \t\nq0\nhalt\nQ r\n").unwrap();
        assert_eq!(machine.returned, vec![' ', '\t']);

        let machine = parse("B\n| X   # padding before the comment\nq0\nhalt\nQ r\n").unwrap();
        assert_eq!(machine.returned, vec!['|', ' ', 'X']);
    }

    #[test]
    fn test_parse_spaces_inside_lists() {
        let input = "B\n\nq0\nhalt\nQ r m N\nq0 ( a ,\tb ) (L, -) (h alt, x)\n";

        let machine = parse(input).unwrap();
        let rule = &machine.rules[0];
        assert_eq!(rule.read, Field::PerTape(vec!['a', 'b']));
        assert_eq!(
            rule.moves,
            Some(Field::PerTape(vec![Direction::Left, Direction::Stay]))
        );
        assert_eq!(rule.next_state.as_deref(), Some("halt"));
    }

    #[test]
    fn test_parse_spaces_joining_list_symbols() {
        let input = "B\n\nq0\nhalt\nQ r N\nq0 (a b,c) halt\n";

        let error = parse(input).unwrap_err();
        assert_eq!(
            error,
            TuringMachineError::MalformedRule {
                line: 6,
                reason: "r value 'ab' is not a single symbol".into(),
            }
        );
    }

    #[test]
    fn test_parse_comments() {
        let input = r#"# Machine with comments
B    # blank
01   # returned
q0   # initial
halt # final
Q r N
# a full line comment
q0 1 halt # trailing comment
q0 (#,0) halt
"#;

        let machine = parse(input).unwrap();
        assert_eq!(machine.blank, 'B');
        assert_eq!(machine.returned, vec!['0', '1']);
        assert_eq!(machine.initial_state, "q0");
        assert_eq!(machine.final_state, "halt");
        assert_eq!(machine.rules.len(), 2);
        assert_eq!(machine.rules[0].next_state.as_deref(), Some("halt"));
        assert_eq!(machine.rules[1].read, Field::PerTape(vec!['#', '0']));
    }

    #[test]
    fn test_parse_skips_blank_rows() {
        let input = "B\n1\nq0\nhalt\nQ r\n\nq0 1\n   \n\t\nq0 B\n";

        let machine = parse(input).unwrap();
        assert_eq!(machine.rules.len(), 2);
        assert_eq!(machine.rules[1].line, 10);
        assert_eq!(machine.rules[1].write, None);
        assert_eq!(machine.rules[1].next_state, None);
    }

    #[test]
    fn test_parse_commas_outside_lists() {
        let input = "B\n\nq0\nhalt\nQ r N\nq0,a * next,state\n";

        let machine = parse(input).unwrap();
        assert_eq!(machine.rules[0].state, "q0,a");
        assert_eq!(machine.rules[0].next_state.as_deref(), Some("next,state"));
    }

    #[test]
    fn test_parse_nested_parentheses() {
        let input = "B\n\nq0\nhalt\nQ r N\nq0 ((a),b) halt\n";

        let error = parse(input).unwrap_err();
        assert!(matches!(
            error,
            TuringMachineError::MalformedRule { line: 6, .. }
        ));
    }

    #[test]
    fn test_parse_unbalanced_parentheses() {
        for row in ["q0 (a,b halt", "q0 a,b) halt", "q0 a(b,c) halt"] {
            let input = format!("B\n\nq0\nhalt\nQ r N\n{row}\n");
            let error = parse(&input).unwrap_err();
            assert!(
                matches!(error, TuringMachineError::MalformedRule { line: 6, .. }),
                "row {row:?} gave {error:?}"
            );
        }
    }

    #[test]
    fn test_parse_wrong_field_count() {
        let input = "B\n\nq0\nhalt\nQ r w m N\nq0 a b R\n";

        let error = parse(input).unwrap_err();
        assert_eq!(
            error,
            TuringMachineError::MalformedRule {
                line: 6,
                reason: "expected 5 fields, found 4".into(),
            }
        );
    }

    #[test]
    fn test_parse_multi_character_symbol() {
        let input = "B\n\nq0\nhalt\nQ r N\nq0 ab halt\n";

        let error = parse(input).unwrap_err();
        assert!(error.to_string().contains("'ab' is not a single symbol"));
    }

    #[test]
    fn test_parse_missing_header() {
        let error = parse("B\n01\nq0\n").unwrap_err();
        assert_eq!(error, TuringMachineError::MissingHeader("final state"));
    }

    #[test]
    fn test_parse_crlf_lines() {
        let input = "B\r\n1\r\nq0\r\nhalt\r\nQ r N\r\nq0 1 halt\r\n";

        let machine = parse(input).unwrap();
        assert_eq!(machine.returned, vec!['1']);
        assert_eq!(machine.final_state, "halt");
        assert_eq!(machine.rules[0].next_state.as_deref(), Some("halt"));
    }

    #[test]
    fn test_parse_tapes() {
        let input = "abc\n# comment only\n\nB B# trailing\r\n";

        let tapes = parse_tapes(input.as_bytes()).unwrap();
        assert_eq!(tapes, vec![vec!['a', 'b', 'c'], vec!['B', ' ', 'B']]);
    }

    #[test]
    fn test_parse_no_tapes() {
        let tapes = parse_tapes("\n# nothing\n".as_bytes()).unwrap();
        assert!(tapes.is_empty());
    }
}
