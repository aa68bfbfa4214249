#![allow(clippy::module_inception)]

use std::{fmt::Display, rc::Rc};

use crate::errors::errors::{Error, ErrorTip};

pub mod ast;
pub mod compiler;
pub mod config;
pub mod errors;
pub mod lexer;
pub mod macros;
pub mod parser;
pub mod type_checker;

extern crate regex;

/// A point in a source file. Lines and columns are 1-based.
#[derive(Debug, Clone)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub file: Rc<String>,
}

impl Position {
    pub fn new(line: u32, column: u32, file: Rc<String>) -> Self {
        Position { line, column, file }
    }

    pub fn null() -> Self {
        Position {
            line: 0,
            column: 0,
            file: Rc::new(String::from("<null>")),
        }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[derive(Debug, Clone)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// Returns the text of the 1-based `line` of `source`, without its line break.
pub fn get_line(source: &str, line: u32) -> Option<&str> {
    if line == 0 {
        return None;
    }

    source
        .split('\n')
        .nth(line as usize - 1)
        .map(|text| text.trim_end_matches('\r'))
}

/// Renders a front-end error with the offending line and a caret under the
/// reported column.
///
/// ```text
/// Error: UnexpectedToken (Unexpected token: `)`, did you miss a semicolon?)
/// -> main.arrow
///    |
/// 20 | int a <- (2;
///    | -----------^
/// ```
pub fn format_error(error: &Error, source: &str) -> String {
    let position = error.get_position();
    let line_string = position.line.to_string();
    let padding = line_string.len() + 2;

    let mut rendered = match error.get_tip() {
        ErrorTip::None => format!("Error: {}\n", error.get_error_name()),
        tip => format!("Error: {} ({})\n", error.get_error_name(), tip),
    };
    rendered.push_str(&format!("-> {}\n", position.file));
    rendered.push_str(&format!("{:>padding$}\n", "|"));

    if let Some(line_text) = get_line(source, position.line) {
        let (line_text_removed, removed_whitespace) = remove_starting_whitespace(line_text);
        rendered.push_str(&format!("{} | {}\n", line_string, line_text_removed.trim_end()));

        let arrows = (position.column as usize)
            .saturating_sub(removed_whitespace)
            .max(1);
        rendered.push_str(&format!("{:>padding$} {:->arrows$}\n", "|", "^"));
    }

    rendered
}

fn remove_starting_whitespace(string: &str) -> (String, usize) {
    let start = string.chars().take_while(|c| *c == ' ').count();

    (String::from(&string[start..]), start)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use crate::errors::errors::{Error, ErrorImpl};
    use crate::Position;

    #[test]
    fn test_get_line() {
        let source = "int a <- 1;\n  boolean b;\r\nprint(a);";
        assert_eq!(super::get_line(source, 1), Some("int a <- 1;"));
        assert_eq!(super::get_line(source, 2), Some("  boolean b;"));
        assert_eq!(super::get_line(source, 3), Some("print(a);"));
        assert_eq!(super::get_line(source, 4), None);
        assert_eq!(super::get_line(source, 0), None);
    }

    #[test]
    fn test_format_error_points_at_column() {
        let source = "int a <- 1;\n    a <- # 2;";
        let error = Error::new(
            ErrorImpl::UnrecognisedToken {
                token: String::from("#"),
            },
            Position::new(2, 10, Rc::new(String::from("test.arrow"))),
        );

        let rendered = super::format_error(&error, source);
        let lines = rendered.lines().collect::<Vec<&str>>();

        assert_eq!(lines[0], "Error: UnrecognisedToken");
        assert_eq!(lines[1], "-> test.arrow");
        assert_eq!(lines[3], "2 | a <- # 2;");
        assert_eq!(lines[4], "  | -----^");
    }
}
