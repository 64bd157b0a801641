//! Reader for the line-oriented text mesh format.
//!
//! Only two record kinds are understood:
//!
//! ```text
//! v <x> <y> <z>     vertex position
//! f <i1> <i2> <i3>  triangle, 1-based vertex indices
//! ```
//!
//! Every other line (comments, normals, texture coordinates, groups, blank
//! lines) is skipped without a diagnostic.

use crate::core::geometry::Face;
use nalgebra::Point3;
use std::fmt;
use std::io::BufRead;

/// Positions and faces in declaration order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParsedGeometry {
    pub positions: Vec<Point3<f32>>,
    pub faces: Vec<Face>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The record has fewer operands than its kind requires.
    MissingToken { record: &'static str, found: usize },
    /// The record has more operands than its kind accepts.
    UnexpectedToken { record: &'static str, token: String },
    /// An operand is not a valid number of the expected type.
    InvalidNumber { record: &'static str, token: String },
    /// A face index of 0, which has no 0-based equivalent.
    ZeroIndex,
    /// The underlying reader failed.
    Read(String),
}

/// A malformed record. `line` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: ", self.line)?;
        match &self.kind {
            ParseErrorKind::MissingToken { record, found } => write!(
                f,
                "'{record}' record needs {RECORD_ARITY} values, found {found}"
            ),
            ParseErrorKind::UnexpectedToken { record, token } => {
                write!(f, "unexpected token '{token}' after '{record}' record")
            }
            ParseErrorKind::InvalidNumber { record, token } => {
                write!(f, "invalid number '{token}' in '{record}' record")
            }
            ParseErrorKind::ZeroIndex => write!(f, "face indices are 1-based, found 0"),
            ParseErrorKind::Read(msg) => write!(f, "read failed: {msg}"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Both record kinds carry exactly three operands.
const RECORD_ARITY: usize = 3;

/// Parses a whole in-memory source.
pub fn parse_geometry(source: &str) -> Result<ParsedGeometry, ParseError> {
    let mut geometry = ParsedGeometry::default();
    for (number, line) in source.lines().enumerate() {
        parse_line(&mut geometry, number + 1, line)?;
    }
    Ok(geometry)
}

/// Parses line by line from a buffered reader in a single pass.
pub fn parse_reader<R: BufRead>(reader: R) -> Result<ParsedGeometry, ParseError> {
    let mut geometry = ParsedGeometry::default();
    for (number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| ParseError {
            line: number + 1,
            kind: ParseErrorKind::Read(e.to_string()),
        })?;
        parse_line(&mut geometry, number + 1, &line)?;
    }
    Ok(geometry)
}

fn parse_line(geometry: &mut ParsedGeometry, line: usize, text: &str) -> Result<(), ParseError> {
    let mut tokens = text.split_whitespace();
    let fail = |kind| ParseError { line, kind };

    match tokens.next() {
        Some("v") => {
            let [x, y, z] = operands("v", &mut tokens).map_err(fail)?;
            let coord = |token: &str| {
                token.parse::<f32>().map_err(|_| {
                    fail(ParseErrorKind::InvalidNumber {
                        record: "v",
                        token: token.to_string(),
                    })
                })
            };
            geometry
                .positions
                .push(Point3::new(coord(x)?, coord(y)?, coord(z)?));
        }
        Some("f") => {
            let [a, b, c] = operands("f", &mut tokens).map_err(fail)?;
            let index = |token: &str| match token.parse::<u32>() {
                Ok(0) => Err(fail(ParseErrorKind::ZeroIndex)),
                Ok(i) => Ok(i - 1),
                Err(_) => Err(fail(ParseErrorKind::InvalidNumber {
                    record: "f",
                    token: token.to_string(),
                })),
            };
            geometry.faces.push(Face::new(index(a)?, index(b)?, index(c)?));
        }
        _ => {}
    }
    Ok(())
}

/// Takes exactly three operands; anything short or long is an error.
fn operands<'a>(
    record: &'static str,
    tokens: &mut impl Iterator<Item = &'a str>,
) -> Result<[&'a str; RECORD_ARITY], ParseErrorKind> {
    let mut out = [""; RECORD_ARITY];
    for (found, slot) in out.iter_mut().enumerate() {
        *slot = tokens
            .next()
            .ok_or(ParseErrorKind::MissingToken { record, found })?;
    }
    match tokens.next() {
        Some(extra) => Err(ParseErrorKind::UnexpectedToken {
            record,
            token: extra.to_string(),
        }),
        None => Ok(out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_triangle_with_shifted_indices() {
        let geometry = parse_geometry("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        assert_eq!(
            geometry.positions,
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ]
        );
        assert_eq!(geometry.faces, vec![Face::new(0, 1, 2)]);
    }

    #[test]
    fn skips_unknown_records_and_keeps_order() {
        let source = "# bunny\n\no bunny\nvn 0 0 1\nv 1.5 -2 3e-1\n  \nvt 0 1\nv 4 5 6\nf 2 1 2\ns off\n";
        let geometry = parse_geometry(source).unwrap();
        assert_eq!(geometry.positions.len(), 2);
        assert_eq!(geometry.positions[0], Point3::new(1.5, -2.0, 0.3));
        assert_eq!(geometry.faces, vec![Face::new(1, 0, 1)]);
    }

    #[test]
    fn tolerates_tabs_and_carriage_returns() {
        let geometry = parse_geometry("v\t1\t2\t3\r\nf 1  1 1\r\n").unwrap();
        assert_eq!(geometry.positions, vec![Point3::new(1.0, 2.0, 3.0)]);
        assert_eq!(geometry.faces.len(), 1);
    }

    #[test]
    fn missing_coordinate_is_an_error() {
        let err = parse_geometry("v 0 0 0\nv 1 2\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(
            err.kind,
            ParseErrorKind::MissingToken {
                record: "v",
                found: 2
            }
        );
    }

    #[test]
    fn non_numeric_index_is_an_error() {
        let err = parse_geometry("v 0 0 0\nf 1 2 abc").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(
            err.kind,
            ParseErrorKind::InvalidNumber {
                record: "f",
                token: "abc".to_string()
            }
        );
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn rejects_zero_negative_and_extra_operands() {
        let zero = parse_geometry("f 0 1 2").unwrap_err();
        assert_eq!(zero.kind, ParseErrorKind::ZeroIndex);

        let negative = parse_geometry("f -1 1 2").unwrap_err();
        assert!(matches!(negative.kind, ParseErrorKind::InvalidNumber { .. }));

        let extra = parse_geometry("v 1 2 3 1.0").unwrap_err();
        assert_eq!(
            extra.kind,
            ParseErrorKind::UnexpectedToken {
                record: "v",
                token: "1.0".to_string()
            }
        );
    }

    #[test]
    fn reader_and_str_agree() {
        let source = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let from_reader = parse_reader(std::io::Cursor::new(source)).unwrap();
        assert_eq!(from_reader, parse_geometry(source).unwrap());
    }
}
