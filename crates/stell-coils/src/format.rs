//! Coils text file: reading and writing
//!
//! ```text
//! periods 5
//! begin filament
//! mirror NIL
//! x y z I
//! ...
//! x y z 0 <group id> <group name>
//! end
//! ```

use std::fs;
use std::path::Path;

use crate::coil::Point;
use crate::coilset::{CoilPoint, CoilSet};
use crate::error::{CoilError, Result};

/// Parse a coils file from its text.
pub fn parse_coils(text: &str) -> Result<CoilSet> {
    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l));

    let nfp = header_line(&mut lines, 1, "periods <nfp>", |tokens| {
        let at = tokens.iter().position(|t| *t == "periods")?;
        tokens.get(at + 1)?.parse::<usize>().ok()
    })?;
    header_line(&mut lines, 2, "begin filament", |tokens| {
        tokens.windows(2).any(|w| w == ["begin", "filament"]).then_some(())
    })?;
    header_line(&mut lines, 3, "mirror", |tokens| tokens.contains(&"mirror").then_some(()))?;

    let mut points = Vec::new();
    for (number, line) in lines {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.first() == Some(&"end") {
            break;
        }
        if tokens.len() < 4 {
            continue;
        }
        let value = |k: usize| -> Result<f64> {
            tokens[k].parse::<f64>().map_err(|e| CoilError::Parse {
                line: number,
                message: format!("invalid number {:?}: {e}", tokens[k]),
            })
        };
        let position = Point::new(value(0)?, value(1)?, value(2)?);
        let current = value(3)?;

        let group = match tokens.len() {
            4 => None,
            5 => {
                return Err(CoilError::Parse {
                    line: number,
                    message: "group id without a group name".to_string(),
                })
            }
            _ => {
                let id = tokens[4]
                    .parse::<usize>()
                    .ok()
                    .filter(|&id| id > 0)
                    .ok_or_else(|| CoilError::Parse {
                        line: number,
                        message: format!("invalid group id {:?}", tokens[4]),
                    })?;
                Some((id, tokens[5..].join(" ")))
            }
        };
        points.push(CoilPoint {
            position,
            current,
            group,
        });
    }

    tracing::debug!(nfp, points = points.len(), "parsed coils file");
    CoilSet::from_points(nfp, &points)
}

fn header_line<'a, T>(
    lines: &mut impl Iterator<Item = (usize, &'a str)>,
    line: usize,
    expected: &'static str,
    check: impl FnOnce(&[&str]) -> Option<T>,
) -> Result<T> {
    let tokens: Vec<&str> = lines
        .next()
        .map(|(_, l)| l.split_whitespace().collect())
        .unwrap_or_default();
    check(&tokens).ok_or(CoilError::MissingHeader { line, expected })
}

/// Read and parse a coils file.
pub fn read_coils_file(path: impl AsRef<Path>) -> Result<CoilSet> {
    let text = fs::read_to_string(path)?;
    parse_coils(&text)
}

/// Serialize a coil set to the coils file layout.
pub fn write_coils(set: &CoilSet) -> String {
    let mut out = format!("periods {}\nbegin filament\nmirror NIL\n", set.nfp());
    for point in set.to_points() {
        let p = point.position;
        let mut line = format!(
            "{} {} {} {}",
            sci(p.x),
            sci(p.y),
            sci(p.z),
            sci(point.current)
        );
        if let Some((id, name)) = &point.group {
            line.push_str(&format!(" {id} {name}"));
        }
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Write a coil set to `path`.
pub fn write_coils_file(set: &CoilSet, path: impl AsRef<Path>) -> Result<()> {
    fs::write(path, write_coils(set))?;
    Ok(())
}

/// `%.10E` layout: ten fraction digits, signed exponent of at least two digits.
fn sci(value: f64) -> String {
    let formatted = format!("{value:.10E}");
    match formatted.split_once('E') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}E{sign}{digits:0>2}")
        }
        // inf / NaN
        None => formatted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
periods 3
begin filament
mirror NIL
1.0 0.0 0.0 5.0e3
0.0 1.0 0.0 5.0e3
-1.0 0.0 0.0 5.0e3
1.0 0.0 0.0 0.0
2.0 0.0 0.5 -5.0e3
2.0 1.0 0.5 0.0 1 Modular
0.0 0.0 1.0 2.0e2
0.0 1.0 1.0 0.0 2 Planar Coil
end
";

    #[test]
    fn test_parse_sample() {
        let set = parse_coils(SAMPLE).unwrap();
        assert_eq!(set.nfp(), 3);
        assert_eq!(set.ngroups(), 2);
        let modular = set.group("Modular").unwrap();
        assert_eq!(modular.ncoils(), 2);
        assert_eq!(modular.current(), 5.0e3);
        // second coil runs opposite to the reference current and is reversed
        assert_eq!(modular.coils()[1].points()[0], Point::new(2.0, 1.0, 0.5));
        assert_eq!(set.group("Planar Coil").unwrap().current(), 200.0);
    }

    #[test]
    fn test_header_errors_carry_line_numbers() {
        let err = parse_coils("begin filament\n").unwrap_err();
        assert!(matches!(err, CoilError::MissingHeader { line: 1, .. }));

        let err = parse_coils("periods 2\nmirror NIL\n").unwrap_err();
        assert!(matches!(err, CoilError::MissingHeader { line: 2, .. }));

        let err = parse_coils("periods 2\nbegin filament\n").unwrap_err();
        assert!(matches!(err, CoilError::MissingHeader { line: 3, .. }));

        let err = parse_coils("periods x\nbegin filament\nmirror NIL\n").unwrap_err();
        assert!(matches!(err, CoilError::MissingHeader { line: 1, .. }));
    }

    #[test]
    fn test_data_errors() {
        let header = "periods 1\nbegin filament\nmirror NIL\n";
        let err = parse_coils(&format!("{header}1.0 0.0 abc 1.0\n")).unwrap_err();
        assert!(matches!(err, CoilError::Parse { line: 4, .. }));

        let err = parse_coils(&format!("{header}1 0 0 1\n1 1 0 0 1\n")).unwrap_err();
        assert!(matches!(err, CoilError::Parse { line: 5, .. }));

        let err = parse_coils(&format!("{header}1 0 0 1\n1 1 0 0 0 zero\n")).unwrap_err();
        assert!(matches!(err, CoilError::Parse { line: 5, .. }));

        let err = parse_coils(&format!("{header}1 0 0 0.0 periods\n")).unwrap_err();
        assert!(matches!(err, CoilError::Parse { line: 4, .. }));

        let err = parse_coils(&format!("{header}1 0 0 1\n1 1 0 0 2 second\n")).unwrap_err();
        assert!(matches!(err, CoilError::MissingGroup(1)));
    }

    #[test]
    fn test_short_lines_skipped_and_end_optional() {
        let text = "periods 1\nbegin filament\nmirror NIL\n\n# note\n1 0 0 1\n1 1 0 0 1 only\n";
        let set = parse_coils(text).unwrap();
        assert_eq!(set.ncoils(), 1);
        assert_eq!(set.groups()[0].coils()[0].npts(), 2);
    }

    #[test]
    fn test_sci_layout() {
        assert_eq!(sci(1.0), "1.0000000000E+00");
        assert_eq!(sci(-5000.0), "-5.0000000000E+03");
        assert_eq!(sci(1.25e-7), "1.2500000000E-07");
        assert_eq!(sci(0.0), "0.0000000000E+00");
        assert_eq!(sci(3.0e120), "3.0000000000E+120");
    }

    #[test]
    fn test_write_layout() {
        let set = parse_coils(SAMPLE).unwrap();
        let text = write_coils(&set);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(&lines[..3], &["periods 3", "begin filament", "mirror NIL"]);
        assert_eq!(
            lines[3],
            "1.0000000000E+00 0.0000000000E+00 0.0000000000E+00 5.0000000000E+03"
        );
        assert!(lines[6].ends_with(" 0.0000000000E+00"));
        assert!(lines[8].ends_with("0.0000000000E+00 1 Modular"));
        assert!(lines[10].ends_with("0.0000000000E+00 2 Planar Coil"));
        assert!(!text.contains("end"));
        assert_eq!(parse_coils(&text).unwrap(), set);
    }
}
