//! Parser for the line-oriented environment file.
//!
//! ```text
//! # comment lines and blank lines are skipped
//! 3,3          # rows,cols
//! 0,0,E        # start row,col[,heading]
//! 2,2          # goal row,col[,heading]
//! 1            # obstacle count
//! 1,1          # one line per obstacle
//! 0.0,0.0,0.0,0.0   # double-move probabilities, one per move
//! 0.0,0.0,0.0,0.0   # drift clockwise
//! 0.0,0.0,0.0,0.0   # drift counter-clockwise
//! ```
//!
//! Trailing `#` comments on data lines are not supported; a line is either a
//! comment or data. The probability rows are validated and kept so that
//! files stay round-trippable, but the deterministic dynamics ignore them.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{ConfigError, Result};
use crate::moves::{Heading, Move};
use crate::position::Position;

/// A start or goal cell with its optional heading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<Heading>,
}

impl From<Position> for Placement {
    fn from(position: Position) -> Self {
        Self {
            position,
            heading: None,
        }
    }
}

/// One probability per move, keyed positionally against [`Move::ALL`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveProbabilities(pub [f64; 4]);

impl MoveProbabilities {
    #[must_use]
    pub fn get(&self, action: Move) -> f64 {
        self.0[action.index()]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    pub rows: usize,
    pub cols: usize,
    pub start: Placement,
    pub goal: Placement,
    pub obstacles: Vec<Position>,
    pub double_move: MoveProbabilities,
    pub drift_cw: MoveProbabilities,
    pub drift_ccw: MoveProbabilities,
}

impl EnvironmentConfig {
    /// Reads and parses an environment file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise any
    /// error of [`EnvironmentConfig::parse`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parses the text of an environment file.
    ///
    /// # Errors
    ///
    /// Fails with a line-numbered error on malformed lines, on a missing
    /// section, on probabilities outside `[0, 1]` and on extra data lines.
    /// Bounds are not checked here; that happens in
    /// [`Environment::from_config`](crate::Environment::from_config).
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(idx, line)| (idx + 1, line.trim()))
            .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'));

        let (line, dims) = lines
            .next()
            .ok_or(ConfigError::MissingSection("grid dimensions"))?;
        let (rows, cols) = parse_pair(line, dims)?;

        let (line, start) = lines.next().ok_or(ConfigError::MissingSection("start"))?;
        let start = parse_placement(line, start)?;

        let (line, goal) = lines.next().ok_or(ConfigError::MissingSection("goal"))?;
        let goal = parse_placement(line, goal)?;

        let (line, count) = lines
            .next()
            .ok_or(ConfigError::MissingSection("obstacle count"))?;
        let count = parse_usize(line, count)?;

        let mut obstacles = Vec::with_capacity(count);
        for _ in 0..count {
            let (line, obstacle) = lines.next().ok_or(ConfigError::MissingSection("obstacle"))?;
            obstacles.push(Position::from(parse_pair(line, obstacle)?));
        }

        let mut rows_of_probabilities = [MoveProbabilities::default(); 3];
        for (slot, section) in rows_of_probabilities.iter_mut().zip([
            "double-move probabilities",
            "drift-clockwise probabilities",
            "drift-counterclockwise probabilities",
        ]) {
            let (line, text) = lines.next().ok_or(ConfigError::MissingSection(section))?;
            *slot = parse_probabilities(line, text)?;
        }
        let [double_move, drift_cw, drift_ccw] = rows_of_probabilities;

        if let Some((line, _)) = lines.next() {
            return Err(ConfigError::TrailingInput { line });
        }

        Ok(Self {
            rows,
            cols,
            start,
            goal,
            obstacles,
            double_move,
            drift_cw,
            drift_ccw,
        })
    }
}

impl FromStr for EnvironmentConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> ConfigError {
    ConfigError::Parse {
        line,
        message: message.into(),
    }
}

fn parse_usize(line: usize, token: &str) -> Result<usize> {
    token
        .trim()
        .parse()
        .map_err(|_| parse_error(line, format!("expected a non-negative integer, got '{}'", token.trim())))
}

fn parse_pair(line: usize, text: &str) -> Result<(usize, usize)> {
    let fields: Vec<&str> = text.split(',').collect();
    match fields.as_slice() {
        [a, b] => Ok((parse_usize(line, a)?, parse_usize(line, b)?)),
        _ => Err(parse_error(
            line,
            format!("expected two comma-separated integers, got '{text}'"),
        )),
    }
}

fn parse_placement(line: usize, text: &str) -> Result<Placement> {
    let fields: Vec<&str> = text.split(',').collect();
    let (row, column, heading) = match fields.as_slice() {
        [r, c] => (r, c, None),
        [r, c, h] => (r, c, Some(h)),
        _ => {
            return Err(parse_error(
                line,
                format!("expected 'row,col[,heading]', got '{text}'"),
            ))
        }
    };

    let heading = heading
        .map(|h| h.parse::<Heading>().map_err(|msg| parse_error(line, msg)))
        .transpose()?;

    Ok(Placement {
        position: Position::new(parse_usize(line, row)?, parse_usize(line, column)?),
        heading,
    })
}

fn parse_probabilities(line: usize, text: &str) -> Result<MoveProbabilities> {
    let fields: Vec<&str> = text.split(',').collect();
    if fields.len() != Move::ALL.len() {
        return Err(parse_error(
            line,
            format!(
                "expected {} probabilities, got {}",
                Move::ALL.len(),
                fields.len()
            ),
        ));
    }

    let mut out = [0.0; 4];
    for (slot, field) in out.iter_mut().zip(fields) {
        let value: f64 = field
            .trim()
            .parse()
            .map_err(|_| parse_error(line, format!("expected a number, got '{}'", field.trim())))?;
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::InvalidProbability { line, value });
        }
        *slot = value;
    }
    Ok(MoveProbabilities(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const SAMPLE: &str = "\
# grid
3,4

# start facing east
0,0,E
2,3
2
1,1
1,2
0.1,0.0,0.0,0.0
0.0,0.2,0.0,0.0
0.0,0.0,0.3,0.4
";

    #[test]
    fn parses_full_file() {
        let cfg = EnvironmentConfig::parse(SAMPLE).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!((cfg.rows, cfg.cols), (3, 4));
        assert_eq!(cfg.start.position, Position::new(0, 0));
        assert_eq!(cfg.start.heading, Some(Heading::East));
        assert_eq!(cfg.goal, Placement::from(Position::new(2, 3)));
        assert_eq!(cfg.obstacles, vec![Position::new(1, 1), Position::new(1, 2)]);
        assert!((cfg.double_move.get(Move::Forward) - 0.1).abs() < f64::EPSILON);
        assert!((cfg.drift_cw.get(Move::Backward) - 0.2).abs() < f64::EPSILON);
        assert!((cfg.drift_ccw.get(Move::Left) - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn from_str_matches_parse() {
        let a: EnvironmentConfig = SAMPLE.parse().unwrap_or_else(|e| panic!("{e}"));
        let b = EnvironmentConfig::parse(SAMPLE).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(a, b);
    }

    #[test]
    fn zero_obstacles() {
        let text = "1,3\n0,0\n0,2\n0\n0,0,0,0\n0,0,0,0\n0,0,0,0\n";
        let cfg = EnvironmentConfig::parse(text).unwrap_or_else(|e| panic!("{e}"));
        assert!(cfg.obstacles.is_empty());
    }

    #[test]
    fn serializes_to_json() {
        let cfg = EnvironmentConfig::parse(SAMPLE).unwrap_or_else(|e| panic!("{e}"));
        let json = serde_json::to_string(&cfg).unwrap_or_else(|e| panic!("{e}"));
        assert!(json.contains("\"heading\":\"east\""));
        let back: EnvironmentConfig = serde_json::from_str(&json).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(back, cfg);
    }

    #[rstest]
    #[case("-3,3\n", 1)]
    #[case("3\n", 1)]
    #[case("3,3\n0,0,up\n", 2)]
    #[case("3,3\n0,0\n2,2\nmany\n", 4)]
    #[case("# c\n3,3\n0,0\n2,2\n0\n0,0,0\n", 6)]
    fn reports_line_of_parse_error(#[case] text: &str, #[case] expected_line: usize) {
        match EnvironmentConfig::parse(text) {
            Err(ConfigError::Parse { line, .. }) => assert_eq!(line, expected_line),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[rstest]
    #[case("", "grid dimensions")]
    #[case("3,3\n0,0\n", "goal")]
    #[case("3,3\n0,0\n2,2\n2\n1,1\n", "obstacle")]
    #[case("3,3\n0,0\n2,2\n0\n0,0,0,0\n0,0,0,0\n", "drift-counterclockwise probabilities")]
    fn reports_missing_section(#[case] text: &str, #[case] expected: &str) {
        match EnvironmentConfig::parse(text) {
            Err(ConfigError::MissingSection(section)) => assert_eq!(section, expected),
            other => panic!("expected missing section, got {other:?}"),
        }
    }

    #[test]
    fn rejects_probability_out_of_range() {
        let text = "1,2\n0,0\n0,1\n0\n0,0,0,0\n0,1.5,0,0\n0,0,0,0\n";
        match EnvironmentConfig::parse(text) {
            Err(ConfigError::InvalidProbability { line, value }) => {
                assert_eq!(line, 6);
                assert!((value - 1.5).abs() < f64::EPSILON);
            }
            other => panic!("expected invalid probability, got {other:?}"),
        }
    }

    #[test]
    fn rejects_trailing_data() {
        let text = "1,2\n0,0\n0,1\n0\n0,0,0,0\n0,0,0,0\n0,0,0,0\n# ok\n9,9\n";
        assert!(matches!(
            EnvironmentConfig::parse(text),
            Err(ConfigError::TrailingInput { line: 9 })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let path = std::env::temp_dir().join("gridplan_core_missing_env_file.txt");
        let _ = fs::remove_file(&path);
        assert!(matches!(
            EnvironmentConfig::from_path(&path),
            Err(ConfigError::Io(_))
        ));
    }
}
