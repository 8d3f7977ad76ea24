use crate::Cell;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The pattern header asks for a rule other than B3/S23.
    #[error("unsupported rule `{0}`, only B3/S23 is simulated")]
    UnsupportedRule(String),

    #[error("invalid run length `{0}`")]
    InvalidRun(String),

    /// Runs reach past [`MAX_EXTENT`] or the pattern has more than
    /// [`MAX_CELLS`] living cells.
    #[error("pattern is too large to load")]
    TooLarge,
}

/// Largest width or height a decoded pattern may span.
pub const MAX_EXTENT: i32 = 1 << 16;
/// Most living cells a decoded pattern may contain.
pub const MAX_CELLS: usize = 1 << 22;

/// Moves `coord` forward by `run`, staying inside the decodable extent.
fn advance_by(coord: i32, run: i32) -> Result<i32, DecodeError> {
    coord
        .checked_add(run)
        .filter(|&c| c <= MAX_EXTENT)
        .ok_or(DecodeError::TooLarge)
}

struct RunEncoder {
    sequence: String,
    line_len: usize,
    max_line_len: usize,
}
impl RunEncoder {
    fn new(max_line_len: usize) -> Self {
        Self {
            sequence: String::new(),
            line_len: 0,
            max_line_len,
        }
    }

    fn push_run(&mut self, run: i32, c: char) {
        let append = match run {
            0 => String::new(),
            1 => c.to_string(),
            n => format!("{}{}", n, c),
        };
        if self.line_len + append.len() > self.max_line_len {
            self.sequence.push('\n');
            self.line_len = 0;
        }
        self.line_len += append.len();
        self.sequence.push_str(&append);
    }

    fn end(mut self) -> String {
        self.sequence.push('!');
        self.sequence
    }
}

/// The RLE pattern format used by most Life software.
#[derive(Debug, Default)]
pub struct RunLengthEncoded {
    name: Option<String>,
}
impl RunLengthEncoded {
    pub fn set_name<T: AsRef<str>>(mut self, name: T) -> Self {
        self.name = Some(name.as_ref().to_owned());
        self
    }

    /// Writes `cells` with the top left corner of their bounding box at the
    /// pattern origin.
    pub fn encode(&self, cells: &[Cell]) -> String {
        let mut cells = cells.to_vec();
        cells.sort_unstable();
        cells.dedup();

        let min_x = cells.iter().map(|c| c.x).min().unwrap_or_default();
        let max_x = cells.iter().map(|c| c.x).max().unwrap_or_default();
        // sorted row-major, so the first and last cells bound the rows
        let min_y = cells.first().map(|c| c.y).unwrap_or_default();
        let max_y = cells.last().map(|c| c.y).unwrap_or_default();
        let (w, h) = if cells.is_empty() {
            (0, 0)
        } else {
            (max_x - min_x + 1, max_y - min_y + 1)
        };

        let mut header = String::new();
        if let Some(name) = &self.name {
            header.push_str(&format!("#N {}\n", name));
        }
        header.push_str(&format!("x = {}, y = {}, rule = B3/S23", w, h));

        format!("{}\n{}\n", header, Self::encode_cells(&cells, min_x, min_y))
    }

    fn encode_cells(cells: &[Cell], min_x: i32, min_y: i32) -> String {
        let mut last = Cell::new(min_x - 1, min_y);
        let mut alive_run = 0;
        let mut seq = RunEncoder::new(70);
        for &cell in cells {
            // extend the current run if the cell is right after the last one
            if last.y == cell.y && last.x + 1 == cell.x {
                alive_run += 1;
                last = cell;
                continue;
            }

            let lines_run = cell.y - last.y;
            let dead_run = match lines_run {
                0 => cell.x - last.x - 1,
                _ => cell.x - min_x,
            };
            // order matters
            seq.push_run(alive_run, 'o');
            seq.push_run(lines_run, '$');
            seq.push_run(dead_run, 'b');

            alive_run = 1;
            last = cell;
        }

        seq.push_run(alive_run, 'o');
        seq.end()
    }

    /// Reads an RLE pattern. Cells are placed relative to the pattern origin.
    pub fn decode(&self, value: &str) -> Result<Vec<Cell>, DecodeError> {
        static RUNS: OnceLock<Regex> = OnceLock::new();
        static RULE: OnceLock<Regex> = OnceLock::new();
        let runs = RUNS.get_or_init(|| Regex::new(r"(\d*)([bo$!])").expect("valid regex"));
        let rule = RULE.get_or_init(|| {
            Regex::new(r"(?i)rule\s*=\s*([A-Za-z0-9/]+)").expect("valid regex")
        });

        let mut alive = Vec::new();
        let mut cursor = Cell::zero();
        'lines: for line in value.lines() {
            let line = line.trim();
            if line.starts_with('#') {
                continue;
            }
            if line.starts_with('x') {
                if let Some(caps) = rule.captures(line) {
                    let name = &caps[1];
                    if !is_life_rule(name) {
                        return Err(DecodeError::UnsupportedRule(name.to_owned()));
                    }
                }
                continue;
            }

            for (_, [run_str, state]) in runs.captures_iter(line).map(|c| c.extract()) {
                let run = match run_str {
                    "" => 1,
                    s => s
                        .parse::<i32>()
                        .map_err(|_| DecodeError::InvalidRun(s.to_owned()))?,
                };
                match state {
                    "!" => break 'lines,
                    "o" => {
                        let end = advance_by(cursor.x, run)?;
                        if alive.len() + run as usize > MAX_CELLS {
                            return Err(DecodeError::TooLarge);
                        }
                        alive.extend((cursor.x..end).map(|x| Cell { x, y: cursor.y }));
                        cursor.x = end;
                    }
                    "b" => cursor.x = advance_by(cursor.x, run)?,
                    "$" => {
                        cursor.x = 0;
                        cursor.y = advance_by(cursor.y, run)?;
                    }
                    _ => unreachable!("regex only matches b, o, $ and !"),
                }
            }
        }

        Ok(alive)
    }
}

fn is_life_rule(name: &str) -> bool {
    matches!(name.to_ascii_uppercase().as_str(), "B3/S23" | "23/3" | "S23/B3")
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLIDER: &str = "#N Glider\n#C a comment\nx = 3, y = 3, rule = B3/S23\nbob$2bo$3o!\n";

    fn cells(coords: &[(i32, i32)]) -> Vec<Cell> {
        coords.iter().copied().map(Cell::from).collect()
    }

    #[test]
    fn decodes_glider() {
        let alive = RunLengthEncoded::default().decode(GLIDER).unwrap();

        assert_eq!(alive, cells(&[(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)]));
    }

    #[test]
    fn decode_without_header() {
        let alive = RunLengthEncoded::default().decode("2o$2o!").unwrap();

        assert_eq!(alive, cells(&[(0, 0), (1, 0), (0, 1), (1, 1)]));
    }

    #[test]
    fn decode_rejects_other_rules() {
        let err = RunLengthEncoded::default()
            .decode("x = 1, y = 1, rule = B36/S23\no!")
            .unwrap_err();

        assert_eq!(err, DecodeError::UnsupportedRule("B36/S23".into()));
    }

    #[test]
    fn decode_rejects_oversized_runs() {
        let err = RunLengthEncoded::default()
            .decode("99999999999o!")
            .unwrap_err();

        assert!(matches!(err, DecodeError::InvalidRun(_)));
    }

    #[test]
    fn decode_rejects_runs_that_add_up_past_the_extent() {
        let rle = RunLengthEncoded::default();

        assert_eq!(rle.decode("2000000000b2000000000bo!"), Err(DecodeError::TooLarge));
        assert_eq!(rle.decode("2000000000$2000000000$o!"), Err(DecodeError::TooLarge));
        assert_eq!(rle.decode("40000b40000bo!"), Err(DecodeError::TooLarge));
    }

    #[test]
    fn decode_rejects_huge_alive_runs() {
        let rle = RunLengthEncoded::default();

        assert_eq!(rle.decode("999999999o!"), Err(DecodeError::TooLarge));

        let rows = format!("{}!", "60000o$".repeat(80));
        assert_eq!(rle.decode(&rows), Err(DecodeError::TooLarge));
    }

    #[test]
    fn decode_accepts_runs_up_to_the_extent() {
        let alive = RunLengthEncoded::default()
            .decode(&format!("{}bo!", MAX_EXTENT - 1))
            .unwrap();

        assert_eq!(alive, cells(&[(MAX_EXTENT - 1, 0)]));
    }

    #[test]
    fn encodes_relative_to_bounding_box() {
        let alive = cells(&[(-4, 1), (-2, 1), (-3, 2)]);
        let encoded = RunLengthEncoded::default().set_name("test").encode(&alive);

        assert_eq!(encoded, "#N test\nx = 3, y = 2, rule = B3/S23\nobo$bo!\n");
    }

    #[test]
    fn encoded_pattern_decodes_to_same_shape() {
        let alive = cells(&[(1, 0), (2, 1), (0, 2), (1, 2), (2, 2)]);
        let rle = RunLengthEncoded::default();

        assert_eq!(rle.decode(&rle.encode(&alive)).unwrap(), alive);
    }
}
