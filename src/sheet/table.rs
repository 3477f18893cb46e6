//! # Tables: validated sheets and their bound dispatcher.
//!
//! A [`Sheet`] is a header row plus data rows whose first column is the time
//! (or phase) of the row. A [`Table`] pairs a sheet with one [`Setter`] per
//! data column and applies rows on request.
//!
//! ## Rules
//! - The first heading is `t`.
//! - Every row has exactly one cell per heading.
//! - Row times are present and strictly increasing.
//! - Every data column resolves to a setter when the table is bound, never
//!   later.
//! - Applying a row calls setters left to right, skips empty cells, and
//!   abandons the row on the first failing setter.

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::config::Topic;
use crate::error::{ConfigError, PlanError};
use crate::plan::{Bindings, Cx, Setter};

/// Heading of the time column.
pub const TIME_HEADING: &str = "t";

/// One data row: its time stamp and the optional cell of every data column.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Time (seconds) or phase (`[0, 1]`) of the row.
    pub at: f64,
    /// Cells of the data columns; `None` leaves that output untouched.
    pub cells: Vec<Option<f64>>,
}

/// Validated, unbound table.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Sheet {
    /// Validates `headings` (time column first) and full-width `rows`.
    ///
    /// Row indices in errors are 1-based and exclude the header.
    pub fn new<H: Into<String>>(
        headings: impl IntoIterator<Item = H>,
        rows: Vec<Vec<Option<f64>>>,
    ) -> Result<Self, ConfigError> {
        let mut headings = headings.into_iter().map(Into::into);
        match headings.next() {
            Some(h) if h == TIME_HEADING => {}
            other => {
                return Err(ConfigError::TimeHeader {
                    found: other.unwrap_or_default(),
                })
            }
        }
        let columns: Vec<String> = headings.collect();
        if rows.is_empty() {
            return Err(ConfigError::EmptySheet);
        }

        let expected = columns.len() + 1;
        let mut out = Vec::with_capacity(rows.len());
        let mut last = f64::NEG_INFINITY;
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != expected {
                return Err(ConfigError::RaggedRow {
                    row: i + 1,
                    len: row.len(),
                    expected,
                });
            }
            let at = row[0].unwrap_or(f64::NAN);
            if !at.is_finite() || at <= last {
                return Err(ConfigError::NonIncreasingTime { row: i + 1, time: at });
            }
            last = at;
            out.push(Row {
                at,
                cells: row[1..].to_vec(),
            });
        }
        Ok(Self { columns, rows: out })
    }

    /// Sheet whose cells are all present.
    pub fn dense<H: Into<String>>(
        headings: impl IntoIterator<Item = H>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, ConfigError> {
        Self::new(
            headings,
            rows.into_iter()
                .map(|r| r.into_iter().map(Some).collect())
                .collect(),
        )
    }

    /// Parses comma-separated text.
    ///
    /// Blank lines and lines starting with `#` are skipped. The first line
    /// left is the header. Commas inside double quotes do not split a cell
    /// and `""` inside quotes is a literal quote. Cells are trimmed and
    /// unquoted; an empty cell (or `""`) is `None`.
    pub fn parse_csv(text: &str) -> Result<Self, ConfigError> {
        let mut lines = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'));
        let headings: Vec<String> = match lines.next() {
            Some(header) => split_cells(header),
            None => return Err(ConfigError::EmptySheet),
        };

        let mut rows = Vec::new();
        for (i, line) in lines.enumerate() {
            let row = split_cells(line)
                .into_iter()
                .enumerate()
                .map(|(j, cell)| {
                    if cell.is_empty() {
                        return Ok(None);
                    }
                    cell.parse::<f64>().map(Some).map_err(|_| ConfigError::BadCell {
                        row: i + 1,
                        column: j + 1,
                        text: cell,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }
        Self::new(headings, rows)
    }

    /// Data column headings (time column excluded).
    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Data rows in time order.
    #[inline]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Always false for a validated sheet.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row time stamps in order.
    pub fn times(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.at).collect()
    }
}

impl FromStr for Sheet {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_csv(s)
    }
}

/// Splits one line into trimmed, unquoted cells.
fn split_cells(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                chars.next();
                cell.push('"');
            }
            '"' => quoted = !quoted,
            ',' if !quoted => cells.push(std::mem::take(&mut cell).trim().to_string()),
            _ => cell.push(c),
        }
    }
    cells.push(cell.trim().to_string());
    cells
}

/// A sheet bound to one setter per data column.
#[derive(Clone)]
pub struct Table {
    sheet: Sheet,
    setters: Vec<Setter>,
}

impl Table {
    /// Binds every data column of `sheet` through `bindings`.
    pub fn bind(sheet: Sheet, bindings: &Bindings) -> Result<Self, ConfigError> {
        let setters = sheet
            .columns
            .iter()
            .map(|name| {
                bindings
                    .get(name)
                    .cloned()
                    .ok_or_else(|| ConfigError::UnboundColumn { name: name.clone() })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { sheet, setters })
    }

    /// The underlying sheet.
    #[inline]
    pub fn sheet(&self) -> &Sheet {
        &self.sheet
    }

    /// Number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.sheet.len()
    }

    /// Always false for a bound table.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sheet.is_empty()
    }

    /// Time stamp of row `index`.
    #[inline]
    pub fn at(&self, index: usize) -> Option<f64> {
        self.sheet.rows.get(index).map(|r| r.at)
    }

    /// Applies row `index`: every present cell goes to its column's setter.
    ///
    /// Stops at the first failing setter; the remaining cells of the row are
    /// not applied. An out-of-range index applies nothing.
    pub fn apply_row(&self, cx: &Cx<'_>, index: usize) -> Result<(), PlanError> {
        let Some(row) = self.sheet.rows.get(index) else {
            return Ok(());
        };
        let verbose = cx.debugs(Topic::Setter);
        for (setter, cell) in self.setters.iter().zip(&row.cells) {
            if let Some(value) = *cell {
                if verbose {
                    debug!(target: "planvisor::sheet", plan = cx.label(), row = index, setter = setter.name(), value, "set");
                }
                setter.set(value)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("columns", &self.sheet.columns)
            .field("rows", &self.sheet.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::Config;
    use crate::context::{Context, PlanId};

    #[test]
    fn validation_rejects_malformed_sheets() {
        assert_eq!(
            Sheet::dense(["time", "x"], vec![vec![0.0, 1.0]]),
            Err(ConfigError::TimeHeader {
                found: "time".into()
            })
        );
        assert_eq!(
            Sheet::dense(["t", "x"], vec![]),
            Err(ConfigError::EmptySheet)
        );
        assert_eq!(
            Sheet::dense(["t", "x"], vec![vec![0.0, 1.0], vec![1.0]]),
            Err(ConfigError::RaggedRow {
                row: 2,
                len: 1,
                expected: 2
            })
        );
        assert_eq!(
            Sheet::dense(["t", "x"], vec![vec![0.0, 1.0], vec![0.0, 2.0]]),
            Err(ConfigError::NonIncreasingTime { row: 2, time: 0.0 })
        );
        assert!(matches!(
            Sheet::new(["t", "x"], vec![vec![None, Some(1.0)]]),
            Err(ConfigError::NonIncreasingTime { row: 1, .. })
        ));
    }

    #[test]
    fn csv_skips_comments_and_keeps_empty_cells() {
        let text = "\
# gait for the front legs
\"t\", \"hip\", knee

0, 1.5, \"\"
# mid stance
0.5, , -2
1, \"3\", 4
";
        let sheet: Sheet = text.parse().expect("valid csv");
        assert_eq!(sheet.columns(), ["hip", "knee"]);
        assert_eq!(sheet.times(), [0.0, 0.5, 1.0]);
        assert_eq!(sheet.rows()[0].cells, [Some(1.5), None]);
        assert_eq!(sheet.rows()[1].cells, [None, Some(-2.0)]);
        assert_eq!(sheet.rows()[2].cells, [Some(3.0), Some(4.0)]);
    }

    #[test]
    fn csv_quotes_keep_commas_in_one_cell() {
        let sheet: Sheet = "t,\"hip, left\",\"say \"\"hi\"\"\"\n0,1,2\n"
            .parse()
            .expect("valid csv");
        assert_eq!(sheet.columns(), ["hip, left", "say \"hi\""]);
        assert_eq!(sheet.rows()[0].cells, [Some(1.0), Some(2.0)]);
        assert_eq!(
            Sheet::parse_csv("t,x\n0,\"1,5\"\n"),
            Err(ConfigError::BadCell {
                row: 1,
                column: 2,
                text: "1,5".into()
            })
        );
    }

    #[test]
    fn csv_reports_bad_cells() {
        assert_eq!(
            Sheet::parse_csv("t,x\n0,1\n1,fast\n"),
            Err(ConfigError::BadCell {
                row: 2,
                column: 2,
                text: "fast".into()
            })
        );
        assert_eq!(Sheet::parse_csv("# nothing\n\n"), Err(ConfigError::EmptySheet));
    }

    #[test]
    fn binding_requires_every_column() {
        let sheet = Sheet::dense(["t", "x", "y"], vec![vec![0.0, 1.0, 2.0]]).expect("valid");
        let bindings = Bindings::builder()
            .setter(Setter::infallible("x", |_| {}))
            .build(&crate::plan::NoResolve)
            .expect("no specs");
        assert_eq!(
            Table::bind(sheet, &bindings).map(|_| ()),
            Err(ConfigError::UnboundColumn { name: "y".into() })
        );
    }

    #[test]
    fn failing_setter_abandons_rest_of_row() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let record = |name: &'static str| {
            let seen = seen.clone();
            Setter::infallible(name, move |v| seen.borrow_mut().push((name, v)))
        };
        let bindings = Bindings::builder()
            .setter(record("a"))
            .setter(Setter::new("b", |_| Err(PlanError::fail("stalled"))))
            .setter(record("c"))
            .build(&crate::plan::NoResolve)
            .expect("no specs");
        let sheet = Sheet::new(
            ["t", "a", "b", "c"],
            vec![
                vec![Some(0.0), Some(1.0), Some(2.0), Some(3.0)],
                vec![Some(1.0), Some(4.0), None, Some(6.0)],
            ],
        )
        .expect("valid");
        let table = Table::bind(sheet, &bindings).expect("bound");

        let context = Context::new(Rc::new(ManualClock::new(0.0)), Config::default());
        let cx = Cx::new(&context, &bindings, "test#0", PlanId::next());
        assert!(matches!(
            table.apply_row(&cx, 0),
            Err(PlanError::Setter { ref name, .. }) if name == "b"
        ));
        assert_eq!(table.apply_row(&cx, 1), Ok(()));
        assert_eq!(table.apply_row(&cx, 9), Ok(()));
        assert_eq!(*seen.borrow(), [("a", 1.0), ("a", 4.0), ("c", 6.0)]);
    }
}
