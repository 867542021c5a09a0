//! MPS reader.
//!
//! Fixed-format MPS with the sections `NAME`, `ROWS`, `COLUMNS`, `RHS`,
//! `BOUNDS`, `ENDATA`; row types `N`/`L`/`G`/`E`; `'MARKER'` integer blocks
//! in `COLUMNS`; bound types `UP`, `LO`, `FX`, `MI`, `PL`, `FR`, `BV`.
//! Files ending in `.gz` or `.bz2` are decompressed transparently.
//!
//! Columns are reordered binary / integer / continuous before the model is
//! assembled, as the engine requires.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use primal_core::{Mip, MipBuilder, VarType};
use thiserror::Error;

/// Sections of an MPS file, used to locate parse failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Name,
    Rows,
    Columns,
    Rhs,
    Bounds,
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Section::Name => "NAME",
            Section::Rows => "ROWS",
            Section::Columns => "COLUMNS",
            Section::Rhs => "RHS",
            Section::Bounds => "BOUNDS",
        };
        f.write_str(name)
    }
}

/// MPS parsing failures, tagged with the section they occurred in.
#[derive(Error, Debug)]
pub enum ParseError {
    /// Input could not be read.
    #[error("unable to read input: {0}")]
    Io(#[from] std::io::Error),

    /// A line in `section` did not conform to the format.
    #[error("error in section {section}: {message}")]
    Malformed {
        /// Failing section.
        section: Section,
        /// What went wrong.
        message: String,
    },

    /// The resulting model was rejected.
    #[error("invalid model: {0}")]
    Model(#[from] primal_core::ModelError),
}

fn malformed(section: Section, message: impl Into<String>) -> ParseError {
    ParseError::Malformed {
        section,
        message: message.into(),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Less,
    Greater,
    Equal,
}

struct ColData {
    name: String,
    integer: bool,
    obj: f64,
    entries: Vec<(usize, f64)>,
    lb: f64,
    ub: f64,
    lb_set: bool,
}

/// Parse an MPS file, decompressing by filename suffix.
pub fn parse(path: &Path) -> Result<Mip, ParseError> {
    let file = File::open(path)?;
    let name = path.to_string_lossy();

    let reader: Box<dyn Read> = if name.ends_with(".gz") {
        Box::new(flate2::read::GzDecoder::new(file))
    } else if name.ends_with(".bz2") {
        Box::new(bzip2::read::BzDecoder::new(file))
    } else {
        Box::new(file)
    };

    parse_reader(BufReader::new(reader))
}

/// Parse MPS content from any buffered reader.
pub fn parse_reader(reader: impl BufRead) -> Result<Mip, ParseError> {
    let mut lines = reader.lines().filter_map(|line| match line {
        Ok(text) => {
            let trimmed = text.trim().to_string();
            if trimmed.is_empty() || trimmed.starts_with('*') {
                None
            } else {
                Some(Ok(trimmed))
            }
        }
        Err(err) => Some(Err(err)),
    });

    let mut next_line = || -> Result<Option<String>, ParseError> {
        lines.next().transpose().map_err(ParseError::from)
    };

    // NAME header, then the ROWS marker.
    let header = next_line()?.ok_or_else(|| malformed(Section::Name, "empty file"))?;
    if !header.starts_with("NAME") {
        return Err(malformed(Section::Name, "missing NAME header"));
    }
    match next_line()? {
        Some(line) if line == "ROWS" => {}
        _ => return Err(malformed(Section::Name, "expected ROWS section")),
    }

    // ROWS: N declares the objective, L/G/E declare constraints.
    let mut obj_name: Option<String> = None;
    let mut row_ids: HashMap<String, usize> = HashMap::new();
    let mut row_kinds: Vec<RowKind> = Vec::new();
    let mut row_names: Vec<String> = Vec::new();

    loop {
        let line = next_line()?.ok_or_else(|| malformed(Section::Rows, "unexpected end"))?;
        if line == "COLUMNS" {
            break;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() != 2 {
            return Err(malformed(Section::Rows, format!("bad row line {line:?}")));
        }

        let kind = match tokens[0] {
            "N" => {
                if obj_name.is_none() {
                    obj_name = Some(tokens[1].to_string());
                }
                continue;
            }
            "L" => RowKind::Less,
            "G" => RowKind::Greater,
            "E" => RowKind::Equal,
            other => {
                return Err(malformed(Section::Rows, format!("unknown row type {other:?}")))
            }
        };

        if row_ids.insert(tokens[1].to_string(), row_kinds.len()).is_some() {
            return Err(malformed(
                Section::Rows,
                format!("duplicate row {:?}", tokens[1]),
            ));
        }
        row_kinds.push(kind);
        row_names.push(tokens[1].to_string());
    }

    let obj_name = obj_name.ok_or_else(|| malformed(Section::Rows, "no objective row"))?;

    // COLUMNS: coefficient pairs, with integer sections fenced by markers.
    let mut cols: Vec<ColData> = Vec::new();
    let mut col_ids: HashMap<String, usize> = HashMap::new();
    let mut integer_section = false;

    loop {
        let line = next_line()?.ok_or_else(|| malformed(Section::Columns, "unexpected end"))?;
        if line == "RHS" {
            break;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() == 3 && tokens[1] == "'MARKER'" {
            match tokens[2] {
                "'INTORG'" if !integer_section => integer_section = true,
                "'INTEND'" if integer_section => integer_section = false,
                other => {
                    return Err(malformed(
                        Section::Columns,
                        format!("unexpected marker {other:?}"),
                    ))
                }
            }
            continue;
        }
        if tokens.len() < 3 || tokens.len() % 2 == 0 {
            return Err(malformed(
                Section::Columns,
                format!("bad column line {line:?}"),
            ));
        }

        let col_id = match col_ids.get(tokens[0]) {
            Some(&id) => id,
            None => {
                let id = cols.len();
                col_ids.insert(tokens[0].to_string(), id);
                cols.push(ColData {
                    name: tokens[0].to_string(),
                    integer: integer_section,
                    obj: 0.0,
                    entries: Vec::new(),
                    lb: 0.0,
                    ub: f64::INFINITY,
                    lb_set: false,
                });
                id
            }
        };

        for pair in tokens[1..].chunks(2) {
            let coef: f64 = pair[1]
                .parse()
                .map_err(|_| malformed(Section::Columns, format!("bad value {:?}", pair[1])))?;
            if pair[0] == obj_name {
                cols[col_id].obj = coef;
            } else {
                let row = *row_ids
                    .get(pair[0])
                    .ok_or_else(|| {
                        malformed(Section::Columns, format!("unknown row {:?}", pair[0]))
                    })?;
                cols[col_id].entries.push((row, coef));
            }
        }
    }

    // RHS: default sides follow the row type, entries overwrite them.
    let mut lhs: Vec<f64> = Vec::with_capacity(row_kinds.len());
    let mut rhs: Vec<f64> = Vec::with_capacity(row_kinds.len());
    for kind in &row_kinds {
        let (lo, hi) = match kind {
            RowKind::Less => (f64::NEG_INFINITY, 0.0),
            RowKind::Greater => (0.0, f64::INFINITY),
            RowKind::Equal => (0.0, 0.0),
        };
        lhs.push(lo);
        rhs.push(hi);
    }

    let mut saw_bounds = false;
    loop {
        let line = match next_line()? {
            Some(line) => line,
            None => return Err(malformed(Section::Rhs, "unexpected end")),
        };
        if line == "BOUNDS" {
            saw_bounds = true;
            break;
        }
        if line == "ENDATA" {
            break;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 3 || tokens.len() % 2 == 0 {
            return Err(malformed(Section::Rhs, format!("bad rhs line {line:?}")));
        }

        for pair in tokens[1..].chunks(2) {
            let side: f64 = pair[1]
                .parse()
                .map_err(|_| malformed(Section::Rhs, format!("bad value {:?}", pair[1])))?;
            let row = *row_ids
                .get(pair[0])
                .ok_or_else(|| malformed(Section::Rhs, format!("unknown row {:?}", pair[0])))?;
            match row_kinds[row] {
                RowKind::Less => rhs[row] = side,
                RowKind::Greater => lhs[row] = side,
                RowKind::Equal => {
                    lhs[row] = side;
                    rhs[row] = side;
                }
            }
        }
    }

    // BOUNDS: UP/LO/FX/MI/PL carry a value, FR/BV do not. A negative UP
    // without an explicit LO drops the lower bound to -inf.
    if saw_bounds {
        loop {
            let line =
                next_line()?.ok_or_else(|| malformed(Section::Bounds, "unexpected end"))?;
            if line == "ENDATA" {
                break;
            }

            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 3 {
                return Err(malformed(Section::Bounds, format!("bad bound line {line:?}")));
            }

            let col = *col_ids.get(tokens[2]).ok_or_else(|| {
                malformed(Section::Bounds, format!("unknown column {:?}", tokens[2]))
            })?;
            let col = &mut cols[col];

            let value = |section_tokens: &[&str]| -> Result<f64, ParseError> {
                section_tokens
                    .get(3)
                    .ok_or_else(|| malformed(Section::Bounds, format!("missing value in {line:?}")))?
                    .parse()
                    .map_err(|_| malformed(Section::Bounds, format!("bad value in {line:?}")))
            };

            match tokens[0] {
                "UP" => {
                    let bound = value(&tokens)?;
                    col.ub = bound;
                    if bound < 0.0 && !col.lb_set {
                        col.lb = f64::NEG_INFINITY;
                    }
                }
                "LO" => {
                    col.lb = value(&tokens)?;
                    col.lb_set = true;
                }
                "FX" => {
                    let bound = value(&tokens)?;
                    col.lb = bound;
                    col.ub = bound;
                    col.lb_set = true;
                }
                "MI" => col.lb = f64::NEG_INFINITY,
                "PL" => col.ub = f64::INFINITY,
                "FR" => {
                    col.lb = f64::NEG_INFINITY;
                    col.ub = f64::INFINITY;
                }
                "BV" => {
                    col.integer = true;
                    col.lb = 0.0;
                    col.ub = 1.0;
                    col.lb_set = true;
                }
                other => {
                    return Err(malformed(
                        Section::Bounds,
                        format!("unknown bound type {other:?}"),
                    ))
                }
            }
        }
    }

    // Partition columns binary / integer / continuous, stable within each
    // class, and assemble the model in the permuted order.
    let class = |col: &ColData| -> u8 {
        if col.integer {
            if col.lb == 0.0 && col.ub == 1.0 {
                0
            } else {
                1
            }
        } else {
            2
        }
    };

    let mut order: Vec<usize> = (0..cols.len()).collect();
    order.sort_by_key(|&i| class(&cols[i]));

    let mut builder = MipBuilder::new();
    let mut new_ids = vec![0usize; cols.len()];
    for &old in &order {
        let col = &cols[old];
        let var_type = match class(col) {
            0 => VarType::Binary,
            1 => VarType::Integer,
            _ => VarType::Continuous,
        };
        new_ids[old] = builder.add_var(col.name.clone(), var_type, col.lb, col.ub, col.obj);
    }

    // Rows are rebuilt from the per-column entries.
    let mut row_coefs: Vec<Vec<(usize, f64)>> = vec![Vec::new(); row_kinds.len()];
    for (old, col) in cols.iter().enumerate() {
        for &(row, coef) in &col.entries {
            row_coefs[row].push((new_ids[old], coef));
        }
    }
    for (row, coefs) in row_coefs.into_iter().enumerate() {
        builder.add_row(row_names[row].clone(), lhs[row], rhs[row], &coefs);
    }

    Ok(builder.build()?)
}
