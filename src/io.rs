// io.rs
// Plain-text numeric matrices for the plotting collaborator

use ndarray::Array2;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{SimError, SimResult};
use crate::experiment::ExperimentOutcome;
use crate::profile_scope;
use crate::surface::ActiveLayer;

/// One matrix row per line, values separated by single spaces.
pub fn write_matrix<P: AsRef<Path>>(path: P, matrix: &Array2<f64>) -> SimResult<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for row in matrix.rows() {
        write_row(&mut out, row.iter())?;
    }
    out.flush()?;
    Ok(())
}

/// Read a whitespace-delimited matrix. Blank lines and `#` lines are skipped.
pub fn read_matrix<P: AsRef<Path>>(path: P) -> SimResult<Array2<f64>> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let mut values = Vec::new();
    let mut width = None;
    let mut rows = 0;
    for (number, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let before = values.len();
        for token in trimmed.split_whitespace() {
            let value: f64 = token
                .parse()
                .map_err(|_| SimError::Parse(format!("line {}: '{token}' is not a number", number + 1)))?;
            values.push(value);
        }
        let count = values.len() - before;
        match width {
            None => width = Some(count),
            Some(w) if w != count => {
                return Err(SimError::Parse(format!(
                    "line {}: expected {w} columns, found {count}",
                    number + 1
                )))
            }
            _ => {}
        }
        rows += 1;
    }
    let width = width.unwrap_or(0);
    Array2::from_shape_vec((rows, width), values).map_err(|e| SimError::Parse(e.to_string()))
}

/// Parallel arrays as columns under a `#` header line.
pub fn write_columns<P: AsRef<Path>>(path: P, columns: &[(&str, &[f64])]) -> SimResult<()> {
    let rows = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
    if let Some((name, column)) = columns.iter().find(|(_, c)| c.len() != rows) {
        log::error!("column '{name}' has {} values, expected {rows}", column.len());
        return Err(SimError::ArraySizeMismatch {
            array: "column",
            expected: rows,
            actual: column.len(),
        });
    }

    let mut out = BufWriter::new(File::create(path)?);
    let header: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
    writeln!(out, "# {}", header.join(" "))?;
    for i in 0..rows {
        write_row(&mut out, columns.iter().map(|(_, c)| &c[i]))?;
    }
    out.flush()?;
    Ok(())
}

fn write_row<'a, W: Write>(out: &mut W, values: impl Iterator<Item = &'a f64>) -> SimResult<()> {
    let mut first = true;
    for v in values {
        if !first {
            write!(out, " ")?;
        }
        write!(out, "{v:.18e}")?;
        first = false;
    }
    writeln!(out)?;
    Ok(())
}

/// Compressed surface arrays, one site per line.
pub fn export_surface<P: AsRef<Path>>(dir: P, layer: &ActiveLayer) -> SimResult<PathBuf> {
    fs::create_dir_all(dir.as_ref())?;
    let surface = layer.compressed();
    let path = dir.as_ref().join("surface_compressed.txt");
    write_columns(
        &path,
        &[
            ("e0", &surface.e0),
            ("k0", &surface.k0),
            ("g", &surface.g),
            ("a", &surface.a),
            ("z", &surface.z),
        ],
    )?;
    Ok(path)
}

/// Write every array of an experiment into `dir`; returns the files written.
pub fn export_result<P: AsRef<Path>>(dir: P, outcome: &ExperimentOutcome) -> SimResult<Vec<PathBuf>> {
    profile_scope!("export");
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    let mut emit = |name: &str, columns: &[(&str, &[f64])]| -> SimResult<()> {
        let path = dir.join(name);
        write_columns(&path, columns)?;
        written.push(path);
        Ok(())
    };

    match outcome {
        ExperimentOutcome::Cv(cv) => {
            let s = &cv.sequence;
            emit(
                "cv_response.txt",
                &[
                    ("clock", &s.clock),
                    ("raw_potential", &s.raw_potential),
                    ("dlc_corrected_potential", &s.dlc_corrected_potential),
                    ("capacitive_current", &s.capacitive_current),
                    ("full_current", &cv.full_current),
                ],
            )?;
        }
        ExperimentOutcome::Swv(swv) => {
            let s = &swv.sequence;
            emit(
                "swv_sequence.txt",
                &[
                    ("clock", &s.clock),
                    ("raw_potential", &s.raw_potential),
                    ("dlc_corrected_potential", &s.dlc_corrected_potential),
                    ("capacitive_current", &s.capacitive_current),
                    ("full_current", &swv.full_current),
                ],
            )?;
            let n = swv.differential_current.len().min(swv.potential_steps.len());
            emit(
                "swv_differential.txt",
                &[
                    ("potential", &swv.potential_steps[..n]),
                    ("differential_current", &swv.differential_current[..n]),
                ],
            )?;
        }
        ExperimentOutcome::VfSwv(vf) => {
            for (i, (log_f, row)) in vf.log_frequency_axis.iter().zip(vf.matrix.rows()).enumerate() {
                let row = row.to_vec();
                emit(
                    &format!("vfswv_row_{i:03}_logf_{log_f:+.3}.txt"),
                    &[("potential", &vf.potential_axis), ("normalized_differential_current", &row)],
                )?;
            }
            emit("vfswv_potential_axis.txt", &[("potential", &vf.potential_axis)])?;
            emit("vfswv_log_frequency_axis.txt", &[("log_frequency", &vf.log_frequency_axis)])?;
            let path = dir.join("vfswv_matrix.txt");
            write_matrix(&path, &vf.matrix)?;
            written.push(path);
        }
    }
    log::info!("wrote {} file(s) to {}", written.len(), dir.display());
    Ok(written)
}
