use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;

use crate::cine::{CineError, SampleSeries};

/// Anything that can turn a file reference into a validated series.
pub trait SignalSource {
    fn load(&mut self, file: &Path) -> Result<SampleSeries, CineError>;
}

/// Delimited text files: time in the first column, amplitude in the second.
///
/// Columns may be separated by commas, semicolons, tabs or spaces. Blank
/// lines and `#` comments are skipped, and a single non-numeric first row is
/// taken as a header.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileSource;

impl FileSource {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(path: &Path, contents: &str) -> Result<SampleSeries, CineError> {
        let mut time = Vec::new();
        let mut amplitude = Vec::new();
        let mut header_allowed = true;
        for (idx, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line
                .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
                .filter(|f| !f.is_empty())
                .collect();
            let parsed = parse_row(&fields);
            if header_allowed && parsed.is_err() && fields.iter().any(|f| f.parse::<f64>().is_err()) {
                header_allowed = false;
                debug!("{}: treating line {} as header", path.display(), idx + 1);
                continue;
            }
            header_allowed = false;
            let (t, a) = parsed.map_err(|reason| CineError::ParseFailure {
                path: path.to_path_buf(),
                line: idx + 1,
                reason,
            })?;
            time.push(t);
            amplitude.push(a);
        }
        SampleSeries::new(time, amplitude)
    }
}

fn parse_row(fields: &[&str]) -> Result<(f64, f64), String> {
    if fields.len() < 2 {
        return Err(format!("expected 2 columns, found {}", fields.len()));
    }
    let number = |field: &str| match field.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        Ok(_) => Err(format!("`{field}` is not a finite number")),
        Err(e) => Err(format!("`{field}` is not a number: {e}")),
    };
    Ok((number(fields[0])?, number(fields[1])?))
}

impl SignalSource for FileSource {
    fn load(&mut self, file: &Path) -> Result<SampleSeries, CineError> {
        let contents = std::fs::read_to_string(file).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CineError::NotFound(file.to_path_buf()),
            _ => CineError::ParseFailure {
                path: file.to_path_buf(),
                line: 0,
                reason: e.to_string(),
            },
        })?;
        let series = Self::parse(file, &contents)?;
        debug!("read {} samples from {}", series.len(), file.display());
        Ok(series)
    }
}

/// In-memory source useful for tests and deterministic playback.
#[derive(Debug, Default)]
pub struct ManualSource {
    files: HashMap<PathBuf, SampleSeries>,
}

impl ManualSource {
    pub fn new(files: impl IntoIterator<Item = (PathBuf, SampleSeries)>) -> Self {
        Self {
            files: files.into_iter().collect(),
        }
    }
}

impl SignalSource for ManualSource {
    fn load(&mut self, file: &Path) -> Result<SampleSeries, CineError> {
        self.files
            .get(file)
            .cloned()
            .ok_or_else(|| CineError::NotFound(file.to_path_buf()))
    }
}
