use std::fs;
use std::path::Path;

use crate::{EvalError, Result};

/// Reads a UTF-8 file as one record per line.
pub fn read_lines(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).map_err(|source| EvalError::io(path, source))?;
    Ok(data.lines().map(str::to_string).collect())
}

/// Writes records joined by `\n`, creating parent directories as needed.
pub fn write_lines<S: AsRef<str>>(path: impl AsRef<Path>, lines: &[S]) -> Result<()> {
    let data = lines
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join("\n");
    write_text(path, &data)
}

pub fn write_text(path: impl AsRef<Path>, data: &str) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| EvalError::io(parent, source))?;
    }
    fs::write(path, data).map_err(|source| EvalError::io(path, source))
}

pub fn copy_file(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<()> {
    let (from, to) = (from.as_ref(), to.as_ref());
    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| EvalError::io(parent, source))?;
    }
    fs::copy(from, to).map_err(|source| EvalError::io(from, source))?;
    Ok(())
}
