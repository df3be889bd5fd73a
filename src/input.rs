use std::path::Path;

use anyhow::{Context, Result};

/// Load the ordered query list. `.csv` files contribute their first column
/// (no header row); anything else is read one query per line. Entries are
/// trimmed and blanks dropped.
pub fn read_queries(path: &Path) -> Result<Vec<String>> {
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let raw = if is_csv {
        read_first_column(path)?
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
            .lines()
            .map(str::to_string)
            .collect()
    };

    Ok(raw
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect())
}

fn read_first_column(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut column = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("Malformed CSV in {}", path.display()))?;
        if let Some(first) = record.get(0) {
            column.push(first.to_string());
        }
    }
    Ok(column)
}
