use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};

use crate::extract::ExtractedRecord;

pub const REPORT_HEADER: [&str; 6] = [
    "School Name",
    "School Type",
    "Overview",
    "Student/Teacher Ratio",
    "Math Proficiency",
    "Reading Proficiency",
];

/// The columns of a record that make it into the CSV report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub school_name: String,
    pub school_type: String,
    pub overview: String,
    pub ratio: String,
    pub math: String,
    pub reading: String,
}

impl From<&ExtractedRecord> for ReportRow {
    fn from(r: &ExtractedRecord) -> Self {
        ReportRow {
            school_name: r.school_name.clone(),
            school_type: r.school_type.tag().to_string(),
            overview: r.overview.clone(),
            ratio: r.ratio.clone(),
            math: r.math.clone(),
            reading: r.reading.clone(),
        }
    }
}

impl ReportRow {
    fn fields(&self) -> [&str; 6] {
        [
            self.school_name.as_str(),
            self.school_type.as_str(),
            self.overview.as_str(),
            self.ratio.as_str(),
            self.math.as_str(),
            self.reading.as_str(),
        ]
    }
}

pub fn timestamped_filename(now: DateTime<Local>) -> String {
    format!("usnews_output_{}.csv", now.format("%Y-%m-%d_%H-%M-%S"))
}

/// Write all rows under `dir` in one go. The header is written even when
/// there are no rows.
pub fn write_report(dir: &Path, rows: &[ReportRow], now: DateTime<Local>) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(timestamped_filename(now));

    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(REPORT_HEADER)?;
    for row in rows {
        writer.write_record(row.fields())?;
    }
    writer.flush()?;

    Ok(path)
}
