pub mod layout;

use serde::Serialize;
use tracing::debug;

use crate::error::FetchError;
use crate::fetch::PageFetcher;
use crate::html;
use layout::{Layout, LayoutPatterns, Metric};

/// One school's fields. Same shape for both layouts; anything a layout does
/// not publish is an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedRecord {
    pub school_name: String,
    pub school_type: Layout,
    pub overview: String,
    pub ratio: String,
    pub math: String,
    pub reading: String,
    pub science: String,
    pub graduation: String,
}

/// Fetch the profile page and pull its fields. One attempt, no retries.
pub async fn extract<P>(url: &str, school_name: &str, pages: &P) -> Result<ExtractedRecord, FetchError>
where
    P: PageFetcher + ?Sized,
{
    let page = pages.fetch_page(url).await?;
    let text = html::render_text(&page);
    Ok(extract_from_text(url, school_name, &text))
}

pub fn extract_from_text(url: &str, school_name: &str, text: &str) -> ExtractedRecord {
    let layout = Layout::from_url(url);
    let patterns = layout.patterns();
    debug!("Extracting {} as {:?}", url, layout);

    let mut record = ExtractedRecord {
        school_name: school_name.to_string(),
        school_type: layout,
        overview: overview(patterns, school_name, text),
        ratio: String::new(),
        math: String::new(),
        reading: String::new(),
        science: String::new(),
        graduation: String::new(),
    };

    for (metric, re) in &patterns.metrics {
        let value = re
            .captures(text)
            .map(|c| c[1].to_string())
            .unwrap_or_default();
        let slot = match metric {
            Metric::Ratio => &mut record.ratio,
            Metric::Math => &mut record.math,
            Metric::Reading => &mut record.reading,
            Metric::Science => &mut record.science,
            Metric::Graduation => &mut record.graduation,
        };
        *slot = value;
    }

    record
}

/// Overview window between the layout's markers, collapsed to one line.
fn overview(patterns: &LayoutPatterns, school_name: &str, text: &str) -> String {
    let window = patterns
        .overview
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or("");

    let window = match &patterns.overview_cut {
        Some(cut) => cut.find(window).map_or(window, |m| &window[..m.start()]),
        None => window,
    };

    let mut lines: Vec<&str> = window
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    if patterns.drop_repeated_name
        && lines
            .first()
            .is_some_and(|first| first.to_lowercase() == school_name.to_lowercase())
    {
        lines.remove(0);
    }

    lines.join(" ")
}

// ── Tests ──
