use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

const PERCENT: &str = r"\d+%";
const RATIO: &str = r"[\d:]+";

/// Page structure, decided by URL shape alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Layout {
    #[serde(rename = "K-12")]
    K12,
    #[serde(rename = "High School")]
    HighSchool,
}

impl Layout {
    pub fn from_url(url: &str) -> Self {
        if url.contains("best-high-schools") {
            Layout::HighSchool
        } else {
            Layout::K12
        }
    }

    /// Value written to the "School Type" column.
    pub fn tag(self) -> &'static str {
        match self {
            Layout::K12 => "K-12",
            Layout::HighSchool => "High School",
        }
    }

    pub fn patterns(self) -> &'static LayoutPatterns {
        match self {
            Layout::K12 => &K12_PATTERNS,
            Layout::HighSchool => &HIGH_SCHOOL_PATTERNS,
        }
    }
}

/// Record fields filled by a labelled metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Ratio,
    Math,
    Reading,
    Science,
    Graduation,
}

/// Everything layout-specific about pulling fields out of page text.
pub struct LayoutPatterns {
    /// Group 1 is the overview window.
    pub overview: Regex,
    /// Window is cut at the first match (an embedded rankings block).
    pub overview_cut: Option<Regex>,
    /// Drop the first overview line when it repeats the school name.
    pub drop_repeated_name: bool,
    /// Group 1 is the value. Metrics absent here stay empty.
    pub metrics: Vec<(Metric, Regex)>,
}

fn metric(label: &str, value: &str) -> Regex {
    Regex::new(&format!(r"{}\s*\n\s*({})", regex::escape(label), value)).unwrap()
}

static HIGH_SCHOOL_PATTERNS: LazyLock<LayoutPatterns> = LazyLock::new(|| LayoutPatterns {
    overview: Regex::new(r"(?s)Overview of .*?\n(.*?)\nAll Rankings").unwrap(),
    overview_cut: Some(Regex::new(r"\n.*?Rankings").unwrap()),
    drop_repeated_name: false,
    metrics: vec![
        (Metric::Math, metric("Mathematics Proficiency", PERCENT)),
        (Metric::Reading, metric("Reading Proficiency", PERCENT)),
        (Metric::Science, metric("Science Proficiency", PERCENT)),
        (Metric::Graduation, metric("Graduation Rate", PERCENT)),
    ],
});

static K12_PATTERNS: LazyLock<LayoutPatterns> = LazyLock::new(|| LayoutPatterns {
    overview: Regex::new(r"(?s)Overview of .*?\n(.*?)\nAt a Glance").unwrap(),
    overview_cut: None,
    drop_repeated_name: true,
    metrics: vec![
        (Metric::Ratio, metric("Student/Teacher Ratio", RATIO)),
        (Metric::Math, metric("Math Proficiency", PERCENT)),
        (Metric::Reading, metric("Reading Proficiency", PERCENT)),
    ],
});
