const LOOKUP_MARKER: &str = "US news for";
const NAME_START: &str = "US news for ";
const NAME_END: &str = " located";
const TYPE_LABEL: &str = "High School:";

/// Pull the school name out of a lookup query such as
/// `"US news for High School: Lincoln High located in Portland, OR"`.
///
/// Returns `None` when the query lacks the lookup marker.
pub fn parse(query: &str) -> Option<String> {
    if !query.contains(LOOKUP_MARKER) {
        return None;
    }

    // Marker present without the trailing space: nothing follows it.
    let rest = query.split_once(NAME_START).map(|(_, r)| r).unwrap_or("");
    let name = rest.split(NAME_END).next().unwrap_or(rest);

    Some(name.replace(TYPE_LABEL, "").trim().to_string())
}

// ── Tests ──
