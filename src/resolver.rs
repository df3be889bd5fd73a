use tracing::{debug, info};

use crate::error::QueryError;
use crate::fetch::SearchFetcher;
use crate::html;

pub const CANONICAL_PREFIX: &str = "https://www.usnews.com/education/";
const K12_PATH: &str = "usnews.com/education/k12/";
const HIGH_SCHOOL_PATH: &str = "usnews.com/education/best-high-schools/";
const REDIRECT_PARAM: &str = "uddg=";

/// Run the search and return the first profile URL on the results page.
pub async fn resolve<S>(query: &str, search: &S) -> Result<String, QueryError>
where
    S: SearchFetcher + ?Sized,
{
    let page = search.search(query).await?;
    let hrefs = html::anchor_hrefs(&page);
    debug!("{} anchors on results page", hrefs.len());

    match first_profile_link(&hrefs) {
        Some(url) => {
            info!("Resolved: {}", url);
            Ok(url)
        }
        None => Err(QueryError::LinkNotFound),
    }
}

/// Linear scan in document order; the first qualifying href wins.
pub fn first_profile_link<S: AsRef<str>>(hrefs: &[S]) -> Option<String> {
    hrefs.iter().find_map(|href| classify(href.as_ref()))
}

/// Accept an href as a direct link, else as a redirect carrying the target
/// in its `uddg=` parameter.
fn classify(href: &str) -> Option<String> {
    if is_profile_path(href) {
        let clean = strip_tracking(href);
        if clean.starts_with(CANONICAL_PREFIX) {
            return Some(clean.to_string());
        }
    }

    let (_, encoded) = href.split_once(REDIRECT_PARAM)?;
    let decoded = match urlencoding::decode(encoded) {
        Ok(d) => d,
        Err(e) => {
            debug!("Skipping undecodable redirect {}: {}", href, e);
            return None;
        }
    };

    if !is_profile_path(&decoded) {
        return None;
    }
    let clean = decoded.split(['&', '?']).next().unwrap_or("");
    clean
        .starts_with(CANONICAL_PREFIX)
        .then(|| clean.to_string())
}

fn is_profile_path(url: &str) -> bool {
    url.contains(K12_PATH) || url.contains(HIGH_SCHOOL_PATH)
}

fn strip_tracking(href: &str) -> &str {
    let href = href.split("&uddg=").next().unwrap_or(href);
    href.split("?uddg=").next().unwrap_or(href)
}

// ── Tests ──
