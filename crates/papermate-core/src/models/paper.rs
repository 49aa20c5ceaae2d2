use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A single paper record as served by the papers API.
///
/// Every text column is nullable on the backend, so missing and `null` values
/// both land as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    pub entry_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(rename = "abstract", default, deserialize_with = "null_as_default")]
    pub abstract_text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub authors: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub keywords: String,
    /// Raw timestamp text; see [`Paper::published_at`].
    #[serde(default, deserialize_with = "null_as_default")]
    pub published: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub comment: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub primary_category: String,
}

/// Years the backend treats as "published" when scanning the comment column.
const PUBLISHED_YEARS: [&str; 3] = ["2023", "2024", "2025"];

impl Paper {
    /// Parse the `published` column.
    ///
    /// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` with or without an offset,
    /// and a bare date.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.published)
    }

    /// Bare arXiv identifier without scheme, host or version suffix.
    ///
    /// `http://arxiv.org/abs/2101.00001v2` → `2101.00001`. Returns the trimmed
    /// entry id unchanged when it is not an arXiv URL.
    pub fn arxiv_id(&self) -> &str {
        bare_arxiv_id(&self.entry_id)
    }

    /// True when `other` names the same paper, by entry id or arXiv id.
    pub fn same_paper(&self, other: &str) -> bool {
        let other = other.trim();
        self.entry_id == other || self.arxiv_id() == bare_arxiv_id(other)
    }

    pub fn keyword_list(&self) -> Vec<&str> {
        split_list(&self.keywords)
    }

    pub fn category_list(&self) -> Vec<&str> {
        split_list(&self.categories)
    }

    /// Heuristic the backend uses for its "published only" filter: the
    /// comment mentions a recent venue year.
    pub fn looks_published(&self) -> bool {
        PUBLISHED_YEARS.iter().any(|y| self.comment.contains(y))
    }
}

pub fn bare_arxiv_id(raw: &str) -> &str {
    let id = raw.trim().trim_end_matches('/');
    let tail = id
        .rsplit_once("/abs/")
        .or_else(|| id.rsplit_once("/pdf/"))
        .map_or(id, |(_, tail)| tail);
    strip_version(tail)
}

fn strip_version(id: &str) -> &str {
    match id.rfind('v') {
        Some(pos)
            if pos > 0
                && pos + 1 < id.len()
                && id[pos + 1..].bytes().all(|b| b.is_ascii_digit()) =>
        {
            &id[..pos]
        }
        _ => id,
    }
}

fn split_list(raw: &str) -> Vec<&str> {
    let sep: &[char] = if raw.contains(',') { &[','] } else { &[' '] };
    raw.split(sep)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
