use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PaperMateError;

/// Published-status filter.
///
/// Earlier backends accepted a boolean, `"yes"`/`"no"` or `"0"`/`"1"`. The
/// canonical wire form is `"yes"` / `"no"`; every legacy spelling is still
/// accepted when parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PublishedFilter {
    #[default]
    Any,
    PublishedOnly,
}

impl PublishedFilter {
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Any => "no",
            Self::PublishedOnly => "yes",
        }
    }

    pub fn is_published_only(self) -> bool {
        matches!(self, Self::PublishedOnly)
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Any => Self::PublishedOnly,
            Self::PublishedOnly => Self::Any,
        }
    }
}

impl From<bool> for PublishedFilter {
    fn from(only_published: bool) -> Self {
        if only_published {
            Self::PublishedOnly
        } else {
            Self::Any
        }
    }
}

impl FromStr for PublishedFilter {
    type Err = PaperMateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "true" | "1" | "on" => Ok(Self::PublishedOnly),
            "no" | "false" | "0" | "off" | "" => Ok(Self::Any),
            other => Err(PaperMateError::InvalidFilter(format!(
                "published filter must be yes/no, got {other:?}"
            ))),
        }
    }
}

impl fmt::Display for PublishedFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query_value())
    }
}

impl Serialize for PublishedFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_query_value())
    }
}

impl<'de> Deserialize<'de> for PublishedFilter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PublishedVisitor;

        impl<'de> Visitor<'de> for PublishedVisitor {
            type Value = PublishedFilter;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("yes/no, a boolean, or 0/1")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(v.into())
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok((v != 0).into())
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok((v != 0).into())
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse::<PublishedFilter>().map_err(E::custom)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(PublishedFilter::Any)
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(PublishedFilter::Any)
            }
        }

        deserializer.deserialize_any(PublishedVisitor)
    }
}

/// The fetch key for one page of the paper list.
///
/// Two equal `FilterParams` describe the same request, so the value doubles
/// as a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterParams {
    pub page: u32,
    pub keyword: String,
    pub published: PublishedFilter,
    pub title_search: String,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            page: 1,
            keyword: String::new(),
            published: PublishedFilter::Any,
            title_search: String::new(),
        }
    }
}

impl FilterParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = keyword.into().trim().to_string();
        self
    }

    pub fn with_published(mut self, published: PublishedFilter) -> Self {
        self.published = published;
        self
    }

    pub fn with_title_search(mut self, title: impl Into<String>) -> Self {
        self.title_search = title.into().trim().to_string();
        self
    }

    /// Same filters, different page.
    pub fn at_page(&self, page: u32) -> Self {
        self.clone().with_page(page)
    }

    /// True when both keys select the same result set, ignoring the page.
    pub fn same_filters(&self, other: &Self) -> bool {
        self.keyword == other.keyword
            && self.published == other.published
            && self.title_search == other.title_search
    }

    /// Query pairs for `GET /papers/`. Empty text filters are omitted.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("page", self.page.max(1).to_string())];
        if !self.keyword.is_empty() {
            pairs.push(("keyword", self.keyword.clone()));
        }
        pairs.push(("published_filter", self.published.as_query_value().to_string()));
        if !self.title_search.is_empty() {
            pairs.push(("title_search", self.title_search.clone()));
        }
        pairs
    }

    /// Stable textual form of the key, used by response caches and logs.
    pub fn cache_key(&self) -> String {
        self.query_pairs()
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}
