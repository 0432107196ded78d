use chrono::{DateTime, Days, Months, Utc};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchType {
    Title,
    Content,
    User,
    Tags,
}

impl SearchType {
    pub fn parse(s: &str) -> Option<SearchType> {
        match s {
            "title" => Some(Self::Title),
            "content" => Some(Self::Content),
            "user" => Some(Self::User),
            "tags" => Some(Self::Tags),
            _ => None,
        }
    }
}

/// Lower-bound bucket for thread creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateRange {
    #[default]
    All,
    Today,
    Week,
    Month,
    Semester,
}

impl DateRange {
    /// Unrecognized buckets impose no bound.
    #[must_use]
    pub fn parse(s: &str) -> DateRange {
        match s {
            "today" => Self::Today,
            "week" => Self::Week,
            "month" => Self::Month,
            "semester" => Self::Semester,
            _ => Self::All,
        }
    }

    #[must_use]
    pub fn since(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::All => None,
            Self::Today => now.checked_sub_days(Days::new(1)),
            Self::Week => now.checked_sub_days(Days::new(7)),
            Self::Month => now.checked_sub_months(Months::new(1)),
            Self::Semester => now.checked_sub_months(Months::new(4)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    Recent,
    Replies,
    Relevant,
    Views,
}

impl SortMode {
    /// Unset or unrecognized modes sort by recency.
    #[must_use]
    pub fn parse(s: &str) -> SortMode {
        match s {
            "replies" => Self::Replies,
            "relevant" => Self::Relevant,
            "views" => Self::Views,
            _ => Self::Recent,
        }
    }
}

/// A validated search request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub search_type: SearchType,
    pub query: String,
    pub section: Option<String>,
    pub date_range: DateRange,
    pub has_replies: bool,
    pub tags: Vec<String>,
    pub sort: SortMode,
    pub team_filter: Option<String>,
}

impl SearchQuery {
    pub fn new(search_type: SearchType, query: impl Into<String>) -> Self {
        Self {
            search_type,
            query: query.into(),
            section: None,
            date_range: DateRange::All,
            has_replies: false,
            tags: Vec::new(),
            sort: SortMode::Recent,
            team_filter: None,
        }
    }

    /// Builds a query from raw `key=value` pairs as they appear in a URL.
    /// `tags[]` and `tags` may repeat; every other key keeps its last value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<SearchQuery>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut search_type = None;
        let mut query = None;
        let mut section = None;
        let mut date_range = None;
        let mut has_replies = None;
        let mut tags = Vec::new();
        let mut sort = None;
        let mut team_filter = None;

        for (key, value) in pairs {
            let value = value.into();
            match key.as_ref() {
                "type" => search_type = Some(value),
                "query" => query = Some(value),
                "section" => section = Some(value),
                "dateRange" => date_range = Some(value),
                "hasReplies" => has_replies = Some(value),
                "tags[]" | "tags" => {
                    if !value.trim().is_empty() {
                        tags.push(value);
                    }
                }
                "sortBy" => sort = Some(value),
                "teamFilter" => team_filter = Some(value),
                _ => {}
            }
        }

        let search_type = search_type
            .ok_or_else(|| Error::Validation("type is required".into()))?;
        let search_type = SearchType::parse(&search_type).ok_or_else(|| {
            Error::Validation(format!(
                "type must be one of title, content, user, tags (got '{search_type}')"
            ))
        })?;

        let query = query.ok_or_else(|| Error::Validation("query is required".into()))?;
        if query.trim().is_empty() {
            return Err(Error::Validation("query cannot be empty".into()));
        }

        let has_replies = match has_replies.as_deref() {
            None | Some("") => false,
            Some(raw) => parse_bool(raw).ok_or_else(|| {
                Error::Validation(format!("hasReplies must be true or false (got '{raw}')"))
            })?,
        };

        Ok(SearchQuery {
            search_type,
            query,
            section: section.filter(|s| is_section_filter(s)),
            date_range: date_range.as_deref().map(DateRange::parse).unwrap_or_default(),
            has_replies,
            tags,
            sort: sort.as_deref().map(SortMode::parse).unwrap_or_default(),
            team_filter: team_filter.filter(|s| is_section_filter(s)),
        })
    }

    /// The section equality filter in effect; the team filter overrides the section.
    #[must_use]
    pub fn effective_section(&self) -> Option<&str> {
        self.team_filter
            .as_deref()
            .or(self.section.as_deref())
            .filter(|s| is_section_filter(s))
    }
}

fn is_section_filter(s: &str) -> bool {
    !s.is_empty() && s != "all"
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}
