//! Inputs to a recommendation request.

use thiserror::Error;

/// Result count requested when the caller does not choose one.
pub const DEFAULT_MAX_RESULTS: u32 = 20;

/// Ordered, de-duplicated set of region names.
///
/// Blank names are dropped and surrounding whitespace is trimmed. An empty
/// filter is valid; fetches against it are skipped rather than rejected.
///
/// # Examples
///
/// ```
/// use rendezvous_core::RegionFilter;
///
/// let regions = RegionFilter::new(["north", " south ", "north", ""]);
/// assert_eq!(regions.as_slice(), ["north", "south"]);
/// assert!(RegionFilter::default().is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionFilter {
    regions: Vec<String>,
}

impl RegionFilter {
    /// Build a filter from region names.
    #[must_use]
    pub fn new<I, S>(regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique: Vec<String> = Vec::new();
        for region in regions {
            let trimmed = region.as_ref().trim();
            if trimmed.is_empty() || unique.iter().any(|seen| seen == trimmed) {
                continue;
            }
            unique.push(trimmed.to_owned());
        }
        Self { regions: unique }
    }

    /// Parse a comma-separated list such as `"north,south"`.
    #[must_use]
    pub fn parse_list(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// Report whether no region is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Number of selected regions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Borrow the region names in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.regions
    }

    /// Iterate over region names.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.regions.iter().map(String::as_str)
    }
}

/// Errors returned by [`RecommendationQuery::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The user identifier was blank.
    #[error("user id must not be empty")]
    EmptyUserId,
    /// Zero results were requested.
    #[error("maximum result count must be positive")]
    ZeroMaxResults,
}

/// A validated request for recommended events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationQuery {
    user_id: String,
    max_results: u32,
    regions: RegionFilter,
}

impl RecommendationQuery {
    /// Validate and construct a query.
    ///
    /// # Errors
    /// Returns [`QueryError::EmptyUserId`] for a blank user id and
    /// [`QueryError::ZeroMaxResults`] when `max_results` is zero.
    pub fn new(
        user_id: impl Into<String>,
        max_results: u32,
        regions: RegionFilter,
    ) -> Result<Self, QueryError> {
        let user_id = user_id.into().trim().to_owned();
        if user_id.is_empty() {
            return Err(QueryError::EmptyUserId);
        }
        if max_results == 0 {
            return Err(QueryError::ZeroMaxResults);
        }
        Ok(Self {
            user_id,
            max_results,
            regions,
        })
    }

    /// The viewing user.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Upper bound on candidates per strategy.
    #[must_use]
    pub const fn max_results(&self) -> u32 {
        self.max_results
    }

    /// Regions to filter by.
    #[must_use]
    pub const fn regions(&self) -> &RegionFilter {
        &self.regions
    }
}
