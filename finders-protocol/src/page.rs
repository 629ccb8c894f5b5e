use serde::{Deserialize, Serialize};

/// One-based page window over an ordered collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Page {
    number: u32,
    per_page: u32,
}

impl Page {
    /// Builds a page, raising zero values to one.
    pub fn new(number: u32, per_page: u32) -> Self {
        Self {
            number: number.max(1),
            per_page: per_page.max(1),
        }
    }

    /// Fills missing or zero values with defaults and clamps `per_page` to `max_per_page`.
    pub fn resolve(
        number: Option<u32>,
        per_page: Option<u32>,
        default_per_page: u32,
        max_per_page: u32,
    ) -> Self {
        let per_page = per_page
            .filter(|size| *size > 0)
            .unwrap_or(default_per_page)
            .min(max_per_page.max(1));
        Self::new(number.unwrap_or(1), per_page)
    }

    /// Like [`Page::resolve`] for raw request strings; non-numeric values count as missing.
    pub fn parse(
        number: Option<&str>,
        per_page: Option<&str>,
        default_per_page: u32,
        max_per_page: u32,
    ) -> Self {
        let numeric = |raw: Option<&str>| raw.and_then(|value| value.trim().parse::<u32>().ok());
        Self::resolve(
            numeric(number),
            numeric(per_page),
            default_per_page,
            max_per_page,
        )
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn per_page(&self) -> u32 {
        self.per_page
    }

    /// Rows skipped before this page starts.
    pub fn offset(&self) -> u64 {
        u64::from(self.number.saturating_sub(1)) * u64::from(self.per_page)
    }
}
