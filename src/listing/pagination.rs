//! Page selection for listings.

/// One page of a creation-time-descending listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// 1-based page number
    pub number: u32,
    pub size: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            number: 1,
            size: Self::DEFAULT_SIZE,
        }
    }
}

impl Page {
    pub const DEFAULT_SIZE: u32 = 10;

    /// Clamps `number` and `size` to at least 1.
    pub fn new(number: u32, size: u32) -> Self {
        Self {
            number: number.max(1),
            size: size.max(1),
        }
    }

    /// Reads `page` and `limit`. Missing, malformed or non-positive values
    /// fall back to the defaults; `limit` is capped at `max_size`.
    pub fn from_params(params: &[(String, String)], max_size: u32) -> Self {
        let positive = |name: &str| {
            params
                .iter()
                .find(|(k, _)| k == name)
                .and_then(|(_, v)| v.parse::<u32>().ok())
                .filter(|n| *n > 0)
        };

        let number = positive("page").unwrap_or(1);
        let size = positive("limit")
            .unwrap_or(Self::DEFAULT_SIZE)
            .min(max_size.max(1));
        Self::new(number, size)
    }

    pub fn skip(&self) -> usize {
        (self.number as usize - 1) * self.size as usize
    }

    pub fn limit(&self) -> usize {
        self.size as usize
    }
}
