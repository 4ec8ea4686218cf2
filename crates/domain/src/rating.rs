use serde::{Deserialize, Serialize};

/// Running vote accumulator behind a song's published rating.
///
/// Only the derived [`Rating::average`] is ever shown to clients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Rating {
    rating_sum: f64,
    voters: u32,
}

impl Rating {
    /// Lowest accepted vote.
    pub const MIN: f64 = 0.0;
    /// Highest accepted vote.
    pub const MAX: f64 = 10.0;

    /// Restores an accumulator from stored totals.
    #[must_use]
    pub fn from_totals(rating_sum: f64, voters: u32) -> Self {
        Self { rating_sum, voters }
    }

    /// Records one vote.
    pub fn add_vote(&mut self, vote: f64) {
        self.rating_sum += vote;
        self.voters = self.voters.saturating_add(1);
    }

    /// Returns the sum of all votes.
    #[must_use]
    pub fn rating_sum(&self) -> f64 {
        self.rating_sum
    }

    /// Returns the number of votes.
    #[must_use]
    pub fn voters(&self) -> u32 {
        self.voters
    }

    /// Average vote rounded to two decimals, absent until someone votes.
    #[must_use]
    pub fn average(&self) -> Option<f64> {
        if self.voters == 0 {
            return None;
        }

        let average = self.rating_sum / f64::from(self.voters);
        Some((average * 100.0).round() / 100.0)
    }
}
