//! End-of-epoch population update.
//!
//! Every blob's fate follows from the reward it earned:
//!
//! | Reward | Fate |
//! |--------|------|
//! | `None` | dies |
//! | `Half` | survives with its id |
//! | `Full` | replaced by [`DESCENDANTS_PER_FULL_BLOB`] descendants |
//!
//! The next population therefore has `survivors + 2 × reproducers` members.

use forage_types::RewardLevel;
use serde::Serialize;
use tracing::{debug, info};

use crate::blob::Blob;

/// How many descendants replace a blob that ate a full ration.
pub const DESCENDANTS_PER_FULL_BLOB: usize = 2;

/// What happens to a blob at the end of an epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fate {
    /// Dropped from the population.
    Dies,
    /// Carried into the next epoch unchanged.
    Survives,
    /// Replaced by fresh descendants.
    Reproduces,
}

/// Map a reward to a fate.
pub const fn fate(reward: RewardLevel) -> Fate {
    match reward {
        RewardLevel::None => Fate::Dies,
        RewardLevel::Half => Fate::Survives,
        RewardLevel::Full => Fate::Reproduces,
    }
}

/// Counts from one population update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    /// Blobs that went unfed.
    pub deaths: usize,
    /// Blobs that carried over.
    pub survivors: usize,
    /// Blobs that were replaced by descendants.
    pub parents: usize,
    /// Descendants created.
    pub births: usize,
}

impl GenerationReport {
    /// Size of the population this update produced.
    pub const fn population(&self) -> usize {
        self.survivors.saturating_add(self.births)
    }
}

/// Apply the death, survival and reproduction rules to a finished epoch's
/// population.
pub fn next_generation<I>(blobs: I) -> (Vec<Blob>, GenerationReport)
where
    I: IntoIterator<Item = Blob>,
{
    let mut report = GenerationReport::default();
    let mut next = Vec::new();

    for blob in blobs {
        match fate(blob.reward()) {
            Fate::Dies => {
                debug!(blob = %blob.id(), "Blob died");
                report.deaths = report.deaths.saturating_add(1);
            }
            Fate::Survives => {
                report.survivors = report.survivors.saturating_add(1);
                next.push(blob);
            }
            Fate::Reproduces => {
                report.parents = report.parents.saturating_add(1);
                for _ in 0..DESCENDANTS_PER_FULL_BLOB {
                    let child = blob.descend();
                    debug!(parent = %blob.id(), child = %child.id(), "Blob born");
                    next.push(child);
                }
                report.births = report.births.saturating_add(DESCENDANTS_PER_FULL_BLOB);
            }
        }
    }

    info!(
        deaths = report.deaths,
        survivors = report.survivors,
        parents = report.parents,
        births = report.births,
        population = next.len(),
        "Population updated"
    );

    (next, report)
}
