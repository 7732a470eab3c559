//! Random row sampling behind an async shuffle boundary.

use std::collections::HashSet;
use std::future::Future;

use nd_index::{Axis, Index, IndexError, IndexLabel, Selector};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::{DataFrame, FrameError, Series};

/// Chooses `n` labels out of the ones offered.
pub trait Shuffle {
    fn take(&mut self, labels: Vec<IndexLabel>, n: usize) -> impl Future<Output = Vec<IndexLabel>>;
}

/// `rand`-backed shuffle.
#[derive(Debug, Clone)]
pub struct RandomShuffle<R = StdRng> {
    rng: R,
}

impl RandomShuffle<StdRng> {
    /// Reproducible sampling.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    #[must_use]
    pub fn from_entropy() -> Self {
        Self::seeded(rand::random())
    }
}

impl<R: rand::Rng> RandomShuffle<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: rand::Rng> Shuffle for RandomShuffle<R> {
    fn take(&mut self, mut labels: Vec<IndexLabel>, n: usize) -> impl Future<Output = Vec<IndexLabel>> {
        labels.shuffle(&mut self.rng);
        labels.truncate(n);
        futures::future::ready(labels)
    }
}

/// Ask `shuffle` for `n` labels of `index` and map them back to positions.
async fn sampled_positions<S: Shuffle>(
    index: &Index,
    n: usize,
    shuffle: &mut S,
) -> Result<Vec<i64>, FrameError> {
    if n > index.len() {
        return Err(IndexError::OutOfRange {
            axis: Axis::Rows,
            position: i64::try_from(n).unwrap_or(i64::MAX),
            len: index.len(),
        }
        .into());
    }

    let picked = shuffle.take(index.labels().to_vec(), n).await;
    if picked.len() != n {
        return Err(FrameError::shape("sampled labels", n, picked.len()));
    }

    let mut seen = HashSet::with_capacity(n);
    let mut positions = Vec::with_capacity(n);
    for label in picked {
        let position = index
            .position(&label)
            .ok_or_else(|| IndexError::LabelNotFound {
                label: label.to_string(),
            })?;
        if !seen.insert(position) {
            return Err(IndexError::DuplicateLabel {
                axis: Axis::Rows,
                label: label.to_string(),
            }
            .into());
        }
        positions.push(position as i64);
    }
    log::debug!("sampled {n} of {} rows", index.len());
    Ok(positions)
}

impl DataFrame {
    /// `n` distinct rows in the order the shuffle returns them.
    pub async fn sample<S: Shuffle>(&self, n: usize, shuffle: &mut S) -> Result<Self, FrameError> {
        let positions = sampled_positions(self.index(), n, shuffle).await?;
        self.iloc(&Selector::positions(&positions), &Selector::All)
    }
}

impl Series {
    pub async fn sample<S: Shuffle>(&self, n: usize, shuffle: &mut S) -> Result<Self, FrameError> {
        let positions = sampled_positions(self.index(), n, shuffle).await?;
        self.iloc(&Selector::positions(&positions))
    }
}
