use std::cmp::Ordering;

/// Decides which units fall among the `k` lowest scores of a pool, visiting the pool in its
/// position order.
///
/// Units scoring below the `k`-th lowest score are always taken; units scoring exactly that
/// are taken first come first served until `k` units are taken, so ties go to the lowest
/// positions.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cutoff {
    threshold: f32,
    ties: usize,
}

impl Cutoff {
    /// Finds the cutoff of the `k` lowest values of `scores`.
    ///
    /// # Returns
    /// `None` if `k` is zero, meaning nothing is taken.
    pub fn lowest(scores: &[f32], k: usize) -> Option<Self> {
        if k == 0 || scores.is_empty() {
            return None;
        }

        let k = k.min(scores.len());
        let mut sorted = scores.to_vec();
        let (_, &mut threshold, _) = sorted.select_nth_unstable_by(k - 1, f32::total_cmp);

        let below = scores
            .iter()
            .filter(|s| s.total_cmp(&threshold) == Ordering::Less)
            .count();

        Some(Self {
            threshold,
            ties: k - below,
        })
    }

    /// Returns whether the next unit, scoring `score`, is taken.
    pub fn take(&mut self, score: f32) -> bool {
        match score.total_cmp(&self.threshold) {
            Ordering::Less => true,
            Ordering::Equal if self.ties > 0 => {
                self.ties -= 1;
                true
            }
            _ => false,
        }
    }
}

/// Returns a mask over `scores` marking the `k` lowest, ties broken by position.
pub(crate) fn lowest_mask(scores: &[f32], k: usize) -> Vec<bool> {
    match Cutoff::lowest(scores, k) {
        Some(mut cutoff) => scores.iter().map(|&s| cutoff.take(s)).collect(),
        None => vec![false; scores.len()],
    }
}

/// Zeroes the entries of `values` selected by `mask`.
pub(crate) fn apply(values: &mut [f32], mask: impl IntoIterator<Item = bool>) {
    for (w, prune) in values.iter_mut().zip(mask) {
        if prune {
            *w = 0.;
        }
    }
}
