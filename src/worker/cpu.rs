//! CPU worker: the batched point-increment search loop.
//!
//! Instead of deriving a fresh keypair per candidate, the worker walks
//! the curve by a fixed increment Q = 8*B and inspects the Montgomery
//! u-coordinate of every point it passes. Each batch of 2k+1 candidates
//! costs a handful of field multiplications per candidate and a single
//! shared inversion.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::Sender;
use num_bigint::BigUint;

use crate::curve::{batch_to_affine, constants, vector_divide, AffinePoint, EdwardsPoint, FieldElement};
use crate::matcher::Base64Prefix;

use super::VanityResult;

/// Shared statistics, updated in bulk once per batch.
#[derive(Debug, Default)]
pub struct WorkerStats {
    /// Prefix tests performed across all workers.
    pub attempts: AtomicU64,
    /// Matches found across all workers.
    pub matches_found: AtomicU64,
}

impl WorkerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    pub fn total_matches(&self) -> u64 {
        self.matches_found.load(Ordering::Relaxed)
    }
}

/// Walks the sequence P0 + n*Q and tests the u-coordinate of each point.
///
/// One `step` examines a window of batch_size + 1 consecutive offsets
/// centered on the current point: the center itself plus batch_size/2
/// neighbors on either side, paired so that P ± i*Q share their
/// multiplications. All division is deferred into a single
/// `vector_divide` per window, which also yields the 1/Z needed to
/// renormalize the next center for free.
///
/// Every buffer is allocated once here and reused; a step performs no
/// heap traffic.
pub struct BatchEnumerator {
    half: usize,
    /// offsets[i] = (i+1) * Q in affine form.
    offsets: Vec<AffinePoint>,
    /// (batch_size + 1) * Q: the distance between window centers.
    batch_offset: EdwardsPoint,
    /// Current window center, extended coordinates.
    p: EdwardsPoint,
    /// Affine mirror of `p`.
    pa: AffinePoint,
    /// Absolute offset of the center from the starting point.
    center: u128,
    // Numerators, denominators and vector_divide scratch; length
    // batch_size + 2 (window plus the piggybacked Z inversion).
    ua: Vec<FieldElement>,
    ub: Vec<FieldElement>,
    r: Vec<FieldElement>,
    s: Vec<FieldElement>,
}

impl BatchEnumerator {
    /// Set up the walk at P0 + skip*Q. `batch_size` must be even; the
    /// usable range is checked by config validation, not here.
    pub fn new(start: &EdwardsPoint, skip: u64, batch_size: usize) -> Self {
        debug_assert!(batch_size >= 2 && batch_size % 2 == 0);
        let half = batch_size / 2;
        let q = constants::ED25519_BASEPOINT.mul_by_cofactor();

        // Cumulative multiples (i+1) * Q, normalized with one inversion.
        let mut multiples = Vec::with_capacity(half);
        let mut acc = q;
        for _ in 0..half {
            multiples.push(acc);
            acc = acc.add(&q);
        }
        let offsets = batch_to_affine(&multiples);

        let batch_offset = q.scalar_mul(&((batch_size + 1) as u64).to_le_bytes());

        // Start the center half a window in, so the first window covers
        // [skip, skip + batch_size] without negative offsets.
        let p = start
            .add(&q.scalar_mul(&skip.to_le_bytes()))
            .add(&multiples[half - 1]);
        let pa = p.to_affine();

        let len = batch_size + 2;
        Self {
            half,
            offsets,
            batch_offset,
            p,
            pa,
            center: skip as u128 + half as u128,
            ua: vec![FieldElement::ZERO; len],
            ub: vec![FieldElement::ZERO; len],
            r: vec![FieldElement::ZERO; len],
            s: vec![FieldElement::ZERO; len],
        }
    }

    /// Number of candidates examined per `step`.
    pub fn candidates_per_step(&self) -> u64 {
        2 * self.half as u64 + 1
    }

    /// Examine one window. Returns the lowest matching offset and its
    /// u-coordinate bytes, if any; the walk advances either way.
    ///
    /// Keeping the lowest hit per window makes the result independent of
    /// the batch size for a fixed skip.
    pub fn step<F>(&mut self, test: F) -> Option<(u128, [u8; 32])>
    where
        F: Fn(&[u8; 32]) -> bool,
    {
        let half = self.half;
        let k = 2 * half;

        // Neighbor pairs via the dual addition formula: for affine p1, p2
        // the sum has y3 = (x1 y1 - x2 y2) / (x1 y2 - y1 x2), and the
        // difference flips the sign of the x2 terms. The Montgomery
        // u = (1+y)/(1-y) turns each y3 = num/den into (den+num)/(den-num),
        // so only the fraction's parts are stored and division waits for
        // the batch.
        //
        // Window layout: slot i < half is p - offsets[i], slot half the
        // center, slot half+1+i is p + offsets[i].
        for i in 0..half {
            let off = &self.offsets[i];
            let xy = &self.pa.x * &off.y;
            let yx = &self.pa.y * &off.x;

            let num_add = &self.pa.t - &off.t;
            let den_add = &xy - &yx;
            let num_sub = &self.pa.t + &off.t;
            let den_sub = &xy + &yx;

            self.ua[i] = &den_sub + &num_sub;
            self.ub[i] = &den_sub - &num_sub;
            self.ua[half + 1 + i] = &den_add + &num_add;
            self.ub[half + 1 + i] = &den_add - &num_add;
        }
        self.ua[half] = &FieldElement::ONE + &self.pa.y;
        self.ub[half] = &FieldElement::ONE - &self.pa.y;

        // Advance the extended center now and ride its Z inversion on the
        // same batched division.
        self.p = self.p.add(&self.batch_offset);
        self.ua[k + 1] = FieldElement::ONE;
        self.ub[k + 1] = self.p.z;

        vector_divide(&mut self.ua, &self.ub, &mut self.r, &mut self.s);

        let mut hit: Option<(u128, [u8; 32])> = None;
        for i in 0..=k {
            let bytes = self.ua[i].to_bytes();
            if test(&bytes) {
                let offset = if i < half {
                    self.center - (i as u128 + 1)
                } else {
                    self.center + (i - half) as u128
                };
                if hit.map_or(true, |(best, _)| offset < best) {
                    hit = Some((offset, bytes));
                }
            }
        }

        let zinv = self.ua[k + 1];
        self.pa = self.p.to_affine_with_zinv(&zinv);
        self.center += (k + 1) as u128;

        hit
    }
}

/// A CPU worker owning one slice of the search.
pub struct CpuWorker {
    id: usize,
    start: EdwardsPoint,
    skip: u64,
    batch_size: usize,
    limit: Option<u64>,
    prefix: Base64Prefix,
    result_tx: Sender<VanityResult>,
    stop_flag: Arc<AtomicBool>,
    stats: Arc<WorkerStats>,
    stop_on_match: bool,
}

impl CpuWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: usize,
        start: EdwardsPoint,
        skip: u64,
        batch_size: usize,
        limit: Option<u64>,
        prefix: Base64Prefix,
        result_tx: Sender<VanityResult>,
        stop_flag: Arc<AtomicBool>,
        stats: Arc<WorkerStats>,
        stop_on_match: bool,
    ) -> Self {
        Self {
            id,
            start,
            skip,
            batch_size,
            limit,
            prefix,
            result_tx,
            stop_flag,
            stats,
            stop_on_match,
        }
    }

    /// Runs the worker loop until a match is reported (in single-match
    /// mode), the stop flag fires, or the candidate limit is spent.
    /// Cancellation is only observed between batches.
    pub fn run(&self) {
        let mut enumerator = BatchEnumerator::new(&self.start, self.skip, self.batch_size);
        let per_batch = enumerator.candidates_per_step();
        let mut remaining = self.limit;

        loop {
            if self.stop_flag.load(Ordering::Relaxed) {
                return;
            }
            if remaining == Some(0) {
                return;
            }

            let hit = enumerator.step(|bytes| self.prefix.matches(bytes));

            self.stats.attempts.fetch_add(per_batch, Ordering::Relaxed);
            if let Some(r) = remaining.as_mut() {
                *r = r.saturating_sub(per_batch);
            }

            if let Some((offset, public_key)) = hit {
                self.stats.matches_found.fetch_add(1, Ordering::Relaxed);
                let result = VanityResult {
                    public_key,
                    offset: BigUint::from(offset),
                    worker_id: self.id,
                };
                // Channel closure means the pool is gone; just wind down.
                let _ = self.result_tx.send(result);

                if self.stop_on_match {
                    self.stop_flag.store(true, Ordering::Relaxed);
                    return;
                }
            }
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;

    fn expected_u(start: &EdwardsPoint, n: u64) -> [u8; 32] {
        let q = constants::ED25519_BASEPOINT.mul_by_cofactor();
        start.add(&q.scalar_mul(&n.to_le_bytes())).montgomery_bytes()
    }

    #[test]
    fn enumerator_visits_every_offset_in_order() {
        let start = *Keypair::generate().public_point();

        for batch_size in [2usize, 32] {
            // Every offset in the first few windows must be found at its
            // exact position, matching an independent scalar evaluation.
            for n in 0..=(2 * batch_size as u64 + 4) {
                let target = expected_u(&start, n);
                let mut enumerator = BatchEnumerator::new(&start, 0, batch_size);

                let mut found = None;
                for _ in 0..8 {
                    if let Some(hit) = enumerator.step(|bytes| bytes == &target) {
                        found = Some(hit);
                        break;
                    }
                }

                let (offset, bytes) = found.unwrap_or_else(|| {
                    panic!("offset {} not found with batch size {}", n, batch_size)
                });
                assert_eq!(offset, n as u128, "batch size {}", batch_size);
                assert_eq!(bytes, target);
            }
        }
    }

    #[test]
    fn enumerator_honors_skip() {
        let start = *Keypair::generate().public_point();
        let skip = 1_000_000u64;
        let n = skip + 17;
        let target = expected_u(&start, n);

        let mut enumerator = BatchEnumerator::new(&start, skip, 32);
        let mut found = None;
        for _ in 0..4 {
            if let Some(hit) = enumerator.step(|bytes| bytes == &target) {
                found = Some(hit);
                break;
            }
        }
        assert_eq!(found.unwrap().0, n as u128);
    }

    #[test]
    fn enumerator_center_candidate_is_exact() {
        // The window center takes a different code path than the paired
        // neighbors; pin it specifically.
        let start = *Keypair::generate().public_point();
        let batch_size = 8usize;
        let n = (batch_size / 2) as u64;
        let target = expected_u(&start, n);

        let mut enumerator = BatchEnumerator::new(&start, 0, batch_size);
        let hit = enumerator.step(|bytes| bytes == &target).unwrap();
        assert_eq!(hit.0, n as u128);
    }
}
