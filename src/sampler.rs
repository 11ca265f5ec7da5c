use rand::prelude::SliceRandom;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::DataError;

/// Sampler construction parameters. `boundaries` must be strictly
/// ascending with at least two entries; bucket `k` covers lengths in
/// `(boundaries[k], boundaries[k+1]]`.
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    pub batch_size: usize,
    pub boundaries: Vec<usize>,
    pub world_size: usize,
    pub rank: usize,
    pub shuffle: bool,
}

impl SamplerConfig {
    fn validate(&self) -> Result<(), DataError> {
        if self.batch_size == 0 {
            return Err(DataError::invalid_input("batch_size must be positive"));
        }
        if self.boundaries.len() < 2 {
            return Err(DataError::invalid_input(
                "boundaries must hold at least two entries",
            ));
        }
        if self.boundaries.windows(2).any(|w| w[0] >= w[1]) {
            return Err(DataError::invalid_input(
                "boundaries must be strictly ascending",
            ));
        }
        if self.world_size == 0 {
            return Err(DataError::invalid_input("world_size must be positive"));
        }
        if self.rank >= self.world_size {
            return Err(DataError::invalid_input(format!(
                "rank {} out of range for world_size {}",
                self.rank, self.world_size
            )));
        }
        Ok(())
    }
}

/// Groups examples into length buckets and yields, per epoch, this rank's
/// share of fixed-size batches of catalog indices.
///
/// Every rank seeds the same generator from the epoch number, so all ranks
/// compute the same global per-bucket orderings and then take disjoint
/// interleaved slices of them. Determinism replaces communication: no state
/// is exchanged between ranks.
#[derive(Debug)]
pub struct DistributedBucketSampler {
    buckets: Vec<Vec<usize>>,
    boundaries: Vec<usize>,
    padded_sizes: Vec<usize>,
    total_size: usize,
    num_samples: usize,
    batch_size: usize,
    world_size: usize,
    rank: usize,
    shuffle: bool,
}

impl DistributedBucketSampler {
    /// Assigns each length to its bucket, drops out-of-range examples and
    /// empty buckets, and computes per-bucket padded sizes so every rank
    /// receives the same number of whole batches from every bucket.
    pub fn new(lengths: &[usize], config: SamplerConfig) -> Result<Self, DataError> {
        config.validate()?;

        let bucket_count = config.boundaries.len() - 1;
        let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); bucket_count];
        let mut discarded = 0usize;
        for (index, &length) in lengths.iter().enumerate() {
            match bucket_index(&config.boundaries, length) {
                Some(k) => buckets[k].push(index),
                None => discarded += 1,
            }
        }

        // One filtering pass over the immutable memberships: a surviving
        // bucket keeps its upper boundary, the lower endpoint always stays.
        let mut kept_buckets = Vec::with_capacity(bucket_count);
        let mut kept_boundaries = Vec::with_capacity(bucket_count + 1);
        kept_boundaries.push(config.boundaries[0]);
        for (k, bucket) in buckets.into_iter().enumerate() {
            if bucket.is_empty() {
                continue;
            }
            kept_boundaries.push(config.boundaries[k + 1]);
            kept_buckets.push(bucket);
        }
        if kept_buckets.is_empty() {
            return Err(DataError::EmptyDataset);
        }

        let total_batch_size = config.world_size * config.batch_size;
        let padded_sizes: Vec<usize> = kept_buckets
            .iter()
            .map(|bucket| {
                let n = bucket.len();
                n + ((total_batch_size - n % total_batch_size) % total_batch_size)
            })
            .collect();
        let total_size: usize = padded_sizes.iter().sum();
        let num_samples = total_size / config.world_size;

        tracing::debug!(
            buckets = kept_buckets.len(),
            discarded,
            total_size,
            num_samples,
            "sampler: bucketed dataset"
        );

        Ok(Self {
            buckets: kept_buckets,
            boundaries: kept_boundaries,
            padded_sizes,
            total_size,
            num_samples,
            batch_size: config.batch_size,
            world_size: config.world_size,
            rank: config.rank,
            shuffle: config.shuffle,
        })
    }

    /// Batches of catalog indices owned by this rank for `epoch`. Pure in
    /// `(epoch, rank)`: repeated calls return identical output, and the
    /// rank slices of a fixed epoch partition each bucket's padded list.
    pub fn epoch_batches(&self, epoch: u64) -> Vec<Vec<usize>> {
        let mut rng = StdRng::seed_from_u64(epoch);

        let mut batches: Vec<Vec<usize>> = Vec::with_capacity(self.batches_per_epoch());
        for (bucket, &padded) in self.buckets.iter().zip(&self.padded_sizes) {
            let n = bucket.len();
            let mut local: Vec<usize> = (0..n).collect();
            if self.shuffle {
                local.shuffle(&mut rng);
            }

            // Cyclic repetition up to the padded size keeps every example
            // at least once while making the list evenly divisible.
            let rem = padded - n;
            let mut extended = Vec::with_capacity(padded);
            extended.extend_from_slice(&local);
            for _ in 0..rem / n {
                extended.extend_from_slice(&local);
            }
            extended.extend_from_slice(&local[..rem % n]);

            let own: Vec<usize> = extended
                .iter()
                .skip(self.rank)
                .step_by(self.world_size)
                .copied()
                .collect();
            for chunk in own.chunks_exact(self.batch_size) {
                batches.push(chunk.iter().map(|&j| bucket[j]).collect());
            }
        }

        if self.shuffle {
            batches.shuffle(&mut rng);
        }

        assert_eq!(
            batches.len() * self.batch_size,
            self.num_samples,
            "sampler produced an inconsistent batch count"
        );
        batches
    }

    /// Examples yielded per rank per epoch, padding included.
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn batches_per_epoch(&self) -> usize {
        self.num_samples / self.batch_size
    }

    /// Padded example count summed over all ranks.
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Boundaries remaining after empty-bucket pruning.
    pub fn boundaries(&self) -> &[usize] {
        &self.boundaries
    }

    pub fn bucket_sizes(&self) -> Vec<usize> {
        self.buckets.iter().map(Vec::len).collect()
    }

    pub fn padded_sizes(&self) -> &[usize] {
        &self.padded_sizes
    }
}

/// Iterative binary search for the bucket `k` with
/// `boundaries[k] < length <= boundaries[k+1]`.
fn bucket_index(boundaries: &[usize], length: usize) -> Option<usize> {
    let last = boundaries.len() - 1;
    if length <= boundaries[0] || length > boundaries[last] {
        return None;
    }
    let mut lo = 0;
    let mut hi = last;
    // invariant: boundaries[lo] < length <= boundaries[hi]
    while hi > lo + 1 {
        let mid = (lo + hi) / 2;
        if length <= boundaries[mid] {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    Some(lo)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(batch_size: usize, boundaries: &[usize], world_size: usize, rank: usize) -> SamplerConfig {
        SamplerConfig {
            batch_size,
            boundaries: boundaries.to_vec(),
            world_size,
            rank,
            shuffle: true,
        }
    }

    #[test]
    fn bucket_index_respects_half_open_intervals() {
        let boundaries = [10, 20, 30];
        assert_eq!(bucket_index(&boundaries, 10), None); // <= lower bound
        assert_eq!(bucket_index(&boundaries, 11), Some(0));
        assert_eq!(bucket_index(&boundaries, 20), Some(0)); // right-inclusive
        assert_eq!(bucket_index(&boundaries, 21), Some(1));
        assert_eq!(bucket_index(&boundaries, 30), Some(1));
        assert_eq!(bucket_index(&boundaries, 31), None); // above upper bound
        assert_eq!(bucket_index(&boundaries, 5), None);
    }

    #[test]
    fn bucket_assignment_is_total_and_exclusive_for_kept_lengths() {
        let boundaries = [0, 8, 16, 32, 64];
        for length in 1..=64usize {
            let k = bucket_index(&boundaries, length).expect("in range");
            assert!(boundaries[k] < length && length <= boundaries[k + 1]);
        }
    }

    #[test]
    fn empty_buckets_are_pruned_with_their_upper_boundary() {
        // lengths only land in (20, 30]
        let lengths = [25, 27, 30];
        let sampler =
            DistributedBucketSampler::new(&lengths, config(1, &[0, 10, 20, 30], 1, 0))
                .expect("construct");
        assert_eq!(sampler.bucket_sizes(), vec![3]);
        assert_eq!(sampler.boundaries(), &[0, 30]);
    }

    #[test]
    fn padded_sizes_are_smallest_multiple_of_global_batch() {
        let lengths = [5, 5, 5, 15, 15, 15, 15, 15, 25];
        let sampler =
            DistributedBucketSampler::new(&lengths, config(2, &[0, 10, 20, 30], 3, 0))
                .expect("construct");
        let t = 3 * 2;
        for (&padded, &n) in sampler.padded_sizes().iter().zip(&sampler.bucket_sizes()) {
            assert_eq!(padded % t, 0);
            assert!(padded >= n);
            assert!(padded < n + t);
        }
        assert_eq!(sampler.padded_sizes(), &[6, 6, 6]);
        assert_eq!(sampler.total_size(), 18);
        assert_eq!(sampler.num_samples(), 6);
    }

    #[test]
    fn construction_fails_when_all_lengths_fall_outside_boundaries() {
        let lengths = [1, 2, 100];
        let err =
            DistributedBucketSampler::new(&lengths, config(2, &[10, 20], 1, 0)).unwrap_err();
        assert!(matches!(err, DataError::EmptyDataset));
    }

    #[test]
    fn construction_validates_config() {
        let lengths = [15];
        let bad_batch = SamplerConfig {
            batch_size: 0,
            ..config(1, &[10, 20], 1, 0)
        };
        assert!(DistributedBucketSampler::new(&lengths, bad_batch).is_err());

        let bad_rank = config(1, &[10, 20], 2, 2);
        assert!(DistributedBucketSampler::new(&lengths, bad_rank).is_err());

        let not_ascending = config(1, &[20, 10], 1, 0);
        assert!(DistributedBucketSampler::new(&lengths, not_ascending).is_err());

        let too_short = config(1, &[10], 1, 0);
        assert!(DistributedBucketSampler::new(&lengths, too_short).is_err());
    }

    #[test]
    fn epoch_batches_is_deterministic_per_epoch() {
        let lengths: Vec<usize> = (0..20).map(|i| 5 + i * 3).collect();
        let sampler =
            DistributedBucketSampler::new(&lengths, config(2, &[0, 20, 40, 80], 2, 1))
                .expect("construct");
        for epoch in 0..4 {
            assert_eq!(sampler.epoch_batches(epoch), sampler.epoch_batches(epoch));
        }
    }

    #[test]
    fn rank_union_is_an_exact_partition_when_no_padding_is_needed() {
        // 8 examples in one bucket, batch 2, world 2: padded size equals the
        // bucket size, so the rank slices must partition the full set.
        let lengths: Vec<usize> = (0..8).map(|i| 11 + i).collect();
        for epoch in 0..3 {
            let mut union: Vec<usize> = Vec::new();
            for rank in 0..2 {
                let sampler =
                    DistributedBucketSampler::new(&lengths, config(2, &[10, 30], 2, rank))
                        .expect("construct");
                union.extend(sampler.epoch_batches(epoch).into_iter().flatten());
            }
            union.sort_unstable();
            assert_eq!(union, (0..8).collect::<Vec<_>>());
        }
    }

    #[test]
    fn rank_slices_partition_the_padded_lists() {
        let lengths: Vec<usize> = vec![12, 14, 16, 18, 22, 24, 26, 35, 37, 39];
        let world_size = 2;
        let mut union: Vec<usize> = Vec::new();
        let mut expected_len = 0;
        for rank in 0..world_size {
            let sampler = DistributedBucketSampler::new(
                &lengths,
                config(2, &[10, 20, 30, 40], world_size, rank),
            )
            .expect("construct");
            expected_len = sampler.total_size();
            assert_eq!(
                sampler.epoch_batches(7).len() * 2,
                sampler.num_samples()
            );
            union.extend(sampler.epoch_batches(7).into_iter().flatten());
        }
        assert_eq!(union.len(), expected_len);
        // the union covers every kept example at least once
        for index in 0..lengths.len() {
            assert!(union.contains(&index), "index {index} missing from union");
        }
    }

    #[test]
    fn no_shuffle_yields_identity_order_and_literal_batches() {
        // boundaries (0,10], (10,20], (20,30]; lengths put index 0 alone in
        // the first bucket and pairs in the other two.
        let lengths = [5, 15, 15, 25, 25];
        let base = SamplerConfig {
            shuffle: false,
            ..config(2, &[0, 10, 20, 30], 2, 0)
        };

        let rank0 = DistributedBucketSampler::new(&lengths, base.clone()).expect("rank 0");
        // bucket {0} padded 1 -> 4 by cyclic repetition: [0,0,0,0]
        // bucket {1,2} padded 2 -> 4: [1,2,1,2]; bucket {3,4}: [3,4,3,4]
        assert_eq!(rank0.padded_sizes(), &[4, 4, 4]);
        assert_eq!(rank0.num_samples(), 6);
        assert_eq!(
            rank0.epoch_batches(0),
            vec![vec![0, 0], vec![1, 1], vec![3, 3]]
        );

        let rank1 = DistributedBucketSampler::new(
            &lengths,
            SamplerConfig { rank: 1, ..base },
        )
        .expect("rank 1");
        assert_eq!(
            rank1.epoch_batches(0),
            vec![vec![0, 0], vec![2, 2], vec![4, 4]]
        );
    }

    #[test]
    fn cyclic_repetition_keeps_every_example_at_least_once() {
        // 3 examples in one bucket, padded to 8 (world 4, batch 2)
        let lengths = [15, 16, 17];
        for rank in 0..4 {
            let sampler = DistributedBucketSampler::new(&lengths, config(2, &[10, 20], 4, rank))
                .expect("construct");
            assert_eq!(sampler.padded_sizes(), &[8]);
        }
        let mut union: Vec<usize> = Vec::new();
        for rank in 0..4 {
            let sampler = DistributedBucketSampler::new(&lengths, config(2, &[10, 20], 4, rank))
                .expect("construct");
            union.extend(sampler.epoch_batches(3).into_iter().flatten());
        }
        union.sort_unstable();
        for index in 0..3 {
            assert!(union.contains(&index));
        }
        assert_eq!(union.len(), 8);
    }

    #[test]
    fn batch_count_invariant_holds_across_epochs() {
        let lengths: Vec<usize> = (0..17).map(|i| 5 + i * 2).collect();
        let sampler = DistributedBucketSampler::new(&lengths, config(3, &[0, 12, 24, 48], 2, 0))
            .expect("construct");
        for epoch in 0..5 {
            let batches = sampler.epoch_batches(epoch);
            assert_eq!(batches.len() * 3, sampler.num_samples());
            for batch in &batches {
                assert_eq!(batch.len(), 3);
            }
        }
    }
}
