/// Seedable mulberry32 generator. Every random decision in the engine draws
/// from one of these so a run is reproducible from its seed.
#[derive(Clone, Debug)]
pub struct Rng {
    seed: u32,
}

impl Rng {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    pub fn next_f32(&mut self) -> f32 {
        self.seed = self.seed.wrapping_add(0x6d2b79f5);
        let mut t = self.seed;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        let out = t ^ (t >> 14);
        (out as f64 / 4_294_967_296.0) as f32
    }

    /// Inclusive on both ends.
    pub fn int(&mut self, min: i32, max: i32) -> i32 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as f32;
        (min + (self.next_f32() * span).floor() as i32).min(max)
    }

    pub fn uniform_u64(&mut self, min: u64, max: u64) -> u64 {
        if max <= min {
            return min;
        }
        let span = (max - min) as f64;
        min + (self.next_f32() as f64 * span).round() as u64
    }

    pub fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        (self.next_f32() * len as f32).floor().min((len - 1) as f32) as usize
    }

    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let idx = self.pick_index(items.len());
        items.get(idx)
    }

    /// Picks `count` distinct indices below `len` (partial Fisher-Yates).
    pub fn sample_indices(&mut self, len: usize, count: usize) -> Vec<usize> {
        let mut pool: Vec<usize> = (0..len).collect();
        let take = count.min(len);
        for i in 0..take {
            let j = i + self.pick_index(len - i);
            pool.swap(i, j);
        }
        pool.truncate(take);
        pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn same_seed_repeats_sequence() {
        let mut a = Rng::new(77);
        let mut b = Rng::new(77);
        for _ in 0..64 {
            assert_eq!(a.next_f32().to_bits(), b.next_f32().to_bits());
        }
    }

    #[test]
    fn int_stays_inside_inclusive_bounds() {
        for seed in 1..=500u32 {
            let mut rng = Rng::new(seed);
            let value = rng.int(3, 7);
            assert!((3..=7).contains(&value));
        }
    }

    #[test]
    fn uniform_u64_stays_inside_bounds() {
        for seed in 1..=500u32 {
            let mut rng = Rng::new(seed);
            let value = rng.uniform_u64(30_000, 45_000);
            assert!((30_000..=45_000).contains(&value));
        }
        let mut rng = Rng::new(1);
        assert_eq!(rng.uniform_u64(10, 10), 10);
    }

    #[test]
    fn choose_on_empty_slice_is_none() {
        let mut rng = Rng::new(5);
        let empty: [i32; 0] = [];
        assert!(rng.choose(&empty).is_none());
        assert_eq!(rng.choose(&[9]), Some(&9));
    }

    #[test]
    fn sample_indices_are_distinct_and_capped() {
        for seed in 1..=200u32 {
            let mut rng = Rng::new(seed);
            let picked = rng.sample_indices(12, 5);
            assert_eq!(picked.len(), 5);
            let unique: HashSet<usize> = picked.iter().copied().collect();
            assert_eq!(unique.len(), 5);
            assert!(picked.iter().all(|idx| *idx < 12));
        }
        let mut rng = Rng::new(3);
        assert_eq!(rng.sample_indices(2, 7).len(), 2);
    }
}
