//! Random source plumbing.
//!
//! Sampling code is generic over [`rand::Rng`] and takes the generator by
//! `&mut`. The orchestrator owns one boxed source for the process; callers can
//! swap in a seeded [`StdRng`] to replay a run.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// The random source shared by generations.
pub type SharedRng = Box<dyn Rng + Send>;

/// A `StdRng` seeded from the thread RNG.
pub fn from_entropy() -> StdRng {
    rand::make_rng()
}

/// A `StdRng` that always produces the same stream for `seed`.
pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

#[cfg(test)]
pub(crate) mod scripted {
    use std::convert::Infallible;

    use rand::TryRng;

    /// Replays fixed unit draws, so `random::<f64>()` returns them exactly.
    pub(crate) struct ScriptedRng {
        draws: Vec<f64>,
        position: usize,
    }

    impl ScriptedRng {
        pub(crate) fn new(draws: Vec<f64>) -> Self {
            Self { draws, position: 0 }
        }

        fn next_word(&mut self) -> u64 {
            let draw = match self.draws.len() {
                0 => 0.0,
                len => self.draws[self.position % len],
            };
            self.position += 1;
            // f64 sampling keeps the top 53 bits of the word
            let bits = (draw.clamp(0.0, 1.0 - f64::EPSILON) * (1u64 << 53) as f64) as u64;
            bits << 11
        }
    }

    impl TryRng for ScriptedRng {
        type Error = Infallible;

        fn try_next_u32(&mut self) -> Result<u32, Infallible> {
            Ok((self.next_word() >> 32) as u32)
        }

        fn try_next_u64(&mut self) -> Result<u64, Infallible> {
            Ok(self.next_word())
        }

        fn try_fill_bytes(&mut self, dst: &mut [u8]) -> Result<(), Infallible> {
            for chunk in dst.chunks_mut(8) {
                let word = self.next_word().to_le_bytes();
                chunk.copy_from_slice(&word[..chunk.len()]);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::RngExt;

    use super::scripted::ScriptedRng;
    use super::*;

    #[test]
    fn scripted_draws_come_back_as_unit_floats() {
        let mut rng = ScriptedRng::new(vec![0.0, 0.25, 0.5]);
        assert_eq!(rng.random::<f64>(), 0.0);
        assert_eq!(rng.random::<f64>(), 0.25);
        assert_eq!(rng.random::<f64>(), 0.5);
        assert_eq!(rng.random::<f64>(), 0.0);
    }

    #[test]
    fn scripted_draws_stay_below_one() {
        let mut rng = ScriptedRng::new(vec![1.0]);
        assert!(rng.random::<f64>() < 1.0);
    }

    #[test]
    fn same_seed_same_stream() {
        let mut first = seeded(7);
        let mut second = seeded(7);
        for _ in 0..16 {
            assert_eq!(first.next_u64(), second.next_u64());
        }
    }

    #[test]
    fn boxed_source_is_usable_as_rng() {
        let mut shared: SharedRng = Box::new(from_entropy());
        let draw = shared.random::<f64>();
        assert!((0.0..1.0).contains(&draw));
    }
}
