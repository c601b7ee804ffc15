use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng, SeedableRng};
use thiserror::Error;

use crate::engine::RandomSource;

/// Системный RNG (thread_rng) – для живых матчей.
#[derive(Clone, Debug, Default)]
pub struct SystemRng;

impl RandomSource for SystemRng {
    fn shuffle<T>(&mut self, slice: &mut [T]) {
        slice.shuffle(&mut thread_rng());
    }

    fn index(&mut self, upper: usize) -> usize {
        thread_rng().gen_range(0..upper)
    }
}

/// Детерминированный RNG для тестов и реплея.
/// Позволяет воспроизводить одни и те же матчи при одинаковом seed.
#[derive(Clone, Debug)]
pub struct DeterministicRng {
    inner: StdRng,
}

impl DeterministicRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for DeterministicRng {
    fn shuffle<T>(&mut self, slice: &mut [T]) {
        slice.shuffle(&mut self.inner);
    }

    fn index(&mut self, upper: usize) -> usize {
        self.inner.gen_range(0..upper)
    }
}

/// Диапазон меньше, чем запрошено различных чисел.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Нельзя выбрать {count} различных чисел из диапазона длины {available}")]
pub struct RangeError {
    pub count: usize,
    pub available: usize,
}

/// `count` различных чисел из `[start, end)`, равномерно и без повторов.
pub fn distinct_random_indices<R: RandomSource>(
    rng: &mut R,
    count: usize,
    start: usize,
    end: usize,
) -> Result<Vec<usize>, RangeError> {
    let available = end.saturating_sub(start);
    if count > available {
        return Err(RangeError { count, available });
    }

    let mut numbers: Vec<usize> = (start..end).collect();
    rng.shuffle(&mut numbers);
    numbers.truncate(count);
    Ok(numbers)
}

/// Равномерное перемешивание на месте системным RNG.
pub fn shuffle<T>(items: &mut [T]) {
    SystemRng.shuffle(items);
}
