use super::*;
use crate::common::*;

/// The batch producer that can be random accessed by batch index.
pub trait BatchSequence
where
    Self: Debug + Send + Sync,
{
    /// Get the number of addressable batches.
    fn num_batches(&self) -> usize;

    /// Build the batch at `index`.
    fn batch(&self, index: usize) -> Result<Batch>;

    /// The order in which an epoch visits the batches.
    ///
    /// It yields `0..num_batches()`, permuted if `rng` is given.
    fn batch_order(&self, rng: Option<&mut StdRng>) -> Vec<usize> {
        let mut order: Vec<_> = (0..self.num_batches()).collect();
        if let Some(rng) = rng {
            order.shuffle(rng);
        }
        order
    }
}
