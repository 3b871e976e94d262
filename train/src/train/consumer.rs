use crate::{common::*, message::TrainingRecord};

/// The training step that receives batches in feeding order.
///
/// The classifier itself lives in an external framework. Implementors bind
/// the batches to it and report the step values to be logged.
pub trait BatchConsumer
where
    Self: Send,
{
    fn step(&mut self, record: &TrainingRecord) -> Result<IndexMap<String, f64>>;
}

/// The consumer that reports input statistics of each batch.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    _private: (),
}

impl BatchSummary {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BatchConsumer for BatchSummary {
    fn step(&mut self, record: &TrainingRecord) -> Result<IndexMap<String, f64>> {
        let batch = &record.batch;
        let mut metrics = IndexMap::new();

        if let Some(mean) = batch.images.mean() {
            metrics.insert("mean_intensity".into(), mean as f64);
        }
        for task in Task::ALL {
            let labels = batch
                .task_labels(task)
                .ok_or_else(|| format_err!("batch has no labels of task {}", task))?;
            if let Some(rate) = labels.mapv(|label| label as f64).mean() {
                metrics.insert(format!("{}_positive_rate", task), rate);
            }
        }

        Ok(metrics)
    }
}
