use crate::common::*;

pub use feed_message::*;
pub use logging_message::*;

mod feed_message {
    use super::*;

    /// The message sent from the feeding worker to the training worker.
    #[derive(Debug)]
    pub enum FeedMessage {
        Batch(TrainingRecord),
        /// All batches of the split in this epoch were sent.
        EpochEnd { epoch: usize, split: Split },
    }

    /// A batch tagged with its position in the run.
    #[derive(Debug)]
    pub struct TrainingRecord {
        pub epoch: usize,
        pub split: Split,
        /// The number of batches sent before this one in the same split.
        pub step: usize,
        /// The batch index in the sequence.
        pub batch_index: usize,
        pub batch: Batch,
    }
}

mod logging_message {
    use super::*;

    /// The message type that is accepted by the logging worker.
    ///
    /// Each message is written as one JSON line.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "kind", rename_all = "snake_case")]
    pub enum LoggingMessage {
        Step(StepLog),
        Epoch(EpochLog),
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct StepLog {
        pub epoch: usize,
        pub split: Split,
        pub step: usize,
        pub batch_index: usize,
        pub stats: BatchStats,
        pub acl_positive: usize,
        pub meniscus_positive: usize,
        /// Values reported by the batch consumer.
        pub metrics: IndexMap<String, f64>,
        pub elapsed_ms: f64,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct EpochLog {
        pub epoch: usize,
        pub split: Split,
        pub batches: usize,
        pub stats: BatchStats,
        pub acl_positive: usize,
        pub meniscus_positive: usize,
        pub slices_per_sec: f64,
    }
}
