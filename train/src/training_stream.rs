//! Epoch-wise batch feeding.

use crate::{
    common::*,
    config::{Config, DatasetConfig, TrainingConfig},
    message::{FeedMessage, TrainingRecord},
};

/// The training and validation sequences with the epoch schedule over them.
#[derive(Debug, Clone)]
pub struct TrainingStream {
    train: Arc<MriSequence>,
    valid: Option<Arc<MriSequence>>,
    epochs: usize,
    shuffle: bool,
    seed: Option<u64>,
}

impl TrainingStream {
    /// Load label tables and build the sequences of the configured plane.
    pub fn new(config: &Config) -> Result<Self> {
        let Config {
            dataset,
            training:
                TrainingConfig {
                    batch_size,
                    epochs,
                    shuffle,
                    seed,
                    validate,
                    ..
                },
            ..
        } = config;

        let train = Arc::new(load_sequence(dataset, Split::Train, *batch_size)?);
        let valid = validate
            .then(|| load_sequence(dataset, Split::Valid, *batch_size))
            .transpose()?
            .map(Arc::new);

        Ok(Self {
            train,
            valid,
            epochs: epochs.get(),
            shuffle: *shuffle,
            seed: *seed,
        })
    }

    pub fn train_sequence(&self) -> &Arc<MriSequence> {
        &self.train
    }

    pub fn valid_sequence(&self) -> Option<&Arc<MriSequence>> {
        self.valid.as_ref()
    }

    /// Start the feeding worker on a blocking thread.
    ///
    /// Every epoch sends the training batches, in shuffled order if enabled,
    /// then the validation batches in index order. Each pass is closed by
    /// [`FeedMessage::EpochEnd`].
    pub fn spawn(
        self,
        data_tx: mpsc::Sender<FeedMessage>,
    ) -> impl Future<Output = Result<()>> + Send {
        tokio::task::spawn_blocking(move || self.feed(data_tx))
            .map(|result| Fallible::Ok(result??))
    }

    fn feed(self, data_tx: mpsc::Sender<FeedMessage>) -> Result<()> {
        let Self {
            train,
            valid,
            epochs,
            shuffle,
            seed,
        } = self;
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let send = |msg: FeedMessage| {
            data_tx
                .blocking_send(msg)
                .map_err(|_| format_err!("failed to send message to training worker"))
        };

        for epoch in 0..epochs {
            info!("start epoch {}", epoch);

            let passes = [(Split::Train, &train, shuffle)]
                .into_iter()
                .chain(valid.as_ref().map(|valid| (Split::Valid, valid, false)));

            for (split, sequence, shuffle) in passes {
                let rng = if shuffle { Some(&mut rng) } else { None };
                let order = sequence.batch_order(rng);

                for (step, batch_index) in order.into_iter().enumerate() {
                    let batch = sequence.fetch(batch_index).with_context(|| {
                        format!("failed to fetch {} batch {}", split, batch_index)
                    })?;
                    send(FeedMessage::Batch(TrainingRecord {
                        epoch,
                        split,
                        step,
                        batch_index,
                        batch,
                    }))?;
                }

                send(FeedMessage::EpochEnd { epoch, split })?;
            }
        }

        Ok(())
    }
}

fn load_sequence(
    dataset: &DatasetConfig,
    split: Split,
    batch_size: NonZeroUsize,
) -> Result<MriSequence> {
    let labels = TaskLabels::load(&dataset.label_dir, split)?;
    let LabelSummary {
        exams,
        labeled_both,
        acl_positive,
        meniscus_positive,
    } = labels.summary();
    info!(
        "{} split: {} exams, {} labeled for both tasks, {} acl positive, {} meniscus positive",
        split, exams, labeled_both, acl_positive, meniscus_positive
    );

    let sequence = MriSequenceInit {
        data_dir: dataset.split_dir(split),
        plane: dataset.plane,
        labels: Arc::new(labels),
        exam_ids: None,
        batch_size,
        preprocessor: dataset.preprocessor()?,
    }
    .build();
    info!(
        "{} split: {} batches of {} exams on the {} plane",
        split,
        sequence.len(),
        batch_size,
        dataset.plane
    );

    Ok(sequence)
}
