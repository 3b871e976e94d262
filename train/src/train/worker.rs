use super::BatchConsumer;
use crate::{
    common::*,
    message::{EpochLog, FeedMessage, LoggingMessage, StepLog, TrainingRecord},
    utils::RateCounter,
};

/// Start the training worker that runs `consumer` over fed batches.
///
/// It returns when the feeding worker closes the data channel.
pub fn training_worker<C>(
    mut consumer: C,
    mut data_rx: mpsc::Receiver<FeedMessage>,
    logging_tx: mpsc::Sender<LoggingMessage>,
) -> Result<()>
where
    C: BatchConsumer,
{
    let mut rate_counter = RateCounter::with_second_interval();
    let mut epoch_stat = EpochStat::new();
    let send = |msg: LoggingMessage| {
        logging_tx
            .blocking_send(msg)
            .map_err(|_| format_err!("failed to send message to logging worker"))
    };

    while let Some(msg) = data_rx.blocking_recv() {
        match msg {
            FeedMessage::Batch(record) => {
                let instant = Instant::now();
                let metrics = consumer.step(&record).with_context(|| {
                    format!(
                        "training step failed at epoch {} {} step {}",
                        record.epoch, record.split, record.step
                    )
                })?;
                let elapsed = instant.elapsed();

                let log = step_log(&record, metrics, elapsed);
                epoch_stat.add(&log);

                rate_counter.add(record.batch.len() as f64);
                if let Some(rate) = rate_counter.rate() {
                    info!(
                        "epoch {}\t{}\tstep {}\t{:.2} slices/s",
                        record.epoch, record.split, record.step, rate
                    );
                }

                send(LoggingMessage::Step(log))?;
            }
            FeedMessage::EpochEnd { epoch, split } => {
                let log = mem::replace(&mut epoch_stat, EpochStat::new()).finish(epoch, split);
                info!(
                    "epoch {} {} done: {} batches, {} of {} exams used, {} slices, {} missing volumes, {} missing labels",
                    epoch,
                    split,
                    log.batches,
                    log.stats.used_exams,
                    log.stats.requested_exams,
                    log.stats.slices,
                    log.stats.missing_volumes,
                    log.stats.missing_labels,
                );
                send(LoggingMessage::Epoch(log))?;
            }
        }
    }

    Ok(())
}

fn step_log(
    record: &TrainingRecord,
    metrics: IndexMap<String, f64>,
    elapsed: Duration,
) -> StepLog {
    let TrainingRecord {
        epoch,
        split,
        step,
        batch_index,
        ref batch,
    } = *record;
    let positive = |task| {
        batch
            .task_labels(task)
            .map(|labels| labels.iter().filter(|&&label| label == 1).count())
            .unwrap_or(0)
    };

    StepLog {
        epoch,
        split,
        step,
        batch_index,
        stats: batch.stats,
        acl_positive: positive(Task::Acl),
        meniscus_positive: positive(Task::Meniscus),
        metrics,
        elapsed_ms: elapsed.as_secs_f64() * 1000.0,
    }
}

/// Accumulates the step logs of one pass over a split.
#[derive(Debug)]
struct EpochStat {
    instant: Instant,
    batches: usize,
    stats: BatchStats,
    acl_positive: usize,
    meniscus_positive: usize,
}

impl EpochStat {
    fn new() -> Self {
        Self {
            instant: Instant::now(),
            batches: 0,
            stats: BatchStats::default(),
            acl_positive: 0,
            meniscus_positive: 0,
        }
    }

    fn add(&mut self, log: &StepLog) {
        self.batches += 1;
        self.stats += log.stats;
        self.acl_positive += log.acl_positive;
        self.meniscus_positive += log.meniscus_positive;
    }

    fn finish(self, epoch: usize, split: Split) -> EpochLog {
        let secs = self.instant.elapsed().as_secs_f64();
        let slices_per_sec = if secs > 0.0 {
            self.stats.slices as f64 / secs
        } else {
            0.0
        };

        EpochLog {
            epoch,
            split,
            batches: self.batches,
            stats: self.stats,
            acl_positive: self.acl_positive,
            meniscus_positive: self.meniscus_positive,
            slices_per_sec,
        }
    }
}
