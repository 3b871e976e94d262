//! The training program for the MRNet knee MRI classifier.

pub mod common;
pub mod config;
pub mod logging;
pub mod message;
pub mod train;
pub mod training_stream;
pub mod utils;

use crate::{
    common::*,
    train::{BatchConsumer, BatchSummary},
    training_stream::TrainingStream,
    utils::RunDir,
};

/// The entry of training program.
pub async fn start(config: Arc<config::Config>) -> Result<RunDir> {
    start_with(config, BatchSummary::new()).await
}

/// Run the configured epochs, feeding every batch to `consumer`.
pub async fn start_with<C>(config: Arc<config::Config>, consumer: C) -> Result<RunDir>
where
    C: 'static + BatchConsumer,
{
    let start_time = Local::now();

    // create dirs and save config
    let run_dir = RunDir::create(&config, start_time).await?;
    info!("write outputs to '{}'", run_dir.dir.display());
    {
        let config::ModelConfig {
            learning_rate,
            dropout,
        } = config.model;
        info!("model learning rate {}, dropout {}", learning_rate, dropout);
    }

    // load dataset
    info!("loading dataset");
    let dataset = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || TrainingStream::new(&config)).await??
    };

    // create channels
    let (data_tx, data_rx) = mpsc::channel(config.training.prefetch.get());
    let (logging_tx, logging_rx) = mpsc::channel(16);

    // start logger
    let logging_future = logging::logging_worker(run_dir.event_file(), logging_rx).await?;

    // feeding worker
    let training_data_future = dataset
        .spawn(data_tx)
        .instrument(info_span!("feeding_worker"));

    // training worker
    let training_worker_future = tokio::task::spawn_blocking(move || {
        train::training_worker(consumer, data_rx, logging_tx)
    })
    .map(|result| Fallible::Ok(result??));

    futures::try_join!(training_data_future, training_worker_future, logging_future)?;
    info!("training finished");

    Ok(run_dir)
}
