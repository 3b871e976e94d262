//! Data logging toolkit.

use crate::{common::*, message::LoggingMessage, utils::RateCounter};
use tokio::{
    fs::File,
    io::{AsyncWriteExt, BufWriter},
};

/// The data logging worker.
#[derive(Debug)]
pub struct LoggingWorker {
    writer: BufWriter<File>,
    rate_counter: RateCounter,
    rx: mpsc::Receiver<LoggingMessage>,
}

impl LoggingWorker {
    /// Create a data logging worker writing JSON lines to `event_file`.
    async fn new(event_file: &Path, rx: mpsc::Receiver<LoggingMessage>) -> Result<Self> {
        let file = File::create(event_file)
            .await
            .with_context(|| format!("failed to create '{}'", event_file.display()))?;

        Ok(Self {
            writer: BufWriter::new(file),
            rate_counter: RateCounter::with_second_interval(),
            rx,
        })
    }

    /// Start the data logging worker.
    async fn start(mut self) -> Result<()> {
        while let Some(msg) = self.rx.recv().await {
            self.rate_counter.add(1.0);

            if let LoggingMessage::Epoch(log) = &msg {
                debug!("log epoch {} {} summary", log.epoch, log.split);
            }

            let mut line = serde_json::to_vec(&msg)?;
            line.push(b'\n');
            self.writer.write_all(&line).await?;

            if let Some(rate) = self.rate_counter.rate() {
                debug!("processed {:.2} events/s", rate);
            }
        }

        self.writer.flush().await?;
        Ok(())
    }
}

/// Start the logging worker and return its join future.
pub async fn logging_worker(
    event_file: impl AsRef<Path>,
    rx: mpsc::Receiver<LoggingMessage>,
) -> Result<impl Future<Output = Result<()>> + Send> {
    let worker = LoggingWorker::new(event_file.as_ref(), rx).await?;
    Ok(tokio::task::spawn(worker.start()).map(|result| Fallible::Ok(result??)))
}

/// Read back the events written by the logging worker.
pub fn read_events(event_file: impl AsRef<Path>) -> Result<Vec<LoggingMessage>> {
    let event_file = event_file.as_ref();
    let text = std::fs::read_to_string(event_file)
        .with_context(|| format!("failed to read '{}'", event_file.display()))?;
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| Ok(serde_json::from_str(line)?))
        .collect()
}
