use crate::{common::*, config::Config};

pub const FILE_STRFTIME: &str = "%Y-%m-%d-%H-%M-%S.%3f%z";

/// The output locations of one training run.
#[derive(Debug, Clone)]
pub struct RunDir {
    pub dir: PathBuf,
}

impl RunDir {
    /// Create `<logging.dir>/<start time>` and save a copy of the configuration in it.
    pub async fn create(config: &Config, start_time: DateTime<Local>) -> Result<Self> {
        let dir = config
            .logging
            .dir
            .join(format!("{}", start_time.format(FILE_STRFTIME)));

        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create directory '{}'", dir.display()))?;
        let run_dir = Self { dir };
        let text = serde_json::to_string_pretty(config)?;
        tokio::fs::write(run_dir.config_file(), text).await?;

        Ok(run_dir)
    }

    pub fn config_file(&self) -> PathBuf {
        self.dir.join("config.json5")
    }

    pub fn event_file(&self) -> PathBuf {
        self.dir.join("events.jsonl")
    }
}
