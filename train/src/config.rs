//! Training program configuration format.

use crate::common::*;

/// The main training configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub dataset: DatasetConfig,
    pub logging: LoggingConfig,
    pub training: TrainingConfig,
    pub model: ModelConfig,
}

impl Config {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let text = std::fs::read_to_string(path)?;
        let config: Self = json5::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let ModelConfig {
            learning_rate,
            dropout,
        } = self.model;
        ensure!(
            learning_rate > 0.0 && learning_rate < 1.0,
            "learning_rate must be in range (0, 1), but get {}",
            learning_rate
        );
        ensure!(
            dropout >= 0.0 && dropout < 1.0,
            "dropout must be in range [0, 1), but get {}",
            dropout
        );
        self.dataset.preprocessor()?;
        Ok(())
    }
}

/// Dataset options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// The directory containing `<split>/<plane>/<exam_id>.npy` volumes.
    pub data_dir: PathBuf,
    /// The directory containing `<split>-<task>.csv` label tables.
    pub label_dir: PathBuf,
    /// The imaging plane to train on.
    pub plane: Plane,
    /// The side length of preprocessed slices.
    #[serde(default = "default_image_size")]
    pub image_size: NonZeroUsize,
    /// The number of replicated image channels.
    #[serde(default = "default_channels")]
    pub channels: NonZeroUsize,
    #[serde(default)]
    pub filter: ResizeFilter,
}

impl DatasetConfig {
    pub fn split_dir(&self, split: Split) -> PathBuf {
        self.data_dir.join(split.as_str())
    }

    pub fn preprocessor(&self) -> Result<SlicePreprocessor> {
        SlicePreprocessor::square(self.image_size.get(), self.channels.get(), self.filter)
    }
}

/// Data logging options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// The output directory. Each run creates a time-stamped sub-directory.
    pub dir: PathBuf,
}

/// The training options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// The number of exams per batch.
    pub batch_size: NonZeroUsize,
    pub epochs: NonZeroUsize,
    /// If set, visit training batches in a random order every epoch.
    #[serde(default = "default_true")]
    pub shuffle: bool,
    /// The seed of batch shuffling. It is drawn from entropy if not set.
    pub seed: Option<u64>,
    /// The maximum number of batches loaded ahead of the training step.
    #[serde(default = "default_prefetch")]
    pub prefetch: NonZeroUsize,
    /// If set, run over the validation split after each epoch.
    #[serde(default = "default_true")]
    pub validate: bool,
}

/// The hyperparameters handed to the classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub learning_rate: R64,
    pub dropout: R64,
}

fn default_image_size() -> NonZeroUsize {
    NonZeroUsize::new(mrnet::processor::DEFAULT_IMAGE_SIZE).unwrap()
}

fn default_channels() -> NonZeroUsize {
    NonZeroUsize::new(mrnet::processor::DEFAULT_CHANNELS).unwrap()
}

fn default_prefetch() -> NonZeroUsize {
    NonZeroUsize::new(2).unwrap()
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        dataset: { data_dir: "data", label_dir: "data", plane: "sagittal" },
        logging: { dir: "runs" },
        training: { batch_size: 4, epochs: 2 },
        model: { learning_rate: 0.0001, dropout: 0.5 },
    }"#;

    #[test]
    fn defaults() -> Result<()> {
        let config: Config = json5::from_str(MINIMAL)?;
        config.validate()?;

        assert_eq!(config.dataset.image_size.get(), 299);
        assert_eq!(config.dataset.channels.get(), 3);
        assert_eq!(config.dataset.filter, ResizeFilter::Triangle);
        assert_eq!(config.dataset.split_dir(Split::Valid), Path::new("data/valid"));
        assert!(config.training.shuffle);
        assert!(config.training.validate);
        assert_eq!(config.training.prefetch.get(), 2);
        assert_eq!(config.training.seed, None);
        Ok(())
    }

    #[test]
    fn reject_invalid_values() {
        let parse = |text: &str| -> Result<Config> {
            let config: Config = json5::from_str(text)?;
            config.validate()?;
            Ok(config)
        };

        assert!(parse(&MINIMAL.replace("batch_size: 4", "batch_size: 0")).is_err());
        assert!(parse(&MINIMAL.replace("dropout: 0.5", "dropout: 1.0")).is_err());
        assert!(parse(&MINIMAL.replace("learning_rate: 0.0001", "learning_rate: 0")).is_err());
        assert!(parse(&MINIMAL.replace("\"sagittal\"", "\"oblique\"")).is_err());
    }
}
