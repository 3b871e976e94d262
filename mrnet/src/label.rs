//! Per-split, per-task label tables.

use crate::{
    common::*,
    task::{Split, Task},
};

/// The exam id to binary label mapping of one task, in file order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LabelMap {
    labels: IndexMap<String, u8>,
}

impl LabelMap {
    pub fn get(&self, exam_id: &str) -> Option<u8> {
        self.labels.get(exam_id).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterate over exam ids in file order.
    pub fn exam_ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.labels.keys().map(|exam_id| exam_id.as_str())
    }

    /// The number of exams labeled 1.
    pub fn positive_count(&self) -> usize {
        self.labels.values().filter(|&&label| label == 1).count()
    }
}

impl FromIterator<(String, u8)> for LabelMap {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (String, u8)>,
    {
        Self {
            labels: iter.into_iter().collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LabelRecord {
    exam_id: String,
    label: u8,
}

/// The path to the label table of a split and task.
pub fn label_path(label_dir: impl AsRef<Path>, task: Task, split: Split) -> PathBuf {
    label_dir.as_ref().join(format!("{}-{}.csv", split, task))
}

/// Load the `<split>-<task>.csv` label table from `label_dir`.
///
/// The table has two columns, exam id and label, and no header.
pub fn load_labels(label_dir: impl AsRef<Path>, task: Task, split: Split) -> Result<LabelMap> {
    let path = label_path(label_dir, task, split);
    load_label_file(&path)
        .with_context(|| format!("failed to load label file '{}'", path.display()))
}

fn load_label_file(path: &Path) -> Result<LabelMap> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(::csv::Trim::All)
        .from_path(path)?;
    let mut labels = IndexMap::new();

    for (index, record) in reader.deserialize::<LabelRecord>().enumerate() {
        let LabelRecord { exam_id, label } = record?;
        ensure!(
            label <= 1,
            "the label of exam '{}' at record {} must be 0 or 1, but get {}",
            exam_id,
            index,
            label
        );
        ensure!(
            !labels.contains_key(&exam_id),
            "exam '{}' at record {} is labeled more than once",
            exam_id,
            index
        );
        labels.insert(exam_id, label);
    }

    Ok(LabelMap { labels })
}

/// The label tables of both tasks for a split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLabels {
    pub acl: LabelMap,
    pub meniscus: LabelMap,
}

impl TaskLabels {
    pub fn new(acl: LabelMap, meniscus: LabelMap) -> Self {
        Self { acl, meniscus }
    }

    pub fn load(label_dir: impl AsRef<Path>, split: Split) -> Result<Self> {
        let label_dir = label_dir.as_ref();
        Ok(Self {
            acl: load_labels(label_dir, Task::Acl, split)?,
            meniscus: load_labels(label_dir, Task::Meniscus, split)?,
        })
    }

    pub fn task(&self, task: Task) -> &LabelMap {
        match task {
            Task::Acl => &self.acl,
            Task::Meniscus => &self.meniscus,
        }
    }

    /// Both labels of an exam in [`Task::ALL`] order, or `None` if either is missing.
    pub fn get(&self, exam_id: &str) -> Option<[u8; 2]> {
        Some([self.acl.get(exam_id)?, self.meniscus.get(exam_id)?])
    }

    /// The exam ids of the ACL table in file order.
    pub fn exam_ids(&self) -> Vec<String> {
        self.acl.exam_ids().map(ToOwned::to_owned).collect()
    }

    pub fn summary(&self) -> LabelSummary {
        let both = self
            .acl
            .exam_ids()
            .filter(|exam_id| self.meniscus.get(exam_id).is_some())
            .count();

        LabelSummary {
            exams: self.acl.len(),
            labeled_both: both,
            acl_positive: self.acl.positive_count(),
            meniscus_positive: self.meniscus.positive_count(),
        }
    }
}

/// Class balance of a split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSummary {
    pub exams: usize,
    pub labeled_both: usize,
    pub acl_positive: usize,
    pub meniscus_positive: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, text: &str) {
        fs::write(dir.join(name), text).unwrap();
    }

    #[test]
    fn load_label_table() -> Result<()> {
        let dir = tempfile::tempdir()?;
        write(dir.path(), "train-acl.csv", "0000,0\n0001,1\n 0002 , 1 \n");

        let labels = load_labels(dir.path(), Task::Acl, Split::Train)?;
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.get("0000"), Some(0));
        assert_eq!(labels.get("0002"), Some(1));
        assert_eq!(labels.get("2"), None);
        assert_eq!(labels.positive_count(), 2);
        assert_eq!(
            labels.exam_ids().collect::<Vec<_>>(),
            ["0000", "0001", "0002"]
        );
        Ok(())
    }

    #[test]
    fn missing_label_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_labels(dir.path(), Task::Meniscus, Split::Valid).unwrap_err();
        assert!(format!("{:#}", err).contains("valid-meniscus.csv"));
    }

    #[test]
    fn malformed_label_file_fails() {
        let dir = tempfile::tempdir().unwrap();

        write(dir.path(), "train-acl.csv", "0000,0\n0001,2\n");
        assert!(load_labels(dir.path(), Task::Acl, Split::Train).is_err());

        write(dir.path(), "train-acl.csv", "0000,yes\n");
        assert!(load_labels(dir.path(), Task::Acl, Split::Train).is_err());

        write(dir.path(), "train-acl.csv", "0000,0\n0001,1,1\n");
        assert!(load_labels(dir.path(), Task::Acl, Split::Train).is_err());

        write(dir.path(), "train-acl.csv", "0000,0\n0000,1\n");
        assert!(load_labels(dir.path(), Task::Acl, Split::Train).is_err());
    }

    #[test]
    fn task_labels_require_both_tasks() -> Result<()> {
        let dir = tempfile::tempdir()?;
        write(dir.path(), "valid-acl.csv", "1130,1\n1131,0\n");
        write(dir.path(), "valid-meniscus.csv", "1130,0\n");

        let labels = TaskLabels::load(dir.path(), Split::Valid)?;
        assert_eq!(labels.get("1130"), Some([1, 0]));
        assert_eq!(labels.get("1131"), None);
        assert_eq!(labels.exam_ids(), ["1130", "1131"]);
        assert_eq!(
            labels.summary(),
            LabelSummary {
                exams: 2,
                labeled_both: 1,
                acl_positive: 1,
                meniscus_positive: 0,
            }
        );
        Ok(())
    }
}
