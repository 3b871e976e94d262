use super::*;
use crate::{
    common::*,
    label::TaskLabels,
    processor::SlicePreprocessor,
    profiling::Timing,
    task::Plane,
    volume::{load_volume, volume_path},
};

/// The options to build a [`MriSequence`].
#[derive(Debug, Clone)]
pub struct MriSequenceInit {
    /// The directory holding `<plane>/<exam_id>.npy` volumes.
    pub data_dir: PathBuf,
    pub plane: Plane,
    pub labels: Arc<TaskLabels>,
    /// The exams to draw from, in order. Defaults to the labeled exams if `None`.
    pub exam_ids: Option<Vec<String>>,
    /// The number of exams per batch.
    pub batch_size: NonZeroUsize,
    pub preprocessor: SlicePreprocessor,
}

impl MriSequenceInit {
    pub fn build(self) -> MriSequence {
        let Self {
            data_dir,
            plane,
            labels,
            exam_ids,
            batch_size,
            preprocessor,
        } = self;

        let exam_ids = exam_ids.unwrap_or_else(|| labels.exam_ids());
        let indexes = (0..exam_ids.len()).collect();

        MriSequence {
            data_dir,
            plane,
            labels,
            exam_ids,
            batch_size: batch_size.get(),
            preprocessor,
            indexes,
        }
    }
}

/// The batch sequence that loads exam volumes on demand and expands them into slices.
///
/// A batch covers `batch_size` exams. The row count varies with the slice
/// counts of the volumes, and exams without a volume or without both labels
/// contribute no rows.
#[derive(Debug, Clone)]
pub struct MriSequence {
    data_dir: PathBuf,
    plane: Plane,
    labels: Arc<TaskLabels>,
    exam_ids: Vec<String>,
    batch_size: usize,
    preprocessor: SlicePreprocessor,
    indexes: Vec<usize>,
}

impl MriSequence {
    /// The number of addressable batches, `ceil(exam_count / batch_size)`.
    pub fn len(&self) -> usize {
        let num_exams = self.exam_ids.len();
        num_exams / self.batch_size + (num_exams % self.batch_size != 0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.exam_ids.is_empty()
    }

    pub fn exam_count(&self) -> usize {
        self.exam_ids.len()
    }

    pub fn exam_ids(&self) -> &[String] {
        &self.exam_ids
    }

    pub fn plane(&self) -> Plane {
        self.plane
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn preprocessor(&self) -> &SlicePreprocessor {
        &self.preprocessor
    }

    /// Load the exams of batch `index` and assemble their slices.
    pub fn fetch(&self, index: usize) -> Result<Batch> {
        let num_batches = self.len();
        ensure!(
            index < num_batches,
            "invalid batch index {}, the sequence has {} batches",
            index,
            num_batches
        );

        let mut timing = Timing::new("fetch_batch");
        let begin = index * self.batch_size;
        let end = begin.saturating_add(self.batch_size).min(self.indexes.len());
        let image_len = {
            let (h, w, c) = self.preprocessor.output_shape();
            h * w * c
        };

        let mut stats = BatchStats {
            requested_exams: end - begin,
            ..Default::default()
        };
        let mut data = vec![];
        let mut acl_labels = vec![];
        let mut meniscus_labels = vec![];
        let mut exam_ids = vec![];

        for &exam_index in &self.indexes[begin..end] {
            let exam_id = &self.exam_ids[exam_index];

            let path = volume_path(&self.data_dir, self.plane, exam_id);
            let volume = match load_volume(&path)? {
                Some(volume) => volume,
                None => {
                    debug!(
                        "skip exam '{}': volume file '{}' does not exist",
                        exam_id,
                        path.display()
                    );
                    stats.missing_volumes += 1;
                    continue;
                }
            };
            timing.add_event("load volume");

            let [acl, meniscus] = match self.labels.get(exam_id) {
                Some(labels) => labels,
                None => {
                    debug!("skip exam '{}': missing label", exam_id);
                    stats.missing_labels += 1;
                    continue;
                }
            };

            let num_slices = volume.len_of(Axis(0));
            data.reserve(num_slices * image_len);

            for (slice_index, slice) in volume.outer_iter().enumerate() {
                let image = self.preprocessor.process(slice).with_context(|| {
                    format!(
                        "failed to preprocess slice {} of exam '{}'",
                        slice_index, exam_id
                    )
                })?;
                data.extend(image.iter().copied());
                acl_labels.push(acl);
                meniscus_labels.push(meniscus);
                exam_ids.push(exam_id.clone());
            }
            timing.add_event("preprocess");

            stats.used_exams += 1;
            stats.slices += num_slices;
        }

        let batch = Batch::from_rows(
            self.preprocessor.output_shape(),
            data,
            [acl_labels, meniscus_labels],
            exam_ids,
            stats,
        )?;
        timing.add_event("assemble");
        timing.report();

        Ok(batch)
    }

    /// Iterate over all batches in index order.
    pub fn batches(&self) -> impl Iterator<Item = Result<Batch>> + '_ {
        (0..self.len()).map(move |index| self.fetch(index))
    }
}

impl BatchSequence for MriSequence {
    fn num_batches(&self) -> usize {
        self.len()
    }

    fn batch(&self, index: usize) -> Result<Batch> {
        self.fetch(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{label::LabelMap, processor::ResizeFilter};

    fn labels(entries: &[(&str, u8, u8)]) -> Arc<TaskLabels> {
        let acl: LabelMap = entries
            .iter()
            .map(|&(exam_id, acl, _)| (exam_id.to_owned(), acl))
            .collect();
        let meniscus: LabelMap = entries
            .iter()
            .map(|&(exam_id, _, meniscus)| (exam_id.to_owned(), meniscus))
            .collect();
        Arc::new(TaskLabels::new(acl, meniscus))
    }

    fn sequence(num_exams: usize, batch_size: usize) -> MriSequence {
        MriSequenceInit {
            data_dir: PathBuf::from("/nonexistent"),
            plane: Plane::Sagittal,
            labels: labels(&[]),
            exam_ids: Some((0..num_exams).map(|index| format!("{:04}", index)).collect()),
            batch_size: NonZeroUsize::new(batch_size).unwrap(),
            preprocessor: SlicePreprocessor::square(8, 3, ResizeFilter::Triangle).unwrap(),
        }
        .build()
    }

    #[test]
    fn length_is_ceil_of_exam_count() {
        for num_exams in 0..20 {
            for batch_size in 1..25 {
                let expect = (num_exams as f64 / batch_size as f64).ceil() as usize;
                assert_eq!(sequence(num_exams, batch_size).len(), expect);
            }
        }
        assert_eq!(sequence(3, 10).len(), 1);
        assert_eq!(sequence(0, 4).len(), 0);
    }

    #[test]
    fn huge_batch_size_covers_all_exams() -> Result<()> {
        let seq = sequence(2, usize::MAX);
        assert_eq!(seq.len(), 1);
        assert_eq!(sequence(0, usize::MAX).len(), 0);

        let batch = seq.fetch(0)?;
        assert_eq!(batch.stats.requested_exams, 2);
        assert_eq!(batch.stats.missing_volumes, 2);
        assert!(seq.fetch(1).is_err());
        Ok(())
    }

    #[test]
    fn out_of_range_index_fails() {
        let seq = sequence(3, 2);
        assert!(seq.fetch(2).is_err());
        assert!(sequence(0, 1).fetch(0).is_err());
    }

    #[test]
    fn default_exam_ids_follow_labels() {
        let seq = MriSequenceInit {
            data_dir: PathBuf::from("/nonexistent"),
            plane: Plane::Axial,
            labels: labels(&[("0003", 1, 0), ("0001", 0, 0)]),
            exam_ids: None,
            batch_size: NonZeroUsize::new(1).unwrap(),
            preprocessor: SlicePreprocessor::default(),
        }
        .build();
        assert_eq!(seq.exam_ids(), ["0003", "0001"]);
        assert_eq!(seq.len(), 2);
    }

    #[test]
    fn missing_volumes_yield_empty_batch() -> Result<()> {
        let seq = sequence(5, 3);
        let batch = seq.fetch(1)?;
        assert!(batch.is_empty());
        assert_eq!(batch.images.dim(), (0, 8, 8, 3));
        assert_eq!(batch.stats.requested_exams, 2);
        assert_eq!(batch.stats.missing_volumes, 2);
        Ok(())
    }

    #[test]
    fn batch_order_is_a_permutation() {
        let seq = sequence(50, 3);
        assert_eq!(seq.batch_order(None), (0..17).collect::<Vec<_>>());

        let mut rng = StdRng::seed_from_u64(7);
        let mut order = seq.batch_order(Some(&mut rng));
        order.sort_unstable();
        assert_eq!(order, (0..17).collect::<Vec<_>>());
    }
}
