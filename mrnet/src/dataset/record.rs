use crate::{common::*, task::Task};

/// One batch of slice images with their per-task labels.
///
/// Every row of `images` comes from the exam at the same position of
/// `exam_ids`, and every label array has one entry per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// Images in `(rows, height, width, channels)` layout.
    pub images: Array4<f32>,
    /// Label arrays keyed by output name, in [`Task::ALL`] order.
    pub labels: IndexMap<String, Array1<u8>>,
    /// The source exam of each row.
    pub exam_ids: Vec<String>,
    pub stats: BatchStats,
}

impl Batch {
    /// Assemble a batch from row-major image data.
    pub fn from_rows(
        image_shape: (usize, usize, usize),
        data: Vec<f32>,
        task_labels: [Vec<u8>; 2],
        exam_ids: Vec<String>,
        stats: BatchStats,
    ) -> Result<Self> {
        let rows = exam_ids.len();
        let (height, width, channels) = image_shape;
        ensure!(
            task_labels.iter().all(|labels| labels.len() == rows),
            "label count does not match row count {}",
            rows
        );

        let images = Array4::from_shape_vec((rows, height, width, channels), data)?;
        let labels = izip!(Task::ALL, task_labels)
            .map(|(task, labels)| (task.output_name().to_owned(), Array1::from(labels)))
            .collect();

        Ok(Self {
            images,
            labels,
            exam_ids,
            stats,
        })
    }

    /// The number of images in the batch.
    pub fn len(&self) -> usize {
        self.images.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn task_labels(&self, task: Task) -> Option<&Array1<u8>> {
        self.labels.get(task.output_name())
    }
}

/// Counters of one batch fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchStats {
    /// Exams addressed by the batch index.
    pub requested_exams: usize,
    /// Exams that contributed slices.
    pub used_exams: usize,
    /// Exams without a volume file for the plane.
    pub missing_volumes: usize,
    /// Exams lacking the label of at least one task.
    pub missing_labels: usize,
    /// Slices produced, equal to the row count.
    pub slices: usize,
}

impl std::ops::AddAssign for BatchStats {
    fn add_assign(&mut self, rhs: Self) {
        self.requested_exams += rhs.requested_exams;
        self.used_exams += rhs.used_exams;
        self.missing_volumes += rhs.missing_volumes;
        self.missing_labels += rhs.missing_labels;
        self.slices += rhs.slices;
    }
}
