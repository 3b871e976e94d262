use crate::{
    common::*,
    label::TaskLabels,
    task::{Plane, Split},
    volume::{load_volume, volume_path},
};

/// The on-disk availability of the exams of one split and plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaneInventory {
    pub split: Split,
    pub plane: Plane,
    /// Exams listed in the ACL label table.
    pub exams: usize,
    /// Exams having a volume file.
    pub with_volume: usize,
    /// Exams having a volume file and both labels.
    pub usable: usize,
    /// Positive exams among the usable ones, per task.
    pub acl_positive: usize,
    pub meniscus_positive: usize,
    /// Slice counts of the usable exams.
    pub slice_counts: Vec<usize>,
}

impl PlaneInventory {
    /// Read every volume of `split_dir/<plane>` listed in `labels`.
    pub fn scan(
        split_dir: impl AsRef<Path>,
        labels: &TaskLabels,
        split: Split,
        plane: Plane,
    ) -> Result<Self> {
        let split_dir = split_dir.as_ref();
        let exam_ids = labels.exam_ids();

        let mut inventory = Self {
            split,
            plane,
            exams: exam_ids.len(),
            with_volume: 0,
            usable: 0,
            acl_positive: 0,
            meniscus_positive: 0,
            slice_counts: vec![],
        };

        for exam_id in &exam_ids {
            let volume = match load_volume(volume_path(split_dir, plane, exam_id))? {
                Some(volume) => volume,
                None => continue,
            };
            inventory.with_volume += 1;

            if let Some([acl, meniscus]) = labels.get(exam_id) {
                inventory.usable += 1;
                inventory.acl_positive += acl as usize;
                inventory.meniscus_positive += meniscus as usize;
                inventory.slice_counts.push(volume.len_of(Axis(0)));
            }
        }

        Ok(inventory)
    }

    /// The total number of slices a full pass over the usable exams produces.
    pub fn total_slices(&self) -> usize {
        self.slice_counts.iter().sum()
    }

    /// The minimum, mean and maximum slice counts, if any exam is usable.
    pub fn slice_count_range(&self) -> Option<(usize, f64, usize)> {
        let (&min, &max) = (
            self.slice_counts.iter().min()?,
            self.slice_counts.iter().max()?,
        );
        let mean = self.total_slices() as f64 / self.slice_counts.len() as f64;
        Some((min, mean, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::LabelMap;
    use ndarray_npy::WriteNpyExt;

    #[test]
    fn scan_counts_volumes_and_labels() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let plane_dir = dir.path().join("axial");
        std::fs::create_dir_all(&plane_dir)?;
        for (exam_id, num_slices) in [("0000", 2), ("0001", 5), ("0003", 1)] {
            let volume = Array3::<u8>::zeros((num_slices, 4, 4));
            volume.write_npy(File::create(plane_dir.join(format!("{}.npy", exam_id)))?)?;
        }

        let acl: LabelMap = [("0000", 1), ("0001", 0), ("0002", 1), ("0003", 1)]
            .iter()
            .map(|&(id, label)| (id.to_owned(), label))
            .collect();
        let meniscus: LabelMap = [("0000", 1), ("0001", 1), ("0002", 0)]
            .iter()
            .map(|&(id, label)| (id.to_owned(), label))
            .collect();
        let labels = TaskLabels::new(acl, meniscus);

        let inventory = PlaneInventory::scan(dir.path(), &labels, Split::Train, Plane::Axial)?;
        assert_eq!(inventory.exams, 4);
        assert_eq!(inventory.with_volume, 3);
        assert_eq!(inventory.usable, 2);
        assert_eq!(inventory.acl_positive, 1);
        assert_eq!(inventory.meniscus_positive, 2);
        assert_eq!(inventory.slice_counts, [2, 5]);
        assert_eq!(inventory.slice_count_range(), Some((2, 3.5, 5)));
        Ok(())
    }
}
