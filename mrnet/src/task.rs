//! The vocabularies of the MRNet dataset: classification tasks, imaging planes and splits.

use crate::common::*;

/// The binary classification target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Task {
    /// Anterior cruciate ligament tear.
    Acl,
    /// Meniscal tear.
    Meniscus,
}

impl Task {
    /// All tasks in output order.
    pub const ALL: [Task; 2] = [Task::Acl, Task::Meniscus];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Acl => "acl",
            Self::Meniscus => "meniscus",
        }
    }

    /// The name of the model output trained on this task.
    pub fn output_name(&self) -> &'static str {
        self.as_str()
    }
}

/// The acquisition orientation of a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plane {
    Sagittal,
    Coronal,
    Axial,
}

impl Plane {
    pub const ALL: [Plane; 3] = [Plane::Sagittal, Plane::Coronal, Plane::Axial];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sagittal => "sagittal",
            Self::Coronal => "coronal",
            Self::Axial => "axial",
        }
    }
}

/// The dataset partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Valid,
}

impl Split {
    pub const ALL: [Split; 2] = [Split::Train, Split::Valid];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Valid => "valid",
        }
    }
}

macro_rules! impl_str_conversions {
    ($ty:ident, $what:literal) => {
        impl Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(text: &str) -> Result<Self> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|item| item.as_str().eq_ignore_ascii_case(text.trim()))
                    .ok_or_else(|| {
                        format_err!(
                            "invalid {} '{}', expect one of {}",
                            $what,
                            text,
                            Self::ALL.iter().map(|item| item.as_str()).join(", ")
                        )
                    })
            }
        }
    };
}

impl_str_conversions!(Task, "task");
impl_str_conversions!(Plane, "plane");
impl_str_conversions!(Split, "split");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_names() {
        assert_eq!("acl".parse::<Task>().unwrap(), Task::Acl);
        assert_eq!("Meniscus".parse::<Task>().unwrap(), Task::Meniscus);
        assert_eq!("coronal".parse::<Plane>().unwrap(), Plane::Coronal);
        assert_eq!(" valid ".parse::<Split>().unwrap(), Split::Valid);
        assert!("abnormal".parse::<Task>().is_err());
        assert!("test".parse::<Split>().is_err());
    }

    #[test]
    fn display_matches_file_names() {
        assert_eq!(format!("{}-{}.csv", Split::Train, Task::Acl), "train-acl.csv");
        assert_eq!(Plane::Axial.to_string(), "axial");
    }
}
