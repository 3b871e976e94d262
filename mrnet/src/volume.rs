//! Reading per-exam MRI volumes stored as `.npy` files.

use crate::{common::*, task::Plane};
use ndarray_npy::{ReadNpyError, ReadNpyExt};

/// The location of the volume of an exam, `<data_dir>/<plane>/<exam_id>.npy`.
pub fn volume_path(data_dir: impl AsRef<Path>, plane: Plane, exam_id: &str) -> PathBuf {
    data_dir
        .as_ref()
        .join(plane.as_str())
        .join(format!("{}.npy", exam_id))
}

/// Load a `(slices, height, width)` volume and convert it to `f32`.
///
/// It returns `Ok(None)` if the file does not exist.
pub fn load_volume(path: impl AsRef<Path>) -> Result<Option<Array3<f32>>> {
    let path = path.as_ref();

    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()))
        }
    };

    let volume = decode_volume(&bytes)
        .with_context(|| format!("failed to decode volume file '{}'", path.display()))?;
    Ok(Some(volume))
}

/// Decode the bytes of a 3-dimensional `.npy` array.
pub fn decode_volume(bytes: &[u8]) -> Result<Array3<f32>> {
    macro_rules! try_element_types {
        ($($ty:ty),*) => {
            $(
                match Array3::<$ty>::read_npy(Cursor::new(bytes)) {
                    Ok(array) => return Ok(array.mapv(|value| value as f32)),
                    Err(ReadNpyError::WrongDescriptor(_)) => {}
                    Err(err) => return Err(err.into()),
                }
            )*
        };
    }

    try_element_types!(u8, i16, u16, i32, f32, f64);
    bail!("unsupported element type, expect one of u8, i16, u16, i32, f32, f64")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray_npy::WriteNpyExt;

    fn npy_bytes<A>(array: &Array3<A>) -> Vec<u8>
    where
        A: ndarray_npy::WritableElement,
    {
        let mut bytes = vec![];
        array.write_npy(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn volume_path_layout() {
        let path = volume_path("/data/train", Plane::Sagittal, "0007");
        assert_eq!(path, Path::new("/data/train/sagittal/0007.npy"));
    }

    #[test]
    fn decode_element_types() -> Result<()> {
        let volume = Array3::from_shape_fn((2, 3, 4), |(s, h, w)| (s * 12 + h * 4 + w) as u8);
        let decoded = decode_volume(&npy_bytes(&volume))?;
        assert_eq!(decoded.dim(), (2, 3, 4));
        assert_eq!(decoded[[1, 2, 3]], 23.0);

        let volume = Array3::from_elem((1, 2, 2), -3i16);
        assert_eq!(decode_volume(&npy_bytes(&volume))?[[0, 1, 1]], -3.0);

        let volume = Array3::from_elem((1, 2, 2), 0.25f64);
        assert_eq!(decode_volume(&npy_bytes(&volume))?[[0, 0, 1]], 0.25);
        Ok(())
    }

    #[test]
    fn reject_wrong_rank() {
        let mut bytes = vec![];
        Array2::<u8>::zeros((4, 4)).write_npy(&mut bytes).unwrap();
        assert!(decode_volume(&bytes).is_err());
    }

    #[test]
    fn reject_unsupported_element_type() {
        let volume = Array3::from_elem((1, 1, 1), 7i64);
        assert!(decode_volume(&npy_bytes(&volume)).is_err());
    }

    #[test]
    fn missing_file_is_none() -> Result<()> {
        let dir = tempfile::tempdir()?;
        assert!(load_volume(dir.path().join("missing.npy"))?.is_none());
        Ok(())
    }

    #[test]
    fn corrupt_file_fails() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("0000.npy");
        std::fs::write(&path, b"not a numpy file")?;
        let err = load_volume(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("0000.npy"));
        Ok(())
    }
}
