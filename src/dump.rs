// This software is licensed under a dual license model:
//
// GNU Affero General Public License v3 (AGPLv3): You may use, modify, and
// distribute this software under the terms of the AGPLv3.
//
// Elastic License v2 (ELv2): You may also use, modify, and distribute this
// software under the Elastic License v2, which has specific restrictions.
//
// We welcome any commercial collaboration or support. For inquiries
// regarding the licenses, please contact us at:
// vectorchord-inquiry@tensorchord.ai
//
// Copyright (c) 2025 TensorChord Inc.

use crate::error::DiffError;
use std::io::Write;
use std::path::{Path, PathBuf};
use zerocopy::{FromBytes, Immutable, IntoBytes};

/// Writes raw element buffers into a directory for offline comparison.
#[derive(Debug, Clone)]
pub struct Dumper {
    directory: PathBuf,
}

impl Dumper {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Relative names are taken inside the directory, absolute ones as is.
    pub fn resolve(&self, file_name: impl AsRef<Path>) -> PathBuf {
        self.directory.join(file_name)
    }

    /// Creates or truncates `<directory>/<file_name>`, returning its path.
    pub fn write<T: IntoBytes + Immutable>(
        &self,
        file_name: &str,
        data: &[T],
    ) -> Result<PathBuf, DiffError> {
        std::fs::create_dir_all(&self.directory)?;
        let path = self.resolve(file_name);
        let bytes = data.as_bytes();
        let mut file = std::fs::File::create(&path)?;
        file.write_all(bytes)?;
        file.flush()?;
        log::debug!("dumped {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }
}

pub fn read_elements<T: FromBytes>(path: impl AsRef<Path>) -> Result<Vec<T>, DiffError> {
    let bytes = std::fs::read(path)?;
    let misaligned = || DiffError::Misaligned {
        len: bytes.len(),
        element: std::any::type_name::<T>(),
    };
    let size = size_of::<T>();
    if size == 0 || bytes.len() % size != 0 {
        return Err(misaligned());
    }
    bytes
        .chunks_exact(size)
        .map(|chunk| T::read_from_bytes(chunk).map_err(|_| misaligned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use simd::f16;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join("tensordiff-tests")
            .join(format!("{name}-{}", std::process::id()))
    }

    #[test]
    fn write_then_read() {
        let dumper = Dumper::new(scratch("write_then_read"));
        let x = vec![1.0f32, -2.5, f32::INFINITY];
        let path = dumper.write("x.bin", &x).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 12);
        assert_eq!(read_elements::<f32>(&path).unwrap(), x);
        let h = vec![f16::from_f32(0.5), f16::NEG_INFINITY];
        let path = dumper.write("h.bin", &h).unwrap();
        assert_eq!(read_elements::<f16>(&path).unwrap(), h);
        std::fs::remove_dir_all(dumper.directory()).unwrap();
    }

    #[test]
    fn write_truncates() {
        let dumper = Dumper::new(scratch("write_truncates"));
        dumper.write("x.bin", &[0.0f32; 16]).unwrap();
        let path = dumper.write("x.bin", &[3.0f32]).unwrap();
        assert_eq!(read_elements::<f32>(&path).unwrap(), vec![3.0]);
        std::fs::remove_dir_all(dumper.directory()).unwrap();
    }

    #[test]
    fn misaligned() {
        let dumper = Dumper::new(scratch("misaligned"));
        let path = dumper.write("x.bin", &[0u8; 6]).unwrap();
        let err = read_elements::<f32>(&path).unwrap_err();
        assert!(matches!(err, DiffError::Misaligned { len: 6, .. }), "{err}");
        assert_eq!(read_elements::<f16>(&path).unwrap().len(), 3);
        std::fs::remove_dir_all(dumper.directory()).unwrap();
    }

    #[test]
    fn resolve() {
        let dumper = Dumper::new("/tmp/dumps");
        assert_eq!(dumper.resolve("x.bin"), PathBuf::from("/tmp/dumps/x.bin"));
        assert_eq!(dumper.resolve("/data/x.bin"), PathBuf::from("/data/x.bin"));
    }

    #[test]
    fn missing_file() {
        let err = read_elements::<f32>(scratch("missing_file").join("none.bin")).unwrap_err();
        assert!(matches!(err, DiffError::Io(_)), "{err}");
    }
}
