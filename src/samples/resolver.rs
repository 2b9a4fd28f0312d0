// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::buffer::PcmBuffer;
use super::decode::{decode_file, SampleSourceError};

/// Supplies decoded audio for a resource name.
pub trait Resolver: fmt::Display + Send + Sync {
    /// Resolves the named resource. `Ok(None)` means the resource doesn't exist,
    /// an error means it exists but couldn't be decoded.
    fn resolve(&self, resource_name: &str) -> Result<Option<PcmBuffer>, SampleSourceError>;
}

/// Resolves resources to `<name>.wav` files in a kit directory.
pub struct DirectoryResolver {
    /// The kit directory.
    root: PathBuf,
    /// The sample rate all buffers are converted to.
    target_sample_rate: u32,
}

const EXTENSION: &str = "wav";

impl DirectoryResolver {
    /// Creates a resolver for the given directory.
    pub fn new(root: &Path, target_sample_rate: u32) -> DirectoryResolver {
        DirectoryResolver {
            root: root.to_path_buf(),
            target_sample_rate,
        }
    }

    /// The path a resource name resolves to.
    pub fn path_for(&self, resource_name: &str) -> PathBuf {
        self.root.join(format!("{}.{}", resource_name, EXTENSION))
    }
}

impl Resolver for DirectoryResolver {
    fn resolve(&self, resource_name: &str) -> Result<Option<PcmBuffer>, SampleSourceError> {
        let path = self.path_for(resource_name);
        if !path.is_file() {
            debug!(path = ?path, "Sample file not found");
            return Ok(None);
        }

        let buffer = decode_file(&path)?;
        if buffer.sample_rate() != self.target_sample_rate {
            debug!(
                path = ?path,
                source_rate = buffer.sample_rate(),
                target_rate = self.target_sample_rate,
                "Resampling sample"
            );
        }
        Ok(Some(buffer.resampled(self.target_sample_rate)))
    }
}

impl fmt::Display for DirectoryResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} Hz)", self.root.display(), self.target_sample_rate)
    }
}

#[cfg(test)]
pub mod test {
    use std::collections::HashMap;
    use std::fmt;

    use super::{PcmBuffer, Resolver, SampleSourceError};

    /// An in-memory resolver. Names mapped to `None` fail to decode.
    #[derive(Default)]
    pub struct MapResolver {
        resources: HashMap<String, Option<PcmBuffer>>,
    }

    impl MapResolver {
        /// A resolver that has a short click for every pad on the instrument.
        pub fn full_kit() -> MapResolver {
            let mut resolver = MapResolver::default();
            for pad in crate::notes::PadIndex::all() {
                resolver.insert(&crate::notes::resource_name(pad), click());
            }
            resolver
        }

        pub fn insert(&mut self, name: &str, buffer: PcmBuffer) {
            self.resources.insert(name.to_string(), Some(buffer));
        }

        pub fn insert_corrupt(&mut self, name: &str) {
            self.resources.insert(name.to_string(), None);
        }

        pub fn remove(&mut self, name: &str) {
            self.resources.remove(name);
        }
    }

    /// A tiny mono buffer.
    pub fn click() -> PcmBuffer {
        PcmBuffer::new(vec![1.0, 0.5, 0.25, 0.125], 1, 44100)
    }

    impl Resolver for MapResolver {
        fn resolve(&self, resource_name: &str) -> Result<Option<PcmBuffer>, SampleSourceError> {
            match self.resources.get(resource_name) {
                None => Ok(None),
                Some(Some(buffer)) => Ok(Some(buffer.clone())),
                Some(None) => Err(SampleSourceError::SampleConversionFailed(
                    resource_name.to_string(),
                )),
            }
        }
    }

    impl fmt::Display for MapResolver {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "in-memory ({} resources)", self.resources.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::write_wav;

    #[test]
    fn test_directory_resolver_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = DirectoryResolver::new(dir.path(), 44100);
        assert!(resolver.resolve("KICKC2").unwrap().is_none());
    }

    #[test]
    fn test_directory_resolver_decodes_and_resamples() {
        let dir = tempfile::tempdir().unwrap();
        write_wav(&dir.path().join("KICKC2.wav"), &[vec![0.1f32; 480]], 48000).unwrap();

        let resolver = DirectoryResolver::new(dir.path(), 44100);
        let buffer = resolver.resolve("KICKC2").unwrap().unwrap();
        assert_eq!(buffer.sample_rate(), 44100);
        assert_eq!(buffer.frames(), 441);
    }

    #[test]
    fn test_directory_resolver_corrupt_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("SNAREC#2.wav"), b"junk").unwrap();

        let resolver = DirectoryResolver::new(dir.path(), 44100);
        assert!(resolver.resolve("SNAREC#2").is_err());
    }

    #[test]
    fn test_path_for_uses_wav_extension() {
        let resolver = DirectoryResolver::new(Path::new("/kits/acoustic"), 44100);
        assert_eq!(
            resolver.path_for("TOM ID#2"),
            PathBuf::from("/kits/acoustic/TOM ID#2.wav")
        );
    }
}
