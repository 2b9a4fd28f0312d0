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

//! The per-pad sample library.
//!
//! Every pad's sample is loaded into memory once, before the engine accepts
//! any triggers. A pad whose sample can't be loaded is disabled; the failure is
//! recorded and loading carries on with the remaining pads.

use std::fmt;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::buffer::PcmBuffer;
use super::decode::SampleSourceError;
use super::resolver::Resolver;
use crate::notes::{self, PadIndex, PAD_COUNT};

/// Why a pad's sample failed to load.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadErrorReason {
    #[error("resource not found")]
    NotFound,

    #[error("decode failed: {0}")]
    DecodeFailed(String),
}

/// A per-pad load failure. Never fatal to the instrument.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("pad {pad} ({resource}): {reason}")]
pub struct LoadError {
    pub pad: PadIndex,
    pub resource: String,
    pub reason: LoadErrorReason,
}

/// Summary of a load pass.
#[derive(Debug, Clone)]
pub struct LoadReport {
    /// Number of pads with a loaded sample.
    pub loaded: usize,
    /// The failures, ordered by pad.
    pub errors: Vec<LoadError>,
}

impl LoadReport {
    /// True when every pad loaded.
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} pads loaded", self.loaded, PAD_COUNT)?;
        for error in &self.errors {
            write!(f, "\n- {}", error)?;
        }
        Ok(())
    }
}

/// Decoded sample buffers indexed by pad.
pub struct SampleLibrary {
    buffers: Vec<Option<PcmBuffer>>,
    errors: Vec<LoadError>,
}

impl Default for SampleLibrary {
    fn default() -> Self {
        SampleLibrary::new()
    }
}

impl SampleLibrary {
    /// Creates an empty library. Every pad starts out unavailable.
    pub fn new() -> SampleLibrary {
        SampleLibrary {
            buffers: vec![None; PAD_COUNT],
            errors: Vec::new(),
        }
    }

    /// Loads the sample for every pad. Resources are resolved and decoded in
    /// parallel; individual failures are recorded and skipped.
    pub fn load_all(resolver: &dyn Resolver) -> SampleLibrary {
        info!(resolver = %resolver, "Loading pad samples");

        let results: Vec<(PadIndex, String, Result<Option<PcmBuffer>, SampleSourceError>)> =
            PadIndex::all()
                .collect::<Vec<_>>()
                .into_par_iter()
                .map(|pad| {
                    let resource = notes::resource_name(pad);
                    let result = resolver.resolve(&resource);
                    (pad, resource, result)
                })
                .collect();

        let mut library = SampleLibrary::new();
        for (pad, resource, result) in results {
            if let Err(e) = library.record(pad, &resource, result) {
                debug!(pad = e.pad.get(), "Continuing without pad");
            }
        }

        info!(
            loaded = library.loaded_count(),
            failed = library.errors.len(),
            memory_kb = library.memory_usage() / 1024,
            "Pad samples loaded"
        );
        library
    }

    /// Loads a single pad's sample from the named resource.
    pub fn load(
        &mut self,
        resolver: &dyn Resolver,
        pad: PadIndex,
        resource_name: &str,
    ) -> Result<PcmBuffer, LoadError> {
        let result = resolver.resolve(resource_name);
        self.record(pad, resource_name, result)
    }

    fn record(
        &mut self,
        pad: PadIndex,
        resource: &str,
        result: Result<Option<PcmBuffer>, SampleSourceError>,
    ) -> Result<PcmBuffer, LoadError> {
        let reason = match result {
            Ok(Some(buffer)) if !buffer.is_empty() => {
                debug!(
                    pad = pad.get(),
                    resource,
                    duration_ms = buffer.duration().as_millis(),
                    "Sample loaded"
                );
                self.errors.retain(|e| e.pad != pad);
                self.buffers[pad.get()] = Some(buffer.clone());
                return Ok(buffer);
            }
            Ok(Some(_)) => LoadErrorReason::DecodeFailed("no audio frames".to_string()),
            Ok(None) => LoadErrorReason::NotFound,
            Err(e) => LoadErrorReason::DecodeFailed(e.to_string()),
        };

        let error = LoadError {
            pad,
            resource: resource.to_string(),
            reason,
        };
        warn!(pad = pad.get(), error = %error, "Pad disabled");

        self.buffers[pad.get()] = None;
        self.errors.retain(|e| e.pad != pad);
        self.errors.push(error.clone());
        self.errors.sort_by_key(|e| e.pad);
        Err(error)
    }

    /// The sample for the given pad, if it loaded.
    pub fn get(&self, pad: PadIndex) -> Option<&PcmBuffer> {
        self.buffers[pad.get()].as_ref()
    }

    /// True if the pad has a sample and can sound.
    pub fn is_available(&self, pad: PadIndex) -> bool {
        self.buffers[pad.get()].is_some()
    }

    /// Number of pads with a loaded sample.
    pub fn loaded_count(&self) -> usize {
        self.buffers.iter().filter(|b| b.is_some()).count()
    }

    /// The recorded load failures, ordered by pad.
    pub fn errors(&self) -> &[LoadError] {
        &self.errors
    }

    /// Summarizes the library's load state.
    pub fn report(&self) -> LoadReport {
        LoadReport {
            loaded: self.loaded_count(),
            errors: self.errors.clone(),
        }
    }

    /// Iterates over loaded pads and their buffers.
    pub fn iter(&self) -> impl Iterator<Item = (PadIndex, &PcmBuffer)> {
        PadIndex::all().filter_map(|pad| self.get(pad).map(|buffer| (pad, buffer)))
    }

    /// Returns the total memory used by loaded samples.
    pub fn memory_usage(&self) -> usize {
        self.buffers
            .iter()
            .flatten()
            .map(|b| b.memory_size())
            .sum()
    }
}

impl fmt::Debug for SampleLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SampleLibrary")
            .field("loaded", &self.loaded_count())
            .field("failed", &self.errors.len())
            .field("memory_kb", &(self.memory_usage() / 1024))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::resolver::test::click;
    use crate::samples::{DirectoryResolver, MapResolver};
    use crate::testutil::write_wav;

    fn pad(index: usize) -> PadIndex {
        PadIndex::new(index).unwrap()
    }

    #[test]
    fn test_full_kit_loads_every_pad() {
        let library = SampleLibrary::load_all(&MapResolver::full_kit());

        assert_eq!(library.loaded_count(), 16);
        assert!(library.errors().is_empty());
        assert!(library.report().is_complete());
        assert!(PadIndex::all().all(|p| library.is_available(p)));
    }

    #[test]
    fn test_one_missing_resource_disables_one_pad() {
        let mut resolver = MapResolver::full_kit();
        resolver.remove("SNAREC#2");

        let library = SampleLibrary::load_all(&resolver);
        assert_eq!(library.loaded_count(), 15);
        assert!(!library.is_available(pad(1)));
        assert_eq!(
            library.errors(),
            &[LoadError {
                pad: pad(1),
                resource: "SNAREC#2".to_string(),
                reason: LoadErrorReason::NotFound,
            }]
        );
    }

    #[test]
    fn test_decode_failures_are_isolated() {
        let mut resolver = MapResolver::full_kit();
        resolver.insert_corrupt("CRASHF2");
        resolver.insert("TOM IF#2", PcmBuffer::new(Vec::new(), 1, 44100));

        let library = SampleLibrary::load_all(&resolver);
        assert_eq!(library.loaded_count(), 14);
        let failed: Vec<usize> = library.errors().iter().map(|e| e.pad.get()).collect();
        assert_eq!(failed, vec![5, 6]);
        assert!(library
            .errors()
            .iter()
            .all(|e| matches!(e.reason, LoadErrorReason::DecodeFailed(_))));
    }

    #[test]
    fn test_nothing_loaded_is_reported_not_raised() {
        let library = SampleLibrary::load_all(&MapResolver::default());
        let report = library.report();
        assert_eq!(report.loaded, 0);
        assert_eq!(report.errors.len(), 16);
        assert_eq!(library.memory_usage(), 0);
    }

    #[test]
    fn test_single_load_replaces_previous_failure() {
        let mut library = SampleLibrary::new();
        let mut resolver = MapResolver::default();

        assert!(library.load(&resolver, pad(0), "KICKC2").is_err());
        assert_eq!(library.errors().len(), 1);

        resolver.insert("KICKC2", click());
        let buffer = library.load(&resolver, pad(0), "KICKC2").unwrap();
        assert_eq!(buffer.frames(), 4);
        assert!(library.is_available(pad(0)));
        assert!(library.errors().is_empty());
    }

    #[test]
    fn test_load_all_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        for p in PadIndex::all().take(3) {
            let path = dir
                .path()
                .join(format!("{}.wav", crate::notes::resource_name(p)));
            write_wav(&path, &[vec![0.5f32; 64]], 44100).unwrap();
        }

        let library = SampleLibrary::load_all(&DirectoryResolver::new(dir.path(), 44100));
        assert_eq!(library.loaded_count(), 3);
        assert_eq!(library.iter().map(|(p, _)| p.get()).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(library.errors().len(), 13);
    }
}
