use std::path::Path;

use rand::Rng;
use tracing::{info, trace, warn};

use crate::error::Result;
use super::sample_loader;

/// Instrument family a sample is filed under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Kick,
    Snare,
    Roll,
    Hihat,
    Ride,
    Crash,
    Tom,
    Other,
}

impl Category {
    pub const COUNT: usize = 8;

    // filename-substring table; first match wins, checked in this order
    const FILENAME_PATTERNS: [(Category, &'static [&'static str]); 7] = [
        (Category::Kick, &["1_Kick", "0_Trummer"]),
        (Category::Snare, &["2_SN"]),
        (Category::Roll, &["3_Roll"]),
        (Category::Hihat, &["6_HH"]),
        (Category::Ride, &["4_Ride"]),
        (Category::Crash, &["5_Crash"]),
        (Category::Tom, &["6_TM"]),
    ];

    pub fn classify(file_name: &str) -> Category {
        Self::FILENAME_PATTERNS
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|p| file_name.contains(p)))
            .map(|(category, _)| *category)
            .unwrap_or(Category::Other)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// An immutable, prepared drum hit.
#[derive(Clone, Debug)]
pub struct DrumSample {
    pub name: String,
    pub audio: Vec<f32>,
    pub category: Category,
}

/// Owns every loaded sample in one arena; the per-category lists only hold
/// indices into it, so nothing is ever stored twice.
#[derive(Clone, Debug, Default)]
pub struct SampleLibrary {
    samples: Vec<DrumSample>,
    by_category: [Vec<usize>; Category::COUNT],
}

impl SampleLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every WAV in `dir`. Files that fail to decode are logged and
    /// skipped; only an unreadable directory is an error.
    pub fn load(dir: &Path, sample_rate: u32) -> Result<Self> {
        let mut library = Self::new();
        for path in sample_loader::index_wav_in_dir(dir)? {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            match sample_loader::load(&path, sample_rate) {
                Ok(audio) => {
                    let category = Category::classify(&name);
                    library.insert(name, audio, category);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping sample"),
            }
        }
        info!(
            samples = library.len(),
            categories = library.category_count(),
            dir = %dir.display(),
            "sample library loaded"
        );
        Ok(library)
    }

    pub fn insert(&mut self, name: impl Into<String>, audio: Vec<f32>, category: Category) -> usize {
        let index = self.samples.len();
        self.samples.push(DrumSample {
            name: name.into(),
            audio,
            category,
        });
        self.by_category[category.index()].push(index);
        index
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of categories holding at least one sample.
    pub fn category_count(&self) -> usize {
        self.by_category.iter().filter(|c| !c.is_empty()).count()
    }

    pub fn samples(&self) -> &[DrumSample] {
        &self.samples
    }

    pub fn category(&self, category: Category) -> impl Iterator<Item = &DrumSample> {
        self.by_category[category.index()]
            .iter()
            .map(|&i| &self.samples[i])
    }

    /// Random pick within `category`. A non-empty `variation` narrows the
    /// choice to names containing it; when nothing matches, the whole
    /// category is used instead so a missing variation never goes silent.
    pub fn get<R: Rng + ?Sized>(
        &self,
        category: Category,
        variation: &str,
        rng: &mut R,
    ) -> Option<&DrumSample> {
        let candidates = &self.by_category[category.index()];
        if candidates.is_empty() {
            return None;
        }

        if !variation.is_empty() {
            let matching = || {
                candidates
                    .iter()
                    .map(|&i| &self.samples[i])
                    .filter(|s| s.name.contains(variation))
            };
            let count = matching().count();
            if count > 0 {
                let pick = rng.random_range(0..count);
                if let Some(sample) = matching().nth(pick) {
                    trace!(?category, variation, name = %sample.name, "sample pick");
                    return Some(sample);
                }
            }
        }

        let sample = &self.samples[candidates[rng.random_range(0..candidates.len())]];
        trace!(?category, name = %sample.name, "sample pick (all)");
        Some(sample)
    }
}
