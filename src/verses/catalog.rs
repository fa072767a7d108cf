use super::{VerseStore, JUZ_COUNT, SURAH_COUNT};
use crate::types::{Verse, VerseLocator};
use async_trait::async_trait;

/// Verse count per surah, canonical (Kufan) numbering, index 0 = surah 1.
const AYAH_COUNTS: [u16; 114] = [
    7, 286, 200, 176, 120, 165, 206, 75, 129, 109, // 1-10
    123, 111, 43, 52, 99, 128, 111, 110, 98, 135, // 11-20
    112, 78, 118, 64, 77, 227, 93, 88, 69, 60, // 21-30
    34, 30, 73, 54, 45, 83, 182, 88, 75, 85, // 31-40
    54, 53, 89, 59, 37, 35, 38, 29, 18, 45, // 41-50
    60, 49, 62, 55, 78, 96, 29, 22, 24, 13, // 51-60
    14, 11, 11, 18, 12, 12, 30, 52, 52, 44, // 61-70
    28, 28, 20, 56, 40, 31, 50, 40, 46, 42, // 71-80
    29, 19, 36, 25, 22, 17, 19, 26, 30, 20, // 81-90
    15, 21, 11, 8, 8, 19, 5, 8, 8, 11, // 91-100
    11, 8, 3, 9, 5, 4, 7, 3, 6, 3, // 101-110
    5, 4, 5, 6, // 111-114
];

/// First verse of each juz, index 0 = juz 1. A juz runs from its start up to
/// (but not including) the next juz's start; juz 30 runs to 114:6.
const JUZ_STARTS: [(u16, u16); 30] = [
    (1, 1),
    (2, 142),
    (2, 253),
    (3, 93),
    (4, 24),
    (4, 148),
    (5, 82),
    (6, 111),
    (7, 88),
    (8, 41),
    (9, 93),
    (11, 6),
    (12, 53),
    (15, 1),
    (17, 1),
    (18, 75),
    (21, 1),
    (23, 1),
    (25, 21),
    (27, 56),
    (29, 46),
    (33, 31),
    (36, 28),
    (39, 32),
    (41, 47),
    (46, 1),
    (51, 31),
    (58, 1),
    (67, 1),
    (78, 1),
];

const DEFAULT_RECITER: &str = "Alafasy_64kbps";

/// In-memory verse store carrying the canonical locator domain and audio URL
/// derivation. Text and translation metadata are not bundled; a store backed
/// by an actual corpus can fill them in through the same trait.
pub struct CanonicalCatalog;

impl CanonicalCatalog {
    pub fn new() -> Self {
        Self
    }

    fn ayah_count(surah: u16) -> Option<u16> {
        if (1..=SURAH_COUNT).contains(&surah) {
            Some(AYAH_COUNTS[surah as usize - 1])
        } else {
            None
        }
    }

    fn exists(locator: VerseLocator) -> bool {
        Self::ayah_count(locator.surah)
            .map(|len| locator.ayah >= 1 && locator.ayah <= len)
            .unwrap_or(false)
    }

    /// The locator immediately after `loc` in canonical order.
    fn successor(loc: VerseLocator) -> Option<VerseLocator> {
        let len = Self::ayah_count(loc.surah)?;
        if loc.ayah < len {
            Some(VerseLocator::new(loc.surah, loc.ayah + 1))
        } else if loc.surah < SURAH_COUNT {
            Some(VerseLocator::new(loc.surah + 1, 1))
        } else {
            None
        }
    }
}

impl Default for CanonicalCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VerseStore for CanonicalCatalog {
    async fn locators_in_surah_range(&self, start: u16, end: u16) -> Vec<VerseLocator> {
        let mut out = Vec::new();
        for surah in start.max(1)..=end.min(SURAH_COUNT) {
            let len = AYAH_COUNTS[surah as usize - 1];
            for ayah in 1..=len {
                out.push(VerseLocator::new(surah, ayah));
            }
        }
        out
    }

    async fn locators_in_juz(&self, juz: u8) -> Vec<VerseLocator> {
        if juz < 1 || juz > JUZ_COUNT {
            return Vec::new();
        }

        let (start_surah, start_ayah) = JUZ_STARTS[juz as usize - 1];
        let stop = if juz < JUZ_COUNT {
            let (s, a) = JUZ_STARTS[juz as usize];
            Some(VerseLocator::new(s, a))
        } else {
            None
        };

        let mut out = Vec::new();
        let mut cursor = Some(VerseLocator::new(start_surah, start_ayah));
        while let Some(loc) = cursor {
            if Some(loc) == stop {
                break;
            }
            out.push(loc);
            cursor = Self::successor(loc);
        }
        out
    }

    async fn lookup(&self, locator: VerseLocator) -> Option<Verse> {
        if !Self::exists(locator) {
            return None;
        }
        Some(Verse {
            locator,
            text: None,
            translation: None,
            surah_name: None,
        })
    }

    async fn surah_len(&self, surah: u16) -> Option<u16> {
        Self::ayah_count(surah)
    }

    fn audio_url(&self, locator: VerseLocator, reciter: Option<&str>) -> String {
        // everyayah.com layout: {reciter}/{SSS}{AAA}.mp3
        format!(
            "https://everyayah.com/data/{}/{:03}{:03}.mp3",
            reciter.unwrap_or(DEFAULT_RECITER),
            locator.surah,
            locator.ayah
        )
    }
}
