mod catalog;

pub use catalog::CanonicalCatalog;

use crate::error::{GameError, GameResult};
use crate::types::{Verse, VerseLocator, VerseSelection};
use async_trait::async_trait;
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;

pub const SURAH_COUNT: u16 = 114;
pub const JUZ_COUNT: u8 = 30;

/// Content-lookup collaborator. The game core only needs locator domains,
/// per-verse metadata, and audio URL derivation; where the verses actually
/// live is this trait's problem.
#[async_trait]
pub trait VerseStore: Send + Sync {
    /// All locators in surahs `start..=end`, canonical order.
    async fn locators_in_surah_range(&self, start: u16, end: u16) -> Vec<VerseLocator>;

    /// All locators in the given juz, canonical order.
    async fn locators_in_juz(&self, juz: u8) -> Vec<VerseLocator>;

    /// Verse metadata, or `None` for an address that does not exist.
    async fn lookup(&self, locator: VerseLocator) -> Option<Verse>;

    /// Number of verses in a surah, or `None` for an invalid surah number.
    async fn surah_len(&self, surah: u16) -> Option<u16>;

    /// Streaming audio URL for a verse, optionally for a specific reciter.
    fn audio_url(&self, locator: VerseLocator, reciter: Option<&str>) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Validate a selection domain at session creation time.
pub fn validate_selection(selection: &VerseSelection) -> GameResult<()> {
    match *selection {
        VerseSelection::SurahRange { start, end } => {
            if start < 1 || end > SURAH_COUNT || start > end {
                return Err(GameError::InvalidConfig(format!(
                    "surah range {}-{} is not within 1-{} or start > end",
                    start, end, SURAH_COUNT
                )));
            }
            Ok(())
        }
        VerseSelection::Juz { number } => {
            if number < 1 || number > JUZ_COUNT {
                return Err(GameError::InvalidConfig(format!(
                    "juz {} is not within 1-{}",
                    number, JUZ_COUNT
                )));
            }
            Ok(())
        }
    }
}

/// Picks not-yet-used verses for a session and resolves sequential neighbors.
#[derive(Clone)]
pub struct VerseSequencer {
    store: Arc<dyn VerseStore>,
}

impl VerseSequencer {
    pub fn new(store: Arc<dyn VerseStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn VerseStore> {
        &self.store
    }

    /// Select the next verse uniformly at random from the selection domain,
    /// excluding locators already used in this session.
    pub async fn next_verse(
        &self,
        selection: &VerseSelection,
        used: &HashSet<VerseLocator>,
    ) -> GameResult<Verse> {
        let domain = match *selection {
            VerseSelection::SurahRange { start, end } => {
                self.store.locators_in_surah_range(start, end).await
            }
            VerseSelection::Juz { number } => self.store.locators_in_juz(number).await,
        };

        let available: Vec<VerseLocator> = domain
            .into_iter()
            .filter(|loc| !used.contains(loc))
            .collect();

        if available.is_empty() {
            tracing::warn!(
                "No verses left in {:?} excluding {} used locators",
                selection,
                used.len()
            );
            return Err(GameError::Exhausted);
        }

        let pick = available[rand::rng().random_range(0..available.len())];
        self.store
            .lookup(pick)
            .await
            .ok_or_else(|| GameError::NotFound("Verse", pick.to_string()))
    }

    /// The verse immediately before/after `locator` in canonical order
    /// (surah ascending, then ayah ascending). Crossing a surah boundary is
    /// well-defined; `None` only at the absolute start (1:1) or end.
    pub async fn neighbor(&self, locator: VerseLocator, direction: Direction) -> Option<Verse> {
        let target = match direction {
            Direction::Forward => {
                let len = self.store.surah_len(locator.surah).await?;
                if locator.ayah < len {
                    VerseLocator::new(locator.surah, locator.ayah + 1)
                } else if locator.surah < SURAH_COUNT {
                    VerseLocator::new(locator.surah + 1, 1)
                } else {
                    return None;
                }
            }
            Direction::Backward => {
                if locator.ayah > 1 {
                    VerseLocator::new(locator.surah, locator.ayah - 1)
                } else if locator.surah > 1 {
                    let prev_len = self.store.surah_len(locator.surah - 1).await?;
                    VerseLocator::new(locator.surah - 1, prev_len)
                } else {
                    return None;
                }
            }
        };

        self.store.lookup(target).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequencer() -> VerseSequencer {
        VerseSequencer::new(Arc::new(CanonicalCatalog::new()))
    }

    #[tokio::test]
    async fn next_verse_never_repeats_until_exhausted() {
        let seq = sequencer();
        // Surah 108 has exactly 3 verses
        let selection = VerseSelection::SurahRange { start: 108, end: 108 };
        let mut used = HashSet::new();

        for _ in 0..3 {
            let verse = seq.next_verse(&selection, &used).await.unwrap();
            assert!(!used.contains(&verse.locator));
            assert_eq!(verse.locator.surah, 108);
            used.insert(verse.locator);
        }

        let result = seq.next_verse(&selection, &used).await;
        assert!(matches!(result, Err(GameError::Exhausted)));
    }

    #[tokio::test]
    async fn neighbor_crosses_surah_boundaries() {
        let seq = sequencer();

        // Last verse of surah 113 -> first verse of surah 114
        let next = seq
            .neighbor(VerseLocator::new(113, 5), Direction::Forward)
            .await
            .unwrap();
        assert_eq!(next.locator, VerseLocator::new(114, 1));

        // First verse of surah 2 -> last verse of surah 1
        let prev = seq
            .neighbor(VerseLocator::new(2, 1), Direction::Backward)
            .await
            .unwrap();
        assert_eq!(prev.locator, VerseLocator::new(1, 7));
    }

    #[tokio::test]
    async fn neighbor_is_none_at_absolute_bounds() {
        let seq = sequencer();

        let before_start = seq
            .neighbor(VerseLocator::new(1, 1), Direction::Backward)
            .await;
        assert!(before_start.is_none());

        // 114:6 is the last verse of the canonical ordering
        let after_end = seq
            .neighbor(VerseLocator::new(114, 6), Direction::Forward)
            .await;
        assert!(after_end.is_none());
    }

    #[tokio::test]
    async fn neighbor_within_a_surah() {
        let seq = sequencer();
        let next = seq
            .neighbor(VerseLocator::new(2, 10), Direction::Forward)
            .await
            .unwrap();
        assert_eq!(next.locator, VerseLocator::new(2, 11));
    }

    #[test]
    fn selection_validation() {
        assert!(validate_selection(&VerseSelection::SurahRange { start: 1, end: 114 }).is_ok());
        assert!(validate_selection(&VerseSelection::SurahRange { start: 5, end: 3 }).is_err());
        assert!(validate_selection(&VerseSelection::SurahRange { start: 0, end: 3 }).is_err());
        assert!(validate_selection(&VerseSelection::SurahRange { start: 1, end: 115 }).is_err());
        assert!(validate_selection(&VerseSelection::Juz { number: 30 }).is_ok());
        assert!(validate_selection(&VerseSelection::Juz { number: 0 }).is_err());
        assert!(validate_selection(&VerseSelection::Juz { number: 31 }).is_err());
    }
}
