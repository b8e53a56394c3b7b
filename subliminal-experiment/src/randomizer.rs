//! Random draws for a trial: words, waits and mask layouts.

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use subliminal_core::{MaskLayout, MaskTile, Rgba, Vec3};

use crate::config::MaskGeometry;

/// Target word plus the shuffled three-way choice set shown at guess time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordSet {
    pub target: String,
    pub choices: [String; 3],
}

pub struct TrialRandomizer<R: Rng> {
    rng: R,
}

impl<R: Rng> TrialRandomizer<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Picks a target and two distinct decoys, then shuffles the three.
    /// `None` when the vocabulary has fewer than three distinct words.
    pub fn pick_words(&mut self, vocabulary: &[String]) -> Option<WordSet> {
        let mut distinct: Vec<&String> = Vec::with_capacity(vocabulary.len());
        for word in vocabulary {
            if !distinct.contains(&word) {
                distinct.push(word);
            }
        }
        if distinct.len() < 3 {
            return None;
        }

        let target = (*distinct.choose(&mut self.rng)?).clone();
        let remainder: Vec<&String> = distinct.into_iter().filter(|w| **w != target).collect();
        let mut choices: Vec<String> = remainder
            .choose_multiple(&mut self.rng, 2)
            .map(|w| (*w).clone())
            .collect();
        choices.push(target.clone());
        choices.shuffle(&mut self.rng);

        let choices: [String; 3] = choices.try_into().ok()?;
        Some(WordSet { target, choices })
    }

    /// Uniform draw from the inclusive range.
    pub fn draw_wait_ms(&mut self, range: (u64, u64)) -> u64 {
        let (lo, hi) = (range.0.min(range.1), range.0.max(range.1));
        self.rng.random_range(lo..=hi)
    }

    /// Fresh Mondrian layout; every tile lies entirely inside the panel.
    pub fn mask_layout(&mut self, geometry: &MaskGeometry) -> MaskLayout {
        let pw = geometry.panel_width;
        let ph = geometry.panel_height;
        let tiles = (0..geometry.tile_count)
            .map(|_| {
                let width = self.uniform(
                    pw * geometry.tile_width_fraction.0,
                    pw * geometry.tile_width_fraction.1,
                );
                let height = self.uniform(
                    ph * geometry.tile_height_fraction.0,
                    ph * geometry.tile_height_fraction.1,
                );
                let x = self.uniform(0.0, pw - width);
                let y = self.uniform(0.0, ph - height);
                let color = geometry
                    .palette
                    .choose(&mut self.rng)
                    .copied()
                    .unwrap_or(Rgba::WHITE);
                MaskTile {
                    offset: Vec3::new(x, y, 0.0),
                    width,
                    height,
                    color,
                }
            })
            .collect();
        MaskLayout { tiles }
    }

    // half-open ranges panic when empty, so interpolate instead
    fn uniform(&mut self, min: f32, max: f32) -> f32 {
        min + self.rng.random::<f32>() * (max - min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExperimentConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn randomizer(seed: u64) -> TrialRandomizer<StdRng> {
        TrialRandomizer::new(StdRng::seed_from_u64(seed))
    }

    #[test]
    fn choices_contain_target_and_two_distinct_decoys() {
        let vocab = ExperimentConfig::default().vocabulary;
        for seed in 0..200 {
            let words = randomizer(seed).pick_words(&vocab).unwrap();
            assert!(words.choices.contains(&words.target));
            let mut sorted = words.choices.to_vec();
            sorted.sort();
            sorted.dedup();
            assert_eq!(sorted.len(), 3, "seed {seed}: {:?}", words.choices);
            assert!(words.choices.iter().all(|w| vocab.contains(w)));
        }
    }

    #[test]
    fn target_position_varies() {
        let vocab = ExperimentConfig::default().vocabulary;
        let mut seen = [false; 3];
        for seed in 0..200 {
            let words = randomizer(seed).pick_words(&vocab).unwrap();
            let idx = words.choices.iter().position(|w| *w == words.target).unwrap();
            seen[idx] = true;
        }
        assert_eq!(seen, [true; 3]);
    }

    #[test]
    fn duplicates_never_become_decoys() {
        let vocab: Vec<String> = ["A", "A", "A", "B", "C"].iter().map(|s| s.to_string()).collect();
        for seed in 0..50 {
            let words = randomizer(seed).pick_words(&vocab).unwrap();
            let mut sorted = words.choices.to_vec();
            sorted.sort();
            assert_eq!(sorted, vec!["A", "B", "C"]);
        }
    }

    #[test]
    fn too_few_words_yield_none() {
        let vocab: Vec<String> = ["A", "B", "B"].iter().map(|s| s.to_string()).collect();
        assert_eq!(randomizer(1).pick_words(&vocab), None);
    }

    #[test]
    fn wait_stays_in_range() {
        let mut r = randomizer(7);
        for _ in 0..500 {
            let ms = r.draw_wait_ms((4000, 7000));
            assert!((4000..=7000).contains(&ms));
        }
        assert_eq!(r.draw_wait_ms((250, 250)), 250);
    }

    #[test]
    fn mask_tiles_fit_inside_panel() {
        let geometry = MaskGeometry::default();
        let mut r = randomizer(3);
        let layout = r.mask_layout(&geometry);
        assert_eq!(layout.len(), geometry.tile_count);
        for tile in &layout.tiles {
            assert!(tile.width >= geometry.panel_width * 0.08 - 1e-6);
            assert!(tile.width <= geometry.panel_width * 0.35 + 1e-6);
            assert!(tile.height >= geometry.panel_height * 0.2 - 1e-6);
            assert!(tile.height <= geometry.panel_height * 0.45 + 1e-6);
            assert!(tile.offset.x >= 0.0);
            assert!(tile.offset.y >= 0.0);
            assert!(tile.offset.x + tile.width <= geometry.panel_width + 1e-5);
            assert!(tile.offset.y + tile.height <= geometry.panel_height + 1e-5);
            assert!(geometry.palette.contains(&tile.color));
        }
    }

    #[test]
    fn layouts_differ_between_draws() {
        let geometry = MaskGeometry::default();
        let mut r = randomizer(11);
        let a = r.mask_layout(&geometry);
        let b = r.mask_layout(&geometry);
        assert_ne!(a, b);
    }

    #[test]
    fn full_width_tiles_do_not_panic() {
        let geometry = MaskGeometry {
            tile_width_fraction: (1.0, 1.0),
            tile_height_fraction: (1.0, 1.0),
            ..MaskGeometry::default()
        };
        let layout = randomizer(5).mask_layout(&geometry);
        assert!(layout.tiles.iter().all(|t| t.offset.x == 0.0 && t.offset.y == 0.0));
    }
}
