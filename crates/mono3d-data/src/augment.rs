use mono3d_imgproc::enhance::ColorJitterFactors;
use rand::{seq::index, Rng};

use crate::config::AugmentConfig;

/// The camera a sample is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// Left color camera (`image_2`, `P2`).
    #[default]
    Left,
    /// Right color camera (`image_3`, `P3`).
    Right,
}

/// Shift and scale of the virtual source window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Jitter {
    /// Center shift as a fraction of the image width and height.
    pub shift: [f32; 2],
    /// Factor applied to the window size.
    pub scale: f32,
}

/// Mosaic partner candidates and the split position.
#[derive(Debug, Clone, PartialEq)]
pub struct MosaicPlan {
    /// Partner frame indices, tried in order until one matches the primary resolution.
    pub candidates: Vec<usize>,
    /// Fraction of the width taken by the primary image.
    pub split_ratio: f32,
}

/// Every random decision of one sample, drawn up front.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AugmentationPlan {
    /// The active camera.
    pub view: View,
    /// Mirror the image and calibration horizontally.
    pub flip: bool,
    /// Shift/scale jitter of the source window.
    pub jitter: Option<Jitter>,
    /// Two-image composition.
    pub mosaic: Option<MosaicPlan>,
    /// Seed of the additive Gaussian noise.
    pub noise_seed: Option<u64>,
    /// Color jitter factors.
    pub color: Option<ColorJitterFactors>,
}

/// Draws uniformly from `lo, lo + step, ..` up to `hi`.
fn discrete_uniform(rng: &mut impl Rng, lo: f32, hi: f32, step: f32) -> f32 {
    let n = ((hi - lo) / step).round().max(0.0) as u32;
    lo + rng.random_range(0..=n) as f32 * step
}

impl AugmentationPlan {
    /// The plan that leaves the sample untouched.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Draws a plan.
    ///
    /// The right view disables flipping; flipping or jitter disable the mosaic.
    ///
    /// # Arguments
    ///
    /// * `config` - The augmentation parameters.
    /// * `num_frames` - Number of frames mosaic partners are drawn from.
    /// * `rng` - The random source.
    pub fn draw(config: &AugmentConfig, num_frames: usize, rng: &mut impl Rng) -> Self {
        let view = if rng.random::<f32>() < config.right_view_prob {
            View::Right
        } else {
            View::Left
        };

        let flip = view == View::Left && rng.random::<f32>() < config.flip_prob;

        let jitter = if rng.random::<f32>() < config.jitter_prob {
            let step = config.jitter_step;
            let shift = [
                discrete_uniform(rng, -config.shift, config.shift, step),
                discrete_uniform(rng, -config.shift, config.shift, step),
            ];
            let scale = discrete_uniform(rng, 1.0 - config.scale, 1.0 + config.scale, step);
            Some(Jitter { shift, scale })
        } else {
            None
        };

        let mosaic = if !flip
            && jitter.is_none()
            && num_frames > 0
            && rng.random::<f32>() < config.mosaic_prob
        {
            // partners are distinct so a retry never re-reads a mismatched frame
            let attempts = config.mosaic_max_attempts.min(num_frames);
            let candidates = index::sample(rng, num_frames, attempts).into_vec();
            let (lo, hi) = config.mosaic_split_range;
            let split_ratio = if hi > lo { rng.random_range(lo..hi) } else { lo };
            Some(MosaicPlan {
                candidates,
                split_ratio,
            })
        } else {
            None
        };

        let noise_seed = if rng.random::<f32>() < config.noise_prob {
            Some(rng.random::<u64>())
        } else {
            None
        };

        let color = if rng.random::<f32>() < config.color_prob {
            let ranges = &config.color;
            Some(ColorJitterFactors {
                saturation: discrete_uniform(rng, ranges.saturation.0, ranges.saturation.1, 0.1),
                brightness: discrete_uniform(rng, ranges.brightness.0, ranges.brightness.1, 0.1),
                contrast: discrete_uniform(rng, ranges.contrast.0, ranges.contrast.1, 0.1),
                sharpness: discrete_uniform(rng, ranges.sharpness.0, ranges.sharpness.1, 0.1),
            })
        } else {
            None
        };

        Self {
            view,
            flip,
            jitter,
            mosaic,
            noise_seed,
            color,
        }
    }

    /// Whether the geometry was distorted by jitter.
    pub fn is_jittered(&self) -> bool {
        self.jitter.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn always() -> AugmentConfig {
        AugmentConfig {
            flip_prob: 1.0,
            jitter_prob: 1.0,
            right_view_prob: 0.0,
            mosaic_prob: 1.0,
            noise_prob: 1.0,
            color_prob: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn disabled_config_draws_identity() {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..100 {
            let plan = AugmentationPlan::draw(&AugmentConfig::disabled(), 10, &mut rng);
            assert_eq!(plan, AugmentationPlan::identity());
        }
    }

    #[test]
    fn right_view_never_flips() {
        let config = AugmentConfig {
            right_view_prob: 1.0,
            ..always()
        };
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let plan = AugmentationPlan::draw(&config, 10, &mut rng);
            assert_eq!(plan.view, View::Right);
            assert!(!plan.flip);
        }
    }

    #[test]
    fn flip_or_jitter_disable_mosaic() {
        let mut rng = StdRng::seed_from_u64(2);
        let plan = AugmentationPlan::draw(&always(), 10, &mut rng);
        assert!(plan.flip);
        assert!(plan.is_jittered());
        assert!(plan.mosaic.is_none());

        let config = AugmentConfig {
            flip_prob: 0.0,
            jitter_prob: 0.0,
            ..always()
        };
        for _ in 0..100 {
            let plan = AugmentationPlan::draw(&config, 10, &mut rng);
            let mosaic = plan.mosaic.as_ref().expect("mosaic planned");
            assert_eq!(mosaic.candidates.len(), config.mosaic_max_attempts);
            assert!(mosaic.candidates.iter().all(|&i| i < 10));
            assert!((0.3..0.7).contains(&mosaic.split_ratio));
        }
    }

    #[test]
    fn mosaic_candidates_are_distinct() {
        let config = AugmentConfig {
            flip_prob: 0.0,
            jitter_prob: 0.0,
            ..always()
        };
        let mut rng = StdRng::seed_from_u64(6);
        for _ in 0..100 {
            let plan = AugmentationPlan::draw(&config, 4, &mut rng);
            let mut candidates = plan.mosaic.expect("mosaic planned").candidates;
            assert_eq!(candidates.len(), 3);
            candidates.sort_unstable();
            candidates.dedup();
            assert_eq!(candidates.len(), 3);
        }

        // fewer frames than attempts
        let plan = AugmentationPlan::draw(&config, 2, &mut rng);
        let mut candidates = plan.mosaic.expect("mosaic planned").candidates;
        candidates.sort_unstable();
        assert_eq!(candidates, vec![0, 1]);
    }

    #[test]
    fn no_mosaic_without_frames() {
        let config = AugmentConfig {
            flip_prob: 0.0,
            jitter_prob: 0.0,
            ..always()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let plan = AugmentationPlan::draw(&config, 0, &mut rng);
        assert!(plan.mosaic.is_none());
    }

    #[test]
    fn jitter_on_discrete_grid() {
        let mut rng = StdRng::seed_from_u64(4);
        let config = always();
        for _ in 0..200 {
            let jitter = AugmentationPlan::draw(&config, 1, &mut rng)
                .jitter
                .expect("jitter planned");
            for s in jitter.shift {
                assert!((-0.2 - 1e-5..=0.2 + 1e-5).contains(&s));
                let k = (s + 0.2) / 0.1;
                assert!((k - k.round()).abs() < 1e-4);
            }
            assert!((0.6 - 1e-5..=1.4 + 1e-5).contains(&jitter.scale));
        }
    }

    #[test]
    fn color_factors_in_range() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let f = AugmentationPlan::draw(&always(), 1, &mut rng)
                .color
                .expect("color planned");
            assert!((0.0..=3.0 + 1e-5).contains(&f.saturation));
            assert!((1.0..=2.0 + 1e-5).contains(&f.brightness));
            assert!((1.0..=2.0 + 1e-5).contains(&f.contrast));
            assert!((0.0..=3.0 + 1e-5).contains(&f.sharpness));
        }
    }

    #[test]
    fn same_seed_same_plan() {
        let config = AugmentConfig {
            mosaic_prob: 0.5,
            noise_prob: 0.5,
            ..Default::default()
        };
        let a = AugmentationPlan::draw(&config, 50, &mut StdRng::seed_from_u64(42));
        let b = AugmentationPlan::draw(&config, 50, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
