//! Running background model via weighted accumulation.
//!
//! The accumulator keeps the static scene as an `f32` image so repeated
//! blending does not drift the way integer pixels would. The delta for a
//! frame is always taken against the accumulator as it was *before* that
//! frame is blended in.

use image::GrayImage;

/// Exponentially-weighted running average of the scene.
pub struct BackgroundModel {
    accumulator: Vec<f32>,
    width: u32,
    height: u32,
    alpha: f32,
}

impl BackgroundModel {
    /// Initializes the model from the first frame of a run.
    ///
    /// Called exactly once per capture run; subsequent frames go through
    /// [`BackgroundModel::update`].
    pub fn new(first: &GrayImage, alpha: f32) -> Self {
        Self {
            accumulator: first.as_raw().iter().map(|&p| f32::from(p)).collect(),
            width: first.width(),
            height: first.height(),
            alpha,
        }
    }

    /// Computes the per-pixel absolute delta against the current
    /// accumulator, then blends the frame into the accumulator in place.
    pub fn update(&mut self, frame: &GrayImage) -> GrayImage {
        debug_assert_eq!(frame.width(), self.width);
        debug_assert_eq!(frame.height(), self.height);

        let mut delta = vec![0u8; self.accumulator.len()];
        for (i, &pixel) in frame.as_raw().iter().enumerate() {
            let value = f32::from(pixel);
            let background = self.accumulator[i];
            delta[i] = (value - background).abs().round().min(255.0) as u8;
            self.accumulator[i] = self.alpha * value + (1.0 - self.alpha) * background;
        }

        // The buffer length matches width * height by construction.
        GrayImage::from_raw(self.width, self.height, delta)
            .unwrap_or_else(|| GrayImage::new(self.width, self.height))
    }

    /// Returns the accumulator contents.
    pub fn accumulator(&self) -> &[f32] {
        &self.accumulator
    }

    /// Returns the modelled scene dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the accumulation weight.
    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

impl std::fmt::Debug for BackgroundModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundModel")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("alpha", &self.alpha)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn gray(pixels: Vec<u8>, side: u32) -> GrayImage {
        GrayImage::from_raw(side, side, pixels).unwrap()
    }

    #[test]
    fn test_same_frame_round_trip() {
        let frame = gray(vec![100u8; 64], 8);
        let mut model = BackgroundModel::new(&frame, 0.5);

        let delta = model.update(&frame);

        assert!(delta.as_raw().iter().all(|&d| d == 0));
        assert!(model.accumulator().iter().all(|&a| (a - 100.0).abs() < 1e-6));
    }

    #[test]
    fn test_delta_uses_pre_update_accumulator() {
        let first = gray(vec![100u8; 64], 8);
        let second = gray(vec![150u8; 64], 8);
        let mut model = BackgroundModel::new(&first, 0.5);

        let delta = model.update(&second);

        // Delta against the accumulator before blending: |150 - 100|.
        assert!(delta.as_raw().iter().all(|&d| d == 50));
        // Accumulator after blending: 0.5 * 150 + 0.5 * 100.
        assert!(model.accumulator().iter().all(|&a| (a - 125.0).abs() < 1e-4));
    }

    #[test]
    fn test_accumulator_converges_to_static_scene() {
        let first = gray(vec![0u8; 64], 8);
        let scene = gray(vec![200u8; 64], 8);
        let mut model = BackgroundModel::new(&first, 0.5);

        for _ in 0..20 {
            model.update(&scene);
        }

        assert!(model.accumulator().iter().all(|&a| (a - 200.0).abs() < 0.01));
    }

    proptest! {
        #[test]
        fn accumulator_follows_weighted_average(
            first in proptest::collection::vec(any::<u8>(), 64),
            next in proptest::collection::vec(any::<u8>(), 64),
        ) {
            let alpha = 0.5f32;
            let mut model = BackgroundModel::new(&gray(first.clone(), 8), alpha);
            model.update(&gray(next.clone(), 8));

            for i in 0..64 {
                let expected = alpha * f32::from(next[i]) + (1.0 - alpha) * f32::from(first[i]);
                prop_assert!((model.accumulator()[i] - expected).abs() < 1e-3);
            }
        }
    }
}
