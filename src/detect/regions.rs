//! Foreground region extraction from a delta image.
//!
//! Thresholds the delta, dilates the foreground mask to merge nearby
//! pixels and suppress speckle, then labels connected components and
//! keeps those whose area meets the configured minimum.

use image::{GrayImage, Luma};
use imageproc::contrast::{threshold, ThresholdType};
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;
use imageproc::rect::Rect;
use imageproc::region_labelling::{connected_components, Connectivity};
use std::collections::BTreeMap;

/// A connected foreground region detected in a single frame.
///
/// Transient: regions are never retained past the frame they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Number of foreground pixels in the component.
    pub area: u32,
    /// Axis-aligned bounding box of the component.
    pub bounds: Rect,
}

/// Extracts qualifying motion regions from delta images.
#[derive(Debug, Clone)]
pub struct MotionExtractor {
    delta_thresh: u8,
    dilate_distance: u8,
    min_area: u32,
}

#[derive(Debug)]
struct ComponentStats {
    area: u32,
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
}

impl MotionExtractor {
    /// Creates an extractor with the given thresholds.
    pub fn new(delta_thresh: u8, dilate_distance: u8, min_area: u32) -> Self {
        Self {
            delta_thresh,
            dilate_distance,
            min_area,
        }
    }

    /// Returns the regions whose area meets the minimum.
    ///
    /// An empty result is the per-frame "no motion" signal, not an error.
    pub fn extract(&self, delta: &GrayImage) -> Vec<Region> {
        // threshold() keeps pixels strictly above the cutoff; shift by one
        // so the configured value itself counts as foreground.
        let mask = threshold(delta, self.delta_thresh.saturating_sub(1), ThresholdType::Binary);
        let dilated = dilate(&mask, Norm::LInf, self.dilate_distance);
        let labels = connected_components(&dilated, Connectivity::Eight, Luma([0u8]));

        let mut components: BTreeMap<u32, ComponentStats> = BTreeMap::new();
        for (x, y, label) in labels.enumerate_pixels() {
            let id = label.0[0];
            if id == 0 {
                continue;
            }
            components
                .entry(id)
                .and_modify(|stats| {
                    stats.area += 1;
                    stats.min_x = stats.min_x.min(x);
                    stats.min_y = stats.min_y.min(y);
                    stats.max_x = stats.max_x.max(x);
                    stats.max_y = stats.max_y.max(y);
                })
                .or_insert(ComponentStats {
                    area: 1,
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                });
        }

        components
            .into_values()
            .filter(|stats| stats.area >= self.min_area)
            .map(|stats| Region {
                area: stats.area,
                bounds: Rect::at(stats.min_x as i32, stats.min_y as i32).of_size(
                    stats.max_x - stats.min_x + 1,
                    stats.max_y - stats.min_y + 1,
                ),
            })
            .collect()
    }
}
