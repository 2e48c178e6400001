//! Template matching primitive.
//!
//! A [`Matcher`] turns one grayscale frame into the list of places where the
//! template plausibly sits. [`CorrelationMatcher`] does this with
//! `imageproc`: compute the similarity map, keep the positions at or above
//! the threshold, and report every 8-connected blob of kept positions as one
//! [`MatchRegion`] located at its best-scoring position.
//!
//! The default metric is the correlation coefficient: both the window and
//! the template are mean-subtracted before correlating, so a flat or evenly
//! lit patch of frame scores 0 instead of looking like a light template.

use std::collections::BTreeMap;

use image::{GrayImage, Luma};
use imageproc::{
    definitions::Image,
    integral_image::{integral_image, integral_squared_image},
    region_labelling::{Connectivity, connected_components},
    template_matching::{MatchTemplateMethod, match_template},
};

use crate::template::Template;

/// One candidate location of the template inside a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchRegion {
    /// Left edge of the best-scoring template placement in this region.
    pub x: u32,
    /// Top edge of the best-scoring template placement in this region.
    pub y: u32,
    /// Template width, i.e. the matched rectangle's width.
    pub width: u32,
    /// Template height.
    pub height: u32,
    /// Similarity at `(x, y)`, on the matcher's similarity scale.
    pub score: f32,
}

/// Finds candidate template regions in a frame.
pub trait Matcher {
    /// Return every region whose similarity reaches the matcher's threshold.
    /// An empty vector means the template is absent.
    fn find_regions(&self, frame: &GrayImage, template: &Template) -> Vec<MatchRegion>;
}

/// Similarity metric used by [`CorrelationMatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMetric {
    /// Mean-subtracted normalized cross-correlation, in `[-1, 1]`. Windows
    /// with no intensity variation score 0.
    #[default]
    CorrelationCoefficient,
    /// Plain normalized cross-correlation, in `[0, 1]` for 8-bit images.
    /// Uniform bright areas score high against mostly-light templates.
    NormalizedCrossCorrelation,
    /// Normalized sum of squared errors, reported as `1 - error` so that
    /// higher is still more similar.
    NormalizedSquaredDifference,
}

/// `imageproc`-backed matcher with a fixed threshold and metric.
#[derive(Debug, Clone)]
pub struct CorrelationMatcher {
    threshold: f32,
    metric: MatchMetric,
}

impl CorrelationMatcher {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            metric: MatchMetric::default(),
        }
    }

    #[must_use]
    pub fn with_metric(mut self, metric: MatchMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn metric(&self) -> MatchMetric {
        self.metric
    }

    fn similarity(&self, raw: f32) -> f32 {
        match self.metric {
            MatchMetric::CorrelationCoefficient | MatchMetric::NormalizedCrossCorrelation => raw,
            MatchMetric::NormalizedSquaredDifference => 1.0 - raw,
        }
    }
}

impl Matcher for CorrelationMatcher {
    fn find_regions(&self, frame: &GrayImage, template: &Template) -> Vec<MatchRegion> {
        let pattern = template.image();
        if pattern.width() > frame.width() || pattern.height() > frame.height() {
            log::warn!(
                "Template {}x{} is larger than frame {}x{}; nothing can match",
                pattern.width(),
                pattern.height(),
                frame.width(),
                frame.height()
            );
            return Vec::new();
        }

        let scores = match self.metric {
            MatchMetric::CorrelationCoefficient => correlation_coefficient(frame, pattern),
            MatchMetric::NormalizedCrossCorrelation => {
                match_template(frame, pattern, MatchTemplateMethod::CrossCorrelationNormalized)
            }
            MatchMetric::NormalizedSquaredDifference => {
                match_template(frame, pattern, MatchTemplateMethod::SumOfSquaredErrorsNormalized)
            }
        };

        let mask = GrayImage::from_fn(scores.width(), scores.height(), |x, y| {
            let similarity = self.similarity(scores.get_pixel(x, y)[0]);
            if similarity >= self.threshold {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        });

        let labels = connected_components(&mask, Connectivity::Eight, Luma([0u8]));

        let mut regions: BTreeMap<u32, MatchRegion> = BTreeMap::new();
        for (x, y, label) in labels.enumerate_pixels() {
            let label = label[0];
            if label == 0 {
                continue;
            }
            let score = self.similarity(scores.get_pixel(x, y)[0]);
            let candidate = MatchRegion {
                x,
                y,
                width: pattern.width(),
                height: pattern.height(),
                score,
            };
            regions
                .entry(label)
                .and_modify(|best| {
                    if score > best.score {
                        *best = candidate;
                    }
                })
                .or_insert(candidate);
        }

        regions.into_values().collect()
    }
}

/// Sum of the `width` x `height` window at `(x, y)`, read from an integral
/// image with its leading zero row and column.
fn window_sum(integral: &Image<Luma<u64>>, x: u32, y: u32, width: u32, height: u32) -> i128 {
    let at = |x, y| i128::from(integral.get_pixel(x, y)[0]);
    at(x + width, y + height) - at(x, y + height) - at(x + width, y) + at(x, y)
}

/// Correlation coefficient of `pattern` against every placement in `frame`.
///
/// Per window, with `n` pixels, window `f` and template `t`:
/// `(n·Σft − Σf·Σt) / sqrt((n·Σf² − (Σf)²) · (n·Σt² − (Σt)²))`.
/// Window and template sums are exact integers; only `Σft` comes from the
/// `f32` cross-correlation. A zero-variance window or template scores 0.
fn correlation_coefficient(frame: &GrayImage, pattern: &GrayImage) -> Image<Luma<f32>> {
    let products = match_template(frame, pattern, MatchTemplateMethod::CrossCorrelation);
    let sums = integral_image::<_, u64>(frame);
    let squares = integral_squared_image::<_, u64>(frame);

    let (width, height) = pattern.dimensions();
    let n = i128::from(width) * i128::from(height);
    let (pattern_sum, pattern_squares) = pattern.pixels().fold((0i128, 0i128), |(sum, sq), pixel| {
        let value = i128::from(pixel[0]);
        (sum + value, sq + value * value)
    });
    let pattern_variance = n * pattern_squares - pattern_sum * pattern_sum;

    Image::from_fn(products.width(), products.height(), |x, y| {
        let window_total = window_sum(&sums, x, y, width, height);
        let window_variance = n * window_sum(&squares, x, y, width, height) - window_total * window_total;
        if window_variance <= 0 || pattern_variance <= 0 {
            return Luma([0.0]);
        }

        let cross = n as f64 * f64::from(products.get_pixel(x, y)[0]);
        let numerator = cross - (window_total * pattern_sum) as f64;
        let denominator = (window_variance as f64 * pattern_variance as f64).sqrt();
        Luma([(numerator / denominator).clamp(-1.0, 1.0) as f32])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A bright cross on black, so correlation peaks sharply.
    fn pattern() -> GrayImage {
        GrayImage::from_fn(5, 5, |x, y| {
            if x == 2 || y == 2 { Luma([255]) } else { Luma([0]) }
        })
    }

    fn paste(canvas: &mut GrayImage, image: &GrayImage, left: u32, top: u32) {
        for (x, y, pixel) in image.enumerate_pixels() {
            canvas.put_pixel(left + x, top + y, *pixel);
        }
    }

    #[test]
    fn finds_single_occurrence() {
        let template = Template::from_image(pattern()).unwrap();
        let mut frame = GrayImage::new(40, 30);
        paste(&mut frame, template.image(), 10, 12);

        let regions = CorrelationMatcher::new(0.99).find_regions(&frame, &template);
        assert_eq!(regions.len(), 1);
        assert_eq!((regions[0].x, regions[0].y), (10, 12));
        assert!(regions[0].score > 0.99);
    }

    #[test]
    fn separate_occurrences_are_separate_regions() {
        let template = Template::from_image(pattern()).unwrap();
        let mut frame = GrayImage::new(60, 30);
        paste(&mut frame, template.image(), 5, 5);
        paste(&mut frame, template.image(), 40, 20);

        let regions = CorrelationMatcher::new(0.99).find_regions(&frame, &template);
        assert_eq!(regions.len(), 2);
    }

    #[test]
    fn blank_frame_has_no_regions() {
        let template = Template::from_image(pattern()).unwrap();
        let frame = GrayImage::new(40, 30);
        assert!(CorrelationMatcher::new(0.8).find_regions(&frame, &template).is_empty());
    }

    /// 20x10 of 200 with one dark row: mostly light.
    fn light_pattern() -> GrayImage {
        GrayImage::from_fn(20, 10, |_, y| if y == 4 { Luma([40]) } else { Luma([200]) })
    }

    #[test]
    fn uniform_frame_has_no_regions_at_default_threshold() {
        let template = Template::from_image(light_pattern()).unwrap();
        let frame = GrayImage::from_pixel(200, 100, Luma([120]));

        let matcher = CorrelationMatcher::new(crate::DEFAULT_MATCH_THRESHOLD);
        assert_eq!(matcher.metric(), MatchMetric::CorrelationCoefficient);
        assert!(matcher.find_regions(&frame, &template).is_empty());
    }

    #[test]
    fn plain_correlation_accepts_uniform_frame() {
        let template = Template::from_image(light_pattern()).unwrap();
        let frame = GrayImage::from_pixel(200, 100, Luma([120]));

        let matcher = CorrelationMatcher::new(crate::DEFAULT_MATCH_THRESHOLD)
            .with_metric(MatchMetric::NormalizedCrossCorrelation);
        assert_eq!(matcher.find_regions(&frame, &template).len(), 1);
    }

    #[test]
    fn coefficient_ignores_brightness_offset() {
        let pattern = light_pattern();
        let template = Template::from_image(pattern.clone()).unwrap();
        let mut frame = GrayImage::from_pixel(80, 60, Luma([10]));
        // Same shape, 30 levels darker.
        let darker = GrayImage::from_fn(20, 10, |x, y| Luma([pattern.get_pixel(x, y)[0] - 30]));
        paste(&mut frame, &darker, 33, 21);

        let regions = CorrelationMatcher::new(0.99).find_regions(&frame, &template);
        assert_eq!(regions.len(), 1);
        assert_eq!((regions[0].x, regions[0].y), (33, 21));
    }

    #[test]
    fn flat_template_never_matches() {
        let template = Template::from_image(GrayImage::from_pixel(4, 4, Luma([90]))).unwrap();
        let mut frame = GrayImage::from_pixel(30, 30, Luma([0]));
        paste(&mut frame, template.image(), 5, 5);
        assert!(CorrelationMatcher::new(0.5).find_regions(&frame, &template).is_empty());
    }

    #[test]
    fn oversized_template_never_matches() {
        let template = Template::from_image(GrayImage::new(50, 50)).unwrap();
        let frame = GrayImage::new(40, 30);
        assert!(CorrelationMatcher::new(0.0).find_regions(&frame, &template).is_empty());
    }

    #[test]
    fn squared_difference_metric_finds_exact_copy() {
        let template = Template::from_image(pattern()).unwrap();
        let mut frame = GrayImage::new(40, 30);
        paste(&mut frame, template.image(), 20, 3);

        let matcher = CorrelationMatcher::new(0.99).with_metric(MatchMetric::NormalizedSquaredDifference);
        let regions = matcher.find_regions(&frame, &template);
        assert_eq!(regions.len(), 1);
        assert_eq!((regions[0].x, regions[0].y), (20, 3));
    }
}
