//! Per-frame presence decision.
//!
//! The [`Detector`] runs the matcher on one sampled frame and accepts the
//! frame when the number of candidate regions is between one and
//! `max_templates_allowed`. A frame with more regions than the bound is
//! rejected outright.
//!
//! An optional [`FrameObserver`] sees every matched frame and its regions.
//! Observers never affect the decision.

use crate::{
    matcher::{MatchRegion, Matcher},
    source::Frame,
    template::Template,
};

/// The acceptance rule: `1 <= candidates <= max_templates_allowed`.
pub fn is_accepted(candidates: usize, max_templates_allowed: usize) -> bool {
    candidates >= 1 && candidates <= max_templates_allowed
}

/// Side channel notified after every matcher call.
pub trait FrameObserver {
    fn on_frame_processed(&mut self, frame: &Frame, regions: &[MatchRegion]);
}

/// Binary present/absent classifier over a shared template.
pub struct Detector<'a> {
    matcher: &'a dyn Matcher,
    template: &'a Template,
    max_templates_allowed: usize,
    observer: Option<&'a mut dyn FrameObserver>,
}

impl<'a> Detector<'a> {
    pub fn new(matcher: &'a dyn Matcher, template: &'a Template, max_templates_allowed: usize) -> Self {
        Self {
            matcher,
            template,
            max_templates_allowed,
            observer: None,
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: &'a mut dyn FrameObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Match `frame` against the template and apply the acceptance rule.
    pub fn detect(&mut self, frame: &Frame) -> bool {
        let gray = frame.to_grayscale();
        let regions = self.matcher.find_regions(&gray, self.template);

        let present = is_accepted(regions.len(), self.max_templates_allowed);
        if regions.len() > self.max_templates_allowed {
            log::debug!(
                "Frame {}: {} candidate regions exceed bound {}, rejected",
                frame.index(),
                regions.len(),
                self.max_templates_allowed
            );
        } else if present {
            log::debug!("Frame {}: template present ({} regions)", frame.index(), regions.len());
        }

        if let Some(observer) = self.observer.as_deref_mut() {
            observer.on_frame_processed(frame, &regions);
        }

        present
    }
}
