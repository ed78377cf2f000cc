//! Session-wide tracking configuration.

use std::time::Duration;

/// Configuration shared by template capture, matching and the session loops.
///
/// The defaults reproduce the production constants: templates cover 35% of
/// the smaller frame dimension, matching runs on a half-resolution copy, and
/// only scores strictly above 0.75 are reported.
#[derive(Clone, Debug)]
pub struct TrackerConfig {
    /// Downscale factor applied to both frames and templates before matching.
    pub scale: f32,
    /// Minimum correlation score for a match to be reported (strict `>`).
    pub min_match_score: f32,
    /// Fraction of `min(frame_width, frame_height)` defining the template side.
    pub template_fraction: f32,
    /// Maximum number of templates held by the store.
    pub max_templates: usize,
    /// Minimum window variance for a placement to be scored at all.
    pub min_var_i: f32,
    /// Interval between vision-backend readiness probes.
    pub ready_poll_interval: Duration,
    /// Upper bound on the readiness wait before `DependencyUnready`.
    pub ready_timeout: Duration,
    /// Scan rows in parallel when the `rayon` feature is enabled.
    pub parallel: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            scale: 0.5,
            min_match_score: 0.75,
            template_fraction: 0.35,
            max_templates: 2,
            min_var_i: 1e-8,
            ready_poll_interval: Duration::from_millis(100),
            ready_timeout: Duration::from_secs(10),
            parallel: false,
        }
    }
}

impl TrackerConfig {
    /// Template side length for a stream of the given size.
    ///
    /// Computed once per session when the stream opens and held fixed so
    /// capture and matching agree on the value.
    pub fn template_size(&self, frame_width: usize, frame_height: usize) -> usize {
        let min_dim = frame_width.min(frame_height) as f32;
        (min_dim * self.template_fraction).floor() as usize
    }
}

#[cfg(test)]
mod tests {
    use super::TrackerConfig;

    #[test]
    fn template_size_uses_smaller_dimension() {
        let cfg = TrackerConfig::default();
        assert_eq!(cfg.template_size(640, 480), 168);
        assert_eq!(cfg.template_size(480, 640), 168);
    }

    #[test]
    fn template_size_floors() {
        let cfg = TrackerConfig {
            template_fraction: 0.35,
            ..TrackerConfig::default()
        };
        // 0.35 * 99 = 34.65
        assert_eq!(cfg.template_size(99, 100), 34);
    }
}
