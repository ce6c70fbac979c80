use serde::{Deserialize, Serialize};

const EPSILON: f32 = 1e-3;

/// Hit-zone geometry in screen units. Y grows downward.
///
/// The perfect band must lie inside the full zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeZone {
    pub zone_top: f32,
    pub zone_height: f32,
    /// Y of the judgment line
    pub perfect_center: f32,
    pub perfect_zone_top: f32,
    pub perfect_zone_height: f32,
}

impl JudgeZone {
    /// Standard layout for a screen of the given height: judgment line at
    /// 2/3 of the height, a zone of 1/3 of the height centred on it and a
    /// perfect band of 1/6 of the height.
    pub fn for_screen(height: f32) -> Self {
        let line = height * 2.0 / 3.0;
        let zone_height = height / 3.0;
        let perfect_zone_height = height / 6.0;
        Self {
            zone_top: line - zone_height / 2.0,
            zone_height,
            perfect_center: line,
            perfect_zone_top: line - perfect_zone_height / 2.0,
            perfect_zone_height,
        }
    }

    pub fn zone_bottom(&self) -> f32 {
        self.zone_top + self.zone_height
    }

    pub fn perfect_zone_bottom(&self) -> f32 {
        self.perfect_zone_top + self.perfect_zone_height
    }

    pub fn is_valid(&self) -> bool {
        let finite = [
            self.zone_top,
            self.zone_height,
            self.perfect_center,
            self.perfect_zone_top,
            self.perfect_zone_height,
        ]
        .iter()
        .all(|v| v.is_finite());
        finite
            && self.zone_height >= 0.0
            && self.perfect_zone_height >= 0.0
            && self.perfect_zone_top + EPSILON >= self.zone_top
            && self.perfect_zone_bottom() <= self.zone_bottom() + EPSILON
    }

    /// True when `y` lies in the full zone (inclusive).
    pub fn contains(&self, y: f32) -> bool {
        y >= self.zone_top && y <= self.zone_bottom()
    }

    /// True when `y` lies in the perfect band (inclusive).
    pub fn perfect_contains(&self, y: f32) -> bool {
        y >= self.perfect_zone_top && y <= self.perfect_zone_bottom()
    }

    /// True when the vertical extent `[top, top + height]` overlaps the zone.
    pub fn overlaps(&self, top: f32, height: f32) -> bool {
        top + height >= self.zone_top && top <= self.zone_bottom()
    }
}

impl Default for JudgeZone {
    fn default() -> Self {
        Self::for_screen(720.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_screen_720() {
        let z = JudgeZone::for_screen(720.0);
        assert_eq!(z.perfect_center, 480.0);
        assert_eq!(z.zone_top, 360.0);
        assert_eq!(z.zone_height, 240.0);
        assert_eq!(z.zone_bottom(), 600.0);
        assert_eq!(z.perfect_zone_top, 420.0);
        assert_eq!(z.perfect_zone_height, 120.0);
        assert!(z.is_valid());
    }

    #[test]
    fn for_screen_always_valid() {
        for h in [100.0, 333.0, 600.0, 1081.0, 4096.0] {
            assert!(JudgeZone::for_screen(h).is_valid(), "height {h}");
        }
    }

    #[test]
    fn perfect_band_outside_zone_is_invalid() {
        let mut z = JudgeZone::for_screen(720.0);
        z.perfect_zone_top = 300.0;
        assert!(!z.is_valid());
        let mut z = JudgeZone::for_screen(720.0);
        z.perfect_zone_height = 500.0;
        assert!(!z.is_valid());
        let mut z = JudgeZone::for_screen(720.0);
        z.zone_top = f32::NAN;
        assert!(!z.is_valid());
    }

    #[test]
    fn containment_is_inclusive() {
        let z = JudgeZone::for_screen(720.0);
        assert!(z.contains(360.0));
        assert!(z.contains(600.0));
        assert!(!z.contains(600.5));
        assert!(z.perfect_contains(420.0));
        assert!(z.perfect_contains(540.0));
        assert!(!z.perfect_contains(419.9));
    }

    #[test]
    fn overlap_uses_full_extent() {
        let z = JudgeZone::for_screen(720.0);
        assert!(z.overlaps(340.0, 20.0));
        assert!(!z.overlaps(339.0, 20.0));
        assert!(z.overlaps(600.0, 20.0));
        assert!(!z.overlaps(600.1, 20.0));
    }
}
