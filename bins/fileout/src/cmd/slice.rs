use fileout_output_file::Zone;

/// Turns event times into batch keys, e.g. `%Y%m%d` → `20240102`.
#[derive(Debug, Clone)]
pub struct TimeSlicer {
    zone: Zone,
    format: String,
}

impl TimeSlicer {
    /// `format` must already be a valid strftime pattern.
    pub fn new(zone: Zone, format: impl Into<String>) -> Self {
        Self {
            zone,
            format: format.into(),
        }
    }

    /// `None` when `time` cannot be represented as a date.
    pub fn key(&self, time: i64) -> Option<String> {
        self.zone.strftime(time, &self.format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-01-02T23:30:00Z
    const LATE: i64 = 1_704_238_200;

    #[test]
    fn daily_slices_in_utc() {
        let slicer = TimeSlicer::new(Zone::Utc, "%Y%m%d");
        assert_eq!(slicer.key(LATE).unwrap(), "20240102");
        assert_eq!(slicer.key(LATE + 3600).unwrap(), "20240103");
    }

    #[test]
    fn slices_follow_the_output_zone() {
        let zone = Zone::from_config(true, false, Some("+09:00")).unwrap();
        let slicer = TimeSlicer::new(zone, "%Y%m%d");
        assert_eq!(slicer.key(LATE).unwrap(), "20240103");
    }

    #[test]
    fn unrepresentable_time() {
        let slicer = TimeSlicer::new(Zone::Utc, "%Y%m%d");
        assert_eq!(slicer.key(i64::MIN), None);
    }
}
