// ── Reported mount position ──
//
// Last equatorial coordinates the target mount published, kept current from
// bus events instead of polling. Informational only: commands never wait on
// it.

use mountlink_bus::Property;
use mountlink_bus::names::{MOUNT_DEC_ITEM, MOUNT_RA_ITEM};
use tokio::sync::watch;

/// Right ascension in hours, declination in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub ra: f64,
    pub dec: f64,
}

/// Holds the most recent [`Coordinates`] the mount reported.
#[derive(Debug)]
pub struct PositionTracker {
    latest: watch::Sender<Option<Coordinates>>,
}

impl Default for PositionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionTracker {
    pub fn new() -> Self {
        let (latest, _) = watch::channel(None);
        Self { latest }
    }

    /// Last reported position, `None` until the mount publishes one.
    pub fn latest(&self) -> Option<Coordinates> {
        *self.latest.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Coordinates>> {
        self.latest.subscribe()
    }

    /// Take RA and DEC from a coordinates property. An item the property
    /// leaves out keeps its previous value. Returns whether anything changed.
    pub fn record(&self, property: &Property) -> bool {
        let ra = property.number(MOUNT_RA_ITEM);
        let dec = property.number(MOUNT_DEC_ITEM);
        if ra.is_none() && dec.is_none() {
            return false;
        }

        self.latest.send_if_modified(|latest| {
            let previous = latest.unwrap_or(Coordinates { ra: 0.0, dec: 0.0 });
            let next = Coordinates {
                ra: ra.unwrap_or(previous.ra),
                dec: dec.unwrap_or(previous.dec),
            };
            if *latest == Some(next) {
                false
            } else {
                *latest = Some(next);
                true
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mountlink_bus::names::MOUNT_EQUATORIAL_COORDINATES_PROPERTY;

    use super::*;

    const MOUNT: &str = "Mount Simulator @ indigosky";

    fn coordinates() -> Property {
        Property::new(MOUNT, MOUNT_EQUATORIAL_COORDINATES_PROPERTY)
    }

    #[test]
    fn unknown_until_first_report() {
        let tracker = PositionTracker::new();
        assert_eq!(tracker.latest(), None);

        assert!(tracker.record(
            &coordinates()
                .with_item(MOUNT_RA_ITEM, 5.5)
                .with_item(MOUNT_DEC_ITEM, -12.0)
        ));
        assert_eq!(
            tracker.latest(),
            Some(Coordinates {
                ra: 5.5,
                dec: -12.0
            })
        );
    }

    #[test]
    fn partial_report_keeps_the_other_axis() {
        let tracker = PositionTracker::new();
        tracker.record(
            &coordinates()
                .with_item(MOUNT_RA_ITEM, 1.0)
                .with_item(MOUNT_DEC_ITEM, 2.0),
        );
        tracker.record(&coordinates().with_item(MOUNT_DEC_ITEM, 45.0));

        assert_eq!(
            tracker.latest(),
            Some(Coordinates { ra: 1.0, dec: 45.0 })
        );
    }

    #[test]
    fn repeated_or_empty_reports_do_not_notify() {
        let tracker = PositionTracker::new();
        let mut rx = tracker.subscribe();
        let report = coordinates()
            .with_item(MOUNT_RA_ITEM, 3.0)
            .with_item(MOUNT_DEC_ITEM, 4.0);

        assert!(tracker.record(&report));
        assert!(rx.has_changed().unwrap());
        rx.mark_unchanged();

        assert!(!tracker.record(&report));
        assert!(!tracker.record(&coordinates().with_item(MOUNT_RA_ITEM, true)));
        assert!(!rx.has_changed().unwrap());
    }
}
