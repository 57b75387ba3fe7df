//! Unit tests for rp-core primitives.

#[cfg(test)]
mod ids {
    use crate::{RouteId, TrackId};

    #[test]
    fn index_roundtrip() {
        let id = RouteId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(RouteId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn ordering() {
        assert!(RouteId(0) < RouteId(1));
        assert!(TrackId(100) > TrackId(99));
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(RouteId::INVALID.0, u32::MAX);
        assert_eq!(TrackId::INVALID.0, u32::MAX);
    }

    #[test]
    fn display() {
        assert_eq!(RouteId(7).to_string(), "RouteId(7)");
    }
}

#[cfg(test)]
mod geo {
    use crate::GeoPoint;

    #[test]
    fn zero_distance() {
        let p = GeoPoint::new(48.853, 2.348);
        assert!(p.distance_m(p) < 0.01);
    }

    #[test]
    fn one_degree_of_latitude() {
        // ~1 degree of latitude ≈ 111 km
        let a = GeoPoint::new(48.0, 2.0);
        let b = GeoPoint::new(49.0, 2.0);
        let d = a.distance_m(b);
        assert!((d - 111_195.0).abs() < 500.0, "got {d}");
    }

    #[test]
    fn lerp_endpoints_and_midpoint() {
        let a = GeoPoint::new(48.0, 2.0);
        let b = GeoPoint::new(49.0, 3.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        let mid = a.lerp(b, 0.5);
        assert!((mid.lat - 48.5).abs() < 1e-12);
        assert!((mid.lon - 2.5).abs() < 1e-12);
    }
}

#[cfg(test)]
mod ranges {
    use crate::RangeProfile;

    #[test]
    fn value_at_and_gaps() {
        let mut p = RangeProfile::new();
        p.insert(0.0, 100.0, 10.0);
        p.insert(200.0, 300.0, 20.0);

        assert_eq!(p.value_at(0.0), Some(&10.0));
        assert_eq!(p.value_at(99.9), Some(&10.0));
        assert_eq!(p.value_at(100.0), None); // half-open
        assert_eq!(p.value_at(150.0), None);
        assert_eq!(p.value_at(200.0), Some(&20.0));
        assert_eq!(p.value_at(300.0), None);
    }

    #[test]
    fn boundary_belongs_to_later_range() {
        let p = RangeProfile::from_ranges([(0.0, 50.0, 1), (50.0, 100.0, 2)]);
        assert_eq!(p.value_at(50.0), Some(&2));
    }

    #[test]
    fn touching_equal_ranges_merge() {
        let mut p = RangeProfile::new();
        p.insert(0.0, 50.0, 7);
        p.insert(50.0, 100.0, 7);
        assert_eq!(p.len(), 1);
        assert_eq!(p.ranges()[0].begin, 0.0);
        assert_eq!(p.ranges()[0].end, 100.0);

        // Bridging insert merges both neighbours into one range.
        p.insert(150.0, 200.0, 7);
        p.insert(100.0, 150.0, 7);
        assert_eq!(p.len(), 1);
        assert_eq!(p.ranges()[0].end, 200.0);
    }

    #[test]
    fn touching_unequal_ranges_stay_separate() {
        let mut p = RangeProfile::new();
        p.insert(0.0, 50.0, 1);
        p.insert(50.0, 100.0, 2);
        assert_eq!(p.len(), 2);
    }

    #[test]
    #[should_panic(expected = "overlaps")]
    fn overlapping_insert_panics() {
        let mut p = RangeProfile::new();
        p.insert(0.0, 100.0, 1);
        p.insert(50.0, 150.0, 2);
    }

    #[test]
    fn segments_cover_window_exactly() {
        let p = RangeProfile::from_ranges([(10.0, 20.0, 1), (30.0, 40.0, 2)]);
        let segs = p.segments(0.0, 50.0);
        let expected = [
            (0.0, 10.0, None),
            (10.0, 20.0, Some(1)),
            (20.0, 30.0, None),
            (30.0, 40.0, Some(2)),
            (40.0, 50.0, None),
        ];
        assert_eq!(segs.len(), expected.len());
        for ((b, e, v), (eb, ee, ev)) in segs.iter().zip(expected.iter()) {
            assert_eq!(b, eb);
            assert_eq!(e, ee);
            assert_eq!(v.copied(), *ev);
        }
        // No gaps between consecutive segments.
        for w in segs.windows(2) {
            assert_eq!(w[0].1, w[1].0);
        }
    }

    #[test]
    fn slice_shifted_rebases() {
        let p = RangeProfile::from_ranges([(0.0, 100.0, 5.0)]);
        let s = p.slice_shifted(25.0, 75.0, 1000.0);
        assert_eq!(s.len(), 1);
        assert_eq!(s.ranges()[0].begin, 1000.0);
        assert_eq!(s.ranges()[0].end, 1050.0);
        assert_eq!(s.value_at(1025.0), Some(&5.0));
    }

    #[test]
    fn mean_weighted_with_gaps() {
        let p = RangeProfile::from_ranges([(0.0, 50.0, 10.0)]);
        // Half the window at 10.0, half at the gap default 0.0.
        let mean = p.mean_weighted(0.0, 100.0, 0.0);
        assert!((mean - 5.0).abs() < 1e-12, "got {mean}");
        // Empty window falls back to the default.
        assert_eq!(p.mean_weighted(30.0, 30.0, 42.0), 42.0);
    }
}

#[cfg(test)]
mod config {
    use crate::PlanningConfig;

    #[test]
    fn defaults_are_valid() {
        let cfg = PlanningConfig::new(0.0, 3_600.0);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.time_step, 2.0);
    }

    #[test]
    fn rejects_bad_windows_and_steps() {
        let mut cfg = PlanningConfig::new(100.0, 100.0);
        assert!(cfg.validate().is_err());

        cfg = PlanningConfig::new(0.0, 100.0);
        cfg.time_step = 0.0;
        assert!(cfg.validate().is_err());

        cfg = PlanningConfig::new(0.0, 100.0);
        cfg.max_departure_delay = -1.0;
        assert!(cfg.validate().is_err());
    }
}
