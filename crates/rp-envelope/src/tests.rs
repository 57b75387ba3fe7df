//! Unit tests for trajectory representations.

use crate::{
    Envelope, EnvelopeConcat, EnvelopePart, EnvelopeStopWrapper, TimeInterpolate, TrainStop,
    Trajectory,
};

/// A flat 0-based envelope of the given length and speed.
fn flat_envelope(length: f64, speed: f64) -> Envelope {
    Envelope::make(vec![EnvelopePart::flat(0.0, length, speed)])
}

#[cfg(test)]
mod part {
    use super::*;

    #[test]
    fn flat_part_times() {
        let p = EnvelopePart::flat(0.0, 100.0, 10.0);
        assert_eq!(p.begin_pos(), 0.0);
        assert_eq!(p.end_pos(), 100.0);
        assert!((p.total_time() - 10.0).abs() < 1e-9);
        assert!((p.interpolate_time(50.0) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn acceleration_step_speed_and_time() {
        // Constant acceleration from 0 to 20 m/s over 200 m: a = 1 m/s²,
        // so v(x) = sqrt(2x) and t(x) = v(x)/a.
        let p = EnvelopePart::new(vec![0.0, 200.0], vec![0.0, 20.0]);
        let v = p.interpolate_speed(50.0);
        assert!((v - 10.0).abs() < 1e-9, "got {v}");
        let t = p.interpolate_time(50.0);
        assert!((t - 10.0).abs() < 1e-9, "got {t}");
        assert!((p.total_time() - 20.0).abs() < 1e-9);
    }

    #[test]
    #[should_panic(expected = "strictly increasing")]
    fn unsorted_positions_panic() {
        EnvelopePart::new(vec![0.0, 100.0, 50.0], vec![10.0, 10.0, 10.0]);
    }

    #[test]
    #[should_panic(expected = "zero-speed step")]
    fn zero_speed_plateau_panics() {
        EnvelopePart::new(vec![0.0, 100.0], vec![0.0, 0.0]);
    }

    #[test]
    fn slice_interpolates_boundaries() {
        let p = EnvelopePart::new(vec![0.0, 200.0], vec![0.0, 20.0]);
        let s = p.slice(50.0, 150.0).unwrap();
        assert_eq!(s.begin_pos(), 50.0);
        assert_eq!(s.end_pos(), 150.0);
        assert!((s.begin_speed() - 10.0).abs() < 1e-9);
        // Slicing out of range yields nothing.
        assert!(p.slice(300.0, 400.0).is_none());
        // The source part is untouched.
        assert_eq!(p.begin_pos(), 0.0);
        assert_eq!(p.end_pos(), 200.0);
    }

    #[test]
    fn copy_and_shift_moves_positions_only() {
        let p = EnvelopePart::flat(0.0, 100.0, 10.0);
        let shifted = p.copy_and_shift(1000.0);
        assert_eq!(shifted.begin_pos(), 1000.0);
        assert_eq!(shifted.end_pos(), 1100.0);
        assert!((shifted.total_time() - p.total_time()).abs() < 1e-12);
    }
}

#[cfg(test)]
mod envelope {
    use super::*;

    #[test]
    fn continuity_flag() {
        let continuous = Envelope::make(vec![
            EnvelopePart::flat(0.0, 100.0, 10.0),
            EnvelopePart::flat(100.0, 200.0, 10.0),
        ]);
        assert!(continuous.is_continuous());

        let broken = Envelope::make(vec![
            EnvelopePart::flat(0.0, 100.0, 10.0),
            EnvelopePart::flat(100.0, 200.0, 5.0),
        ]);
        assert!(!broken.is_continuous());
    }

    #[test]
    #[should_panic(expected = "gap or overlap")]
    fn gap_between_parts_panics() {
        Envelope::make(vec![
            EnvelopePart::flat(0.0, 100.0, 10.0),
            EnvelopePart::flat(150.0, 200.0, 10.0),
        ]);
    }

    #[test]
    fn total_time_accumulates_over_parts() {
        let e = Envelope::make(vec![
            EnvelopePart::flat(0.0, 100.0, 10.0),  // 10 s
            EnvelopePart::flat(100.0, 200.0, 20.0), // 5 s
        ]);
        assert!((e.total_time() - 15.0).abs() < 1e-9);
        assert!((e.interpolate_total_time(150.0) - 12.5).abs() < 1e-9);
    }

    #[test]
    fn interpolated_time_is_monotonic() {
        let e = Envelope::make(vec![
            EnvelopePart::new(vec![0.0, 200.0], vec![0.0, 20.0]),
            EnvelopePart::flat(200.0, 400.0, 20.0),
            EnvelopePart::new(vec![400.0, 500.0], vec![20.0, 10.0]),
        ]);
        let mut last = 0.0;
        let samples = 101;
        for i in 0..samples {
            let pos = e.end_pos() * i as f64 / (samples - 1) as f64;
            let t = e.interpolate_total_time(pos);
            assert!(t >= last - 1e-12, "time decreased at {pos}: {t} < {last}");
            last = t;
        }
    }

    #[test]
    fn clamp_matches_plain_interpolation_of_clamped_position() {
        let e = flat_envelope(300.0, 15.0);
        for pos in [-50.0_f64, 0.0, 123.4, 300.0, 412.0] {
            let clamped = pos.clamp(0.0, e.end_pos());
            assert_eq!(
                e.interpolate_total_time_clamp(pos),
                e.interpolate_total_time(clamped)
            );
        }
    }

    #[test]
    #[should_panic(expected = "outside envelope")]
    fn out_of_range_interpolation_panics() {
        flat_envelope(100.0, 10.0).interpolate_total_time(100.5);
    }

    #[test]
    fn iterate_points_is_ordered_and_deduplicated() {
        let e = Envelope::make(vec![
            EnvelopePart::flat(0.0, 100.0, 10.0),
            EnvelopePart::flat(100.0, 200.0, 10.0),
        ]);
        let points = e.iterate_points();
        // The shared boundary sample appears once.
        assert_eq!(points.len(), 3);
        for w in points.windows(2) {
            assert!(w[1].position >= w[0].position);
            assert!(w[1].time >= w[0].time);
        }
    }

    #[test]
    fn slice_keeps_interior_continuity() {
        let e = Envelope::make(vec![
            EnvelopePart::new(vec![0.0, 200.0], vec![0.0, 20.0]),
            EnvelopePart::flat(200.0, 400.0, 20.0),
        ]);
        let s = e.slice(100.0, 300.0);
        assert!(s.is_continuous());
        assert_eq!(s.begin_pos(), 100.0);
        assert_eq!(s.end_pos(), 300.0);
    }
}

#[cfg(test)]
mod concat {
    use super::*;

    #[test]
    fn lengths_and_times_sum() {
        let concat = EnvelopeConcat::from([
            Trajectory::from(flat_envelope(1_000.0, 10.0)), // 100 s
            Trajectory::from(flat_envelope(500.0, 20.0)),   // 25 s
            Trajectory::from(flat_envelope(300.0, 30.0)),   // 10 s
        ]);
        assert_eq!(concat.end_pos(), 1_800.0);
        assert!((concat.total_time() - 135.0).abs() < 1e-9);
        // Interpolation inside the second sub-envelope.
        let t = concat.interpolate_total_time(1_250.0);
        assert!((t - 112.5).abs() < 1e-9, "got {t}");
    }

    #[test]
    fn clamp_never_panics() {
        let concat = EnvelopeConcat::from([
            Trajectory::from(flat_envelope(100.0, 10.0)),
            Trajectory::from(flat_envelope(100.0, 10.0)),
        ]);
        assert_eq!(concat.interpolate_total_time_clamp(-5.0), 0.0);
        assert!((concat.interpolate_total_time_clamp(999.0) - 20.0).abs() < 1e-9);
    }

    #[test]
    #[should_panic(expected = "outside concatenation")]
    fn out_of_range_interpolation_panics() {
        let concat = EnvelopeConcat::from([Trajectory::from(flat_envelope(100.0, 10.0))]);
        concat.interpolate_total_time(100.5);
    }

    /// Pins the midpoint-biased binary-search behaviour at shared
    /// boundaries.  With four sub-envelopes, position 100 (boundary 0|1)
    /// resolves to the *later* sub-envelope while position 300
    /// (boundary 2|3) resolves to the *earlier* one.  Stop-at-origin
    /// wrappers make the difference observable in the interpolated time.
    #[test]
    fn boundary_between_envelopes_is_deterministic() {
        let sub = |stop_duration: f64| -> Trajectory {
            EnvelopeStopWrapper::new(
                Trajectory::from(flat_envelope(100.0, 10.0)), // 10 s travel
                vec![TrainStop { position: 0.0, duration: stop_duration }],
            )
            .into()
        };
        // Each sub-trajectory lasts 100 s stop + 10 s travel = 110 s.
        let concat = EnvelopeConcat::from([sub(100.0), sub(100.0), sub(100.0), sub(100.0)]);

        // Boundary 0|1: probe lands on sub 1 → its stop at local 0 counts.
        let t = concat.interpolate_total_time(100.0);
        assert!((t - 210.0).abs() < 1e-9, "got {t}");

        // Boundary 2|3: probe lands on sub 2 → sub 3's stop does not count.
        let t = concat.interpolate_total_time(300.0);
        assert!((t - 330.0).abs() < 1e-9, "got {t}");
    }

    #[test]
    fn iterate_points_shifts_both_axes() {
        let concat = EnvelopeConcat::from([
            Trajectory::from(flat_envelope(100.0, 10.0)),
            Trajectory::from(flat_envelope(100.0, 20.0)),
        ]);
        let points = concat.iterate_points();
        for w in points.windows(2) {
            assert!(w[1].position >= w[0].position);
            assert!(w[1].time >= w[0].time);
        }
        let last = points.last().unwrap();
        assert_eq!(last.position, 200.0);
        assert!((last.time - 15.0).abs() < 1e-9);
    }
}

#[cfg(test)]
mod stops {
    use super::*;

    #[test]
    fn dwell_time_shifts_later_positions() {
        let wrapped = EnvelopeStopWrapper::new(
            Trajectory::from(flat_envelope(200.0, 10.0)), // 20 s travel
            vec![TrainStop { position: 100.0, duration: 60.0 }],
        );
        // Before the stop: unchanged.
        assert!((wrapped.interpolate_total_time(50.0) - 5.0).abs() < 1e-9);
        // At and after the stop: shifted by the dwell.
        assert!((wrapped.interpolate_total_time(100.0) - 70.0).abs() < 1e-9);
        assert!((wrapped.interpolate_total_time(200.0) - 80.0).abs() < 1e-9);
        assert!((wrapped.total_time() - 80.0).abs() < 1e-9);
    }

    #[test]
    #[should_panic(expected = "sorted by position")]
    fn unsorted_stops_panic() {
        EnvelopeStopWrapper::new(
            Trajectory::from(flat_envelope(200.0, 10.0)),
            vec![
                TrainStop { position: 150.0, duration: 10.0 },
                TrainStop { position: 50.0, duration: 10.0 },
            ],
        );
    }
}
