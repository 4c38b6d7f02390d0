#![allow(missing_docs)]
#![cfg(not(miri))]

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rt_tracker::distance::{self, Placement};
use rt_tracker::{
    Config, Distribution, Error, JourneyProfile, Location, PositionReport, RouteStop,
    ScheduleTime, Stop, StopCache, Tracker, progress,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt};

fn init_tracing() {
    let _ = Registry::default().with(EnvFilter::new("debug")).with(fmt::layer()).try_init();
}

fn config() -> Arc<Config> {
    Arc::new(Config::with_timezone(chrono_tz::UTC))
}

// Three stops ~1.1 km apart heading due north, five minutes apart from 08:00.
fn three_stop_route() -> (Vec<RouteStop>, StopCache) {
    let stops = [Stop::new("A", 0.0, 0.0), Stop::new("B", 0.01, 0.0), Stop::new("C", 0.02, 0.0)];
    let route = vec![
        RouteStop::new("A", "08:00:00".parse().expect("should parse")),
        RouteStop::new("B", "08:05:00".parse().expect("should parse")),
        RouteStop::new("C", "08:10:00".parse().expect("should parse")),
    ];
    (route, stops.into_iter().collect())
}

fn northbound(count: u32, minutes_apart: i64) -> (Vec<RouteStop>, HashMap<String, Stop>) {
    let stops = (0..count)
        .map(|i| (format!("S{i}"), Stop::new(format!("S{i}"), f64::from(i) * 0.01, 0.0)))
        .collect();
    let route = (0..count)
        .map(|i| {
            let at = ScheduleTime::hms(8, i64::from(i) * minutes_apart, 0);
            RouteStop::new(format!("S{i}"), at)
        })
        .collect();
    (route, stops)
}

fn assert_normalized(dist: &Distribution) {
    assert!(dist.values().iter().all(|value| *value >= 0.0), "negative mass in {dist:?}");
    assert!((dist.sum() - 1.0).abs() < 1e-9, "mass {} in {dist:?}", dist.sum());
}

// Should place a vehicle waiting at the first stop at the start of the route.
#[test]
fn scenario_at_first_stop() {
    init_tracing();
    let (route, stops) = three_stop_route();
    let report = PositionReport::new("bus-1", 0.0, 0.0, "2025-10-07T08:00:05Z");

    let mut tracker = Tracker::new(config());
    tracker.init(&report).expect("should init");
    let placed = tracker.init_journey(&route, &stops).expect("should build journey");
    let result = tracker.update(&report).expect("should update");

    assert_eq!(placed, Some(result));
    assert!(result.segment_index <= 1);
    assert!(result.progress_fraction < 0.05);
}

// Should place a vehicle sitting at a middle stop on one side of it, and
// keep that choice across repeated identical reports.
#[test]
fn scenario_at_middle_stop() {
    init_tracing();
    let (route, stops) = three_stop_route();
    let first = PositionReport::new("bus-1", 0.0, 0.0, "2025-10-07T08:00:05Z");
    let report = PositionReport::new("bus-1", 0.01, 0.0, "2025-10-07T08:05:00Z");

    let mut tracker = Tracker::new(config());
    tracker.init(&first).expect("should init");
    tracker.init_journey(&route, &stops).expect("should build journey");
    let result = tracker.update(&report).expect("should update");

    let at_boundary = (result.segment_index == 1 && result.progress_fraction > 0.95)
        || (result.segment_index == 2 && result.progress_fraction < 0.05);
    assert!(at_boundary, "unexpected placement {result:?}");

    for _ in 0..3 {
        assert_eq!(tracker.update(&report).expect("should update"), result);
    }

    // a fresh tracker seeing the same report agrees
    let mut fresh = Tracker::new(config());
    fresh.init(&report).expect("should init");
    let placed = fresh.init_journey(&route, &stops).expect("should build journey");
    assert_eq!(placed, Some(result));
}

// Should leave the tracker untouched when a report repeats a timestamp.
#[test]
fn duplicate_timestamp_is_idempotent() {
    let (route, stops) = northbound(5, 3);
    let mut tracker = Tracker::new(config());
    tracker.init_journey(&route, &stops).expect("should build journey");

    tracker
        .update(&PositionReport::new("bus-2", 0.004, 0.0, "2025-10-07T08:01:00Z"))
        .expect("should update");
    let report = PositionReport::new("bus-2", 0.013, 0.0001, "2025-10-07T08:04:00Z");
    let first = tracker.update(&report).expect("should update");
    let estimates = tracker.estimates().clone();
    let seen = tracker.last_seen();

    // same timestamp, different position
    let replay = PositionReport::new("bus-2", 0.03, 0.0, "2025-10-07T08:04:00Z");
    let second = tracker.update(&replay).expect("should update");

    assert_eq!(second, first);
    assert_eq!(tracker.position(), Some(first));
    assert_eq!(tracker.estimates(), &estimates);
    assert_eq!(tracker.last_seen(), seen);
}

// Should pin the progress estimate before the scheduled start.
#[test]
fn pre_start_progress_is_pinned() {
    for count in 2..=7 {
        let (route, stops) = northbound(count, 2);
        let profile = JourneyProfile::build(&route, &stops).expect("should build journey");
        let fix = PositionReport::new("bus-3", 0.0, 0.0, "2025-10-07T07:50:00Z")
            .fix()
            .expect("should be valid");
        let service = ScheduleTime::hms(7, 50, 0).seconds();

        let dist = progress::estimate(&fix, service, &profile, None);

        let mut expected = vec![0.0; profile.segments()];
        expected[0] = 0.9;
        expected[1] = 0.1;
        assert_eq!(dist.values(), expected.as_slice());
    }
}

// Should keep every vector normalised and every placement in bounds along a
// noisy trip.
#[test]
fn noisy_trip_stays_normalized() {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(42);
    let (route, stops) = northbound(6, 3);
    let mut tracker = Tracker::new(config());
    tracker.init_journey(&route, &stops).expect("should build journey");

    let departure = Utc.with_ymd_and_hms(2025, 10, 7, 7, 58, 0).single().expect("valid time");
    for step in 0..40 {
        let at = departure + Duration::seconds(step * 30);
        let latitude = (f64::from(u32::try_from(step).expect("small")) * 0.0015
            + rng.gen_range(-0.0005..0.0005))
        .max(-0.001);
        let longitude = rng.gen_range(-0.0003..0.0003);
        let report = PositionReport::new("bus-4", latitude, longitude, at.to_rfc3339());

        let result = tracker.update(&report).expect("should update");
        assert!(result.segment_index <= 6);
        assert!((0.0..=1.0).contains(&result.progress_fraction));
        if result.segment_index == 0 || result.segment_index == 6 {
            assert!(result.progress_fraction.abs() < f64::EPSILON);
        }

        let estimates = tracker.estimates();
        for dist in [&estimates.distance, &estimates.progress, &estimates.timetable] {
            assert_normalized(dist.as_ref().expect("should be computed"));
        }
        assert_normalized(estimates.combined.as_ref().expect("should be computed"));
    }
}

// Should apply the same correction before and beyond on a straight route.
#[test]
fn collinear_corrections_are_symmetric() {
    let mut rng = StdRng::seed_from_u64(7);
    let config = Config::with_timezone(chrono_tz::UTC);

    for _ in 0..200 {
        let spacing = rng.gen_range(0.002..0.02);
        let direction = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let points: Vec<(f64, f64)> = if rng.gen_bool(0.5) {
            let lat = rng.gen_range(-60.0..60.0);
            let lon = rng.gen_range(-170.0..170.0);
            (0..3).map(|i| (lat + direction * spacing * f64::from(i), lon)).collect()
        } else {
            let lon = rng.gen_range(-170.0..170.0);
            (0..3).map(|i| (0.0, lon + direction * spacing * f64::from(i))).collect()
        };

        let stops: HashMap<String, Stop> = points
            .iter()
            .enumerate()
            .map(|(i, (lat, lon))| (i.to_string(), Stop::new(i.to_string(), *lat, *lon)))
            .collect();
        let route: Vec<RouteStop> = (0..3)
            .map(|i| RouteStop::new(i.to_string(), ScheduleTime::hms(8, i64::from(i), 0)))
            .collect();
        let profile = JourneyProfile::build(&route, &stops).expect("should build journey");

        let midpoint = |a: (f64, f64), b: (f64, f64)| {
            Location::new((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
        };
        let first_half = midpoint(points[0], points[1]);
        let second_half = midpoint(points[1], points[2]);

        assert_eq!(distance::placement(&first_half, &profile, 1), Placement::Within);
        let before = distance::placement(&first_half, &profile, 2);
        let beyond = distance::placement(&second_half, &profile, 1);
        assert_eq!(before, Placement::Before);
        assert_eq!(beyond, Placement::Beyond);
        assert!((before.adjustment() - beyond.adjustment()).abs() < f64::EPSILON);

        let at_first = distance::estimate(&first_half, &profile, &config);
        let at_second = distance::estimate(&second_half, &profile, &config);
        assert!((at_first[2] - at_second[1]).abs() < 1e-6);
    }
}

// Should keep at most five segments in the distance estimate.
#[test]
fn distance_keeps_top_five() {
    let mut rng = StdRng::seed_from_u64(3);
    let (route, stops) = northbound(9, 2);
    let profile = JourneyProfile::build(&route, &stops).expect("should build journey");
    let config = Config::with_timezone(chrono_tz::UTC);

    for _ in 0..50 {
        let position = Location::new(rng.gen_range(-0.01..0.09), rng.gen_range(-0.01..0.01));
        let dist = distance::estimate(&position, &profile, &config);
        assert_eq!(dist.len(), 10);
        assert!(dist.support() <= 5);
        assert_normalized(&dist);
    }
}

// Should refuse a journey with a single stop.
#[test]
fn single_stop_journey() {
    let stops: StopCache = [Stop::new("A", 0.0, 0.0)].into_iter().collect();
    let route = [RouteStop::new("A", ScheduleTime::hms(8, 0, 0))];

    let err = JourneyProfile::build(&route, &stops).expect_err("should fail");
    assert_eq!(err, Error::InsufficientStops("1 of 1 stops resolved".to_string()));

    let mut tracker = Tracker::new(config());
    assert!(tracker.init_journey(&route, &stops).is_err());
    assert!(tracker.profile().is_none());
}

// Should report a missing journey without touching the placement.
#[test]
fn update_before_journey() {
    let mut tracker = Tracker::new(config());
    let report = PositionReport::new("bus-5", 0.0, 0.0, "2025-10-07T08:00:05Z");

    let err = tracker.update(&report).expect_err("should fail");
    assert_eq!(err, Error::NoJourney);
    assert!(tracker.position().is_none());
}

// Should place reports from a late-evening trip that runs past midnight.
#[test]
fn after_midnight_trip() {
    let stops: StopCache =
        [Stop::new("A", 0.0, 0.0), Stop::new("B", 0.01, 0.0), Stop::new("C", 0.02, 0.0)]
            .into_iter()
            .collect();
    let route = vec![
        RouteStop::new("A", "23:50:00".parse().expect("should parse")),
        RouteStop::new("B", "24:00:00".parse().expect("should parse")),
        RouteStop::new("C", "24:10:00".parse().expect("should parse")),
    ];

    let mut tracker = Tracker::new(config());
    tracker.init_journey(&route, &stops).expect("should build journey");
    tracker
        .update(&PositionReport::new("bus-6", 0.005, 0.0, "2025-10-07T23:55:00Z"))
        .expect("should update");
    let result = tracker
        .update(&PositionReport::new("bus-6", 0.015, 0.0, "2025-10-08T00:05:00Z"))
        .expect("should update");

    assert_eq!(result.segment_index, 2);
    assert!((result.progress_fraction - 0.5).abs() < 0.01);
}

// Should place reports from a trip whose first departure is past 24:00.
#[test]
fn trip_starting_after_midnight() {
    let stops: StopCache =
        [Stop::new("A", 0.0, 0.0), Stop::new("B", 0.01, 0.0), Stop::new("C", 0.02, 0.0)]
            .into_iter()
            .collect();
    let route = vec![
        RouteStop::new("A", "24:10:00".parse().expect("should parse")),
        RouteStop::new("B", "24:20:00".parse().expect("should parse")),
        RouteStop::new("C", "24:30:00".parse().expect("should parse")),
    ];

    let mut tracker = Tracker::new(config());
    tracker.init_journey(&route, &stops).expect("should build journey");
    tracker
        .update(&PositionReport::new("bus-7", 0.005, 0.0, "2025-10-08T00:15:00Z"))
        .expect("should update");
    let result = tracker
        .update(&PositionReport::new("bus-7", 0.015, 0.0, "2025-10-08T00:25:00Z"))
        .expect("should update");

    assert_eq!(result.segment_index, 2);
    assert!((result.progress_fraction - 0.5).abs() < 0.01);
}
