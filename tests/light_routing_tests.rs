//! Traffic light timing and intersection routing

use traffic_flow::simulation::{Intersection, LightPhase, RoadId, RoutingPolicy, TrafficLight};

fn green_amber_red() -> TrafficLight {
    TrafficLight::new(vec![
        (LightPhase::Green, 10.0),
        (LightPhase::Amber, 3.0),
        (LightPhase::Red, 7.0),
    ])
    .expect("valid cycle")
}

#[test]
fn test_light_walks_through_cycle() {
    let mut light = green_amber_red();
    assert_eq!(light.phase(), LightPhase::Green);

    for _ in 0..10 {
        light.tick(1.0);
    }
    assert_eq!(light.phase(), LightPhase::Amber);

    for _ in 0..3 {
        light.tick(1.0);
    }
    assert_eq!(light.phase(), LightPhase::Red);
    assert_eq!(light.time_to_next_change(), 7.0);

    for _ in 0..7 {
        light.tick(1.0);
    }
    assert_eq!(light.phase(), LightPhase::Green);
    assert_eq!(light.elapsed(), 0.0);
}

#[test]
fn test_one_large_tick_matches_many_small_ones() {
    let mut stepped = green_amber_red();
    for _ in 0..20 {
        stepped.tick(1.0);
    }

    let mut jumped = green_amber_red();
    jumped.tick(20.0);

    assert_eq!(stepped.phase(), jumped.phase());
    assert_eq!(stepped.elapsed(), jumped.elapsed());
}

#[test]
fn test_tick_longer_than_cycle_wraps() {
    let mut light = green_amber_red();
    light.tick(45.0);

    // 45 s = two full 20 s cycles plus 5 s into green
    assert_eq!(light.phase(), LightPhase::Green);
    assert_eq!(light.elapsed(), 5.0);
    assert!(light.invariant_violation().is_none());
}

#[test]
fn test_huge_tick_returns_promptly() {
    let mut light = green_amber_red();
    light.tick(1e12);
    // 1e12 s is a whole number of 20 s cycles
    assert_eq!(light.phase(), LightPhase::Green);
    assert_eq!(light.elapsed(), 0.0);

    let mut light = green_amber_red();
    light.tick(1e18);
    assert!(light.invariant_violation().is_none());

    // 1 s into amber, then 100 cycles and 8 s more: 6 s into red
    let mut light = green_amber_red();
    light.tick(11.0);
    light.tick(2008.0);
    assert_eq!(light.phase(), LightPhase::Red);
    assert_eq!(light.elapsed(), 6.0);
}

#[test]
fn test_uniform_light_starts_red() {
    let light = TrafficLight::uniform(5.0).expect("valid duration");
    assert_eq!(light.phase(), LightPhase::Red);
    assert!(!light.is_green());
    assert_eq!(light.cycle_total(), 15.0);
}

#[test]
fn test_invalid_cycles_rejected() {
    assert!(TrafficLight::new(vec![]).is_err());
    assert!(TrafficLight::new(vec![(LightPhase::Green, 0.0)]).is_err());
    assert!(TrafficLight::new(vec![(LightPhase::Red, f64::NAN)]).is_err());
    assert!(TrafficLight::uniform(-1.0).is_err());
}

#[test]
fn test_round_robin_cycles_destinations() {
    let mut intersection = Intersection::new(RoadId(0), vec![RoadId(1), RoadId(2), RoadId(3)]);

    let picks: Vec<Option<RoadId>> = (0..5).map(|_| intersection.select_destination()).collect();
    assert_eq!(
        picks,
        vec![
            Some(RoadId(1)),
            Some(RoadId(2)),
            Some(RoadId(3)),
            Some(RoadId(1)),
            Some(RoadId(2)),
        ]
    );
}

#[test]
fn test_peek_does_not_advance_rotation() {
    let mut intersection = Intersection::new(RoadId(0), vec![RoadId(1), RoadId(2)]);
    assert_eq!(intersection.peek_destination(), Some(RoadId(1)));
    assert_eq!(intersection.peek_destination(), Some(RoadId(1)));

    intersection.record_crossing();
    assert_eq!(intersection.peek_destination(), Some(RoadId(2)));
}

#[test]
fn test_first_policy_always_picks_first() {
    let mut intersection = Intersection::new(RoadId(0), vec![RoadId(4), RoadId(5)])
        .with_policy(RoutingPolicy::First);

    for _ in 0..3 {
        assert_eq!(intersection.select_destination(), Some(RoadId(4)));
    }
}

#[test]
fn test_duplicate_destinations_collapse() {
    let intersection = Intersection::new(RoadId(0), vec![RoadId(1), RoadId(2), RoadId(1)]);
    assert_eq!(intersection.destinations(), &[RoadId(1), RoadId(2)]);
}

#[test]
fn test_exit_intersection_has_no_destination() {
    let mut intersection = Intersection::new(RoadId(0), vec![]);
    assert!(intersection.is_exit());
    assert_eq!(intersection.select_destination(), None);
}

#[test]
fn test_light_gates_transfer() {
    let light = TrafficLight::new(vec![(LightPhase::Red, 2.0), (LightPhase::Green, 5.0)])
        .expect("valid cycle");
    let mut intersection = Intersection::new(RoadId(0), vec![RoadId(1)]).with_light(light);
    assert!(!intersection.allows_transfer());

    intersection.tick_light(2.0);
    assert!(intersection.allows_transfer());

    let ungated = Intersection::new(RoadId(0), vec![RoadId(1)]);
    assert!(ungated.allows_transfer());
}
