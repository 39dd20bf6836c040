//! Vehicle and road kinematics

use traffic_flow::simulation::{Road, RoadId, Vehicle, VehicleId, VEHICLE_LENGTH};

fn vehicle(id: u64, position: f64, speed: f64) -> Vehicle {
    Vehicle::new(VehicleId(id), RoadId(0), position, speed)
}

#[test]
fn test_leaderless_vehicle_accelerates_within_limit() {
    let mut car = vehicle(1, 0.0, 0.0);
    car.advance(1.0, 20.0, f64::INFINITY);

    assert_eq!(car.speed, 2.5);
    assert_eq!(car.position, 2.5);
}

#[test]
fn test_vehicle_cruises_at_speed_limit() {
    let mut car = vehicle(1, 0.0, 50.0);
    car.advance(10.0, 50.0, f64::INFINITY);

    assert_eq!(car.speed, 50.0);
    assert_eq!(car.position, 500.0);
}

#[test]
fn test_desired_speed_caps_cruise() {
    let mut car = vehicle(1, 0.0, 10.0).with_desired_speed(8.0);
    car.advance(1.0, 20.0, f64::INFINITY);

    assert_eq!(car.speed, 8.0);
    assert_eq!(car.position, 8.0);
}

#[test]
fn test_short_gap_slows_follower() {
    let mut car = vehicle(1, 0.0, 10.0);
    car.advance(1.0, 10.0, 10.0);

    // Target halves at half the safe gap; deceleration is not the binding limit
    assert_eq!(car.speed, 5.0);
    assert_eq!(car.position, 5.0);
}

#[test]
fn test_vehicle_never_moves_past_gap() {
    let mut car = vehicle(1, 100.0, 30.0);
    car.advance(1.0, 30.0, 5.0);

    assert_eq!(car.position, 105.0);
    assert_eq!(car.speed, 5.0);
}

#[test]
fn test_enter_road_resets_position_and_caps_speed() {
    let mut car = vehicle(1, 400.0, 25.0);
    car.enter_road(RoadId(3), 15.0);

    assert_eq!(car.position, 0.0);
    assert_eq!(car.speed, 15.0);
    assert_eq!(car.current_road, RoadId(3));
    assert_eq!(car.route_history, vec![RoadId(0), RoadId(3)]);
}

#[test]
fn test_road_keeps_vehicles_in_position_order() {
    let mut road = Road::new(RoadId(0), "A1", 1000.0, 20.0);
    road.insert(vehicle(1, 300.0, 0.0));
    road.insert(vehicle(2, 100.0, 0.0));
    road.insert(vehicle(3, 200.0, 0.0));

    let positions: Vec<f64> = road.vehicles().iter().map(|v| v.position).collect();
    assert_eq!(positions, vec![100.0, 200.0, 300.0]);
}

#[test]
fn test_road_density_and_mean_speed() {
    let mut road = Road::new(RoadId(0), "A1", 2000.0, 30.0);
    assert_eq!(road.mean_speed(), 0.0);
    assert_eq!(road.density(), 0.0);

    for (id, speed) in [(1, 10.0), (2, 20.0), (3, 30.0), (4, 20.0)] {
        road.insert(vehicle(id, id as f64 * 100.0, speed));
    }

    assert_eq!(road.density(), 2.0);
    assert_eq!(road.mean_speed(), 20.0);
    assert_eq!(road.occupancy(), 4.0 * VEHICLE_LENGTH / 2000.0);
}

#[test]
fn test_road_step_uses_leader_position_before_update() {
    let mut road = Road::new(RoadId(0), "A1", 1000.0, 20.0);
    road.insert(vehicle(1, 100.0, 0.0));
    road.insert(vehicle(2, 90.0, 20.0));

    road.step(1.0);

    let follower = &road.vehicles()[0];
    let leader = &road.vehicles()[1];
    assert_eq!(leader.id, VehicleId(1));
    assert_eq!(leader.position, 102.5);
    // Clamped one vehicle length behind where the leader was, not where it went
    assert_eq!(follower.position, 100.0 - VEHICLE_LENGTH);
    assert!(follower.position <= leader.position);
}

#[test]
fn test_road_clamps_at_end() {
    let mut road = Road::new(RoadId(0), "A1", 1000.0, 20.0);
    road.insert(vehicle(1, 990.0, 20.0));

    road.step(1.0);

    assert_eq!(road.vehicles()[0].position, 1000.0);
    assert!(road.vehicle_at_end().is_some());

    assert_eq!(road.hold_queue_at_end(), 1);
    assert_eq!(road.vehicles()[0].speed, 0.0);
    assert!(road.pop_vehicle_at_end().is_some());
    assert!(road.is_empty());
}

#[test]
fn test_no_pass_on_dense_road() {
    let mut road = Road::new(RoadId(0), "Queue", 300.0, 15.0);
    for id in 0..20 {
        road.insert(vehicle(id, id as f64 * 8.0, 15.0 - id as f64 * 0.5));
    }

    for _ in 0..60 {
        road.step(2.0);
        let ids_and_positions: Vec<(VehicleId, f64)> = road
            .vehicles()
            .iter()
            .map(|v| (v.id, v.position))
            .collect();
        for pair in ids_and_positions.windows(2) {
            assert!(pair[0].1 <= pair[1].1, "order broken: {:?}", pair);
            // Inserted further ahead means a higher id here
            assert!(pair[0].0 < pair[1].0, "vehicles swapped: {:?}", pair);
        }
        assert!(road.invariant_violation().is_none());
    }
}

#[test]
fn test_entry_clear_needs_room() {
    let mut road = Road::new(RoadId(0), "A1", 100.0, 10.0);
    assert!(road.entry_is_clear());

    road.insert(vehicle(1, 2.0, 0.0));
    assert!(!road.entry_is_clear());
}
