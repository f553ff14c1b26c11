//! Vehicle kinematics, light compliance and bus-stop dwell

use traffic_microsim::simulation::{
    DwellStatus, LeadingVehicle, LightId, RoadId, SimBusStop, SimId, SimTrafficLight, SimVehicle,
    StopId, VehicleClass, VehicleId, MAX_ACCELERATION, MAX_BRAKING, MAX_SPEED, TICK,
};

fn vehicle(class: VehicleClass, position: f64) -> SimVehicle {
    SimVehicle::new(VehicleId(SimId(1)), class, RoadId(SimId(0)), position).unwrap()
}

fn red_light(id: usize, position: f64) -> SimTrafficLight {
    let mut light = SimTrafficLight::new(LightId(SimId(id)), RoadId(SimId(0)), position, 10.0).unwrap();
    light.update(10.0).unwrap();
    assert!(light.is_red());
    light
}

fn stop(id: usize, position: f64, dwell: f64) -> SimBusStop {
    SimBusStop::new(StopId(SimId(id)), RoadId(SimId(0)), position, dwell).unwrap()
}

#[test]
fn test_new_vehicle_starts_at_rest() {
    let car = vehicle(VehicleClass::Car, 12.0);
    assert_eq!(car.position, 12.0);
    assert_eq!(car.speed, 0.0);
    assert_eq!(car.acceleration, 0.0);
    assert!(car.dwell.is_empty());
}

#[test]
fn test_negative_position_is_rejected() {
    let result = SimVehicle::new(VehicleId(SimId(1)), VehicleClass::Car, RoadId(SimId(0)), -1.0);
    assert!(result.is_err());
}

#[test]
fn test_free_road_acceleration_is_positive_from_rest() {
    let mut car = vehicle(VehicleClass::Car, 0.0);
    car.compute_acceleration(None);
    assert!(car.acceleration > 0.0);
    assert!((car.acceleration - MAX_ACCELERATION).abs() < 1e-12);
}

#[test]
fn test_free_road_acceleration_vanishes_at_max_speed() {
    let mut car = vehicle(VehicleClass::Car, 0.0);
    car.speed = MAX_SPEED;
    car.compute_acceleration(None);
    assert!(car.acceleration.abs() < 1e-12);
}

#[test]
fn test_follower_brakes_when_closing_in_on_leader() {
    let mut car = vehicle(VehicleClass::Car, 0.0);
    car.speed = 10.0;
    car.compute_acceleration(Some(LeadingVehicle {
        position: 6.0,
        speed: 0.0,
    }));
    assert!(car.acceleration < 0.0);
}

#[test]
fn test_distant_leader_barely_affects_acceleration() {
    let mut car = vehicle(VehicleClass::Car, 0.0);
    car.compute_acceleration(Some(LeadingVehicle {
        position: 500.0,
        speed: 0.0,
    }));
    assert!(car.acceleration > 0.99 * MAX_ACCELERATION);
}

#[test]
fn test_overlapping_leader_gives_finite_braking() {
    let mut car = vehicle(VehicleClass::Car, 10.0);
    car.speed = 5.0;
    car.compute_acceleration(Some(LeadingVehicle {
        position: 11.0,
        speed: 5.0,
    }));
    assert!(car.acceleration.is_finite());
    assert!(car.acceleration < 0.0);
}

#[test]
fn test_red_light_ahead_forces_maximum_braking() {
    let mut car = vehicle(VehicleClass::Car, 90.0);
    car.compute_acceleration(None);
    car.apply_traffic_light_rules(&[red_light(5, 100.0)]);
    assert!(car.acceleration <= -MAX_BRAKING);
}

#[test]
fn test_green_or_distant_or_passed_lights_are_ignored() {
    let green = SimTrafficLight::new(LightId(SimId(5)), RoadId(SimId(0)), 100.0, 10.0).unwrap();
    let far = red_light(6, 200.0);
    let behind = red_light(7, 80.0);

    let mut car = vehicle(VehicleClass::Car, 90.0);
    car.compute_acceleration(None);
    car.apply_traffic_light_rules(&[green, far, behind]);
    assert!((car.acceleration - MAX_ACCELERATION).abs() < 1e-12);
}

#[test]
fn test_strongest_braking_wins_across_lights() {
    let mut car = vehicle(VehicleClass::Car, 90.0);
    car.compute_acceleration(None);
    car.apply_traffic_light_rules(&[red_light(5, 95.0), red_light(6, 104.0)]);
    assert!(car.acceleration <= -MAX_BRAKING);

    let mut reversed = vehicle(VehicleClass::Car, 90.0);
    reversed.compute_acceleration(None);
    reversed.apply_traffic_light_rules(&[red_light(6, 104.0), red_light(5, 95.0)]);
    assert_eq!(car.acceleration, reversed.acceleration);
}

#[test]
fn test_integrate_moves_vehicle_forward() {
    let mut car = vehicle(VehicleClass::Car, 0.0);
    car.acceleration = MAX_ACCELERATION;
    car.integrate(TICK).unwrap();

    let expected_speed = MAX_ACCELERATION * TICK;
    assert!((car.speed - expected_speed).abs() < 1e-12);
    let expected_position = expected_speed * TICK + 0.5 * MAX_ACCELERATION * TICK * TICK;
    assert!((car.position - expected_position).abs() < 1e-12);
}

#[test]
fn test_integrate_clamps_to_max_speed() {
    let mut car = vehicle(VehicleClass::Car, 0.0);
    car.speed = MAX_SPEED;
    car.acceleration = MAX_ACCELERATION;
    car.integrate(TICK).unwrap();
    assert_eq!(car.speed, MAX_SPEED);
}

#[test]
fn test_integrate_stops_at_zero_instead_of_reversing() {
    let mut car = vehicle(VehicleClass::Car, 50.0);
    car.speed = 1.0;
    car.acceleration = -100.0;
    car.integrate(TICK).unwrap();

    assert_eq!(car.speed, 0.0);
    // Distance covered while braking from 1.0 to 0 at 100 m/s^2
    assert!((car.position - 50.005).abs() < 1e-9);
}

#[test]
fn test_integrate_rejects_non_positive_time_step() {
    let mut car = vehicle(VehicleClass::Car, 0.0);
    assert!(car.integrate(0.0).is_err());
    assert!(car.integrate(-TICK).is_err());
}

#[test]
fn test_speed_stays_within_bounds_over_many_ticks() {
    let mut car = vehicle(VehicleClass::Car, 0.0);
    for tick in 0..5000 {
        if tick % 700 < 350 {
            car.compute_acceleration(None);
        } else {
            car.acceleration = -MAX_BRAKING;
        }
        car.integrate(TICK).unwrap();
        assert!(car.speed >= 0.0 && car.speed <= MAX_SPEED, "speed {} out of range", car.speed);
        assert!(car.position >= 0.0);
    }
}

#[test]
fn test_bus_waits_for_dwell_duration() {
    let stop = stop(3, 50.2, 0.1);
    let mut bus = vehicle(VehicleClass::Bus, 50.0);
    bus.speed = 8.0;

    let mut waiting_ticks = 0;
    while bus.evaluate_dwell(&stop) == DwellStatus::Waiting {
        assert_eq!(bus.speed, 0.0);
        assert!(bus.is_dwelling());
        waiting_ticks += 1;
        assert!(waiting_ticks < 100, "bus never left the stop");
    }

    assert_eq!(waiting_ticks, 7);
    assert!(!bus.is_dwelling());
    // Stays released while still at the stop
    assert_eq!(bus.evaluate_dwell(&stop), DwellStatus::NotWaiting);
}

#[test]
fn test_only_buses_dwell() {
    let stop = stop(3, 50.0, 5.0);
    for class in VehicleClass::ALL {
        let mut v = vehicle(class, 50.0);
        v.speed = 3.0;
        let status = v.evaluate_dwell(&stop);
        if class == VehicleClass::Bus {
            assert_eq!(status, DwellStatus::Waiting);
        } else {
            assert_eq!(status, DwellStatus::NotWaiting);
            assert_eq!(v.speed, 3.0);
        }
    }
}

#[test]
fn test_bus_away_from_stop_does_not_wait() {
    let stop = stop(3, 50.0, 5.0);
    let mut bus = vehicle(VehicleClass::Bus, 49.0);
    assert_eq!(bus.evaluate_dwell(&stop), DwellStatus::NotWaiting);
    assert!(bus.dwell.is_empty());
}

#[test]
fn test_zero_dwell_duration_never_waits() {
    let stop = stop(3, 50.0, 0.0);
    let mut bus = vehicle(VehicleClass::Bus, 50.0);
    assert_eq!(bus.evaluate_dwell(&stop), DwellStatus::NotWaiting);
}

#[test]
fn test_leaving_the_stop_resets_the_wait() {
    let stop = stop(3, 50.0, 1.0);
    let mut bus = vehicle(VehicleClass::Bus, 50.0);
    for _ in 0..3 {
        assert_eq!(bus.evaluate_dwell(&stop), DwellStatus::Waiting);
    }

    bus.position = 60.0;
    assert_eq!(bus.evaluate_dwell(&stop), DwellStatus::NotWaiting);
    assert!(bus.dwell.is_empty());

    bus.position = 50.0;
    assert_eq!(bus.evaluate_dwell(&stop), DwellStatus::Waiting);
    let dwell = bus.dwell_at(stop.id).unwrap();
    assert!((dwell.elapsed - TICK).abs() < 1e-12);
}

#[test]
fn test_dwell_timers_are_per_vehicle() {
    let stop = stop(3, 50.0, 0.1);
    let mut first = vehicle(VehicleClass::Bus, 50.0);
    let mut second = SimVehicle::new(VehicleId(SimId(2)), VehicleClass::Bus, RoadId(SimId(0)), 50.1).unwrap();

    while first.evaluate_dwell(&stop) == DwellStatus::Waiting {}

    // The second bus starts its own wait from zero
    assert_eq!(second.evaluate_dwell(&stop), DwellStatus::Waiting);
    assert!((second.dwell_at(stop.id).unwrap().elapsed - TICK).abs() < 1e-12);
}

#[test]
fn test_dwell_timers_are_per_stop() {
    let near = stop(3, 50.0, 1.0);
    let other = stop(4, 150.0, 1.0);
    let mut bus = vehicle(VehicleClass::Bus, 50.0);

    assert_eq!(bus.evaluate_dwell(&near), DwellStatus::Waiting);
    // Checking a stop the bus is not at leaves the running wait alone
    assert_eq!(bus.evaluate_dwell(&other), DwellStatus::NotWaiting);
    assert!(bus.dwell_at(other.id).is_none());
    assert_eq!(bus.evaluate_dwell(&near), DwellStatus::Waiting);
    assert!((bus.dwell_at(near.id).unwrap().elapsed - 2.0 * TICK).abs() < 1e-12);
}

#[test]
fn test_overlapping_stops_keep_separate_timers() {
    let first = stop(3, 50.0, 0.1);
    let second = stop(4, 50.3, 0.1);
    let mut bus = vehicle(VehicleClass::Bus, 50.0);

    let mut waiting_ticks = 0;
    loop {
        let a = bus.evaluate_dwell(&first);
        let b = bus.evaluate_dwell(&second);
        if a == DwellStatus::NotWaiting && b == DwellStatus::NotWaiting {
            break;
        }
        waiting_ticks += 1;
        assert!(waiting_ticks < 100, "bus held by overlapping stops");
    }

    assert_eq!(waiting_ticks, 7);
    assert_eq!(bus.dwell.len(), 2);
    assert!(!bus.is_dwelling());
}
