//! Vehicle generator spawning

use traffic_microsim::simulation::{
    GeneratorId, IdAllocator, RoadId, SimId, SimRoad, SimVehicleGenerator, Simulation,
    VehicleClass,
};

const ROAD: RoadId = RoadId(SimId(0));

fn setup(interval: f64) -> (SimVehicleGenerator, SimRoad, IdAllocator) {
    let generator = SimVehicleGenerator::new(GeneratorId(SimId(1)), ROAD, interval, VehicleClass::Bus).unwrap();
    let road = SimRoad::new(ROAD, "R", 200.0).unwrap();
    let mut ids = IdAllocator::new();
    // Skip the ids used above
    ids.next_id();
    ids.next_id();
    (generator, road, ids)
}

#[test]
fn test_spawns_one_vehicle_when_due() {
    let (mut generator, mut road, mut ids) = setup(5.0);

    assert_eq!(generator.update(4.9, &mut road, &mut ids).unwrap(), None);
    assert!(road.is_empty());

    let spawned = generator.update(5.0, &mut road, &mut ids).unwrap().unwrap();
    assert_eq!(road.vehicles().len(), 1);
    let vehicle = road.vehicle(spawned).unwrap();
    assert_eq!(vehicle.position, 0.0);
    assert_eq!(vehicle.speed, 0.0);
    assert_eq!(vehicle.class, VehicleClass::Bus);
    assert_eq!(generator.last_generated, 5.0);

    assert_eq!(generator.update(5.01, &mut road, &mut ids).unwrap(), None);
    assert_eq!(road.vehicles().len(), 1);
}

#[test]
fn test_blocked_origin_is_retried_until_clear() {
    let (mut generator, mut road, mut ids) = setup(5.0);
    let first = generator.update(5.0, &mut road, &mut ids).unwrap().unwrap();

    // Due again, but the first vehicle still sits at the origin
    assert_eq!(generator.update(10.0, &mut road, &mut ids).unwrap(), None);
    assert_eq!(generator.update(10.5, &mut road, &mut ids).unwrap(), None);
    assert_eq!(generator.last_generated, 5.0);
    assert_eq!(road.vehicles().len(), 1);

    road.vehicle_mut(first).unwrap().position = 30.0;
    let second = generator.update(10.6, &mut road, &mut ids).unwrap().unwrap();
    assert_ne!(first, second);
    assert_eq!(road.vehicles().len(), 2);
    assert_eq!(generator.last_generated, 10.6);
}

#[test]
fn test_invalid_interval_is_rejected() {
    for interval in [0.0, -1.0, f64::NAN] {
        assert!(
            SimVehicleGenerator::new(GeneratorId(SimId(1)), ROAD, interval, VehicleClass::Car).is_err(),
            "interval {} accepted",
            interval
        );
    }
}

#[test]
fn test_time_regression_is_rejected() {
    let (mut generator, mut road, mut ids) = setup(5.0);
    generator.update(5.0, &mut road, &mut ids).unwrap();
    assert!(generator.update(4.0, &mut road, &mut ids).is_err());
}

#[test]
fn test_wrong_road_is_rejected() {
    let (mut generator, _road, mut ids) = setup(5.0);
    let mut other = SimRoad::new(RoadId(SimId(3)), "Other", 200.0).unwrap();
    assert!(generator.update(5.0, &mut other, &mut ids).is_err());
    assert!(other.is_empty());
}

#[test]
fn test_generator_on_unknown_road_is_rejected() {
    let mut sim = Simulation::new_with_seed(1);
    assert!(sim.add_generator(RoadId(SimId(7)), 5.0, VehicleClass::Car).is_err());
    assert!(sim.generators().is_empty());
}

#[test]
fn test_generators_feed_the_simulation() {
    let mut sim = Simulation::new_with_seed(1);
    let road = sim.add_road("R", 1000.0).unwrap();
    sim.add_generator(road, 5.0, VehicleClass::Car).unwrap();

    // A little over 10 simulated seconds
    for _ in 0..610 {
        sim.step().unwrap();
    }

    assert_eq!(sim.stats.vehicles_spawned, 2);
    assert_eq!(sim.vehicle_count(), 2);
    for vehicle in sim.road_network.get_road(road).unwrap().vehicles() {
        assert_eq!(vehicle.class, VehicleClass::Car);
    }
}
