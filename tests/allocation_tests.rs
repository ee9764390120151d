//! Lane allocation heuristics
//!
//! Continuation first, least-filled fallback, oven rerouting and backpressure.

use rand::rngs::StdRng;
use rand::SeedableRng;

use paint_line::simulation::allocator::{allocate, choose_placement, place_car, select_lane};
use paint_line::simulation::{
    AllocationStrategy, CarSource, Color, LaneId, LanePool, OvenId, OvenRegistry, OvenStatus,
    Placement, SimConfig, COLOR_DISTRIBUTION,
};

const DEFAULT: AllocationStrategy = AllocationStrategy::Continuation;

fn default_lanes() -> LanePool {
    LanePool::from_specs(&SimConfig::default().lanes)
}

fn fill(lanes: &mut LanePool, lane: usize, colors: &[Color]) {
    let lane = lanes.get_mut(LaneId(lane)).expect("lane exists");
    for &color in colors {
        assert!(lane.push(color), "lane {} overflowed in test setup", lane.id);
    }
}

fn fill_to_capacity(lanes: &mut LanePool, lane: usize, color: Color) {
    let capacity = lanes.get(LaneId(lane)).expect("lane exists").capacity;
    fill(lanes, lane, &vec![color; capacity]);
}

#[test]
fn test_continuation_beats_empty_lane() {
    let mut lanes = default_lanes();
    fill(&mut lanes, 0, &[Color::C1, Color::C1]);
    let ovens = OvenRegistry::new();

    let placement = place_car(&mut lanes, &ovens, DEFAULT, Color::C1, OvenId::O1);

    assert_eq!(placement, Placement::Placed(LaneId(0)));
    assert_eq!(lanes.get(LaneId(0)).unwrap().len(), 3);
    assert!(lanes.get(LaneId(1)).unwrap().is_empty());
}

#[test]
fn test_no_continuation_falls_back_to_emptiest_lane() {
    let mut lanes = default_lanes();
    fill(&mut lanes, 0, &[Color::C3]);
    let ovens = OvenRegistry::new();

    let placement = place_car(&mut lanes, &ovens, DEFAULT, Color::C5, OvenId::O1);

    assert_eq!(placement, Placement::Placed(LaneId(1)));
}

#[test]
fn test_least_filled_ties_go_to_lowest_lane_id() {
    let mut lanes = default_lanes();
    fill(&mut lanes, 0, &[Color::C3, Color::C3]);
    fill(&mut lanes, 1, &[Color::C4]);
    fill(&mut lanes, 2, &[Color::C6]);
    fill(&mut lanes, 3, &[Color::C7]);

    assert_eq!(select_lane(&lanes, OvenId::O1, Color::C5), Some(LaneId(1)));
}

#[test]
fn test_continuation_uses_tail_not_front() {
    let mut lanes = default_lanes();
    fill(&mut lanes, 0, &[Color::C2]);
    fill(&mut lanes, 1, &[Color::C2, Color::C2, Color::C9]);

    // L2 ends in C9, so only L1 continues a C2 run
    assert_eq!(select_lane(&lanes, OvenId::O1, Color::C2), Some(LaneId(0)));
    assert_eq!(select_lane(&lanes, OvenId::O1, Color::C9), Some(LaneId(1)));
}

#[test]
fn test_full_continuation_lane_is_skipped() {
    let mut lanes = default_lanes();
    fill_to_capacity(&mut lanes, 0, Color::C1);

    assert_eq!(select_lane(&lanes, OvenId::O1, Color::C1), Some(LaneId(1)));
}

#[test]
fn test_unavailable_lanes_are_not_eligible() {
    let mut lanes = default_lanes();
    fill(&mut lanes, 0, &[Color::C1]);
    lanes.get_mut(LaneId(0)).unwrap().mark_unavailable();

    assert_eq!(select_lane(&lanes, OvenId::O1, Color::C1), Some(LaneId(1)));
}

#[test]
fn test_lanes_are_scoped_to_their_oven() {
    let lanes = default_lanes();

    assert_eq!(select_lane(&lanes, OvenId::O1, Color::C4), Some(LaneId(0)));
    assert_eq!(select_lane(&lanes, OvenId::O2, Color::C4), Some(LaneId(4)));
}

#[test]
fn test_saturated_primary_oven_reroutes_to_alternate() {
    let mut lanes = default_lanes();
    for lane in 0..4 {
        fill_to_capacity(&mut lanes, lane, Color::C2);
    }
    let ovens = OvenRegistry::new();

    let placement = choose_placement(&lanes, &ovens, DEFAULT, Color::C1, OvenId::O1);

    assert_eq!(placement, Placement::Placed(LaneId(4)));
}

#[test]
fn test_stopped_primary_oven_uses_alternate_only() {
    let mut lanes = default_lanes();
    fill(&mut lanes, 0, &[Color::C1]);
    let mut ovens = OvenRegistry::new();
    ovens.set_status(OvenId::O1, OvenStatus::Stopped);

    // L1 would be a continuation match, but its oven is stopped
    let placement = choose_placement(&lanes, &ovens, DEFAULT, Color::C1, OvenId::O1);

    assert_eq!(placement, Placement::Placed(LaneId(4)));
}

#[test]
fn test_stopped_primary_and_full_alternate_saturates() {
    let mut lanes = default_lanes();
    for lane in 4..9 {
        fill_to_capacity(&mut lanes, lane, Color::C3);
    }
    let mut ovens = OvenRegistry::new();
    ovens.set_status(OvenId::O1, OvenStatus::Stopped);

    let placement = choose_placement(&lanes, &ovens, DEFAULT, Color::C1, OvenId::O1);

    assert_eq!(placement, Placement::Saturated);
}

#[test]
fn test_both_ovens_stopped_holds_cars_without_alert() {
    let mut lanes = default_lanes();
    let mut ovens = OvenRegistry::new();
    ovens.set_status(OvenId::O1, OvenStatus::Stopped);
    ovens.set_status(OvenId::O2, OvenStatus::Stopped);
    let mut source = CarSource::from_cars([Color::C1, Color::C2, Color::C3]);
    let mut rng = StdRng::seed_from_u64(1);

    let report = allocate(&mut source, &mut lanes, &ovens, DEFAULT, &mut rng, 2);

    assert!(report.placed.is_empty());
    assert_eq!(report.saturated, 0);
    assert_eq!(report.requeued, vec![Color::C1, Color::C2]);
    let backlog: Vec<Color> = source.iter().copied().collect();
    assert_eq!(backlog, vec![Color::C1, Color::C2, Color::C3]);
}

#[test]
fn test_saturation_requeues_in_backlog_order() {
    let mut lanes = default_lanes();
    for lane in 0..9 {
        fill_to_capacity(&mut lanes, lane, Color::C12);
    }
    let ovens = OvenRegistry::new();
    let mut source = CarSource::from_cars([Color::C1, Color::C2, Color::C3]);
    let mut rng = StdRng::seed_from_u64(2);

    let report = allocate(&mut source, &mut lanes, &ovens, DEFAULT, &mut rng, 2);

    assert_eq!(report.saturated, 2);
    let backlog: Vec<Color> = source.iter().copied().collect();
    assert_eq!(backlog, vec![Color::C1, Color::C2, Color::C3]);
}

#[test]
fn test_allocate_places_up_to_per_tick_cars() {
    let mut lanes = default_lanes();
    let ovens = OvenRegistry::new();
    let mut source = CarSource::from_cars([Color::C1, Color::C1, Color::C4]);
    let mut rng = StdRng::seed_from_u64(3);

    let report = allocate(&mut source, &mut lanes, &ovens, DEFAULT, &mut rng, 2);

    assert_eq!(report.placed.len(), 2);
    assert_eq!(source.len(), 1);
    assert_eq!(lanes.queued_cars(), 2);
}

#[test]
fn test_generated_population_matches_distribution() {
    let mut rng = StdRng::seed_from_u64(42);
    let source = CarSource::generate(&COLOR_DISTRIBUTION, &mut rng);

    assert_eq!(source.len(), 120);
    assert_eq!(source.generated(), 120);
    for (color, count) in COLOR_DISTRIBUTION {
        assert_eq!(
            source.iter().filter(|&&car| car == color).count(),
            count,
            "wrong number of {} cars",
            color
        );
    }
}

#[test]
fn test_generated_population_is_shuffled() {
    let mut rng = StdRng::seed_from_u64(42);
    let source = CarSource::generate(&COLOR_DISTRIBUTION, &mut rng);
    let in_table_order: Vec<Color> = COLOR_DISTRIBUTION
        .iter()
        .flat_map(|&(color, count)| std::iter::repeat(color).take(count))
        .collect();

    let shuffled: Vec<Color> = source.iter().copied().collect();
    assert_ne!(shuffled, in_table_order);
}

#[test]
fn test_dequeue_returns_fewer_when_backlog_short() {
    let mut source = CarSource::from_cars([Color::C7]);

    assert_eq!(source.dequeue(2), vec![Color::C7]);
    assert!(source.dequeue(2).is_empty());
    assert!(source.is_empty());
}

#[test]
fn test_fifo_ignores_color() {
    let mut lanes = default_lanes();
    fill(&mut lanes, 0, &[Color::C3]);
    fill(&mut lanes, 1, &[Color::C5]);
    let fifo = AllocationStrategy::Fifo;

    assert_eq!(fifo.select_lane(&lanes, OvenId::O1, Color::C5), Some(LaneId(0)));

    fill_to_capacity(&mut lanes, 0, Color::C3);
    assert_eq!(fifo.select_lane(&lanes, OvenId::O1, Color::C5), Some(LaneId(1)));
}

#[test]
fn test_greedy_continues_runs_then_takes_first_lane_with_room() {
    let mut lanes = default_lanes();
    fill(&mut lanes, 0, &[Color::C3, Color::C3]);
    fill(&mut lanes, 1, &[Color::C5]);
    let greedy = AllocationStrategy::Greedy;

    assert_eq!(greedy.select_lane(&lanes, OvenId::O1, Color::C5), Some(LaneId(1)));
    // No run to continue: greedy stays on L1 where the default balances to L3
    assert_eq!(greedy.select_lane(&lanes, OvenId::O1, Color::C7), Some(LaneId(0)));
    assert_eq!(select_lane(&lanes, OvenId::O1, Color::C7), Some(LaneId(2)));
}

#[test]
fn test_hybrid_sends_rare_colors_to_emptiest_lane() {
    let mut lanes = default_lanes();
    fill(&mut lanes, 0, &[Color::C1]);
    fill(&mut lanes, 1, &[Color::C10, Color::C2]);
    let hybrid = AllocationStrategy::Hybrid;

    // L3 and L4 are both empty; the lower id wins
    assert_eq!(hybrid.select_lane(&lanes, OvenId::O1, Color::C9), Some(LaneId(2)));

    // A matching tail still beats the rare rule
    fill(&mut lanes, 3, &[Color::C9]);
    assert_eq!(hybrid.select_lane(&lanes, OvenId::O1, Color::C9), Some(LaneId(3)));
}

#[test]
fn test_hybrid_prefers_tail_of_same_band() {
    let mut lanes = default_lanes();
    fill(&mut lanes, 0, &[Color::C1]);
    fill(&mut lanes, 1, &[Color::C3]);
    let hybrid = AllocationStrategy::Hybrid;

    // C4 is medium like C3: 13 free + 20 band bonus beats an empty lane's 14
    assert_eq!(hybrid.select_lane(&lanes, OvenId::O1, Color::C4), Some(LaneId(1)));
    assert_eq!(select_lane(&lanes, OvenId::O1, Color::C4), Some(LaneId(2)));
}

#[test]
fn test_every_strategy_reroutes_and_saturates() {
    for strategy in AllocationStrategy::ALL {
        let mut lanes = default_lanes();
        for lane in 0..4 {
            fill_to_capacity(&mut lanes, lane, Color::C2);
        }
        let ovens = OvenRegistry::new();

        assert_eq!(
            choose_placement(&lanes, &ovens, strategy, Color::C2, OvenId::O1),
            Placement::Placed(LaneId(4)),
            "{} did not reroute",
            strategy
        );

        for lane in 4..9 {
            fill_to_capacity(&mut lanes, lane, Color::C2);
        }
        assert_eq!(
            choose_placement(&lanes, &ovens, strategy, Color::C2, OvenId::O2),
            Placement::Saturated,
            "{} placed a car on a full line",
            strategy
        );
    }
}

#[test]
fn test_reroutes_are_counted() {
    let mut rng = StdRng::seed_from_u64(4);
    let ovens = OvenRegistry::new();
    let mut lanes = default_lanes();
    let mut source = CarSource::from_cars([Color::C1; 40]);

    let report = allocate(&mut source, &mut lanes, &ovens, DEFAULT, &mut rng, 40);
    assert_eq!(report.placed.len(), 40);
    assert_eq!(report.rerouted, 0);

    let mut stopped = OvenRegistry::new();
    stopped.set_status(OvenId::O1, OvenStatus::Stopped);
    let mut lanes = default_lanes();
    let mut source = CarSource::from_cars([Color::C1; 40]);

    // Every car that drew O1 lands on O2 instead
    let report = allocate(&mut source, &mut lanes, &stopped, DEFAULT, &mut rng, 40);
    assert_eq!(report.placed.len(), 40);
    assert!(report.rerouted > 0 && report.rerouted < 40);
    assert!(report.placed.iter().all(|&(_, lane)| lane.0 >= 4));
}

#[test]
fn test_strategy_names_parse() {
    assert_eq!("fifo".parse::<AllocationStrategy>().unwrap(), AllocationStrategy::Fifo);
    assert_eq!(" Hybrid ".parse::<AllocationStrategy>().unwrap(), AllocationStrategy::Hybrid);
    assert!("round-robin".parse::<AllocationStrategy>().is_err());
    assert_eq!(SimConfig::default().strategy, AllocationStrategy::Continuation);

    let config: SimConfig = serde_json::from_str(r#"{"strategy": "greedy"}"#).unwrap();
    assert_eq!(config.strategy, AllocationStrategy::Greedy);
    for strategy in AllocationStrategy::ALL {
        assert_eq!(strategy.to_string().parse::<AllocationStrategy>().unwrap(), strategy);
    }
}
