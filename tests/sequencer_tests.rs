//! Release sequencing onto the main conveyor

use paint_line::simulation::sequencer::{advance, run_candidates, select_lane};
use paint_line::simulation::{
    Color, ConveyorStep, LaneId, LanePool, LaneStatus, MainConveyor, RecentSequence, SimConfig,
};

fn lanes_with(contents: &[&[Color]]) -> LanePool {
    let mut lanes = LanePool::from_specs(&SimConfig::default().lanes);
    for (index, colors) in contents.iter().enumerate() {
        let lane = lanes.get_mut(LaneId(index)).unwrap();
        for &color in colors.iter() {
            assert!(lane.push(color));
        }
    }
    lanes
}

#[test]
fn test_heaviest_run_wins() {
    let lanes = lanes_with(&[&[Color::C1], &[Color::C2, Color::C2]]);

    assert_eq!(select_lane(&lanes), Some(LaneId(1)));
}

#[test]
fn test_run_weight_sums_across_lanes_and_whole_queue() {
    // C1 group: L1 holds two C1, L3 holds one -> 3. C2 group: L2 -> 2.
    let lanes = lanes_with(&[
        &[Color::C1, Color::C2, Color::C1],
        &[Color::C2, Color::C2],
        &[Color::C1],
    ]);

    let candidates = run_candidates(&lanes);
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[0].color, Color::C1);
    assert_eq!(candidates[0].weight, 3);
    assert_eq!(candidates[0].lane, LaneId(0));
    assert_eq!(candidates[1].weight, 2);

    assert_eq!(select_lane(&lanes), Some(LaneId(0)));
}

#[test]
fn test_tied_run_weights_pick_first_group() {
    let lanes = lanes_with(&[&[], &[Color::C5, Color::C5], &[Color::C6, Color::C6]]);

    assert_eq!(select_lane(&lanes), Some(LaneId(1)));
}

#[test]
fn test_group_releases_from_its_first_lane() {
    let lanes = lanes_with(&[&[Color::C3], &[Color::C4], &[Color::C4, Color::C4, Color::C4]]);

    assert_eq!(select_lane(&lanes), Some(LaneId(1)));
}

#[test]
fn test_unavailable_lanes_are_not_released() {
    let mut lanes = lanes_with(&[&[Color::C1, Color::C1, Color::C1], &[Color::C2]]);
    lanes.get_mut(LaneId(0)).unwrap().mark_unavailable();

    assert_eq!(select_lane(&lanes), Some(LaneId(1)));
}

#[test]
fn test_empty_lanes_leave_conveyor_idle() {
    let mut lanes = lanes_with(&[]);
    let mut conveyor = MainConveyor::new();

    assert_eq!(advance(&mut conveyor, &mut lanes), ConveyorStep::Idle);
    assert!(!conveyor.is_occupied());
    assert_eq!(conveyor.feeding_from(), None);
}

#[test]
fn test_car_is_in_transit_for_a_full_tick() {
    let mut lanes = lanes_with(&[&[Color::C8, Color::C9]]);
    let mut conveyor = MainConveyor::new();

    let first = advance(&mut conveyor, &mut lanes);
    assert_eq!(
        first,
        ConveyorStep::Loaded {
            lane: LaneId(0),
            car: Color::C8
        }
    );
    assert_eq!(conveyor.feeding_from(), Some(LaneId(0)));
    assert_eq!(conveyor.current_car(), Some(Color::C8));

    // The occupant retires; nothing new is loaded in the same tick
    assert_eq!(advance(&mut conveyor, &mut lanes), ConveyorStep::Retired(Color::C8));
    assert!(!conveyor.is_occupied());
    assert_eq!(lanes.get(LaneId(0)).unwrap().len(), 1);

    assert!(matches!(
        advance(&mut conveyor, &mut lanes),
        ConveyorStep::Loaded { car: Color::C9, .. }
    ));
}

#[test]
fn test_full_lane_becomes_active_after_release() {
    let capacity = SimConfig::default().lanes[0].capacity;
    let full = vec![Color::C2; capacity];
    let mut lanes = lanes_with(&[full.as_slice()]);
    assert_eq!(lanes.get(LaneId(0)).unwrap().status(), LaneStatus::Full);

    let mut conveyor = MainConveyor::new();
    advance(&mut conveyor, &mut lanes);

    assert_eq!(lanes.get(LaneId(0)).unwrap().status(), LaneStatus::Active);
}

#[test]
fn test_full_lanes_still_release() {
    let capacity = SimConfig::default().lanes[0].capacity;
    let full = vec![Color::C2; capacity];
    let lanes = lanes_with(&[full.as_slice(), &[Color::C3]]);

    assert_eq!(select_lane(&lanes), Some(LaneId(0)));
}

#[test]
fn test_recent_sequence_keeps_newest_entries() {
    let mut recent = RecentSequence::new(15);
    let colors: Vec<Color> = (0..20).map(|i| Color::ALL[i % Color::ALL.len()]).collect();
    for &color in &colors {
        recent.push(color);
    }

    assert_eq!(recent.len(), 15);
    assert_eq!(recent.to_vec(), colors[5..].to_vec());
}
