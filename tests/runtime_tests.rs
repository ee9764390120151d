//! Wall-clock runtime: commands, heartbeat and recovery timers

use std::thread;
use std::time::Duration;

use paint_line::runtime::{Command, Reply, Simulator};
use paint_line::simulation::{LaneId, LaneStatus, LineWorld, OvenId, OvenStatus, SimConfig};

fn simulator(config: SimConfig) -> Simulator {
    Simulator::new(LineWorld::new(config).expect("valid config"))
}

fn quiet() -> SimConfig {
    SimConfig {
        breakdown_probability: 0.0,
        ..SimConfig::seeded(1)
    }
}

#[test]
fn test_command_parsing() {
    assert_eq!("start".parse::<Command>().unwrap(), Command::Start);
    assert_eq!("  pause ".parse::<Command>().unwrap(), Command::Pause);
    assert_eq!("reset".parse::<Command>().unwrap(), Command::Reset);
    assert_eq!("status".parse::<Command>().unwrap(), Command::Status);
    assert_eq!("quit".parse::<Command>().unwrap(), Command::Quit);
    assert_eq!(
        "oven O2 stopped".parse::<Command>().unwrap(),
        Command::SetOven(OvenId::O2, OvenStatus::Stopped)
    );
    assert_eq!(
        "lane L3 down".parse::<Command>().unwrap(),
        Command::LaneDown(LaneId(2))
    );
    assert_eq!("lane l9 up".parse::<Command>().unwrap(), Command::LaneUp(LaneId(8)));

    assert!("".parse::<Command>().is_err());
    assert!("launch".parse::<Command>().is_err());
    assert!("oven O3 active".parse::<Command>().is_err());
    assert!("lane L0 down".parse::<Command>().is_err());
}

#[test]
fn test_lifecycle_commands_always_acknowledge() {
    let sim = simulator(quiet());

    // Pause while stopped is a harmless no-op
    assert_eq!(sim.apply(Command::Pause).unwrap(), Reply::Ack("paused".to_string()));
    assert_eq!(sim.apply(Command::Start).unwrap(), Reply::Ack("started".to_string()));
    assert_eq!(sim.apply(Command::Start).unwrap(), Reply::Ack("started".to_string()));

    let snapshot = sim.snapshot();
    assert!(snapshot.is_running);
    assert!(!snapshot.is_paused);

    sim.apply(Command::Pause).unwrap();
    assert!(sim.snapshot().is_paused);

    assert_eq!(sim.apply(Command::Reset).unwrap(), Reply::Ack("reset".to_string()));
    let snapshot = sim.snapshot();
    assert!(!snapshot.is_running);
    assert!(!snapshot.is_paused);
    assert_eq!(snapshot.kpis.total_cars_processed, 0);
}

#[test]
fn test_status_and_control_commands() {
    let sim = simulator(quiet());

    match sim.apply(Command::Status).unwrap() {
        Reply::Status(snapshot) => assert_eq!(snapshot.lines.len(), 9),
        other => panic!("expected status, got {:?}", other),
    }

    sim.apply(Command::SetOven(OvenId::O1, OvenStatus::Stopped)).unwrap();
    assert_eq!(sim.snapshot().ovens[&OvenId::O1].status, OvenStatus::Stopped);

    sim.apply(Command::LaneDown(LaneId(4))).unwrap();
    assert_eq!(sim.snapshot().lines[&LaneId(4)].status, LaneStatus::Unavailable);
    sim.apply(Command::LaneUp(LaneId(4))).unwrap();
    assert_eq!(sim.snapshot().lines[&LaneId(4)].status, LaneStatus::Active);

    assert!(sim.apply(Command::LaneDown(LaneId(30))).is_err());
    assert_eq!(sim.apply(Command::Quit).unwrap(), Reply::Quit);
}

#[test]
fn test_snapshot_json_round_trips_through_serde_json() {
    let sim = simulator(quiet());
    sim.apply(Command::Start).unwrap();
    sim.tick_now();

    let json = sim.snapshot_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let keys = [
        "kpis",
        "recent_sequence",
        "ovens",
        "lines",
        "main_line",
        "is_running",
        "is_paused",
    ];
    for key in keys {
        assert!(value.get(key).is_some(), "missing key {}", key);
    }
    let main_line = &value["main_line"];
    assert_eq!(
        main_line["current_car"].is_string(),
        main_line["feeding_from"].is_string()
    );
}

#[test]
fn test_heartbeat_only_ticks_while_running() {
    let config = SimConfig {
        tick_period_ms: 10,
        ..quiet()
    };
    let mut sim = simulator(config);
    sim.spawn_heartbeat();

    thread::sleep(Duration::from_millis(100));
    assert_eq!(sim.with_world(|world| world.ticks()), 0);

    sim.apply(Command::Start).unwrap();
    thread::sleep(Duration::from_millis(300));
    sim.apply(Command::Pause).unwrap();

    let (ticks, backlog, accounted, generated) = sim.with_world(|world| {
        (
            world.ticks(),
            world.source.len(),
            world.accounted_cars(),
            world.generated_cars(),
        )
    });
    assert!(ticks > 0);
    assert!(backlog < 120);
    assert_eq!(accounted, generated);

    // Paused: the heartbeat keeps running but nothing advances
    thread::sleep(Duration::from_millis(100));
    assert_eq!(sim.with_world(|world| world.ticks()), ticks);
}

#[test]
fn test_recovery_timer_heals_lane_while_paused() {
    let config = SimConfig {
        breakdown_probability: 1.0,
        recovery_delay_secs: 1,
        ..SimConfig::seeded(4)
    };
    let sim = simulator(config);
    sim.apply(Command::Start).unwrap();

    let timer = sim
        .tick_now()
        .recovery()
        .expect("nine active lanes always allow a breakdown");
    sim.apply(Command::Pause).unwrap();

    // Still down once the line is paused; the timer has not fired yet
    let status = sim.snapshot().lines[&timer.lane].status;
    assert_eq!(status, LaneStatus::Unavailable);

    let mut healed = false;
    for _ in 0..300 {
        healed = sim.with_world(|world| world.lanes.get(timer.lane).unwrap().is_available());
        if healed {
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }

    assert!(healed, "lane {} never recovered", timer.lane);
    assert!(sim.snapshot().is_paused);
    assert_eq!(sim.with_world(|world| world.ticks()), 1);
}
