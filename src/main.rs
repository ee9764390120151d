use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use paint_line::runtime::{Command, Reply, Simulator, VirtualClock};
use paint_line::simulation::{palette, AllocationStrategy, Color, Kpis, LineWorld, SimConfig};

#[derive(Parser)]
#[command(name = "paint_line")]
#[command(about = "Paint shop color-sequencing line simulation")]
struct Cli {
    /// Drive the line on the wall clock and read commands from stdin
    #[arg(long)]
    console: bool,

    /// Number of simulation ticks to run in headless mode
    #[arg(long, default_value = "400")]
    ticks: u32,

    /// Print the lane map every this many ticks in headless mode
    #[arg(long, default_value = "50")]
    report_every: u32,

    /// Load the full configuration from a JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Heartbeat period in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Chance per tick of a lane breakdown
    #[arg(long)]
    breakdown_probability: Option<f64>,

    /// Seconds a lane is protected from another breakdown
    #[arg(long)]
    cooldown_secs: Option<u64>,

    /// Seconds until a broken lane recovers
    #[arg(long)]
    recovery_secs: Option<u64>,

    /// Lane allocation strategy: continuation, fifo, greedy or hybrid
    #[arg(long)]
    strategy: Option<AllocationStrategy>,

    /// Also run a FIFO baseline on the same backlog and compare KPIs
    #[arg(long)]
    baseline: bool,

    /// Print the final status snapshot as JSON
    #[arg(long)]
    json: bool,

    /// Print the color palette and exit
    #[arg(long)]
    palette: bool,
}

impl Cli {
    fn sim_config(&self) -> Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => SimConfig::from_json_file(path)?,
            None => SimConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(tick_ms) = self.tick_ms {
            config.tick_period_ms = tick_ms;
        }
        if let Some(probability) = self.breakdown_probability {
            config.breakdown_probability = probability;
        }
        if let Some(cooldown) = self.cooldown_secs {
            config.breakdown_cooldown_secs = cooldown;
        }
        if let Some(recovery) = self.recovery_secs {
            config.recovery_delay_secs = recovery;
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if self.baseline && config.seed.is_none() {
            // Both runs need the same backlog
            config.seed = Some(rand::random());
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,paint_line=info"),
    )
    .init();

    let cli = Cli::parse();

    if cli.palette {
        print_palette();
        return Ok(());
    }

    let config = cli.sim_config()?;
    let world = LineWorld::new(config.clone())?;

    if cli.console {
        return run_console(world);
    }

    let kpis = run_headless(world, cli.ticks, cli.report_every, cli.json)?;
    if cli.baseline {
        compare_with_baseline(&config, cli.ticks, &kpis)?;
    }
    Ok(())
}

fn print_palette() {
    for color in Color::ALL {
        let swatch = palette::swatch(color);
        println!(
            "{:<4} {:<8} {} ({:?})",
            color.to_string(),
            swatch.display_name,
            swatch.display_color,
            palette::band(color)
        );
    }
}

/// Run the simulation on simulated time (no sleeping between ticks)
fn run_headless(
    mut world: LineWorld,
    ticks: u32,
    report_every: u32,
    json: bool,
) -> Result<Kpis> {
    println!("Running paint line in headless mode...");
    println!(
        "Ticks: {}, Period: {} ms, Cars: {}, Strategy: {}",
        ticks,
        world.config().tick_period_ms,
        world.generated_cars(),
        world.config().strategy
    );
    println!();

    let mut clock = VirtualClock::new(world.config().tick_period());
    world.start();

    println!("Initial state:");
    world.print_summary(clock.now());
    world.draw_lanes();
    println!();

    let mut tick = 0;
    while tick < ticks && !world.is_drained() {
        tick += 1;
        clock.advance(&mut world);

        if report_every > 0 && tick % report_every == 0 {
            println!(
                "--- After tick {} ({:.1}s simulated time) ---",
                tick,
                clock.now().as_secs_f64()
            );
            world.print_summary(clock.now());
            world.draw_lanes();
            println!();
        }
    }

    info!("=== SIMULATION COMPLETE ===");
    info!("Ticks run: {}", tick);
    info!("Total cars processed: {}", world.metrics.total_processed);
    info!("Changeovers: {}", world.metrics.changeovers);
    info!("Overflow events: {}", world.metrics.overflow_events);
    info!("Reroutes: {}", world.metrics.reroutes);
    info!("Drained: {}", world.is_drained());

    println!("=== Final State ===");
    world.print_summary(clock.now());
    world.draw_lanes();

    let snapshot = world.snapshot(clock.now());
    if json {
        println!("{}", snapshot.to_json()?);
    }
    Ok(snapshot.kpis)
}

/// Rerun the same backlog with FIFO allocation and print both sets of KPIs
fn compare_with_baseline(config: &SimConfig, ticks: u32, kpis: &Kpis) -> Result<()> {
    let baseline_config = SimConfig {
        strategy: AllocationStrategy::Fifo,
        ..config.clone()
    };
    let mut baseline = LineWorld::new(baseline_config)?;
    let mut clock = VirtualClock::new(baseline.config().tick_period());
    baseline.start();

    let mut tick = 0;
    while tick < ticks && !baseline.is_drained() {
        tick += 1;
        clock.advance(&mut baseline);
    }
    let fifo = baseline.snapshot(clock.now()).kpis;

    println!();
    println!("=== Strategy Comparison ===");
    println!("{:<16} {:>12} {:>12}", "", config.strategy.to_string(), "fifo");
    println!("{:<16} {:>12.1} {:>12.1}", "JPH", kpis.jph, fifo.jph);
    let rows = [
        ("Processed", kpis.total_cars_processed, fifo.total_cars_processed),
        ("Changeovers", kpis.changeovers, fifo.changeovers),
        ("Overflow events", kpis.overflow_events, fifo.overflow_events),
        ("Reroutes", kpis.reroutes, fifo.reroutes),
    ];
    for (label, chosen, fifo) in rows {
        println!("{:<16} {:>12} {:>12}", label, chosen, fifo);
    }
    Ok(())
}

/// Run the line on the wall clock, taking commands from stdin
fn run_console(world: LineWorld) -> Result<()> {
    let mut simulator = Simulator::new(world);
    simulator.spawn_heartbeat();

    println!("Paint line console");
    println!("Commands: start | pause | reset | status | oven <O1|O2> <active|stopped>");
    println!("          lane <Ln> <down|up> | quit");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read from stdin")?;
        if line.trim().is_empty() {
            continue;
        }

        let reply = line
            .parse::<Command>()
            .and_then(|command| simulator.apply(command));
        match reply {
            Ok(Reply::Ack(message)) => println!("ok: {}", message),
            Ok(Reply::Status(snapshot)) => println!("{}", snapshot.to_json()?),
            Ok(Reply::Quit) => break,
            Err(err) => {
                error!("{:#}", err);
                println!("error: {:#}", err);
            }
        }
        stdout.flush().context("failed to flush stdout")?;
    }

    drop(simulator);
    Ok(())
}
