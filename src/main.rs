//! Carrier War - headless match runner
//!
//! Plays a seeded match between two scripted sides through the lobby and
//! prints a summary as JSON or text.

use std::path::PathBuf;

use carrier_war::battle::hex::HexCoord;
use carrier_war::battle::mapgen::spawn_point;
use carrier_war::battle::orders::PlayerOrders;
use carrier_war::battle::{HexGrid, NavalEventType, TurnReport, UnitKind};
use carrier_war::core::config::EngineConfig;
use carrier_war::core::error::Result;
use carrier_war::core::types::{MatchResult, UnitId};
use carrier_war::lobby::{MatchRegistry, MatchStatus, Seat};
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "carrier-war")]
#[command(about = "Run a scripted carrier battle and report the result")]
struct Args {
    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Engine config file (TOML); defaults are used when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the turn limit
    #[arg(long)]
    turns: Option<u32>,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,
}

#[derive(Serialize)]
struct RunSummary {
    seed: u64,
    turns_played: u32,
    result: Option<MatchResult>,
    carrier_hp: [i32; 2],
    strikes: usize,
    map: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("carrier_war=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(turns) = args.turns {
        config.max_turns = turns;
    }
    config.validate()?;

    let seed = args.seed.unwrap_or_else(rand::random);
    let (width, height) = (config.map_width, config.map_height);
    let registry = MatchRegistry::new(config)?;

    let alpha = registry.create("alpha", Some(seed))?;
    let bravo = registry.join(alpha.match_id, "bravo")?;
    let seats = [alpha, bravo];

    let mut strikes = 0;
    loop {
        let snapshot = registry.view(alpha.match_id, None)?;
        if snapshot.status != MatchStatus::Active {
            break;
        }
        for seat in &seats {
            let view = registry.view(seat.match_id, Some(seat.token))?;
            let Some(report) = view.view else { continue };
            let orders = scripted_orders(&registry, seat, &report, width, height);
            let receipt = registry.submit_orders(seat.match_id, seat.token, orders)?;
            if let Some(outcome) = receipt.outcome {
                strikes += outcome
                    .events
                    .iter()
                    .filter(|e| matches!(e.event_type, NavalEventType::Strike { .. }))
                    .count();
            }
        }
    }

    let final_views = [
        registry.view(alpha.match_id, Some(seats[0].token))?,
        registry.view(alpha.match_id, Some(seats[1].token))?,
    ];
    let carrier_hp = final_views.each_ref().map(|v| {
        v.view
            .as_ref()
            .and_then(|r| {
                r.units
                    .iter()
                    .find(|u| matches!(u.kind, UnitKind::Carrier { .. }))
            })
            .map_or(0, |u| u.hp)
    });
    let spectator = registry.view(alpha.match_id, None)?;

    let summary = RunSummary {
        seed,
        turns_played: spectator.turn.saturating_sub(1),
        result: spectator.result,
        carrier_hp,
        strikes,
        map: HexGrid::from_rows(&spectator.map)
            .render_ascii()
            .lines()
            .map(str::to_string)
            .collect(),
    };

    match args.format.as_str() {
        "text" => {
            println!("Carrier War");
            println!("===========");
            println!("Seed: {}", summary.seed);
            println!("Turns played: {}", summary.turns_played);
            match summary.result {
                Some(MatchResult::Winner(side)) => println!("Winner: side {side}"),
                Some(MatchResult::Draw) => println!("Result: draw"),
                None => println!("Result: undecided"),
            }
            println!("Carrier hp: A={} B={}", summary.carrier_hp[0], summary.carrier_hp[1]);
            println!("Strikes: {}", summary.strikes);
            println!();
            for row in &summary.map {
                println!("{row}");
            }
        }
        other => {
            if other != "json" {
                eprintln!("Unknown format '{other}', defaulting to json");
            }
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}

/// Steam toward the enemy corner and strike anything sighted
///
/// Falls back to fewer orders whenever the full set would be rejected.
fn scripted_orders(
    registry: &MatchRegistry,
    seat: &Seat,
    report: &TurnReport,
    width: u32,
    height: u32,
) -> PlayerOrders {
    let enemy = seat.side.opponent();
    let enemy_carrier = UnitId::carrier(enemy, 1);
    let sighted = report
        .markers
        .get(&enemy_carrier)
        .or_else(|| report.markers.values().next())
        .filter(|m| m.seen)
        .map(|m| m.pos);
    let heading: HexCoord = spawn_point(enemy, width, height);

    let preferred = match sighted {
        Some(pos) => PlayerOrders::launch(pos),
        None => PlayerOrders::move_carrier(heading).with_launch(heading),
    };
    let candidates = [
        preferred,
        PlayerOrders::move_carrier(heading),
        PlayerOrders::hold(),
    ];
    candidates
        .into_iter()
        .find(|orders| accepted(registry, seat, orders))
        .unwrap_or_default()
}

fn accepted(registry: &MatchRegistry, seat: &Seat, orders: &PlayerOrders) -> bool {
    registry
        .validate_orders(seat.match_id, seat.side, orders)
        .map(|rejections| rejections.is_empty())
        .unwrap_or(false)
}
