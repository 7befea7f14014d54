#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line runner for the Pathguard simulation.
//!
//! Loads a declaration directory, places towers, releases a wave and
//! reports the outcome once the wave resolves or the tick budget runs
//! out.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use pathguard_core::{Kind, Point};
use pathguard_engine::{Declarations, DrawOptions, Game, Round, Scene};

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(
    name = "pathguard",
    about = "Runs a headless Pathguard wave and prints the outcome"
)]
struct Args {
    /// Directory containing declaration records.
    #[arg(long, value_name = "DIR")]
    declarations: PathBuf,

    /// Declared graph to play on.
    #[arg(long, default_value = "map")]
    graph: String,

    /// Tower placement as `kind:x,y`; repeat for several towers.
    #[arg(long = "tower", value_name = "KIND:X,Y")]
    towers: Vec<TowerPlacement>,

    /// Declared enemy kind the wave spawns.
    #[arg(long, default_value = "crawler")]
    enemy: String,

    /// Enemies per round.
    #[arg(long, default_value_t = 5)]
    wave_size: usize,

    /// Ticks between spawns within a round.
    #[arg(long, default_value_t = 30)]
    spawn_delay: i32,

    /// Rounds in the wave.
    #[arg(long, default_value_t = 1)]
    rounds: usize,

    /// Lives the player starts with.
    #[arg(long, default_value_t = 10)]
    lives: i32,

    /// Credits the player starts with.
    #[arg(long, default_value_t = 200)]
    credits: i32,

    /// Tick budget before the run is declared stuck.
    #[arg(long, default_value_t = 20_000)]
    ticks: i32,

    /// Print the final frame's draw commands.
    #[arg(long)]
    show_scene: bool,

    /// Include the grid and range debug overlays in the printed scene.
    #[arg(long)]
    grid: bool,
}

/// A `kind:x,y` tower placement argument.
#[derive(Clone, Debug, PartialEq, Eq)]
struct TowerPlacement {
    kind: Kind,
    tile: Point,
}

impl FromStr for TowerPlacement {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (kind, tile) = value
            .split_once(':')
            .ok_or_else(|| format!("expected kind:x,y, got {value:?}"))?;
        let (x, y) = tile
            .split_once(',')
            .ok_or_else(|| format!("expected x,y after the colon, got {tile:?}"))?;
        let x: i32 = x
            .trim()
            .parse()
            .map_err(|_| format!("{x:?} is not a tile coordinate"))?;
        let y: i32 = y
            .trim()
            .parse()
            .map_err(|_| format!("{y:?} is not a tile coordinate"))?;
        Ok(Self {
            kind: Kind::new(kind.trim()),
            tile: Point::new(x, y),
        })
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let declarations = Declarations::load_dir(&args.declarations).with_context(|| {
        format!(
            "loading declarations from {}",
            args.declarations.display()
        )
    })?;
    let mut game = Game::new(declarations, &Kind::new(args.graph.as_str()), args.lives, args.credits)
        .context("assembling the game")?;

    for placement in &args.towers {
        game.place_tower(&placement.kind, placement.tile)
            .with_context(|| format!("placing {} at {}", placement.kind, placement.tile))?;
        info!("placed {} at {}", placement.kind, placement.tile);
    }

    let enemy = Kind::new(args.enemy.as_str());
    let rounds = (0..args.rounds.max(1))
        .map(|_| Round::new(vec![enemy.clone(); args.wave_size], args.spawn_delay));
    game.start_wave(rounds).context("starting the wave")?;

    let mut elapsed = 0;
    while !game.wave_cleared() && !game.game_over() && elapsed < args.ticks {
        game.update();
        elapsed += 1;
    }

    if !game.wave_cleared() && !game.game_over() {
        bail!("wave still unresolved after {} ticks", args.ticks);
    }

    println!("ticks:    {}", game.ticks());
    println!("score:    {}", game.score());
    println!("lives:    {}", game.lives());
    println!("credits:  {}", game.credits());
    println!("towers:   {}", game.tower_count());
    println!(
        "result:   {}",
        if game.game_over() {
            "defeat"
        } else {
            "wave cleared"
        }
    );

    if args.show_scene {
        let mut scene = Scene::new();
        game.draw(&mut scene, DrawOptions { grid: args.grid });
        for command in scene.commands() {
            println!("{command:?}");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tower_placements_parse_kind_and_tile() {
        let placement: TowerPlacement = "sentry:3,4".parse().expect("well-formed");
        assert_eq!(placement.kind, Kind::new("sentry"));
        assert_eq!(placement.tile, Point::new(3, 4));
    }

    #[test]
    fn malformed_tower_placements_are_rejected() {
        assert!("sentry".parse::<TowerPlacement>().is_err());
        assert!("sentry:3".parse::<TowerPlacement>().is_err());
        assert!("sentry:a,b".parse::<TowerPlacement>().is_err());
    }
}
