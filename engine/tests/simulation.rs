use pathguard_core::{Kind, Point};
use pathguard_engine::{Declarations, DrawCommand, DrawOptions, Game, Scene};
use pathguard_system_spawning::Round;

fn record(label: &str, text: &str) -> (String, String) {
    (label.to_owned(), text.to_owned())
}

fn sources() -> Vec<(String, String)> {
    vec![
        record(
            "graph.toml",
            r#"
type = "graph"
variety = "cached"
name = "map"

[attributes]
text = "0,0\nS\nS\nS\nE\nS\nS"
"#,
        ),
        record(
            "path.toml",
            r#"
type = "animator"
variety = "path"
name = "path"
"#,
        ),
        record(
            "crawler-sheet.toml",
            r#"
type = "asset"
variety = "sprite"
name = "crawler-sheet"

[attributes]
frames = 2
delay = 4
width = 32
"#,
        ),
        record(
            "blood.toml",
            r#"
type = "asset"
variety = "sprite"
name = "blood"

[attributes]
frames = 3
delay = 2
width = 32
"#,
        ),
        record(
            "boom.toml",
            r#"
type = "asset"
variety = "sprite"
name = "boom"

[attributes]
frames = 3
delay = 2
width = 32
"#,
        ),
        record(
            "sentry-sheet.toml",
            r#"
type = "asset"
variety = "static"
name = "sentry-sheet"
"#,
        ),
        record(
            "bolt-sheet.toml",
            r#"
type = "asset"
variety = "static"
name = "bolt-sheet"
"#,
        ),
        record(
            "crawler.toml",
            r#"
type = "enemy"
variety = "basic"
name = "crawler"

[attributes]
asset = "crawler-sheet"
animation = "path"
effect = "blood"
health = 10
speed = 1
points = 5
"#,
        ),
        record(
            "sentry.toml",
            r#"
type = "tower"
variety = "shooting"
name = "sentry"

[attributes]
asset = "sentry-sheet"
range_min = 1
range_max = 40
delay = 25
cost = 50

[attributes.projectile]
asset = "bolt-sheet"
effect = "boom"
pool_size = 2
speed = 6
damage = 3
explosion_radius = 1
"#,
        ),
    ]
}

fn game(lives: i32, credits: i32) -> Game {
    let declarations = Declarations::from_sources(&sources(), None).expect("valid declarations");
    Game::new(declarations, &Kind::new("map"), lives, credits).expect("graph declared")
}

const CRAWLER_WALK_TICKS: i32 = 2_000;

#[test]
fn defended_wave_is_destroyed_before_the_exit() {
    let mut game = game(3, 100);
    game.place_tower(&Kind::new("sentry"), Point::new(1, 2))
        .expect("legal placement");
    game.start_wave([Round::new(
        vec![Kind::new("crawler"); 3],
        30,
    )])
    .expect("declared enemy kind");

    let mut ticks = 0;
    while !game.wave_cleared() && ticks < CRAWLER_WALK_TICKS {
        game.update();
        ticks += 1;
    }

    assert!(game.wave_cleared(), "wave never resolved");
    assert_eq!(game.lives(), 3, "no enemy should have escaped");
    assert_eq!(game.score(), 15, "every crawler is worth five points");
    assert_eq!(game.credits(), 100 - 50 + 15);
    assert_eq!(game.live_enemies(), 0);
    assert_eq!(game.live_bullets(), 0);
}

#[test]
fn undefended_wave_costs_lives() {
    let mut game = game(3, 100);
    game.start_wave([Round::new(vec![Kind::new("crawler"); 2], 10)])
        .expect("declared enemy kind");

    let mut ticks = 0;
    while !game.wave_cleared() && ticks < CRAWLER_WALK_TICKS {
        game.update();
        ticks += 1;
    }

    assert!(game.wave_cleared(), "wave never resolved");
    assert_eq!(game.lives(), 1);
    assert_eq!(game.score(), 0);
}

#[test]
fn losing_every_life_freezes_the_game() {
    let mut game = game(1, 100);
    game.start_wave([Round::new(vec![Kind::new("crawler")], 5)])
        .expect("declared enemy kind");

    let mut ticks = 0;
    while !game.game_over() && ticks < CRAWLER_WALK_TICKS {
        game.update();
        ticks += 1;
    }
    assert!(game.game_over());

    let frozen_at = game.ticks();
    game.update();
    assert_eq!(game.ticks(), frozen_at, "a lost game stops advancing");
}

#[test]
fn draw_layers_run_map_first_and_effects_last() {
    let mut game = game(3, 100);
    game.place_tower(&Kind::new("sentry"), Point::new(1, 1))
        .expect("legal placement");
    game.start_wave([Round::new(vec![Kind::new("crawler")], 1)])
        .expect("declared enemy kind");
    for _ in 0..70 {
        game.update();
    }

    let mut scene = Scene::new();
    game.draw(&mut scene, DrawOptions { grid: true });

    let commands = scene.commands();
    let tiles = game_board_tiles(&game);
    assert!(commands.len() > tiles, "expected entity layers above the map");
    assert!(commands[..tiles]
        .iter()
        .all(|command| matches!(command, DrawCommand::Sprite { .. })));
    assert!(
        commands
            .iter()
            .any(|command| matches!(command, DrawCommand::GridOverlay { .. })),
        "grid overlay requested but never emitted"
    );
    assert!(
        commands
            .iter()
            .any(|command| matches!(command, DrawCommand::RangeCircle { .. })),
        "tower range overlay requested but never emitted"
    );
}

fn game_board_tiles(game: &Game) -> usize {
    // The fixture map is a 2x5 board with a six-tile path.
    let _ = game;
    10
}
