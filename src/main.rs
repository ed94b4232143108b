use anyhow::{bail, Context, Result};
use clap::Parser;
use minesweep::{
    CellState, Difficulty, Engine, GameConfig, GameEvent, GameState, Position, SessionLog, Statistics,
    StoryLevel,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(version, about = "Play minesweeper in the terminal")]
struct Args {
    /// Preset board: beginner, intermediate, expert or custom
    #[arg(short, long, default_value = "beginner")]
    difficulty: Difficulty,

    /// Board width for a custom game
    #[arg(long, requires = "height")]
    width: Option<usize>,

    /// Board height for a custom game
    #[arg(long, requires = "width")]
    height: Option<usize>,

    /// Mine count, overriding the preset or story level
    #[arg(short, long)]
    mines: Option<usize>,

    /// Play the built-in story level
    #[arg(long, conflicts_with_all = ["mask", "width"])]
    story: bool,

    /// Play on a shape read from a file (`#` active, `.` inactive)
    #[arg(long, conflicts_with = "width")]
    mask: Option<PathBuf>,

    /// Seed for reproducible mine layouts
    #[arg(long)]
    seed: Option<u64>,

    /// Append game events to this file as JSON lines
    #[arg(long)]
    record: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

enum Command {
    Reveal(Position),
    Flag(Position),
    Chord(Position),
    NewRound,
    Quit,
}

fn main() {
    let args = Args::parse();
    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();

    match run_game(&args) {
        Ok(()) => println!("Thanks for playing!"),
        Err(e) => eprintln!("Game error: {e:#}"),
    }
}

fn build_engine(args: &Args) -> Result<Engine> {
    if args.story || args.mask.is_some() {
        let mut level = StoryLevel::first_steps();
        if let Some(path) = &args.mask {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading mask {}", path.display()))?;
            level.mask = text.parse()?;
            level.mines = level.mask.active_count() / 6;
        }
        if let Some(mines) = args.mines {
            level.mines = mines;
        }
        level.validate()?;
        return Ok(level.engine());
    }

    let preset = args.difficulty.config();
    let config = GameConfig::new(
        args.width.unwrap_or(preset.width),
        args.height.unwrap_or(preset.height),
        args.mines.unwrap_or(preset.mines),
    )?;
    Ok(config.engine())
}

fn run_game(args: &Args) -> Result<()> {
    let mut engine = build_engine(args)?;
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut recorder = args
        .record
        .as_ref()
        .map(|path| -> Result<BufWriter<File>> {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening {}", path.display()))?;
            Ok(BufWriter::new(file))
        })
        .transpose()?;
    let mut log = SessionLog::new();

    engine.start_new_game_with_rng(&mut rng);
    loop {
        flush_events(&mut engine, &mut log, recorder.as_mut())?;
        print_board(&engine);

        if engine.is_finished() {
            match engine.state() {
                GameState::Won => println!("Congratulations! You won!"),
                GameState::Lost => println!("Game Over!"),
                GameState::Playing => unreachable!(),
            }
            print_statistics(&log, &engine);
        }

        match get_user_input()? {
            Some(Command::Reveal(pos)) => {
                engine.reveal(pos);
            }
            Some(Command::Flag(pos)) => {
                engine.toggle_flag(pos);
            }
            Some(Command::Chord(pos)) => {
                engine.chord(pos);
            }
            Some(Command::NewRound) => engine.start_new_game_with_rng(&mut rng),
            Some(Command::Quit) => break,
            None => continue,
        }
    }

    flush_events(&mut engine, &mut log, recorder.as_mut())?;
    Ok(())
}

fn flush_events(
    engine: &mut Engine,
    log: &mut SessionLog,
    mut recorder: Option<&mut BufWriter<File>>,
) -> Result<()> {
    for event in engine.drain_events() {
        log.observe(&event);
        if let Some(out) = recorder.as_deref_mut() {
            write_event(out, &event)?;
        }
    }
    if let Some(out) = recorder {
        out.flush()?;
    }
    Ok(())
}

fn write_event(out: &mut impl Write, event: &GameEvent) -> Result<()> {
    serde_json::to_writer(&mut *out, event)?;
    writeln!(out)?;
    Ok(())
}

fn print_board(engine: &Engine) {
    println!(
        "Mines: {}  Flags: {}  Revealed: {}",
        engine.mine_count(),
        engine.flagged_count(),
        engine.revealed_count()
    );

    println!("{}", column_header(engine.width()));

    for row in 0..engine.height() {
        print!("{:>2} ", row);
        for col in 0..engine.width() {
            let pos = Position::new(row, col);
            let Some(cell) = engine.cell(pos) else {
                continue;
            };
            if !cell.is_active() {
                print!("  ");
                continue;
            }
            match cell.state() {
                CellState::Hidden => print!("□ "),
                CellState::Flagged | CellState::Revealed => {
                    let text = engine.display_text(pos);
                    // Emoji glyphs already span two columns.
                    if text.is_ascii() {
                        print!("{:<2}", text);
                    } else {
                        print!("{}", text);
                    }
                }
            }
        }
        println!();
    }
}

/// Column numbers, last digit only so each stays within its two-column cell.
fn column_header(width: usize) -> String {
    let mut header = String::from("   ");
    for col in 0..width {
        header.push_str(&format!("{:<2}", col % 10));
    }
    header.trim_end().to_owned()
}

/// Sessions are bucketed by the board they were played on, so story and
/// mask rounds are summarised alongside rectangular ones.
fn board_key(engine: &Engine) -> GameConfig {
    GameConfig {
        width: engine.width(),
        height: engine.height(),
        mines: engine.total_mines(),
    }
}

fn print_statistics(log: &SessionLog, engine: &Engine) {
    let stats = Statistics::for_config(log.sessions(), &board_key(engine));
    println!(
        "Games: {}  Wins: {}  Win rate: {}  Best time: {}",
        stats.total_games,
        stats.wins,
        stats.formatted_win_rate(),
        stats.formatted_best_time()
    );
}

fn get_user_input() -> Result<Option<Command>> {
    print!("Enter command (r/f/c row col, n = new round, q = quit): ");
    io::stdout().flush()?;

    let mut input = String::new();
    if io::stdin().read_line(&mut input)? == 0 {
        return Ok(Some(Command::Quit));
    }

    match parse_command(&input) {
        Ok(command) => Ok(Some(command)),
        Err(e) => {
            println!("{e}");
            Ok(None)
        }
    }
}

fn parse_command(input: &str) -> Result<Command> {
    let mut parts = input.split_whitespace();
    let Some(action) = parts.next() else {
        bail!("Empty command");
    };

    match action {
        "n" => return Ok(Command::NewRound),
        "q" => return Ok(Command::Quit),
        _ => {}
    }

    let row = parts.next().context("Missing row")?.parse()?;
    let col = parts.next().context("Missing column")?.parse()?;
    let pos = Position::new(row, col);

    Ok(match action {
        "r" => Command::Reveal(pos),
        "f" => Command::Flag(pos),
        "c" => Command::Chord(pos),
        other => bail!("Invalid action {other:?}. Use 'r' to reveal, 'f' to flag or 'c' to chord"),
    })
}
