//! Collaborators at the edge of the simulation: input, rendering, score display

use std::collections::VecDeque;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

use super::entity::Team;
use super::world::Frame;
use super::InputVector;

/// Supplies one normalized input vector per local player per tick
pub trait InputSource {
    /// Called once at the start of every tick
    fn begin_tick(&mut self) {}

    fn poll(&mut self, team: Team) -> InputVector;
}

/// Receives a read-only view of the world every tick; must not block
pub trait RenderSink {
    fn draw(&mut self, frame: &Frame<'_>);
}

/// Told whenever either score changes
pub trait ScoreSink {
    fn scores_changed(&mut self, red: u32, blue: u32);
}

/// Everything a session hands data to or takes data from
pub struct Hooks {
    pub input: Box<dyn InputSource>,
    pub render: Box<dyn RenderSink>,
    pub scores: Box<dyn ScoreSink>,
}

impl Hooks {
    /// No input, no drawing, scores to the log
    pub fn headless() -> Self {
        Self {
            input: Box::new(IdleInput),
            render: Box::new(NullRender),
            scores: Box::new(LogScores),
        }
    }
}

/// Parse `[red|blue] <move_x> <move_y> [shoot]`.
///
/// Without a team prefix the line targets every local player.
pub fn parse_line(line: &str) -> Option<(Option<Team>, InputVector)> {
    let mut parts = line.split_whitespace().peekable();
    let team = match parts.peek().copied() {
        Some("red") => Some(Team::Red),
        Some("blue") => Some(Team::Blue),
        _ => None,
    };
    if team.is_some() {
        parts.next();
    }

    let move_x: f32 = parts.next()?.parse().ok()?;
    let move_y: f32 = parts.next()?.parse().ok()?;
    let shooting = match parts.next() {
        None => false,
        Some("shoot" | "s" | "1") => true,
        Some(_) => return None,
    };
    if !move_x.is_finite() || !move_y.is_finite() {
        return None;
    }

    Some((team, InputVector::new(move_x, move_y, shooting)))
}

/// Never moves, never shoots
pub struct IdleInput;

impl InputSource for IdleInput {
    fn poll(&mut self, _team: Team) -> InputVector {
        InputVector::default()
    }
}

/// Replays one script line per tick, then idles
#[derive(Debug, Default)]
pub struct ScriptedInput {
    steps: VecDeque<(Option<Team>, InputVector)>,
    current: Option<(Option<Team>, InputVector)>,
}

impl ScriptedInput {
    pub fn new(steps: impl IntoIterator<Item = (Option<Team>, InputVector)>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            current: None,
        }
    }

    /// Parse a whole script; blank lines and `#` comments are skipped
    pub fn parse(script: &str) -> Self {
        let steps = script
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| {
                let step = parse_line(line);
                if step.is_none() {
                    warn!(line = %line, "Skipping unreadable script line");
                }
                step
            });
        Self::new(steps)
    }

    pub fn remaining(&self) -> usize {
        self.steps.len()
    }
}

impl InputSource for ScriptedInput {
    fn begin_tick(&mut self) {
        self.current = self.steps.pop_front();
    }

    fn poll(&mut self, team: Team) -> InputVector {
        match self.current {
            Some((None, input)) => input,
            Some((Some(target), input)) if target == team => input,
            _ => InputVector::default(),
        }
    }
}

/// Latest input per team, fed by a background reader
pub struct LiveInput {
    red: watch::Receiver<InputVector>,
    blue: watch::Receiver<InputVector>,
}

impl LiveInput {
    /// Read stdin lines into the latest-input slots until EOF
    pub fn from_stdin() -> Self {
        let (red_tx, red) = watch::channel(InputVector::default());
        let (blue_tx, blue) = watch::channel(InputVector::default());

        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => match parse_line(&line) {
                        Some((team, input)) => {
                            if team != Some(Team::Blue) {
                                red_tx.send_replace(input);
                            }
                            if team != Some(Team::Red) {
                                blue_tx.send_replace(input);
                            }
                        }
                        None => warn!(line = %line, "Unreadable input line"),
                    },
                    Ok(None) => {
                        debug!("Input stream ended");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "Input stream failed");
                        break;
                    }
                }
            }
        });

        Self { red, blue }
    }
}

impl InputSource for LiveInput {
    fn poll(&mut self, team: Team) -> InputVector {
        match team {
            Team::Red => *self.red.borrow(),
            Team::Blue => *self.blue.borrow(),
        }
    }
}

/// Discards frames
pub struct NullRender;

impl RenderSink for NullRender {
    fn draw(&mut self, _frame: &Frame<'_>) {}
}

/// Traces a summary of every n-th frame
pub struct TraceRender {
    every: u64,
}

impl TraceRender {
    pub fn new(every: u64) -> Self {
        Self { every: every.max(1) }
    }
}

impl RenderSink for TraceRender {
    fn draw(&mut self, frame: &Frame<'_>) {
        if frame.tick % self.every != 0 {
            return;
        }
        let [red, blue] = frame.players;
        trace!(
            tick = frame.tick,
            red_x = red.x,
            red_y = red.y,
            blue_x = blue.x,
            blue_y = blue.y,
            ball_x = frame.ball.x,
            ball_y = frame.ball.y,
            projectiles = frame.projectiles.len(),
            "Frame"
        );
    }
}

/// Logs the scoreboard
pub struct LogScores;

impl ScoreSink for LogScores {
    fn scores_changed(&mut self, red: u32, blue: u32) {
        info!(red, blue, "Score changed");
    }
}
