use super::token::split_tokens;
use crate::cluster::{cluster_registry, ClusterCtor, CrunchOptions};
use crate::error::{RepoplotError, Result};
use crate::ingest;
use crate::model::LogData;
use crate::render::{BarChart, DrawTarget, FigureSpec, RenderBackend};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::path::Path;

const COMMAND_MARKER: char = ':';
const COMMENT_MARKER: char = '#';

/// Active drawing-target container. `:figure WxH` and `:figure WxH R-C` are
/// mutually exclusive; declaring one clears the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetState {
    None,
    Figure {
        width: u32,
        height: u32,
    },
    Grid {
        width: u32,
        height: u32,
        rows: u32,
        cols: u32,
    },
}

/// Line-oriented script interpreter.
///
/// Owns the full line buffer plus a mutable cursor (active line number,
/// token vector, token index). Directives mutate alias/filter/window state,
/// trigger log ingestion, and forward draw requests to the render backend.
/// All failures carry the 1-based script line number; nothing in here exits
/// the process.
pub struct Interpreter<B> {
    lines: Vec<String>,
    lnx: usize,
    tokens: Vec<String>,
    tx: usize,
    pending: bool,

    aliases: HashMap<String, String>,
    exclude: Vec<String>,
    include: Vec<String>,
    days_past: f64,
    skip_commits: usize,
    data: Option<LogData>,
    clusters: HashMap<&'static str, ClusterCtor>,
    target: TargetState,
    title: Option<String>,
    backend: B,
}

impl<B: RenderBackend> Interpreter<B> {
    pub fn new(source: &str, backend: B) -> Self {
        Self {
            lines: source.lines().map(str::to_string).collect(),
            lnx: 0,
            tokens: Vec::new(),
            tx: 0,
            pending: false,
            aliases: HashMap::new(),
            exclude: Vec::new(),
            include: Vec::new(),
            days_past: 10_000.0,
            skip_commits: 0,
            data: None,
            clusters: cluster_registry(),
            target: TargetState::None,
            title: None,
            backend,
        }
    }

    pub fn data(&self) -> Option<&LogData> {
        self.data.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn run(&mut self) -> Result<()> {
        loop {
            if !self.take_pending() && !self.next_line() {
                return Ok(());
            }
            if !self.has_token() {
                continue;
            }
            let first = &self.tokens[self.tx];
            if first.trim().is_empty() || first.starts_with(COMMENT_MARKER) {
                continue;
            }
            if !first.starts_with(COMMAND_MARKER) {
                continue;
            }

            match self.consume()?.as_str() {
                ":alias" => {
                    let canonical = self.consume()?;
                    for raw in self.read_list()? {
                        self.aliases.insert(raw, canonical.clone());
                    }
                }
                ":load" => {
                    let path = self.consume()?;
                    self.data = Some(ingest::load_log(Path::new(&path), &self.aliases)?);
                }
                ":days" => {
                    let token = self.consume()?;
                    self.days_past = token
                        .parse()
                        .map_err(|_| self.script_error(format!("invalid float '{token}'")))?;
                }
                ":skip-commit" => {
                    let token = self.consume()?;
                    self.skip_commits = token
                        .parse()
                        .map_err(|_| self.script_error(format!("invalid integer '{token}'")))?;
                }
                ":include" => {
                    let items = self.read_list()?;
                    self.include.extend(items);
                }
                ":include-clear" => self.include.clear(),
                ":exclude" => {
                    let items = self.read_list()?;
                    self.exclude.extend(items);
                }
                ":exclude-clear" => self.exclude.clear(),
                ":exclude-remove" => {
                    let remove: HashSet<String> = self.read_list()?.into_iter().collect();
                    self.exclude.retain(|pat| !remove.contains(pat));
                }
                ":figure" => {
                    let (width, height) = self.consume_pair('x', "WxH dimension pair")?;
                    if self.has_token() {
                        let (rows, cols) = self.consume_pair('-', "row-col pair")?;
                        self.target = TargetState::Grid {
                            width,
                            height,
                            rows,
                            cols,
                        };
                        self.backend.configure(&FigureSpec {
                            width,
                            height,
                            grid: Some((rows, cols)),
                        })?;
                    } else {
                        self.target = TargetState::Figure { width, height };
                        self.backend.configure(&FigureSpec {
                            width,
                            height,
                            grid: None,
                        })?;
                    }
                }
                ":subplot" => {
                    let (row, col) = self.consume_pair('-', "row-col pair")?;
                    let target = match self.target {
                        TargetState::Grid { rows, cols, .. } => {
                            if row == 0 || col == 0 || row > rows || col > cols {
                                return Err(self.script_error(format!(
                                    "subplot {row}-{col} outside {rows}-{cols} grid"
                                )));
                            }
                            DrawTarget::Cell {
                                row: row - 1,
                                col: col - 1,
                            }
                        }
                        _ => return Err(self.script_error("subplot without a grid figure")),
                    };
                    self.draw(target)?;
                }
                ":plot" => match self.target {
                    TargetState::Figure { .. } => self.draw(DrawTarget::Whole)?,
                    _ => return Err(self.script_error("plot without a whole-figure target")),
                },
                ":save" => {
                    let path = self.consume()?;
                    if self.target == TargetState::None {
                        return Err(self.script_error("save without a drawing target"));
                    }
                    self.backend.save(Path::new(&path))?;
                }
                ":title" => {
                    self.title = Some(self.consume()?);
                }
                // Unknown directives are skipped, not errors.
                _ => {}
            }
        }
    }

    /// Draw body: `bars <cluster> <stat>...`. The remaining tokens on the
    /// line name the series to plot, grouped side by side.
    fn draw(&mut self, target: DrawTarget) -> Result<()> {
        let kind = self.consume()?;
        match kind.as_str() {
            "bars" => {
                let name = self.consume()?;
                let ctor = *self
                    .clusters
                    .get(name.as_str())
                    .ok_or_else(|| self.script_error(format!("unknown cluster '{name}'")))?;
                let data = self
                    .data
                    .as_ref()
                    .ok_or_else(|| self.script_error("no log data loaded"))?;

                let mut cluster = ctor();
                cluster.crunch(
                    data,
                    &CrunchOptions {
                        exclude: &self.exclude,
                        include: &self.include,
                        days_past: self.days_past,
                        skip_commits: self.skip_commits,
                        now: Utc::now(),
                    },
                );

                let mut series = Vec::new();
                for offset in 0..self.tokens_left() {
                    let key = self.look(offset)?.to_string();
                    let found = cluster
                        .series(&key)
                        .ok_or_else(|| self.script_error(format!("unknown stat '{key}'")))?;
                    series.push(found);
                }

                let chart = BarChart {
                    title: self.title.as_deref(),
                    categories: cluster.labels(),
                    series,
                    log_scale: true,
                };
                self.backend.draw_bars(&target, &chart)?;
                Ok(())
            }
            _ => Err(self.script_error(format!("unknown chart kind '{kind}'"))),
        }
    }

    /// Token at the cursor, advancing past it.
    fn consume(&mut self) -> Result<String> {
        if self.tx >= self.tokens.len() {
            return Err(self.script_error("unexpected end of line"));
        }
        let token = self.tokens[self.tx].clone();
        self.tx += 1;
        Ok(token)
    }

    /// Bounds-checked relative peek at cursor + `offset`.
    fn look(&self, offset: usize) -> Result<&str> {
        self.tokens
            .get(self.tx + offset)
            .map(String::as_str)
            .ok_or_else(|| self.script_error("token lookahead out of range"))
    }

    fn has_token(&self) -> bool {
        self.tx < self.tokens.len()
    }

    fn tokens_left(&self) -> usize {
        self.tokens.len() - self.tx
    }

    fn next_line(&mut self) -> bool {
        if self.lnx >= self.lines.len() {
            self.tokens.clear();
            self.tx = 0;
            return false;
        }
        self.tokens = split_tokens(&self.lines[self.lnx]);
        self.lnx += 1;
        self.tx = 0;
        true
    }

    fn take_pending(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    /// Collect the first token of each following line until a command-marked
    /// line ends the list. That line is left pending and interpreted next; a
    /// blank line also ends the list. Running out of script inside a list is
    /// an error.
    fn read_list(&mut self) -> Result<Vec<String>> {
        let mut items = Vec::new();
        loop {
            if !self.next_line() {
                return Err(self.script_error("unexpected end of script"));
            }
            match self.tokens.first() {
                None => break,
                Some(first) if first.starts_with(COMMAND_MARKER) => {
                    self.pending = true;
                    break;
                }
                Some(first) => items.push(first.clone()),
            }
        }
        Ok(items)
    }

    fn consume_pair(&mut self, sep: char, what: &str) -> Result<(u32, u32)> {
        let token = self.consume()?;
        let parts: Vec<&str> = token.split(sep).collect();
        if parts.len() != 2 {
            return Err(self.script_error(format!("expected {what}, found '{token}'")));
        }
        let first = parts[0]
            .parse()
            .map_err(|_| self.script_error(format!("invalid integer '{}'", parts[0])))?;
        let second = parts[1]
            .parse()
            .map_err(|_| self.script_error(format!("invalid integer '{}'", parts[1])))?;
        Ok((first, second))
    }

    fn script_error(&self, message: impl Into<String>) -> RepoplotError {
        RepoplotError::script(self.lnx, message)
    }
}
