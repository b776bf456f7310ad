/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Screen layout while a question is up (columns clip on narrow terminals):
///
///   row 0      HUD: score, lives, round, tier, countdown
///   rows 2-13  portrait card        hints / reveal     top scores
///   rows 15-18 the four options
///   rows 20-21 feedback and image link after an answer
///   row 23     transient message bar
///   last row   key help

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::question::{Question, OPTION_COUNT};
use crate::domain::rules::{CORRECT_POINTS, WRONG_PENALTY};
use crate::domain::state::MAX_LIVES;
use crate::sim::session::{Phase, Session};

/// Countdown turns to the warning colour at this many seconds.
const WARN_SECONDS: u32 = 10;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    fn new(c: char, fg: Color, bg: Color) -> Self {
        let mut ch = [0u8; 4];
        let ch_len = c.encode_utf8(&mut ch).len() as u8;
        Cell { ch, ch_len, fg, bg }
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or(" ")
    }
}

// ── Palette ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Palette {
    bg: Color,
    text: Color,
    dim: Color,
    accent: Color,
    hud_bg: Color,
    good: Color,
    bad: Color,
    warn: Color,
    on_mark: Color,
    noise: [Color; 3],
}

impl Palette {
    const DARK: Palette = Palette {
        bg: Color::Rgb { r: 22, g: 22, b: 35 },
        text: Color::Rgb { r: 230, g: 230, b: 230 },
        dim: Color::Rgb { r: 120, g: 120, b: 140 },
        accent: Color::Rgb { r: 151, g: 206, b: 76 },
        hud_bg: Color::Rgb { r: 20, g: 20, b: 60 },
        good: Color::Rgb { r: 60, g: 170, b: 80 },
        bad: Color::Rgb { r: 200, g: 60, b: 60 },
        warn: Color::Rgb { r: 255, g: 200, b: 50 },
        on_mark: Color::Rgb { r: 10, g: 10, b: 10 },
        noise: [
            Color::Rgb { r: 60, g: 60, b: 80 },
            Color::Rgb { r: 90, g: 90, b: 110 },
            Color::Rgb { r: 130, g: 130, b: 150 },
        ],
    };

    const LIGHT: Palette = Palette {
        bg: Color::Rgb { r: 244, g: 244, b: 236 },
        text: Color::Rgb { r: 30, g: 30, b: 40 },
        dim: Color::Rgb { r: 120, g: 120, b: 120 },
        accent: Color::Rgb { r: 30, g: 130, b: 160 },
        hud_bg: Color::Rgb { r: 200, g: 220, b: 235 },
        good: Color::Rgb { r: 120, g: 200, b: 120 },
        bad: Color::Rgb { r: 235, g: 120, b: 120 },
        warn: Color::Rgb { r: 200, g: 90, b: 0 },
        on_mark: Color::Rgb { r: 10, g: 10, b: 10 },
        noise: [
            Color::Rgb { r: 200, g: 200, b: 200 },
            Color::Rgb { r: 170, g: 170, b: 170 },
            Color::Rgb { r: 140, g: 140, b: 140 },
        ],
    };

    fn for_theme(dark: bool) -> Self {
        if dark { Self::DARK } else { Self::LIGHT }
    }
}

/// Portrait tints, picked by character id.
const TINTS: [Color; 6] = [
    Color::Rgb { r: 120, g: 190, b: 230 },
    Color::Rgb { r: 151, g: 206, b: 76 },
    Color::Rgb { r: 240, g: 180, b: 90 },
    Color::Rgb { r: 220, g: 120, b: 180 },
    Color::Rgb { r: 170, g: 140, b: 230 },
    Color::Rgb { r: 90, g: 200, b: 180 },
];

const NOISE_CHARS: [char; 3] = ['░', '▒', '▓'];
const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer {
            width: w,
            height: h,
            cells: vec![Cell::INVALID; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::INVALID; w * h];
        }
    }

    fn fill(&mut self, cell: Cell) {
        self.cells.fill(cell);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::INVALID
        }
    }

    /// Write a string at (x, y), one column per char. Returns the column
    /// after the last char written.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) -> usize {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width { break; }
            self.set(cx, y, Cell::new(ch, fg, bg));
            cx += 1;
        }
        cx
    }

    fn fill_row(&mut self, y: usize, x0: usize, x1: usize, bg: Color) {
        for x in x0..x1.min(self.width) {
            self.set(x, y, Cell::new(' ', bg, bg));
        }
    }
}

/// Truncate to `max` columns, marking the cut with an ellipsis.
fn fit(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = s.chars().take(max - 1).collect();
    out.push('…');
    out
}

/// Stable per-cell noise in [0, 1).
fn noise(seed: u32, x: usize, y: usize, frame: u32) -> f32 {
    let mut h = ((seed as u64) << 32) ^ ((x as u64) << 20) ^ ((y as u64) << 10) ^ frame as u64;
    h ^= h >> 33;
    h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
    h ^= h >> 33;
    h = h.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    h ^= h >> 33;
    (h % 1000) as f32 / 1000.0
}

// ── Layout ──

const HUD_ROW: usize = 0;
const CARD_ROW: usize = 2;
const CARD_COL: usize = 2;
const CARD_W: usize = 26;
const CARD_H: usize = 12;
const HINT_COL: usize = CARD_COL + CARD_W + 3;
const OPTIONS_ROW: usize = CARD_ROW + CARD_H + 1;
const OPTION_W: usize = 44;
const FEEDBACK_ROW: usize = OPTIONS_ROW + OPTION_COUNT + 1;
const MESSAGE_ROW: usize = FEEDBACK_ROW + 3;
const PANEL_W: usize = 20;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    palette: Palette,
    last_view: Option<(Phase, bool)>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            palette: Palette::DARK,
            last_view: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(self.palette.bg),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        self.back.fill(Cell::INVALID);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, s: &Session) -> io::Result<()> {
        self.palette = Palette::for_theme(s.dark);

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        let resized = tw as usize != self.term_w || th as usize != self.term_h;
        if resized {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
        }

        // Phase or theme change → clear for a clean transition
        let view = (s.phase(), s.dark);
        if resized || self.last_view != Some(view) {
            self.back.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(self.palette.bg), Clear(ClearType::All))?;
            self.last_view = Some(view);
        }

        self.compose(s);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = self.palette.text;
        let mut last_bg = self.palette.bg;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.as_str()))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, s: &Session) {
        let p = self.palette;
        self.front.fill(Cell::new(' ', p.text, p.bg));

        match s.phase() {
            Phase::Loading => self.compose_loading(s),
            Phase::Playing | Phase::Revealing => self.compose_round(s),
            Phase::GameOver => self.compose_game_over(s),
        }

        self.compose_message(s);
        self.compose_help(s);
    }

    fn compose_hud(&mut self, s: &Session) {
        let p = self.palette;
        let st = &s.state;
        self.front.fill_row(HUD_ROW, 0, self.front.width, p.hud_bg);

        let hearts: String = "♥".repeat(st.lives as usize)
            + &"♡".repeat(MAX_LIVES.saturating_sub(st.lives) as usize);
        let hud = format!(
            " RICK & MORTY TRIVIA │ Score {:<5}│ {} │ Round {:<3}│ {} ",
            st.score, hearts, st.current_round, st.difficulty.label(),
        );
        let end = self.front.put_str(0, HUD_ROW, &hud, p.text, p.hud_bg);

        let timer = format!(" ⏱ {:>2}s ", st.time_left);
        let warn = st.time_left <= WARN_SECONDS && s.phase() == Phase::Playing;
        let (fg, bg) = if warn { (p.on_mark, p.warn) } else { (p.text, p.hud_bg) };
        let col = self.front.width.saturating_sub(timer.chars().count()).max(end);
        self.front.put_str(col, HUD_ROW, &timer, fg, bg);
    }

    fn compose_round(&mut self, s: &Session) {
        let Some(q) = s.question.as_ref() else { return };
        let revealed = s.answer.is_some();

        self.compose_hud(s);
        self.compose_card(s, q, revealed);
        self.compose_hints(s, q, revealed);
        self.compose_options(s, q);
        self.compose_feedback(s, q);

        let panel_col = self.front.width.saturating_sub(PANEL_W + 1);
        if panel_col >= HINT_COL + 30 {
            self.compose_scores(s, panel_col, CARD_ROW);
        }
    }

    /// The obscured portrait: an oval silhouette in the character's tint,
    /// overlaid by shimmering noise whose density is the tier's obscurity.
    fn compose_card(&mut self, s: &Session, q: &Question, revealed: bool) {
        let p = self.palette;
        let (x0, y0) = (CARD_COL, CARD_ROW);
        let inner_w = CARD_W - 2;
        let inner_h = CARD_H - 2;

        let top = format!("┌{}┐", "─".repeat(inner_w));
        let bottom = format!("└{}┘", "─".repeat(inner_w));
        self.front.put_str(x0, y0, &top, p.dim, p.bg);
        self.front.put_str(x0, y0 + CARD_H - 1, &bottom, p.dim, p.bg);
        let title = if revealed { " REVEALED " } else { " WHO IS THIS? " };
        self.front.put_str(x0 + 2, y0, title, p.accent, p.bg);

        let tint = TINTS[q.answer.id as usize % TINTS.len()];
        let obscurity = if revealed { 0.0 } else { s.state.difficulty.obscurity() };
        let frame = s.anim_tick / 6;
        let (cx, cy) = (inner_w as f32 / 2.0, inner_h as f32 / 2.0);

        for y in 0..inner_h {
            self.front.put_str(x0, y0 + 1 + y, "│", p.dim, p.bg);
            self.front.put_str(x0 + CARD_W - 1, y0 + 1 + y, "│", p.dim, p.bg);
            for x in 0..inner_w {
                let r = noise(q.answer.id, x, y, frame);
                let cell = if r < obscurity {
                    let i = (r * 997.0) as usize % NOISE_CHARS.len();
                    Cell::new(NOISE_CHARS[i], p.noise[i], p.bg)
                } else {
                    let dx = (x as f32 + 0.5 - cx) / (inner_w as f32 * 0.34);
                    let dy = (y as f32 + 0.5 - cy) / (inner_h as f32 * 0.45);
                    if dx * dx + dy * dy <= 1.0 {
                        Cell::new('█', tint, p.bg)
                    } else {
                        Cell::new(' ', p.text, p.bg)
                    }
                };
                self.front.set(x0 + 1 + x, y0 + 1 + y, cell);
            }
        }

        if revealed {
            let label = format!(" {} ", fit(&q.answer.name, inner_w - 2));
            let lx = x0 + 1 + (inner_w - label.chars().count()) / 2;
            self.front.put_str(lx, y0 + CARD_H - 3, &label, p.on_mark, tint);
        }
    }

    fn compose_hints(&mut self, s: &Session, q: &Question, revealed: bool) {
        let p = self.palette;
        let avail = self.front.width.saturating_sub(HINT_COL + PANEL_W + 2).max(20);
        let mut row = CARD_ROW;

        self.front.put_str(HINT_COL, row, "HINTS", p.accent, p.bg);
        row += 2;

        let hints = q.answer.hints();
        let shown = if revealed { hints.len() } else { s.state.difficulty.hint_count() };
        if hints.is_empty() {
            self.front.put_str(HINT_COL, row, "No hints for this one.", p.dim, p.bg);
            row += 1;
        }
        for (label, value) in hints.iter().take(shown) {
            let line = fit(&format!("{label}: {value}"), avail);
            self.front.put_str(HINT_COL, row, &line, p.text, p.bg);
            row += 1;
        }
        let hidden = hints.len().saturating_sub(shown);
        if hidden > 0 {
            let line = format!("({hidden} more hidden at this level)");
            self.front.put_str(HINT_COL, row, &fit(&line, avail), p.dim, p.bg);
        }
    }

    fn compose_options(&mut self, s: &Session, q: &Question) {
        let p = self.palette;
        let correct = q.correct_slot();

        for (i, name) in q.options.iter().enumerate() {
            let y = OPTIONS_ROW + i;
            let cursor = s.answer.is_none() && s.cursor == i;
            let marker = if cursor { '▸' } else { ' ' };
            let text = format!(" {marker} [{}] {}", i + 1, fit(name, OPTION_W - 8));

            let (fg, bg) = match &s.answer {
                Some(_) if i == correct => (p.on_mark, p.good),
                Some(a) if a.selected == *name => (p.on_mark, p.bad),
                Some(_) => (p.dim, p.bg),
                None if cursor => (p.accent, p.bg),
                None => (p.text, p.bg),
            };
            self.front.fill_row(y, CARD_COL, CARD_COL + OPTION_W, bg);
            self.front.put_str(CARD_COL, y, &text, fg, bg);
        }
    }

    fn compose_feedback(&mut self, s: &Session, q: &Question) {
        let p = self.palette;
        let Some(a) = s.answer.as_ref() else { return };

        let (line, color) = if a.correct {
            (format!("Correct! +{CORRECT_POINTS}"), p.good)
        } else {
            (format!("Wrong! -{WRONG_PENALTY}  It was {}.", q.answer.name), p.bad)
        };
        self.front.put_str(CARD_COL, FEEDBACK_ROW, &line, color, p.bg);

        if !q.answer.image.is_empty() {
            let avail = self.front.width.saturating_sub(CARD_COL + 7);
            let link = fit(&q.answer.image, avail);
            let col = self.front.put_str(CARD_COL, FEEDBACK_ROW + 1, "Image ", p.dim, p.bg);
            self.front.put_str(col, FEEDBACK_ROW + 1, &link, p.accent, p.bg);
        }
    }

    fn compose_scores(&mut self, s: &Session, col: usize, row: usize) {
        let p = self.palette;
        self.front.put_str(col, row, "TOP SCORES", p.accent, p.bg);
        if s.top_scores.is_empty() {
            self.front.put_str(col, row + 2, "No scores yet", p.dim, p.bg);
            return;
        }
        let mut marked = false;
        for (i, score) in s.top_scores.iter().enumerate() {
            // Highlight the first entry matching this game's final score
            let mine = s.state.is_game_over && !marked && *score == s.state.score;
            marked |= mine;
            let fg = if mine { p.warn } else { p.text };
            let line = format!("{:>2}. {:>6}", i + 1, score);
            self.front.put_str(col, row + 2 + i, &line, fg, p.bg);
        }
    }

    fn compose_loading(&mut self, s: &Session) {
        let p = self.palette;
        let banner = [
            "╔══════════════════════════════════╗",
            "║      RICK & MORTY  TRIVIA        ║",
            "║   guess who, across dimensions   ║",
            "╚══════════════════════════════════╝",
        ];
        for (i, l) in banner.iter().enumerate() {
            self.front.put_str(4, 2 + i, l, p.accent, p.bg);
        }

        match &s.pool_error {
            Some(err) => {
                let avail = self.front.width.saturating_sub(8);
                self.front.put_str(6, 8, &fit(err, avail), p.bad, p.bg);
                self.front.put_str(6, 10, "▸ R: Try again   ▸ Esc: Quit", p.text, p.bg);
            }
            None => {
                let spin = SPINNER[(s.anim_tick / 4) as usize % SPINNER.len()];
                let line = format!("{spin} Fetching characters from the multiverse...");
                self.front.put_str(6, 8, &line, p.text, p.bg);
            }
        }
    }

    fn compose_game_over(&mut self, s: &Session) {
        let p = self.palette;
        let box_art = [
            "╔════════════════════════════════╗",
            "║          GAME  OVER            ║",
            "╚════════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(4, 2 + i, l, p.bad, p.bg);
        }

        let st = &s.state;
        let stats = &s.stats;
        let lines = [
            ("Final score", st.score.to_string()),
            ("Rounds played", st.rounds_played().to_string()),
            ("Accuracy", format!("{}%", stats.accuracy())),
            ("Best streak", stats.best_streak.to_string()),
            ("Average time", format!("{}s", stats.average_time.round() as u64)),
            ("Difficulty", st.difficulty.label().to_string()),
        ];
        for (i, (label, value)) in lines.iter().enumerate() {
            let y = 7 + i;
            self.front.put_str(6, y, &format!("◈ {label:<14}"), p.dim, p.bg);
            self.front.put_str(23, y, value, p.text, p.bg);
        }

        self.compose_scores(s, 42, 7);
        self.front.put_str(6, 15, "▸ R: Play again   ▸ Esc: Quit", p.good, p.bg);
    }

    fn compose_message(&mut self, s: &Session) {
        if s.message.is_empty() || MESSAGE_ROW >= self.front.height {
            return;
        }
        let p = self.palette;
        let msg = format!(" ◈ {} ", s.message);
        self.front.fill_row(MESSAGE_ROW, 0, self.front.width, p.warn);
        self.front.put_str(0, MESSAGE_ROW, &msg, p.on_mark, p.warn);
    }

    fn compose_help(&mut self, s: &Session) {
        let Some(row) = self.front.height.checked_sub(1) else { return };
        let help = match s.phase() {
            Phase::Playing | Phase::Revealing => {
                " 1-4/A-D: Answer  ↑↓+Enter: Pick  R: Restart  T: Theme  Esc: Quit  │  Pad: Y/X/B/A"
            }
            _ => " R: Restart  T: Theme  Esc: Quit",
        };
        self.front.put_str(0, row, help, self.palette.dim, self.palette.bg);
    }
}
