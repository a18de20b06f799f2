/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// This eliminates flicker caused by full-screen redraws.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::ladder;
use crate::domain::question::{Question, OPTION_COUNT};
use crate::domain::rules;
use crate::quiz::session::{AnswerState, GameSession, LoadKind, Phase};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: [u8; 16],  // up to 16 bytes (supports ZWJ emoji sequences)
    ch_len: u8,
    fg: Color,
    bg: Color,
    wide: bool,    // true = this char occupies 2 terminal columns
    cont: bool,    // true = continuation of previous wide char (skip render)
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells.
    ///
    /// On VTE-based Linux terminals (GNOME Terminal, etc.), the inter-row gap
    /// pixels use the background color from the last Clear or the terminal's
    /// configured default.  By using the SAME explicit RGB for both
    /// `Clear(ClearType::All)` and every cell's background, the gap color
    /// matches the cell color exactly, eliminating visible horizontal lines.
    ///
    /// If your terminal's own background differs from this value, set it to
    /// RGB(22,22,35) in your terminal preferences for a seamless look.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell {
        ch: [b' ', 0,0,0, 0,0,0,0, 0,0,0,0, 0,0,0,0],
        ch_len: 1,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: false,
    };

    const WIDE_CONT: Cell = Cell {
        ch: [0; 16],
        ch_len: 0,
        fg: Color::White,
        bg: Cell::BASE_BG,
        wide: false,
        cont: true,
    };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell {
        ch: [b'?', 0,0,0, 0,0,0,0, 0,0,0,0, 0,0,0,0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
        wide: false,
        cont: false,
    };

    /// Normalize bg: Color::Reset → BASE_BG so that every cell gets an
    /// explicit background color (never terminal-default).
    #[inline]
    fn norm_bg(bg: Color) -> Color {
        match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        }
    }

    fn from_char(c: char, fg: Color, bg: Color, _bold: bool) -> Self {
        let mut cell = Self::BLANK;
        let len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.ch_len = len;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell
    }

    fn from_char_wide(c: char, fg: Color, bg: Color, _bold: bool) -> Self {
        let mut cell = Self::BLANK;
        let len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.ch_len = len;
        cell.fg = fg;
        cell.bg = Self::norm_bg(bg);
        cell.wide = true;
        cell
    }

    fn as_str(&self) -> &str {
        if self.ch_len == 0 { return ""; }
        unsafe { std::str::from_utf8_unchecked(&self.ch[..self.ch_len as usize]) }
    }
}

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
            cells: vec![Cell::BLANK; w * h],
        }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
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
            Cell::BLANK
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color, _bold: bool) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width { break; }
            self.set(cx, y, Cell::from_char(ch, fg, bg, false));
            cx += 1;
        }
    }

    /// Fill a row span with a background color.
    fn fill_row(&mut self, x0: usize, x1: usize, y: usize, fg: Color, bg: Color) {
        for x in x0..x1.min(self.width) {
            self.set(x, y, Cell::from_char(' ', fg, bg, false));
        }
    }
}

// ── Renderer ──

/// Vertical offsets
const HUD_ROW: usize = 0;
const BODY_ROW: usize = 2;

/// Width of the prize ladder panel on the right edge.
const LADDER_W: usize = 20;

const SPINNER: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

// ── Palette ──

const GOLD: Color = Color::Rgb { r: 255, g: 220, b: 50 };
const GREEN_HI: Color = Color::Rgb { r: 80, g: 255, b: 80 };
const RED_HI: Color = Color::Rgb { r: 255, g: 60, b: 60 };
const CYAN: Color = Color::Rgb { r: 100, g: 200, b: 255 };
const HUD_BG: Color = Color::Rgb { r: 20, g: 20, b: 60 };
const CORRECT_BG: Color = Color::Rgb { r: 40, g: 120, b: 40 };
const WRONG_BG: Color = Color::Rgb { r: 140, g: 30, b: 30 };
const CHECKING_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };
const PANEL_BG: Color = Color::Rgb { r: 35, g: 35, b: 55 };

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_phase: None,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

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

    pub fn render(&mut self, s: &GameSession) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            // Force full repaint after resize.
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Detect phase change → clear for clean transition
        let phase_changed = self.last_phase != Some(s.phase);
        if phase_changed {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(s.phase);
        }

        // Build front buffer
        self.front.clear();

        match s.phase {
            Phase::Title => self.compose_title(),
            Phase::Loading => self.compose_loading(s),
            Phase::Playing => self.compose_game(s),
            Phase::Lost => self.compose_lost(s),
            Phase::Won => self.compose_won(),
        }

        // Diff and emit
        self.flush_diff()?;

        // Swap: current front becomes next back
        std::mem::swap(&mut self.front, &mut self.back);

        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Set explicit base colors at start of frame.
        // IMPORTANT: Do NOT use ResetColor here — it resets to the terminal's
        // native default, which may differ from BASE_BG and cause line artifacts.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            let mut x = 0;
            while x < self.front.width {
                let cell = self.front.get(x, y);
                let prev = self.back.get(x, y);

                // Skip continuation cells (right half of wide emoji)
                if cell.cont {
                    if cell != prev { need_move = true; }
                    x += 1;
                    continue;
                }

                // For wide cells, also check if the continuation changed
                let cont_changed = cell.wide
                    && x + 1 < self.front.width
                    && self.front.get(x + 1, y) != self.back.get(x + 1, y);

                if cell == prev && !cont_changed {
                    need_move = true;
                    x += 1;
                    continue;
                }

                // Position cursor if needed
                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }

                // Set colors only if changed
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }

                queue!(self.writer, Print(cell.as_str()))?;

                if cell.wide {
                    // Wide char printed: cursor advanced 2 columns
                    last_x = x + 1;
                    x += 2; // skip the continuation cell
                } else {
                    last_x = x;
                    x += 1;
                }
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose_game(&mut self, s: &GameSession) {
        self.compose_hud(s);
        self.compose_ladder(s);

        let card_w = self.card_width();

        match s.loading {
            Some(LoadKind::Question) => {
                self.compose_question_spinner(s, card_w);
            }
            _ => {
                if s.load_error.is_some() {
                    self.compose_load_error(s, card_w);
                } else if let Some(q) = &s.question {
                    self.compose_question_card(s, q, card_w);
                }
            }
        }

        self.compose_lifeline_bar(s);

        if let Some(msg) = &s.friend_message {
            self.compose_friend_panel(msg, card_w);
        } else if s.loading == Some(LoadKind::Advice) {
            self.compose_calling_panel(s, card_w);
        }

        // ── Help bar ──
        let help_row = self.front.height.saturating_sub(1);
        let help = if s.load_error.is_some() {
            " R:Retry  │  ESC:Title  Ctrl+C:Quit"
        } else {
            " 1-4/A-D:Answer  F:50:50  P:Phone  S:Swap  │  ESC:Title  Ctrl+C:Quit"
        };
        self.front.put_str(0, help_row, help, Color::DarkGrey, Color::Reset, false);

        // The swap prompt draws over everything else
        if s.confirm_swap {
            self.compose_swap_overlay();
        }
    }

    /// Columns available to the question card, left of the ladder panel.
    fn card_width(&self) -> usize {
        self.front.width.saturating_sub(LADDER_W + 3)
    }

    fn compose_hud(&mut self, s: &GameSession) {
        let buf_w = self.front.width;
        let band = rules::band_for_level(s.question.as_ref().map_or(s.level, |q| q.level));
        let hud = format!(
            " Level {:<2}/15  {:<6}  At stake: ${} ",
            s.level,
            band.label(),
            ladder::prize_for_level(s.level),
        );
        self.front.fill_row(0, buf_w, HUD_ROW, Color::White, HUD_BG);
        self.front.put_str(0, HUD_ROW, &hud, Color::White, HUD_BG, false);

        let secured = format!(" Banked: ${} ", ladder::secured_prize(s.level));
        let sx = buf_w.saturating_sub(secured.chars().count() + 1);
        self.front.put_str(sx, HUD_ROW, &secured, GREEN_HI, HUD_BG, false);
    }

    /// The prize ladder panel on the right edge: summit at the top,
    /// current tier highlighted, banked tiers dimmed out.
    fn compose_ladder(&mut self, s: &GameSession) {
        let buf_w = self.front.width;
        if buf_w <= LADDER_W { return; }
        let x0 = buf_w - LADDER_W;

        for (i, tier) in (1..=ladder::TOP_LEVEL).rev().enumerate() {
            let row = BODY_ROW + i;
            if row >= self.front.height { break; }

            let marker = if ladder::is_milestone(tier) { '◆' } else { ' ' };
            let line = format!(
                "{} {:>2}  {:>9} ",
                marker,
                tier,
                ladder::prize_for_level(tier)
            );

            let (fg, bg) = if tier == s.level {
                (Color::Black, GOLD)
            } else if tier < s.level {
                (Color::Rgb { r: 90, g: 140, b: 90 }, Color::Reset)
            } else if ladder::is_milestone(tier) {
                (GOLD, Color::Reset)
            } else {
                (Color::Rgb { r: 170, g: 170, b: 190 }, Color::Reset)
            };

            if tier == s.level {
                self.front.fill_row(x0, buf_w, row, fg, bg);
            }
            self.front.put_str(x0, row, &line, fg, bg, tier == s.level);
        }
    }

    fn compose_question_card(&mut self, s: &GameSession, q: &Question, card_w: usize) {
        let text_w = card_w.saturating_sub(4);
        if text_w == 0 { return; }

        // ── Prompt ──
        let mut row = BODY_ROW;
        for line in wrap_text(&q.prompt, text_w).iter().take(4) {
            self.front.put_str(2, row, line, Color::White, Color::Reset, true);
            row += 1;
        }
        row += 1;

        // ── Options ──
        let blink = (s.tick / 5) % 2 == 0;
        for (i, option) in q.options.iter().enumerate().take(OPTION_COUNT) {
            if row >= self.front.height { break; }
            let label = (b'A' + i as u8) as char;

            if s.is_option_hidden(i) {
                let ghost = format!("  {label})");
                self.front.put_str(2, row, &ghost, Color::Rgb { r: 70, g: 70, b: 90 }, Color::Reset, false);
                row += 1;
                continue;
            }

            let highlight = match s.answer {
                AnswerState::Checking { .. } if s.selected == Some(i) => {
                    Some((Color::Black, CHECKING_BG))
                }
                AnswerState::Correct { .. } | AnswerState::Wrong { .. }
                    if i == q.correct_index =>
                {
                    Some((Color::Black, CORRECT_BG))
                }
                AnswerState::Wrong { .. } if s.selected == Some(i) => {
                    Some((Color::White, WRONG_BG))
                }
                _ => None,
            };

            match highlight {
                Some((fg, bg)) => {
                    self.front.fill_row(2, 2 + card_w.saturating_sub(2), row, fg, bg);
                    let marker = if matches!(s.answer, AnswerState::Checking { .. }) && blink {
                        '▸'
                    } else {
                        ' '
                    };
                    let text = format!("{marker} {label}) {}", clip(option, text_w));
                    self.front.put_str(2, row, &text, fg, bg, true);
                }
                None => {
                    let letter = format!("  {label})");
                    self.front.put_str(2, row, &letter, CYAN, Color::Reset, false);
                    self.front.put_str(7, row, &clip(option, text_w.saturating_sub(5)), Color::White, Color::Reset, false);
                }
            }
            row += 1;
        }
        row += 1;

        // ── Verdict and explanation (shown through the reveal holds) ──
        match s.answer {
            AnswerState::Correct { .. } => {
                self.front.put_str(2, row, "✓ Correct!", GREEN_HI, Color::Reset, true);
                row += 1;
                self.compose_explanation(q, row, text_w);
            }
            AnswerState::Wrong { .. } => {
                let answer = (b'A' + (q.correct_index as u8).min(3)) as char;
                let verdict = format!("✗ Wrong. The answer was {answer}");
                self.front.put_str(2, row, &verdict, RED_HI, Color::Reset, true);
                row += 1;
                self.compose_explanation(q, row, text_w);
            }
            _ => {}
        }
    }

    fn compose_explanation(&mut self, q: &Question, mut row: usize, text_w: usize) {
        for line in wrap_text(&q.explanation, text_w).iter().take(2) {
            if row >= self.front.height { break; }
            self.front.put_str(2, row, line, Color::Rgb { r: 150, g: 170, b: 200 }, Color::Reset, false);
            row += 1;
        }
    }

    /// Spinner in place of the card while the next question is fetched.
    fn compose_question_spinner(&mut self, s: &GameSession, card_w: usize) {
        let frame = SPINNER[(s.tick / 2) as usize % SPINNER.len()];
        let msg = format!("{frame}  Fetching the next question...");
        let row = BODY_ROW + 4;
        let cx = (card_w.saturating_sub(msg.chars().count())) / 2;
        self.front.put_str(cx.max(2), row, &msg, CYAN, Color::Reset, false);
    }

    fn compose_load_error(&mut self, s: &GameSession, card_w: usize) {
        let text_w = card_w.saturating_sub(4);
        let mut row = BODY_ROW + 2;
        self.front.put_str(2, row, "✕ Couldn't fetch a question", RED_HI, Color::Reset, true);
        row += 2;
        if let Some(err) = &s.load_error {
            for line in wrap_text(err, text_w).iter().take(3) {
                self.front.put_str(2, row, line, Color::Rgb { r: 200, g: 150, b: 150 }, Color::Reset, false);
                row += 1;
            }
        }
        row += 1;
        self.front.put_str(2, row, "▸ R: Retry    ESC: Title", GREEN_HI, Color::Reset, false);
    }

    fn compose_lifeline_bar(&mut self, s: &GameSession) {
        let row = self.front.height.saturating_sub(3);
        let used_fg = Color::Rgb { r: 70, g: 70, b: 90 };
        let entries = [
            ("F", "50:50", s.lifelines.fifty_fifty),
            ("P", "Phone a Friend", s.lifelines.call_friend),
            ("S", "Swap Question", s.lifelines.change_question),
        ];
        let mut x = 2;
        for (key, name, used) in entries {
            let (key_fg, name_fg) = if used {
                (used_fg, used_fg)
            } else {
                (GOLD, Color::White)
            };
            let key_str = format!("[{key}]");
            self.front.put_str(x, row, &key_str, key_fg, Color::Reset, false);
            x += key_str.chars().count() + 1;
            self.front.put_str(x, row, name, name_fg, Color::Reset, false);
            x += name.chars().count() + 4;
        }
    }

    /// The friend's advice, shown until dismissed or an answer locks in.
    fn compose_friend_panel(&mut self, msg: &str, card_w: usize) {
        let h = self.front.height;
        let panel_h = 5;
        let top = h.saturating_sub(panel_h + 4);
        let x1 = 2 + card_w.saturating_sub(2);
        let text_w = card_w.saturating_sub(6);

        for y in top..top + panel_h {
            self.front.fill_row(1, x1, y, Color::White, PANEL_BG);
        }

        self.front.set(3, top, Cell::from_char_wide('📞', Color::Reset, PANEL_BG, false));
        self.front.set(4, top, Cell::WIDE_CONT);
        self.front.put_str(6, top, "Your friend says:", GOLD, PANEL_BG, true);

        let mut row = top + 1;
        for line in wrap_text(msg, text_w).iter().take(3) {
            self.front.put_str(3, row, line, Color::White, PANEL_BG, false);
            row += 1;
        }
        self.front.put_str(3, top + panel_h - 1, "(ENTER to close)", Color::DarkGrey, PANEL_BG, false);
    }

    /// Blinking "calling" notice while the advice fetch is in flight.
    fn compose_calling_panel(&mut self, s: &GameSession, card_w: usize) {
        let h = self.front.height;
        let row = h.saturating_sub(5);
        if (s.tick / 4) % 2 == 0 {
            let msg = "📞 Calling your friend...";
            let cx = (card_w.saturating_sub(msg.chars().count())) / 2;
            self.front.set(cx.max(2), row, Cell::from_char_wide('📞', Color::Reset, Color::Reset, false));
            self.front.set(cx.max(2) + 1, row, Cell::WIDE_CONT);
            self.front.put_str(cx.max(2) + 3, row, "Calling your friend...", CYAN, Color::Reset, false);
        }
    }

    fn compose_swap_overlay(&mut self) {
        let box_art = [
            "╔══════════════════════════════════╗",
            "║        Swap this question?       ║",
            "║   Uses your one Swap lifeline    ║",
            "║      ENTER: Swap   ESC: Keep     ║",
            "╚══════════════════════════════════╝",
        ];
        let bw = box_art[0].chars().count();
        let bx = self.front.width.saturating_sub(bw) / 2;
        let by = self.front.height.saturating_sub(box_art.len()) / 2;
        let bg = Color::Rgb { r: 20, g: 50, b: 20 };
        for (i, line) in box_art.iter().enumerate() {
            let fg = if i == 3 { GREEN_HI } else { GOLD };
            self.front.put_str(bx, by + i, line, fg, bg, true);
        }
    }

    // ── Static screens (title, loading, end screens) ──

    fn compose_title(&mut self) {
        let title = [
            r"  ___  _   _  __  __  __  __  ___  _____     ___   _   _  ___  ____ ",
            r" / __|| | | ||  \/  ||  \/  ||_ _||_   _|   / _ \ | | | ||_ _||_  / ",
            r" \__ \| |_| || |\/| || |\/| | | |   | |    | (_) || |_| | | |  / /  ",
            r" |___/ \___/ |_|  |_||_|  |_||___|  |_|     \__\_\ \___/ |___|/___| ",
        ];

        for (i, line) in title.iter().enumerate() {
            self.front.put_str(2, 2 + i, line, GOLD, Color::Reset, true);
        }

        let subtitle = "◆◆  Fifteen Questions to a Million  ◆◆";
        let sx = 2 + (title[1].len().saturating_sub(subtitle.chars().count())) / 2;
        self.front.put_str(sx, 7, subtitle, GREEN_HI, Color::Reset, true);

        let tagline = "━━━ Terminal Edition (Rust) ━━━";
        let tx = 2 + (title[1].len().saturating_sub(tagline.chars().count())) / 2;
        self.front.put_str(tx, 9, tagline, Color::Rgb { r: 180, g: 140, b: 50 }, Color::Reset, false);

        // Menu options
        let menu_base = 12;
        self.front.put_str(8, menu_base, "ENTER   Start the Climb", GREEN_HI, Color::Reset, true);
        self.front.put_str(8, menu_base + 1, "  Q     Quit", Color::White, Color::Reset, false);

        let summit = format!("      ◆ Top prize: ${}", ladder::prize_for_level(ladder::TOP_LEVEL));
        self.front.put_str(8, menu_base + 3, &summit, Color::DarkGrey, Color::Reset, false);

        // Controls reference
        let help = [
            "Controls",
            "  1-4 / A-D     Answer",
            "  F  50:50      P  Phone a Friend",
            "  S  Swap Question",
            "  R  Retry fetch     ESC  Title",
        ];

        let help_base = menu_base + 5;
        for (i, line) in help.iter().enumerate() {
            let color = if i == 0 { GOLD } else { Color::White };
            self.front.put_str(8, help_base + i, line, color, Color::Reset, false);
        }
    }

    /// First fetch of a run: whole-screen spinner, or the failure notice.
    fn compose_loading(&mut self, s: &GameSession) {
        if s.load_error.is_some() {
            let box_art = [
                "╔════════════════════════════════╗",
                "║    ✕  NO QUESTION CAME  ✕      ║",
                "╚════════════════════════════════╝",
            ];
            for (i, l) in box_art.iter().enumerate() {
                self.front.put_str(6, 4 + i, l, RED_HI, Color::Reset, true);
            }
            let mut row = 9;
            if let Some(err) = &s.load_error {
                for line in wrap_text(err, self.front.width.saturating_sub(12)).iter().take(3) {
                    self.front.put_str(8, row, line, Color::Rgb { r: 200, g: 150, b: 150 }, Color::Reset, false);
                    row += 1;
                }
            }
            self.front.put_str(8, row + 1, "▸ R:   Try again", GREEN_HI, Color::Reset, false);
            self.front.put_str(8, row + 2, "▸ ESC: Back to Title", Color::DarkGrey, Color::Reset, false);
            return;
        }

        let frame = SPINNER[(s.tick / 2) as usize % SPINNER.len()];
        let msg = format!("{frame}  Preparing your first question...");
        let cx = self.front.width.saturating_sub(msg.chars().count()) / 2;
        let cy = self.front.height / 2;
        self.front.put_str(cx, cy, &msg, CYAN, Color::Reset, true);
    }

    fn compose_lost(&mut self, s: &GameSession) {
        let box_art = [
            "╔════════════════════════════════╗",
            "║      ✕  GAME  OVER  ✕          ║",
            "╚════════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(6, 3 + i, l, RED_HI, Color::Reset, true);
        }

        let take_home = format!("◆ You take home: ${}", ladder::secured_prize(s.level));
        let reached = format!("◆ Fell at level {} of 15", s.level);
        self.front.put_str(8, 7, &take_home, GOLD, Color::Reset, true);
        self.front.put_str(8, 8, &reached, Color::White, Color::Reset, false);

        // Show what the answer was
        let mut row = 10;
        if let Some(q) = &s.question {
            if let Some(answer) = q.options.get(q.correct_index) {
                let letter = (b'A' + (q.correct_index as u8).min(3)) as char;
                let line = format!("The answer was {letter}) {}", clip(answer, 50));
                self.front.put_str(8, row, &line, GREEN_HI, Color::Reset, false);
                row += 1;
            }
            for line in wrap_text(&q.explanation, self.front.width.saturating_sub(16)).iter().take(2) {
                self.front.put_str(8, row, line, Color::Rgb { r: 150, g: 170, b: 200 }, Color::Reset, false);
                row += 1;
            }
        }

        self.front.put_str(8, row + 2, "▸ N / ENTER: Climb again", GREEN_HI, Color::Reset, false);
        self.front.put_str(8, row + 3, "▸ ESC:       Back to Title", Color::DarkGrey, Color::Reset, false);
    }

    fn compose_won(&mut self) {
        let box_art = [
            "╔══════════════════════════════════════╗",
            "║   ★  THE MILLION IS YOURS!  ★        ║",
            "╚══════════════════════════════════════╝",
        ];
        for (i, l) in box_art.iter().enumerate() {
            self.front.put_str(4, 4 + i, l, GOLD, Color::Reset, true);
        }
        let prize = format!("◆ You take home: ${}", ladder::prize_for_level(ladder::TOP_LEVEL));
        self.front.put_str(6, 9, &prize, GOLD, Color::Reset, true);
        self.front.put_str(6, 10, "◆ All fifteen questions, straight to the summit", GREEN_HI, Color::Reset, false);
        self.front.put_str(6, 12, "▸ N / ENTER: Play again", GREEN_HI, Color::Reset, false);
        self.front.put_str(6, 13, "▸ ESC:       Back to Title", Color::DarkGrey, Color::Reset, false);
    }
}

// ── Text helpers ──

/// Greedy word wrap. Words wider than the line are hard-split.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    if width == 0 {
        return lines;
    }
    let mut current = String::new();
    let mut used = 0usize;
    for word in text.split_whitespace() {
        let mut word = word.to_string();
        let mut wlen = word.chars().count();
        while wlen > width {
            if used > 0 {
                lines.push(std::mem::take(&mut current));
                used = 0;
            }
            let head: String = word.chars().take(width).collect();
            word = word.chars().skip(width).collect();
            wlen = word.chars().count();
            lines.push(head);
        }
        let needed = if used == 0 { wlen } else { wlen + 1 };
        if used + needed > width {
            lines.push(std::mem::take(&mut current));
            used = 0;
        }
        if used > 0 {
            current.push(' ');
            used += 1;
        }
        current.push_str(&word);
        used += wlen;
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Truncate to `max` columns with a trailing ellipsis, on char boundaries.
fn clip(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
