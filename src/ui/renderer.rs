/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Layout:
///   row 0        player header
///   row 1        tab bar (active tab highlighted)
///   row 2        rule
///   rows 3..     current screen
///   height-2     message bar (when a message is showing)
///   height-1     location / history / save status
///
/// The escape menu is an overlay drawn on top of whatever screen is showing.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::app::{App, Screen, DAILY_COINS, DAILY_XP, PRACTICE_STEP};
use crate::domain::player::{PlayerStats, XP_PER_LEVEL};
use crate::domain::shop::{self, Rarity};
use crate::domain::state::GameState;
use crate::domain::tab::{tab_for_path, ALL_TABS};
use crate::domain::world::WorldProgress;
use crate::nav::history::Navigator;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit background for every "empty" cell. Using the same RGB for
    /// `Clear(ClearType::All)` keeps VTE row gaps the same colour.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel that differs from any real cell, forcing a full repaint.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
        let bg = match bg {
            Color::Reset => Self::BASE_BG,
            other => other,
        };
        Cell { ch, fg, bg }
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
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
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

    /// Write a string at (x, y); one column per char, clipped at the edge.
    /// Returns the column after the last char written.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) -> usize {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width { break; }
            self.set(cx, y, Cell::new(ch, fg, bg));
            cx += 1;
        }
        cx
    }

    fn fill_row(&mut self, y: usize, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', Color::White, bg));
        }
    }

    #[cfg(test)]
    fn row_text(&self, y: usize) -> String {
        (0..self.width).map(|x| self.get(x, y).ch).collect::<String>().trim_end().to_string()
    }
}

// ── Palette ──

const GOLD: Color = Color::Rgb { r: 255, g: 200, b: 50 };
const GREEN: Color = Color::Rgb { r: 80, g: 255, b: 80 };
const CYAN: Color = Color::Rgb { r: 100, g: 200, b: 255 };
const SOFT: Color = Color::Rgb { r: 180, g: 180, b: 180 };
const RED: Color = Color::Rgb { r: 255, g: 90, b: 90 };
const TAB_BG: Color = Color::Rgb { r: 50, g: 50, b: 80 };
const MENU_BG: Color = Color::Rgb { r: 40, g: 40, b: 40 };
const MSG_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };

const HEADER_ROW: usize = 0;
const TAB_ROW: usize = 1;
const BODY_ROW: usize = 4;
const LEFT: usize = 2;

/// Fixed-width bar for a 0-100 percentage: `██████░░░░`.
fn progress_bar(percent: u32, width: usize) -> String {
    let filled = (percent.min(100) as usize * width + 50) / 100;
    let mut s = "█".repeat(filled);
    s.push_str(&"░".repeat(width - filled));
    s
}

fn rarity_color(r: Rarity) -> Color {
    match r {
        Rarity::Common => SOFT,
        Rarity::Rare => CYAN,
        Rarity::Epic => Color::Rgb { r: 200, g: 120, b: 255 },
        Rarity::Legendary => GOLD,
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_screen: Option<Screen>,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_screen: None,
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
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// Next frame repaints every cell.
    pub fn invalidate(&mut self) {
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn render(&mut self, app: &App) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Screen change → clear for a clean transition
        let screen = app.screen();
        if self.last_screen.as_ref() != Some(&screen) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_screen = Some(screen);
        }

        self.compose(app);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        // Explicit base colours; ResetColor would fall back to the terminal default.
        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(Cell::BASE_BG))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }

                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, app: &App) {
        self.front.clear();
        // One owned copy per frame; the screens below never touch the store.
        let state = app.game.snapshot();

        self.compose_header(&state.player_stats);
        self.compose_tab_bar(app, &state.active_tab);

        match app.screen() {
            Screen::Overworld => self.compose_overworld(&state),
            Screen::World(id) => self.compose_world(&state, &id),
            Screen::Rewards => self.compose_rewards(app, &state.player_stats),
            Screen::Character => self.compose_character(&state.player_stats),
            Screen::Collections => self.compose_collections(&state),
            Screen::Shop => self.compose_shop(state.player_stats.coins),
        }

        self.compose_status(app);

        if app.menu.is_open() {
            self.compose_menu_overlay(app);
        }
    }

    fn compose_header(&mut self, p: &PlayerStats) {
        let x = self.front.put_str(LEFT, HEADER_ROW, "QUESTMAP", GOLD, Color::Reset);
        let x = self.front.put_str(x + 3, HEADER_ROW, &p.username, Color::White, Color::Reset);
        let x = self.front.put_str(x + 2, HEADER_ROW, &format!("Lv {}", p.level), CYAN, Color::Reset);
        let x = self.front.put_str(x + 2, HEADER_ROW, &format!("◆ {}", p.coins), GOLD, Color::Reset);
        let xp = format!("XP {} {}/{}", progress_bar(p.xp_progress * 100 / XP_PER_LEVEL, 10), p.xp_progress, XP_PER_LEVEL);
        self.front.put_str(x + 2, HEADER_ROW, &xp, GREEN, Color::Reset);
    }

    fn compose_tab_bar(&mut self, app: &App, active: &str) {
        self.front.fill_row(TAB_ROW, TAB_BG);
        let mut x = LEFT;
        for tab in ALL_TABS {
            let key = app.router.key_for(tab).map_or(String::new(), |c| format!("{} ", c));
            let label = format!(" {}{} ", key, tab.label());
            let (fg, bg) = if tab.id() == active { (Color::Black, GOLD) } else { (SOFT, TAB_BG) };
            x = self.front.put_str(x, TAB_ROW, &label, fg, bg) + 1;
        }
        let rule = "─".repeat(self.front.width);
        self.front.put_str(0, TAB_ROW + 1, &rule, Color::DarkGrey, Color::Reset);
    }

    fn compose_world_line(&mut self, y: usize, w: &WorldProgress, selected: bool) {
        let marker = if selected { "▶" } else { " " };
        let (fg, bar_fg) = if w.is_unlocked { (Color::White, GREEN) } else { (Color::DarkGrey, Color::DarkGrey) };
        self.front.put_str(LEFT, y, marker, GOLD, Color::Reset);
        self.front.put_str(LEFT + 2, y, &w.title, fg, Color::Reset);
        if !w.is_unlocked {
            self.front.put_str(LEFT + 26, y, "locked", Color::DarkGrey, Color::Reset);
            return;
        }
        let x = self.front.put_str(LEFT + 26, y, &progress_bar(w.completion_percentage, 20), bar_fg, Color::Reset);
        let detail = format!("{:>4}%  {}/{}", w.completion_percentage, w.activities_completed, w.total_activities);
        self.front.put_str(x + 1, y, &detail, SOFT, Color::Reset);
        if w.is_complete() {
            self.front.put_str(x + 18, y, "★", GOLD, Color::Reset);
        }
    }

    fn compose_overworld(&mut self, state: &GameState) {
        self.front.put_str(LEFT, BODY_ROW, "Overworld", GOLD, Color::Reset);
        let selected = state.active_world.as_deref();
        let mut y = BODY_ROW + 2;
        for w in state.ordered_worlds() {
            self.compose_world_line(y, w, selected == Some(w.id.as_str()));
            y += 2;
        }
        self.front.put_str(LEFT, y + 1, "↑↓ Select   ENTER Enter world   ESC Menu", Color::DarkGrey, Color::Reset);
    }

    fn compose_world(&mut self, state: &GameState, id: &str) {
        let w = match state.world(id) {
            Some(w) => w,
            None => {
                self.front.put_str(LEFT, BODY_ROW, &format!("No world called \"{}\"", id), RED, Color::Reset);
                self.front.put_str(LEFT, BODY_ROW + 2, "[ Back", Color::DarkGrey, Color::Reset);
                return;
            }
        };

        self.front.put_str(LEFT, BODY_ROW, &w.title, GOLD, Color::Reset);
        if !w.is_unlocked {
            self.front.put_str(LEFT, BODY_ROW + 2, "This world is still locked.", RED, Color::Reset);
            self.front.put_str(LEFT, BODY_ROW + 4, "[ Back", Color::DarkGrey, Color::Reset);
            return;
        }

        let x = self.front.put_str(LEFT, BODY_ROW + 2, &progress_bar(w.completion_percentage, 30), GREEN, Color::Reset);
        self.front.put_str(x + 1, BODY_ROW + 2, &format!("{}%", w.completion_percentage), Color::White, Color::Reset);
        let acts = format!("Activities: {} of {}", w.activities_completed, w.total_activities);
        self.front.put_str(LEFT, BODY_ROW + 4, &acts, SOFT, Color::Reset);

        let hint = if w.is_complete() {
            "★ World cleared".to_string()
        } else {
            format!("SPACE Practice (+{}%)", PRACTICE_STEP)
        };
        self.front.put_str(LEFT, BODY_ROW + 6, &hint, CYAN, Color::Reset);
        self.front.put_str(LEFT, BODY_ROW + 8, "[ Back   ESC Menu", Color::DarkGrey, Color::Reset);
    }

    fn compose_rewards(&mut self, app: &App, p: &PlayerStats) {
        self.front.put_str(LEFT, BODY_ROW, "Rewards", GOLD, Color::Reset);

        let chest = format!("Daily chest: +{} coins  +{} XP", DAILY_COINS, DAILY_XP);
        self.front.put_str(LEFT, BODY_ROW + 2, &chest, Color::White, Color::Reset);
        if app.daily_claimed {
            self.front.put_str(LEFT, BODY_ROW + 3, "Claimed. Come back tomorrow.", Color::DarkGrey, Color::Reset);
        } else {
            self.front.put_str(LEFT, BODY_ROW + 3, "ENTER Claim", GREEN, Color::Reset);
        }

        let ach = format!("Achievements: {} / {}", p.achievement_count, p.total_achievements);
        self.front.put_str(LEFT, BODY_ROW + 5, &ach, SOFT, Color::Reset);
    }

    fn compose_character(&mut self, p: &PlayerStats) {
        self.front.put_str(LEFT, BODY_ROW, "Character", GOLD, Color::Reset);
        let rows = [
            ("Name", p.username.clone()),
            ("Level", p.level.to_string()),
            ("Coins", p.coins.to_string()),
            ("XP", format!("{} {}/{}", progress_bar(p.xp_progress * 100 / XP_PER_LEVEL, 20), p.xp_progress, XP_PER_LEVEL)),
            ("Achievements", format!("{} / {}", p.achievement_count, p.total_achievements)),
        ];
        for (i, (k, v)) in rows.iter().enumerate() {
            let y = BODY_ROW + 2 + i;
            self.front.put_str(LEFT, y, k, SOFT, Color::Reset);
            self.front.put_str(LEFT + 16, y, v, Color::White, Color::Reset);
        }
    }

    fn compose_collections(&mut self, state: &GameState) {
        self.front.put_str(LEFT, BODY_ROW, "Collections", GOLD, Color::Reset);

        let cleared = state.ordered_worlds().filter(|w| w.is_complete()).count();
        let summary = format!("Worlds cleared: {} / {}", cleared, state.worlds.len());
        self.front.put_str(LEFT, BODY_ROW + 2, &summary, Color::White, Color::Reset);

        for (i, w) in state.ordered_worlds().enumerate() {
            let (mark, fg) = if w.is_complete() { ("★", GOLD) } else { ("☆", Color::DarkGrey) };
            let x = self.front.put_str(LEFT + 2, BODY_ROW + 4 + i, mark, fg, Color::Reset);
            self.front.put_str(x + 1, BODY_ROW + 4 + i, &w.title, fg, Color::Reset);
        }
    }

    fn compose_shop(&mut self, coins: u32) {
        self.front.put_str(LEFT, BODY_ROW, "Shop", GOLD, Color::Reset);
        self.front.put_str(LEFT + 8, BODY_ROW, "(preview, purchasing opens soon)", Color::DarkGrey, Color::Reset);

        for (i, item) in shop::CATALOG.iter().enumerate() {
            let y = BODY_ROW + 2 + i;
            let name_fg = if coins >= item.price { Color::White } else { Color::DarkGrey };
            self.front.put_str(LEFT, y, item.name, name_fg, Color::Reset);
            self.front.put_str(LEFT + 22, y, item.rarity.label(), rarity_color(item.rarity), Color::Reset);
            self.front.put_str(LEFT + 34, y, &format!("◆ {:>5}", item.price), GOLD, Color::Reset);
            let expiry = format!("ends in {}", shop::format_expiry(item.expires_in_hours));
            self.front.put_str(LEFT + 44, y, &expiry, SOFT, Color::Reset);
        }
    }

    fn compose_status(&mut self, app: &App) {
        let h = self.front.height;
        if h < 3 {
            return;
        }

        if !app.message.is_empty() {
            let row = h - 2;
            self.front.fill_row(row, MSG_BG);
            self.front.put_str(0, row, &format!(" ◈ {} ", app.message), Color::Black, MSG_BG);
        }

        let row = h - 1;
        let loc = app.history.current_location().unwrap_or("?");
        let x = self.front.put_str(LEFT, row, loc, SOFT, Color::Reset);
        let back_fg = if app.history.can_go_back() { Color::White } else { Color::DarkGrey };
        let fwd_fg = if app.history.can_go_forward() { Color::White } else { Color::DarkGrey };
        let x = self.front.put_str(x + 3, row, "[ back", back_fg, Color::Reset);
        let x = self.front.put_str(x + 2, row, "] forward", fwd_fg, Color::Reset);
        let x = self.front.put_str(x + 2, row, "Q quit", Color::DarkGrey, Color::Reset);
        if let Some(err) = app.game.last_persist_error() {
            self.front.put_str(x + 3, row, &format!("not saved: {}", err), RED, Color::Reset);
        }
    }

    fn compose_menu_overlay(&mut self, app: &App) {
        let box_w = 32_usize.min(self.front.width);
        let box_h = (ALL_TABS.len() + 7).min(self.front.height);
        let box_x = self.front.width.saturating_sub(box_w) / 2;
        let box_y = self.front.height.saturating_sub(box_h) / 2;

        for y in box_y..box_y + box_h {
            for x in box_x..box_x + box_w {
                self.front.set(x, y, Cell::new(' ', Color::White, MENU_BG));
            }
        }

        let inner = box_w.saturating_sub(2);
        self.front.put_str(box_x, box_y, &format!("╔{}╗", "═".repeat(inner)), GOLD, MENU_BG);
        let title = "MENU";
        let pad = inner.saturating_sub(title.len()) / 2;
        self.front.put_str(box_x + 1 + pad, box_y + 1, title, GOLD, MENU_BG);
        self.front.put_str(box_x, box_y + 2, &format!("╚{}╝", "═".repeat(inner)), GOLD, MENU_BG);

        let current = tab_for_path(app.history.current_location().unwrap_or("/"));
        let mut y = box_y + 4;
        for tab in ALL_TABS {
            let key = app.router.key_for(tab).unwrap_or(' ');
            let x = self.front.put_str(box_x + 3, y, &key.to_string(), CYAN, MENU_BG);
            let fg = if tab == current { GOLD } else { SOFT };
            let x = self.front.put_str(x + 3, y, tab.label(), fg, MENU_BG);
            if tab == current {
                self.front.put_str(x + 1, y, "◀", GOLD, MENU_BG);
            }
            y += 1;
        }
        self.front.put_str(box_x + 3, y + 1, "ESC Resume", CYAN, MENU_BG);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::domain::tab::Tab;
    use crate::store::game::GameStateManager;
    use crate::store::medium::MemoryMedium;
    use crate::store::persist::{PersistentStateStore, DEFAULT_KEY};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn app() -> App {
        let medium = MemoryMedium::new();
        let game = GameStateManager::new(PersistentStateStore::new(Box::new(medium), DEFAULT_KEY));
        App::new(game, &AppConfig::defaults())
    }

    fn composed(app: &App) -> Renderer {
        let mut r = Renderer::new();
        r.front.resize(90, 30);
        r.compose(app);
        r
    }

    fn screen_text(r: &Renderer) -> String {
        (0..r.front.height).map(|y| r.front.row_text(y)).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn bar_rounds_half_up() {
        assert_eq!(progress_bar(0, 10), "░░░░░░░░░░");
        assert_eq!(progress_bar(25, 10), "███░░░░░░░");
        assert_eq!(progress_bar(100, 4), "████");
        assert_eq!(progress_bar(250, 4), "████");
    }

    #[test]
    fn put_str_clips_at_edge() {
        let mut fb = FrameBuffer::new(5, 1);
        assert_eq!(fb.put_str(3, 0, "abcdef", Color::White, Color::Reset), 5);
        assert_eq!(fb.row_text(0), "   ab");
        fb.put_str(0, 3, "ignored", Color::White, Color::Reset);
    }

    #[test]
    fn overworld_lists_every_world() {
        let r = composed(&app());
        let text = screen_text(&r);
        for title in ["Addition Meadows", "Subtraction Sands", "Multiplication Peaks", "Division Depths"] {
            assert!(text.contains(title), "missing {}", title);
        }
        assert!(text.contains("locked"));
        assert!(r.front.row_text(0).contains("Explorer"));
    }

    #[test]
    fn menu_overlay_shows_shortcuts() {
        let mut a = app();
        a.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        let text = screen_text(&composed(&a));
        assert!(text.contains("MENU"));
        assert!(text.contains("ESC Resume"));
        assert!(text.contains(Tab::Collections.label()));
    }

    #[test]
    fn status_shows_location_and_message() {
        let mut a = app();
        a.set_message("hello there");
        let r = composed(&a);
        assert!(r.front.row_text(29).contains("/overworld"));
        assert!(r.front.row_text(28).contains("hello there"));
    }

    #[test]
    fn shop_lists_catalog() {
        let mut a = app();
        a.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE));
        a.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::NONE));
        let text = screen_text(&composed(&a));
        assert!(text.contains("Golden Ratio Crown"));
        assert!(text.contains("Legendary"));
    }
}
