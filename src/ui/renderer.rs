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
///
/// One tile is drawn as two terminal columns. The player is drawn on the
/// tile nearest to its rounded pixel position; the renderer never sees
/// anything finer than `SessionState::player_view()`.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::tile::TileKind;
use crate::sim::world::{Phase, PlayerView, SessionState};

// ── Palette ──

const BG: Color = Color::Rgb { r: 100, g: 0, b: 99 };        // #640063
const WALL: Color = Color::Rgb { r: 205, g: 51, b: 255 };    // #cd33ff
const GOAL: Color = Color::Rgb { r: 255, g: 215, b: 0 };
const PLAYER: Color = Color::Black;
const PLAYER_DEAD: Color = Color::Rgb { r: 255, g: 0, b: 0 };
const HUD_BG: Color = Color::Rgb { r: 40, g: 0, b: 40 };
const BANNER_BG: Color = Color::Rgb { r: 200, g: 180, b: 50 };

/// Hazards flicker between these every frame.
const HAZARD_PALETTE: [Color; 4] = [
    Color::Rgb { r: 255, g: 0, b: 0 },
    Color::Rgb { r: 230, g: 30, b: 30 },
    Color::Rgb { r: 255, g: 80, b: 40 },
    Color::Rgb { r: 200, g: 0, b: 20 },
];

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit background for all "empty" terminal cells, so inter-row gap
    /// pixels match the cell colour on VTE terminals.
    const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };

    fn new(ch: char, fg: Color, bg: Color) -> Self {
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
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    /// Fill a whole row with a background, then write `s` on it.
    fn put_bar(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell::new(' ', fg, bg));
        }
        self.put_str(0, y, s, fg, bg);
    }
}

// ── Hazard flicker ──

/// Tiny LCG, private to the renderer: only picks hazard colours.
struct Flicker(u32);

impl Flicker {
    fn next_color(&mut self) -> Color {
        self.0 = self.0.wrapping_mul(1103515245).wrapping_add(12345);
        HAZARD_PALETTE[((self.0 >> 16) as usize) % HAZARD_PALETTE.len()]
    }
}

// ── Renderer ──

/// Terminal columns per tile (tiles are roughly square that way).
const CELL_W: usize = 2;

/// Vertical layout
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_phase: Option<Phase>,
    flicker: Flicker,
    /// Terminal reports key Release events (kitty keyboard protocol).
    pub key_release: bool,
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
            flicker: Flicker(0x2545_f491),
            key_release: false,
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

        // Release events make the jump hold exact instead of timeout-based.
        self.key_release = matches!(terminal::supports_keyboard_enhancement(), Ok(true));
        if self.key_release {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )?;
        }

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
        if self.key_release {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, session: &SessionState) -> io::Result<()> {
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

        // Phase change → clear for a clean transition
        if self.last_phase != Some(session.phase) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
            self.last_phase = Some(session.phase);
        }

        self.compose(session);

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

        // Explicit base colors at start of frame. ResetColor would fall back
        // to the terminal's own default and leave line artifacts.
        queue!(self.writer,
            SetForegroundColor(Color::White),
            SetBackgroundColor(Cell::BASE_BG),
        )?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
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

                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ── Compose: build front buffer content ──

    fn compose(&mut self, s: &SessionState) {
        self.front.clear();
        let grid = &s.grid;

        // ── HUD row ──
        let hud = format!(" {}   deaths: {} ", s.level_name, s.deaths);
        self.front.put_bar(HUD_ROW, &hud, Color::White, HUD_BG);

        // ── Map ──
        for (col, row, tile) in grid.iter_cells() {
            let cell = match tile {
                TileKind::Empty => Cell::new(' ', Color::White, BG),
                TileKind::Wall => Cell::new('█', WALL, BG),
                TileKind::HazardUp => Cell::new('▲', self.flicker.next_color(), BG),
                TileKind::HazardDown => Cell::new('▼', self.flicker.next_color(), BG),
                TileKind::Goal => Cell::new('◆', GOAL, BG),
            };
            self.put_tile(col, row, cell);
        }

        // ── Player ──
        if let Some((col, row)) = player_tile(s.player_view(), grid.tile_size()) {
            if col < grid.columns() && row < grid.rows() {
                let fg = if s.player_view().dead { PLAYER_DEAD } else { PLAYER };
                self.put_tile(col, row, Cell::new('█', fg, BG));
            }
        }

        // ── Banner + help ──
        let banner_row = MAP_ROW + grid.rows() + 1;
        let banner = match s.phase {
            Phase::Idle => Some(" Press Enter to start "),
            Phase::Won => Some(" You made it!  Enter: play again "),
            Phase::Playing if s.player.dead => Some(" Ouch! "),
            Phase::Playing => None,
        };
        if let Some(text) = banner {
            self.front.put_bar(banner_row, text, Color::Black, BANNER_BG);
        }
        let help = " ←/→ or A/D: move   ↑/W/Space: jump (hold to float, again to hover)   R: restart   Q: quit";
        self.front.put_str(0, banner_row + 2, help, Color::DarkGrey, Cell::BASE_BG);
    }

    fn put_tile(&mut self, col: usize, row: usize, cell: Cell) {
        for dx in 0..CELL_W {
            self.front.set(col * CELL_W + dx, MAP_ROW + row, cell);
        }
    }
}

/// Tile nearest to the player's rounded pixel position, if on screen.
fn player_tile(view: PlayerView, tile_size: f32) -> Option<(usize, usize)> {
    let col = (view.x as f32 / tile_size).round();
    let row = (view.y as f32 / tile_size).round();
    (col >= 0.0 && row >= 0.0).then_some((col as usize, row as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::physics::PhysicsParams;
    use crate::sim::level::parse_level;

    fn session(text: &str) -> SessionState {
        SessionState::new(parse_level(text, 10.0).unwrap(), PhysicsParams::default())
    }

    fn composed(s: &SessionState) -> Renderer {
        let mut r = Renderer::new();
        r.front.resize(120, 30);
        r.compose(s);
        r
    }

    fn map_cell(r: &Renderer, col: usize, row: usize) -> Cell {
        r.front.get(col * CELL_W, MAP_ROW + row)
    }

    const ROOM: &str = "
        # Test Room
        @ 10,10
        #####
        #..$#
        #^.v#
        #####
    ";

    #[test]
    fn draws_tiles_two_columns_wide() {
        let r = composed(&session(ROOM));
        assert_eq!(map_cell(&r, 0, 0).ch, '█');
        assert_eq!(map_cell(&r, 0, 0).fg, WALL);
        assert_eq!(r.front.get(1, MAP_ROW), map_cell(&r, 0, 0));
        assert_eq!(map_cell(&r, 3, 1).ch, '◆');
        assert_eq!(map_cell(&r, 2, 1).ch, ' ');
        assert_eq!(map_cell(&r, 2, 1).bg, BG);
    }

    #[test]
    fn hazards_use_the_flicker_palette() {
        let r = composed(&session(ROOM));
        for (col, glyph) in [(1, '▲'), (3, '▼')] {
            let cell = map_cell(&r, col, 2);
            assert_eq!(cell.ch, glyph);
            assert!(HAZARD_PALETTE.contains(&cell.fg));
        }
    }

    #[test]
    fn flicker_cycles_through_more_than_one_colour() {
        let mut f = Flicker(1);
        let colours: Vec<Color> = (0..32).map(|_| f.next_color()).collect();
        assert!(colours.iter().any(|c| *c != colours[0]));
    }

    #[test]
    fn player_drawn_at_spawn_and_red_when_dead() {
        let mut s = session(ROOM);
        let r = composed(&s);
        assert_eq!(map_cell(&r, 1, 1), Cell::new('█', PLAYER, BG));

        s.player.dead = true;
        let r = composed(&s);
        assert_eq!(map_cell(&r, 1, 1).fg, PLAYER_DEAD);
    }

    #[test]
    fn hud_shows_level_name_and_banner_follows_phase() {
        let mut s = session(ROOM);
        let r = composed(&s);
        let hud: String = (0..12).map(|x| r.front.get(x, HUD_ROW).ch).collect();
        assert_eq!(hud, " Test Room  ");
        let banner_row = MAP_ROW + 4 + 1;
        assert_eq!(r.front.get(1, banner_row).ch, 'P');

        s.phase = Phase::Playing;
        let r = composed(&s);
        assert_eq!(r.front.get(1, banner_row).ch, ' ');
        assert_eq!(r.front.get(1, banner_row).bg, Cell::BASE_BG);
    }

    #[test]
    fn player_tile_rounds_to_nearest() {
        let view = |x, y| PlayerView { x, y, dead: false };
        assert_eq!(player_tile(view(70, 60), 12.0), Some((6, 5)));
        assert_eq!(player_tile(view(14, 16), 10.0), Some((1, 2)));
        assert_eq!(player_tile(view(-20, 0), 10.0), None);
    }
}
