//! SAA5050 teletext character generator
//!
//! The P2000T display is 40 × 24 character cells read from video RAM. Each
//! row occupies 80 bytes of which the first 40 are shown. Bytes with bits 5
//! and 6 clear are serial attributes (colour, graphics, flash, height, hold);
//! they take effect at their own cell, which is shown as a space.
//!
//! Glyph indices produced here address a 224 entry font:
//! - 0..=95 alphanumerics (character code minus 32)
//! - 96..=159 contiguous mosaics
//! - 160..=223 separated mosaics
//!
//! Double height works over two screen rows: the row holding a double height
//! code is drawn twice (top band, then bottom band) from the same video RAM
//! line, after which the read pointer skips both lines.

/// Visible columns per row
pub const COLUMNS: usize = 40;
/// Rows per frame
pub const ROWS: usize = 24;
/// Bytes between the starts of two rows in video RAM
pub const ROW_STRIDE: usize = 80;
/// Video RAM size; addresses wrap inside it
pub const VRAM_SIZE: usize = 4096;
/// Cell commands produced by one decoding pass
pub const CELLS_PER_FRAME: usize = COLUMNS * ROWS;

const SPACE: u8 = 0x20;

/// Which half of a glyph a cell shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Band {
    #[default]
    Single = 0,
    Top = 1,
    Bottom = 2,
}

impl Band {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// One decoded character cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellCommand {
    pub col: u8,
    pub row: u8,
    /// Font index, 0..=223
    pub glyph: u8,
    /// Foreground colour 0..=7, inversion already applied
    pub fg: u8,
    /// Background colour 0..=7, inversion already applied
    pub bg: u8,
    pub band: Band,
    /// Bit 7 of the source byte
    pub inverted: bool,
}

/// Double height progress carried from row to row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DoubleHeightCarry {
    #[default]
    None,
    /// This row shows the upper halves
    TopHalf,
    /// This row repeats the previous line and shows the lower halves
    BottomHalf,
}

impl DoubleHeightCarry {
    /// A double height code was seen on the current row.
    pub fn on_double_height(self) -> Self {
        match self {
            DoubleHeightCarry::None => DoubleHeightCarry::TopHalf,
            other => other,
        }
    }

    /// Transition at the end of a row, with the number of video RAM bytes the
    /// read pointer moves forward.
    pub fn end_row(self) -> (Self, usize) {
        match self {
            DoubleHeightCarry::None => (DoubleHeightCarry::None, ROW_STRIDE),
            DoubleHeightCarry::TopHalf => (DoubleHeightCarry::BottomHalf, 0),
            DoubleHeightCarry::BottomHalf => (DoubleHeightCarry::None, 2 * ROW_STRIDE),
        }
    }

    fn band(self) -> Band {
        match self {
            DoubleHeightCarry::None => Band::Single,
            DoubleHeightCarry::TopHalf => Band::Top,
            DoubleHeightCarry::BottomHalf => Band::Bottom,
        }
    }
}

/// Hold graphics mode.
///
/// The "held" request and whether the held mosaic is currently displayed are
/// separate facts: releasing the hold only stops the display at the end of
/// the current cell, which is what `Releasing` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HoldGraphics {
    #[default]
    Off,
    /// Hold requested, held mosaic not displayed (graphics off)
    Armed,
    /// Hold requested and the held mosaic is displayed
    Active,
    /// Released during this cell, held mosaic still displayed
    Releasing,
}

impl HoldGraphics {
    pub fn is_held(self) -> bool {
        matches!(self, HoldGraphics::Armed | HoldGraphics::Active)
    }

    pub fn is_active(self) -> bool {
        matches!(self, HoldGraphics::Active | HoldGraphics::Releasing)
    }

    /// Hold code. Returns true when the held colour must be latched now.
    fn engage(&mut self, graphics: bool) -> bool {
        if self.is_held() {
            return false;
        }
        *self = if graphics || self.is_active() {
            HoldGraphics::Active
        } else {
            HoldGraphics::Armed
        };
        graphics
    }

    fn release(&mut self) {
        *self = match *self {
            HoldGraphics::Armed | HoldGraphics::Off => HoldGraphics::Off,
            HoldGraphics::Active | HoldGraphics::Releasing => HoldGraphics::Releasing,
        };
    }

    /// End of cell: display follows "held and graphics".
    fn settle(&mut self, graphics: bool) {
        *self = match (self.is_held(), graphics) {
            (true, true) => HoldGraphics::Active,
            (true, false) => HoldGraphics::Armed,
            (false, _) => HoldGraphics::Off,
        };
    }
}

/// Cell output before placement on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedCell {
    pub glyph: u8,
    pub fg: u8,
    pub bg: u8,
    pub band: Band,
}

/// Serial attribute state of one row. Rebuilt at the start of every row.
#[derive(Debug, Clone)]
pub struct LineDecodeState {
    fg: u8,
    bg: u8,
    double_height: bool,
    graphics: bool,
    flash: bool,
    separated: bool,
    conceal: bool,
    last_colour: u8,
    hold: HoldGraphics,
    held_glyph: u8,
    held_separated: bool,
    held_fg: u8,
    held_conceal: bool,
}

impl LineDecodeState {
    pub fn new() -> Self {
        Self {
            fg: 7,
            bg: 0,
            double_height: false,
            graphics: false,
            flash: false,
            separated: false,
            conceal: false,
            last_colour: 7,
            hold: HoldGraphics::Off,
            held_glyph: SPACE,
            held_separated: false,
            held_fg: 7,
            held_conceal: false,
        }
    }

    pub fn hold(&self) -> HoldGraphics {
        self.hold
    }

    pub fn is_double_height(&self) -> bool {
        self.double_height
    }

    fn control(&mut self, code: u8, carry: &mut DoubleHeightCarry) {
        match code & 0x1F {
            colour @ 0x01..=0x07 => {
                self.fg = colour;
                self.last_colour = colour;
                self.graphics = false;
                self.conceal = false;
                self.hold.release();
            }
            colour @ 0x11..=0x17 => {
                self.fg = colour & 0x0F;
                self.last_colour = self.fg;
                self.graphics = true;
                self.conceal = false;
            }
            0x08 => self.flash = true,
            0x09 => self.flash = false,
            0x0C => {
                if self.double_height {
                    self.hold.release();
                }
                self.double_height = false;
            }
            0x0D => {
                if !self.double_height {
                    self.hold.release();
                }
                self.double_height = true;
                *carry = carry.on_double_height();
            }
            0x18 => self.conceal = true,
            0x19 => self.separated = false,
            0x1A => self.separated = true,
            0x1C => self.bg = 0,
            0x1D => self.bg = self.last_colour,
            0x1E => {
                if self.hold.engage(self.graphics) {
                    self.held_fg = self.fg;
                }
            }
            0x1F => self.hold.release(),
            // 0x00, 0x0A, 0x0B, 0x0E, 0x0F, 0x10, 0x1B
            _ => {}
        }
    }

    /// Decode one video RAM byte at the current position in the row.
    pub fn cell(&mut self, byte: u8, blank: bool, carry: &mut DoubleHeightCarry) -> DecodedCell {
        let mut c = byte & 0x7F;
        let inverted = byte & 0x80 != 0;

        if c & 0x60 == 0 {
            self.control(c, carry);
            c = SPACE;
        } else {
            self.held_glyph = c;
            self.held_separated = self.separated;
            self.held_conceal = self.conceal;
        }

        let hold_active = self.hold.is_active();
        if hold_active {
            c = self.held_glyph;
        }

        let concealed = if hold_active {
            self.held_conceal
        } else {
            self.conceal
        };
        if (self.flash && blank) || concealed {
            c = SPACE;
        }

        if (self.graphics || hold_active) && c & 0x20 != 0 {
            c += if c & 0x40 != 0 { 64 } else { 96 };
            let separated = if hold_active {
                self.held_separated
            } else {
                self.separated
            };
            if separated {
                c += 64;
            }
        }

        if *carry == DoubleHeightCarry::BottomHalf && !self.double_height {
            c = SPACE;
        }

        let mut fg = if hold_active { self.held_fg } else { self.fg };
        let mut bg = self.bg;
        if inverted {
            fg ^= 7;
            bg ^= 7;
        }

        let band = if self.double_height {
            carry.band()
        } else {
            Band::Single
        };

        self.hold.settle(self.graphics);
        if self.graphics {
            self.held_fg = self.fg;
            self.held_conceal = self.conceal;
        }

        DecodedCell {
            glyph: c - 32,
            fg,
            bg,
            band,
        }
    }
}

impl Default for LineDecodeState {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a full frame, handing each of the 960 cells to `sink` in row-major
/// order.
///
/// `scroll` is the video RAM offset of the first row; `blank` is the current
/// flash phase (flashing cells show a space while it is set).
pub fn decode_frame<F>(vram: &[u8; VRAM_SIZE], scroll: u16, blank: bool, mut sink: F)
where
    F: FnMut(CellCommand),
{
    let mut line = scroll as usize % VRAM_SIZE;
    let mut carry = DoubleHeightCarry::None;

    for row in 0..ROWS {
        let mut state = LineDecodeState::new();
        for col in 0..COLUMNS {
            let byte = vram[(line + col) % VRAM_SIZE];
            let cell = state.cell(byte, blank, &mut carry);
            sink(CellCommand {
                col: col as u8,
                row: row as u8,
                glyph: cell.glyph,
                fg: cell.fg,
                bg: cell.bg,
                band: cell.band,
                inverted: byte & 0x80 != 0,
            });
        }
        let (next, advance) = carry.end_row();
        carry = next;
        line = (line + advance) % VRAM_SIZE;
    }
}

/// [`decode_frame`] collected into a vector.
pub fn decode_frame_to_vec(vram: &[u8; VRAM_SIZE], scroll: u16, blank: bool) -> Vec<CellCommand> {
    let mut cells = Vec::with_capacity(CELLS_PER_FRAME);
    decode_frame(vram, scroll, blank, |cell| cells.push(cell));
    cells
}

/// Flash phase generator, advanced once per displayed frame.
///
/// Flashing text is visible for 48 interrupts and hidden for 16. With a
/// screen update period above 1 the counts are divided accordingly; periods
/// too long to split the cycle alternate the phase on every update.
#[derive(Debug, Clone)]
pub struct FlashTimer {
    count: u32,
    update_period: u32,
    blank: bool,
}

impl FlashTimer {
    pub fn new(update_period: u32) -> Self {
        Self {
            count: 0,
            update_period: update_period.max(1),
            blank: true,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.blank
    }

    pub fn update_period(&self) -> u32 {
        self.update_period
    }

    fn hide_at(&self) -> u32 {
        (48 / self.update_period).max(1)
    }

    fn cycle_len(&self) -> u32 {
        (64 / self.update_period).max(self.hide_at() + 1)
    }

    pub fn advance(&mut self) -> bool {
        self.count += 1;
        if self.count == self.hide_at() {
            self.blank = true;
        }
        if self.count >= self.cycle_len() {
            self.blank = false;
            self.count = 0;
        }
        self.blank
    }
}

impl Default for FlashTimer {
    fn default() -> Self {
        Self::new(1)
    }
}
