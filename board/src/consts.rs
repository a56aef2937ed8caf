//! Shared numeric constants for the board core.

// ── Canvas geometry ─────────────────────────────────────────────

/// Width of the canvas usable rectangle in world units.
pub const CANVAS_WIDTH: f64 = 1920.0;

/// Height of the canvas usable rectangle in world units.
pub const CANVAS_HEIGHT: f64 = 1080.0;

/// Minimum y for placed objects; keeps content below the visible header.
pub const HEADER_SAFE_Y: f64 = 80.0;

// ── Default object sizes ────────────────────────────────────────

/// Default sticky note size.
pub const STICKY_NOTE_SIZE: (f64, f64) = (180.0, 120.0);

/// Default shape (rectangle/ellipse) size.
pub const SHAPE_SIZE: (f64, f64) = (160.0, 100.0);

/// Default text label size.
pub const TEXT_SIZE: (f64, f64) = (200.0, 40.0);

/// Default frame size.
pub const FRAME_SIZE: (f64, f64) = (400.0, 300.0);

/// Default character sprite size.
pub const CHARACTER_SIZE: (f64, f64) = (64.0, 64.0);

// ── Default colors ──────────────────────────────────────────────

/// Default sticky note background.
pub const DEFAULT_NOTE_COLOR: &str = "#FFEB3B";

/// Default shape fill.
pub const DEFAULT_SHAPE_FILL: &str = "#4CAF50";

// ── Undo engine ─────────────────────────────────────────────────

/// Maximum number of actions retained in the undo stack. Oldest actions are
/// dropped from the front when exceeded.
pub const UNDO_CAPACITY: usize = 50;

// ── AI gateway guards ───────────────────────────────────────────

/// Upper bound on objects created in a single tool-invocation turn.
pub const MAX_CREATES_PER_TURN: usize = 4;

/// Above this object count, an unfiltered board-state read returns a
/// type-count summary instead of the full list.
pub const BOARD_SUMMARY_THRESHOLD: usize = 20;

/// Step applied when nudging a new object off a fully overlapped one.
pub const OVERLAP_NUDGE_STEP: f64 = 24.0;

/// Maximum nudge attempts before accepting the overlap.
pub const OVERLAP_NUDGE_TRIES: usize = 8;
