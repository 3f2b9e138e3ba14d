pub const ICON_WAITING: &str = "[ ]";
pub const ICON_RUNNING: &str = "[~]";
pub const ICON_DONE: &str = "[x]";
pub const ICON_SKIPPED: &str = "[-]";
pub const ICON_ERROR: &str = "[!]";

pub const BAR_WIDTH: usize = 20;
pub const LABEL_COLUMN: usize = 31;
pub const TITLE_COLUMN: usize = 33;

pub const DURATION_WARNING: &str = "Subtitles are unavailable for media longer than 2 hours.";
