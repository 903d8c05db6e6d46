/// Upper bound applied to `eventSpan` when a calendar sets none.
pub const DEFAULT_MAX_EVENT_LENGTH: u32 = 50;
/// Months offered on each side of the current one by the month navigator.
pub const DEFAULT_SELECTABLE_MONTHS: u32 = 6;
pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";

pub const DEFAULT_OTHER_COLOR: &str = "grey";
pub const UNCOLORED_SYMBOL: &str = "▪";
pub const DEFAULT_GRADIENT_ANGLE: &str = "135deg";
pub const DEFAULT_GRADIENT_END_COLOR: &str = "transparent";

pub const MAX_CALENDARS: usize = 100_000;
pub const MAX_FIELD_NAME_LEN: usize = 256;
pub const MAX_EVENT_TYPE_LEN: usize = 256;
pub const MAX_KEYS_PER_REQUEST: usize = 10_000;
/// Most following days one cascade deletion clears under a single write lock.
pub const MAX_CASCADE_DAYS: usize = 3_660;
