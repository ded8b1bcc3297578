//! Duration formatting for log fields.

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;

/// Render a holding time or window length compactly: `"40d"`, `"2d 5h"`,
/// `"3h 12m"`, `"42s"`. Only the two largest non-zero units are shown.
pub fn format_duration(secs: u64) -> String {
    let units = [(DAY, "d"), (HOUR, "h"), (MINUTE, "m"), (1, "s")];
    let mut rest = secs;
    let mut parts = Vec::with_capacity(2);
    for (size, suffix) in units {
        let count = rest / size;
        rest %= size;
        if count > 0 || (parts.is_empty() && size == 1) {
            parts.push(format!("{count}{suffix}"));
        } else if !parts.is_empty() {
            // a zero unit after the leading one ends the rendering
            break;
        }
        if parts.len() == 2 {
            break;
        }
    }
    parts.join(" ")
}
