pub mod category;
pub mod comment;
pub mod location;
pub mod post;
pub mod user;

use time::macros::format_description;
use time::OffsetDateTime;

/// Human readable timestamp used by the rendered pages, e.g. `19 October 2026, 14:05`.
pub fn display_date(value: OffsetDateTime) -> String {
    let format = format_description!("[day padding:none] [month repr:long] [year], [hour]:[minute]");
    value.format(&format).unwrap_or_default()
}
