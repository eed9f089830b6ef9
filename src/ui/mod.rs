pub mod icons;
pub mod output;
pub mod progress;
pub mod progress_message;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{
    broken_reference, error, header, info, muted, section, success, summary_row,
    warn,
};
pub use progress::ProgressManager;
pub use progress_message::ProgressMessage;
pub use table::{reached_table, stats_table};
pub use theme::{theme, Theme};
