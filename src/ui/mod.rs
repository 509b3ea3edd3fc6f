pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{
    drift_detected, error, file_unchanged, file_written, muted, no_drift, status, success, summary_row,
};
pub use table::TableBuilder;
pub use theme::{Theme, theme};
