pub mod bar;
pub mod loader;
pub mod table;

pub use bar::{Bar, BarError, Signal};
pub use loader::{load_csv, parse_timestamp};
pub use table::{BarTable, TableError, LABEL_COLUMN};
