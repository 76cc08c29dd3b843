pub mod batch_stats;
pub mod data_row;
pub mod loaders;

pub use batch_stats::{BatchReport, BatchStats, RowOutcome, RowResult};
pub use data_row::{CellValue, DataRow, ID_FIELD};
pub use loaders::{load_mapping_file, load_sheet, ColumnMapping, Sheet};
