pub mod mapping_loader;
pub mod sheet_loader;

pub use mapping_loader::{load_mapping_file, ColumnMapping};
pub use sheet_loader::{load_sheet, Sheet};
