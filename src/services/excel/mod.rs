pub mod reader;
pub mod types;
pub mod utils;

pub use reader::{frame_from_rows, frame_from_sheet_rows, ExcelExtractor};
pub use types::{SheetSelector, SOURCE_ROW_COLUMN};
