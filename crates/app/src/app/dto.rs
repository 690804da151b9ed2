use serde::{Deserialize, Serialize};

use stockroom_inventory::PartDetails;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Part create/update input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartInput {
    #[serde(flatten)]
    pub details: PartDetails,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustInput {
    pub new_quantity: i64,
    pub reason: String,
}

/// A rendered workbook ready for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportFile {
    pub fn xlsx(stem: &str, label: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: format!("{stem}_{label}.xlsx"),
            content_type: XLSX_CONTENT_TYPE,
            bytes,
        }
    }
}
