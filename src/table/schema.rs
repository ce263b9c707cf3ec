//! Column names the inspection sheet must provide. Matching is exact and
//! case-sensitive.

pub const DYE_OUT_AT: &str = "Dye out date and time";
pub const CUSTOMER: &str = "Customer name";
pub const BATCH_NO: &str = "Batch No";
pub const STYLE: &str = "Style";
pub const SUBMISSION_TYPE: &str = "Submission type";
pub const REQUIRED_MEMBERS: &str = "Required members";
pub const INSPECTION_START: &str = "Inspection start time";
pub const INSPECTION_END: &str = "Inspection End time";
pub const INSPECTION_EXCEED: &str = "Inspection Exceed time";

/// Every column a sheet must carry, in the order missing ones are reported.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    DYE_OUT_AT,
    CUSTOMER,
    BATCH_NO,
    STYLE,
    SUBMISSION_TYPE,
    REQUIRED_MEMBERS,
    INSPECTION_START,
    INSPECTION_END,
    INSPECTION_EXCEED,
];

/// Columns coerced to timestamps cell by cell.
pub const TIMESTAMP_COLUMNS: [&str; 4] = [DYE_OUT_AT, INSPECTION_START, INSPECTION_END, INSPECTION_EXCEED];
