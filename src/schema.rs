//! Column layout of the credit card approval dataset.

/// All columns of the headerless data file, in file order.
pub const COLUMN_NAMES: [&str; 16] = [
    "Gender",
    "Age",
    "Debt",
    "Married",
    "BankCustomer",
    "EducationLevel",
    "Ethnicity",
    "YearsEmployed",
    "PriorDefault",
    "Employed",
    "CreditScore",
    "DriversLicense",
    "Citizen",
    "ZipCode",
    "Income",
    "ApprovalStatus",
];

/// Columns fed to the model, in model input order. ZipCode is not a feature.
pub const FEATURE_COLUMNS: [&str; 14] = [
    "Gender",
    "Age",
    "Debt",
    "Married",
    "BankCustomer",
    "EducationLevel",
    "Ethnicity",
    "YearsEmployed",
    "PriorDefault",
    "Employed",
    "CreditScore",
    "DriversLicense",
    "Citizen",
    "Income",
];

pub const LABEL_COLUMN: &str = "ApprovalStatus";

/// How a feature column is typed after cleaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Float,
    Integer,
    Categorical,
}

impl ColumnKind {
    pub fn is_numeric(self) -> bool {
        !matches!(self, ColumnKind::Categorical)
    }
}

/// Kind of a feature column, `None` for names outside [`FEATURE_COLUMNS`].
pub fn column_kind(name: &str) -> Option<ColumnKind> {
    match name {
        "Age" | "Debt" | "YearsEmployed" => Some(ColumnKind::Float),
        "CreditScore" | "Income" => Some(ColumnKind::Integer),
        _ if FEATURE_COLUMNS.contains(&name) => Some(ColumnKind::Categorical),
        _ => None,
    }
}

/// Position of a column in the raw file.
pub fn column_index(name: &str) -> Option<usize> {
    COLUMN_NAMES.iter().position(|c| *c == name)
}
