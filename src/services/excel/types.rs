use std::fmt;

/// Extra raw-frame column holding the 1-based worksheet row of each data row. Cleaned
/// headers never start with `_`, so it cannot collide with a sheet column.
pub const SOURCE_ROW_COLUMN: &str = "__row";

/// Which worksheet of a workbook to read.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SheetSelector {
    #[default]
    First,
    Name(String),
    /// Zero-based position in the workbook.
    Index(usize),
}

impl SheetSelector {
    /// `none` or blank selects the first sheet, all digits an index, anything else a name.
    pub fn parse(value: &str) -> Self {
        let v = value.trim();
        if v.is_empty() || v.eq_ignore_ascii_case("none") {
            SheetSelector::First
        } else if v.chars().all(|c| c.is_ascii_digit()) {
            v.parse()
                .map(SheetSelector::Index)
                .unwrap_or_else(|_| SheetSelector::Name(v.to_string()))
        } else {
            SheetSelector::Name(v.to_string())
        }
    }
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetSelector::First => write!(f, "<first>"),
            SheetSelector::Name(name) => write!(f, "{}", name),
            SheetSelector::Index(idx) => write!(f, "#{}", idx),
        }
    }
}

/// Storage type chosen for a raw column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Text,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sheet_selector() {
        assert_eq!(SheetSelector::parse(""), SheetSelector::First);
        assert_eq!(SheetSelector::parse(" None "), SheetSelector::First);
        assert_eq!(SheetSelector::parse("2"), SheetSelector::Index(2));
        assert_eq!(
            SheetSelector::parse("Blad1"),
            SheetSelector::Name("Blad1".to_string())
        );
        assert_eq!(
            SheetSelector::parse("2023 export"),
            SheetSelector::Name("2023 export".to_string())
        );
    }
}
