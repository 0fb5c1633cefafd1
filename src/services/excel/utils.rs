use std::collections::HashSet;
use calamine::Data;
use super::types::ColumnKind;

/// Lowercases a header and folds every run of non-alphanumeric characters into one `_`.
/// Names already taken get a numeric suffix, so the first occurrence keeps the plain name.
pub fn clean_column_name(name: &str, existing_names: &mut HashSet<String>) -> String {
    let mut base_name = String::with_capacity(name.len());
    for c in name.trim().chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            base_name.push(c);
        } else if !base_name.ends_with('_') {
            base_name.push('_');
        }
    }
    let base_name = base_name.trim_matches('_').to_string();

    let mut cleaned = if base_name.chars().next().map_or(true, |c| !c.is_alphabetic()) {
        format!("col_{}", base_name)
    } else {
        base_name
    };

    let mut counter = 1;
    let original_name = cleaned.clone();
    while !existing_names.insert(cleaned.clone()) {
        cleaned = format!("{}_{}", original_name, counter);
        counter += 1;
    }

    cleaned
}

/// Text form of a cell; `None` for empty cells and whitespace-only strings.
pub fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Data::Int(i) => Some(i.to_string()),
        // Whole floats print without a fraction so numeric ids read as "1", not "1.0".
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some(format!("{}", *f as i64)),
        Data::Float(f) => Some(f.to_string()),
        other => Some(other.to_string()),
    }
}

pub fn cell_number(cell: &Data) -> Option<f64> {
    match cell {
        Data::Float(f) => Some(*f),
        Data::Int(i) => Some(*i as f64),
        _ => None,
    }
}

/// A column is numeric only when every non-empty cell is a number. Anything else stays text
/// so bad values reach the transformer instead of silently becoming null.
pub fn detect_column_kind<'a, I>(values: I) -> ColumnKind
where
    I: IntoIterator<Item = &'a Data>,
{
    let mut numeric_count = 0;
    for value in values {
        match value {
            Data::Empty => {}
            Data::String(s) if s.trim().is_empty() => {}
            Data::Float(_) | Data::Int(_) => numeric_count += 1,
            _ => return ColumnKind::Text,
        }
    }

    if numeric_count > 0 {
        ColumnKind::Numeric
    } else {
        ColumnKind::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleans_column_names() {
        let mut seen = HashSet::new();
        assert_eq!(clean_column_name("Pris (kr)", &mut seen), "pris_kr");
        assert_eq!(clean_column_name("Mätarställning (km)", &mut seen), "mätarställning_km");
        assert_eq!(clean_column_name("  Model Year ", &mut seen), "model_year");
        assert_eq!(clean_column_name("2nd owner", &mut seen), "col_2nd_owner");
        assert_eq!(clean_column_name("", &mut seen), "col_");
    }

    #[test]
    fn suffixes_repeated_names() {
        let mut seen = HashSet::new();
        assert_eq!(clean_column_name("Price", &mut seen), "price");
        assert_eq!(clean_column_name("price", &mut seen), "price_1");
        assert_eq!(clean_column_name("PRICE", &mut seen), "price_2");
    }

    #[test]
    fn renders_cell_text() {
        assert_eq!(cell_text(&Data::Empty), None);
        assert_eq!(cell_text(&Data::String("  ".into())), None);
        assert_eq!(cell_text(&Data::String(" Volvo ".into())), Some("Volvo".to_string()));
        assert_eq!(cell_text(&Data::Float(1.0)), Some("1".to_string()));
        assert_eq!(cell_text(&Data::Float(1.5)), Some("1.5".to_string()));
        assert_eq!(cell_text(&Data::Int(42)), Some("42".to_string()));
    }

    #[test]
    fn detects_column_kind() {
        let numeric = [Data::Int(1), Data::Empty, Data::Float(2.5)];
        assert_eq!(detect_column_kind(&numeric), ColumnKind::Numeric);

        let mixed = [Data::Int(1), Data::String("n/a".into())];
        assert_eq!(detect_column_kind(&mixed), ColumnKind::Text);

        let empty = [Data::Empty, Data::Empty];
        assert_eq!(detect_column_kind(&empty), ColumnKind::Text);
    }
}
