use serde::Serialize;

/// One normalized vehicle listing, as it is stored in `fact_cars`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarListing {
    pub id: String,
    pub make: Option<String>,
    pub model: Option<String>,
    pub price: Option<f64>,
    pub distance: Option<f64>,
    pub price_per_1000km: Option<f64>,
    pub model_year: Option<i64>,
    pub fuel: Option<String>,
    pub body_type: Option<String>,
    pub horsepower: Option<i64>,
    pub registration: Option<String>,
}

/// Canonical columns of the listing schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    Make,
    Model,
    Price,
    Distance,
    ModelYear,
    Fuel,
    BodyType,
    Horsepower,
    Registration,
}

impl Column {
    pub const ALL: [Column; 10] = [
        Column::Id,
        Column::Make,
        Column::Model,
        Column::Price,
        Column::Distance,
        Column::ModelYear,
        Column::Fuel,
        Column::BodyType,
        Column::Horsepower,
        Column::Registration,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::Make => "make",
            Column::Model => "model",
            Column::Price => "price",
            Column::Distance => "distance",
            Column::ModelYear => "model_year",
            Column::Fuel => "fuel",
            Column::BodyType => "body_type",
            Column::Horsepower => "horsepower",
            Column::Registration => "registration",
        }
    }

    /// The key and the inputs of `price_per_1000km`; every other column may be absent
    /// and is stored as NULL.
    pub fn is_required(self) -> bool {
        matches!(self, Column::Id | Column::Price | Column::Distance)
    }

    /// Normalized header names accepted for this column, in priority order.
    /// The Swedish names are the headers of the original listing export.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Column::Id => &["id", "listing_id", "url"],
            Column::Make => &["make", "brand", "märke"],
            Column::Model => &["model", "modell"],
            Column::Price => &["price", "price_sek", "pris", "pris_kr"],
            Column::Distance => &[
                "distance",
                "distance_km",
                "mileage",
                "odometer_km",
                "mätarställning_km",
            ],
            Column::ModelYear => &["model_year", "year", "modellår"],
            Column::Fuel => &["fuel", "bränsle"],
            Column::BodyType => &["body_type", "biltyp"],
            Column::Horsepower => &["horsepower", "hp", "hästkrafter"],
            Column::Registration => &["registration", "regnr", "registreringsnummer"],
        }
    }

    /// Finds the header that feeds this column, if any.
    pub fn resolve<'a, S: AsRef<str>>(self, headers: &'a [S]) -> Option<&'a str> {
        self.aliases().iter().find_map(|alias| {
            headers
                .iter()
                .map(|header| header.as_ref())
                .find(|header| *header == *alias)
        })
    }
}

/// Outcome of one ETL run, printed as JSON by the binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub duplicates_removed: usize,
    pub records_loaded: usize,
    pub rows_in_store: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_first_matching_alias() {
        let headers = ["url", "id", "pris_kr"];
        assert_eq!(Column::Id.resolve(&headers), Some("id"));
        assert_eq!(Column::Price.resolve(&headers), Some("pris_kr"));
        assert_eq!(Column::Distance.resolve(&headers), None);
    }

    #[test]
    fn only_key_and_metric_inputs_are_required() {
        let required: Vec<&str> = Column::ALL
            .iter()
            .filter(|c| c.is_required())
            .map(|c| c.name())
            .collect();
        assert_eq!(required, vec!["id", "price", "distance"]);
    }
}
