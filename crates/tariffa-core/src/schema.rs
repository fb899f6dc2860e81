/// Column layout of the regional tariff sheet.
pub mod tariff {
    use arrow::datatypes::Schema;
    use serde::Deserialize;

    /// Column names of the tariff sheet.
    ///
    /// Defaults follow the Regione Puglia tariff workbook.
    #[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
    #[serde(default)]
    pub struct TariffColumns {
        pub code: String,
        pub description: String,
        pub price: String,
    }

    impl Default for TariffColumns {
        fn default() -> Self {
            Self {
                code: "Regionale-Puglia".into(),
                description: "Descrizione".into(),
                price: "Tariffa-Puglia".into(),
            }
        }
    }

    impl TariffColumns {
        pub fn names(&self) -> [&str; 3] {
            [
                self.code.as_str(),
                self.description.as_str(),
                self.price.as_str(),
            ]
        }
    }

    /// Names from `columns` that are missing in `schema`.
    pub fn missing_columns<'a>(schema: &Schema, columns: &'a TariffColumns) -> Vec<&'a str> {
        columns
            .names()
            .into_iter()
            .filter(|name| schema.field_with_name(name).is_err())
            .collect()
    }
}
