use std::collections::{BTreeMap, BTreeSet};

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// Currencies kept in every reshaped table, whatever was requested
pub const ALWAYS_INCLUDED: [&str; 2] = ["EUR", "USD"];

/// One day of rates as returned by the PrivatBank archive endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateTable {
    /// Date of the table, as the API spells it (`DD.MM.YYYY`)
    pub date: String,
    pub exchange_rate: Vec<RateEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RateEntry {
    /// Absent on the leading entry, which only describes the base currency
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(rename = "saleRateNB", default)]
    pub sale_rate_nb: Value,
    #[serde(rename = "purchaseRateNB", default)]
    pub purchase_rate_nb: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// National bank sale/purchase pair, passed through exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rate {
    pub sale: Value,
    pub purchase: Value,
}

/// Rates for one date, serialized as `{ "<date>": { "<code>": { "sale", "purchase" } } }`.
#[derive(Debug, Clone, PartialEq)]
pub struct DayRates {
    pub date: String,
    pub rates: BTreeMap<String, Rate>,
}

impl Serialize for DayRates {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.date, &self.rates)?;
        map.end()
    }
}

/// Currency codes to keep when reshaping. EUR and USD are always members.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencySet(BTreeSet<String>);

impl CurrencySet {
    pub fn new<I, S>(additional: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut codes: BTreeSet<String> = ALWAYS_INCLUDED.iter().map(|c| c.to_string()).collect();
        codes.extend(
            additional
                .into_iter()
                .map(|c| c.as_ref().trim().to_ascii_uppercase())
                .filter(|c| !c.is_empty()),
        );
        Self(codes)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.0.contains(code)
    }
}

impl Default for CurrencySet {
    fn default() -> Self {
        Self::new(std::iter::empty::<&str>())
    }
}

impl DayRates {
    /// Keep only the entries of `table` whose currency is in `currencies`.
    pub fn from_table(table: &RateTable, currencies: &CurrencySet) -> Self {
        let rates = table
            .exchange_rate
            .iter()
            .filter_map(|entry| {
                let code = entry.currency.as_deref()?;
                currencies.contains(code).then(|| {
                    (
                        code.to_string(),
                        Rate {
                            sale: entry.sale_rate_nb.clone(),
                            purchase: entry.purchase_rate_nb.clone(),
                        },
                    )
                })
            })
            .collect();

        DayRates {
            date: table.date.clone(),
            rates,
        }
    }
}

/// Reshape every table, preserving input order.
pub fn reshape(tables: &[RateTable], currencies: &CurrencySet) -> Vec<DayRates> {
    tables
        .iter()
        .map(|table| DayRates::from_table(table, currencies))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(date: &str, codes: &[&str]) -> RateTable {
        let mut entries = vec![json!({
            "baseCurrency": "UAH",
            "saleRateNB": 1.0,
            "purchaseRateNB": 1.0,
        })];
        for (i, code) in codes.iter().enumerate() {
            entries.push(json!({
                "baseCurrency": "UAH",
                "currency": code,
                "saleRateNB": 40.5 + i as f64,
                "purchaseRateNB": 40.5 + i as f64,
                "saleRate": 41.0,
            }));
        }
        serde_json::from_value(json!({
            "date": date,
            "bank": "PB",
            "baseCurrency": 980,
            "baseCurrencyLit": "UAH",
            "exchangeRate": entries,
        }))
        .unwrap()
    }

    fn codes(day: &DayRates) -> Vec<&str> {
        day.rates.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_requested_currency_is_kept() {
        let day = DayRates::from_table(
            &table("01.10.2026", &["EUR", "USD", "PLN", "GBP", "CHF"]),
            &CurrencySet::new(["PLN"]),
        );
        assert_eq!(day.date, "01.10.2026");
        assert_eq!(codes(&day), vec!["EUR", "PLN", "USD"]);
    }

    #[test]
    fn test_missing_default_currency_is_not_invented() {
        let day = DayRates::from_table(&table("02.10.2026", &["EUR", "GBP"]), &CurrencySet::default());
        assert_eq!(codes(&day), vec!["EUR"]);
    }

    #[test]
    fn test_rates_pass_through_unmodified() {
        let raw: RateTable = serde_json::from_value(json!({
            "date": "03.10.2026",
            "exchangeRate": [
                {"currency": "USD", "saleRateNB": 41.2571, "purchaseRateNB": "41.2571"},
                {"currency": "EUR"},
            ],
        }))
        .unwrap();
        let day = DayRates::from_table(&raw, &CurrencySet::default());

        assert_eq!(day.rates["USD"].sale, json!(41.2571));
        assert_eq!(day.rates["USD"].purchase, json!("41.2571"));
        assert_eq!(day.rates["EUR"].sale, Value::Null);
    }

    #[test]
    fn test_reshape_is_idempotent() {
        let raw = table("04.10.2026", &["EUR", "USD", "CZK"]);
        let currencies = CurrencySet::new(["czk"]);
        assert_eq!(
            DayRates::from_table(&raw, &currencies),
            DayRates::from_table(&raw, &currencies)
        );
    }

    #[test]
    fn test_reshape_preserves_order() {
        let tables = vec![
            table("05.10.2026", &["USD"]),
            table("06.10.2026", &["USD"]),
            table("07.10.2026", &["USD"]),
        ];
        let dates: Vec<_> = reshape(&tables, &CurrencySet::default())
            .into_iter()
            .map(|d| d.date)
            .collect();
        assert_eq!(dates, vec!["05.10.2026", "06.10.2026", "07.10.2026"]);
    }

    #[test]
    fn test_currency_set() {
        let currencies = CurrencySet::new(["pln", " GBP ", "", "USD"]);
        for code in ["EUR", "GBP", "PLN", "USD"] {
            assert!(currencies.contains(code), "{code} missing");
        }
        assert!(!currencies.contains("pln"));
        assert!(!currencies.contains(""));
        assert_eq!(currencies, CurrencySet::new(["GBP", "PLN"]));
    }

    #[test]
    fn test_day_rates_serialize_under_date_key() {
        let day = DayRates::from_table(&table("08.10.2026", &["EUR"]), &CurrencySet::default());
        assert_eq!(
            serde_json::to_value(&day).unwrap(),
            json!({"08.10.2026": {"EUR": {"sale": 40.5, "purchase": 40.5}}})
        );
    }

    #[test]
    fn test_table_keeps_unknown_fields() {
        let body = json!({
            "date": "09.10.2026",
            "bank": "PB",
            "exchangeRate": [
                {"baseCurrency": "UAH", "currency": "USD", "saleRateNB": 41.0, "purchaseRateNB": 41.0},
            ],
        });
        let parsed: RateTable = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(parsed.extra["bank"], json!("PB"));
        assert_eq!(serde_json::to_value(&parsed).unwrap(), body);
    }
}
