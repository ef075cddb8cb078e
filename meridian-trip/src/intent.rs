use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use meridian_core::search::{ActivityQuery, FlightQuery, HotelQuery, PriceBand};

/// Untrusted, partially-filled trip intent as the conversational agent
/// supplies it. Every field is optional; processing is best-effort.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripIntent {
    pub origin: Option<String>,
    pub destination: Option<String>,
    /// YYYY-MM-DD or RFC 3339; anything else is ignored.
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub num_travelers: Option<u32>,
    /// Single coarse budget scalar the per-category bands are derived from.
    pub budget: Option<f64>,
    pub hotel_requirements: Option<String>,
    pub activity_type: Option<String>,
}

/// Tunable factors behind the budget-to-price-band bridge.
#[derive(Debug, Clone, Deserialize)]
pub struct HeuristicRules {
    #[serde(default = "default_min_factor")]
    pub budget_min_factor: f64,
    #[serde(default = "default_max_factor")]
    pub budget_max_factor: f64,
}

fn default_min_factor() -> f64 {
    0.005
}

fn default_max_factor() -> f64 {
    0.03
}

impl Default for HeuristicRules {
    fn default() -> Self {
        Self {
            budget_min_factor: default_min_factor(),
            budget_max_factor: default_max_factor(),
        }
    }
}

/// Derives the per-category price window from the single budget scalar.
///
/// The same band is applied to flight, hotel-per-night and activity filters.
/// Deliberately crude: it bridges one user-facing number to three unrelated
/// inventories and is approximate, not a pricing model.
/// Example: budget 100_000_000 -> [500_000, 3_000_000].
pub fn budget_band(budget: f64, rules: &HeuristicRules) -> Option<PriceBand> {
    if !budget.is_finite() || budget <= 0.0 {
        return None;
    }
    let min = (budget * rules.budget_min_factor).round().max(0.0) as i64;
    let max = ((budget * rules.budget_max_factor).round() as i64).max(min + 1);
    Some(PriceBand { min, max })
}

/// Maps free text onto the closed activity vocabulary by keyword stems.
/// Unrecognized text passes through unchanged; classification is
/// best-effort, not authoritative.
pub fn normalize_activity_type(value: &str) -> String {
    let raw = value.to_lowercase();
    let matches = |stems: &[&str]| stems.iter().any(|s| raw.contains(s));

    if matches(&["advent", "hik", "trek", "outdoor"]) {
        return "adventure".to_string();
    }
    if matches(&["food", "culin", "eat", "restaurant", "dine", "dining"]) {
        return "culinary".to_string();
    }
    if matches(&["shop", "mall"]) {
        return "shopping".to_string();
    }
    if matches(&["cultur", "museum", "histor", "heritage", "art"]) {
        return "culture".to_string();
    }
    if matches(&["relax", "rest", "spa", "beach", "chill", "leisure"]) {
        return "relax".to_string();
    }
    value.to_string()
}

/// Best-effort date parsing: RFC 3339 first, then a bare YYYY-MM-DD pinned
/// to midnight UTC. Unparseable input is dropped rather than failed.
pub fn parse_intent_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl TripIntent {
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.start_date.as_deref().and_then(parse_intent_date)
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end_date.as_deref().and_then(parse_intent_date)
    }

    fn band(&self, rules: &HeuristicRules) -> Option<PriceBand> {
        self.budget.and_then(|b| budget_band(b, rules))
    }

    pub fn flight_query(&self, rules: &HeuristicRules) -> FlightQuery {
        FlightQuery {
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            date: self.start().map(|d| d.date_naive()),
            price: self.band(rules),
        }
    }

    pub fn hotel_query(&self, rules: &HeuristicRules) -> HotelQuery {
        HotelQuery {
            location: self.destination.clone(),
            price_per_night: self.band(rules),
            requirements: self.hotel_requirements.clone(),
        }
    }

    pub fn activity_query(&self, rules: &HeuristicRules) -> ActivityQuery {
        ActivityQuery {
            location: self.destination.clone(),
            price: self.band(rules),
            category: self
                .activity_type
                .as_deref()
                .map(normalize_activity_type),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_band_example() {
        let band = budget_band(100_000_000.0, &HeuristicRules::default()).unwrap();
        assert_eq!(band.min, 500_000);
        assert_eq!(band.max, 3_000_000);
    }

    #[test]
    fn test_budget_band_upper_bound_is_monotone() {
        let rules = HeuristicRules::default();
        let budgets = [10.0, 1_000.0, 50_000.0, 2_000_000.0, 100_000_000.0];
        let mut previous_max = 0;
        for budget in budgets {
            let band = budget_band(budget, &rules).unwrap();
            assert!(band.max >= previous_max, "upper bound shrank at {}", budget);
            assert!(band.max > band.min || band.max == band.min + 1);
            previous_max = band.max;
        }
    }

    #[test]
    fn test_budget_band_tiny_budget_still_has_room() {
        // Rounded min and max would collide; the band stays non-empty
        let band = budget_band(10.0, &HeuristicRules::default()).unwrap();
        assert!(band.max >= band.min + 1);
    }

    #[test]
    fn test_budget_band_rejects_nonsense() {
        let rules = HeuristicRules::default();
        assert!(budget_band(0.0, &rules).is_none());
        assert!(budget_band(-5.0, &rules).is_none());
        assert!(budget_band(f64::NAN, &rules).is_none());
    }

    #[test]
    fn test_activity_type_normalization() {
        let cases = [
            ("hiking trip", "adventure"),
            ("Trekking in the mountains", "adventure"),
            ("street food tour", "culinary"),
            ("fine dining", "culinary"),
            ("shopping spree", "shopping"),
            ("museum visits", "culture"),
            ("historical sites", "culture"),
            ("spa weekend", "relax"),
            ("beach day", "relax"),
        ];
        for (input, expected) in cases {
            assert_eq!(normalize_activity_type(input), expected, "for {:?}", input);
        }

        // Unknown text passes through unchanged, case preserved
        assert_eq!(normalize_activity_type("Birdwatching"), "Birdwatching");
    }

    #[test]
    fn test_parse_intent_date() {
        let plain = parse_intent_date("2025-01-10").unwrap();
        assert_eq!(plain.to_rfc3339(), "2025-01-10T00:00:00+00:00");

        let zoned = parse_intent_date("2025-01-10T08:00:00+07:00").unwrap();
        assert_eq!(zoned.to_rfc3339(), "2025-01-10T01:00:00+00:00");

        assert!(parse_intent_date("next tuesday").is_none());
    }

    #[test]
    fn test_queries_share_one_band() {
        let intent = TripIntent {
            destination: Some("Bali".to_string()),
            budget: Some(100_000_000.0),
            activity_type: Some("hiking".to_string()),
            ..Default::default()
        };
        let rules = HeuristicRules::default();

        let flight = intent.flight_query(&rules);
        let hotel = intent.hotel_query(&rules);
        let activity = intent.activity_query(&rules);

        assert_eq!(flight.price, hotel.price_per_night);
        assert_eq!(flight.price, activity.price);
        assert_eq!(activity.category.as_deref(), Some("adventure"));
    }
}
