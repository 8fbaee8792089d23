//! Listing filters.
//!
//! A listing query is a conjunction of typed predicates. Parsing from query
//! parameters never fails: malformed or empty values simply contribute no
//! predicate, so `priceMin=abc` filters exactly like omitting `priceMin`.

use crate::models::Property;

// == Fields ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericField {
    Price,
    AreaSqFt,
    Rating,
}

impl NumericField {
    fn read(self, property: &Property) -> f64 {
        match self {
            NumericField::Price => property.price,
            NumericField::AreaSqFt => property.area_sq_ft,
            NumericField::Rating => property.rating,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Type,
    Status,
    State,
    City,
    Location,
    Furnished,
    AvailableFrom,
    ListedBy,
    ColorTheme,
    ListingType,
}

impl TextField {
    fn read(self, property: &Property) -> &str {
        match self {
            TextField::Type => &property.kind,
            TextField::Status => &property.status,
            TextField::State => &property.state,
            TextField::City => &property.city,
            TextField::Location => &property.location,
            TextField::Furnished => &property.furnished,
            TextField::AvailableFrom => &property.available_from,
            TextField::ListedBy => &property.listed_by,
            TextField::ColorTheme => &property.color_theme,
            TextField::ListingType => &property.listing_type,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListField {
    Tags,
    Amenities,
}

impl ListField {
    fn read(self, property: &Property) -> &[String] {
        match self {
            ListField::Tags => &property.tags,
            ListField::Amenities => &property.amenities,
        }
    }
}

// == Predicates ==
#[derive(Debug, Clone, PartialEq)]
pub enum Equality {
    Text(TextField, String),
    Bedrooms(u32),
    Verified(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Inclusive bounds; at least one is present.
    Range {
        field: NumericField,
        min: Option<f64>,
        max: Option<f64>,
    },
    Equals(Equality),
    /// Case-insensitive substring. `needle` is stored lowercased.
    Contains { field: TextField, needle: String },
    /// Property holds at least one of `values`.
    AnyOf { field: ListField, values: Vec<String> },
    /// Property holds every one of `values`.
    AllOf { field: ListField, values: Vec<String> },
}

impl Predicate {
    pub fn contains(field: TextField, needle: &str) -> Self {
        Predicate::Contains {
            field,
            needle: needle.to_lowercase(),
        }
    }

    pub fn matches(&self, property: &Property) -> bool {
        match self {
            Predicate::Range { field, min, max } => {
                let value = field.read(property);
                min.map_or(true, |min| value >= min) && max.map_or(true, |max| value <= max)
            }
            Predicate::Equals(Equality::Text(field, expected)) => field.read(property) == expected,
            Predicate::Equals(Equality::Bedrooms(n)) => property.bedrooms == *n,
            Predicate::Equals(Equality::Verified(flag)) => property.is_verified == *flag,
            Predicate::Contains { field, needle } => {
                field.read(property).to_lowercase().contains(needle.as_str())
            }
            Predicate::AnyOf { field, values } => {
                let held = field.read(property);
                values.iter().any(|v| held.contains(v))
            }
            Predicate::AllOf { field, values } => {
                let held = field.read(property);
                values.iter().all(|v| held.contains(v))
            }
        }
    }
}

// == Listing Filter ==
/// Conjunction of predicates. The empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilter {
    predicates: Vec<Predicate>,
}

const EXACT_TEXT_PARAMS: [(&str, TextField); 9] = [
    ("type", TextField::Type),
    ("status", TextField::Status),
    ("state", TextField::State),
    ("city", TextField::City),
    ("furnished", TextField::Furnished),
    ("availableFrom", TextField::AvailableFrom),
    ("listedBy", TextField::ListedBy),
    ("colorTheme", TextField::ColorTheme),
    ("listingType", TextField::ListingType),
];

const RANGE_PARAMS: [(&str, &str, NumericField); 3] = [
    ("priceMin", "priceMax", NumericField::Price),
    ("areaSqFtMin", "areaSqFtMax", NumericField::AreaSqFt),
    ("ratingMin", "ratingMax", NumericField::Rating),
];

impl ListingFilter {
    /// Filter that matches every property.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches(&self, property: &Property) -> bool {
        self.predicates.iter().all(|p| p.matches(property))
    }

    // == From Query Parameters ==
    /// Builds a filter from decoded query pairs. For scalar parameters the
    /// first occurrence wins; list parameters collect every occurrence and
    /// split each on commas.
    pub fn from_params(params: &[(String, String)]) -> Self {
        let first = |name: &str| {
            params
                .iter()
                .find(|(k, v)| k == name && !v.is_empty())
                .map(|(_, v)| v.as_str())
        };
        let number = |name: &str| first(name).and_then(parse_number);

        let mut filter = Self::all();

        for (min_param, max_param, field) in RANGE_PARAMS {
            let (min, max) = (number(min_param), number(max_param));
            if min.is_some() || max.is_some() {
                filter = filter.with(Predicate::Range { field, min, max });
            }
        }

        for (param, field) in EXACT_TEXT_PARAMS {
            if let Some(value) = first(param) {
                filter = filter.with(Predicate::Equals(Equality::Text(field, value.to_string())));
            }
        }

        if let Some(needle) = first("location") {
            filter = filter.with(Predicate::contains(TextField::Location, needle));
        }

        if let Some(bedrooms) = first("bedrooms").and_then(|v| v.parse::<u32>().ok()) {
            filter = filter.with(Predicate::Equals(Equality::Bedrooms(bedrooms)));
        }

        if let Some(verified) = first("isVerified").and_then(parse_flag) {
            filter = filter.with(Predicate::Equals(Equality::Verified(verified)));
        }

        let tags = list_values(params, "tags");
        if !tags.is_empty() {
            filter = filter.with(Predicate::AnyOf {
                field: ListField::Tags,
                values: tags,
            });
        }

        let amenities = list_values(params, "amenities");
        if !amenities.is_empty() {
            filter = filter.with(Predicate::AllOf {
                field: ListField::Amenities,
                values: amenities,
            });
        }

        filter
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Accepts `true`/`1` and `false`/`0`; anything else is no constraint.
fn parse_flag(raw: &str) -> Option<bool> {
    match raw {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn list_values(params: &[(String, String)], name: &str) -> Vec<String> {
    params
        .iter()
        .filter(|(k, _)| k == name)
        .flat_map(|(_, v)| v.split(','))
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
