//! Structured listing record produced by extraction
//!
//! Every field is optional so that partially filled model output still
//! deserializes; doc comments double as field descriptions in the JSON schema
//! handed to the extraction model.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unit used when a page gives an area without one
pub const DEFAULT_AREA_UNIT: &str = "m²";

/// Kind of deal a listing offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Sale,
    Rent,
    Seasonal,
}

/// How often the property tax amount is charged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxPeriod {
    Monthly,
    Yearly,
}

/// An area measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Area {
    /// Numeric value of the area
    pub value: Option<f64>,

    /// Unit of measure, square meters unless stated otherwise
    #[serde(default = "default_unit")]
    pub unit: String,
}

impl Default for Area {
    fn default() -> Self {
        Self {
            value: None,
            unit: default_unit(),
        }
    }
}

fn default_unit() -> String {
    DEFAULT_AREA_UNIT.to_string()
}

/// Where the property is
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Location {
    /// Street name and number
    pub address: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    /// State abbreviation, e.g. SC or SP
    pub state: Option<String>,
    /// Postal code
    pub zipcode: Option<String>,
}

/// A real-estate listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Property {
    /// Listing reference code used by the agency, e.g. TE01202
    pub reference: Option<String>,

    /// Listing headline, e.g. "Apartment with 3 suites"
    pub title: Option<String>,

    /// Full listing description
    pub description: Option<String>,

    pub operation: Option<Operation>,

    /// Sale price, plain number without currency formatting
    pub price: Option<f64>,

    /// Monthly rent, plain number without currency formatting
    pub rent_price: Option<f64>,

    /// Monthly condominium fee
    pub condo_fee: Option<f64>,

    /// Property tax amount
    pub property_tax: Option<f64>,

    pub property_tax_period: Option<TaxPeriod>,

    /// Property type, e.g. APARTMENT, HOUSE, LAND
    pub kind: Option<String>,

    /// Total number of bedrooms
    pub bedrooms: Option<u32>,

    /// Bedrooms with a private bathroom
    pub suites: Option<u32>,

    pub bathrooms: Option<u32>,

    /// Garage spaces
    pub parking_spaces: Option<u32>,

    /// Private (usable) area
    pub usable_area: Option<Area>,

    /// Total area, may include common areas
    pub total_area: Option<Area>,

    /// Built area, for houses
    pub built_area: Option<Area>,

    /// Lot area, for houses and land
    pub lot_area: Option<Area>,

    /// Average price per square meter
    pub price_per_m2: Option<f64>,

    /// Image URLs
    pub images: Vec<String>,

    pub location: Location,

    /// Amenities and features, e.g. "pool": true, "furnished": false
    pub attributes: BTreeMap<String, bool>,

    /// Nearby points of interest, e.g. "beach": true, "school": true
    pub proximities: BTreeMap<String, bool>,
}
