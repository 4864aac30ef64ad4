use serde::{Deserialize, Serialize};

/// A catalog wine as served by the catalog/persist services. Pure
/// pass-through value type; this layer enforces no cross-field invariants.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Wine {
    pub id: i64,
    pub title: String,
    pub country: String,
    pub description: String,
    pub designation: String,
    pub points: String,
    pub price: String,
    pub province: String,
    pub region_1: String,
    pub region_2: String,
    pub taster_name: String,
    pub taster_twitter_handle: String,
    pub variety: String,
    pub winery: String,
}

/// A wine decorated with the current user's cellar membership.
/// Membership never drives ranking or filtering, only this flag.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CellarWine {
    #[serde(flatten)]
    pub wine: Wine,
    pub in_cellar: bool,
}

/// Wire shape shared by the catalog page and lexical search endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaginatedList<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

/// The aggregated result returned to the browser for search/recommend.
///
/// `total_is_approximate` is set on the semantic path, where `total` is
/// bounded by the over-fetch limit rather than being an exact corpus count.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WineResults {
    pub items: Vec<CellarWine>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_is_approximate: bool,
}

#[cfg(test)]
impl Wine {
    /// Minimal fixture used across tests.
    pub fn fixture(id: i64) -> Self {
        Wine {
            id,
            title: format!("Wine {id}"),
            country: "US".to_string(),
            description: String::new(),
            designation: String::new(),
            points: "90".to_string(),
            price: "25".to_string(),
            province: String::new(),
            region_1: String::new(),
            region_2: String::new(),
            taster_name: String::new(),
            taster_twitter_handle: String::new(),
            variety: "Pinot Noir".to_string(),
            winery: String::new(),
        }
    }
}
