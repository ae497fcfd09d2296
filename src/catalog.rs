// 🛒 Product Catalog - external product list → id-keyed mapping
//
// The provider is a black box: any failure means "no products", never an error.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const DEFAULT_API_URL: &str = "https://dummyjson.com/products";
pub const DEFAULT_PRODUCT_LIMIT: usize = 100;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// CORE TYPES
// ============================================================================

/// One product as returned by the catalog API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiProduct {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
}

impl ApiProduct {
    pub fn new(id: i64) -> Self {
        ApiProduct {
            id,
            title: None,
            category: None,
            brand: None,
            rating: None,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn with_brand(mut self, brand: &str) -> Self {
        self.brand = Some(brand.to_string());
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }
}

/// Response envelope: `{"products": [...], "total": .., ...}`
#[derive(Debug, Deserialize)]
pub struct ProductPage {
    #[serde(default)]
    pub products: Vec<ApiProduct>,
}

/// Metadata attached to a transaction on a catalog hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub title: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub rating: Option<f64>,
}

/// Numeric product id → metadata. Built once, read-only afterwards.
pub type ProductMapping = HashMap<i64, ProductInfo>;

/// Build the id-keyed mapping; a later duplicate id overwrites an earlier one
pub fn create_product_mapping(products: &[ApiProduct]) -> ProductMapping {
    products
        .iter()
        .map(|p| {
            (
                p.id,
                ProductInfo {
                    title: p.title.clone(),
                    category: p.category.clone(),
                    brand: p.brand.clone(),
                    rating: p.rating,
                },
            )
        })
        .collect()
}

/// Parse a catalog response body
pub fn parse_product_page(body: &str) -> serde_json::Result<Vec<ApiProduct>> {
    let page: ProductPage = serde_json::from_str(body)?;
    Ok(page.products)
}

// ============================================================================
// PROVIDERS
// ============================================================================

/// ProductProvider - source of catalog products
///
/// Implementations swallow their own failures and return an empty list.
pub trait ProductProvider {
    /// Fetch up to `limit` products
    fn fetch_products(&self, limit: usize) -> Vec<ApiProduct>;

    /// Name for logs
    fn name(&self) -> &str;
}

/// In-memory provider (tests, offline runs)
#[derive(Debug, Clone, Default)]
pub struct StaticProductProvider {
    products: Vec<ApiProduct>,
}

impl StaticProductProvider {
    pub fn new(products: Vec<ApiProduct>) -> Self {
        StaticProductProvider { products }
    }

    pub fn empty() -> Self {
        StaticProductProvider::default()
    }
}

impl ProductProvider for StaticProductProvider {
    fn fetch_products(&self, limit: usize) -> Vec<ApiProduct> {
        self.products.iter().take(limit).cloned().collect()
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// HTTP catalog client (DummyJSON-compatible)
#[derive(Debug, Clone)]
pub struct HttpProductProvider {
    base_url: String,
    timeout_secs: u64,
}

impl HttpProductProvider {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        HttpProductProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
        }
    }

    pub fn request_url(&self, limit: usize) -> String {
        format!("{}?limit={}", self.base_url, limit)
    }
}

impl Default for HttpProductProvider {
    fn default() -> Self {
        HttpProductProvider::new(DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS)
    }
}

#[cfg(feature = "api")]
impl HttpProductProvider {
    fn try_fetch(&self, limit: usize) -> anyhow::Result<Vec<ApiProduct>> {
        use anyhow::Context;
        use std::time::Duration;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        let url = self.request_url(limit);
        let response = client
            .get(&url)
            .send()
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("API returned status code {}", status.as_u16());
        }

        let body = response.text().context("Failed to read response body")?;
        parse_product_page(&body).context("Malformed product list")
    }
}

impl ProductProvider for HttpProductProvider {
    #[cfg(feature = "api")]
    fn fetch_products(&self, limit: usize) -> Vec<ApiProduct> {
        match self.try_fetch(limit) {
            Ok(products) => {
                info!("Fetched {} products from {}", products.len(), self.base_url);
                products
            }
            Err(e) => {
                warn!("Product fetch failed: {:#}", e);
                Vec::new()
            }
        }
    }

    #[cfg(not(feature = "api"))]
    fn fetch_products(&self, _limit: usize) -> Vec<ApiProduct> {
        warn!(
            "HTTP product provider not available (built without 'api' feature); skipping {}",
            self.base_url
        );
        Vec::new()
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_product_page() {
        let body = r#"{
            "products": [
                {"id": 1, "title": "Essence Mascara", "category": "beauty", "brand": "Essence", "rating": 4.94, "price": 9.99},
                {"id": 2, "title": "Eyeshadow Palette", "category": "beauty", "rating": 3.28}
            ],
            "total": 194, "skip": 0, "limit": 2
        }"#;

        let products = parse_product_page(body).unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].brand, Some("Essence".to_string()));
        assert_eq!(products[0].rating, Some(4.94));
        assert_eq!(products[1].brand, None);
    }

    #[test]
    fn test_parse_product_page_rejects_garbage() {
        assert!(parse_product_page("<html>502</html>").is_err());
        assert!(parse_product_page("{}").unwrap().is_empty());
    }

    #[test]
    fn test_create_product_mapping() {
        let products = vec![
            ApiProduct::new(101)
                .with_title("Widget")
                .with_category("A")
                .with_brand("B")
                .with_rating(4.5),
            ApiProduct::new(102).with_title("Gadget"),
            ApiProduct::new(101).with_title("Widget v2").with_category("C"),
        ];

        let mapping = create_product_mapping(&products);

        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping[&101].title, Some("Widget v2".to_string()));
        assert_eq!(mapping[&101].category, Some("C".to_string()));
        assert_eq!(mapping[&102].category, None);
    }

    #[test]
    fn test_static_provider_respects_limit() {
        let provider = StaticProductProvider::new((1..=5).map(ApiProduct::new).collect());

        assert_eq!(provider.fetch_products(3).len(), 3);
        assert_eq!(provider.fetch_products(100).len(), 5);
        assert!(StaticProductProvider::empty().fetch_products(10).is_empty());
        assert_eq!(provider.name(), "static");
    }

    #[test]
    fn test_http_request_url() {
        let provider = HttpProductProvider::new("https://dummyjson.com/products/", 10);
        assert_eq!(
            provider.request_url(100),
            "https://dummyjson.com/products?limit=100"
        );
        assert_eq!(HttpProductProvider::default().name(), "http");
    }

    #[test]
    fn test_http_provider_failure_is_empty() {
        // Nothing listens on port 9 of localhost; connection fails fast
        let provider = HttpProductProvider::new("http://127.0.0.1:9/products", 2);
        assert!(provider.fetch_products(10).is_empty());

        println!("✅ Provider failure degrades to empty list");
    }
}
