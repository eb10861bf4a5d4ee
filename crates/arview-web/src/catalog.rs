//! Catalog fetch from the arview server

use arview_core::CatalogInfo;
use arview_scene::ViewerSettings;

/// Default catalog endpoint, relative to the page
pub const CATALOG_URL: &str = "/api/catalog";

/// Catalog URL, honouring a `?catalog=` override in the page URL
pub fn catalog_url() -> String {
    let href = web_sys::window().and_then(|w| w.location().href().ok());
    href.and_then(|href| web_sys::Url::new(&href).ok())
        .and_then(|url| url.search_params().get("catalog"))
        .unwrap_or_else(|| CATALOG_URL.to_string())
}

/// Fetch the served catalog
pub async fn fetch_catalog(url: &str) -> Result<CatalogInfo, String> {
    let response = gloo_net::http::Request::get(url)
        .send()
        .await
        .map_err(|e| format!("Fetch failed: {:?}", e))?;

    if !response.ok() {
        return Err(format!("HTTP {}: {}", response.status(), response.status_text()));
    }

    let text = response
        .text()
        .await
        .map_err(|e| format!("Text extraction failed: {:?}", e))?;
    serde_json::from_str(&text).map_err(|e| format!("JSON parse error: {}", e))
}

/// Settings with the served catalog applied, or the built-in defaults
pub async fn load_settings() -> ViewerSettings {
    let mut settings = ViewerSettings::default();
    let url = catalog_url();

    match fetch_catalog(&url).await {
        Ok(info) => match info.apply_to(&mut settings.0) {
            Ok(()) => tracing::info!(
                "Loaded catalog from {}: {} models",
                url,
                settings.catalog.models.len()
            ),
            Err(e) => tracing::warn!("Served catalog is invalid, using built-in catalog: {}", e),
        },
        Err(e) => tracing::warn!("Could not fetch catalog from {}, using built-in catalog: {}", url, e),
    }

    settings
}
