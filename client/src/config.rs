pub const DEFAULT_API_BASE: &str = "http://localhost:5000";
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Largest page the server honours; anything above falls back to its default.
pub const MAX_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base: String,
    pub page_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ClientConfig {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            ..Self::default()
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = clamp_page_size(page_size);
        self
    }

    /// Read `TOWNSQUARE_API_URL` and `TOWNSQUARE_PAGE_SIZE`, keeping the
    /// defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let api_base = std::env::var("TOWNSQUARE_API_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let page_size = std::env::var("TOWNSQUARE_PAGE_SIZE")
            .ok()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE);
        Self::new(api_base).with_page_size(page_size)
    }
}

pub fn clamp_page_size(page_size: u32) -> u32 {
    page_size.clamp(1, MAX_PAGE_SIZE)
}
