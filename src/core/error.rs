use thiserror::Error;

/// Initial-load, refresh or load-more failure reported by a feed data source.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataFetchError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("backend returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("feed source unavailable: {0}")]
    Unavailable(String),
}

/// A single item's media failed to load or decode.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("media for item {item_id} failed: {reason}")]
pub struct MediaLoadError {
    pub item_id: String,
    pub reason: String,
}

/// Field-level order form problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Delivery address is required")]
    AddressMissing,
    #[error("Please enter a complete address")]
    AddressIncomplete,
    #[error("Phone number is required")]
    PhoneMissing,
    #[error("Please enter a valid phone number")]
    PhoneInvalid,
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::AddressMissing | ValidationError::AddressIncomplete => "address",
            ValidationError::PhoneMissing | ValidationError::PhoneInvalid => "phone",
        }
    }
}

/// The backend service cannot be used at all.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendUnavailable {
    #[error("backend URL or anon key is not configured")]
    NotConfigured,
    #[error("invalid backend URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("could not build HTTP client: {0}")]
    Client(String),
}

impl From<BackendUnavailable> for DataFetchError {
    fn from(err: BackendUnavailable) -> Self {
        DataFetchError::Unavailable(err.to_string())
    }
}
