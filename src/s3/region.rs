//! Regions and their endpoints

use std::fmt;
use url::Url;

/// A region: the SigV4 region name plus the endpoint that serves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    name: String,
    endpoint: String,
}

impl Region {
    /// A region served over HTTPS at `host`.
    pub fn new(name: impl Into<String>, host: &str) -> Self {
        Self {
            name: name.into(),
            endpoint: format!("https://{}", host),
        }
    }

    /// A region served at an arbitrary endpoint URL, e.g. `http://localhost:9000`.
    pub fn custom(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
        }
    }

    pub fn us_standard() -> Self {
        Self::new("us-east-1", "s3.amazonaws.com")
    }

    pub fn us_west_oregon() -> Self {
        Self::new("us-west-2", "s3-us-west-2.amazonaws.com")
    }

    pub fn us_west_northern_california() -> Self {
        Self::new("us-west-1", "s3-us-west-1.amazonaws.com")
    }

    pub fn eu_ireland() -> Self {
        Self::new("eu-west-1", "s3-eu-west-1.amazonaws.com")
    }

    pub fn asia_pacific_singapore() -> Self {
        Self::new("ap-southeast-1", "s3-ap-southeast-1.amazonaws.com")
    }

    pub fn asia_pacific_sydney() -> Self {
        Self::new("ap-southeast-2", "s3-ap-southeast-2.amazonaws.com")
    }

    pub fn asia_pacific_tokyo() -> Self {
        Self::new("ap-northeast-1", "s3-ap-northeast-1.amazonaws.com")
    }

    pub fn south_america_sao_paulo() -> Self {
        Self::new("sa-east-1", "s3-sa-east-1.amazonaws.com")
    }

    /// Look up a standard region by its SigV4 name.
    pub fn from_name(name: &str) -> Option<Self> {
        let region = match name {
            "us-east-1" => Self::us_standard(),
            "us-west-2" => Self::us_west_oregon(),
            "us-west-1" => Self::us_west_northern_california(),
            "eu-west-1" => Self::eu_ireland(),
            "ap-southeast-1" => Self::asia_pacific_singapore(),
            "ap-southeast-2" => Self::asia_pacific_sydney(),
            "ap-northeast-1" => Self::asia_pacific_tokyo(),
            "sa-east-1" => Self::south_america_sao_paulo(),
            _ => return None,
        };
        Some(region)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn endpoint_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.endpoint)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.endpoint)
    }
}
