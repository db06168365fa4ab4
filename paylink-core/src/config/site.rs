//! Where the buyer lands after the gateway redirects back.

use url::Url;

#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Page shown after a verified, successful payment.
    pub success_page: Url,
    /// Page shown after a failed or unverifiable payment.
    pub failure_page: Url,
}
