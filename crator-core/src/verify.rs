use crate::detect::{anomalous_redirection, body_text, captcha_detected, login_redirection_detected};
use crate::error::DetectError;
use crator_scanner::Response;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Valid,
    Unreachable(u16),
    LoginRedirect,
    Captcha,
    AnomalousRedirect,
    Duplicate,
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Valid)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Valid => "valid",
            Verdict::Unreachable(_) => "unreachable",
            Verdict::LoginRedirect => "login_redirect",
            Verdict::Captcha => "captcha",
            Verdict::AnomalousRedirect => "anomalous_redirect",
            Verdict::Duplicate => "duplicate",
        }
    }
}

/// A link is reachable only when the server answered 200; 404, 503 and the
/// rest mark it broken.
pub fn link_valid(response: &Response) -> bool {
    response.status_code == 200
}

/// Classify a single page without looking at other pages.
pub fn verify_page(requested_url: &str, response: &Response, login_page: Option<&Response>) -> Verdict {
    if !link_valid(response) {
        return Verdict::Unreachable(response.status_code);
    }
    if login_redirection_detected(response, login_page) {
        return Verdict::LoginRedirect;
    }
    if captcha_detected(requested_url, response) {
        return Verdict::Captcha;
    }
    if anomalous_redirection(requested_url, response) {
        return Verdict::AnomalousRedirect;
    }
    Verdict::Valid
}

/// Stateful verifier for one crawl: knows the site's login page and the body
/// text of every page accepted so far, so mirrors of an accepted page are
/// caught.
#[derive(Debug, Default)]
pub struct PageVerifier {
    login_page: Option<Response>,
    accepted: Vec<String>,
    // body text -> index into `accepted`
    seen_bodies: HashMap<String, usize>,
}

impl PageVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_login_page(mut self, login_page: Response) -> Self {
        self.login_page = Some(login_page);
        self
    }

    /// Final URLs of the accepted pages, in acceptance order.
    pub fn accepted(&self) -> &[String] {
        &self.accepted
    }

    /// Verdict for `response`; a `Valid` page is remembered for later
    /// duplicate checks. A page whose body text cannot be extracted is a
    /// contract violation, returned to the caller and never remembered.
    pub fn check(&mut self, requested_url: &str, response: &Response) -> Result<Verdict, DetectError> {
        let verdict = verify_page(requested_url, response, self.login_page.as_ref());
        if !verdict.is_accepted() {
            debug!("{} rejected: {}", requested_url, verdict.as_str());
            return Ok(verdict);
        }

        // Same comparison as `pages_content_equal`, against text extracted once
        let text = body_text(response)?;
        if let Some(&idx) = self.seen_bodies.get(&text) {
            debug!("{} duplicates {}", requested_url, self.accepted[idx]);
            return Ok(Verdict::Duplicate);
        }

        self.seen_bodies.insert(text, self.accepted.len());
        self.accepted.push(response.url.clone());
        Ok(Verdict::Valid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_valid() {
        let ok = Response::new("http://a.onion/").with_status(200);
        let missing = Response::new("http://a.onion/").with_status(404);
        let unavailable = Response::new("http://a.onion/").with_status(503);
        assert!(link_valid(&ok));
        assert!(!link_valid(&missing));
        assert!(!link_valid(&unavailable));
    }

    #[test]
    fn test_verdict_strings() {
        assert_eq!(Verdict::Unreachable(404).as_str(), "unreachable");
        assert!(Verdict::Valid.is_accepted());
        assert!(!Verdict::Duplicate.is_accepted());
    }
}
