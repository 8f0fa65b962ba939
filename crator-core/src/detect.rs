// Detectors for pages that block automated crawlers: captchas, forced login
// redirects, anomalous redirects and mirrored content.

use crate::error::DetectError;
use crate::verify::link_valid;
use crator_scanner::Response;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, error};
use url::Url;

/// Outcome of a single heuristic before its failure bias is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    Detected,
    NotDetected,
    EvaluationFailed(String),
}

impl Detection {
    /// Fail open: an evaluation failure counts as "not blocked".
    pub fn or_open(&self) -> bool {
        matches!(self, Detection::Detected)
    }

    /// Fail closed: an evaluation failure counts as "blocked".
    pub fn or_closed(&self) -> bool {
        !matches!(self, Detection::NotDetected)
    }
}

/// Compare two URLs literally, then as parsed URLs so `http://x.onion` and
/// `http://x.onion/` are the same page.
fn same_url(a: &str, b: &str) -> Result<bool, String> {
    if a == b {
        return Ok(true);
    }
    let parsed_a = Url::parse(a).map_err(|e| format!("cannot parse URL '{}': {}", a, e))?;
    let parsed_b = Url::parse(b).map_err(|e| format!("cannot parse URL '{}': {}", b, e))?;
    Ok(parsed_a == parsed_b)
}

pub fn evaluate_captcha(response: &Response) -> Detection {
    let selector = match Selector::parse("img[src]") {
        Ok(selector) => selector,
        Err(e) => return Detection::EvaluationFailed(format!("bad selector: {}", e)),
    };

    let document = Html::parse_document(&response.text());
    let found = document
        .select(&selector)
        .filter_map(|img| img.value().attr("src"))
        .any(|src| src.to_lowercase().contains("captcha"));

    if found {
        Detection::Detected
    } else {
        Detection::NotDetected
    }
}

/// True when any `<img>` source mentions "captcha" (case-insensitive).
pub fn captcha_detected(url: &str, response: &Response) -> bool {
    debug!("Captcha detector on {}", url);
    let detection = evaluate_captcha(response);
    match &detection {
        Detection::Detected => debug!("Captcha image found on {}", url),
        Detection::EvaluationFailed(reason) => {
            debug!("Captcha detector could not parse {}: {}", url, reason)
        }
        Detection::NotDetected => {}
    }
    detection.or_open()
}

pub fn evaluate_anomalous_redirection(requested_url: &str, response: &Response) -> Detection {
    if !response.history.iter().any(|hop| hop.status_code == 302) {
        return Detection::NotDetected;
    }

    match same_url(&response.url, requested_url) {
        Ok(true) => Detection::NotDetected,
        Ok(false) => Detection::Detected,
        Err(reason) => Detection::EvaluationFailed(reason),
    }
}

/// True when a 302 took the crawler somewhere other than `requested_url`.
/// Ambiguous evidence is reported as anomalous.
pub fn anomalous_redirection(requested_url: &str, response: &Response) -> bool {
    let detection = evaluate_anomalous_redirection(requested_url, response);
    if let Detection::EvaluationFailed(reason) = &detection {
        error!("Anomalous redirection check failed for {}: {}", requested_url, reason);
    }
    detection.or_closed()
}

pub fn evaluate_login_redirection(response: &Response, login_page: &Response) -> Detection {
    let login_url = Url::parse(&login_page.url);
    let mut failure = None;

    // Most recent hop first; the history itself is left untouched.
    for hop in response.history.iter().rev() {
        if hop.status_code != 302 {
            continue;
        }
        if hop.url == login_page.url {
            return Detection::Detected;
        }
        match &login_url {
            Ok(login_url) => {
                if Url::parse(&hop.url).is_ok_and(|hop_url| &hop_url == login_url) {
                    return Detection::Detected;
                }
            }
            Err(e) => {
                failure = Some(format!(
                    "cannot parse login page URL '{}': {}",
                    login_page.url, e
                ));
            }
        }
    }

    match failure {
        Some(reason) => Detection::EvaluationFailed(reason),
        None => Detection::NotDetected,
    }
}

/// True when the redirect history passed through the login page with a 302.
/// Without a login page there is nothing to validate against.
pub fn login_redirection_detected(response: &Response, login_page: Option<&Response>) -> bool {
    let Some(login_page) = login_page else {
        debug!("No login page defined");
        return false;
    };

    let detection = evaluate_login_redirection(response, login_page);
    if let Detection::EvaluationFailed(reason) = &detection {
        error!("Login redirection check failed for {}: {}", response.url, reason);
    }
    detection.or_open()
}

/// Raw-markup scan for a `<body` start tag ended by `>`, `/` or whitespace.
/// The scan does not tokenize, so a tag spelled inside a comment or a script
/// string still counts.
fn has_body_tag(markup: &str) -> bool {
    markup.as_bytes().windows(6).any(|w| {
        w[..5].eq_ignore_ascii_case(b"<body")
            && (w[5] == b'>' || w[5] == b'/' || w[5].is_ascii_whitespace())
    })
}

/// Concatenated text of the page's `<body>` element.
pub fn body_text(response: &Response) -> Result<String, DetectError> {
    if !response.is_fetched() {
        return Err(DetectError::NotFetched {
            url: response.url.clone(),
        });
    }

    let markup = response.text();
    // html5ever synthesizes a body for any document, so check the source markup.
    if !has_body_tag(&markup) {
        return Err(DetectError::MissingBody {
            url: response.url.clone(),
        });
    }

    let document = Html::parse_document(&markup);
    document
        .root_element()
        .children()
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().name() == "body")
        .map(|body| body.text().collect::<String>())
        .ok_or_else(|| DetectError::MissingBody {
            url: response.url.clone(),
        })
}

/// True when both pages carry exactly the same body text.
///
/// A missing page is never equal to anything, and neither is an error page
/// (any status other than 200). Placeholder responses and documents without a
/// body are caller errors and are returned as such.
pub fn pages_content_equal(
    page_a: Option<&Response>,
    page_b: Option<&Response>,
) -> Result<bool, DetectError> {
    let (Some(page_a), Some(page_b)) = (page_a, page_b) else {
        return Ok(false);
    };

    for page in [page_a, page_b] {
        if !page.is_fetched() {
            return Err(DetectError::NotFetched {
                url: page.url.clone(),
            });
        }
    }
    if !link_valid(page_a) || !link_valid(page_b) {
        return Ok(false);
    }

    Ok(body_text(page_a)? == body_text(page_b)?)
}
