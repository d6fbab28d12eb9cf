//! Blocking HTTP document loader

use crate::config::LoaderConfig;
use crate::error::Result as LoaderResult;
use crate::link::parse_link_header;
use jsonld_core::iri;
use jsonld_core::{DocumentLoader, ErrorKind, JsonLdError, LoadOptions, RemoteDocument, Result};
use jsonld_vocab::media;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, LINK};
use serde_json::Value as JsonValue;

/// Alternate-link redirects followed before giving up.
const MAX_ALTERNATE_HOPS: usize = 1;

/// Fetches documents over HTTP(S) with the JSON-LD `Accept` header.
///
/// For plain JSON responses a `Link` header with the JSON-LD context
/// relation is reported as [`RemoteDocument::context_url`]. A non JSON
/// response advertising an `alternate` JSON-LD link is followed once.
#[derive(Debug, Clone)]
pub struct HttpLoader {
    client: Client,
}

impl HttpLoader {
    pub fn new(config: &LoaderConfig) -> LoaderResult<Self> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }

    fn accept_header(options: &LoadOptions) -> String {
        match &options.profile {
            Some(profile) => format!(
                "{};profile=\"{}\", {}, {};q=0.9",
                media::JSON_LD,
                profile,
                media::JSON_LD,
                media::JSON
            ),
            None => format!("{}, {};q=0.9", media::JSON_LD, media::JSON),
        }
    }

    fn fetch(&self, url: &str, options: &LoadOptions, hops: usize) -> Result<RemoteDocument> {
        let failed = |message: String| {
            JsonLdError::loader(ErrorKind::LoadingDocumentFailed, url, message)
        };

        tracing::debug!(url, "fetching remote document");
        let response = self
            .client
            .get(url)
            .header(ACCEPT, Self::accept_header(options))
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| failed(e.to_string()))?;

        let document_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase());
        let links = response
            .headers()
            .get_all(LINK)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(parse_link_header)
            .collect::<Vec<_>>();

        let is_json = content_type
            .as_deref()
            .is_some_and(|ct| ct == media::JSON || ct.ends_with("+json"));
        let is_json_ld = content_type.as_deref() == Some(media::JSON_LD);

        if !is_json {
            let alternate = links
                .iter()
                .find(|l| l.has_rel("alternate") && l.param("type") == Some(media::JSON_LD));
            if let (Some(link), true) = (alternate, hops < MAX_ALTERNATE_HOPS) {
                let target = iri::resolve(Some(&document_url), &link.target);
                tracing::debug!(url, alternate = %target, "following alternate link");
                return self.fetch(&target, options, hops + 1);
            }
            return Err(failed(format!(
                "unsupported content type {}",
                content_type.as_deref().unwrap_or("(none)")
            )));
        }

        let context_url = if is_json_ld {
            None
        } else {
            let mut contexts = links.iter().filter(|l| l.has_rel(media::CONTEXT_LINK_REL));
            match (contexts.next(), contexts.next()) {
                (Some(_), Some(_)) => {
                    return Err(JsonLdError::loader(
                        ErrorKind::MultipleContextLinkHeaders,
                        url,
                        "more than one context Link header",
                    ))
                }
                (Some(link), None) => Some(iri::resolve(Some(&document_url), &link.target)),
                _ => None,
            }
        };

        let body = response.text().map_err(|e| failed(e.to_string()))?;
        let document: JsonValue =
            serde_json::from_str(&body).map_err(|e| failed(format!("invalid JSON: {}", e)))?;

        Ok(RemoteDocument {
            document,
            document_url,
            context_url,
            content_type,
        })
    }
}

impl DocumentLoader for HttpLoader {
    fn load(&self, url: &str, options: &LoadOptions) -> Result<RemoteDocument> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(JsonLdError::loader(
                ErrorKind::LoadingDocumentFailed,
                url,
                "only http and https URLs are supported",
            ));
        }
        self.fetch(url, options, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_header() {
        assert_eq!(
            HttpLoader::accept_header(&LoadOptions::default()),
            "application/ld+json, application/json;q=0.9"
        );
        assert_eq!(
            HttpLoader::accept_header(&LoadOptions::context()),
            "application/ld+json;profile=\"http://www.w3.org/ns/json-ld#context\", application/ld+json, application/json;q=0.9"
        );
    }

    #[test]
    fn test_rejects_non_http_urls() {
        let loader = HttpLoader::new(&LoaderConfig::default()).unwrap();
        let err = loader
            .load("file:///etc/passwd", &LoadOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::LoadingDocumentFailed);
    }
}
