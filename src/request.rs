//! Assembly of HTTP requests from descriptor metadata and field values.

use crate::{
    encode::encode,
    metadata::{placeholders, DescriptorMetadata, FieldValues, Placement},
    naming::NamingPolicy,
    Error, Result,
};
use http::{header, HeaderMap, HeaderValue, Method};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::{Map, Value};
use std::collections::HashMap;
use url::Url;

static NULL: Value = Value::Null;

/// Characters escaped in query keys and values. Everything else, `,`
/// included, is written literally.
const QUERY_COMPONENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>');

/// A fully-formed request, ready to hand to a [`Transport`](crate::Transport).
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    /// The serialized JSON body, if any field supplied one.
    pub body: Option<String>,
}

impl HttpRequest {
    /// Returns the value of a query parameter, percent-decoded.
    pub fn query_param(&self, key: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }
}

/// Builds the request for one descriptor instance.
///
/// Fields are visited in declaration order. Path fields are substituted into
/// the route template and must hold a value. Remaining fields with a value go
/// to the body or the query string according to their placement. Fields
/// without a value are skipped.
///
/// The body is the body-value field if one is set, otherwise a JSON object of
/// the body fields that are set, otherwise absent.
///
/// # Errors
///
/// - [`Error::ConfigurationError`] if a placeholder has no value.
/// - [`Error::SerializationFailed`] if the body cannot be serialized.
/// - [`Error::UnsupportedValue`] if a path or query value is not encodable.
pub fn build_request(
    base_url: &Url,
    naming: &dyn NamingPolicy,
    metadata: &DescriptorMetadata,
    values: &FieldValues,
    headers: &HeaderMap,
) -> Result<HttpRequest> {
    let template = &metadata.route.template;
    let mut segments: HashMap<&str, String> = HashMap::new();
    let mut query: Vec<String> = Vec::new();
    let mut body_fields = Map::new();
    let mut body_value: Option<&Value> = None;

    for field in &metadata.fields {
        let value = values.get(&field.name).unwrap_or(&NULL);

        if field.placement == Placement::Path {
            if value.is_null() {
                return Err(Error::ConfigurationError(format!(
                    "{} is a required field for endpoint {}",
                    field.name, template
                )));
            }
            if let Some(placeholder) = &field.placeholder {
                segments.insert(placeholder.as_str(), encode(&field.name, value)?);
            }
            continue;
        }

        if value.is_null() {
            continue;
        }

        match field.placement {
            Placement::BodyValueOnly => body_value = Some(value),
            Placement::BodyField => {
                let key = field
                    .alias
                    .clone()
                    .unwrap_or_else(|| naming.wire_name(&field.name));
                body_fields.insert(key, value.clone());
            }
            Placement::Query => {
                let key = naming.wire_name(&field.name);
                let encoded = encode(&field.name, value)?;
                query.push(format!(
                    "{}={}",
                    utf8_percent_encode(&key, QUERY_COMPONENT),
                    utf8_percent_encode(&encoded, QUERY_COMPONENT)
                ));
            }
            Placement::Path => {}
        }
    }

    let path = expand(template, &segments)?;
    let url = resolve(base_url, &path, &query.join("&"));

    let body = match body_value {
        Some(value) => Some(value.clone()),
        None if !body_fields.is_empty() => Some(Value::Object(body_fields)),
        None => None,
    };
    let body = body
        .map(|b| serde_json::to_string(&b))
        .transpose()
        .map_err(|e| Error::SerializationFailed(e.to_string()))?;

    let mut headers = headers.clone();
    if body.is_some() {
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
    }

    tracing::debug!(
        method = %metadata.route.verb,
        url = %url,
        has_body = body.is_some(),
        "Built descriptor request"
    );

    Ok(HttpRequest {
        method: metadata.route.verb.method(),
        url,
        headers,
        body,
    })
}

/// Rewrites the template's placeholders in a single pass. Substituted text
/// is copied through and never scanned for further placeholders.
fn expand(template: &str, segments: &HashMap<&str, String>) -> Result<String> {
    let mut path = String::with_capacity(template.len());
    let mut rest = template;

    for placeholder in placeholders(template) {
        let token = format!("{{{}}}", placeholder);
        let Some(start) = rest.find(&token) else {
            break;
        };
        let value = segments.get(placeholder).ok_or_else(|| {
            Error::ConfigurationError(format!(
                "No field fills placeholder {} of endpoint {}",
                token, template
            ))
        })?;
        path.push_str(&rest[..start]);
        path.push_str(value);
        rest = &rest[start + token.len()..];
    }

    path.push_str(rest);
    Ok(path)
}

/// Appends the route path to the base URL's path. Query strings from the
/// base URL, the route template and the fields are kept, in that order.
fn resolve(base_url: &Url, path: &str, field_query: &str) -> Url {
    let (route_path, route_query) = match path.split_once('?') {
        Some((p, q)) => (p, q),
        None => (path, ""),
    };

    let mut url = base_url.clone();
    let base_path = base_url.path().trim_end_matches('/');
    let route_path = route_path.trim_start_matches('/');
    if route_path.is_empty() {
        url.set_path(base_path);
    } else {
        url.set_path(&format!("{}/{}", base_path, route_path));
    }

    let query = [base_url.query().unwrap_or(""), route_query, field_query]
        .into_iter()
        .map(|q| q.trim_matches('&'))
        .filter(|q| !q.is_empty())
        .collect::<Vec<_>>()
        .join("&");
    url.set_query(if query.is_empty() { None } else { Some(&query) });

    url
}
