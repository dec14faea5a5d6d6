//! Signed HTTP transport for the AWS APIs
//!
//! Speaks the two wire shapes the covered services use: the Query
//! protocol (form-encoded request, XML response) and the JSON protocols
//! (`x-amz-target` header, JSON body), plus plain REST-XML for S3.
//! Every response is normalized to `serde_json::Value` so the rest of
//! the codebase never sees XML, and every error status is classified
//! into the framework taxonomy before it leaves this module.

use super::auth::AwsAuth;
use super::sign::{authorization, sha256_hex, SigningContext};
use crate::framework::error::{Error, Result};
use anyhow::Context;
use serde_json::{json, Map, Value};
use url::Url;

/// Maximum length of response body to log
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Truncate and strip a response body for logging.
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Query protocol / REST: XML responses.
    Xml,
    /// `x-amz-json` protocols: JSON responses.
    Json,
}

/// HTTP client wrapper for signed AWS API calls
#[derive(Clone)]
pub struct AwsHttpClient {
    client: reqwest::Client,
    /// Test hook: when set, every request goes to this base URL instead
    /// of the real per-service endpoint.
    endpoint: Option<String>,
}

impl AwsHttpClient {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("awscope/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            endpoint: None,
        })
    }

    pub fn with_endpoint(endpoint: &str) -> anyhow::Result<Self> {
        let mut this = Self::new()?;
        this.endpoint = Some(endpoint.trim_end_matches('/').to_string());
        Ok(this)
    }

    fn base_url(&self, service: &str, region: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => format!("https://{}.{}.amazonaws.com", service, region),
        }
    }

    /// Query-protocol call (EC2, CloudFormation): form-encoded POST,
    /// XML response.
    pub async fn query_request(
        &self,
        auth: &AwsAuth,
        service: &str,
        action: &str,
        version: &str,
        params: &[(String, String)],
    ) -> Result<Value> {
        let mut body = format!(
            "Action={}&Version={}",
            urlencoding::encode(action),
            urlencoding::encode(version)
        );
        for (key, value) in params {
            body.push('&');
            body.push_str(&urlencoding::encode(key));
            body.push('=');
            body.push_str(&urlencoding::encode(value));
        }

        let url = self.base_url(service, &auth.region);
        self.send(
            auth,
            service,
            action,
            "POST",
            &url,
            body.into_bytes(),
            "application/x-www-form-urlencoded; charset=utf-8",
            None,
            Protocol::Xml,
        )
        .await
    }

    /// JSON-protocol call (SQS, Compute Optimizer): `x-amz-target`
    /// header, JSON request and response.
    pub async fn json_request(
        &self,
        auth: &AwsAuth,
        service: &str,
        target: &str,
        body: &Value,
    ) -> Result<Value> {
        let operation = target.rsplit('.').next().unwrap_or(target);
        let url = self.base_url(service, &auth.region);
        let payload = serde_json::to_vec(body)
            .context("Failed to encode request body")
            .map_err(Error::Other)?;

        self.send(
            auth,
            service,
            operation,
            "POST",
            &url,
            payload,
            "application/x-amz-json-1.0",
            Some(target),
            Protocol::Json,
        )
        .await
    }

    /// REST-XML call (S3): method plus path, XML response.
    pub async fn rest_request(
        &self,
        auth: &AwsAuth,
        service: &str,
        operation: &str,
        method: &str,
        path: &str,
    ) -> Result<Value> {
        let base = self.base_url(service, &auth.region);
        let url = format!("{}{}", base, path);
        self.send(
            auth,
            service,
            operation,
            method,
            &url,
            Vec::new(),
            "",
            None,
            Protocol::Xml,
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn send(
        &self,
        auth: &AwsAuth,
        service: &str,
        operation: &str,
        method: &str,
        url: &str,
        body: Vec<u8>,
        content_type: &str,
        target: Option<&str>,
        protocol: Protocol,
    ) -> Result<Value> {
        tracing::debug!("{} {} ({})", method, url, operation);

        let url = Url::parse(url)
            .with_context(|| format!("Invalid endpoint URL: {}", url))
            .map_err(Error::Other)?;

        let host = match url.port() {
            Some(port) => format!(
                "{}:{}",
                url.host_str().unwrap_or_default(),
                port
            ),
            None => url.host_str().unwrap_or_default().to_string(),
        };

        let amz_date = chrono::Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        let payload_hash = sha256_hex(&body);

        let mut headers: Vec<(String, String)> = vec![
            ("host".to_string(), host),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        if !content_type.is_empty() {
            headers.push(("content-type".to_string(), content_type.to_string()));
        }
        if let Some(target) = target {
            headers.push(("x-amz-target".to_string(), target.to_string()));
        }
        if let Some(token) = &auth.credentials.session_token {
            headers.push(("x-amz-security-token".to_string(), token.clone()));
        }

        let ctx = SigningContext {
            access_key: &auth.credentials.access_key_id,
            secret_key: &auth.credentials.secret_access_key,
            region: &auth.region,
            service,
        };
        let auth_header = authorization(&ctx, method, &url, &amz_date, &headers, &payload_hash);

        let mut request = match method {
            "GET" => self.client.get(url),
            "DELETE" => self.client.delete(url),
            _ => self.client.post(url),
        };
        for (name, value) in &headers {
            // reqwest fills in Host itself.
            if name != "host" {
                request = request.header(name.as_str(), value.as_str());
            }
        }
        request = request.header("authorization", auth_header);
        if !body.is_empty() {
            request = request.body(body);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("{}: failed to send request", operation))
            .map_err(Error::Other)?;

        let status = response.status();
        let text = response
            .text()
            .await
            .with_context(|| format!("{}: failed to read response body", operation))
            .map_err(Error::Other)?;

        if !status.is_success() {
            tracing::error!(
                "{}: API error {} - {}",
                operation,
                status,
                sanitize_for_log(&text)
            );
            let (code, message) = extract_error(&text, protocol);
            return Err(classify(status.as_u16(), &code, &message, operation));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        match protocol {
            Protocol::Json => serde_json::from_str(&text)
                .with_context(|| format!("{}: failed to parse response JSON", operation))
                .map_err(Error::Other),
            Protocol::Xml => xml_to_json(&text)
                .with_context(|| format!("{}: failed to parse response XML", operation))
                .map_err(Error::Other),
        }
    }
}

/// Pull the error code and message out of an error response body.
fn extract_error(body: &str, protocol: Protocol) -> (String, String) {
    match protocol {
        Protocol::Json => {
            let Ok(value) = serde_json::from_str::<Value>(body) else {
                return (String::new(), String::new());
            };
            let code = value
                .get("__type")
                .and_then(|v| v.as_str())
                .map(|t| t.rsplit('#').next().unwrap_or(t).to_string())
                .unwrap_or_default();
            let message = ["message", "Message"]
                .iter()
                .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
                .unwrap_or_default()
                .to_string();
            (code, message)
        }
        Protocol::Xml => {
            let Ok(value) = xml_to_json(body) else {
                return (String::new(), String::new());
            };
            (
                find_first(&value, "Code").unwrap_or_default(),
                find_first(&value, "Message").unwrap_or_default(),
            )
        }
    }
}

/// Depth-first search for the first string value under `key`.
fn find_first(value: &Value, key: &str) -> Option<String> {
    match value {
        Value::Object(map) => {
            if let Some(found) = map.get(key).and_then(|v| v.as_str()) {
                return Some(found.to_string());
            }
            map.values().find_map(|v| find_first(v, key))
        }
        Value::Array(arr) => arr.iter().find_map(|v| find_first(v, key)),
        _ => None,
    }
}

/// Map an error status/code onto the framework taxonomy.
fn classify(status: u16, code: &str, message: &str, operation: &str) -> Error {
    let detail = if message.is_empty() {
        if code.is_empty() {
            format!("HTTP {}", status)
        } else {
            code.to_string()
        }
    } else {
        message.to_string()
    };

    let code_says = |needles: &[&str]| needles.iter().any(|n| code.contains(n));

    if status == 404 || code_says(&["NotFound", "NoSuch", "DoesNotExist", "NonExistent"]) {
        return Error::NotFound {
            what: format!("{}: {}", operation, detail),
        };
    }
    if status == 409 || code_says(&["InUse", "DependencyViolation", "BucketNotEmpty", "Conflict"])
    {
        return Error::ResourceInUse(detail);
    }
    if status == 401
        || status == 403
        || code_says(&[
            "AccessDenied",
            "UnauthorizedOperation",
            "AuthFailure",
            "ExpiredToken",
            "InvalidClientTokenId",
        ])
    {
        return Error::Unauthorized(detail);
    }
    if status == 429 || code_says(&["Throttl", "TooManyRequests", "RequestLimitExceeded", "SlowDown"])
    {
        return Error::Throttled(detail);
    }

    Error::Api {
        operation: operation.to_string(),
        message: if code.is_empty() {
            detail
        } else {
            format!("{} ({})", detail, code)
        },
    }
}

// =============================================================================
// XML normalization
// =============================================================================

/// Convert an AWS XML response into JSON.
///
/// Elements become objects keyed by child name, repeated child names
/// become arrays, text-only elements become strings, and attributes
/// are dropped (the covered APIs carry everything in elements). The
/// result is keyed by the root element's name.
pub fn xml_to_json(xml: &str) -> anyhow::Result<Value> {
    let mut parser = XmlParser { s: xml, pos: 0 };
    parser.skip_misc();
    let (name, value) = parser.parse_element()?;
    Ok(json!({ name: value }))
}

struct XmlParser<'a> {
    s: &'a str,
    pos: usize,
}

impl<'a> XmlParser<'a> {
    fn rest(&self) -> &'a str {
        &self.s[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.s.len() - trimmed.len();
    }

    /// Skip whitespace, the `<?xml?>` prolog, and comments.
    fn skip_misc(&mut self) {
        loop {
            self.skip_ws();
            if self.rest().starts_with("<?") {
                match self.rest().find("?>") {
                    Some(end) => self.pos += end + 2,
                    None => self.pos = self.s.len(),
                }
            } else if self.rest().starts_with("<!--") {
                match self.rest().find("-->") {
                    Some(end) => self.pos += end + 3,
                    None => self.pos = self.s.len(),
                }
            } else {
                return;
            }
        }
    }

    /// Consume the opening tag at the cursor. Returns the element name
    /// and whether the tag was self-closing.
    fn parse_open_tag(&mut self) -> anyhow::Result<(String, bool)> {
        anyhow::ensure!(self.rest().starts_with('<'), "expected '<'");
        self.pos += 1;

        let name_len = self
            .rest()
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .context("unterminated tag")?;
        let name = self.rest()[..name_len].to_string();
        anyhow::ensure!(!name.is_empty(), "empty element name");
        self.pos += name_len;

        // Skip attributes, respecting quoted values.
        let mut quote: Option<char> = None;
        let mut self_closing = false;
        let bytes = self.rest().char_indices();
        let mut consumed = None;
        let mut prev = ' ';
        for (i, c) in bytes {
            match quote {
                Some(q) if c == q => quote = None,
                Some(_) => {}
                None => match c {
                    '"' | '\'' => quote = Some(c),
                    '>' => {
                        self_closing = prev == '/';
                        consumed = Some(i + 1);
                        break;
                    }
                    _ => {}
                },
            }
            prev = c;
        }
        let consumed = consumed.context("unterminated tag")?;
        self.pos += consumed;

        Ok((name, self_closing))
    }

    fn parse_element(&mut self) -> anyhow::Result<(String, Value)> {
        let (name, self_closing) = self.parse_open_tag()?;
        if self_closing {
            return Ok((name, Value::String(String::new())));
        }

        let mut children = Map::new();
        let mut text = String::new();

        loop {
            if self.rest().starts_with("<!--") {
                match self.rest().find("-->") {
                    Some(end) => self.pos += end + 3,
                    None => self.pos = self.s.len(),
                }
                continue;
            }

            if self.rest().starts_with("</") {
                let end = self.rest().find('>').context("unterminated close tag")?;
                let closing = self.rest()[2..end].trim();
                anyhow::ensure!(
                    closing == name,
                    "mismatched close tag: expected </{}>, found </{}>",
                    name,
                    closing
                );
                self.pos += end + 1;
                break;
            }

            if self.rest().starts_with('<') {
                let (child_name, child_value) = self.parse_element()?;
                insert_child(&mut children, child_name, child_value);
                continue;
            }

            if self.rest().is_empty() {
                anyhow::bail!("unexpected end of document inside <{}>", name);
            }

            let chunk_len = self.rest().find('<').unwrap_or(self.rest().len());
            text.push_str(&self.rest()[..chunk_len]);
            self.pos += chunk_len;
        }

        let value = if children.is_empty() {
            Value::String(unescape(text.trim()))
        } else {
            Value::Object(children)
        };

        Ok((name, value))
    }
}

/// Repeated child names collapse into an array.
fn insert_child(children: &mut Map<String, Value>, name: String, value: Value) {
    match children.get_mut(&name) {
        Some(Value::Array(arr)) => arr.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            children.insert(name, value);
        }
    }
}

fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let Some(end) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };
        match &tail[..end + 1] {
            "&lt;" => out.push('<'),
            "&gt;" => out.push('>'),
            "&amp;" => out.push('&'),
            "&quot;" => out.push('"'),
            "&apos;" => out.push('\''),
            other => out.push_str(other),
        }
        rest = &tail[end + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_elements() {
        let xml = r#"<?xml version="1.0"?>
            <DescribeStacksResponse xmlns="http://cloudformation.amazonaws.com/doc/2010-05-15/">
                <DescribeStacksResult>
                    <Stacks>
                        <member><StackName>app</StackName><StackStatus>CREATE_COMPLETE</StackStatus></member>
                        <member><StackName>db</StackName><StackStatus>UPDATE_COMPLETE</StackStatus></member>
                    </Stacks>
                </DescribeStacksResult>
            </DescribeStacksResponse>"#;

        let value = xml_to_json(xml).unwrap();
        let members = &value["DescribeStacksResponse"]["DescribeStacksResult"]["Stacks"]["member"];
        assert_eq!(members.as_array().unwrap().len(), 2);
        assert_eq!(members[0]["StackName"], "app");
    }

    #[test]
    fn single_repeated_child_stays_scalar() {
        let value = xml_to_json("<r><item><id>a</id></item></r>").unwrap();
        assert!(value["r"]["item"].is_object());
        assert_eq!(value["r"]["item"]["id"], "a");
    }

    #[test]
    fn text_is_unescaped() {
        let value = xml_to_json("<r><name>a &amp; b &lt;c&gt;</name></r>").unwrap();
        assert_eq!(value["r"]["name"], "a & b <c>");
    }

    #[test]
    fn self_closing_and_empty_elements_are_empty_strings() {
        let value = xml_to_json("<r><a/><b></b></r>").unwrap();
        assert_eq!(value["r"]["a"], "");
        assert_eq!(value["r"]["b"], "");
    }

    #[test]
    fn attributes_are_skipped() {
        let value =
            xml_to_json(r#"<r attr="x > y"><v kind='weird'>ok</v></r>"#).unwrap();
        assert_eq!(value["r"]["v"], "ok");
    }

    #[test]
    fn mismatched_close_tag_is_an_error() {
        assert!(xml_to_json("<a><b></a></b>").is_err());
        assert!(xml_to_json("<a>").is_err());
    }

    #[test]
    fn classify_maps_status_and_codes() {
        assert!(matches!(
            classify(404, "", "", "GetQueueUrl"),
            Error::NotFound { .. }
        ));
        assert!(matches!(
            classify(400, "QueueDoesNotExist", "gone", "DeleteQueue"),
            Error::NotFound { .. }
        ));
        assert!(matches!(
            classify(409, "BucketNotEmpty", "has objects", "DeleteBucket"),
            Error::ResourceInUse(_)
        ));
        assert!(matches!(
            classify(400, "DependencyViolation", "eni attached", "TerminateInstances"),
            Error::ResourceInUse(_)
        ));
        assert!(matches!(
            classify(403, "", "", "DescribeInstances"),
            Error::Unauthorized(_)
        ));
        assert!(matches!(
            classify(400, "Throttling", "slow down", "DescribeStacks"),
            Error::Throttled(_)
        ));
        assert!(matches!(
            classify(500, "InternalError", "boom", "ListBuckets"),
            Error::Api { .. }
        ));
    }

    #[test]
    fn extract_error_reads_both_protocols() {
        let (code, message) = extract_error(
            r#"{"__type":"com.amazonaws.sqs#QueueDoesNotExist","message":"no queue"}"#,
            Protocol::Json,
        );
        assert_eq!(code, "QueueDoesNotExist");
        assert_eq!(message, "no queue");

        let (code, message) = extract_error(
            "<ErrorResponse><Error><Code>ValidationError</Code><Message>bad</Message></Error></ErrorResponse>",
            Protocol::Xml,
        );
        assert_eq!(code, "ValidationError");
        assert_eq!(message, "bad");
    }

    #[test]
    fn sanitize_truncates_and_strips() {
        let long = "x".repeat(500);
        let out = sanitize_for_log(&long);
        assert!(out.contains("truncated"));
        assert_eq!(sanitize_for_log("ok\u{7}body"), "okbody");
    }
}
