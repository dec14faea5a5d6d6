//! SigV4 request signing
//!
//! Direct HTTP against the AWS APIs needs each request signed with the
//! Signature Version 4 scheme: a canonical form of the request is
//! hashed, scoped to date/region/service, and signed with a key derived
//! from the secret. Pure functions throughout; the HTTP layer supplies
//! the pieces.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use url::Url;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

pub struct SigningContext<'a> {
    pub access_key: &'a str,
    pub secret_key: &'a str,
    pub region: &'a str,
    pub service: &'a str,
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    // HMAC-SHA256 accepts keys of any length.
    let mut mac = HmacSha256::new_from_slice(key).expect("hmac accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Derive the signing key for one date/region/service scope.
pub fn signing_key(secret_key: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{}", secret_key).as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// Query string in canonical form: pairs sorted by key then value,
/// strictly percent-encoded.
fn canonical_query(url: &Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            (
                urlencoding::encode(&k).into_owned(),
                urlencoding::encode(&v).into_owned(),
            )
        })
        .collect();
    pairs.sort();

    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Canonical request plus the signed-header list it embeds.
///
/// `headers` must hold lowercase names with trimmed values and include
/// at least `host` and `x-amz-date`.
pub fn canonical_request(
    method: &str,
    url: &Url,
    headers: &[(String, String)],
    payload_hash: &str,
) -> (String, String) {
    let mut sorted: Vec<&(String, String)> = headers.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let canonical_headers: String = sorted
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value))
        .collect();
    let signed_headers = sorted
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(";");

    let path = if url.path().is_empty() { "/" } else { url.path() };

    let canonical = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method,
        path,
        canonical_query(url),
        canonical_headers,
        signed_headers,
        payload_hash
    );

    (canonical, signed_headers)
}

/// Full `Authorization` header value for one request.
///
/// `amz_date` is the `YYYYMMDD'T'HHMMSS'Z'` timestamp also sent as the
/// `x-amz-date` header.
pub fn authorization(
    ctx: &SigningContext,
    method: &str,
    url: &Url,
    amz_date: &str,
    headers: &[(String, String)],
    payload_hash: &str,
) -> String {
    let date = &amz_date[..8];
    let scope = format!("{}/{}/{}/aws4_request", date, ctx.region, ctx.service);

    let (canonical, signed_headers) = canonical_request(method, url, headers, payload_hash);
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        scope,
        sha256_hex(canonical.as_bytes())
    );

    let key = signing_key(ctx.secret_key, date, ctx.region, ctx.service);
    let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes()));

    format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM, ctx.access_key, scope, signed_headers, signature
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // The published AWS SigV4 example: GET iam.amazonaws.com ListUsers
    // on 20150830 with the documented example credentials.
    const EXAMPLE_SECRET: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";
    const EXAMPLE_ACCESS: &str = "AKIDEXAMPLE";
    const EXAMPLE_DATE: &str = "20150830T123600Z";

    fn example_headers() -> Vec<(String, String)> {
        vec![
            (
                "content-type".to_string(),
                "application/x-www-form-urlencoded; charset=utf-8".to_string(),
            ),
            ("host".to_string(), "iam.amazonaws.com".to_string()),
            ("x-amz-date".to_string(), EXAMPLE_DATE.to_string()),
        ]
    }

    #[test]
    fn derived_key_matches_published_example() {
        let key = signing_key(EXAMPLE_SECRET, "20150830", "us-east-1", "iam");
        assert_eq!(
            hex::encode(key),
            "c4afb1cc5771d871763a393e44b703571b55cc28424d1a5e86da6ed3c154a4b9"
        );
    }

    #[test]
    fn canonical_request_hash_matches_published_example() {
        let url = Url::parse("https://iam.amazonaws.com/?Action=ListUsers&Version=2010-05-08")
            .unwrap();
        let empty_payload = sha256_hex(b"");

        let (canonical, signed) =
            canonical_request("GET", &url, &example_headers(), &empty_payload);

        assert_eq!(signed, "content-type;host;x-amz-date");
        assert_eq!(
            sha256_hex(canonical.as_bytes()),
            "f536975d06c0309214f805bb90ccff089219ecd68b2577efef23edd43b7e1a59"
        );
    }

    #[test]
    fn signature_matches_published_example() {
        let url = Url::parse("https://iam.amazonaws.com/?Action=ListUsers&Version=2010-05-08")
            .unwrap();
        let ctx = SigningContext {
            access_key: EXAMPLE_ACCESS,
            secret_key: EXAMPLE_SECRET,
            region: "us-east-1",
            service: "iam",
        };

        let header = authorization(
            &ctx,
            "GET",
            &url,
            EXAMPLE_DATE,
            &example_headers(),
            &sha256_hex(b""),
        );

        assert!(header.ends_with(
            "Signature=5d672d79c15b13162d9279b0855cfba6789a8edb4c82c400e06b5924a6f2b5d7"
        ));
        assert!(header.contains("Credential=AKIDEXAMPLE/20150830/us-east-1/iam/aws4_request"));
    }

    #[test]
    fn query_pairs_are_sorted() {
        let url = Url::parse("https://ec2.us-east-1.amazonaws.com/?Zeta=1&Alpha=2").unwrap();
        let (canonical, _) = canonical_request("POST", &url, &example_headers(), "hash");
        assert!(canonical.contains("Alpha=2&Zeta=1"));
    }

    #[test]
    fn empty_path_canonicalizes_to_slash() {
        let url = Url::parse("https://sqs.us-east-1.amazonaws.com").unwrap();
        let (canonical, _) = canonical_request("POST", &url, &example_headers(), "hash");
        assert!(canonical.starts_with("POST\n/\n"));
    }
}
