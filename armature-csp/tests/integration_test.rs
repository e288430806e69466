//! Integration tests for armature-csp

use armature_csp::*;
use std::collections::HashMap;

#[test]
fn test_self_and_cdn_scripts() {
    let mut csp = ContentSecurityPolicy::new();
    csp.allow_self(DirectiveSet::SCRIPT_SRC)
        .unwrap()
        .allow_hosts(DirectiveSet::SCRIPT_SRC, ["https://cdn.example.com"])
        .unwrap();

    assert_eq!(csp.header_value(), "script-src 'self' https://cdn.example.com");
}

#[test]
fn test_scheme_sources() {
    let mut csp = ContentSecurityPolicy::new();
    csp.allow_scheme(DirectiveSet::IMG_SRC, "data:").unwrap();
    assert_eq!(csp.header_value(), "img-src data:");

    let err = csp
        .allow_scheme(DirectiveSet::IMG_SRC, "not-a-scheme")
        .unwrap_err();
    assert!(matches!(err, CspError::InvalidArgument(_)));
}

#[test]
fn test_parse_existing_header() {
    let csp = ContentSecurityPolicy::parse("default-src 'none'; img-src https://a.com https://b.com");

    assert_eq!(csp.state(Directive::DefaultSrc), &DirectiveState::None);
    assert_eq!(
        csp.state(Directive::ImgSrc).tokens().collect::<Vec<_>>(),
        vec!["https://a.com", "https://b.com"]
    );
    assert!(csp.state(Directive::ScriptSrc).is_unset());
}

#[test]
fn test_disallow_directive_for_group() {
    let mut csp = ContentSecurityPolicy::new();
    csp.allow_self(DirectiveSet::FETCH).unwrap();
    csp.disallow_directive(DirectiveSet::NAVIGATION | DirectiveSet::OBJECT_SRC)
        .unwrap();

    let header = csp.header_value();
    assert!(header.contains("object-src 'none'"));
    assert!(header.contains("form-action 'none'"));
    assert!(header.contains("frame-ancestors 'none'"));
    assert!(header.contains("navigate-to 'none'"));
    assert!(header.contains("script-src 'self'"));
    assert!(!header.contains("object-src 'self'"));
}

#[test]
fn test_nonce_shared_within_response() {
    let mut csp = ContentSecurityPolicy::new();
    let first = csp.nonce().to_string();
    csp.allow_nonce(DirectiveSet::SCRIPT_SRC | DirectiveSet::STYLE_SRC)
        .unwrap();

    assert_eq!(csp.nonce(), first);
    assert_eq!(
        csp.header_value(),
        format!("script-src 'nonce-{first}'; style-src 'nonce-{first}'")
    );
    assert_ne!(ContentSecurityPolicy::new().nonce(), first);
}

#[test]
fn test_closure_guard() {
    let flag = CommitFlag::new();
    let observer = flag.clone();
    let mut csp = ContentSecurityPolicy::new().with_guard(move || observer.is_committed());

    csp.allow_self(DirectiveSet::DEFAULT_SRC).unwrap();
    flag.commit();

    let before = csp.header_value();
    let result = csp.allow_hosts(DirectiveSet::IMG_SRC, ["https://late.example.com"]);
    assert!(matches!(result, Err(CspError::HeadersAlreadySent)));
    assert_eq!(csp.header_value(), before);
}

#[test]
fn test_merge_third_party_header() {
    let sent_headers = vec![
        "Content-Type: text/html; charset=utf-8".to_string(),
        "Content-Security-Policy: script-src   https://widgets.example.com ;  frame-src https://widgets.example.com".to_string(),
        "X-Frame-Options: DENY".to_string(),
    ];

    let mut csp = ContentSecurityPolicy::new();
    csp.allow_self(DirectiveSet::SCRIPT_SRC).unwrap();
    csp.merge_sent_headers(&sent_headers);

    assert_eq!(
        csp.header_value(),
        "script-src 'self' https://widgets.example.com; frame-src https://widgets.example.com"
    );

    // Scanning the same header list again changes nothing
    csp.merge_sent_headers(&sent_headers);
    assert_eq!(
        csp.header_value(),
        "script-src 'self' https://widgets.example.com; frame-src https://widgets.example.com"
    );
}

#[test]
fn test_config_to_response_headers() {
    let config = CspConfig::from_json_str(
        r#"{
            "report_only": true,
            "directives": [
                { "name": "default-src", "sources": ["'self'"] },
                { "name": "object-src", "sources": ["'none'"] }
            ]
        }"#,
    )
    .unwrap();

    let mut csp = config.build().unwrap();
    csp.allow_google_fonts().unwrap();

    let mut headers: HashMap<String, String> = HashMap::new();
    csp.send(&mut headers).unwrap();

    let value = &headers["Content-Security-Policy-Report-Only"];
    assert!(value.starts_with("default-src 'self'; object-src 'none'; style-src https://fonts.googleapis.com"));
}

#[test]
fn test_hash_sources_in_header() {
    let mut csp = ContentSecurityPolicy::new();
    csp.allow_hashed_source(
        DirectiveSet::SCRIPT_SRC,
        "alert('Hello, world.');",
        "sha256".parse().unwrap(),
    )
    .unwrap();

    assert_eq!(
        csp.header(),
        "Content-Security-Policy: script-src 'sha256-qznLcsROx4GACP2dm0UCKCzCG+HiZ1guq6ZZDob/Tng='"
    );
}

#[test]
fn test_registry_lookups() {
    assert_eq!(lookup_selector("img-src"), Some(DirectiveSet::IMG_SRC));
    assert_eq!(lookup_name(DirectiveSet::FRAME_ANCESTORS), Some("frame-ancestors"));
    assert_eq!(all_directives().count(), 19);
    assert_eq!(
        all_directives().next(),
        Some(("child-src", DirectiveSet::CHILD_SRC))
    );
}

#[test]
fn test_raw_bitmask_selectors() {
    // Persisted selector values keep working
    let flags = DirectiveSet::from_bits_truncate(512 | 4096);
    let mut csp = ContentSecurityPolicy::new();
    csp.allow_self(flags).unwrap();

    assert_eq!(csp.header_value(), "script-src 'self'; style-src 'self'");
}
