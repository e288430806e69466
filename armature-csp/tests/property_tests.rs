//! Property tests for policy mutation and the header codec

use armature_csp::{ContentSecurityPolicy, Directive, DirectiveSet};
use proptest::prelude::*;

fn arb_flags() -> impl Strategy<Value = DirectiveSet> {
    (1u32..(1 << 23))
        .prop_map(DirectiveSet::from_bits_truncate)
        .prop_filter("selects a directive", |flags| flags.directives().next().is_some())
}

fn arb_token() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("'self'".to_string()),
        Just("'unsafe-inline'".to_string()),
        Just("data:".to_string()),
        "https://[a-z]{1,8}\\.example\\.com",
        "'nonce-[A-Za-z0-9+/]{22}=='",
    ]
}

#[derive(Debug, Clone)]
enum Op {
    Allow(DirectiveSet, String),
    Block(DirectiveSet),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (arb_flags(), arb_token()).prop_map(|(flags, token)| Op::Allow(flags, token)),
        1 => arb_flags().prop_map(Op::Block),
    ]
}

fn snapshot(policy: &ContentSecurityPolicy) -> Vec<(Directive, bool, Vec<String>)> {
    policy
        .directives()
        .map(|(directive, state)| {
            (
                directive,
                state.is_none(),
                state.tokens().map(str::to_string).collect(),
            )
        })
        .collect()
}

proptest! {
    #[test]
    fn allow_then_disallow(flags in arb_flags(), token in arb_token()) {
        let mut csp = ContentSecurityPolicy::new();
        csp.allow_token(flags, &token).unwrap();
        prop_assert!(csp.is_allowed(flags, &token, true));

        csp.disallow_token(flags, &token).unwrap();
        prop_assert!(!csp.is_allowed(flags, &token, true));
        prop_assert!(!csp.is_allowed(flags, &token, false));
        prop_assert!(csp.is_empty());
    }

    #[test]
    fn allow_is_idempotent(ops in prop::collection::vec(arb_op(), 0..12), flags in arb_flags(), token in arb_token()) {
        let mut once = ContentSecurityPolicy::new();
        let mut twice = ContentSecurityPolicy::new();
        for policy in [&mut once, &mut twice] {
            for op in &ops {
                match op {
                    Op::Allow(f, t) => { policy.allow_token(*f, t).unwrap(); }
                    Op::Block(f) => { policy.disallow_directive(*f).unwrap(); }
                }
            }
        }
        once.allow_token(flags, &token).unwrap();
        twice.allow_token(flags, &token).unwrap();
        twice.allow_token(flags, &token).unwrap();

        prop_assert_eq!(once.header_value(), twice.header_value());
    }

    #[test]
    fn render_parse_round_trip(ops in prop::collection::vec(arb_op(), 0..16)) {
        let mut csp = ContentSecurityPolicy::new();
        for op in &ops {
            match op {
                Op::Allow(flags, token) => { csp.allow_token(*flags, token).unwrap(); }
                Op::Block(flags) => { csp.disallow_directive(*flags).unwrap(); }
            }
        }

        let parsed = ContentSecurityPolicy::parse(&csp.header_value());
        prop_assert_eq!(snapshot(&parsed), snapshot(&csp));
        prop_assert_eq!(parsed.header_value(), csp.header_value());
    }

    #[test]
    fn disallow_directive_renders_none(ops in prop::collection::vec(arb_op(), 0..8), flags in arb_flags()) {
        let mut csp = ContentSecurityPolicy::new();
        for op in &ops {
            if let Op::Allow(f, t) = op {
                csp.allow_token(*f, t).unwrap();
            }
        }
        csp.disallow_directive(flags).unwrap();

        let header = csp.header_value();
        for directive in flags.directives() {
            let section = format!("{} 'none'", directive.name());
            prop_assert!(header.split("; ").any(|s| s == section));
        }
    }

    #[test]
    fn parse_never_panics(input in "\\PC{0,200}") {
        let csp = ContentSecurityPolicy::parse(&input);
        let _ = csp.header_value();
    }
}
