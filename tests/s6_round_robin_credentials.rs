use gateway_core::load_balancer::LoadBalancer;
use gateway_core::model::{CredentialSource, ProviderCredential};
use gateway_core::rate_limit::RateLimitTracker;

fn credential(id: &str, provider_type: &str) -> ProviderCredential {
    ProviderCredential {
        id: id.to_string(),
        provider_type: provider_type.to_string(),
        api_key: "key".to_string(),
        api_endpoint: None,
        model_name: None,
        priority: 100,
        source: CredentialSource::User,
    }
}

#[test]
fn s6_round_robin_then_excludes_rate_limited_credential() {
    let lb = LoadBalancer::new();
    let providers = vec![
        credential("c1", "groq-free"),
        credential("c2", "groq-free"),
        credential("c3", "groq-free"),
    ];

    let mut picks = Vec::new();
    for _ in 0..6 {
        let chosen = lb.distribute(&providers, "m", None, None).unwrap();
        picks.push(chosen.id.clone());
    }
    assert_eq!(picks, vec!["c1", "c2", "c3", "c1", "c2", "c3"]);

    let tracker = RateLimitTracker::new();
    tracker.update_from_429("c2", "m", Some(60));

    for _ in 0..3 {
        let chosen = lb.distribute(&providers, "m", None, Some(&tracker)).unwrap();
        assert_ne!(chosen.id, "c2");
    }
}
