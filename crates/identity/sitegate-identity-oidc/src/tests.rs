//! Integration tests for session verification and code exchange.

#[cfg(test)]
mod integration_tests {
    use crate::{CodeExchanger, JwksSessionVerifier, OidcClient, OidcConfig, SessionVerifier};
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const POOL_ID: &str = "eu-west-1_TestPool";
    const REGION: &str = "eu-west-1";
    const CLIENT_ID: &str = "client-1";
    const CLIENT_SECRET: &str = "secret-1";
    const KEY_ID: &str = "test-key";

    const SIGNING_KEY: &[u8] = include_bytes!("../tests/fixtures/signing_key.pem");
    const ROGUE_KEY: &[u8] = include_bytes!("../tests/fixtures/rogue_key.pem");
    const SIGNING_KEY_N: &str = "6vJ5sRi9I-SKHywihY1-La6G2tXN9N-dgOw-jAafu-oTQaTwvXMPxz2g15Ya4-3xUUJLfrpz0KJ4helQf5f7hGTajZin1HrzYnbn07p8FcFz9l1Pkc2WL9951B6josmDoo8ihsHoHwz_-LFLzkrkt-Q0uXcJFG4h5CLXdAQJVJG-0aBEKTgQHiaCsbke9EgWUK9yOoUG1TxXVSwt2IhMyIUNwvtKadiwpTI_0z6_zKtu5J6s9PsxcdYC2lHI2R-Ld665YKViZARE4o-pgy4EkM-iJNPP14Wf9nD0lxakbmSa9_tkCNO0MFIPOkV0h6NS6CEZXaj86SWF6sJcD8Ougw";

    fn jwks_body() -> serde_json::Value {
        json!({
            "keys": [{
                "kty": "RSA",
                "kid": KEY_ID,
                "use": "sig",
                "alg": "RS256",
                "n": SIGNING_KEY_N,
                "e": "AQAB"
            }]
        })
    }

    fn jwks_path() -> String {
        format!("/{POOL_ID}/.well-known/jwks.json")
    }

    fn issuer(server: &MockServer) -> String {
        format!("{}/{POOL_ID}", server.uri())
    }

    fn config_for(server: &MockServer) -> OidcConfig {
        OidcConfig::new()
            .with_issuer_url_template(format!("{}/{{pool_id}}", server.uri()))
            .with_http_timeout(2)
    }

    fn mint(key: &[u8], kid: Option<&str>, claims: serde_json::Value) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = kid.map(str::to_string);
        encode(&header, &claims, &EncodingKey::from_rsa_pem(key).unwrap()).unwrap()
    }

    fn claims(iss: &str, aud: &str, exp_offset: i64) -> serde_json::Value {
        json!({
            "sub": "user-1",
            "email": "user@example.com",
            "token_use": "id",
            "iss": iss,
            "aud": aud,
            "exp": chrono::Utc::now().timestamp() + exp_offset,
        })
    }

    async fn server_with_jwks() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(jwks_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body()))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_valid_token_is_accepted() {
        let server = server_with_jwks().await;
        let verifier = JwksSessionVerifier::new(&config_for(&server)).unwrap();
        let token = mint(
            SIGNING_KEY,
            Some(KEY_ID),
            claims(&issuer(&server), CLIENT_ID, 3600),
        );

        let claims = verifier
            .validate(&token, POOL_ID, REGION, CLIENT_ID)
            .await
            .unwrap();
        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email.as_deref(), Some("user@example.com"));
        assert!(verifier.verify(&token, POOL_ID, REGION, CLIENT_ID).await);
    }

    #[tokio::test]
    async fn test_invalid_tokens_are_rejected() {
        let server = server_with_jwks().await;
        let verifier = JwksSessionVerifier::new(&config_for(&server)).unwrap();
        let iss = issuer(&server);

        let cases = [
            (
                "expired",
                mint(SIGNING_KEY, Some(KEY_ID), claims(&iss, CLIENT_ID, -3600)),
            ),
            (
                "wrong audience",
                mint(SIGNING_KEY, Some(KEY_ID), claims(&iss, "other-client", 3600)),
            ),
            (
                "wrong issuer",
                mint(
                    SIGNING_KEY,
                    Some(KEY_ID),
                    claims("https://issuer.invalid/pool", CLIENT_ID, 3600),
                ),
            ),
            (
                "foreign signature",
                mint(ROGUE_KEY, Some(KEY_ID), claims(&iss, CLIENT_ID, 3600)),
            ),
            (
                "unknown key id",
                mint(SIGNING_KEY, Some("rotated"), claims(&iss, CLIENT_ID, 3600)),
            ),
            (
                "missing key id",
                mint(SIGNING_KEY, None, claims(&iss, CLIENT_ID, 3600)),
            ),
            ("garbage", "not.a.jwt".to_string()),
            ("empty", String::new()),
        ];

        for (name, token) in cases {
            assert!(
                !verifier.verify(&token, POOL_ID, REGION, CLIENT_ID).await,
                "{name} token should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_symmetric_token_is_rejected() {
        let server = server_with_jwks().await;
        let verifier = JwksSessionVerifier::new(&config_for(&server)).unwrap();

        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(KEY_ID.to_string());
        let token = encode(
            &header,
            &claims(&issuer(&server), CLIENT_ID, 3600),
            &EncodingKey::from_secret(b"shared"),
        )
        .unwrap();

        assert!(!verifier.verify(&token, POOL_ID, REGION, CLIENT_ID).await);
    }

    #[tokio::test]
    async fn test_key_set_fetched_once_per_issuer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(jwks_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body()))
            .expect(1)
            .mount(&server)
            .await;

        let verifier = JwksSessionVerifier::new(&config_for(&server)).unwrap();
        let token = mint(
            SIGNING_KEY,
            Some(KEY_ID),
            claims(&issuer(&server), CLIENT_ID, 3600),
        );

        for _ in 0..3 {
            assert!(verifier.verify(&token, POOL_ID, REGION, CLIENT_ID).await);
        }
        assert_eq!(verifier.cached_issuers(), 1);
    }

    #[tokio::test]
    async fn test_key_set_failure_is_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(jwks_path()))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(jwks_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body()))
            .mount(&server)
            .await;

        let verifier = JwksSessionVerifier::new(&config_for(&server)).unwrap();
        let token = mint(
            SIGNING_KEY,
            Some(KEY_ID),
            claims(&issuer(&server), CLIENT_ID, 3600),
        );

        assert!(!verifier.verify(&token, POOL_ID, REGION, CLIENT_ID).await);
        assert_eq!(verifier.cached_issuers(), 0);
        assert!(verifier.verify(&token, POOL_ID, REGION, CLIENT_ID).await);
        assert_eq!(verifier.cached_issuers(), 1);
    }

    #[tokio::test]
    async fn test_code_exchange_success() {
        let server = MockServer::start().await;
        let basic = format!(
            "Basic {}",
            STANDARD.encode(format!("{CLIENT_ID}:{CLIENT_SECRET}"))
        );

        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .and(header("authorization", basic.as_str()))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=auth-code-1"))
            .and(body_string_contains("client_id=client-1"))
            .and(body_string_contains(
                "redirect_uri=https%3A%2F%2Fexample.com%2F_callback",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id_token": "id-token-1",
                "access_token": "access-token-1",
                "refresh_token": "refresh-token-1",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OidcClient::new(&config_for(&server)).unwrap();
        let tokens = client
            .exchange_code(
                "auth-code-1",
                "https://example.com/_callback",
                &server.uri(),
                CLIENT_ID,
                CLIENT_SECRET,
            )
            .await
            .unwrap();

        assert_eq!(tokens.id_token, "id-token-1");
        assert_eq!(tokens.access_token, "access-token-1");
        assert_eq!(tokens.refresh_token.as_deref(), Some("refresh-token-1"));
    }

    #[tokio::test]
    async fn test_code_exchange_failures_yield_none() {
        let responses = [
            (
                "rejected code",
                ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})),
            ),
            (
                "unparseable body",
                ResponseTemplate::new(200).set_body_string("<html>oops</html>"),
            ),
            (
                "missing id_token",
                ResponseTemplate::new(200).set_body_json(json!({
                    "access_token": "access-token-1",
                    "token_type": "Bearer"
                })),
            ),
        ];

        for (name, response) in responses {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/oauth2/token"))
                .respond_with(response)
                .mount(&server)
                .await;

            let client = OidcClient::new(&config_for(&server)).unwrap();
            let tokens = client
                .exchange_code(
                    "bad-code",
                    "https://example.com/_callback",
                    &server.uri(),
                    CLIENT_ID,
                    CLIENT_SECRET,
                )
                .await;

            assert!(tokens.is_none(), "{name} should yield no tokens");
        }
    }

    #[tokio::test]
    async fn test_code_exchange_unreachable_provider() {
        let client = OidcClient::new(&OidcConfig::new().with_http_timeout(1)).unwrap();
        let tokens = client
            .exchange_code(
                "code",
                "https://example.com/_callback",
                "http://127.0.0.1:1",
                CLIENT_ID,
                CLIENT_SECRET,
            )
            .await;

        assert!(tokens.is_none());
    }
}
