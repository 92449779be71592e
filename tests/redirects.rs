//! End-to-end redirect behaviour through a live gateway.

use std::time::Duration;

use reqwest::{header, StatusCode};

mod common;

#[tokio::test]
async fn test_matching_request_reaches_upstream() {
    let upstream = common::start_echo_backend().await;
    let gateway = common::start_gateway(upstream, |_, _| {}).await;

    let res = common::client().get(gateway.url("/welcome/?ref=home")).send().await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get(header::CACHE_CONTROL).is_none());
    assert!(res.headers().contains_key("x-request-id"));
    assert_eq!(res.text().await.unwrap(), "GET /welcome/?ref=home HTTP/1.1");

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn test_https_site_upgrades_plain_requests() {
    let upstream = common::start_echo_backend().await;
    let gateway = common::start_gateway(upstream, |config, addr| {
        config.site.url = format!("https://{}", addr);
    })
    .await;
    let client = common::client();

    let res = client.get(gateway.url("/post?x=1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        res.headers()[header::LOCATION],
        format!("https://{}/post/?x=1", gateway.addr).as_str()
    );
    assert_eq!(res.headers()[header::CACHE_CONTROL], "private, max-age=60");

    // Behind a TLS-terminating proxy the same request is served.
    let res = client
        .get(gateway.url("/post?x=1"))
        .header("X-Forwarded-Proto", "https")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "GET /post?x=1 HTTP/1.1");

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn test_admin_area_moves_to_admin_origin() {
    let upstream = common::start_echo_backend().await;
    let gateway = common::start_gateway(upstream, |config, addr| {
        config.site.admin.url = Some(format!("https://admin.localhost:{}", addr.port()));
    })
    .await;
    let client = common::client();

    let res = client.get(gateway.url("/reborn/editor?id=7")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        res.headers()[header::LOCATION],
        format!("https://admin.localhost:{}/reborn/editor/?id=7", gateway.addr.port()).as_str()
    );

    // Public pages stay on the blog origin.
    let res = client.get(gateway.url("/about/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn test_legacy_aliases() {
    let upstream = common::start_echo_backend().await;
    let gateway = common::start_gateway(upstream, |_, _| {}).await;
    let client = common::client();

    for (path, location) in [
        ("/logout/", "/reborn/#/signout/"),
        ("/signout/", "/reborn/#/signout/"),
        ("/signup/", "/reborn/#/signup/"),
        ("/signin/", "/reborn/"),
        ("/admin/", "/reborn/"),
        ("/REBORN/", "/reborn/"),
    ] {
        let res = client.get(gateway.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY, "{path}");
        assert_eq!(res.headers()[header::LOCATION], location, "{path}");
        assert_eq!(res.headers()[header::CACHE_CONTROL], "public, max-age=31536000", "{path}");
    }

    let res = client.get(gateway.url("/reborn/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn test_reload_applies_to_next_request() {
    let upstream = common::start_echo_backend().await;
    let gateway = common::start_gateway(upstream, |_, _| {}).await;
    let client = common::client();

    let res = client.get(gateway.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let mut reloaded = redirect_gateway::GatewayConfig::default();
    reloaded.listener.bind_address = gateway.addr.to_string();
    reloaded.upstream.address = upstream.to_string();
    reloaded.site.url = format!("https://{}", gateway.addr);
    gateway.config_updates.send(reloaded).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let res = client.get(gateway.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::MOVED_PERMANENTLY);
    assert_eq!(
        res.headers()[header::LOCATION],
        format!("https://{}/", gateway.addr).as_str()
    );

    gateway.shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_upstream_is_bad_gateway() {
    let upstream = common::closed_port().await;
    let gateway = common::start_gateway(upstream, |_, _| {}).await;

    let res = common::client().get(gateway.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

    gateway.shutdown.trigger();
}
