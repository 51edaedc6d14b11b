//! Router-level tests for the landing page, repository listing and status page,
//! with upstream Jenkins and GitHub played by wiremock.

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
    response::Response,
};
use lanky::{AppState, GithubConfig, JenkinsConfig, LankyConfig, SharedState, api};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TRAY_FEED: &str = r#"<Projects>
<Project webUrl="http://ci.local/job/api/" name="api" lastBuildLabel="41" lastBuildTime="2015-04-01T18:48:00Z" lastBuildStatus="Failure" activity="Sleeping"/>
<Project webUrl="http://ci.local/job/web/" name="web" lastBuildLabel="7" lastBuildTime="2015-05-29T03:23:00Z" lastBuildStatus="Success" activity="Building"/>
<Project webUrl="http://ci.local/job/old/" name="old" lastBuildLabel="3" lastBuildTime="2010-11-21T16:03:50Z" lastBuildStatus="Unknown" activity="Sleeping"/>
</Projects>"#;

fn jenkins_at(base_url: &str) -> JenkinsConfig {
    JenkinsConfig {
        base_url: base_url.to_string(),
        tray_feed: "/cc.xml".to_string(),
    }
}

fn github_at(api_url: &str) -> GithubConfig {
    GithubConfig {
        token: "t0ken".to_string(),
        organization: "hailocab".to_string(),
        api_url: Some(api_url.to_string()),
        page_size: Some(2),
        ..GithubConfig::default()
    }
}

fn state(config: LankyConfig) -> SharedState {
    Arc::new(AppState::from_config(config).unwrap())
}

async fn get(app: Router, uri: &str) -> Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn jenkins_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cc.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(TRAY_FEED))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn landing_page_sorts_by_status_by_default() {
    let server = jenkins_server().await;
    let app = api::router(state(LankyConfig {
        jenkins: Some(jenkins_at(&server.uri())),
        ..LankyConfig::default()
    }));

    let response = get(app, "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Last 3 builds sorted by: <a href=\"?by=date\">date</a>, status"));
    let api = html.find("api (#41)").unwrap();
    let web = html.find("web (#7)").unwrap();
    let old = html.find("old (#3)").unwrap();
    assert!(api < web && web < old);
}

#[tokio::test]
async fn landing_page_sorts_by_date_on_request() {
    let server = jenkins_server().await;
    let app = api::router(state(LankyConfig {
        jenkins: Some(jenkins_at(&server.uri())),
        ..LankyConfig::default()
    }));

    let html = body_text(get(app, "/?by=date").await).await;
    assert!(html.contains("date, <a href=\"?by=status\">status</a>"));
    assert!(html.contains("href=\"http:&#x2F;&#x2F;ci.local&#x2F;job&#x2F;web&#x2F;7&#x2F;console\""));
    let web = html.find("web (#7)").unwrap();
    let api = html.find("api (#41)").unwrap();
    let old = html.find("old (#3)").unwrap();
    assert!(web < api && api < old);
}

#[tokio::test]
async fn landing_page_unknown_order_falls_back_to_status() {
    let server = jenkins_server().await;
    let app = api::router(state(LankyConfig {
        jenkins: Some(jenkins_at(&server.uri())),
        ..LankyConfig::default()
    }));

    let html = body_text(get(app, "/?by=boogie").await).await;
    assert!(html.contains("<a href=\"?by=date\">date</a>, status"));
}

#[tokio::test]
async fn landing_page_without_jenkins_is_a_configuration_error() {
    let response = get(api::router(state(LankyConfig::default())), "/").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response).await.starts_with("Configuration error"));
}

#[tokio::test]
async fn landing_page_with_unreachable_jenkins_reports_url() {
    let app = api::router(state(LankyConfig {
        client_timeout_secs: Some(1),
        jenkins: Some(jenkins_at("http://127.0.0.1:1")),
        ..LankyConfig::default()
    }));
    let response = get(app, "/").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let text = body_text(response).await;
    assert!(text.contains("http://127.0.0.1:1/cc.xml"));
    assert!(text.contains("with a timeout of 1s"));
}

#[tokio::test]
async fn landing_page_with_truncated_feed_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cc.xml"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(&TRAY_FEED[..TRAY_FEED.len() - 4]),
        )
        .mount(&server)
        .await;
    let app = api::router(state(LankyConfig {
        jenkins: Some(jenkins_at(&server.uri())),
        ..LankyConfig::default()
    }));

    let response = get(app, "/").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        body_text(response)
            .await
            .ends_with(&format!("from {}/cc.xml", server.uri()))
    );
}

#[tokio::test]
async fn landing_page_with_foreign_document_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cc.xml"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body><p>Login</p></body></html>"),
        )
        .mount(&server)
        .await;
    let app = api::router(state(LankyConfig {
        jenkins: Some(jenkins_at(&server.uri())),
        ..LankyConfig::default()
    }));

    let response = get(app, "/").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let text = body_text(response).await;
    assert!(!text.contains("builds sorted by"));
    assert!(text.ends_with(&format!("from {}/cc.xml", server.uri())));
}

#[tokio::test]
async fn repositories_refresh_follows_pages() {
    let server = MockServer::start().await;
    let second_page = format!("{}/organizations/560650/repos?per_page=2&page=2", server.uri());
    Mock::given(method("GET"))
        .and(path("/orgs/hailocab/repos"))
        .and(query_param("per_page", "2"))
        .and(header("authorization", "token t0ken"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header(
                    "Link",
                    format!(r#"<{}>; rel="next", <{}>; rel="last""#, second_page, second_page)
                        .as_str(),
                )
                .set_body_string(r#"[{"full_name": "hailocab/zookeeper"}, {"full_name": "hailocab/api"}]"#),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/organizations/560650/repos"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"[{"full_name": "hailocab/lanky"}]"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let shared = state(LankyConfig {
        github: Some(github_at(&server.uri())),
        ..LankyConfig::default()
    });

    let before = body_text(get(api::router(shared.clone()), "/repositories").await).await;
    assert!(before.contains("<p>0 repositories.</p>"));

    let response = get(api::router(shared.clone()), "/repositories?update=now").await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("<p>3 repositories.</p>"));
    let a = html.find("hailocab&#x2F;api").unwrap();
    let l = html.find("hailocab&#x2F;lanky").unwrap();
    let z = html.find("hailocab&#x2F;zookeeper").unwrap();
    assert!(a < l && l < z);

    // inside the refresh window: served from the published list, no upstream calls
    let again = body_text(get(api::router(shared), "/repositories?update=now").await).await;
    assert!(again.contains("<p>3 repositories.</p>"));
}

#[tokio::test]
async fn repositories_refresh_with_unreachable_api_is_a_fetch_error() {
    let app = api::router(state(LankyConfig {
        client_timeout_secs: Some(1),
        github: Some(github_at("http://127.0.0.1:1")),
        ..LankyConfig::default()
    }));
    let response = get(app, "/repositories?update=now").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_text(response).await.contains("127.0.0.1:1"));
}

#[tokio::test]
async fn repositories_without_github_is_a_configuration_error() {
    let response = get(api::router(state(LankyConfig::default())), "/repositories").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn repositories_rejects_post() {
    let app = api::router(state(LankyConfig::default()));
    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/repositories")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn stub_endpoints_are_not_implemented() {
    for uri in ["/_hubot", "/_builder"] {
        let response = get(api::router(state(LankyConfig::default())), uri).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Not implemented yet");
    }
}

#[tokio::test]
async fn unknown_path_is_not_found() {
    let response = get(api::router(state(LankyConfig::default())), "/nope").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_page_counts_other_requests_only() {
    let shared = state(LankyConfig::default());

    get(api::router(shared.clone()), "/nope").await;
    get(api::router(shared.clone()), "/_hubot").await;
    get(api::router(shared.clone()), "/status").await;

    assert_eq!(shared.stats.count(4), 1);
    assert_eq!(shared.stats.count(5), 1);
    assert_eq!(shared.stats.count(2), 0);

    let html = body_text(get(api::router(shared), "/status").await).await;
    assert!(html.contains("<tr><td>4XX</td><td class=number>1</td></tr>"));
    assert!(html.contains("<tr><td>5XX</td><td class=number>1</td></tr>"));
}
