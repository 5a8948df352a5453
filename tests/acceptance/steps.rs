use crate::DevloopWorld;
use axum::body::Body;
use axum::http::Request;
use cucumber::gherkin::Step;
use cucumber::{given, then, when};
use devloop::config::{Config, ConfigKey};
use devloop::github::client::GitHubClient;
use devloop::server::{self, AppState};
use httpmock::prelude::*;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const REPO_PATH: &str = "/repos/xaxkep/DevLoop";

fn github(world: &DevloopWorld) -> &'static MockServer {
    world
        .github
        .expect("`the GitHub API is available` must run before other GitHub steps")
}

fn split_labels(labels: &str) -> Vec<String> {
    labels
        .split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .collect()
}

fn issue_json(number: u64, body: &str, labels: &[String]) -> Value {
    json!({
        "number": number,
        "title": format!("Issue {number}"),
        "body": body,
        "state": "open",
        "labels": labels.iter().map(|name| json!({ "name": name })).collect::<Vec<_>>(),
    })
}

#[given("the GitHub API is available")]
async fn github_api_is_available(world: &mut DevloopWorld) {
    let server = MockServer::start_async().await;
    world.github = Some(Box::leak(Box::new(server)));
}

#[given("the service is configured with a GitHub token")]
async fn configured_with_token(world: &mut DevloopWorld) {
    world.env.insert(
        ConfigKey::GithubToken.as_str().to_string(),
        "test-token".to_string(),
    );
}

#[given("the service has no GitHub token")]
async fn configured_without_token(world: &mut DevloopWorld) {
    world.env.remove(ConfigKey::GithubToken.as_str());
}

#[given(regex = r#"^the service is configured with admin credentials "([^"]*)" / "([^"]*)"$"#)]
async fn configured_with_admin(world: &mut DevloopWorld, username: String, password: String) {
    world
        .env
        .insert(ConfigKey::AdminUsername.as_str().to_string(), username);
    world
        .env
        .insert(ConfigKey::AdminPassword.as_str().to_string(), password);
}

#[given(regex = r#"^the caller is authenticated as "([^"]*)"$"#)]
async fn caller_is_authenticated(world: &mut DevloopWorld, email: String) {
    world.request_headers.push((
        "Cf-Access-Authenticated-User-Email".to_string(),
        email,
    ));
}

#[given(regex = r#"^GitHub lists the issues '(.*)'$"#)]
async fn github_lists_issues(world: &mut DevloopWorld, issues: String) {
    let issues: Value = serde_json::from_str(&issues).expect("valid issue list JSON");
    let mock = github(world)
        .mock_async(|when, then| {
            when.method(GET).path(format!("{REPO_PATH}/issues"));
            then.status(200).json_body(issues.clone());
        })
        .await;
    world.mocks.insert("list issues".to_string(), mock);
}

#[given(regex = r#"^GitHub fails to list issues with status (\d+) and body "([^"]*)"$"#)]
async fn github_fails_to_list(world: &mut DevloopWorld, status: u16, body: String) {
    let mock = github(world)
        .mock_async(|when, then| {
            when.method(GET).path(format!("{REPO_PATH}/issues"));
            then.status(status).body(body.clone());
        })
        .await;
    world.mocks.insert("list issues".to_string(), mock);
}

#[given(regex = r#"^GitHub has issue (\d+) with labels "([^"]*)"$"#)]
async fn github_has_issue_with_labels(world: &mut DevloopWorld, number: u64, labels: String) {
    let issue = issue_json(number, "", &split_labels(&labels));
    let mock = github(world)
        .mock_async(|when, then| {
            when.method(GET).path(format!("{REPO_PATH}/issues/{number}"));
            then.status(200).json_body(issue.clone());
        })
        .await;
    world.mocks.insert(format!("get issue {number}"), mock);
}

#[given(regex = r#"^GitHub has issue (\d+) with body "([^"]*)" and labels "([^"]*)"$"#)]
async fn github_has_issue_with_body(
    world: &mut DevloopWorld,
    number: u64,
    body: String,
    labels: String,
) {
    let issue = issue_json(number, &body.replace("\\n", "\n"), &split_labels(&labels));
    let mock = github(world)
        .mock_async(|when, then| {
            when.method(GET).path(format!("{REPO_PATH}/issues/{number}"));
            then.status(200).json_body(issue.clone());
        })
        .await;
    world.mocks.insert(format!("get issue {number}"), mock);
}

#[given(regex = r#"^GitHub expects issue (\d+) to be updated with labels "([^"]*)"$"#)]
async fn github_expects_labels(world: &mut DevloopWorld, number: u64, labels: String) {
    let labels = split_labels(&labels);
    let response = issue_json(number, "", &labels);
    let mock = github(world)
        .mock_async(|when, then| {
            when.method(PATCH)
                .path(format!("{REPO_PATH}/issues/{number}"))
                .json_body(json!({ "labels": labels.clone() }));
            then.status(200).json_body(response.clone());
        })
        .await;
    world.mocks.insert(format!("update issue {number}"), mock);
}

#[given(regex = r#"^GitHub accepts new issues whose body contains "([^"]*)" as number (\d+)$"#)]
async fn github_accepts_new_issue(world: &mut DevloopWorld, fragment: String, number: u64) {
    let mock = github(world)
        .mock_async(|when, then| {
            when.method(POST)
                .path(format!("{REPO_PATH}/issues"))
                .body_includes(fragment.clone());
            then.status(201)
                .json_body(json!({ "number": number, "state": "open" }));
        })
        .await;
    world.mocks.insert("create issue".to_string(), mock);
}

#[given(regex = r#"^GitHub creates issue (\d+) from a body containing:$"#)]
async fn github_creates_issue_from_fragments(world: &mut DevloopWorld, number: u64, step: &Step) {
    let fragments: Vec<String> = step
        .table
        .as_ref()
        .expect("fragment table required")
        .rows
        .iter()
        .filter_map(|row| row.first().cloned())
        .collect();
    let mock = github(world)
        .mock_async(|when, then| {
            let mut when = when.method(POST).path(format!("{REPO_PATH}/issues"));
            for fragment in &fragments {
                when = when.body_includes(fragment.clone());
            }
            then.status(201)
                .json_body(json!({ "number": number, "state": "open" }));
        })
        .await;
    world.mocks.insert("create issue".to_string(), mock);
}

#[given(regex = r#"^GitHub fails to create issues with status (\d+) and body "([^"]*)"$"#)]
async fn github_fails_to_create(world: &mut DevloopWorld, status: u16, body: String) {
    let mock = github(world)
        .mock_async(|when, then| {
            when.method(POST).path(format!("{REPO_PATH}/issues"));
            then.status(status).body(body.clone());
        })
        .await;
    world.mocks.insert("create issue".to_string(), mock);
}

#[given(regex = r#"^GitHub closes issue (\d+)$"#)]
async fn github_closes_issue(world: &mut DevloopWorld, number: u64) {
    let mock = github(world)
        .mock_async(|when, then| {
            when.method(PATCH)
                .path(format!("{REPO_PATH}/issues/{number}"))
                .json_body(json!({ "state": "closed" }));
            then.status(200)
                .json_body(json!({ "number": number, "state": "closed" }));
        })
        .await;
    world.mocks.insert(format!("update issue {number}"), mock);
}

#[given(regex = r#"^GitHub accepts closing issue (\d+) with a note about #(\d+)$"#)]
async fn github_accepts_retirement(world: &mut DevloopWorld, number: u64, successor: u64) {
    let mock = github(world)
        .mock_async(|when, then| {
            when.method(PATCH)
                .path(format!("{REPO_PATH}/issues/{number}"))
                .body_includes(r#""state":"closed""#)
                .body_includes(format!("This issue was replaced by #{successor}"));
            then.status(200)
                .json_body(json!({ "number": number, "state": "closed" }));
        })
        .await;
    world.mocks.insert(format!("update issue {number}"), mock);
}

#[given(regex = r#"^GitHub fails to update issue (\d+) with status (\d+) and body "([^"]*)"$"#)]
async fn github_fails_to_update(world: &mut DevloopWorld, number: u64, status: u16, body: String) {
    let mock = github(world)
        .mock_async(|when, then| {
            when.method(PATCH).path(format!("{REPO_PATH}/issues/{number}"));
            then.status(status).body(body.clone());
        })
        .await;
    world.mocks.insert(format!("update issue {number}"), mock);
}

#[given(regex = r#"^GitHub accepts the upload of "([^"]*)"$"#)]
async fn github_accepts_upload(world: &mut DevloopWorld, path: String) {
    let mock = github(world)
        .mock_async(|when, then| {
            when.method(PUT)
                .path(format!("{REPO_PATH}/contents/{path}"))
                .body_includes(r#""message":"Upload screenshot""#);
            then.status(201)
                .json_body(json!({ "content": { "path": path.clone() } }));
        })
        .await;
    world.mocks.insert(format!("upload {path}"), mock);
}

#[given(regex = r#"^GitHub rejects the upload of "([^"]*)" with status (\d+) and body "([^"]*)"$"#)]
async fn github_rejects_upload(world: &mut DevloopWorld, path: String, status: u16, body: String) {
    let mock = github(world)
        .mock_async(|when, then| {
            when.method(PUT).path(format!("{REPO_PATH}/contents/{path}"));
            then.status(status).body(body.clone());
        })
        .await;
    world.mocks.insert(format!("upload {path}"), mock);
}

async fn send_request(world: &mut DevloopWorld, method: &str, path: &str, body: Option<String>) {
    let env = world.env.clone();
    let config = Config::from_lookup(|key| env.get(key).cloned());
    let client = GitHubClient::new(
        &github(world).base_url(),
        config.get(ConfigKey::GithubToken),
    )
    .expect("GitHub client");
    let app = server::router(Arc::new(AppState::new(config, Arc::new(client))));

    let mut builder = Request::builder().method(method).uri(path);
    for (name, value) in &world.request_headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body))
            .expect("valid request"),
        None => builder.body(Body::empty()).expect("valid request"),
    };

    let response = app.oneshot(request).await.expect("router is infallible");
    world.response_status = Some(response.status().as_u16());
    world.response_headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable response body");
    world.response_body = String::from_utf8_lossy(&bytes).into_owned();
}

#[when(regex = r#"^the client sends (\w+) "([^"]*)"$"#)]
async fn client_sends(world: &mut DevloopWorld, method: String, path: String) {
    send_request(world, &method, &path, None).await;
}

#[when(regex = r#"^the client sends (\w+) "([^"]*)" with '(.*)'$"#)]
async fn client_sends_with_body(world: &mut DevloopWorld, method: String, path: String, body: String) {
    send_request(world, &method, &path, Some(body)).await;
}

#[then(regex = r#"^the response status should be (\d+)$"#)]
async fn response_status_should_be(world: &mut DevloopWorld, expected: u16) {
    assert_eq!(
        world.response_status,
        Some(expected),
        "unexpected status, body was:\n---\n{}\n---",
        world.response_body
    );
}

#[then(regex = r#"^the response JSON should be '(.*)'$"#)]
async fn response_json_should_be(world: &mut DevloopWorld, expected: String) {
    let expected: Value = serde_json::from_str(&expected).expect("valid expected JSON");
    let actual: Value = serde_json::from_str(&world.response_body)
        .unwrap_or_else(|e| panic!("response is not JSON ({e}): {}", world.response_body));
    assert_eq!(actual, expected);
}

#[then(regex = r#"^the response JSON field "([^"]*)" should be (.+)$"#)]
async fn response_json_field_should_be(world: &mut DevloopWorld, field: String, expected: String) {
    let expected: Value = serde_json::from_str(&expected).expect("valid expected JSON value");
    let actual: Value = serde_json::from_str(&world.response_body)
        .unwrap_or_else(|e| panic!("response is not JSON ({e}): {}", world.response_body));
    assert_eq!(actual[field.as_str()], expected, "field {field} of {actual}");
}

#[then(regex = r#"^the response text should be "(.*)"$"#)]
async fn response_text_should_be(world: &mut DevloopWorld, expected: String) {
    assert_eq!(world.response_body, expected);
}

#[then(regex = r#"^the response header "([^"]*)" should be "([^"]*)"$"#)]
async fn response_header_should_be(world: &mut DevloopWorld, name: String, expected: String) {
    assert_eq!(
        world.response_headers.get(&name.to_ascii_lowercase()),
        Some(&expected),
        "headers were {:?}",
        world.response_headers
    );
}

#[then(regex = r#"^GitHub should have received (\d+) "([^"]*)" requests?$"#)]
async fn github_should_have_received(world: &mut DevloopWorld, count: usize, name: String) {
    world
        .mocks
        .get(&name)
        .unwrap_or_else(|| panic!("no GitHub mock named {name:?}"))
        .assert_calls_async(count)
        .await;
}
