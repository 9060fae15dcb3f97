//! Deployment smoke test: a fixed list of requests with expected status codes.

use std::time::Duration;

use futures::future::join_all;
use reqwest::Method;
use serde::Serialize;
use serde_json::json;

use crate::cli::utils::{endpoint, output_error, output_success};
use crate::cli::OutputFormat;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Probe {
    #[serde(serialize_with = "method_name")]
    pub method: Method,
    pub path: &'static str,
    pub authenticated: bool,
    pub expected: u16,
}

fn method_name<S: serde::Serializer>(method: &Method, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(method.as_str())
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub probe: Probe,
    /// None when the request itself failed
    pub actual: Option<u16>,
    pub passed: bool,
}

/// Probes for a deployment. With a token, protected routes must answer 200;
/// without one they must answer 401.
pub fn probes(with_token: bool) -> Vec<Probe> {
    let protected = if with_token { 200 } else { 401 };
    let probe = |method: Method, path, authenticated, expected| Probe {
        method,
        path,
        authenticated,
        expected,
    };

    vec![
        probe(Method::GET, "/health", false, 200),
        probe(Method::GET, "/", false, 200),
        probe(Method::GET, "/users", with_token, protected),
        probe(Method::GET, "/roles", with_token, protected),
        probe(Method::GET, "/auth/login", false, 405),
        probe(Method::GET, "/auth/register", false, 405),
    ]
}

/// Runs every probe concurrently; results keep the probe order
pub async fn run_probes(base_url: &str, token: Option<&str>) -> Vec<ProbeResult> {
    let client = reqwest::Client::new();

    let requests = probes(token.is_some()).into_iter().map(|probe| {
        let mut request = client
            .request(probe.method.clone(), endpoint(base_url, probe.path))
            .timeout(Duration::from_secs(10));
        if let (true, Some(token)) = (probe.authenticated, token) {
            request = request.bearer_auth(token);
        }

        async move {
            let actual = match request.send().await {
                Ok(response) => Some(response.status().as_u16()),
                Err(e) => {
                    tracing::warn!("{} {} failed: {}", probe.method, probe.path, e);
                    None
                }
            };
            ProbeResult {
                passed: actual == Some(probe.expected),
                probe,
                actual,
            }
        }
    });

    join_all(requests).await
}

pub async fn handle(base_url: &str, token: Option<&str>, output_format: OutputFormat) -> anyhow::Result<()> {
    let results = run_probes(base_url, token).await;
    let failed = results.iter().filter(|r| !r.passed).count();

    if let OutputFormat::Text = output_format {
        for result in &results {
            let actual = result.actual.map(|s| s.to_string()).unwrap_or_else(|| "no response".to_string());
            println!(
                "{} {:<6} {:<16} expected {} got {}",
                if result.passed { "✓" } else { "✗" },
                result.probe.method,
                result.probe.path,
                result.probe.expected,
                actual
            );
        }
    }

    let data = json!({ "base_url": base_url, "results": results });
    if failed == 0 {
        output_success(&output_format, &format!("All {} probes passed", results.len()), Some(data))
    } else {
        output_error(&output_format, &format!("{} of {} probes failed", failed, results.len()), Some(data))?;
        Err(anyhow::anyhow!("smoke test failed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_probes_expect_401_on_protected_routes() {
        let probes = probes(false);
        let users = probes.iter().find(|p| p.path == "/users").unwrap();
        assert_eq!(users.expected, 401);
        assert!(!users.authenticated);
    }

    #[test]
    fn token_probes_expect_200_on_protected_routes() {
        for probe in probes(true).iter().filter(|p| p.path == "/users" || p.path == "/roles") {
            assert_eq!(probe.expected, 200);
            assert!(probe.authenticated);
        }
    }

    #[test]
    fn login_and_register_reject_get() {
        let probes = probes(false);
        for path in ["/auth/login", "/auth/register"] {
            let probe = probes.iter().find(|p| p.path == path).unwrap();
            assert_eq!((probe.method.clone(), probe.expected), (Method::GET, 405));
        }
    }

    #[tokio::test]
    async fn unreachable_servers_fail_every_probe() {
        let port = portpicker::pick_unused_port().unwrap();
        let results = run_probes(&format!("http://127.0.0.1:{}", port), None).await;
        assert!(results.iter().all(|r| !r.passed && r.actual.is_none()));
    }
}
