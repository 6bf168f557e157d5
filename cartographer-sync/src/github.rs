//! GitHub REST implementation of [`HostingApi`] over blocking `ureq`.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use cartographer_core::{RepoLocator, Token};

use crate::error::HostingError;
use crate::hosting::{
    BranchRef, Commit, HostingApi, NewCommit, NewPullRequest, PullRequest, TreeEntry,
};

const USER_AGENT: &str = concat!("cartographer/", env!("CARGO_PKG_VERSION"));
const PER_PAGE: usize = 100;

/// Explicitly constructed GitHub client; pass it to every operation.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    agent: ureq::Agent,
    base_url: String,
    token: Token,
}

#[derive(Deserialize)]
struct RefBody {
    #[serde(rename = "ref")]
    name: String,
    object: ShaBody,
}

#[derive(Deserialize)]
struct ShaBody {
    sha: String,
}

#[derive(Deserialize)]
struct CommitBody {
    sha: String,
    tree: ShaBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl GitHubClient {
    pub fn new(base_url: impl Into<String>, token: Token) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    fn repo_url(&self, repo: &RepoLocator, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.base_url,
            repo.owner(),
            repo.repo(),
            path
        )
    }

    fn request(&self, method: &str, url: &str) -> ureq::Request {
        self.agent
            .request(method, url)
            .set("Authorization", &format!("Bearer {}", self.token.as_str()))
            .set("Accept", "application/vnd.github+json")
            .set("X-GitHub-Api-Version", "2022-11-28")
    }

    fn send<T: DeserializeOwned>(
        &self,
        request: ureq::Request,
        body: Option<Value>,
    ) -> Result<T, HostingError> {
        let method = request.method().to_string();
        let url = request.url().to_string();
        let result = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        };
        match result {
            Ok(response) => response
                .into_json::<T>()
                .map_err(|source| HostingError::Decode { url, source }),
            Err(ureq::Error::Status(status, response)) => {
                let message = response
                    .into_string()
                    .ok()
                    .and_then(|raw| serde_json::from_str::<ErrorBody>(&raw).ok())
                    .map(|body| body.message)
                    .unwrap_or_default();
                Err(HostingError::Status {
                    method,
                    url,
                    status,
                    message,
                })
            }
            Err(ureq::Error::Transport(transport)) => Err(HostingError::Transport {
                method,
                url,
                message: transport.to_string(),
            }),
        }
    }
}

fn branch_name(full_ref: &str) -> String {
    full_ref
        .strip_prefix("refs/heads/")
        .unwrap_or(full_ref)
        .to_string()
}

impl From<RefBody> for BranchRef {
    fn from(body: RefBody) -> Self {
        Self {
            name: branch_name(&body.name),
            sha: body.object.sha,
        }
    }
}

impl From<CommitBody> for Commit {
    fn from(body: CommitBody) -> Self {
        Self {
            sha: body.sha,
            tree_sha: body.tree.sha,
        }
    }
}

impl HostingApi for GitHubClient {
    fn get_branch(
        &self,
        repo: &RepoLocator,
        branch: &str,
    ) -> Result<Option<BranchRef>, HostingError> {
        let url = self.repo_url(repo, &format!("git/ref/heads/{branch}"));
        match self.send::<RefBody>(self.request("GET", &url), None) {
            Ok(body) => Ok(Some(body.into())),
            Err(HostingError::Status { status: 404, .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn create_branch(
        &self,
        repo: &RepoLocator,
        branch: &str,
        sha: &str,
    ) -> Result<BranchRef, HostingError> {
        let url = self.repo_url(repo, "git/refs");
        let body = json!({ "ref": format!("refs/heads/{branch}"), "sha": sha });
        self.send::<RefBody>(self.request("POST", &url), Some(body))
            .map(Into::into)
    }

    fn get_commit(&self, repo: &RepoLocator, sha: &str) -> Result<Commit, HostingError> {
        let url = self.repo_url(repo, &format!("git/commits/{sha}"));
        self.send::<CommitBody>(self.request("GET", &url), None)
            .map(Into::into)
    }

    fn create_tree(
        &self,
        repo: &RepoLocator,
        base_tree: &str,
        entries: &[TreeEntry],
    ) -> Result<String, HostingError> {
        let url = self.repo_url(repo, "git/trees");
        let tree: Vec<Value> = entries
            .iter()
            .map(|e| {
                json!({
                    "path": e.path,
                    "mode": e.mode,
                    "type": "blob",
                    "content": e.content,
                })
            })
            .collect();
        let body = json!({ "base_tree": base_tree, "tree": tree });
        self.send::<ShaBody>(self.request("POST", &url), Some(body))
            .map(|b| b.sha)
    }

    fn create_commit(
        &self,
        repo: &RepoLocator,
        commit: &NewCommit,
    ) -> Result<Commit, HostingError> {
        let url = self.repo_url(repo, "git/commits");
        let body = json!({
            "message": commit.message,
            "tree": commit.tree_sha,
            "parents": commit.parents,
            "author": {
                "name": commit.author.name,
                "email": commit.author.email,
                "date": commit.author.date.to_rfc3339(),
            },
        });
        self.send::<CommitBody>(self.request("POST", &url), Some(body))
            .map(Into::into)
    }

    fn update_branch(
        &self,
        repo: &RepoLocator,
        branch: &str,
        sha: &str,
        force: bool,
    ) -> Result<BranchRef, HostingError> {
        let url = self.repo_url(repo, &format!("git/refs/heads/{branch}"));
        let body = json!({ "sha": sha, "force": force });
        self.send::<RefBody>(self.request("PATCH", &url), Some(body))
            .map(Into::into)
    }

    fn list_open_pull_requests(
        &self,
        repo: &RepoLocator,
    ) -> Result<Vec<PullRequest>, HostingError> {
        let url = self.repo_url(repo, "pulls");
        let mut pulls = Vec::new();
        for page in 1.. {
            let request = self
                .request("GET", &url)
                .query("state", "open")
                .query("per_page", &PER_PAGE.to_string())
                .query("page", &page.to_string());
            let batch: Vec<PullRequestBody> = self.send(request, None)?;
            let done = batch.len() < PER_PAGE;
            pulls.extend(batch.into_iter().map(Into::into));
            if done {
                break;
            }
        }
        Ok(pulls)
    }

    fn create_pull_request(
        &self,
        repo: &RepoLocator,
        pull: &NewPullRequest,
    ) -> Result<PullRequest, HostingError> {
        let url = self.repo_url(repo, "pulls");
        let body = json!({
            "title": pull.title,
            "head": pull.head,
            "base": pull.base,
            "body": pull.body,
            "maintainer_can_modify": pull.maintainer_can_modify,
        });
        self.send::<PullRequestBody>(self.request("POST", &url), Some(body))
            .map(Into::into)
    }
}

#[derive(Deserialize)]
struct PullRequestBody {
    number: u64,
    title: String,
    #[serde(default)]
    html_url: String,
}

impl From<PullRequestBody> for PullRequest {
    fn from(body: PullRequestBody) -> Self {
        Self {
            number: body.number,
            title: body.title,
            html_url: body.html_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve canned `(status, body)` responses, one per connection, and
    /// return the request lines that were received.
    fn serve(responses: Vec<(u16, &'static str)>) -> (String, thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let base = format!("http://{}", listener.local_addr().expect("addr"));
        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            for (status, body) in responses {
                let (stream, _) = listener.accept().expect("accept");
                let mut reader = BufReader::new(stream);
                let mut request_line = String::new();
                reader.read_line(&mut request_line).expect("request line");
                let mut content_length = 0usize;
                loop {
                    let mut header = String::new();
                    reader.read_line(&mut header).expect("header");
                    if header.trim().is_empty() {
                        break;
                    }
                    let lower = header.to_ascii_lowercase();
                    if let Some(value) = lower.strip_prefix("content-length:") {
                        content_length = value.trim().parse().unwrap_or(0);
                    }
                }
                let mut payload = vec![0u8; content_length];
                reader.read_exact(&mut payload).expect("body");
                seen.push(format!(
                    "{} {}",
                    request_line.trim(),
                    String::from_utf8_lossy(&payload)
                ));

                let mut stream = reader.into_inner();
                let response = format!(
                    "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).expect("write");
            }
            seen
        });
        (base, handle)
    }

    fn repo() -> RepoLocator {
        RepoLocator::new("acme", "billing")
    }

    #[test]
    fn missing_branch_is_none() {
        let (base, server) = serve(vec![(404, r#"{"message":"Not Found"}"#)]);
        let client = GitHubClient::new(base, Token::new("t"));
        let branch = client
            .get_branch(&repo(), "cartographer/platform/abc1234")
            .expect("404 is not an error");
        assert!(branch.is_none());
        let seen = server.join().expect("server");
        assert!(seen[0].starts_with(
            "GET /repos/acme/billing/git/ref/heads/cartographer/platform/abc1234"
        ));
    }

    #[test]
    fn existing_branch_strips_refs_prefix() {
        let (base, server) = serve(vec![(
            200,
            r#"{"ref":"refs/heads/main","object":{"sha":"c0ffee","type":"commit"}}"#,
        )]);
        let client = GitHubClient::new(base, Token::new("t"));
        let branch = client.get_branch(&repo(), "main").expect("get").expect("some");
        assert_eq!(
            branch,
            BranchRef {
                name: "main".into(),
                sha: "c0ffee".into()
            }
        );
        server.join().expect("server");
    }

    #[test]
    fn error_status_carries_api_message() {
        let (base, server) = serve(vec![(
            422,
            r#"{"message":"Update is not a fast forward"}"#,
        )]);
        let client = GitHubClient::new(base, Token::new("t"));
        let err = client
            .update_branch(&repo(), "cartographer/x/1234567", "beef", false)
            .unwrap_err();
        assert!(matches!(err, HostingError::Status { status: 422, .. }));
        assert!(err.to_string().contains("not a fast forward"));
        let seen = server.join().expect("server");
        assert!(seen[0].starts_with("PATCH /repos/acme/billing/git/refs/heads/cartographer/x/1234567"));
        assert!(seen[0].contains(r#""force":false"#));
    }

    #[test]
    fn create_pull_request_allows_maintainer_edits() {
        let (base, server) = serve(vec![(
            201,
            r#"{"number":7,"title":"t","html_url":"https://github.com/acme/billing/pull/7"}"#,
        )]);
        let client = GitHubClient::new(base, Token::new("t"));
        let pr = client
            .create_pull_request(
                &repo(),
                &NewPullRequest {
                    title: "t".into(),
                    head: "cartographer/x/1234567".into(),
                    base: "main".into(),
                    body: "b".into(),
                    maintainer_can_modify: true,
                },
            )
            .expect("create");
        assert_eq!(pr.number, 7);
        let seen = server.join().expect("server");
        assert!(seen[0].contains(r#""maintainer_can_modify":true"#));
    }
}
