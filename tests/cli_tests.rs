use clap::Parser;
use jina_tools::Config;
use jina_tools::cli::{Cli, Command, ReadArgs, SearchArgs, run, run_read, run_search};
use serde_json::{Value, json};
use wiremock::matchers::{header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(server: &MockServer) -> Config {
    Config {
        api_token: "env-token".to_string(),
        reader_url: format!("{}/", server.uri()),
        search_url: format!("{}/", server.uri()),
        ..Config::default()
    }
}

fn read_args(url: &str) -> ReadArgs {
    ReadArgs {
        url: url.to_string(),
        token: None,
        extract_links: false,
        output: None,
        timeout: None,
    }
}

fn search_args(query: &str) -> SearchArgs {
    SearchArgs {
        query: query.to_string(),
        max_results: 10,
        token: None,
        site: None,
        site_search: false,
        json: false,
        page: 1,
    }
}

mod parsing {
    use super::*;

    #[test]
    fn test_parse_read() {
        let cli = Cli::try_parse_from([
            "jina", "read", "https://a.com", "-l", "-o", "out.md", "--timeout", "5", "-d",
        ])
        .unwrap();
        assert!(cli.debug);
        let Command::Read(args) = cli.command else {
            panic!("expected read command");
        };
        assert_eq!(args.url, "https://a.com");
        assert!(args.extract_links);
        assert_eq!(args.output.unwrap().to_str(), Some("out.md"));
        assert_eq!(args.timeout, Some(5));
        assert_eq!(args.token, None);
    }

    #[test]
    fn test_parse_search_defaults() {
        let cli = Cli::try_parse_from(["jina", "search", "rust"]).unwrap();
        assert!(!cli.debug);
        let Command::Search(args) = cli.command else {
            panic!("expected search command");
        };
        assert_eq!(args.query, "rust");
        assert_eq!(args.max_results, 10);
        assert_eq!(args.page, 1);
        assert!(!args.json);
        assert!(!args.site_search);
        assert_eq!(args.site, None);
    }

    #[test]
    fn test_parse_search_flags() {
        let cli = Cli::try_parse_from([
            "jina", "search", "rust", "-n", "3", "-t", "tok", "-s", "docs.rs", "--site-search",
            "-j", "-p", "2",
        ])
        .unwrap();
        let Command::Search(args) = cli.command else {
            panic!("expected search command");
        };
        assert_eq!(args.max_results, 3);
        assert_eq!(args.token.as_deref(), Some("tok"));
        assert_eq!(args.site.as_deref(), Some("docs.rs"));
        assert!(args.site_search);
        assert!(args.json);
        assert_eq!(args.page, 2);
    }

    #[test]
    fn test_missing_argument_rejected() {
        assert!(Cli::try_parse_from(["jina", "read"]).is_err());
        assert!(Cli::try_parse_from(["jina", "search"]).is_err());
    }
}

#[tokio::test]
async fn test_read_prints_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("Authorization", "Bearer env-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("# Hello\nworld"))
        .mount(&server)
        .await;

    let mut out = Vec::new();
    run_read(&read_args("https://a.com"), test_config(&server), &mut out)
        .await
        .unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "# Hello\nworld\n");
}

#[tokio::test]
async fn test_read_token_flag_overrides_config() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("Authorization", "Bearer cli-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let mut args = read_args("https://a.com");
    args.token = Some("cli-token".to_string());
    let mut out = Vec::new();
    run_read(&args, test_config(&server), &mut out).await.unwrap();
}

#[tokio::test]
async fn test_read_writes_output_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("saved content"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("page.md");
    let mut args = read_args("https://a.com");
    args.output = Some(path.clone());

    let mut out = Vec::new();
    run_read(&args, test_config(&server), &mut out).await.unwrap();

    assert!(out.is_empty());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "saved content");
}

#[tokio::test]
async fn test_read_failure_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("page.md");
    let mut args = read_args("https://a.com/missing");
    args.output = Some(path.clone());

    let mut out = Vec::new();
    let err = run_read(&args, test_config(&server), &mut out)
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("Unable to read web page: https://a.com/missing"));
    assert!(out.is_empty());
    assert!(!path.exists());
}

#[tokio::test]
async fn test_search_human_output() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"url": "https://a.com", "title": "A", "description": "first", "site": "a.com"},
                {"url": "https://b.com", "title": "B", "description": "second"}
            ]
        })))
        .mount(&server)
        .await;

    let mut out = Vec::new();
    run_search(&search_args("letters"), test_config(&server), &mut out)
        .await
        .unwrap();
    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("--- Result 1 ---\nURL: https://a.com\nTitle: A\nSnippet: first\nSite: a.com"));
    assert!(out.contains("--- Result 2 ---\nURL: https://b.com"));
    assert!(out.ends_with("Total results: 2\n"));
}

#[tokio::test]
async fn test_search_json_output() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"url": "u1", "title": "t1", "description": "d1"}]
        })))
        .mount(&server)
        .await;

    let mut args = search_args("rust");
    args.json = true;
    let mut out = Vec::new();
    run_search(&args, test_config(&server), &mut out)
        .await
        .unwrap();

    let value: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(
        value,
        json!({
            "query": "rust",
            "results": [
                {"url": "u1", "title": "t1", "snippet": "d1", "position": 1, "site": ""}
            ]
        })
    );
}

#[tokio::test]
async fn test_search_upstream_failure_is_not_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut out = Vec::new();
    run_search(&search_args("rust"), test_config(&server), &mut out)
        .await
        .unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "No search results found\n");
}

#[tokio::test]
async fn test_search_setup_failure_prints_fallback_link() {
    let server = MockServer::start().await;

    let mut args = search_args("rust lang");
    args.site = Some("bad\nsite".to_string());
    let mut out = Vec::new();
    let result = run_search(&args, test_config(&server), &mut out).await;

    assert!(result.is_err());
    let out = String::from_utf8(out).unwrap();
    assert!(out.starts_with("Search failed: "));
    assert!(out.contains("You can directly use the following link to search:"));
    assert!(out.contains(&format!("{}/?q=rust+lang", server.uri())));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_run_dispatches_subcommand() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .mount(&server)
        .await;

    let cli = Cli::try_parse_from(["jina", "search", "nothing"]).unwrap();
    assert_eq!(cli.command.cancel_message(), "Search cancelled");

    let mut out = Vec::new();
    run(&cli.command, test_config(&server), &mut out).await.unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "No search results found\n");
}
