use std::{
    net::{IpAddr, Ipv4Addr},
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::Utc;
use tokio::{net::TcpListener, sync::oneshot, task::JoinHandle};
use treehole::{
    app_state::AppState,
    assets::AssetStore,
    client::{render::EMPTY_PLACEHOLDER, state::AfterSubmit, Board, BoardClient},
    config::Config,
    payloads::NewMessage,
    server,
    storage::{MessageStore, SqliteStore},
};

const PUBLIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/public");

struct TestServer {
    url: String,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let store = SqliteStore::in_memory().await.expect("in-memory store");
        store.initialize().await.expect("schema");
        let state = Arc::new(AppState::new(Arc::new(store), AssetStore::new(PUBLIC_DIR)));

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let url = format!("http://{}", listener.local_addr().unwrap());
        let (shutdown, rx) = oneshot::channel::<()>();
        let task = tokio::spawn(server::serve(listener, state, async move {
            rx.await.ok();
        }));

        Self {
            url,
            shutdown: Some(shutdown),
            task,
        }
    }

    fn client(&self) -> BoardClient {
        BoardClient::new(self.url.clone())
    }

    async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            shutdown.send(()).ok();
        }
        self.task.await.unwrap();
    }
}

fn new_message(nickname: &str, content: &str) -> NewMessage {
    NewMessage {
        nickname: nickname.to_string(),
        content: content.to_string(),
    }
}

#[tokio::test]
async fn test_submit_then_list() {
    let server = TestServer::spawn().await;
    let client = server.client();
    let before = Utc::now();

    let reply = client.submit(&new_message("A", "hello")).await.unwrap();
    assert!(reply.success);
    assert_eq!(reply.message, "Message posted!");
    let posted = reply.data.unwrap();
    assert_eq!((posted.nickname.as_str(), posted.content.as_str()), ("A", "hello"));

    let reply = client.list().await.unwrap();
    assert!(reply.success);
    let messages = reply.data.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].id, posted.id);
    assert_eq!(messages[0].like_count, 0);
    // stored with millisecond precision
    assert!(messages[0].create_time.timestamp_millis() >= before.timestamp_millis());

    server.stop().await;
}

#[tokio::test]
async fn test_blank_submission_is_not_persisted() {
    let server = TestServer::spawn().await;
    let client = server.client();

    for (nickname, content) in [("", "hello"), ("A", "   "), ("\t", "\n")] {
        let reply = client.submit(&new_message(nickname, content)).await.unwrap();
        assert!(!reply.success);
        assert!(reply.data.is_none());
    }

    assert!(client.list().await.unwrap().data.unwrap().is_empty());
    server.stop().await;
}

#[tokio::test]
async fn test_likes_increase_by_one() {
    let server = TestServer::spawn().await;
    let client = server.client();
    let id = client
        .submit(&new_message("A", "like me"))
        .await
        .unwrap()
        .data
        .unwrap()
        .id;

    let first = client.like(id).await.unwrap();
    let second = client.like(id).await.unwrap();
    assert_eq!(first.new_like_count, Some(1));
    assert_eq!(second.new_like_count, Some(2));

    server.stop().await;
}

#[tokio::test]
async fn test_like_unknown_message_keeps_server_alive() {
    let server = TestServer::spawn().await;
    let client = server.client();

    let reply = client.like(12345).await.unwrap();
    assert!(!reply.success);
    assert!(reply.new_like_count.is_none());

    assert!(client.list().await.unwrap().success);
    server.stop().await;
}

#[tokio::test]
async fn test_list_after_n_submissions_is_newest_first() {
    let server = TestServer::spawn().await;
    let client = server.client();

    for i in 0..8 {
        client
            .submit(&new_message("nick", &format!("message {i}")))
            .await
            .unwrap();
    }

    let messages = client.list().await.unwrap().data.unwrap();
    assert_eq!(messages.len(), 8);
    assert!(messages
        .windows(2)
        .all(|pair| pair[0].create_time >= pair[1].create_time && pair[0].id > pair[1].id));
    assert_eq!(messages[0].content, "message 7");

    server.stop().await;
}

#[tokio::test]
async fn test_parallel_likes_lose_nothing() {
    let server = TestServer::spawn().await;
    let client = server.client();
    let id = client
        .submit(&new_message("A", "popular"))
        .await
        .unwrap()
        .data
        .unwrap()
        .id;

    let likes = (0..25).map(|_| {
        let client = client.clone();
        async move { client.like(id).await }
    });
    for reply in futures_util::future::join_all(likes).await {
        assert!(reply.unwrap().success);
    }

    let messages = client.list().await.unwrap().data.unwrap();
    assert_eq!(messages[0].like_count, 25);

    server.stop().await;
}

#[tokio::test]
async fn test_static_files_share_the_origin() {
    let server = TestServer::spawn().await;

    let resp = reqwest::get(format!("{}/", server.url)).await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    assert!(resp.text().await.unwrap().contains("messages-list"));

    let resp = reqwest::get(format!("{}/script.js", server.url)).await.unwrap();
    assert_eq!(
        resp.headers()["content-type"],
        "text/javascript; charset=utf-8"
    );

    let resp = reqwest::get(format!("{}/missing.png", server.url)).await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

    server.stop().await;
}

#[tokio::test]
async fn test_board_flow() {
    let server = TestServer::spawn().await;
    let mut board = Board::new(server.client());

    assert!(board.refresh().await.contains(EMPTY_PLACEHOLDER));

    let after = board.submit("<i>A</i>", "hello & bye").await.unwrap();
    assert_eq!(after, AfterSubmit::ClearAndRefresh);
    assert!(board.html().contains("&lt;i&gt;A&lt;/i&gt;"));
    assert!(board.html().contains("hello &amp; bye"));
    assert_eq!(board.buttons().len(), 1);

    let id = board.buttons()[0].message_id();
    let button = board.like(id).await.unwrap();
    assert_eq!(button.count(), 1);
    assert!(!button.enabled());

    // still cooling down
    assert!(board.like(id).await.is_none());
    board.tick(Instant::now() + Duration::from_secs(2));
    assert!(board.buttons()[0].enabled());
    assert_eq!(board.like(id).await.unwrap().count(), 2);

    server.stop().await;
}

#[tokio::test]
async fn test_board_reports_unreachable_server() {
    // nothing listens on a freshly closed ephemeral port
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let mut board = Board::new(BoardClient::new(url));
    board.refresh().await;
    assert!(board.load_error().is_some());

    board.submit("A", "hello").await.unwrap();
    let notice = board.form().notice().unwrap();
    assert!(notice.text.starts_with("Network error"));
    assert!(board.form().submit_enabled());
}

#[tokio::test]
async fn test_run_creates_the_database_file() {
    let data_path = std::env::temp_dir().join(format!("treehole-run-{}.db", std::process::id()));
    let _ = std::fs::remove_file(&data_path);

    let config = Config {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        data_path: data_path.clone(),
        static_dir: PUBLIC_DIR.into(),
    };
    server::run(config, async {}).await.unwrap();

    assert!(data_path.exists());
    std::fs::remove_file(&data_path).unwrap();
}
