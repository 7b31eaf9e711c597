use std::{net::IpAddr, path::PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::{
    client::{state::AfterSubmit, Board, BoardClient},
    config::{Config, DEFAULT_DATA_PATH, DEFAULT_PORT, DEFAULT_STATIC_DIR},
    server,
};

#[derive(Parser)]
#[command(name = "treehole", version, about = "Anonymous message board")]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    #[command(flatten)]
    pub serve: ServeArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the board server (the default)
    Serve(ServeArgs),
    /// Print the feed of a running server
    List {
        #[command(flatten)]
        target: TargetArgs,
        /// Print the rendered HTML fragment instead of plain text
        #[arg(long)]
        html: bool,
    },
    /// Post a message
    Post {
        #[command(flatten)]
        target: TargetArgs,
        nickname: String,
        content: String,
    },
    /// Like a message and print its new count
    Like {
        #[command(flatten)]
        target: TargetArgs,
        id: i64,
    },
}

#[derive(Args, Clone)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,
    /// SQLite database file, created if absent
    #[arg(long, env = "DATA_PATH", default_value = DEFAULT_DATA_PATH)]
    pub data_path: PathBuf,
    /// Directory of static files served next to the API
    #[arg(long, env = "STATIC_DIR", default_value = DEFAULT_STATIC_DIR)]
    pub static_dir: PathBuf,
}

#[derive(Args, Clone)]
pub struct TargetArgs {
    /// Base URL of the board server
    #[arg(long, env = "TREEHOLE_URL", default_value = "http://127.0.0.1:3000")]
    pub url: String,
}

impl From<ServeArgs> for Config {
    fn from(args: ServeArgs) -> Self {
        Config {
            host: args.host,
            port: args.port,
            data_path: args.data_path,
            static_dir: args.static_dir,
        }
    }
}

pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        None => server::run(cli.serve.into(), server::shutdown_signal()).await?,
        Some(Command::Serve(args)) => server::run(args.into(), server::shutdown_signal()).await?,
        Some(Command::List { target, html }) => list(target, html).await?,
        Some(Command::Post {
            target,
            nickname,
            content,
        }) => post(target, &nickname, &content).await?,
        Some(Command::Like { target, id }) => like(target, id).await?,
    }

    Ok(())
}

async fn list(target: TargetArgs, html: bool) -> anyhow::Result<()> {
    let client = BoardClient::new(target.url);
    if html {
        let mut board = Board::new(client);
        let fragment = board.refresh().await.to_string();
        if let Some(e) = board.load_error() {
            anyhow::bail!(e);
        }
        println!("{fragment}");
        return Ok(());
    }

    let reply = client.list().await?;
    if !reply.success {
        anyhow::bail!(reply.message.unwrap_or_default());
    }
    for message in reply.data.unwrap_or_default() {
        println!(
            "#{} [{}] {} ({} likes)\n    {}",
            message.id,
            crate::client::render::format_create_time(&message.create_time),
            message.nickname,
            message.like_count,
            message.content
        );
    }
    Ok(())
}

async fn post(target: TargetArgs, nickname: &str, content: &str) -> anyhow::Result<()> {
    let mut board = Board::new(BoardClient::new(target.url));
    let after = board.submit(nickname, content).await?;
    let notice = board.form().notice().map(|n| n.text).unwrap_or_default();
    match after {
        AfterSubmit::ClearAndRefresh => {
            println!("{notice}");
            Ok(())
        }
        AfterSubmit::Stay => anyhow::bail!(notice.to_string()),
    }
}

async fn like(target: TargetArgs, id: i64) -> anyhow::Result<()> {
    let mut board = Board::new(BoardClient::new(target.url));
    board.refresh().await;
    if let Some(e) = board.load_error() {
        anyhow::bail!(e);
    }

    let button = board
        .like(id)
        .await
        .ok_or_else(|| anyhow::anyhow!("message {id} is not on the board"))?;
    if let Some(alert) = button.take_alert() {
        anyhow::bail!(alert);
    }
    println!("{}", button.count());
    Ok(())
}
