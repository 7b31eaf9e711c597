//! Client side of the board: a thin HTTP client for `/api`, the feed
//! renderer and the interaction state that guards against duplicate requests.

pub mod render;
pub mod state;

use std::time::Instant;

use tracing::warn;

use crate::{
    error::Result,
    payloads::{LikeMessage, LikeReply, ListReply, NewMessage, SubmitReply},
};

use self::{
    render::render_list,
    state::{AfterSubmit, FormError, LikeButton, SubmitForm},
};

const LOAD_FAILED: &str = "Failed to load messages, please refresh and retry";

/// Talks to a running board server. Nothing is retried.
#[derive(Debug, Clone)]
pub struct BoardClient {
    http: reqwest::Client,
    base_url: String,
}

impl BoardClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /api/messages`. A storage failure still decodes as a reply with `success: false`.
    pub async fn list(&self) -> Result<ListReply> {
        let reply = self
            .http
            .get(self.url("/api/messages"))
            .send()
            .await?
            .json()
            .await?;
        Ok(reply)
    }

    pub async fn submit(&self, message: &NewMessage) -> Result<SubmitReply> {
        let reply = self
            .http
            .post(self.url("/api/messages"))
            .json(message)
            .send()
            .await?
            .json()
            .await?;
        Ok(reply)
    }

    pub async fn like(&self, message_id: i64) -> Result<LikeReply> {
        let reply = self
            .http
            .post(self.url("/api/like"))
            .json(&LikeMessage { message_id })
            .send()
            .await?
            .json()
            .await?;
        Ok(reply)
    }
}

/// One open board page: the rendered feed, its like buttons and the submit form.
#[derive(Debug)]
pub struct Board {
    client: BoardClient,
    form: SubmitForm,
    buttons: Vec<LikeButton>,
    html: String,
    load_error: Option<&'static str>,
}

impl Board {
    pub fn new(client: BoardClient) -> Self {
        Self {
            client,
            form: SubmitForm::new(),
            buttons: Vec::new(),
            html: render_list(&[]),
            load_error: None,
        }
    }

    /// Fetches the whole feed and re-renders it. On a transport failure the
    /// previous feed stays and [`Board::load_error`] is set.
    pub async fn refresh(&mut self) -> &str {
        match self.client.list().await {
            Ok(reply) => {
                let messages = match reply {
                    ListReply {
                        success: true,
                        data: Some(messages),
                        ..
                    } => messages,
                    _ => Vec::new(),
                };
                self.buttons = messages.iter().map(LikeButton::new).collect();
                self.html = render_list(&messages);
                self.load_error = None;
            }
            Err(e) => {
                warn!("Fetching messages failed: {}", e);
                self.load_error = Some(LOAD_FAILED);
            }
        }
        &self.html
    }

    /// Runs the whole submit flow. The feed is fetched again after a successful post.
    pub async fn submit(&mut self, nickname: &str, content: &str) -> Result<AfterSubmit, FormError> {
        let message = self.form.begin(nickname, content)?;
        let outcome = self.client.submit(&message).await;
        let after = self.form.finish(outcome, Instant::now());
        if after == AfterSubmit::ClearAndRefresh {
            self.refresh().await;
        }
        Ok(after)
    }

    /// Presses the like button of `message_id`. Returns `None` if the message
    /// is not on the page or its button is still disabled.
    pub async fn like(&mut self, message_id: i64) -> Option<&mut LikeButton> {
        let index = self
            .buttons
            .iter()
            .position(|b| b.message_id() == message_id)?;
        let id = self.buttons[index].press()?;

        let outcome = self.client.like(id).await;
        let button = &mut self.buttons[index];
        button.finish(outcome, Instant::now());
        Some(button)
    }

    /// Advances notice and cool-down timers.
    pub fn tick(&mut self, now: Instant) {
        self.form.tick(now);
        for button in self.buttons.iter_mut() {
            button.tick(now);
        }
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn form(&self) -> &SubmitForm {
        &self.form
    }

    pub fn buttons(&self) -> &[LikeButton] {
        &self.buttons
    }

    pub fn load_error(&self) -> Option<&'static str> {
        self.load_error
    }
}
