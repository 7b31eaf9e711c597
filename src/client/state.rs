//! Interaction state for the submit form and the like buttons.
//!
//! Both are plain state machines fed with the current [`Instant`], so the
//! disable / cool-down behaviour does not depend on a renderer or a timer.

use std::time::{Duration, Instant};

use crate::{
    error::Result,
    models::Message,
    payloads::{LikeReply, NewMessage, SubmitReply},
};

/// How long the "posted" notice stays visible.
pub const NOTICE_DELAY: Duration = Duration::from_secs(3);

/// How long a like button stays disabled after its request finished.
pub const LIKE_COOLDOWN: Duration = Duration::from_secs(1);

const SUBMIT_LABEL: &str = "Submit";
const SUBMITTING_LABEL: &str = "Submitting...";
const POSTED_NOTICE: &str = "Message posted!";
const SUBMIT_REJECTED: &str = "Failed to submit, please retry";
const SUBMIT_NETWORK_ERROR: &str = "Network error, failed to submit, please retry";
const LIKE_REJECTED: &str = "Failed to like, please retry";
const LIKE_NETWORK_ERROR: &str = "Network error, failed to like";

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum FormError {
    #[display("Please enter your nickname")]
    MissingNickname,
    #[display("Message content cannot be empty")]
    MissingContent,
    #[display("A submission is already in flight")]
    InFlight,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitState {
    Idle,
    Submitting,
    /// Posted; the notice clears itself at `clear_at`.
    Succeeded { clear_at: Instant },
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notice<'a> {
    pub kind: NoticeKind,
    pub text: &'a str,
}

/// What the caller should do once a submission settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterSubmit {
    /// Clear the inputs and fetch the feed again.
    ClearAndRefresh,
    Stay,
}

#[derive(Debug)]
pub struct SubmitForm {
    state: SubmitState,
    notice_delay: Duration,
}

impl Default for SubmitForm {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmitForm {
    pub fn new() -> Self {
        Self::with_notice_delay(NOTICE_DELAY)
    }

    pub fn with_notice_delay(notice_delay: Duration) -> Self {
        Self {
            state: SubmitState::Idle,
            notice_delay,
        }
    }

    pub fn state(&self) -> &SubmitState {
        &self.state
    }

    pub fn submit_enabled(&self) -> bool {
        self.state != SubmitState::Submitting
    }

    pub fn button_label(&self) -> &'static str {
        match self.state {
            SubmitState::Submitting => SUBMITTING_LABEL,
            _ => SUBMIT_LABEL,
        }
    }

    pub fn notice(&self) -> Option<Notice<'_>> {
        match &self.state {
            SubmitState::Succeeded { .. } => Some(Notice {
                kind: NoticeKind::Success,
                text: POSTED_NOTICE,
            }),
            SubmitState::Failed(text) => Some(Notice {
                kind: NoticeKind::Error,
                text: text.as_str(),
            }),
            _ => None,
        }
    }

    /// Validates the inputs and, if they pass, moves to `Submitting` and
    /// returns the trimmed body to send.
    pub fn begin(&mut self, nickname: &str, content: &str) -> Result<NewMessage, FormError> {
        if self.state == SubmitState::Submitting {
            return Err(FormError::InFlight);
        }

        let (nickname, content) = (nickname.trim(), content.trim());
        let invalid = if nickname.is_empty() {
            Some(FormError::MissingNickname)
        } else if content.is_empty() {
            Some(FormError::MissingContent)
        } else {
            None
        };
        if let Some(e) = invalid {
            self.state = SubmitState::Failed(e.to_string());
            return Err(e);
        }

        self.state = SubmitState::Submitting;
        Ok(NewMessage {
            nickname: nickname.to_string(),
            content: content.to_string(),
        })
    }

    /// Settles the in-flight submission.
    pub fn finish(&mut self, outcome: Result<SubmitReply>, now: Instant) -> AfterSubmit {
        if self.state != SubmitState::Submitting {
            return AfterSubmit::Stay;
        }

        match outcome {
            Ok(reply) if reply.success => {
                self.state = SubmitState::Succeeded {
                    clear_at: now + self.notice_delay,
                };
                AfterSubmit::ClearAndRefresh
            }
            Ok(reply) => {
                let message = if reply.message.is_empty() {
                    SUBMIT_REJECTED.to_string()
                } else {
                    reply.message
                };
                self.state = SubmitState::Failed(message);
                AfterSubmit::Stay
            }
            Err(e) => {
                tracing::warn!("Submitting message failed: {}", e);
                self.state = SubmitState::Failed(SUBMIT_NETWORK_ERROR.to_string());
                AfterSubmit::Stay
            }
        }
    }

    /// Clears an expired success notice.
    pub fn tick(&mut self, now: Instant) {
        if let SubmitState::Succeeded { clear_at } = self.state {
            if now >= clear_at {
                self.state = SubmitState::Idle;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeState {
    Ready,
    Pending,
    CoolingDown { until: Instant },
}

/// The like button of one message card.
#[derive(Debug)]
pub struct LikeButton {
    message_id: i64,
    count: i64,
    state: LikeState,
    cooldown: Duration,
    alert: Option<&'static str>,
}

impl LikeButton {
    pub fn new(message: &Message) -> Self {
        Self::with_cooldown(message, LIKE_COOLDOWN)
    }

    pub fn with_cooldown(message: &Message, cooldown: Duration) -> Self {
        Self {
            message_id: message.id,
            count: message.like_count,
            state: LikeState::Ready,
            cooldown,
            alert: None,
        }
    }

    pub fn message_id(&self) -> i64 {
        self.message_id
    }

    pub fn count(&self) -> i64 {
        self.count
    }

    pub fn state(&self) -> LikeState {
        self.state
    }

    pub fn enabled(&self) -> bool {
        self.state == LikeState::Ready
    }

    /// Disables the button and returns the id to like, or `None` while disabled.
    pub fn press(&mut self) -> Option<i64> {
        if self.state != LikeState::Ready {
            return None;
        }
        self.state = LikeState::Pending;
        Some(self.message_id)
    }

    /// Applies the server's answer. The cool-down starts whatever the outcome.
    pub fn finish(&mut self, outcome: Result<LikeReply>, now: Instant) {
        match outcome {
            Ok(LikeReply {
                success: true,
                new_like_count: Some(count),
                ..
            }) => self.count = count,
            Ok(_) => self.alert = Some(LIKE_REJECTED),
            Err(e) => {
                tracing::warn!("Liking message {} failed: {}", self.message_id, e);
                self.alert = Some(LIKE_NETWORK_ERROR);
            }
        }
        self.state = LikeState::CoolingDown {
            until: now + self.cooldown,
        };
    }

    pub fn tick(&mut self, now: Instant) {
        if let LikeState::CoolingDown { until } = self.state {
            if now >= until {
                self.state = LikeState::Ready;
            }
        }
    }

    /// The pending alert for the user, if the last like failed.
    pub fn take_alert(&mut self) -> Option<&'static str> {
        self.alert.take()
    }
}
