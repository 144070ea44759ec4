use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::ai::{self, CompletionOptions, CompletionService};
use crate::bot::{Data, Error};
use crate::config::Settings;
use crate::platform::{ChatId, ChatPlatform, Event, MessageRef, UserId};
use crate::services::moderation::{self, Verdict, WarningOutcome};
use crate::services::verification;
use crate::utils::formatting::mention_user;

use super::{callbacks, commands};

/// Central event router. All inbound platform events and internally
/// scheduled events (verification deadlines) funnel through [`dispatch`],
/// which also owns the outermost error boundary: handler errors become a
/// chat notice and never escape.
///
/// [`dispatch`]: Dispatcher::dispatch
pub struct Dispatcher {
    platform: Arc<dyn ChatPlatform>,
    completion: Arc<dyn CompletionService>,
    data: Arc<Data>,
    options: CompletionOptions,
    scheduled: Mutex<UnboundedReceiver<Event>>,
}

impl Dispatcher {
    pub fn new(
        platform: Arc<dyn ChatPlatform>,
        completion: Arc<dyn CompletionService>,
        settings: Settings,
    ) -> Self {
        let (tx, rx) = unbounded_channel();
        let options = CompletionOptions {
            model: settings.completion_model.clone(),
            ..CompletionOptions::default()
        };
        let data = Arc::new(Data::new(settings, tx));
        Self {
            platform,
            completion,
            data,
            options,
            scheduled: Mutex::new(rx),
        }
    }

    pub fn data(&self) -> &Arc<Data> {
        &self.data
    }

    /// Start the background task that drops idle AI sessions. Call once
    /// after construction, from within a tokio runtime.
    pub fn spawn_background_tasks(&self) {
        ai::spawn_session_sweeper(Arc::clone(&self.data.ai_sessions));
    }

    /// Drain internally scheduled events until the channel closes. Run this
    /// alongside the platform's own event loop.
    pub async fn run_scheduled(&self) {
        loop {
            let event = self.scheduled.lock().await.recv().await;
            match event {
                Some(event) => self.dispatch(event).await,
                None => {
                    info!("scheduled event channel closed, stopping");
                    return;
                }
            }
        }
    }

    /// Handle one event. Never returns an error: a rejection turns into a
    /// chat notice and everything else is logged plus a generic notice.
    pub async fn dispatch(&self, event: Event) {
        let chat = chat_of(&event);
        if let Err(err) = self.route(event).await {
            match &err {
                Error::Precondition(_) | Error::PermissionDenied(_) => {
                    debug!(%err, "request rejected")
                }
                _ => error!(%err, "event handler failed"),
            }
            let Some(chat) = chat else { return };
            if let Err(send_err) = self
                .platform
                .send_message(chat, &err.user_notice(), None)
                .await
            {
                error!(%send_err, "failed to deliver error notice");
            }
        }
    }

    async fn route(&self, event: Event) -> Result<(), Error> {
        match event {
            Event::Message {
                chat,
                user,
                text,
                message,
            } => self.on_message(chat, user, &text, message).await,
            Event::NewMember { chat, user } => {
                verification::begin(
                    self.platform.as_ref(),
                    &self.data.verification,
                    &self.data.settings,
                    chat,
                    user,
                )
                .await
            }
            Event::ButtonPress {
                user,
                data,
                message,
            } => {
                callbacks::handle_button(self.platform.as_ref(), &self.data, user, &data, message)
                    .await
            }
            Event::VerificationExpired {
                chat,
                user,
                challenge,
            } => verification::expired(self.platform.as_ref(), chat, user, challenge).await,
        }
    }

    /// Message pipeline: blocklist, then flood throttle, then commands, then
    /// the AI proxy. The first stage that claims the message stops the rest.
    async fn on_message(
        &self,
        chat: ChatId,
        user: UserId,
        text: &str,
        message: MessageRef,
    ) -> Result<(), Error> {
        if let Some(word) = self.data.blocklist.matches(text) {
            warn!(chat = chat.0, user = user.0, word, "blocklisted message");
            return self.punish_blocklisted(chat, user, message).await;
        }

        if self.data.spam.check(user, Instant::now()) == Verdict::Throttled {
            self.platform.delete_message(message).await?;
            self.platform
                .send_message(
                    chat,
                    &format!("{}, slow down a little.", mention_user(user)),
                    None,
                )
                .await?;
            return Ok(());
        }

        if let Some(command) = commands::parse(text)? {
            return commands::handle_command(
                self.platform.as_ref(),
                &self.data,
                chat,
                user,
                message,
                command,
            )
            .await;
        }

        ai::handle_chat_message(
            self.platform.as_ref(),
            self.completion.as_ref(),
            &self.data.ai_sessions,
            &self.options,
            chat,
            user,
            text,
        )
        .await
    }

    async fn punish_blocklisted(
        &self,
        chat: ChatId,
        user: UserId,
        message: MessageRef,
    ) -> Result<(), Error> {
        self.platform.delete_message(message).await?;
        let outcome = moderation::add_warning(
            self.platform.as_ref(),
            &self.data.ledger,
            &self.data.settings,
            chat,
            user,
        )
        .await?;
        let notice = match outcome {
            WarningOutcome::Warned { count, max } => format!(
                "{}'s message contained a banned phrase and was removed ({count}/{max} warnings).",
                mention_user(user)
            ),
            WarningOutcome::Banned => format!(
                "{} posted a banned phrase once too often and was banned.",
                mention_user(user)
            ),
        };
        self.platform.send_message(chat, &notice, None).await?;
        Ok(())
    }
}

fn chat_of(event: &Event) -> Option<ChatId> {
    match event {
        Event::Message { chat, .. }
        | Event::NewMember { chat, .. }
        | Event::VerificationExpired { chat, .. } => Some(*chat),
        Event::ButtonPress { message, .. } => Some(message.chat),
    }
}
