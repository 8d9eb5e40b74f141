//! Headless application driver.
//!
//! [`App`] wires settings, providers, storage and services together the way
//! the binary runs them: print tips, restore or generate a session, then poll
//! the inbox until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::broadcast::error::RecvError;

use crate::config::{AiProviderKind, AiSettings, Settings};
use crate::domain::{Account, Body, Message};
use crate::providers::ai::{GeminiProvider, LlmProvider, OpenAiCompatibleProvider};
use crate::providers::mail::{MailProvider, MailTmProvider};
use crate::services::{AddressGenerator, InboxEvent, InboxPoller, SessionStore, TipService};
use crate::storage::{FileSnapshotStore, SnapshotStore};

/// Main application entry point.
pub struct App {
    settings: Settings,
    mail: Arc<dyn MailProvider>,
    sessions: SessionStore,
    poller: InboxPoller,
    tips: TipService,
}

impl App {
    /// Assembles the app from explicit parts.
    pub fn new(
        settings: Settings,
        mail: Arc<dyn MailProvider>,
        storage: Arc<dyn SnapshotStore>,
        tips: TipService,
    ) -> Self {
        let sessions = SessionStore::with_key(storage, settings.session.storage_key.clone());
        let poller = InboxPoller::with_interval(Arc::clone(&mail), settings.inbox.poll_interval());
        Self {
            settings,
            mail,
            sessions,
            poller,
            tips,
        }
    }

    /// Builds the production wiring: mail.tm, file-backed storage in the data
    /// directory and the configured tip provider.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        settings.validate().context("invalid settings")?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.mail.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("failed to build HTTP client")?;

        let mail = MailTmProvider::with_base_url(settings.mail.base_url.clone()).with_client(client);
        let storage = FileSnapshotStore::in_data_dir().context("failed to open session storage")?;
        tracing::debug!(dir = %storage.dir().display(), "session storage ready");

        let tips = tip_service(&settings.ai);
        Ok(Self::new(settings, Arc::new(mail), Arc::new(storage), tips))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn poller(&self) -> &InboxPoller {
        &self.poller
    }

    /// Returns the persisted session, or generates and commits a new one with
    /// a random prefix on the preferred domain.
    pub async fn ensure_session(&mut self) -> Result<Account> {
        if let Some(account) = self.sessions.restore().await {
            return Ok(account);
        }

        let mut generator = AddressGenerator::new(Arc::clone(&self.mail));
        generator.load_domains().await?;
        generator.randomize_prefix();
        let account = generator
            .submit()
            .await
            .context("failed to generate an address")?;

        let delay = self.settings.session.commit_delay_ms;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        self.sessions
            .commit(account.clone())
            .await
            .context("failed to persist session")?;
        Ok(account)
    }

    /// Ends the session for good. Any poller handle for it must already be
    /// stopped.
    pub async fn terminate_session(&mut self) -> Result<()> {
        self.sessions
            .clear()
            .await
            .context("failed to delete session")
    }

    /// Runs until Ctrl-C.
    pub async fn run(mut self) -> Result<()> {
        let tips = self.tips.get_tips(&self.settings.ai.tip_category).await;
        for tip in &tips {
            println!("* {}: {}", tip.title, tip.description);
        }

        let account = self.ensure_session().await?;
        println!();
        println!("Address:  {}", account.address);
        if let Some(password) = &account.password {
            println!("Password: {}", password);
        }

        let mut events = self.poller.subscribe();
        let handle = self.poller.start(account);

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        let mut listed = false;

        loop {
            tokio::select! {
                result = &mut ctrl_c => {
                    result.context("failed to listen for Ctrl-C")?;
                    break;
                }
                event = events.recv() => match event {
                    Ok(InboxEvent::Refreshed { count }) if !listed => {
                        listed = true;
                        println!("Inbox: {} message(s)", count);
                        for message in self.poller.messages() {
                            print_summary(&message);
                        }
                    }
                    Ok(InboxEvent::Refreshed { .. }) => {}
                    Ok(InboxEvent::NewMessages(messages)) => {
                        for message in messages {
                            self.show_message(&message).await;
                        }
                    }
                    // Already logged by the poller; the timer keeps running.
                    Ok(InboxEvent::RefreshFailed(_)) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "inbox events dropped");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }

        handle.stop();
        tracing::info!("Shutting down");
        Ok(())
    }

    async fn show_message(&self, message: &Message) {
        print_summary(message);
        match self.poller.open_message(&message.id).await {
            Ok(detail) => match detail.body() {
                Body::Html(_) if !detail.text.is_empty() => println!("{}", detail.text),
                Body::Html(html) => println!("{}", html),
                Body::Text(text) => println!("{}", text),
            },
            Err(e) => tracing::warn!(message_id = %message.id, error = %e, "could not open message"),
        }
    }
}

fn print_summary(message: &Message) {
    println!(
        "[{}] {} - {}",
        message.created_at.format("%Y-%m-%d %H:%M"),
        message.from.display(),
        message.display_subject()
    );
}

/// Builds the tip service for the configured provider. Without a key, or
/// with AI disabled, tips come from the fallback.
pub fn tip_service(settings: &AiSettings) -> TipService {
    if !settings.enabled {
        return TipService::offline();
    }

    let api_key = settings.api_key();
    let provider: Arc<dyn LlmProvider> = match (settings.provider, api_key) {
        (AiProviderKind::Gemini, Some(key)) => {
            let gemini = GeminiProvider::new(key, settings.model.clone());
            match &settings.base_url {
                Some(base_url) => Arc::new(gemini.with_base_url(base_url.clone())),
                None => Arc::new(gemini),
            }
        }
        // Local OpenAI-compatible servers often run without a key.
        (AiProviderKind::OpenAi, key) if key.is_some() || settings.base_url.is_some() => {
            Arc::new(OpenAiCompatibleProvider::custom(
                settings.openai_base_url(),
                key,
                settings.model.clone(),
            ))
        }
        _ => {
            tracing::info!(env = %settings.api_key_env, "no AI credential, using built-in tips");
            return TipService::offline();
        }
    };

    tracing::debug!(provider = provider.name(), model = provider.model(), "tip provider ready");
    TipService::new(provider)
}
