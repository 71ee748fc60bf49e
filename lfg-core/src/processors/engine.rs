//! The matchmaking engine: owns all mutable state and drives the cycle.
//!
//! One cycle is an intake pass over the bot's inbox followed by a monitor
//! pass over the open LFG topics. Steps never run concurrently; a slow
//! platform call delays the whole cycle.

use crate::config::EngineConfig;
use crate::entities::{ChannelId, ChannelMessage, RequestTopic, TopicId};
use crate::messages;
use crate::platform::{ForumPlatform, GameRoomPlatform};
use crate::processors::classifier::{Trigger, classify};
use crate::processors::poll_monitor::{PollMonitor, TopicFate};
use crate::processors::restore::restore;
use crate::processors::topic_manager::{RequestStatus, TopicBook, TopicRequest};
use crate::processors::watermark::{ChannelPlan, WatermarkTracker};
use crate::state_file::StateFile;
use crate::status::{ActiveTopicStatus, EngineStatus, StatusSender};
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{debug, info, warn};

pub struct MatchmakingEngine<F, G> {
    config: EngineConfig,
    forum: F,
    rooms: G,
    watermarks: WatermarkTracker,
    topics: TopicBook,
    state_file: Option<StateFile>,
    status_tx: StatusSender,
    completed_cycles: u64,
    last_cycle_at: Option<OffsetDateTime>,
}

impl<F, G> MatchmakingEngine<F, G>
where
    F: ForumPlatform,
    G: GameRoomPlatform,
{
    pub fn new(config: EngineConfig, forum: F, rooms: G, status_tx: StatusSender) -> Self {
        let state_file = config.state_file.clone().map(StateFile::new);
        Self {
            config,
            forum,
            rooms,
            watermarks: WatermarkTracker::new(),
            topics: TopicBook::new(),
            state_file,
            status_tx,
            completed_cycles: 0,
            last_cycle_at: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn forum(&self) -> &F {
        &self.forum
    }

    pub fn rooms(&self) -> &G {
        &self.rooms
    }

    /// Open LFG topics.
    pub fn topics(&self) -> &[RequestTopic] {
        self.topics.topics()
    }

    pub fn watermarks(&self) -> &WatermarkTracker {
        &self.watermarks
    }

    /// Rebuild the active-topic table from the forum and the state file.
    pub async fn restore(&mut self, now: OffsetDateTime) {
        let saved = self
            .state_file
            .as_ref()
            .map(StateFile::load)
            .unwrap_or_default();
        self.topics = restore(&self.forum, &self.config, &saved, now).await;
        self.persist();
        self.publish_status();
    }

    /// Read new inbox messages and answer them.
    ///
    /// Returns how many player messages were acted upon.
    pub async fn intake_step(&mut self, now: OffsetDateTime) -> usize {
        let channels = match self.forum.list_channels().await {
            Ok(channels) => channels,
            Err(e) => {
                warn!(error = %e, "Failed to list inbox, skipping intake this cycle");
                return 0;
            }
        };

        let topics_before = self.topics.len();
        let mut handled = 0;

        for summary in &channels {
            let ChannelPlan::Fetch { after } = self.watermarks.observe(summary) else {
                continue;
            };
            let channel = summary.channel_id;

            let window = match self.forum.fetch_messages(channel, after).await {
                Ok(window) => window,
                Err(e) => {
                    warn!(
                        channel_id = channel,
                        error = %e,
                        "Failed to fetch channel, retrying next cycle"
                    );
                    continue;
                }
            };

            let bot_started = window
                .first()
                .is_some_and(|m| m.id == 1 && self.config.is_bot(&m.author));
            let fresh = self.watermarks.accept(channel, window);
            debug!(
                channel_id = channel,
                after,
                fresh = fresh.len(),
                "Fetched channel window"
            );

            for message in &fresh {
                if self.config.is_bot(&message.author) {
                    continue;
                }
                if bot_started {
                    debug!(
                        channel_id = channel,
                        message_id = message.id,
                        "Ignoring chatter in a conversation the bot started"
                    );
                    continue;
                }
                self.handle_message(channel, message, now).await;
                handled += 1;
            }

            if let Some(mark) = self.watermarks.watermark(channel) {
                if let Err(e) = self.forum.mark_read(channel, mark).await {
                    debug!(channel_id = channel, error = %e, "Failed to mark channel read");
                }
            }
        }

        if self.topics.len() != topics_before {
            self.persist();
        }
        self.publish_status();
        handled
    }

    async fn handle_message(
        &mut self,
        channel: ChannelId,
        message: &ChannelMessage,
        now: OffsetDateTime,
    ) {
        let reply = match classify(&message.text, &self.config.formats) {
            Trigger::Help => {
                debug!(channel_id = channel, author = %message.author, "Sending help");
                messages::help_text(&self.config.formats)
            }
            Trigger::Format(format) => {
                let request = TopicRequest {
                    format_key: format.key(),
                    requester: &message.author,
                    origin_channel: Some(channel),
                };
                match self
                    .topics
                    .request(&self.forum, &self.config, request, now)
                    .await
                {
                    Ok((topic, RequestStatus::Created)) => messages::post_live(
                        &self.forum.topic_url(topic.id),
                        self.config.expiry_window,
                    ),
                    Ok((topic, RequestStatus::JoinedExisting))
                        if topic.is_requested_by(&message.author) =>
                    {
                        messages::already_open(format, &self.forum.topic_url(topic.id))
                    }
                    Ok((topic, RequestStatus::JoinedExisting)) => {
                        messages::redirect_existing(format, &self.forum.topic_url(topic.id))
                    }
                    Err(e) => {
                        warn!(
                            channel_id = channel,
                            format = format.key(),
                            requester = %message.author,
                            error = %e,
                            "Failed to open LFG topic"
                        );
                        messages::request_failed().to_string()
                    }
                }
            }
        };

        if let Err(e) = self.forum.reply(channel, &reply).await {
            warn!(channel_id = channel, error = %e, "Failed to reply");
        }
    }

    /// Evaluate every open topic and finish the matched or expired ones.
    pub async fn monitor_step(&mut self, now: OffsetDateTime) -> Vec<(TopicId, TopicFate)> {
        let open = self.topics.topics().to_vec();
        let monitor = PollMonitor::new(&self.forum, &self.rooms, &self.config);

        let mut finished = Vec::new();
        for topic in &open {
            let fate = monitor.evaluate(topic, now).await;
            if fate.is_terminal() {
                finished.push((topic.id, fate));
            }
        }

        for (id, _) in &finished {
            self.topics.remove(*id);
        }
        if !finished.is_empty() {
            self.persist();
        }
        self.publish_status();
        finished
    }

    /// One intake pass then one monitor pass.
    pub async fn run_cycle(&mut self, now: OffsetDateTime) {
        self.intake_step(now).await;
        self.monitor_step(now).await;
        self.completed_cycles += 1;
        self.last_cycle_at = Some(now);
        self.publish_status();
    }

    /// Run cycles until shutdown is signaled.
    ///
    /// The current cycle always completes; shutdown is observed while
    /// sleeping between cycles.
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            formats = self.config.formats.len(),
            interval_secs = self.config.poll_interval.as_secs(),
            "Matchmaking engine started"
        );

        while !*shutdown_rx.borrow() {
            self.run_cycle(OffsetDateTime::now_utc()).await;

            tokio::select! {
                biased;

                // Shutdown has highest priority.
                changed = shutdown_rx.changed() => {
                    if changed.is_err() {
                        info!("Shutdown channel closed");
                        break;
                    }
                }

                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        info!(
            cycles = self.completed_cycles,
            open_topics = self.topics.len(),
            "Matchmaking engine stopped"
        );
    }

    fn persist(&self) {
        let Some(file) = &self.state_file else {
            return;
        };
        if let Err(e) = file.save(self.topics.topics()) {
            warn!(
                path = %file.path().display(),
                error = %e,
                "Failed to write state file"
            );
        }
    }

    fn publish_status(&self) {
        let window = self.config.expiry_window;
        self.status_tx.send_replace(EngineStatus {
            active_topics: self
                .topics
                .topics()
                .iter()
                .map(|t| ActiveTopicStatus::from_topic(t, window))
                .collect(),
            tracked_channels: self.watermarks.len(),
            completed_cycles: self.completed_cycles,
            last_cycle_at: self.last_cycle_at,
        });
    }
}
