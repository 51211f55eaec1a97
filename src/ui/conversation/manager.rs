use crate::api::{ChatApi, ChatRequest};
use crate::config::Config;
use crate::events::ChatEvent;
use crate::session::ConversationId;
use crate::ui::conversation::composer::ComposerResult;
use crate::ui::conversation::{ConversationComposer, ConversationHistory, Message, TypingIndicator};
use crossterm::event::KeyEvent;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Widget,
};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Text shown for any failed request
pub const ERROR_MESSAGE: &str = "Something went wrong, try again!";

/// The chat surface: history, typing indicator, error line and composer
pub struct ChatBot {
    history: ConversationHistory,
    composer: ConversationComposer,
    typing: TypingIndicator,
    api: Arc<dyn ChatApi>,
    conversation_id: ConversationId,
    /// Requests sent whose outcome has not been processed yet
    in_flight: usize,
    error: Option<String>,
    event_tx: mpsc::UnboundedSender<ChatEvent>,
    event_rx: mpsc::UnboundedReceiver<ChatEvent>,
}

impl ChatBot {
    pub fn new(api: Arc<dyn ChatApi>, config: &Config) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let conversation_id = ConversationId::generate();
        log::info!("Started conversation {}", conversation_id);

        Self {
            history: ConversationHistory::new(config.ui.render_markdown),
            composer: ConversationComposer::new(&config.ui),
            typing: TypingIndicator::new(),
            api,
            conversation_id,
            in_flight: 0,
            error: None,
            event_tx,
            event_rx,
        }
    }

    /// Handle key input for the composer, submitting on Enter
    pub fn handle_key(&mut self, key: KeyEvent) {
        match self.composer.handle_key(key) {
            ComposerResult::Submitted(prompt) => {
                self.submit(prompt);
            }
            ComposerResult::None => {}
        }
    }

    pub fn handle_paste(&mut self, text: &str) {
        self.composer.paste(text);
    }

    /// Send a prompt; returns false when it was blank and nothing happened
    ///
    /// Must be called from within a tokio runtime: the request runs on a
    /// spawned task and reports back through the event channel.
    pub fn submit(&mut self, prompt: String) -> bool {
        if prompt.trim().is_empty() {
            return false;
        }

        self.history.push(Message::user(prompt.clone()));
        if self.in_flight == 0 {
            self.typing = TypingIndicator::new();
        }
        self.in_flight += 1;
        self.error = None;
        self.composer.clear();

        let request = ChatRequest {
            prompt,
            conversation_id: self.conversation_id.clone(),
        };
        let api = Arc::clone(&self.api);
        let tx = self.event_tx.clone();

        tokio::spawn(async move {
            let event = match api.send_prompt(&request).await {
                Ok(content) => ChatEvent::Reply { content },
                Err(error) => ChatEvent::Failed { error },
            };
            // Receiver only goes away when the UI is shutting down
            let _ = tx.send(event);
        });

        true
    }

    /// Apply finished requests (called from main loop); true if anything changed
    pub fn process_events(&mut self) -> bool {
        let mut changed = false;

        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                ChatEvent::Reply { content } => {
                    self.history.push(Message::bot(content));
                }
                ChatEvent::Failed { error } => {
                    log::error!("Chat request failed: {}", error);
                    self.error = Some(ERROR_MESSAGE.to_string());
                }
            }
            self.in_flight = self.in_flight.saturating_sub(1);
            changed = true;
        }

        changed
    }

    pub fn is_typing(&self) -> bool {
        self.in_flight > 0
    }

    #[allow(dead_code)]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[allow(dead_code)]
    pub fn messages(&self) -> &[Message] {
        self.history.messages()
    }

    #[allow(dead_code)]
    pub fn can_submit(&self) -> bool {
        self.composer.can_submit()
    }

    #[allow(dead_code)]
    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.history.scroll_up(lines);
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.history.scroll_down(lines);
    }

    pub fn set_focus(&mut self, has_focus: bool) {
        self.composer.set_focus(has_focus);
    }

    fn status_height(&self) -> u16 {
        u16::from(self.is_typing()) + u16::from(self.error.is_some())
    }
}

impl Widget for &ChatBot {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // History takes the remaining space, composer sits at the bottom
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(self.status_height()),
                Constraint::Length(self.composer.height(area.width)),
            ])
            .split(area);

        self.history.render(chunks[0], buf);

        let mut status = chunks[1];
        if self.is_typing() && status.height > 0 {
            self.typing.render(Rect { height: 1, ..status }, buf);
            status.y += 1;
            status.height -= 1;
        }
        if let Some(error) = &self.error {
            if status.height > 0 {
                let line = Line::from(Span::styled(error.as_str(), Style::default().fg(Color::Red)));
                buf.set_line(status.x, status.y, &line, status.width);
            }
        }

        self.composer.render(chunks[2], buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::events::Role;
    use async_trait::async_trait;
    use crossterm::event::{KeyCode, KeyModifiers};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Replies come from a script the test feeds one by one
    struct ScriptedApi {
        requests: Mutex<Vec<ChatRequest>>,
        replies: tokio::sync::Mutex<mpsc::UnboundedReceiver<Result<String, ApiError>>>,
    }

    #[async_trait]
    impl ChatApi for ScriptedApi {
        async fn send_prompt(&self, request: &ChatRequest) -> Result<String, ApiError> {
            self.requests.lock().unwrap().push(request.clone());
            let mut replies = self.replies.lock().await;
            replies.recv().await.unwrap_or_else(|| {
                Err(ApiError::Status { status: 503, body: "script exhausted".into() })
            })
        }
    }

    fn scripted() -> (ChatBot, Arc<ScriptedApi>, mpsc::UnboundedSender<Result<String, ApiError>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let api = Arc::new(ScriptedApi {
            requests: Mutex::new(Vec::new()),
            replies: tokio::sync::Mutex::new(rx),
        });
        let bot = ChatBot::new(api.clone(), &Config::default());
        (bot, api, tx)
    }

    async fn settle(bot: &mut ChatBot) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !bot.process_events() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("request never completed");
    }

    fn rendered(bot: &ChatBot) -> String {
        let area = Rect::new(0, 0, 60, 16);
        let mut buf = Buffer::empty(area);
        bot.render(area, &mut buf);
        buf.content.iter().map(|cell| cell.symbol()).collect()
    }

    #[tokio::test]
    async fn reply_is_appended_after_user_message() {
        let (mut bot, api, replies) = scripted();

        assert!(bot.submit("Hello".to_string()));
        assert_eq!(bot.messages(), &[Message::user("Hello")]);
        assert!(bot.is_typing());

        replies.send(Ok("Hi there".to_string())).unwrap();
        settle(&mut bot).await;

        assert_eq!(bot.messages(), &[Message::user("Hello"), Message::bot("Hi there")]);
        assert!(!bot.is_typing());
        assert_eq!(bot.error(), None);

        let sent = api.requests.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].prompt, "Hello");
        assert_eq!(&sent[0].conversation_id, bot.conversation_id());
    }

    #[tokio::test]
    async fn blank_prompt_is_ignored() {
        let (mut bot, api, _replies) = scripted();

        assert!(!bot.submit("  \n\t ".to_string()));
        bot.handle_key(KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE));
        bot.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));

        assert!(bot.messages().is_empty());
        assert!(!bot.is_typing());
        assert!(!bot.can_submit());
        tokio::task::yield_now().await;
        assert!(api.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failure_shows_error_without_bot_message() {
        let (mut bot, _api, replies) = scripted();

        bot.submit("Hello".to_string());
        replies
            .send(Err(ApiError::Status { status: 500, body: "boom".into() }))
            .unwrap();
        settle(&mut bot).await;

        assert_eq!(bot.messages(), &[Message::user("Hello")]);
        assert_eq!(bot.error(), Some(ERROR_MESSAGE));
        assert!(!bot.is_typing());
        assert!(rendered(&bot).contains(ERROR_MESSAGE));
    }

    #[tokio::test]
    async fn typing_indicator_spans_the_request() {
        let (mut bot, _api, replies) = scripted();
        assert!(!rendered(&bot).contains("Bot is typing"));

        bot.submit("Hello".to_string());
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!bot.process_events());
        assert!(bot.is_typing());
        assert!(rendered(&bot).contains("Bot is typing"));

        replies.send(Ok("Hi there".to_string())).unwrap();
        settle(&mut bot).await;
        assert!(!bot.is_typing());
        assert!(!rendered(&bot).contains("Bot is typing"));
    }

    #[tokio::test]
    async fn new_submission_clears_previous_error() {
        let (mut bot, _api, replies) = scripted();

        bot.submit("first".to_string());
        replies
            .send(Err(ApiError::Status { status: 502, body: String::new() }))
            .unwrap();
        settle(&mut bot).await;
        assert!(bot.error().is_some());

        bot.submit("second".to_string());
        assert_eq!(bot.error(), None);

        replies.send(Ok("ok".to_string())).unwrap();
        settle(&mut bot).await;
        let roles: Vec<Role> = bot.messages().iter().map(Message::role).collect();
        assert_eq!(roles, vec![Role::User, Role::User, Role::Bot]);
    }

    #[tokio::test]
    async fn enter_key_submits_through_composer() {
        let (mut bot, api, replies) = scripted();
        for c in "Hi".chars() {
            bot.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        assert!(bot.can_submit());

        bot.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(bot.messages(), &[Message::user("Hi")]);
        assert!(!bot.can_submit());

        replies.send(Ok("Hello!".to_string())).unwrap();
        settle(&mut bot).await;
        assert_eq!(api.requests.lock().unwrap()[0].prompt, "Hi");
        assert_eq!(bot.messages().len(), 2);
    }

    #[tokio::test]
    async fn overlapping_requests_keep_indicator_until_last_finishes() {
        let (mut bot, _api, replies) = scripted();

        bot.submit("one".to_string());
        bot.submit("two".to_string());
        assert_eq!(bot.messages().len(), 2);

        replies.send(Ok("first".to_string())).unwrap();
        settle(&mut bot).await;
        assert!(bot.is_typing());

        replies.send(Ok("second".to_string())).unwrap();
        settle(&mut bot).await;
        assert!(!bot.is_typing());
        assert_eq!(bot.messages().len(), 4);
    }
}
