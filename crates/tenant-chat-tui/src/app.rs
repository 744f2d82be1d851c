use std::sync::Arc;
use ratatui::layout::Rect;
use tenant_chat_core::{BackendError, ChatBackend, Session};
use tokio::sync::mpsc;
use crate::tui::AppEvent;
use crate::ui;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    pub should_quit: bool,

    // Conversation state (messages, draft, busy flag)
    pub session: Session,
    pub backend: Arc<dyn ChatBackend>,
    pub backend_url: String,
    events: mpsc::UnboundedSender<AppEvent>,

    // Draft editing
    pub cursor: usize, // cursor position in the draft, in chars

    // Chat view
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub send_area: Option<Rect>,
}

impl App {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        backend_url: String,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            should_quit: false,
            session: Session::new(),
            backend,
            backend_url,
            events,
            cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            chat_area: None,
            send_area: None,
        }
    }

    /// Send the draft if the session accepts it. The reply comes back as an
    /// [`AppEvent::Reply`].
    pub fn submit(&mut self) {
        let Some(message) = self.session.begin_submit() else {
            return;
        };

        self.cursor = 0;
        self.animation_frame = 0;
        // Scroll to bottom so "Thinking..." is visible
        self.scroll_chat_to_bottom();

        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        tokio::spawn(async move {
            // Run the request on its own task so a panic still produces a reply
            let request = tokio::spawn(async move { backend.ask(&message).await });
            let outcome = match request.await {
                Ok(outcome) => outcome,
                Err(err) => Err(BackendError::Task(err.to_string())),
            };
            if events.send(AppEvent::Reply(outcome)).is_err() {
                tracing::debug!("reply arrived after the event loop stopped");
            }
        });
    }

    pub fn receive_reply(&mut self, outcome: Result<String, BackendError>) {
        self.session.complete(outcome);
        self.scroll_chat_to_bottom();
    }

    // Draft editing. Every edit goes through Session::update_draft.
    pub fn insert_char(&mut self, c: char) {
        let mut draft = self.session.draft().to_string();
        let byte_pos = char_to_byte_index(&draft, self.cursor);
        draft.insert(byte_pos, c);
        self.session.update_draft(draft);
        self.cursor += 1;
    }

    pub fn delete_before_cursor(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let mut draft = self.session.draft().to_string();
        let byte_pos = char_to_byte_index(&draft, self.cursor);
        draft.remove(byte_pos);
        self.session.update_draft(draft);
    }

    pub fn delete_at_cursor(&mut self) {
        let mut draft = self.session.draft().to_string();
        if self.cursor < draft.chars().count() {
            let byte_pos = char_to_byte_index(&draft, self.cursor);
            draft.remove(byte_pos);
            self.session.update_draft(draft);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.session.draft().chars().count();
        self.cursor = (self.cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.session.draft().chars().count();
    }

    // Chat scrolling
    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.total_chat_lines().saturating_sub(self.visible_height());
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
    }

    pub fn scroll_half_page_up(&mut self) {
        self.scroll_up((self.visible_height() / 2).max(1));
    }

    pub fn scroll_half_page_down(&mut self) {
        self.scroll_down((self.visible_height() / 2).max(1));
    }

    pub fn tick_animation(&mut self) {
        if self.session.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_chat_to_bottom(&mut self) {
        let total_lines = self.total_chat_lines();
        let visible_height = self.visible_height();

        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }

    fn visible_height(&self) -> u16 {
        if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        }
    }

    /// Rendered height of the conversation, from the same lines `ui` draws.
    fn total_chat_lines(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let total = ui::chat_lines(self, wrap_width).len();
        u16::try_from(total).unwrap_or(u16::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Unused;

    #[async_trait]
    impl ChatBackend for Unused {
        async fn ask(&self, _message: &str) -> Result<String, BackendError> {
            Ok(String::new())
        }
    }

    fn app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        App::new(Arc::new(Unused), "http://localhost:8000".to_string(), tx)
    }

    #[test]
    fn editing_is_utf8_safe() {
        let mut app = app();
        for c in "débit".chars() {
            app.insert_char(c);
        }
        app.cursor_home();
        app.cursor_right();
        app.delete_at_cursor();
        assert_eq!(app.session.draft(), "dbit");

        app.cursor_end();
        app.delete_before_cursor();
        app.cursor_left();
        app.insert_char('é');
        assert_eq!(app.session.draft(), "dbéi");
        assert_eq!(app.cursor, 3);
    }

    #[test]
    fn cursor_stays_within_draft() {
        let mut app = app();
        app.cursor_left();
        assert_eq!(app.cursor, 0);
        app.insert_char('a');
        app.cursor_right();
        app.cursor_right();
        assert_eq!(app.cursor, 1);
        app.delete_before_cursor();
        app.delete_before_cursor();
        assert_eq!(app.session.draft(), "");
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn scrolling_is_clamped_to_content() {
        let mut app = app();
        app.chat_height = 10;
        app.chat_width = 40;

        app.scroll_down(5);
        assert_eq!(app.chat_scroll, 0);

        app.scroll_up(5);
        assert_eq!(app.chat_scroll, 0);
    }
}
