use crate::config::Config;
use crate::error::ReviewError;
use crate::render::html;
use crate::service::ReviewService;
use crate::storage::local_store::FileStore;
use crate::storage::review::{Review, StickyColor, UserId, parse_hex_rgb};
use anyhow::{Context, Result};
use ratatui::prelude::*;
use ratatui::widgets::*;
use std::path::PathBuf;
use tracing::{info, warn};

pub enum AppMode {
    Board,
    Liked,
    Compose,
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ComposeField {
    Title,
    Content,
    Color,
}

impl ComposeField {
    fn next(self) -> Self {
        match self {
            ComposeField::Title => ComposeField::Content,
            ComposeField::Content => ComposeField::Color,
            ComposeField::Color => ComposeField::Title,
        }
    }

    fn prev(self) -> Self {
        match self {
            ComposeField::Title => ComposeField::Color,
            ComposeField::Content => ComposeField::Title,
            ComposeField::Color => ComposeField::Content,
        }
    }
}

pub struct ComposeForm {
    pub title: String,
    pub content: String,
    pub color: StickyColor,
    pub field: ComposeField,
}

impl Default for ComposeForm {
    fn default() -> Self {
        ComposeForm {
            title: String::new(),
            content: String::new(),
            color: StickyColor::default(),
            field: ComposeField::Title,
        }
    }
}

pub struct App {
    pub service: ReviewService<FileStore>,
    pub user: UserId,
    pub reviews: Vec<Review>,
    pub liked: Vec<Review>,
    pub selected_index: usize,
    pub liked_index: usize,
    pub mode: AppMode,
    pub form: ComposeForm,
    pub export_dir: PathBuf,
    pub should_quit: bool,
    pub status_message: Option<String>,
}

impl App {
    pub fn new(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)
            .with_context(|| format!("Failed to create data dir {}", config.data_dir.display()))?;

        let service = ReviewService::new(FileStore::new(config.store_path()));
        let user = UserId::ephemeral();
        let reviews = service.load_all();
        info!(user = %user, reviews = reviews.len(), "session started");

        Ok(App {
            service,
            user,
            reviews,
            liked: Vec::new(),
            selected_index: 0,
            liked_index: 0,
            mode: AppMode::Board,
            form: ComposeForm::default(),
            export_dir: config.export_dir.clone(),
            should_quit: false,
            status_message: None,
        })
    }

    pub fn handle_key(&mut self, key: crossterm::event::KeyCode, modifiers: crossterm::event::KeyModifiers) -> Result<()> {
        match self.mode {
            AppMode::Board => self.handle_board_key(key)?,
            AppMode::Liked => self.handle_liked_key(key)?,
            AppMode::Compose => self.handle_compose_key(key, modifiers)?,
        }
        Ok(())
    }

    fn handle_board_key(&mut self, key: crossterm::event::KeyCode) -> Result<()> {
        match key {
            crossterm::event::KeyCode::Esc | crossterm::event::KeyCode::Char('q') => {
                self.should_quit = true;
            }
            crossterm::event::KeyCode::Char('j') | crossterm::event::KeyCode::Down => {
                if self.selected_index < self.reviews.len().saturating_sub(1) {
                    self.selected_index += 1;
                }
            }
            crossterm::event::KeyCode::Char('k') | crossterm::event::KeyCode::Up => {
                self.selected_index = self.selected_index.saturating_sub(1);
            }
            crossterm::event::KeyCode::Char('n') => {
                self.mode = AppMode::Compose;
                self.status_message = None;
            }
            crossterm::event::KeyCode::Char(' ') | crossterm::event::KeyCode::Char('l') => {
                self.toggle_selected_like();
            }
            crossterm::event::KeyCode::Char('v') => {
                self.liked = self.service.liked_by(&self.user);
                self.liked_index = 0;
                self.mode = AppMode::Liked;
                self.status_message = None;
            }
            crossterm::event::KeyCode::Char('r') => {
                self.reviews = self.service.load_all();
                self.selected_index = self.selected_index.min(self.reviews.len().saturating_sub(1));
                self.status_message = Some("✓ Reviews refreshed".to_string());
            }
            crossterm::event::KeyCode::Char('x') => {
                self.export_pages();
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_liked_key(&mut self, key: crossterm::event::KeyCode) -> Result<()> {
        match key {
            crossterm::event::KeyCode::Esc | crossterm::event::KeyCode::Char('v') => {
                self.mode = AppMode::Board;
                self.status_message = None;
            }
            crossterm::event::KeyCode::Char('q') => {
                self.should_quit = true;
            }
            crossterm::event::KeyCode::Char('j') | crossterm::event::KeyCode::Down => {
                if self.liked_index < self.liked.len().saturating_sub(1) {
                    self.liked_index += 1;
                }
            }
            crossterm::event::KeyCode::Char('k') | crossterm::event::KeyCode::Up => {
                self.liked_index = self.liked_index.saturating_sub(1);
            }
            crossterm::event::KeyCode::Char('x') => {
                self.export_pages();
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_compose_key(&mut self, key: crossterm::event::KeyCode, modifiers: crossterm::event::KeyModifiers) -> Result<()> {
        match key {
            crossterm::event::KeyCode::Esc => {
                self.mode = AppMode::Board;
                self.form = ComposeForm::default();
                self.status_message = None;
            }
            crossterm::event::KeyCode::Char('s') if modifiers.contains(crossterm::event::KeyModifiers::CONTROL) => {
                self.submit_form();
            }
            crossterm::event::KeyCode::Tab => {
                self.form.field = self.form.field.next();
            }
            crossterm::event::KeyCode::BackTab => {
                self.form.field = self.form.field.prev();
            }
            crossterm::event::KeyCode::Left if self.form.field == ComposeField::Color => {
                self.form.color = self.form.color.prev();
            }
            crossterm::event::KeyCode::Right if self.form.field == ComposeField::Color => {
                self.form.color = self.form.color.next();
            }
            crossterm::event::KeyCode::Enter => match self.form.field {
                ComposeField::Title => self.form.field = ComposeField::Content,
                ComposeField::Content => self.form.content.push('\n'),
                ComposeField::Color => self.submit_form(),
            },
            crossterm::event::KeyCode::Char(c) => match self.form.field {
                ComposeField::Title => self.form.title.push(c),
                ComposeField::Content => self.form.content.push(c),
                ComposeField::Color => {}
            },
            crossterm::event::KeyCode::Backspace => match self.form.field {
                ComposeField::Title => {
                    self.form.title.pop();
                }
                ComposeField::Content => {
                    self.form.content.pop();
                }
                ComposeField::Color => {}
            },
            _ => {}
        }
        Ok(())
    }

    fn submit_form(&mut self) {
        let now = chrono::Local::now();
        match self.service.submit(&self.form.title, &self.form.content, Some(self.form.color), &now) {
            Ok(review) => {
                self.status_message = Some(format!("✓ Posted: {}", review.title));
                // Only the new note is added; the rest of the board is left as drawn
                self.reviews.insert(0, review);
                self.selected_index = 0;
                self.form = ComposeForm::default();
                self.mode = AppMode::Board;
            }
            Err(ReviewError::Validation(message)) => {
                self.status_message = Some(format!("✗ {}", message));
            }
            Err(e) => {
                warn!(error = %e, "failed to save review");
                self.status_message = Some(format!("✗ Failed to save: {}", e));
            }
        }
    }

    fn toggle_selected_like(&mut self) {
        let Some(id) = self.reviews.get(self.selected_index).map(|r| r.id.clone()) else {
            return;
        };

        match self.service.toggle_like(&id, &self.user) {
            Ok(Some(outcome)) => {
                if let Some(review) = self.reviews.iter_mut().find(|r| r.id == id) {
                    review.likes = outcome.likes;
                    review.liked_by.retain(|u| u != self.user.as_str());
                    if outcome.liked {
                        review.liked_by.push(self.user.to_string());
                    }
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, id = %id, "failed to save like");
                self.status_message = Some(format!("✗ Failed to save like: {}", e));
            }
        }
    }

    fn export_pages(&mut self) {
        match self.write_exports() {
            Ok(dir) => {
                self.status_message = Some(format!("✓ Exported board.html and liked.html to {}", dir));
            }
            Err(e) => {
                warn!(error = %e, "export failed");
                self.status_message = Some(format!("✗ Export failed: {}", e));
            }
        }
    }

    fn write_exports(&self) -> Result<String> {
        let all = self.service.load_all();
        let liked = self.service.liked_by(&self.user);

        let board = html::render_board_page(&all, &self.user).context("Failed to render board page")?;
        let liked = html::render_liked_page(&liked).context("Failed to render liked page")?;

        std::fs::create_dir_all(&self.export_dir)?;
        std::fs::write(self.export_dir.join("board.html"), board)?;
        std::fs::write(self.export_dir.join("liked.html"), liked)?;

        let dir = self.export_dir.display().to_string();
        info!(dir = %dir, "pages exported");
        Ok(dir)
    }

    pub fn render(&self, frame: &mut Frame) {
        match self.mode {
            AppMode::Board => self.render_board(frame),
            AppMode::Liked => self.render_liked(frame),
            AppMode::Compose => self.render_compose(frame),
        }
    }

    fn layout(&self, frame: &mut Frame) -> std::rc::Rc<[Rect]> {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(frame.area())
    }

    fn render_header(&self, frame: &mut Frame, area: Rect, subtitle: &str) {
        let title = Paragraph::new(format!("stickyboard - {}  (you are {})", subtitle, self.user))
            .block(Block::default().borders(Borders::ALL).title("stickyboard"))
            .style(Style::default().fg(Color::Cyan));
        frame.render_widget(title, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let (text, color) = match self.status_message {
            Some(ref message) if message.starts_with('✗') => (message.as_str(), Color::Red),
            Some(ref message) if message.starts_with('✓') => (message.as_str(), Color::Green),
            Some(ref message) => (message.as_str(), Color::Yellow),
            None => ("", Color::DarkGray),
        };
        let status = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("Status"))
            .style(Style::default().fg(color));
        frame.render_widget(status, area);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect, text: &str) {
        let help = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("Help"))
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, area);
    }

    fn render_board(&self, frame: &mut Frame) {
        let chunks = self.layout(frame);
        self.render_header(frame, chunks[0], "Reviews");

        let items: Vec<ListItem> = self
            .reviews
            .iter()
            .enumerate()
            .map(|(i, review)| sticky_note(review, review.is_liked_by(&self.user), i == self.selected_index))
            .collect();

        let mut state = ListState::default();
        state.select(Some(self.selected_index));
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(format!("Reviews ({})", self.reviews.len())))
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, chunks[1], &mut state);

        self.render_status(frame, chunks[2]);
        self.render_help(frame, chunks[3], "j/k: navigate | space/l: like | n: new review | v: liked reviews | r: refresh | x: export html | q: quit");
    }

    fn render_liked(&self, frame: &mut Frame) {
        let chunks = self.layout(frame);
        self.render_header(frame, chunks[0], "Liked reviews");

        if self.liked.is_empty() {
            let empty = Paragraph::new("You have not liked any reviews yet.")
                .block(Block::default().borders(Borders::ALL).title("Liked reviews"))
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(empty, chunks[1]);
        } else {
            let items: Vec<ListItem> = self
                .liked
                .iter()
                .enumerate()
                .map(|(i, review)| sticky_note(review, true, i == self.liked_index))
                .collect();

            let mut state = ListState::default();
            state.select(Some(self.liked_index));
            let list = List::new(items)
                .block(Block::default().borders(Borders::ALL).title(format!("Liked reviews ({})", self.liked.len())))
                .highlight_symbol("▶ ");
            frame.render_stateful_widget(list, chunks[1], &mut state);
        }

        self.render_status(frame, chunks[2]);
        self.render_help(frame, chunks[3], "j/k: navigate | x: export html | Esc/v: back | q: quit");
    }

    fn render_compose(&self, frame: &mut Frame) {
        let chunks = self.layout(frame);
        self.render_header(frame, chunks[0], "New review");

        let form = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3), Constraint::Length(3)])
            .split(chunks[1]);

        let focus = |field: ComposeField| {
            if self.form.field == field {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            }
        };

        let title = Paragraph::new(self.form.title.as_str())
            .block(Block::default().borders(Borders::ALL).title("Title").border_style(focus(ComposeField::Title)));
        frame.render_widget(title, form[0]);

        let content = Paragraph::new(self.form.content.as_str())
            .block(Block::default().borders(Borders::ALL).title("Content").border_style(focus(ComposeField::Content)))
            .wrap(Wrap { trim: false });
        frame.render_widget(content, form[1]);

        let swatches: Vec<Span> = StickyColor::ALL
            .iter()
            .flat_map(|color| {
                let marker = if *color == self.form.color { "●" } else { "○" };
                [
                    Span::styled(format!(" {} {} ", marker, color.label()), Style::default().fg(Color::Black).bg(note_color(color.hex()))),
                    Span::raw(" "),
                ]
            })
            .collect();
        let palette = Paragraph::new(Line::from(swatches))
            .block(Block::default().borders(Borders::ALL).title("Color").border_style(focus(ComposeField::Color)));
        frame.render_widget(palette, form[2]);

        self.render_status(frame, chunks[2]);
        self.render_help(frame, chunks[3], "Tab: next field | ←/→: color | Ctrl+S: post | Esc: cancel");
    }
}

fn note_color(hex: &str) -> Color {
    parse_hex_rgb(hex)
        .map(|(r, g, b)| Color::Rgb(r, g, b))
        .unwrap_or(Color::Gray)
}

fn sticky_note(review: &Review, liked: bool, selected: bool) -> ListItem<'_> {
    let mut lines = vec![Line::from(Span::styled(
        review.title.as_str(),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    for line in review.content.lines() {
        lines.push(Line::from(line));
    }

    let heart = if liked { "♥" } else { "♡" };
    lines.push(Line::from(vec![
        Span::raw(format!("Posted: {}", review.date_time)),
        Span::raw("   "),
        Span::styled(
            format!("{} {}", heart, review.likes),
            Style::default().fg(if liked { Color::Red } else { Color::DarkGray }),
        ),
    ]));
    lines.push(Line::default());

    let mut style = Style::default().fg(Color::Black).bg(note_color(&review.color));
    if selected {
        style = style.add_modifier(Modifier::REVERSED);
    }
    ListItem::new(lines).style(style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};
    use tempfile::TempDir;

    fn app() -> (TempDir, App) {
        let tmp = TempDir::new().expect("failed to create temp dir");
        let config = Config {
            data_dir: tmp.path().join("data"),
            export_dir: tmp.path().join("export"),
            log_filter: "info".to_string(),
            defaulted: Vec::new(),
        };
        let app = App::new(&config).unwrap();
        (tmp, app)
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(code, KeyModifiers::NONE).unwrap();
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(ratatui::backend::TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn post(app: &mut App, title: &str, content: &str) {
        press(app, KeyCode::Char('n'));
        type_text(app, title);
        press(app, KeyCode::Enter);
        type_text(app, content);
        app.handle_key(KeyCode::Char('s'), KeyModifiers::CONTROL).unwrap();
    }

    #[test]
    fn blank_submission_shows_message_and_stays_in_composer() {
        let (_tmp, mut app) = app();
        post(&mut app, "   ", "body");

        assert!(matches!(app.mode, AppMode::Compose));
        assert!(app.status_message.as_deref().unwrap_or("").starts_with('✗'));
        assert!(app.service.load_all().is_empty());
    }

    #[test]
    fn posting_prepends_and_resets_form() {
        let (_tmp, mut app) = app();
        post(&mut app, "First", "one");

        press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "Second");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "two");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);

        assert!(matches!(app.mode, AppMode::Board));
        let titles: Vec<&str> = app.reviews.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Second", "First"]);
        assert_eq!(app.reviews[0].color, StickyColor::Yellow.hex());
        assert!(app.form.title.is_empty());
        assert_eq!(app.form.color, StickyColor::default());
        assert_eq!(app.service.load_all(), app.reviews);
    }

    #[test]
    fn like_key_updates_counter_in_place() {
        let (_tmp, mut app) = app();
        post(&mut app, "Great coffee", "Loved it");

        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.reviews[0].likes, 1);
        assert!(app.reviews[0].is_liked_by(&app.user));
        assert_eq!(app.service.load_all()[0].likes, 1);

        press(&mut app, KeyCode::Char('l'));
        assert_eq!(app.reviews[0].likes, 0);
        assert!(app.service.load_all()[0].liked_by.is_empty());
    }

    #[test]
    fn liked_screen_lists_only_my_likes() {
        let (_tmp, mut app) = app();
        post(&mut app, "Skipped", "a");
        post(&mut app, "Kept", "b");

        press(&mut app, KeyCode::Char('v'));
        assert!(matches!(app.mode, AppMode::Liked));
        assert!(app.liked.is_empty());

        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('v'));
        let titles: Vec<&str> = app.liked.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Kept"]);
    }

    #[test]
    fn export_writes_both_pages() {
        let (tmp, mut app) = app();
        post(&mut app, "<b>bold</b>", "text");
        press(&mut app, KeyCode::Char('x'));

        let board = std::fs::read_to_string(tmp.path().join("export").join("board.html")).unwrap();
        let liked = std::fs::read_to_string(tmp.path().join("export").join("liked.html")).unwrap();
        assert!(board.contains("&lt;b&gt;bold"));
        assert!(!board.contains("<b>bold"));
        assert!(liked.contains("id=\"no-liked-reviews\""));
    }

    #[test]
    fn empty_liked_screen_draws_notice() {
        let (_tmp, mut app) = app();
        post(&mut app, "Unliked", "a");
        press(&mut app, KeyCode::Char('v'));

        let text = screen_text(&app);
        assert!(text.contains("You have not liked any reviews yet."));
        assert!(!text.contains("Unliked"));
    }

    #[test]
    fn liked_screen_draws_liked_notes() {
        let (_tmp, mut app) = app();
        post(&mut app, "Favourite", "a");
        press(&mut app, KeyCode::Char(' '));
        press(&mut app, KeyCode::Char('v'));

        let text = screen_text(&app);
        assert!(text.contains("Favourite"));
        assert!(text.contains("Liked reviews (1)"));
        assert!(!text.contains("You have not liked any reviews yet."));
    }

    #[test]
    fn board_and_composer_screens_draw() {
        let (_tmp, mut app) = app();
        post(&mut app, "Great coffee", "Loved it");
        let board = screen_text(&app);
        assert!(board.contains("Great coffee"));
        assert!(board.contains("Reviews (1)"));

        press(&mut app, KeyCode::Char('n'));
        type_text(&mut app, "Draft");
        let composer = screen_text(&app);
        assert!(composer.contains("Draft"));
        assert!(composer.contains("light green"));
    }
}
