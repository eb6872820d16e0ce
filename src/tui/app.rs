use std::io;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table};
use ratatui::Terminal;
use tokio::runtime::Runtime;

use crate::api::Transport;
use crate::core::{ConfigEditor, DraftState, Notice, ValueEditor};
use crate::models::{ConfigValue, ValueType};
use crate::session::SessionStore;

const LOGIN_URL: usize = 0;
const LOGIN_USER: usize = 1;
const LOGIN_PASSWORD: usize = 2;

/// 配置页的输入模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// 浏览列表
    Normal,
    /// 编辑选中 key 的值
    Editing,
    /// 填写新增行
    Creating,
    /// 确认删除
    Deleting,
}

/// 新增行中的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewRowField {
    Key,
    Type,
    Value,
}

impl NewRowField {
    fn next(self) -> Self {
        match self {
            NewRowField::Key => NewRowField::Type,
            NewRowField::Type => NewRowField::Value,
            NewRowField::Value => NewRowField::Key,
        }
    }

    fn prev(self) -> Self {
        match self {
            NewRowField::Key => NewRowField::Value,
            NewRowField::Type => NewRowField::Key,
            NewRowField::Value => NewRowField::Type,
        }
    }
}

/// 需要访问网络的操作，由事件循环驱动完成
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login,
    Reload,
    Save(String),
    Delete(String),
    Create,
}

/// TUI 应用状态
pub struct App<S, T> {
    editor: ConfigEditor<S, T>,
    running: bool,
    /// 登录表单字段：(标签, 值)
    login_fields: Vec<(String, String)>,
    login_field: usize,
    selected: usize,
    input_mode: InputMode,
    value_editor: Option<ValueEditor>,
    new_row_field: NewRowField,
    /// 已按键触发、尚未执行的命令；渲染时显示 loading
    pending: Option<Command>,
}

impl<S: SessionStore, T: Transport> App<S, T> {
    /// 登录表单的 API 地址优先取已持久化的值，其次取 prefill_url
    pub fn new(editor: ConfigEditor<S, T>, prefill_url: Option<String>) -> Self {
        let persisted = editor.api_url();
        let api_url = if persisted.is_empty() {
            prefill_url.unwrap_or_default()
        } else {
            persisted
        };
        Self {
            editor,
            running: true,
            login_fields: vec![
                ("API URL".to_string(), api_url),
                ("Username".to_string(), String::new()),
                ("Password".to_string(), String::new()),
            ],
            login_field: 0,
            selected: 0,
            input_mode: InputMode::Normal,
            value_editor: None,
            new_row_field: NewRowField::Key,
            pending: None,
        }
    }

    pub fn editor(&self) -> &ConfigEditor<S, T> {
        &self.editor
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn input_mode(&self) -> InputMode {
        self.input_mode
    }

    pub fn login_fields(&self) -> &[(String, String)] {
        &self.login_fields
    }

    pub fn login_field(&self) -> usize {
        self.login_field
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn value_editor(&self) -> Option<&ValueEditor> {
        self.value_editor.as_ref()
    }

    pub fn new_row_field(&self) -> NewRowField {
        self.new_row_field
    }

    pub fn selected_key(&self) -> Option<String> {
        self.editor.keys().get(self.selected).map(|k| k.to_string())
    }

    /// 启动时已有 token 则先加载配置
    pub fn startup_command(&self) -> Option<Command> {
        if self.editor.is_logged_in() {
            Some(Command::Reload)
        } else {
            None
        }
    }

    /// 启动 TUI 事件循环
    pub fn run(&mut self, runtime: &Runtime) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal, runtime);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        runtime: &Runtime,
    ) -> io::Result<()> {
        self.pending = self.startup_command();
        while self.running {
            terminal.draw(|frame| self.render(frame))?;

            // 先画出 loading 再执行请求
            if let Some(command) = self.pending.take() {
                runtime.block_on(self.execute(command));
                continue;
            }

            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                self.pending = self.map_key(key.code);
            }
        }
        Ok(())
    }

    /// 处理一次按键，需要网络的操作直接执行完
    pub async fn handle_key(&mut self, code: KeyCode) {
        if let Some(command) = self.map_key(code) {
            self.execute(command).await;
        }
    }

    /// 按键 -> 本地状态变化，需要网络时返回命令
    fn map_key(&mut self, code: KeyCode) -> Option<Command> {
        if !self.editor.is_logged_in() {
            return self.handle_login_key(code);
        }
        match self.input_mode {
            InputMode::Normal => self.handle_normal_key(code),
            InputMode::Editing => {
                self.handle_edit_key(code);
                None
            }
            InputMode::Creating => self.handle_create_key(code),
            InputMode::Deleting => self.handle_delete_key(code),
        }
    }

    pub async fn execute(&mut self, command: Command) {
        match command {
            Command::Login => {
                let url = self.login_value(LOGIN_URL);
                let user = self.login_value(LOGIN_USER);
                let password = self.login_fields[LOGIN_PASSWORD].1.clone();
                if self.editor.login(&url, &user, &password).await {
                    self.login_fields[LOGIN_PASSWORD].1.clear();
                    self.login_fields[LOGIN_URL].1 = self.editor.api_url();
                    self.selected = 0;
                    self.input_mode = InputMode::Normal;
                }
            }
            Command::Reload => {
                self.editor.reload().await;
            }
            Command::Save(key) => {
                self.editor.save_key(&key).await;
            }
            Command::Delete(key) => {
                self.editor.delete_key(&key).await;
            }
            Command::Create => {
                self.editor.create_new_key().await;
                if !self.editor.is_new_row_open() {
                    self.input_mode = InputMode::Normal;
                }
            }
        }
        self.after_command();
    }

    /// 请求完成后修正选中行；会话失效时回到登录页
    fn after_command(&mut self) {
        if !self.editor.is_logged_in() {
            self.input_mode = InputMode::Normal;
            self.value_editor = None;
        }
        let len = self.editor.keys().len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    fn login_value(&self, idx: usize) -> String {
        self.login_fields
            .get(idx)
            .map(|(_, v)| v.trim().to_string())
            .unwrap_or_default()
    }

    /// 登录页按键处理
    fn handle_login_key(&mut self, code: KeyCode) -> Option<Command> {
        match code {
            KeyCode::Esc => self.running = false,
            KeyCode::Tab => {
                self.login_field = (self.login_field + 1) % self.login_fields.len();
            }
            KeyCode::BackTab => {
                self.login_field =
                    (self.login_field + self.login_fields.len() - 1) % self.login_fields.len();
            }
            KeyCode::Enter => return Some(Command::Login),
            KeyCode::F(2) => {
                self.editor.reset_api_url();
                self.login_fields[LOGIN_URL].1.clear();
                self.editor
                    .set_notice(Notice::Info("API URL and session cleared".to_string()));
            }
            KeyCode::Backspace => {
                if let Some((_label, value)) = self.login_fields.get_mut(self.login_field) {
                    value.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some((_label, value)) = self.login_fields.get_mut(self.login_field) {
                    value.push(c);
                }
            }
            _ => {}
        }
        None
    }

    /// 配置页 Normal 模式按键处理
    fn handle_normal_key(&mut self, code: KeyCode) -> Option<Command> {
        let key_count = self.editor.keys().len();
        match code {
            KeyCode::Char('q') => self.running = false,
            KeyCode::Up => {
                if self.selected > 0 {
                    self.selected -= 1;
                }
            }
            KeyCode::Down => {
                if key_count > 0 && self.selected < key_count - 1 {
                    self.selected += 1;
                }
            }
            KeyCode::Char('r') => return Some(Command::Reload),
            KeyCode::Char('n') => {
                self.editor.open_new_row();
                self.new_row_field = NewRowField::Key;
                self.input_mode = InputMode::Creating;
            }
            KeyCode::Char('e') | KeyCode::Enter => self.start_editing(),
            KeyCode::Char('t') => {
                if let Some(key) = self.selected_key() {
                    if let Some(next) = self.editor.cycle_draft_type(&key) {
                        self.editor
                            .set_notice(Notice::Info(format!("'{}' is now {}", key, next)));
                    }
                }
            }
            KeyCode::Char('s') => {
                if let Some(key) = self.selected_key() {
                    return Some(Command::Save(key));
                }
            }
            KeyCode::Char('d') => {
                if self.selected_key().is_some() {
                    self.input_mode = InputMode::Deleting;
                }
            }
            KeyCode::Char('l') => {
                self.editor.logout();
                self.login_fields[LOGIN_PASSWORD].1.clear();
                self.login_field = LOGIN_USER;
                self.selected = 0;
            }
            _ => {}
        }
        None
    }

    /// 开始编辑选中 key，编辑器由草稿的类型标签决定
    fn start_editing(&mut self) {
        let Some(key) = self.selected_key() else {
            return;
        };
        let Some(draft) = self.editor.draft(&key) else {
            self.editor.set_notice(Notice::Error(format!(
                "'{}' is not a primitive value and cannot be edited",
                key
            )));
            return;
        };
        if draft.value_type() == ValueType::Null {
            self.editor.set_notice(Notice::Info(
                "null has no value to edit, press 't' to change type".to_string(),
            ));
            return;
        }
        self.value_editor = Some(ValueEditor::for_draft(draft));
        self.input_mode = InputMode::Editing;
    }

    /// 编辑模式按键处理：Enter 写回草稿，Esc 放弃
    fn handle_edit_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.value_editor = None;
                self.input_mode = InputMode::Normal;
                self.editor.set_notice(Notice::Info("Cancelled".to_string()));
            }
            KeyCode::Enter => {
                let (Some(key), Some(value_editor)) = (self.selected_key(), &self.value_editor)
                else {
                    self.input_mode = InputMode::Normal;
                    return;
                };
                match value_editor.commit() {
                    Ok(value) => {
                        self.editor.set_draft_value(&key, value);
                        self.value_editor = None;
                        self.input_mode = InputMode::Normal;
                    }
                    Err(e) => self.editor.set_notice(Notice::Error(e.to_string())),
                }
            }
            KeyCode::Backspace => {
                if let Some(value_editor) = self.value_editor.as_mut() {
                    value_editor.backspace();
                }
            }
            KeyCode::Char(c) => {
                if let Some(value_editor) = self.value_editor.as_mut() {
                    feed_char(value_editor, c);
                }
            }
            _ => {}
        }
    }

    /// 新增行按键处理
    fn handle_create_key(&mut self, code: KeyCode) -> Option<Command> {
        match code {
            KeyCode::Esc => {
                self.editor.cancel_new_row();
                self.input_mode = InputMode::Normal;
                self.editor.set_notice(Notice::Info("Cancelled".to_string()));
            }
            KeyCode::Tab => self.new_row_field = self.new_row_field.next(),
            KeyCode::BackTab => self.new_row_field = self.new_row_field.prev(),
            KeyCode::Enter => return Some(Command::Create),
            other => {
                let field = self.new_row_field;
                let Some(row) = self.editor.new_row_mut() else {
                    self.input_mode = InputMode::Normal;
                    return None;
                };
                match (field, other) {
                    (NewRowField::Key, KeyCode::Char(c)) => row.key.push(c),
                    (NewRowField::Key, KeyCode::Backspace) => {
                        row.key.pop();
                    }
                    (NewRowField::Type, KeyCode::Left) => {
                        let prev = row.value_type().prev();
                        row.set_type(prev);
                    }
                    (NewRowField::Type, KeyCode::Right | KeyCode::Char(' ')) => {
                        let next = row.value_type().next();
                        row.set_type(next);
                    }
                    (NewRowField::Value, KeyCode::Char(c)) => feed_char(row.input_mut(), c),
                    (NewRowField::Value, KeyCode::Backspace) => row.input_mut().backspace(),
                    _ => {}
                }
            }
        }
        None
    }

    /// 删除确认按键处理
    fn handle_delete_key(&mut self, code: KeyCode) -> Option<Command> {
        match code {
            KeyCode::Char('y') => {
                self.input_mode = InputMode::Normal;
                return self.selected_key().map(Command::Delete);
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.editor.set_notice(Notice::Info("Cancelled".to_string()));
            }
            _ => {}
        }
        None
    }

    /// 渲染整个界面
    fn render(&self, frame: &mut ratatui::Frame) {
        let area = frame.area();

        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(1),
                Constraint::Length(3),
            ])
            .split(area);

        self.render_title(frame, outer[0]);
        if self.editor.is_logged_in() {
            self.render_config(frame, outer[1]);
        } else {
            self.render_login(frame, outer[1]);
        }
        self.render_status(frame, outer[2]);
    }

    fn render_title(&self, frame: &mut ratatui::Frame, area: Rect) {
        let title = if self.editor.is_logged_in() {
            format!("Config Admin - {}", self.editor.api_url())
        } else {
            "Config Admin - Login".to_string()
        };
        let title = Paragraph::new(title)
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, area);
    }

    fn render_login(&self, frame: &mut ratatui::Frame, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(""));

        for (i, (label, value)) in self.login_fields.iter().enumerate() {
            let is_active = i == self.login_field;
            let indicator = if is_active { "▶ " } else { "  " };
            let label_style = if is_active {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            let shown = if i == LOGIN_PASSWORD {
                "*".repeat(value.chars().count())
            } else {
                value.clone()
            };
            lines.push(Line::from(vec![
                Span::raw(indicator),
                Span::styled(format!("{:<10}", format!("{}:", label)), label_style),
                Span::styled(shown, Style::default().fg(Color::White)),
                if is_active {
                    Span::styled("█", Style::default().fg(Color::Cyan))
                } else {
                    Span::raw("")
                },
            ]));
        }

        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Tab=next field  Enter=login  F2=clear URL and session  Esc=quit",
            Style::default().fg(Color::DarkGray),
        )));

        let form = Paragraph::new(lines).block(Block::default().title(" Login ").borders(Borders::ALL));
        frame.render_widget(form, area);
    }

    fn render_config(&self, frame: &mut ratatui::Frame, area: Rect) {
        let block = Block::default()
            .title(" Keys ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));

        let mut rows: Vec<Row> = Vec::new();
        if let Some(row) = self.editor.new_row() {
            let mark = |field: NewRowField| {
                if self.input_mode == InputMode::Creating && self.new_row_field == field {
                    "▶ "
                } else {
                    ""
                }
            };
            rows.push(
                Row::new(vec![
                    format!("+ {}{}", mark(NewRowField::Key), row.key),
                    format!("{}{}", mark(NewRowField::Value), row.input().display()),
                    format!("{}{}", mark(NewRowField::Type), row.value_type()),
                    "new".to_string(),
                ])
                .style(Style::default().fg(Color::Green)),
            );
        }

        let keys = self.editor.keys();
        for (i, key) in keys.iter().enumerate() {
            let is_selected = i == self.selected;
            let (value, type_label, state) = match self.editor.draft(key) {
                Some(draft) => {
                    let value = match (&self.value_editor, is_selected) {
                        (Some(editing), true) if self.input_mode == InputMode::Editing => {
                            format!("{}█", editing.display())
                        }
                        _ => display_value(draft.value()),
                    };
                    let state = match self.editor.draft_state(key) {
                        Some(DraftState::Dirty) => "*",
                        _ => "",
                    };
                    (value, draft.value_type().to_string(), state)
                }
                None => {
                    let raw = self
                        .editor
                        .snapshot()
                        .and_then(|s| s.get(*key))
                        .map(|v| v.to_string())
                        .unwrap_or_default();
                    (raw, "(read-only)".to_string(), "")
                }
            };
            let prefix = if is_selected { "> " } else { "  " };
            let style = if is_selected {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            rows.push(
                Row::new(vec![
                    format!("{}{}", prefix, key),
                    value,
                    type_label,
                    state.to_string(),
                ])
                .style(style),
            );
        }

        if rows.is_empty() {
            let hint = if self.pending.is_some() {
                "Loading..."
            } else {
                "No keys. Press 'n' to add."
            };
            frame.render_widget(Paragraph::new(hint).block(block), area);
            return;
        }

        let header = Row::new(vec!["Key", "Value", "Type", ""])
            .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD));
        let table = Table::new(
            rows,
            [
                Constraint::Percentage(30),
                Constraint::Percentage(50),
                Constraint::Length(12),
                Constraint::Length(5),
            ],
        )
        .header(header)
        .block(block);
        frame.render_widget(table, area);
    }

    fn status_hint(&self) -> &'static str {
        if !self.editor.is_logged_in() {
            return "Tab:Field  Enter:Login  F2:Reset  Esc:Quit";
        }
        match self.input_mode {
            InputMode::Normal => {
                "q:Quit  ↑↓:Navigate  e:Edit  t:Type  s:Save  d:Delete  n:New  r:Reload  l:Logout"
            }
            InputMode::Editing => "Enter:Apply  Esc:Cancel  Space:Toggle (boolean)",
            InputMode::Creating => "Tab:Field  ←→:Type  Enter:Create  Esc:Cancel",
            InputMode::Deleting => "Delete? y=confirm  n/Esc=cancel",
        }
    }

    fn render_status(&self, frame: &mut ratatui::Frame, area: Rect) {
        let message = if self.pending.is_some() || self.editor.is_loading() {
            Span::styled("Loading...", Style::default().fg(Color::Yellow))
        } else {
            match self.editor.notice() {
                Some(Notice::Error(msg)) => Span::styled(msg.as_str(), Style::default().fg(Color::Red)),
                Some(Notice::Info(msg)) => Span::styled(msg.as_str(), Style::default().fg(Color::Green)),
                None => Span::styled("Ready", Style::default().fg(Color::Green)),
            }
        };
        let status = Line::from(vec![
            Span::styled("Status: ", Style::default().fg(Color::DarkGray)),
            message,
            Span::raw(" | "),
            Span::styled(self.status_hint(), Style::default().fg(Color::DarkGray)),
        ]);
        let bar = Paragraph::new(status).block(Block::default().borders(Borders::ALL));
        frame.render_widget(bar, area);
    }
}

/// 空格切换布尔值，其余字符交给编辑器
fn feed_char(editor: &mut ValueEditor, c: char) {
    if c == ' ' && matches!(editor, ValueEditor::Toggle(_)) {
        editor.toggle();
    } else {
        editor.insert(c);
    }
}

fn display_value(value: &ConfigValue) -> String {
    match value {
        ConfigValue::String(s) => format!("\"{}\"", s),
        other => other.to_string(),
    }
}
