use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::{env, fs::File, io::stdout, path::PathBuf, process};
use template_chips_config::{CatalogEntry, Config, read_seed};
use template_chips_engine::{
    ClipboardPayload, ContentRun, Document, EditorSession, HostDocument, Seed, Selection,
};

struct App {
    session: EditorSession,
    catalog: Vec<CatalogEntry>,
    clipboard: Option<ClipboardPayload>,
    status: String,
}

impl App {
    fn new(config: &Config, seed: Seed) -> Result<Self> {
        let mut session = EditorSession::new(config.reconciler_options())?;
        session.on_publish(|html| log::debug!("published {} bytes", html.len()));
        session.mount(seed)?;

        Ok(Self {
            session,
            catalog: config.catalog.clone(),
            clipboard: None,
            status: String::from("Ready"),
        })
    }

    /// Apply one key press; `false` means quit.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let result = match key.code {
            KeyCode::Esc => return false,
            KeyCode::Char('q') if ctrl => return false,
            KeyCode::Char('a') if ctrl => {
                self.session.select_all();
                Ok(())
            }
            KeyCode::Char('c') if ctrl => {
                self.copy();
                Ok(())
            }
            KeyCode::Char(c) if !ctrl => self.session.type_text(&c.to_string()),
            KeyCode::Enter => self.session.type_text("\n"),
            KeyCode::Backspace => self.session.delete_backward(),
            KeyCode::Left => {
                self.session.move_caret(-1);
                Ok(())
            }
            KeyCode::Right => {
                self.session.move_caret(1);
                Ok(())
            }
            KeyCode::F(n) => self.insert_catalog_entry(usize::from(n)),
            _ => Ok(()),
        };

        if let Err(e) = result {
            log::warn!("edit failed: {e}");
            self.status = format!("Error: {e}");
        }
        true
    }

    /// F1 inserts the first catalog entry, F2 the second and so on
    fn insert_catalog_entry(&mut self, key_number: usize) -> template_chips_engine::Result<()> {
        let Some(entry) = key_number
            .checked_sub(1)
            .and_then(|i| self.catalog.get(i))
        else {
            return Ok(());
        };
        let marker = entry.marker();
        self.session.insert_token(&marker)?;
        self.status = format!("Inserted {marker}");
        Ok(())
    }

    fn copy(&mut self) {
        match self.session.copy() {
            Some(payload) => {
                self.status = format!(
                    "Copied {} bytes of {}",
                    payload.html.len(),
                    payload.mime_type
                );
                self.clipboard = Some(payload);
            }
            None => self.status = String::from("Nothing selected (Ctrl+A selects all)"),
        }
    }
}

/// Editing surface lines: chips as highlighted `[title]`, caret reversed.
fn surface_lines(document: &Document, selection: Option<Selection>) -> Vec<Line<'static>> {
    let caret_style = Style::default().add_modifier(Modifier::REVERSED);
    let chip_style = Style::default().fg(Color::Black).bg(Color::Cyan);
    let selected_style = Style::default().bg(Color::Yellow).fg(Color::Black);

    let caret = selection.filter(Selection::is_collapsed).map(|s| s.index);
    let selected = |pos: usize| {
        selection.is_some_and(|s| !s.is_collapsed() && pos >= s.index && pos < s.end())
    };

    let mut lines = Vec::new();
    let mut spans = Vec::new();
    let mut pos = 0;

    for run in document.runs() {
        match run {
            ContentRun::Embed(embed) => {
                let style = if caret == Some(pos) || selected(pos) {
                    chip_style.add_modifier(Modifier::REVERSED)
                } else {
                    chip_style
                };
                spans.push(Span::styled(format!("[{}]", embed.payload.title), style));
                pos += 1;
            }
            ContentRun::Text(text) => {
                for ch in text.text.chars() {
                    let style = if caret == Some(pos) {
                        caret_style
                    } else if selected(pos) {
                        selected_style
                    } else {
                        Style::default()
                    };
                    if ch == '\n' {
                        if style != Style::default() {
                            spans.push(Span::styled(" ", style));
                        }
                        lines.push(Line::from(std::mem::take(&mut spans)));
                    } else {
                        spans.push(Span::styled(ch.to_string(), style));
                    }
                    pos += 1;
                }
            }
        }
    }

    if caret == Some(pos) {
        spans.push(Span::styled(" ", caret_style));
    }
    lines.push(Line::from(spans));
    lines
}

fn init_logging() -> Result<PathBuf> {
    // The terminal belongs to the UI, so logs go to a file
    let log_path = env::temp_dir().join("template-chips.log");
    let log_file = File::create(&log_path)?;
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();
    Ok(log_path)
}

fn main() -> Result<()> {
    let log_path = init_logging()?;
    log::info!("template-chips starting up, logging to {}", log_path.display());

    // Determine seed from CLI args or config file
    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();

    let config = match Config::load() {
        Ok(Some(config)) => config,
        Ok(None) => {
            log::info!("No config file at {}, using defaults", config_path.display());
            Config::default()
        }
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    let seed = if args.len() == 2 {
        read_seed(&PathBuf::from(&args[1]))
    } else if args.len() == 1 {
        config
            .seed()
            .map(|seed| seed.unwrap_or_else(|| Seed::PlainText(String::new())))
    } else {
        eprintln!("Usage: {} [seed-file]", args[0]);
        process::exit(1);
    };
    let seed = match seed {
        Ok(seed) => seed,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let mut app = App::new(&config, seed)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    // The last projection is the editor's value
    println!("{}", app.session.projection());

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && !app.handle_key(key)
        {
            return Ok(());
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Min(5),
                Constraint::Length(5),
                Constraint::Length(5),
                Constraint::Length(2),
            ]
            .as_ref(),
        )
        .split(f.area());

    let host = app.session.host();
    let editor = Paragraph::new(surface_lines(host.document(), host.selection()))
        .block(Block::default().borders(Borders::ALL).title("Editor"))
        .wrap(Wrap { trim: false });
    f.render_widget(editor, chunks[0]);

    let projection = Paragraph::new(app.session.projection().to_string())
        .block(Block::default().borders(Borders::ALL).title("Projection"))
        .wrap(Wrap { trim: false });
    f.render_widget(projection, chunks[1]);

    let clipboard_text = app
        .clipboard
        .as_ref()
        .map_or_else(String::new, |payload| payload.html.clone());
    let clipboard = Paragraph::new(clipboard_text)
        .block(Block::default().borders(Borders::ALL).title("Clipboard (text/html)"))
        .wrap(Wrap { trim: false });
    f.render_widget(clipboard, chunks[2]);

    let catalog_keys = app
        .catalog
        .iter()
        .take(9)
        .enumerate()
        .map(|(i, entry)| format!("F{}: {}", i + 1, entry.label))
        .collect::<Vec<_>>()
        .join(" | ");
    let help = Paragraph::new(vec![
        Line::from(vec![
            Span::raw("Esc/Ctrl+Q: Quit | "),
            Span::raw("Ctrl+A: Select all | "),
            Span::raw("Ctrl+C: Copy | "),
            Span::raw(catalog_keys),
        ]),
        Line::from(Span::styled(
            app.status.clone(),
            Style::default().fg(Color::Yellow),
        )),
    ]);
    f.render_widget(help, chunks[3]);
}
