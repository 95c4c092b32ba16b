use crate::{CliError, RunArgs, TuiArgs, DEFAULT_MAX_FRAMES};

fn headless_args(args: TuiArgs) -> RunArgs {
    RunArgs {
        engine: args.engine,
        frames: DEFAULT_MAX_FRAMES,
        report: None,
    }
}

#[cfg(coverage)]
pub(crate) fn run_tui(args: TuiArgs) -> Result<i32, CliError> {
    crate::run_headless(headless_args(args))
}

#[cfg(not(coverage))]
mod rich {
    use std::io;
    use std::time::{Duration, Instant};

    use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
    use crossterm::terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
    };
    use crossterm::ExecutableCommand;
    use ratatui::backend::CrosstermBackend;
    use ratatui::layout::Rect as CellRect;
    use ratatui::style::{Color, Modifier, Style};
    use ratatui::text::{Line, Span};
    use ratatui::widgets::{Block, Paragraph};
    use ratatui::{Frame, Terminal};
    use ut_api::ResultsReport;
    use ut_core::{InputEvent, InputQueue, Key};
    use ut_runtime::{Engine, HostFrame};

    use crate::{
        build_options, emit_results, exit_code, init_tracing, map_tui_io, prepare_engine,
        CliError, FileBrowser, LogTarget, TuiArgs,
    };

    const CURSOR_GLYPH: &str = "◆";

    struct TuiTerminal {
        terminal: Terminal<CrosstermBackend<io::Stdout>>,
    }

    impl TuiTerminal {
        fn new() -> Result<Self, CliError> {
            enable_raw_mode().map_err(map_tui_io)?;
            io::stdout()
                .execute(EnterAlternateScreen)
                .map_err(map_tui_io)?;
            let backend = CrosstermBackend::new(io::stdout());
            let terminal = Terminal::new(backend).map_err(map_tui_io)?;
            Ok(Self { terminal })
        }

        fn terminal_mut(&mut self) -> &mut Terminal<CrosstermBackend<io::Stdout>> {
            &mut self.terminal
        }
    }

    impl Drop for TuiTerminal {
        fn drop(&mut self) {
            let _ = disable_raw_mode();
            let _ = io::stdout().execute(LeaveAlternateScreen);
        }
    }

    pub(super) fn run_tui(args: TuiArgs) -> Result<i32, CliError> {
        let options = build_options(&args.engine)?;
        init_tracing(options.verbosity_on_error, LogTarget::File(&args.log_file))?;
        let mut browser = FileBrowser::load(&args.engine.dir)?;
        let mut engine = prepare_engine(&args.engine, options, &browser)?;

        let frames = run_frames(&mut engine, &mut browser, args.fps)?;
        let report = ResultsReport::from_engine(&engine);
        emit_results(&report, frames);
        Ok(exit_code(&report))
    }

    /// Owns the terminal for the whole loop; it is restored before the
    /// caller prints results.
    fn run_frames(
        engine: &mut Engine,
        browser: &mut FileBrowser,
        fps: u32,
    ) -> Result<u64, CliError> {
        let mut terminal = TuiTerminal::new()?;
        let tick = Duration::from_millis(1000 / u64::from(fps.max(1)));
        let mut input = InputQueue::new();
        let mut frame = 1u64;

        loop {
            let started = Instant::now();
            let tree = browser.tree(frame);
            if !engine.is_idle() {
                engine.tick(&mut HostFrame::new(frame, &tree, &mut input))?;
                browser.apply_all(frame, input.drain());
            }

            terminal
                .terminal_mut()
                .draw(|ui| render(ui, browser, engine))
                .map_err(map_tui_io)?;

            let timeout = tick.saturating_sub(started.elapsed());
            if event::poll(timeout).map_err(map_tui_io)? {
                if let Event::Key(key) = event::read().map_err(map_tui_io)? {
                    if key.kind == KeyEventKind::Press {
                        let quit = matches!(key.code, KeyCode::Char('q') | KeyCode::Esc)
                            || (key.code == KeyCode::Char('c')
                                && key.modifiers.contains(KeyModifiers::CONTROL));
                        if quit {
                            break;
                        }
                        if let Some(key) = host_key(key.code) {
                            browser.apply(frame, InputEvent::KeyDown { key });
                        }
                    }
                }
            }
            frame += 1;
        }

        let cancelled = engine.shutdown();
        if cancelled > 0 {
            tracing::warn!(cancelled, "quit before every scenario finished");
        }
        Ok(frame)
    }

    fn host_key(code: KeyCode) -> Option<Key> {
        match code {
            KeyCode::Up => Some(Key::Up),
            KeyCode::Down => Some(Key::Down),
            KeyCode::Enter => Some(Key::Enter),
            KeyCode::Backspace => Some(Key::Backspace),
            _ => None,
        }
    }

    fn render(ui: &mut Frame<'_>, browser: &FileBrowser, engine: &Engine) {
        let area = ui.area();
        let height = (browser.height() as u16).min(area.height);
        let width = (crate::BROWSER_WIDTH as u16).min(area.width);
        let browser_area = CellRect::new(area.x, area.y, width, height);

        let mut rows = Vec::new();
        for (index, name) in browser.files.iter().enumerate() {
            let selected = browser.selected == Some(index);
            let opened = browser.opened.iter().any(|file| file == name);
            let marker = if opened { "*" } else { " " };
            let style = if selected {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            rows.push(Line::from(Span::styled(format!("{}{}", marker, name), style)));
        }
        rows.push(Line::from(""));
        rows.push(Line::from(vec![
            Span::styled("[Open]", Style::default().fg(Color::Cyan)),
            Span::raw("  "),
            Span::styled(browser.status.clone(), Style::default().fg(Color::Gray)),
        ]));
        let block = Block::bordered().title("Files");
        ui.render_widget(Paragraph::new(rows).block(block), browser_area);

        let (cursor_x, cursor_y) = browser.cursor;
        let cursor = CellRect::new(
            (cursor_x.max(0.0) as u16).min(area.width.saturating_sub(1)),
            (cursor_y.max(0.0) as u16).min(area.height.saturating_sub(1)),
            1,
            1,
        );
        ui.render_widget(
            Paragraph::new(Span::styled(CURSOR_GLYPH, Style::default().fg(Color::Yellow))),
            cursor,
        );

        let summary = engine.summary();
        let progress = if engine.is_idle() {
            format!(
                "done: {} passed, {} failed, {} skipped",
                summary.passed, summary.failed, summary.skipped
            )
        } else {
            let running = engine
                .scheduler()
                .running_ids()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "running: {} | finished {} | queued {}",
                running,
                summary.tested,
                engine.scheduler().queued_len()
            )
        };
        let footer_y = area.y.saturating_add(height);
        if footer_y < area.y.saturating_add(area.height) {
            let footer = CellRect::new(
                area.x,
                footer_y,
                area.width,
                area.height.saturating_sub(height).min(2),
            );
            ui.render_widget(
                Paragraph::new(vec![
                    Line::from(progress),
                    Line::from(Span::styled(
                        "keys: up/down select | enter open | q quit",
                        Style::default().fg(Color::Yellow),
                    )),
                ]),
                footer,
            );
        }
    }
}

#[cfg(not(coverage))]
pub(crate) fn run_tui(args: TuiArgs) -> Result<i32, CliError> {
    use std::io::IsTerminal;

    if !std::io::stdin().is_terminal() || !std::io::stdout().is_terminal() {
        return crate::run_headless(headless_args(args));
    }
    rich::run_tui(args)
}
