//! # heatmap-tui
//!
//! A terminal dashboard for spatial-visitation heatmaps: summary statistics,
//! a clickable grid over the rendered heatmap and per-cell visit history.

use anyhow::{Context, Result, bail};
use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use heatmap_tui::app_core::fetch::{FetchRequest, FetchResponse};
use heatmap_tui::app_core::heatmap::HeatmapImage;
use heatmap_tui::app_core::input::{AppKeyCode, AppKeyEvent, AppMouseEvent, AppMouseKind};
use heatmap_tui::app_core::reducer;
use heatmap_tui::config::{self, CONFIG_FILE_NAME, LOG_FILE_NAME, Settings};
use heatmap_tui::data::ApiClient;
use heatmap_tui::fetcher::{Fetcher, spawn_fetcher};
use heatmap_tui::{AppAction, AppState, logging, theme, ui};
use ratatui::{Terminal, backend::CrosstermBackend};

use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// How long to wait for input before checking for finished requests.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = "heatmap-tui: a terminal dashboard for spatial-visitation heatmaps.\n\
                  Shows summary statistics for a processed video, renders its global heatmap\n\
                  with a clickable grid, and charts the visit history of any cell."
)]
struct Args {
    /// Base URL of the heatmap server (e.g. http://localhost:5000)
    #[arg(short, long)]
    server: Option<String>,

    /// Video id to open. Defaults to the newest processed video
    #[arg(long)]
    video: Option<u64>,

    /// Local heatmap image to show instead of downloading one
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Grid cell size in natural-image pixels
    #[arg(long)]
    cell_size: Option<u32>,

    /// UI theme (dracula, solarized, gruvbox, everforest_light)
    #[arg(short, long)]
    theme: Option<String>,

    /// Download the heatmap even if a cached copy exists
    #[arg(long)]
    force: bool,

    /// List the server's processed videos and exit
    #[arg(long)]
    list_videos: bool,

    /// Print the dashboard summary for --video and exit
    #[arg(long)]
    summary: bool,

    /// Show all paths used by the application (config, cache, log)
    #[arg(long)]
    config: bool,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// CLI flags win over `config.toml`.
    fn apply_to(&self, settings: &mut Settings) {
        if let Some(server) = &self.server {
            settings.server = server.clone();
        }
        if let Some(video) = self.video {
            settings.video = Some(video);
        }
        if let Some(cell_size) = self.cell_size {
            settings.cell_size = cell_size;
        }
        if let Some(theme) = &self.theme {
            settings.theme = theme.clone();
        }
    }
}

// ---------------------------------------------------------------------------
// Crossterm → reducer adapters
// ---------------------------------------------------------------------------

fn crossterm_to_app_key_event(key: &KeyEvent) -> Option<AppKeyEvent> {
    if matches!(key.kind, KeyEventKind::Release) {
        return None;
    }

    let code = match key.code {
        KeyCode::Char(c) => AppKeyCode::Char(c),
        KeyCode::Enter => AppKeyCode::Enter,
        KeyCode::Esc => AppKeyCode::Esc,
        KeyCode::Up => AppKeyCode::Up,
        KeyCode::Down => AppKeyCode::Down,
        KeyCode::Left => AppKeyCode::Left,
        KeyCode::Right => AppKeyCode::Right,
        KeyCode::Home => AppKeyCode::Home,
        KeyCode::End => AppKeyCode::End,
        KeyCode::PageUp => AppKeyCode::PageUp,
        KeyCode::PageDown => AppKeyCode::PageDown,
        KeyCode::Tab => AppKeyCode::Tab,
        KeyCode::BackTab => AppKeyCode::BackTab,
        _ => return None,
    };

    Some(AppKeyEvent {
        code,
        ctrl: key.modifiers.contains(KeyModifiers::CONTROL),
        shift: key.modifiers.contains(KeyModifiers::SHIFT),
    })
}

fn crossterm_to_app_mouse_event(mouse: &event::MouseEvent) -> Option<AppMouseEvent> {
    let kind = match mouse.kind {
        MouseEventKind::Down(event::MouseButton::Left) => AppMouseKind::LeftDown,
        MouseEventKind::ScrollUp => AppMouseKind::ScrollUp,
        MouseEventKind::ScrollDown => AppMouseKind::ScrollDown,
        MouseEventKind::Moved | MouseEventKind::Drag(_) => AppMouseKind::Move,
        _ => return None,
    };
    Some(AppMouseEvent {
        kind,
        column: mouse.column,
        row: mouse.row,
    })
}

// ---------------------------------------------------------------------------
// Action execution
// ---------------------------------------------------------------------------

struct Runtime {
    fetcher: Fetcher,
    /// Set by `--image`; replaces the downloaded heatmap for every video.
    local_heatmap: Option<HeatmapImage>,
}

impl Runtime {
    fn handle_action(&self, app: &mut AppState, action: AppAction) {
        match action {
            AppAction::LoadVideo {
                video_id,
                heatmap_ticket,
            } => {
                tracing::info!(video_id, "loading video");
                self.fetcher.dispatch(FetchRequest::Dashboard { video_id });
                match &self.local_heatmap {
                    Some(heatmap) => app.set_heatmap(heatmap.clone()),
                    None => self.fetcher.dispatch(FetchRequest::Heatmap {
                        video_id,
                        ticket: heatmap_ticket,
                    }),
                }
            }
            AppAction::FetchCell {
                video_id,
                cell,
                ticket,
            } => {
                self.fetcher.dispatch(FetchRequest::Cell {
                    video_id,
                    cell,
                    ticket,
                });
            }
            AppAction::FetchSnapshot {
                video_id,
                ticket,
                url,
            } => {
                self.fetcher.dispatch(FetchRequest::Snapshot {
                    video_id,
                    ticket,
                    url,
                });
            }
            AppAction::OpenVideoPicker => self.fetcher.dispatch(FetchRequest::Videos),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let args = Args::parse();
    let app_version = format!("v{}", env!("CARGO_PKG_VERSION"));

    let config_path = config::get_config_dir()?.join(CONFIG_FILE_NAME);
    let cache_dir = config::get_cache_dir()?;
    let log_path = config::get_data_dir()?.join(LOG_FILE_NAME);

    if args.config {
        println!("App Paths:");
        println!("  Config: {}", config_path.display());
        println!("  Cache:  {}", cache_dir.display());
        println!("  Log:    {}", log_path.display());
        return Ok(());
    }

    logging::init(&log_path, args.verbose)?;

    let mut settings = Settings::load(&config_path)?;
    args.apply_to(&mut settings);
    settings.validate()?;

    let theme = theme::Theme::from_str(&settings.theme).map_err(anyhow::Error::msg)?;
    let cell_size = settings.cell_size()?;
    let client = ApiClient::new(&settings.server, settings.request_timeout())?
        .with_cache(cache_dir, args.force);

    if args.list_videos {
        for video in client.fetch_videos()? {
            println!("{}  {}", video.id, video.name);
        }
        return Ok(());
    }

    if args.summary {
        let Some(video_id) = settings.video else {
            bail!("--summary needs a video id (--video or `video` in {})", CONFIG_FILE_NAME);
        };
        let summary = client.fetch_dashboard(video_id)?;
        println!("Video {}", video_id);
        println!("  Total moves: {}", summary.total_moves);
        println!("  Avg dwell:   {:.1} s", summary.avg_dwell);
        println!("  Hotspots:");
        for hot in &summary.top5 {
            println!("    ({},{}) — {}", hot.x, hot.y, hot.count);
        }
        return Ok(());
    }

    let local_heatmap = match &args.image {
        Some(path) => Some(
            HeatmapImage::open(path)
                .with_context(|| format!("Failed to open heatmap image {}", path.display()))?,
        ),
        None => None,
    };

    let mut app = AppState::new(
        theme.config(),
        app_version,
        client.base_url().to_string(),
        cell_size,
        (settings.natural_width, settings.natural_height),
    );
    if let Some(heatmap) = &local_heatmap {
        app.set_heatmap(heatmap.clone());
    }

    let (fetcher, responses) = spawn_fetcher(client);
    let runtime = Runtime {
        fetcher,
        local_heatmap,
    };

    match settings.video {
        Some(video_id) => app.select_video(video_id),
        None => {
            app.set_status("Looking up videos");
            runtime.fetcher.dispatch(FetchRequest::Videos);
        }
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, &runtime, &responses);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = &res {
        tracing::error!("exiting with error: {:#}", err);
    }
    res
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut AppState,
    runtime: &Runtime,
    responses: &Receiver<FetchResponse>,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    terminal.draw(|f| ui::ui(f, app))?;

    loop {
        let mut redraw = false;

        while let Ok(response) = responses.try_recv() {
            reducer::apply_response(app, response);
            if let Some(action) = app.pending_action.take() {
                runtime.handle_action(app, action);
            }
            redraw = true;
        }

        if event::poll(POLL_INTERVAL)? {
            match event::read()? {
                Event::Key(key) => {
                    if let Some(key) = crossterm_to_app_key_event(&key) {
                        reducer::handle_key_event(app, key);
                        redraw = true;
                    }
                }
                Event::Mouse(mouse) => {
                    if let Some(mouse) = crossterm_to_app_mouse_event(&mouse) {
                        redraw |= reducer::handle_mouse_event(app, mouse);
                    }
                }
                Event::Resize(_, _) => redraw = true,
                _ => {}
            }
        }

        if let Some(action) = app.pending_action.take() {
            runtime.handle_action(app, action);
            redraw = true;
        }

        if app.should_quit {
            break;
        }

        if redraw {
            terminal.draw(|f| ui::ui(f, app))?;
        }
    }
    Ok(())
}
