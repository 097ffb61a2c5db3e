use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph};
use tracing::{info, warn};

use term_popover::anchor::{Anchor, AnchorId};
use term_popover::constants::FRAME_POLL_MS;
use term_popover::drivers::OutputDriver;
use term_popover::drivers::console::{ConsoleInputDriver, ConsoleOutputDriver};
use term_popover::event_loop::{ControlFlow, EventLoop};
use term_popover::overlay::{FloatRect, OverlayNode};
use term_popover::placement::{AnchoredPlacementEngine, Placement};
use term_popover::popover::{Authority, Popover, PopoverProps};
use term_popover::preference::{
    FilePreferenceStore, MemoryPreferenceStore, OverlayIdentity, PreferenceStore,
};
use term_popover::tracing_sub;
use term_popover::ui::{PopoverView, UiFrame, render_overlay, safe_set_string};

const PANE_WIDTH: u16 = 30;
const PANE_HEIGHT: u16 = 9;

#[derive(Parser, Debug)]
#[command(
    name = "term-popover",
    version = env!("CARGO_PKG_VERSION"),
    about = "Editor canvas with a draggable property pane"
)]
struct Cli {
    /// File the property pane position is remembered in. Without it the
    /// position only lives for this session.
    #[arg(long, value_name = "PATH")]
    prefs: Option<PathBuf>,

    /// Keep the pane attached to the selected widget and disable dragging.
    #[arg(long)]
    no_manual: bool,

    /// Where the pane opens relative to the widget, e.g. `bottom-start`.
    #[arg(long, value_name = "PLACEMENT", default_value_t = Placement::default())]
    placement: Placement,

    #[arg(long, value_name = "N", default_value_t = 10)]
    z_index: i32,

    /// Write logs to this file.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    tracing_sub::init(cli.log_file.as_deref(), cli.verbose)?;

    let store = open_store(cli.prefs.as_deref());
    let mut app = App::new(&cli, store);
    let mut output = ConsoleOutputDriver::new()?;
    output.enter()?;

    let mut event_loop = EventLoop::new(
        ConsoleInputDriver::new(),
        Duration::from_millis(FRAME_POLL_MS),
    );
    let result = event_loop.run(|_, event| match event {
        None => {
            output.draw(|frame| app.draw(frame))?;
            app.after_layout();
            Ok(ControlFlow::Continue)
        }
        Some(event) => Ok(app.handle_event(&event)),
    });

    output.exit()?;
    app.popover.close();
    result
}

fn open_store(path: Option<&Path>) -> Box<dyn PreferenceStore> {
    let Some(path) = path else {
        return Box::new(MemoryPreferenceStore::new());
    };
    match FilePreferenceStore::open(path) {
        Ok(store) => {
            info!(path = %path.display(), "loaded preferences");
            Box::new(store)
        }
        Err(err) => {
            warn!(path = %path.display(), %err, "preferences unavailable; using memory store");
            Box::new(MemoryPreferenceStore::new())
        }
    }
}

struct CanvasWidget {
    id: AnchorId,
    label: &'static str,
    rect: FloatRect,
}

impl CanvasWidget {
    fn anchor(&self) -> Anchor {
        // Canvas > layer > widget.
        Anchor::new(self.id, self.rect).with_depth(3)
    }
}

struct App {
    widgets: Vec<CanvasWidget>,
    selected: Option<usize>,
    popover: Popover<AnchoredPlacementEngine, Box<dyn PreferenceStore>>,
    overlay: OverlayNode,
    props: PopoverProps,
    status: String,
}

impl App {
    fn new(cli: &Cli, store: Box<dyn PreferenceStore>) -> Self {
        let widgets = vec![
            CanvasWidget {
                id: AnchorId(1),
                label: "Header",
                rect: FloatRect::new(4, 2, 24, 3),
            },
            CanvasWidget {
                id: AnchorId(2),
                label: "Image",
                rect: FloatRect::new(6, 7, 18, 6),
            },
            CanvasWidget {
                id: AnchorId(3),
                label: "Button",
                rect: FloatRect::new(34, 9, 12, 3),
            },
        ];
        let mut overlay = OverlayNode::new(PANE_WIDTH, PANE_HEIGHT);
        overlay.detach();
        Self {
            widgets,
            selected: None,
            popover: Popover::new(
                OverlayIdentity::property_pane(),
                AnchoredPlacementEngine::new(cli.placement),
                store,
            ),
            overlay,
            props: PopoverProps {
                is_open: false,
                anchor: None,
                placement: cli.placement,
                modifiers: Default::default(),
                z_index: cli.z_index,
                manual_mode: !cli.no_manual,
            },
            status: "click a widget to edit it".to_string(),
        }
    }

    fn draw(&mut self, frame: &mut Frame<'_>) {
        let area = frame.area();
        let canvas = Rect {
            height: area.height.saturating_sub(1),
            ..area
        };
        self.props.anchor = self
            .selected
            .and_then(|idx| self.widgets.get(idx))
            .map(CanvasWidget::anchor);
        self.popover.sync(&self.props, canvas, &mut self.overlay);

        let mut ui = UiFrame::new(frame);
        ui.render_widget(
            Block::default().borders(Borders::ALL).title(" canvas "),
            canvas,
        );
        let pane_on_top = self.popover.z_index() > 0;
        if self.popover.is_visible() && !pane_on_top {
            render_overlay(&mut ui, &self.overlay, self.pane_view());
        }
        for (idx, widget) in self.widgets.iter().enumerate() {
            let Some(rect) = widget.rect.clip_to(canvas) else {
                continue;
            };
            let style = if self.selected == Some(idx) {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            ui.render_widget(
                Paragraph::new(widget.label).block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(style),
                ),
                rect,
            );
        }
        if self.popover.is_visible() && pane_on_top {
            render_overlay(&mut ui, &self.overlay, self.pane_view());
        }

        let status = format!(
            " {} | m manual:{} | r reset | esc close | q quit",
            self.status,
            if self.props.manual_mode { "on" } else { "off" },
        );
        let status_row = area.y + area.height.saturating_sub(1);
        safe_set_string(
            ui.buffer_mut(),
            area,
            area.x,
            status_row,
            &status,
            Style::default().add_modifier(Modifier::REVERSED),
        );
    }

    fn pane_view(&self) -> PopoverView<'static> {
        let authority = self.popover.authority();
        let mut lines = Vec::new();
        if let Some(widget) = self.selected.and_then(|idx| self.widgets.get(idx)) {
            lines.push(Line::from(format!("widget  {}", widget.label)));
            lines.push(Line::from(format!(
                "at      {},{}",
                widget.rect.x, widget.rect.y
            )));
            lines.push(Line::from(format!(
                "size    {}x{}",
                widget.rect.width, widget.rect.height
            )));
        }
        let source = match authority {
            Authority::Inactive => "inactive".to_string(),
            Authority::Placement => format!("anchored {}", self.props.placement),
            Authority::Manual(offset) => format!("pinned {},{}", offset.x, offset.y),
            Authority::Dragging(_) => "dragging".to_string(),
        };
        lines.push(Line::from(""));
        lines.push(Line::from(source));
        PopoverView {
            title: " properties ",
            lines,
            border_style: Style::default().fg(Color::Cyan),
            emphasized: matches!(authority, Authority::Dragging(_)),
        }
    }

    fn after_layout(&mut self) {
        self.popover.on_layout(&mut self.overlay);
    }

    fn handle_event(&mut self, event: &Event) -> ControlFlow {
        if self.popover.handle_event(event, &mut self.overlay) {
            return ControlFlow::Continue;
        }
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => {
                self.handle_mouse(mouse);
                ControlFlow::Continue
            }
            _ => ControlFlow::Continue,
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) -> ControlFlow {
        match key.code {
            KeyCode::Char('q') => return ControlFlow::Quit,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return ControlFlow::Quit;
            }
            KeyCode::Esc => self.close_pane(),
            KeyCode::Char('m') => {
                self.props.manual_mode = !self.props.manual_mode;
                info!(manual_mode = self.props.manual_mode, "toggled manual mode");
            }
            KeyCode::Char('r') => self.reset_preference(),
            KeyCode::Left => self.nudge(-1, 0),
            KeyCode::Right => self.nudge(1, 0),
            KeyCode::Up => self.nudge(0, -1),
            KeyCode::Down => self.nudge(0, 1),
            _ => {}
        }
        ControlFlow::Continue
    }

    fn handle_mouse(&mut self, mouse: &MouseEvent) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let (column, row) = (mouse.column as i32, mouse.row as i32);
        if self.popover.is_visible() && self.overlay.bounding_rect().contains(column, row) {
            return;
        }
        let hit = self
            .widgets
            .iter()
            .rposition(|widget| widget.rect.contains(column, row));
        match hit {
            Some(idx) => self.open_pane(idx),
            None => self.close_pane(),
        }
    }

    fn open_pane(&mut self, idx: usize) {
        self.selected = Some(idx);
        self.props.is_open = true;
        self.overlay.attach();
        if let Some(widget) = self.widgets.get(idx) {
            self.status = format!("editing {}", widget.label);
        }
    }

    fn close_pane(&mut self) {
        self.selected = None;
        self.props.is_open = false;
        self.overlay.detach();
        self.status = "click a widget to edit it".to_string();
    }

    fn nudge(&mut self, dx: i32, dy: i32) {
        if let Some(widget) = self.selected.and_then(|idx| self.widgets.get_mut(idx)) {
            widget.rect.x += dx;
            widget.rect.y += dy;
        }
    }

    fn reset_preference(&mut self) {
        let identity = self.popover.controller().identity().clone();
        match self
            .popover
            .controller_mut()
            .store_mut()
            .clear_preference(&identity)
        {
            Ok(()) => self.status = "pane position reset".to_string(),
            Err(err) => {
                warn!(%identity, %err, "failed to reset pane position");
                self.status = "reset failed".to_string();
            }
        }
    }
}
