//! UiFrame: a thin wrapper around `ratatui::Frame` that clamps drawing to the
//! visible area.
//!
//! Popovers can be dragged partially off-screen, so their rects are signed
//! and may not fit the terminal buffer. Writing out-of-bounds into a
//! `Buffer` panics; `UiFrame` clips every draw call instead. Overlays are
//! painted into an offscreen buffer of their own size and then composited
//! with [`UiFrame::blit_from_signed`].
use crate::overlay::{FloatRect, OverlayNode};
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Widget, Wrap};

pub struct UiFrame<'a> {
    area: Rect,
    buffer: &'a mut Buffer,
}

impl<'a> UiFrame<'a> {
    pub fn new(frame: &'a mut Frame<'_>) -> Self {
        let area = frame.area();
        let buffer = frame.buffer_mut();
        Self { area, buffer }
    }

    pub fn from_parts(area: Rect, buffer: &'a mut Buffer) -> Self {
        Self { area, buffer }
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn buffer_mut(&mut self) -> &mut Buffer {
        self.buffer
    }

    fn clip_rect(&self, rect: Rect) -> Option<Rect> {
        let clipped = rect.intersection(self.area);
        if clipped.width == 0 || clipped.height == 0 {
            None
        } else {
            Some(clipped)
        }
    }

    pub fn render_widget<W>(&mut self, widget: W, area: Rect)
    where
        W: Widget,
    {
        if let Some(clipped) = self.clip_rect(area) {
            widget.render(clipped, self.buffer);
        }
    }

    /// Copies `src` (laid out from the origin) onto the frame at a signed
    /// destination, dropping cells that fall outside the frame.
    pub fn blit_from_signed(&mut self, src: &Buffer, dest: FloatRect) {
        let frame_x0 = self.area.x as i32;
        let frame_y0 = self.area.y as i32;
        let frame_x1 = frame_x0 + self.area.width as i32;
        let frame_y1 = frame_y0 + self.area.height as i32;
        for sy in 0..dest.height as i32 {
            let dy = dest.y + sy;
            if dy < frame_y0 || dy >= frame_y1 {
                continue;
            }
            for sx in 0..dest.width as i32 {
                let dx = dest.x + sx;
                if dx < frame_x0 || dx >= frame_x1 {
                    continue;
                }
                if let (Some(src_cell), Some(dst_cell)) = (
                    src.cell((sx as u16, sy as u16)),
                    self.buffer.cell_mut((dx as u16, dy as u16)),
                ) {
                    *dst_cell = src_cell.clone();
                }
            }
        }
    }
}

/// Contents of a popover panel.
#[derive(Debug, Clone, Default)]
pub struct PopoverView<'a> {
    pub title: &'a str,
    pub lines: Vec<Line<'a>>,
    pub border_style: Style,
    /// Draw the thick border used while the panel is being dragged.
    pub emphasized: bool,
}

/// Paints `view` at the overlay's current bounding box.
pub fn render_overlay(frame: &mut UiFrame<'_>, overlay: &OverlayNode, view: PopoverView<'_>) {
    let rect = overlay.bounding_rect();
    if rect.width == 0 || rect.height == 0 || rect.clip_to(frame.area()).is_none() {
        return;
    }
    let local = Rect::new(0, 0, rect.width, rect.height);
    let mut offscreen = Buffer::empty(local);
    Clear.render(local, &mut offscreen);
    let block = Block::default()
        .title(view.title)
        .borders(Borders::ALL)
        .border_type(if view.emphasized {
            BorderType::Thick
        } else {
            BorderType::Rounded
        })
        .border_style(view.border_style);
    Paragraph::new(view.lines)
        .block(block)
        .wrap(Wrap { trim: true })
        .render(local, &mut offscreen);
    frame.blit_from_signed(&offscreen, rect);
}

pub fn safe_set_string(
    buffer: &mut Buffer,
    bounds: Rect,
    x: u16,
    y: u16,
    text: &str,
    style: Style,
) {
    if bounds.width == 0 || bounds.height == 0 {
        return;
    }
    let max_x = bounds.x.saturating_add(bounds.width);
    let max_y = bounds.y.saturating_add(bounds.height);
    if x < bounds.x || x >= max_x || y < bounds.y || y >= max_y {
        return;
    }
    let available = max_x.saturating_sub(x);
    let text = truncate_to_width(text, available as usize);
    buffer.set_string(x, y, text, style);
}

pub fn truncate_to_width(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    value.chars().take(width).collect()
}
