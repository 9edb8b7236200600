use crate::error::TimelineResult;
use crate::render::{RenderFrame, Renderer, RowRenderer, VirtualRow};

/// No-op renderer used by tests and headless usage.
///
/// It still validates frame content so tests can catch invalid geometry before
/// a real backend is introduced.
#[derive(Debug, Default)]
pub struct NullRenderer {
    pub last_line_count: usize,
    pub last_circle_count: usize,
    pub last_text_count: usize,
    pub last_frame: Option<RenderFrame>,
}

impl Renderer for NullRenderer {
    fn render(&mut self, frame: &RenderFrame) -> TimelineResult<()> {
        frame.validate()?;
        self.last_line_count = frame.lines.len();
        self.last_circle_count = frame.circles.len();
        self.last_text_count = frame.texts.len();
        self.last_frame = Some(frame.clone());
        Ok(())
    }
}

/// Headless row sink recording what the virtual list asked it to draw.
#[derive(Debug, Default)]
pub struct NullRowRenderer {
    pub rendered_rows: Vec<VirtualRow>,
    pub content_draws: usize,
    pub empty_state_draws: usize,
}

impl<T> RowRenderer<T> for NullRowRenderer {
    fn begin_frame(&mut self) {
        self.rendered_rows.clear();
    }

    fn render_row(&mut self, row: &VirtualRow, _item: &T) -> TimelineResult<()> {
        if row.rebound {
            self.content_draws += 1;
        }
        self.rendered_rows.push(*row);
        Ok(())
    }

    fn render_empty(&mut self) -> TimelineResult<()> {
        self.rendered_rows.clear();
        self.empty_state_draws += 1;
        Ok(())
    }
}
