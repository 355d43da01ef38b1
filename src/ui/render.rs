use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

use super::braille::BrailleCanvas;
use crate::config::DisplayConfig;
use crate::game::{Field, MatchState, Paddle};
use crate::training::Progress;

// Layout: two text rows (stats + controls), then a bordered braille field
// Row 0: episode / score / record / mean / epsilon / tick
// Row 1: controls hint
// Rows 2..N: field, with a one-pixel border line at its top and bottom
const UI_HEADER_ROWS: u16 = 2;

/// What the renderer needs besides the match itself
#[derive(Debug, Clone)]
pub struct RenderStyle {
    pub paddle: Color,
    pub ball: Color,
    pub text: Color,
    /// Arrow keys drive the opponent paddle
    pub human: bool,
}

impl RenderStyle {
    pub fn from_display(display: &DisplayConfig, human: bool) -> Self {
        Self {
            paddle: rgb(display.paddle_color),
            ball: rgb(display.ball_color),
            text: rgb(display.score_color),
            human,
        }
    }
}

fn rgb([r, g, b]: [u8; 3]) -> Color {
    Color::Rgb(r, g, b)
}

pub fn render(frame: &mut Frame, state: &MatchState, progress: &Progress, style: &RenderStyle) {
    let area = frame.area();

    // Draw background (true black RGB, not terminal default)
    let bg = Block::default().style(Style::default().bg(Color::Rgb(0, 0, 0)));
    frame.render_widget(bg, area);

    draw_stats(frame, state, progress, style, area);
    draw_controls(frame, style, area);

    if area.height <= UI_HEADER_ROWS {
        return;
    }
    let field_area = Rect {
        x: area.x,
        y: area.y + UI_HEADER_ROWS,
        width: area.width,
        height: area.height - UI_HEADER_ROWS,
    };
    draw_field(frame, state, style, field_area);
}

fn draw_field(frame: &mut Frame, state: &MatchState, style: &RenderStyle, area: Rect) {
    let cells_w = area.width as usize;
    let cells_h = area.height as usize;
    let mut canvas = BrailleCanvas::new(cells_w, cells_h);
    let mut ball_layer = BrailleCanvas::new(cells_w, cells_h);

    // Border lines take the first and last pixel rows
    let playable_offset_y = 1;
    let playable_height_pixels = canvas.pixel_height().saturating_sub(2);
    canvas.draw_horizontal_line(0);
    canvas.draw_horizontal_line(playable_offset_y + playable_height_pixels);

    let field = state.field();
    let scale = Scale {
        x: canvas.pixel_width() as f32 / field.width,
        y: playable_height_pixels as f32 / field.height,
        offset_y: playable_offset_y,
    };

    draw_center_line(&mut canvas, &field, &scale, playable_height_pixels);
    draw_paddle(&mut canvas, &state.agent_paddle, &scale);
    draw_paddle(&mut canvas, &state.opponent_paddle, &scale);

    // The ball goes on both layers: the main one for the glyph, its own for colour
    let ball = &state.ball;
    for layer in [&mut canvas, &mut ball_layer] {
        layer.fill_rect(
            scale.px(ball.x - ball.radius),
            scale.py(ball.y - ball.radius),
            scale.len_x(2.0 * ball.radius).max(1),
            scale.len_y(2.0 * ball.radius).max(1),
        );
    }

    for row in 0..cells_h {
        let spans: Vec<Span> = (0..cells_w)
            .map(|col| {
                let color = if ball_layer.is_blank(col, row) {
                    style.paddle
                } else {
                    style.ball
                };
                Span::styled(canvas.to_char(col, row).to_string(), Style::default().fg(color))
            })
            .collect();

        let row_area = Rect {
            x: area.x,
            y: area.y + row as u16,
            width: area.width,
            height: 1,
        };
        frame.render_widget(Paragraph::new(Line::from(spans)), row_area);
    }
}

// Field units to braille pixels
struct Scale {
    x: f32,
    y: f32,
    offset_y: usize,
}

impl Scale {
    fn px(&self, x: f32) -> usize {
        (x.max(0.0) * self.x) as usize
    }

    fn py(&self, y: f32) -> usize {
        (y.max(0.0) * self.y) as usize + self.offset_y
    }

    fn len_x(&self, w: f32) -> usize {
        (w * self.x) as usize
    }

    fn len_y(&self, h: f32) -> usize {
        (h * self.y) as usize
    }
}

fn draw_paddle(canvas: &mut BrailleCanvas, paddle: &Paddle, scale: &Scale) {
    canvas.fill_rect(
        scale.px(paddle.x),
        scale.py(paddle.y),
        scale.len_x(paddle.width).max(1),
        scale.len_y(paddle.height).max(1),
    );
}

fn draw_center_line(canvas: &mut BrailleCanvas, field: &Field, scale: &Scale, height: usize) {
    let center_pixel_x = scale.px(field.width / 2.0);

    // Dotted: two pixels on, two off
    for y in (0..height).step_by(4) {
        let pixel_y = scale.offset_y + y;
        canvas.set_pixel(center_pixel_x, pixel_y);
        canvas.set_pixel(center_pixel_x, pixel_y + 1);
    }
}

/// Header text for the stats row
pub fn stats_line(state: &MatchState, progress: &Progress) -> String {
    let mode = if progress.learning {
        format!("eps {}", progress.epsilon.max(0))
    } else {
        "greedy".to_string()
    };
    format!(
        "Episode {}  Score {}:{}  Record {}  Mean {:.2}  {}  Tick {}",
        progress.episodes + 1,
        state.agent_score,
        state.opponent_score,
        progress.record,
        progress.mean_score,
        mode,
        state.tick,
    )
}

fn draw_stats(
    frame: &mut Frame,
    state: &MatchState,
    progress: &Progress,
    style: &RenderStyle,
    area: Rect,
) {
    let stats = Paragraph::new(stats_line(state, progress))
        .style(Style::default().fg(style.text))
        .alignment(Alignment::Center);

    let stats_area = Rect {
        x: area.x,
        y: area.y,
        width: area.width,
        height: area.height.min(1),
    };
    frame.render_widget(stats, stats_area);
}

fn draw_controls(frame: &mut Frame, style: &RenderStyle, area: Rect) {
    if area.height < 2 {
        return;
    }
    let hint = if style.human {
        "↑/↓: Right paddle  Space: Stop  Q: Quit"
    } else {
        "Q: Quit"
    };
    let controls = Paragraph::new(hint)
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);

    let controls_area = Rect {
        x: area.x,
        y: area.y + 1,
        width: area.width,
        height: 1,
    };
    frame.render_widget(controls, controls_area);
}
