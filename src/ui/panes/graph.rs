//! Graph pane: struct boxes and pointer arrows on a braille canvas
//!
//! Graph coordinates are terminal cells with `y` growing downwards. The canvas
//! has `y` growing upwards, so every point is flipped on the way in.

use crate::graph::{Address, ArrowStyle, Point, Rect as GraphRect, StructGraph, Variable, VariableKey};
use crate::ui::theme::Theme;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line as TextLine, Span},
    widgets::{
        canvas::{Canvas, Context, Line, Rectangle},
        Block, Borders,
    },
    Frame,
};

const DASH: f64 = 1.0;
const GAP: f64 = 0.6;

pub struct GraphRenderData<'a> {
    pub graph: &'a StructGraph,
    pub selected_struct: Option<Address>,
    pub selected_variable: Option<&'a VariableKey>,
    /// Graph point shown at the top-left corner
    pub pan: Point,
    /// Terminal cells per graph unit
    pub zoom: f64,
    pub is_focused: bool,
}

/// Render the graph pane and return the inner area used for mouse mapping
pub fn render_graph_pane(frame: &mut Frame, area: Rect, data: &GraphRenderData, theme: &Theme) -> Rect {
    let border_style = if data.is_focused {
        Style::default()
            .fg(theme.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.border_normal)
    };
    let dangling = data.graph.dangling_count();
    let title = if dangling > 0 {
        format!(
            " Graph [{} structs, {} pointers, {} dangling] ",
            data.graph.registry().len(),
            data.graph.variable_count(),
            dangling
        )
    } else {
        format!(
            " Graph [{} structs, {} pointers] ",
            data.graph.registry().len(),
            data.graph.variable_count()
        )
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);

    let (width, height) = (
        inner.width.max(1) as f64 / data.zoom,
        inner.height.max(1) as f64 / data.zoom,
    );
    let pan = data.pan;
    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([pan.x, pan.x + width])
        .y_bounds([-(pan.y + height), -pan.y])
        .paint(|ctx| {
            for node in data.graph.structs() {
                draw_struct(ctx, node, data.selected_struct == Some(node.address()), theme);
            }
            ctx.layer();
            for var in data.graph.variables() {
                let selected = data.selected_variable == Some(var.key());
                draw_variable(ctx, var, selected, theme);
            }
        });
    frame.render_widget(canvas, area);
    inner
}

/// Map a terminal cell inside `inner` to the graph point at its centre
pub fn cell_to_graph(inner: Rect, pan: Point, zoom: f64, column: u16, row: u16) -> Option<Point> {
    let inside = column >= inner.x
        && column < inner.x + inner.width
        && row >= inner.y
        && row < inner.y + inner.height;
    inside.then(|| {
        Point::new(
            pan.x + ((column - inner.x) as f64 + 0.5) / zoom,
            pan.y + ((row - inner.y) as f64 + 0.5) / zoom,
        )
    })
}

fn flip(p: Point) -> (f64, f64) {
    (p.x, -p.y)
}

fn segment(ctx: &mut Context, a: Point, b: Point, color: Color) {
    let (x1, y1) = flip(a);
    let (x2, y2) = flip(b);
    ctx.draw(&Line::new(x1, y1, x2, y2, color));
}

fn dashed_segment(ctx: &mut Context, a: Point, b: Point, color: Color) {
    let length = a.distance(b);
    if length <= DASH {
        segment(ctx, a, b, color);
        return;
    }
    let (dx, dy) = ((b.x - a.x) / length, (b.y - a.y) / length);
    let mut t = 0.0;
    while t < length {
        let end = (t + DASH).min(length);
        segment(ctx, a.offset(dx * t, dy * t), a.offset(dx * end, dy * end), color);
        t = end + GAP;
    }
}

fn row_y(bounds: &GraphRect, row: usize) -> f64 {
    -(bounds.y + row as f64 + 0.5)
}

fn draw_struct(ctx: &mut Context, node: &crate::graph::Struct, selected: bool, theme: &Theme) {
    let bounds = node.bounds();
    let color = if selected { theme.selected } else { theme.primary };
    ctx.draw(&Rectangle {
        x: bounds.x,
        y: -bounds.bottom(),
        width: bounds.width,
        height: bounds.height,
        color,
    });
    // Separator under the header row
    segment(
        ctx,
        Point::new(bounds.x, bounds.y + 2.5),
        Point::new(bounds.right(), bounds.y + 2.5),
        color,
    );

    let text_x = bounds.x + 2.0;
    let header_style = Style::default().fg(theme.type_name).add_modifier(Modifier::BOLD);
    ctx.print(
        text_x,
        row_y(&bounds, 1),
        TextLine::from(Span::styled(node.header_text(), header_style)),
    );
    for (i, field) in node.fields().iter().enumerate() {
        let value_color = if field.value.is_pointer() {
            theme.arrow
        } else {
            theme.number
        };
        ctx.print(
            text_x,
            row_y(&bounds, 3 + i),
            TextLine::from(vec![
                Span::styled(format!("{} ", field.type_name), Style::default().fg(theme.type_name)),
                Span::styled(field.name.clone(), Style::default().fg(theme.fg)),
                Span::styled(" = ", Style::default().fg(theme.comment)),
                Span::styled(field.value.render(), Style::default().fg(value_color)),
            ]),
        );
    }
}

fn draw_variable(ctx: &mut Context, var: &Variable, selected: bool, theme: &Theme) {
    let shape = var.geometry();
    let color = match shape.style {
        _ if selected => theme.selected,
        ArrowStyle::Dangling => theme.warning,
        ArrowStyle::Solid | ArrowStyle::SelfLoop => theme.arrow,
    };

    for (a, b) in shape.segments() {
        if shape.style == ArrowStyle::Dangling {
            dashed_segment(ctx, a, b, color);
        } else {
            segment(ctx, a, b, color);
        }
    }
    let [tip, left, right] = shape.head;
    segment(ctx, tip, left, color);
    segment(ctx, tip, right, color);
    if shape.style != ArrowStyle::Dangling {
        // Dangling heads stay open
        segment(ctx, left, right, color);
    }

    if var.owner().is_none() {
        let label = var.label();
        let anchor = var.anchor();
        let x = anchor.x - label.chars().count() as f64 - 1.0;
        let mut style = Style::default().fg(theme.fg).add_modifier(Modifier::BOLD);
        if selected {
            style = style.fg(theme.selected);
        }
        ctx.print(x, -anchor.y, TextLine::from(Span::styled(label.to_string(), style)));
    }
    if var.is_dangling() {
        if let Some(raw) = var.raw_address() {
            let (x, y) = flip(shape.tip());
            ctx.print(
                x + 1.0,
                y,
                TextLine::from(Span::styled(format!("{}?", raw), Style::default().fg(theme.warning))),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Field, VariableUpdate, DeltaBatch, StructSpec};
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_cell_to_graph() {
        let inner = Rect::new(10, 5, 20, 10);
        let pan = Point::new(3.0, 4.0);
        assert_eq!(cell_to_graph(inner, pan, 1.0, 10, 5), Some(Point::new(3.5, 4.5)));
        assert_eq!(cell_to_graph(inner, pan, 1.0, 12, 8), Some(Point::new(5.5, 7.5)));
        assert_eq!(cell_to_graph(inner, pan, 1.0, 9, 5), None);
        assert_eq!(cell_to_graph(inner, pan, 1.0, 30, 5), None);
    }

    #[test]
    fn test_cell_to_graph_zoomed() {
        let inner = Rect::new(0, 0, 20, 10);
        assert_eq!(
            cell_to_graph(inner, Point::default(), 2.0, 3, 1),
            Some(Point::new(1.75, 0.75))
        );
        assert_eq!(
            cell_to_graph(inner, Point::new(10.0, 0.0), 0.5, 1, 0),
            Some(Point::new(13.0, 1.0))
        );
    }

    #[test]
    fn test_renders_struct_header() {
        let mut graph = StructGraph::default();
        let mut batch = DeltaBatch::at_line(1);
        batch.created_structs.push(StructSpec::new(
            Address(0x10),
            "struct node",
            vec![Field::pointer("next", "struct node *", None)],
        ));
        batch
            .variable_updates
            .push(VariableUpdate::new(None, "head", Some(Address(0x10))));
        graph.apply_delta(&batch).unwrap();

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        let data = GraphRenderData {
            graph: &graph,
            selected_struct: None,
            selected_variable: None,
            pan: Point::default(),
            zoom: 1.0,
            is_focused: true,
        };
        terminal
            .draw(|f| {
                render_graph_pane(f, f.area(), &data, &Theme::default());
            })
            .unwrap();
        let buffer = terminal.backend().buffer().clone();
        let text: String = buffer.content.iter().map(|c| c.symbol()).collect();
        assert!(text.contains("struct node @ 0x00000010"));
        assert!(text.contains("head"));
    }
}
