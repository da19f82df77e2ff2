//! SVG renderer: converts `RenderCommand` lists into standalone SVG strings.

use gitlane_protocol::{LANE_PALETTE_SIZE, RenderCommand, TextAlign, ThemeToken};

const DARK_LANES: [&str; LANE_PALETTE_SIZE as usize] = [
    "#42a5f5", "#ef5350", "#66bb6a", "#ffa726", "#ab47bc", "#26c6da", "#d4e157", "#ec407a",
    "#8d6e63", "#78909c",
];
const LIGHT_LANES: [&str; LANE_PALETTE_SIZE as usize] = [
    "#1e88e5", "#e53935", "#43a047", "#fb8c00", "#8e24aa", "#00acc1", "#9e9d24", "#d81b60",
    "#6d4c41", "#546e7a",
];

/// Render a list of commands as an SVG document string.
///
/// `width` and `height` define the SVG viewBox dimensions.
/// `dark` selects the color palette.
pub fn render_svg(commands: &[RenderCommand], width: f64, height: f64, dark: bool) -> String {
    let mut svg = String::with_capacity(commands.len() * 120);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width}" height="{height}" style="font-family:ui-monospace,monospace;font-size:11px">"#,
    ));

    let bg = resolve_color(ThemeToken::Background, dark);
    svg.push_str(&format!(
        r#"<rect width="{width}" height="{height}" fill="{bg}"/>"#,
    ));

    for cmd in commands {
        match cmd {
            RenderCommand::DrawRect { rect, color, label } => {
                let fill = resolve_color(*color, dark);
                svg.push_str(&format!(
                    r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{fill}">"#,
                    rect.x, rect.y, rect.w, rect.h,
                ));
                if let Some(label) = label {
                    svg.push_str(&format!("<title>{}</title>", escape_xml(label)));
                }
                svg.push_str("</rect>");
            }
            RenderCommand::DrawLine {
                from,
                to,
                color,
                width: line_width,
            } => {
                let stroke = resolve_color(*color, dark);
                svg.push_str(&format!(
                    r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{stroke}" stroke-width="{line_width}" stroke-linecap="round"/>"#,
                    from.x, from.y, to.x, to.y,
                ));
            }
            RenderCommand::DrawCircle {
                center,
                radius,
                color,
                filled,
            } => {
                let paint = resolve_color(*color, dark);
                if *filled {
                    svg.push_str(&format!(
                        r#"<circle cx="{}" cy="{}" r="{radius}" fill="{paint}"/>"#,
                        center.x, center.y,
                    ));
                } else {
                    svg.push_str(&format!(
                        r#"<circle cx="{}" cy="{}" r="{radius}" fill="{bg}" stroke="{paint}" stroke-width="1.5"/>"#,
                        center.x, center.y,
                    ));
                }
            }
            RenderCommand::DrawText {
                text,
                position,
                color,
                font_size,
                align,
            } => {
                let fill = resolve_color(*color, dark);
                let anchor = match align {
                    TextAlign::Left => "start",
                    TextAlign::Center => "middle",
                    TextAlign::Right => "end",
                };
                svg.push_str(&format!(
                    r#"<text x="{}" y="{}" fill="{fill}" font-size="{font_size}" text-anchor="{anchor}">{}</text>"#,
                    position.x,
                    position.y,
                    escape_xml(text),
                ));
            }
            RenderCommand::PushTransform { translate } => {
                svg.push_str(&format!(
                    r#"<g transform="translate({},{})">"#,
                    translate.x, translate.y,
                ));
            }
            RenderCommand::PopTransform => svg.push_str("</g>"),
            RenderCommand::BeginGroup { id, .. } => {
                svg.push_str(&format!(r#"<g id="{}">"#, escape_xml(id)));
            }
            RenderCommand::EndGroup => svg.push_str("</g>"),
        }
    }

    svg.push_str("</svg>");
    svg
}

fn resolve_color(token: ThemeToken, dark: bool) -> &'static str {
    if let ThemeToken::Lane(slot) = token {
        let palette = if dark { &DARK_LANES } else { &LIGHT_LANES };
        return palette[usize::from(slot) % palette.len()];
    }
    if dark {
        match token {
            ThemeToken::Background => "#181818",
            ThemeToken::Border => "#303030",
            ThemeToken::TextPrimary => "#ececec",
            ThemeToken::TextMuted => "#9e9e9e",
            ThemeToken::SelectionHighlight => "#2c3e66",
            ThemeToken::MergeMark => "#181818",
            ThemeToken::WorkTreeMark => "#ffd600",
            ThemeToken::ConflictMark => "#ff5252",
            ThemeToken::LocalBranchLabel => "#66bb6a",
            ThemeToken::CurrentBranchLabel => "#b9f6ca",
            ThemeToken::RemoteBranchLabel => "#ef9a9a",
            ThemeToken::TagLabel => "#ffd54f",
            ThemeToken::Lane(_) => "#616161",
        }
    } else {
        match token {
            ThemeToken::Background => "#ffffff",
            ThemeToken::Border => "#dee2e6",
            ThemeToken::TextPrimary => "#1a1a2e",
            ThemeToken::TextMuted => "#666677",
            ThemeToken::SelectionHighlight => "#d0e2ff",
            ThemeToken::MergeMark => "#ffffff",
            ThemeToken::WorkTreeMark => "#e67e22",
            ThemeToken::ConflictMark => "#c62828",
            ThemeToken::LocalBranchLabel => "#2e7d32",
            ThemeToken::CurrentBranchLabel => "#1b5e20",
            ThemeToken::RemoteBranchLabel => "#b71c1c",
            ThemeToken::TagLabel => "#8d6e00",
            ThemeToken::Lane(_) => "#999999",
        }
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
