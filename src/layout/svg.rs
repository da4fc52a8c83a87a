use super::stave::{BarlineKind, Clef};
use super::surface::{DrawOp, Surface};

/// Serialize a surface to a standalone SVG document.
///
/// Draw ops are written in order, followed by the note handles in stacking order. The
/// document grows past the surface height when the staves reach further down.
pub fn to_svg(surface: &Surface) -> String {
    let mut svg = String::new();
    let height = surface.height().max(content_bottom(surface) + 20.0);

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\" viewBox=\"0 0 {} {}\">\n",
        fmt(surface.width()),
        fmt(height),
        fmt(surface.width()),
        fmt(height)
    ));
    svg.push_str("  <g class=\"staves\" stroke=\"black\" fill=\"black\">\n");

    for op in surface.ops() {
        svg.push_str(&op_to_svg(op));
    }

    svg.push_str("  </g>\n");
    svg.push_str("  <g class=\"handles\">\n");

    for &id in surface.stacking_order() {
        if let Some(handle) = surface.handle(id) {
            svg.push_str(&format!(
                "    <circle id=\"handle-{}\" data-key=\"{}\" data-color=\"{}\" cx=\"{}\" cy=\"{}\" r=\"{}\" style=\"fill: {}; opacity: {}; transition: all {}ms\"/>\n",
                handle.id,
                escape_xml(handle.key.as_str()),
                escape_xml(&handle.color),
                fmt(handle.x),
                fmt(handle.y),
                fmt(handle.style.radius),
                escape_xml(&handle.style.fill),
                fmt(handle.style.opacity),
                handle.style.transition_ms
            ));
        }
    }

    svg.push_str("  </g>\n");
    svg.push_str("</svg>\n");
    svg
}

fn op_to_svg(op: &DrawOp) -> String {
    match op {
        DrawOp::StaffLines {
            x,
            y,
            width,
            spacing,
        } => {
            let mut out = String::new();
            for i in 0..5 {
                let ly = y + i as f64 * spacing;
                out.push_str(&line(*x, ly, x + width, ly, 1.0));
            }
            out
        }
        DrawOp::Barline { x, top, bottom, kind } => match kind {
            BarlineKind::Single => line(*x, *top, *x, *bottom, 1.0),
            BarlineKind::End => {
                let mut out = line(x - 6.0, *top, x - 6.0, *bottom, 1.0);
                out.push_str(&format!(
                    "    <rect x=\"{}\" y=\"{}\" width=\"3\" height=\"{}\"/>\n",
                    fmt(x - 3.0),
                    fmt(*top),
                    fmt(bottom - top)
                ));
                out
            }
        },
        DrawOp::Clef { x, y, clef } => {
            let glyph = match clef {
                Clef::Treble => "\u{1D11E}",
                Clef::Bass => "\u{1D122}",
            };
            format!(
                "    <text class=\"clef\" x=\"{}\" y=\"{}\" font-size=\"40\">{}</text>\n",
                fmt(*x),
                fmt(y + 10.0),
                glyph
            )
        }
        DrawOp::TimeSignature { x, y, label } => {
            let (top, bottom) = label.split_once('/').unwrap_or((label.as_str(), ""));
            format!(
                "    <text class=\"time\" x=\"{}\" y=\"{}\" font-size=\"20\" font-weight=\"bold\">{}</text>\n    <text class=\"time\" x=\"{}\" y=\"{}\" font-size=\"20\" font-weight=\"bold\">{}</text>\n",
                fmt(*x),
                fmt(y + 18.0),
                escape_xml(top),
                fmt(*x),
                fmt(y + 38.0),
                escape_xml(bottom)
            )
        }
        DrawOp::LedgerLine { x1, x2, y } => line(*x1, *y, *x2, *y, 1.0),
        DrawOp::NoteHead {
            handle,
            x,
            y,
            filled,
        } => format!(
            "    <ellipse class=\"notehead\" data-handle=\"{}\" cx=\"{}\" cy=\"{}\" rx=\"6\" ry=\"4.5\" transform=\"rotate(-20 {} {})\" fill=\"{}\"/>\n",
            handle,
            fmt(*x),
            fmt(*y),
            fmt(*x),
            fmt(*y),
            if *filled { "black" } else { "white" }
        ),
        DrawOp::Accidental { x, y, glyph } => format!(
            "    <text class=\"accidental\" x=\"{}\" y=\"{}\" font-size=\"16\" text-anchor=\"middle\">{}</text>\n",
            fmt(*x),
            fmt(y + 5.0),
            glyph
        ),
        DrawOp::Stem { x, y1, y2 } => line(*x, *y1, *x, *y2, 1.2),
        DrawOp::Flag { x, y, count, up } => {
            let mut out = String::new();
            for i in 0..*count {
                let offset = i as f64 * 7.0;
                let (fy, dy) = if *up {
                    (y + offset, 12.0)
                } else {
                    (y - offset, -12.0)
                };
                out.push_str(&format!(
                    "    <path class=\"flag\" d=\"M{} {} q 8 {} 6 {}\" fill=\"none\"/>\n",
                    fmt(*x),
                    fmt(fy),
                    fmt(dy * 0.6),
                    fmt(dy * 1.4)
                ));
            }
            out
        }
        DrawOp::Beam { x1, y1, x2, y2 } => format!(
            "    <polygon class=\"beam\" points=\"{},{} {},{} {},{} {},{}\"/>\n",
            fmt(*x1),
            fmt(*y1),
            fmt(*x2),
            fmt(*y2),
            fmt(*x2),
            fmt(y2 + 4.0),
            fmt(*x1),
            fmt(y1 + 4.0)
        ),
    }
}

fn line(x1: f64, y1: f64, x2: f64, y2: f64, width: f64) -> String {
    format!(
        "    <line x1=\"{}\" y1=\"{}\" x2=\"{}\" y2=\"{}\" stroke-width=\"{}\"/>\n",
        fmt(x1),
        fmt(y1),
        fmt(x2),
        fmt(y2),
        fmt(width)
    )
}

/// Lowest y reached by any staff line, stem or handle.
fn content_bottom(surface: &Surface) -> f64 {
    let ops = surface.ops().iter().map(|op| match op {
        DrawOp::StaffLines { y, spacing, .. } => y + 4.0 * spacing,
        DrawOp::Stem { y1, y2, .. } => y1.max(*y2),
        DrawOp::LedgerLine { y, .. } | DrawOp::NoteHead { y, .. } => *y,
        _ => 0.0,
    });
    let handles = surface.handles().iter().map(|h| h.y + h.radius);
    ops.chain(handles).fold(0.0, f64::max)
}

/// Two decimals at most, no trailing zeros
fn fmt(value: f64) -> String {
    let s = format!("{:.2}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_trims() {
        assert_eq!(fmt(10.0), "10");
        assert_eq!(fmt(10.5), "10.5");
        assert_eq!(fmt(1.0 / 3.0), "0.33");
        assert_eq!(fmt(-0.001), "0");
        assert_eq!(fmt(0.0), "0");
        assert_eq!(fmt(100.0), "100");
    }

    #[test]
    fn test_empty_surface_svg() {
        let surface = Surface::create(1250.0, 150.0);
        let svg = to_svg(&surface);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("width=\"1250\" height=\"150\""));
        assert!(!svg.contains("<circle"));
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }
}
