//! TikZ rendering of solution files

use crate::instance::io::parse_disks_from_string;
use crate::instance::Disk;
use anyhow::{Context, Result};

const PREAMBLE: &str = "\\documentclass{minimal}\n\\usepackage{tikz}\n\\begin{document}\n\\begin{tikzpicture}";
const CLOSING: &str = "\\end{tikzpicture}\n\\end{document}";

/// Turns disks into a standalone LaTeX document, one circle and label per disk
#[derive(Debug, Clone)]
pub struct TikzRenderer {
    scale: f64,
    color: String,
    fill_opacity: f64,
}

impl Default for TikzRenderer {
    fn default() -> Self {
        Self::new(8.0)
    }
}

impl TikzRenderer {
    pub fn new(scale: f64) -> Self {
        Self {
            scale,
            color: "red".to_string(),
            fill_opacity: 0.2,
        }
    }

    /// Render the contents of a solution file
    pub fn render(&self, solution_text: &str) -> Result<String> {
        let disks = parse_disks_from_string(solution_text).context("Malformed solution text")?;
        Ok(self.render_disks(&disks))
    }

    /// Render disks; labels are 1-based positions
    pub fn render_disks(&self, disks: &[Disk]) -> String {
        let mut output = String::new();
        output.push_str(PREAMBLE);
        output.push('\n');

        for (idx, disk) in disks.iter().enumerate() {
            let x = disk.x * self.scale;
            let y = disk.y * self.scale;
            let r = disk.r * self.scale;
            output.push_str(&format!(
                "\\draw[color={c}, fill={c}, fill opacity={o}] ({x}, {y}) circle ({r});\n",
                c = self.color,
                o = self.fill_opacity,
            ));
            output.push_str(&format!("\\node at ({x}, {y}) {{${}$}};\n", idx + 1));
        }

        output.push_str(CLOSING);
        output.push('\n');
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_solution_text() {
        let tex = TikzRenderer::default()
            .render("(1.5,1,0.25) ; \n(2,1.25,0.5) ; \n")
            .unwrap();

        let lines: Vec<_> = tex.lines().collect();
        assert_eq!(lines[0], "\\documentclass{minimal}");
        assert_eq!(lines[3], "\\begin{tikzpicture}");
        assert_eq!(
            lines[4],
            "\\draw[color=red, fill=red, fill opacity=0.2] (12, 8) circle (2);"
        );
        assert_eq!(lines[5], "\\node at (12, 8) {$1$};");
        assert_eq!(lines[7], "\\node at (16, 10) {$2$};");
        assert_eq!(lines[lines.len() - 2], "\\end{tikzpicture}");
        assert_eq!(lines[lines.len() - 1], "\\end{document}");
    }

    #[test]
    fn test_render_empty() {
        let tex = TikzRenderer::default().render("").unwrap();
        assert_eq!(tex, format!("{}\n{}\n", PREAMBLE, CLOSING));
    }

    #[test]
    fn test_malformed_line_is_an_error() {
        let renderer = TikzRenderer::new(1.0);
        assert!(renderer.render("(1.5,abc,0.25) ; \n").is_err());
        assert!(renderer.render("(1.5,1) ; \n").is_err());
    }
}
